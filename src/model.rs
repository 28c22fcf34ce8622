//! Persisted artifacts. Everything here is serialized; in-process
//! aggregation state lives in `aggregate` and never is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub avg_word_length: f64,
}

/// One per successfully processed raw file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub source_file: String,
    #[serde(rename = "text", alias = "extracted_text")]
    pub extracted_text: String,
    pub statistics: DocumentStats,
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source: String,
    pub output: Option<String>,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ManifestEntry {
    pub fn success(source: &str, output: String) -> Self {
        ManifestEntry {
            source: source.to_string(),
            output: Some(output),
            status: ItemStatus::Success,
            error: None,
        }
    }

    pub fn failed(source: &str, error: String) -> Self {
        ManifestEntry {
            source: source.to_string(),
            output: None,
            status: ItemStatus::Failed,
            error: Some(error),
        }
    }
}

/// Written once by the processor; its presence releases the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingManifest {
    pub timestamp: DateTime<Utc>,
    pub files_found: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<ManifestEntry>,
}

impl ProcessingManifest {
    pub fn from_results(results: Vec<ManifestEntry>) -> Self {
        let successful = results
            .iter()
            .filter(|r| r.status == ItemStatus::Success)
            .count();
        ProcessingManifest {
            timestamp: Utc::now(),
            files_found: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
    pub frequency: f64,
    pub document_frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigramCount {
    pub bigram: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrigramCount {
    pub trigram: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEntry {
    pub doc1: String,
    pub doc2: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Readability {
    pub avg_sentence_length: f64,
    pub avg_word_length: f64,
    pub complexity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub processing_timestamp: DateTime<Utc>,
    pub documents_processed: usize,
    pub total_words: usize,
    pub unique_words: usize,
    pub top_100_words: Vec<WordFrequency>,
    pub document_similarity: Vec<SimilarityEntry>,
    pub top_bigrams: Vec<BigramCount>,
    pub top_trigrams: Vec<TrigramCount>,
    pub readability: Readability,
}

/// Round to `digits` decimals from the exact binary value, ties to even.
pub fn round_to(value: f64, digits: usize) -> f64 {
    format!("{value:.digits$}").parse().unwrap_or(value)
}

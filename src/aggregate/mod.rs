//! Corpus aggregator stage: processed records → corpus report.

pub mod ngrams;
pub mod readability;
pub mod similarity;

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::extract::tokenize_lower;
use crate::handoff::{await_upstream, signal_done, Stage, StageRun, PROCESS_MARKER};
use crate::model::{
    BigramCount, CorpusReport, ProcessedDocument, ProcessingManifest, TrigramCount,
    WordFrequency,
};
use crate::store::{Area, DurableStore};

use ngrams::{count_into, ngrams, top_k};
use readability::ReadabilityTally;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub const TOP_WORDS: usize = 100;
pub const TOP_NGRAMS: usize = 50;
pub const PROCESSED_EXTENSION: &str = "json";

/// In-process view of one document. Never serialized.
#[derive(Debug, Clone)]
pub struct DocumentProfile {
    pub name: String,
    pub tokens: Vec<String>,
    pub terms: HashSet<String>,
    pub readability: ReadabilityTally,
}

impl DocumentProfile {
    pub fn build(name: &str, text: &str) -> Self {
        let tokens = tokenize_lower(text);
        let terms = tokens.iter().cloned().collect();
        let readability = ReadabilityTally::from_text(text, &tokens);
        DocumentProfile {
            name: name.to_string(),
            tokens,
            terms,
            readability,
        }
    }
}

#[derive(Debug, Default)]
struct CorpusAccumulator {
    total_words: usize,
    term_counts: HashMap<String, usize>,
    doc_freq: HashMap<String, usize>,
    bigrams: HashMap<String, usize>,
    trigrams: HashMap<String, usize>,
    readability: ReadabilityTally,
}

impl CorpusAccumulator {
    fn absorb(&mut self, profile: &DocumentProfile) {
        self.total_words += profile.tokens.len();
        count_into(&mut self.term_counts, profile.tokens.iter().cloned());
        count_into(&mut self.doc_freq, profile.terms.iter().cloned());
        count_into(&mut self.bigrams, ngrams(&profile.tokens, 2));
        count_into(&mut self.trigrams, ngrams(&profile.tokens, 3));
        self.readability.merge(&profile.readability);
    }

    fn top_words(&self) -> Vec<WordFrequency> {
        top_k(&self.term_counts, TOP_WORDS)
            .into_iter()
            .map(|(word, count)| WordFrequency {
                word: word.to_string(),
                count,
                frequency: if self.total_words == 0 {
                    0.0
                } else {
                    count as f64 / self.total_words as f64
                },
                document_frequency: self.doc_freq.get(word).copied().unwrap_or(0),
            })
            .collect()
    }
}

/// Assemble the report from profiles already in canonical (sorted) order.
pub fn build_report(profiles: &[DocumentProfile]) -> CorpusReport {
    let mut acc = CorpusAccumulator::default();
    for profile in profiles {
        acc.absorb(profile);
    }

    CorpusReport {
        processing_timestamp: Utc::now(),
        documents_processed: profiles.len(),
        total_words: acc.total_words,
        unique_words: acc.term_counts.len(),
        top_100_words: acc.top_words(),
        document_similarity: similarity::pairwise(profiles),
        top_bigrams: top_k(&acc.bigrams, TOP_NGRAMS)
            .into_iter()
            .map(|(bigram, count)| BigramCount {
                bigram: bigram.to_string(),
                count,
            })
            .collect(),
        top_trigrams: top_k(&acc.trigrams, TOP_NGRAMS)
            .into_iter()
            .map(|(trigram, count)| TrigramCount {
                trigram: trigram.to_string(),
                count,
            })
            .collect(),
        readability: acc.readability.finish(),
    }
}

/// Read and profile one record; unreadable or malformed ones are skipped.
fn load_profile<S: DurableStore>(store: &S, name: &str) -> Option<DocumentProfile> {
    let parsed = store.read(Area::Processed, name).and_then(|bytes| {
        serde_json::from_slice::<ProcessedDocument>(&bytes).map_err(PipelineError::from)
    });
    match parsed {
        Ok(doc) => Some(DocumentProfile::build(name, &doc.extracted_text)),
        Err(e) => {
            warn!(record = %name, error = %e, "skipping unreadable record");
            None
        }
    }
}

#[cfg(feature = "rayon")]
pub fn load_profiles<S: DurableStore>(store: &S) -> Result<Vec<DocumentProfile>> {
    let names = store.list(Area::Processed, PROCESSED_EXTENSION)?;
    Ok(names
        .par_iter()
        .filter_map(|name| load_profile(store, name))
        .collect())
}

#[cfg(not(feature = "rayon"))]
pub fn load_profiles<S: DurableStore>(store: &S) -> Result<Vec<DocumentProfile>> {
    let names = store.list(Area::Processed, PROCESSED_EXTENSION)?;
    Ok(names
        .iter()
        .filter_map(|name| load_profile(store, name))
        .collect())
}

/// Run the stage: wait for the processing manifest, aggregate, publish.
pub async fn run<S: DurableStore>(store: &S, settings: &Settings) -> Result<CorpusReport> {
    let mut stage = StageRun::new(Stage::Analyze);

    let marker = await_upstream(store, stage.stage(), &settings.handoff()).await?;
    let manifest: ProcessingManifest =
        serde_json::from_slice(&marker).map_err(|source| PipelineError::MalformedManifest {
            name: PROCESS_MARKER.to_string(),
            source,
        })?;
    stage.running();

    store.ensure(Area::Analysis)?;

    let profiles = load_profiles(store)?;
    if profiles.len() != manifest.successful {
        warn!(
            loaded = profiles.len(),
            manifest_successful = manifest.successful,
            "record count differs from manifest"
        );
    }

    let report = build_report(&profiles);
    signal_done(store, Stage::Analyze, &serde_json::to_vec_pretty(&report)?)?;
    stage.done();

    info!(
        documents = report.documents_processed,
        total_words = report.total_words,
        unique_words = report.unique_words,
        pairs = report.document_similarity.len(),
        "analysis complete"
    );
    Ok(report)
}

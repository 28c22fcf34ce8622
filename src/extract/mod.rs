pub mod html;
pub mod stats;

use chrono::Utc;

use crate::model::ProcessedDocument;

pub use html::{extract, extract_bytes, Extracted};
pub use stats::{compute_stats, split_sentences, tokenize, tokenize_lower};

/// Two-step pipeline: raw bytes → extracted text → per-document record.
pub fn process_document(source_file: &str, raw: &[u8]) -> ProcessedDocument {
    let Extracted {
        text,
        links,
        images,
    } = extract_bytes(raw);
    let statistics = compute_stats(&text);

    ProcessedDocument {
        source_file: source_file.to_string(),
        extracted_text: text,
        statistics,
        links,
        images,
        processed_at: Utc::now(),
    }
}

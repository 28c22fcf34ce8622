//! Corpus pipeline: crawled HTML → per-document records → corpus report.
//!
//! Two stages run as separate processes and hand off through completion
//! markers in a shared store:
//!   1. processor: strip HTML, compute document statistics, write records
//!      and `process_complete.json`
//!   2. analyzer: wait for that manifest, aggregate frequencies, n-grams,
//!      pairwise similarity and readability into `final_report.json`

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod handoff;
pub mod model;
pub mod processor;
pub mod store;

pub use crate::config::{Overrides, Settings};
pub use crate::error::{PipelineError, Result};
pub use crate::store::{Area, DurableStore, FsStore};

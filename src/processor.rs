//! Document processor stage: raw HTML → one JSON record per document,
//! then the processing manifest.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::extract::process_document;
use crate::handoff::{await_upstream, signal_done, Stage, StageRun, FETCH_MARKER};
use crate::model::{ManifestEntry, ProcessedDocument, ProcessingManifest};
use crate::store::{Area, DurableStore};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub const RAW_EXTENSION: &str = "html";

static PAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(page_\d+)\.html$").unwrap());

/// `page_N` from a `page_N.html` name, else `page_<index>` (1-based).
pub fn output_stem(file_name: &str, index: usize) -> String {
    match PAGE_NAME_RE.captures(file_name) {
        Some(caps) => caps[1].to_string(),
        None => format!("page_{index}"),
    }
}

/// Output names for `names` (sorted), refusing synthetic names that would
/// overwrite another document's record.
pub fn plan_outputs(names: &[String]) -> Vec<Result<String>> {
    let explicit: HashMap<String, &str> = names
        .iter()
        .filter_map(|name| {
            PAGE_NAME_RE
                .captures(name)
                .map(|caps| (caps[1].to_string(), name.as_str()))
        })
        .collect();

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let stem = output_stem(name, i + 1);
            match explicit.get(&stem) {
                Some(owner) if *owner != name.as_str() => Err(PipelineError::NameCollision {
                    stem,
                    claimed_by: owner.to_string(),
                }),
                _ => Ok(format!("{stem}.json")),
            }
        })
        .collect()
}

fn load_and_extract<S: DurableStore>(store: &S, name: &str) -> Result<ProcessedDocument> {
    let raw = store.read(Area::Raw, name)?;
    Ok(process_document(name, &raw))
}

#[cfg(feature = "rayon")]
fn extract_all<S: DurableStore>(store: &S, names: &[String]) -> Vec<Result<ProcessedDocument>> {
    names
        .par_iter()
        .map(|name| load_and_extract(store, name))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn extract_all<S: DurableStore>(store: &S, names: &[String]) -> Vec<Result<ProcessedDocument>> {
    names
        .iter()
        .map(|name| load_and_extract(store, name))
        .collect()
}

fn persist_document<S: DurableStore>(
    store: &S,
    output: &str,
    doc: &ProcessedDocument,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    store.publish(Area::Processed, output, &bytes)
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Process every raw document in sorted order and build the manifest.
/// Per-item failures land in the manifest; nothing here is fatal.
pub async fn process_all<S: DurableStore>(
    store: &S,
    names: &[String],
    throttle: Duration,
) -> ProcessingManifest {
    let extracted = extract_all(store, names);
    let outputs = plan_outputs(names);
    let pb = progress_bar(names.len());

    let mut results = Vec::with_capacity(names.len());
    for (i, ((name, doc), output)) in names.iter().zip(extracted).zip(outputs).enumerate() {
        pb.set_message(name.clone());
        let written = output.and_then(|output| {
            let doc = doc?;
            persist_document(store, &output, &doc)?;
            Ok((output, doc))
        });

        match written {
            Ok((output, doc)) => {
                info!(
                    source = %name,
                    output = %output,
                    words = doc.statistics.word_count,
                    links = doc.links.len(),
                    images = doc.images.len(),
                    "processed"
                );
                results.push(ManifestEntry::success(name, output));
            }
            Err(e) => {
                warn!(source = %name, error = %e, "processing failed");
                results.push(ManifestEntry::failed(name, e.to_string()));
            }
        }
        pb.inc(1);

        if !throttle.is_zero() && i + 1 < names.len() {
            tokio::time::sleep(throttle).await;
        }
    }
    pb.finish_and_clear();

    ProcessingManifest::from_results(results)
}

/// Run the stage: wait for the fetch marker, process, publish the manifest.
pub async fn run<S: DurableStore>(store: &S, settings: &Settings) -> Result<ProcessingManifest> {
    let mut stage = StageRun::new(Stage::Process);

    let marker = await_upstream(store, stage.stage(), &settings.handoff()).await?;
    serde_json::from_slice::<serde_json::Value>(&marker).map_err(|source| {
        PipelineError::MalformedManifest {
            name: FETCH_MARKER.to_string(),
            source,
        }
    })?;
    stage.running();

    store.ensure(Area::Processed)?;
    store.ensure(Area::Status)?;

    let names = store.list(Area::Raw, RAW_EXTENSION)?;
    info!(files = names.len(), "raw documents found");

    let manifest = process_all(store, &names, settings.throttle()).await;
    signal_done(store, Stage::Process, &serde_json::to_vec_pretty(&manifest)?)?;
    stage.done();

    info!(
        files_found = manifest.files_found,
        successful = manifest.successful,
        failed = manifest.failed,
        "processing complete"
    );
    Ok(manifest)
}

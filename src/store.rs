//! The shared durable store both stages coordinate through.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    Raw,
    Processed,
    Status,
    Analysis,
}

/// Read, list and atomically publish artifacts, grouped by [`Area`].
pub trait DurableStore: Sync {
    /// Make sure `area` can be written to.
    fn ensure(&self, area: Area) -> Result<()>;

    /// Names in `area` ending in `.{extension}`, sorted lexicographically.
    fn list(&self, area: Area, extension: &str) -> Result<Vec<String>>;

    fn exists(&self, area: Area, name: &str) -> bool;

    fn read(&self, area: Area, name: &str) -> Result<Vec<u8>>;

    /// Write `bytes` so that readers see either nothing or all of it.
    fn publish(&self, area: Area, name: &str, bytes: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FsStore {
    raw: PathBuf,
    processed: PathBuf,
    status: PathBuf,
    analysis: PathBuf,
}

impl FsStore {
    pub fn new(settings: &Settings) -> Self {
        FsStore {
            raw: settings.raw_dir(),
            processed: settings.processed_dir(),
            status: settings.status_dir(),
            analysis: settings.analysis_dir(),
        }
    }

    pub fn dir(&self, area: Area) -> &PathBuf {
        match area {
            Area::Raw => &self.raw,
            Area::Processed => &self.processed,
            Area::Status => &self.status,
            Area::Analysis => &self.analysis,
        }
    }

    pub fn path(&self, area: Area, name: &str) -> PathBuf {
        self.dir(area).join(name)
    }
}

impl DurableStore for FsStore {
    fn ensure(&self, area: Area) -> Result<()> {
        let dir = self.dir(area);
        fs::create_dir_all(dir).map_err(|source| PipelineError::Unreachable {
            path: dir.clone(),
            source,
        })
    }

    fn list(&self, area: Area, extension: &str) -> Result<Vec<String>> {
        let dir = self.dir(area);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // nothing was ever produced here
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PipelineError::Read {
                    path: dir.clone(),
                    source,
                })
            }
        };

        let suffix = format!(".{extension}");
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(&suffix) && !is_staging_name(name))
            .collect();
        names.sort();
        Ok(names)
    }

    fn exists(&self, area: Area, name: &str) -> bool {
        self.path(area, name).is_file()
    }

    fn read(&self, area: Area, name: &str) -> Result<Vec<u8>> {
        let path = self.path(area, name);
        fs::read(&path).map_err(|source| PipelineError::Read { path, source })
    }

    fn publish(&self, area: Area, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.path(area, name);
        let staging = self.path(area, &staging_name(name));
        let persist_err = |source| PipelineError::Persist {
            path: target.clone(),
            source,
        };

        let written = (|| -> io::Result<()> {
            let mut file = fs::File::create(&staging)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&staging, &target)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(persist_err(e));
        }
        Ok(())
    }
}

fn staging_name(name: &str) -> String {
    format!(".{name}.partial")
}

fn is_staging_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".partial")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn store_in(root: &Path) -> FsStore {
        FsStore::new(&Settings::rooted_at(root))
    }

    #[test]
    fn publish_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure(Area::Status).unwrap();
        store.publish(Area::Status, "done.json", b"{}").unwrap();
        assert!(store.exists(Area::Status, "done.json"));
        assert_eq!(store.read(Area::Status, "done.json").unwrap(), b"{}");
        assert!(!store.path(Area::Status, ".done.json.partial").exists());
    }

    #[test]
    fn list_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure(Area::Raw).unwrap();
        for name in ["b.html", "a.html", "notes.txt", "c.htm"] {
            fs::write(store.path(Area::Raw, name), "x").unwrap();
        }
        fs::write(store.path(Area::Raw, ".d.html.partial"), "x").unwrap();
        assert_eq!(store.list(Area::Raw, "html").unwrap(), vec!["a.html", "b.html"]);
    }

    #[test]
    fn list_of_missing_area_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir.path().join("nowhere"));
        assert!(store.list(Area::Processed, "json").unwrap().is_empty());
    }

    #[test]
    fn publish_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.publish(Area::Analysis, "final_report.json", b"{}").unwrap_err();
        assert!(matches!(err, PipelineError::Persist { .. }));
    }

    #[test]
    fn ensure_fails_when_a_file_blocks_the_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("status"), "not a dir").unwrap();
        let store = store_in(dir.path());
        let err = store.ensure(Area::Status).unwrap_err();
        assert!(matches!(err, PipelineError::Unreachable { .. }));
    }
}

//! Runtime settings shared by both stage binaries.
//!
//! Sources are layered with the `config` crate: built-in defaults, an
//! optional TOML file, `CORPUS_*` environment variables, then whatever the
//! caller passes in as CLI overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::handoff::Handoff;

pub const DEFAULT_CONFIG_FILE: &str = "corpus.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub shared_root: PathBuf,
    #[serde(default)]
    pub raw_dir: Option<PathBuf>,
    #[serde(default)]
    pub processed_dir: Option<PathBuf>,
    #[serde(default)]
    pub status_dir: Option<PathBuf>,
    #[serde(default)]
    pub analysis_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub wait_timeout_secs: Option<u64>,
    pub throttle_ms: u64,
}

/// Values given on the command line; `None` leaves the layered value alone.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub shared_root: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub wait_timeout_secs: Option<u64>,
    pub throttle_ms: Option<u64>,
}

impl Settings {
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(overrides, Environment::with_prefix("CORPUS"))
    }

    fn load_with_env(overrides: &Overrides, env: Environment) -> Result<Self> {
        let file = overrides
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        // an explicitly named file must exist, the default one is optional
        let required = overrides.config_file.is_some();

        let settings = Config::builder()
            .set_default("shared_root", "/shared")?
            .set_default("poll_interval_ms", 2000)?
            .set_default("throttle_ms", 200)?
            .add_source(File::from(file.as_path()).required(required))
            .add_source(env)
            .set_override_option(
                "shared_root",
                overrides
                    .shared_root
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("poll_interval_ms", overrides.poll_interval_ms)?
            .set_override_option("wait_timeout_secs", overrides.wait_timeout_secs)?
            .set_override_option("throttle_ms", overrides.throttle_ms)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Settings rooted at `root` with no polling delay or throttle, for tests.
    pub fn rooted_at(root: &Path) -> Self {
        Settings {
            shared_root: root.to_path_buf(),
            raw_dir: None,
            processed_dir: None,
            status_dir: None,
            analysis_dir: None,
            poll_interval_ms: 10,
            wait_timeout_secs: None,
            throttle_ms: 0,
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.area_dir(&self.raw_dir, "raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.area_dir(&self.processed_dir, "processed")
    }

    pub fn status_dir(&self) -> PathBuf {
        self.area_dir(&self.status_dir, "status")
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.area_dir(&self.analysis_dir, "analysis")
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn handoff(&self) -> Handoff {
        Handoff {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            deadline: self.wait_timeout_secs.map(Duration::from_secs),
        }
    }

    fn area_dir(&self, explicit: &Option<PathBuf>, default_name: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| self.shared_root.join(default_name))
    }
}

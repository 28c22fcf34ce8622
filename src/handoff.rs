//! Stage handoff over completion markers in the shared store.
//!
//! Each stage publishes exactly one marker when it is done; a downstream
//! stage polls for its upstream marker before starting. Markers are always
//! published atomically, so an existing marker is a complete one.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::store::{Area, DurableStore};

pub const FETCH_MARKER: &str = "fetch_complete.json";
pub const PROCESS_MARKER: &str = "process_complete.json";
pub const REPORT_FILE: &str = "final_report.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// External crawl; only its marker is observed.
    Fetch,
    Process,
    Analyze,
}

impl Stage {
    /// Where this stage signals completion.
    pub fn marker(self) -> (Area, &'static str) {
        match self {
            Stage::Fetch => (Area::Status, FETCH_MARKER),
            Stage::Process => (Area::Status, PROCESS_MARKER),
            Stage::Analyze => (Area::Analysis, REPORT_FILE),
        }
    }

    pub fn upstream(self) -> Option<Stage> {
        match self {
            Stage::Fetch => None,
            Stage::Process => Some(Stage::Fetch),
            Stage::Analyze => Some(Stage::Process),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Process => "process",
            Stage::Analyze => "analyze",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StageState {
    Waiting,
    Running,
    Done,
}

/// Polling behaviour while waiting on an upstream marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub deadline: Option<Duration>,
}

impl Default for Handoff {
    fn default() -> Self {
        Handoff {
            poll_interval: Duration::from_secs(2),
            deadline: None,
        }
    }
}

/// Lifecycle of one stage run. States only move forward.
#[derive(Debug)]
pub struct StageRun {
    stage: Stage,
    state: StageState,
    started: Instant,
}

impl StageRun {
    pub fn new(stage: Stage) -> Self {
        info!(stage = %stage, state = ?StageState::Waiting, "stage created");
        StageRun {
            stage,
            state: StageState::Waiting,
            started: Instant::now(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn running(&mut self) {
        self.advance(StageState::Running);
    }

    pub fn done(&mut self) {
        self.advance(StageState::Done);
    }

    fn advance(&mut self, next: StageState) {
        if next <= self.state {
            debug!(stage = %self.stage, from = ?self.state, to = ?next, "ignoring backward transition");
            return;
        }
        info!(
            stage = %self.stage,
            from = ?self.state,
            to = ?next,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "stage transition"
        );
        self.state = next;
    }
}

/// Wait until the upstream marker of `stage` exists and return its bytes.
///
/// A stage without upstream starts immediately with an empty marker.
pub async fn await_upstream<S: DurableStore>(
    store: &S,
    stage: Stage,
    handoff: &Handoff,
) -> Result<Vec<u8>> {
    let Some(upstream) = stage.upstream() else {
        return Ok(Vec::new());
    };
    let (area, name) = upstream.marker();

    let poll = async {
        let mut attempts: u64 = 0;
        loop {
            if store.exists(area, name) {
                info!(stage = %stage, marker = name, attempts, "upstream marker observed");
                return store.read(area, name);
            }
            attempts += 1;
            debug!(stage = %stage, marker = name, attempts, "waiting for upstream marker");
            tokio::time::sleep(handoff.poll_interval).await;
        }
    };

    match handoff.deadline {
        None => poll.await,
        Some(limit) => match tokio::time::timeout(limit, poll).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::HandoffTimeout {
                marker: name.to_string(),
                waited: limit,
            }),
        },
    }
}

/// Publish the completion marker of `stage`.
pub fn signal_done<S: DurableStore>(store: &S, stage: Stage, bytes: &[u8]) -> Result<()> {
    let (area, name) = stage.marker();
    store.ensure(area)?;
    store.publish(area, name, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::store::FsStore;

    fn quick(deadline_ms: Option<u64>) -> Handoff {
        Handoff {
            poll_interval: Duration::from_millis(5),
            deadline: deadline_ms.map(Duration::from_millis),
        }
    }

    #[test]
    fn graph_edges() {
        assert_eq!(Stage::Fetch.upstream(), None);
        assert_eq!(Stage::Process.upstream(), Some(Stage::Fetch));
        assert_eq!(Stage::Analyze.upstream(), Some(Stage::Process));
        assert_eq!(Stage::Process.marker(), (Area::Status, PROCESS_MARKER));
    }

    #[test]
    fn transitions_only_move_forward() {
        let mut run = StageRun::new(Stage::Process);
        assert_eq!(run.state(), StageState::Waiting);
        run.running();
        run.done();
        run.running();
        assert_eq!(run.state(), StageState::Done);
    }

    #[tokio::test]
    async fn returns_marker_that_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(&Settings::rooted_at(dir.path()));
        signal_done(&store, Stage::Fetch, br#"{"pages": 3}"#).unwrap();
        let bytes = await_upstream(&store, Stage::Process, &quick(Some(1000))).await.unwrap();
        assert_eq!(bytes, br#"{"pages": 3}"#);
    }

    #[tokio::test]
    async fn picks_up_marker_published_later() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(&Settings::rooted_at(dir.path()));
        let writer = store.clone();
        let publish = async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            signal_done(&writer, Stage::Process, b"{}").unwrap();
        };
        let handoff = quick(Some(5000));
        let (bytes, ()) = tokio::join!(await_upstream(&store, Stage::Analyze, &handoff), publish);
        assert_eq!(bytes.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn deadline_expires_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(&Settings::rooted_at(dir.path()));
        let err = await_upstream(&store, Stage::Process, &quick(Some(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::HandoffTimeout { ref marker, .. } if marker == FETCH_MARKER));
    }

    #[tokio::test]
    async fn fetch_stage_never_waits() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(&Settings::rooted_at(dir.path()));
        let bytes = await_upstream(&store, Stage::Fetch, &quick(Some(1))).await.unwrap();
        assert!(bytes.is_empty());
    }
}

//! Canonical log data for one watched run: steps in index order, each owning an
//! append-only sequence of leveled entries.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::stream::StepPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    InProgress,
    Queued,
    Requested,
    Waiting,
    Pending,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::InProgress => "in progress",
            Self::Queued => "queued",
            Self::Requested => "requested",
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    Neutral,
    #[serde(other)]
    Unknown,
}

/// Severity assigned by the acquisition side; never re-derived here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub level: LogLevel,
    pub step_name: String,
}

/// `entries` only ever grows. Entries are shared with filtered snapshots via `Arc`.
#[derive(Debug, Clone)]
pub struct StepLogs {
    pub index: usize,
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub entries: Vec<Arc<LogEntry>>,
}

impl StepLogs {
    pub fn new(index: usize, name: String, status: RunStatus) -> Self {
        Self {
            index,
            name,
            status,
            conclusion: None,
            entries: Vec::new(),
        }
    }
}

/// What happened to the store when a payload was merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    Inserted,
    Appended,
}

#[derive(Debug, Clone, Default)]
pub struct RunLogs {
    pub name: String,
    pub branch: String,
    steps: Vec<StepLogs>,
}

impl RunLogs {
    pub fn new(name: String, branch: String) -> Self {
        Self {
            name,
            branch,
            steps: Vec::new(),
        }
    }

    /// Steps in ascending `index` order.
    pub fn steps(&self) -> &[StepLogs] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepLogs> {
        self.position(index).ok().map(|pos| &self.steps[pos])
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut StepLogs> {
        match self.position(index) {
            Ok(pos) => Some(&mut self.steps[pos]),
            Err(_) => None,
        }
    }

    pub fn total_entries(&self) -> usize {
        self.steps.iter().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends to an existing step (refreshing its status/conclusion) or inserts a
    /// new step at its index position. Existing entries are never touched.
    pub fn merge_step(&mut self, payload: StepPayload) -> MergeKind {
        let StepPayload {
            index,
            name,
            status,
            conclusion,
            entries,
        } = payload;
        match self.position(index) {
            Ok(pos) => {
                let step = &mut self.steps[pos];
                step.status = status;
                step.conclusion = conclusion;
                step.entries.extend(entries.into_iter().map(Arc::new));
                MergeKind::Appended
            }
            Err(pos) => {
                let mut step = StepLogs::new(index, name, status);
                step.conclusion = conclusion;
                step.entries = entries.into_iter().map(Arc::new).collect();
                self.steps.insert(pos, step);
                MergeKind::Inserted
            }
        }
    }

    fn position(&self, index: usize) -> Result<usize, usize> {
        self.steps.binary_search_by_key(&index, |s| s.index)
    }
}

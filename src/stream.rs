//! Incremental updates delivered by the poller while a run is still active.

use crate::logs::{Conclusion, LogEntry, MergeKind, RunLogs, RunStatus};

/// New entries for one step. `index` identifies the step within the run.
#[derive(Debug, Clone)]
pub struct StepPayload {
    pub index: usize,
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct StreamUpdate {
    pub status: Option<RunStatus>,
    pub conclusion: Option<Conclusion>,
    pub new_steps: Vec<StepPayload>,
    pub error: Option<String>,
}

impl StreamUpdate {
    pub fn failed(error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status == Some(RunStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted_steps: usize,
    pub appended_steps: usize,
    pub new_entries: usize,
}

impl MergeStats {
    pub fn changed(&self) -> bool {
        self.inserted_steps > 0 || self.new_entries > 0
    }
}

/// Merges payloads strictly in the order given.
pub fn merge(logs: &mut RunLogs, payloads: Vec<StepPayload>) -> MergeStats {
    let mut stats = MergeStats::default();
    for payload in payloads {
        stats.new_entries += payload.entries.len();
        match logs.merge_step(payload) {
            MergeKind::Inserted => stats.inserted_steps += 1,
            MergeKind::Appended => stats.appended_steps += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogLevel;
    use chrono::Utc;

    fn payload(index: usize, n: usize) -> StepPayload {
        StepPayload {
            index,
            name: format!("step {index}"),
            status: RunStatus::InProgress,
            conclusion: None,
            entries: (0..n)
                .map(|i| LogEntry {
                    timestamp: Utc::now(),
                    content: format!("line {i}"),
                    level: LogLevel::Info,
                    step_name: format!("step {index}"),
                })
                .collect(),
        }
    }

    #[test]
    fn merge_counts_inserts_and_appends() {
        let mut logs = RunLogs::default();
        let stats = merge(&mut logs, vec![payload(0, 2), payload(1, 1)]);
        assert_eq!(
            stats,
            MergeStats {
                inserted_steps: 2,
                appended_steps: 0,
                new_entries: 3
            }
        );
        let stats = merge(&mut logs, vec![payload(1, 4)]);
        assert_eq!(stats.appended_steps, 1);
        assert_eq!(stats.new_entries, 4);
        assert_eq!(logs.total_entries(), 7);
    }

    #[test]
    fn empty_append_is_not_a_change() {
        let mut logs = RunLogs::default();
        merge(&mut logs, vec![payload(0, 1)]);
        let stats = merge(&mut logs, vec![payload(0, 0)]);
        assert!(!stats.changed());
    }

    #[test]
    fn terminal_status() {
        let update = StreamUpdate {
            status: Some(RunStatus::Completed),
            ..StreamUpdate::default()
        };
        assert!(update.is_terminal());
        assert!(!StreamUpdate::failed("boom".to_string()).is_terminal());
    }
}

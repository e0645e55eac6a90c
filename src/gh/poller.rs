//! Background polling loop that turns full `gh` log snapshots into append-only deltas.
//!
//! `gh run view --log` always returns the whole log, so [`DeltaTracker`] remembers how
//! many entries of each step were already delivered and forwards only the new tail.
//! Steps are numbered by `(job, step)` name, so a snapshot that lists steps in a new
//! order still appends to the right step.
//! The polling interval is controlled externally via a `watch::Receiver<u64>`; on
//! consecutive failures the delay grows as `base × 2^failures` up to `MAX_BACKOFF_SECS`.

use crate::events::AppEvent;
use crate::gh::executor::LogSource;
use crate::gh::parser::{self, RunMeta, StepIndices};
use crate::logs::{Conclusion, RunStatus};
use crate::stream::{StepPayload, StreamUpdate};
use color_eyre::eyre::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time;

const MAX_BACKOFF_SECS: u64 = 300;

/// Compute backoff delay: `min(base_interval * 2^failures, MAX_BACKOFF_SECS)`.
pub fn backoff_delay(base_interval: u64, failures: u32) -> u64 {
    let multiplier = 1u64.checked_shl(failures).unwrap_or(u64::MAX);
    base_interval
        .saturating_mul(multiplier)
        .clamp(1, MAX_BACKOFF_SECS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Delivered {
    entries: usize,
    status: RunStatus,
    conclusion: Option<Conclusion>,
}

/// Per-step record of what the viewer has already received.
#[derive(Debug, Default)]
pub struct DeltaTracker {
    indices: StepIndices,
    delivered: HashMap<usize, Delivered>,
}

impl DeltaTracker {
    /// Reduces a full snapshot to the payloads the viewer has not seen: new steps, new
    /// trailing entries, and steps whose status changed.
    pub fn delta(&mut self, snapshot: Vec<StepPayload>) -> Vec<StepPayload> {
        let mut out = Vec::new();
        for mut payload in snapshot {
            let seen = self.delivered.get(&payload.index).copied();
            let already = seen.map_or(0, |d| d.entries);
            if payload.entries.len() < already {
                tracing::warn!(
                    step = payload.index,
                    had = already,
                    now = payload.entries.len(),
                    "step log shrank, keeping delivered entries"
                );
                continue;
            }
            payload.entries.drain(..already);

            let state = Delivered {
                entries: already + payload.entries.len(),
                status: payload.status,
                conclusion: payload.conclusion,
            };
            if seen == Some(state) {
                continue;
            }
            self.delivered.insert(payload.index, state);
            out.push(payload);
        }
        out
    }

    pub fn delivered_entries(&self) -> usize {
        self.delivered.values().map(|d| d.entries).sum()
    }
}

pub struct LogPoller {
    source: Arc<dyn LogSource>,
    run_id: u64,
    job_id: Option<u64>,
    tx: mpsc::UnboundedSender<AppEvent>,
    interval_rx: watch::Receiver<u64>,
    tracker: DeltaTracker,
}

enum PollOutcome {
    Active,
    Finished,
    Failure,
    ChannelClosed,
}

impl LogPoller {
    pub fn new(
        source: Arc<dyn LogSource>,
        run_id: u64,
        job_id: Option<u64>,
        tx: mpsc::UnboundedSender<AppEvent>,
        interval_rx: watch::Receiver<u64>,
    ) -> Self {
        Self {
            source,
            run_id,
            job_id,
            tx,
            interval_rx,
            tracker: DeltaTracker::default(),
        }
    }

    pub async fn run(mut self) {
        let mut failures: u32 = 0;
        loop {
            match self.poll_once().await {
                PollOutcome::Active => failures = 0,
                PollOutcome::Failure => failures = failures.saturating_add(1),
                PollOutcome::Finished => {
                    tracing::debug!(
                        run_id = self.run_id,
                        entries = self.tracker.delivered_entries(),
                        "run completed, poller stopping"
                    );
                    return;
                }
                PollOutcome::ChannelClosed => return,
            }

            let base_interval = *self.interval_rx.borrow();
            let delay = if failures > 0 {
                backoff_delay(base_interval, failures)
            } else {
                base_interval
            };
            tokio::select! {
                () = time::sleep(time::Duration::from_secs(delay)) => {},
                _ = self.interval_rx.changed() => {},
            }
        }
    }

    async fn poll_once(&mut self) -> PollOutcome {
        let update = match self.fetch_update().await {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(run_id = self.run_id, "poll failed: {e}");
                let update = StreamUpdate::failed(format!("{e}"));
                return if self.tx.send(AppEvent::LogUpdate(update)).is_err() {
                    PollOutcome::ChannelClosed
                } else {
                    PollOutcome::Failure
                };
            }
        };

        let finished = update.is_terminal();
        if self.tx.send(AppEvent::LogUpdate(update)).is_err() {
            tracing::warn!("log update channel closed");
            return PollOutcome::ChannelClosed;
        }
        if finished {
            PollOutcome::Finished
        } else {
            PollOutcome::Active
        }
    }

    async fn fetch_update(&mut self) -> Result<StreamUpdate> {
        let meta = parser::parse_run_meta(&self.source.fetch_run(self.run_id).await?)?;
        let log = self.source.fetch_log(self.run_id, self.job_id).await?;
        Ok(build_update(&mut self.tracker, &meta, log.as_deref()))
    }
}

/// One poll's worth of changes. A completed run whose log is not downloadable yet is
/// reported as still running so the next poll retries the log.
pub fn build_update(tracker: &mut DeltaTracker, meta: &RunMeta, log: Option<&str>) -> StreamUpdate {
    let Some(raw) = log else {
        return StreamUpdate {
            status: Some(match meta.status {
                RunStatus::Completed => RunStatus::InProgress,
                other => other,
            }),
            ..StreamUpdate::default()
        };
    };
    let snapshot = parser::to_payloads(parser::parse_log(raw), meta, &mut tracker.indices);
    StreamUpdate {
        status: Some(meta.status),
        conclusion: meta.conclusion,
        new_steps: tracker.delta(snapshot),
        error: None,
    }
}

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::logs::{Conclusion, LogEntry, LogLevel, RunStatus};
use crate::stream::StepPayload;

/// `gh run view --json name,displayTitle,headBranch,status,conclusion,jobs`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_title: String,
    #[serde(default)]
    pub head_branch: String,
    pub status: RunStatus,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub jobs: Vec<JobMeta>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMeta {
    #[serde(default)]
    pub database_id: u64,
    pub name: String,
    pub status: RunStatus,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub steps: Vec<StepMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepMeta {
    pub name: String,
    pub status: RunStatus,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub number: u64,
}

impl RunMeta {
    pub fn title(&self) -> &str {
        if self.display_title.is_empty() {
            &self.name
        } else {
            &self.display_title
        }
    }

    /// Status for a step seen in the log. Steps the API does not list yet inherit
    /// the run's progress.
    pub fn step_state(&self, job: &str, step: &str) -> (RunStatus, Option<Conclusion>) {
        self.jobs
            .iter()
            .filter(|j| j.name == job)
            .flat_map(|j| j.steps.iter())
            .find(|s| s.name == step)
            .map_or_else(
                || match self.status {
                    RunStatus::Completed => (RunStatus::Completed, None),
                    _ => (RunStatus::InProgress, None),
                },
                |s| (s.status, s.conclusion),
            )
    }
}

/// The API reports a pending conclusion as `""` rather than `null`.
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<Conclusion>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(|s| {
        serde_json::from_value(serde_json::Value::String(s)).unwrap_or(Conclusion::Unknown)
    }))
}

pub fn parse_run_meta(json: &str) -> Result<RunMeta> {
    let meta: RunMeta = serde_json::from_str(json)?;
    Ok(meta)
}

/// One `(job, step)` pair from `gh run view --log`, in order of first appearance.
#[derive(Debug, Clone)]
pub struct ParsedStep {
    pub job: String,
    pub step: String,
    pub entries: Vec<LogEntry>,
}

const MARKERS: &[(&str, LogLevel)] = &[
    ("##[error]", LogLevel::Error),
    ("##[warning]", LogLevel::Warning),
    ("##[debug]", LogLevel::Debug),
    ("##[notice]", LogLevel::Info),
    ("##[group]", LogLevel::Info),
    ("##[command]", LogLevel::Info),
    ("##[section]", LogLevel::Info),
];

/// Level and display text for one log line. `None` for lines that carry no content
/// (group terminators).
pub fn classify_line(text: &str) -> Option<(LogLevel, &str)> {
    if text.starts_with("##[endgroup]") {
        return None;
    }
    for (marker, level) in MARKERS {
        if let Some(rest) = text.strip_prefix(*marker) {
            return Some((*level, rest));
        }
    }
    let head = text.trim_start();
    let level = if starts_with_ignore_case(head, "error:") {
        LogLevel::Error
    } else if starts_with_ignore_case(head, "warning:") {
        LogLevel::Warning
    } else {
        LogLevel::Info
    };
    Some((level, text))
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Splits `JOB\tSTEP\tTIMESTAMP CONTENT`. Lines without both tabs are not log lines.
fn split_fields(line: &str) -> Option<(&str, &str, &str)> {
    let mut parts = line.splitn(3, '\t');
    let job = parts.next()?;
    let step = parts.next()?;
    let rest = parts.next()?;
    Some((job, step, rest.trim_start_matches('\u{feff}')))
}

fn split_timestamp(rest: &str) -> (Option<DateTime<Utc>>, &str) {
    let (head, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    match DateTime::parse_from_rfc3339(head) {
        Ok(ts) => (Some(ts.with_timezone(&Utc)), tail),
        Err(_) => (None, rest),
    }
}

/// Parses the full text of `gh run view --log`. Untimestamped lines reuse the
/// previous line's timestamp.
pub fn parse_log(raw: &str) -> Vec<ParsedStep> {
    let mut steps: Vec<ParsedStep> = Vec::new();
    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();
    let mut last_timestamp = DateTime::<Utc>::default();

    for line in raw.lines() {
        let Some((job, step, rest)) = split_fields(line.trim_end_matches('\r')) else {
            continue;
        };
        let position = *positions.entry((job, step)).or_insert_with(|| {
            steps.push(ParsedStep {
                job: job.to_string(),
                step: step.to_string(),
                entries: Vec::new(),
            });
            steps.len() - 1
        });

        let (timestamp, text) = split_timestamp(rest);
        let timestamp = timestamp.unwrap_or(last_timestamp);
        last_timestamp = timestamp;

        let Some((level, content)) = classify_line(text) else {
            continue;
        };
        steps[position].entries.push(LogEntry {
            timestamp,
            content: content.to_string(),
            level,
            step_name: step.to_string(),
        });
    }
    steps
}

/// Stable step numbering across snapshots, keyed by `(job, step)`. A step keeps the
/// index it got when first seen, even if a later snapshot lists it in another position.
#[derive(Debug, Default)]
pub struct StepIndices {
    by_key: HashMap<(String, String), usize>,
}

impl StepIndices {
    pub fn index_of(&mut self, job: &str, step: &str) -> usize {
        let next = self.by_key.len();
        *self
            .by_key
            .entry((job.to_string(), step.to_string()))
            .or_insert(next)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Numbers parsed steps through `indices` and attaches API status. Step names are
/// prefixed with the job name only when the log spans several jobs.
pub fn to_payloads(
    steps: Vec<ParsedStep>,
    meta: &RunMeta,
    indices: &mut StepIndices,
) -> Vec<StepPayload> {
    let multi_job = steps
        .first()
        .is_some_and(|first| steps.iter().any(|s| s.job != first.job));
    steps
        .into_iter()
        .map(|parsed| {
            let index = indices.index_of(&parsed.job, &parsed.step);
            let (status, conclusion) = meta.step_state(&parsed.job, &parsed.step);
            let name = if multi_job {
                format!("{} / {}", parsed.job, parsed.step)
            } else {
                parsed.step
            };
            StepPayload {
                index,
                name,
                status,
                conclusion,
                entries: parsed.entries,
            }
        })
        .collect()
}

//! Level/step/search filtering over a [`RunLogs`] store.
//!
//! A [`Filter`] is compiled once from a [`FilterConfig`] and can be applied any number of
//! times. Checks run cheapest first: step scope and level prune the candidate set before
//! any content is scanned, so search cost scales with the surviving entries only.

use regex::{Regex, RegexBuilder};
use std::sync::Arc;

use crate::error::FilterError;
use crate::logs::{Conclusion, LogEntry, LogLevel, RunLogs, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Warnings,
    Errors,
}

impl LevelFilter {
    pub fn admits(self, level: LogLevel) -> bool {
        match self {
            Self::All => true,
            Self::Warnings => matches!(level, LogLevel::Warning | LogLevel::Error),
            Self::Errors => level == LogLevel::Error,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::All => Self::Warnings,
            Self::Warnings => Self::Errors,
            Self::Errors => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Warnings => "warnings",
            Self::Errors => "errors",
        }
    }
}

/// Value type; a [`Filter`] keeps its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterConfig {
    pub level: LevelFilter,
    pub search: String,
    pub case_sensitive: bool,
    pub regex: bool,
    /// `None` = all steps.
    pub step: Option<usize>,
}

/// Half-open byte span into `LogEntry::content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPosition {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct FilteredEntry {
    pub entry: Arc<LogEntry>,
    /// Position of `entry` within its source step.
    pub entry_index: usize,
    /// Ascending, non-overlapping.
    pub matches: Vec<MatchPosition>,
}

#[derive(Debug, Clone)]
pub struct FilteredStep {
    pub index: usize,
    pub name: String,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub entries: Vec<FilteredEntry>,
}

/// Snapshot of a filter application. Steps and entries keep their source order.
#[derive(Debug, Clone, Default)]
pub struct FilteredResult {
    pub steps: Vec<FilteredStep>,
}

impl FilteredResult {
    pub fn total_entries(&self) -> usize {
        self.steps.iter().map(|s| s.entries.len()).sum()
    }

    pub fn total_matches(&self) -> usize {
        self.steps
            .iter()
            .flat_map(|s| &s.entries)
            .map(|e| e.matches.len())
            .sum()
    }

    pub fn step(&self, index: usize) -> Option<&FilteredStep> {
        self.steps.iter().find(|s| s.index == index)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Selected once in [`Filter::new`]; the scan loop never re-decides the mode.
#[derive(Debug, Clone)]
enum Matcher {
    None,
    Exact(String),
    /// ASCII needle; folding never changes byte lengths so spans stay valid.
    AsciiFolded(Vec<u8>),
    Pattern(Regex),
}

impl Matcher {
    fn compile(config: &FilterConfig) -> Result<Self, FilterError> {
        let term = config.search.as_str();
        if term.is_empty() {
            return Ok(Self::None);
        }
        if config.regex {
            return build_regex(term, term, !config.case_sensitive).map(Self::Pattern);
        }
        if config.case_sensitive {
            Ok(Self::Exact(term.to_string()))
        } else if term.is_ascii() {
            Ok(Self::AsciiFolded(term.as_bytes().to_vec()))
        } else {
            build_regex(term, &regex::escape(term), true).map(Self::Pattern)
        }
    }

    fn find(&self, content: &str) -> Vec<MatchPosition> {
        match self {
            Self::None => Vec::new(),
            Self::Exact(needle) => content
                .match_indices(needle.as_str())
                .map(|(start, m)| MatchPosition {
                    start,
                    end: start + m.len(),
                })
                .collect(),
            Self::AsciiFolded(needle) => find_ascii_folded(content.as_bytes(), needle),
            Self::Pattern(re) => re
                .find_iter(content)
                .filter(|m| !m.is_empty())
                .map(|m| MatchPosition {
                    start: m.start(),
                    end: m.end(),
                })
                .collect(),
        }
    }
}

fn build_regex(term: &str, pattern: &str, case_insensitive: bool) -> Result<Regex, FilterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| FilterError::InvalidPattern {
            pattern: term.to_string(),
            source,
        })
}

fn find_ascii_folded(haystack: &[u8], needle: &[u8]) -> Vec<MatchPosition> {
    let mut found = Vec::new();
    let n = needle.len();
    if n == 0 || haystack.len() < n {
        return found;
    }
    let first = needle[0].to_ascii_lowercase();
    let mut i = 0;
    while i + n <= haystack.len() {
        if haystack[i].to_ascii_lowercase() == first && haystack[i..i + n].eq_ignore_ascii_case(needle)
        {
            found.push(MatchPosition { start: i, end: i + n });
            i += n;
        } else {
            i += 1;
        }
    }
    found
}

#[derive(Debug, Clone)]
pub struct Filter {
    config: FilterConfig,
    matcher: Matcher,
}

impl Filter {
    /// Fails only when regex mode is on and the search term is not a valid pattern.
    pub fn new(config: FilterConfig) -> Result<Self, FilterError> {
        let matcher = Matcher::compile(&config)?;
        Ok(Self { config, matcher })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn is_searching(&self) -> bool {
        !matches!(self.matcher, Matcher::None)
    }

    /// All match spans of the search term in `content`. Pure; safe to call on its own.
    pub fn find_matches(&self, content: &str) -> Vec<MatchPosition> {
        self.matcher.find(content)
    }

    pub fn apply(&self, logs: &RunLogs) -> FilteredResult {
        let mut steps = Vec::new();
        for step in logs.steps() {
            if self.config.step.is_some_and(|only| only != step.index) {
                continue;
            }
            let mut entries = Vec::new();
            for (entry_index, entry) in step.entries.iter().enumerate() {
                if !self.config.level.admits(entry.level) {
                    continue;
                }
                let matches = self.matcher.find(&entry.content);
                if self.is_searching() && matches.is_empty() {
                    continue;
                }
                entries.push(FilteredEntry {
                    entry: Arc::clone(entry),
                    entry_index,
                    matches,
                });
            }
            if !entries.is_empty() {
                steps.push(FilteredStep {
                    index: step.index,
                    name: step.name.clone(),
                    status: step.status,
                    conclusion: step.conclusion,
                    entries,
                });
            }
        }
        FilteredResult { steps }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            config: FilterConfig::default(),
            matcher: Matcher::None,
        }
    }
}

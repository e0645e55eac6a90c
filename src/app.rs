//! Viewer state for one run: the log store plus the current filter, filtered view,
//! match index and viewport, kept in sync on every toggle and stream update.
//!
//! Every mutation funnels through [`AppState::rebuild`] (store or filter changed) or
//! [`AppState::rebuild_index`] (collapse set changed), so the layout, match index and
//! viewport are never derived from a stale [`FilteredResult`].

use std::collections::HashSet;
use std::time::Instant;

use crate::error::FilterError;
use crate::filter::{Filter, FilterConfig, FilteredResult, LevelFilter};
use crate::layout::Layout;
use crate::logs::{Conclusion, RunLogs, RunStatus};
use crate::matches::{MatchIndex, MatchLocation};
use crate::stream::{self, MergeStats, StreamUpdate};
use crate::viewport::Viewport;

/// Log endpoints lag behind step output by a few seconds; polling faster gains nothing.
pub const POLL_INTERVAL_DEFAULT: u64 = 5;
/// Floor for the poll interval while the run waits for a runner and prints nothing.
pub const POLL_INTERVAL_QUEUED: u64 = 15;
/// Must match the length of `BRAILLE_FRAMES` in `tui::spinner`.
pub const SPINNER_FRAME_COUNT: usize = 10;
/// Below 60 cols the key hints don't fit; footer switches to a compact set.
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
pub const ERROR_TTL_SECS: u64 = 10;

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub repo: String,
    pub run_id: u64,
    pub job_id: Option<u64>,
    pub version_string: String,
}

/// Counts shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub total_entries: usize,
    pub match_count: usize,
    /// 1-based.
    pub current_match: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The stream already ended; nothing was read.
    Ignored,
    /// The update carried an error; the store was left untouched.
    Rejected,
    Merged { stats: MergeStats, followed: bool },
}

pub struct AppState {
    pub config: AppConfig,

    // Log data and derived views
    pub logs: RunLogs,
    filter: Filter,
    filtered: FilteredResult,
    matches: MatchIndex,
    layout: Layout,
    collapsed: HashSet<usize>,

    // Scrolling
    pub viewport: Viewport,
    pub auto_scroll: bool,

    // Run lifecycle
    pub status: Option<RunStatus>,
    pub conclusion: Option<Conclusion>,
    pub streaming: bool,
    /// The run was already completed when the viewer opened.
    finished_at_startup: bool,
    /// Some status showed the run queued or running while being watched.
    seen_active: bool,
    completion_notice: bool,
    /// Interval the poller was last told to use.
    pub poll_interval: u64,

    // Transient UI
    /// `Some` while the search prompt is open.
    pub search_input: Option<String>,
    pub error: Option<(String, Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
    pub desktop_notify: bool,
}

impl AppState {
    pub fn new(config: AppConfig, logs: RunLogs) -> Self {
        let mut state = Self {
            config,
            logs,
            filter: Filter::default(),
            filtered: FilteredResult::default(),
            matches: MatchIndex::default(),
            layout: Layout::default(),
            collapsed: HashSet::new(),
            viewport: Viewport::new(0),
            auto_scroll: true,
            status: None,
            conclusion: None,
            streaming: true,
            finished_at_startup: false,
            seen_active: false,
            completion_notice: false,
            poll_interval: POLL_INTERVAL_DEFAULT,
            search_input: None,
            error: None,
            spinner_frame: 0,
            should_quit: false,
            desktop_notify: true,
        };
        state.rebuild(false);
        state
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn filter_config(&self) -> &FilterConfig {
        self.filter.config()
    }

    pub fn filtered(&self) -> &FilteredResult {
        &self.filtered
    }

    pub fn matches(&self) -> &MatchIndex {
        &self.matches
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_collapsed(&self, step: usize) -> bool {
        self.collapsed.contains(&step)
    }

    // --- Pipeline ---

    /// Re-applies the filter to the store, then rebuilds the index. With `keep_match`
    /// the selected match survives if its entry is still indexed.
    fn rebuild(&mut self, keep_match: bool) {
        let held = if keep_match {
            self.matches.current().copied()
        } else {
            None
        };
        self.filtered = self.filter.apply(&self.logs);
        self.rebuild_index(held);
    }

    fn rebuild_index(&mut self, held: Option<MatchLocation>) {
        self.layout = Layout::build(&self.filtered, &self.collapsed);
        self.matches = MatchIndex::build(&self.filtered, &self.collapsed);
        self.matches.restore(held);
        self.viewport.set_total_lines(self.layout.total_lines());
        tracing::debug!(
            entries = self.filtered.total_entries(),
            matches = self.matches.len(),
            lines = self.layout.total_lines(),
            "rebuilt log view"
        );
    }

    /// Swaps in a new filter. On an invalid pattern the previous filter, view and
    /// index stay exactly as they were.
    pub fn reconfigure(&mut self, config: FilterConfig) -> Result<(), FilterError> {
        let filter = Filter::new(config)?;
        self.filter = filter;
        self.rebuild(false);
        Ok(())
    }

    fn apply_config(&mut self, config: FilterConfig) {
        if let Err(e) = self.reconfigure(config) {
            tracing::warn!("filter rejected: {e}");
            self.set_error(e.to_string());
        }
    }

    // --- Filter toggles ---

    pub fn set_level(&mut self, level: LevelFilter) {
        let mut config = self.filter_config().clone();
        config.level = level;
        self.apply_config(config);
    }

    pub fn cycle_level(&mut self) {
        self.set_level(self.filter_config().level.cycle());
    }

    pub fn set_search(&mut self, term: String) {
        let mut config = self.filter_config().clone();
        config.search = term;
        self.apply_config(config);
    }

    pub fn toggle_case_sensitive(&mut self) {
        let mut config = self.filter_config().clone();
        config.case_sensitive = !config.case_sensitive;
        self.apply_config(config);
    }

    pub fn toggle_regex(&mut self) {
        let mut config = self.filter_config().clone();
        config.regex = !config.regex;
        self.apply_config(config);
    }

    pub fn set_step_scope(&mut self, step: Option<usize>) {
        let mut config = self.filter_config().clone();
        config.step = step;
        self.apply_config(config);
    }

    /// Restricts the view to the step under the caret, or clears an existing restriction.
    pub fn toggle_scope_at_caret(&mut self) {
        if self.filter_config().step.is_some() {
            self.set_step_scope(None);
        } else if let Some(step) = self.caret_step() {
            self.set_step_scope(Some(step));
        }
    }

    // --- Collapse / expand ---

    pub fn toggle_step(&mut self, step: usize) {
        if !self.collapsed.remove(&step) {
            self.collapsed.insert(step);
        }
        let held = self.matches.current().copied();
        self.rebuild_index(held);
    }

    pub fn toggle_step_at_caret(&mut self) {
        if let Some(step) = self.caret_step() {
            self.toggle_step(step);
            if let Some(header) = self.layout.header_line(step) {
                if !self.viewport.is_visible(header) {
                    self.viewport.center_on(header);
                }
            }
        }
    }

    pub fn collapse_all(&mut self) {
        self.collapsed = self.logs.steps().iter().map(|s| s.index).collect();
        let held = self.matches.current().copied();
        self.rebuild_index(held);
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
        let held = self.matches.current().copied();
        self.rebuild_index(held);
    }

    /// The current match's line when it is on screen, otherwise the top visible line.
    pub fn caret_line(&self) -> usize {
        match self.matches.current() {
            Some(m) if self.viewport.is_visible(m.line_number) => m.line_number,
            _ => self.viewport.offset(),
        }
    }

    pub fn caret_step(&self) -> Option<usize> {
        self.layout.step_at(self.caret_line())
    }

    // --- Match navigation ---

    pub fn next_match(&mut self) {
        if let Some(line) = self.matches.next().map(|m| m.line_number) {
            self.viewport.center_on(line);
        }
    }

    pub fn previous_match(&mut self) {
        if let Some(line) = self.matches.previous().map(|m| m.line_number) {
            self.viewport.center_on(line);
        }
    }

    // --- Scrolling ---

    pub fn toggle_auto_scroll(&mut self) {
        self.auto_scroll = !self.auto_scroll;
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.viewport.scroll_up(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.viewport.scroll_down(amount);
    }

    pub fn scroll_to_top(&mut self) {
        self.viewport.scroll_to_top();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.viewport.scroll_to_bottom();
    }

    pub fn set_view_height(&mut self, height: usize) {
        self.viewport.set_height(height);
    }

    // --- Streaming ---

    /// Applies one poller update: status first, then payloads in order, then a full
    /// rebuild and the auto-scroll decision.
    pub fn apply_update(&mut self, update: StreamUpdate) -> UpdateOutcome {
        if !self.streaming {
            return UpdateOutcome::Ignored;
        }
        let terminal = update.is_terminal();

        if let Some(err) = update.error {
            tracing::warn!("stream update rejected: {err}");
            self.set_error(err);
            // A finished run must not look active just because the last poll also failed.
            if terminal {
                self.finish(update.conclusion);
            }
            return UpdateOutcome::Rejected;
        }

        if let Some(status) = update.status {
            self.observe_status(status);
        }
        if update.conclusion.is_some() {
            self.conclusion = update.conclusion;
        }

        let was_following = self.auto_scroll && self.viewport.is_near_bottom();
        let stats = stream::merge(&mut self.logs, update.new_steps);
        self.rebuild(true);
        if was_following {
            self.viewport.scroll_to_bottom();
        }
        tracing::debug!(
            new_entries = stats.new_entries,
            new_steps = stats.inserted_steps,
            followed = was_following,
            "merged stream update"
        );

        if terminal {
            self.finish(update.conclusion);
        }
        UpdateOutcome::Merged {
            stats,
            followed: was_following,
        }
    }

    fn finish(&mut self, conclusion: Option<Conclusion>) {
        self.status = Some(RunStatus::Completed);
        if conclusion.is_some() {
            self.conclusion = conclusion;
        }
        self.streaming = false;
        self.completion_notice = self.seen_active && !self.finished_at_startup;
    }

    fn observe_status(&mut self, status: RunStatus) {
        self.status = Some(status);
        if status != RunStatus::Completed {
            self.seen_active = true;
        }
    }

    /// Records the status fetched before the first poll. A run that is already
    /// completed here never raises a completion notice.
    pub fn set_startup_status(&mut self, status: RunStatus) {
        self.finished_at_startup = status == RunStatus::Completed;
        self.observe_status(status);
    }

    /// `true` once after the watched run was seen going from active to completed,
    /// and only when desktop notifications are enabled.
    pub fn take_completion_notice(&mut self) -> bool {
        std::mem::take(&mut self.completion_notice) && self.desktop_notify
    }

    /// Poll interval for the current run status: `base`, raised to
    /// [`POLL_INTERVAL_QUEUED`] while the run has not started.
    pub fn adaptive_poll_interval(&self, base: u64) -> u64 {
        match self.status {
            Some(
                RunStatus::Queued | RunStatus::Requested | RunStatus::Waiting | RunStatus::Pending,
            ) => base.max(POLL_INTERVAL_QUEUED),
            _ => base,
        }
    }

    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            total_entries: self.filtered.total_entries(),
            match_count: self.matches.len(),
            current_match: self.matches.current_position(),
        }
    }

    // --- Search prompt ---

    pub fn has_search_prompt(&self) -> bool {
        self.search_input.is_some()
    }

    pub fn open_search_prompt(&mut self) {
        self.search_input = Some(self.filter_config().search.clone());
    }

    pub fn search_push(&mut self, c: char) {
        if let Some(input) = self.search_input.as_mut() {
            input.push(c);
        }
    }

    pub fn search_pop(&mut self) {
        if let Some(input) = self.search_input.as_mut() {
            input.pop();
        }
    }

    pub fn submit_search(&mut self) {
        if let Some(term) = self.search_input.take() {
            self.set_search(term);
            self.next_match();
        }
    }

    pub fn cancel_search(&mut self) {
        self.search_input = None;
    }

    // --- Errors and ticks ---

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogEntry, LogLevel};
    use crate::stream::StepPayload;
    use chrono::Utc;

    fn entry(content: &str, level: LogLevel) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            content: content.to_string(),
            level,
            step_name: String::new(),
        }
    }

    fn payload(index: usize, entries: Vec<LogEntry>) -> StepPayload {
        StepPayload {
            index,
            name: format!("step {index}"),
            status: RunStatus::InProgress,
            conclusion: None,
            entries,
        }
    }

    fn info_lines(prefix: &str, n: usize) -> Vec<LogEntry> {
        (0..n)
            .map(|i| entry(&format!("{prefix} {i}"), LogLevel::Info))
            .collect()
    }

    fn config() -> AppConfig {
        AppConfig {
            repo: "test/repo".to_string(),
            run_id: 42,
            job_id: None,
            version_string: "ghlv test".to_string(),
        }
    }

    fn sample_state() -> AppState {
        let mut logs = RunLogs::new("CI".to_string(), "main".to_string());
        logs.merge_step(payload(
            0,
            vec![
                entry("Fetching repository", LogLevel::Info),
                entry("Checked out abc123", LogLevel::Info),
            ],
        ));
        logs.merge_step(payload(
            1,
            vec![
                entry("Compiling crate", LogLevel::Info),
                entry("deprecated API", LogLevel::Warning),
                entry("Build failed: syntax error", LogLevel::Error),
            ],
        ));
        let mut state = AppState::new(config(), logs);
        state.set_view_height(10);
        state
    }

    fn state_with_lines(n: usize, height: usize) -> AppState {
        let mut logs = RunLogs::default();
        logs.merge_step(payload(0, info_lines("line", n)));
        let mut state = AppState::new(config(), logs);
        state.set_view_height(height);
        state
    }

    fn grow(state: &mut AppState, n: usize) -> UpdateOutcome {
        state.apply_update(StreamUpdate {
            status: Some(RunStatus::InProgress),
            new_steps: vec![payload(0, info_lines("more", n))],
            ..StreamUpdate::default()
        })
    }

    #[test]
    fn initial_view_shows_everything() {
        let state = sample_state();
        assert_eq!(state.summary().total_entries, 5);
        // 2 headers + 5 entries + 2 separators
        assert_eq!(state.layout().total_lines(), 9);
        assert!(state.matches().is_empty());
    }

    #[test]
    fn errors_level_leaves_single_entry() {
        let mut state = sample_state();
        state.set_level(LevelFilter::Errors);
        assert_eq!(state.summary().total_entries, 1);
        let only = &state.filtered().steps[0].entries[0];
        assert_eq!(only.entry.content, "Build failed: syntax error");
    }

    #[test]
    fn search_builds_one_match_and_cycles() {
        let mut state = sample_state();
        state.set_search("error".to_string());
        assert_eq!(state.matches().len(), 1);
        state.next_match();
        assert_eq!(state.matches().current_index(), Some(0));
        state.next_match();
        assert_eq!(state.matches().current_index(), Some(0));
        assert_eq!(
            state.summary(),
            StatusSummary {
                total_entries: 1,
                match_count: 1,
                current_match: Some(1)
            }
        );
    }

    #[test]
    fn config_change_resets_current_match() {
        let mut state = sample_state();
        state.set_search("e".to_string());
        state.next_match();
        assert!(state.matches().current().is_some());
        state.toggle_case_sensitive();
        assert!(state.matches().current().is_none());
    }

    #[test]
    fn invalid_regex_toggle_keeps_literal_search() {
        let mut state = sample_state();
        state.set_search("[unterminated".to_string());
        assert_eq!(state.matches().len(), 0);
        state.toggle_regex();
        assert!(!state.filter_config().regex);
        assert_eq!(state.filter_config().search, "[unterminated");
        assert!(state.error_message().is_some());
    }

    #[test]
    fn failed_reconfigure_is_a_noop() {
        let mut state = sample_state();
        state.set_search("deprecated".to_string());
        state.next_match();
        let before = state.summary();
        let lines = state.layout().total_lines();

        let result = state.reconfigure(FilterConfig {
            search: "(".to_string(),
            regex: true,
            ..FilterConfig::default()
        });
        assert!(result.is_err());
        assert_eq!(state.summary(), before);
        assert_eq!(state.layout().total_lines(), lines);
        assert_eq!(state.filter_config().search, "deprecated");
    }

    #[test]
    fn collapse_removes_matches_but_not_entries() {
        let mut state = sample_state();
        state.set_search("e".to_string());
        let total = state.summary().total_entries;
        let all_matches = state.matches().len();
        let in_step_one = state
            .matches()
            .locations()
            .iter()
            .filter(|m| m.step_index == 1)
            .count();

        state.toggle_step(1);
        assert!(state.is_collapsed(1));
        assert_eq!(state.summary().total_entries, total);
        assert_eq!(state.matches().len(), all_matches - in_step_one);
        assert!(state.matches().locations().iter().all(|m| m.step_index != 1));

        state.toggle_step(1);
        assert_eq!(state.matches().len(), all_matches);
    }

    #[test]
    fn collapse_all_and_expand_all() {
        let mut state = sample_state();
        state.collapse_all();
        assert_eq!(state.layout().total_lines(), 4);
        state.expand_all();
        assert_eq!(state.layout().total_lines(), 9);
    }

    #[test]
    fn collapse_keeps_selected_match_in_other_step() {
        let mut state = sample_state();
        state.set_search("e".to_string());
        state.next_match();
        let held = *state.matches().current().unwrap();
        assert_eq!(held.step_index, 0);
        state.toggle_step(1);
        assert_eq!(
            state.matches().current().map(|m| (m.step_index, m.entry_index)),
            Some((0, held.entry_index))
        );
    }

    #[test]
    fn caret_toggles_step_under_top_line() {
        let mut state = state_with_lines(30, 10);
        state.apply_update(StreamUpdate {
            new_steps: vec![payload(1, info_lines("second", 30))],
            ..StreamUpdate::default()
        });
        state.scroll_to_top();
        assert_eq!(state.caret_step(), Some(0));
        // step 0 occupies lines 0..=31; step 1 header is line 32
        state.scroll_down(33);
        assert_eq!(state.caret_step(), Some(1));
        state.toggle_step_at_caret();
        assert!(state.is_collapsed(1));
        assert!(!state.is_collapsed(0));
    }

    #[test]
    fn caret_follows_visible_current_match() {
        let mut state = sample_state();
        state.set_search("deprecated".to_string());
        state.next_match();
        // only step 1 survives: header 0, match 1, separator 2
        assert_eq!(state.caret_line(), 1);
        assert_eq!(state.caret_step(), Some(1));
    }

    #[test]
    fn scope_toggle_at_caret() {
        let mut state = sample_state();
        state.toggle_scope_at_caret();
        assert_eq!(state.filter_config().step, Some(0));
        assert_eq!(state.summary().total_entries, 2);
        state.toggle_scope_at_caret();
        assert_eq!(state.filter_config().step, None);
        assert_eq!(state.summary().total_entries, 5);
    }

    #[test]
    fn next_match_centers_viewport() {
        let mut state = state_with_lines(100, 10);
        state.set_search("line".to_string());
        for _ in 0..51 {
            state.next_match();
        }
        // header + 50 entries before it
        let line = state.matches().current().unwrap().line_number;
        assert_eq!(line, 51);
        assert_eq!(state.viewport.offset(), 46);
    }

    #[test]
    fn auto_scroll_follows_when_caught_up() {
        let mut state = state_with_lines(50, 10);
        state.scroll_to_bottom();
        let outcome = grow(&mut state, 5);
        assert!(matches!(outcome, UpdateOutcome::Merged { followed: true, .. }));
        assert_eq!(state.viewport.offset(), state.viewport.max_offset());
        assert_eq!(state.viewport.total_lines(), 57);
    }

    #[test]
    fn auto_scroll_within_threshold_still_follows() {
        let mut state = state_with_lines(50, 10);
        state.scroll_to_bottom();
        state.scroll_up(3);
        grow(&mut state, 5);
        assert_eq!(state.viewport.offset(), state.viewport.max_offset());
    }

    #[test]
    fn auto_scroll_does_not_yank_reader() {
        let mut state = state_with_lines(50, 10);
        state.scroll_to_bottom();
        state.scroll_up(4);
        let offset = state.viewport.offset();
        let outcome = grow(&mut state, 5);
        assert!(matches!(outcome, UpdateOutcome::Merged { followed: false, .. }));
        assert_eq!(state.viewport.offset(), offset);
    }

    #[test]
    fn auto_scroll_disabled_never_follows() {
        let mut state = state_with_lines(50, 10);
        state.scroll_to_bottom();
        state.toggle_auto_scroll();
        let offset = state.viewport.offset();
        grow(&mut state, 5);
        assert_eq!(state.viewport.offset(), offset);
    }

    #[test]
    fn merge_keeps_selected_match() {
        let mut state = state_with_lines(20, 10);
        state.set_search("line 1".to_string());
        state.next_match();
        state.next_match();
        let held = *state.matches().current().unwrap();
        grow(&mut state, 3);
        assert_eq!(state.matches().current().copied(), Some(held));
    }

    #[test]
    fn stream_adds_new_step_and_status() {
        let mut state = sample_state();
        let outcome = state.apply_update(StreamUpdate {
            status: Some(RunStatus::InProgress),
            new_steps: vec![payload(2, vec![entry("Running tests", LogLevel::Info)])],
            ..StreamUpdate::default()
        });
        assert!(matches!(outcome, UpdateOutcome::Merged { .. }));
        assert_eq!(state.status, Some(RunStatus::InProgress));
        assert_eq!(state.summary().total_entries, 6);
        assert!(state.streaming);
    }

    #[test]
    fn errored_update_leaves_store_untouched() {
        let mut state = sample_state();
        let outcome = state.apply_update(StreamUpdate {
            status: Some(RunStatus::Queued),
            new_steps: vec![payload(2, vec![entry("lost", LogLevel::Info)])],
            error: Some("network down".to_string()),
            ..StreamUpdate::default()
        });
        assert_eq!(outcome, UpdateOutcome::Rejected);
        assert_eq!(state.logs.total_entries(), 5);
        assert_eq!(state.status, None);
        assert_eq!(state.error_message(), Some("network down"));
        assert!(state.streaming);
    }

    #[test]
    fn errored_terminal_update_still_ends_stream() {
        let mut state = sample_state();
        state.apply_update(StreamUpdate {
            status: Some(RunStatus::Completed),
            conclusion: Some(Conclusion::Failure),
            new_steps: vec![payload(2, vec![entry("lost", LogLevel::Info)])],
            error: Some("log fetch failed".to_string()),
        });
        assert_eq!(state.logs.total_entries(), 5);
        assert_eq!(state.status, Some(RunStatus::Completed));
        assert_eq!(state.conclusion, Some(Conclusion::Failure));
        assert!(!state.streaming);
    }

    #[test]
    fn completed_status_ends_stream() {
        let mut state = sample_state();
        state.apply_update(StreamUpdate {
            status: Some(RunStatus::Completed),
            conclusion: Some(Conclusion::Success),
            ..StreamUpdate::default()
        });
        assert!(!state.streaming);
        let outcome = state.apply_update(StreamUpdate {
            new_steps: vec![payload(5, info_lines("late", 2))],
            ..StreamUpdate::default()
        });
        assert_eq!(outcome, UpdateOutcome::Ignored);
        assert_eq!(state.logs.total_entries(), 5);
    }

    fn completed(conclusion: Conclusion) -> StreamUpdate {
        StreamUpdate {
            status: Some(RunStatus::Completed),
            conclusion: Some(conclusion),
            ..StreamUpdate::default()
        }
    }

    #[test]
    fn watched_completion_raises_notice_once() {
        let mut state = sample_state();
        state.set_startup_status(RunStatus::InProgress);
        state.apply_update(completed(Conclusion::Failure));
        assert!(state.take_completion_notice());
        assert!(!state.take_completion_notice());
    }

    #[test]
    fn run_completed_at_startup_raises_no_notice() {
        let mut state = sample_state();
        state.set_startup_status(RunStatus::Completed);
        state.apply_update(StreamUpdate {
            status: Some(RunStatus::InProgress),
            ..StreamUpdate::default()
        });
        state.apply_update(completed(Conclusion::Failure));
        assert!(!state.streaming);
        assert!(!state.take_completion_notice());
    }

    #[test]
    fn first_update_already_completed_raises_no_notice() {
        let mut state = sample_state();
        state.apply_update(completed(Conclusion::Success));
        assert!(!state.take_completion_notice());
    }

    #[test]
    fn notice_respects_desktop_notify_flag() {
        let mut state = sample_state();
        state.desktop_notify = false;
        state.set_startup_status(RunStatus::Queued);
        state.apply_update(completed(Conclusion::Success));
        assert!(!state.take_completion_notice());
    }

    #[test]
    fn queued_run_polls_slower() {
        let mut state = sample_state();
        assert_eq!(state.adaptive_poll_interval(5), 5);
        state.set_startup_status(RunStatus::Queued);
        assert_eq!(state.adaptive_poll_interval(5), POLL_INTERVAL_QUEUED);
        assert_eq!(state.adaptive_poll_interval(30), 30);
        state.apply_update(StreamUpdate {
            status: Some(RunStatus::InProgress),
            ..StreamUpdate::default()
        });
        assert_eq!(state.adaptive_poll_interval(5), 5);
    }

    #[test]
    fn search_prompt_lifecycle() {
        let mut state = sample_state();
        state.open_search_prompt();
        assert!(state.has_search_prompt());
        for c in "errx".chars() {
            state.search_push(c);
        }
        state.search_pop();
        state.search_push('o');
        state.search_push('r');
        state.submit_search();
        assert!(!state.has_search_prompt());
        assert_eq!(state.filter_config().search, "error");
        assert_eq!(state.matches().current_index(), Some(0));

        state.open_search_prompt();
        assert_eq!(state.search_input.as_deref(), Some("error"));
        state.search_push('!');
        state.cancel_search();
        assert_eq!(state.filter_config().search, "error");
    }

    #[test]
    fn error_lifecycle() {
        let mut state = sample_state();
        assert!(state.error_message().is_none());
        state.set_error("something broke".to_string());
        assert_eq!(state.error_message(), Some("something broke"));
        state.prune_error();
        assert!(state.error_message().is_some());
        state.clear_error();
        assert!(state.error_message().is_none());
    }

    #[test]
    fn spinner_wraps() {
        let mut state = sample_state();
        for _ in 0..SPINNER_FRAME_COUNT {
            state.advance_spinner();
        }
        assert_eq!(state.spinner_frame, 0);
    }
}

//! Styles for every element the viewer draws. A `Theme` is built once in `main` and passed
//! down to each render function.

use ratatui::style::{Color, Modifier, Style};

use crate::logs::{Conclusion, LogLevel, RunStatus};

#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub branch: Style,
    pub dim: Style,
    pub indicator: Style,
    pub spinner: Style,

    pub step_header: Style,
    pub timestamp: Style,
    pub caret: Style,

    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub debug: Style,

    /// Any search hit.
    pub search_match: Style,
    /// The hit `n`/`N` last landed on.
    pub current_match: Style,

    pub success: Style,
    pub failure: Style,
    pub running: Style,

    pub hint_key: Style,
    pub border: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            branch: Style::default().fg(Color::Yellow),
            dim: Style::default().fg(Color::DarkGray),
            indicator: Style::default().fg(Color::Magenta),
            spinner: Style::default().fg(Color::Yellow),
            step_header: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            timestamp: Style::default().fg(Color::DarkGray),
            caret: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            info: Style::default(),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            debug: Style::default().fg(Color::DarkGray),
            search_match: Style::default().fg(Color::Black).bg(Color::Yellow),
            current_match: Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            success: Style::default().fg(Color::Green),
            failure: Style::default().fg(Color::Red),
            running: Style::default().fg(Color::Yellow),
            hint_key: Style::default().fg(Color::Cyan),
            border: Style::default().fg(Color::DarkGray),
        }
    }
}

impl Theme {
    /// Colored unless disabled by `--no-color` or a non-empty `NO_COLOR` value.
    pub fn select(no_color_flag: bool, no_color_env: Option<&std::ffi::OsStr>) -> Self {
        let disabled = no_color_flag || no_color_env.is_some_and(|v| !v.is_empty());
        if disabled {
            Self::monochrome()
        } else {
            Self::default()
        }
    }

    /// For terminals without color; matches are still distinguishable by modifier.
    pub fn monochrome() -> Self {
        let plain = Style::default();
        Self {
            title: plain.add_modifier(Modifier::BOLD),
            branch: plain,
            dim: plain.add_modifier(Modifier::DIM),
            indicator: plain.add_modifier(Modifier::ITALIC),
            spinner: plain,
            step_header: plain.add_modifier(Modifier::BOLD),
            timestamp: plain.add_modifier(Modifier::DIM),
            caret: plain.add_modifier(Modifier::BOLD),
            info: plain,
            warning: plain.add_modifier(Modifier::BOLD),
            error: plain.add_modifier(Modifier::BOLD),
            debug: plain.add_modifier(Modifier::DIM),
            search_match: plain.add_modifier(Modifier::REVERSED),
            current_match: plain.add_modifier(Modifier::REVERSED | Modifier::UNDERLINED),
            success: plain,
            failure: plain.add_modifier(Modifier::BOLD),
            running: plain,
            hint_key: plain.add_modifier(Modifier::BOLD),
            border: plain.add_modifier(Modifier::DIM),
        }
    }

    pub fn level(&self, level: LogLevel) -> Style {
        match level {
            LogLevel::Info => self.info,
            LogLevel::Warning => self.warning,
            LogLevel::Error => self.error,
            LogLevel::Debug => self.debug,
        }
    }

    pub fn status(&self, status: RunStatus, conclusion: Option<Conclusion>) -> Style {
        match (status, conclusion) {
            (RunStatus::Completed, Some(Conclusion::Success)) => self.success,
            (
                RunStatus::Completed,
                Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure),
            ) => self.failure,
            (RunStatus::Completed, _) => self.dim,
            _ => self.running,
        }
    }
}

/// Single-character status glyph shared by the header and step headers.
pub fn status_icon(status: RunStatus, conclusion: Option<Conclusion>) -> &'static str {
    match (status, conclusion) {
        (RunStatus::Completed, Some(Conclusion::Success)) => "✓",
        (
            RunStatus::Completed,
            Some(Conclusion::Failure | Conclusion::TimedOut | Conclusion::StartupFailure),
        ) => "✗",
        (RunStatus::Completed, Some(Conclusion::Cancelled)) => "⊘",
        (RunStatus::Completed, Some(Conclusion::Skipped)) => "-",
        (RunStatus::Completed, _) => "•",
        (RunStatus::InProgress, _) => "●",
        _ => "○",
    }
}

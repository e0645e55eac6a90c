use crate::app::AppState;
use crate::filter::LevelFilter;
use crate::logs::RunStatus;
use crate::tui::spinner;
use crate::tui::theme::{status_icon, Theme};
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cuts `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Active filter settings, e.g. `[errors] [step 3] /fail/ Aa .*`.
pub fn filter_indicators(state: &AppState) -> Vec<String> {
    let config = state.filter_config();
    let mut parts = Vec::new();
    if config.level != LevelFilter::All {
        parts.push(format!("[{}]", config.level.label()));
    }
    if let Some(step) = config.step {
        let name = state
            .logs
            .step(step)
            .map_or_else(|| format!("step {step}"), |s| s.name.clone());
        parts.push(format!("[{name}]"));
    }
    if !config.search.is_empty() {
        parts.push(format!("/{}/", config.search));
        if config.case_sensitive {
            parts.push("Aa".to_string());
        }
        if config.regex {
            parts.push(".*".to_string());
        }
    }
    if !state.auto_scroll {
        parts.push("[paused]".to_string());
    }
    parts
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let version = format!(" ghlv v{} ", state.config.version_string);
    let status = state.status.unwrap_or(RunStatus::Queued);
    let status_style = theme.status(status, state.conclusion);

    let mut spans = vec![
        Span::styled(version.clone(), theme.title),
        Span::styled("│ ", theme.dim),
        Span::styled(format!("{} ", state.config.repo), theme.dim),
        Span::styled(
            format!("{} ", status_icon(status, state.conclusion)),
            status_style,
        ),
    ];

    let indicators = filter_indicators(state);
    let indicator_width: usize = indicators.iter().map(|s| s.width() + 1).sum();
    let branch = if state.logs.branch.is_empty() {
        String::new()
    } else {
        format!(" [{}]", state.logs.branch)
    };
    let reserved =
        version.width() + state.config.repo.width() + 5 + branch.width() + indicator_width + 2;
    let title_room = (area.width as usize).saturating_sub(reserved).max(8);
    let title = if state.logs.name.is_empty() {
        format!("run {}", state.config.run_id)
    } else {
        state.logs.name.clone()
    };

    spans.push(Span::styled(
        truncate(&title, title_room),
        theme.step_header.add_modifier(Modifier::BOLD),
    ));
    if !branch.is_empty() {
        spans.push(Span::styled(branch, theme.branch));
    }

    if state.streaming {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            spinner::frame(state.spinner_frame).to_string(),
            theme.spinner,
        ));
    } else {
        spans.push(Span::styled(format!(" {}", status.label()), status_style));
    }

    for indicator in indicators {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(indicator, theme.indicator));
    }

    if state.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled("!", theme.error.add_modifier(Modifier::BOLD)));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(theme.border),
    );
    f.render_widget(header, area);
}

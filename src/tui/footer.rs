use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, StatusSummary};
use crate::tui::theme::Theme;

/// `120 entries · match 3/17`, or `no matches` while a search is active.
pub fn summary_text(summary: StatusSummary, searching: bool) -> String {
    let mut text = format!(
        "{} {}",
        summary.total_entries,
        if summary.total_entries == 1 {
            "entry"
        } else {
            "entries"
        }
    );
    if searching {
        if summary.match_count == 0 {
            text.push_str(" · no matches");
        } else {
            match summary.current_match {
                Some(pos) => text.push_str(&format!(" · match {pos}/{}", summary.match_count)),
                None => text.push_str(&format!(" · {} matches", summary.match_count)),
            }
        }
    }
    text
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let line = if let Some(input) = &state.search_input {
        Line::from(vec![
            Span::styled("/", theme.hint_key),
            Span::raw(input.as_str()),
            Span::styled("█", theme.dim.add_modifier(Modifier::SLOW_BLINK)),
            Span::styled("  Enter apply  Esc cancel", theme.dim),
        ])
    } else {
        let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;
        let hints: &[(&str, &str)] = if narrow {
            &[("/", "find"), ("n/N", "next"), ("l", "level"), ("q", "quit")]
        } else {
            &[
                ("/", "search"),
                ("n/N", "match"),
                ("l", "level"),
                ("c", "case"),
                ("x", "regex"),
                ("s", "step"),
                ("␣", "fold"),
                ("a", "follow"),
                ("q", "quit"),
            ]
        };

        let mut spans = vec![
            Span::raw(summary_text(
                state.summary(),
                state.filter().is_searching(),
            )),
            Span::styled("  │ ", theme.dim),
        ];
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, theme.hint_key));
            spans.push(Span::styled(format!(" {desc}"), theme.dim));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(theme.border),
    );
    f.render_widget(footer, area);
}

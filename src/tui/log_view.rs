use crate::app::AppState;
use crate::filter::{FilteredEntry, FilteredStep, MatchPosition};
use crate::layout::RenderLine;
use crate::tui::theme::{status_icon, Theme};
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Splits `content` into plain and highlighted spans. `matches` are ascending byte
/// spans on char boundaries.
pub fn highlight<'a>(
    content: &'a str,
    matches: &[MatchPosition],
    base: Style,
    hit: Style,
) -> Vec<Span<'a>> {
    let mut spans = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;
    for m in matches {
        let (Some(before), Some(matched)) =
            (content.get(cursor..m.start), content.get(m.start..m.end))
        else {
            continue;
        };
        if !before.is_empty() {
            spans.push(Span::styled(before, base));
        }
        spans.push(Span::styled(matched, hit));
        cursor = m.end;
    }
    if let Some(rest) = content.get(cursor..) {
        if !rest.is_empty() || spans.is_empty() {
            spans.push(Span::styled(rest, base));
        }
    }
    spans
}

fn header_line<'a>(step: &'a FilteredStep, collapsed: bool, theme: &Theme) -> Vec<Span<'a>> {
    let arrow = if collapsed { "▸ " } else { "▾ " };
    vec![
        Span::styled(arrow, theme.dim),
        Span::styled(
            format!("{} ", status_icon(step.status, step.conclusion)),
            theme.status(step.status, step.conclusion),
        ),
        Span::styled(step.name.as_str(), theme.step_header),
        Span::styled(format!(" ({})", step.entries.len()), theme.dim),
    ]
}

fn entry_line<'a>(entry: &'a FilteredEntry, is_current: bool, theme: &Theme) -> Vec<Span<'a>> {
    let hit = if is_current {
        theme.current_match
    } else {
        theme.search_match
    };
    let mut spans = vec![Span::styled(
        entry.entry.timestamp.format("%H:%M:%S ").to_string(),
        theme.timestamp,
    )];
    spans.extend(highlight(
        &entry.entry.content,
        &entry.matches,
        theme.level(entry.entry.level),
        hit,
    ));
    spans
}

fn empty_message(state: &AppState) -> &'static str {
    if state.logs.is_empty() {
        if state.streaming {
            "Waiting for log output…"
        } else {
            "This run produced no log output"
        }
    } else {
        "No entries match the current filter"
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let layout = state.layout();
    if layout.total_lines() == 0 {
        f.render_widget(Paragraph::new(empty_message(state)).style(theme.dim), area);
        return;
    }

    let filtered = state.filtered();
    let matches = state.matches();
    let caret = state.caret_line();

    let lines: Vec<Line> = state
        .viewport
        .visible_range()
        .filter_map(|n| Some((n, layout.get(n)?)))
        .map(|(n, line)| {
            let gutter = if n == caret {
                Span::styled("›", theme.caret)
            } else {
                Span::raw(" ")
            };
            let mut spans = vec![gutter];
            match line {
                RenderLine::Header { step } => {
                    if let Some(s) = filtered.step(step) {
                        spans.extend(header_line(s, state.is_collapsed(step), theme));
                    }
                }
                RenderLine::Entry { step, entry } => {
                    if let Some(e) = filtered.step(step).and_then(|s| s.entries.get(entry)) {
                        spans.push(Span::raw("  "));
                        spans.extend(entry_line(e, matches.is_current(step, entry), theme));
                    }
                }
                RenderLine::Separator { .. } => {}
            }
            Line::from(spans)
        })
        .collect();

    f.render_widget(Paragraph::new(lines), area);
}

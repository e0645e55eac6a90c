use crate::app::AppState;
use crate::tui::theme::Theme;
use crate::tui::{footer, header, log_view};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

const HEADER_HEIGHT: u16 = 2;
const FOOTER_HEIGHT: u16 = 2;

/// Rows available to the log view for a terminal of `height` rows.
pub fn body_height(height: u16) -> usize {
    height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT) as usize
}

pub fn render(f: &mut Frame, state: &AppState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(f.area());

    header::render(f, chunks[0], state, theme);
    log_view::render(f, chunks[1], state, theme);
    footer::render(f, chunks[2], state, theme);

    if let Some(err) = state.error_message() {
        let area = f.area();
        if area.height > 6 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(5),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(theme.error)
                .block(
                    Block::default()
                        .title(" Error ")
                        .borders(Borders::ALL)
                        .border_style(theme.error),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(Clear, err_area);
            f.render_widget(err_widget, err_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_height_subtracts_chrome() {
        assert_eq!(body_height(24), 20);
        assert_eq!(body_height(3), 0);
    }
}

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    OpenSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    CancelSearch,
    NextMatch,
    PreviousMatch,
    CycleLevel,
    ToggleCaseSensitive,
    ToggleRegex,
    ScopeToStep,
    ToggleStep,
    CollapseAll,
    ExpandAll,
    ToggleAutoScroll,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_error: bool,
    /// The search prompt is open and owns the keyboard.
    pub searching: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if ctx.searching {
        return match key.code {
            KeyCode::Enter => Action::SubmitSearch,
            KeyCode::Esc => Action::CancelSearch,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Action::SearchInput(c)
            }
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc if ctx.has_error => Action::DismissError,
        KeyCode::Char('/') => Action::OpenSearch,
        KeyCode::Char('n') => Action::NextMatch,
        KeyCode::Char('N') => Action::PreviousMatch,
        KeyCode::Char('l') => Action::CycleLevel,
        KeyCode::Char('c') => Action::ToggleCaseSensitive,
        KeyCode::Char('x') => Action::ToggleRegex,
        KeyCode::Char('s') => Action::ScopeToStep,
        KeyCode::Char(' ') | KeyCode::Enter => Action::ToggleStep,
        KeyCode::Char('z') => Action::CollapseAll,
        KeyCode::Char('Z') => Action::ExpandAll,
        KeyCode::Char('a') => Action::ToggleAutoScroll,
        KeyCode::Up | KeyCode::Char('k') => Action::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') => Action::ScrollDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Action::ScrollToTop,
        KeyCode::End | KeyCode::Char('G') => Action::ScrollToBottom,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn ctx() -> InputContext {
        InputContext::default()
    }

    fn ctx_error() -> InputContext {
        InputContext {
            has_error: true,
            ..Default::default()
        }
    }

    fn ctx_search() -> InputContext {
        InputContext {
            searching: true,
            ..Default::default()
        }
    }

    #[test]
    fn quit_on_q() {
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx()), Action::Quit);
    }

    #[test]
    fn esc_without_error_does_nothing() {
        assert_eq!(map_key(press(KeyCode::Esc), &ctx()), Action::None);
    }

    #[test]
    fn esc_dismisses_error_when_present() {
        assert_eq!(
            map_key(press(KeyCode::Esc), &ctx_error()),
            Action::DismissError
        );
    }

    #[test]
    fn ctrl_c_quits_in_every_mode() {
        let key = press_with(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key, &ctx()), Action::Quit);
        assert_eq!(map_key(key, &ctx_search()), Action::Quit);
    }

    #[test]
    fn release_events_ignored() {
        assert_eq!(map_key(release(KeyCode::Char('q')), &ctx()), Action::None);
    }

    #[test]
    fn search_and_navigation_keys() {
        assert_eq!(map_key(press(KeyCode::Char('/')), &ctx()), Action::OpenSearch);
        assert_eq!(map_key(press(KeyCode::Char('n')), &ctx()), Action::NextMatch);
        assert_eq!(
            map_key(press(KeyCode::Char('N')), &ctx()),
            Action::PreviousMatch
        );
    }

    #[test]
    fn filter_toggles() {
        assert_eq!(map_key(press(KeyCode::Char('l')), &ctx()), Action::CycleLevel);
        assert_eq!(
            map_key(press(KeyCode::Char('c')), &ctx()),
            Action::ToggleCaseSensitive
        );
        assert_eq!(map_key(press(KeyCode::Char('x')), &ctx()), Action::ToggleRegex);
        assert_eq!(map_key(press(KeyCode::Char('s')), &ctx()), Action::ScopeToStep);
    }

    #[test]
    fn collapse_keys() {
        assert_eq!(map_key(press(KeyCode::Char(' ')), &ctx()), Action::ToggleStep);
        assert_eq!(map_key(press(KeyCode::Enter), &ctx()), Action::ToggleStep);
        assert_eq!(map_key(press(KeyCode::Char('z')), &ctx()), Action::CollapseAll);
        assert_eq!(map_key(press(KeyCode::Char('Z')), &ctx()), Action::ExpandAll);
    }

    #[test]
    fn scroll_keys() {
        assert_eq!(map_key(press(KeyCode::Char('j')), &ctx()), Action::ScrollDown);
        assert_eq!(map_key(press(KeyCode::Up), &ctx()), Action::ScrollUp);
        assert_eq!(map_key(press(KeyCode::PageDown), &ctx()), Action::PageDown);
        assert_eq!(map_key(press(KeyCode::Char('g')), &ctx()), Action::ScrollToTop);
        assert_eq!(
            map_key(press(KeyCode::Char('G')), &ctx()),
            Action::ScrollToBottom
        );
        assert_eq!(
            map_key(press(KeyCode::Char('a')), &ctx()),
            Action::ToggleAutoScroll
        );
    }

    #[test]
    fn search_mode_captures_characters() {
        assert_eq!(
            map_key(press(KeyCode::Char('q')), &ctx_search()),
            Action::SearchInput('q')
        );
        assert_eq!(
            map_key(press(KeyCode::Char('n')), &ctx_search()),
            Action::SearchInput('n')
        );
        assert_eq!(
            map_key(press(KeyCode::Backspace), &ctx_search()),
            Action::SearchBackspace
        );
    }

    #[test]
    fn search_mode_enter_and_esc() {
        assert_eq!(
            map_key(press(KeyCode::Enter), &ctx_search()),
            Action::SubmitSearch
        );
        assert_eq!(
            map_key(press(KeyCode::Esc), &ctx_search()),
            Action::CancelSearch
        );
    }

    #[test]
    fn unmapped_key_is_none() {
        assert_eq!(map_key(press(KeyCode::Char('?')), &ctx()), Action::None);
        assert_eq!(map_key(press(KeyCode::Tab), &ctx_search()), Action::None);
    }
}

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::terminal::state::{AppState, Focus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Fetch,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Action::Quit;
        }
        KeyCode::Enter | KeyCode::F(5) => return Action::Fetch,
        KeyCode::Tab => {
            state.next_focus();
            return Action::None;
        }
        KeyCode::BackTab => {
            state.prev_focus();
            return Action::None;
        }
        _ => {}
    }

    if state.focus.is_date_input() {
        return handle_input_keys(key, state);
    }

    match state.focus {
        Focus::Count => handle_count_keys(key, state),
        Focus::Results => handle_table_keys(key, state),
        Focus::Digest => handle_digest_keys(key, state),
        Focus::From | Focus::To => Action::None,
    }
}

fn handle_input_keys(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char(c) => state.input_char(c),
        KeyCode::Backspace => state.backspace(),
        _ => {}
    }
    Action::None
}

fn handle_count_keys(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('k') => state.adjust_count(1),
        KeyCode::Down | KeyCode::Char('-') | KeyCode::Char('j') => state.adjust_count(-1),
        KeyCode::PageUp => state.adjust_count(10),
        KeyCode::PageDown => state.adjust_count(-10),
        _ => {}
    }
    Action::None
}

fn handle_table_keys(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Down | KeyCode::Char('j') => state.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => state.move_selection(-1),
        KeyCode::PageDown => state.move_selection(10),
        KeyCode::PageUp => state.move_selection(-10),
        KeyCode::Home => state.move_selection(i64::MIN / 2),
        KeyCode::End => state.move_selection(i64::MAX / 2),
        _ => {}
    }
    Action::None
}

fn handle_digest_keys(key: KeyEvent, state: &mut AppState) -> Action {
    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Down | KeyCode::Char('j') => state.scroll_digest(1),
        KeyCode::Up | KeyCode::Char('k') => state.scroll_digest(-1),
        KeyCode::PageDown => state.scroll_digest(10),
        KeyCode::PageUp => state.scroll_digest(-10),
        KeyCode::Home => state.digest_scroll = 0,
        _ => {}
    }
    Action::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> AppState {
        AppState::new(10, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
    }

    #[test]
    fn q_types_into_dates_but_quits_elsewhere() {
        let mut s = state();
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut s), Action::None);
        s.focus = Focus::Results;
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut s), Action::Quit);
    }

    #[test]
    fn enter_fetches_from_any_focus() {
        let mut s = state();
        assert_eq!(handle_key(key(KeyCode::Enter), &mut s), Action::Fetch);
        s.focus = Focus::Digest;
        assert_eq!(handle_key(key(KeyCode::F(5)), &mut s), Action::Fetch);
    }

    #[test]
    fn count_keys_adjust_result_count() {
        let mut s = state();
        s.focus = Focus::Count;
        handle_key(key(KeyCode::Up), &mut s);
        handle_key(key(KeyCode::PageUp), &mut s);
        assert_eq!(s.max_results, 21);
        handle_key(key(KeyCode::Char('-')), &mut s);
        assert_eq!(s.max_results, 20);
    }

    #[test]
    fn tab_moves_focus_and_ctrl_c_quits() {
        let mut s = state();
        handle_key(key(KeyCode::Tab), &mut s);
        assert_eq!(s.focus, Focus::To);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(ctrl_c, &mut s), Action::Quit);
    }
}

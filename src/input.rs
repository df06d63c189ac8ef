//! Key bindings: arrows and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use puzzattack::Direction;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Swap,
    Raise,
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both arrows and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Action::Move(Direction::Right),
        KeyCode::Up | KeyCode::Char('k') => Action::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(Direction::Down),
        KeyCode::Char(' ') | KeyCode::Char('x') => Action::Swap,
        KeyCode::Tab | KeyCode::Char('z') => Action::Raise,
        KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_vim_keys_move() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::Move(Direction::Left));
        assert_eq!(key_to_action(key(KeyCode::Char('k'))), Action::Move(Direction::Up));
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::Move(Direction::Down));
    }

    #[test]
    fn swap_raise_pause_quit() {
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Swap);
        assert_eq!(key_to_action(key(KeyCode::Tab)), Action::Raise);
        assert_eq!(key_to_action(key(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn modified_keys_are_ignored() {
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
    }
}

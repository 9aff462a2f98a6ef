use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::mode::TuiState;
use crate::shared::InputEvent;

// poll for a key press and resolve it into events for the middle layer;
// keys that only affect the tui (help) are handled here
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::TogglePause],
        KeyCode::Char('c') => vec![InputEvent::Cancel],
        KeyCode::Char('r') => vec![InputEvent::Restart],
        KeyCode::Char('?') => {
            ts.show_help = !ts.show_help;
            vec![]
        }
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_events() {
        let mut ts = TuiState::default();
        assert_eq!(handle_key(KeyCode::Char(' '), &mut ts), [InputEvent::TogglePause]);
        assert_eq!(handle_key(KeyCode::Esc, &mut ts), [InputEvent::Quit]);
        assert_eq!(handle_key(KeyCode::Char('r'), &mut ts), [InputEvent::Restart]);
        assert!(handle_key(KeyCode::Char('x'), &mut ts).is_empty());
    }

    #[test]
    fn help_is_local() {
        let mut ts = TuiState::default();
        assert!(handle_key(KeyCode::Char('?'), &mut ts).is_empty());
        assert!(ts.show_help);
        handle_key(KeyCode::Char('?'), &mut ts);
        assert!(!ts.show_help);
    }
}

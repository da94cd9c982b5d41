use crate::model::Care;
use crate::sim::PetAction;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Command {
    Pet(PetAction),
    HelpToggle,
    Quit,
}

/// Drains pending key presses, waiting at most `wait` for the first one.
pub(crate) fn poll_keys(wait: Duration) -> anyhow::Result<Vec<KeyEvent>> {
    let mut out = Vec::new();
    let mut timeout = wait;
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press {
                out.push(k);
                if out.len() >= 32 {
                    break;
                }
            }
        }
        timeout = Duration::ZERO;
    }
    Ok(out)
}

pub(crate) fn map_key(key: KeyEvent, help_open: bool) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Command::Quit);
    }
    if help_open {
        return match key.code {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => Some(Command::HelpToggle),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'f' => PetAction::Care(Care::Feed),
            'c' => PetAction::Care(Care::Clean),
            'p' => PetAction::Care(Care::Play),
            'r' => PetAction::Care(Care::Rest),
            'd' => PetAction::ClaimDaily,
            'b' => PetAction::UseBoost,
            'h' => return Some(Command::HelpToggle),
            'q' => return Some(Command::Quit),
            _ => return None,
        },
        KeyCode::Esc => return Some(Command::Quit),
        _ => return None,
    };
    Some(Command::Pet(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn every_binding_maps() {
        let cases = [
            ('f', Command::Pet(PetAction::Care(Care::Feed))),
            ('c', Command::Pet(PetAction::Care(Care::Clean))),
            ('p', Command::Pet(PetAction::Care(Care::Play))),
            ('r', Command::Pet(PetAction::Care(Care::Rest))),
            ('d', Command::Pet(PetAction::ClaimDaily)),
            ('b', Command::Pet(PetAction::UseBoost)),
            ('h', Command::HelpToggle),
            ('q', Command::Quit),
        ];
        for (c, want) in cases {
            assert_eq!(map_key(key(c), false), Some(want));
            assert_eq!(map_key(key(c.to_ascii_uppercase()), false), Some(want));
        }
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), false),
            Some(Command::Quit)
        );
        assert_eq!(map_key(key('x'), false), None);
    }

    #[test]
    fn help_overlay_swallows_actions() {
        assert_eq!(map_key(key('f'), true), None);
        assert_eq!(map_key(key('h'), true), Some(Command::HelpToggle));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), true),
            Some(Command::HelpToggle)
        );
        assert_eq!(map_key(key('q'), true), Some(Command::Quit));
    }

    #[test]
    fn ctrl_c_quits_and_other_chords_do_nothing() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl('c'), false), Some(Command::Quit));
        assert_eq!(map_key(ctrl('f'), false), None);
    }
}

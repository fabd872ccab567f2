use std::collections::HashMap;
use std::str::FromStr;

use crate::NavCommand;

/// Presentation-independent key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Tab,
    Enter,
    Delete,
    Backspace,
    Char(char),
}

/// Parses key names as typed in scripts: `down`, `enter`, `tab` or a single character.
impl FromStr for Key {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let key = match text.to_ascii_lowercase().as_str() {
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "tab" => Key::Tab,
            "enter" | "return" => Key::Enter,
            "delete" | "del" => Key::Delete,
            "backspace" => Key::Backspace,
            _ => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(format!("unknown key {text:?}")),
                }
            }
        };
        Ok(key)
    }
}

/// Maps key input to navigation commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<Key, NavCommand>,
}

impl Default for Keymap {
    fn default() -> Self {
        let bindings = [
            (Key::Down, NavCommand::Next),
            (Key::Char('j'), NavCommand::Next),
            (Key::Up, NavCommand::Previous),
            (Key::Char('k'), NavCommand::Previous),
            (Key::Left, NavCommand::FocusJobs),
            (Key::Right, NavCommand::FocusCandidates),
            (Key::Tab, NavCommand::SwitchFocus),
            (Key::Enter, NavCommand::Confirm),
            (Key::Char('u'), NavCommand::MarkUncodable),
            (Key::Delete, NavCommand::Clear),
            (Key::Backspace, NavCommand::Clear),
            (Key::Char('h'), NavCommand::ToggleHideCoded),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl Keymap {
    /// Keymap with no bindings at all.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `key`, returning the command it replaced.
    pub fn bind(&mut self, key: Key, command: NavCommand) -> Option<NavCommand> {
        self.bindings.insert(key, command)
    }

    pub fn unbind(&mut self, key: Key) -> Option<NavCommand> {
        self.bindings.remove(&key)
    }

    pub fn resolve(&self, key: Key) -> Option<NavCommand> {
        self.bindings.get(&key).copied()
    }
}

//! Key combination parsing and matching.
//!
//! A combo is written as `modifier+...+key`, case-insensitive:
//! `ctrl+shift+p`, `alt+f9`, `f12`.

use std::fmt;
use std::str::FromStr;

use rdev::Key;

use super::error::HotkeyError;

const LETTERS: [Key; 26] = [
    Key::KeyA,
    Key::KeyB,
    Key::KeyC,
    Key::KeyD,
    Key::KeyE,
    Key::KeyF,
    Key::KeyG,
    Key::KeyH,
    Key::KeyI,
    Key::KeyJ,
    Key::KeyK,
    Key::KeyL,
    Key::KeyM,
    Key::KeyN,
    Key::KeyO,
    Key::KeyP,
    Key::KeyQ,
    Key::KeyR,
    Key::KeyS,
    Key::KeyT,
    Key::KeyU,
    Key::KeyV,
    Key::KeyW,
    Key::KeyX,
    Key::KeyY,
    Key::KeyZ,
];

const DIGITS: [Key; 10] = [
    Key::Num0,
    Key::Num1,
    Key::Num2,
    Key::Num3,
    Key::Num4,
    Key::Num5,
    Key::Num6,
    Key::Num7,
    Key::Num8,
    Key::Num9,
];

const FUNCTION_KEYS: [Key; 12] = [
    Key::F1,
    Key::F2,
    Key::F3,
    Key::F4,
    Key::F5,
    Key::F6,
    Key::F7,
    Key::F8,
    Key::F9,
    Key::F10,
    Key::F11,
    Key::F12,
];

/// Parses a (lowercase) key name into an rdev key.
fn parse_key(token: &str) -> Option<Key> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return match c {
            'a'..='z' => Some(LETTERS[(c as u8 - b'a') as usize]),
            '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
            _ => None,
        };
    }

    if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
        return FUNCTION_KEYS.get(n.checked_sub(1)?).copied();
    }

    let key = match token {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "insert" | "ins" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" | "pgup" => Key::PageUp,
        "pagedown" | "pgdn" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "pause" => Key::Pause,
        "scrolllock" => Key::ScrollLock,
        "printscreen" | "prtsc" => Key::PrintScreen,
        _ => return None,
    };
    Some(key)
}

// ============================================================================
// Modifier
// ============================================================================

/// A modifier key; left and right variants are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [Self::Ctrl, Self::Shift, Self::Alt, Self::Meta];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Self::Ctrl),
            "shift" => Some(Self::Shift),
            "alt" | "option" => Some(Self::Alt),
            "meta" | "super" | "cmd" | "command" | "win" => Some(Self::Meta),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ctrl => "ctrl",
            Self::Shift => "shift",
            Self::Alt => "alt",
            Self::Meta => "meta",
        }
    }

    /// Returns true if `key` is a physical key for this modifier.
    pub fn matches(&self, key: Key) -> bool {
        match self {
            Self::Ctrl => matches!(key, Key::ControlLeft | Key::ControlRight),
            Self::Shift => matches!(key, Key::ShiftLeft | Key::ShiftRight),
            Self::Alt => matches!(key, Key::Alt | Key::AltGr),
            Self::Meta => matches!(key, Key::MetaLeft | Key::MetaRight),
        }
    }
}

// ============================================================================
// HotkeyCombo
// ============================================================================

/// A parsed key combination.
#[derive(Debug, Clone, PartialEq)]
pub struct HotkeyCombo {
    modifiers: Vec<Modifier>,
    key: Key,
    key_name: String,
}

impl HotkeyCombo {
    /// Required modifiers, sorted and deduplicated.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// The non-modifier key that fires the combo.
    pub fn key(&self) -> Key {
        self.key
    }
}

impl FromStr for HotkeyCombo {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(HotkeyError::invalid(s, "empty"));
        }

        let tokens: Vec<&str> = normalized.split('+').map(str::trim).collect();
        let Some((key_token, modifier_tokens)) = tokens.split_last() else {
            return Err(HotkeyError::invalid(s, "empty"));
        };
        if key_token.is_empty() {
            return Err(HotkeyError::invalid(s, "missing key after the last '+'"));
        }

        let mut modifiers = Vec::with_capacity(modifier_tokens.len());
        for token in modifier_tokens {
            let modifier = Modifier::from_token(token)
                .ok_or_else(|| HotkeyError::invalid(s, format!("unknown modifier `{}`", token)))?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }
        modifiers.sort();

        if Modifier::from_token(key_token).is_some() {
            return Err(HotkeyError::invalid(
                s,
                format!("`{}` is a modifier; end the combo with a key", key_token),
            ));
        }
        let key = parse_key(key_token)
            .ok_or_else(|| HotkeyError::invalid(s, format!("unknown key `{}`", key_token)))?;

        Ok(Self {
            modifiers,
            key,
            key_name: key_token.to_string(),
        })
    }
}

impl fmt::Display for HotkeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        f.write_str(&self.key_name)
    }
}

// ============================================================================
// ComboMatcher
// ============================================================================

/// A raw key transition from the OS hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyEvent {
    Press(Key),
    Release(Key),
}

/// Turns a stream of key transitions into combo activations.
///
/// Fires on the press edge of the combo key while exactly the combo's
/// modifiers are held: `ctrl+shift+p` does not fire while alt is also down.
/// Auto-repeat presses of a key that is already down do not fire again.
#[derive(Debug)]
pub struct ComboMatcher {
    combo: HotkeyCombo,
    held: Vec<Key>,
    key_down: bool,
}

impl ComboMatcher {
    pub fn new(combo: HotkeyCombo) -> Self {
        Self {
            combo,
            held: Vec::new(),
            key_down: false,
        }
    }

    pub fn combo(&self) -> &HotkeyCombo {
        &self.combo
    }

    /// Feeds one transition; returns true if the combo fired.
    pub fn feed(&mut self, event: KeyEvent) -> bool {
        match event {
            KeyEvent::Press(key) if key == self.combo.key => {
                let fire = !self.key_down && self.modifiers_match();
                self.key_down = true;
                fire
            }
            KeyEvent::Release(key) if key == self.combo.key => {
                self.key_down = false;
                false
            }
            KeyEvent::Press(key) => {
                if !self.held.contains(&key) {
                    self.held.push(key);
                }
                false
            }
            KeyEvent::Release(key) => {
                self.held.retain(|held| *held != key);
                false
            }
        }
    }

    fn modifiers_match(&self) -> bool {
        Modifier::ALL.iter().all(|modifier| {
            let held = self.held.iter().any(|key| modifier.matches(*key));
            held == self.combo.modifiers.contains(modifier)
        })
    }
}

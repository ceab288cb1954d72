//! Keyboard key codes
//!
//! Key codes follow USB HID keyboard usage IDs, which is what the USB
//! keyboard driver hands to the interrupt handler. The name table is the
//! one used by the settings file (`hotkey_cf1=F1`, keyset bindings, ...).

/// Key codes (USB HID usage IDs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum KeyCode {
    A = 0x04, B = 0x05, C = 0x06, D = 0x07, E = 0x08, F = 0x09, G = 0x0A,
    H = 0x0B, I = 0x0C, J = 0x0D, K = 0x0E, L = 0x0F, M = 0x10, N = 0x11,
    O = 0x12, P = 0x13, Q = 0x14, R = 0x15, S = 0x16, T = 0x17, U = 0x18,
    V = 0x19, W = 0x1A, X = 0x1B, Y = 0x1C, Z = 0x1D,
    Key1 = 0x1E, Key2 = 0x1F, Key3 = 0x20, Key4 = 0x21, Key5 = 0x22,
    Key6 = 0x23, Key7 = 0x24, Key8 = 0x25, Key9 = 0x26, Key0 = 0x27,
    Return = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Dash = 0x2D,
    Equals = 0x2E,
    LeftBracket = 0x2F,
    RightBracket = 0x30,
    BackSlash = 0x31,
    Pound = 0x32,
    SemiColon = 0x33,
    SingleQuote = 0x34,
    BackQuote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,
    CapsLock = 0x39,
    F1 = 0x3A, F2 = 0x3B, F3 = 0x3C, F4 = 0x3D, F5 = 0x3E, F6 = 0x3F,
    F7 = 0x40, F8 = 0x41, F9 = 0x42, F10 = 0x43, F11 = 0x44, F12 = 0x45,
    ScrollLock = 0x47,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
    KpDivide = 0x54,
    KpMultiply = 0x55,
    KpSubtract = 0x56,
    KpAdd = 0x57,
    KpEnter = 0x58,
    Kp1 = 0x59, Kp2 = 0x5A, Kp3 = 0x5B, Kp4 = 0x5C, Kp5 = 0x5D,
    Kp6 = 0x5E, Kp7 = 0x5F, Kp8 = 0x60, Kp9 = 0x61, Kp0 = 0x62,
    KpDecimal = 0x63,
    LeftControl = 0xE0,
    LeftShift = 0xE1,
    LeftAlt = 0xE2,
    LeftSuper = 0xE3,
    RightControl = 0xE4,
    RightShift = 0xE5,
    RightAlt = 0xE6,
    RightSuper = 0xE7,
}

// ============================================================================
// Name Table
// ============================================================================

/// Canonical key names, first match wins when formatting
static KEY_NAMES: &[(&str, KeyCode)] = &[
    ("a", KeyCode::A), ("b", KeyCode::B), ("c", KeyCode::C), ("d", KeyCode::D),
    ("e", KeyCode::E), ("f", KeyCode::F), ("g", KeyCode::G), ("h", KeyCode::H),
    ("i", KeyCode::I), ("j", KeyCode::J), ("k", KeyCode::K), ("l", KeyCode::L),
    ("m", KeyCode::M), ("n", KeyCode::N), ("o", KeyCode::O), ("p", KeyCode::P),
    ("q", KeyCode::Q), ("r", KeyCode::R), ("s", KeyCode::S), ("t", KeyCode::T),
    ("u", KeyCode::U), ("v", KeyCode::V), ("w", KeyCode::W), ("x", KeyCode::X),
    ("y", KeyCode::Y), ("z", KeyCode::Z),
    ("1", KeyCode::Key1), ("2", KeyCode::Key2), ("3", KeyCode::Key3),
    ("4", KeyCode::Key4), ("5", KeyCode::Key5), ("6", KeyCode::Key6),
    ("7", KeyCode::Key7), ("8", KeyCode::Key8), ("9", KeyCode::Key9),
    ("0", KeyCode::Key0),
    ("Return", KeyCode::Return),
    ("BackSpace", KeyCode::Backspace),
    ("PageUp", KeyCode::PageUp),
    ("PageDown", KeyCode::PageDown),
    ("CapsLock", KeyCode::CapsLock),
    ("Up", KeyCode::Up),
    ("Down", KeyCode::Down),
    ("Left", KeyCode::Left),
    ("Right", KeyCode::Right),
    ("Comma", KeyCode::Comma),
    ("Period", KeyCode::Period),
    ("Space", KeyCode::Space),
    ("RightBracket", KeyCode::RightBracket),
    ("Del", KeyCode::Delete),
    ("Shift_L", KeyCode::LeftShift),
    ("Shift_R", KeyCode::RightShift),
    ("Dash", KeyCode::Dash),
    ("BackQuote", KeyCode::BackQuote),
    ("Equals", KeyCode::Equals),
    ("SemiColon", KeyCode::SemiColon),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("Slash", KeyCode::Slash),
    ("BackSlash", KeyCode::BackSlash),
    ("Pound", KeyCode::Pound),
    ("Insert", KeyCode::Insert),
    ("SingleQuote", KeyCode::SingleQuote),
    ("Tab", KeyCode::Tab),
    ("Control_L", KeyCode::LeftControl),
    ("Control_R", KeyCode::RightControl),
    ("Alt_L", KeyCode::LeftAlt),
    ("Alt_R", KeyCode::RightAlt),
    ("Super_L", KeyCode::LeftSuper),
    ("Super_R", KeyCode::RightSuper),
    ("Escape", KeyCode::Escape),
    ("LeftBracket", KeyCode::LeftBracket),
    ("F1", KeyCode::F1), ("F2", KeyCode::F2), ("F3", KeyCode::F3),
    ("F4", KeyCode::F4), ("F5", KeyCode::F5), ("F6", KeyCode::F6),
    ("F7", KeyCode::F7), ("F8", KeyCode::F8), ("F9", KeyCode::F9),
    ("F10", KeyCode::F10), ("F11", KeyCode::F11), ("F12", KeyCode::F12),
    ("ScrollLock", KeyCode::ScrollLock),
    ("KP_Divide", KeyCode::KpDivide),
    ("KP_Decimal", KeyCode::KpDecimal),
    ("KP_Multiply", KeyCode::KpMultiply),
    ("KP_Subtract", KeyCode::KpSubtract),
    ("KP_Add", KeyCode::KpAdd),
    ("KP_Enter", KeyCode::KpEnter),
    ("KP_1", KeyCode::Kp1), ("KP_2", KeyCode::Kp2), ("KP_3", KeyCode::Kp3),
    ("KP_4", KeyCode::Kp4), ("KP_5", KeyCode::Kp5), ("KP_6", KeyCode::Kp6),
    ("KP_7", KeyCode::Kp7), ("KP_8", KeyCode::Kp8), ("KP_9", KeyCode::Kp9),
    ("KP_0", KeyCode::Kp0),
];

/// Older settings files used C64 key-cap labels for some keys
static LEGACY_NAMES: &[(&str, KeyCode)] = &[
    ("Delete", KeyCode::PageUp),
    ("comma", KeyCode::Comma),
    ("period", KeyCode::Period),
    ("space", KeyCode::Space),
    ("asterisk", KeyCode::RightBracket),
    ("arrowup", KeyCode::Delete),
    ("plus", KeyCode::Dash),
    ("arrowleft", KeyCode::BackQuote),
    ("minus", KeyCode::Equals),
    ("colon", KeyCode::SemiColon),
    ("slash", KeyCode::Slash),
    ("sterling", KeyCode::Insert),
    ("semicolon", KeyCode::SingleQuote),
    ("at", KeyCode::LeftBracket),
];

impl KeyCode {
    /// Look up a key by its settings-file name (current or legacy spelling)
    pub fn from_name(name: &str) -> Option<Self> {
        KEY_NAMES
            .iter()
            .chain(LEGACY_NAMES.iter())
            .find(|(n, _)| *n == name)
            .map(|&(_, key)| key)
    }

    /// Settings-file name of this key
    pub fn name(self) -> &'static str {
        KEY_NAMES
            .iter()
            .find(|&&(_, key)| key == self)
            .map(|&(n, _)| n)
            .unwrap_or("?")
    }

    /// Convert a raw HID usage ID from the keyboard driver
    pub fn from_usage(usage: u8) -> Option<Self> {
        KEY_NAMES
            .iter()
            .find(|&&(_, key)| key as u8 == usage)
            .map(|&(_, key)| key)
    }

    /// Lowercase letter for A..Z
    pub fn letter(self) -> Option<u8> {
        let code = self as u8;
        if (KeyCode::A as u8..=KeyCode::Z as u8).contains(&code) {
            Some(b'a' + (code - KeyCode::A as u8))
        } else {
            None
        }
    }

    /// Digit character for the top-row number keys
    pub fn digit(self) -> Option<u8> {
        match self {
            KeyCode::Key0 => Some(b'0'),
            _ => {
                let code = self as u8;
                if (KeyCode::Key1 as u8..=KeyCode::Key9 as u8).contains(&code) {
                    Some(b'1' + (code - KeyCode::Key1 as u8))
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    pub fn is_shift(self) -> bool {
        matches!(self, KeyCode::LeftShift | KeyCode::RightShift)
    }
}

//! UI settings file
//!
//! Plain `name=value` lines. `#` starts a comment line, blank lines are
//! skipped, and unknown names or unparsable values are logged and ignored
//! so an old or hand-edited file never stops the machine from booting.

use alloc::{format, string::String, vec::Vec};

use crate::hotkeys::{KeyRouter, DEFAULT_COMMODORE_KEY, DEFAULT_CONTROL_KEY, NUM_KEY_COMBOS};
use crate::input::DEFAULT_REPEAT_FLOOR;
use crate::joystick::{JoyDevice, Keyset, PotValues, NUM_JOY_PORTS};
use crate::keycodes::KeyCode;
use crate::overlay::DisplayMode;
use crate::quick::QuickFunc;

/// Setting name and second key of each combo slot
pub const HOTKEY_SLOTS: [(&str, KeyCode); NUM_KEY_COMBOS] = [
    ("hotkey_cf1", KeyCode::F1),
    ("hotkey_cf3", KeyCode::F3),
    ("hotkey_cf5", KeyCode::F5),
    ("hotkey_cf7", KeyCode::F7),
    ("hotkey_tf1", KeyCode::F1),
    ("hotkey_tf3", KeyCode::F3),
    ("hotkey_tf5", KeyCode::F5),
    ("hotkey_tf7", KeyCode::F7),
];

const KEYSET_FIELDS: [&str; 7] = ["up", "down", "left", "right", "fire", "potx", "poty"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    pub status_bar: DisplayMode,
    pub commodore_key: KeyCode,
    pub control_key: KeyCode,
    pub hotkeys: [Option<QuickFunc>; NUM_KEY_COMBOS],
    pub ports: [JoyDevice; NUM_JOY_PORTS],
    pub keysets: [Keyset; 2],
    pub pots: PotValues,
    /// Ask before a hotkey resets the machine
    pub reset_confirm: bool,
    /// Fastest key repeat interval, in frames
    pub repeat_floor: u32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            status_bar: DisplayMode::OnActivity,
            commodore_key: DEFAULT_COMMODORE_KEY,
            control_key: DEFAULT_CONTROL_KEY,
            hotkeys: [Some(QuickFunc::Menu), None, None, None, None, None, None, None],
            ports: [JoyDevice::None; NUM_JOY_PORTS],
            keysets: [Keyset::empty(); 2],
            pots: PotValues::new(),
            reset_confirm: false,
            repeat_floor: DEFAULT_REPEAT_FLOOR,
        }
    }
}

fn keyset_field<'a>(keyset: &'a mut Keyset, field: &str) -> Option<&'a mut Option<KeyCode>> {
    Some(match field {
        "up" => &mut keyset.up,
        "down" => &mut keyset.down,
        "left" => &mut keyset.left,
        "right" => &mut keyset.right,
        "fire" => &mut keyset.fire,
        "potx" => &mut keyset.pot_x,
        "poty" => &mut keyset.pot_y,
        _ => return None,
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}

fn parse_func(value: &str) -> Option<Option<QuickFunc>> {
    if value == "None" {
        Some(None)
    } else {
        QuickFunc::from_name(value).map(Some)
    }
}

impl UiSettings {
    /// Read settings, starting from the defaults
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                log::warn!("settings:{}: expected name=value", lineno + 1);
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            if !settings.set(name, value) {
                log::warn!("settings:{}: ignoring {}={}", lineno + 1, name, value);
            }
        }
        settings
    }

    /// Apply one setting; false if the name or value is not understood
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        if let Some(slot) = HOTKEY_SLOTS.iter().position(|&(n, _)| n == name) {
            return parse_func(value).map(|f| self.hotkeys[slot] = f).is_some();
        }
        if let Some(rest) = name.strip_prefix("keyset_") {
            let Some((index, field)) = rest.split_once('_') else { return false };
            let index = match index {
                "1" => 0,
                "2" => 1,
                _ => return false,
            };
            let key = if value == "none" {
                None
            } else {
                match KeyCode::from_name(value) {
                    Some(key) => Some(key),
                    None => return false,
                }
            };
            return keyset_field(&mut self.keysets[index], field).map(|f| *f = key).is_some();
        }

        match name {
            "overlay" => DisplayMode::from_name(value).map(|m| self.status_bar = m).is_some(),
            "commodore_key" => KeyCode::from_name(value).map(|k| self.commodore_key = k).is_some(),
            "ctrl_key" => KeyCode::from_name(value).map(|k| self.control_key = k).is_some(),
            "port_1" => JoyDevice::from_name(value).map(|d| self.ports[0] = d).is_some(),
            "port_2" => JoyDevice::from_name(value).map(|d| self.ports[1] = d).is_some(),
            "pot_x_high" => value.parse().map(|v| self.pots.x_high = v).is_ok(),
            "pot_x_low" => value.parse().map(|v| self.pots.x_low = v).is_ok(),
            "pot_y_high" => value.parse().map(|v| self.pots.y_high = v).is_ok(),
            "pot_y_low" => value.parse().map(|v| self.pots.y_low = v).is_ok(),
            "reset_confirm" => parse_bool(value).map(|b| self.reset_confirm = b).is_some(),
            "repeat_floor" => value.parse().map(|v: u32| self.repeat_floor = v.max(1)).is_ok(),
            _ => false,
        }
    }

    /// The settings in file form, one `name=value` per line
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!("overlay={}", self.status_bar.name()));
        lines.push(format!("commodore_key={}", self.commodore_key.name()));
        lines.push(format!("ctrl_key={}", self.control_key.name()));
        for (&(name, _), func) in HOTKEY_SLOTS.iter().zip(&self.hotkeys) {
            lines.push(format!("{}={}", name, func.map_or("None", |f| f.name())));
        }
        for (port, device) in self.ports.iter().enumerate() {
            lines.push(format!("port_{}={}", port + 1, device.name()));
        }
        for (index, keyset) in self.keysets.iter().enumerate() {
            let mut keyset = *keyset;
            for field in KEYSET_FIELDS {
                let key = keyset_field(&mut keyset, field).and_then(|k| *k);
                lines.push(format!("keyset_{}_{}={}", index + 1, field, key.map_or("none", |k| k.name())));
            }
        }
        lines.push(format!("pot_x_high={}", self.pots.x_high));
        lines.push(format!("pot_x_low={}", self.pots.x_low));
        lines.push(format!("pot_y_high={}", self.pots.y_high));
        lines.push(format!("pot_y_low={}", self.pots.y_low));
        lines.push(format!("reset_confirm={}", self.reset_confirm as u8));
        lines.push(format!("repeat_floor={}", self.repeat_floor));
        lines
    }

    /// Push modifiers, hotkeys and joystick setup into the key router
    pub fn apply(&self, router: &KeyRouter) {
        router.set_modifiers(self.commodore_key, self.control_key);
        for (slot, (&(_, key), func)) in HOTKEY_SLOTS.iter().zip(&self.hotkeys).enumerate() {
            router.set_hotkey(slot, func.map(|_| key), *func);
        }
        let mut ports = router.ports();
        for (slot, &device) in self.ports.iter().enumerate() {
            ports.set_device(slot, device);
        }
        for (index, &keyset) in self.keysets.iter().enumerate() {
            ports.set_keyset(index, keyset);
        }
        ports.set_pots(self.pots);
    }
}

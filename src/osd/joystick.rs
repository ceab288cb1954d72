//! Joystick ports
//!
//! Maps keyboard keys and USB gamepad reports onto the two emulated
//! joystick ports. Runs in interrupt context: results are queued as
//! latch updates on the [`EventHub`], never applied directly.

use bitflags::bitflags;

use crate::events::{EventHub, JoyEvent, JoyLatchKind, KeyEvent};
use crate::keycodes::KeyCode;

// ============================================================================
// Devices and Bits
// ============================================================================

/// Number of emulated joystick ports
pub const NUM_JOY_PORTS: usize = 2;

/// USB gamepads tracked
pub const MAX_USB_DEVICES: u8 = 4;

/// Bit position of the paddle X value in the latch
pub const POT_X_SHIFT: u32 = 5;

/// Bit position of the paddle Y value in the latch
pub const POT_Y_SHIFT: u32 = 13;

bitflags! {
    /// Direction and fire bits of a port latch
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JoyBits: u32 {
        const UP = 0x01;
        const DOWN = 0x02;
        const LEFT = 0x04;
        const RIGHT = 0x08;
        const FIRE = 0x10;
    }
}

/// Input device driving a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoyDevice {
    #[default]
    None,
    /// Numpad 8/2/4/6, fire on 5
    Nums1,
    /// Numpad 9/3/7/1, fire on 0
    Nums2,
    /// Cursor keys, fire on Space
    CursSp,
    /// Cursor keys, fire on left Control
    CursLc,
    Keyset1,
    Keyset2,
    Usb(u8),
}

static DEVICE_NAMES: &[(&str, JoyDevice)] = &[
    ("none", JoyDevice::None),
    ("numpad1", JoyDevice::Nums1),
    ("numpad2", JoyDevice::Nums2),
    ("cursors_space", JoyDevice::CursSp),
    ("cursors_lctrl", JoyDevice::CursLc),
    ("keyset1", JoyDevice::Keyset1),
    ("keyset2", JoyDevice::Keyset2),
    ("usb0", JoyDevice::Usb(0)),
    ("usb1", JoyDevice::Usb(1)),
    ("usb2", JoyDevice::Usb(2)),
    ("usb3", JoyDevice::Usb(3)),
];

impl JoyDevice {
    pub fn from_name(name: &str) -> Option<Self> {
        DEVICE_NAMES.iter().find(|(n, _)| *n == name).map(|&(_, d)| d)
    }

    pub fn name(self) -> &'static str {
        DEVICE_NAMES
            .iter()
            .find(|&&(_, d)| d == self)
            .map(|&(n, _)| n)
            .unwrap_or("none")
    }

    /// Driven by the keyboard rather than a gamepad?
    #[inline]
    pub fn is_keyboard(self) -> bool {
        !matches!(self, JoyDevice::None | JoyDevice::Usb(_))
    }

    #[inline]
    fn is_numpad(self) -> bool {
        matches!(self, JoyDevice::Nums1 | JoyDevice::Nums2)
    }
}

// ============================================================================
// Keysets and Paddles
// ============================================================================

/// User-defined joystick keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keyset {
    pub up: Option<KeyCode>,
    pub down: Option<KeyCode>,
    pub left: Option<KeyCode>,
    pub right: Option<KeyCode>,
    pub fire: Option<KeyCode>,
    pub pot_x: Option<KeyCode>,
    pub pot_y: Option<KeyCode>,
}

impl Keyset {
    pub const fn empty() -> Self {
        Self { up: None, down: None, left: None, right: None, fire: None, pot_x: None, pot_y: None }
    }
}

/// Paddle values written by the POT keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PotValues {
    pub x_high: u32,
    pub x_low: u32,
    pub y_high: u32,
    pub y_low: u32,
}

impl PotValues {
    pub const fn new() -> Self {
        Self { x_high: 192, x_low: 64, y_high: 192, y_low: 64 }
    }
}

impl Default for PotValues {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoyInput {
    Dir(JoyBits),
    PotX,
    PotY,
}

/// One port slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoySlot {
    /// Emulated port number (1 or 2)
    pub port: u8,
    pub device: JoyDevice,
}

// ============================================================================
// Port Mapping
// ============================================================================

pub struct JoyPorts {
    slots: [JoySlot; NUM_JOY_PORTS],
    keysets: [Keyset; 2],
    pots: PotValues,
    swapped: bool,
}

impl JoyPorts {
    pub const fn new() -> Self {
        Self {
            slots: [
                JoySlot { port: 1, device: JoyDevice::None },
                JoySlot { port: 2, device: JoyDevice::None },
            ],
            keysets: [Keyset::empty(), Keyset::empty()],
            pots: PotValues::new(),
            swapped: false,
        }
    }

    pub fn slots(&self) -> &[JoySlot; NUM_JOY_PORTS] {
        &self.slots
    }

    pub fn set_device(&mut self, slot: usize, device: JoyDevice) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.device = device;
        }
    }

    pub fn set_keyset(&mut self, index: usize, keyset: Keyset) {
        if let Some(k) = self.keysets.get_mut(index) {
            *k = keyset;
        }
    }

    pub fn set_pots(&mut self, pots: PotValues) {
        self.pots = pots;
    }

    #[inline]
    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    /// Exchange the emulated ports of the two slots
    pub fn swap_ports(&mut self) -> bool {
        let [a, b] = &mut self.slots;
        core::mem::swap(&mut a.port, &mut b.port);
        self.swapped = !self.swapped;
        self.swapped
    }

    fn lookup(&self, device: JoyDevice, key: KeyCode) -> Option<JoyInput> {
        use KeyCode::*;

        let dir = |bits| Some(JoyInput::Dir(bits));
        match (device, key) {
            (JoyDevice::Nums1, Kp8) | (JoyDevice::Nums2, Kp9) => dir(JoyBits::UP),
            (JoyDevice::Nums1, Kp2) | (JoyDevice::Nums2, Kp3) => dir(JoyBits::DOWN),
            (JoyDevice::Nums1, Kp4) | (JoyDevice::Nums2, Kp7) => dir(JoyBits::LEFT),
            (JoyDevice::Nums1, Kp6) | (JoyDevice::Nums2, Kp1) => dir(JoyBits::RIGHT),
            (JoyDevice::Nums1, Kp5) | (JoyDevice::Nums2, Kp0) => dir(JoyBits::FIRE),
            (JoyDevice::CursSp | JoyDevice::CursLc, Up) => dir(JoyBits::UP),
            (JoyDevice::CursSp | JoyDevice::CursLc, Down) => dir(JoyBits::DOWN),
            (JoyDevice::CursSp | JoyDevice::CursLc, Left) => dir(JoyBits::LEFT),
            (JoyDevice::CursSp | JoyDevice::CursLc, Right) => dir(JoyBits::RIGHT),
            (JoyDevice::CursSp, Space) | (JoyDevice::CursLc, LeftControl) => dir(JoyBits::FIRE),
            (JoyDevice::Keyset1, _) => Self::keyset_lookup(&self.keysets[0], key),
            (JoyDevice::Keyset2, _) => Self::keyset_lookup(&self.keysets[1], key),
            _ => None,
        }
    }

    fn keyset_lookup(keyset: &Keyset, key: KeyCode) -> Option<JoyInput> {
        let key = Some(key);
        if keyset.up == key {
            Some(JoyInput::Dir(JoyBits::UP))
        } else if keyset.down == key {
            Some(JoyInput::Dir(JoyBits::DOWN))
        } else if keyset.left == key {
            Some(JoyInput::Dir(JoyBits::LEFT))
        } else if keyset.right == key {
            Some(JoyInput::Dir(JoyBits::RIGHT))
        } else if keyset.fire == key {
            Some(JoyInput::Dir(JoyBits::FIRE))
        } else if keyset.pot_x == key {
            Some(JoyInput::PotX)
        } else if keyset.pot_y == key {
            Some(JoyInput::PotY)
        } else {
            None
        }
    }

    /// Menu key a numpad joystick stands in for while the menu is up
    fn ui_key(input: JoyInput) -> Option<KeyCode> {
        let JoyInput::Dir(bits) = input else { return None };
        if bits == JoyBits::UP {
            Some(KeyCode::Up)
        } else if bits == JoyBits::DOWN {
            Some(KeyCode::Down)
        } else if bits == JoyBits::LEFT {
            Some(KeyCode::Left)
        } else if bits == JoyBits::RIGHT {
            Some(KeyCode::Right)
        } else if bits == JoyBits::FIRE {
            Some(KeyCode::Return)
        } else {
            None
        }
    }

    /// Handle a key that may belong to a keyboard joystick (ISR)
    ///
    /// Returns true when the key was consumed.
    pub fn key_event(&self, hub: &EventHub, key: KeyCode, pressed: bool) -> bool {
        let ui = hub.ui_enabled();
        for slot in &self.slots {
            if !slot.device.is_keyboard() || (ui && !slot.device.is_numpad()) {
                continue;
            }
            let Some(input) = self.lookup(slot.device, key) else { continue };

            if ui {
                if let Some(nav_key) = Self::ui_key(input) {
                    hub.ui_keys.enqueue(KeyEvent { key: nav_key, pressed });
                    return true;
                }
                continue;
            }

            let latch = |kind, value| {
                hub.joy.enqueue(JoyEvent { kind, port: slot.port, device: slot.device, value });
            };
            let (and_value, or_value) = match (input, pressed) {
                (JoyInput::Dir(bits), true) => (None, Some(bits.bits())),
                (JoyInput::Dir(bits), false) => (Some(!bits.bits()), None),
                (JoyInput::PotX, true) => (Some(!(self.pots.x_high << POT_X_SHIFT)), Some(self.pots.x_low << POT_X_SHIFT)),
                (JoyInput::PotX, false) => (Some(!(self.pots.x_low << POT_X_SHIFT)), Some(self.pots.x_high << POT_X_SHIFT)),
                (JoyInput::PotY, true) => (Some(!(self.pots.y_high << POT_Y_SHIFT)), Some(self.pots.y_low << POT_Y_SHIFT)),
                (JoyInput::PotY, false) => (Some(!(self.pots.y_low << POT_Y_SHIFT)), Some(self.pots.y_high << POT_Y_SHIFT)),
            };
            if let Some(value) = and_value {
                latch(JoyLatchKind::And, value);
            }
            if let Some(value) = or_value {
                latch(JoyLatchKind::Or, value);
            }
            return true;
        }
        false
    }

    /// Handle a USB gamepad report (ISR)
    ///
    /// The value replaces the latch of whichever port the pad is assigned
    /// to. Returns false when no port uses this pad.
    pub fn usb_event(&self, hub: &EventHub, usb: u8, value: u32) -> bool {
        if usb >= MAX_USB_DEVICES {
            return false;
        }
        let Some(slot) = self.slots.iter().find(|s| s.device == JoyDevice::Usb(usb)) else {
            return false;
        };
        hub.joy.enqueue(JoyEvent {
            kind: JoyLatchKind::Absolute,
            port: slot.port,
            device: slot.device,
            value,
        })
    }
}

impl Default for JoyPorts {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn drained(hub: &EventHub) -> Vec<JoyEvent> {
        hub.joy.drain().collect()
    }

    #[test]
    fn test_numpad_press_and_release() {
        let hub = EventHub::new();
        let mut ports = JoyPorts::new();
        ports.set_device(1, JoyDevice::Nums1);

        assert!(ports.key_event(&hub, KeyCode::Kp8, true));
        assert!(ports.key_event(&hub, KeyCode::Kp8, false));
        assert!(!ports.key_event(&hub, KeyCode::Kp9, true));

        let events = drained(&hub);
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].kind, events[0].port, events[0].value), (JoyLatchKind::Or, 2, 0x01));
        assert_eq!((events[1].kind, events[1].value), (JoyLatchKind::And, !0x01));
    }

    #[test]
    fn test_cursor_fire_keys() {
        let hub = EventHub::new();
        let mut ports = JoyPorts::new();
        ports.set_device(0, JoyDevice::CursLc);

        assert!(!ports.key_event(&hub, KeyCode::Space, true));
        assert!(ports.key_event(&hub, KeyCode::LeftControl, true));
        assert_eq!(drained(&hub)[0].value, JoyBits::FIRE.bits());
    }

    #[test]
    fn test_numpad_drives_menu_while_shown() {
        let hub = EventHub::new();
        hub.set_ui_enabled(true);
        let mut ports = JoyPorts::new();
        ports.set_device(0, JoyDevice::Nums2);
        ports.set_device(1, JoyDevice::CursSp);

        assert!(ports.key_event(&hub, KeyCode::Kp0, true));
        assert!(!ports.key_event(&hub, KeyCode::Up, true));

        let keys: Vec<KeyEvent> = hub.ui_keys.drain().collect();
        assert_eq!(keys, [KeyEvent::press(KeyCode::Return)]);
        assert!(hub.joy.is_empty());
    }

    #[test]
    fn test_keyset_pot_keys() {
        let hub = EventHub::new();
        let mut ports = JoyPorts::new();
        ports.set_device(0, JoyDevice::Keyset1);
        ports.set_keyset(0, Keyset { pot_x: Some(KeyCode::Q), fire: Some(KeyCode::W), ..Keyset::empty() });

        assert!(ports.key_event(&hub, KeyCode::Q, true));
        let mut latch = 192 << POT_X_SHIFT;
        for event in drained(&hub) {
            latch = event.apply(latch);
        }
        assert_eq!(latch, 64 << POT_X_SHIFT);

        assert!(ports.key_event(&hub, KeyCode::Q, false));
        for event in drained(&hub) {
            latch = event.apply(latch);
        }
        assert_eq!(latch, 192 << POT_X_SHIFT);
    }

    #[test]
    fn test_usb_and_swap() {
        let hub = EventHub::new();
        let mut ports = JoyPorts::new();
        ports.set_device(0, JoyDevice::Usb(0));

        assert!(ports.usb_event(&hub, 0, 0x11));
        assert!(!ports.usb_event(&hub, 1, 0x11));
        assert!(ports.swap_ports());
        assert!(ports.usb_event(&hub, 0, 0x02));

        let events = drained(&hub);
        assert_eq!((events[0].kind, events[0].port, events[0].value), (JoyLatchKind::Absolute, 1, 0x11));
        assert_eq!(events[1].port, 2);
    }

    #[test]
    fn test_device_names() {
        assert_eq!(JoyDevice::from_name("cursors_space"), Some(JoyDevice::CursSp));
        assert_eq!(JoyDevice::Usb(2).name(), "usb2");
        assert_eq!(JoyDevice::from_name("mouse"), None);
    }
}

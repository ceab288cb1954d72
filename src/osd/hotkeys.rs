//! Keyboard routing and hotkey combos
//!
//! `KeyRouter` sees every raw key press and release, in interrupt context.
//! In order it:
//! 1. tracks the Commodore and Control modifiers (and Commodore+F7 held
//!    for five seconds, which asks for a safe video mode)
//! 2. lets keyboard joysticks claim their keys
//! 3. matches hotkey combos
//! 4. routes what is left to the menu or to the emulated keyboard
//!
//! Functions bound to combos run later on the main loop: some as soon as
//! the second key comes up, the rest once the modifier is released so the
//! emulator never sees it stuck down.
//!
//! The router's locks are shared with the keyboard ISR. On a single core
//! the main loop must only take them inside `Platform::critical`, and the
//! ISR paths here never log.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::{Mutex, MutexGuard};

use crate::events::{EventHub, KeyEvent};
use crate::joystick::JoyPorts;
use crate::keycodes::KeyCode;
use crate::quick::QuickFunc;

// ============================================================================
// Constants
// ============================================================================

pub const NUM_KEY_COMBOS: usize = 8;

/// Combo slots below this fire with the Commodore key, the rest with Control
pub const COMMODORE_COMBOS: usize = 4;

/// How long Commodore+F7 must be held to request a safe video mode (µs)
pub const VIDEO_RESET_HOLD_US: u64 = 5_000_000;

pub const DEFAULT_COMMODORE_KEY: KeyCode = KeyCode::LeftControl;
pub const DEFAULT_CONTROL_KEY: KeyCode = KeyCode::Tab;

/// Key that opens the menu
pub const MENU_KEY: KeyCode = KeyCode::F12;

// ============================================================================
// Combos
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Combo {
    second_key: Option<KeyCode>,
    function: Option<QuickFunc>,
    invoked: bool,
}

impl Combo {
    const fn empty() -> Self {
        Self { second_key: None, function: None, invoked: false }
    }
}

struct RouterState {
    commodore_key: KeyCode,
    control_key: KeyCode,
    commodore_down: bool,
    control_down: bool,
    f7_pressed_at: Option<u64>,
    combos: [Combo; NUM_KEY_COMBOS],
}

impl RouterState {
    /// Mark a combo invoked if `key` completes one; true when consumed
    fn combo_press(&mut self, key: KeyCode) -> bool {
        let (commodore, control) = (self.commodore_down, self.control_down);
        let hit = self.combos.iter_mut().enumerate().find(|(slot, combo)| {
            let modifier = if *slot < COMMODORE_COMBOS { commodore } else { control };
            modifier && combo.second_key == Some(key)
        });
        match hit {
            Some((_, combo)) => {
                combo.invoked = true;
                true
            }
            None => false,
        }
    }

    /// Function to run now that the combo's second key is up
    fn combo_release(&mut self, key: KeyCode) -> Option<Option<QuickFunc>> {
        let combo = self
            .combos
            .iter_mut()
            .find(|c| c.second_key == Some(key) && c.invoked)?;
        match combo.function {
            Some(func) if func.fires_on_key_release() => {
                combo.invoked = false;
                Some(Some(func))
            }
            _ => Some(None),
        }
    }
}

// ============================================================================
// Key Router
// ============================================================================

pub struct KeyRouter {
    state: Mutex<RouterState>,
    ports: Mutex<JoyPorts>,
    safe_video_requested: AtomicBool,
}

impl KeyRouter {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RouterState {
                commodore_key: DEFAULT_COMMODORE_KEY,
                control_key: DEFAULT_CONTROL_KEY,
                commodore_down: false,
                control_down: false,
                f7_pressed_at: None,
                combos: [Combo::empty(); NUM_KEY_COMBOS],
            }),
            ports: Mutex::new(JoyPorts::new()),
            safe_video_requested: AtomicBool::new(false),
        }
    }

    pub fn set_modifiers(&self, commodore: KeyCode, control: KeyCode) {
        let mut state = self.state.lock();
        state.commodore_key = commodore;
        state.control_key = control;
    }

    pub fn modifiers(&self) -> (KeyCode, KeyCode) {
        let state = self.state.lock();
        (state.commodore_key, state.control_key)
    }

    /// Bind combo `slot` to `key`; `None` clears the function
    pub fn set_hotkey(&self, slot: usize, key: Option<KeyCode>, function: Option<QuickFunc>) {
        let mut state = self.state.lock();
        if let Some(combo) = state.combos.get_mut(slot) {
            *combo = Combo { second_key: key, function, invoked: false };
        }
    }

    pub fn hotkey(&self, slot: usize) -> Option<(Option<KeyCode>, Option<QuickFunc>)> {
        let state = self.state.lock();
        state.combos.get(slot).map(|c| (c.second_key, c.function))
    }

    /// Joystick port assignments, shared with the menu
    pub fn ports(&self) -> MutexGuard<'_, JoyPorts> {
        self.ports.lock()
    }

    /// True once after Commodore+F7 was held long enough
    pub fn take_safe_video_request(&self) -> bool {
        let requested = self.safe_video_requested.swap(false, Ordering::AcqRel);
        if requested {
            log::warn!("hotkey: safe video mode requested");
        }
        requested
    }

    /// Raw key press from the keyboard ISR; `now` in µs
    pub fn key_pressed(&self, hub: &EventHub, key: KeyCode, now: u64) {
        {
            let mut state = self.state.lock();
            if key == state.commodore_key {
                state.commodore_down = true;
            } else if key == state.control_key {
                state.control_down = true;
            } else if key == KeyCode::F7 && state.commodore_down {
                state.f7_pressed_at = Some(now);
            }
        }

        if self.ports.lock().key_event(hub, key, true) {
            return;
        }
        if self.state.lock().combo_press(key) {
            return;
        }
        hub.route_key(KeyEvent::press(key));
    }

    /// Raw key release from the keyboard ISR; `now` in µs
    pub fn key_released(&self, hub: &EventHub, key: KeyCode, now: u64) {
        let is_modifier = {
            let mut state = self.state.lock();
            if key == state.commodore_key {
                state.commodore_down = false;
            } else if key == state.control_key {
                state.control_down = false;
            } else if key == KeyCode::F7 {
                let held = state.f7_pressed_at.take();
                if let Some(since) = held {
                    if state.commodore_down && now.wrapping_sub(since) >= VIDEO_RESET_HOLD_US {
                        self.safe_video_requested.store(true, Ordering::Release);
                    }
                }
            }
            key == state.commodore_key || key == state.control_key
        };

        if key == MENU_KEY {
            if hub.ui_enabled() {
                hub.ui_keys.enqueue(KeyEvent::release(key));
            } else {
                // the emulator gets the release before the menu takes over
                hub.emu_keys.enqueue(KeyEvent::release(key));
                hub.request_toggle();
            }
            return;
        }

        if self.ports.lock().key_event(hub, key, false) {
            return;
        }

        match self.state.lock().combo_release(key) {
            Some(Some(func)) => {
                hub.request_quick_func(func);
                return;
            }
            // the press never reached the machine, so neither does the release
            Some(None) => return,
            None => {}
        }

        hub.route_key(KeyEvent::release(key));

        if is_modifier {
            self.run_deferred(hub);
        }
    }

    fn run_deferred(&self, hub: &EventHub) {
        let mut state = self.state.lock();
        for combo in state.combos.iter_mut().filter(|c| c.invoked) {
            combo.invoked = false;
            match combo.function {
                Some(QuickFunc::Menu) => hub.request_toggle(),
                Some(
                    func @ (QuickFunc::ResetMenu
                    | QuickFunc::ResetHard
                    | QuickFunc::ResetSoft
                    | QuickFunc::TapeMenu
                    | QuickFunc::CartMenu),
                ) => hub.request_quick_func(func),
                _ => {}
            }
        }
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::JoyLatchKind;
    use crate::joystick::JoyDevice;
    use std::vec::Vec;

    fn router() -> (KeyRouter, EventHub) {
        let router = KeyRouter::new();
        router.set_hotkey(0, Some(KeyCode::W), Some(QuickFunc::Warp));
        router.set_hotkey(1, Some(KeyCode::M), Some(QuickFunc::Menu));
        router.set_hotkey(4, Some(KeyCode::R), Some(QuickFunc::ResetMenu));
        (router, EventHub::new())
    }

    fn emu_keys(hub: &EventHub) -> Vec<KeyEvent> {
        hub.emu_keys.drain().collect()
    }

    #[test]
    fn test_plain_keys_go_to_emulator_or_menu() {
        let (router, hub) = router();
        router.key_pressed(&hub, KeyCode::A, 0);
        router.key_released(&hub, KeyCode::A, 0);
        assert_eq!(emu_keys(&hub), [KeyEvent::press(KeyCode::A), KeyEvent::release(KeyCode::A)]);

        hub.set_ui_enabled(true);
        router.key_pressed(&hub, KeyCode::A, 0);
        assert_eq!(hub.ui_keys.len(), 1);
        assert!(hub.emu_keys.is_empty());
    }

    #[test]
    fn test_warp_fires_on_second_key_release() {
        let (router, hub) = router();
        router.key_pressed(&hub, KeyCode::LeftControl, 0);
        router.key_pressed(&hub, KeyCode::W, 0);
        assert_eq!(hub.take_quick_func(), None);
        router.key_released(&hub, KeyCode::W, 0);
        assert_eq!(hub.take_quick_func(), Some(QuickFunc::Warp));
        router.key_released(&hub, KeyCode::LeftControl, 0);

        // only the modifier reached the emulator
        assert_eq!(
            emu_keys(&hub),
            [KeyEvent::press(KeyCode::LeftControl), KeyEvent::release(KeyCode::LeftControl)]
        );
    }

    #[test]
    fn test_menu_combo_waits_for_modifier_release() {
        let (router, hub) = router();
        router.key_pressed(&hub, KeyCode::LeftControl, 0);
        router.key_pressed(&hub, KeyCode::M, 0);
        router.key_released(&hub, KeyCode::M, 0);
        assert!(!hub.toggle_pending());
        router.key_released(&hub, KeyCode::LeftControl, 0);
        assert!(hub.toggle_pending());
    }

    #[test]
    fn test_control_slots_need_control_key() {
        let (router, hub) = router();
        router.key_pressed(&hub, KeyCode::LeftControl, 0);
        router.key_pressed(&hub, KeyCode::R, 0);
        // R is bound under Control, not Commodore
        assert_eq!(emu_keys(&hub).len(), 2);

        router.key_released(&hub, KeyCode::LeftControl, 0);
        router.key_pressed(&hub, KeyCode::Tab, 0);
        router.key_pressed(&hub, KeyCode::R, 0);
        router.key_released(&hub, KeyCode::R, 0);
        router.key_released(&hub, KeyCode::Tab, 0);
        assert_eq!(hub.take_quick_func(), Some(QuickFunc::ResetMenu));
    }

    #[test]
    fn test_f12_release_while_hidden_arms_toggle() {
        let (router, hub) = router();
        router.key_pressed(&hub, KeyCode::F12, 0);
        router.key_released(&hub, KeyCode::F12, 0);
        assert!(hub.toggle_pending());
        assert_eq!(emu_keys(&hub), [KeyEvent::press(KeyCode::F12), KeyEvent::release(KeyCode::F12)]);
    }

    #[test]
    fn test_f12_release_while_shown_goes_to_menu() {
        let (router, hub) = router();
        hub.set_ui_enabled(true);
        router.key_released(&hub, KeyCode::F12, 0);
        assert!(!hub.toggle_pending());
        assert_eq!(hub.ui_keys.drain().collect::<Vec<_>>(), [KeyEvent::release(KeyCode::F12)]);
    }

    #[test]
    fn test_joystick_keys_intercepted_first() {
        let (router, hub) = router();
        router.ports().set_device(0, JoyDevice::CursSp);
        router.key_pressed(&hub, KeyCode::Space, 0);
        assert!(hub.emu_keys.is_empty());
        let joy: Vec<_> = hub.joy.drain().collect();
        assert_eq!(joy.len(), 1);
        assert_eq!(joy[0].kind, JoyLatchKind::Or);
        assert_eq!(joy[0].port, 1);
    }

    #[test]
    fn test_commodore_f7_hold_requests_safe_video() {
        let (router, hub) = router();
        router.key_pressed(&hub, KeyCode::LeftControl, 0);
        router.key_pressed(&hub, KeyCode::F7, 100);
        router.key_released(&hub, KeyCode::F7, 100 + VIDEO_RESET_HOLD_US - 1);
        assert!(!router.take_safe_video_request());

        router.key_pressed(&hub, KeyCode::F7, 200);
        router.key_released(&hub, KeyCode::F7, 200 + VIDEO_RESET_HOLD_US);
        assert!(router.take_safe_video_request());
        assert!(!router.take_safe_video_request());
    }

    #[test]
    fn test_custom_modifiers() {
        let (router, hub) = router();
        router.set_modifiers(KeyCode::LeftAlt, KeyCode::RightControl);
        router.key_pressed(&hub, KeyCode::LeftAlt, 0);
        router.key_pressed(&hub, KeyCode::W, 0);
        router.key_released(&hub, KeyCode::W, 0);
        assert_eq!(hub.take_quick_func(), Some(QuickFunc::Warp));
        assert_eq!(router.modifiers(), (KeyCode::LeftAlt, KeyCode::RightControl));
    }
}

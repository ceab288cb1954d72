//! Key handling for the menu
//!
//! Turns drained UI key events into navigation actions. Direction keys
//! auto-repeat while held, getting faster the longer they are held.
//! Return, Escape and the paging keys act on release.

use crate::events::KeyEvent;
use crate::keycodes::KeyCode;
use crate::menu::ItemKind;
use crate::nav::{Action, MenuHandler, NavigationContext};
use crate::OsdError;

// ============================================================================
// Repeat Timing (in main-loop ticks)
// ============================================================================

/// Ticks before a held key first repeats
pub const INITIAL_ACTION_DELAY: u32 = 24;

/// Ticks between the first repeats
pub const INITIAL_ACTION_REPEAT_DELAY: u32 = 8;

/// Repeats before the first speed-up
pub const INITIAL_REPEATS_NEXT: u32 = 8;

/// Shortest delay between repeats
pub const DEFAULT_REPEAT_FLOOR: u32 = 2;

/// Auto-repeat state for the held direction key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRepeat {
    action: Option<Action>,
    ticks: u32,
    next: u32,
    repeats: u32,
    repeats_next: u32,
    floor: u32,
}

impl KeyRepeat {
    pub const fn new(floor: u32) -> Self {
        Self {
            action: None,
            ticks: 0,
            next: 0,
            repeats: 0,
            repeats_next: 0,
            floor: if floor == 0 { 1 } else { floor },
        }
    }

    /// Start holding `action`
    pub fn press(&mut self, action: Action) {
        self.action = Some(action);
        self.ticks = INITIAL_ACTION_DELAY;
        self.next = INITIAL_ACTION_REPEAT_DELAY;
        self.repeats = 0;
        self.repeats_next = INITIAL_REPEATS_NEXT;
    }

    pub fn release(&mut self) {
        self.action = None;
    }

    /// Change the shortest delay; a key being held keeps its schedule
    pub fn set_floor(&mut self, floor: u32) {
        self.floor = floor.max(1);
    }

    #[inline]
    pub fn held(&self) -> Option<Action> {
        self.action
    }

    /// Current delay between repeats
    #[inline]
    pub fn interval(&self) -> u32 {
        self.next
    }

    /// Advance one tick, returning the action when it is due to repeat
    pub fn tick(&mut self) -> Option<Action> {
        let action = self.action?;
        self.ticks = self.ticks.saturating_sub(1);
        if self.ticks > 0 {
            return None;
        }

        self.ticks = self.next;
        self.repeats += 1;
        if self.repeats >= self.repeats_next {
            self.repeats_next *= 4;
            self.next = (self.next / 2).max(self.floor);
        }
        Some(action)
    }
}

impl Default for KeyRepeat {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_FLOOR)
    }
}

// ============================================================================
// Input Engine
// ============================================================================

const SHIFT_LEFT: u8 = 1;
const SHIFT_RIGHT: u8 = 2;

pub struct InputEngine {
    repeat: KeyRepeat,
    shift: u8,
    commodore_key: KeyCode,
    commodore_down: bool,
}

impl InputEngine {
    pub const fn new(commodore_key: KeyCode, repeat_floor: u32) -> Self {
        Self {
            repeat: KeyRepeat::new(repeat_floor),
            shift: 0,
            commodore_key,
            commodore_down: false,
        }
    }

    /// A different modifier key starts out released
    pub fn set_commodore_key(&mut self, key: KeyCode) {
        if key != self.commodore_key {
            self.commodore_down = false;
        }
        self.commodore_key = key;
    }

    pub fn set_repeat_floor(&mut self, floor: u32) {
        self.repeat.set_floor(floor);
    }

    #[inline]
    pub fn shift_held(&self) -> bool {
        self.shift != 0
    }

    #[inline]
    pub fn commodore_held(&self) -> bool {
        self.commodore_down
    }

    #[inline]
    pub fn held(&self) -> Option<Action> {
        self.repeat.held()
    }

    #[inline]
    pub fn repeat(&self) -> &KeyRepeat {
        &self.repeat
    }

    pub fn handle(&mut self, event: KeyEvent, nav: &mut NavigationContext, handler: &mut dyn MenuHandler) -> Result<(), OsdError> {
        if event.pressed {
            self.key_pressed(event.key, nav, handler)
        } else {
            self.key_released(event.key, nav, handler)
        }
    }

    /// Run one repeat tick for the held key
    pub fn tick(&mut self, nav: &mut NavigationContext, handler: &mut dyn MenuHandler) -> Result<(), OsdError> {
        match self.repeat.tick() {
            Some(action) => nav.apply_action(action, handler),
            None => Ok(()),
        }
    }

    fn text_field_focused(nav: &NavigationContext) -> bool {
        nav.cursor_item()
            .and_then(|h| nav.item(h))
            .is_some_and(|item| matches!(item.kind, ItemKind::TextField { .. }) && !item.disabled)
    }

    pub fn key_pressed(&mut self, key: KeyCode, nav: &mut NavigationContext, handler: &mut dyn MenuHandler) -> Result<(), OsdError> {
        // View flags only last while the user stays on the item
        if key != KeyCode::Left && key != KeyCode::Right {
            nav.reset_view_flags();
        }

        if key == self.commodore_key {
            self.commodore_down = true;
            return Ok(());
        }

        nav.traverse();
        let typing = Self::text_field_focused(nav);

        let action = match key {
            KeyCode::Up => Some(Action::Up),
            KeyCode::Down => Some(Action::Down),
            KeyCode::Left => Some(Action::Left),
            KeyCode::Right => Some(Action::Right),
            KeyCode::Comma => Some(Action::MiniLeft),
            KeyCode::Period if !typing => Some(Action::MiniRight),
            _ => None,
        };
        if let Some(action) = action {
            self.repeat.press(action);
            return nav.apply_action(action, handler);
        }

        match key {
            KeyCode::Escape => return Ok(()),
            KeyCode::LeftShift => {
                self.shift |= SHIFT_LEFT;
                return Ok(());
            }
            KeyCode::RightShift => {
                self.shift |= SHIFT_RIGHT;
                return Ok(());
            }
            _ => {}
        }

        let shifted = self.shift != 0;
        let ch = if let Some(letter) = key.letter() {
            let letter = if shifted { letter.to_ascii_uppercase() } else { letter };
            Some(letter as char)
        } else if let Some(digit) = key.digit() {
            Some(digit as char)
        } else {
            match key {
                KeyCode::Dash if shifted => Some('_'),
                KeyCode::Dash => Some('-'),
                KeyCode::Period => Some('.'),
                KeyCode::Backspace => Some('\x08'),
                _ => None,
            }
        };

        if let Some(ch) = ch {
            self.type_char(ch, typing, nav);
        }
        Ok(())
    }

    fn type_char(&mut self, ch: char, typing: bool, nav: &mut NavigationContext) {
        if typing {
            if let Some(item) = nav.cursor_item().and_then(|h| nav.item_mut(h)) {
                item.type_char(ch);
            }
        } else if ch != '\x08' {
            nav.find_first(ch);
        }
    }

    pub fn key_released(&mut self, key: KeyCode, nav: &mut NavigationContext, handler: &mut dyn MenuHandler) -> Result<(), OsdError> {
        if key == self.commodore_key {
            self.commodore_down = false;
            return Ok(());
        }

        // FX keys double as hotkeys; leave them alone while the modifier is down
        let paging = !self.commodore_down;
        match key {
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Comma | KeyCode::Period => {
                self.repeat.release();
                Ok(())
            }
            KeyCode::Return => nav.apply_action(Action::Return, handler),
            KeyCode::Escape | KeyCode::BackQuote => nav.apply_action(Action::Escape, handler),
            KeyCode::F12 => nav.apply_action(Action::Exit, handler),
            KeyCode::Home | KeyCode::F1 if paging => {
                nav.to_top();
                Ok(())
            }
            KeyCode::End | KeyCode::F7 if paging => {
                nav.to_bottom();
                Ok(())
            }
            KeyCode::PageUp | KeyCode::F3 if paging => {
                nav.page_up();
                Ok(())
            }
            KeyCode::PageDown | KeyCode::F5 if paging => {
                nav.page_down();
                Ok(())
            }
            KeyCode::LeftShift => {
                self.shift &= !SHIFT_LEFT;
                Ok(())
            }
            KeyCode::RightShift => {
                self.shift &= !SHIFT_RIGHT;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl Default for InputEngine {
    fn default() -> Self {
        Self::new(KeyCode::LeftControl, DEFAULT_REPEAT_FLOOR)
    }
}

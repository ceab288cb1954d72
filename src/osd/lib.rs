//! On-screen menu, status overlay and input-event engine for a bare-metal
//! Raspberry Pi emulator front end.
//!
//! # Architecture
//!
//! ```text
//! keyboard / USB ISR ──► hotkeys::KeyRouter ──┐
//!                        joystick::JoyPorts ──┤
//!                                             ▼
//!                                     events::EventHub   (bounded queues)
//!                                             │ drained once per frame
//!                                             ▼
//!   input::InputEngine ──► nav::NavigationContext ──► menu::MenuArena
//!                                │      callbacks
//!                                ▼
//!                      emulator::EmulatorCore
//!
//!   view + overlay ──► render::Surface ──► video::VideoState ──► hal::Framebuffer
//! ```
//!
//! Interrupt handlers only enqueue. Everything else runs on the single
//! cooperative main loop, either from the emulator's vsync hook (OSD mode)
//! or from the pause trap while the menu has the machine stopped.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod dialog;
pub mod emulator;
pub mod events;
pub mod hal;
pub mod hotkeys;
pub mod input;
pub mod joystick;
pub mod keycodes;
pub mod menu;
pub mod nav;
pub mod overlay;
pub mod quick;
pub mod render;
pub mod trap;
pub mod ui;
pub mod video;
pub mod view;

pub use emulator::{EmuError, EmulatorCore};
pub use events::{EventHub, JoyEvent, JoyLatchKind, KeyEvent};
pub use keycodes::KeyCode;
pub use menu::{Geometry, ItemHandle, ItemKind, MenuArena, MenuItem};
pub use nav::{Action, MenuHandler, MenuSize, NavigationContext};
pub use ui::UiController;

// ============================================================================
// Menu Limits
// ============================================================================

/// Depth of the menu root stack
pub const NUM_MENU_ROOTS: usize = 5;

/// Longest item name kept (characters)
pub const MAX_MENU_STR: usize = 36;

/// Longest text field value (characters)
pub const MAX_FN_NAME: usize = 24;

/// Most choices a multiple-choice item may carry
pub const MAX_CHOICES: usize = 32;

/// Default menu size in character cells
pub const MENU_WIDTH_CHARS: i32 = 40;
pub const MENU_HEIGHT_CHARS: i32 = 25;

/// Glyph cell size in pixels
pub const CHAR_SIZE: i32 = 8;

// ============================================================================
// Errors
// ============================================================================

/// Structural misuse of the menu engine
///
/// These indicate a bug in the code building or driving the menus. The
/// engine rejects the operation, logs it and carries on with its state
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OsdError {
    #[error("menu stack is full")]
    StackFull,
    #[error("cannot pop the last menu root")]
    PopLastRoot,
    #[error("menu item handle is stale")]
    StaleHandle,
    #[error("menu item is not a folder")]
    NotAFolder,
    #[error("menu item has the wrong kind for this operation")]
    WrongKind,
    #[error("multiple choice item is full")]
    TooManyChoices,
    #[error("range minimum is above its maximum")]
    InvalidRange,
}

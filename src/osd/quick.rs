//! Quick functions
//!
//! Actions a hotkey can trigger without going through the main menu. The
//! keyboard ISR only records which one was asked for; the main loop runs
//! it (see `UiController::run_quick_func`). The reset, tape and cartridge
//! functions raise small OSD menus built here.

use alloc::rc::Rc;

use crate::menu::ItemHandle;
use crate::nav::{MenuSize, NavigationContext};
use crate::OsdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFunc {
    Menu,
    Warp,
    SwapPorts,
    StatusToggle,
    CartFreeze,
    CartMenu,
    ResetMenu,
    ResetSoft,
    ResetHard,
    /// Soft reset after the user confirmed it
    ResetSoftConfirmed,
    ResetHardConfirmed,
    TapeMenu,
}

static FUNC_NAMES: &[(&str, QuickFunc)] = &[
    ("Menu", QuickFunc::Menu),
    ("Warp", QuickFunc::Warp),
    ("Swap Ports", QuickFunc::SwapPorts),
    ("Status Toggle", QuickFunc::StatusToggle),
    ("Cart Freeze", QuickFunc::CartFreeze),
    ("Cart Menu", QuickFunc::CartMenu),
    ("Reset Menu", QuickFunc::ResetMenu),
    ("Soft Reset", QuickFunc::ResetSoft),
    ("Hard Reset", QuickFunc::ResetHard),
    ("Tape OSD", QuickFunc::TapeMenu),
];

impl QuickFunc {
    /// Name used in menus and the settings file
    pub fn name(self) -> &'static str {
        let base = match self {
            QuickFunc::ResetSoftConfirmed => QuickFunc::ResetSoft,
            QuickFunc::ResetHardConfirmed => QuickFunc::ResetHard,
            other => other,
        };
        FUNC_NAMES
            .iter()
            .find(|&&(_, f)| f == base)
            .map(|&(n, _)| n)
            .unwrap_or("None")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FUNC_NAMES.iter().find(|(n, _)| *n == name).map(|&(_, f)| f)
    }

    /// Runs as soon as the combo's second key comes up
    ///
    /// Everything else waits for the modifier to be released so the
    /// emulator never sees a modifier stuck down.
    pub fn fires_on_key_release(self) -> bool {
        matches!(
            self,
            QuickFunc::Warp | QuickFunc::SwapPorts | QuickFunc::StatusToggle | QuickFunc::CartFreeze
        )
    }

    /// Stable integer code, stored in menu items
    pub fn code(self) -> i32 {
        match self {
            QuickFunc::Menu => 1,
            QuickFunc::Warp => 2,
            QuickFunc::SwapPorts => 3,
            QuickFunc::StatusToggle => 4,
            QuickFunc::CartFreeze => 5,
            QuickFunc::CartMenu => 6,
            QuickFunc::ResetMenu => 7,
            QuickFunc::ResetSoft => 8,
            QuickFunc::ResetHard => 9,
            QuickFunc::ResetSoftConfirmed => 10,
            QuickFunc::ResetHardConfirmed => 11,
            QuickFunc::TapeMenu => 12,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            1 => QuickFunc::Menu,
            2 => QuickFunc::Warp,
            3 => QuickFunc::SwapPorts,
            4 => QuickFunc::StatusToggle,
            5 => QuickFunc::CartFreeze,
            6 => QuickFunc::CartMenu,
            7 => QuickFunc::ResetMenu,
            8 => QuickFunc::ResetSoft,
            9 => QuickFunc::ResetHard,
            10 => QuickFunc::ResetSoftConfirmed,
            11 => QuickFunc::ResetHardConfirmed,
            12 => QuickFunc::TapeMenu,
            _ => return None,
        })
    }
}

// ============================================================================
// OSD Menus
// ============================================================================

pub const ID_RESET_SOFT: i32 = 0x7001;
pub const ID_RESET_HARD: i32 = 0x7002;
pub const ID_TAPE_STOP: i32 = 0x7011;
pub const ID_TAPE_PLAY: i32 = 0x7012;
pub const ID_TAPE_FORWARD: i32 = 0x7013;
pub const ID_TAPE_REWIND: i32 = 0x7014;
pub const ID_TAPE_RECORD: i32 = 0x7015;
pub const ID_TAPE_RESET: i32 = 0x7016;
pub const ID_CART_FREEZE: i32 = 0x7021;
pub const ID_CART_DETACH: i32 = 0x7022;

fn show_osd<F>(nav: &mut NavigationContext, rows: i32, build: F) -> Result<ItemHandle, OsdError>
where
    F: FnOnce(&mut NavigationContext, ItemHandle) -> Result<(), OsdError>,
{
    let was_enabled = nav.is_enabled();
    let root = nav.push_menu(MenuSize::Chars(20), MenuSize::Chars(rows))?;
    build(nav, root)?;
    if !was_enabled {
        nav.enable_osd();
        nav.set_on_popped_off(Rc::new(|nav: &mut NavigationContext| nav.disable_osd()));
    }
    Ok(root)
}

/// Small reset menu shown over the running machine
pub fn show_reset_menu(nav: &mut NavigationContext) -> Result<ItemHandle, OsdError> {
    show_osd(nav, 2, |nav, root| {
        let tree = nav.tree_mut();
        tree.add_button(root, ID_RESET_SOFT, "Soft Reset")?;
        tree.add_button(root, ID_RESET_HARD, "Hard Reset")?;
        Ok(())
    })
}

/// Datasette transport controls
pub fn show_tape_menu(nav: &mut NavigationContext) -> Result<ItemHandle, OsdError> {
    show_osd(nav, 6, |nav, root| {
        let tree = nav.tree_mut();
        tree.add_button(root, ID_TAPE_STOP, "Stop")?;
        tree.add_button(root, ID_TAPE_PLAY, "Play")?;
        tree.add_button(root, ID_TAPE_FORWARD, "Fast Forward")?;
        tree.add_button(root, ID_TAPE_REWIND, "Rewind")?;
        tree.add_button(root, ID_TAPE_RECORD, "Record")?;
        tree.add_button(root, ID_TAPE_RESET, "Reset")?;
        Ok(())
    })
}

/// Cartridge shortcuts
pub fn show_cart_menu(nav: &mut NavigationContext) -> Result<ItemHandle, OsdError> {
    show_osd(nav, 2, |nav, root| {
        let tree = nav.tree_mut();
        tree.add_button(root, ID_CART_FREEZE, "Freeze")?;
        tree.add_button(root, ID_CART_DETACH, "Detach Cartridge")?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_codes() {
        assert_eq!(QuickFunc::from_name("Swap Ports"), Some(QuickFunc::SwapPorts));
        assert_eq!(QuickFunc::ResetHardConfirmed.name(), "Hard Reset");
        assert_eq!(QuickFunc::from_name("Bogus"), None);
        for code in 1..=12 {
            let func = QuickFunc::from_code(code).unwrap();
            assert_eq!(func.code(), code);
        }
        assert_eq!(QuickFunc::from_code(0), None);
    }

    #[test]
    fn test_release_timing() {
        assert!(QuickFunc::Warp.fires_on_key_release());
        assert!(!QuickFunc::Menu.fires_on_key_release());
        assert!(!QuickFunc::ResetSoft.fires_on_key_release());
    }

    #[test]
    fn test_reset_menu_while_hidden_is_osd() {
        let mut nav = NavigationContext::new(640, 480);
        let root = show_reset_menu(&mut nav).unwrap();
        assert!(nav.is_enabled());
        assert!(nav.is_osd_active());
        assert_eq!(nav.item(root).unwrap().children().len(), 2);

        nav.dismiss_osd_if_active().unwrap();
        assert_eq!(nav.depth(), 1);
        assert!(!nav.is_enabled());
        assert!(!nav.is_osd_active());
    }

    #[test]
    fn test_tape_menu_over_open_menu_is_not_osd() {
        let mut nav = NavigationContext::new(640, 480);
        nav.toggle();
        show_tape_menu(&mut nav).unwrap();
        assert!(!nav.is_osd_active());
        assert_eq!(nav.max_index(), 0);
        nav.traverse();
        assert_eq!(nav.max_index(), 6);
    }
}

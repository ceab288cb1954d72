//! Modal dialogs
//!
//! Error, info and confirm dialogs are small roots pushed over whatever is
//! showing. Raised while the menu is hidden they come up as an OSD, and
//! popping them hides the UI again.

use alloc::{rc::Rc, string::String, vec::Vec};

use crate::emulator::EmuError;
use crate::menu::ItemHandle;
use crate::nav::{MenuSize, NavigationContext};
use crate::quick::QuickFunc;
use crate::OsdError;

pub const ID_ERROR_DIALOG: i32 = 0x7101;
pub const ID_INFO_DIALOG: i32 = 0x7102;
pub const ID_CONFIRM_OK: i32 = 0x7103;
pub const ID_CONFIRM_CANCEL: i32 = 0x7104;

/// `sub_id` of an OK button whose value is a [`QuickFunc`] code
pub const SUB_ID_QUICK_FUNC: i32 = 1;

/// Dialog width in characters; wrapped lines stay shorter than this
pub const DIALOG_WIDTH_CHARS: i32 = 30;

fn make_osd_if_hidden(nav: &mut NavigationContext, was_enabled: bool) {
    if !was_enabled {
        nav.enable_osd();
        nav.set_on_popped_off(Rc::new(|nav: &mut NavigationContext| nav.disable_osd()));
    }
}

fn message_dialog(nav: &mut NavigationContext, id: i32, header: &str, message: &str) -> Result<ItemHandle, OsdError> {
    let was_enabled = nav.is_enabled();
    let root = nav.push_menu(MenuSize::Chars(DIALOG_WIDTH_CHARS), MenuSize::Chars(4))?;
    nav.set_transparent(false);
    make_osd_if_hidden(nav, was_enabled);

    let tree = nav.tree_mut();
    tree.add_button(root, id, header)?;
    tree.add_divider(root)?;
    tree.add_button(root, id, message)?;
    Ok(root)
}

pub fn error(nav: &mut NavigationContext, message: &str) -> Result<ItemHandle, OsdError> {
    log::error!("{}", message);
    message_dialog(nav, ID_ERROR_DIALOG, "Error", message)
}

pub fn info(nav: &mut NavigationContext, message: &str) -> Result<ItemHandle, OsdError> {
    log::info!("{}", message);
    message_dialog(nav, ID_INFO_DIALOG, "Info", message)
}

/// Show an emulator failure as an error dialog, passing success through
pub fn report<T>(nav: &mut NavigationContext, result: Result<T, EmuError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let message = alloc::format!("{}", err);
            if let Err(shown) = error(nav, &message) {
                log::warn!("dialog: could not show \"{}\": {}", message, shown);
            }
            None
        }
    }
}

/// Split `text` on spaces into lines shorter than the dialog width
pub fn wrap_lines(text: &str) -> Vec<String> {
    let limit = DIALOG_WIDTH_CHARS as usize;
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let len = word.chars().count();
        if line.chars().count() + len >= limit && !line.is_empty() {
            lines.push(core::mem::take(&mut line));
        }
        line.push_str(word);
        line.push(' ');
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Title, optional OK/CANCEL and word-wrapped text
///
/// The OK button carries `ok` as (value, sub_id) for whoever handles
/// [`ID_CONFIRM_OK`]. Without `ok` the dialog is informational only.
pub fn confirm(
    nav: &mut NavigationContext,
    title: &str,
    text: &str,
    ok: Option<(i32, i32)>,
) -> Result<ItemHandle, OsdError> {
    let was_enabled = nav.is_enabled();
    let root = nav.push_menu(MenuSize::Chars(DIALOG_WIDTH_CHARS), MenuSize::Chars(10))?;
    make_osd_if_hidden(nav, was_enabled);

    let tree = nav.tree_mut();
    tree.add_button(root, ID_ERROR_DIALOG, title)?;
    if let Some((value, sub_id)) = ok {
        let button = tree.add_button_with_value(root, ID_CONFIRM_OK, "OK", value, "", "")?;
        tree.item_mut(button)?.sub_id = sub_id;
        tree.add_button(root, ID_CONFIRM_CANCEL, "CANCEL")?;
    }
    tree.add_divider(root)?;
    for line in wrap_lines(text) {
        tree.add_button(root, ID_INFO_DIALOG, &line)?;
    }
    Ok(root)
}

/// Ask before running `func`; OK comes back as [`ID_CONFIRM_OK`] with the
/// function's code
pub fn confirm_quick_func(nav: &mut NavigationContext, func: QuickFunc) -> Result<ItemHandle, OsdError> {
    confirm(nav, func.name(), "Are you sure?", Some((func.code(), SUB_ID_QUICK_FUNC)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nav: &NavigationContext, root: ItemHandle) -> Vec<String> {
        nav.item(root)
            .unwrap()
            .children()
            .iter()
            .map(|&c| nav.item(c).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("The quick brown fox jumps over the lazy dog again and again");
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= DIALOG_WIDTH_CHARS as usize));
        assert_eq!(lines.concat().split_whitespace().count(), 12);
        assert!(wrap_lines("").is_empty());
    }

    #[test]
    fn test_error_dialog_layout() {
        let mut nav = NavigationContext::new(640, 480);
        nav.toggle();
        let root = error(&mut nav, "Could not attach game.d64").unwrap();
        assert_eq!(names(&nav, root), ["Error", "", "Could not attach game.d64"]);
        assert_eq!(nav.item(root).unwrap().geometry.width, 30 * 8);
        assert!(!nav.is_osd_active());
    }

    #[test]
    fn test_report_passes_ok_through() {
        let mut nav = NavigationContext::new(640, 480);
        assert_eq!(report(&mut nav, Ok::<_, EmuError>(3)), Some(3));
        assert_eq!(nav.depth(), 1);

        let failed: Result<(), EmuError> = Err(EmuError::Attach("x.crt".into()));
        assert_eq!(report(&mut nav, failed), None);
        assert_eq!(nav.depth(), 2);
        // raised while hidden, so it is an OSD
        assert!(nav.is_osd_active());
        nav.dismiss_osd_if_active().unwrap();
        assert!(!nav.is_enabled());
    }

    #[test]
    fn test_report_with_full_stack() {
        let mut nav = NavigationContext::new(640, 480);
        nav.toggle();
        while nav.depth() < crate::NUM_MENU_ROOTS {
            nav.push_menu(MenuSize::Default, MenuSize::Default).unwrap();
        }

        let failed: Result<u8, EmuError> = Err(EmuError::Snapshot("a.vsf".into()));
        assert_eq!(report(&mut nav, failed), None);
        assert_eq!(nav.depth(), crate::NUM_MENU_ROOTS);
        assert!(nav.is_enabled());
        assert!(!nav.is_osd_active());
    }

    #[test]
    fn test_confirm_carries_quick_func() {
        let mut nav = NavigationContext::new(640, 480);
        nav.toggle();
        let root = confirm_quick_func(&mut nav, QuickFunc::ResetHardConfirmed).unwrap();
        let children = nav.item(root).unwrap().children().to_vec();
        let ok = nav.item(children[1]).unwrap();
        assert_eq!(ok.id, ID_CONFIRM_OK);
        assert_eq!(ok.value(), QuickFunc::ResetHardConfirmed.code());
        assert_eq!(ok.sub_id, SUB_ID_QUICK_FUNC);
        assert_eq!(nav.item(children[2]).unwrap().name, "CANCEL");
    }
}

//! Menu rendering
//!
//! Draws every stacked root, bottom to top, into an indexed surface. Each
//! root gets a background (unless the menu is in transparent mode) and a
//! one pixel border; rows are drawn inside the root's scroll window.

use alloc::{string::String, vec::Vec};
use core::fmt::Write;

use crate::menu::{ItemKind, MenuItem};
use crate::nav::{NavigationContext, RootView};
use crate::render::{draw_char_raw, draw_text, menu_color, text_width, Font, Surface};
use crate::CHAR_SIZE;

/// Text drawn right-aligned on an item's row, if any
pub fn value_label(item: &MenuItem) -> Option<String> {
    match &item.kind {
        ItemKind::Toggle { on, labels } => Some(match labels {
            Some(labels) => labels[*on as usize].clone(),
            None => String::from(if *on { "On" } else { "Off" }),
        }),
        ItemKind::Checkbox { checked } => Some(String::from(if *checked { "True" } else { "False" })),
        ItemKind::Range { value, divisor, .. } => {
            let mut out = String::new();
            if *divisor == 1 || *divisor == 0 {
                let _ = write!(out, "{}", value);
            } else {
                let _ = write!(out, "{:.3}", *value as f32 / *divisor as f32);
            }
            Some(out)
        }
        ItemKind::MultipleChoice { selected, choices } => choices.get(*selected).map(|c| c.label.clone()),
        ItemKind::Button { .. } => item.button_display(),
        _ => None,
    }
}

/// Draw the whole menu stack
///
/// The surface is cleared to the transparent index first so only the
/// menus themselves cover what is underneath.
pub fn render(nav: &mut NavigationContext, surface: &mut Surface, font: &Font) {
    nav.traverse();
    surface.fill(menu_color::TRANSPARENT);
    let roots: Vec<RootView> = nav.root_views().collect();
    for root in &roots {
        render_root(nav, root, surface, font);
    }
}

/// Draw only the current root
pub fn render_top(nav: &mut NavigationContext, surface: &mut Surface, font: &Font) {
    nav.traverse();
    surface.fill(menu_color::TRANSPARENT);
    if let Some(root) = nav.root_views().last() {
        render_root(nav, &root, surface, font);
    }
}

fn render_root(nav: &mut NavigationContext, root: &RootView, surface: &mut Surface, font: &Font) {
    let Some(geometry) = nav.item(root.handle).map(|r| r.geometry) else { return };

    if !nav.is_transparent() {
        surface.draw_rect(geometry.left, geometry.top, geometry.width, geometry.height, menu_color::BG, true);
    }
    surface.draw_rect(
        geometry.left - 1,
        geometry.top - 1,
        geometry.width + 2,
        geometry.height + 2,
        menu_color::BORDER,
        false,
    );

    let current_only = nav.render_current_item_only();
    nav.tree_mut().walk_visible(root.handle, |_, item, index, indent| {
        if index < root.window_top || index >= root.window_bottom {
            return;
        }
        let is_cursor = index == root.cursor;
        render_row(surface, font, item, (index - root.window_top) as i32, indent as i32, is_cursor, current_only);
    });
}

fn render_row(
    surface: &mut Surface,
    font: &Font,
    item: &MenuItem,
    row: i32,
    indent: i32,
    is_cursor: bool,
    current_only: bool,
) {
    let g = item.geometry;
    let y = row * CHAR_SIZE + g.top;
    let color = if item.disabled { menu_color::DISABLED } else { menu_color::FG };

    if is_cursor {
        surface.draw_rect(g.left, y, g.width, CHAR_SIZE, menu_color::HILITE, true);
    }
    if let Some(symbol) = item.symbol {
        draw_char_raw(surface, font, symbol, g.left + indent * CHAR_SIZE, y, color, 1);
    }
    if current_only && !is_cursor {
        return;
    }

    draw_text(surface, font, &item.name, g.left + (indent + 1) * CHAR_SIZE, y, color, 1);

    let right = |text: &str| g.left + g.width - text_width(text);
    match &item.kind {
        ItemKind::Folder { expanded, .. } => {
            let mark = if *expanded { "-" } else { "+" };
            draw_text(surface, font, mark, g.left + indent * CHAR_SIZE, y, color, 1);
        }
        ItemKind::Divider => {
            surface.draw_rect(g.left, y + 3, g.width, 2, menu_color::BORDER, true);
        }
        ItemKind::TextField { text, cursor } => {
            let x = g.left + text_width(&item.name) + CHAR_SIZE;
            surface.draw_rect(x + *cursor as i32 * CHAR_SIZE, y, CHAR_SIZE, CHAR_SIZE, menu_color::BORDER, true);
            draw_text(surface, font, text, x, y, color, 1);
        }
        _ => {
            if let Some(label) = value_label(item) {
                draw_text(surface, font, &label, right(&label), y, color, 1);
            }
        }
    }
}

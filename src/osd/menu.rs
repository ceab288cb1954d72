//! Menu tree
//!
//! Menu items live in an arena and are referred to by generation-checked
//! handles. A folder owns an ordered list of child handles; freeing a
//! subtree recycles every slot reachable from it and bumps the slot
//! generations, so handles held elsewhere resolve to `None` afterwards
//! instead of aliasing a recycled item.

use alloc::{rc::Rc, string::String, vec::Vec};
use core::fmt::Write;

use crate::nav::NavigationContext;
use crate::{OsdError, MAX_CHOICES, MAX_FN_NAME, MAX_MENU_STR};

/// Per-item value-changed callback
pub type ItemCallback = Rc<dyn Fn(&mut NavigationContext, ItemHandle)>;

/// Maps a stored value to the number shown on screen
pub type MapValueFn = fn(i32) -> i32;

/// Id carried by items that never dispatch (folders, dividers)
pub const ID_NONE: i32 = 0;

// ============================================================================
// Handles and Geometry
// ============================================================================

/// Reference to a menu item in a [`MenuArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    index: u32,
    generation: u32,
}

/// Pixel rectangle of the menu an item belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self { left, top, width, height }
    }
}

// ============================================================================
// Item Kinds
// ============================================================================

/// One entry of a multiple-choice item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub code: i32,
    pub disabled: bool,
}

/// Kind-specific payload of a menu item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Folder {
        expanded: bool,
        children: Vec<ItemHandle>,
    },
    Divider,
    Toggle {
        on: bool,
        /// Custom off/on labels
        labels: Option<[String; 2]>,
    },
    Checkbox {
        checked: bool,
    },
    Range {
        value: i32,
        min: i32,
        max: i32,
        step: i32,
        ministep: i32,
        divisor: i32,
    },
    MultipleChoice {
        selected: usize,
        choices: Vec<Choice>,
    },
    Button {
        value: i32,
        str_value: String,
        displayed: String,
        prefer_str: bool,
    },
    TextField {
        text: String,
        cursor: usize,
    },
}

/// A node in the menu tree
pub struct MenuItem {
    pub name: String,
    pub id: i32,
    pub sub_id: i32,
    pub geometry: Geometry,
    pub disabled: bool,
    /// Raw glyph drawn on the left edge
    pub symbol: Option<u8>,
    pub kind: ItemKind,
    pub on_value_changed: Option<ItemCallback>,
    pub map_value: Option<MapValueFn>,
    parent: Option<ItemHandle>,
    render_index: Option<usize>,
}

impl MenuItem {
    fn new(name: &str, id: i32, geometry: Geometry, kind: ItemKind) -> Self {
        Self {
            name: truncated(name, MAX_MENU_STR),
            id,
            sub_id: 0,
            geometry,
            disabled: false,
            symbol: None,
            kind,
            on_value_changed: None,
            map_value: None,
            parent: None,
            render_index: None,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<ItemHandle> {
        self.parent
    }

    /// Flattened row set by the last traversal
    #[inline]
    pub fn render_index(&self) -> Option<usize> {
        self.render_index
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder { .. })
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self.kind, ItemKind::Folder { expanded: true, .. })
    }

    pub fn children(&self) -> &[ItemHandle] {
        match &self.kind {
            ItemKind::Folder { children, .. } => children,
            _ => &[],
        }
    }

    /// Integer value in the sense menu handlers switch on
    ///
    /// Booleans are 0/1, a multiple choice reports its selected index.
    pub fn value(&self) -> i32 {
        match &self.kind {
            ItemKind::Folder { expanded, .. } => *expanded as i32,
            ItemKind::Divider => 0,
            ItemKind::Toggle { on, .. } => *on as i32,
            ItemKind::Checkbox { checked } => *checked as i32,
            ItemKind::Range { value, .. } => *value,
            ItemKind::MultipleChoice { selected, .. } => *selected as i32,
            ItemKind::Button { value, .. } => *value,
            ItemKind::TextField { cursor, .. } => *cursor as i32,
        }
    }

    /// Set the integer value, clamped to what the kind can hold
    pub fn set_value(&mut self, new_value: i32) {
        match &mut self.kind {
            ItemKind::Folder { expanded, .. } => *expanded = new_value != 0,
            ItemKind::Divider => {}
            ItemKind::Toggle { on, .. } => *on = new_value != 0,
            ItemKind::Checkbox { checked } => *checked = new_value != 0,
            ItemKind::Range { value, min, max, .. } => *value = new_value.min(*max).max(*min),
            ItemKind::MultipleChoice { selected, choices } => {
                if new_value >= 0 && (new_value as usize) < choices.len() {
                    *selected = new_value as usize;
                }
            }
            ItemKind::Button { value, .. } => *value = new_value,
            ItemKind::TextField { text, cursor } => {
                *cursor = (new_value.max(0) as usize).min(text.chars().count());
            }
        }
    }

    /// Code of the selected choice
    pub fn choice_code(&self) -> Option<i32> {
        match &self.kind {
            ItemKind::MultipleChoice { selected, choices } => choices.get(*selected).map(|c| c.code),
            _ => None,
        }
    }

    /// Select the choice carrying `code`
    pub fn select_code(&mut self, code: i32) -> bool {
        if let ItemKind::MultipleChoice { selected, choices } = &mut self.kind {
            if let Some(pos) = choices.iter().position(|c| c.code == code) {
                *selected = pos;
                return true;
            }
        }
        false
    }

    /// String payload of buttons and text fields
    pub fn str_value(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Button { str_value, .. } => Some(str_value),
            ItemKind::TextField { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Text drawn right-aligned on a button row
    pub fn button_display(&self) -> Option<String> {
        match &self.kind {
            ItemKind::Button { value, displayed, prefer_str, .. } => {
                if *prefer_str || !displayed.is_empty() {
                    Some(displayed.clone())
                } else {
                    let shown = self.map_value.map_or(*value, |map| map(*value));
                    let mut out = String::new();
                    let _ = write!(out, "{}", shown);
                    Some(out)
                }
            }
            _ => None,
        }
    }

    pub(crate) fn set_render_index(&mut self, index: usize) {
        self.render_index = Some(index);
    }

    // ------------------------------------------------------------------------
    // Navigation behaviour
    // ------------------------------------------------------------------------

    /// Left/Right (or the mini variants) on this item
    ///
    /// Returns true when the change should be reported.
    pub(crate) fn adjust(&mut self, forward: bool, mini: bool) -> bool {
        if self.disabled {
            return false;
        }
        match &mut self.kind {
            ItemKind::Range { value, min, max, step, ministep, .. } => {
                let delta = if mini { *ministep } else { *step };
                let original = *value;
                let stepped = if forward {
                    value.saturating_add(delta)
                } else {
                    value.saturating_sub(delta)
                };
                *value = stepped.clamp(*min, (*max).max(*min));
                *value != original
            }
            ItemKind::MultipleChoice { selected, choices } => {
                if choices.is_empty() {
                    return false;
                }
                *selected = next_enabled(choices, *selected, forward);
                true
            }
            ItemKind::Toggle { on, .. } => {
                *on = !*on;
                true
            }
            ItemKind::TextField { text, cursor } => {
                if forward {
                    *cursor = (*cursor + 1).min(text.chars().count());
                } else {
                    *cursor = cursor.saturating_sub(1);
                }
                false
            }
            _ => false,
        }
    }

    /// Return on this item
    ///
    /// A multiple choice only ever advances here, unlike Left/Right.
    pub(crate) fn activate(&mut self) -> bool {
        if self.disabled {
            return false;
        }
        match &mut self.kind {
            ItemKind::Folder { expanded, .. } => {
                *expanded = !*expanded;
                true
            }
            ItemKind::Checkbox { checked } => {
                *checked = !*checked;
                true
            }
            ItemKind::Toggle { on, .. } => {
                *on = !*on;
                true
            }
            ItemKind::Button { .. } | ItemKind::TextField { .. } => true,
            ItemKind::MultipleChoice { selected, choices } => {
                if choices.is_empty() {
                    return false;
                }
                *selected = next_enabled(choices, *selected, true);
                true
            }
            ItemKind::Divider | ItemKind::Range { .. } => false,
        }
    }

    /// Insert a character at the text cursor (or delete before it on `\x08`)
    pub(crate) fn type_char(&mut self, ch: char) -> bool {
        let ItemKind::TextField { text, cursor } = &mut self.kind else {
            return false;
        };
        if ch == '\x08' {
            if *cursor == 0 {
                return false;
            }
            let at = byte_offset(text, *cursor - 1);
            text.remove(at);
            *cursor -= 1;
        } else {
            if text.chars().count() >= MAX_FN_NAME {
                return false;
            }
            let at = byte_offset(text, *cursor);
            text.insert(at, ch);
            *cursor += 1;
        }
        true
    }
}

/// Step to the previous/next enabled choice with wraparound
///
/// Comes back to `from` when every other choice is disabled.
fn next_enabled(choices: &[Choice], from: usize, forward: bool) -> usize {
    let n = choices.len();
    let mut idx = from.min(n.saturating_sub(1));
    for _ in 0..n {
        idx = if forward { (idx + 1) % n } else { (idx + n - 1) % n };
        if !choices[idx].disabled || idx == from {
            return idx;
        }
    }
    from
}

fn byte_offset(text: &str, char_pos: usize) -> usize {
    text.char_indices().nth(char_pos).map_or(text.len(), |(i, _)| i)
}

fn truncated(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// ============================================================================
// Arena
// ============================================================================

struct Slot {
    generation: u32,
    item: Option<MenuItem>,
}

/// Owner of every live menu item
#[derive(Default)]
pub struct MenuArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl MenuArena {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of allocated items
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    fn alloc(&mut self, item: MenuItem) -> ItemHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.item = Some(item);
            return ItemHandle { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, item: Some(item) });
        ItemHandle { index, generation: 0 }
    }

    pub fn get(&self, handle: ItemHandle) -> Option<&MenuItem> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.item.as_ref())
    }

    pub fn get_mut(&mut self, handle: ItemHandle) -> Option<&mut MenuItem> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.item.as_mut())
    }

    #[inline]
    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Like [`get_mut`](Self::get_mut) but stale handles are an error
    pub fn item_mut(&mut self, handle: ItemHandle) -> Result<&mut MenuItem, OsdError> {
        self.get_mut(handle).ok_or(OsdError::StaleHandle)
    }

    /// Allocate a detached, expanded folder to act as a menu root
    pub fn new_root(&mut self, geometry: Geometry) -> ItemHandle {
        self.alloc(MenuItem::new(
            "",
            ID_NONE,
            geometry,
            ItemKind::Folder { expanded: true, children: Vec::new() },
        ))
    }

    /// Free `handle` and everything below it
    ///
    /// Returns the number of items released.
    pub fn free_subtree(&mut self, handle: ItemHandle) -> usize {
        if let Some(parent) = self.get(handle).and_then(|item| item.parent) {
            if let Some(ItemKind::Folder { children, .. }) = self.get_mut(parent).map(|p| &mut p.kind) {
                children.retain(|&child| child != handle);
            }
        }

        let mut released = 0;
        let mut pending = Vec::new();
        pending.push(handle);
        while let Some(next) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(next.index as usize)
                .filter(|slot| slot.generation == next.generation)
            else {
                continue;
            };
            if let Some(item) = slot.item.take() {
                if let ItemKind::Folder { children, .. } = item.kind {
                    pending.extend(children);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                self.live -= 1;
                released += 1;
            }
        }
        released
    }

    // ------------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------------

    fn add_item(&mut self, parent: ItemHandle, name: &str, id: i32, kind: ItemKind) -> Result<ItemHandle, OsdError> {
        let geometry = match self.get(parent) {
            Some(folder) if folder.is_folder() => folder.geometry,
            Some(_) => return Err(reject(name, OsdError::NotAFolder)),
            None => return Err(reject(name, OsdError::StaleHandle)),
        };

        let mut item = MenuItem::new(name, id, geometry, kind);
        item.parent = Some(parent);
        let handle = self.alloc(item);
        if let Some(ItemKind::Folder { children, .. }) = self.get_mut(parent).map(|p| &mut p.kind) {
            children.push(handle);
        }
        Ok(handle)
    }

    pub fn add_toggle(&mut self, parent: ItemHandle, id: i32, name: &str, on: bool) -> Result<ItemHandle, OsdError> {
        self.add_item(parent, name, id, ItemKind::Toggle { on, labels: None })
    }

    /// Toggle showing `off_label`/`on_label` instead of Off/On
    pub fn add_toggle_labels(
        &mut self,
        parent: ItemHandle,
        id: i32,
        name: &str,
        on: bool,
        off_label: &str,
        on_label: &str,
    ) -> Result<ItemHandle, OsdError> {
        let labels = Some([String::from(off_label), String::from(on_label)]);
        self.add_item(parent, name, id, ItemKind::Toggle { on, labels })
    }

    pub fn add_checkbox(&mut self, parent: ItemHandle, id: i32, name: &str, checked: bool) -> Result<ItemHandle, OsdError> {
        self.add_item(parent, name, id, ItemKind::Checkbox { checked })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_range(
        &mut self,
        parent: ItemHandle,
        id: i32,
        name: &str,
        min: i32,
        max: i32,
        step: i32,
        value: i32,
    ) -> Result<ItemHandle, OsdError> {
        if min > max {
            return Err(reject("add_range", OsdError::InvalidRange));
        }
        let kind = ItemKind::Range {
            value: value.clamp(min, max),
            min,
            max,
            step,
            ministep: 1,
            divisor: 1,
        };
        self.add_item(parent, name, id, kind)
    }

    /// Empty multiple choice; fill it with [`add_choice`](Self::add_choice)
    pub fn add_multiple_choice(&mut self, parent: ItemHandle, id: i32, name: &str) -> Result<ItemHandle, OsdError> {
        let kind = ItemKind::MultipleChoice { selected: 0, choices: Vec::new() };
        self.add_item(parent, name, id, kind)
    }

    /// Append a choice, returning its index
    pub fn add_choice(&mut self, item: ItemHandle, label: &str, code: i32) -> Result<usize, OsdError> {
        let entry = self.item_mut(item)?;
        let ItemKind::MultipleChoice { choices, .. } = &mut entry.kind else {
            return Err(reject(label, OsdError::WrongKind));
        };
        if choices.len() >= MAX_CHOICES {
            return Err(reject(label, OsdError::TooManyChoices));
        }
        choices.push(Choice {
            label: truncated(label, MAX_MENU_STR),
            code,
            disabled: false,
        });
        Ok(choices.len() - 1)
    }

    pub fn set_choice_disabled(&mut self, item: ItemHandle, index: usize, disabled: bool) -> Result<(), OsdError> {
        let entry = self.item_mut(item)?;
        match &mut entry.kind {
            ItemKind::MultipleChoice { choices, .. } => {
                let choice = choices.get_mut(index).ok_or(OsdError::WrongKind)?;
                choice.disabled = disabled;
                Ok(())
            }
            _ => Err(OsdError::WrongKind),
        }
    }

    pub fn add_button(&mut self, parent: ItemHandle, id: i32, name: &str) -> Result<ItemHandle, OsdError> {
        let kind = ItemKind::Button {
            value: 0,
            str_value: String::new(),
            displayed: String::new(),
            prefer_str: true,
        };
        self.add_item(parent, name, id, kind)
    }

    pub fn add_button_with_value(
        &mut self,
        parent: ItemHandle,
        id: i32,
        name: &str,
        value: i32,
        str_value: &str,
        displayed: &str,
    ) -> Result<ItemHandle, OsdError> {
        let kind = ItemKind::Button {
            value,
            str_value: String::from(str_value),
            displayed: String::from(displayed),
            prefer_str: false,
        };
        self.add_item(parent, name, id, kind)
    }

    pub fn add_folder(&mut self, parent: ItemHandle, name: &str) -> Result<ItemHandle, OsdError> {
        let kind = ItemKind::Folder { expanded: false, children: Vec::new() };
        self.add_item(parent, name, ID_NONE, kind)
    }

    pub fn add_divider(&mut self, parent: ItemHandle) -> Result<ItemHandle, OsdError> {
        self.add_item(parent, "", ID_NONE, ItemKind::Divider)
    }

    pub fn add_text_field(&mut self, parent: ItemHandle, id: i32, name: &str, text: &str) -> Result<ItemHandle, OsdError> {
        let text = truncated(text, MAX_FN_NAME);
        let cursor = text.chars().count();
        self.add_item(parent, name, id, ItemKind::TextField { text, cursor })
    }

    /// Move every child of folder `src` to the end of folder `dest`
    ///
    /// The moved items take on `dest`'s geometry. `src` is left empty.
    pub fn add_all(&mut self, src: ItemHandle, dest: ItemHandle) -> Result<(), OsdError> {
        let dest_geometry = match self.get(dest) {
            Some(folder) if folder.is_folder() => folder.geometry,
            Some(_) => return Err(reject("add_all", OsdError::NotAFolder)),
            None => return Err(reject("add_all", OsdError::StaleHandle)),
        };
        let moved = match self.get_mut(src).map(|item| &mut item.kind) {
            Some(ItemKind::Folder { children, .. }) => core::mem::take(children),
            Some(_) => return Err(reject("add_all", OsdError::NotAFolder)),
            None => return Err(reject("add_all", OsdError::StaleHandle)),
        };

        for &child in &moved {
            if let Some(item) = self.get_mut(child) {
                item.parent = Some(dest);
                item.geometry = dest_geometry;
            }
        }
        if let Some(ItemKind::Folder { children, .. }) = self.get_mut(dest).map(|item| &mut item.kind) {
            children.extend(moved);
        }
        Ok(())
    }

    /// Depth-first search below `root`, collapsed folders included
    pub fn find_item_by_id(&self, root: ItemHandle, id: i32) -> Option<ItemHandle> {
        let mut pending: Vec<ItemHandle> = self.get(root)?.children().iter().rev().copied().collect();
        while let Some(handle) = pending.pop() {
            let Some(item) = self.get(handle) else { continue };
            if item.id == id {
                return Some(handle);
            }
            pending.extend(item.children().iter().rev());
        }
        None
    }

    /// Visit the rows of `root` in display order, skipping the contents of
    /// collapsed folders
    ///
    /// Each visited item gets its render index assigned. The visitor sees
    /// the row index and the indent level. Returns the row count.
    pub fn walk_visible<F>(&mut self, root: ItemHandle, mut visit: F) -> usize
    where
        F: FnMut(ItemHandle, &mut MenuItem, usize, usize),
    {
        let mut index = 0;
        let mut pending: Vec<(ItemHandle, usize)> = match self.get(root) {
            Some(item) => item.children().iter().rev().map(|&c| (c, 0)).collect(),
            None => return 0,
        };

        while let Some((handle, indent)) = pending.pop() {
            let Some(item) = self.get_mut(handle) else { continue };
            item.set_render_index(index);
            visit(handle, item, index, indent);
            index += 1;
            if let ItemKind::Folder { expanded: true, children } = &item.kind {
                pending.extend(children.iter().rev().map(|&c| (c, indent + 1)));
            }
        }
        index
    }

    /// Give `root` and everything below it a new origin
    pub fn move_subtree(&mut self, root: ItemHandle, left: i32, top: i32) {
        let mut pending = Vec::new();
        pending.push(root);
        while let Some(handle) = pending.pop() {
            if let Some(item) = self.get_mut(handle) {
                item.geometry.left = left;
                item.geometry.top = top;
                pending.extend(item.children());
            }
        }
    }
}

fn reject(what: &str, err: OsdError) -> OsdError {
    log::error!("menu: {}: {}", what, err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(arena: &mut MenuArena) -> ItemHandle {
        arena.new_root(Geometry::new(8, 16, 320, 200))
    }

    #[test]
    fn test_children_inherit_geometry() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let folder = arena.add_folder(r, "Drive 8").unwrap();
        let toggle = arena.add_toggle(folder, 7, "IEC", false).unwrap();

        assert_eq!(arena.get(toggle).unwrap().geometry, Geometry::new(8, 16, 320, 200));
        assert_eq!(arena.get(toggle).unwrap().parent(), Some(folder));
        assert_eq!(arena.get(folder).unwrap().children(), &[toggle]);
    }

    #[test]
    fn test_only_folders_take_children() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let toggle = arena.add_toggle(r, 1, "Warp", false).unwrap();
        assert_eq!(arena.add_checkbox(toggle, 2, "Nope", false), Err(OsdError::NotAFolder));
    }

    #[test]
    fn test_free_subtree_invalidates_handles() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let folder = arena.add_folder(r, "Video").unwrap();
        let a = arena.add_checkbox(folder, 1, "A", true).unwrap();
        let b = arena.add_range(folder, 2, "B", 0, 10, 1, 5).unwrap();
        assert_eq!(arena.live_count(), 4);

        assert_eq!(arena.free_subtree(folder), 3);
        assert!(!arena.contains(folder));
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
        assert!(arena.get(r).unwrap().children().is_empty());

        // Recycled slot does not resurrect the old handle
        let c = arena.add_divider(r).unwrap();
        assert!(arena.contains(c));
        assert!(!arena.contains(a));
        assert_eq!(arena.live_count(), 2);
    }

    #[test]
    fn test_add_all_moves_children() {
        let mut arena = MenuArena::new();
        let src = arena.new_root(Geometry::new(0, 0, 100, 100));
        let dest = arena.new_root(Geometry::new(40, 50, 200, 80));
        let keep = arena.add_button(dest, 1, "Keep").unwrap();
        let x = arena.add_button(src, 2, "X").unwrap();
        let y = arena.add_button(src, 3, "Y").unwrap();

        arena.add_all(src, dest).unwrap();

        assert!(arena.get(src).unwrap().children().is_empty());
        assert_eq!(arena.get(dest).unwrap().children(), &[keep, x, y]);
        assert_eq!(arena.get(x).unwrap().geometry, Geometry::new(40, 50, 200, 80));
        assert_eq!(arena.get(y).unwrap().parent(), Some(dest));
    }

    #[test]
    fn test_find_item_by_id_searches_collapsed_folders() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let outer = arena.add_folder(r, "Outer").unwrap();
        let inner = arena.add_folder(outer, "Inner").unwrap();
        let deep = arena.add_toggle(inner, 42, "Deep", false).unwrap();

        assert_eq!(arena.find_item_by_id(r, 42), Some(deep));
        assert_eq!(arena.find_item_by_id(r, 99), None);
    }

    #[test]
    fn test_walk_visible_honours_expanded() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let folder = arena.add_folder(r, "Folder").unwrap();
        arena.add_toggle(folder, 1, "Hidden", false).unwrap();
        let after = arena.add_checkbox(r, 2, "After", false).unwrap();

        assert_eq!(arena.walk_visible(r, |_, _, _, _| {}), 2);
        assert_eq!(arena.get(after).unwrap().render_index(), Some(1));

        arena.get_mut(folder).unwrap().set_value(1);
        let mut indents = Vec::new();
        assert_eq!(arena.walk_visible(r, |_, _, _, indent| indents.push(indent)), 3);
        assert_eq!(indents, [0, 1, 0]);
        assert_eq!(arena.get(after).unwrap().render_index(), Some(2));
    }

    #[test]
    fn test_choice_cycle_skips_disabled() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let mc = arena.add_multiple_choice(r, 1, "SID").unwrap();
        for (i, label) in ["6581", "8580", "8580D", "DTV"].iter().enumerate() {
            arena.add_choice(mc, label, i as i32 * 10).unwrap();
        }
        arena.set_choice_disabled(mc, 1, true).unwrap();

        let item = arena.get_mut(mc).unwrap();
        assert!(item.adjust(true, false));
        assert_eq!(item.value(), 2);
        assert!(item.adjust(false, false));
        assert_eq!(item.value(), 0);
        assert!(item.adjust(false, false));
        assert_eq!(item.value(), 3);
        assert_eq!(item.choice_code(), Some(30));
    }

    #[test]
    fn test_all_choices_disabled_stays_put() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let mc = arena.add_multiple_choice(r, 1, "Only").unwrap();
        arena.add_choice(mc, "A", 0).unwrap();
        arena.add_choice(mc, "B", 1).unwrap();
        arena.set_choice_disabled(mc, 0, true).unwrap();
        arena.set_choice_disabled(mc, 1, true).unwrap();

        let item = arena.get_mut(mc).unwrap();
        item.adjust(true, false);
        assert_eq!(item.value(), 0);
    }

    #[test]
    fn test_choice_limit() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let mc = arena.add_multiple_choice(r, 1, "Many").unwrap();
        for i in 0..MAX_CHOICES {
            arena.add_choice(mc, "x", i as i32).unwrap();
        }
        assert_eq!(arena.add_choice(mc, "y", 99), Err(OsdError::TooManyChoices));
    }

    #[test]
    fn test_range_clamps_and_reports_change() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let range = arena.add_range(r, 1, "Volume", 0, 1000, 100, 950).unwrap();
        let item = arena.get_mut(range).unwrap();

        assert!(item.adjust(true, false));
        assert_eq!(item.value(), 1000);
        assert!(!item.adjust(true, false));
        assert_eq!(item.value(), 1000);
        assert!(item.adjust(false, true));
        assert_eq!(item.value(), 999);
    }

    #[test]
    fn test_range_bounds_checked_on_add() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let range = arena.add_range(r, 1, "Speed", 0, 10, 1, 500).unwrap();
        assert_eq!(arena.get(range).unwrap().value(), 10);
        let range = arena.add_range(r, 2, "Speed", 0, 10, 1, -5).unwrap();
        assert_eq!(arena.get(range).unwrap().value(), 0);

        assert_eq!(arena.add_range(r, 3, "Speed", 10, 0, 1, 5), Err(OsdError::InvalidRange));
        assert_eq!(arena.get(r).unwrap().children().len(), 2);
    }

    #[test]
    fn test_text_field_editing() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let field = arena.add_text_field(r, 1, "Name", "ab").unwrap();
        let item = arena.get_mut(field).unwrap();

        assert_eq!(item.value(), 2);
        item.adjust(false, false);
        assert!(item.type_char('X'));
        assert_eq!(item.str_value(), Some("aXb"));
        assert!(item.type_char('\x08'));
        assert!(item.type_char('\x08'));
        assert_eq!(item.str_value(), Some("b"));
        assert!(!item.type_char('\x08'));

        for _ in 0..MAX_FN_NAME {
            item.type_char('z');
        }
        assert_eq!(item.str_value().unwrap().chars().count(), MAX_FN_NAME);
    }

    #[test]
    fn test_button_display() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let plain = arena.add_button(r, 1, "Plain").unwrap();
        let valued = arena.add_button_with_value(r, 2, "Drive", 8, "8", "").unwrap();
        let shown = arena.add_button_with_value(r, 3, "File", 0, "game.d64", "game.d64").unwrap();
        arena.get_mut(valued).unwrap().map_value = Some(|v| v + 1);

        assert_eq!(arena.get(plain).unwrap().button_display().as_deref(), Some(""));
        assert_eq!(arena.get(valued).unwrap().button_display().as_deref(), Some("9"));
        assert_eq!(arena.get(shown).unwrap().button_display().as_deref(), Some("game.d64"));
    }

    #[test]
    fn test_disabled_items_ignore_actions() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let toggle = arena.add_toggle(r, 1, "Off", false).unwrap();
        let item = arena.get_mut(toggle).unwrap();
        item.disabled = true;

        assert!(!item.adjust(true, false));
        assert!(!item.activate());
        assert_eq!(item.value(), 0);
    }

    #[test]
    fn test_names_are_truncated() {
        let mut arena = MenuArena::new();
        let r = root(&mut arena);
        let long = "x".repeat(MAX_MENU_STR + 10);
        let b = arena.add_button(r, 1, &long).unwrap();
        assert_eq!(arena.get(b).unwrap().name.len(), MAX_MENU_STR);
    }
}

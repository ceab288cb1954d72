//! Navigation context
//!
//! Owns the menu arena and the stack of menu roots (one per pushed screen)
//! together with each root's cursor and scroll window. Every navigation
//! action goes through [`NavigationContext::apply_action`].

use alloc::{rc::Rc, vec::Vec};

use crate::menu::{Geometry, ItemHandle, MenuArena, MenuItem};
use crate::{OsdError, CHAR_SIZE, MENU_HEIGHT_CHARS, MENU_WIDTH_CHARS, NUM_MENU_ROOTS};

/// Called with the context after a root was popped
pub type RootCallback = Rc<dyn Fn(&mut NavigationContext)>;

/// Called with the new cursor row of the root it is attached to
pub type CursorListener = Rc<dyn Fn(&mut NavigationContext, usize)>;

// ============================================================================
// Actions and Sizes
// ============================================================================

/// Navigation actions produced by the input engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    MiniLeft,
    MiniRight,
    Return,
    Escape,
    Exit,
}

/// Requested size of a pushed menu along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuSize {
    /// This many character cells, centred inside the root menu
    Chars(i32),
    /// Default menu size at the root menu's origin
    Default,
    /// Default menu size centred on the screen
    Centered,
}

/// Fallback receiver for value changes of items without their own callback
pub trait MenuHandler {
    fn value_changed(&mut self, nav: &mut NavigationContext, item: ItemHandle);
}

/// Ignores every change
impl MenuHandler for () {
    fn value_changed(&mut self, _nav: &mut NavigationContext, _item: ItemHandle) {}
}

// ============================================================================
// Root State
// ============================================================================

struct MenuRoot {
    handle: ItemHandle,
    cursor: usize,
    window_top: usize,
    window_bottom: usize,
    max_index: usize,
    cursor_item: Option<ItemHandle>,
    on_popped_off: Option<RootCallback>,
    on_popped_to: Option<RootCallback>,
    cursor_listener: Option<CursorListener>,
}

impl MenuRoot {
    fn new(handle: ItemHandle, rows: usize) -> Self {
        Self {
            handle,
            cursor: 0,
            window_top: 0,
            window_bottom: rows,
            max_index: 0,
            cursor_item: None,
            on_popped_off: None,
            on_popped_to: None,
            cursor_listener: None,
        }
    }
}

/// Read-only view of one stacked root, for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootView {
    pub handle: ItemHandle,
    pub cursor: usize,
    pub window_top: usize,
    pub window_bottom: usize,
}

// ============================================================================
// Navigation Context
// ============================================================================

/// Menu stack, cursor state and view flags
pub struct NavigationContext {
    tree: MenuArena,
    roots: Vec<MenuRoot>,
    screen_width: i32,
    screen_height: i32,
    width_chars: i32,
    height_chars: i32,
    enabled: bool,
    osd_active: bool,
    trap_requested: bool,
    transparent: bool,
    render_current_item_only: bool,
}

impl NavigationContext {
    /// Create the context with its permanent root menu centred on a screen
    /// of the given pixel size
    pub fn new(screen_width: i32, screen_height: i32) -> Self {
        Self::with_menu_size(screen_width, screen_height, MENU_WIDTH_CHARS, MENU_HEIGHT_CHARS)
    }

    pub fn with_menu_size(screen_width: i32, screen_height: i32, width_chars: i32, height_chars: i32) -> Self {
        let mut nav = Self {
            tree: MenuArena::new(),
            roots: Vec::with_capacity(NUM_MENU_ROOTS),
            screen_width,
            screen_height,
            width_chars,
            height_chars,
            enabled: false,
            osd_active: false,
            trap_requested: false,
            transparent: false,
            render_current_item_only: false,
        };
        let geometry = nav.centered_geometry();
        let handle = nav.tree.new_root(geometry);
        nav.roots.push(MenuRoot::new(handle, height_chars.max(0) as usize));
        nav
    }

    fn centered_geometry(&self) -> Geometry {
        let width = self.width_chars * CHAR_SIZE;
        let height = self.height_chars * CHAR_SIZE;
        Geometry::new(
            self.screen_width / 2 - width / 2,
            self.screen_height / 2 - height / 2,
            width,
            height,
        )
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn tree(&self) -> &MenuArena {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut MenuArena {
        &mut self.tree
    }

    /// Shortcut for `tree().get(handle)`
    pub fn item(&self, handle: ItemHandle) -> Option<&MenuItem> {
        self.tree.get(handle)
    }

    pub fn item_mut(&mut self, handle: ItemHandle) -> Option<&mut MenuItem> {
        self.tree.get_mut(handle)
    }

    /// Number of stacked roots (at least 1)
    #[inline]
    pub fn depth(&self) -> usize {
        self.roots.len()
    }

    fn top(&self) -> &MenuRoot {
        &self.roots[self.roots.len() - 1]
    }

    fn top_mut(&mut self) -> &mut MenuRoot {
        let last = self.roots.len() - 1;
        &mut self.roots[last]
    }

    pub fn root(&self, depth: usize) -> Option<ItemHandle> {
        self.roots.get(depth).map(|r| r.handle)
    }

    pub fn current_root(&self) -> ItemHandle {
        self.top().handle
    }

    pub fn root_views(&self) -> impl Iterator<Item = RootView> + '_ {
        self.roots.iter().map(|r| RootView {
            handle: r.handle,
            cursor: r.cursor,
            window_top: r.window_top,
            window_bottom: r.window_bottom,
        })
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.top().cursor
    }

    /// Scroll window of the current root as `(top, bottom)` rows
    pub fn window(&self) -> (usize, usize) {
        let root = self.top();
        (root.window_top, root.window_bottom)
    }

    #[inline]
    pub fn max_index(&self) -> usize {
        self.top().max_index
    }

    /// Item under the cursor as of the last traversal
    #[inline]
    pub fn cursor_item(&self) -> Option<ItemHandle> {
        self.top().cursor_item
    }

    pub fn menu_height_chars(&self) -> i32 {
        self.height_chars
    }

    pub fn menu_width_chars(&self) -> i32 {
        self.width_chars
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    /// Is the menu (or an OSD) showing and taking keys?
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn is_osd_active(&self) -> bool {
        self.osd_active
    }

    /// Returns true once after the menu was toggled on
    pub fn take_trap_request(&mut self) -> bool {
        core::mem::take(&mut self.trap_requested)
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Skip menu backgrounds so the display shows through
    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    pub fn render_current_item_only(&self) -> bool {
        self.render_current_item_only
    }

    pub fn set_render_current_item_only(&mut self, only: bool) {
        self.render_current_item_only = only;
    }

    /// Drop the view flags that only apply while on the item that set them
    pub fn reset_view_flags(&mut self) {
        self.transparent = false;
        self.render_current_item_only = false;
    }

    /// Show a menu without pausing emulation
    pub fn enable_osd(&mut self) {
        self.osd_active = true;
        self.enabled = true;
    }

    /// Leave OSD mode; visibility is left to the pop-and-toggle that follows
    pub fn disable_osd(&mut self) {
        self.osd_active = false;
    }

    pub fn dismiss_osd_if_active(&mut self) -> Result<(), OsdError> {
        if self.osd_active {
            self.pop_all_and_toggle()?;
            self.disable_osd();
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------------

    /// Runs after the current root is popped off the stack
    pub fn set_on_popped_off(&mut self, callback: RootCallback) {
        self.top_mut().on_popped_off = Some(callback);
    }

    /// Runs when the current root becomes the top again after a pop
    pub fn set_on_popped_to(&mut self, callback: RootCallback) {
        self.top_mut().on_popped_to = Some(callback);
    }

    pub fn set_cursor_listener(&mut self, listener: CursorListener) {
        self.top_mut().cursor_listener = Some(listener);
    }

    fn cursor_moved(&mut self) {
        let root = self.top();
        if let Some(listener) = root.cursor_listener.clone() {
            let cursor = root.cursor;
            listener(self, cursor);
        }
    }

    fn value_changed(&mut self, item: ItemHandle, handler: &mut dyn MenuHandler) {
        let callback = self.tree.get(item).and_then(|i| i.on_value_changed.clone());
        match callback {
            Some(callback) => callback(self, item),
            None => handler.value_changed(self, item),
        }
    }

    // ------------------------------------------------------------------------
    // Stack
    // ------------------------------------------------------------------------

    /// Push a new, empty root and make it current
    pub fn push_menu(&mut self, width: MenuSize, height: MenuSize) -> Result<ItemHandle, OsdError> {
        if self.roots.len() >= NUM_MENU_ROOTS {
            log::error!("push_menu: {}", OsdError::StackFull);
            return Err(OsdError::StackFull);
        }

        let base = self.tree.get(self.roots[0].handle).map(|r| r.geometry).unwrap_or_default();
        let centered = self.centered_geometry();
        let default_w = self.width_chars * CHAR_SIZE;
        let default_h = self.height_chars * CHAR_SIZE;

        let (left, width) = match width {
            MenuSize::Chars(chars) => {
                let w = chars * CHAR_SIZE;
                (base.left + (base.width - w) / 2, w)
            }
            MenuSize::Default => (base.left, default_w),
            MenuSize::Centered => (centered.left, default_w),
        };
        let (top, height_px, rows) = match height {
            MenuSize::Chars(chars) => {
                let h = chars * CHAR_SIZE;
                (base.top + (base.height - h) / 2, h, chars)
            }
            MenuSize::Default => (base.top, default_h, self.height_chars),
            MenuSize::Centered => (centered.top, default_h, self.height_chars),
        };

        let handle = self.tree.new_root(Geometry::new(left, top, width, height_px));
        self.roots.push(MenuRoot::new(handle, rows.max(0) as usize));
        log::debug!("push_menu: depth {} at {},{} {}x{}", self.roots.len(), left, top, width, height_px);
        Ok(handle)
    }

    /// Pop the current root, freeing its items
    ///
    /// The first root is permanent; popping it is rejected.
    pub fn pop_menu(&mut self) -> Result<(), OsdError> {
        if self.roots.len() <= 1 {
            log::error!("pop_menu: {}", OsdError::PopLastRoot);
            return Err(OsdError::PopLastRoot);
        }
        let Some(popped) = self.roots.pop() else {
            return Err(OsdError::PopLastRoot);
        };
        self.tree.free_subtree(popped.handle);
        log::debug!("pop_menu: depth {}", self.roots.len());

        if let Some(callback) = popped.on_popped_off {
            callback(self);
        }
        if let Some(callback) = self.top().on_popped_to.clone() {
            callback(self);
        }
        Ok(())
    }

    /// Flip menu visibility, requesting a trap when it comes on
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        if self.enabled {
            self.trap_requested = true;
        }
        log::info!("menu {}", if self.enabled { "shown" } else { "hidden" });
    }

    /// Pop everything above the first root, then toggle
    pub fn pop_all_and_toggle(&mut self) -> Result<(), OsdError> {
        while self.roots.len() > 1 {
            self.pop_menu()?;
        }
        self.toggle();
        Ok(())
    }

    /// Recentre the first root for a new screen size
    pub fn geometry_changed(&mut self, screen_width: i32, screen_height: i32) {
        self.screen_width = screen_width;
        self.screen_height = screen_height;
        let geometry = self.centered_geometry();
        let root = self.roots[0].handle;
        self.tree.move_subtree(root, geometry.left, geometry.top);
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// Recompute render indices, the row count and the item under the cursor
    /// for the current root
    ///
    /// When the rows shrank, the cursor is clamped to the last row and the
    /// scroll window pulled back so it still holds the cursor.
    pub fn traverse(&mut self) {
        let root = self.top().handle;
        let cursor = self.top().cursor;
        let mut found = None;
        let rows = self.tree.walk_visible(root, |handle, _, index, _| {
            if index == cursor {
                found = Some(handle);
            }
        });

        let top = self.top_mut();
        top.max_index = rows;
        top.cursor_item = found;
        let last = rows.saturating_sub(1);
        let clamped = top.cursor > last;
        if clamped {
            top.cursor = last;
        }

        let height = top.window_bottom - top.window_top;
        let mut first = top.window_top.min(rows.saturating_sub(height)).min(top.cursor);
        if height > 0 && top.cursor >= first + height {
            first = top.cursor + 1 - height;
        }
        top.window_top = first;
        top.window_bottom = first + height;

        if clamped {
            self.cursor_moved();
            self.traverse();
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    fn move_up(&mut self) {
        let top = self.top_mut();
        top.cursor = top.cursor.saturating_sub(1);
        if top.cursor < top.window_top {
            top.window_top -= 1;
            top.window_bottom -= 1;
        }
        self.cursor_moved();
    }

    fn move_down(&mut self) {
        let top = self.top_mut();
        if top.cursor + 1 < top.max_index {
            top.cursor += 1;
        }
        if top.cursor >= top.window_bottom && top.window_bottom > top.window_top {
            top.window_top += 1;
            top.window_bottom += 1;
        }
        self.cursor_moved();
    }

    /// Apply one navigation action to the current root
    pub fn apply_action(&mut self, action: Action, handler: &mut dyn MenuHandler) -> Result<(), OsdError> {
        self.traverse();
        log::trace!("action {:?} at row {}", action, self.cursor());

        match action {
            Action::Up => self.move_up(),
            Action::Down => self.move_down(),
            Action::Left | Action::Right | Action::MiniLeft | Action::MiniRight => {
                let forward = matches!(action, Action::Right | Action::MiniRight);
                let mini = matches!(action, Action::MiniLeft | Action::MiniRight);
                if let Some(cur) = self.cursor_item() {
                    let changed = self.tree.get_mut(cur).is_some_and(|item| item.adjust(forward, mini));
                    if changed {
                        self.value_changed(cur, handler);
                    }
                }
            }
            Action::Return => {
                if let Some(cur) = self.cursor_item() {
                    let changed = self.tree.get_mut(cur).is_some_and(|item| item.activate());
                    if changed {
                        self.value_changed(cur, handler);
                    }
                }
            }
            Action::Escape => {
                if self.roots.len() > 1 {
                    if self.osd_active {
                        self.pop_all_and_toggle()?;
                    } else {
                        self.pop_menu()?;
                    }
                } else {
                    self.toggle();
                }
            }
            Action::Exit => self.pop_all_and_toggle()?,
        }

        self.traverse();
        Ok(())
    }

    pub fn page_up(&mut self) {
        self.traverse();
        for _ in 0..self.height_chars {
            self.move_up();
        }
        self.traverse();
    }

    pub fn page_down(&mut self) {
        self.traverse();
        for _ in 0..self.height_chars {
            self.move_down();
        }
        self.traverse();
    }

    pub fn to_top(&mut self) {
        while self.cursor() != 0 {
            self.move_up();
        }
        self.traverse();
    }

    pub fn to_bottom(&mut self) {
        self.traverse();
        while self.cursor() + 1 < self.max_index() {
            self.move_down();
        }
        self.traverse();
    }

    /// Move down (wrapping to the top once) to the next row whose name
    /// starts with `letter`, ignoring case
    pub fn find_first(&mut self, letter: char) {
        self.traverse();
        if self.max_index() == 0 {
            return;
        }
        let letter = letter.to_ascii_lowercase();
        let start = self.cursor();

        loop {
            if self.cursor() + 1 >= self.max_index() {
                self.to_top();
            } else {
                self.move_down();
            }
            if self.cursor() == start {
                break;
            }
            self.traverse();

            let matched = self
                .cursor_item()
                .and_then(|h| self.tree.get(h))
                .and_then(|item| item.name.chars().next())
                .is_some_and(|first| first.to_ascii_lowercase() == letter);
            if matched {
                break;
            }
        }
        self.traverse();
    }

    /// Step the cursor down to `pos` (or the last row), typically right
    /// after a push
    pub fn set_cur_pos(&mut self, pos: usize) {
        self.traverse();
        while self.cursor() < pos && self.cursor() + 1 < self.max_index() {
            self.move_down();
            self.traverse();
        }
    }
}

//! UI controller
//!
//! Owns the menu state and drives it from the emulator's two entry points:
//! - `vsync_hook`: called once per emulated frame while the machine runs.
//!   Feeds queued keys and joystick updates to the emulator, advances the
//!   menu toggle countdown, and services any OSD that is up.
//! - `pause_trap`: called by the emulator at a safe point after the menu
//!   asked for it. Spins its own frame loop with emulation stopped until
//!   the menu is hidden again.
//!
//! Queue drains and every use of the key router's locks go through
//! `Platform::critical`, since the keyboard ISR takes the same locks.

use alloc::boxed::Box;

use crate::config::UiSettings;
use crate::dialog::{self, ID_CONFIRM_CANCEL, ID_CONFIRM_OK, ID_ERROR_DIALOG, ID_INFO_DIALOG, SUB_ID_QUICK_FUNC};
use crate::emulator::{EmulatorCore, ResetKind, TapeControl, RES_WARP_MODE};
use crate::events::EventHub;
use crate::hal::{Framebuffer, Platform};
use crate::hotkeys::KeyRouter;
use crate::input::InputEngine;
use crate::menu::ItemHandle;
use crate::nav::{MenuHandler, NavigationContext};
use crate::overlay::{DisplayMode, StatusBar, DEFAULT_STATUS_BAR_WIDTH, STATUS_BAR_HEIGHT};
use crate::quick::{self, QuickFunc};
use crate::render::{menu_color, Font};
use crate::trap::ToggleTick;
use crate::video::VideoState;
use crate::view;
use crate::OsdError;

// ============================================================================
// Built-in Item Dispatch
// ============================================================================

/// Handles the items of the built-in OSD menus and dialogs, passing
/// everything else on to the application's handler
struct Dispatch<'a, E: EmulatorCore> {
    emu: &'a mut E,
    hub: &'a EventHub,
    user: Option<&'a mut dyn MenuHandler>,
}

fn log_err(what: &str, result: Result<(), OsdError>) {
    if let Err(err) = result {
        log::error!("{}: {}", what, err);
    }
}

/// Close a dialog: an OSD takes the whole UI down with it
fn close(nav: &mut NavigationContext) -> Result<(), OsdError> {
    if nav.is_osd_active() {
        nav.dismiss_osd_if_active()
    } else {
        nav.pop_menu()
    }
}

impl<E: EmulatorCore> Dispatch<'_, E> {
    fn tape(&mut self, nav: &mut NavigationContext, command: TapeControl) {
        self.emu.tape_control(command);
        log_err("tape osd", nav.dismiss_osd_if_active());
    }
}

impl<E: EmulatorCore> MenuHandler for Dispatch<'_, E> {
    fn value_changed(&mut self, nav: &mut NavigationContext, item: ItemHandle) {
        let Some((id, value, sub_id)) = nav.item(item).map(|i| (i.id, i.value(), i.sub_id)) else {
            return;
        };

        match id {
            quick::ID_RESET_SOFT | quick::ID_RESET_HARD => {
                let kind = if id == quick::ID_RESET_SOFT { ResetKind::Soft } else { ResetKind::Hard };
                log::info!("reset: {:?}", kind);
                self.emu.reset(kind);
                log_err("reset osd", nav.dismiss_osd_if_active());
            }
            quick::ID_TAPE_STOP => self.tape(nav, TapeControl::Stop),
            quick::ID_TAPE_PLAY => self.tape(nav, TapeControl::Play),
            quick::ID_TAPE_FORWARD => self.tape(nav, TapeControl::Forward),
            quick::ID_TAPE_REWIND => self.tape(nav, TapeControl::Rewind),
            quick::ID_TAPE_RECORD => self.tape(nav, TapeControl::Record),
            quick::ID_TAPE_RESET => self.tape(nav, TapeControl::Reset),
            quick::ID_CART_FREEZE => {
                self.emu.cart_freeze();
                log_err("cart osd", nav.dismiss_osd_if_active());
            }
            quick::ID_CART_DETACH => {
                self.emu.detach_cart();
                log_err("cart osd", nav.dismiss_osd_if_active());
            }
            ID_CONFIRM_OK => {
                log_err("confirm", close(nav));
                if sub_id == SUB_ID_QUICK_FUNC {
                    if let Some(func) = QuickFunc::from_code(value) {
                        self.hub.request_quick_func(func);
                    }
                }
            }
            ID_CONFIRM_CANCEL | ID_ERROR_DIALOG | ID_INFO_DIALOG => log_err("dialog", close(nav)),
            _ => {
                if let Some(user) = self.user.as_deref_mut() {
                    user.value_changed(nav, item);
                }
            }
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct UiController<'a, E: EmulatorCore, F: Framebuffer> {
    hub: &'a EventHub,
    router: &'a KeyRouter,
    emu: E,
    nav: NavigationContext,
    input: InputEngine,
    video: VideoState<F>,
    status: StatusBar,
    settings: UiSettings,
    handler: Option<Box<dyn MenuHandler>>,
}

impl<'a, E: EmulatorCore, F: Framebuffer> UiController<'a, E, F> {
    /// Take over the framebuffer and push `settings` into the key router
    pub fn new<P: Platform>(
        hub: &'a EventHub,
        router: &'a KeyRouter,
        emu: E,
        fb: F,
        settings: UiSettings,
        platform: &P,
    ) -> Self {
        let nav = NavigationContext::new(fb.width(), fb.height());
        platform.critical(|| settings.apply(router));
        let mut controller = Self {
            hub,
            router,
            emu,
            nav,
            input: InputEngine::new(settings.commodore_key, settings.repeat_floor),
            video: VideoState::new(fb),
            status: StatusBar::new(DEFAULT_STATUS_BAR_WIDTH, settings.status_bar),
            settings,
            handler: None,
        };
        controller.sync();
        controller
    }

    pub fn nav(&self) -> &NavigationContext {
        &self.nav
    }

    pub fn nav_mut(&mut self) -> &mut NavigationContext {
        &mut self.nav
    }

    pub fn emulator(&self) -> &E {
        &self.emu
    }

    pub fn emulator_mut(&mut self) -> &mut E {
        &mut self.emu
    }

    /// Status bar, for the emulator's drive/tape/warp notifications
    pub fn status_bar_mut(&mut self) -> &mut StatusBar {
        &mut self.status
    }

    pub fn video(&self) -> &VideoState<F> {
        &self.video
    }

    pub fn settings(&self) -> &UiSettings {
        &self.settings
    }

    /// Replace the settings and push them everywhere they apply
    pub fn apply_settings<P: Platform>(&mut self, settings: UiSettings, platform: &P) {
        let router = self.router;
        platform.critical(|| settings.apply(router));
        self.input.set_commodore_key(settings.commodore_key);
        self.input.set_repeat_floor(settings.repeat_floor);
        if settings.status_bar != self.status.mode() {
            self.status.set_mode(settings.status_bar);
        }
        self.settings = settings;
    }

    /// Receiver for value changes of the application's own menu items
    pub fn set_handler(&mut self, handler: Box<dyn MenuHandler>) {
        self.handler = Some(handler);
    }

    /// Draw menus and status bar with the machine's character ROM
    pub fn set_char_rom(&mut self, rom: &'static [u8]) {
        self.video.set_font(Font::from_char_rom(rom));
        self.status.set_font(Font::from_char_rom(rom));
    }

    /// True once after Commodore+F7 was held for the safe video mode
    pub fn take_safe_video_request(&self) -> bool {
        self.router.take_safe_video_request()
    }

    fn dispatch(&mut self) -> (&mut NavigationContext, &mut InputEngine, Dispatch<'_, E>) {
        let dispatch = Dispatch {
            emu: &mut self.emu,
            hub: self.hub,
            user: self.handler.as_deref_mut().map(|h| h as &mut dyn MenuHandler),
        };
        (&mut self.nav, &mut self.input, dispatch)
    }

    /// Publish menu visibility to the ISRs and pass on any trap request
    fn sync(&mut self) {
        self.hub.set_ui_enabled(self.nav.is_enabled());
        if self.nav.take_trap_request() {
            log::debug!("ui: scheduling pause trap");
            self.emu.schedule_trap();
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Feed queued menu keys through the input engine, then run key repeat
    pub fn check_key<P: Platform>(&mut self, platform: &P) {
        if !self.nav.is_enabled() {
            return;
        }
        let hub = self.hub;
        let events = platform.critical(|| hub.ui_keys.drain());
        events.log_dropped("ui key");

        let (nav, input, mut dispatch) = self.dispatch();
        for event in events {
            if let Err(err) = input.handle(event, nav, &mut dispatch) {
                log::error!("ui: {:?}: {}", event.key, err);
            }
        }
        if let Err(err) = input.tick(nav, &mut dispatch) {
            log::error!("ui: key repeat: {}", err);
        }
        self.sync();
    }

    /// Advance the toggle countdown, or run a pending quick function
    pub fn handle_toggle_or_quick_func<P: Platform>(&mut self, platform: &P) {
        match self.hub.tick_toggle() {
            ToggleTick::Fired => {
                log_err("ui: toggle", self.nav.pop_all_and_toggle());
            }
            ToggleTick::Counting => {}
            ToggleTick::Idle => {
                if let Some(func) = self.hub.take_quick_func() {
                    self.run_quick_func(func, platform);
                }
            }
        }
        self.sync();
    }

    pub fn run_quick_func<P: Platform>(&mut self, func: QuickFunc, platform: &P) {
        log::info!("ui: quick function {}", func.name());
        let now = platform.ticks();
        match func {
            QuickFunc::Menu => self.hub.request_toggle(),
            QuickFunc::Warp => {
                let warp = dialog::report(&mut self.nav, self.emu.get_int(RES_WARP_MODE));
                if let Some(warp) = warp {
                    let warp = warp == 0;
                    if dialog::report(&mut self.nav, self.emu.set_int(RES_WARP_MODE, warp as i32)).is_some() {
                        self.status.warp_changed(warp, now);
                    }
                }
            }
            QuickFunc::SwapPorts => {
                let router = self.router;
                let (slots, swapped) = platform.critical(|| {
                    let mut ports = router.ports();
                    let swapped = ports.swap_ports();
                    (*ports.slots(), swapped)
                });
                log::info!("ui: joystick ports swapped: {}", swapped);
                for slot in slots {
                    self.emu.set_joy_port_device(slot.port, slot.device);
                }
                self.status.joyswap_changed(swapped, now);
            }
            QuickFunc::StatusToggle => {
                if self.status.mode() != DisplayMode::Always {
                    self.status.toggle_forced();
                }
            }
            QuickFunc::CartFreeze => self.emu.cart_freeze(),
            QuickFunc::CartMenu => log_err("ui: cart menu", quick::show_cart_menu(&mut self.nav).map(drop)),
            QuickFunc::ResetMenu => log_err("ui: reset menu", quick::show_reset_menu(&mut self.nav).map(drop)),
            QuickFunc::TapeMenu => log_err("ui: tape menu", quick::show_tape_menu(&mut self.nav).map(drop)),
            QuickFunc::ResetSoft | QuickFunc::ResetHard => {
                let (kind, confirmed) = if func == QuickFunc::ResetSoft {
                    (ResetKind::Soft, QuickFunc::ResetSoftConfirmed)
                } else {
                    (ResetKind::Hard, QuickFunc::ResetHardConfirmed)
                };
                if self.settings.reset_confirm {
                    log_err("ui: confirm", dialog::confirm_quick_func(&mut self.nav, confirmed).map(drop));
                } else {
                    self.emu.reset(kind);
                }
            }
            QuickFunc::ResetSoftConfirmed => self.emu.reset(ResetKind::Soft),
            QuickFunc::ResetHardConfirmed => self.emu.reset(ResetKind::Hard),
        }
    }

    // ------------------------------------------------------------------------
    // Video
    // ------------------------------------------------------------------------

    /// Draw the menus into the offscreen half, show it, then lay the
    /// status bar over the bottom of the screen
    pub fn render_single_frame(&mut self) {
        {
            let (mut surface, font) = self.video.offscreen_surface();
            if self.nav.is_enabled() {
                view::render(&mut self.nav, &mut surface, font);
            } else {
                surface.fill(menu_color::TRANSPARENT);
            }
        }
        self.video.swap();

        if self.status.is_showing() {
            let width = self.video.framebuffer().width();
            let height = self.video.framebuffer().height();
            let x = (width - self.status.width()) / 2;
            let bar = self.status.surface();
            self.video.composite_overlay(&bar, x, height - STATUS_BAR_HEIGHT);
        }
    }

    // ------------------------------------------------------------------------
    // Main Loop Hooks
    // ------------------------------------------------------------------------

    /// Menu loop with the emulator stopped; returns once the menu is hidden
    pub fn pause_trap<P: Platform>(&mut self, platform: &P) {
        log::info!("ui: paused");
        self.sync();
        while self.nav.is_enabled() {
            platform.poll_input();
            self.check_key(platform);
            self.handle_toggle_or_quick_func(platform);
            self.status.check(platform.ticks());
            self.render_single_frame();
            platform.wait_vsync();
            platform.yield_now();
        }
        self.sync();
        log::info!("ui: resumed");
    }

    /// Per-frame work while the emulator runs
    pub fn vsync_hook<P: Platform>(&mut self, platform: &P) {
        let hub = self.hub;

        let keys = platform.critical(|| hub.emu_keys.drain());
        keys.log_dropped("emulator key");
        for event in keys {
            if event.pressed {
                self.emu.key_pressed(event.key);
            } else {
                self.emu.key_released(event.key);
            }
        }
        let joy = platform.critical(|| hub.joy.drain());
        joy.log_dropped("joystick");
        for event in joy {
            self.emu.apply_joy_event(&event);
        }

        self.handle_toggle_or_quick_func(platform);
        self.status.check(platform.ticks());

        if self.nav.is_osd_active() {
            self.check_key(platform);
            self.render_single_frame();
        } else if self.status.take_dirty() {
            self.render_single_frame();
        }
    }
}

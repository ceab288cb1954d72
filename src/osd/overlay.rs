//! Status Bar Overlay
//!
//! A strip of drive LEDs, tape counter and transport state, warp and joystick
//! swap indicators. It keeps its own indexed buffer (palette
//! [`overlay_color`]) which the video compositor blits onto each displayed
//! frame, skipping transparent pixels.
//!
//! Every status change restarts the activity timer; depending on the
//! [`DisplayMode`] the bar shows up and is dismissed again by [`StatusBar::check`].

use alloc::{string::String, vec, vec::Vec};
use core::fmt::Write;

use bitflags::bitflags;

use crate::emulator::TapeControl;
use crate::render::{draw_text, overlay_color, text_width, Font, Surface};
use crate::CHAR_SIZE;

// ============================================================================
// Layout
// ============================================================================

pub const STATUS_TEMPLATE: &str = "8:  9:  10:  11:  T:    STP   W:  J:  ";

/// Glyph row plus a pixel of padding above and below
pub const STATUS_BAR_HEIGHT: i32 = CHAR_SIZE + 2;

pub const DEFAULT_STATUS_BAR_WIDTH: i32 = 384;

pub const NUM_DRIVES: usize = 4;

/// How long activity keeps the bar up (µs)
pub const ACTIVITY_TIMEOUT_US: u64 = 5_000_000;

// Field columns, relative to the start of the template
const DRIVE_COL: [i32; NUM_DRIVES] = [2, 6, 11, 16];
const TAPE_COL: i32 = 20;
const TAPE_CONTROL_COL: i32 = 24;
const TAPE_MOTOR_COL: i32 = 28;
const WARP_COL: i32 = 32;
const JOYSWAP_COL: i32 = 36;

const LED_WIDTH: i32 = 6;
const LED_HEIGHT: i32 = 4;

bitflags! {
    /// Drives whose LEDs are shown (units 8 to 11)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DriveMask: u8 {
        const DRIVE_8 = 1 << 0;
        const DRIVE_9 = 1 << 1;
        const DRIVE_10 = 1 << 2;
        const DRIVE_11 = 1 << 3;
    }
}

/// When the status bar is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    Never,
    Always,
    #[default]
    OnActivity,
}

impl DisplayMode {
    pub fn name(self) -> &'static str {
        match self {
            DisplayMode::Never => "never",
            DisplayMode::Always => "always",
            DisplayMode::OnActivity => "activity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "never" => Some(DisplayMode::Never),
            "always" => Some(DisplayMode::Always),
            "activity" => Some(DisplayMode::OnActivity),
            _ => None,
        }
    }
}

/// Drive LED colour for a PWM duty (0..1000)
pub fn led_color(pwm: u32, green: bool) -> u8 {
    match (pwm, green) {
        (0..=332, _) => overlay_color::BLACK,
        (333..=665, true) => overlay_color::GREEN,
        (333..=665, false) => overlay_color::RED,
        (_, true) => overlay_color::LIGHT_GREEN,
        (_, false) => overlay_color::LIGHT_RED,
    }
}

// ============================================================================
// Status Bar
// ============================================================================

pub struct StatusBar {
    buf: Vec<u8>,
    width: i32,
    inset_x: i32,
    inset_y: i32,
    font: Font<'static>,

    mode: DisplayMode,
    showing: bool,
    forced: bool,
    activity_start: u64,
    dirty: bool,

    drives: DriveMask,
    led_green: [bool; NUM_DRIVES],
    pwm: [u32; NUM_DRIVES],
    tape_counter: i32,
    tape_control: TapeControl,
    tape_motor: bool,
    warp: bool,
    swapped: bool,
}

impl StatusBar {
    /// Transparent bar of the given pixel width
    pub fn new(width: i32, mode: DisplayMode) -> Self {
        let width = width.max(0);
        let mut bar = Self {
            buf: vec![overlay_color::TRANSPARENT; (width * STATUS_BAR_HEIGHT) as usize],
            width,
            inset_x: width / 2 - text_width(STATUS_TEMPLATE) / 2,
            inset_y: 1,
            font: Font::builtin(),
            mode,
            showing: false,
            forced: false,
            activity_start: 0,
            dirty: true,
            drives: DriveMask::empty(),
            led_green: [false; NUM_DRIVES],
            pwm: [0; NUM_DRIVES],
            tape_counter: 0,
            tape_control: TapeControl::Stop,
            tape_motor: false,
            warp: false,
            swapped: false,
        };
        if mode == DisplayMode::Always {
            bar.enable();
        }
        bar
    }

    pub fn set_font(&mut self, font: Font<'static>) {
        self.font = font;
        if self.showing {
            self.draw_all();
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        match mode {
            DisplayMode::Always => self.enable(),
            DisplayMode::Never if !self.forced => self.disable(),
            _ => {}
        }
    }

    pub fn is_showing(&self) -> bool {
        self.showing
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// True once since the buffer last changed
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// The bar's pixels, for compositing
    pub fn surface(&mut self) -> Surface<'_> {
        Surface::new(&mut self.buf, self.width as usize, self.width, STATUS_BAR_HEIGHT)
    }

    pub fn enable(&mut self) {
        self.showing = true;
        self.draw_all();
    }

    pub fn disable(&mut self) {
        self.showing = false;
        self.surface().fill(overlay_color::TRANSPARENT);
        self.dirty = true;
    }

    /// Status toggle hotkey: dismiss the bar if it is up, otherwise force
    /// it up until the next toggle
    pub fn toggle_forced(&mut self) {
        if self.mode == DisplayMode::Always {
            return;
        }
        if self.showing || self.forced {
            self.forced = false;
            self.dismiss();
        } else {
            self.forced = true;
            self.enable();
        }
        log::info!("status bar {}", if self.forced { "forced on" } else { "dismissed" });
    }

    /// Hide the bar once the activity timer has run out
    pub fn check(&mut self, now: u64) {
        if self.showing && now.wrapping_sub(self.activity_start) >= ACTIVITY_TIMEOUT_US {
            self.dismiss();
        }
    }

    pub fn dismiss(&mut self) {
        if self.mode != DisplayMode::Always && !self.forced {
            self.disable();
        }
    }

    fn activity(&mut self, now: u64) {
        self.activity_start = now;
        if self.mode != DisplayMode::Never && !self.showing {
            self.enable();
        }
    }

    // ------------------------------------------------------------------------
    // Status events
    // ------------------------------------------------------------------------

    /// Which drives are present, and which of them have green LEDs
    pub fn drive_status(&mut self, drives: DriveMask, green: [bool; NUM_DRIVES], now: u64) {
        self.drives = drives;
        self.led_green = green;
        self.activity(now);
        if self.showing {
            self.draw_drive_status();
        }
    }

    pub fn drive_led(&mut self, drive: usize, pwm: u32, now: u64) {
        let Some(slot) = self.pwm.get_mut(drive) else { return };
        *slot = pwm;
        self.activity(now);
        if self.showing {
            self.draw_drive_led(drive);
        }
    }

    pub fn tape_counter(&mut self, counter: i32, now: u64) {
        if counter == self.tape_counter {
            return;
        }
        self.tape_counter = counter;
        self.activity(now);
        if self.showing {
            self.draw_tape_counter();
        }
    }

    pub fn tape_control(&mut self, control: TapeControl, now: u64) {
        self.tape_control = control;
        self.activity(now);
        if self.showing {
            self.draw_tape_control();
        }
    }

    pub fn tape_motor(&mut self, on: bool, now: u64) {
        self.tape_motor = on;
        self.activity(now);
        if self.showing {
            self.draw_tape_motor();
        }
    }

    pub fn warp_changed(&mut self, warp: bool, now: u64) {
        self.warp = warp;
        self.activity(now);
        if self.showing {
            self.draw_warp();
        }
    }

    pub fn joyswap_changed(&mut self, swapped: bool, now: u64) {
        self.swapped = swapped;
        self.activity(now);
        if self.showing {
            self.draw_joyswap();
        }
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    fn field_x(&self, col: i32) -> i32 {
        self.inset_x + col * CHAR_SIZE
    }

    fn text(&mut self, text: &str, col: i32, width_chars: i32, color: u8) {
        let x = self.field_x(col);
        let y = self.inset_y;
        let font = self.font.clone();
        let mut surface = self.surface();
        surface.draw_rect(x, y, width_chars * CHAR_SIZE, CHAR_SIZE, overlay_color::BG, true);
        draw_text(&mut surface, &font, text, x, y, color, 1);
        self.dirty = true;
    }

    fn led(&mut self, col: i32, color: u8) {
        let x = self.field_x(col);
        let y = self.inset_y + 2;
        self.surface().draw_rect(x, y, LED_WIDTH, LED_HEIGHT, color, true);
        self.dirty = true;
    }

    fn draw_all(&mut self) {
        let font = self.font.clone();
        let (x, y) = (self.inset_x, self.inset_y);
        let mut surface = self.surface();
        surface.fill(overlay_color::BG);
        draw_text(&mut surface, &font, STATUS_TEMPLATE, x, y, overlay_color::FG, 1);

        self.draw_drive_status();
        for drive in 0..NUM_DRIVES {
            self.draw_drive_led(drive);
        }
        self.draw_tape_counter();
        self.draw_tape_control();
        self.draw_tape_motor();
        self.draw_warp();
        self.draw_joyswap();
        self.dirty = true;
    }

    fn drive_bit(drive: usize) -> DriveMask {
        DriveMask::from_bits_truncate(1 << drive)
    }

    fn draw_drive_status(&mut self) {
        for drive in 0..NUM_DRIVES {
            let color = if self.drives.contains(Self::drive_bit(drive)) {
                overlay_color::BLACK
            } else {
                overlay_color::BG
            };
            self.led(DRIVE_COL[drive], color);
        }
    }

    fn draw_drive_led(&mut self, drive: usize) {
        if !self.drives.contains(Self::drive_bit(drive)) {
            return;
        }
        let color = led_color(self.pwm[drive], self.led_green[drive]);
        self.led(DRIVE_COL[drive], color);
    }

    fn draw_tape_counter(&mut self) {
        let mut text = String::with_capacity(3);
        let _ = write!(text, "{:03}", self.tape_counter.rem_euclid(1000));
        self.text(&text, TAPE_COL, 3, overlay_color::FG);
    }

    fn draw_tape_control(&mut self) {
        let (text, color) = match self.tape_control {
            TapeControl::Stop => ("STP", overlay_color::FG),
            TapeControl::Play => ("PLY", overlay_color::GREEN),
            TapeControl::Forward => ("FWD", overlay_color::FG),
            TapeControl::Rewind => ("REW", overlay_color::FG),
            TapeControl::Record => ("REC", overlay_color::RED),
            TapeControl::Reset => ("", overlay_color::FG),
        };
        self.text(text, TAPE_CONTROL_COL, 3, color);
    }

    fn draw_tape_motor(&mut self) {
        let color = if self.tape_motor { overlay_color::RED } else { overlay_color::BG };
        self.led(TAPE_MOTOR_COL, color);
    }

    fn draw_warp(&mut self) {
        self.text(if self.warp { "!" } else { "-" }, WARP_COL, 1, overlay_color::FG);
    }

    fn draw_joyswap(&mut self) {
        self.text(if self.swapped { "21" } else { "12" }, JOYSWAP_COL, 2, overlay_color::FG);
    }
}

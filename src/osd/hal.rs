//! Hardware Abstraction
//!
//! The menu engine never touches hardware directly. A board support crate
//! implements these traits:
//! - `Platform`: system timer, vsync wait, input polling, interrupt masking
//! - `Framebuffer`: an 8-bit indexed surface twice the physical height, so
//!   one half can be drawn while the other is scanned out

use alloc::{vec, vec::Vec};

/// Board services used by the UI loop
pub trait Platform {
    /// Free-running system timer in microseconds
    fn ticks(&self) -> u64;

    /// Block until the next vertical blank
    fn wait_vsync(&self);

    /// Give other work (USB, audio) a chance to run
    fn yield_now(&self) {}

    /// Service input devices so their interrupt paths can enqueue events
    fn poll_input(&self) {}

    /// Run `f` with interrupts masked
    ///
    /// Single-core boards must wrap queue draining in this, since the
    /// keyboard ISR shares the queue locks with the main loop.
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

/// Double-height indexed framebuffer
pub trait Framebuffer {
    /// Physical width in pixels
    fn width(&self) -> i32;

    /// Physical (visible) height in pixels; the buffer holds twice this
    fn height(&self) -> i32;

    /// Bytes per row
    fn pitch(&self) -> usize;

    /// The whole virtual surface, `pitch * height * 2` bytes
    fn pixels_mut(&mut self) -> &mut [u8];

    /// Start scan-out at row `y` of the virtual surface
    fn set_scanout_offset(&mut self, y: i32);

    /// Load palette entries starting at index 0
    fn set_palette(&mut self, colors: &[u32]);
}

/// Convert RGB to 32-bit ARGB
pub const fn rgb_to_argb(r: u8, g: u8, b: u8) -> u32 {
    0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

// ============================================================================
// In-memory Framebuffer
// ============================================================================

/// Framebuffer backed by a heap buffer
///
/// Used by tests and by hosts that present the surface themselves.
pub struct MemoryFramebuffer {
    width: i32,
    height: i32,
    pitch: usize,
    pixels: Vec<u8>,
    scanout: i32,
    palette: Vec<u32>,
}

impl MemoryFramebuffer {
    pub fn new(width: i32, height: i32) -> Self {
        let pitch = width.max(0) as usize;
        let rows = height.max(0) as usize * 2;
        Self {
            width,
            height,
            pitch,
            pixels: vec![0; pitch * rows],
            scanout: 0,
            palette: Vec::new(),
        }
    }

    /// Row currently being scanned out first
    pub fn scanout_offset(&self) -> i32 {
        self.scanout
    }

    pub fn palette(&self) -> &[u32] {
        &self.palette
    }

    /// The visible half as it would appear on screen
    pub fn visible(&self) -> &[u8] {
        let start = self.scanout.max(0) as usize * self.pitch;
        let len = self.height.max(0) as usize * self.pitch;
        self.pixels.get(start..start + len).unwrap_or(&[])
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height * 2 {
            return None;
        }
        self.pixels.get(y as usize * self.pitch + x as usize).copied()
    }
}

impl Framebuffer for MemoryFramebuffer {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn pitch(&self) -> usize {
        self.pitch
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn set_scanout_offset(&mut self, y: i32) {
        self.scanout = y;
    }

    fn set_palette(&mut self, colors: &[u32]) {
        self.palette.clear();
        self.palette.extend_from_slice(colors);
    }
}

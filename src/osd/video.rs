//! Double-buffered video compositor
//!
//! The framebuffer is twice the physical height. Frames are drawn into the
//! offscreen half, then `swap` points scan-out at it and the halves trade
//! roles. The status bar is blitted onto the onscreen half after the swap.

use crate::hal::Framebuffer;
use crate::render::{overlay_color, Font, Surface, MENU_PALETTE, OVERLAY_PALETTE};

/// Overlay palette indices are shifted by this much in the framebuffer
pub const OVERLAY_PALETTE_BASE: u8 = 32;

/// Framebuffer palette: menu entries first, then the status bar's
pub fn combined_palette() -> [u32; OVERLAY_PALETTE_BASE as usize + 8] {
    let mut palette = [0u32; OVERLAY_PALETTE_BASE as usize + 8];
    palette[..MENU_PALETTE.len()].copy_from_slice(&MENU_PALETTE);
    palette[OVERLAY_PALETTE_BASE as usize..].copy_from_slice(&OVERLAY_PALETTE);
    palette
}

pub struct VideoState<F: Framebuffer> {
    fb: F,
    font: Font<'static>,
    offscreen_y: i32,
    onscreen_y: i32,
    swaps: u64,
}

impl<F: Framebuffer> VideoState<F> {
    /// Take over `fb`, loading the palette and showing the top half
    pub fn new(mut fb: F) -> Self {
        fb.set_palette(&combined_palette());
        fb.set_scanout_offset(0);
        let height = fb.height();
        log::info!("video: {}x{} pitch {}", fb.width(), height, fb.pitch());
        Self {
            fb,
            font: Font::builtin(),
            offscreen_y: height,
            onscreen_y: 0,
            swaps: 0,
        }
    }

    pub fn framebuffer(&self) -> &F {
        &self.fb
    }

    pub fn framebuffer_mut(&mut self) -> &mut F {
        &mut self.fb
    }

    pub fn font(&self) -> &Font<'static> {
        &self.font
    }

    /// Switch to a character ROM font
    pub fn set_font(&mut self, font: Font<'static>) {
        self.font = font;
    }

    /// (offscreen, onscreen) Y offsets into the virtual surface
    pub fn offsets(&self) -> (i32, i32) {
        (self.offscreen_y, self.onscreen_y)
    }

    pub fn swap_count(&self) -> u64 {
        self.swaps
    }

    fn half(&mut self, y: i32) -> (Surface<'_>, &Font<'static>) {
        let width = self.fb.width();
        let height = self.fb.height();
        let pitch = self.fb.pitch();
        let start = (y.max(0) as usize * pitch).min(self.fb.pixels_mut().len());
        let end = (start + height.max(0) as usize * pitch).min(self.fb.pixels_mut().len());
        let buf = &mut self.fb.pixels_mut()[start..end];
        (Surface::new(buf, pitch, width, height), &self.font)
    }

    /// Surface for drawing the next frame, plus the current font
    pub fn offscreen_surface(&mut self) -> (Surface<'_>, &Font<'static>) {
        self.half(self.offscreen_y)
    }

    pub fn onscreen_surface(&mut self) -> (Surface<'_>, &Font<'static>) {
        self.half(self.onscreen_y)
    }

    /// Show the half just drawn
    pub fn swap(&mut self) {
        self.fb.set_scanout_offset(self.offscreen_y);
        core::mem::swap(&mut self.offscreen_y, &mut self.onscreen_y);
        self.swaps += 1;
        log::trace!("video: swap {} scanout {}", self.swaps, self.onscreen_y);
    }

    /// Blit a status bar buffer onto the visible half at (x, y)
    ///
    /// Transparent overlay pixels leave the frame underneath untouched.
    pub fn composite_overlay(&mut self, overlay: &Surface, x: i32, y: i32) {
        let (mut screen, _) = self.onscreen_surface();
        for oy in 0..overlay.height() {
            let Some(row) = overlay.row(oy) else { continue };
            for (ox, &color) in row.iter().enumerate() {
                if color != overlay_color::TRANSPARENT {
                    screen.put_pixel(x + ox as i32, y + oy, color + OVERLAY_PALETTE_BASE);
                }
            }
        }
    }
}

//! Software rendering into 8-bit indexed surfaces
//!
//! The menu and the status bar are drawn with palette indices into plain
//! byte buffers. Everything here clips against the destination surface, so
//! callers may draw partly (or entirely) off-screen.

// ============================================================================
// Palettes
// ============================================================================

/// Menu layer palette indices
pub mod menu_color {
    pub const BG: u8 = 0;
    pub const FG: u8 = 1;
    pub const HILITE: u8 = 2;
    pub const BORDER: u8 = 3;
    pub const DISABLED: u8 = 11;
    /// Never written to the display; lets the layer below show through
    pub const TRANSPARENT: u8 = 16;
}

/// Menu layer palette (ARGB), indexed by [`menu_color`]
pub static MENU_PALETTE: [u32; 17] = [
    0xFF6C5EB5, // bg
    0xFFFFFFFF, // fg
    0xFF352879, // hilite
    0xFFFFFFFF, // border
    0xFF000000, 0xFF000000, 0xFF000000, 0xFF000000,
    0xFF000000, 0xFF000000, 0xFF000000,
    0xFF959595, // disabled
    0xFF000000, 0xFF000000, 0xFF000000, 0xFF000000,
    0x00000000, // transparent
];

/// Status bar palette indices
pub mod overlay_color {
    pub const BG: u8 = 0;
    pub const FG: u8 = 1;
    pub const BLACK: u8 = 2;
    pub const RED: u8 = 3;
    pub const GREEN: u8 = 4;
    pub const LIGHT_RED: u8 = 5;
    pub const LIGHT_GREEN: u8 = 6;
    pub const TRANSPARENT: u8 = 7;
}

/// Status bar palette (ARGB), indexed by [`overlay_color`]
pub static OVERLAY_PALETTE: [u32; 8] = [
    0xFF6C5EB5, 0xFFFFFFFF, 0xFF000000, 0xFF68372B, 0xFF588D43, 0xFF9A6759, 0xFF9AD284, 0x00000000,
];

// ============================================================================
// 8x8 Bitmap Font
// ============================================================================

/// 8x8 bitmap font for ASCII characters 32-126 (95 characters)
/// Each character is 8 bytes, one byte per row, MSB is leftmost pixel
static FONT_8X8: [u8; 95 * 8] = [
    // Space (32)
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // ! (33)
    0x18, 0x18, 0x18, 0x18, 0x18, 0x00, 0x18, 0x00,
    // " (34)
    0x6C, 0x6C, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00,
    // # (35)
    0x6C, 0x6C, 0xFE, 0x6C, 0xFE, 0x6C, 0x6C, 0x00,
    // $ (36)
    0x18, 0x7E, 0xC0, 0x7C, 0x06, 0xFC, 0x18, 0x00,
    // % (37)
    0x00, 0xC6, 0xCC, 0x18, 0x30, 0x66, 0xC6, 0x00,
    // & (38)
    0x38, 0x6C, 0x38, 0x76, 0xDC, 0xCC, 0x76, 0x00,
    // ' (39)
    0x18, 0x18, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00,
    // ( (40)
    0x0C, 0x18, 0x30, 0x30, 0x30, 0x18, 0x0C, 0x00,
    // ) (41)
    0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x18, 0x30, 0x00,
    // * (42)
    0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00,
    // + (43)
    0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00,
    // , (44)
    0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x30,
    // - (45)
    0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00,
    // . (46)
    0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00,
    // / (47)
    0x06, 0x0C, 0x18, 0x30, 0x60, 0xC0, 0x80, 0x00,
    // 0 (48)
    0x7C, 0xCE, 0xDE, 0xF6, 0xE6, 0xC6, 0x7C, 0x00,
    // 1 (49)
    0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00,
    // 2 (50)
    0x7C, 0xC6, 0x06, 0x7C, 0xC0, 0xC0, 0xFE, 0x00,
    // 3 (51)
    0xFC, 0x06, 0x06, 0x3C, 0x06, 0x06, 0xFC, 0x00,
    // 4 (52)
    0x0C, 0xCC, 0xCC, 0xCC, 0xFE, 0x0C, 0x0C, 0x00,
    // 5 (53)
    0xFE, 0xC0, 0xFC, 0x06, 0x06, 0xC6, 0x7C, 0x00,
    // 6 (54)
    0x7C, 0xC0, 0xC0, 0xFC, 0xC6, 0xC6, 0x7C, 0x00,
    // 7 (55)
    0xFE, 0x06, 0x06, 0x0C, 0x18, 0x18, 0x18, 0x00,
    // 8 (56)
    0x7C, 0xC6, 0xC6, 0x7C, 0xC6, 0xC6, 0x7C, 0x00,
    // 9 (57)
    0x7C, 0xC6, 0xC6, 0x7E, 0x06, 0x06, 0x7C, 0x00,
    // : (58)
    0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00,
    // ; (59)
    0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x30,
    // < (60)
    0x0C, 0x18, 0x30, 0x60, 0x30, 0x18, 0x0C, 0x00,
    // = (61)
    0x00, 0x00, 0x7E, 0x00, 0x7E, 0x00, 0x00, 0x00,
    // > (62)
    0x30, 0x18, 0x0C, 0x06, 0x0C, 0x18, 0x30, 0x00,
    // ? (63)
    0x3C, 0x66, 0x0C, 0x18, 0x18, 0x00, 0x18, 0x00,
    // @ (64)
    0x7C, 0xC6, 0xDE, 0xDE, 0xDE, 0xC0, 0x7E, 0x00,
    // A (65)
    0x38, 0x6C, 0xC6, 0xC6, 0xFE, 0xC6, 0xC6, 0x00,
    // B (66)
    0xFC, 0xC6, 0xC6, 0xFC, 0xC6, 0xC6, 0xFC, 0x00,
    // C (67)
    0x7C, 0xC6, 0xC0, 0xC0, 0xC0, 0xC6, 0x7C, 0x00,
    // D (68)
    0xF8, 0xCC, 0xC6, 0xC6, 0xC6, 0xCC, 0xF8, 0x00,
    // E (69)
    0xFE, 0xC0, 0xC0, 0xF8, 0xC0, 0xC0, 0xFE, 0x00,
    // F (70)
    0xFE, 0xC0, 0xC0, 0xF8, 0xC0, 0xC0, 0xC0, 0x00,
    // G (71)
    0x7C, 0xC6, 0xC0, 0xCE, 0xC6, 0xC6, 0x7C, 0x00,
    // H (72)
    0xC6, 0xC6, 0xC6, 0xFE, 0xC6, 0xC6, 0xC6, 0x00,
    // I (73)
    0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00,
    // J (74)
    0x06, 0x06, 0x06, 0x06, 0xC6, 0xC6, 0x7C, 0x00,
    // K (75)
    0xC6, 0xCC, 0xD8, 0xF0, 0xD8, 0xCC, 0xC6, 0x00,
    // L (76)
    0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xFE, 0x00,
    // M (77)
    0xC6, 0xEE, 0xFE, 0xD6, 0xC6, 0xC6, 0xC6, 0x00,
    // N (78)
    0xC6, 0xE6, 0xF6, 0xDE, 0xCE, 0xC6, 0xC6, 0x00,
    // O (79)
    0x7C, 0xC6, 0xC6, 0xC6, 0xC6, 0xC6, 0x7C, 0x00,
    // P (80)
    0xFC, 0xC6, 0xC6, 0xFC, 0xC0, 0xC0, 0xC0, 0x00,
    // Q (81)
    0x7C, 0xC6, 0xC6, 0xC6, 0xD6, 0xDE, 0x7C, 0x06,
    // R (82)
    0xFC, 0xC6, 0xC6, 0xFC, 0xD8, 0xCC, 0xC6, 0x00,
    // S (83)
    0x7C, 0xC6, 0xC0, 0x7C, 0x06, 0xC6, 0x7C, 0x00,
    // T (84)
    0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00,
    // U (85)
    0xC6, 0xC6, 0xC6, 0xC6, 0xC6, 0xC6, 0x7C, 0x00,
    // V (86)
    0xC6, 0xC6, 0xC6, 0xC6, 0x6C, 0x38, 0x10, 0x00,
    // W (87)
    0xC6, 0xC6, 0xC6, 0xD6, 0xFE, 0xEE, 0xC6, 0x00,
    // X (88)
    0xC6, 0xC6, 0x6C, 0x38, 0x6C, 0xC6, 0xC6, 0x00,
    // Y (89)
    0x66, 0x66, 0x66, 0x3C, 0x18, 0x18, 0x18, 0x00,
    // Z (90)
    0xFE, 0x06, 0x0C, 0x18, 0x30, 0x60, 0xFE, 0x00,
    // [ (91)
    0x3C, 0x30, 0x30, 0x30, 0x30, 0x30, 0x3C, 0x00,
    // \ (92)
    0xC0, 0x60, 0x30, 0x18, 0x0C, 0x06, 0x02, 0x00,
    // ] (93)
    0x3C, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x3C, 0x00,
    // ^ (94)
    0x10, 0x38, 0x6C, 0xC6, 0x00, 0x00, 0x00, 0x00,
    // _ (95)
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFE,
    // ` (96)
    0x18, 0x18, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00,
    // a (97)
    0x00, 0x00, 0x7C, 0x06, 0x7E, 0xC6, 0x7E, 0x00,
    // b (98)
    0xC0, 0xC0, 0xFC, 0xC6, 0xC6, 0xC6, 0xFC, 0x00,
    // c (99)
    0x00, 0x00, 0x7C, 0xC6, 0xC0, 0xC6, 0x7C, 0x00,
    // d (100)
    0x06, 0x06, 0x7E, 0xC6, 0xC6, 0xC6, 0x7E, 0x00,
    // e (101)
    0x00, 0x00, 0x7C, 0xC6, 0xFE, 0xC0, 0x7C, 0x00,
    // f (102)
    0x1C, 0x30, 0x30, 0x7C, 0x30, 0x30, 0x30, 0x00,
    // g (103)
    0x00, 0x00, 0x7E, 0xC6, 0xC6, 0x7E, 0x06, 0x7C,
    // h (104)
    0xC0, 0xC0, 0xFC, 0xC6, 0xC6, 0xC6, 0xC6, 0x00,
    // i (105)
    0x18, 0x00, 0x38, 0x18, 0x18, 0x18, 0x3C, 0x00,
    // j (106)
    0x18, 0x00, 0x38, 0x18, 0x18, 0x18, 0x18, 0x70,
    // k (107)
    0xC0, 0xC0, 0xC6, 0xCC, 0xF8, 0xCC, 0xC6, 0x00,
    // l (108)
    0x38, 0x18, 0x18, 0x18, 0x18, 0x18, 0x3C, 0x00,
    // m (109)
    0x00, 0x00, 0xEC, 0xFE, 0xD6, 0xC6, 0xC6, 0x00,
    // n (110)
    0x00, 0x00, 0xFC, 0xC6, 0xC6, 0xC6, 0xC6, 0x00,
    // o (111)
    0x00, 0x00, 0x7C, 0xC6, 0xC6, 0xC6, 0x7C, 0x00,
    // p (112)
    0x00, 0x00, 0xFC, 0xC6, 0xC6, 0xFC, 0xC0, 0xC0,
    // q (113)
    0x00, 0x00, 0x7E, 0xC6, 0xC6, 0x7E, 0x06, 0x06,
    // r (114)
    0x00, 0x00, 0xDC, 0xE6, 0xC0, 0xC0, 0xC0, 0x00,
    // s (115)
    0x00, 0x00, 0x7E, 0xC0, 0x7C, 0x06, 0xFC, 0x00,
    // t (116)
    0x30, 0x30, 0x7C, 0x30, 0x30, 0x30, 0x1C, 0x00,
    // u (117)
    0x00, 0x00, 0xC6, 0xC6, 0xC6, 0xC6, 0x7E, 0x00,
    // v (118)
    0x00, 0x00, 0xC6, 0xC6, 0xC6, 0x6C, 0x38, 0x00,
    // w (119)
    0x00, 0x00, 0xC6, 0xC6, 0xD6, 0xFE, 0x6C, 0x00,
    // x (120)
    0x00, 0x00, 0xC6, 0x6C, 0x38, 0x6C, 0xC6, 0x00,
    // y (121)
    0x00, 0x00, 0xC6, 0xC6, 0xC6, 0x7E, 0x06, 0x7C,
    // z (122)
    0x00, 0x00, 0xFE, 0x0C, 0x38, 0x60, 0xFE, 0x00,
    // { (123)
    0x0E, 0x18, 0x18, 0x70, 0x18, 0x18, 0x0E, 0x00,
    // | (124)
    0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00,
    // } (125)
    0x70, 0x18, 0x18, 0x0E, 0x18, 0x18, 0x70, 0x00,
    // ~ (126)
    0x72, 0x9C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// First character the built-in font covers
const BUILTIN_FIRST: u8 = 32;
const BUILTIN_LAST: u8 = 126;

/// Offset of the lowercase bank in a Commodore character ROM
const CHAR_ROM_LOWER_BANK: usize = 0x800;

// ============================================================================
// Fonts
// ============================================================================

/// An 8x8 font plus the table mapping character codes to glyphs
#[derive(Clone)]
pub struct Font<'a> {
    glyphs: &'a [u8],
    translate: [u16; 256],
}

impl Font<'static> {
    /// Built-in ASCII font; unknown characters render as blanks
    pub fn builtin() -> Self {
        let mut translate = [0u16; 256];
        for ch in BUILTIN_FIRST..=BUILTIN_LAST {
            translate[ch as usize] = (ch - BUILTIN_FIRST) as u16;
        }
        Self { glyphs: &FONT_8X8, translate }
    }
}

impl<'a> Font<'a> {
    /// Use the emulated machine's character ROM
    ///
    /// ASCII is translated to screen codes of the ROM's upper/lower case
    /// bank. Characters without a screen code render as spaces.
    pub fn from_char_rom(rom: &'a [u8]) -> Self {
        let glyphs = rom.get(CHAR_ROM_LOWER_BANK..).unwrap_or(rom);
        let mut translate = [32u16; 256];
        for ch in 0u8..=255 {
            let code = match ch {
                b'@' => 0,
                b'a'..=b'z' => ch - b'a' + 1,
                b'A'..=b'Z' => ch,
                b' '..=b'?' => ch,
                b'[' => 27,
                b']' => 29,
                _ => continue,
            };
            translate[ch as usize] = code as u16;
        }
        Self { glyphs, translate }
    }

    fn glyph_at(&self, index: usize) -> &[u8] {
        self.glyphs.get(index * 8..index * 8 + 8).unwrap_or(&[0; 8])
    }

    /// Glyph for a character, through the translation table
    pub fn glyph(&self, ch: u8) -> &[u8] {
        self.glyph_at(self.translate[ch as usize] as usize)
    }

    /// Glyph by raw index, bypassing translation
    pub fn raw_glyph(&self, index: u8) -> &[u8] {
        self.glyph_at(index as usize)
    }
}

// ============================================================================
// Surface
// ============================================================================

/// A clipped view of an 8-bit indexed pixel buffer
pub struct Surface<'a> {
    buf: &'a mut [u8],
    pitch: usize,
    width: i32,
    height: i32,
}

impl<'a> Surface<'a> {
    /// Wrap `buf`; the height is cut down to what the buffer holds
    pub fn new(buf: &'a mut [u8], pitch: usize, width: i32, height: i32) -> Self {
        let rows = if pitch == 0 { 0 } else { buf.len() / pitch };
        let width = width.clamp(0, pitch.min(i32::MAX as usize) as i32);
        let height = height.clamp(0, rows.min(i32::MAX as usize) as i32);
        Self { buf, pitch, width, height }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.pitch + x as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.offset(x, y).map(|o| self.buf[o])
    }

    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: u8) {
        if let Some(o) = self.offset(x, y) {
            self.buf[o] = color;
        }
    }

    /// Row `y` as a slice of `width` pixels
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        let start = self.offset(0, y)?;
        Some(&self.buf[start..start + self.width as usize])
    }

    pub fn fill(&mut self, color: u8) {
        for y in 0..self.height {
            let start = y as usize * self.pitch;
            self.buf[start..start + self.width as usize].fill(color);
        }
    }

    /// Filled or outlined rectangle
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u8, fill: bool) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x1 = x.max(0);
        let y1 = y.max(0);
        let x2 = (x + w).min(self.width);
        let y2 = (y + h).min(self.height);
        if x1 >= x2 || y1 >= y2 {
            return;
        }

        for row in y1..y2 {
            let start = row as usize * self.pitch;
            if fill || row == y || row == y + h - 1 {
                self.buf[start + x1 as usize..start + x2 as usize].fill(color);
            } else {
                self.put_pixel(x, row, color);
                self.put_pixel(x + w - 1, row, color);
            }
        }
    }
}

// ============================================================================
// Text
// ============================================================================

fn blit_glyph(surface: &mut Surface, glyph: &[u8], x: i32, y: i32, color: u8, stretch: i32) {
    let stretch = stretch.max(1);
    for (row, &bits) in glyph.iter().enumerate() {
        for sy in 0..stretch {
            let py = y + row as i32 * stretch + sy;
            for col in 0..8 {
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                for sx in 0..stretch {
                    surface.put_pixel(x + col * stretch + sx, py, color);
                }
            }
        }
    }
}

/// Draw one character (translated), only setting foreground pixels
pub fn draw_char(surface: &mut Surface, font: &Font, ch: u8, x: i32, y: i32, color: u8, stretch: i32) {
    blit_glyph(surface, font.glyph(ch), x, y, color, stretch);
}

/// Draw a glyph by raw index (menu symbols)
pub fn draw_char_raw(surface: &mut Surface, font: &Font, index: u8, x: i32, y: i32, color: u8, stretch: i32) {
    blit_glyph(surface, font.raw_glyph(index), x, y, color, stretch);
}

/// Draw a string; `\n` starts a new line at `x`. No wrapping.
pub fn draw_text(surface: &mut Surface, font: &Font, text: &str, x: i32, y: i32, color: u8, stretch: i32) {
    let advance = 8 * stretch.max(1);
    let mut cx = x;
    let mut cy = y;
    for &b in text.as_bytes() {
        if b == b'\n' {
            cy += advance;
            cx = x;
        } else {
            draw_char(surface, font, b, cx, cy, color, stretch);
            cx += advance;
        }
    }
}

/// Width in pixels of `text` on one line at stretch 1
#[inline]
pub fn text_width(text: &str) -> i32 {
    8 * text.len() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;

    #[test]
    fn test_surface_clips_height_to_buffer() {
        let mut buf = vec![0u8; 16 * 4];
        let surface = Surface::new(&mut buf, 16, 16, 10);
        assert_eq!(surface.height(), 4);
    }

    #[test]
    fn test_draw_char_clips() {
        let mut buf = vec![0u8; 8 * 8];
        let font = Font::builtin();
        let mut surface = Surface::new(&mut buf, 8, 8, 8);
        draw_char(&mut surface, &font, b'!', -4, -4, 1, 1);
        draw_char(&mut surface, &font, b'!', 6, 6, 1, 1);
        // '!' column is 0x18: pixels 3 and 4 of each row
        assert_eq!(surface.pixel(0, 0), Some(1));
        assert_eq!(surface.pixel(1, 0), Some(0));
    }

    #[test]
    fn test_stretch_doubles_pixels() {
        let mut buf = vec![0u8; 16 * 16];
        let font = Font::builtin();
        let mut surface = Surface::new(&mut buf, 16, 16, 16);
        draw_char(&mut surface, &font, b'!', 0, 0, 5, 2);
        assert_eq!(surface.pixel(6, 0), Some(5));
        assert_eq!(surface.pixel(9, 1), Some(5));
        assert_eq!(surface.pixel(5, 0), Some(0));
        assert_eq!(surface.pixel(10, 0), Some(0));
    }

    #[test]
    fn test_text_newline_and_width() {
        let mut buf = vec![0u8; 32 * 16];
        let font = Font::builtin();
        let mut surface = Surface::new(&mut buf, 32, 32, 16);
        draw_text(&mut surface, &font, "!\n!", 0, 0, 1, 1);
        assert_eq!(surface.pixel(3, 0), Some(1));
        assert_eq!(surface.pixel(3, 8), Some(1));
        assert_eq!(surface.pixel(11, 0), Some(0));
        assert_eq!(text_width("Drive 8"), 56);
    }

    #[test]
    fn test_rect_outline_and_fill() {
        let mut buf = vec![0u8; 8 * 8];
        let mut surface = Surface::new(&mut buf, 8, 8, 8);
        surface.draw_rect(1, 1, 4, 4, 3, false);
        assert_eq!(surface.pixel(1, 1), Some(3));
        assert_eq!(surface.pixel(4, 4), Some(3));
        assert_eq!(surface.pixel(2, 2), Some(0));
        surface.draw_rect(-2, -2, 20, 20, 7, true);
        assert!(surface.row(7).unwrap().iter().all(|&p| p == 7));
    }

    #[test]
    fn test_char_rom_translation() {
        let mut rom = vec![0u8; 0x1000];
        // screen code 1 of the lower bank is 'a'
        rom[0x800 + 8] = 0xFF;
        let font = Font::from_char_rom(&rom);
        assert_eq!(font.glyph(b'a')[0], 0xFF);
        assert_eq!(font.glyph(b'A')[0], 0);
        assert_eq!(font.raw_glyph(1)[0], 0xFF);
    }
}

//! Raster drawing surface backed by an RGB image buffer

use crate::error::{PipelineError, Result};
use crate::utils::ensure_parent_dir;
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;

pub type Color = Rgb<u8>;

pub const WHITE: Color = Rgb([255, 255, 255]);
pub const BLACK: Color = Rgb([0, 0, 0]);
pub const GRAY: Color = Rgb([128, 128, 128]);

/// Glyph cell size of the built-in font, before scaling
pub const GLYPH_W: u32 = 5;
pub const GLYPH_H: u32 = 7;

/// Canvas with clipped drawing primitives. Coordinates are pixels with the
/// origin at the top-left corner.
pub struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        *self.img.get_pixel(x, y)
    }

    fn put(&mut self, x: i64, y: i64, color: Color) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, alpha: f64) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            let px = self.img.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let mixed = alpha * color.0[c] as f64 + (1.0 - alpha) * px.0[c] as f64;
                px.0[c] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Fill the half-open rectangle `[x0, x1) x [y0, y1)`
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        for y in y0.min(y1)..y0.max(y1) {
            for x in x0.min(x1)..x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    /// Fill a rectangle blending `color` over the existing pixels
    pub fn blend_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color, alpha: f64) {
        for y in y0.min(y1)..y0.max(y1) {
            for x in x0.min(x1)..x0.max(x1) {
                self.blend(x, y, color, alpha);
            }
        }
    }

    /// Outline of the closed rectangle `[x0, x1] x [y0, y1]`
    pub fn stroke_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        self.line(x0, y0, x1, y0, color, 1);
        self.line(x0, y1, x1, y1, color, 1);
        self.line(x0, y0, x0, y1, color, 1);
        self.line(x1, y0, x1, y1, color, 1);
    }

    /// Bresenham line with a square brush of `thickness` pixels
    pub fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color, thickness: u32) {
        self.dashed_line(x0, y0, x1, y1, color, thickness, None);
    }

    /// Line drawn in on/off segments of `dash` pixels each, solid when `None`
    #[allow(clippy::too_many_arguments)]
    pub fn dashed_line(
        &mut self,
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
        color: Color,
        thickness: u32,
        dash: Option<u32>,
    ) {
        let half = (thickness.max(1) as i64 - 1) / 2;
        let extra = (thickness.max(1) as i64 - 1) - half;
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        let mut step = 0u32;

        loop {
            let on = dash.map_or(true, |d| (step / d.max(1)) % 2 == 0);
            if on {
                for oy in -half..=extra {
                    for ox in -half..=extra {
                        self.put(x + ox, y + oy, color);
                    }
                }
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            step += 1;
        }
    }

    /// Filled disc with an optional one-pixel outline
    pub fn circle(&mut self, cx: i64, cy: i64, radius: i64, fill: Color, outline: Option<Color>) {
        let r2 = radius * radius;
        let inner2 = (radius - 1) * (radius - 1);
        for y in -radius..=radius {
            for x in -radius..=radius {
                let d2 = x * x + y * y;
                if d2 > r2 {
                    continue;
                }
                match outline {
                    Some(edge) if d2 > inner2 => self.put(cx + x, cy + y, edge),
                    _ => self.put(cx + x, cy + y, fill),
                }
            }
        }
    }

    /// Draw ASCII text with its top-left corner at `(x, y)`. Characters outside
    /// the printable range render as `?`.
    pub fn text(&mut self, x: i64, y: i64, text: &str, color: Color, scale: u32) {
        let scale = scale.max(1) as i64;
        let advance = (GLYPH_W as i64 + 1) * scale;
        for (i, ch) in text.chars().enumerate() {
            let columns = glyph(ch);
            let gx = x + i as i64 * advance;
            for (col, bits) in columns.iter().enumerate() {
                for row in 0..GLYPH_H as i64 {
                    if bits >> row & 1 == 1 {
                        let px = gx + col as i64 * scale;
                        let py = y + row * scale;
                        self.fill_rect(px, py, px + scale, py + scale, color);
                    }
                }
            }
        }
    }

    /// Text centered horizontally on `cx`
    pub fn text_centered(&mut self, cx: i64, y: i64, text: &str, color: Color, scale: u32) {
        let w = text_width(text, scale) as i64;
        self.text(cx - w / 2, y, text, color, scale);
    }

    /// Encode as PNG, creating parent directories
    pub fn save_png(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        self.img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| PipelineError::PlotError(format!("{}: {}", path.display(), e)))
    }
}

/// Pixel width of `text` at `scale`
pub fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        n * (GLYPH_W + 1) * scale.max(1) - scale.max(1)
    }
}

fn glyph(ch: char) -> [u8; 5] {
    let code = ch as u32;
    if (0x20..=0x7e).contains(&code) {
        FONT[(code - 0x20) as usize]
    } else {
        FONT[('?' as u32 - 0x20) as usize]
    }
}

/// 5x7 font for printable ASCII; one byte per column, bit 0 is the top row
const FONT: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5f, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7f, 0x14, 0x7f, 0x14], // #
    [0x24, 0x2a, 0x7f, 0x2a, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1c, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1c, 0x00], // )
    [0x08, 0x2a, 0x1c, 0x2a, 0x08], // *
    [0x08, 0x08, 0x3e, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3e, 0x51, 0x49, 0x45, 0x3e], // 0
    [0x00, 0x42, 0x7f, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4b, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7f, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3c, 0x4a, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1e], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3e], // @
    [0x7e, 0x11, 0x11, 0x11, 0x7e], // A
    [0x7f, 0x49, 0x49, 0x49, 0x36], // B
    [0x3e, 0x41, 0x41, 0x41, 0x22], // C
    [0x7f, 0x41, 0x41, 0x22, 0x1c], // D
    [0x7f, 0x49, 0x49, 0x49, 0x41], // E
    [0x7f, 0x09, 0x09, 0x09, 0x01], // F
    [0x3e, 0x41, 0x49, 0x49, 0x7a], // G
    [0x7f, 0x08, 0x08, 0x08, 0x7f], // H
    [0x00, 0x41, 0x7f, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3f, 0x01], // J
    [0x7f, 0x08, 0x14, 0x22, 0x41], // K
    [0x7f, 0x40, 0x40, 0x40, 0x40], // L
    [0x7f, 0x02, 0x0c, 0x02, 0x7f], // M
    [0x7f, 0x04, 0x08, 0x10, 0x7f], // N
    [0x3e, 0x41, 0x41, 0x41, 0x3e], // O
    [0x7f, 0x09, 0x09, 0x09, 0x06], // P
    [0x3e, 0x41, 0x51, 0x21, 0x5e], // Q
    [0x7f, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7f, 0x01, 0x01], // T
    [0x3f, 0x40, 0x40, 0x40, 0x3f], // U
    [0x1f, 0x20, 0x40, 0x20, 0x1f], // V
    [0x3f, 0x40, 0x38, 0x40, 0x3f], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x07, 0x08, 0x70, 0x08, 0x07], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7f, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x7f, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7f, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7f], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7e, 0x09, 0x01, 0x02], // f
    [0x0c, 0x52, 0x52, 0x52, 0x3e], // g
    [0x7f, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7d, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3d, 0x00], // j
    [0x7f, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7f, 0x40, 0x00], // l
    [0x7c, 0x04, 0x18, 0x04, 0x78], // m
    [0x7c, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7c, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7c], // q
    [0x7c, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3f, 0x44, 0x40, 0x20], // t
    [0x3c, 0x40, 0x40, 0x20, 0x7c], // u
    [0x1c, 0x20, 0x40, 0x20, 0x1c], // v
    [0x3c, 0x40, 0x30, 0x40, 0x3c], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0c, 0x50, 0x50, 0x50, 0x3c], // y
    [0x44, 0x64, 0x54, 0x4c, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7f, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x04, 0x08, 0x10, 0x08], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.fill_rect(-5, -5, 3, 3, BLACK);
        assert_eq!(canvas.pixel(0, 0), BLACK);
        assert_eq!(canvas.pixel(2, 2), BLACK);
        assert_eq!(canvas.pixel(3, 3), WHITE);
    }

    #[test]
    fn test_blend_rect_mixes() {
        let mut canvas = Canvas::new(2, 2, WHITE);
        canvas.blend_rect(0, 0, 1, 1, BLACK, 0.2);
        assert_eq!(canvas.pixel(0, 0), Rgb([204, 204, 204]));
    }

    #[test]
    fn test_line_endpoints() {
        let mut canvas = Canvas::new(20, 20, WHITE);
        canvas.line(1, 1, 15, 9, BLACK, 1);
        assert_eq!(canvas.pixel(1, 1), BLACK);
        assert_eq!(canvas.pixel(15, 9), BLACK);
    }

    #[test]
    fn test_text_marks_pixels() {
        let mut canvas = Canvas::new(40, 10, WHITE);
        canvas.text(0, 0, "A1", BLACK, 1);
        let dark = (0..40)
            .flat_map(|x| (0..10).map(move |y| (x, y)))
            .filter(|&(x, y)| canvas.pixel(x, y) == BLACK)
            .count();
        assert!(dark > 10);
        assert_eq!(text_width("A1", 1), 11);
    }

    #[test]
    fn test_font_table_covers_printable_ascii() {
        assert_eq!(FONT.len(), ('~' as usize) - (' ' as usize) + 1);
        assert_eq!(glyph('\u{e9}'), glyph('?'));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("x.png");
        Canvas::new(4, 4, WHITE).save_png(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}

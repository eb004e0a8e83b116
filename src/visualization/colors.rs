//! Class colours and colour scales

use super::canvas::Color;
use image::Rgb;
use palette::{Hsl, IntoColor, Srgb};

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn class_palette(n: usize) -> Vec<Color> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgb([
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            ])
        })
        .collect()
}

/// Sequential blue scale: 0.0 maps to near-white, 1.0 to dark blue
pub fn blues(t: f64) -> Color {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let light = [247.0, 251.0, 255.0];
    let dark = [8.0, 48.0, 107.0];
    let mix = |c: usize| (light[c] + (dark[c] - light[c]) * t).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Black or white, whichever reads better on `background`
pub fn contrast_text(background: Color) -> Color {
    let [r, g, b] = background.0;
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luma > 140.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_distinct() {
        let colors = class_palette(3);
        assert_eq!(colors.len(), 3);
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert!(class_palette(0).is_empty());
    }

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), Rgb([247, 251, 255]));
        assert_eq!(blues(1.0), Rgb([8, 48, 107]));
        assert_eq!(blues(f64::NAN), blues(0.0));
    }

    #[test]
    fn test_contrast_text() {
        assert_eq!(contrast_text(blues(0.0)), Rgb([0, 0, 0]));
        assert_eq!(contrast_text(blues(1.0)), Rgb([255, 255, 255]));
    }
}

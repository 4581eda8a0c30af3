use image::{Rgba, RgbaImage};

use crate::font::{TextExtent, TextRenderer};

/// Deterministic stand-in for a real font: every character is a solid block
/// `size / 2` wide and `size` tall.
pub(crate) struct BlockFont;

impl TextRenderer for BlockFont {
    fn measure(&self, text: &str, size: u32) -> TextExtent {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        TextExtent {
            width: chars.saturating_mul(size) / 2,
            height: size,
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, origin: (i32, i32), color: Rgba<u8>) {
        let extent = self.measure(text, size);
        for dy in 0..extent.height {
            for dx in 0..extent.width {
                let x = i64::from(origin.0) + i64::from(dx);
                let y = i64::from(origin.1) + i64::from(dy);
                if let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) {
                    if x < canvas.width() && y < canvas.height() {
                        canvas.put_pixel(x, y, color);
                    }
                }
            }
        }
    }
}

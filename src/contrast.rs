//! Foreground color selection for legibility.
//!
//! A region's text color is black on bright backgrounds and white on dark
//! ones, judged by the mean luminance of the *original* pixels under the
//! region's bounding box.

use image::{Rgba, RgbaImage};

use crate::region::BoundingBox;

/// Opaque black.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Opaque white.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Mean luminance above which a background counts as bright.
const BRIGHT_THRESHOLD: f32 = 128.0;

/// Pick black or white text for the area of `image` under `bbox`.
///
/// The box is clipped to the image. An empty crop yields [`BLACK`].
#[must_use]
pub fn choose_text_color(image: &RgbaImage, bbox: BoundingBox) -> Rgba<u8> {
    match mean_luminance(image, bbox) {
        Some(mean) if mean <= BRIGHT_THRESHOLD => WHITE,
        _ => BLACK,
    }
}

/// Mean grayscale value of the clipped crop, or `None` if it is empty.
///
/// Each pixel is converted to an 8-bit gray level with
/// `0.299*R + 0.587*G + 0.114*B`, rounded, before averaging.
#[must_use]
pub fn mean_luminance(image: &RgbaImage, bbox: BoundingBox) -> Option<f32> {
    let clip = |v: i32, max: u32| u32::try_from(v.max(0)).unwrap_or(0).min(max);
    let (x0, x1) = (clip(bbox.x0, image.width()), clip(bbox.x1, image.width()));
    let (y0, y1) = (clip(bbox.y0, image.height()), clip(bbox.y1, image.height()));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut total = 0.0_f64;
    for y in y0..y1 {
        for x in x0..x1 {
            total += gray_level(*image.get_pixel(x, y));
        }
    }
    #[allow(clippy::cast_possible_truncation)]
    let mean = (total / f64::from((x1 - x0) * (y1 - y0))) as f32;
    Some(mean)
}

fn gray_level(px: Rgba<u8>) -> f64 {
    (0.299 * f64::from(px[0]) + 0.587 * f64::from(px[1]) + 0.114 * f64::from(px[2])).round()
}

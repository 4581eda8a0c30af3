//! Draws fitted, colored translations onto the inpainted canvas.

use image::RgbaImage;

use crate::font::TextRenderer;
use crate::region::{BoundingBox, TranslatedRegion};

/// Top-left draw origin centering a `width` x `height` line box in `bbox`.
///
/// Computed as `(x0 + (bw - tw) / 2, y0 + (bh - th) / 2)` and may lie
/// outside the box when the text is larger than it.
#[must_use]
pub fn centered_origin(bbox: BoundingBox, width: u32, height: u32) -> (i32, i32) {
    let offset = |start: i32, span: i32, extent: u32| {
        let slack = i64::from(span) - i64::from(extent);
        let pos = i64::from(start) + slack.div_euclid(2);
        i32::try_from(pos).unwrap_or(if pos < 0 { i32::MIN } else { i32::MAX })
    };
    (
        offset(bbox.x0, bbox.width(), width),
        offset(bbox.y0, bbox.height(), height),
    )
}

/// Draw every region's translation axis-aligned and centered in its box.
///
/// Regions are assumed disjoint; drawing order is region order.
pub fn composite(canvas: &mut RgbaImage, regions: &[TranslatedRegion], font: &dyn TextRenderer) {
    for tr in regions {
        let bbox = tr.region.bbox();
        let extent = font.measure(&tr.translated, tr.font_size);
        let origin = centered_origin(bbox, extent.width, extent.height);
        tracing::debug!(
            text = %tr.translated,
            size = tr.font_size,
            x = origin.0,
            y = origin.1,
            "drawing region"
        );
        font.draw(canvas, &tr.translated, tr.font_size, origin, tr.color);
    }
}

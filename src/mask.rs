//! Binary text mask built from region polygons.
//!
//! Polygons are filled with the non-zero winding rule and their edges are
//! stroked one pixel wide, so boundary pixels are always covered. Integer
//! vertices address pixel centres. Vertices are used exactly as given: no
//! smoothing, no dilation.

use image::{GrayImage, Luma};
use tiny_skia::{FillRule, LineCap, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::region::Point;

/// Mask value marking text pixels.
pub const TEXT: u8 = 255;

/// Rasterize the union of `polygons` into a `width` x `height` mask.
///
/// Polygons with fewer than three points still contribute their stroked
/// edges (a point or a segment); an empty polygon contributes nothing.
#[must_use]
pub fn build_mask<'a, I>(width: u32, height: u32, polygons: I) -> GrayImage
where
    I: IntoIterator<Item = &'a [Point]>,
{
    let mut mask = GrayImage::new(width, height);
    let Some(mut pixmap) = Pixmap::new(width, height) else {
        return mask;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = false;
    let centres = Transform::from_translate(0.5, 0.5);
    for polygon in polygons {
        draw_polygon(&mut pixmap, &paint, polygon, centres);
    }

    for (dst, src) in mask.pixels_mut().zip(pixmap.pixels()) {
        if src.alpha() > 0 {
            *dst = Luma([TEXT]);
        }
    }
    mask
}

#[allow(clippy::cast_precision_loss)]
fn draw_polygon(pixmap: &mut Pixmap, paint: &Paint, polygon: &[Point], transform: Transform) {
    match polygon {
        [] => {}
        [(x, y)] => {
            if let Some(dot) = Rect::from_xywh(*x as f32, *y as f32, 1.0, 1.0) {
                pixmap.fill_rect(dot, paint, Transform::identity(), None);
            }
        }
        _ => {
            let closed = polygon.len() > 2;
            let Some(path) = polygon_path(polygon, closed) else {
                return;
            };
            if closed {
                pixmap.fill_path(&path, paint, FillRule::Winding, transform, None);
            }
            let edge = Stroke {
                width: 1.0,
                line_cap: LineCap::Square,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, paint, &edge, transform, None);
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn polygon_path(polygon: &[Point], closed: bool) -> Option<Path> {
    let mut points = polygon.iter().map(|&(x, y)| (x as f32, y as f32));
    let (x, y) = points.next()?;
    let mut builder = PathBuilder::new();
    builder.move_to(x, y);
    for (x, y) in points {
        builder.line_to(x, y);
    }
    if closed {
        builder.close();
    }
    builder.finish()
}

//! Font resource, text measurement and font-size fitting.
//!
//! Measurement and drawing share one convention so a size chosen by
//! [`fit_font_size`] is exactly what gets drawn: width is the sum of glyph
//! advances (no kerning), height is the line height (ascender minus
//! descender), both rounded up to whole pixels. The line box's top-left
//! corner sits at the draw origin. Glyph ink that overhangs the line box,
//! such as an italic hook or a negative side bearing, is still drawn.

use std::path::Path;
use std::sync::Arc;

use image::{imageops, Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use ttf_parser::{Face, OutlineBuilder};

use crate::error::{Error, Result};

/// Smallest size tried by [`fit_font_size`], also the floor it returns.
pub const INITIAL_FONT_SIZE: u32 = 10;
/// Increment between sizes tried by [`fit_font_size`].
pub const FONT_SIZE_STEP: u32 = 2;
/// Ceiling for [`fit_font_size`] in case a measurement never overflows.
pub const MAX_FONT_SIZE: u32 = 1024;

/// Rendered size of a string, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    /// Rendered width.
    pub width: u32,
    /// Rendered height.
    pub height: u32,
}

/// A scalable font usable at arbitrary pixel sizes.
pub trait TextRenderer: Send + Sync {
    /// Size of `text` drawn at `size` pixels.
    fn measure(&self, text: &str, size: u32) -> TextExtent;

    /// Draw `text` at `size` with its line box's top-left at `origin`.
    ///
    /// Pixels outside `canvas` are clipped.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, origin: (i32, i32), color: Rgba<u8>);
}

/// Largest size from 10, 12, 14, ... whose measurement fits `width` x `height`.
///
/// The search stops at the first size that overflows either dimension and
/// returns the size before it. If even [`INITIAL_FONT_SIZE`] overflows, that
/// floor is returned anyway and the caller draws slightly outside the box.
pub fn fit_font_size<F>(width: i32, height: i32, mut measure: F) -> u32
where
    F: FnMut(u32) -> TextExtent,
{
    let fits = |e: TextExtent| {
        i64::from(e.width) <= i64::from(width) && i64::from(e.height) <= i64::from(height)
    };

    let mut best = INITIAL_FONT_SIZE;
    let mut size = INITIAL_FONT_SIZE;
    while size <= MAX_FONT_SIZE && fits(measure(size)) {
        best = size;
        size += FONT_SIZE_STEP;
    }
    best
}

/// A TrueType/OpenType face rendered with outline rasterization.
#[derive(Clone)]
pub struct OutlineFont {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    fallback_advance: u16,
    family: Option<String>,
}

impl std::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .finish_non_exhaustive()
    }
}

impl OutlineFont {
    /// Load the first face of a font file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Font`]
    /// if it holds no parseable face.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))
    }

    /// Parse the first face of in-memory font data (TTF, OTF or collection).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if the data holds no parseable face.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
        let (face_index, face) = (0..count)
            .find_map(|i| Face::parse(&data, i).ok().map(|f| (i, f)))
            .ok_or_else(|| Error::Font("failed to parse font data".to_string()))?;

        let units_per_em = face.units_per_em().max(1);
        let fallback_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        let family = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::FAMILY)
            .find_map(|n| n.to_string());
        let (ascender, descender) = (f32::from(face.ascender()), f32::from(face.descender()));

        tracing::debug!(?family, face_index, units_per_em, "loaded font");
        Ok(Self {
            face_index,
            units_per_em: f32::from(units_per_em),
            ascender,
            descender,
            fallback_advance,
            family,
            data: Arc::new(data),
        })
    }

    /// Family name from the font's name table, if present.
    #[must_use]
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.face_index).ok()
    }

    fn scale(&self, size: u32) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let size = size as f32;
        size / self.units_per_em
    }

    fn advance_units(&self, face: &Face<'_>, text: &str) -> f32 {
        text.chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|g| face.glyph_hor_advance(g))
                    .unwrap_or(self.fallback_advance)
            })
            .map(f32::from)
            .sum()
    }
}

impl TextRenderer for OutlineFont {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn measure(&self, text: &str, size: u32) -> TextExtent {
        let Some(face) = self.face() else {
            return TextExtent::default();
        };
        let scale = self.scale(size);
        TextExtent {
            width: (self.advance_units(&face, text) * scale).ceil() as u32,
            height: ((self.ascender - self.descender) * scale).ceil() as u32,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: u32, origin: (i32, i32), color: Rgba<u8>) {
        let Some(face) = self.face() else {
            return;
        };

        let scale = self.scale(size);
        let mut outline = PathOutline {
            builder: PathBuilder::new(),
            scale,
            pen_x: 0.0,
            baseline: self.ascender * scale,
        };
        for ch in text.chars().filter(|ch| *ch != '\n') {
            let advance = match face.glyph_index(ch) {
                Some(glyph) => {
                    face.outline_glyph(glyph, &mut outline);
                    face.glyph_hor_advance(glyph).unwrap_or(self.fallback_advance)
                }
                None => self.fallback_advance,
            };
            outline.pen_x += f32::from(advance) * scale;
        }
        let Some(path) = outline.builder.finish() else {
            return;
        };

        // Ink may leave the line box through side bearings and overhangs, so
        // the layer spans the outline's bounds plus a pixel of antialiasing.
        let bounds = path.bounds();
        let (left, top) = (bounds.left().floor() - 1.0, bounds.top().floor() - 1.0);
        let width = (bounds.right().ceil() + 1.0 - left) as u32;
        let height = (bounds.bottom().ceil() + 1.0 - top) as u32;
        let Some(mut pixmap) = Pixmap::new(width, height) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;
        pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            Transform::from_translate(-left, -top),
            None,
        );

        let straight: Vec<u8> = pixmap
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        let Some(layer) = RgbaImage::from_raw(width, height, straight) else {
            return;
        };
        imageops::overlay(
            canvas,
            &layer,
            i64::from(origin.0) + left as i64,
            i64::from(origin.1) + top as i64,
        );
    }
}

/// Collects glyph outlines into one path, flipping font units to y-down pixels.
struct PathOutline {
    builder: PathBuilder,
    scale: f32,
    pen_x: f32,
    baseline: f32,
}

impl PathOutline {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.pen_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl OutlineBuilder for PathOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::BlockFont;

    #[test]
    fn fit_returns_largest_fitting_step() {
        // 5 chars, each 0.5 * size wide, height == size.
        let font = BlockFont;
        let size = fit_font_size(90, 30, |s| font.measure("HELLO", s));
        assert_eq!(size, 30);
        let size = fit_font_size(50, 100, |s| font.measure("HELLO", s));
        assert_eq!(size, 20);
    }

    #[test]
    fn fit_floors_at_initial_size_for_tiny_boxes() {
        let font = BlockFont;
        assert_eq!(fit_font_size(3, 3, |s| font.measure("HELLO", s)), INITIAL_FONT_SIZE);
        assert_eq!(fit_font_size(0, 0, |s| font.measure("x", s)), INITIAL_FONT_SIZE);
        assert_eq!(fit_font_size(-5, 20, |s| font.measure("x", s)), INITIAL_FONT_SIZE);
    }

    #[test]
    fn fit_stops_at_first_overflow() {
        let mut tried = Vec::new();
        let size = fit_font_size(100, 100, |s| {
            tried.push(s);
            TextExtent {
                width: if s == 14 { 1000 } else { 1 },
                height: 1,
            }
        });
        assert_eq!(size, 12);
        assert_eq!(tried, [10, 12, 14]);
    }

    #[test]
    fn fit_terminates_when_nothing_overflows() {
        let size = fit_font_size(10, 10, |_| TextExtent::default());
        assert_eq!(size, MAX_FONT_SIZE);
    }

    #[test]
    fn fit_is_monotonic_in_box_size() {
        let font = BlockFont;
        for text in ["HOLA", "a much longer translated string", "日本語"] {
            let mut previous = 0;
            for w in (0..400).step_by(7) {
                let size = fit_font_size(w, 60, |s| font.measure(text, s));
                assert!(size >= previous, "width {w}: {size} < {previous}");
                previous = size;
            }
            let mut previous = 0;
            for h in (0..200).step_by(5) {
                let size = fit_font_size(300, h, |s| font.measure(text, s));
                assert!(size >= previous, "height {h}: {size} < {previous}");
                previous = size;
            }
        }
    }

    #[test]
    fn outline_font_rejects_garbage() {
        let err = OutlineFont::from_bytes(b"not a font at all".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn outline_font_reports_missing_file_as_io() {
        let err = OutlineFont::from_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

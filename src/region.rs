//! Detected text regions and the confidence filter.
//!
//! A [`Detection`] is raw text-detector output. [`filter_detections`] keeps
//! the confident ones as [`Region`]s, which every later stage consumes. Once
//! a region has a translation, a color and a font size it becomes a
//! [`TranslatedRegion`], ready for the compositor.

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Detections at or below this confidence are discarded.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.4;

/// A 2D integer point in image pixel coordinates.
pub type Point = (i32, i32);

/// Raw text-detector output for one block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Ordered boundary points of the detected text.
    pub polygon: Vec<Point>,
    /// Recognized source-language text.
    pub text: String,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Detection {
    /// Create a detection from its parts.
    pub fn new(polygon: Vec<Point>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }
}

/// Axis-aligned bounding box with exclusive-style extents `x1 - x0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    /// Minimum x over the polygon.
    pub x0: i32,
    /// Minimum y over the polygon.
    pub y0: i32,
    /// Maximum x over the polygon.
    pub x1: i32,
    /// Maximum y over the polygon.
    pub y1: i32,
}

impl BoundingBox {
    /// Bounding box of a polygon. An empty polygon yields the zero box.
    #[must_use]
    pub fn of(polygon: &[Point]) -> Self {
        let Some(&(fx, fy)) = polygon.first() else {
            return Self::default();
        };
        polygon.iter().fold(
            Self {
                x0: fx,
                y0: fy,
                x1: fx,
                y1: fy,
            },
            |b, &(x, y)| Self {
                x0: b.x0.min(x),
                y0: b.y0.min(y),
                x1: b.x1.max(x),
                y1: b.y1.max(y),
            },
        )
    }

    /// Box width, `x1 - x0`.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    /// Box height, `y1 - y0`.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }

    /// Whether the box encloses no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// A confident detection: polygon plus recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Ordered boundary points, taken as given by the detector.
    pub polygon: Vec<Point>,
    /// Recognized source-language text.
    pub text: String,
}

impl Region {
    /// Axis-aligned bounding box of the polygon.
    #[must_use]
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::of(&self.polygon)
    }
}

/// A region ready to be drawn: translation, color and fitted size attached.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedRegion {
    /// The source region.
    pub region: Region,
    /// Text to draw. Falls back to the source text when translation failed.
    pub translated: String,
    /// Foreground color chosen against the original background.
    pub color: Rgba<u8>,
    /// Fitted font size in pixels.
    pub font_size: u32,
}

/// Keep detections whose confidence is strictly above `min_confidence`.
///
/// The confidence is dropped. Empty polygons and empty text pass through
/// unchanged; downstream stages tolerate degenerate geometry.
#[must_use]
pub fn filter_detections(detections: Vec<Detection>, min_confidence: f32) -> Vec<Region> {
    detections
        .into_iter()
        .filter(|d| d.confidence > min_confidence)
        .map(|d| Region {
            polygon: d.polygon,
            text: d.text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point> {
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }

    #[test]
    fn filter_drops_low_and_boundary_confidence() {
        let detections = vec![
            Detection::new(rect(0, 0, 10, 10), "keep", 0.9),
            Detection::new(rect(0, 0, 10, 10), "edge", 0.4),
            Detection::new(rect(0, 0, 10, 10), "low", 0.1),
            Detection::new(rect(0, 0, 10, 10), "just", 0.400_01),
        ];
        let kept = filter_detections(detections, DEFAULT_MIN_CONFIDENCE);
        let texts: Vec<_> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["keep", "just"]);
    }

    #[test]
    fn filter_passes_degenerate_regions_through() {
        let detections = vec![
            Detection::new(Vec::new(), "no polygon", 0.8),
            Detection::new(rect(5, 5, 20, 20), "", 0.8),
        ];
        let kept = filter_detections(detections, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].polygon.is_empty());
        assert!(kept[1].text.is_empty());
    }

    #[test]
    fn filter_never_grows_the_input() {
        for threshold in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let detections: Vec<_> = (0..20u8)
                .map(|i| Detection::new(rect(0, 0, 4, 4), "t", f32::from(i) / 19.0))
                .collect();
            let expected = detections
                .iter()
                .filter(|d| d.confidence > threshold)
                .count();
            let kept = filter_detections(detections, threshold);
            assert_eq!(kept.len(), expected);
            assert!(kept.len() <= 20);
        }
    }

    #[test]
    fn bbox_spans_polygon_extremes() {
        let region = Region {
            polygon: vec![(12, 40), (100, 10), (95, 44), (10, 30)],
            text: "skewed".into(),
        };
        let b = region.bbox();
        assert_eq!(
            b,
            BoundingBox {
                x0: 10,
                y0: 10,
                x1: 100,
                y1: 44
            }
        );
        assert_eq!(b.width(), 90);
        assert_eq!(b.height(), 34);
        assert!(!b.is_empty());
    }

    #[test]
    fn bbox_of_empty_or_collinear_polygon_is_empty() {
        assert!(BoundingBox::of(&[]).is_empty());
        assert!(BoundingBox::of(&[(3, 3), (9, 3), (20, 3)]).is_empty());
    }

    #[test]
    fn detection_deserializes_from_ocr_shape() {
        let json = r#"{"polygon": [[1, 2], [3, 4], [5, 6]], "text": "HI", "confidence": 0.75}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.polygon, vec![(1, 2), (3, 4), (5, 6)]);
        assert_eq!(det.text, "HI");
        assert!((det.confidence - 0.75).abs() < f32::EPSILON);
    }
}

//! Text detector contract.
//!
//! OCR engines live outside this crate. Anything that can turn a raster
//! into polygons, strings and confidences implements [`TextDetector`].

use std::path::Path;

use image::RgbaImage;

use crate::error::Result;
use crate::region::Detection;

/// Finds candidate text regions in an image.
pub trait TextDetector: Send + Sync {
    /// Detect text in `image`.
    ///
    /// # Errors
    ///
    /// Implementations return [`crate::Error::Detector`] when the backend
    /// cannot run.
    fn detect(&self, image: &RgbaImage) -> Result<Vec<Detection>>;
}

/// Detector that replays a fixed set of detections.
///
/// Useful when OCR ran elsewhere and its output was saved as JSON:
///
/// ```json
/// [{ "polygon": [[10, 10], [100, 10], [100, 40], [10, 40]], "text": "HELLO", "confidence": 0.9 }]
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrecomputedDetector {
    detections: Vec<Detection>,
}

impl PrecomputedDetector {
    /// Wrap an in-memory list of detections.
    #[must_use]
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// Parse detections from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the document is not a detection list.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load detections from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read, or
    /// [`crate::Error::Json`] if it is malformed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The detections this detector replays.
    #[must_use]
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }
}

impl TextDetector for PrecomputedDetector {
    fn detect(&self, _image: &RgbaImage) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

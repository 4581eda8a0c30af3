//! Detect, erase, translate and re-render printed text in images.
//!
//! A text detector finds text regions, the confident ones are erased by
//! fast-marching inpainting, each region's text is translated, and the
//! translation is drawn back centered in the region's bounding box at the
//! largest font size that fits, in black or white depending on the original
//! background. The result can then be stretched or letterboxed to a device
//! resolution.
//!
//! OCR, translation and fonts are pluggable: implement [`TextDetector`],
//! [`Translator`] and [`TextRenderer`], or use the bundled
//! [`PrecomputedDetector`], [`GlossaryTranslator`] and [`OutlineFont`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use image_text_translate::{
//!     GlossaryTranslator, ImageTranslator, OutlineFont, PrecomputedDetector,
//! };
//!
//! let detector = PrecomputedDetector::from_json_file(Path::new("regions.json"))?;
//! let glossary = GlossaryTranslator::new().with_entry("es", "HELLO", "HOLA");
//! let font = OutlineFont::from_file(Path::new("DejaVuSans.ttf"))?;
//!
//! let pipeline = ImageTranslator::new(detector, glossary, font);
//! let upload = std::fs::read("sign.png")?;
//! let output = pipeline.translate_image(&upload, "es", Some("hd"))?;
//! std::fs::write("sign_es.png", &output.png)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

pub mod compose;
pub mod contrast;
pub mod detector;
mod engine;
pub mod error;
pub mod font;
pub mod inpaint;
pub mod mask;
pub mod region;
pub mod resolution;
pub mod store;
pub mod translate;

#[cfg(test)]
mod test_util;

pub use detector::{PrecomputedDetector, TextDetector};
pub use engine::{
    decode_image, default_output_path, encode_png, save_image, ImageTranslator, PipelineOptions,
    ProcessResult, RegionFallback, TranslatedImage, TranslationOutput,
};
pub use error::{Error, Result};
pub use font::{OutlineFont, TextExtent, TextRenderer};
pub use inpaint::{Inpainter, TeleaInpainter};
pub use region::{BoundingBox, Detection, Region, TranslatedRegion};
pub use resolution::{resolution_for, AdaptMode, ResolutionTarget};
pub use store::{ResultId, ResultStore};
pub use translate::{GlossaryTranslator, TranslateError, Translator};

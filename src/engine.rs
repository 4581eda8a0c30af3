//! Text-replacement pipeline.
//!
//! detect → filter → inpaint ∥ translate → color + fit → composite → adapt.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::compose;
use crate::contrast;
use crate::detector::TextDetector;
use crate::error::{Error, Result};
use crate::font::{self, TextRenderer};
use crate::inpaint::{Inpainter, TeleaInpainter};
use crate::mask;
use crate::region::{self, Region, TranslatedRegion, DEFAULT_MIN_CONFIDENCE};
use crate::resolution::{self, AdaptMode, ResolutionTarget, DEFAULT_EDGE_BAND};
use crate::translate::{self, TranslateError, Translator};

/// Options controlling a translation run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Detections at or below this confidence are dropped.
    pub min_confidence: f32,
    /// Source language passed to the translator.
    pub source_language: String,
    /// Border band width sampled for the letterbox fill color.
    pub edge_band: u32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            source_language: "auto".to_string(),
            edge_band: DEFAULT_EDGE_BAND,
        }
    }
}

/// A region whose source text was drawn because translation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFallback {
    /// Index of the region among the regions that survived filtering.
    pub index: usize,
    /// Why translation failed.
    pub error: TranslateError,
}

/// The final raster of one run, before encoding.
#[derive(Debug, Clone)]
pub struct TranslatedImage {
    /// Final image at output dimensions.
    pub image: RgbaImage,
    /// One entry per surviving region.
    pub regions: Vec<TranslatedRegion>,
    /// Regions drawn with their source text.
    pub fallbacks: Vec<RegionFallback>,
    /// How the resolution adapter produced the output size.
    pub adapt: AdaptMode,
}

/// The encoded result of one run.
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    /// PNG-encoded final image.
    pub png: Vec<u8>,
    /// Final image width.
    pub width: u32,
    /// Final image height.
    pub height: u32,
    /// One entry per surviving region.
    pub regions: Vec<TranslatedRegion>,
    /// Regions drawn with their source text.
    pub fallbacks: Vec<RegionFallback>,
}

/// Result of translating a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Number of regions that were replaced.
    pub regions: usize,
    /// Number of regions that kept their source text.
    pub fallbacks: usize,
    /// Human-readable status message.
    pub message: String,
}

/// Detects, erases, translates and re-renders text in images.
///
/// Build once with its collaborators and reuse for many images. Each call
/// owns its canvas, so concurrent calls on a shared translator are safe.
pub struct ImageTranslator {
    detector: Box<dyn TextDetector>,
    translator: Box<dyn Translator>,
    font: Box<dyn TextRenderer>,
    inpainter: Box<dyn Inpainter>,
    options: PipelineOptions,
}

impl ImageTranslator {
    /// Create a pipeline with the default inpainter and options.
    pub fn new(
        detector: impl TextDetector + 'static,
        translator: impl Translator + 'static,
        font: impl TextRenderer + 'static,
    ) -> Self {
        Self {
            detector: Box::new(detector),
            translator: Box::new(translator),
            font: Box::new(font),
            inpainter: Box::new(TeleaInpainter::default()),
            options: PipelineOptions::default(),
        }
    }

    /// Replace the inpainting engine.
    #[must_use]
    pub fn with_inpainter(mut self, inpainter: impl Inpainter + 'static) -> Self {
        self.inpainter = Box::new(inpainter);
        self
    }

    /// Replace the pipeline options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Translate the text in an encoded image and return PNG bytes.
    ///
    /// An unknown or absent `resolution_key` keeps the source dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] if `bytes` cannot be decoded,
    /// [`Error::Detector`] if detection fails, or [`Error::Image`] if the
    /// result cannot be encoded. Per-region translation failures are not
    /// errors; they appear in [`TranslationOutput::fallbacks`].
    pub fn translate_image(
        &self,
        bytes: &[u8],
        target_language: &str,
        resolution_key: Option<&str>,
    ) -> Result<TranslationOutput> {
        let source = decode_image(bytes)?;
        let target = resolution_key.and_then(|key| {
            let found = resolution::resolution_for(key);
            if found.is_none() {
                tracing::debug!(key, "unknown resolution key, keeping source size");
            }
            found
        });

        let result = self.translate_raster(source, target_language, target)?;
        let png = encode_png(&result.image)?;
        Ok(TranslationOutput {
            png,
            width: result.image.width(),
            height: result.image.height(),
            regions: result.regions,
            fallbacks: result.fallbacks,
        })
    }

    /// Run the pipeline on a decoded raster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Detector`] if the detector fails.
    pub fn translate_raster(
        &self,
        source: RgbaImage,
        target_language: &str,
        target: Option<ResolutionTarget>,
    ) -> Result<TranslatedImage> {
        let (width, height) = source.dimensions();
        let detections = self.detector.detect(&source)?;
        let detected = detections.len();
        let regions = region::filter_detections(detections, self.options.min_confidence);
        tracing::info!(
            width,
            height,
            detected,
            kept = regions.len(),
            target_language,
            "translating image"
        );

        if regions.is_empty() {
            let (image, adapt) = resolution::adapt_resolution(source, target, self.options.edge_band);
            return Ok(TranslatedImage {
                image,
                regions: Vec::new(),
                fallbacks: Vec::new(),
                adapt,
            });
        }

        let text_mask = mask::build_mask(width, height, regions.iter().map(|r| r.polygon.as_slice()));
        let mut canvas = self.inpainter.inpaint(&source, &text_mask);

        let translations = translate::translate_regions(
            self.translator.as_ref(),
            &regions,
            &self.options.source_language,
            target_language,
        );

        let mut fallbacks = Vec::new();
        let mut placed = Vec::with_capacity(regions.len());
        for (index, (region, translation)) in regions.into_iter().zip(translations).enumerate() {
            if let Some(error) = translation.fallback {
                fallbacks.push(RegionFallback { index, error });
            }
            placed.push(self.place(&source, region, translation.text));
        }

        compose::composite(&mut canvas, &placed, self.font.as_ref());
        let (image, adapt) = resolution::adapt_resolution(canvas, target, self.options.edge_band);

        tracing::info!(
            regions = placed.len(),
            fallbacks = fallbacks.len(),
            output = ?image.dimensions(),
            "image translated"
        );
        Ok(TranslatedImage {
            image,
            regions: placed,
            fallbacks,
            adapt,
        })
    }

    /// Attach color and fitted size to a translated region.
    fn place(&self, source: &RgbaImage, region: Region, translated: String) -> TranslatedRegion {
        let bbox = region.bbox();
        if bbox.is_empty() {
            tracing::warn!(text = %region.text, ?bbox, "degenerate region box");
        }
        let color = contrast::choose_text_color(source, bbox);
        let font_size = font::fit_font_size(bbox.width(), bbox.height(), |size| {
            self.font.measure(&translated, size)
        });
        TranslatedRegion {
            region,
            translated,
            color,
            font_size,
        }
    }

    /// Process a single image file: load, translate, save.
    ///
    /// Returns a [`ProcessResult`] indicating success or failure.
    #[must_use]
    pub fn translate_file(
        &self,
        input: &Path,
        output: &Path,
        target_language: &str,
        resolution_key: Option<&str>,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            regions: 0,
            fallbacks: 0,
            message: String::new(),
        };

        let bytes = match std::fs::read(input) {
            Ok(b) => b,
            Err(e) => {
                result.message = format!("Failed to read: {e}");
                return result;
            }
        };
        let source = match decode_image(&bytes) {
            Ok(img) => img,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let target = resolution_key.and_then(resolution::resolution_for);
        let translated = match self.translate_raster(source, target_language, target) {
            Ok(t) => t,
            Err(e) => {
                result.message = format!("Failed to translate: {e}");
                return result;
            }
        };
        result.regions = translated.regions.len();
        result.fallbacks = translated.fallbacks.len();

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&translated.image, output) {
            Ok(()) => {
                result.success = true;
                result.message = if result.regions == 0 {
                    "No text detected".to_string()
                } else {
                    format!(
                        "Replaced {} region(s), {} kept source text",
                        result.regions, result.fallbacks
                    )
                };
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }
}

/// Decode an uploaded image into an RGBA raster.
///
/// # Errors
///
/// Returns [`Error::InvalidImage`] for unreadable or corrupt input.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(Error::InvalidImage)
}

/// Encode a raster as PNG.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Save a raster, choosing the encoder from the path's extension.
///
/// JPEG output drops the alpha channel.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&rgb)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"menu.jpg"` with target `es` becomes `"menu_es.png"`.
#[must_use]
pub fn default_output_path(input: &Path, target_language: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_{target_language}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contrast::{BLACK, WHITE};
    use crate::detector::PrecomputedDetector;
    use crate::region::Detection;
    use crate::test_util::BlockFont;
    use crate::translate::GlossaryTranslator;
    use image::Rgba;

    fn hello_pipeline() -> ImageTranslator {
        let detector = PrecomputedDetector::new(vec![
            Detection::new(vec![(10, 10), (100, 10), (100, 40), (10, 40)], "HELLO", 0.9),
            Detection::new(vec![(0, 50), (20, 50), (20, 58), (0, 58)], "noise", 0.2),
        ]);
        let glossary = GlossaryTranslator::new().with_entry("es", "HELLO", "HOLA");
        ImageTranslator::new(detector, glossary, BlockFont)
    }

    fn png_of(img: &RgbaImage) -> Vec<u8> {
        encode_png(img).unwrap()
    }

    #[test]
    fn places_fitted_color_and_size() {
        let src = RgbaImage::from_pixel(120, 60, WHITE);
        let out = hello_pipeline().translate_raster(src, "es", None).unwrap();
        assert_eq!(out.regions.len(), 1);
        let tr = &out.regions[0];
        assert_eq!(tr.translated, "HOLA");
        assert_eq!(tr.color, BLACK);
        // 4 chars at size s are 2s wide: largest even size with 2s <= 90 and s <= 30.
        assert_eq!(tr.font_size, 30);
        assert!(out.fallbacks.is_empty());
        assert_eq!(out.adapt, AdaptMode::Unchanged);
    }

    #[test]
    fn untranslatable_region_keeps_source_text() {
        let src = RgbaImage::from_pixel(120, 60, Rgba([10, 10, 10, 255]));
        let out = hello_pipeline().translate_raster(src, "fr", None).unwrap();
        assert_eq!(out.regions[0].translated, "HELLO");
        assert_eq!(out.regions[0].color, WHITE);
        assert_eq!(out.fallbacks.len(), 1);
        assert_eq!(out.fallbacks[0].index, 0);
    }

    #[test]
    fn corrupt_upload_is_rejected() {
        let err = hello_pipeline()
            .translate_image(b"GIF89a garbage", "es", None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidImage(_)));
    }

    #[test]
    fn unknown_resolution_key_keeps_size() {
        let src = RgbaImage::from_pixel(120, 60, WHITE);
        let out = hello_pipeline()
            .translate_image(&png_of(&src), "es", Some("not-a-device"))
            .unwrap();
        assert_eq!((out.width, out.height), (120, 60));
        let decoded = decode_image(&out.png).unwrap();
        assert_eq!(decoded.dimensions(), (120, 60));
    }

    #[test]
    fn resolution_key_resizes() {
        let src = RgbaImage::from_pixel(120, 60, WHITE);
        let out = hello_pipeline()
            .translate_image(&png_of(&src), "es", Some("iphone-15"))
            .unwrap();
        assert_eq!((out.width, out.height), (1290, 2796));
    }

    #[test]
    fn options_override_threshold() {
        let options = PipelineOptions {
            min_confidence: 0.1,
            ..PipelineOptions::default()
        };
        let pipeline = hello_pipeline().with_options(options);
        let src = RgbaImage::from_pixel(120, 60, WHITE);
        let out = pipeline.translate_raster(src, "es", None).unwrap();
        assert_eq!(out.regions.len(), 2);
        assert_eq!(out.fallbacks.len(), 1);
        assert!((pipeline.options().min_confidence - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn translate_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sign.png");
        RgbaImage::from_pixel(120, 60, WHITE).save(&input).unwrap();
        let output = dir.path().join("out").join("sign_es.png");

        let result = hello_pipeline().translate_file(&input, &output, "es", Some("hd"));
        assert!(result.success, "{}", result.message);
        assert_eq!(result.regions, 1);
        assert_eq!(result.fallbacks, 0);
        let saved = image::open(&output).unwrap();
        assert_eq!((saved.width(), saved.height()), (1920, 1080));
    }

    #[test]
    fn translate_file_reports_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"nope").unwrap();
        let result =
            hello_pipeline().translate_file(&input, &dir.path().join("o.png"), "es", None);
        assert!(!result.success);
        assert!(result.message.starts_with("Failed to load"));
    }

    #[test]
    fn save_rejects_unknown_extension() {
        let img = RgbaImage::new(2, 2);
        let err = save_image(&img, Path::new("/tmp/out.xyz")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn default_output_path_appends_language() {
        let p = default_output_path(Path::new("/tmp/menu.jpg"), "es");
        assert_eq!(p, PathBuf::from("/tmp/menu_es.png"));
    }
}

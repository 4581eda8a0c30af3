//! Error types for the image-text-translate crate.

/// Errors that abort a translation run.
///
/// Failures local to a single region (an untranslatable string, a
/// degenerate box) are handled inside the pipeline and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The uploaded bytes could not be decoded as an image.
    #[error("invalid image input: {0}")]
    InvalidImage(#[source] image::ImageError),

    /// The text detector failed to produce regions.
    #[error("text detector failed: {0}")]
    Detector(String),

    /// The font resource could not be read or parsed.
    #[error("font error: {0}")]
    Font(String),

    /// A detection or glossary file is malformed.
    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

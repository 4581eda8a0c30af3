//! Translator contract and per-region translation.
//!
//! Each region is translated independently. A failed or empty translation
//! falls back to the region's source text so one bad region never costs the
//! whole image.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::region::Region;

/// Recoverable failure translating one string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    /// The backend failed (network, quota, malformed response).
    #[error("translation backend error: {0}")]
    Backend(String),

    /// The backend has no translation for this input.
    #[error("no translation for {text:?} into {target}")]
    Untranslatable {
        /// Source text that could not be translated.
        text: String,
        /// Requested target language code.
        target: String,
    },
}

/// Maps source-language text to target-language text.
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` (may be `"auto"`) into `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`TranslateError`] the pipeline treats as a per-region
    /// fallback, never as a fatal error.
    fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> std::result::Result<String, TranslateError>;
}

/// Outcome of translating one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTranslation {
    /// Text to draw for the region.
    pub text: String,
    /// Set when `text` is the untranslated source because translation failed.
    pub fallback: Option<TranslateError>,
}

/// Translate every region, merging results by region index.
///
/// With the `parallel` feature the calls fan out over a rayon pool; results
/// come back in region order either way. Empty results are treated as
/// [`TranslateError::Untranslatable`].
pub fn translate_regions(
    translator: &dyn Translator,
    regions: &[Region],
    source: &str,
    target: &str,
) -> Vec<RegionTranslation> {
    let run = |region: &Region| translate_one(translator, region, source, target);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        regions.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        regions.iter().map(run).collect()
    }
}

fn translate_one(
    translator: &dyn Translator,
    region: &Region,
    source: &str,
    target: &str,
) -> RegionTranslation {
    let result = translator
        .translate(&region.text, source, target)
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(TranslateError::Untranslatable {
                    text: region.text.clone(),
                    target: target.to_string(),
                })
            } else {
                Ok(text)
            }
        });

    match result {
        Ok(text) => {
            tracing::debug!(source = %region.text, translated = %text, "region translated");
            RegionTranslation {
                text,
                fallback: None,
            }
        }
        Err(err) => {
            tracing::warn!(source = %region.text, error = %err, "keeping source text");
            RegionTranslation {
                text: region.text.clone(),
                fallback: Some(err),
            }
        }
    }
}

/// Translator backed by a fixed phrase table per target language.
///
/// Lookups try the exact source text first, then a case-insensitive match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct GlossaryTranslator {
    entries: HashMap<String, HashMap<String, String>>,
}

impl GlossaryTranslator {
    /// Create an empty glossary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phrase for `target`.
    #[must_use]
    pub fn with_entry(
        mut self,
        target: impl Into<String>,
        source_text: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        self.entries
            .entry(target.into())
            .or_default()
            .insert(source_text.into(), translation.into());
        self
    }

    /// Parse a glossary of the form `{ "es": { "HELLO": "HOLA" } }`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the document has another shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a glossary from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] or [`crate::Error::Json`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Translator for GlossaryTranslator {
    fn translate(
        &self,
        text: &str,
        _source: &str,
        target: &str,
    ) -> std::result::Result<String, TranslateError> {
        let untranslatable = || TranslateError::Untranslatable {
            text: text.to_string(),
            target: target.to_string(),
        };
        let table = self.entries.get(target).ok_or_else(untranslatable)?;
        if let Some(found) = table.get(text) {
            return Ok(found.clone());
        }
        let lowered = text.to_lowercase();
        table
            .iter()
            .find(|(k, _)| k.to_lowercase() == lowered)
            .map(|(_, v)| v.clone())
            .ok_or_else(untranslatable)
    }
}

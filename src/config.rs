//! Configuration for the extraction pipeline.
//!
//! Every knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The defaults (200 DPI renders, 2.0-unit
//! horizontal tolerance, the legacy `.doc` thresholds) suit uploads from
//! office users, so `PipelineConfig::default()` is what most callers want.

use crate::error::DocBlocksError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Lowest accepted render resolution.
pub const MIN_DPI: u32 = 72;
/// Highest accepted render resolution.
pub const MAX_DPI: u32 = 600;

/// Configuration for one or many `process` calls.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use docblocks::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .dpi(300)
///     .x_tolerance(1.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Resolution used when a PDF page without text is rasterised. Range: 72–600. Default: 200.
    pub dpi: u32,

    /// Horizontal tolerance (PDF units) when laying out page text. Default: 2.0.
    ///
    /// Two glyphs on the same line further apart than this get a space between
    /// them; closer glyphs are joined into one word.
    pub x_tolerance: f32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 10000.
    ///
    /// Applied after the DPI scaling so an oversized page (posters, plans)
    /// cannot allocate an unbounded bitmap. The other edge scales proportionally.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Legacy `.doc`: recovered text must be longer than this to count. Default: 20.
    pub min_text_chars: usize,

    /// Legacy `.doc`: word-like runs kept per container stream. Default: 2000.
    pub max_words_per_stream: usize,

    /// Legacy `.doc`: word-like runs kept across the whole document. Default: 5000.
    pub max_words_total: usize,

    /// Legacy `.doc`: an encoding is accepted once it yields more than this many tokens. Default: 10.
    pub min_encoding_tokens: usize,

    /// Optional per-document and per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            x_tolerance: 2.0,
            max_rendered_pixels: 10_000,
            password: None,
            min_text_chars: 20,
            max_words_per_stream: 2000,
            max_words_total: 5000,
            min_encoding_tokens: 10,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("dpi", &self.dpi)
            .field("x_tolerance", &self.x_tolerance)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("min_text_chars", &self.min_text_chars)
            .field("max_words_per_stream", &self.max_words_per_stream)
            .field("max_words_total", &self.max_words_total)
            .field("min_encoding_tokens", &self.min_encoding_tokens)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ProcessProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    /// Negative values are treated as zero.
    pub fn x_tolerance(mut self, tol: f32) -> Self {
        self.config.x_tolerance = tol.max(0.0);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn max_words_per_stream(mut self, n: usize) -> Self {
        self.config.max_words_per_stream = n.max(1);
        self
    }

    pub fn max_words_total(mut self, n: usize) -> Self {
        self.config.max_words_total = n.max(1);
        self
    }

    pub fn min_encoding_tokens(mut self, n: usize) -> Self {
        self.config.min_encoding_tokens = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocBlocksError> {
        let c = &self.config;
        if !(MIN_DPI..=MAX_DPI).contains(&c.dpi) {
            return Err(DocBlocksError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if !c.x_tolerance.is_finite() {
            return Err(DocBlocksError::InvalidConfig(
                "x_tolerance must be a finite number".into(),
            ));
        }
        if c.max_words_per_stream > c.max_words_total {
            return Err(DocBlocksError::InvalidConfig(format!(
                "max_words_per_stream ({}) exceeds max_words_total ({})",
                c.max_words_per_stream, c.max_words_total
            )));
        }
        Ok(self.config)
    }
}

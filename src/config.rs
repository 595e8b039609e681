//! Configuration for donation extraction.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across calls and to see at a glance which
//! normalization constants a deployment has tuned.
//!
//! # Design choice: builder over constructor
//! The image-normalization and batch knobs all have carefully chosen
//! defaults; the builder lets callers set only what they care about.

use crate::error::DonationError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the extraction credential.
///
/// Read at call time, not at startup; its absence is a recoverable
/// batch-level configuration error, never a crash.
pub const CREDENTIAL_ENV_VAR: &str = "OPENROUTER_API_KEY";

/// Default vision model, matching the provider the credential belongs to.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Configuration for one or more batch extraction calls.
///
/// Built via [`ExtractionConfig::builder()`] or
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use dvac_donations::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_pages(2)
///     .model("google/gemini-2.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum pages rendered per document. Default: 1.
    ///
    /// Donation receipts and cheques are almost always single-page; the
    /// first page carries the donor block. Raising this multiplies the
    /// image payload (and model cost) per document.
    pub max_pages: usize,

    /// Maximum documents per batch call. Default: 5.
    ///
    /// This bound encodes the calling protocol's response-time budget:
    /// rendering plus one model round-trip per document must fit inside the
    /// protocol's delivery window. Callers with a different timeout budget
    /// can tune it; the rejection message interpolates the configured value.
    pub max_batch_size: usize,

    /// Rendering resolution in DPI. Default: 150.
    ///
    /// 150 DPI is sufficient for the model to read typed and handwritten
    /// donor details and renders noticeably faster than 200.
    pub dpi: u32,

    /// Downscale target width in pixels. Default: 1000.
    ///
    /// Pages wider than this are downscaled (aspect preserved, Lanczos3)
    /// to bound the base64 payload per image. Pages already narrower are
    /// left alone — no upscaling.
    pub max_width: u32,

    /// JPEG quality factor for the normalized page. Default: 50.
    ///
    /// Readable but small: quality 50 keeps typed text legible to the
    /// vision model while cutting the payload to a fraction of quality-90
    /// output. Combined with grayscale conversion, a letter page lands
    /// around 60–120 KB.
    pub jpeg_quality: u8,

    /// Vision model identifier. Default: [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Provider name understood by `ProviderFactory` (e.g. "openrouter").
    /// If `None` along with `provider`, the openrouter credential is used.
    pub provider_name: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    ///
    /// This is the dependency-injection seam: tests and embedders hand in
    /// a provider directly and no ambient credential is consulted.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is on the page —
    /// exactly what field extraction wants.
    pub temperature: f32,

    /// Maximum tokens the model may generate per document. Default: 1024.
    ///
    /// A four-field JSON object fits in well under 200 tokens; 1024 leaves
    /// headroom for the occasional verbose reply without letting a
    /// runaway response block the batch.
    pub max_tokens: usize,

    /// Retry attempts on a transient provider failure. Default: 2.
    ///
    /// Set to 0 to surface the first failure immediately.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom extraction prompt. If `None`, the built-in prompt is used.
    ///
    /// The built-in prompt and the response parser are a matched pair;
    /// overrides must keep the bare-JSON-object output requirement.
    pub prompt: Option<String>,

    /// Download timeout for URL document references in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: 1,
            max_batch_size: 5,
            dpi: 150,
            max_width: 1000,
            jpeg_quality: 50,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 1024,
            max_retries: 2,
            retry_backoff_ms: 500,
            prompt: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_pages", &self.max_pages)
            .field("max_batch_size", &self.max_batch_size)
            .field("dpi", &self.dpi)
            .field("max_width", &self.max_width)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field(
                "provider",
                &self.provider.as_ref().map(|_| "<dyn LLMProvider>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to use, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config.max_batch_size = n.max(1);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_width(mut self, px: u32) -> Self {
        self.config.max_width = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, DonationError> {
        let c = &self.config;
        if c.max_batch_size == 0 {
            return Err(DonationError::InvalidConfig(
                "max_batch_size must be ≥ 1".into(),
            ));
        }
        if c.max_pages == 0 {
            return Err(DonationError::InvalidConfig("max_pages must be ≥ 1".into()));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(DonationError::InvalidConfig(format!(
                "jpeg_quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = ExtractionConfig::default();
        assert_eq!(c.max_pages, 1);
        assert_eq!(c.max_batch_size, 5);
        assert_eq!(c.dpi, 150);
        assert_eq!(c.max_width, 1000);
        assert_eq!(c.jpeg_quality, 50);
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_tokens, 1024);
        assert_eq!(c.model_or_default(), DEFAULT_MODEL);
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let c = ExtractionConfig::builder()
            .max_pages(0)
            .max_batch_size(0)
            .dpi(9999)
            .jpeg_quality(200)
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(c.max_pages, 1);
        assert_eq!(c.max_batch_size, 1);
        assert_eq!(c.dpi, 400);
        assert_eq!(c.jpeg_quality, 100);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_does_not_leak_provider() {
        let c = ExtractionConfig::default();
        let dbg = format!("{:?}", c);
        assert!(dbg.contains("max_batch_size"));
        assert!(dbg.contains("provider: None"));
    }
}

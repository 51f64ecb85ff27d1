//! Configuration for a metadata + TOC extraction run.
//!
//! All behaviour is controlled through [`TocConfig`], built via its
//! [`TocConfigBuilder`]. Keeping every knob in one struct makes it trivial to
//! share configs across tasks, log them, and diff two runs to understand why
//! their outputs differ.
//!
//! The API key never appears here: it is consumed by provider construction
//! (see [`crate::pipeline::infer`]) and carried inside the provider object,
//! so there is no ambient key state anywhere in the pipeline.

use crate::error::Pdf2TocError;
use crate::pipeline::infer::PageExtractor;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for one extraction pipeline run.
///
/// Built via [`TocConfig::builder()`] or [`TocConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2toc::TocConfig;
///
/// let config = TocConfig::builder()
///     .window_size(5)
///     .max_pages(20)
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TocConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 150.
    ///
    /// 150 DPI keeps contents-page text sharp enough for a VLM to read page
    /// numbers reliably while staying well under API upload limits.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of DPI so an oversized page can never exhaust
    /// memory; the other dimension scales proportionally.
    pub max_rendered_pixels: u32,

    /// How many pages from the front of the document to analyse. Default: 20.
    ///
    /// A table of contents almost always sits in the front matter. Twenty
    /// pages cover title page, copyright page, and multi-page contents
    /// listings for the vast majority of books while bounding render and
    /// inference cost.
    pub max_pages: usize,

    /// Number of consecutive pages per discovery window. Default: 5.
    ///
    /// Each window becomes one extraction invocation. Five pages fit
    /// comfortably in a single multimodal request and keep a contents listing
    /// that spans a page boundary inside at most two windows.
    pub window_size: usize,

    /// Number of concurrent discovery invocations. Default: 8.
    ///
    /// The discovery pass is network-bound; issuing windows concurrently cuts
    /// wall-clock time roughly by this factor. Lower it if the provider
    /// rate-limits you.
    pub concurrency: usize,

    /// Model used for the broad discovery pass. Default: "gemini-2.5-flash".
    ///
    /// Discovery only has to notice *whether* a window holds contents-style
    /// entries, so a fast, cheap model is the right trade.
    pub discovery_model: String,

    /// Model used for the focused verification pass. Default: "gemini-2.5-pro".
    ///
    /// The verification result is authoritative, so it gets the
    /// higher-fidelity configuration: a stronger model over only the
    /// candidate pages.
    pub verification_model: String,

    /// LLM provider name (e.g. "gemini", "openai"). If None along with
    /// `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed provider used for **both** passes. Takes precedence
    /// over `provider_name`. Useful when the caller needs custom middleware
    /// (caching, rate-limiting) or a single-model setup.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed extraction capability. Takes precedence over every
    /// provider field. This is the seam tests use to script capability
    /// behaviour without any network access.
    pub extractor: Option<Arc<dyn PageExtractor>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Near-zero keeps the model faithful to what is printed on the page —
    /// exactly what you want when transcribing a contents listing.
    pub temperature: f32,

    /// Maximum tokens the model may generate per invocation. Default: 8192.
    ///
    /// A dense contents listing can run past a hundred entries; truncating
    /// mid-array makes the whole response unparseable.
    pub max_tokens: usize,

    /// Total attempts per capability invocation (first try included). Default: 3.
    ///
    /// Transient failures are retried until this budget is spent, after which
    /// the invocation settles as exhausted. Fatal failures never consume more
    /// than one attempt.
    pub max_attempts: u32,

    /// Base retry delay in milliseconds (exponential backoff). Default: 1000.
    ///
    /// The wait before retry n is `retry_backoff_ms · 2^(n−1)`: 1 s, then
    /// 2 s. Exponential backoff avoids a thundering herd when several windows
    /// hit an overloaded endpoint at once.
    pub retry_backoff_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom extraction prompt. If None, uses
    /// [`crate::prompts::DEFAULT_EXTRACTION_PROMPT`].
    pub extraction_prompt: Option<String>,

    /// Progress callback for stage and window events.
    pub progress_callback: Option<ProgressCallback>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-invocation API timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional deadline for the whole run in seconds. Default: None.
    ///
    /// When it expires every in-flight invocation is cancelled and the run
    /// fails with [`Pdf2TocError::PipelineTimeout`]; rendered page images are
    /// released on every exit path.
    pub pipeline_timeout_secs: Option<u64>,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            max_pages: 20,
            window_size: 5,
            concurrency: 8,
            discovery_model: "gemini-2.5-flash".to_string(),
            verification_model: "gemini-2.5-pro".to_string(),
            provider_name: None,
            provider: None,
            extractor: None,
            temperature: 0.1,
            max_tokens: 8192,
            max_attempts: 3,
            retry_backoff_ms: 1000,
            password: None,
            extraction_prompt: None,
            progress_callback: None,
            download_timeout_secs: 120,
            api_timeout_secs: 120,
            pipeline_timeout_secs: None,
        }
    }
}

impl fmt::Debug for TocConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TocConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("max_pages", &self.max_pages)
            .field("window_size", &self.window_size)
            .field("concurrency", &self.concurrency)
            .field("discovery_model", &self.discovery_model)
            .field("verification_model", &self.verification_model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn PageExtractor>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("pipeline_timeout_secs", &self.pipeline_timeout_secs)
            .finish()
    }
}

impl TocConfig {
    /// Create a new builder for `TocConfig`.
    pub fn builder() -> TocConfigBuilder {
        TocConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TocConfig`].
#[derive(Debug)]
pub struct TocConfigBuilder {
    config: TocConfig,
}

impl TocConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn window_size(mut self, n: usize) -> Self {
        self.config.window_size = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn discovery_model(mut self, model: impl Into<String>) -> Self {
        self.config.discovery_model = model.into();
        self
    }

    pub fn verification_model(mut self, model: impl Into<String>) -> Self {
        self.config.verification_model = model.into();
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

    pub fn extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.config.extractor = Some(extractor);
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

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pipeline_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pipeline_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TocConfig, Pdf2TocError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2TocError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.window_size == 0 {
            return Err(Pdf2TocError::InvalidConfig(
                "Window size must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Pdf2TocError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(Pdf2TocError::InvalidConfig(
                "Attempt budget must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

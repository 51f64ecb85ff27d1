//! The structured-inference capability boundary.
//!
//! Everything the pipeline knows about "asking a model to read pages" lives
//! behind [`PageExtractor`]: a set of encoded page images and a pass marker
//! go in, a validated [`ExtractionResult`] or a classified
//! [`ExtractionFailure`] comes out. The retry, dispatch, and verification
//! stages never see providers, prompts, or HTTP — which is also what lets
//! tests script the capability without any network access.
//!
//! [`VlmExtractor`] is the production implementation: one
//! `edgequake_llm::LLMProvider` per pass (the discovery pass runs a fast
//! model, the verification pass a stronger one), a shared prompt, and
//! provider errors classified by message into `Transient`/`Fatal`.

use crate::config::TocConfig;
use crate::error::{ExtractionFailure, Pdf2TocError};
use crate::pipeline::encode::EncodedPage;
use crate::pipeline::parse;
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use crate::schema::ExtractionResult;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Which of the two passes an invocation belongs to.
///
/// The pass selects the inference configuration, not the instructions: the
/// verification pass runs the higher-fidelity model over only the candidate
/// pages, with the same prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Discovery,
    Verification,
}

impl Pass {
    pub fn label(&self) -> &'static str {
        match self {
            Pass::Discovery => "discovery",
            Pass::Verification => "verification",
        }
    }
}

/// The opaque extraction capability.
///
/// Implementations must be `Send + Sync`; discovery windows call `extract`
/// concurrently. The returned future borrows the page slice, so callers keep
/// the encoded pages alive across the call — which the pipeline's scoped
/// ownership guarantees.
pub trait PageExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        pages: &'a [EncodedPage],
        pass: Pass,
    ) -> BoxFuture<'a, Result<ExtractionResult, ExtractionFailure>>;
}

/// Production capability: vision-language models behind `edgequake-llm`.
pub struct VlmExtractor {
    discovery: Arc<dyn LLMProvider>,
    verification: Arc<dyn LLMProvider>,
    prompt: String,
    temperature: f32,
    max_tokens: usize,
    api_timeout: Duration,
}

impl VlmExtractor {
    /// Build the extractor from config, resolving providers most-specific
    /// first:
    ///
    /// 1. **Pre-built provider** (`config.provider`) — used for both passes
    ///    as-is; the caller owns model choice and middleware.
    /// 2. **Named provider** (`config.provider_name`) — one provider per
    ///    pass, instantiated with that pass's model; the factory reads the
    ///    matching API key from the environment.
    /// 3. **`PDF2TOC_LLM_PROVIDER` env var** — same as (2) but chosen at the
    ///    execution-environment level (Makefile, CI).
    /// 4. **Gemini key present** — the default models are Gemini's
    ///    flash/pro pair, so a `GEMINI_API_KEY` alone is enough.
    /// 5. **Full auto-detection** (`ProviderFactory::from_env`).
    ///
    /// The API key is consumed here, at construction, and never read again.
    pub fn from_config(config: &TocConfig) -> Result<Self, Pdf2TocError> {
        let (discovery, verification) = resolve_providers(config)?;
        Ok(Self {
            discovery,
            verification,
            prompt: config
                .extraction_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTRACTION_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_timeout: Duration::from_secs(config.api_timeout_secs),
        })
    }
}

impl PageExtractor for VlmExtractor {
    fn extract<'a>(
        &'a self,
        pages: &'a [EncodedPage],
        pass: Pass,
    ) -> BoxFuture<'a, Result<ExtractionResult, ExtractionFailure>> {
        Box::pin(async move {
            let provider = match pass {
                Pass::Discovery => &self.discovery,
                Pass::Verification => &self.verification,
            };

            debug!("{} call over {} pages", pass.label(), pages.len());

            let images: Vec<ImageData> = pages.iter().map(|p| p.data.clone()).collect();
            let messages = vec![
                ChatMessage::system(self.prompt.clone()),
                // VLM APIs require at least one user turn; the images carry
                // all the actual content.
                ChatMessage::user_with_images("", images),
            ];
            let options = CompletionOptions {
                temperature: Some(self.temperature),
                max_tokens: Some(self.max_tokens),
                ..Default::default()
            };

            // A hung connection must become a retryable failure, not a stuck
            // window.
            let response =
                match timeout(self.api_timeout, provider.chat(&messages, Some(&options))).await {
                    Ok(result) => {
                        result.map_err(|e| ExtractionFailure::classify(format!("{}", e)))?
                    }
                    Err(_) => {
                        return Err(ExtractionFailure::Transient(format!(
                            "{} call timed out after {:?}",
                            pass.label(),
                            self.api_timeout
                        )))
                    }
                };

            debug!(
                "{} call: {} input tokens, {} output tokens",
                pass.label(),
                response.prompt_tokens,
                response.completion_tokens
            );

            parse::parse_extraction(&response.content)
        })
    }
}

/// Resolve one provider per pass from the config.
fn resolve_providers(
    config: &TocConfig,
) -> Result<(Arc<dyn LLMProvider>, Arc<dyn LLMProvider>), Pdf2TocError> {
    // 1) A caller-supplied provider serves both passes.
    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), Arc::clone(provider)));
    }

    // 2) Named provider, one instance per pass model.
    if let Some(ref name) = config.provider_name {
        return Ok((
            create_provider(name, &config.discovery_model)?,
            create_provider(name, &config.verification_model)?,
        ));
    }

    // 3) Provider chosen by the execution environment.
    if let Ok(name) = std::env::var("PDF2TOC_LLM_PROVIDER") {
        if !name.is_empty() {
            return Ok((
                create_provider(&name, &config.discovery_model)?,
                create_provider(&name, &config.verification_model)?,
            ));
        }
    }

    // 4) The default model pair is Gemini's, so a Gemini key alone suffices.
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return Ok((
                create_provider("gemini", &config.discovery_model)?,
                create_provider("gemini", &config.verification_model)?,
            ));
        }
    }

    // 5) Let the factory scan all known key variables.
    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2TocError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    Ok((Arc::clone(&provider), provider))
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2TocError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        Pdf2TocError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

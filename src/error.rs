//! Error types for the pdf2toc library.
//!
//! Failures live at two levels:
//!
//! * [`Pdf2TocError`] — **Fatal to the run**: the pipeline cannot produce a
//!   record at all (unreadable input, no provider configured, the
//!   verification pass gave up). Returned as `Err(Pdf2TocError)` from the
//!   top-level `extract_toc*` functions.
//!
//! * [`ExtractionFailure`] — a single capability invocation failed. The
//!   retry layer classifies these into `Transient` (retried with backoff)
//!   and `Fatal` (surfaced immediately). During the discovery pass an
//!   invocation that stays failed is recorded as a per-window marker and the
//!   other windows continue; only the verification pass promotes it to a
//!   [`Pdf2TocError`].
//!
//! Note what is *not* an error: a discovery pass that finds no TOC-bearing
//! pages is a valid terminal outcome, reported as
//! [`crate::output::TocOutcome::NoTocFound`] rather than through this module.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2toc library.
#[derive(Debug, Error)]
pub enum Pdf2TocError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Render errors ─────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium returned an error while rasterising or encoding a page.
    ///
    /// Page indices must stay contiguous for the chunking stage, so a single
    /// unrenderable page aborts the run rather than being skipped.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The verification pass failed after all retries or with a
    /// non-retryable error.
    ///
    /// Deliberately distinct from the no-candidates outcome: candidates were
    /// found but the authoritative pass could not be completed, and the
    /// pipeline never falls back to discovery-stage entries.
    #[error("Verification pass failed ({kind}): {detail}")]
    VerificationFailed { kind: FailureKind, detail: String },

    /// The whole run exceeded the configured deadline.
    ///
    /// All in-flight capability calls are cancelled when this fires.
    #[error("Extraction timed out after {secs}s\nIncrease --timeout or reduce --max-pages.")]
    PipelineTimeout { secs: u64 },

    // ── Reconciliation boundary ───────────────────────────────────────────
    /// A reconciled TOC from the external heading-matching service violated
    /// its acceptance invariants.
    #[error("Rejected reconciled TOC: {reason}")]
    InvalidReconciliation { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the verification pass (or any retry-wrapped call) ultimately failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    /// Transient failures persisted through every allowed attempt.
    Exhausted,
    /// A non-retryable failure (authorization, malformed response).
    Fatal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Exhausted => write!(f, "retries exhausted"),
            FailureKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// A single failed invocation of the extraction capability.
///
/// The classification decides the retry behaviour:
///
/// * `Transient` — timeout, temporary overload or unavailability. Worth
///   retrying with backoff; the provider usually recovers within seconds.
/// * `Fatal` — authorization failure or a response the capability cannot
///   fulfil (including unparseable output). Retrying cannot help, so the
///   failure propagates immediately.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ExtractionFailure {
    /// Retryable: timeout, 429/503, temporary overload.
    #[error("transient extraction failure: {0}")]
    Transient(String),

    /// Non-retryable: auth error, schema violation, unparseable response.
    #[error("fatal extraction failure: {0}")]
    Fatal(String),
}

impl ExtractionFailure {
    /// Classify a provider error message into a failure class.
    ///
    /// Matches the markers the upstream APIs actually emit for recoverable
    /// conditions (HTTP status words, gRPC deadline phrasing). Anything
    /// unrecognised is treated as fatal — retrying a 401 only burns quota.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        const TRANSIENT_MARKERS: &[&str] = &[
            "timeout",
            "timed out",
            "deadline exceeded",
            "429",
            "503",
            "overloaded",
            "unavailable",
            "rate limit",
            "too many requests",
            "connection reset",
        ];
        if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
            ExtractionFailure::Transient(message)
        } else {
            ExtractionFailure::Fatal(message)
        }
    }

    /// Whether the retry layer may attempt this call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractionFailure::Transient(_))
    }

    /// The underlying message, regardless of class.
    pub fn message(&self) -> &str {
        match self {
            ExtractionFailure::Transient(m) | ExtractionFailure::Fatal(m) => m,
        }
    }
}

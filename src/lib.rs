//! # pdf2toc
//!
//! Extract book metadata and a verified table of contents from PDF documents
//! using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Embedded PDF outlines are absent or wrong in most scanned and
//! print-replica books, and text-layer heuristics drown in front-matter
//! noise. Instead this crate rasterises the front pages and lets a VLM read
//! them as a human would, then cross-checks itself: a broad, cheap pass
//! locates the contents pages, and a focused, higher-fidelity pass over just
//! those pages produces the authoritative listing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input       resolve local file or download from URL
//!  ├─ 2. Render      rasterise front pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode      PNG → base64 ImageData
//!  ├─ 4. Discovery   concurrent windowed VLM calls locate TOC-bearing pages
//!  ├─ 5. Verify      one higher-fidelity VLM call over the candidate pages
//!  └─ 6. Consolidate best discovery metadata + authoritative sorted TOC
//! ```
//!
//! Per-window failures in the discovery pass are isolated — a window that
//! exhausts its retries contributes nothing, and the rest of the pass
//! continues. A document where discovery finds no contents pages is a valid
//! outcome ([`TocOutcome::NoTocFound`]), not an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2toc::{extract_toc, TocConfig, TocOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = TocConfig::default();
//!     let report = extract_toc("book.pdf", &config).await?;
//!     match report.outcome {
//!         TocOutcome::Toc(record) => {
//!             for entry in &record.toc_entries {
//!                 println!("{:>4}  {}", entry.page_number, entry.chapter_title);
//!             }
//!         }
//!         TocOutcome::NoTocFound => eprintln!("no table of contents located"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2toc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2toc = { version = "0.3", default-features = false }
//! ```
//!
//! ## Choosing Models
//!
//! The discovery pass only decides *whether* a window holds contents-style
//! entries, so it runs a fast model (default `gemini-2.5-flash`). The
//! verification pass produces the record the caller keeps, so it runs a
//! stronger one (default `gemini-2.5-pro`). Both are configurable per
//! [`TocConfig`]; a 20-page front matter costs a few cents at the defaults.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod reconcile;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{TocConfig, TocConfigBuilder};
pub use error::{ExtractionFailure, FailureKind, Pdf2TocError};
pub use extract::{
    extract_toc, extract_toc_from_bytes, extract_toc_from_pages, extract_toc_sync, inspect,
};
pub use output::{ConsolidatedToc, PdfInfo, RunStats, TocOutcome, TocReport, TocResponse};
pub use pipeline::encode::EncodedPage;
pub use pipeline::infer::{PageExtractor, Pass};
pub use progress::{NoopProgress, ProgressCallback, TocProgressCallback};
pub use reconcile::{HeadingReconciler, NoisyHeading, ReconciledEntry};
pub use schema::{BookMetadata, ExtractionResult, TocEntry};

//! Output types: the consolidated record, run statistics, and the
//! process-boundary JSON shape.
//!
//! A run that completes has one of two terminal outcomes, both modelled as
//! values rather than errors:
//!
//! * [`TocOutcome::Toc`] — a consolidated record was produced (its TOC may
//!   legally be empty: the verification pass is authoritative even when it
//!   returns no entries for a non-empty candidate set).
//! * [`TocOutcome::NoTocFound`] — the discovery pass flagged no pages, so
//!   the verification pass was never invoked.
//!
//! Genuine failures (render errors, verification abort) travel through
//! [`crate::error::Pdf2TocError`] instead.

use crate::schema::{BookMetadata, TocEntry};
use serde::{Deserialize, Serialize};

/// Terminal outcome of a completed pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TocOutcome {
    /// Metadata and the authoritative, page-sorted TOC.
    Toc(ConsolidatedToc),
    /// Discovery located no TOC-bearing pages; not an error.
    NoTocFound,
}

impl TocOutcome {
    /// The consolidated record, if one was produced.
    pub fn record(&self) -> Option<&ConsolidatedToc> {
        match self {
            TocOutcome::Toc(record) => Some(record),
            TocOutcome::NoTocFound => None,
        }
    }
}

/// The final consolidated record.
///
/// Metadata comes from the best discovery-pass observation; the entries come
/// from the verification pass unmodified except for a stable ascending sort
/// by page number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedToc {
    /// Best metadata across all discovery windows.
    pub metadata: BookMetadata,
    /// Authoritative entries, sorted ascending by `page_number`.
    pub toc_entries: Vec<TocEntry>,
}

/// A completed run: outcome plus statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocReport {
    pub outcome: TocOutcome,
    pub stats: RunStats,
}

/// Statistics about one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages rendered and analysed (bounded by `max_pages`).
    pub pages_rendered: usize,
    /// Discovery windows dispatched.
    pub windows_dispatched: usize,
    /// Windows whose result contained at least one TOC entry.
    pub windows_with_toc: usize,
    /// Windows that exhausted their retry budget.
    pub windows_exhausted: usize,
    /// Windows that failed fatally (never retried).
    pub windows_failed: usize,
    /// Size of the candidate page set handed to verification.
    pub candidate_pages: usize,
    /// Wall-clock time spent rasterising pages.
    pub render_duration_ms: u64,
    /// Wall-clock time of the discovery fan-out (first window start to last
    /// window settled).
    pub discovery_duration_ms: u64,
    /// Wall-clock time of the single verification invocation.
    pub verification_duration_ms: u64,
    /// Total run time.
    pub total_duration_ms: u64,
}

/// Document facts readable without any inference call.
///
/// Returned by [`crate::extract::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// The process-boundary response shape.
///
/// `{book_title, authors, toc}` with explicit placeholder values when
/// metadata was never observed, matching what downstream consumers of the
/// original service already parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocResponse {
    pub book_title: String,
    pub authors: Vec<String>,
    pub toc: Vec<TocEntry>,
}

impl From<&ConsolidatedToc> for TocResponse {
    fn from(record: &ConsolidatedToc) -> Self {
        TocResponse {
            book_title: record
                .metadata
                .book_title
                .clone()
                .unwrap_or_else(|| "Unknown Title".to_string()),
            authors: record
                .metadata
                .authors
                .clone()
                .unwrap_or_else(|| vec!["Unknown Author".to_string()]),
            toc: record.toc_entries.clone(),
        }
    }
}

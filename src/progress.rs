//! Progress-callback trait for pipeline stage and window events.
//!
//! Inject an `Arc<dyn TocProgressCallback>` via
//! [`crate::config::TocConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline renders pages, settles discovery
//! windows, and runs verification.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a broadcast channel, a WebSocket, or a terminal progress
//! bar without the library knowing how the host application communicates.
//! The trait is `Send + Sync` because discovery windows settle concurrently.

use std::sync::Arc;

/// Called by the pipeline as stages progress.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_window_complete` and `on_window_error` may be
/// called concurrently from different tasks; implementations must guard
/// shared mutable state accordingly.
pub trait TocProgressCallback: Send + Sync {
    /// Called once after rendering, before the discovery fan-out.
    ///
    /// # Arguments
    /// * `pages`   — number of page images entering the pipeline
    /// * `windows` — number of discovery windows that will be dispatched
    fn on_discovery_start(&self, pages: usize, windows: usize) {
        let _ = (pages, windows);
    }

    /// Called when a discovery window settles successfully.
    ///
    /// # Arguments
    /// * `window`  — 0-based window index
    /// * `windows` — total window count
    /// * `entries` — TOC entries the window's result contained
    fn on_window_complete(&self, window: usize, windows: usize, entries: usize) {
        let _ = (window, windows, entries);
    }

    /// Called when a discovery window settles as exhausted or failed.
    fn on_window_error(&self, window: usize, windows: usize, error: &str) {
        let _ = (window, windows, error);
    }

    /// Called once before the verification invocation.
    ///
    /// # Arguments
    /// * `candidate_pages` — size of the candidate page set
    fn on_verification_start(&self, candidate_pages: usize) {
        let _ = candidate_pages;
    }

    /// Called once when the run reaches a terminal outcome.
    ///
    /// # Arguments
    /// * `entries` — entries in the final record, or `None` when no TOC was
    ///   located
    fn on_complete(&self, entries: Option<usize>) {
        let _ = entries;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl TocProgressCallback for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::TocConfig`].
pub type ProgressCallback = Arc<dyn TocProgressCallback>;

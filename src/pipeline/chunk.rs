//! Window partitioning and concurrent discovery dispatch.
//!
//! The discovery pass fans one extraction invocation out per window of
//! consecutive pages and fans back in once **every** window has settled —
//! an explicit barrier, because the candidate page set can only be computed
//! from the complete picture. Windows settle in arbitrary order over the
//! network; results are re-keyed by window index on collection so downstream
//! stages always see chunk order.
//!
//! A window whose invocation gives up does not take its siblings with it:
//! exhausted retries and fatal responses become per-window markers and the
//! dispatch as a whole still succeeds.

use crate::config::TocConfig;
use crate::pipeline::encode::EncodedPage;
use crate::pipeline::infer::{PageExtractor, Pass};
use crate::pipeline::retry::{RetryError, RetryPolicy};
use crate::schema::ExtractionResult;
use futures::stream::{self, StreamExt};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// One contiguous window of page indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// 0-based window index; also the chunk-processing order used for
    /// metadata tie-breaking.
    pub index: usize,
    /// First page index covered (inclusive).
    pub start: usize,
    /// One past the last page index covered.
    pub end: usize,
}

impl Window {
    /// Page indices covered by this window.
    pub fn pages(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// How one window's invocation settled.
#[derive(Debug, Clone)]
pub enum WindowOutcome {
    /// The invocation succeeded (its entry list may still be empty).
    Extracted(ExtractionResult),
    /// Transient failures persisted through the whole retry budget.
    Exhausted { attempts: u32, last_error: String },
    /// A non-retryable failure; never retried.
    Failed { detail: String },
}

impl WindowOutcome {
    /// The extraction result, if the invocation succeeded.
    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            WindowOutcome::Extracted(result) => Some(result),
            _ => None,
        }
    }
}

/// Partition `total_pages` pages into ⌈total/size⌉ contiguous windows.
///
/// Window `i` covers `[i·size, min((i+1)·size, total))`; every page index
/// lands in exactly one window and global order is preserved. Zero pages
/// yield zero windows.
pub fn partition(total_pages: usize, window_size: usize) -> Vec<Window> {
    debug_assert!(window_size >= 1);
    (0..total_pages)
        .step_by(window_size)
        .enumerate()
        .map(|(index, start)| Window {
            index,
            start,
            end: (start + window_size).min(total_pages),
        })
        .collect()
}

/// Dispatch one discovery invocation per window, concurrently.
///
/// Returns after every window has settled, with outcomes ordered by window
/// index. The parallelism bound comes from `config.concurrency`.
pub async fn dispatch(
    extractor: &Arc<dyn PageExtractor>,
    pages: &[EncodedPage],
    config: &TocConfig,
) -> Vec<(Window, WindowOutcome)> {
    let windows = partition(pages.len(), config.window_size);
    let total_windows = windows.len();
    let policy = RetryPolicy::from_config(config);

    debug!(
        "Dispatching {} windows of ≤{} pages ({} concurrent)",
        total_windows, config.window_size, config.concurrency
    );

    let mut settled: Vec<(Window, WindowOutcome)> = stream::iter(windows.into_iter().map(|window| {
        let extractor = Arc::clone(extractor);
        let progress = config.progress_callback.clone();
        async move {
            let slice = &pages[window.start..window.end];
            let label = format!("window {}", window.index);

            let outcome = match policy
                .run(&label, || extractor.extract(slice, Pass::Discovery))
                .await
            {
                Ok(result) => {
                    if let Some(ref cb) = progress {
                        cb.on_window_complete(window.index, total_windows, result.toc_entries.len());
                    }
                    WindowOutcome::Extracted(result)
                }
                Err(RetryError::Exhausted { attempts, last_error }) => {
                    if let Some(ref cb) = progress {
                        cb.on_window_error(window.index, total_windows, &last_error);
                    }
                    WindowOutcome::Exhausted { attempts, last_error }
                }
                Err(RetryError::Fatal { detail }) => {
                    if let Some(ref cb) = progress {
                        cb.on_window_error(window.index, total_windows, &detail);
                    }
                    WindowOutcome::Failed { detail }
                }
            };

            (window, outcome)
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Fan-in: windows completed in network order; re-key by window index.
    settled.sort_by_key(|(window, _)| window.index);
    settled
}

//! Top-level extraction entry points.
//!
//! [`extract_toc`] runs the whole pipeline: resolve the input, rasterise the
//! front pages, fan the discovery pass out over page windows, aggregate the
//! candidate page set, run the authoritative verification pass, and
//! consolidate the final record. The two network passes are explicit
//! asynchronous stages with a join point between them — discovery must fully
//! settle before verification sees the candidate set.
//!
//! Resource lifetimes are scoped to the run: rendered page images live in
//! the run future and are dropped on every exit path, including cancellation
//! (dropping the returned future, or the optional whole-run deadline firing,
//! cancels all in-flight capability calls). Nothing is shared across runs,
//! so any number of runs may execute concurrently.

use crate::config::TocConfig;
use crate::error::Pdf2TocError;
use crate::output::{PdfInfo, RunStats, TocOutcome, TocReport};
use crate::pipeline::encode::{self, EncodedPage};
use crate::pipeline::infer::{PageExtractor, VlmExtractor};
use crate::pipeline::{chunk, consolidate, discovery, input, render, verify};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::{debug, info};

/// Extract book metadata and a verified TOC from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — local file path or HTTP/HTTPS URL to a PDF
/// * `config`    — extraction configuration
///
/// # Returns
/// `Ok(TocReport)` whose outcome is either a consolidated record or the
/// explicit [`TocOutcome::NoTocFound`] terminal state.
///
/// # Errors
/// Returns `Err(Pdf2TocError)` only for fatal failures: unreadable input,
/// render errors, no provider configured, a failed verification pass, or
/// the whole-run deadline expiring.
pub async fn extract_toc(
    input_str: impl AsRef<str>,
    config: &TocConfig,
) -> Result<TocReport, Pdf2TocError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting TOC extraction: {}", input_str);

    let source = input::resolve(input_str, config.download_timeout_secs).await?;
    let extractor = resolve_extractor(config)?;

    let run = async {
        let mut stats = RunStats::default();

        let render_start = Instant::now();
        let rendered = render::render_pages(source.path(), config).await?;
        stats.pages_rendered = rendered.len();
        stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
        info!(
            "Rendered {} pages in {}ms",
            stats.pages_rendered, stats.render_duration_ms
        );

        let pages = encode::encode_pages(&rendered)?;
        // The raw bitmaps are no longer needed once encoded.
        drop(rendered);

        let outcome = run_two_pass(&extractor, &pages, config, &mut stats).await?;
        Ok::<_, Pdf2TocError>(TocReport { outcome, stats })
    };

    let mut report = match config.pipeline_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
            .await
            .map_err(|_| Pdf2TocError::PipelineTimeout { secs })??,
        None => run.await?,
    };

    report.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Extraction complete in {}ms: {}",
        report.stats.total_duration_ms,
        match &report.outcome {
            TocOutcome::Toc(record) => format!("{} entries", record.toc_entries.len()),
            TocOutcome::NoTocFound => "no TOC located".to_string(),
        }
    );

    Ok(report)
}

/// Extract from PDF bytes in memory.
///
/// Avoids the need for the caller to manage a file: `bytes` are written to a
/// managed [`tempfile`] that is cleaned up on return or panic. This is the
/// natural entry point when the PDF arrives from an upload or a database
/// rather than a path on disk.
pub async fn extract_toc_from_bytes(
    bytes: &[u8],
    config: &TocConfig,
) -> Result<TocReport, Pdf2TocError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2TocError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2TocError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract_toc` returns.
    extract_toc(&path, config).await
}

/// Run the two network passes over already-encoded pages.
///
/// This skips input resolution and rendering, which makes it the seam for
/// callers that bring their own page images — and for tests, which pair it
/// with a scripted [`PageExtractor`] via [`TocConfig::extractor`].
pub async fn extract_toc_from_pages(
    pages: Vec<EncodedPage>,
    config: &TocConfig,
) -> Result<TocReport, Pdf2TocError> {
    let total_start = Instant::now();
    let extractor = resolve_extractor(config)?;

    let run = async {
        let mut stats = RunStats::default();
        stats.pages_rendered = pages.len();
        let outcome = run_two_pass(&extractor, &pages, config, &mut stats).await?;
        Ok::<_, Pdf2TocError>(TocReport { outcome, stats })
    };

    let mut report = match config.pipeline_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
            .await
            .map_err(|_| Pdf2TocError::PipelineTimeout { secs })??,
        None => run.await?,
    };

    report.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(report)
}

/// Synchronous wrapper around [`extract_toc`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_toc_sync(
    input_str: impl AsRef<str>,
    config: &TocConfig,
) -> Result<TocReport, Pdf2TocError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TocError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_toc(input_str, config))
}

/// Read document metadata and page count without any inference call.
///
/// Does not require a provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<PdfInfo, Pdf2TocError> {
    let source = input::resolve(input_str.as_ref(), 120).await?;
    render::read_pdf_info(source.path(), None).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Discovery fan-out → candidate aggregation → verification → consolidation.
async fn run_two_pass(
    extractor: &Arc<dyn PageExtractor>,
    pages: &[EncodedPage],
    config: &TocConfig,
    stats: &mut RunStats,
) -> Result<TocOutcome, Pdf2TocError> {
    let window_count = pages.len().div_ceil(config.window_size);
    if let Some(ref cb) = config.progress_callback {
        cb.on_discovery_start(pages.len(), window_count);
    }

    // ── Pass 1: discovery fan-out, settles every window ──────────────────
    let discovery_start = Instant::now();
    let settled = chunk::dispatch(extractor, pages, config).await;
    stats.discovery_duration_ms = discovery_start.elapsed().as_millis() as u64;
    stats.windows_dispatched = settled.len();
    for (_, outcome) in &settled {
        match outcome {
            chunk::WindowOutcome::Extracted(result) if result.has_entries() => {
                stats.windows_with_toc += 1
            }
            chunk::WindowOutcome::Extracted(_) => {}
            chunk::WindowOutcome::Exhausted { .. } => stats.windows_exhausted += 1,
            chunk::WindowOutcome::Failed { .. } => stats.windows_failed += 1,
        }
    }
    debug!(
        "Discovery settled: {} windows, {} with TOC, {} exhausted, {} failed",
        stats.windows_dispatched,
        stats.windows_with_toc,
        stats.windows_exhausted,
        stats.windows_failed
    );

    // ── Candidate aggregation ────────────────────────────────────────────
    let candidates = discovery::candidate_pages(&settled);
    stats.candidate_pages = candidates.len();

    if candidates.is_empty() {
        info!("Discovery pass found no TOC-bearing pages");
        if let Some(ref cb) = config.progress_callback {
            cb.on_complete(None);
        }
        return Ok(TocOutcome::NoTocFound);
    }
    info!("Discovery flagged {} candidate pages", candidates.len());

    // ── Pass 2: single authoritative verification invocation ─────────────
    let verify_start = Instant::now();
    let authoritative = verify::verify(extractor, pages, &candidates, config).await?;
    stats.verification_duration_ms = verify_start.elapsed().as_millis() as u64;

    // ── Consolidation ────────────────────────────────────────────────────
    let discovery_results = discovery::successful_results(&settled);
    let record = consolidate::consolidate(&discovery_results, authoritative);

    if let Some(ref cb) = config.progress_callback {
        cb.on_complete(Some(record.toc_entries.len()));
    }
    Ok(TocOutcome::Toc(record))
}

/// Resolve the extraction capability, most-specific first.
fn resolve_extractor(config: &TocConfig) -> Result<Arc<dyn PageExtractor>, Pdf2TocError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }
    Ok(Arc::new(VlmExtractor::from_config(config)?))
}

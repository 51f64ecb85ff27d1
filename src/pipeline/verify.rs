//! The verification pass: one authoritative invocation over the candidates.
//!
//! Discovery answers "where might the TOC be"; this pass answers "what does
//! it say". It selects exactly the candidate pages (already ascending and
//! unique by construction of the candidate set), issues a single invocation
//! at the higher-fidelity configuration, and returns its result — whose
//! entry list is authoritative for the final record **even when empty**.
//!
//! There is no fallback: if this pass exhausts its retries or fails fatally
//! the run aborts with a failure distinguishable from "no candidates found".
//! Silently substituting discovery-stage entries would hand the caller data
//! the stronger pass was specifically asked to replace.

use crate::config::TocConfig;
use crate::error::Pdf2TocError;
use crate::pipeline::discovery::CandidatePageSet;
use crate::pipeline::encode::EncodedPage;
use crate::pipeline::infer::{PageExtractor, Pass};
use crate::pipeline::retry::RetryPolicy;
use crate::schema::ExtractionResult;
use std::sync::Arc;
use tracing::info;

/// Run the verification pass over the candidate pages.
///
/// `pages` is the full rendered set; the subsequence whose indices are in
/// `candidates` is selected in ascending index order. Callers must only
/// invoke this with a non-empty candidate set.
pub async fn verify(
    extractor: &Arc<dyn PageExtractor>,
    pages: &[EncodedPage],
    candidates: &CandidatePageSet,
    config: &TocConfig,
) -> Result<ExtractionResult, Pdf2TocError> {
    debug_assert!(!candidates.is_empty(), "caller checks for NoTocFound first");

    let selected: Vec<EncodedPage> = pages
        .iter()
        .filter(|p| candidates.contains(&p.index))
        .cloned()
        .collect();

    info!(
        "Verification pass over {} of {} pages",
        selected.len(),
        pages.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_verification_start(selected.len());
    }

    let policy = RetryPolicy::from_config(config);
    policy
        .run("verification", || {
            extractor.extract(&selected, Pass::Verification)
        })
        .await
        .map_err(|e| Pdf2TocError::VerificationFailed {
            kind: e.kind(),
            detail: e.detail().to_string(),
        })
}


//! Candidate page aggregation over settled discovery windows.
//!
//! A window counts as TOC-bearing when its invocation succeeded **and**
//! returned at least one entry. The candidate set is the union of the page
//! ranges of all such windows — whole windows, not individual pages, because
//! the discovery pass only answers "does this window contain contents
//! material", not "which of its pages". Exhausted and failed windows
//! contribute nothing, by design: a window we could not read is
//! indistinguishable from a window with no TOC on it.
//!
//! An empty candidate set is a terminal, non-error outcome: the caller
//! reports "no TOC located" and the verification pass never runs.

use crate::pipeline::chunk::{Window, WindowOutcome};
use crate::schema::ExtractionResult;
use std::collections::BTreeSet;

/// Page indices likely to hold TOC content, ascending and unique.
///
/// `BTreeSet` gives both properties by construction, which is exactly what
/// the verification stage needs to build its strictly ascending page
/// subsequence.
pub type CandidatePageSet = BTreeSet<usize>;

/// Union the page ranges of all TOC-bearing windows.
pub fn candidate_pages(settled: &[(Window, WindowOutcome)]) -> CandidatePageSet {
    let mut candidates = CandidatePageSet::new();
    for (window, outcome) in settled {
        if let WindowOutcome::Extracted(result) = outcome {
            if result.has_entries() {
                candidates.extend(window.pages());
            }
        }
    }
    candidates
}

/// Successful discovery results in chunk order.
///
/// This is the sequence the consolidation engine scans for metadata; its
/// order carries the tie-break semantics, so it must follow window index
/// order (which `chunk::dispatch` guarantees on its output).
pub fn successful_results(settled: &[(Window, WindowOutcome)]) -> Vec<&ExtractionResult> {
    settled
        .iter()
        .filter_map(|(_, outcome)| outcome.result())
        .collect()
}

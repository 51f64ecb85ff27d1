//! Final consolidation: best discovery metadata + authoritative TOC.
//!
//! The two passes answer different questions, so the final record takes a
//! different field from each:
//!
//! * **Metadata** comes from the *discovery* pass. Its windows between them
//!   saw the whole front matter, while the verification pass saw only the
//!   contents pages — which rarely show publisher or year. The
//!   verification result's metadata is never consulted.
//! * **TOC entries** come from the *verification* pass, unmodified apart
//!   from a stable ascending sort by page number — no deduplication, no
//!   filtering. Entries sharing a page number keep their returned order.
//!
//! Metadata selection is deterministic: scan discovery results in chunk
//! order and keep the first with the maximum number of non-null fields.

use crate::output::ConsolidatedToc;
use crate::schema::{BookMetadata, ExtractionResult};
use tracing::debug;

/// Build the final record from chunk-ordered discovery results and the
/// authoritative verification result.
pub fn consolidate(
    discovery_results: &[&ExtractionResult],
    authoritative: ExtractionResult,
) -> ConsolidatedToc {
    let metadata = pick_metadata(discovery_results);

    let mut toc_entries = authoritative.toc_entries;
    // Stable sort: equal page numbers keep their relative order.
    toc_entries.sort_by_key(|entry| entry.page_number);

    debug!(
        "Consolidated record: {} metadata fields, {} entries",
        metadata.filled_field_count(),
        toc_entries.len()
    );

    ConsolidatedToc {
        metadata,
        toc_entries,
    }
}

/// First-max scan over chunk-ordered results.
///
/// Strict `>` means a later result must be strictly better to displace an
/// earlier one — ties go to the earliest chunk.
fn pick_metadata(results: &[&ExtractionResult]) -> BookMetadata {
    let mut best: Option<&BookMetadata> = None;
    let mut best_count = 0usize;

    for result in results {
        let count = result.metadata.filled_field_count();
        if best.is_none() || count > best_count {
            best = Some(&result.metadata);
            best_count = count;
        }
    }

    best.cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TocEntry;

    fn with_fields(n: usize) -> ExtractionResult {
        with_titled_fields(n, &format!("title-{n}"))
    }

    fn with_titled_fields(n: usize, title: &str) -> ExtractionResult {
        let mut metadata = BookMetadata::default();
        if n >= 1 {
            metadata.book_title = Some(title.to_string());
        }
        if n >= 2 {
            metadata.authors = Some(vec!["author".into()]);
        }
        if n >= 3 {
            metadata.publishing_house = Some("press".into());
        }
        if n >= 4 {
            metadata.publishing_year = Some(1999);
        }
        ExtractionResult {
            metadata,
            toc_entries: vec![],
        }
    }

    fn entry(title: &str, page: u32) -> TocEntry {
        TocEntry {
            chapter_title: title.into(),
            page_number: page,
            reference_boolean: false,
        }
    }

    #[test]
    fn first_max_wins_on_ties() {
        // Filled counts [2, 0, 3, 3] in chunk order → the index-2 result.
        let results = [
            with_titled_fields(2, "two"),
            with_titled_fields(0, "zero"),
            with_titled_fields(3, "first-max"),
            with_titled_fields(3, "second-max"),
        ];
        let refs: Vec<&ExtractionResult> = results.iter().collect();

        let chosen = pick_metadata(&refs);
        assert_eq!(chosen.filled_field_count(), 3);
        assert_eq!(chosen.book_title.as_deref(), Some("first-max"));
    }

    #[test]
    fn all_empty_metadata_selects_first() {
        let results = [with_fields(0), with_fields(0)];
        let refs: Vec<&ExtractionResult> = results.iter().collect();
        assert_eq!(pick_metadata(&refs), BookMetadata::default());
    }

    #[test]
    fn no_results_yield_default_metadata() {
        assert_eq!(pick_metadata(&[]), BookMetadata::default());
    }

    #[test]
    fn entries_sort_ascending_by_page() {
        let authoritative = ExtractionResult {
            metadata: Default::default(),
            toc_entries: vec![entry("C", 50), entry("A", 10), entry("B", 30)],
        };
        let record = consolidate(&[], authoritative);
        let pages: Vec<u32> = record.toc_entries.iter().map(|e| e.page_number).collect();
        assert_eq!(pages, vec![10, 30, 50]);
    }

    #[test]
    fn equal_pages_keep_relative_order() {
        let authoritative = ExtractionResult {
            metadata: Default::default(),
            toc_entries: vec![entry("A", 20), entry("B", 20)],
        };
        let record = consolidate(&[], authoritative);
        let titles: Vec<&str> = record
            .toc_entries
            .iter()
            .map(|e| e.chapter_title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn duplicates_are_not_removed() {
        // "Relaxed" consolidation: the authoritative list is sorted, never
        // deduplicated.
        let authoritative = ExtractionResult {
            metadata: Default::default(),
            toc_entries: vec![entry("Intro", 1), entry("Intro", 1), entry("One", 9)],
        };
        let record = consolidate(&[], authoritative);
        assert_eq!(record.toc_entries.len(), 3);
    }

    #[test]
    fn verification_metadata_is_ignored() {
        let discovery = [with_fields(1)];
        let refs: Vec<&ExtractionResult> = discovery.iter().collect();
        let authoritative = with_fields(4); // richer, but must not be consulted

        let record = consolidate(&refs, authoritative);
        assert_eq!(record.metadata.filled_field_count(), 1);
        assert_eq!(record.metadata.book_title.as_deref(), Some("title-1"));
    }
}

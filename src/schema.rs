//! Wire data model fixed by the extraction schema.
//!
//! The structured-inference capability is asked for a single JSON object with
//! two top-level keys, `metadata` and `toc_entries`. The types here mirror
//! that schema field-for-field so a response either deserialises cleanly or
//! the invocation is rejected as a whole — there is no partial acceptance of
//! malformed output.
//!
//! Every value is immutable after parsing. Later pipeline stages build new
//! values from these rather than mutating them in place.

use serde::{Deserialize, Serialize};

/// Book metadata as reported by the extraction capability.
///
/// Each field is independently nullable: a chunk of front-matter pages may
/// show the title but not the publisher, a copyright page the reverse. The
/// consolidation stage picks the discovery result with the most non-null
/// fields (see [`crate::pipeline::consolidate`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Full title of the book, if visible on the analysed pages.
    pub book_title: Option<String>,
    /// All author names, if visible.
    pub authors: Option<Vec<String>>,
    /// Publisher name, if visible.
    pub publishing_house: Option<String>,
    /// Year of publication, if visible.
    pub publishing_year: Option<i32>,
}

impl BookMetadata {
    /// Number of non-null top-level fields.
    ///
    /// Used to rank discovery results: a result that saw title, authors and
    /// year beats one that only saw the title.
    pub fn filled_field_count(&self) -> usize {
        [
            self.book_title.is_some(),
            self.authors.is_some(),
            self.publishing_house.is_some(),
            self.publishing_year.is_some(),
        ]
        .iter()
        .filter(|&&f| f)
        .count()
    }
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Chapter title as printed in the contents listing.
    pub chapter_title: String,
    /// Starting page number (1-based, as printed in the book).
    pub page_number: u32,
    /// True only for bibliography/references-type sections.
    pub reference_boolean: bool,
}

/// The validated result of one extraction invocation.
///
/// Produced once per capability call and never modified afterwards. The
/// discovery pass yields one of these per window; the verification pass
/// yields exactly one, whose `toc_entries` become authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Metadata observed on the analysed pages (fields nullable).
    #[serde(default)]
    pub metadata: BookMetadata,
    /// Main-chapter entries found on the analysed pages; empty when the
    /// pages carry no contents listing.
    #[serde(default)]
    pub toc_entries: Vec<TocEntry>,
}

impl ExtractionResult {
    /// Whether this result flags its pages as TOC-bearing.
    pub fn has_entries(&self) -> bool {
        !self.toc_entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_field_count_counts_non_null_fields() {
        let empty = BookMetadata::default();
        assert_eq!(empty.filled_field_count(), 0);

        let partial = BookMetadata {
            book_title: Some("LSD Psychotherapy".into()),
            authors: None,
            publishing_house: None,
            publishing_year: Some(1980),
        };
        assert_eq!(partial.filled_field_count(), 2);

        let full = BookMetadata {
            book_title: Some("LSD Psychotherapy".into()),
            authors: Some(vec!["Stanislav Grof".into()]),
            publishing_house: Some("Hunter House".into()),
            publishing_year: Some(1980),
        };
        assert_eq!(full.filled_field_count(), 4);
    }

    #[test]
    fn deserialises_capability_response() {
        let json = r#"{
            "metadata": {
                "book_title": "The Coming Storm",
                "authors": ["Michael Lewis"],
                "publishing_house": null,
                "publishing_year": null
            },
            "toc_entries": [
                {"chapter_title": "Chapter One", "page_number": 3, "reference_boolean": false},
                {"chapter_title": "Bibliography", "page_number": 211, "reference_boolean": true}
            ]
        }"#;

        let result: ExtractionResult = serde_json::from_str(json).expect("valid response");
        assert_eq!(result.metadata.filled_field_count(), 2);
        assert_eq!(result.toc_entries.len(), 2);
        assert!(result.toc_entries[1].reference_boolean);
        assert!(result.has_entries());
    }

    #[test]
    fn missing_keys_default_to_empty() {
        // A model that found nothing may legally return "{}".
        let result: ExtractionResult = serde_json::from_str("{}").expect("empty object is valid");
        assert!(!result.has_entries());
        assert_eq!(result.metadata.filled_field_count(), 0);
    }
}

//! Prompt text for VLM-based metadata and TOC extraction.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — adjusting what counts as a main chapter or
//!    how `reference_boolean` is assigned requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without a
//!    live VLM, so a prompt regression (a dropped schema key, a lost rule)
//!    fails fast.
//!
//! Callers can override the default via
//! [`crate::config::TocConfig::extraction_prompt`]; both passes share the
//! same prompt — what differs between discovery and verification is the model
//! configuration, not the instructions.

/// Default prompt for structured metadata + TOC extraction from page images.
///
/// Used when `TocConfig::extraction_prompt` is `None`.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Analyze the following book pages to extract metadata and the main table of contents.

Return a single JSON object with two top-level keys: "metadata" and "toc_entries".

1. "metadata": an object describing the book.
   - "book_title": the full title of the book.
   - "authors": a list of all author names.
   - "publishing_house": the name of the publisher.
   - "publishing_year": the integer year of publication.
   - If any metadata field is not visible on the pages, its value MUST be null.

2. "toc_entries": a JSON array containing ONLY THE MAIN, TOP-LEVEL CHAPTERS.
   - CRITICAL: IGNORE indented sub-chapters. Main chapters are typically not
     indented and have larger page gaps between them.
   - Each object in the array MUST have exactly these three keys:
     - "chapter_title": the string name of the chapter.
     - "page_number": the integer starting page number.
     - "reference_boolean": a boolean. It MUST be true ONLY for sections
       explicitly titled "Bibliography" or "References". For all other
       entries (including "Index", "Appendix", "Coda", etc.) it MUST be false.

If no table of contents entries are visible on these pages, "toc_entries"
MUST be an empty list [].

IMPORTANT: Return ONLY valid JSON. Do NOT include markdown, code fences,
explanations, or any other text. The output must be a single valid JSON
object and nothing else."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_schema_key() {
        for key in [
            "metadata",
            "toc_entries",
            "book_title",
            "authors",
            "publishing_house",
            "publishing_year",
            "chapter_title",
            "page_number",
            "reference_boolean",
        ] {
            assert!(
                DEFAULT_EXTRACTION_PROMPT.contains(key),
                "prompt lost schema key: {key}"
            );
        }
    }

    #[test]
    fn prompt_demands_json_only_output() {
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("ONLY valid JSON"));
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("empty list"));
    }
}

//! Deterministic response cleanup for capability output.
//!
//! Models are instructed to return bare JSON, but in practice responses
//! arrive wrapped in markdown fences or, occasionally, as a bulleted chapter
//! list instead of JSON. The cleanup rules here are applied in order of
//! decreasing strictness:
//!
//! 1. strip surrounding ```json fences and parse as JSON;
//! 2. fall back to the `* Chapter N: Title: Page` bullet format;
//! 3. reject the invocation as `Fatal` — a parse failure is scoped to the
//!    single call that produced it and never aborts sibling invocations.

use crate::error::ExtractionFailure;
use crate::schema::{ExtractionResult, TocEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static CHAPTER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\s*Chapter\s*(\d+):\s*(.*?):\s*(\d+)").expect("valid chapter-line regex")
});

/// Parse raw model output into a validated [`ExtractionResult`].
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, ExtractionFailure> {
    let cleaned = strip_fences(raw);

    match serde_json::from_str::<ExtractionResult>(cleaned) {
        Ok(result) => Ok(result),
        Err(json_err) => {
            let entries = parse_chapter_list(cleaned);
            if entries.is_empty() {
                Err(ExtractionFailure::Fatal(format!(
                    "unparseable response: {}",
                    json_err
                )))
            } else {
                warn!(
                    "Response was not JSON; recovered {} entries from bullet format",
                    entries.len()
                );
                Ok(ExtractionResult {
                    metadata: Default::default(),
                    toc_entries: entries,
                })
            }
        }
    }
}

/// Strip a surrounding markdown code fence, if present.
pub fn strip_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim_start();
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim_start();
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }
    cleaned
}

/// Fallback parser for the `* Chapter N: Title: Page` bullet format.
///
/// Recovered entries carry no metadata and no reference flag — the bullet
/// format never encodes either.
fn parse_chapter_list(text: &str) -> Vec<TocEntry> {
    CHAPTER_LINE
        .captures_iter(text)
        .filter_map(|cap| {
            let title = cap.get(2)?.as_str().trim();
            let page: u32 = cap.get(3)?.as_str().parse().ok()?;
            if title.is_empty() {
                return None;
            }
            Some(TocEntry {
                chapter_title: title.to_string(),
                page_number: page,
                reference_boolean: false,
            })
        })
        .collect()
}

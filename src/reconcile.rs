//! Boundary to the external heading-reconciliation collaborator.
//!
//! A companion service can take the canonical TOC, a noisy heading list
//! scraped from the document body (fragments, junk words, titles split
//! across lines), and the book title, and return a reconciled TOC with page
//! numbers resolved against the noisy list. The matching itself is
//! natural-language work and stays entirely outside this crate; what lives
//! here is the wire shape of the exchange and the acceptance checks applied
//! to whatever comes back:
//!
//! * the reconciled list may not contain more chapters than the canonical
//!   TOC (the reconciler matches, it never invents);
//! * page numbers must be non-decreasing across the returned list (chapters
//!   appear in reading order).
//!
//! A response violating either is rejected with
//! [`Pdf2TocError::InvalidReconciliation`] before anything downstream sees it.

use crate::error::Pdf2TocError;
use crate::schema::TocEntry;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// One heading candidate from the noisy body scan.
///
/// Wire names are camelCase — this is the shape the heading-detection
/// service emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoisyHeading {
    /// Raw heading text; may be a fragment of a real title.
    pub title: String,
    /// Page the fragment was seen on.
    pub page_number: u32,
    /// 1 when the font size stands well clear of the body text, else 0.
    /// Strong headings are far more likely to be chapter titles.
    pub level: u8,
}

/// One entry of a reconciled TOC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledEntry {
    pub title: String,
    pub page_number: u32,
}

/// The external reconciliation capability.
///
/// Implementations match each canonical chapter against the noisy heading
/// list and return the canonical chapters with resolved page numbers.
pub trait HeadingReconciler: Send + Sync {
    fn reconcile<'a>(
        &'a self,
        canonical: &'a [TocEntry],
        headings: &'a [NoisyHeading],
        book_title: &'a str,
    ) -> BoxFuture<'a, Result<Vec<ReconciledEntry>, Pdf2TocError>>;
}

/// Validate a reconciler response against its acceptance invariants.
pub fn validate_reconciled(
    canonical: &[TocEntry],
    reconciled: &[ReconciledEntry],
) -> Result<(), Pdf2TocError> {
    if reconciled.len() > canonical.len() {
        return Err(Pdf2TocError::InvalidReconciliation {
            reason: format!(
                "{} entries returned for {} canonical chapters",
                reconciled.len(),
                canonical.len()
            ),
        });
    }

    for (i, pair) in reconciled.windows(2).enumerate() {
        if pair[1].page_number < pair[0].page_number {
            return Err(Pdf2TocError::InvalidReconciliation {
                reason: format!(
                    "page numbers decrease at entry {} ({} after {})",
                    i + 1,
                    pair[1].page_number,
                    pair[0].page_number
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(n: usize) -> Vec<TocEntry> {
        (0..n)
            .map(|i| TocEntry {
                chapter_title: format!("Chapter {}", i + 1),
                page_number: (i as u32 + 1) * 20,
                reference_boolean: false,
            })
            .collect()
    }

    fn entries(pages: &[u32]) -> Vec<ReconciledEntry> {
        pages
            .iter()
            .map(|&p| ReconciledEntry {
                title: format!("Chapter at {p}"),
                page_number: p,
            })
            .collect()
    }

    #[test]
    fn accepts_conforming_response() {
        let toc = canonical(4);
        assert!(validate_reconciled(&toc, &entries(&[5, 30, 30, 61])).is_ok());
    }

    #[test]
    fn accepts_shorter_response() {
        let toc = canonical(4);
        assert!(validate_reconciled(&toc, &entries(&[5, 30])).is_ok());
        assert!(validate_reconciled(&toc, &entries(&[])).is_ok());
    }

    #[test]
    fn rejects_oversized_response() {
        let toc = canonical(2);
        let err = validate_reconciled(&toc, &entries(&[1, 2, 3])).unwrap_err();
        assert!(matches!(err, Pdf2TocError::InvalidReconciliation { .. }));
    }

    #[test]
    fn rejects_decreasing_page_numbers() {
        let toc = canonical(4);
        let err = validate_reconciled(&toc, &entries(&[5, 30, 12])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("decrease"), "got: {msg}");
    }

    #[test]
    fn noisy_heading_wire_names_are_camel_case() {
        let json = r#"{"title": "PSYCHOTHERAPY", "pageNumber": 262, "level": 1}"#;
        let heading: NoisyHeading = serde_json::from_str(json).expect("camelCase wire shape");
        assert_eq!(heading.page_number, 262);
        assert_eq!(heading.level, 1);
    }
}

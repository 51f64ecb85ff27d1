//! Integration tests for the two-pass extraction pipeline.
//!
//! These tests drive [`extract_toc_from_pages`] with a scripted extraction
//! capability injected through `TocConfig::extractor` — the same seam a
//! caller would use for middleware — so the full dispatch → aggregate →
//! verify → consolidate flow runs without any network access, API key, or
//! pdfium binding.

use edgequake_llm::ImageData;
use futures::future::BoxFuture;
use pdf2toc::{
    extract_toc_from_pages, BookMetadata, EncodedPage, ExtractionFailure, ExtractionResult,
    FailureKind, PageExtractor, Pass, Pdf2TocError, TocConfig, TocEntry, TocOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

type Script =
    Box<dyn Fn(&[usize], Pass) -> Result<ExtractionResult, ExtractionFailure> + Send + Sync>;

/// A capability whose behaviour is a function of the page indices it is
/// handed and the pass it runs under. Records call counts and the exact
/// indices the verification pass received.
struct ScriptedExtractor {
    script: Script,
    delay_ms: u64,
    discovery_calls: AtomicUsize,
    verification_calls: AtomicUsize,
    verification_indices: Mutex<Vec<usize>>,
}

impl ScriptedExtractor {
    fn new(
        script: impl Fn(&[usize], Pass) -> Result<ExtractionResult, ExtractionFailure>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            delay_ms: 0,
            discovery_calls: AtomicUsize::new(0),
            verification_calls: AtomicUsize::new(0),
            verification_indices: Mutex::new(Vec::new()),
        })
    }

    fn with_delay(
        delay_ms: u64,
        script: impl Fn(&[usize], Pass) -> Result<ExtractionResult, ExtractionFailure>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            delay_ms,
            discovery_calls: AtomicUsize::new(0),
            verification_calls: AtomicUsize::new(0),
            verification_indices: Mutex::new(Vec::new()),
        })
    }
}

impl PageExtractor for ScriptedExtractor {
    fn extract<'a>(
        &'a self,
        pages: &'a [EncodedPage],
        pass: Pass,
    ) -> BoxFuture<'a, Result<ExtractionResult, ExtractionFailure>> {
        Box::pin(async move {
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
            match pass {
                Pass::Discovery => {
                    self.discovery_calls.fetch_add(1, Ordering::SeqCst);
                }
                Pass::Verification => {
                    self.verification_calls.fetch_add(1, Ordering::SeqCst);
                    *self.verification_indices.lock().unwrap() = indices.clone();
                }
            }
            (self.script)(&indices, pass)
        })
    }
}

fn fake_pages(n: usize) -> Vec<EncodedPage> {
    (0..n)
        .map(|index| EncodedPage {
            index,
            data: ImageData::new("aGk=".to_string(), "image/png"),
        })
        .collect()
}

fn entry(title: &str, page: u32) -> TocEntry {
    TocEntry {
        chapter_title: title.into(),
        page_number: page,
        reference_boolean: false,
    }
}

fn with_entries(entries: Vec<TocEntry>) -> ExtractionResult {
    ExtractionResult {
        metadata: BookMetadata::default(),
        toc_entries: entries,
    }
}

fn empty_result() -> ExtractionResult {
    ExtractionResult::default()
}

/// Config wired to the scripted capability, with millisecond backoff so
/// retry-heavy tests stay fast.
fn test_config(extractor: Arc<ScriptedExtractor>) -> TocConfig {
    TocConfig::builder()
        .window_size(5)
        .retry_backoff_ms(1)
        .extractor(extractor)
        .build()
        .expect("valid test config")
}

// ── No-candidates terminal state ─────────────────────────────────────────────

#[tokio::test]
async fn all_empty_discovery_yields_no_toc_without_verification() {
    let extractor = ScriptedExtractor::new(|_, pass| match pass {
        Pass::Discovery => Ok(empty_result()),
        Pass::Verification => panic!("verification must not run"),
    });
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(12), &config)
        .await
        .expect("no-candidates is not an error");

    assert_eq!(report.outcome, TocOutcome::NoTocFound);
    assert_eq!(report.stats.windows_dispatched, 3);
    assert_eq!(report.stats.candidate_pages, 0);
    assert_eq!(extractor.discovery_calls.load(Ordering::SeqCst), 3);
    assert_eq!(extractor.verification_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_pages_yield_no_toc() {
    let extractor = ScriptedExtractor::new(|_, _| panic!("nothing should be invoked"));
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(0), &config)
        .await
        .expect("empty input is not an error");

    assert_eq!(report.outcome, TocOutcome::NoTocFound);
    assert_eq!(report.stats.windows_dispatched, 0);
}

// ── End-to-end two-pass flow ─────────────────────────────────────────────────

#[tokio::test]
async fn two_pass_flow_over_twelve_pages() {
    // 12 pages, window 5 → windows [0,5), [5,10), [10,12).
    // Windows 0 and 2 are TOC-bearing; window 1 sees only metadata.
    let extractor = ScriptedExtractor::new(|indices, pass| match pass {
        Pass::Discovery => match indices[0] {
            0 => Ok(ExtractionResult {
                metadata: BookMetadata {
                    book_title: Some("from window 0".into()),
                    authors: Some(vec!["A. Author".into()]),
                    ..Default::default()
                },
                toc_entries: vec![entry("Intro", 5), entry("One", 21)],
            }),
            5 => Ok(ExtractionResult {
                metadata: BookMetadata {
                    book_title: Some("from window 1".into()),
                    authors: Some(vec!["A. Author".into()]),
                    publishing_year: Some(2007),
                    ..Default::default()
                },
                toc_entries: vec![],
            }),
            10 => Ok(with_entries(vec![entry("Coda", 198)])),
            other => panic!("unexpected window start {other}"),
        },
        Pass::Verification => Ok(ExtractionResult {
            // Richer than any discovery result, but must be ignored.
            metadata: BookMetadata {
                book_title: Some("from verification".into()),
                authors: Some(vec!["X".into()]),
                publishing_house: Some("Y".into()),
                publishing_year: Some(1),
            },
            toc_entries: vec![
                entry("Coda", 210),
                TocEntry {
                    chapter_title: "Bibliography".into(),
                    page_number: 230,
                    reference_boolean: true,
                },
                entry("Intro", 5),
            ],
        }),
    });
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(12), &config)
        .await
        .expect("pipeline succeeds");

    // Verification ran exactly once, over the union of windows 0 and 2.
    assert_eq!(extractor.verification_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *extractor.verification_indices.lock().unwrap(),
        vec![0, 1, 2, 3, 4, 10, 11]
    );
    assert_eq!(report.stats.candidate_pages, 7);
    assert_eq!(report.stats.windows_with_toc, 2);

    let record = report.outcome.record().expect("a record was produced");

    // TOC = verification entries, stably sorted by page number.
    let pages: Vec<u32> = record.toc_entries.iter().map(|e| e.page_number).collect();
    assert_eq!(pages, vec![5, 210, 230]);
    assert!(record.toc_entries[2].reference_boolean);

    // Metadata = discovery result with most filled fields (window 1, count 3),
    // even though that window had no entries — and never from verification.
    assert_eq!(record.metadata.book_title.as_deref(), Some("from window 1"));
    assert_eq!(record.metadata.publishing_year, Some(2007));
}

#[tokio::test]
async fn metadata_tie_breaks_to_earliest_chunk() {
    // Window size 1 over 4 pages → filled-field counts [2, 0, 3, 3] in
    // chunk order. The first count-3 result (index 2) must win.
    let extractor = ScriptedExtractor::new(|indices, pass| match pass {
        Pass::Discovery => {
            let metadata = match indices[0] {
                0 => BookMetadata {
                    book_title: Some("two".into()),
                    authors: Some(vec!["a".into()]),
                    ..Default::default()
                },
                1 => BookMetadata::default(),
                2 => BookMetadata {
                    book_title: Some("first max".into()),
                    authors: Some(vec!["a".into()]),
                    publishing_year: Some(1990),
                    ..Default::default()
                },
                _ => BookMetadata {
                    book_title: Some("second max".into()),
                    authors: Some(vec!["a".into()]),
                    publishing_year: Some(1991),
                    ..Default::default()
                },
            };
            Ok(ExtractionResult {
                metadata,
                toc_entries: vec![entry("Chapter", 1)],
            })
        }
        Pass::Verification => Ok(with_entries(vec![entry("Chapter", 1)])),
    });
    let config = TocConfig::builder()
        .window_size(1)
        .retry_backoff_ms(1)
        .extractor(Arc::clone(&extractor) as Arc<dyn PageExtractor>)
        .build()
        .unwrap();

    let report = extract_toc_from_pages(fake_pages(4), &config).await.unwrap();
    let record = report.outcome.record().unwrap();
    assert_eq!(record.metadata.book_title.as_deref(), Some("first max"));
}

// ── Failure isolation in the discovery pass ──────────────────────────────────

#[tokio::test]
async fn exhausted_discovery_window_is_isolated() {
    // Window 0 times out on every attempt; window 1 succeeds with entries.
    let extractor = ScriptedExtractor::new(|indices, pass| match pass {
        Pass::Discovery => {
            if indices[0] == 0 {
                Err(ExtractionFailure::Transient("503 overloaded".into()))
            } else {
                Ok(with_entries(vec![entry("One", 9)]))
            }
        }
        Pass::Verification => Ok(with_entries(vec![entry("One", 9)])),
    });
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(10), &config)
        .await
        .expect("one bad window does not abort the run");

    assert_eq!(report.stats.windows_exhausted, 1);
    assert_eq!(report.stats.windows_with_toc, 1);
    // Exhausted window made exactly 3 attempts; the healthy one made 1.
    assert_eq!(extractor.discovery_calls.load(Ordering::SeqCst), 4);

    // Only the healthy window's pages became candidates.
    assert_eq!(
        *extractor.verification_indices.lock().unwrap(),
        vec![5, 6, 7, 8, 9]
    );
    assert!(report.outcome.record().is_some());
}

#[tokio::test]
async fn fatal_discovery_window_is_isolated_and_never_retried() {
    let extractor = ScriptedExtractor::new(|indices, pass| match pass {
        Pass::Discovery => {
            if indices[0] == 0 {
                Err(ExtractionFailure::Fatal("unparseable response".into()))
            } else {
                Ok(with_entries(vec![entry("One", 9)]))
            }
        }
        Pass::Verification => Ok(with_entries(vec![entry("One", 9)])),
    });
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(10), &config)
        .await
        .expect("a fatal window does not abort siblings");

    assert_eq!(report.stats.windows_failed, 1);
    // One fatal call (no retries) plus one healthy call.
    assert_eq!(extractor.discovery_calls.load(Ordering::SeqCst), 2);
    assert!(report.outcome.record().is_some());
}

#[tokio::test]
async fn transient_discovery_window_recovers_within_budget() {
    let attempts = Arc::new(Mutex::new(0u32));
    let attempts_in_script = Arc::clone(&attempts);
    let extractor = ScriptedExtractor::new(move |_, pass| match pass {
        Pass::Discovery => {
            let mut n = attempts_in_script.lock().unwrap();
            *n += 1;
            if *n == 1 {
                Err(ExtractionFailure::Transient("timeout".into()))
            } else {
                Ok(with_entries(vec![entry("One", 9)]))
            }
        }
        Pass::Verification => Ok(with_entries(vec![entry("One", 9)])),
    });
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(5), &config)
        .await
        .expect("recovered window succeeds");

    assert_eq!(*attempts.lock().unwrap(), 2);
    assert_eq!(report.stats.windows_with_toc, 1);
    assert_eq!(report.stats.windows_exhausted, 0);
}

// ── Verification failures abort distinctly ───────────────────────────────────

#[tokio::test]
async fn verification_exhaustion_aborts_the_run() {
    let extractor = ScriptedExtractor::new(|_, pass| match pass {
        Pass::Discovery => Ok(with_entries(vec![entry("One", 9)])),
        Pass::Verification => Err(ExtractionFailure::Transient("503".into())),
    });
    let config = test_config(Arc::clone(&extractor));

    let err = extract_toc_from_pages(fake_pages(5), &config)
        .await
        .expect_err("verification exhaustion is fatal");

    match err {
        Pdf2TocError::VerificationFailed { kind, detail } => {
            assert_eq!(kind, FailureKind::Exhausted);
            assert!(detail.contains("503"));
        }
        other => panic!("expected VerificationFailed, got: {other}"),
    }
    assert_eq!(extractor.verification_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn verification_fatal_aborts_without_retry() {
    let extractor = ScriptedExtractor::new(|_, pass| match pass {
        Pass::Discovery => Ok(with_entries(vec![entry("One", 9)])),
        Pass::Verification => Err(ExtractionFailure::Fatal("401 Unauthorized".into())),
    });
    let config = test_config(Arc::clone(&extractor));

    let err = extract_toc_from_pages(fake_pages(5), &config)
        .await
        .expect_err("fatal verification aborts");

    assert!(matches!(
        err,
        Pdf2TocError::VerificationFailed {
            kind: FailureKind::Fatal,
            ..
        }
    ));
    assert_eq!(extractor.verification_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_authoritative_toc_is_a_valid_record() {
    // Discovery flags pages, but the stronger pass reads them as no TOC.
    // That empty list is authoritative — the record is kept, discovery
    // entries are not substituted.
    let extractor = ScriptedExtractor::new(|_, pass| match pass {
        Pass::Discovery => Ok(ExtractionResult {
            metadata: BookMetadata {
                book_title: Some("Ghost TOC".into()),
                ..Default::default()
            },
            toc_entries: vec![entry("Mirage", 12)],
        }),
        Pass::Verification => Ok(empty_result()),
    });
    let config = test_config(Arc::clone(&extractor));

    let report = extract_toc_from_pages(fake_pages(5), &config)
        .await
        .expect("empty authoritative list is reportable");

    let record = report.outcome.record().expect("record, not NoTocFound");
    assert!(record.toc_entries.is_empty());
    assert_eq!(record.metadata.book_title.as_deref(), Some("Ghost TOC"));
}

// ── Cancellation ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn pipeline_deadline_cancels_in_flight_work() {
    let extractor = ScriptedExtractor::with_delay(5_000, |_, _| Ok(empty_result()));
    let config = TocConfig::builder()
        .window_size(5)
        .retry_backoff_ms(1)
        .pipeline_timeout_secs(1)
        .extractor(Arc::clone(&extractor) as Arc<dyn PageExtractor>)
        .build()
        .unwrap();

    let err = extract_toc_from_pages(fake_pages(5), &config)
        .await
        .expect_err("deadline must fire before the slow capability returns");

    assert!(matches!(err, Pdf2TocError::PipelineTimeout { secs: 1 }));
}

//! Pipeline stages for two-pass metadata + TOC extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (a different renderer, a scripted extraction capability in
//! tests) without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ chunk ──▶ discovery ──▶ verify ──▶ consolidate
//! (URL/path) (pdfium)  (base64)  (fan-out)  (candidates)  (1 call)   (record)
//! ```
//!
//! 1. [`input`]       — canonicalise the user-supplied path or URL to a local file
//! 2. [`render`]      — rasterise the front pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`]      — PNG-encode and base64-wrap each page for the
//!    multimodal request body
//! 4. [`chunk`]       — partition pages into windows and dispatch one
//!    extraction invocation per window, concurrently, each wrapped by
//!    [`retry`]; the only discovery-pass stage with network I/O
//! 5. [`discovery`]   — union the page ranges of TOC-bearing windows into the
//!    candidate page set
//! 6. [`verify`]      — one authoritative invocation over exactly the
//!    candidate pages, at the higher-fidelity configuration
//! 7. [`consolidate`] — pick the best discovery metadata and sort the
//!    authoritative entries into the final record
//!
//! [`infer`] defines the capability boundary the network stages call through;
//! [`parse`] holds the deterministic response-cleanup rules.

pub mod chunk;
pub mod consolidate;
pub mod discovery;
pub mod encode;
pub mod infer;
pub mod input;
pub mod parse;
pub mod render;
pub mod retry;
pub mod verify;

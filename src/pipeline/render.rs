//! PDF rasterisation: render the front pages to images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local
//! state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking thread
//! pool so the Tokio workers never stall during CPU-heavy rendering.
//!
//! ## Why only the front pages?
//!
//! A table of contents lives in the front matter. Rendering the first
//! `max_pages` pages (20 by default) bounds both rasterisation time and the
//! number of inference invocations, and every downstream stage relies on the
//! resulting indices being 0-based and contiguous.

use crate::config::TocConfig;
use crate::error::Pdf2TocError;
use crate::output::PdfInfo;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// One rasterised page, owned by the pipeline run.
///
/// `index` is 0-based and contiguous across the rendered set; the chunking
/// and candidate-set stages depend on that invariant.
pub struct PageImage {
    pub index: usize,
    pub image: DynamicImage,
}

/// Rasterise the first `config.max_pages` pages of a PDF.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn render_pages(
    pdf_path: &Path,
    config: &TocConfig,
) -> Result<Vec<PageImage>, Pdf2TocError> {
    let path = pdf_path.to_path_buf();
    let max_pages = config.max_pages;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, max_pages, max_pixels, password.as_deref())
    })
    .await
    .map_err(|e| Pdf2TocError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    max_pages: usize,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<PageImage>, Pdf2TocError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let render_count = total_pages.min(max_pages);
    info!(
        "PDF loaded: {} pages, rendering first {}",
        total_pages, render_count
    );

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut rendered = Vec::with_capacity(render_count);
    for index in 0..render_count {
        let page = pages
            .get(index as u16)
            .map_err(|e| Pdf2TocError::RenderFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| Pdf2TocError::RenderFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );

        rendered.push(PageImage { index, image });
    }

    Ok(rendered)
}

/// Read document metadata and page count without rendering anything.
pub async fn read_pdf_info(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<PdfInfo, Pdf2TocError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || read_pdf_info_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2TocError::Internal(format!("Inspect task panicked: {}", e)))?
}

fn read_pdf_info_blocking(pdf_path: &Path, password: Option<&str>) -> Result<PdfInfo, Pdf2TocError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(PdfInfo {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Open a PDF, mapping pdfium failures onto the input-error taxonomy.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2TocError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2TocError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2TocError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2TocError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

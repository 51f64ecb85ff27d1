//! Image encoding: rasterised page → base64 PNG ready for the inference API.
//!
//! VLM APIs accept images as base64 payloads in the JSON request body. PNG is
//! chosen over JPEG because it is lossless — a contents page is dense with
//! small digits, and compression artefacts on page numbers are exactly the
//! corruption this pipeline cannot tolerate. `detail: "high"` asks GPT-4-class
//! models to use their full image tile budget so fine print stays readable.

use crate::error::Pdf2TocError;
use crate::pipeline::render::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use std::io::Cursor;
use tracing::debug;

/// One page encoded for the inference request, carrying its original index.
#[derive(Clone)]
pub struct EncodedPage {
    pub index: usize,
    pub data: ImageData,
}

/// Encode a single rasterised page.
pub fn encode_page(page: &PageImage) -> Result<EncodedPage, Pdf2TocError> {
    let mut buf = Vec::new();
    page.image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| Pdf2TocError::RenderFailed {
            page: page.index + 1,
            detail: format!("Image encoding failed: {}", e),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page {} → {} bytes base64", page.index + 1, b64.len());

    Ok(EncodedPage {
        index: page.index,
        data: ImageData::new(b64, "image/png").with_detail("high"),
    })
}

/// Encode every rendered page, preserving index order.
///
/// A failed encode aborts the run: the chunking stage requires the index
/// sequence to stay contiguous, so silently skipping a page is not an option.
pub fn encode_pages(pages: &[PageImage]) -> Result<Vec<EncodedPage>, Pdf2TocError> {
    pages.iter().map(encode_page).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn solid_page(index: usize) -> PageImage {
        PageImage {
            index,
            image: DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                10,
                10,
                Rgba([255, 255, 255, 255]),
            )),
        }
    }

    #[test]
    fn encode_keeps_index_and_produces_valid_base64() {
        let encoded = encode_page(&solid_page(3)).expect("encode should succeed");
        assert_eq!(encoded.index, 3);
        assert_eq!(encoded.data.mime_type, "image/png");
        let decoded = STANDARD.decode(&encoded.data.data).expect("valid base64");
        assert!(!decoded.is_empty());
    }

    #[test]
    fn encode_pages_preserves_order() {
        let pages: Vec<PageImage> = (0..4).map(solid_page).collect();
        let encoded = encode_pages(&pages).expect("all encodes succeed");
        let indices: Vec<usize> = encoded.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}

//! PDF rasterisation: render the leading pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations, preventing the
//! Tokio worker threads from stalling during CPU-heavy rendering.
//!
//! ## Page limit at the source
//!
//! Donation documents are read front-to-back and the donor block is on the
//! first page, so rendering stops after `max_pages` pages rather than
//! rasterising the whole document and discarding the rest.

use crate::config::ExtractionConfig;
use crate::error::DocumentError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rasterise the first `max_pages` pages of a PDF into images.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// A document that yields no pages at all is a render failure — there is
/// nothing to show the model.
pub async fn render_document(
    pdf_path: &Path,
    config: &ExtractionConfig,
) -> Result<Vec<DynamicImage>, DocumentError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pages = config.max_pages;

    let result =
        tokio::task::spawn_blocking(move || render_document_blocking(&path, dpi, max_pages))
            .await
            .map_err(|e| DocumentError::Render {
                detail: format!("Render task panicked: {}", e),
            })?;

    result
}

/// Blocking implementation of document rendering.
fn render_document_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pages: usize,
) -> Result<Vec<DynamicImage>, DocumentError> {
    let pdfium = bind_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| DocumentError::Render {
                detail: format!("Cannot open {}: {:?}", pdf_path.display(), e),
            })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let take = total_pages.min(max_pages);
    info!(
        "PDF loaded: {} pages, rendering first {}",
        total_pages, take
    );

    let mut results = Vec::with_capacity(take);

    for idx in 0..take {
        let page = pages.get(idx as u16).map_err(|e| DocumentError::Render {
            detail: format!("Rasterisation failed for page {}: {:?}", idx + 1, e),
        })?;

        // Target pixel width from the page's physical width at the
        // configured DPI (PDF points are 1/72 inch).
        let target_width = (page.width().value * dpi as f32 / 72.0).round().max(1.0) as i32;
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_maximum_height(target_width * 4);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| DocumentError::Render {
                detail: format!("Rasterisation failed for page {}: {:?}", idx + 1, e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(image);
    }

    if results.is_empty() {
        warn!("No pages rendered from {}", pdf_path.display());
        return Err(DocumentError::Render {
            detail: "No images generated from PDF".to_string(),
        });
    }

    Ok(results)
}

/// Bind to a pdfium library.
///
/// Resolution order: `PDFIUM_LIB_PATH`, then the system library, then a
/// copy next to the current executable. Binding failures surface as
/// per-document render errors so one missing library configuration fails
/// documents with a clear message instead of aborting the process.
fn bind_pdfium() -> Result<Pdfium, DocumentError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library().or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        }),
    };

    bindings.map(Pdfium::new).map_err(|e| DocumentError::Render {
        detail: format!(
            "Failed to bind to pdfium library: {:?}. \
             Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.",
            e
        ),
    })
}

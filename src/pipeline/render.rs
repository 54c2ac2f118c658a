//! Summary PDF writer: draw a laid-out document with pdfium.
//!
//! Layout happens in [`crate::pipeline::markup`]; this stage only creates
//! pages and text objects, so it runs inside `spawn_blocking` like every
//! other pdfium call.

use crate::error::PaperSumError;
use crate::pipeline::extract::bind_pdfium;
use crate::pipeline::markup::{layout_summary, PageLayout, SummaryDocument, PAGE_HEIGHT, PAGE_WIDTH};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Lay out and write the summary document to `out_path`.
pub async fn write_summary_pdf(
    doc: SummaryDocument<'_>,
    out_path: &Path,
) -> Result<(), PaperSumError> {
    let pages = layout_summary(&doc);
    let path = out_path.to_path_buf();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PaperSumError::OutputWriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::task::spawn_blocking(move || write_blocking(&pages, &path))
        .await
        .map_err(|e| PaperSumError::Internal(format!("Render task panicked: {}", e)))?
}

fn write_blocking(pages: &[PageLayout], path: &Path) -> Result<(), PaperSumError> {
    let pdfium = bind_pdfium()?;
    let failed = |e: PdfiumError| render_failed(path, e);

    let mut document = pdfium.create_new_pdf().map_err(failed)?;
    let regular = document.fonts_mut().helvetica();
    let bold = document.fonts_mut().helvetica_bold();

    for (idx, layout) in pages.iter().enumerate() {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::new_custom(
                PdfPoints::new(PAGE_WIDTH),
                PdfPoints::new(PAGE_HEIGHT),
            ))
            .map_err(failed)?;

        for line in &layout.lines {
            let font = if line.bold { bold } else { regular };
            let mut object = page
                .objects_mut()
                .create_text_object(
                    PdfPoints::new(line.x),
                    PdfPoints::new(line.y),
                    &line.text,
                    font,
                    PdfPoints::new(line.size),
                )
                .map_err(failed)?;
            let (r, g, b) = line.color;
            object
                .set_fill_color(PdfColor::new(r, g, b, 255))
                .map_err(failed)?;
        }
        debug!("Rendered page {} ({} lines)", idx + 1, layout.lines.len());
    }

    document.save_to_file(path).map_err(failed)?;
    info!("Wrote summary PDF: {} ({} pages)", path.display(), pages.len());
    Ok(())
}

fn render_failed(path: &Path, e: PdfiumError) -> PaperSumError {
    PaperSumError::RenderFailed {
        path: PathBuf::from(path),
        detail: format!("{:?}", e),
    }
}

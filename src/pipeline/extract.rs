//! Text extraction: pull the text layer and the title out of a PDF via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks while parsing. The work runs on Tokio's blocking pool so
//! the async workers stay free for LLM calls.

use crate::error::PaperSumError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Raw per-page text plus the facts the pipeline needs about the file.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
    /// Metadata title, or the file stem when the PDF has none.
    pub title: String,
    pub page_count: usize,
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then a copy next to the working
/// directory, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, PaperSumError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.trim().is_empty() => {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            Pdfium::bind_to_library(&path)
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
            &PathBuf::from("./"),
        ))
        .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PaperSumError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Extract every page's text from `pdf_path`.
pub async fn extract(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedDocument, PaperSumError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| PaperSumError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<ExtractedDocument, PaperSumError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password, e))?;

    let title = document
        .metadata()
        .get(PdfDocumentMetadataTagType::Title)
        .map(|tag| tag.value().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file_stem_title(pdf_path));

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages, title '{}'", page_count, title);

    let mut texts = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        match page.text() {
            Ok(text) => texts.push(text.all()),
            Err(e) => {
                warn!("Page {}: no text layer ({:?})", idx + 1, e);
                texts.push(String::new());
            }
        }
    }

    if texts.iter().all(|t| t.trim().is_empty()) {
        return Err(PaperSumError::NoExtractableText {
            path: pdf_path.to_path_buf(),
            pages: page_count,
        });
    }

    debug!(
        "Extracted {} chars",
        texts.iter().map(|t| t.len()).sum::<usize>()
    );

    Ok(ExtractedDocument {
        pages: texts,
        title,
        page_count,
    })
}

fn classify_load_error(path: &Path, password: Option<&str>, e: PdfiumError) -> PaperSumError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if password.is_some() {
            PaperSumError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            PaperSumError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        PaperSumError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

/// `attention_is_all-you-need.pdf` → `attention is all-you-need`.
pub fn file_stem_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace('_', " ").trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_title_replaces_underscores() {
        assert_eq!(
            file_stem_title(Path::new("/papers/attention_is_all-you-need.pdf")),
            "attention is all-you-need"
        );
        assert_eq!(file_stem_title(Path::new("")), "Untitled");
    }
}

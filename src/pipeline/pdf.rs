//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and does blocking file I/O. Extraction runs on the blocking pool so
//! a large upload never stalls the Tokio workers serving other requests.
//!
//! ## Why a temp file for uploads?
//!
//! Uploads arrive as bytes. Writing them to a [`tempfile::NamedTempFile`]
//! lets the same path-based code serve both the CLI and the server, and the
//! file is removed when the handle drops, on error as well as on success.

use crate::error::InsightError;
use pdfium_render::prelude::*;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How to load pdfium and open documents.
#[derive(Debug, Clone, Default)]
pub struct PdfOptions {
    /// Directory containing the pdfium shared library; system search path if None.
    pub pdfium_dir: Option<PathBuf>,
    /// User password for encrypted reports.
    pub password: Option<String>,
}

/// Extract the text layer of every page, joined by newlines.
pub async fn extract_text(path: &Path, options: &PdfOptions) -> Result<String, InsightError> {
    validate_pdf(path)?;

    let path = path.to_path_buf();
    let options = options.clone();
    tokio::task::spawn_blocking(move || extract_text_blocking(&path, &options))
        .await
        .map_err(|e| InsightError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract text from an in-memory PDF.
pub async fn extract_text_from_bytes(
    bytes: &[u8],
    options: &PdfOptions,
) -> Result<String, InsightError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("labreport-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| InsightError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| InsightError::Internal(format!("tempfile write: {e}")))?;
    debug!("Spooled {} upload bytes to {}", bytes.len(), tmp.path().display());

    // `tmp` is dropped (and the file deleted) when extraction returns
    extract_text(tmp.path(), options).await
}

/// Check existence, readability and the `%PDF` magic bytes.
pub fn validate_pdf(path: &Path) -> Result<(), InsightError> {
    if !path.exists() {
        return Err(InsightError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            let n = f.read(&mut magic).map_err(|e| InsightError::Internal(e.to_string()))?;
            if n < 4 || &magic != b"%PDF" {
                return Err(InsightError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(InsightError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(InsightError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

fn bind_pdfium(options: &PdfOptions) -> Result<Pdfium, InsightError> {
    let bindings = match options.pdfium_dir {
        Some(ref dir) => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| InsightError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn extract_text_blocking(path: &Path, options: &PdfOptions) -> Result<String, InsightError> {
    let pdfium = bind_pdfium(options)?;
    let password = options.password.as_deref();

    let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                InsightError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                InsightError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            InsightError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let mut texts = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| InsightError::TextExtractionFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
        texts.push(text.all());
    }

    let joined = join_pages(&texts);
    info!("Extracted {} chars from {} pages", joined.len(), total_pages);
    Ok(joined)
}

/// Join per-page text with a newline, dropping trailing whitespace per page.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

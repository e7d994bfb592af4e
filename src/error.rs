//! Error types for the labreport-insight library.
//!
//! Every fallible operation in the library returns [`InsightError`]. The
//! variants are grouped by the stage that produced them so the HTTP layer can
//! map each group onto a status code without string matching:
//!
//! * **Input / PDF** errors are the caller's fault (bad upload, encrypted
//!   file) and surface as `400`.
//! * **LLM** and **parse** errors come from the provider and surface as `500`.
//! * **Config** errors are raised while building [`crate::InsightConfig`]
//!   and never reach a request handler.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the labreport-insight library.
#[derive(Debug, Error)]
pub enum InsightError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Report text was empty or whitespace only.
    #[error("No report text provided")]
    EmptyReport,

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium could not read the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set LABREPORT_PDFIUM_DIR to the directory containing libpdfium,\n\
or install pdfium where the system loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error on every attempt.
    #[error("LLM API error after {attempts} attempt(s): {message}")]
    LlmApiError { attempts: u32, message: String },

    /// A single LLM call exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The extraction reply did not contain a JSON object of test values.
    #[error("Could not parse test values from model reply: {detail}")]
    MalformedExtraction { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightError {
    /// True when the error was caused by what the caller sent rather than by
    /// the provider or the host.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            InsightError::FileNotFound { .. }
                | InsightError::NotAPdf { .. }
                | InsightError::EmptyReport
                | InsightError::CorruptPdf { .. }
                | InsightError::PasswordRequired { .. }
                | InsightError::WrongPassword { .. }
        )
    }
}

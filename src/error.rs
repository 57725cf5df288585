//! Error types for the pdf2office library.
//!
//! Every conversion routine returns `Result<ConversionReport, ConvertError>`.
//! The variants fall into four groups that callers treat differently when
//! reporting, although all of them end a CLI run with exit status 1:
//!
//! * **Usage**: the request itself is malformed (unknown format token,
//!   inconsistent configuration). Detected before any PDF is opened.
//! * **Missing input**: the source path does not exist.
//! * **Library failure**: a delegated library (pdfium, lopdf, tabula,
//!   the office writers) reported an error.
//! * **Degraded result**: the library ran cleanly but produced nothing usable
//!   (no tables, no pages). These are failures, not empty outputs.
//!
//! The Word path is the only one with two tiers; when both tiers fail the
//! primary and fallback errors are kept side by side in
//! [`ConvertError::WordConversion`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2office library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Usage errors ──────────────────────────────────────────────────────
    /// The requested target format is not one of `word`, `excel`, `ppt`.
    #[error("Unsupported format: '{token}'\nSupported formats: word, excel, ppt")]
    UnsupportedFormat { token: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    // ── PDF library errors ────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    /// The PDF could not be opened or parsed.
    #[error("Failed to open PDF '{path}': {detail}")]
    PdfOpen { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Text could not be read from a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtraction { page: usize, detail: String },

    /// pdfium returned an error while rendering a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    Rasterisation { page: usize, detail: String },

    /// The table-extraction subprocess failed or returned garbage.
    #[error("Table extraction failed: {detail}")]
    TableExtraction { detail: String },

    /// An office writer (docx, xlsx, pptx) rejected the content.
    #[error("Failed to build {kind} document: {detail}")]
    DocumentWrite { kind: &'static str, detail: String },

    // ── Degraded results ──────────────────────────────────────────────────
    /// Table extraction ran but found nothing.
    #[error("No tables found in PDF '{path}'")]
    NoTablesFound { path: PathBuf },

    /// Rasterisation ran but produced no page images.
    #[error("No pages found in PDF '{path}'")]
    NoPagesRendered { path: PathBuf },

    // ── Two-tier Word failure ─────────────────────────────────────────────
    /// The layout path failed, and the plain-text fallback failed too.
    #[error("Word conversion failed.\n  layout path: {primary}\n  fallback: {fallback}")]
    WordConversion {
        primary: Box<ConvertError>,
        fallback: Box<ConvertError>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create, write, or move a file.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// True for errors detected before any conversion was attempted.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedFormat { .. }
                | ConvertError::InvalidConfig(_)
                | ConvertError::InputNotFound { .. }
        )
    }

    /// True when a library ran cleanly but produced no usable output.
    pub fn is_degraded_result(&self) -> bool {
        matches!(
            self,
            ConvertError::NoTablesFound { .. } | ConvertError::NoPagesRendered { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

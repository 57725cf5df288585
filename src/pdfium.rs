//! Per-call pdfium binding and document opening.
//!
//! pdfium-render needs the pdfium shared library at runtime. Resolution
//! order (first match wins):
//!
//! 1. `PDFIUM_LIB_PATH` pointing at an existing library file;
//! 2. the platform library name in the current directory (`./libpdfium.so`);
//! 3. the system library search path.
//!
//! Nothing is cached process-wide: each routine binds, opens its document,
//! and drops both before returning.

use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Bind to a pdfium library following the resolution order above.
pub fn bind_pdfium() -> Result<Pdfium, ConvertError> {
    if let Some(path) = std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from) {
        if path.exists() {
            debug!("Binding pdfium from PDFIUM_LIB_PATH: {}", path.display());
            return Pdfium::bind_to_library(&path)
                .map(Pdfium::new)
                .map_err(|e| ConvertError::PdfiumUnavailable(format!("{}: {e}", path.display())));
        }
        warn!(
            "PDFIUM_LIB_PATH '{}' not found; trying default locations",
            path.display()
        );
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| ConvertError::PdfiumUnavailable(e.to_string()))
}

/// Open `pdf_path`, mapping pdfium's load errors onto password/corruption variants.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ConvertError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ConvertError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ConvertError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ConvertError::PdfOpen {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Check that a pdfium library can be bound, without opening any document.
pub fn check_available() -> Result<(), ConvertError> {
    bind_pdfium().map(|_| ())
}

//! # pdf2office
//!
//! Convert PDF documents to Word (`.docx`), Excel (`.xlsx`) or PowerPoint
//! (`.pptx`) files.
//!
//! The heavy lifting is delegated: pdfium reads positioned text and renders
//! pages, lopdf extracts plain text, tabula-java finds tables, and the office
//! containers are produced by docx-rs, rust_xlsxwriter and a small pptx
//! package writer. This crate picks a strategy per format, falls back where
//! one exists, and maps what was extracted into the target document.
//!
//! ## Strategies
//!
//! ```text
//! word   layout (pdfium segments → paragraphs) ──fail──▶ plain text per page (lopdf)
//! excel  tabula-java JSON → one sheet per table   (no tables = error)
//! ppt    pdfium raster → one picture per slide    (no pages = error)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2office::{convert_to_file, ConversionConfig, TargetFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let report = convert_to_file("report.pdf", "report.docx", TargetFormat::Word, &config)?;
//!     println!("{} bytes via {:?}", report.bytes, report.strategy);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2office` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2office = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod excel;
pub mod format;
pub mod output;
pub mod pdfium;
pub mod ppt;
pub mod word;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::convert_to_file;
pub use error::ConvertError;
pub use format::TargetFormat;
pub use output::{ConversionReport, Strategy};

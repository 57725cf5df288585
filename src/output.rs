//! Conversion results and atomic output writing.
//!
//! A conversion either produces its complete output file or nothing at all:
//! bytes are written to a temporary file next to the destination and renamed
//! into place only once the writer closure succeeds. A failed or panicking
//! writer drops the temporary file, which deletes it.

use crate::error::ConvertError;
use crate::format::TargetFormat;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which strategy produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Word primary path: positioned text segments regrouped into paragraphs.
    Layout,
    /// Word fallback path: raw per-page text, one paragraph per page.
    PlainText,
    /// Excel path: tables detected by tabula.
    Tables,
    /// PowerPoint path: one rendered image per slide.
    PageImages,
}

/// Summary of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub format: TargetFormat,
    pub output: PathBuf,
    pub strategy: Strategy,
    /// PDF pages that fed the output (0 when the extractor does not report pages).
    pub pages: usize,
    /// Worksheets written (Excel only).
    pub tables: usize,
    /// Slides written (PowerPoint only).
    pub slides: usize,
    /// Size of the written file.
    pub bytes: u64,
    /// Wall-clock time of the whole conversion.
    pub duration_ms: u64,
}

impl ConversionReport {
    pub(crate) fn new(format: TargetFormat, output: &Path, strategy: Strategy, bytes: u64) -> Self {
        Self {
            format,
            output: output.to_path_buf(),
            strategy,
            pages: 0,
            tables: 0,
            slides: 0,
            bytes,
            duration_ms: 0,
        }
    }

    /// Whether the Word conversion had to use the degraded path.
    pub fn used_fallback(&self) -> bool {
        self.strategy == Strategy::PlainText
    }
}

/// Write `output` atomically through `write`, returning the final file size.
///
/// Parent directories are created as needed. The destination is only
/// touched when `write` returns `Ok`.
pub fn write_atomically<F>(output: &Path, write: F) -> Result<u64, ConvertError>
where
    F: FnOnce(&mut File) -> Result<(), ConvertError>,
{
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| ConvertError::io(&parent, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf2office-")
        .suffix(".part")
        .tempfile_in(&parent)
        .map_err(|e| ConvertError::io(&parent, e))?;

    write(tmp.as_file_mut())?;
    tmp.as_file_mut()
        .flush()
        .map_err(|e| ConvertError::io(tmp.path(), e))?;

    let file = tmp
        .persist(output)
        .map_err(|e| ConvertError::io(output, e.error))?;
    let bytes = file
        .metadata()
        .map_err(|e| ConvertError::io(output, e))?
        .len();

    debug!("Wrote {} ({} bytes)", output.display(), bytes);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out.bin");
        let bytes = write_atomically(&out, |f| {
            f.write_all(b"hello").map_err(|e| ConvertError::io("x", e))
        })
        .unwrap();
        assert_eq!(bytes, 5);
        assert_eq!(std::fs::read(&out).unwrap(), b"hello");
    }

    #[test]
    fn failed_writer_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.bin");
        let err = write_atomically(&out, |f| {
            f.write_all(b"partial").map_err(|e| ConvertError::io("x", e))?;
            Err(ConvertError::DocumentWrite {
                kind: "test",
                detail: "boom".into(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, ConvertError::DocumentWrite { .. }));
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

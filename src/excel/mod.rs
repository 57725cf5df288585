//! PDF → Excel (`.xlsx`) conversion.
//!
//! Every table detected anywhere in the document becomes its own worksheet,
//! `Table_1` … `Table_K`, in extraction order. Finding no tables is a
//! failure rather than an empty workbook.

pub mod table;
pub mod tabula;

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::TargetFormat;
use crate::output::{write_atomically, ConversionReport, Strategy};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::io::Write;
use std::path::Path;
use tracing::info;

pub use table::{CellValue, Table};
pub use tabula::TabulaExtractor;

/// Anything that can find tables in a PDF.
pub trait TableExtractor {
    fn extract_tables(&self, pdf: &Path) -> Result<Vec<Table>, ConvertError>;
}

/// Convert `pdf` to a workbook at `output` using tabula.
pub fn convert(
    pdf: &Path,
    output: &Path,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    convert_with(pdf, output, &TabulaExtractor::from_config(config))
}

/// Convert with an explicit table extractor.
pub fn convert_with(
    pdf: &Path,
    output: &Path,
    extractor: &dyn TableExtractor,
) -> Result<ConversionReport, ConvertError> {
    info!("Extracting tables from PDF...");
    let tables = extractor.extract_tables(pdf)?;
    if tables.is_empty() {
        return Err(ConvertError::NoTablesFound {
            path: pdf.to_path_buf(),
        });
    }
    info!("Found {} table(s)", tables.len());

    let mut workbook = build_workbook(&tables).map_err(xlsx_error)?;
    let buffer = workbook.save_to_buffer().map_err(xlsx_error)?;
    let bytes = write_atomically(output, |file| {
        file.write_all(&buffer)
            .map_err(|e| ConvertError::io(output, e))
    })?;

    let mut report = ConversionReport::new(TargetFormat::Excel, output, Strategy::Tables, bytes);
    report.tables = tables.len();
    Ok(report)
}

/// Sheet name for the 0-based table index.
pub fn sheet_name(index: usize) -> String {
    format!("Table_{}", index + 1)
}

/// One worksheet per table: header strings in row 1, data rows beneath.
///
/// Every cell is written as a string so extracted text keeps leading zeros
/// and exponent-like tokens.
pub fn build_workbook(tables: &[Table]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    for (idx, table) in tables.iter().enumerate() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(idx))?;

        for (col, name) in table.columns.iter().enumerate() {
            sheet.write_string(0, column(col)?, name.as_str())?;
        }

        for (r, row) in table.rows.iter().enumerate() {
            let row_num = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            for (c, cell) in row.iter().enumerate() {
                if let CellValue::Text(s) = cell {
                    sheet.write_string(row_num, column(c)?, s.as_str())?;
                }
            }
        }
    }
    Ok(workbook)
}

fn column(index: usize) -> Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn xlsx_error(e: XlsxError) -> ConvertError {
    ConvertError::DocumentWrite {
        kind: "xlsx",
        detail: e.to_string(),
    }
}

//! Detected tables as a header plus rows of cells.
//!
//! Extractors hand over raw string grids. The first row becomes the header,
//! kept verbatim: duplicate names stay duplicated and a blank header cell is
//! an empty name. Data cells are never coerced, so `00501` or `1e3` reach the
//! sheet exactly as extracted. Blank cells are [`CellValue::Empty`].

/// One data cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
}

impl CellValue {
    fn from_raw(cell: String) -> CellValue {
        if cell.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(cell)
        }
    }
}

/// A detected table: column names plus data rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table from a raw grid whose first row is the header.
    ///
    /// Returns `None` when the grid holds no non-blank cell. Ragged rows are
    /// padded to the widest row.
    pub fn from_grid(grid: Vec<Vec<String>>) -> Option<Table> {
        if grid.iter().flatten().all(|c| c.trim().is_empty()) {
            return None;
        }

        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let mut rows = grid.into_iter().map(|mut row| {
            row.resize(width, String::new());
            row
        });

        let columns = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|name| if name.trim().is_empty() { String::new() } else { name })
            .collect();

        let rows = rows
            .map(|row| row.into_iter().map(CellValue::from_raw).collect())
            .collect();

        Some(Table { columns, rows })
    }
}

use crate::a1_notation::CellSpan;
use crate::cell::CellValue;

/// A dense grid of cells read from one worksheet or text file.
///
/// Row `i` of `data` is sheet row `i + 1`; rows are padded with nulls to a
/// common width. Merged spans use sheet coordinates.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    data: Vec<Vec<CellValue>>,
    merged: Vec<CellSpan>,
}

impl Sheet {
    /// Create a sheet from rows of cells, padding short rows with nulls
    #[must_use]
    pub fn from_rows(data: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Sheet {
            data,
            merged: Vec::new(),
        };
        sheet.pad_rows();
        sheet
    }

    #[must_use]
    pub fn data(&self) -> &[Vec<CellValue>] {
        &self.data
    }

    /// Merged regions of the source worksheet (always empty for text files)
    #[must_use]
    pub fn merged_spans(&self) -> &[CellSpan] {
        &self.merged
    }

    pub fn set_merged_spans(&mut self, spans: Vec<CellSpan>) {
        self.merged = spans;
    }

    /// Get the number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Get the number of columns (width of the widest row)
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.data.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Get a cell by 0-based coordinates
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.data.get(row).and_then(|r| r.get(col))
    }

    fn pad_rows(&mut self) {
        let width = self.col_count();
        for row in &mut self.data {
            row.resize(width, CellValue::Null);
        }
    }

    /// Split into rows and merged spans, consuming the sheet.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec<CellValue>>, Vec<CellSpan>) {
        (self.data, self.merged)
    }
}

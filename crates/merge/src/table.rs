use serde::{Deserialize, Serialize};
use sheetmerge_sheet::{CellSpan, CellValue};

/// One row of cells
pub type Row = Vec<CellValue>;

/// Header text appended to the last header row when rows carry their source file.
pub const SOURCE_LABEL_HEADER: &str = "Source file";

/// A unified table: preamble, header block, header merges and data rows.
///
/// `merged_spans` keep the row numbers of the file they were read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub preamble: Vec<Row>,
    pub header: Vec<Row>,
    pub merged_spans: Vec<CellSpan>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Column count given by the last header row
    #[must_use]
    pub fn width(&self) -> usize {
        self.header.last().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    /// True when there is nothing worth writing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() || self.rows.is_empty()
    }

    /// Append the source label column title to the last header row.
    pub fn push_label_header(&mut self) {
        if let Some(last) = self.header.last_mut() {
            last.push(CellValue::from(SOURCE_LABEL_HEADER));
        }
    }
}

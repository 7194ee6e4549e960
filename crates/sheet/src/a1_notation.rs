use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};

/// Rectangular block of merged cells, 1-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSpan {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl CellSpan {
    #[must_use]
    pub fn new(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        CellSpan {
            min_row,
            min_col,
            max_row,
            max_col,
        }
    }

    /// Shift the span vertically by `delta` rows; columns are unchanged.
    ///
    /// Returns `None` when the shifted span would start above row 1.
    #[must_use]
    pub fn translate_rows(&self, delta: i64) -> Option<CellSpan> {
        let min_row = i64::from(self.min_row) + delta;
        let max_row = i64::from(self.max_row) + delta;
        if min_row < 1 {
            return None;
        }
        Some(CellSpan {
            min_row: u32::try_from(min_row).ok()?,
            min_col: self.min_col,
            max_row: u32::try_from(max_row).ok()?,
            max_col: self.max_col,
        })
    }

    #[must_use]
    pub fn is_single_cell(&self) -> bool {
        self.min_row == self.max_row && self.min_col == self.max_col
    }

    /// A1-style text such as `A2:C2`
    #[must_use]
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_letters(self.min_col.saturating_sub(1) as usize),
            self.min_row,
            column_letters(self.max_col.saturating_sub(1) as usize),
            self.max_row
        )
    }
}

/// Convert a column reference to a 0-based column index.
///
/// Letters are read as bijective base-26 (A=0, B=1, ... Z=25, AA=26, AB=27, ...),
/// case-insensitively. A purely numeric reference is a 1-based column number.
pub fn column_index(reference: &str) -> Result<usize> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(SheetError::InvalidColumn(reference.to_string()));
    }

    if reference.bytes().all(|b| b.is_ascii_digit()) {
        let number = reference
            .parse::<usize>()
            .map_err(|_| SheetError::InvalidColumn(reference.to_string()))?;
        return number
            .checked_sub(1)
            .ok_or_else(|| SheetError::InvalidColumn(reference.to_string()));
    }

    let mut col: usize = 0;
    for b in reference.bytes() {
        let upper = b.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return Err(SheetError::InvalidColumn(reference.to_string()));
        }
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add((upper - b'A') as usize + 1))
            .ok_or_else(|| SheetError::InvalidColumn(reference.to_string()))?;
    }

    Ok(col - 1) // Convert to 0-based
}

/// Convert 0-based column index to column letters
/// 0=A, 1=B, ... 25=Z, 26=AA, 27=AB, ...
#[must_use]
pub fn column_letters(mut col: usize) -> String {
    let mut result = String::new();
    col += 1; // Convert to 1-based for calculation

    while col > 0 {
        col -= 1;
        result.insert(0, ((col % 26) as u8 + b'A') as char);
        col /= 26;
    }

    result
}

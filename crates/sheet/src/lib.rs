//! Cell-level primitives for sheetmerge
//!
//! Loads one worksheet or delimited-text file into a dense grid of typed
//! cells, keeping merged regions for workbooks.
//!
//! # Examples
//!
//! ## Column references
//!
//! ```
//! use sheetmerge_sheet::{column_index, column_letters};
//!
//! assert_eq!(column_index("A").unwrap(), 0);
//! assert_eq!(column_index("AB").unwrap(), 27);
//! assert_eq!(column_letters(26), "AA");
//! ```
//!
//! ## Loading files
//!
//! ```no_run
//! use sheetmerge_sheet::{Sheet, WorkbookKind};
//!
//! let sheet = Sheet::from_workbook("report.xlsx", WorkbookKind::Xlsx, true).unwrap();
//! let (csv_sheet, dialect) = Sheet::from_delimited("export.csv").unwrap();
//! println!("{} rows, encoding {}", csv_sheet.row_count(), dialect.encoding.label());
//! ```

mod a1_notation;
mod cell;
mod csv;
mod error;
mod sheet;
mod xlsx;

/// Re-export column helpers and merged span type.
pub use a1_notation::{column_index, column_letters, CellSpan};
/// Re-export cell value type.
pub use cell::{from_excel_serial, to_excel_serial, CellValue};
/// Re-export delimited-text decoding.
pub use self::csv::{
    decode_text, sniff_delimiter, CsvOptions, TextDialect, TextEncoding, DELIMITER_CANDIDATES,
    ENCODING_CANDIDATES, SNIFF_SAMPLE_LEN,
};
/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export sheet type.
pub use sheet::Sheet;
/// Re-export workbook kinds.
pub use xlsx::WorkbookKind;

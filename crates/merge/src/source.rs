//! Row source reader: extracts preamble, header, header merges and data rows
//! from one input file.

use crate::error::SourceError;
use crate::table::Row;
use sheetmerge_sheet::{CellSpan, CellValue, Sheet, WorkbookKind};
use std::path::{Path, PathBuf};

/// File extensions accepted as input, lower case.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xls", "csv", "tsv", "txt"];

/// Input format, resolved once from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet(WorkbookKind),
    DelimitedText,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "xlsx" | "xlsm" => Ok(SourceFormat::Spreadsheet(WorkbookKind::Xlsx)),
            "xls" => Ok(SourceFormat::Spreadsheet(WorkbookKind::Xls)),
            "csv" | "tsv" | "txt" => Ok(SourceFormat::DelimitedText),
            _ => Err(SourceError::UnsupportedFormat { extension }),
        }
    }

    /// Whether the format can carry merged cells
    #[must_use]
    pub fn supports_merged_cells(self) -> bool {
        matches!(self, SourceFormat::Spreadsheet(_))
    }
}

/// One input file and where its header sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// 1-based first header row
    pub header_start_row: usize,
    pub header_rows: usize,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, header_start_row: usize, header_rows: usize) -> Self {
        SourceFile {
            path: path.into(),
            header_start_row,
            header_rows,
        }
    }

    /// Base name used in reports and as the source label
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    /// Last header row, 1-based
    #[must_use]
    pub fn header_end_row(&self) -> usize {
        self.header_start_row + self.header_rows - 1
    }

    /// Rows a file must have: the header block plus one data row
    #[must_use]
    pub fn required_rows(&self) -> usize {
        self.header_start_row + self.header_rows
    }
}

/// What the caller wants out of one read
#[derive(Debug, Clone, Default)]
pub struct ReadRequest {
    /// First file of the run: keep preamble, header and header merges
    pub capture_header: bool,
    /// Appended as the last cell of every data row
    pub source_label: Option<String>,
    /// Return a blank separator row and this file's header block ahead of the data
    pub repeat_headers: bool,
    /// Canonical row width; rows are padded to it before labelling
    pub row_width: Option<usize>,
}

/// Pieces extracted from one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceExtract {
    pub preamble: Vec<Row>,
    pub header: Vec<Row>,
    pub merged_spans: Vec<CellSpan>,
    /// Separator row and repeated header rows for a later file, kept apart
    /// from `data_rows` so they are never mistaken for data
    pub in_band_header: Vec<Row>,
    pub data_rows: Vec<Row>,
    /// Total rows found in the file
    pub row_count: usize,
    /// Cells up to the last non-null one in the file's last header row
    pub header_width: usize,
}

/// Load every row of `source`, checking it is tall enough for the header block.
///
/// Merged regions are read only when `with_merged` is set and the format has them.
pub(crate) fn load_rows(
    source: &SourceFile,
    with_merged: bool,
) -> Result<(Vec<Row>, Vec<CellSpan>), SourceError> {
    let format = SourceFormat::from_path(&source.path)?;

    let sheet = match format {
        SourceFormat::Spreadsheet(kind) => Sheet::from_workbook(
            &source.path,
            kind,
            with_merged && format.supports_merged_cells(),
        )?,
        SourceFormat::DelimitedText => Sheet::from_delimited(&source.path)?.0,
    };

    let (rows, spans) = sheet.into_parts();
    if rows.len() < source.required_rows() {
        return Err(SourceError::Structure {
            rows: rows.len(),
            needed: source.required_rows(),
        });
    }
    Ok((rows, spans))
}

/// Read one file.
pub fn read(source: &SourceFile, request: &ReadRequest) -> Result<SourceExtract, SourceError> {
    let (mut rows, spans) = load_rows(source, request.capture_header)?;
    let row_count = rows.len();

    let header_start = source.header_start_row - 1;
    let header_end = source.header_end_row();

    let data_rows: Vec<Row> = rows.split_off(header_end);
    let header: Vec<Row> = rows.split_off(header_start);
    let preamble = rows;

    let width = request
        .row_width
        .unwrap_or_else(|| header.last().map_or(0, Vec::len));
    let label_cells = usize::from(request.source_label.is_some());

    let mut extract = SourceExtract {
        row_count,
        header_width: filled_width(header.last()),
        ..SourceExtract::default()
    };

    if request.repeat_headers && !request.capture_header {
        extract
            .in_band_header
            .push(vec![CellValue::Null; width + label_cells]);
        for header_row in &header {
            let mut row = header_row.clone();
            pad(&mut row, width);
            if label_cells > 0 {
                row.push(CellValue::Null);
            }
            extract.in_band_header.push(row);
        }
    }

    for mut row in data_rows {
        pad(&mut row, width);
        if let Some(label) = &request.source_label {
            row.push(CellValue::String(label.clone()));
        }
        extract.data_rows.push(row);
    }

    if request.capture_header {
        extract.preamble = preamble;
        extract.merged_spans = spans
            .into_iter()
            .filter(|span| span.min_row as usize <= header_end)
            .collect();
        extract.header = header;
    }

    tracing::debug!(
        file = %source.file_name(),
        rows = row_count,
        data_rows = extract.data_rows.len(),
        "read source file"
    );
    Ok(extract)
}

fn filled_width(row: Option<&Row>) -> usize {
    row.map_or(0, |row| {
        row.iter()
            .rposition(|cell| !cell.is_null())
            .map_or(0, |last| last + 1)
    })
}

fn pad(row: &mut Row, width: usize) {
    if row.len() < width {
        row.resize(width, CellValue::Null);
    }
}

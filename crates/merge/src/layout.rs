//! Layout writer: renders a [`Table`] into a styled single-sheet workbook.

use crate::error::WriteError;
use crate::options::LayoutOptions;
use crate::table::{Row, Table};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use sheetmerge_sheet::{to_excel_serial, CellSpan, CellValue};
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "Compilation";
const HEADER_FILL: u32 = 0x2E_7D32;
const HEADER_TEXT: u32 = 0xFF_FFFF;
/// Padding added to the longest value of a column
const WIDTH_PADDING: f64 = 2.0;

struct Styles {
    preamble: Format,
    header: Format,
    cell: Format,
    preamble_date: Format,
    header_date: Format,
    cell_date: Format,
}

impl Styles {
    fn new(date_pattern: &str) -> Self {
        let preamble = Format::new().set_italic();
        let header = Format::new()
            .set_bold()
            .set_font_color(Color::RGB(HEADER_TEXT))
            .set_background_color(Color::RGB(HEADER_FILL))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);
        let cell = Format::new().set_border(FormatBorder::Thin);

        Styles {
            preamble_date: preamble.clone().set_num_format(date_pattern),
            header_date: header.clone().set_num_format(date_pattern),
            cell_date: cell.clone().set_num_format(date_pattern),
            preamble,
            header,
            cell,
        }
    }
}

#[derive(Clone, Copy)]
enum Region {
    Preamble,
    Header,
    Data,
}

impl Region {
    fn formats(self, styles: &Styles) -> (&Format, &Format) {
        match self {
            Region::Preamble => (&styles.preamble, &styles.preamble_date),
            Region::Header => (&styles.header, &styles.header_date),
            Region::Data => (&styles.cell, &styles.cell_date),
        }
    }
}

/// Write `table` to `path` as a fresh workbook and return the written path.
///
/// `original_header_start_row` is the 1-based row the header occupied in its
/// source file; merged spans are shifted from there to where the header lands.
/// Nothing touches `path` until the final save.
pub fn write_table(
    table: &Table,
    original_header_start_row: usize,
    options: &LayoutOptions,
    path: &Path,
) -> Result<PathBuf, WriteError> {
    let mut workbook = build_workbook(table, original_header_start_row, options)
        .map_err(|e| write_error(path, &e))?;

    workbook.save(path).map_err(|e| match e {
        XlsxError::IoError(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            WriteError::OutputLocked {
                path: path.to_path_buf(),
            }
        }
        other => write_error(path, &other),
    })?;

    tracing::info!(
        path = %path.display(),
        rows = table.rows.len(),
        "workbook written"
    );
    Ok(path.to_path_buf())
}

fn build_workbook(
    table: &Table,
    original_header_start_row: usize,
    options: &LayoutOptions,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let styles = Styles::new(options.date_format.pattern());
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let mut cursor = 0usize;
    for row in &table.preamble {
        write_row(worksheet, cursor, row, Region::Preamble, &styles)?;
        cursor += 1;
    }

    // 1-based output row of the first header row
    let header_start_new = cursor + 1;
    for row in &table.header {
        write_row(worksheet, cursor, row, Region::Header, &styles)?;
        cursor += 1;
    }

    for row in &table.rows {
        write_row(worksheet, cursor, row, Region::Data, &styles)?;
        cursor += 1;
    }

    if options.preserve_merged_header_cells && !table.merged_spans.is_empty() {
        let delta = header_start_new as i64 - original_header_start_row as i64;
        apply_merged_spans(worksheet, table, delta, header_start_new, &styles)?;
    }

    if options.auto_column_width {
        let widths = column_widths(table, options.max_column_width);
        for (col, width) in widths.into_iter().enumerate() {
            worksheet.set_column_width(col_num(col)?, width)?;
        }
    }

    if options.freeze_header {
        let first_data_row = table.preamble.len() + table.header.len();
        worksheet.set_freeze_panes(row_num(first_data_row)?, 0)?;
    }

    Ok(workbook)
}

fn write_row(
    worksheet: &mut Worksheet,
    row: usize,
    cells: &[CellValue],
    region: Region,
    styles: &Styles,
) -> Result<(), XlsxError> {
    let row = row_num(row)?;
    let (format, date_format) = region.formats(styles);
    for (col, value) in cells.iter().enumerate() {
        if matches!(region, Region::Preamble) && value.is_null() {
            continue;
        }
        write_cell(worksheet, row, col_num(col)?, value, format, date_format)?;
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
    date_format: &Format,
) -> Result<(), XlsxError> {
    match value {
        CellValue::Null => worksheet.write_blank(row, col, format)?,
        CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, format)?,
        CellValue::Int(i) => worksheet.write_number_with_format(row, col, *i as f64, format)?,
        CellValue::Float(f) if f.is_finite() => {
            worksheet.write_number_with_format(row, col, *f, format)?
        }
        CellValue::Float(f) => worksheet.write_string_with_format(row, col, f.to_string(), format)?,
        CellValue::String(s) => worksheet.write_string_with_format(row, col, s, format)?,
        CellValue::DateTime(dt) => {
            worksheet.write_number_with_format(row, col, to_excel_serial(dt), date_format)?
        }
    };
    Ok(())
}

fn apply_merged_spans(
    worksheet: &mut Worksheet,
    table: &Table,
    delta: i64,
    header_start_new: usize,
    styles: &Styles,
) -> Result<(), XlsxError> {
    let top_rows: Vec<&Row> = table.preamble.iter().chain(&table.header).collect();

    for span in &table.merged_spans {
        let Some(moved) = span.translate_rows(delta) else {
            tracing::warn!(span = %span.to_a1(), delta, "merged span moves above the first row");
            continue;
        };
        if moved.is_single_cell() {
            continue;
        }

        let region = if (moved.min_row as usize) < header_start_new {
            Region::Preamble
        } else {
            Region::Header
        };
        let (format, date_format) = region.formats(styles);
        let (first_row, first_col) = (moved.min_row - 1, moved.min_col - 1);
        let anchor = top_rows
            .get(first_row as usize)
            .and_then(|row| row.get(first_col as usize))
            .unwrap_or(&CellValue::Null);

        if let Err(e) = merge_span(worksheet, &moved, format) {
            tracing::warn!(span = %moved.to_a1(), error = %e, "could not merge cells");
            continue;
        }
        // merge_range writes text only; rewrite the anchor with its typed value
        let col = u16::try_from(first_col).map_err(|_| XlsxError::RowColumnLimitError)?;
        write_cell(worksheet, first_row, col, anchor, format, date_format)?;
    }
    Ok(())
}

fn merge_span(worksheet: &mut Worksheet, span: &CellSpan, format: &Format) -> Result<(), XlsxError> {
    let first_col = u16::try_from(span.min_col - 1).map_err(|_| XlsxError::RowColumnLimitError)?;
    let last_col = u16::try_from(span.max_col - 1).map_err(|_| XlsxError::RowColumnLimitError)?;
    worksheet.merge_range(
        span.min_row - 1,
        first_col,
        span.max_row - 1,
        last_col,
        "",
        format,
    )?;
    Ok(())
}

/// Width per column: longest stringified value plus padding, capped at `max_width`.
fn column_widths(table: &Table, max_width: f64) -> Vec<f64> {
    let mut longest: Vec<usize> = Vec::new();
    let rows = table.preamble.iter().chain(&table.header).chain(&table.rows);
    for row in rows {
        if longest.len() < row.len() {
            longest.resize(row.len(), 0);
        }
        for (col, value) in row.iter().enumerate() {
            let len = match value {
                CellValue::Null => 0,
                other => other.to_string().chars().count(),
            };
            longest[col] = longest[col].max(len);
        }
    }
    longest
        .into_iter()
        .map(|len| (len as f64 + WIDTH_PADDING).min(max_width))
        .collect()
}

fn row_num(row: usize) -> Result<u32, XlsxError> {
    u32::try_from(row).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_num(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_error(path: &Path, err: &XlsxError) -> WriteError {
    WriteError::Write {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

use crate::a1_notation::CellSpan;
use crate::cell::{from_excel_serial, CellValue};
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use calamine::{Data, Dimensions, Range, Reader, Xls, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Workbook container formats understood by the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookKind {
    /// Office Open XML (`.xlsx`, `.xlsm`)
    Xlsx,
    /// Legacy BIFF8 (`.xls`)
    Xls,
}

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return CellValue::Float(dt.as_f64());
            }
            from_excel_serial(dt.as_f64())
                .map_or(CellValue::Float(dt.as_f64()), CellValue::DateTime)
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map_or_else(|| CellValue::String(s.clone()), CellValue::DateTime),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn span_from_dimensions(dims: &Dimensions) -> CellSpan {
    CellSpan::new(
        dims.start.0 + 1,
        dims.start.1 + 1,
        dims.end.0 + 1,
        dims.end.1 + 1,
    )
}

fn workbook_error<E: std::fmt::Display>(err: E) -> SheetError {
    SheetError::Workbook(err.to_string())
}

/// Build rows anchored at sheet row 1 / column A.
///
/// calamine trims the used range to its first non-empty cell, so the
/// leading offset is restored here.
fn rows_from_range(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let start_row = start_row as usize;
    let start_col = start_col as usize;
    let width = start_col + range.width();

    let mut data: Vec<Vec<CellValue>> = Vec::with_capacity(start_row + range.height());
    data.resize(start_row, vec![CellValue::Null; width]);

    for row in range.rows() {
        let mut cells = vec![CellValue::Null; start_col];
        cells.extend(row.iter().map(data_to_cell_value));
        cells.resize(width, CellValue::Null);
        data.push(cells);
    }

    data
}

impl Sheet {
    /// Load the first worksheet of a workbook, with cached cell values.
    ///
    /// Merged regions are collected only when `with_merged` is set. The file
    /// handle is dropped before returning.
    pub fn from_workbook<P: AsRef<Path>>(
        path: P,
        kind: WorkbookKind,
        with_merged: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SheetError::from_io(e, path))?;
        let reader = BufReader::new(file);

        match kind {
            WorkbookKind::Xlsx => {
                let mut workbook: Xlsx<BufReader<File>> =
                    Xlsx::new(reader).map_err(workbook_error)?;
                let name = first_sheet_name(&workbook.sheet_names(), path)?;
                let range = workbook.worksheet_range(&name).map_err(workbook_error)?;

                let mut sheet = Sheet::from_rows(rows_from_range(&range));

                if with_merged {
                    workbook.load_merged_regions().map_err(workbook_error)?;
                    let spans = workbook
                        .worksheet_merge_cells(&name)
                        .transpose()
                        .map_err(workbook_error)?
                        .unwrap_or_default()
                        .iter()
                        .map(span_from_dimensions)
                        .collect();
                    sheet.set_merged_spans(spans);
                }
                Ok(sheet)
            }
            WorkbookKind::Xls => {
                let mut workbook: Xls<BufReader<File>> =
                    Xls::new(reader).map_err(workbook_error)?;
                let name = first_sheet_name(&workbook.sheet_names(), path)?;
                let range = workbook.worksheet_range(&name).map_err(workbook_error)?;

                let mut sheet = Sheet::from_rows(rows_from_range(&range));

                if with_merged {
                    let spans = workbook
                        .worksheet_merge_cells(&name)
                        .unwrap_or_default()
                        .iter()
                        .map(span_from_dimensions)
                        .collect();
                    sheet.set_merged_spans(spans);
                }
                Ok(sheet)
            }
        }
    }
}

fn first_sheet_name(names: &[String], path: &Path) -> Result<String> {
    names
        .first()
        .cloned()
        .ok_or_else(|| SheetError::EmptyWorkbook {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};
    use tempfile::tempdir;

    #[test]
    fn test_rows_anchor_at_sheet_origin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(2, 1, "Name").unwrap();
        worksheet.write_number(3, 1, 7).unwrap();
        workbook.save(&path).unwrap();

        let sheet = Sheet::from_workbook(&path, WorkbookKind::Xlsx, false).unwrap();

        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.col_count(), 2);
        assert_eq!(sheet.get(0, 0), Some(&CellValue::Null));
        assert_eq!(sheet.get(2, 1), Some(&CellValue::String("Name".to_string())));
        assert_eq!(sheet.get(3, 1), Some(&CellValue::Float(7.0)));
    }

    #[test]
    fn test_merged_regions_are_one_based() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("merged.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .merge_range(0, 0, 0, 2, "Title", &Format::new())
            .unwrap();
        worksheet.write_string(1, 0, "a").unwrap();
        workbook.save(&path).unwrap();

        let with = Sheet::from_workbook(&path, WorkbookKind::Xlsx, true).unwrap();
        assert_eq!(with.merged_spans(), &[CellSpan::new(1, 1, 1, 3)]);

        let without = Sheet::from_workbook(&path, WorkbookKind::Xlsx, false).unwrap();
        assert!(without.merged_spans().is_empty());
    }

    #[test]
    fn test_dates_become_datetime_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        worksheet
            .write_number_with_format(0, 0, 45_296.0, &date_format)
            .unwrap();
        workbook.save(&path).unwrap();

        let sheet = Sheet::from_workbook(&path, WorkbookKind::Xlsx, false).unwrap();
        let cell = sheet.get(0, 0).unwrap();
        assert!(matches!(cell, CellValue::DateTime(_)));
        assert_eq!(cell.to_string(), "2024-01-05 00:00:00");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = Sheet::from_workbook(dir.path().join("nope.xlsx"), WorkbookKind::Xlsx, false);
        assert!(matches!(result, Err(SheetError::Io(_))));
    }

    #[test]
    fn test_corrupt_file_is_workbook_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let result = Sheet::from_workbook(&path, WorkbookKind::Xlsx, false);
        assert!(matches!(result, Err(SheetError::Workbook(_))));
    }
}

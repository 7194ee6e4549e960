use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use sheetmerge::layout::SHEET_NAME;
use sheetmerge::{
    compile, merge, LayoutOptions, MergeConfig, MergeError, NormalizationOptions, RunOutcome,
    SortSpec, WriteError,
};
use sheetmerge_sheet::{column_index, CellSpan, CellValue};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn write_xlsx(dir: &Path, name: &str, rows: &[&[&str]]) -> PathBuf {
    let path = dir.join(name);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if let Ok(n) = value.parse::<f64>() {
                worksheet.write_number(r as u32, c as u16, n).unwrap();
            } else if !value.is_empty() {
                worksheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save(&path).unwrap();
    path
}

fn plain_config() -> MergeConfig {
    MergeConfig {
        normalization: NormalizationOptions {
            add_source_label: false,
            deduplicate: false,
            sort: None,
            remove_empty_rows: false,
            repeat_headers: false,
        },
        ..MergeConfig::default()
    }
}

fn cells(values: &[(&str, i64)]) -> Vec<Vec<CellValue>> {
    values
        .iter()
        .map(|(name, n)| vec![CellValue::from(*name), CellValue::Int(*n)])
        .collect()
}

#[test]
fn test_three_files_keep_file_order() {
    let dir = tempdir().unwrap();
    let first = write_csv(dir.path(), "1.csv", "Name,Age\nAnn,30\nBo,25\n");
    let second = write_csv(dir.path(), "2.csv", "Name,Age\nCy,41\n");
    let third = write_csv(dir.path(), "3.csv", "Name,Age\nDi,19\n");

    let result = merge(&[first, second, third], &plain_config(), |_| {});

    assert_eq!(
        result.table.header,
        vec![vec![CellValue::from("Name"), CellValue::from("Age")]]
    );
    assert_eq!(
        result.table.rows,
        cells(&[("Ann", 30), ("Bo", 25), ("Cy", 41), ("Di", 19)])
    );
    assert_eq!(result.succeeded, vec!["1.csv", "2.csv", "3.csv"]);
    assert!(result.failed.is_empty());
}

#[test]
fn test_sort_on_column_letter() {
    let dir = tempdir().unwrap();
    let file = write_csv(dir.path(), "a.csv", "Key,N\nB,2\nA,1\nC,3\n");
    let config = MergeConfig {
        normalization: NormalizationOptions {
            sort: Some(SortSpec {
                column: column_index("A").unwrap(),
            }),
            ..plain_config().normalization
        },
        ..plain_config()
    };

    let result = merge(&[file], &config, |_| {});

    assert_eq!(result.table.rows, cells(&[("A", 1), ("B", 2), ("C", 3)]));
}

#[test]
fn test_duplicates_across_files() {
    let dir = tempdir().unwrap();
    let first = write_csv(dir.path(), "a.csv", "Key,N\nA,1\nB,2\n");
    let second = write_csv(dir.path(), "b.csv", "Key,N\nA,1\nC,3\n");
    let config = MergeConfig {
        normalization: NormalizationOptions {
            deduplicate: true,
            ..plain_config().normalization
        },
        ..plain_config()
    };

    let result = merge(&[first, second], &config, |_| {});

    assert_eq!(result.table.rows, cells(&[("A", 1), ("B", 2), ("C", 3)]));
    assert_eq!(result.normalization.duplicates_removed, 1);
}

#[test]
fn test_labelled_duplicates_are_distinct_rows() {
    let dir = tempdir().unwrap();
    let first = write_csv(dir.path(), "a.csv", "Key,N\nA,1\n");
    let second = write_csv(dir.path(), "b.csv", "Key,N\nA,1\n");

    let result = merge(&[first, second], &MergeConfig::default(), |_| {});

    assert_eq!(result.table.rows.len(), 2);
    assert_eq!(result.normalization.duplicates_removed, 0);
}

#[test]
fn test_short_file_recorded_as_failed() {
    let dir = tempdir().unwrap();
    let good = write_csv(dir.path(), "good.csv", "Title\nName,Age\nAnn,30\n");
    let short = write_csv(dir.path(), "short.csv", "Title\nName,Age\n");
    let config = MergeConfig {
        header_start_row: 2,
        ..plain_config()
    };

    let result = merge(&[good, short], &config, |_| {});

    assert_eq!(result.succeeded, vec!["good.csv"]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].file, "short.csv");
    assert!(result.failed[0].reason.contains("Incompatible header structure"));
    assert_eq!(result.table.rows.len(), 1);
    assert_eq!(
        result.table.preamble,
        vec![vec![CellValue::from("Title"), CellValue::Null]]
    );
}

#[test]
fn test_empty_filter_ignores_source_label() {
    let dir = tempdir().unwrap();
    let file = write_csv(dir.path(), "a.csv", "Name,Age\nAnn,30\n , \nBo,25\n");
    let config = MergeConfig {
        normalization: NormalizationOptions {
            remove_empty_rows: true,
            ..NormalizationOptions::default()
        },
        ..MergeConfig::default()
    };

    let result = merge(&[file], &config, |_| {});

    assert_eq!(result.table.rows.len(), 2);
    assert_eq!(result.normalization.empty_rows_removed, 1);
    assert!(result
        .table
        .rows
        .iter()
        .all(|row| row[2] == CellValue::from("a.csv")));
}

#[test]
fn test_semicolon_latin1_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.csv");
    // "Ville;Code\nBézier;1\n" with é as a single latin-1 byte
    let mut bytes = b"Ville;Code\nB".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"zier;1\n");
    std::fs::write(&path, bytes).unwrap();

    let result = merge(&[path], &plain_config(), |_| {});

    assert_eq!(
        result.table.header,
        vec![vec![CellValue::from("Ville"), CellValue::from("Code")]]
    );
    assert_eq!(
        result.table.rows,
        vec![vec![CellValue::from("Bézier"), CellValue::Int(1)]]
    );
}

#[test]
fn test_merged_header_span_translated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.xlsx");

    // Header on source row 2 with A2:C2 merged
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Generated").unwrap();
    worksheet
        .merge_range(1, 0, 1, 2, "People", &Format::new())
        .unwrap();
    worksheet.write_string(2, 0, "Ann").unwrap();
    worksheet.write_number(2, 1, 30).unwrap();
    worksheet.write_string(2, 2, "x").unwrap();
    workbook.save(&path).unwrap();

    let config = MergeConfig {
        header_start_row: 2,
        layout: LayoutOptions {
            preserve_merged_header_cells: true,
            ..LayoutOptions::default()
        },
        ..plain_config()
    };

    let result = merge(&[&path], &config, |_| {});
    assert_eq!(result.table.merged_spans, vec![CellSpan::new(2, 1, 2, 3)]);

    // Three extra preamble rows push the header down to output row 5
    let mut table = result.table.clone();
    for _ in 0..3 {
        table.preamble.push(vec![CellValue::from("note")]);
    }
    let out = dir.path().join("out.xlsx");
    sheetmerge::write_table(&table, config.header_start_row, &config.layout, &out).unwrap();

    let mut written: Xlsx<_> = open_workbook(&out).unwrap();
    written.load_merged_regions().unwrap();
    let regions: Vec<_> = written
        .worksheet_merge_cells(SHEET_NAME)
        .unwrap_or(Ok(Vec::new()))
        .unwrap()
        .into_iter()
        .map(|dims| (dims.start, dims.end))
        .collect();
    assert_eq!(regions, vec![((4, 0), (4, 2))]);

    let range = written.worksheet_range(SHEET_NAME).unwrap();
    assert_eq!(range.get_value((4, 0)), Some(&Data::String("People".into())));
    assert_eq!(range.get_value((5, 1)), Some(&Data::Float(30.0)));
}

#[test]
fn test_compile_writes_workbook() {
    let dir = tempdir().unwrap();
    let first = write_xlsx(dir.path(), "a.xlsx", &[&["Name", "Age"], &["Ann", "30"]]);
    let second = write_csv(dir.path(), "b.csv", "Name,Age\nBo,25\n");
    let config = MergeConfig {
        output_name: "merged".to_string(),
        ..MergeConfig::default()
    };

    let outcome = compile(&[first, second], &config, dir.path(), |_| {}).unwrap();

    let path = outcome.output_path().unwrap().to_path_buf();
    assert_eq!(path, dir.path().join("merged.xlsx"));
    assert_eq!(outcome.result().table.rows.len(), 2);

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    assert_eq!(range.get_value((0, 2)), Some(&Data::String("Source file".into())));
    assert_eq!(range.get_value((1, 0)), Some(&Data::String("Ann".into())));
    assert_eq!(range.get_value((1, 2)), Some(&Data::String("a.xlsx".into())));
    assert_eq!(range.get_value((2, 1)), Some(&Data::Float(25.0)));
    assert_eq!(range.get_value((2, 2)), Some(&Data::String("b.csv".into())));
}

#[test]
fn test_compile_nothing_to_write() {
    let dir = tempdir().unwrap();
    let bad = write_csv(dir.path(), "notes.pdf", "x");

    let outcome = compile(&[bad], &MergeConfig::default(), dir.path(), |_| {}).unwrap();

    assert!(matches!(outcome, RunOutcome::NothingToWrite(_)));
    assert!(outcome.output_path().is_none());
    assert_eq!(outcome.result().failed.len(), 1);
    assert!(!dir.path().join("compilation.xlsx").exists());
}

#[test]
fn test_compile_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let file = write_csv(dir.path(), "a.csv", "Name\nAnn\n");
    let config = MergeConfig {
        header_rows: 0,
        ..MergeConfig::default()
    };

    let err = compile(&[file], &config, dir.path(), |_| {}).unwrap_err();
    assert!(matches!(err, MergeError::InvalidConfig(_)));

    let none: [PathBuf; 0] = [];
    let err = compile(&none, &MergeConfig::default(), dir.path(), |_| {}).unwrap_err();
    assert!(matches!(err, MergeError::NoInput));
}

#[test]
fn test_compile_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let file = write_csv(dir.path(), "a.csv", "Name\nAnn\n");
    let missing = dir.path().join("nope");

    let err = compile(&[file], &MergeConfig::default(), &missing, |_| {}).unwrap_err();
    assert!(matches!(err, MergeError::Write(WriteError::Write { .. })));
}

use rust_xlsxwriter::{Format, Workbook};
use sheetmerge_sheet::{
    column_index, column_letters, decode_text, sniff_delimiter, CellSpan, CellValue, Sheet,
    SheetError, TextEncoding, WorkbookKind,
};
use tempfile::tempdir;

// ===== Column Reference Tests =====

#[test]
fn test_column_letter_mapping() {
    assert_eq!(column_index("A").unwrap(), 0);
    assert_eq!(column_index("Z").unwrap(), 25);
    assert_eq!(column_index("AA").unwrap(), 26);
    assert_eq!(column_index("AB").unwrap(), 27);
    assert_eq!(column_index("ab").unwrap(), 27);
    assert_eq!(column_index("3").unwrap(), 2);

    for col in [0, 25, 26, 701, 702, 16383] {
        assert_eq!(column_index(&column_letters(col)).unwrap(), col);
    }
}

#[test]
fn test_invalid_column_reference() {
    assert!(matches!(
        column_index("A-1"),
        Err(SheetError::InvalidColumn(_))
    ));
    assert!(column_index("0").is_err());
    assert!(column_index("").is_err());
}

// ===== Delimited Text Tests =====

#[test]
fn test_csv_dialects() {
    let dir = tempdir().unwrap();
    let cases: [(&str, &[u8], u8); 3] = [
        ("comma.csv", b"a,b\n1,2\n", b','),
        ("semi.csv", b"a;b\n1;2\n", b';'),
        ("tabs.tsv", b"a\tb\n1\t2\n", b'\t'),
    ];

    for (name, bytes, delimiter) in cases {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();

        let (sheet, dialect) = Sheet::from_delimited(&path).unwrap();
        assert_eq!(dialect.delimiter, delimiter, "{name}");
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Int(2));
    }
}

#[test]
fn test_bom_and_latin1() {
    let (encoding, text) = decode_text(b"\xEF\xBB\xBFName\n").unwrap();
    assert_eq!(encoding, TextEncoding::Utf8Sig);
    assert_eq!(text, "Name\n");

    let (encoding, text) = decode_text(b"caf\xE9").unwrap();
    assert_eq!(encoding, TextEncoding::Latin1);
    assert_eq!(text, "café");
}

#[test]
fn test_quoted_delimiters_ignored_by_sniffer() {
    let text = "\"a;b\",c\n\"d;e\",f\n";
    assert_eq!(sniff_delimiter(text), Some(b','));
    assert_eq!(sniff_delimiter("single column\nrows\n"), None);
}

#[test]
fn test_ragged_rows_padded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "a,b,c\n1\n2,3\n").unwrap();

    let (sheet, _) = Sheet::from_delimited(&path).unwrap();
    assert_eq!(sheet.col_count(), 3);
    assert!(sheet.data().iter().all(|row| row.len() == 3));
    assert_eq!(sheet.get(1, 2).unwrap(), &CellValue::Null);
}

// ===== Workbook Tests =====

#[test]
fn test_workbook_values_and_merges() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .merge_range(0, 0, 0, 1, "Header", &Format::new())
        .unwrap();
    worksheet.write_string(1, 0, "x").unwrap();
    worksheet.write_boolean(1, 1, true).unwrap();
    workbook.save(&path).unwrap();

    let sheet = Sheet::from_workbook(&path, WorkbookKind::Xlsx, true).unwrap();
    assert_eq!(sheet.get(0, 0).unwrap(), &CellValue::from("Header"));
    assert_eq!(sheet.get(1, 1).unwrap(), &CellValue::Bool(true));
    assert_eq!(sheet.merged_spans(), &[CellSpan::new(1, 1, 1, 2)]);

    let without = Sheet::from_workbook(&path, WorkbookKind::Xlsx, false).unwrap();
    assert!(without.merged_spans().is_empty());
}

#[test]
fn test_span_translation() {
    let span = CellSpan::new(2, 1, 2, 3);
    assert_eq!(span.translate_rows(3), Some(CellSpan::new(5, 1, 5, 3)));
    assert_eq!(span.translate_rows(-2), None);
    assert_eq!(span.to_a1(), "A2:C2");
}

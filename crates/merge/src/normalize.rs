//! Row normalization: deduplication, stable sort and empty-row removal, in that order.

use crate::options::NormalizationOptions;
use crate::table::Row;
use serde::Serialize;
use sheetmerge_sheet::CellValue;
use std::cmp::Ordering;
use std::collections::HashSet;

/// What a normalization pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub duplicates_removed: usize,
    pub empty_rows_removed: usize,
    /// False when no sort was requested or it fell back to input order
    pub sorted: bool,
}

/// A run of data rows, optionally introduced by an in-band header block.
///
/// `prefix` holds the separator row and the repeated header rows the reader
/// inserted; it stays at the top of the section and is never reordered,
/// deduplicated or filtered. Only `body` rows are normalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub prefix: Vec<Row>,
    pub body: Vec<Row>,
}

impl Section {
    #[must_use]
    pub fn new(prefix: Vec<Row>) -> Self {
        Section {
            prefix,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.body.is_empty()
    }
}

/// Run the enabled passes over `sections` and flatten them back into rows.
///
/// Duplicates are tracked across every section; sorting happens within each
/// section. `width` is the canonical column count before any source label.
pub fn normalize(
    mut sections: Vec<Section>,
    options: &NormalizationOptions,
    width: usize,
) -> (Vec<Row>, NormalizeReport) {
    let mut report = NormalizeReport::default();

    if options.deduplicate {
        let mut seen = HashSet::new();
        for section in &mut sections {
            report.duplicates_removed += retain_unique(&mut section.body, &mut seen);
        }
    }

    if let Some(sort) = options.sort {
        if sort.column < width {
            let sorted: Option<Vec<Vec<Row>>> = sections
                .iter()
                .map(|section| sort_rows(&section.body, sort.column))
                .collect();
            match sorted {
                Some(bodies) => {
                    for (section, body) in sections.iter_mut().zip(bodies) {
                        section.body = body;
                    }
                    report.sorted = true;
                }
                None => tracing::warn!(
                    column = sort.column,
                    "column holds values that cannot be compared; keeping input order"
                ),
            }
        } else {
            tracing::debug!(column = sort.column, width, "sort column outside the table");
        }
    }

    if options.remove_empty_rows {
        for section in &mut sections {
            let before = section.body.len();
            section
                .body
                .retain(|row| !is_empty_row(row, options.add_source_label));
            report.empty_rows_removed += before - section.body.len();
        }
    }

    let rows = sections
        .into_iter()
        .flat_map(|section| section.prefix.into_iter().chain(section.body))
        .collect();

    tracing::debug!(
        duplicates = report.duplicates_removed,
        empty = report.empty_rows_removed,
        sorted = report.sorted,
        "normalized rows"
    );
    (rows, report)
}

/// Stable sort on `column`; null cells sort last.
///
/// Returns `None` when two non-null cells in the column cannot be compared,
/// such as text against a number.
#[must_use]
pub fn sort_rows(rows: &[Row], column: usize) -> Option<Vec<Row>> {
    let mut incomparable = false;
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        let left = a.get(column).unwrap_or(&CellValue::Null);
        let right = b.get(column).unwrap_or(&CellValue::Null);
        match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => left.try_cmp(right).unwrap_or_else(|| {
                incomparable = true;
                Ordering::Equal
            }),
        }
    });
    (!incomparable).then_some(sorted)
}

/// True when every cell is blank, ignoring the trailing source label if present.
#[must_use]
pub fn is_empty_row(row: &[CellValue], has_source_label: bool) -> bool {
    let cells = if has_source_label && !row.is_empty() {
        &row[..row.len() - 1]
    } else {
        row
    };
    cells.iter().all(CellValue::is_blank)
}

/// Keep the first occurrence of every row not already in `seen`, comparing
/// rows cell by cell as text. Returns how many rows were dropped.
fn retain_unique(rows: &mut Vec<Row>, seen: &mut HashSet<Vec<Option<String>>>) -> usize {
    let before = rows.len();
    rows.retain(|row| seen.insert(row.iter().map(CellValue::key).collect()));
    before - rows.len()
}

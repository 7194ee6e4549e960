//! Merge coordinator: reads every input in order and folds the results into
//! one [`Table`].

use crate::normalize::{self, NormalizeReport, Section};
use crate::options::MergeConfig;
use crate::source::{self, ReadRequest, SourceFile};
use crate::table::Table;
use serde::Serialize;
use std::path::Path;

/// Progress notifications emitted while merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MergeEvent {
    /// One more file handled, successfully or not
    Progress { done: usize, total: usize },
    /// A file contributed nothing
    FileFailed { file: String, reason: String },
}

/// A file that could not be merged and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub reason: String,
}

/// Outcome of one merge pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompilationResult {
    pub table: Table,
    /// File names that contributed rows, in input order
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedFile>,
    pub normalization: NormalizeReport,
}

impl CompilationResult {
    /// No header was established or no rows survived
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Merge `files` in the order given.
///
/// The first file read successfully supplies the preamble, header and header
/// merges for the whole run. Failures are recorded per file and never stop the loop.
pub fn merge<P: AsRef<Path>>(
    files: &[P],
    config: &MergeConfig,
    mut on_event: impl FnMut(MergeEvent),
) -> CompilationResult {
    let total = files.len();
    let options = &config.normalization;
    let mut result = CompilationResult::default();
    let mut header_width = 0;
    let mut sections = vec![Section::default()];

    tracing::info!(files = total, "merging files");

    for (index, path) in files.iter().enumerate() {
        let source = SourceFile::new(path.as_ref(), config.header_start_row, config.header_rows);
        let name = source.file_name();
        let capture_header = !result.table.has_header();

        let request = ReadRequest {
            capture_header,
            source_label: options.add_source_label.then(|| name.clone()),
            repeat_headers: options.repeat_headers,
            row_width: (!capture_header).then(|| result.table.width()),
        };

        match source::read(&source, &request) {
            Ok(extract) => {
                if capture_header {
                    header_width = extract.header_width;
                    result.table.preamble = extract.preamble;
                    result.table.header = extract.header;
                    result.table.merged_spans = extract.merged_spans;
                } else if extract.header_width != header_width {
                    tracing::warn!(
                        file = %name,
                        expected = header_width,
                        found = extract.header_width,
                        "header width differs from the first file; merging as data"
                    );
                }
                if !extract.in_band_header.is_empty() {
                    sections.push(Section::new(extract.in_band_header));
                }
                if let Some(section) = sections.last_mut() {
                    section.body.extend(extract.data_rows);
                }
                result.succeeded.push(name);
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(file = %name, %reason, "skipping file");
                on_event(MergeEvent::FileFailed {
                    file: name.clone(),
                    reason: reason.clone(),
                });
                result.failed.push(FailedFile { file: name, reason });
            }
        }

        on_event(MergeEvent::Progress {
            done: index + 1,
            total,
        });
    }

    if result.table.has_header() && sections.iter().any(|section| !section.is_empty()) {
        let (rows, report) = normalize::normalize(sections, options, result.table.width());
        result.table.rows = rows;
        result.normalization = report;

        if options.add_source_label {
            result.table.push_label_header();
        }
    }

    tracing::info!(
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        rows = result.table.rows.len(),
        "merge finished"
    );
    result
}

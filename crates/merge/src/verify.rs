//! Pre-flight check: can each file be opened, and is it tall enough for the
//! declared header block?

use crate::coordinator::FailedFile;
use crate::source::{self, SourceFile};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Files split by whether a merge would accept them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub compatible: Vec<PathBuf>,
    pub incompatible: Vec<FailedFile>,
}

impl VerificationReport {
    #[must_use]
    pub fn all_compatible(&self) -> bool {
        self.incompatible.is_empty()
    }
}

/// Open every file and apply the row-count check without extracting data.
pub fn verify_files<P: AsRef<Path>>(
    files: &[P],
    header_start_row: usize,
    header_rows: usize,
) -> VerificationReport {
    let mut report = VerificationReport::default();

    for path in files {
        let source = SourceFile::new(path.as_ref(), header_start_row, header_rows);
        match source::load_rows(&source, false) {
            Ok(_) => report.compatible.push(source.path),
            Err(err) => {
                tracing::debug!(file = %source.file_name(), error = %err, "incompatible file");
                report.incompatible.push(FailedFile {
                    file: source.file_name(),
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}

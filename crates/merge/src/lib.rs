//! File merge engine for sheetmerge
//!
//! Combines many spreadsheet and delimited-text files that share one header
//! layout into a single styled workbook. The first file read successfully
//! supplies the preamble and header; every file contributes its data rows.
//!
//! # Example
//!
//! ```no_run
//! use sheetmerge::{compile, MergeConfig, RunOutcome};
//! use std::path::Path;
//!
//! let files = ["january.xlsx", "february.csv"];
//! let config = MergeConfig::default();
//! match compile(&files, &config, Path::new("."), |_| {}).unwrap() {
//!     RunOutcome::Written { path, result } => {
//!         println!("{} rows written to {}", result.table.rows.len(), path.display());
//!     }
//!     RunOutcome::NothingToWrite(result) => {
//!         println!("{} files failed", result.failed.len());
//!     }
//! }
//! ```

pub mod coordinator;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod options;
pub mod scan;
pub mod source;
pub mod table;
pub mod verify;

pub use coordinator::{merge, CompilationResult, FailedFile, MergeEvent};
pub use error::{MergeError, Result, SourceError, WriteError};
pub use layout::write_table;
pub use normalize::{NormalizeReport, Section};
pub use options::{DateFormat, LayoutOptions, MergeConfig, NormalizationOptions, SortSpec};
pub use scan::scan_directory;
pub use source::{SourceFile, SourceFormat, SUPPORTED_EXTENSIONS};
pub use table::{Row, Table, SOURCE_LABEL_HEADER};
pub use verify::{verify_files, VerificationReport};

use std::path::{Path, PathBuf};

/// How a run ended when nothing fatal happened
#[derive(Debug)]
pub enum RunOutcome {
    /// The workbook was saved at `path`
    Written {
        path: PathBuf,
        result: CompilationResult,
    },
    /// No header was established or no rows survived; no file was written
    NothingToWrite(CompilationResult),
}

impl RunOutcome {
    #[must_use]
    pub fn result(&self) -> &CompilationResult {
        match self {
            RunOutcome::Written { result, .. } | RunOutcome::NothingToWrite(result) => result,
        }
    }

    #[must_use]
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            RunOutcome::Written { path, .. } => Some(path),
            RunOutcome::NothingToWrite(_) => None,
        }
    }
}

/// Merge `files` and write the workbook into `output_dir`.
///
/// Per-file failures end up in the result; only configuration and write
/// errors fail the run.
pub fn compile<P: AsRef<Path>>(
    files: &[P],
    config: &MergeConfig,
    output_dir: &Path,
    on_event: impl FnMut(MergeEvent),
) -> Result<RunOutcome> {
    config.validate()?;
    if files.is_empty() {
        return Err(MergeError::NoInput);
    }

    let result = merge(files, config, on_event);
    if result.is_empty() {
        tracing::warn!(
            failed = result.failed.len(),
            "no header or no rows compiled; nothing written"
        );
        return Ok(RunOutcome::NothingToWrite(result));
    }

    let target = output_dir.join(config.output_file_name());
    let path = write_table(&result.table, config.header_start_row, &config.layout, &target)?;
    Ok(RunOutcome::Written { path, result })
}

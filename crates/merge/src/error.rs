use sheetmerge_sheet::SheetError;
use std::path::PathBuf;
use thiserror::Error;

/// Why one input file could not contribute rows.
///
/// Every variant is file-level: the run records it and moves on.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("Incompatible header structure: the file only has {rows} rows ({needed} required)")]
    Structure { rows: usize, needed: usize },

    #[error("Unable to determine the text encoding of the file")]
    Encoding,

    #[error("The file is open in another application")]
    Permission,

    #[error("Read error: {0}")]
    Read(String),
}

impl From<SheetError> for SourceError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::Permission { .. } => SourceError::Permission,
            SheetError::Encoding { .. } => SourceError::Encoding,
            other => SourceError::Read(other.to_string()),
        }
    }
}

/// Failure while producing the output workbook. Fatal to the run.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("The output file is open in another application: {}", path.display())]
    OutputLocked { path: PathBuf },

    #[error("Failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

/// Errors that end a whole run
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No input files")]
    NoInput,

    #[error("Nothing to write: no header or no data rows were compiled")]
    NothingToWrite,

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading cells from a file
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("File is open in another application: {}", path.display())]
    Permission { path: PathBuf },

    #[error("Unable to determine the text encoding of {}", path.display())]
    Encoding { path: PathBuf },

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Workbook has no worksheet: {}", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("Invalid column reference: {0:?}")]
    InvalidColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Map an open/read failure on `path`, singling out files locked by another process.
    pub(crate) fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            SheetError::Permission {
                path: path.to_path_buf(),
            }
        } else {
            SheetError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;

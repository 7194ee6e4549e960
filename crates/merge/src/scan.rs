use crate::source::SUPPORTED_EXTENSIONS;
use std::io;
use std::path::{Path, PathBuf};

/// List the supported input files directly inside `dir`, sorted by name.
///
/// `skip` names a file to leave out, typically the output of a previous run.
pub fn scan_directory(dir: &Path, skip: Option<&str>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // Office lock files such as `~$report.xlsx`
        if name.starts_with("~$") {
            continue;
        }
        if skip.is_some_and(|skip| name.eq_ignore_ascii_case(skip)) {
            continue;
        }
        if is_supported(&path) {
            files.push(path);
        }
    }
    files.sort_by_key(|path| path.file_name().map(|n| n.to_ascii_lowercase()));
    Ok(files)
}

/// True when the extension is one the reader accepts
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

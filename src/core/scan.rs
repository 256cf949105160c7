use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::InvoiceError;

/// List the files directly inside `dir` whose extension matches `extension`
/// (ASCII case-insensitive), sorted by file name. Subfolders are not searched.
pub fn scan_folder(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, InvoiceError> {
    if !dir.is_dir() {
        return Err(InvoiceError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// File name of `path` as text, for logs and failure records.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem of `path` as text.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

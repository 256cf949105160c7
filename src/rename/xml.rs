//! XML rename: `<YYMMDD>_<invoice number>.xml` in the `Renamed` folder,
//! failures copied unchanged into `Renamed_failed`. Sources are never touched.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::scan::display_name;
use crate::core::{InvoiceError, parse_issue_date};
use crate::xml::{Document, HeaderField};

pub const RENAMED_DIR: &str = "Renamed";
pub const FAILED_DIR: &str = "Renamed_failed";

pub const MISSING_FIELDS: &str = "Missing SHDon or NLap data";
pub const INVALID_DATE: &str = "Invalid date format in NLap";
pub const INVALID_NUMBER: &str = "Invalid characters in SHDon";

/// Output folders of a rename run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFolders {
    pub renamed: PathBuf,
    pub failed: PathBuf,
}

impl RenameFolders {
    pub fn new(destination: &Path) -> Self {
        Self {
            renamed: destination.join(RENAMED_DIR),
            failed: destination.join(FAILED_DIR),
        }
    }

    /// Remove both folders if present and create them empty.
    pub fn prepare(destination: &Path) -> Result<Self, InvoiceError> {
        let folders = Self::new(destination);
        for dir in [&folders.renamed, &folders.failed] {
            if dir.exists() {
                fs::remove_dir_all(dir)?;
                tracing::info!(dir = %dir.display(), "removed previous output folder");
            }
            fs::create_dir_all(dir)?;
        }
        Ok(folders)
    }
}

/// Target name for an invoice number and issue date, both trimmed first.
pub fn derive_file_name(number: &str, issue_date: &str) -> Result<String, InvoiceError> {
    let number = number.trim();
    let issue_date = issue_date.trim();
    if number.is_empty() || issue_date.is_empty() {
        return Err(InvoiceError::Validation(MISSING_FIELDS.into()));
    }
    if number
        .chars()
        .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control())
    {
        return Err(InvoiceError::Validation(INVALID_NUMBER.into()));
    }
    let date =
        parse_issue_date(issue_date).ok_or_else(|| InvoiceError::Validation(INVALID_DATE.into()))?;
    Ok(format!("{}_{number}.xml", date.format("%y%m%d")))
}

/// `file_name`, or `stem(1).ext`, `stem(2).ext`, … if taken in `dir`.
pub fn unique_file_name(dir: &Path, file_name: &str) -> String {
    if !dir.join(file_name).exists() {
        return file_name.to_string();
    }
    let (stem, ext) = match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name.split_at(dot),
        _ => (file_name, ""),
    };
    let mut counter = 1u32;
    loop {
        let candidate = format!("{stem}({counter}){ext}");
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Copy `source` into `dir` under a collision-free variant of `file_name`.
pub fn copy_unique(source: &Path, dir: &Path, file_name: &str) -> Result<PathBuf, InvoiceError> {
    let target = dir.join(unique_file_name(dir, file_name));
    fs::copy(source, &target)?;
    Ok(target)
}

/// Result of renaming one XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlRenameOutcome {
    Renamed(PathBuf),
    Failed {
        reason: String,
        /// Copy in the failure folder, when that copy succeeded.
        copied_to: Option<PathBuf>,
    },
}

impl XmlRenameOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Renamed(_))
    }
}

fn renamed_target(source: &Path, folders: &RenameFolders) -> Result<PathBuf, InvoiceError> {
    let doc = Document::load(source)?;
    let name = derive_file_name(
        &doc.field(HeaderField::InvoiceNumber),
        &doc.field(HeaderField::IssueDate),
    )?;
    copy_unique(source, &folders.renamed, &name)
}

/// Rename one file; on any failure copy it to the failure folder instead.
pub fn rename_xml_file(source: &Path, folders: &RenameFolders) -> XmlRenameOutcome {
    let file = display_name(source);
    let reason = match renamed_target(source, folders) {
        Ok(target) => {
            tracing::info!(file = %file, renamed = %display_name(&target), "renamed");
            return XmlRenameOutcome::Renamed(target);
        }
        Err(InvoiceError::Validation(reason)) => {
            tracing::warn!(file = %file, reason = %reason, "invoice failed validation");
            reason
        }
        Err(e) => {
            tracing::error!(file = %file, error = %e, "failed to rename invoice");
            format!("Processing error: {e}")
        }
    };

    let copied_to = match copy_unique(source, &folders.failed, &file) {
        Ok(target) => {
            tracing::warn!(file = %file, reason = %reason, "copied to failed folder");
            Some(target)
        }
        Err(e) => {
            tracing::error!(file = %file, error = %e, "could not copy to failed folder");
            None
        }
    };
    XmlRenameOutcome::Failed { reason, copied_to }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names() {
        assert_eq!(derive_file_name("INV001", "2024-03-15").unwrap(), "240315_INV001.xml");
        assert_eq!(
            derive_file_name("  0000123 ", " 2023-12-01T10:00:00 ").unwrap(),
            "231201_0000123.xml"
        );
    }

    #[test]
    fn validation_reasons() {
        let reason = |r: Result<String, InvoiceError>| match r {
            Err(InvoiceError::Validation(msg)) => msg,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(reason(derive_file_name("", "2024-03-15")), MISSING_FIELDS);
        assert_eq!(reason(derive_file_name("INV", "  ")), MISSING_FIELDS);
        assert_eq!(reason(derive_file_name("INV", "15.03.2024x")), INVALID_DATE);
        assert_eq!(reason(derive_file_name("A/B", "2024-03-15")), INVALID_NUMBER);
    }

    #[test]
    fn unique_names_count_up() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_file_name(dir.path(), "a.xml"), "a.xml");
        fs::write(dir.path().join("a.xml"), "").unwrap();
        assert_eq!(unique_file_name(dir.path(), "a.xml"), "a(1).xml");
        fs::write(dir.path().join("a(1).xml"), "").unwrap();
        assert_eq!(unique_file_name(dir.path(), "a.xml"), "a(2).xml");
        fs::write(dir.path().join("noext"), "").unwrap();
        assert_eq!(unique_file_name(dir.path(), "noext"), "noext(1)");
    }
}

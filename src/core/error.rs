use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while reading, extracting, reporting or renaming invoices.
///
/// A missing XML node is deliberately *not* an error: field lookups yield an
/// empty string and numeric fields simply do not contribute to totals.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoiceError {
    /// The document could not be parsed even after control-character sanitizing.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A required field is present but semantically invalid (rename workflow).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The run was cancelled by the user.
    #[error("operation cancelled")]
    Cancelled,

    /// The external PDF rename executable or script is missing.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// A batch run was requested while another one is still running.
    #[error("processing is already in progress")]
    AlreadyRunning,

    /// A batch run was requested with an empty file list.
    #[error("no input files")]
    NoInput,

    /// Export configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Workbook layout or save failure.
    #[error("report error: {0}")]
    Report(String),

    /// File-system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvoiceError {
    /// True for the user-initiated cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A single file that could not be processed, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// File name (not the full path).
    pub file: String,
    /// Human-readable reason.
    pub reason: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.reason)
    }
}

impl FileFailure {
    pub fn new(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

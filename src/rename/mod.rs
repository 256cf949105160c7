//! Rename workflow.
//!
//! XML invoices are copied as `<YYMMDD>_<number>.xml` into `Renamed`, files
//! that cannot be renamed go to `Renamed_failed`. PDFs are handed to an
//! external collaborator in one sub-batch after the XML files.

mod pdf;
mod protocol;
mod xml;

pub use pdf::PdfCollaborator;
pub use protocol::{FileStatus, ProtocolLine, ProtocolTally, UNKNOWN_FILE, parse_line};
pub use xml::{
    FAILED_DIR, INVALID_DATE, INVALID_NUMBER, MISSING_FIELDS, RENAMED_DIR, RenameFolders,
    XmlRenameOutcome, derive_file_name, rename_xml_file, unique_file_name,
};

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::scan::display_name;
use crate::core::{
    BatchRunState, CancellationToken, FileFailure, InvoiceError, Progress, ProgressSink, RunPhase,
    YieldPolicy,
};

/// Reason recorded for a PDF the collaborator reported as failed.
pub const PDF_FAILED: &str = "PDF rename failed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileCounts {
    pub success: usize,
    pub failed: usize,
}

impl FileCounts {
    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

/// Outcome of a rename run.
#[derive(Debug, Clone, Serialize)]
pub struct RenameSummary {
    pub phase: RunPhase,
    pub xml: FileCounts,
    pub pdf: FileCounts,
    pub failures: Vec<FileFailure>,
    pub elapsed_ms: u128,
}

impl RenameSummary {
    pub fn success(&self) -> usize {
        self.xml.success + self.pdf.success
    }

    pub fn failed(&self) -> usize {
        self.xml.failed + self.pdf.failed
    }
}

/// Drives one rename run: XML files first, then the PDF sub-batch.
#[derive(Debug, Default)]
pub struct RenameRunner {
    collaborator: Option<PdfCollaborator>,
    yield_policy: YieldPolicy,
    state: BatchRunState,
}

impl RenameRunner {
    pub fn new(collaborator: Option<PdfCollaborator>) -> Self {
        Self {
            collaborator,
            ..Self::default()
        }
    }

    pub fn with_yield_policy(mut self, policy: YieldPolicy) -> Self {
        self.yield_policy = policy;
        self
    }

    pub fn state(&self) -> &BatchRunState {
        &self.state
    }

    /// Rename `xml_files` and `pdf_files` into `destination`.
    ///
    /// Both output folders are emptied first. A cancelled run returns `Ok`
    /// with phase `Cancelled`; files already copied stay where they are.
    pub fn run(
        &mut self,
        xml_files: &[PathBuf],
        pdf_files: &[PathBuf],
        destination: &Path,
        cancel: &CancellationToken,
        progress: &mut dyn ProgressSink,
    ) -> Result<RenameSummary, InvoiceError> {
        self.state.begin(xml_files.len() + pdf_files.len())?;
        tracing::info!(
            xml = xml_files.len(),
            pdf = pdf_files.len(),
            destination = %destination.display(),
            "rename started"
        );

        let mut xml = FileCounts::default();
        let mut pdf = FileCounts::default();
        let result = self.process(
            xml_files,
            pdf_files,
            destination,
            cancel,
            progress,
            &mut xml,
            &mut pdf,
        );
        let phase = match &result {
            Ok(()) => RunPhase::Completed,
            Err(e) if e.is_cancelled() => RunPhase::Cancelled,
            Err(_) => RunPhase::Failed,
        };
        self.state.finish(phase);
        progress.report(&Progress::idle());

        let elapsed = self.state.elapsed();
        match result {
            Ok(()) => tracing::info!(
                xml_success = xml.success,
                xml_failed = xml.failed,
                pdf_success = pdf.success,
                pdf_failed = pdf.failed,
                elapsed_ms = elapsed.as_millis() as u64,
                "rename completed"
            ),
            Err(ref e) if e.is_cancelled() => tracing::warn!(
                renamed = xml.success + pdf.success,
                "rename cancelled, copied files are kept"
            ),
            Err(e) => {
                tracing::error!(error = %e, "rename failed");
                return Err(e);
            }
        }

        Ok(RenameSummary {
            phase,
            xml,
            pdf,
            failures: self.state.failures().to_vec(),
            elapsed_ms: elapsed.as_millis(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process(
        &mut self,
        xml_files: &[PathBuf],
        pdf_files: &[PathBuf],
        destination: &Path,
        cancel: &CancellationToken,
        progress: &mut dyn ProgressSink,
        xml: &mut FileCounts,
        pdf: &mut FileCounts,
    ) -> Result<(), InvoiceError> {
        let folders = RenameFolders::prepare(destination)?;

        for path in xml_files {
            cancel.check()?;
            progress.report(&self.state.advance(&display_name(path)));
            match rename_xml_file(path, &folders) {
                XmlRenameOutcome::Renamed(_) => {
                    xml.success += 1;
                    self.state.record_success();
                }
                XmlRenameOutcome::Failed { reason, .. } => {
                    xml.failed += 1;
                    self.state.record_failure(FileFailure::new(display_name(path), reason));
                }
            }
            self.yield_policy.pause(cancel)?;
        }

        if pdf_files.is_empty() {
            return Ok(());
        }
        cancel.check()?;
        self.rename_pdfs(pdf_files, &folders, xml_files.len(), cancel, progress, pdf)
    }

    /// Run the PDF sub-batch, keeping `counts` current as the collaborator
    /// reports, so a cancelled run still carries what was already renamed.
    #[allow(clippy::too_many_arguments)]
    fn rename_pdfs(
        &mut self,
        pdf_files: &[PathBuf],
        folders: &RenameFolders,
        offset: usize,
        cancel: &CancellationToken,
        progress: &mut dyn ProgressSink,
        counts: &mut FileCounts,
    ) -> Result<(), InvoiceError> {
        let Some(collaborator) = self.collaborator.clone() else {
            let error =
                InvoiceError::CollaboratorUnavailable("no PDF rename tool configured".into());
            counts.failed += self.fail_unreported(pdf_files, &HashSet::new(), &error);
            return Ok(());
        };
        if let Err(e) = collaborator.check_available() {
            counts.failed += self.fail_unreported(pdf_files, &HashSet::new(), &e);
            return Ok(());
        }

        let total = self.state.total();
        let mut failed_files = Vec::new();
        let mut reported = HashSet::new();
        let outcome = collaborator.run(pdf_files, folders, cancel, |line, tally| {
            *counts = FileCounts {
                success: tally.success,
                failed: tally.failed,
            };
            if let ProtocolLine::Progress { file, status } = line {
                progress.report(&Progress::new(offset + tally.processed, total, file.as_str()));
                match status {
                    FileStatus::Success => {
                        tracing::info!(file = %file, "PDF renamed");
                        reported.insert(file.clone());
                    }
                    FileStatus::Failed => {
                        tracing::warn!(file = %file, "PDF rename failed");
                        reported.insert(file.clone());
                        failed_files.push(file.clone());
                    }
                    FileStatus::Pending => {}
                }
            }
        });

        for file in failed_files {
            self.state.record_failure(FileFailure::new(file, PDF_FAILED));
        }
        let result = match outcome {
            Ok(tally) => {
                *counts = FileCounts {
                    success: tally.success,
                    failed: tally.failed,
                };
                Ok(())
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                counts.failed += self.fail_unreported(pdf_files, &reported, &e);
                Ok(())
            }
        };
        for _ in 0..counts.success {
            self.state.record_success();
        }
        result
    }

    /// Record every PDF the collaborator has not reported on as failed with
    /// `error`; returns how many were recorded.
    fn fail_unreported(
        &mut self,
        pdf_files: &[PathBuf],
        reported: &HashSet<String>,
        error: &InvoiceError,
    ) -> usize {
        let pending = unreported(pdf_files, reported);
        tracing::error!(error = %error, pdfs = pending.len(), "PDF sub-batch failed");
        for name in &pending {
            self.state
                .record_failure(FileFailure::new(name.as_str(), error.to_string()));
        }
        pending.len()
    }
}

fn unreported(pdf_files: &[PathBuf], reported: &HashSet<String>) -> Vec<String> {
    pdf_files
        .iter()
        .map(|path| display_name(path))
        .filter(|name| !reported.contains(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_files_are_not_failed_twice() {
        let pdfs = vec![
            PathBuf::from("in/a.pdf"),
            PathBuf::from("in/bad.pdf"),
            PathBuf::from("in/c.pdf"),
        ];
        let reported = HashSet::from(["a.pdf".to_string(), "bad.pdf".to_string()]);
        assert_eq!(unreported(&pdfs, &reported), vec!["c.pdf".to_string()]);
        assert_eq!(unreported(&pdfs, &HashSet::new()).len(), 3);
    }

    #[test]
    fn failing_the_remainder_keeps_earlier_reports() {
        let pdfs = vec![PathBuf::from("in/bad.pdf"), PathBuf::from("in/c.pdf")];
        let mut runner = RenameRunner::new(None);
        runner.state.begin(pdfs.len()).unwrap();
        runner
            .state
            .record_failure(FileFailure::new("bad.pdf", PDF_FAILED));

        let reported = HashSet::from(["bad.pdf".to_string()]);
        let error = InvoiceError::CollaboratorUnavailable("pipe closed".into());
        assert_eq!(runner.fail_unreported(&pdfs, &reported, &error), 1);

        let failures = runner.state.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0], FileFailure::new("bad.pdf", PDF_FAILED));
        assert_eq!(failures[1].file, "c.pdf");
    }
}

//! Batch export: folder of invoices to one workbook.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::scan::{display_name, file_stem};
use crate::core::{
    BatchRunState, CancellationToken, ExportConfig, FileFailure, InvoiceError, Progress,
    ProgressSink, RunPhase, YieldPolicy,
};
use crate::extract::read_invoice;

use super::builder::ReportBuilder;
use super::xlsx::save_workbook;

/// Outcome of an export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub phase: RunPhase,
    pub total: usize,
    /// Files whose data made it into the workbook.
    pub processed: usize,
    pub failures: Vec<FileFailure>,
    /// Saved workbook; `None` unless the run completed.
    pub output: Option<PathBuf>,
    pub elapsed_ms: u128,
}

/// Drives one export at a time: extract each file, lay out the sheets,
/// save the workbook.
///
/// A file that fails to load or parse is logged and skipped. Cancellation
/// stops the loop and nothing is saved.
#[derive(Debug, Default)]
pub struct ExportRunner {
    config: ExportConfig,
    yield_policy: YieldPolicy,
    state: BatchRunState,
}

impl ExportRunner {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
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

    /// Export `files` to `output`.
    ///
    /// Returns `AlreadyRunning` / `NoInput` without starting, `Ok` for a
    /// completed or cancelled run, and `Err` when the workbook could not be
    /// written. Progress is reset to idle when the run ends, whatever the
    /// outcome.
    pub fn run(
        &mut self,
        files: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
        progress: &mut dyn ProgressSink,
    ) -> Result<ExportSummary, InvoiceError> {
        self.state.begin(files.len())?;
        tracing::info!(files = files.len(), output = %output.display(), "export started");

        let result = self.process(files, output, cancel, progress);
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
                processed = self.state.processed(),
                failed = self.state.failures().len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "export completed"
            ),
            Err(ref e) if e.is_cancelled() => tracing::warn!(
                processed = self.state.processed(),
                elapsed_ms = elapsed.as_millis() as u64,
                "export cancelled, no workbook written"
            ),
            Err(e) => {
                tracing::error!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "export failed");
                return Err(e);
            }
        }

        Ok(ExportSummary {
            phase,
            total: self.state.total(),
            processed: self.state.processed(),
            failures: self.state.failures().to_vec(),
            output: (phase == RunPhase::Completed).then(|| output.to_path_buf()),
            elapsed_ms: elapsed.as_millis(),
        })
    }

    fn process(
        &mut self,
        files: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), InvoiceError> {
        let mut builder = ReportBuilder::new(self.config.clone());

        for path in files {
            cancel.check()?;
            let name = display_name(path);
            progress.report(&self.state.advance(&name));

            match read_invoice(path) {
                Ok(invoice) => {
                    let sheet = builder.add_invoice(&file_stem(path), &invoice);
                    self.state.record_success();
                    tracing::info!(file = %name, sheet = %sheet, items = invoice.items.len(), "invoice processed");
                    self.yield_policy.after_file(self.state.processed(), cancel)?;
                }
                Err(e) => {
                    tracing::error!(file = %name, error = %e, "failed to process invoice");
                    self.state.record_failure(FileFailure::new(name, e.to_string()));
                }
            }
        }

        cancel.check()?;
        let total = self.state.total();
        progress.report(&Progress::new(total, total, "Saving workbook"));
        let book = builder.finish();
        save_workbook(&book, output)
    }
}

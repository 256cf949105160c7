//! Batch run lifecycle: cancellation, progress reporting and run state.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use super::error::{FileFailure, InvoiceError};

/// Cooperative cancellation flag shared between the caller and a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), InvoiceError> {
        if self.is_cancelled() {
            Err(InvoiceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Cumulative progress of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 1-based index of the file being processed; 0 when idle.
    pub current: usize,
    pub total: usize,
    /// Name of the file being processed.
    pub message: String,
}

impl Progress {
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// The reset state reported when a run ends, whatever its outcome.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.total == 0
    }
}

/// Receiver of progress updates.
///
/// Implemented for closures and for `std::sync::mpsc::Sender<Progress>`, the
/// latter to hand updates back to an owning thread.
pub trait ProgressSink {
    fn report(&mut self, progress: &Progress);
}

impl<F: FnMut(&Progress)> ProgressSink for F {
    fn report(&mut self, progress: &Progress) {
        self(progress)
    }
}

impl ProgressSink for mpsc::Sender<Progress> {
    fn report(&mut self, progress: &Progress) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(progress.clone());
    }
}

impl ProgressSink for () {
    fn report(&mut self, _progress: &Progress) {}
}

/// Lifecycle of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Counters and phase of one batch, owned by the run that drives it.
#[derive(Debug, Default)]
pub struct BatchRunState {
    phase: RunPhase,
    total: usize,
    current: usize,
    processed: usize,
    failures: Vec<FileFailure>,
    started: Option<Instant>,
    elapsed: Duration,
}

impl BatchRunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Running`. Rejected while a run is in progress or when there is
    /// nothing to process.
    pub fn begin(&mut self, total: usize) -> Result<(), InvoiceError> {
        if self.phase == RunPhase::Running {
            return Err(InvoiceError::AlreadyRunning);
        }
        if total == 0 {
            return Err(InvoiceError::NoInput);
        }
        *self = Self {
            phase: RunPhase::Running,
            total,
            started: Some(Instant::now()),
            ..Self::default()
        };
        Ok(())
    }

    /// Move to the next file and return the progress to report for it.
    pub fn advance(&mut self, file: &str) -> Progress {
        self.current += 1;
        Progress::new(self.current, self.total, file)
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    pub fn record_failure(&mut self, failure: FileFailure) {
        self.failures.push(failure);
    }

    pub fn finish(&mut self, phase: RunPhase) {
        self.phase = phase;
        if let Some(started) = self.started.take() {
            self.elapsed = started.elapsed();
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<FileFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Wall time of the last finished run, or of the current run so far.
    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => started.elapsed(),
            None => self.elapsed,
        }
    }
}

/// Short pause inserted periodically so progress stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YieldPolicy {
    /// Pause after every `every`-th file; 0 disables the pause.
    pub every: usize,
    pub pause: Duration,
}

impl Default for YieldPolicy {
    fn default() -> Self {
        Self {
            every: 10,
            pause: Duration::from_millis(50),
        }
    }
}

impl YieldPolicy {
    /// No pauses at all; used by tests and benches.
    pub fn none() -> Self {
        Self {
            every: 0,
            pause: Duration::ZERO,
        }
    }

    /// Pause after the `index`-th (1-based) file if it is due.
    pub fn after_file(&self, index: usize, cancel: &CancellationToken) -> Result<(), InvoiceError> {
        if self.every == 0 || index % self.every != 0 {
            return Ok(());
        }
        self.pause(cancel)
    }

    /// Unconditional pause, with cancellation checked on both sides.
    pub fn pause(&self, cancel: &CancellationToken) -> Result<(), InvoiceError> {
        cancel.check()?;
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
            cancel.check()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_rejects_reentry_and_empty_input() {
        let mut state = BatchRunState::new();
        assert!(matches!(state.begin(0), Err(InvoiceError::NoInput)));
        assert_eq!(state.phase(), RunPhase::Idle);

        state.begin(3).unwrap();
        assert_eq!(state.phase(), RunPhase::Running);
        assert!(matches!(state.begin(3), Err(InvoiceError::AlreadyRunning)));

        state.finish(RunPhase::Completed);
        assert!(state.phase().is_terminal());
        state.begin(1).unwrap();
        assert_eq!(state.total(), 1);
        assert_eq!(state.processed(), 0);
    }

    #[test]
    fn advance_reports_cumulative_progress() {
        let mut state = BatchRunState::new();
        state.begin(2).unwrap();
        assert_eq!(state.advance("a.xml"), Progress::new(1, 2, "a.xml"));
        state.record_success();
        assert_eq!(state.advance("b.xml"), Progress::new(2, 2, "b.xml"));
        state.record_failure(FileFailure::new("b.xml", "broken"));
        state.finish(RunPhase::Completed);
        assert_eq!(state.processed(), 1);
        assert_eq!(state.failures().len(), 1);
    }

    #[test]
    fn token_check() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.check().unwrap_err().is_cancelled());
    }

    #[test]
    fn yield_policy_observes_cancellation() {
        let policy = YieldPolicy {
            every: 2,
            pause: Duration::from_millis(1),
        };
        let token = CancellationToken::new();
        assert!(policy.after_file(1, &token).is_ok());
        assert!(policy.after_file(2, &token).is_ok());
        token.cancel();
        assert!(policy.after_file(3, &token).is_ok());
        assert!(policy.after_file(4, &token).is_err());
    }

    #[test]
    fn channel_sink_forwards() {
        let (tx, rx) = mpsc::channel();
        let mut sink = tx;
        sink.report(&Progress::new(1, 4, "x.xml"));
        assert_eq!(rx.recv().unwrap().message, "x.xml");
    }
}

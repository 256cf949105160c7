//! External PDF rename collaborator.
//!
//! PDF parsing happens in a separate program. It is started once per run as
//! `<program> [script] -i <pdf>... -s <renamed dir> -f <failed dir>` and
//! reports per-file results on stdout (see [`super::protocol`]).

use std::env;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::core::{CancellationToken, InvoiceError};

use super::protocol::{ProtocolLine, ProtocolTally};
use super::xml::RenameFolders;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfCollaborator {
    program: PathBuf,
    script: Option<PathBuf>,
}

impl PdfCollaborator {
    /// `program` is run directly, or as an interpreter for `script`.
    pub fn new(program: impl Into<PathBuf>, script: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn script(&self) -> Option<&Path> {
        self.script.as_deref()
    }

    /// Fails with `CollaboratorUnavailable` when the program cannot be found
    /// (directly or on `PATH`) or the script file is missing.
    pub fn check_available(&self) -> Result<PathBuf, InvoiceError> {
        let program = resolve_program(&self.program).ok_or_else(|| {
            InvoiceError::CollaboratorUnavailable(format!(
                "executable not found: {}",
                self.program.display()
            ))
        })?;
        if let Some(script) = &self.script {
            if !script.is_file() {
                return Err(InvoiceError::CollaboratorUnavailable(format!(
                    "script not found: {}",
                    script.display()
                )));
            }
        }
        Ok(program)
    }

    /// Command-line arguments, without the program itself.
    pub fn build_args(&self, pdfs: &[PathBuf], folders: &RenameFolders) -> Vec<OsString> {
        let mut args = Vec::with_capacity(pdfs.len() + 6);
        if let Some(script) = &self.script {
            args.push(script.clone().into_os_string());
        }
        args.push("-i".into());
        args.extend(pdfs.iter().map(|p| absolute(p).into_os_string()));
        args.push("-s".into());
        args.push(folders.renamed.clone().into_os_string());
        args.push("-f".into());
        args.push(folders.failed.clone().into_os_string());
        args
    }

    /// Run the collaborator over `pdfs` and tally its output.
    ///
    /// `on_line` sees every parsed line together with the tally so far.
    /// Cancellation kills the child process.
    pub fn run(
        &self,
        pdfs: &[PathBuf],
        folders: &RenameFolders,
        cancel: &CancellationToken,
        mut on_line: impl FnMut(&ProtocolLine, &ProtocolTally),
    ) -> Result<ProtocolTally, InvoiceError> {
        let program = self.check_available()?;
        cancel.check()?;

        let args = self.build_args(pdfs, folders);
        tracing::info!(program = %program.display(), args = args.len(), "starting PDF collaborator");
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| InvoiceError::CollaboratorUnavailable(format!("{}: {e}", program.display())))?;

        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let (tx, rx) = mpsc::channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            thread::spawn(move || {
                let mut reader = BufReader::new(stdout);
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf);
                            if tx.send(line.trim_end_matches(['\r', '\n']).to_string()).is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }

        let mut tally = ProtocolTally::default();
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    tracing::debug!(line = %line, "PDF collaborator output");
                    let parsed = tally.feed(&line);
                    on_line(&parsed, &tally);
                    if cancel.is_cancelled() {
                        return Err(stop(&mut child));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if cancel.is_cancelled() {
                        return Err(stop(&mut child));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = child.wait()?;
        let errors = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !errors.trim().is_empty() {
            tracing::error!(stderr = %errors.trim(), "PDF collaborator reported errors");
        }
        tracing::info!(
            exit_code = ?status.code(),
            success = tally.success,
            failed = tally.failed,
            "PDF collaborator finished"
        );
        Ok(tally)
    }
}

fn stop(child: &mut Child) -> InvoiceError {
    tracing::warn!(pid = child.id(), "cancelling PDF collaborator");
    let _ = child.kill();
    let _ = child.wait();
    InvoiceError::Cancelled
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Locate `program`: as given when it has a directory part, otherwise on `PATH`.
fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 || program.is_absolute() {
        return program.is_file().then(|| program.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

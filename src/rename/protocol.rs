//! Line protocol spoken by the PDF rename collaborator on stdout.
//!
//! ```text
//! PROGRESS: <file> -> <anything containing SUCCESS | FAILED | ERROR>
//! SUMMARY: SUCCESS=<n>, FAILED=<n>
//! ```
//!
//! Every other line is informational.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const PROGRESS_PREFIX: &str = "PROGRESS:";
const SUMMARY_PREFIX: &str = "SUMMARY:";

/// Reported when a progress line has no `<file> ->` part.
pub const UNKNOWN_FILE: &str = "Unknown file";

fn progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"PROGRESS:\s+(.+?)\s+->").expect("static pattern"))
}

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"SUCCESS=(\d+), FAILED=(\d+)").expect("static pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Failed,
    /// A progress line carrying neither outcome keyword.
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolLine {
    Progress { file: String, status: FileStatus },
    Summary { success: usize, failed: usize },
    Other,
}

/// Classify one stdout line.
pub fn parse_line(line: &str) -> ProtocolLine {
    if line.starts_with(PROGRESS_PREFIX) {
        let file = progress_re()
            .captures(line)
            .and_then(|c| c.get(1))
            .map_or(UNKNOWN_FILE, |m| m.as_str())
            .to_string();
        let status = if line.contains("SUCCESS") {
            FileStatus::Success
        } else if line.contains("FAILED") || line.contains("ERROR") {
            FileStatus::Failed
        } else {
            FileStatus::Pending
        };
        return ProtocolLine::Progress { file, status };
    }

    if line.starts_with(SUMMARY_PREFIX) {
        if let Some(caps) = summary_re().captures(line) {
            let success = caps[1].parse::<usize>();
            let failed = caps[2].parse::<usize>();
            if let (Ok(success), Ok(failed)) = (success, failed) {
                return ProtocolLine::Summary { success, failed };
            }
        }
    }
    ProtocolLine::Other
}

/// Running counts accumulated from collaborator output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolTally {
    /// Progress lines seen.
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    /// A summary line overrode the accumulated counts.
    pub summarized: bool,
}

impl ProtocolTally {
    /// Parse `line` and fold it into the counts.
    pub fn feed(&mut self, line: &str) -> ProtocolLine {
        let parsed = parse_line(line);
        match &parsed {
            ProtocolLine::Progress { status, .. } => {
                self.processed += 1;
                match status {
                    FileStatus::Success => self.success += 1,
                    FileStatus::Failed => self.failed += 1,
                    FileStatus::Pending => {}
                }
            }
            ProtocolLine::Summary { success, failed } => {
                self.success = *success;
                self.failed = *failed;
                self.summarized = true;
            }
            ProtocolLine::Other => {}
        }
        parsed
    }

    /// Tally a complete transcript.
    pub fn from_output(output: &str) -> Self {
        let mut tally = Self::default();
        for line in output.lines() {
            tally.feed(line);
        }
        tally
    }
}

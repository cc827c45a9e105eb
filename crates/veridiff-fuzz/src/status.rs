//! Process exit status of a fuzzing run

use crate::error::FuzzError;
use crate::stats::Statistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    NoFindings,
    Findings,
    Usage,
    Internal,
    DiskExhausted,
    /// Every tool call timed out
    TimeoutOnly,
}

impl RunStatus {
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            RunStatus::NoFindings => 0,
            RunStatus::Findings => 1,
            RunStatus::Usage => 2,
            RunStatus::Internal => 3,
            RunStatus::DiskExhausted => 4,
            RunStatus::TimeoutOnly => 5,
        }
    }

    /// Status of a run that finished
    #[must_use]
    pub fn from_statistics(stats: &Statistics) -> Self {
        if stats.findings() > 0 {
            RunStatus::Findings
        } else if stats.timeouts > 0 && stats.effective_calls == 0 {
            RunStatus::TimeoutOnly
        } else {
            RunStatus::NoFindings
        }
    }

    /// Status of a run that was aborted
    #[must_use]
    pub fn from_error(err: &FuzzError) -> Self {
        match err {
            FuzzError::ToolMissing { .. } | FuzzError::Config(_) => RunStatus::Usage,
            FuzzError::DiskExhausted { .. } => RunStatus::DiskExhausted,
            FuzzError::Tool(_) | FuzzError::Io(_) => RunStatus::Internal,
        }
    }
}

//! Exit-status classification
//!
//! All return-code and signal interpretation lives here so that callers
//! only ever match on [`Outcome`].

use crate::process::{ToolRun, NOT_FOUND_CODE, TIMEOUT_CODE};
use serde::Serialize;
use std::fmt;

/// SIGSEGV as reported by a negated signal number
const SEGFAULT_SIGNAL: i32 = -11;
/// SIGKILL as reported by a negated signal number
const KILL_SIGNAL: i32 = -9;
/// SIGABRT as reported by a negated signal number
const ABORT_SIGNAL: i32 = -6;

/// Shell-style codes for a child that died on SIGSEGV
const SEGFAULT_CODES: [i32; 2] = [139, 245];
/// Shell-style code for a child that died on SIGABRT
const ABORT_CODE: i32 = 134;

/// What a tool run amounted to, before any output is inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Timeout,
    Crashed,
    ToolMissing,
    ToolError,
}

impl Outcome {
    /// Classify a raw return code.
    ///
    /// Checked in order: success, timeout, missing binary, fault signal,
    /// anything else.
    #[must_use]
    pub fn from_returncode(returncode: i32) -> Self {
        match returncode {
            0 => Self::Ok,
            TIMEOUT_CODE | KILL_SIGNAL => Self::Timeout,
            NOT_FOUND_CODE => Self::ToolMissing,
            SEGFAULT_SIGNAL => Self::Crashed,
            code if SEGFAULT_CODES.contains(&code) => Self::Crashed,
            _ => Self::ToolError,
        }
    }

    /// Classify a captured run
    #[must_use]
    pub fn classify(run: &ToolRun) -> Self {
        if run.timed_out {
            Self::Timeout
        } else if run.missing {
            Self::ToolMissing
        } else {
            Self::from_returncode(run.returncode)
        }
    }

    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Timeout => "timeout",
            Self::Crashed => "crashed",
            Self::ToolMissing => "tool missing",
            Self::ToolError => "tool error",
        };
        f.write_str(s)
    }
}

/// The process died on an abort signal (a failed C `assert`)
#[must_use]
pub fn aborted(returncode: i32) -> bool {
    returncode == ABORT_CODE || returncode == ABORT_SIGNAL
}

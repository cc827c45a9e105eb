//! Run-level errors
//!
//! Everything that can go wrong with a single mutant is an outcome value.
//! Only setup problems and unwritable bug reports end the run.

use crate::report::ReportError;
use std::path::PathBuf;
use thiserror::Error;
use veridiff_tools::ToolError;

#[derive(Debug, Error)]
pub enum FuzzError {
    #[error("{tool} not found: `{command}`")]
    ToolMissing { tool: &'static str, command: String },

    #[error("cannot write bug report {path}: {source}")]
    DiskExhausted {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReportError> for FuzzError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::DiskExhausted { path, source } => FuzzError::DiskExhausted { path, source },
        }
    }
}

pub type FuzzResult<T> = Result<T, FuzzError>;

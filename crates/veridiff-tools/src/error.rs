//! Tool errors

use thiserror::Error;

/// Failures to run a tool at all
///
/// A missing executable is not an error here: it is reported as a run
/// whose outcome is [`Outcome::ToolMissing`](crate::Outcome::ToolMissing),
/// so every caller classifies it the same way.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("empty command line for {0}")]
    EmptyCommand(&'static str),

    #[error("`{program}` is not installed or not on PATH")]
    NotFound { program: String },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running tool: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for tool operations
pub type ToolResult<T> = Result<T, ToolError>;

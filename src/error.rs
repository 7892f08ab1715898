//! Protocol error taxonomy.
//!
//! Every failure here is recovered locally: the offending push is dropped,
//! a diagnostic is logged, and document state is left unchanged. Errors are
//! never forwarded to the host as notifications.

use thiserror::Error;

/// Failures that can occur while dispatching host pushes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An `editcommand` payload failed to parse into a known operation.
    #[error("malformed edit command: {reason}")]
    MalformedCommand {
        /// Parser diagnostic for the log line.
        reason: String,
    },

    /// A push arrived before the document surface was created.
    #[error("document surface not ready; push dropped")]
    NotReady,

    /// A `linenumber` push resolved outside the document.
    #[error("line {line} outside document with {line_count} lines")]
    OutOfRangeLine {
        /// The adjusted 1-indexed line that was requested.
        line: i64,
        /// Number of lines in the document at dispatch time.
        line_count: usize,
    },
}

impl ProtocolError {
    /// Short tag used in log lines.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedCommand { .. } => "malformed-command",
            Self::NotReady => "not-ready",
            Self::OutOfRangeLine { .. } => "out-of-range-line",
        }
    }
}

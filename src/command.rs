//! Structured edit commands and their interpreter.
//!
//! The `editcommand` attribute carries one serialized [`Operation`] per
//! mutation: `{"op": "insert"|"movecursor"|"delete"|"noop", "cursor": int,
//! "strval"?: string, "intval"?: int}`. Parsing is exhaustive over the
//! variant tags, so an unknown tag is a parse failure rather than a silently
//! ignored branch.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProtocolError;
use crate::surface::{DocumentSurface, Position};

/// A structured edit command pushed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Splice `strval` into the document at `cursor`.
    Insert {
        /// Insertion position.
        cursor: Position,
        /// Text to insert.
        strval: String,
    },
    /// Touch the document at `cursor` with a zero-length insert.
    ///
    /// This deliberately does not place the caret; true caret placement goes
    /// through the `linenumber` attribute. The empty insert still raises one
    /// change notification.
    MoveCursor {
        /// Touch position.
        cursor: Position,
    },
    /// Remove up to `intval` characters starting at `cursor`, clamped to the
    /// document end.
    Delete {
        /// Start of the removed span.
        cursor: Position,
        /// Number of characters to remove.
        intval: usize,
    },
    /// A zero-length insert at `cursor`: no content effect, exactly one
    /// change notification. Used to force a re-validation pass.
    NoOp {
        /// Touch position.
        cursor: Position,
    },
}

/// Parse a serialized operation.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedCommand`] when the payload is not valid
/// JSON, names an unknown `op` tag, or is missing a required field.
pub fn parse(payload: &str) -> Result<Operation, ProtocolError> {
    serde_json::from_str(payload).map_err(|err| ProtocolError::MalformedCommand {
        reason: err.to_string(),
    })
}

/// Apply an operation to the surface.
///
/// Out-of-range positions are clamped by the surface; every call results in
/// exactly one change notification from the surface.
pub fn apply<S: DocumentSurface + ?Sized>(surface: &mut S, op: &Operation) {
    match op {
        Operation::Insert { cursor, strval } => {
            debug!(cursor, len = strval.chars().count(), "op.insert");
            surface.insert(*cursor, strval);
        }
        Operation::MoveCursor { cursor } => {
            debug!(cursor, "op.movecursor");
            surface.insert(*cursor, "");
        }
        Operation::Delete { cursor, intval } => {
            debug!(cursor, intval, "op.delete");
            surface.delete(*cursor, *intval);
        }
        Operation::NoOp { cursor } => {
            debug!(cursor, "op.noop");
            surface.insert(*cursor, "");
        }
    }
}

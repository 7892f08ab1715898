//! Attribute channel: out-of-band state pushes keyed by attribute name.
//!
//! Hosts drive the widget by mutating one of four observed attributes. Each
//! mutation is dispatched here exactly once, mapped to a typed push, and
//! applied synchronously.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::command;
use crate::config::WidgetOptions;
use crate::error::ProtocolError;
use crate::notify::{Emitter, Notification};
use crate::surface::DocumentSurface;

/// Attribute names observed by the widget.
pub const OBSERVED_ATTRIBUTES: [&str; 4] = ["editcommand", "linenumber", "text", "selection"];

/// The four kinds of attribute push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A serialized [`crate::command::Operation`].
    EditCommand,
    /// A decimal line number to move the cursor to and scroll into view.
    LineNumber,
    /// Authoritative full-document replacement text.
    Text,
    /// Pull request: emit the current selection as `selected-text`.
    Selection,
}

impl AttributeKind {
    /// Resolve an attribute name, or `None` for unobserved attributes.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "editcommand" => Some(Self::EditCommand),
            "linenumber" => Some(Self::LineNumber),
            "text" => Some(Self::Text),
            "selection" => Some(Self::Selection),
            _ => None,
        }
    }

    /// The attribute name this kind dispatches on.
    pub const fn name(self) -> &'static str {
        match self {
            Self::EditCommand => "editcommand",
            Self::LineNumber => "linenumber",
            Self::Text => "text",
            Self::Selection => "selection",
        }
    }
}

/// Dispatch one observed attribute mutation.
///
/// Applies the push to the surface; `text` and `editcommand` mutations reach
/// the host through the surface's own change notification, while `selection`
/// emits directly.
pub(crate) fn dispatch<S: DocumentSurface>(
    surface: &mut S,
    emitter: &Rc<RefCell<Emitter>>,
    options: &WidgetOptions,
    kind: AttributeKind,
    value: &str,
) -> Result<(), ProtocolError> {
    debug!(attribute = kind.name(), "dispatch");
    match kind {
        AttributeKind::EditCommand => {
            let op = command::parse(value)?;
            command::apply(surface, &op);
            Ok(())
        }
        AttributeKind::LineNumber => scroll_to_line(surface, options, value),
        AttributeKind::Text => {
            surface.set_text(value);
            Ok(())
        }
        AttributeKind::Selection => {
            let range = surface.selection();
            let slice = surface.slice(range);
            emitter
                .borrow_mut()
                .emit(&Notification::SelectedText(slice));
            Ok(())
        }
    }
}

/// Resolve an incoming line number and move the caret to its first column.
///
/// The incoming value is shifted by the configured adjustment before being
/// resolved 1-indexed against the current document.
fn scroll_to_line<S: DocumentSurface>(
    surface: &mut S,
    options: &WidgetOptions,
    value: &str,
) -> Result<(), ProtocolError> {
    let requested: i64 =
        value
            .trim()
            .parse()
            .map_err(|_| ProtocolError::MalformedCommand {
                reason: format!("linenumber payload {value:?} is not an integer"),
            })?;
    let line = requested.saturating_add(options.line_adjust());
    let target = usize::try_from(line)
        .ok()
        .and_then(|line| surface.line_start(line))
        .ok_or_else(|| ProtocolError::OutOfRangeLine {
            line,
            line_count: surface.line_count(),
        })?;
    surface.set_cursor(target);
    surface.scroll_to(target);
    Ok(())
}

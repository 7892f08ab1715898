//! Outbound notifications and their observer registry.
//!
//! Instead of bubbling platform events, the widget exposes an explicit
//! observer interface: hosts register callbacks and receive every
//! notification synchronously, in emission order, each carrying a full
//! snapshot of whatever it reports.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::surface::Position;

/// Opaque identifier of a live surface, carried by
/// [`Notification::EditorReady`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocate the next identifier.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A notification raised to the host.
///
/// Serializes to `{"name": ..., "detail": ...}`, the shape hosts consume at
/// the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "detail", rename_all = "kebab-case")]
pub enum Notification {
    /// Raised exactly once, when the surface is first created.
    EditorReady {
        /// Handle of the newly created surface.
        surface: SurfaceId,
    },
    /// Raised after every document mutation, whatever initiated it.
    TextChange {
        /// Cursor position after the mutation.
        position: Position,
        /// Full document content after the mutation.
        source: String,
    },
    /// Raised on pointer interaction with the rendered surface.
    CursorChange {
        /// Position resolved under the pointer.
        position: Position,
        /// Full document content.
        source: String,
    },
    /// Raised in response to a `selection` pull: the sliced selection text.
    SelectedText(String),
}

impl Notification {
    /// The wire name of this notification.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::EditorReady { .. } => "editor-ready",
            Self::TextChange { .. } => "text-change",
            Self::CursorChange { .. } => "cursor-change",
            Self::SelectedText(_) => "selected-text",
        }
    }
}

/// Registry of host listeners.
///
/// Listeners fire synchronously and in registration order; there is no
/// batching or debouncing. A listener must not register further listeners
/// while being notified.
pub(crate) struct Emitter {
    listeners: Vec<Box<dyn FnMut(&Notification)>>,
}

impl Emitter {
    pub(crate) const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Box<dyn FnMut(&Notification)>) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&mut self, notification: &Notification) {
        debug!(name = notification.name(), "notify");
        for listener in &mut self.listeners {
            listener(notification);
        }
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

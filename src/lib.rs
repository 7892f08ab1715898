// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. surface::RopeSurface)
    clippy::module_name_repetitions
)]

//! # Editsync
//!
//! An attribute-driven synchronization bridge between a host application and
//! an embedded text-editing surface.
//!
//! The host treats the widget as a black box: it pushes state in by mutating
//! one of four observed attributes (`editcommand`, `linenumber`, `text`,
//! `selection`) and observes state out through registered notification
//! listeners (`editor-ready`, `text-change`, `cursor-change`,
//! `selected-text`). The editing engine itself sits behind the
//! [`surface::DocumentSurface`] capability interface; a rope-backed
//! reference surface ships in [`surface::RopeSurface`].
//!
//! ## Architecture
//!
//! - [`widget`]: lifecycle controller owning the surface and the wiring
//! - [`attr`]: attribute channel mapping attribute mutations to typed pushes
//! - [`command`]: structured edit vocabulary and its interpreter
//! - [`notify`]: outbound notifications and the observer registry
//! - [`surface`]: the capability interface and the reference implementation
//!
//! Everything is synchronous and single-threaded: an attribute push is fully
//! applied, and its notifications fully delivered, before the call returns.
//! Each discrete document mutation yields exactly one `text-change`, in
//! application order.
//!
//! ## Example
//!
//! ```
//! use editsync::prelude::*;
//!
//! let mut widget = EditorWidget::with_rope_surface(WidgetOptions::default());
//! widget.subscribe(|n| println!("{}", n.name()));
//! widget.connect();
//! widget.set_attribute("text", "hello");
//! widget.set_attribute(
//!     "editcommand",
//!     r#"{"op":"insert","cursor":5,"strval":" world"}"#,
//! );
//! assert_eq!(widget.surface().unwrap().text(), "hello world");
//! ```

pub mod attr;
pub mod command;
pub mod config;
pub mod error;
pub mod notify;
pub mod surface;
pub mod watcher;
pub mod widget;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::attr::AttributeKind;
    pub use crate::command::Operation;
    pub use crate::config::WidgetOptions;
    pub use crate::error::ProtocolError;
    pub use crate::notify::{Notification, SurfaceId};
    pub use crate::surface::{DocumentSurface, Position, Range, RopeSurface};
    pub use crate::widget::{EditorWidget, Phase};
}

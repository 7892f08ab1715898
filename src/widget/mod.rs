//! Widget lifecycle controller.
//!
//! Owns the document surface and wires the attribute channel, command
//! interpreter, and notification emitter together. The surface is created
//! lazily, exactly once, on first connection; reconnect cycles reuse it so
//! document content and cursor position survive detach/reattach.
//!
//! Everything runs synchronously on the caller's thread: an attribute push
//! is fully applied, and its notifications fully delivered, before
//! [`EditorWidget::set_attribute`] returns.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::attr::{self, AttributeKind};
use crate::config::WidgetOptions;
use crate::error::ProtocolError;
use crate::notify::{Emitter, Notification, SurfaceId};
use crate::surface::{DocumentSurface, RopeSurface};

/// Connection phase of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed; never connected.
    Unattached,
    /// Known to a host tree but not currently connected.
    Attached,
    /// Connected with a live surface.
    Ready,
}

/// The attribute-driven editor widget.
///
/// Hosts push state in through [`set_attribute`](Self::set_attribute) and
/// observe state out through [`subscribe`](Self::subscribe). The embedded
/// editing engine is only ever touched through the [`DocumentSurface`]
/// capability interface.
pub struct EditorWidget<S: DocumentSurface = RopeSurface> {
    phase: Phase,
    options: WidgetOptions,
    factory: Option<Box<dyn FnOnce(&WidgetOptions) -> S>>,
    surface: Option<S>,
    emitter: Rc<RefCell<Emitter>>,
    id: SurfaceId,
}

impl EditorWidget<RopeSurface> {
    /// Create a widget that builds a [`RopeSurface`] on first connection.
    pub fn with_rope_surface(options: WidgetOptions) -> Self {
        Self::new(options, |opts| RopeSurface::new(opts))
    }
}

impl<S: DocumentSurface> EditorWidget<S> {
    /// Create a widget; `factory` builds the surface on first connection.
    pub fn new(
        options: WidgetOptions,
        factory: impl FnOnce(&WidgetOptions) -> S + 'static,
    ) -> Self {
        Self {
            phase: Phase::Unattached,
            options,
            factory: Some(Box::new(factory)),
            surface: None,
            emitter: Rc::new(RefCell::new(Emitter::new())),
            id: SurfaceId::next(),
        }
    }

    /// The opaque handle carried by this widget's `editor-ready`
    /// notification.
    pub const fn id(&self) -> SurfaceId {
        self.id
    }

    /// Current connection phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the widget is connected with a live surface.
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready && self.surface.is_some()
    }

    /// Register a host listener for outbound notifications.
    ///
    /// Subscribe before [`connect`](Self::connect) to observe
    /// `editor-ready`. Listeners fire synchronously in registration order
    /// and must not subscribe further listeners while being notified.
    pub fn subscribe(&mut self, listener: impl FnMut(&Notification) + 'static) {
        self.emitter.borrow_mut().subscribe(Box::new(listener));
    }

    /// Mark the widget as placed in a host tree, without connecting it.
    ///
    /// Attribute pushes in this phase are dropped as not-ready; the surface
    /// only comes to life on [`connect`](Self::connect).
    pub fn attach(&mut self) {
        if self.phase == Phase::Unattached {
            self.phase = Phase::Attached;
        }
    }

    /// Connect the widget to its host tree.
    ///
    /// The first connection constructs the surface, registers its change
    /// listener, and raises `editor-ready` exactly once. Later connections
    /// reuse the existing surface so document state is preserved.
    pub fn connect(&mut self) {
        if self.surface.is_some() {
            debug!(id = self.id.get(), "reconnect; surface reused");
            self.phase = Phase::Ready;
            return;
        }
        // First connection: factory is still present by construction.
        let Some(factory) = self.factory.take() else {
            warn!(id = self.id.get(), "connect without factory or surface");
            return;
        };
        let mut surface = factory(&self.options);
        let emitter = Rc::clone(&self.emitter);
        surface.on_change(Box::new(move |notice| {
            emitter.borrow_mut().emit(&Notification::TextChange {
                position: notice.position,
                source: notice.text.clone(),
            });
        }));
        self.surface = Some(surface);
        self.phase = Phase::Ready;
        debug!(id = self.id.get(), "surface created");
        self.emitter
            .borrow_mut()
            .emit(&Notification::EditorReady { surface: self.id });
    }

    /// Disconnect from the host tree, keeping the surface alive.
    pub fn disconnect(&mut self) {
        if self.phase == Phase::Ready {
            self.phase = Phase::Attached;
            debug!(id = self.id.get(), "disconnected; surface retained");
        }
    }

    /// Dispatch one observed-attribute mutation.
    ///
    /// Unobserved names are ignored. Failures (malformed payloads,
    /// out-of-range lines, pushes before the surface exists) are logged and
    /// dropped; they never mutate the document and never reach the host as
    /// notifications.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let Some(kind) = AttributeKind::from_name(name) else {
            debug!(name, "ignoring unobserved attribute");
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            warn!(
                attribute = kind.name(),
                error = %ProtocolError::NotReady,
                "attribute push dropped"
            );
            return;
        };
        if let Err(err) = attr::dispatch(surface, &self.emitter, &self.options, kind, value) {
            warn!(
                attribute = kind.name(),
                kind = err.kind(),
                error = %err,
                "attribute push dropped"
            );
        }
    }

    /// Route a pointer click on the rendered surface.
    ///
    /// Resolves the coordinate to a position, places the caret there, and
    /// raises `cursor-change` with a full document snapshot.
    pub fn pointer_click(&mut self, x: u16, y: u16) {
        let Some(surface) = self.surface.as_mut() else {
            warn!(error = %ProtocolError::NotReady, "pointer click dropped");
            return;
        };
        let position = surface.position_at(x, y);
        surface.set_cursor(position);
        let source = surface.text();
        self.emitter
            .borrow_mut()
            .emit(&Notification::CursorChange { position, source });
    }

    /// The live surface, if connected at least once.
    ///
    /// Direct mutations through this reference still raise `text-change`
    /// exactly like host-driven edits; this is the path embedding glue uses
    /// to feed user interaction in.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// Mutable access to the live surface.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }
}

impl<S: DocumentSurface> std::fmt::Debug for EditorWidget<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorWidget")
            .field("phase", &self.phase)
            .field("id", &self.id)
            .field("surface", &self.surface.is_some())
            .finish()
    }
}

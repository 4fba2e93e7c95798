//! # Key Observer
//!
//! This crate implements the focus-gated observer that components mount to
//! receive key messages the application declined.
//!
//! ## Philosophy
//!
//! - **Stable identity**: an observer registers itself, one allocation, for
//!   its whole mounted life. Add and remove therefore always target the same
//!   registry entry, which is what makes registration idempotent.
//! - **Focus is a capability**: the observer does not track focus; it asks an
//!   externally-supplied [`FocusQuery`]. No query means unconditionally
//!   active.
//! - **Pure pass-through**: when active, the inner handler's verdict is
//!   returned unchanged; the observer adds no policy of its own.
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A focus manager (the host owns focus; this only queries it)
//! - A shortcut table (the inner handler decides what a key means)

use dispatch_registry::{DispatchRegistry, HandlerId, KeyMessageHandler};
use key_types::KeyMessage;
use std::rc::Rc;

/// Capability to ask whether a logical focus target currently has focus
///
/// Implementations whose target no longer exists must report `false`: a
/// vanished focus target makes the observer inactive rather than being a
/// usage error.
pub trait FocusQuery {
    /// Returns true if the target currently has input focus
    fn has_focus(&self) -> bool;
}

/// Focus-gated observer of unhandled key messages
///
/// Receives every message the registry's original handler declined and
/// forwards it to the inner handler only while the focus gate is open.
/// Mount on creation, unmount on destruction; both target the same
/// allocation, so repeated mounts never duplicate the registration.
pub struct UnhandledKeyObserver {
    handler: Rc<dyn KeyMessageHandler>,
    focus: Option<Rc<dyn FocusQuery>>,
}

impl UnhandledKeyObserver {
    /// Creates an unconditionally-active observer
    pub fn new(handler: Rc<dyn KeyMessageHandler>) -> Rc<Self> {
        Rc::new(Self {
            handler,
            focus: None,
        })
    }

    /// Creates an observer gated on a focus capability
    pub fn with_focus(handler: Rc<dyn KeyMessageHandler>, focus: Rc<dyn FocusQuery>) -> Rc<Self> {
        Rc::new(Self {
            handler,
            focus: Some(focus),
        })
    }

    /// Registers this observer with the registry
    pub fn mount(self: &Rc<Self>, registry: &mut DispatchRegistry) -> HandlerId {
        let handler: Rc<dyn KeyMessageHandler> = Rc::<Self>::clone(self);
        registry.add_key_handler(handler)
    }

    /// Unregisters this observer; a no-op if it was never mounted
    pub fn unmount(self: &Rc<Self>, registry: &mut DispatchRegistry) -> bool {
        let handler: Rc<dyn KeyMessageHandler> = Rc::<Self>::clone(self);
        registry.remove_key_handler(&handler)
    }

    /// Returns true if the focus gate is currently open
    pub fn is_active(&self) -> bool {
        match &self.focus {
            Some(focus) => focus.has_focus(),
            None => true,
        }
    }
}

impl KeyMessageHandler for UnhandledKeyObserver {
    fn handle_key(&self, message: &KeyMessage) -> bool {
        if !self.is_active() {
            return false;
        }
        self.handler.handle_key(message)
    }
}

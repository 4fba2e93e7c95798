//! # Dispatch Registry
//!
//! This crate implements the process-scoped key dispatch registry: the
//! component that wraps the host environment's installed key handler and
//! offers unconsumed key messages to registered observers.
//!
//! ## Philosophy
//!
//! - **Application first**: the handler captured from the host always gets
//!   first refusal, so application-level shortcuts win over a document
//!   editor's default key behavior (Tab moves focus before Tab inserts a
//!   tab). This inverts normal leaf-first UI bubbling on purpose.
//! - **Explicit construction**: the registry is a constructed object with an
//!   explicit startup contract, not a lazily-created global. It must be
//!   installed after the host pipeline has a handler, and installing against
//!   an empty pipeline is a hard error.
//! - **Ordered, duplicate-free**: registered handlers are tried strictly in
//!   first-registration order; registering the same handler twice keeps its
//!   original position, and removing an absent handler is a no-op.
//! - **Auditable**: every dispatch appends one structured record naming who
//!   consumed the message, or that nobody did.
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A keymap or shortcut table
//! - A focus tracker (observers bring their own focus capability)
//! - Thread-safe: dispatch runs on the host's single UI/event thread

use core::fmt;
use key_types::KeyMessage;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use uuid::Uuid;

/// A participant in key dispatch
///
/// One method: look at a message and report whether it was consumed. A
/// `true` return stops dispatch; no later handler sees the message. Real
/// handlers mutate editor or application state as a side effect, so they
/// take `&self` and use interior mutability for their own state.
pub trait KeyMessageHandler {
    /// Handles one key message; returns true if it was consumed
    fn handle_key(&self, message: &KeyMessage) -> bool;
}

/// The seam between this layer and the host UI runtime
///
/// The host must expose its currently-installed key handler and accept a
/// replacement. That is the entire integration surface.
pub trait HostKeyPipeline {
    /// The handler currently installed in the host, if any
    fn installed_handler(&self) -> Option<Rc<dyn KeyMessageHandler>>;

    /// Replaces the host's installed handler
    fn install_handler(&mut self, handler: Rc<dyn KeyMessageHandler>);
}

/// Unique identifier for a registered handler
///
/// Assigned at first registration and kept for the handler's whole
/// registration life, so audit records stay attributable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(Uuid);

impl HandlerId {
    /// Creates a new random handler ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// Registry error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The host pipeline had no handler to capture at install time.
    ///
    /// This is a startup-sequencing misuse: installing anyway would mean no
    /// key message is ever observed, so the caller should abort startup.
    #[error("host pipeline has no installed key handler to wrap")]
    MissingHostHandler,
}

/// One dispatch outcome, recorded per delivered message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchRecord {
    /// The original (captured) host handler consumed the message
    ConsumedByOriginal { sequence: u64 },
    /// A registered handler consumed the message
    ConsumedByHandler {
        handler: HandlerId,
        position: usize,
        sequence: u64,
    },
    /// Nobody consumed the message; host default behavior proceeds
    Unclaimed { sequence: u64 },
}

#[derive(Clone)]
struct HandlerEntry {
    id: HandlerId,
    handler: Rc<dyn KeyMessageHandler>,
}

/// How one walk of the chain ended
enum ChainOutcome {
    Original,
    Handler { id: HandlerId, position: usize },
    Unclaimed,
}

/// A registry shared with the composed handler installed in the host
pub type SharedRegistry = Rc<RefCell<DispatchRegistry>>;

/// Key dispatch registry
///
/// Owns the captured original handler and the ordered set of registered
/// handlers. Created once at startup and never torn down: observers come
/// and go over the application's life, the registry outlives them all.
pub struct DispatchRegistry {
    /// Handler captured from the host at install time; first refusal
    original: Rc<dyn KeyMessageHandler>,
    /// Registered handlers in first-registration order
    entries: Vec<HandlerEntry>,
    /// One record per dispatched message
    audit_trail: Vec<DispatchRecord>,
    /// Monotonic dispatch sequence number
    next_sequence: u64,
}

impl DispatchRegistry {
    /// Creates a registry around an already-captured original handler
    ///
    /// Used when embedding the registry directly; [`DispatchRegistry::install`]
    /// is the normal entry point.
    pub fn new(original: Rc<dyn KeyMessageHandler>) -> Self {
        Self {
            original,
            entries: Vec::new(),
            audit_trail: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Captures the host's installed handler and installs a composed
    /// replacement that runs this registry's dispatch chain
    ///
    /// Fails with [`RegistryError::MissingHostHandler`] if the host has no
    /// handler installed; that precondition is not recoverable and the
    /// caller should treat it as a startup failure.
    pub fn install(host: &mut dyn HostKeyPipeline) -> Result<SharedRegistry, RegistryError> {
        let original = host
            .installed_handler()
            .ok_or(RegistryError::MissingHostHandler)?;
        let registry = Rc::new(RefCell::new(Self::new(original)));
        host.install_handler(Rc::new(ComposedDispatch {
            registry: Rc::clone(&registry),
        }));
        Ok(registry)
    }

    /// Registers a handler, preserving order and de-duplicating
    ///
    /// The handler's identity is its allocation: registering the same `Rc`
    /// again returns the existing ID and keeps the existing position.
    pub fn add_key_handler(&mut self, handler: Rc<dyn KeyMessageHandler>) -> HandlerId {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| same_handler(&entry.handler, &handler))
        {
            return entry.id;
        }
        let id = HandlerId::new();
        self.entries.push(HandlerEntry { id, handler });
        id
    }

    /// Unregisters a handler; removing an absent handler is a no-op
    ///
    /// Returns true if the handler was present.
    pub fn remove_key_handler(&mut self, handler: &Rc<dyn KeyMessageHandler>) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !same_handler(&entry.handler, handler));
        self.entries.len() != before
    }

    /// Returns true if the handler is currently registered
    pub fn contains_handler(&self, handler: &Rc<dyn KeyMessageHandler>) -> bool {
        self.entries
            .iter()
            .any(|entry| same_handler(&entry.handler, handler))
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.entries.len()
    }

    /// Registered handler IDs in dispatch order
    pub fn handler_ids(&self) -> Vec<HandlerId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Dispatches one message through the chain
    ///
    /// Original handler first; if it declines, registered handlers in
    /// insertion order until one consumes. Returns whether anyone consumed
    /// the message.
    pub fn dispatch(&mut self, message: &KeyMessage) -> bool {
        let outcome = run_chain(&self.original, &self.entries, message);
        self.record(outcome)
    }

    /// Dispatch records, oldest first
    pub fn audit_trail(&self) -> &[DispatchRecord] {
        &self.audit_trail
    }

    /// Clears the audit trail (for testing)
    #[cfg(test)]
    pub fn clear_audit_trail(&mut self) {
        self.audit_trail.clear();
    }

    fn record(&mut self, outcome: ChainOutcome) -> bool {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        match outcome {
            ChainOutcome::Original => {
                self.audit_trail
                    .push(DispatchRecord::ConsumedByOriginal { sequence });
                true
            }
            ChainOutcome::Handler { id, position } => {
                self.audit_trail.push(DispatchRecord::ConsumedByHandler {
                    handler: id,
                    position,
                    sequence,
                });
                true
            }
            ChainOutcome::Unclaimed => {
                self.audit_trail.push(DispatchRecord::Unclaimed { sequence });
                false
            }
        }
    }
}

/// Walks the chain: original first, then registered handlers in order
fn run_chain(
    original: &Rc<dyn KeyMessageHandler>,
    entries: &[HandlerEntry],
    message: &KeyMessage,
) -> ChainOutcome {
    if original.handle_key(message) {
        return ChainOutcome::Original;
    }
    for (position, entry) in entries.iter().enumerate() {
        if entry.handler.handle_key(message) {
            return ChainOutcome::Handler {
                id: entry.id,
                position,
            };
        }
    }
    ChainOutcome::Unclaimed
}

/// Identity comparison by allocation address
///
/// Compares the data pointer only, not the vtable, so the same allocation
/// viewed through different trait-object coercions still matches.
fn same_handler(a: &Rc<dyn KeyMessageHandler>, b: &Rc<dyn KeyMessageHandler>) -> bool {
    core::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// The composed handler installed into the host
///
/// Snapshots the chain before invoking any handler, so a handler that
/// registers or unregisters during dispatch changes the next dispatch, not
/// the one in flight.
struct ComposedDispatch {
    registry: SharedRegistry,
}

impl KeyMessageHandler for ComposedDispatch {
    fn handle_key(&self, message: &KeyMessage) -> bool {
        let (original, entries) = {
            let registry = self.registry.borrow();
            (Rc::clone(&registry.original), registry.entries.clone())
        };
        let outcome = run_chain(&original, &entries, message);
        self.registry.borrow_mut().record(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use key_types::{KeyCode, KeyEvent, Modifiers};
    use std::cell::Cell;

    struct StubHandler {
        result: bool,
        calls: Cell<usize>,
    }

    impl StubHandler {
        fn new(result: bool) -> Rc<Self> {
            Rc::new(Self {
                result,
                calls: Cell::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl KeyMessageHandler for StubHandler {
        fn handle_key(&self, _message: &KeyMessage) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.result
        }
    }

    struct StubHost {
        installed: Option<Rc<dyn KeyMessageHandler>>,
    }

    impl StubHost {
        fn empty() -> Self {
            Self { installed: None }
        }

        fn with_handler(handler: Rc<dyn KeyMessageHandler>) -> Self {
            Self {
                installed: Some(handler),
            }
        }

        fn deliver(&self, message: &KeyMessage) -> bool {
            self.installed
                .as_ref()
                .map(|handler| handler.handle_key(message))
                .unwrap_or(false)
        }
    }

    impl HostKeyPipeline for StubHost {
        fn installed_handler(&self) -> Option<Rc<dyn KeyMessageHandler>> {
            self.installed.clone()
        }

        fn install_handler(&mut self, handler: Rc<dyn KeyMessageHandler>) {
            self.installed = Some(handler);
        }
    }

    fn message() -> KeyMessage {
        KeyMessage::new(KeyEvent::down(KeyCode::Char('a'), Modifiers::none()))
    }

    #[test]
    fn test_install_requires_host_handler() {
        let mut host = StubHost::empty();
        let result = DispatchRegistry::install(&mut host);
        assert!(matches!(result, Err(RegistryError::MissingHostHandler)));
    }

    #[test]
    fn test_install_replaces_host_handler() {
        let original = StubHandler::new(false);
        let mut host = StubHost::with_handler(original.clone());

        let _registry = DispatchRegistry::install(&mut host).unwrap();

        // The installed handler is now the composed one, not the original,
        // but the original still runs on delivery.
        host.deliver(&message());
        assert_eq!(original.calls(), 1);
    }

    #[test]
    fn test_original_handler_has_first_refusal() {
        let original = StubHandler::new(true);
        let observer = StubHandler::new(true);
        let mut registry = DispatchRegistry::new(original.clone());
        registry.add_key_handler(observer.clone());

        assert!(registry.dispatch(&message()));
        assert_eq!(original.calls(), 1);
        assert_eq!(observer.calls(), 0);
    }

    #[test]
    fn test_declined_message_reaches_handlers_in_order() {
        let original = StubHandler::new(false);
        let first = StubHandler::new(false);
        let second = StubHandler::new(true);
        let third = StubHandler::new(true);

        let mut registry = DispatchRegistry::new(original);
        registry.add_key_handler(first.clone());
        registry.add_key_handler(second.clone());
        registry.add_key_handler(third.clone());

        assert!(registry.dispatch(&message()));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[test]
    fn test_unclaimed_message_reports_false() {
        let original = StubHandler::new(false);
        let observer = StubHandler::new(false);
        let mut registry = DispatchRegistry::new(original);
        registry.add_key_handler(observer.clone());

        assert!(!registry.dispatch(&message()));
        assert_eq!(observer.calls(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_idempotent() {
        let original = StubHandler::new(false);
        let observer = StubHandler::new(false);
        let mut registry = DispatchRegistry::new(original);

        let id1 = registry.add_key_handler(observer.clone());
        let id2 = registry.add_key_handler(observer.clone());

        assert_eq!(id1, id2);
        assert_eq!(registry.handler_count(), 1);

        registry.dispatch(&message());
        assert_eq!(observer.calls(), 1);
    }

    #[test]
    fn test_duplicate_registration_keeps_position() {
        let original = StubHandler::new(false);
        let first = StubHandler::new(false);
        let second = StubHandler::new(false);
        let mut registry = DispatchRegistry::new(original);

        let first_id = registry.add_key_handler(first.clone());
        registry.add_key_handler(second.clone());
        registry.add_key_handler(first.clone());

        assert_eq!(registry.handler_ids()[0], first_id);
    }

    #[test]
    fn test_removal_is_idempotent() {
        let original = StubHandler::new(false);
        let observer = StubHandler::new(true);
        let mut registry = DispatchRegistry::new(original);

        let handler: Rc<dyn KeyMessageHandler> = observer.clone();
        registry.add_key_handler(Rc::clone(&handler));
        assert!(registry.remove_key_handler(&handler));
        assert!(!registry.remove_key_handler(&handler));
        assert_eq!(registry.handler_count(), 0);

        registry.dispatch(&message());
        assert_eq!(observer.calls(), 0);
    }

    #[test]
    fn test_distinct_handlers_are_not_deduplicated() {
        let original = StubHandler::new(false);
        let a = StubHandler::new(false);
        let b = StubHandler::new(false);
        let mut registry = DispatchRegistry::new(original);

        registry.add_key_handler(a);
        registry.add_key_handler(b);

        assert_eq!(registry.handler_count(), 2);
    }

    #[test]
    fn test_audit_records_original_consumption() {
        let mut registry = DispatchRegistry::new(StubHandler::new(true));
        registry.dispatch(&message());

        assert_eq!(
            registry.audit_trail(),
            &[DispatchRecord::ConsumedByOriginal { sequence: 0 }]
        );
    }

    #[test]
    fn test_audit_records_handler_consumption() {
        let mut registry = DispatchRegistry::new(StubHandler::new(false));
        registry.add_key_handler(StubHandler::new(false));
        let id = registry.add_key_handler(StubHandler::new(true));

        registry.dispatch(&message());

        assert_eq!(
            registry.audit_trail(),
            &[DispatchRecord::ConsumedByHandler {
                handler: id,
                position: 1,
                sequence: 0,
            }]
        );
    }

    #[test]
    fn test_audit_records_unclaimed_with_increasing_sequence() {
        let mut registry = DispatchRegistry::new(StubHandler::new(false));
        registry.dispatch(&message());
        registry.dispatch(&message());

        assert_eq!(
            registry.audit_trail(),
            &[
                DispatchRecord::Unclaimed { sequence: 0 },
                DispatchRecord::Unclaimed { sequence: 1 },
            ]
        );
    }

    #[test]
    fn test_audit_trail_clear() {
        let mut registry = DispatchRegistry::new(StubHandler::new(true));
        registry.dispatch(&message());
        registry.clear_audit_trail();

        assert!(registry.audit_trail().is_empty());

        // The sequence counter keeps going after a clear.
        registry.dispatch(&message());
        assert_eq!(
            registry.audit_trail(),
            &[DispatchRecord::ConsumedByOriginal { sequence: 1 }]
        );
    }

    #[test]
    fn test_dispatch_record_serialization() {
        let record = DispatchRecord::ConsumedByHandler {
            handler: HandlerId::new(),
            position: 3,
            sequence: 7,
        };
        let json = serde_json::to_string(&record).unwrap();
        let decoded: DispatchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn test_handler_id_display() {
        let id = HandlerId::new();
        assert!(format!("{}", id).starts_with("Handler("));
    }

    /// A handler that unregisters itself while a dispatch is in flight.
    struct SelfRemovingHandler {
        registry: SharedRegistry,
        this: RefCell<Option<Rc<dyn KeyMessageHandler>>>,
        calls: Cell<usize>,
    }

    impl KeyMessageHandler for SelfRemovingHandler {
        fn handle_key(&self, _message: &KeyMessage) -> bool {
            self.calls.set(self.calls.get() + 1);
            if let Some(this) = self.this.borrow_mut().take() {
                self.registry.borrow_mut().remove_key_handler(&this);
            }
            false
        }
    }

    #[test]
    fn test_reentrant_removal_affects_next_dispatch_only() {
        let original = StubHandler::new(false);
        let mut host = StubHost::with_handler(original);
        let registry = DispatchRegistry::install(&mut host).unwrap();

        let tail = StubHandler::new(false);
        let self_removing = Rc::new(SelfRemovingHandler {
            registry: Rc::clone(&registry),
            this: RefCell::new(None),
            calls: Cell::new(0),
        });
        let as_handler: Rc<dyn KeyMessageHandler> = self_removing.clone();
        *self_removing.this.borrow_mut() = Some(Rc::clone(&as_handler));

        registry.borrow_mut().add_key_handler(as_handler);
        registry.borrow_mut().add_key_handler(tail.clone());

        // First delivery: the snapshot still contains both handlers.
        assert!(!host.deliver(&message()));
        assert_eq!(self_removing.calls.get(), 1);
        assert_eq!(tail.calls(), 1);
        assert_eq!(registry.borrow().handler_count(), 1);

        // Second delivery: the removed handler is gone.
        assert!(!host.deliver(&message()));
        assert_eq!(self_removing.calls.get(), 1);
        assert_eq!(tail.calls(), 2);
    }
}

//! # Dispatch Contract Tests
//!
//! This crate provides "golden" tests for the key-dispatch contracts to
//! ensure they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: the dispatch guarantees are written as code
//! - **Testability first**: contract tests fail when behavior changes
//! - **Whole chain**: beyond per-crate unit tests, these exercise host →
//!   registry → observer → pipeline end to end
//!
//! ## Structure
//!
//! Each area has a module with contract tests:
//! - Chain priority, ordering, and de-duplication
//! - Focus gating (including a vanished focus target)
//! - Action pipeline verdict semantics
//! - End-to-end flow through the simulated host
//! - Serialized audit-record stability

pub mod audit_contract;
pub mod dispatch_chain;
pub mod end_to_end;
pub mod focus_gating;
pub mod pipeline_contract;

/// Common handlers, focus stubs, and message constructors
pub mod test_helpers {
    use dispatch_registry::KeyMessageHandler;
    use key_observer::FocusQuery;
    use key_types::{KeyCode, KeyEvent, KeyMessage, Modifiers};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Handler with a fixed verdict and a call counter
    pub struct CountingHandler {
        result: bool,
        calls: Cell<usize>,
    }

    impl CountingHandler {
        pub fn new(result: bool) -> Rc<Self> {
            Rc::new(Self {
                result,
                calls: Cell::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl KeyMessageHandler for CountingHandler {
        fn handle_key(&self, _message: &KeyMessage) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.result
        }
    }

    /// Handler that appends its label to a shared call log
    pub struct SequencedHandler {
        label: usize,
        result: bool,
        log: Rc<RefCell<Vec<usize>>>,
    }

    impl SequencedHandler {
        pub fn new(label: usize, result: bool, log: Rc<RefCell<Vec<usize>>>) -> Rc<Self> {
            Rc::new(Self { label, result, log })
        }
    }

    impl KeyMessageHandler for SequencedHandler {
        fn handle_key(&self, _message: &KeyMessage) -> bool {
            self.log.borrow_mut().push(self.label);
            self.result
        }
    }

    /// Focus capability with a settable answer
    pub struct SettableFocus {
        focused: Cell<bool>,
    }

    impl SettableFocus {
        pub fn new(focused: bool) -> Rc<Self> {
            Rc::new(Self {
                focused: Cell::new(focused),
            })
        }

        pub fn set_focused(&self, focused: bool) {
            self.focused.set(focused);
        }
    }

    impl FocusQuery for SettableFocus {
        fn has_focus(&self) -> bool {
            self.focused.get()
        }
    }

    /// A key-down message for a printable character
    pub fn down_message(c: char) -> KeyMessage {
        KeyMessage::new(KeyEvent::down(KeyCode::Char(c), Modifiers::none()))
    }

    /// A key-up message for a printable character
    pub fn up_message(c: char) -> KeyMessage {
        KeyMessage::new(KeyEvent::up(KeyCode::Char(c), Modifiers::none()))
    }

    /// A key-down message with modifiers
    pub fn chord_message(c: char, modifiers: Modifiers) -> KeyMessage {
        KeyMessage::new(KeyEvent::down(KeyCode::Char(c), modifiers))
    }
}

/// Fixture editor used by the end-to-end contract
pub mod fixtures {
    use action_pipeline::{ActionInstruction, KeyboardAction};
    use dispatch_registry::KeyMessageHandler;
    use key_types::{KeyCode, KeyEvent, KeyMessage, Modifiers};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Minimal document the fixture editor mutates
    #[derive(Debug, Default, PartialEq, Eq)]
    pub struct Document {
        pub text: String,
    }

    /// Inserts printable characters into the document
    pub struct InsertCharAction;

    impl KeyboardAction<Document> for InsertCharAction {
        fn execute(&self, doc: &mut Document, event: &KeyEvent) -> ActionInstruction {
            match event.code {
                KeyCode::Char(c) => {
                    doc.text.push(c);
                    ActionInstruction::Halt
                }
                _ => ActionInstruction::Continue,
            }
        }
    }

    /// Recognizes Tab and deliberately leaves it to the host
    ///
    /// The editor could insert a literal tab here; reporting `Blocked`
    /// instead keeps focus traversal working while still stopping any later
    /// editing action in the chain.
    pub struct YieldTabAction;

    impl KeyboardAction<Document> for YieldTabAction {
        fn execute(&self, _doc: &mut Document, event: &KeyEvent) -> ActionInstruction {
            if event.code == KeyCode::Tab {
                ActionInstruction::Blocked
            } else {
                ActionInstruction::Continue
            }
        }
    }

    /// Application-level shortcut handler: consumes Ctrl+<key> chords only
    pub struct AppShortcutHandler {
        consumed: Cell<usize>,
    }

    impl AppShortcutHandler {
        pub fn new() -> Rc<Self> {
            Rc::new(Self {
                consumed: Cell::new(0),
            })
        }

        pub fn consumed(&self) -> usize {
            self.consumed.get()
        }
    }

    impl KeyMessageHandler for AppShortcutHandler {
        fn handle_key(&self, message: &KeyMessage) -> bool {
            if message.event().modifiers.contains(Modifiers::CTRL) {
                self.consumed.set(self.consumed.get() + 1);
                return true;
            }
            false
        }
    }
}

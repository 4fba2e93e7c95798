#![no_std]

//! # Key Types
//!
//! This crate defines the key event and key message types shared by the
//! dispatch layer.
//!
//! ## Philosophy
//!
//! - **Events, not bytes**: a key interaction is a structured value, not a
//!   scan code or an escape sequence
//! - **Immutable in flight**: a message never changes once the host has
//!   delivered it; handlers only decide whether they consume it
//! - **Testable**: every type is serializable so events can be injected and
//!   recorded in tests
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A physical/virtual keyboard distinction (logical keys only)
//! - An input-method layer (IME text arrives pre-composed, if at all)
//! - A keymap or shortcut table (that belongs to the components that
//!   consume these events)

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logical key code
///
/// Identifies which key an event refers to, independent of layout or
/// hardware. Printable keys carry their character; function keys carry
/// their number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// A printable character key
    Char(char),
    /// A function key (F1 is `Function(1)`)
    Function(u8),

    // Whitespace and editing
    Enter,
    Tab,
    Space,
    Backspace,
    Delete,
    Insert,
    Escape,

    // Navigation
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    /// A key the host could not map to a logical code
    Unidentified,
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{}", c),
            Self::Function(n) => write!(f, "F{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Modifier keys active during a key interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    /// No modifiers
    pub const NONE: Self = Self { bits: 0 };
    /// Control key
    pub const CTRL: Self = Self { bits: 1 << 0 };
    /// Alt key
    pub const ALT: Self = Self { bits: 1 << 1 };
    /// Shift key
    pub const SHIFT: Self = Self { bits: 1 << 2 };
    /// Meta/Super key
    pub const META: Self = Self { bits: 1 << 3 };

    /// Creates an empty modifier set
    pub fn none() -> Self {
        Self::NONE
    }

    /// Combines this set with another
    pub fn with(mut self, other: Modifiers) -> Self {
        self.bits |= other.bits;
        self
    }

    /// Returns true if every modifier in `other` is present
    pub fn contains(&self, other: Modifiers) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns true if no modifiers are active
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut parts = Vec::new();
        if self.contains(Self::CTRL) {
            parts.push("Ctrl");
        }
        if self.contains(Self::ALT) {
            parts.push("Alt");
        }
        if self.contains(Self::SHIFT) {
            parts.push("Shift");
        }
        if self.contains(Self::META) {
            parts.push("Meta");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// Key interaction state
///
/// Distinguishes the press itself from its release and from auto-repeat.
/// Only `Down` events drive editing actions; the other two states are
/// reported to handlers but never start an action chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    /// Key went down
    Down,
    /// Key came back up
    Up,
    /// Key is auto-repeating while held
    Repeat,
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
            Self::Repeat => write!(f, "repeat"),
        }
    }
}

/// One keyboard interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// The key involved
    pub code: KeyCode,
    /// Modifiers active at the time
    pub modifiers: Modifiers,
    /// Down, up, or repeat
    pub state: KeyState,
    /// Pre-composed text, when the host supplies it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl KeyEvent {
    /// Creates a key event
    pub fn new(code: KeyCode, modifiers: Modifiers, state: KeyState) -> Self {
        Self {
            code,
            modifiers,
            state,
            text: None,
        }
    }

    /// Creates a key-down event
    pub fn down(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(code, modifiers, KeyState::Down)
    }

    /// Creates a key-up event
    pub fn up(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(code, modifiers, KeyState::Up)
    }

    /// Creates an auto-repeat event
    pub fn repeat(code: KeyCode, modifiers: Modifiers) -> Self {
        Self::new(code, modifiers, KeyState::Repeat)
    }

    /// Attaches pre-composed text to this event
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Returns true for a key-down event
    pub fn is_down(&self) -> bool {
        self.state == KeyState::Down
    }

    /// Returns true for a key-up event
    pub fn is_up(&self) -> bool {
        self.state == KeyState::Up
    }

    /// Returns true for an auto-repeat event
    pub fn is_repeat(&self) -> bool {
        self.state == KeyState::Repeat
    }
}

/// One raw key message as delivered by the host environment
///
/// Wraps the logical [`KeyEvent`] together with whatever lower-level payload
/// the host attaches (native event data, timestamps, device info). The
/// payload is opaque to the dispatch layer and travels through it untouched.
///
/// A message is immutable once delivered; fields are only readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMessage {
    event: KeyEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform_payload: Option<Value>,
}

impl KeyMessage {
    /// Creates a message from a logical key event
    pub fn new(event: KeyEvent) -> Self {
        Self {
            event,
            platform_payload: None,
        }
    }

    /// Attaches an opaque host payload
    pub fn with_platform_payload(mut self, payload: Value) -> Self {
        self.platform_payload = Some(payload);
        self
    }

    /// The logical key event
    pub fn event(&self) -> &KeyEvent {
        &self.event
    }

    /// The opaque host payload, if any
    pub fn platform_payload(&self) -> Option<&Value> {
        self.platform_payload.as_ref()
    }
}

//! Focus gating contract tests
//!
//! An unfocused observer must never forward a message, whatever its inner
//! handler would have said; an observer without a focus capability is
//! unconditionally active; a focus capability whose target vanished makes
//! the observer inactive rather than failing.

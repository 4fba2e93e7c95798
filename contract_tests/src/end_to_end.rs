//! End-to-end dispatch contract
//!
//! Runs the whole chain the way a real integration would: a simulated host
//! with an application shortcut handler installed, a registry wrapping it,
//! and a focus-gated editor observer whose pipeline edits a document.

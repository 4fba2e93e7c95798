//! Dispatch chain contract tests
//!
//! These pin the three chain invariants: original-handler priority,
//! strict registration order, and identity-based de-duplication.

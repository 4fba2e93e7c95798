//! Action pipeline contract tests
//!
//! These pin the three-way verdict semantics: `Blocked` stops the chain
//! without consuming, `Halt` consumes, exhausted `Continue` does not, and
//! non-down events never reach an action.

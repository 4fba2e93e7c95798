//! Audit record serialization contracts
//!
//! These pin the serialized shape of the dispatch and pipeline audit
//! records so downstream tooling reading them does not break silently.

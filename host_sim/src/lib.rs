//! # Simulated Host Pipeline
//!
//! This crate provides an in-process stand-in for the host environment's
//! key pipeline.
//!
//! ## Purpose
//!
//! The simulated host lets the whole dispatch chain run under `cargo test`:
//! - Deterministic (one message at a time, no real event loop)
//! - Inspectable (handler slot and delivery count are accessible)
//! - Complete (exercises the same [`HostKeyPipeline`] seam a real host
//!   integration uses)
//!
//! This is not a mock of convenience: it is a full implementation of the
//! host seam that happens to run in-process.

use dispatch_registry::{HostKeyPipeline, KeyMessageHandler};
use key_types::KeyMessage;
use std::rc::Rc;
use thiserror::Error;

/// Simulated host error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimHostError {
    /// Delivery was attempted with an empty handler slot
    #[error("no key handler installed in simulated host")]
    NoInstalledHandler,
}

/// Simulated host key pipeline
///
/// Holds the single installed-handler slot a real host exposes, and
/// delivers key messages to it the way the host UI thread would.
pub struct SimHostPipeline {
    installed: Option<Rc<dyn KeyMessageHandler>>,
    deliveries: u64,
}

impl SimHostPipeline {
    /// Creates a host with an empty handler slot
    ///
    /// Installing a registry against this state fails, which is how tests
    /// exercise the startup-sequencing precondition.
    pub fn new() -> Self {
        Self {
            installed: None,
            deliveries: 0,
        }
    }

    /// Creates a host with a handler already installed
    pub fn with_handler(handler: Rc<dyn KeyMessageHandler>) -> Self {
        Self {
            installed: Some(handler),
            deliveries: 0,
        }
    }

    /// Delivers one key message to the installed handler
    ///
    /// Returns the handler's consumed flag; `false` means the host's
    /// default/bubbling behavior would proceed.
    pub fn deliver(&mut self, message: &KeyMessage) -> Result<bool, SimHostError> {
        let handler = self
            .installed
            .clone()
            .ok_or(SimHostError::NoInstalledHandler)?;
        self.deliveries += 1;
        Ok(handler.handle_key(message))
    }

    /// Returns true if a handler is installed
    pub fn has_handler(&self) -> bool {
        self.installed.is_some()
    }

    /// Number of messages delivered so far
    pub fn delivery_count(&self) -> u64 {
        self.deliveries
    }
}

impl Default for SimHostPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl HostKeyPipeline for SimHostPipeline {
    fn installed_handler(&self) -> Option<Rc<dyn KeyMessageHandler>> {
        self.installed.clone()
    }

    fn install_handler(&mut self, handler: Rc<dyn KeyMessageHandler>) {
        self.installed = Some(handler);
    }
}

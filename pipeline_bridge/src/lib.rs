//! # Pipeline Bridge
//!
//! This crate bridges an action pipeline into the dispatch layer's handler
//! seam: it is the piece an editor instance hands to its observer so that an
//! unconsumed key message becomes a pipeline run against that editor's
//! context.
//!
//! ## Design
//!
//! The bridge owns both the pipeline and the edit context behind interior
//! mutability, because the dispatch chain calls handlers through `&self`.
//! Dispatch is single-threaded and synchronous, so the borrows never
//! overlap.

use action_pipeline::ActionPipeline;
use dispatch_registry::KeyMessageHandler;
use key_types::KeyMessage;
use std::cell::{Ref, RefCell, RefMut};

/// Adapts an [`ActionPipeline`] plus its edit context into a
/// [`KeyMessageHandler`]
pub struct PipelineKeyHandler<C> {
    pipeline: RefCell<ActionPipeline<C>>,
    context: RefCell<C>,
}

impl<C> PipelineKeyHandler<C> {
    /// Creates a bridge owning the pipeline and its context
    pub fn new(pipeline: ActionPipeline<C>, context: C) -> Self {
        Self {
            pipeline: RefCell::new(pipeline),
            context: RefCell::new(context),
        }
    }

    /// Read access to the edit context
    pub fn context(&self) -> Ref<'_, C> {
        self.context.borrow()
    }

    /// Write access to the edit context
    pub fn context_mut(&self) -> RefMut<'_, C> {
        self.context.borrow_mut()
    }

    /// Read access to the pipeline (audit trail, action count)
    pub fn pipeline(&self) -> Ref<'_, ActionPipeline<C>> {
        self.pipeline.borrow()
    }

    /// Consumes the bridge, returning pipeline and context
    pub fn into_parts(self) -> (ActionPipeline<C>, C) {
        (self.pipeline.into_inner(), self.context.into_inner())
    }
}

impl<C> KeyMessageHandler for PipelineKeyHandler<C> {
    fn handle_key(&self, message: &KeyMessage) -> bool {
        let mut pipeline = self.pipeline.borrow_mut();
        let mut context = self.context.borrow_mut();
        pipeline.run(&mut context, message.event())
    }
}

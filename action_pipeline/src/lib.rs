//! # Action Pipeline
//!
//! This crate implements the ordered keyboard-action chain an editor runs
//! against one key event.
//!
//! ## Philosophy
//!
//! - **Order is meaning**: actions run strictly in the order the caller
//!   supplied them; the earlier action always gets first refusal
//! - **Three verdicts, not two**: an action can act ([`Halt`]), decline
//!   ([`Continue`]), or recognize the key and deliberately do nothing while
//!   still stopping the rest of the chain ([`Blocked`]). Collapsing that to
//!   a boolean loses the third case, so the mapping to "consumed" happens
//!   only at the very end.
//! - **Down events only**: key-up and auto-repeat never reach an action;
//!   they are recorded and reported as not consumed
//! - **Auditable**: every run appends one structured record of what happened
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - An editing engine (actions mutate the caller's context; the pipeline
//!   owns none of that state)
//! - A keymap (actions decide for themselves whether a key is theirs)
//!
//! [`Halt`]: ActionInstruction::Halt
//! [`Continue`]: ActionInstruction::Continue
//! [`Blocked`]: ActionInstruction::Blocked

use key_types::{KeyEvent, KeyState};
use serde::{Deserialize, Serialize};

/// Verdict of one keyboard action on one key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionInstruction {
    /// Not my key; try the next action
    Continue,
    /// My key, but deliberately no effect; stop the chain and let the event
    /// keep propagating outside this pipeline
    Blocked,
    /// Took an effect; stop the chain and consume the event
    Halt,
}

impl ActionInstruction {
    /// Returns true if this verdict ends the chain
    pub fn stops_chain(&self) -> bool {
        !matches!(self, Self::Continue)
    }

    /// Maps the final verdict to the consumed flag reported upward
    pub fn consumes(&self) -> bool {
        matches!(self, Self::Halt)
    }
}

/// One keyboard action in the chain
///
/// Reads the event, possibly mutates the edit context, and returns its
/// verdict. The context type is the caller's; the pipeline passes it
/// through untouched.
///
/// Plain closures implement this trait, so short actions need no named
/// type. Actions are boxed into the chain and never compared by identity,
/// unlike registry handlers.
pub trait KeyboardAction<C> {
    /// Evaluates this action against one key event
    fn execute(&self, ctx: &mut C, event: &KeyEvent) -> ActionInstruction;
}

impl<C, F> KeyboardAction<C> for F
where
    F: Fn(&mut C, &KeyEvent) -> ActionInstruction,
{
    fn execute(&self, ctx: &mut C, event: &KeyEvent) -> ActionInstruction {
        self(ctx, event)
    }
}

/// One pipeline run, recorded per incoming event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineRecord {
    /// A non-down event was filtered before any action ran
    SkippedNonDown { state: KeyState, sequence: u64 },
    /// Actions ran; `final_instruction` is the verdict that ended the chain
    /// (or `Continue` when the list was exhausted)
    Completed {
        final_instruction: ActionInstruction,
        actions_run: usize,
        consumed: bool,
        sequence: u64,
    },
}

/// Ordered keyboard-action chain
pub struct ActionPipeline<C> {
    actions: Vec<Box<dyn KeyboardAction<C>>>,
    audit_trail: Vec<PipelineRecord>,
    next_sequence: u64,
}

impl<C> ActionPipeline<C> {
    /// Creates an empty pipeline
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            audit_trail: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Appends an action (builder form)
    pub fn with_action(mut self, action: impl KeyboardAction<C> + 'static) -> Self {
        self.push_action(action);
        self
    }

    /// Appends an action to the end of the chain
    pub fn push_action(&mut self, action: impl KeyboardAction<C> + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Number of actions in the chain
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs the chain against one key event
    ///
    /// Non-down events are recorded and reported not consumed without
    /// running any action. For a down event, actions run in order until one
    /// returns a chain-stopping verdict or the list ends; only [`Halt`]
    /// maps to consumed.
    ///
    /// [`Halt`]: ActionInstruction::Halt
    pub fn run(&mut self, ctx: &mut C, event: &KeyEvent) -> bool {
        if event.state != KeyState::Down {
            let sequence = self.next_sequence();
            self.audit_trail.push(PipelineRecord::SkippedNonDown {
                state: event.state,
                sequence,
            });
            return false;
        }

        let mut instruction = ActionInstruction::Continue;
        let mut actions_run = 0;
        for action in &self.actions {
            actions_run += 1;
            instruction = action.execute(ctx, event);
            if instruction.stops_chain() {
                break;
            }
        }

        let consumed = instruction.consumes();
        let sequence = self.next_sequence();
        self.audit_trail.push(PipelineRecord::Completed {
            final_instruction: instruction,
            actions_run,
            consumed,
            sequence,
        });
        consumed
    }

    /// Run records, oldest first
    pub fn audit_trail(&self) -> &[PipelineRecord] {
        &self.audit_trail
    }

    /// Clears the audit trail (for testing)
    #[cfg(test)]
    pub fn clear_audit_trail(&mut self) {
        self.audit_trail.clear();
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}

impl<C> Default for ActionPipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

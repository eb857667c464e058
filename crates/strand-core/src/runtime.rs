// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The tick driver.
//!
//! A [`ProcRuntime`] makes a compiled proc behave, from the caller's
//! perspective, like one step of a concurrent hardware process: `run`
//! consumes the current recurrent state, lets the proc perform its channel
//! operations through the host hooks, and returns the next state. Ticks are
//! strictly sequential, synchronous, and independent — continuity is the
//! caller feeding one tick's output state into the next tick's input.

use thiserror::Error;

use crate::channel::ChannelId;
use crate::dispatch::TickIo;
use crate::hooks::{ChannelHooks, HookError, TickContext};
use crate::manager::ChannelQueueManager;
use crate::value::{Value, ValueError, ValueType};

/// Errors surfaced by tick execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The supplied state's arity disagreed with the proc's signature.
    #[error("state arity mismatch: proc declares {expected} elements, got {got}")]
    StateArity {
        /// Declared arity.
        expected: usize,
        /// Supplied arity.
        got: usize,
    },
    /// A state element's type disagreed with the proc's signature.
    #[error("state element {index} type mismatch: expected {expected}, got {got}")]
    StateType {
        /// Offending state slot.
        index: usize,
        /// Declared type.
        expected: ValueType,
        /// Supplied type.
        got: ValueType,
    },
    /// The compiled proc addressed a channel the network never declared.
    /// This indicates a defect in the compiled proc itself, not a
    /// recoverable condition; the tick is aborted.
    #[error("compiled proc addressed unknown channel {0}")]
    UnknownChannel(ChannelId),
    /// The compiled proc's structure is internally inconsistent (dangling
    /// node reference, ill-typed operand, non-`bits[1]` predicate).
    #[error("malformed proc: {0}")]
    MalformedProc(String),
    /// A host hook or the queue operation behind it failed mid-tick.
    #[error(transparent)]
    Hook(#[from] HookError),
    /// Payload encode/decode failed at a channel boundary.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// A compiled proc: an opaque callable exposing one tick entry point.
///
/// The production implementation is produced by a native code generator
/// outside this crate; [`crate::GraphProc`] interprets the same dataflow
/// graph and is what the test suite runs. Both observe identical channel
/// semantics because all channel effects go through the [`TickIo`] they are
/// handed.
pub trait CompiledProc {
    /// Proc name, for diagnostics.
    fn name(&self) -> &str;

    /// Declared recurrent state signature.
    fn state_type(&self) -> &[ValueType];

    /// Channel ids this proc operates on; validated against the queue
    /// manager when a runtime is constructed.
    fn channels(&self) -> Vec<ChannelId>;

    /// Executes one tick: consumes `state`, performs channel operations
    /// through `io`, returns the next state.
    ///
    /// # Errors
    /// Any [`RuntimeError`] aborts the tick; no partial state is returned.
    fn tick(&self, state: &[Value], io: &mut TickIo<'_, '_>) -> Result<Vec<Value>, RuntimeError>;
}

/// Tick driver binding a compiled proc to a queue manager and host hooks.
///
/// The runtime owns the manager so queue contents persist across ticks;
/// callers seed inputs and drain outputs between `run` calls through
/// [`ProcRuntime::queues_mut`]. It holds no other state between calls —
/// replaying a tick with identical state and queue contents reproduces the
/// same outputs and side effects.
#[derive(Debug)]
pub struct ProcRuntime<P, H> {
    proc: P,
    manager: ChannelQueueManager,
    hooks: H,
}

impl<P: CompiledProc, H: ChannelHooks> ProcRuntime<P, H> {
    /// Binds `proc` to `manager` and `hooks`.
    ///
    /// # Errors
    /// Returns [`RuntimeError::UnknownChannel`] if the proc references a
    /// channel id the manager does not own.
    pub fn new(proc: P, manager: ChannelQueueManager, hooks: H) -> Result<Self, RuntimeError> {
        for id in proc.channels() {
            if !manager.contains(id) {
                return Err(RuntimeError::UnknownChannel(id));
            }
        }
        tracing::debug!(proc = proc.name(), "proc runtime created");
        Ok(Self {
            proc,
            manager,
            hooks,
        })
    }

    /// Shared view of the owned queues.
    #[must_use]
    pub fn queues(&self) -> &ChannelQueueManager {
        &self.manager
    }

    /// Mutable view of the owned queues, for seeding inputs and draining
    /// outputs between ticks.
    pub fn queues_mut(&mut self) -> &mut ChannelQueueManager {
        &mut self.manager
    }

    /// The bound compiled proc.
    #[must_use]
    pub fn compiled(&self) -> &P {
        &self.proc
    }

    /// Executes one tick and returns the next recurrent state.
    ///
    /// `state` is validated against the proc's declared signature before any
    /// queue is touched; the input is never mutated — the next state is a
    /// fresh snapshot whose ownership passes to the caller. `ctx` is borrowed
    /// for this call only and handed through to every hook invocation.
    ///
    /// # Errors
    /// [`RuntimeError::StateArity`] / [`RuntimeError::StateType`] on shape
    /// mismatch; hook, queue, and proc failures propagate unchanged, and no
    /// partial state is returned.
    pub fn run(
        &mut self,
        state: &[Value],
        mut ctx: TickContext<'_>,
    ) -> Result<Vec<Value>, RuntimeError> {
        validate_state(self.proc.state_type(), state)?;
        tracing::debug!(proc = self.proc.name(), "tick start");
        let mut io = TickIo::new(&mut self.manager, &mut self.hooks, &mut ctx);
        let next = self.proc.tick(state, &mut io)?;
        tracing::debug!(proc = self.proc.name(), "tick complete");
        Ok(next)
    }
}

fn validate_state(signature: &[ValueType], state: &[Value]) -> Result<(), RuntimeError> {
    if signature.len() != state.len() {
        return Err(RuntimeError::StateArity {
            expected: signature.len(),
            got: state.len(),
        });
    }
    for (index, (ty, value)) in signature.iter().zip(state).enumerate() {
        if !value.conforms_to(ty) {
            return Err(RuntimeError::StateType {
                index,
                expected: ty.clone(),
                got: value.type_of(),
            });
        }
    }
    Ok(())
}

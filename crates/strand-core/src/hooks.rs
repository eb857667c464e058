// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host I/O hooks and the opaque per-tick context.
//!
//! A compiled proc never touches queues directly: every channel operation
//! site calls back into the host through [`ChannelHooks`], passing the bound
//! queue, the graph node id of the site, the payload buffer, and the opaque
//! context the caller handed to `run`. Hooks may observe or mutate state
//! reachable through the context (counters, external I/O adapters); the
//! runtime guarantees only their invocation order.

use std::any::Any;

use thiserror::Error;

use crate::graph::NodeId;
use crate::queue::{ChannelQueue, QueueError};

/// Errors raised by host hooks.
///
/// Queue failures pass through unchanged; [`HookError::Host`] carries a
/// host-side failure (e.g. the external I/O backing a channel is
/// unavailable). Either aborts the in-progress tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HookError {
    /// The underlying queue operation failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// The host itself failed.
    #[error("hook failure: {0}")]
    Host(String),
}

impl HookError {
    /// Builds a host-raised failure from a message.
    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }
}

/// Caller-owned opaque data threaded through one tick.
///
/// The runtime neither inspects nor retains it; it exists solely so hooks can
/// reach caller state without the runtime knowing its type. Borrowed for the
/// duration of a single `run` call.
#[derive(Default)]
pub struct TickContext<'a> {
    inner: Option<&'a mut dyn Any>,
}

impl<'a> TickContext<'a> {
    /// An absent context (the `context = null` default).
    #[must_use]
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// Wraps a caller-owned value for the duration of one tick.
    #[must_use]
    pub fn new<T: Any>(value: &'a mut T) -> Self {
        Self { inner: Some(value) }
    }

    /// True when a context value is present.
    #[must_use]
    pub fn is_some(&self) -> bool {
        self.inner.is_some()
    }

    /// Recovers the typed context, if present and of type `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner
            .as_deref_mut()
            .and_then(|any| any.downcast_mut::<T>())
    }
}

impl core::fmt::Debug for TickContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickContext")
            .field("present", &self.inner.is_some())
            .finish()
    }
}

/// Capability interface for channel I/O during a tick.
///
/// The runtime calls `on_receive`/`on_send` once per *fired* channel
/// operation, in graph evaluation order. A predicate-false site produces no
/// call at all. Implementations normally delegate to the queue after any
/// host-side bookkeeping; [`QueuePassthrough`] is the no-bookkeeping default.
pub trait ChannelHooks {
    /// Fills `buf` with the next payload of `queue`, consuming it per the
    /// channel kind. `node` identifies the receive site for diagnostics.
    ///
    /// # Errors
    /// Any [`HookError`] aborts the tick and propagates to the `run` caller.
    fn on_receive(
        &mut self,
        queue: &mut ChannelQueue,
        node: NodeId,
        buf: &mut [u8],
        ctx: &mut TickContext<'_>,
    ) -> Result<(), HookError>;

    /// Delivers `buf` onto `queue`. `node` identifies the send site.
    ///
    /// # Errors
    /// Any [`HookError`] aborts the tick and propagates to the `run` caller.
    fn on_send(
        &mut self,
        queue: &mut ChannelQueue,
        node: NodeId,
        buf: &[u8],
        ctx: &mut TickContext<'_>,
    ) -> Result<(), HookError>;
}

/// Hooks that forward straight to the queue with no host-side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueuePassthrough;

impl ChannelHooks for QueuePassthrough {
    fn on_receive(
        &mut self,
        queue: &mut ChannelQueue,
        _node: NodeId,
        buf: &mut [u8],
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), HookError> {
        queue.recv(buf)?;
        Ok(())
    }

    fn on_send(
        &mut self,
        queue: &mut ChannelQueue,
        _node: NodeId,
        buf: &[u8],
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), HookError> {
        queue.send(buf)?;
        Ok(())
    }
}

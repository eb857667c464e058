// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Predicated channel operation dispatch.
//!
//! [`TickIo`] is the window a compiled proc gets onto the outside world for
//! the duration of one tick: queue manager, host hooks, and opaque context,
//! bundled behind two operations. The predicate semantics live here and only
//! here:
//!
//! - a receive whose predicate is false yields the all-zero payload at the
//!   channel's width, and neither the hook nor the queue is touched;
//! - a send whose predicate is false is fully suppressed — sends yield no
//!   payload, so there is nothing to synthesize.
//!
//! An unconditional operation behaves as predicate-true. Operations on
//! channel ids the manager does not know indicate a defective compiled proc
//! and fail the tick with [`RuntimeError::UnknownChannel`].

use bytes::Bytes;

use crate::channel::ChannelId;
use crate::graph::NodeId;
use crate::hooks::{ChannelHooks, TickContext};
use crate::manager::ChannelQueueManager;
use crate::runtime::RuntimeError;

/// Per-tick I/O capability handed to [`crate::CompiledProc::tick`].
///
/// Borrows the runtime's queue manager and hooks plus the caller's context
/// for exactly one tick; nothing is retained afterwards.
pub struct TickIo<'rt, 'ctx> {
    manager: &'rt mut ChannelQueueManager,
    hooks: &'rt mut dyn ChannelHooks,
    ctx: &'rt mut TickContext<'ctx>,
}

impl<'rt, 'ctx> TickIo<'rt, 'ctx> {
    pub(crate) fn new(
        manager: &'rt mut ChannelQueueManager,
        hooks: &'rt mut dyn ChannelHooks,
        ctx: &'rt mut TickContext<'ctx>,
    ) -> Self {
        Self {
            manager,
            hooks,
            ctx,
        }
    }

    /// Performs a (possibly predicated) receive at graph node `node`.
    ///
    /// Returns the payload bytes: the queue's next payload when the
    /// operation fires, the all-zero payload at the channel width when the
    /// predicate is false.
    ///
    /// # Errors
    /// [`RuntimeError::UnknownChannel`] for an undeclared id; hook and queue
    /// failures propagate as [`RuntimeError::Hook`].
    pub fn receive(
        &mut self,
        channel: ChannelId,
        node: NodeId,
        predicate: Option<bool>,
    ) -> Result<Bytes, RuntimeError> {
        let queue = self
            .manager
            .queue_mut(channel)
            .map_err(|_| RuntimeError::UnknownChannel(channel))?;
        let width = queue.channel().byte_width();
        if predicate == Some(false) {
            tracing::trace!(%channel, %node, "receive suppressed, zero payload synthesized");
            return Ok(Bytes::from(vec![0u8; width]));
        }
        let mut buf = vec![0u8; width];
        self.hooks.on_receive(queue, node, &mut buf, self.ctx)?;
        tracing::trace!(%channel, %node, payload = %hex::encode(&buf), "receive fired");
        Ok(Bytes::from(buf))
    }

    /// Performs a (possibly predicated) send at graph node `node`.
    ///
    /// # Errors
    /// [`RuntimeError::UnknownChannel`] for an undeclared id; hook and queue
    /// failures (including payload width mismatch) propagate as
    /// [`RuntimeError::Hook`].
    pub fn send(
        &mut self,
        channel: ChannelId,
        node: NodeId,
        payload: &[u8],
        predicate: Option<bool>,
    ) -> Result<(), RuntimeError> {
        let queue = self
            .manager
            .queue_mut(channel)
            .map_err(|_| RuntimeError::UnknownChannel(channel))?;
        if predicate == Some(false) {
            tracing::trace!(%channel, %node, "send suppressed");
            return Ok(());
        }
        self.hooks.on_send(queue, node, payload, self.ctx)?;
        tracing::trace!(%channel, %node, payload = %hex::encode(payload), "send fired");
        Ok(())
    }
}

impl core::fmt::Debug for TickIo<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickIo")
            .field("context_present", &self.ctx.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, ChannelDirection};
    use crate::hooks::{HookError, QueuePassthrough};
    use crate::network::NetworkDescriptor;
    use crate::queue::ChannelQueue;

    const CH: ChannelId = ChannelId::from_raw(0);
    const SITE: NodeId = NodeId::from_raw(9);

    fn manager() -> ChannelQueueManager {
        let net = NetworkDescriptor::new(
            vec![Channel::streaming(CH, "c", ChannelDirection::Both, 32)],
            vec![],
        );
        ChannelQueueManager::new(&net).unwrap()
    }

    /// Hooks that record every invocation, for proving non-invocation.
    #[derive(Default)]
    struct Recording {
        receives: Vec<NodeId>,
        sends: Vec<NodeId>,
    }

    impl ChannelHooks for Recording {
        fn on_receive(
            &mut self,
            queue: &mut ChannelQueue,
            node: NodeId,
            buf: &mut [u8],
            _ctx: &mut TickContext<'_>,
        ) -> Result<(), HookError> {
            self.receives.push(node);
            queue.recv(buf)?;
            Ok(())
        }

        fn on_send(
            &mut self,
            queue: &mut ChannelQueue,
            node: NodeId,
            buf: &[u8],
            _ctx: &mut TickContext<'_>,
        ) -> Result<(), HookError> {
            self.sends.push(node);
            queue.send(buf)?;
            Ok(())
        }
    }

    #[test]
    fn false_receive_synthesizes_zeros_without_hook_or_queue_effect() {
        let mut mgr = manager();
        mgr.queue_mut(CH).unwrap().send(&7u32.to_le_bytes()).unwrap();

        let mut hooks = Recording::default();
        let mut ctx = TickContext::none();
        let mut io = TickIo::new(&mut mgr, &mut hooks, &mut ctx);
        let payload = io.receive(CH, SITE, Some(false)).unwrap();

        assert_eq!(payload.as_ref(), &[0u8; 4]);
        assert!(hooks.receives.is_empty(), "hook must not fire");
        assert_eq!(mgr.queue(CH).unwrap().len(), 1, "entry must not be consumed");
    }

    #[test]
    fn false_send_is_fully_suppressed() {
        let mut mgr = manager();
        let mut hooks = Recording::default();
        let mut ctx = TickContext::none();
        let mut io = TickIo::new(&mut mgr, &mut hooks, &mut ctx);
        io.send(CH, SITE, &21u32.to_le_bytes(), Some(false)).unwrap();

        assert!(hooks.sends.is_empty());
        assert!(mgr.queue(CH).unwrap().is_empty());
    }

    #[test]
    fn unconditional_and_true_predicates_behave_identically() {
        let mut mgr = manager();
        let mut hooks = Recording::default();
        let mut ctx = TickContext::none();
        let mut io = TickIo::new(&mut mgr, &mut hooks, &mut ctx);
        io.send(CH, SITE, &1u32.to_le_bytes(), None).unwrap();
        io.send(CH, SITE, &2u32.to_le_bytes(), Some(true)).unwrap();

        assert_eq!(hooks.sends.len(), 2);
        assert_eq!(mgr.queue(CH).unwrap().len(), 2);
    }

    #[test]
    fn unknown_channel_is_a_compiled_proc_defect() {
        let mut mgr = manager();
        let mut hooks = QueuePassthrough;
        let mut ctx = TickContext::none();
        let mut io = TickIo::new(&mut mgr, &mut hooks, &mut ctx);
        let bogus = ChannelId::from_raw(99);
        assert_eq!(
            io.receive(bogus, SITE, None).err(),
            Some(RuntimeError::UnknownChannel(bogus))
        );
    }
}

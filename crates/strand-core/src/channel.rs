// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable channel descriptors.
//!
//! A channel is declared once when a proc network is constructed and never
//! mutated afterwards. Queues, hook dispatch, and the tick driver all consult
//! the descriptor for identity and payload width; the descriptor itself
//! carries no storage.

/// Strongly typed identifier for a channel within one proc network.
///
/// Ids are assigned by the network author and must be unique per network;
/// [`crate::ChannelQueueManager::new`] rejects duplicates. The wrapper exists
/// so channel ids cannot be mixed up with graph node ids.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Constructs a `ChannelId` from a raw `u64` value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence policy of a channel's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// FIFO of payloads: sends append, receives consume the head.
    Streaming,
    /// Register holding at most one payload: sends overwrite, receives read
    /// the retained value without consuming it.
    SingleValue,
}

/// Which sides of the network boundary may operate on the channel.
///
/// Direction is declarative metadata for network construction and tooling;
/// the queue model itself does not gate operations on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirection {
    /// Procs in this network only receive from the channel.
    ReceiveOnly,
    /// Procs in this network only send on the channel.
    SendOnly,
    /// Both operations appear inside the network.
    Both,
}

/// Flow-control protocol of a streaming channel.
///
/// Only [`FlowControl::None`] is exercised by this core: the caller or an
/// external scheduler guarantees data availability before invoking a tick,
/// and a receive on an empty queue is a contract violation rather than a
/// suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    /// No backpressure protocol; availability is the caller's obligation.
    #[default]
    None,
}

/// Immutable descriptor for one channel of a proc network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Unique id within the owning network.
    pub id: ChannelId,
    /// Diagnostic name; not part of channel identity.
    pub name: String,
    /// Persistence policy of the backing queue.
    pub kind: ChannelKind,
    /// Declared operation directions.
    pub direction: ChannelDirection,
    /// Payload width in bits. Every payload crossing the hook boundary for
    /// this channel occupies exactly [`Channel::byte_width`] bytes.
    pub bit_width: u32,
    /// Flow-control mode (only `None` is modeled).
    pub flow_control: FlowControl,
}

impl Channel {
    /// Builds a streaming channel with `flow_control = None`.
    #[must_use]
    pub fn streaming(
        id: ChannelId,
        name: impl Into<String>,
        direction: ChannelDirection,
        bit_width: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ChannelKind::Streaming,
            direction,
            bit_width,
            flow_control: FlowControl::None,
        }
    }

    /// Builds a single-value (register) channel.
    #[must_use]
    pub fn single_value(
        id: ChannelId,
        name: impl Into<String>,
        direction: ChannelDirection,
        bit_width: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: ChannelKind::SingleValue,
            direction,
            bit_width,
            flow_control: FlowControl::None,
        }
    }

    /// Payload width rounded up to whole bytes.
    ///
    /// This is the exact length every `send` payload and `recv` buffer for
    /// this channel must have.
    #[must_use]
    pub const fn byte_width(&self) -> usize {
        self.bit_width.div_ceil(8) as usize
    }
}

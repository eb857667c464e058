// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-channel payload storage.
//!
//! Each queue is bound to exactly one channel descriptor and implements that
//! channel's persistence policy: streaming channels are FIFOs, single-value
//! channels are registers that retain the last payload until overwritten.
//! All side effects are confined to the queue's own storage, and a failed
//! operation leaves it unmodified.

use std::collections::VecDeque;

use bytes::Bytes;
use thiserror::Error;

use crate::channel::{Channel, ChannelId, ChannelKind};

/// Errors produced by queue operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// A payload or receive buffer did not match the channel's byte width.
    #[error("channel {channel}: payload width mismatch: expected {expected} bytes, got {got}")]
    WidthMismatch {
        /// Channel whose width was violated.
        channel: ChannelId,
        /// The channel's declared byte width.
        expected: usize,
        /// The offending length.
        got: usize,
    },
    /// Receive on an empty streaming queue, or on a single-value queue that
    /// was never seeded. The data-availability contract was not upheld by
    /// the caller or scheduler.
    #[error("channel {channel}: receive with no data available")]
    Empty {
        /// The starved channel.
        channel: ChannelId,
    },
}

#[derive(Debug, Clone)]
enum Storage {
    Streaming(VecDeque<Bytes>),
    SingleValue(Option<Bytes>),
}

/// Mutable payload storage bound to one channel.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    channel: Channel,
    storage: Storage,
}

impl ChannelQueue {
    /// Creates an empty queue for the given channel descriptor.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        let storage = match channel.kind {
            ChannelKind::Streaming => Storage::Streaming(VecDeque::new()),
            ChannelKind::SingleValue => Storage::SingleValue(None),
        };
        Self { channel, storage }
    }

    /// The descriptor of the bound channel.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Enqueues (streaming) or overwrites (single-value) a payload.
    ///
    /// # Errors
    /// Returns [`QueueError::WidthMismatch`] if `payload` is not exactly the
    /// channel's byte width; the queue is left unmodified.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), QueueError> {
        self.check_width(payload.len())?;
        let payload = Bytes::copy_from_slice(payload);
        match &mut self.storage {
            Storage::Streaming(fifo) => fifo.push_back(payload),
            Storage::SingleValue(slot) => *slot = Some(payload),
        }
        Ok(())
    }

    /// Copies the head (streaming, consuming it) or the retained value
    /// (single-value, without consuming it) into `out`.
    ///
    /// # Errors
    /// Returns [`QueueError::WidthMismatch`] if `out` is not exactly the
    /// channel's byte width, or [`QueueError::Empty`] if no payload is
    /// available. Neither failure mutates the queue.
    pub fn recv(&mut self, out: &mut [u8]) -> Result<(), QueueError> {
        self.check_width(out.len())?;
        let channel = self.channel.id;
        match &mut self.storage {
            Storage::Streaming(fifo) => {
                let head = fifo.pop_front().ok_or(QueueError::Empty { channel })?;
                out.copy_from_slice(&head);
            }
            Storage::SingleValue(slot) => {
                let held = slot.as_ref().ok_or(QueueError::Empty { channel })?;
                out.copy_from_slice(held);
            }
        }
        Ok(())
    }

    /// True when a receive would fail with [`QueueError::Empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.storage {
            Storage::Streaming(fifo) => fifo.is_empty(),
            Storage::SingleValue(slot) => slot.is_none(),
        }
    }

    /// Number of receivable payloads: queue depth for streaming, `0` or `1`
    /// for single-value.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Streaming(fifo) => fifo.len(),
            Storage::SingleValue(slot) => usize::from(slot.is_some()),
        }
    }

    fn check_width(&self, got: usize) -> Result<(), QueueError> {
        let expected = self.channel.byte_width();
        if got == expected {
            Ok(())
        } else {
            Err(QueueError::WidthMismatch {
                channel: self.channel.id,
                expected,
                got,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelDirection;

    fn streaming(width: u32) -> ChannelQueue {
        ChannelQueue::new(Channel::streaming(
            ChannelId::from_raw(0),
            "s",
            ChannelDirection::Both,
            width,
        ))
    }

    fn single_value(width: u32) -> ChannelQueue {
        ChannelQueue::new(Channel::single_value(
            ChannelId::from_raw(1),
            "sv",
            ChannelDirection::Both,
            width,
        ))
    }

    #[test]
    fn streaming_is_fifo() {
        let mut q = streaming(32);
        q.send(&7u32.to_le_bytes()).unwrap();
        q.send(&9u32.to_le_bytes()).unwrap();
        assert_eq!(q.len(), 2);

        let mut out = [0u8; 4];
        q.recv(&mut out).unwrap();
        assert_eq!(u32::from_le_bytes(out), 7);
        q.recv(&mut out).unwrap();
        assert_eq!(u32::from_le_bytes(out), 9);
        assert!(q.is_empty());
    }

    #[test]
    fn streaming_recv_on_empty_is_a_contract_violation() {
        let mut q = streaming(32);
        let mut out = [0u8; 4];
        assert_eq!(
            q.recv(&mut out),
            Err(QueueError::Empty {
                channel: ChannelId::from_raw(0)
            })
        );
    }

    #[test]
    fn single_value_reads_do_not_consume() {
        let mut q = single_value(32);
        q.send(&7u32.to_le_bytes()).unwrap();

        let mut out = [0u8; 4];
        for _ in 0..3 {
            q.recv(&mut out).unwrap();
            assert_eq!(u32::from_le_bytes(out), 7);
        }
        assert_eq!(q.len(), 1);

        q.send(&10u32.to_le_bytes()).unwrap();
        q.recv(&mut out).unwrap();
        assert_eq!(u32::from_le_bytes(out), 10);
    }

    #[test]
    fn single_value_recv_before_seed_fails() {
        let mut q = single_value(8);
        let mut out = [0u8; 1];
        assert_eq!(
            q.recv(&mut out),
            Err(QueueError::Empty {
                channel: ChannelId::from_raw(1)
            })
        );
    }

    #[test]
    fn width_mismatch_leaves_queue_untouched() {
        let mut q = streaming(32);
        assert_eq!(
            q.send(&[0u8; 3]),
            Err(QueueError::WidthMismatch {
                channel: ChannelId::from_raw(0),
                expected: 4,
                got: 3
            })
        );
        assert!(q.is_empty());

        q.send(&7u32.to_le_bytes()).unwrap();
        let mut short = [0u8; 2];
        assert!(matches!(
            q.recv(&mut short),
            Err(QueueError::WidthMismatch { .. })
        ));
        assert_eq!(q.len(), 1, "failed recv must not consume");
    }
}

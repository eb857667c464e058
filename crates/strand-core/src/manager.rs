// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Queue ownership and lookup for one proc network.

use rustc_hash::FxHashMap;

use crate::channel::ChannelId;
use crate::network::{NetworkDescriptor, NetworkError};
use crate::queue::ChannelQueue;

/// Owns one [`ChannelQueue`] per declared channel of a network.
///
/// The manager is pure bookkeeping plus ownership: it performs no I/O of its
/// own, and it is an explicit per-network instance, never a global. Its
/// lifetime spans the network's lifetime, so queue contents persist across
/// ticks until the manager is dropped.
#[derive(Debug)]
pub struct ChannelQueueManager {
    queues: FxHashMap<ChannelId, ChannelQueue>,
    // Ascending id order for deterministic iteration.
    ids: Vec<ChannelId>,
}

impl ChannelQueueManager {
    /// Builds one empty queue per channel declared in `network`.
    ///
    /// # Errors
    /// Returns [`NetworkError::DuplicateChannelId`] if two channels share an
    /// id, or [`NetworkError::ZeroWidthChannel`] for a malformed descriptor.
    pub fn new(network: &NetworkDescriptor) -> Result<Self, NetworkError> {
        let mut queues = FxHashMap::default();
        let mut ids = Vec::with_capacity(network.channels.len());
        for channel in &network.channels {
            if channel.bit_width == 0 {
                return Err(NetworkError::ZeroWidthChannel(channel.id));
            }
            if queues.contains_key(&channel.id) {
                return Err(NetworkError::DuplicateChannelId(channel.id));
            }
            ids.push(channel.id);
            queues.insert(channel.id, ChannelQueue::new(channel.clone()));
        }
        ids.sort_unstable();
        tracing::debug!(channels = ids.len(), "channel queue manager created");
        Ok(Self { queues, ids })
    }

    /// Looks up the queue for a channel id.
    ///
    /// # Errors
    /// Returns [`NetworkError::UnknownChannel`] when the id is not declared.
    pub fn queue(&self, id: ChannelId) -> Result<&ChannelQueue, NetworkError> {
        self.queues.get(&id).ok_or(NetworkError::UnknownChannel(id))
    }

    /// Mutable variant of [`ChannelQueueManager::queue`].
    ///
    /// # Errors
    /// Returns [`NetworkError::UnknownChannel`] when the id is not declared.
    pub fn queue_mut(&mut self, id: ChannelId) -> Result<&mut ChannelQueue, NetworkError> {
        self.queues
            .get_mut(&id)
            .ok_or(NetworkError::UnknownChannel(id))
    }

    /// True when the id is declared.
    #[must_use]
    pub fn contains(&self, id: ChannelId) -> bool {
        self.queues.contains_key(&id)
    }

    /// Declared channel ids in ascending order.
    pub fn channel_ids(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, ChannelDirection};

    fn chan(id: u64, width: u32) -> Channel {
        Channel::streaming(
            ChannelId::from_raw(id),
            format!("ch{id}"),
            ChannelDirection::Both,
            width,
        )
    }

    #[test]
    fn builds_one_queue_per_channel() {
        let net = NetworkDescriptor::new(vec![chan(3, 32), chan(1, 8)], vec![]);
        let mgr = ChannelQueueManager::new(&net).unwrap();
        assert!(mgr.contains(ChannelId::from_raw(1)));
        assert!(mgr.contains(ChannelId::from_raw(3)));
        let ids: Vec<u64> = mgr.channel_ids().map(ChannelId::value).collect();
        assert_eq!(ids, vec![1, 3], "iteration must be ascending by id");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let net = NetworkDescriptor::new(vec![chan(0, 32), chan(0, 8)], vec![]);
        assert_eq!(
            ChannelQueueManager::new(&net).err(),
            Some(NetworkError::DuplicateChannelId(ChannelId::from_raw(0)))
        );
    }

    #[test]
    fn zero_width_channels_are_rejected() {
        let net = NetworkDescriptor::new(vec![chan(5, 0)], vec![]);
        assert_eq!(
            ChannelQueueManager::new(&net).err(),
            Some(NetworkError::ZeroWidthChannel(ChannelId::from_raw(5)))
        );
    }

    #[test]
    fn unknown_lookup_names_the_id() {
        let net = NetworkDescriptor::new(vec![chan(0, 32)], vec![]);
        let mut mgr = ChannelQueueManager::new(&net).unwrap();
        assert_eq!(
            mgr.queue(ChannelId::from_raw(7)).err(),
            Some(NetworkError::UnknownChannel(ChannelId::from_raw(7)))
        );
        assert!(mgr.queue_mut(ChannelId::from_raw(0)).is_ok());
    }
}

// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory network descriptors.
//!
//! A network descriptor is the consumed boundary artifact of this core: the
//! channel declarations plus the proc declarations (state signature and body
//! graph). Parsing a textual or binary encoding into this form is a front-end
//! concern and lives outside the crate.

use thiserror::Error;

use crate::channel::{Channel, ChannelId};
use crate::graph::ProcGraph;
use crate::value::ValueType;

/// Errors produced while validating a network descriptor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// Two channels were declared with the same id.
    #[error("duplicate channel id: {0}")]
    DuplicateChannelId(ChannelId),
    /// A channel was declared with a zero payload width.
    #[error("channel {0} declares a zero payload width")]
    ZeroWidthChannel(ChannelId),
    /// A proc graph (or lookup) referenced a channel id the network does not
    /// declare.
    #[error("unknown channel id: {0}")]
    UnknownChannel(ChannelId),
    /// A lookup referenced a proc name the network does not declare.
    #[error("unknown proc: {0}")]
    UnknownProc(String),
}

/// Declaration of one proc: its recurrent state signature and body.
#[derive(Debug, Clone)]
pub struct ProcDescriptor {
    /// Proc name, unique within the network.
    pub name: String,
    /// Ordered state signature; `run` validates supplied state against it.
    pub state_type: Vec<ValueType>,
    /// The body dataflow graph.
    pub graph: ProcGraph,
}

impl ProcDescriptor {
    /// Builds a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, state_type: Vec<ValueType>, graph: ProcGraph) -> Self {
        Self {
            name: name.into(),
            state_type,
            graph,
        }
    }
}

/// A full network: channel declarations plus proc declarations.
#[derive(Debug, Clone, Default)]
pub struct NetworkDescriptor {
    /// Declared channels.
    pub channels: Vec<Channel>,
    /// Declared procs.
    pub procs: Vec<ProcDescriptor>,
}

impl NetworkDescriptor {
    /// Builds a descriptor from parts.
    #[must_use]
    pub fn new(channels: Vec<Channel>, procs: Vec<ProcDescriptor>) -> Self {
        Self { channels, procs }
    }

    /// Looks up a channel declaration by id.
    ///
    /// # Errors
    /// Returns [`NetworkError::UnknownChannel`] when the id is not declared.
    pub fn channel(&self, id: ChannelId) -> Result<&Channel, NetworkError> {
        self.channels
            .iter()
            .find(|c| c.id == id)
            .ok_or(NetworkError::UnknownChannel(id))
    }

    /// Looks up a proc declaration by name.
    ///
    /// # Errors
    /// Returns [`NetworkError::UnknownProc`] when no proc has that name.
    pub fn proc_named(&self, name: &str) -> Result<&ProcDescriptor, NetworkError> {
        self.procs
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| NetworkError::UnknownProc(name.to_owned()))
    }
}

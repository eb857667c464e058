// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dataflow graphs for proc bodies.
//!
//! A proc body is a flat sequence of nodes in evaluation order. The graph is
//! built append-only and node references may only point backwards, so node
//! index order is a topological order by construction. Hook invocation order
//! during a tick is exactly this order, which gives the runtime its ordering
//! guarantee without a separate scheduling pass.
//!
//! The node set is intentionally small: enough to express receive/compute/
//! send procs with predicated channel operations. Code generation for a
//! richer operation set is an external concern.

use crate::channel::ChannelId;
use crate::value::{Value, ValueType};

/// Index of a node within one [`ProcGraph`].
///
/// Doubles as the diagnostic identifier passed to host hooks at channel
/// operation sites.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Constructs a `NodeId` from a raw index.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the index as a `usize` for slice access.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unary bit-vector operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Bitwise complement within the operand's width.
    Not,
    /// Two's-complement negation within the operand's width.
    Neg,
}

/// Binary bit-vector operations. Operands must share a width; results wrap
/// at that width (hardware semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Wrapping multiplication.
    Mul,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise xor.
    Xor,
}

/// One node of a proc's dataflow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A constant value.
    Literal(Value),
    /// The n-th element of the proc's recurrent state for this tick.
    StateParam(usize),
    /// A channel receive site. With a predicate, the channel only fires when
    /// the predicate evaluates to one; otherwise the node yields the
    /// all-zero value of `ty` and the channel is untouched.
    Receive {
        /// Channel to receive from.
        channel: ChannelId,
        /// Declared payload type; its encoded width must match the channel.
        ty: ValueType,
        /// Optional `bits[1]` gate computed earlier in the graph.
        predicate: Option<NodeId>,
    },
    /// A channel send site. With a false predicate the send is fully
    /// suppressed. Yields no value; sends produce only a control token.
    Send {
        /// Channel to send on.
        channel: ChannelId,
        /// Node whose value is the payload.
        data: NodeId,
        /// Optional `bits[1]` gate computed earlier in the graph.
        predicate: Option<NodeId>,
    },
    /// A unary operation on a bits operand.
    Unary {
        /// The operation.
        op: UnaryOp,
        /// Operand node.
        arg: NodeId,
    },
    /// A binary operation on same-width bits operands.
    Binary {
        /// The operation.
        op: BinaryOp,
        /// Left operand node.
        lhs: NodeId,
        /// Right operand node.
        rhs: NodeId,
    },
    /// Projects one element out of a tuple-valued node.
    TupleIndex {
        /// Tuple-valued operand node.
        tuple: NodeId,
        /// Element index.
        index: usize,
    },
    /// Assembles a tuple from earlier nodes.
    Tuple(Vec<NodeId>),
}

/// A proc body: nodes in evaluation order plus the next-state selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcGraph {
    nodes: Vec<Node>,
    next_state: Vec<NodeId>,
}

impl ProcGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its id. References inside `node` must
    /// point at already-pushed nodes; the interpreter rejects forward
    /// references at evaluation time.
    ///
    /// # Panics
    /// In debug builds, panics if the graph would exceed `u32::MAX` nodes.
    pub fn push(&mut self, node: Node) -> NodeId {
        debug_assert!(
            self.nodes.len() < u32::MAX as usize,
            "graph node count exceeds u32 ids"
        );
        let id = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.nodes.push(node);
        NodeId::from_raw(id)
    }

    /// Appends a literal node.
    pub fn literal(&mut self, value: Value) -> NodeId {
        self.push(Node::Literal(value))
    }

    /// Appends a state-parameter node.
    pub fn state_param(&mut self, index: usize) -> NodeId {
        self.push(Node::StateParam(index))
    }

    /// Appends an unconditional receive.
    pub fn receive(&mut self, channel: ChannelId, ty: ValueType) -> NodeId {
        self.push(Node::Receive {
            channel,
            ty,
            predicate: None,
        })
    }

    /// Appends a predicated receive.
    pub fn receive_if(&mut self, channel: ChannelId, ty: ValueType, predicate: NodeId) -> NodeId {
        self.push(Node::Receive {
            channel,
            ty,
            predicate: Some(predicate),
        })
    }

    /// Appends an unconditional send.
    pub fn send(&mut self, channel: ChannelId, data: NodeId) -> NodeId {
        self.push(Node::Send {
            channel,
            data,
            predicate: None,
        })
    }

    /// Appends a predicated send.
    pub fn send_if(&mut self, channel: ChannelId, data: NodeId, predicate: NodeId) -> NodeId {
        self.push(Node::Send {
            channel,
            data,
            predicate: Some(predicate),
        })
    }

    /// Appends a binary operation node.
    pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(Node::Binary { op, lhs, rhs })
    }

    /// Appends a unary operation node.
    pub fn unary(&mut self, op: UnaryOp, arg: NodeId) -> NodeId {
        self.push(Node::Unary { op, arg })
    }

    /// Appends a tuple-index node.
    pub fn tuple_index(&mut self, tuple: NodeId, index: usize) -> NodeId {
        self.push(Node::TupleIndex { tuple, index })
    }

    /// Selects the nodes whose values form the next recurrent state.
    pub fn set_next_state(&mut self, nodes: Vec<NodeId>) {
        self.next_state = nodes;
    }

    /// All nodes in evaluation order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// The next-state selection, in state-slot order.
    #[must_use]
    pub fn next_state(&self) -> &[NodeId] {
        &self.next_state
    }

    /// Every channel id referenced by a receive or send site, ascending and
    /// deduplicated. Used to validate the graph against a queue manager at
    /// construction time.
    #[must_use]
    pub fn referenced_channels(&self) -> Vec<ChannelId> {
        let mut ids: Vec<ChannelId> = self
            .nodes
            .iter()
            .filter_map(|node| match node {
                Node::Receive { channel, .. } | Node::Send { channel, .. } => Some(*channel),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_sequential_ids() {
        let mut g = ProcGraph::new();
        let a = g.literal(Value::bits(8, 1).unwrap());
        let b = g.literal(Value::bits(8, 2).unwrap());
        assert_eq!(a.value(), 0);
        assert_eq!(b.value(), 1);
        assert_eq!(g.nodes().len(), 2);
    }

    #[test]
    fn referenced_channels_are_sorted_and_deduped() {
        let mut g = ProcGraph::new();
        let ch2 = ChannelId::from_raw(2);
        let ch0 = ChannelId::from_raw(0);
        let v = g.receive(ch2, ValueType::bits(8));
        g.send(ch0, v);
        g.send(ch2, v);
        assert_eq!(g.referenced_channels(), vec![ch0, ch2]);
    }
}

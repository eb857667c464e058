// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph interpreter backing [`CompiledProc`].
//!
//! `GraphProc` executes a [`ProcGraph`] node by node in index order, which is
//! evaluation order by construction. A native code generator would lower the
//! same graph to machine code behind the same trait; the channel semantics
//! are identical either way because every receive/send goes through the
//! [`TickIo`] dispatch layer.

use crate::channel::ChannelId;
use crate::dispatch::TickIo;
use crate::graph::{BinaryOp, Node, NodeId, UnaryOp};
use crate::network::ProcDescriptor;
use crate::runtime::{CompiledProc, RuntimeError};
use crate::value::{Value, ValueError, ValueType};

/// A [`CompiledProc`] that interprets the proc's dataflow graph directly.
#[derive(Debug, Clone)]
pub struct GraphProc {
    desc: ProcDescriptor,
}

impl GraphProc {
    /// Wraps a proc descriptor for interpretation.
    #[must_use]
    pub fn new(desc: ProcDescriptor) -> Self {
        Self { desc }
    }

    /// The wrapped descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ProcDescriptor {
        &self.desc
    }
}

impl CompiledProc for GraphProc {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn state_type(&self) -> &[ValueType] {
        &self.desc.state_type
    }

    fn channels(&self) -> Vec<ChannelId> {
        self.desc.graph.referenced_channels()
    }

    fn tick(&self, state: &[Value], io: &mut TickIo<'_, '_>) -> Result<Vec<Value>, RuntimeError> {
        let nodes = self.desc.graph.nodes();
        // Send nodes occupy a slot but yield no value (control token only).
        let mut values: Vec<Option<Value>> = vec![None; nodes.len()];

        for (index, node) in nodes.iter().enumerate() {
            // Indices fit in u32: ProcGraph::push bounds the node count.
            debug_assert!(index < u32::MAX as usize, "graph node index exceeds u32 ids");
            let id = NodeId::from_raw(u32::try_from(index).unwrap_or(u32::MAX));
            let value = match node {
                Node::Literal(value) => Some(value.clone()),
                Node::StateParam(slot) => Some(
                    state
                        .get(*slot)
                        .cloned()
                        .ok_or_else(|| malformed(format!("state param {slot} out of range")))?,
                ),
                Node::Receive {
                    channel,
                    ty,
                    predicate,
                } => {
                    let fired = eval_predicate(&values, index, *predicate)?;
                    let bytes = io.receive(*channel, id, fired)?;
                    Some(Value::from_bytes(ty, &bytes)?)
                }
                Node::Send {
                    channel,
                    data,
                    predicate,
                } => {
                    let payload = operand(&values, index, *data)?.to_bytes();
                    let fired = eval_predicate(&values, index, *predicate)?;
                    io.send(*channel, id, &payload, fired)?;
                    None
                }
                Node::Unary { op, arg } => {
                    let (width, bits) = bits_operand(&values, index, *arg)?;
                    Some(apply_unary(*op, width, bits)?)
                }
                Node::Binary { op, lhs, rhs } => {
                    let (lw, lb) = bits_operand(&values, index, *lhs)?;
                    let (rw, rb) = bits_operand(&values, index, *rhs)?;
                    if lw != rw {
                        return Err(malformed(format!(
                            "binary operand width mismatch: bits[{lw}] vs bits[{rw}]"
                        )));
                    }
                    Some(apply_binary(*op, lw, lb, rb)?)
                }
                Node::TupleIndex { tuple, index: i } => {
                    let composite = operand(&values, index, *tuple)?;
                    let Some(fields) = composite.as_tuple() else {
                        return Err(malformed(format!(
                            "tuple_index applied to non-tuple node {tuple}"
                        )));
                    };
                    Some(fields.get(*i).cloned().ok_or_else(|| {
                        malformed(format!("tuple index {i} out of range at node {id}"))
                    })?)
                }
                Node::Tuple(elements) => {
                    let mut fields = Vec::with_capacity(elements.len());
                    for element in elements {
                        fields.push(operand(&values, index, *element)?.clone());
                    }
                    Some(Value::tuple(fields))
                }
            };
            values[index] = value;
        }

        let mut next = Vec::with_capacity(self.desc.graph.next_state().len());
        for id in self.desc.graph.next_state() {
            next.push(operand(&values, nodes.len(), *id)?.clone());
        }
        Ok(next)
    }
}

fn malformed(message: String) -> RuntimeError {
    RuntimeError::MalformedProc(message)
}

/// Resolves a backward node reference to its computed value.
fn operand(values: &[Option<Value>], at: usize, id: NodeId) -> Result<&Value, RuntimeError> {
    if id.index() >= at {
        return Err(malformed(format!("forward reference to node {id}")));
    }
    values
        .get(id.index())
        .and_then(Option::as_ref)
        .ok_or_else(|| malformed(format!("node {id} yields no value (send sites carry none)")))
}

fn bits_operand(
    values: &[Option<Value>],
    at: usize,
    id: NodeId,
) -> Result<(u32, u64), RuntimeError> {
    operand(values, at, id)?
        .as_bits()
        .ok_or_else(|| malformed(format!("node {id}: expected bits, got tuple")))
}

fn eval_predicate(
    values: &[Option<Value>],
    at: usize,
    predicate: Option<NodeId>,
) -> Result<Option<bool>, RuntimeError> {
    let Some(id) = predicate else {
        return Ok(None);
    };
    let (width, bits) = bits_operand(values, at, id)?;
    if width != 1 {
        return Err(malformed(format!(
            "predicate node {id} must be bits[1], got bits[{width}]"
        )));
    }
    Ok(Some(bits == 1))
}

fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

// Operand widths come from already-constructed values and results are
// masked to width, so the constructor cannot actually fail here; the
// Result keeps the tick path free of panicking escapes.
fn apply_unary(op: UnaryOp, width: u32, bits: u64) -> Result<Value, ValueError> {
    let mask = width_mask(width);
    let bits = match op {
        UnaryOp::Not => !bits & mask,
        UnaryOp::Neg => bits.wrapping_neg() & mask,
    };
    Value::bits(width, bits)
}

fn apply_binary(op: BinaryOp, width: u32, lhs: u64, rhs: u64) -> Result<Value, ValueError> {
    let mask = width_mask(width);
    let bits = match op {
        BinaryOp::Add => lhs.wrapping_add(rhs) & mask,
        BinaryOp::Sub => lhs.wrapping_sub(rhs) & mask,
        BinaryOp::Mul => lhs.wrapping_mul(rhs) & mask,
        BinaryOp::And => lhs & rhs,
        BinaryOp::Or => lhs | rhs,
        BinaryOp::Xor => lhs ^ rhs,
    };
    Value::bits(width, bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, ChannelDirection};
    use crate::hooks::{QueuePassthrough, TickContext};
    use crate::manager::ChannelQueueManager;
    use crate::network::NetworkDescriptor;
    use crate::value::ValueType;

    #[test]
    fn tuple_payloads_cross_the_boundary_in_declared_field_order() {
        let ch_in = ChannelId::from_raw(0);
        let ch_out = ChannelId::from_raw(1);
        let net = NetworkDescriptor::new(
            vec![
                Channel::streaming(ch_in, "pair_in", ChannelDirection::ReceiveOnly, 24),
                Channel::streaming(ch_out, "snd_out", ChannelDirection::SendOnly, 16),
            ],
            vec![],
        );
        let pair_ty = ValueType::Tuple(vec![ValueType::bits(8), ValueType::bits(16)]);

        let mut g = crate::graph::ProcGraph::new();
        let pair = g.receive(ch_in, pair_ty);
        let second = g.tuple_index(pair, 1);
        g.send(ch_out, second);
        let proc = GraphProc::new(ProcDescriptor::new("project_second", vec![], g));

        let mut mgr = ChannelQueueManager::new(&net).unwrap();
        // bits[8] = 0xab, then bits[16] = 0x1234 little-endian.
        mgr.queue_mut(ch_in)
            .unwrap()
            .send(&[0xab, 0x34, 0x12])
            .unwrap();

        let mut hooks = QueuePassthrough;
        let mut ctx = TickContext::none();
        let mut io = TickIo::new(&mut mgr, &mut hooks, &mut ctx);
        let next = proc.tick(&[], &mut io).unwrap();
        assert!(next.is_empty());

        let mut out = [0u8; 2];
        mgr.queue_mut(ch_out).unwrap().recv(&mut out).unwrap();
        assert_eq!(u16::from_le_bytes(out), 0x1234);
    }

    #[test]
    fn binary_ops_wrap_at_the_declared_width() {
        let v = apply_binary(BinaryOp::Add, 8, 0xff, 1).unwrap();
        assert_eq!(v, Value::bits(8, 0).unwrap());
        let v = apply_binary(BinaryOp::Mul, 8, 0x80, 2).unwrap();
        assert_eq!(v, Value::bits(8, 0).unwrap());
        let v = apply_binary(BinaryOp::Add, 64, u64::MAX, 1).unwrap();
        assert_eq!(v, Value::bits(64, 0).unwrap());
    }

    #[test]
    fn unary_not_stays_within_width() {
        let v = apply_unary(UnaryOp::Not, 4, 0b0101).unwrap();
        assert_eq!(v, Value::bits(4, 0b1010).unwrap());
    }

    #[test]
    fn neg_is_twos_complement_at_width() {
        let v = apply_unary(UnaryOp::Neg, 8, 1).unwrap();
        assert_eq!(v, Value::bits(8, 0xff).unwrap());
    }
}

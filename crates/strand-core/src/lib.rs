// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! strand-core: deterministic tick runtime for channel-coupled procs.
//!
//! A proc is a stateful hardware-process description executed one discrete
//! tick at a time. This crate provides the channel/queue model and the
//! per-tick execution contract: typed channel descriptors, per-channel
//! queues with streaming (FIFO) or single-value (register) persistence, a
//! queue manager per network, host-supplied I/O hooks with an opaque
//! context, and the tick driver that threads recurrent state through a
//! compiled proc. Predicated receive sites synthesize all-zero payloads
//! when their predicate is false; predicated send sites are fully
//! suppressed. Everything is single-threaded and synchronous: one tick is
//! one ordinary function call.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::use_self
)]

mod channel;
mod dispatch;
mod graph;
mod hooks;
mod interp;
mod manager;
mod network;
mod queue;
mod runtime;
mod value;

// Re-exports for stable public API
/// Channel descriptors: id, kind, direction, payload width, flow control.
pub use channel::{Channel, ChannelDirection, ChannelId, ChannelKind, FlowControl};
/// Per-tick I/O capability handed to compiled procs.
pub use dispatch::TickIo;
/// Dataflow graph primitives for proc bodies.
pub use graph::{BinaryOp, Node, NodeId, ProcGraph, UnaryOp};
/// Host hook seam and the opaque per-tick context.
pub use hooks::{ChannelHooks, HookError, QueuePassthrough, TickContext};
/// Graph-interpreting compiled-proc implementation.
pub use interp::GraphProc;
/// Queue ownership and id lookup per network.
pub use manager::ChannelQueueManager;
/// Network descriptors consumed at construction time.
pub use network::{NetworkDescriptor, NetworkError, ProcDescriptor};
/// Per-channel payload storage.
pub use queue::{ChannelQueue, QueueError};
/// Tick driver and the compiled-proc contract.
pub use runtime::{CompiledProc, ProcRuntime, RuntimeError};
/// Typed values, state signatures, and the canonical payload encoding.
pub use value::{Value, ValueError, ValueType, MAX_BITS_WIDTH};

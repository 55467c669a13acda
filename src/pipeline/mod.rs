//! Process core of a dataflow pipeline.
//!
//! A pipeline is a graph of processes joined by edges. This module holds
//! everything one process needs to take part in such a graph; building the
//! graph and scheduling steps belong to the caller.
//!
//! # Architecture
//!
//! ```text
//! [reader] ──► [detector] ──► [writer]
//!      │             └──► _heartbeat ──► scheduler
//!      └──► _heartbeat ──► scheduler
//! ```
//!
//! # Design
//!
//! - **Trait at the seam**: concrete processes implement [`ProcessPlugin`];
//!   [`Process`] owns the lifecycle and calls the hooks.
//! - **Edges are a contract**: the core only uses [`Edge`], so any queue
//!   with peek and pop can carry data. [`MemoryEdge`] is the in-memory one.
//! - **Faults are data**: desynchronized or non-ordinary inputs become
//!   status datums on the outputs instead of errors.
//! - **Shared type classes**: flow-dependent ports with the same tag resolve
//!   together through a union-find [`TypeResolver`].

pub mod datum;
pub mod edge;
pub mod error;
pub mod id;
pub mod plugin;
pub mod port;
pub mod process;
pub mod process_core;
pub mod resolver;
pub mod snapshot;
pub mod sync;

pub use datum::{Datum, DatumStatus, EdgeDatum, Payload, Stamp};
pub use edge::{Edge, EdgeRef, MemoryEdge};
pub use error::{ProcessError, ProcessResult};
pub use id::{EdgeId, PortSlot};
pub use plugin::{ProcessPlugin, ProcessProperty, Properties};
pub use port::{
    Frequency, PortDirection, PortFlag, PortFlags, PortInfo, PortType, PORT_HEARTBEAT, TYPE_ANY,
    TYPE_DATA_DEPENDENT, TYPE_FLOW_DEPENDENT, TYPE_NONE,
};
pub use process::{Process, DESYNC_MESSAGE, INPUT_ERROR_MESSAGE};
pub use process_core::{ProcessCore, ProcessState};
pub use resolver::{PortKey, Resolution, TypeResolver};
pub use snapshot::{ConfigSnapshot, PortSnapshot, ProcessSnapshot};
pub use sync::{DataCheck, DataInfo, InputHead, Verdict};

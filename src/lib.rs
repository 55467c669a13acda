//! # flowproc: process core for dataflow pipelines
//!
//! A dataflow pipeline is a directed graph of processes connected by
//! edges. Each process declares typed input and output ports, reads its
//! configuration from a flat key/value snapshot, and is stepped repeatedly
//! by an external scheduler once its edges are bound.
//!
//! This crate provides the per-process machinery:
//!
//! - **Lifecycle**: `configure → connect → init → step* → reset`, enforced by
//!   [`pipeline::Process`] with typed errors for every misuse.
//! - **Ports**: type sentinels, flags, and rational frequencies
//!   ([`pipeline::PortInfo`]).
//! - **Type negotiation**: flow-dependent ports sharing a tag resolve
//!   together.
//! - **Data checking**: inputs are checked for synchronization and validity
//!   before each step; faults are forwarded as status datums.
//! - **Configuration**: declared keys with defaults and tunable flags
//!   ([`config::ConfigRegistry`]).
//!
//! ## Example
//!
//! ```ignore
//! use flowproc::config::Config;
//! use flowproc::pipeline::{
//!     MemoryEdge, PortFlags, PortInfo, Process, ProcessCore, ProcessPlugin, ProcessResult,
//! };
//!
//! struct Double;
//!
//! impl ProcessPlugin for Double {
//!     fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
//!         core.declare_input_port("x", PortInfo::new("int", PortFlags::required(), "Input"))?;
//!         core.declare_output_port("y", PortInfo::new("int", PortFlags::new(), "Doubled"))
//!     }
//!
//!     fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
//!         let x: i64 = core.grab_from_port_as("x")?;
//!         core.push_to_port_as("y", x * 2)
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut process = Process::new(Config::for_process("double", "double"), Double)?;
//!     process.configure()?;
//!     process.connect_input_port("x", Some(MemoryEdge::shared()))?;
//!     process.connect_output_port("y", Some(MemoryEdge::shared()))?;
//!     process.init()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use config::{ConfInfo, Config, ConfigRegistry};
pub use error::{FlowError, Result, ResultExt};
pub use pipeline::{
    Datum, DatumStatus, Edge, EdgeRef, MemoryEdge, Process, ProcessCore, ProcessError,
    ProcessPlugin, ProcessResult,
};

//! Hook interface for concrete processes.
//!
//! A concrete process implements [`ProcessPlugin`] and is handed to
//! [`Process::new`](crate::pipeline::Process::new). The lifecycle owns the
//! plugin and invokes one hook per transition, passing the
//! [`ProcessCore`] so the hook can declare ports, read configuration, and
//! move data. All hooks except `on_step` have empty defaults.

use crate::config::Config;
use crate::pipeline::error::ProcessResult;
use crate::pipeline::port::PortType;
use crate::pipeline::process_core::ProcessCore;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Coarse concurrency hints a process advertises to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProcessProperty {
    /// Must not run in a thread of its own.
    #[serde(rename = "_no_thread")]
    NoThreads,
    /// Must not be stepped concurrently, even across instances.
    #[serde(rename = "_no_reentrant")]
    NoReentrancy,
    /// Inputs are exempt from the synchronization check.
    #[serde(rename = "_unsync_input")]
    UnsyncInput,
    /// Outputs are not emitted in lockstep.
    #[serde(rename = "_unsync_output")]
    UnsyncOutput,
}

impl ProcessProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessProperty::NoThreads => "_no_thread",
            ProcessProperty::NoReentrancy => "_no_reentrant",
            ProcessProperty::UnsyncInput => "_unsync_input",
            ProcessProperty::UnsyncOutput => "_unsync_output",
        }
    }
}

impl fmt::Display for ProcessProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of properties on a process.
pub type Properties = BTreeSet<ProcessProperty>;

/// Trait implemented by every concrete process.
pub trait ProcessPlugin: Send {
    /// Declare ports and configuration keys. Called once, at construction.
    fn on_declare(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
        Ok(())
    }

    /// Validate configuration and resolve data-dependent port types.
    fn on_configure(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
        Ok(())
    }

    /// Last look at the bound edges before stepping starts.
    fn on_init(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
        Ok(())
    }

    /// Consume one step's worth of input and produce one step's worth of
    /// output on every bound port, as given by the port frequencies.
    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()>;

    /// Drop per-run state. Edges are already detached when this runs.
    fn on_reset(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
        Ok(())
    }

    /// React to new values of tunable keys. `update` is the full request;
    /// the registry has already applied the tunable subset.
    fn on_reconfigure(&mut self, _core: &mut ProcessCore, _update: &Config) -> ProcessResult<()> {
        Ok(())
    }

    fn properties(&self) -> Properties {
        Properties::new()
    }

    /// Accept or refuse a proposed type for a dependent input port.
    ///
    /// Returning `Ok(false)` is a refusal, not an error: the graph assembler
    /// may try another pairing.
    fn on_set_input_port_type(
        &mut self,
        core: &mut ProcessCore,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<bool> {
        core.resolve_input_port_type(port, proposed)
    }

    /// Accept or refuse a proposed type for a dependent output port.
    fn on_set_output_port_type(
        &mut self,
        core: &mut ProcessCore,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<bool> {
        core.resolve_output_port_type(port, proposed)
    }
}

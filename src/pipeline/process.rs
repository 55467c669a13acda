//! Process lifecycle.
//!
//! A [`Process`] pairs a [`ProcessCore`] with the concrete
//! [`ProcessPlugin`] and enforces the transition order:
//!
//! 1. `new` declares ports and keys (`Created`).
//! 2. `configure` resolves data-dependent types (`Configured`).
//! 3. `connect_*_port` binds edges.
//! 4. `init` freezes declarations (`Initialized`).
//! 5. `step` runs the data check and then the step hook, repeatedly.
//! 6. `reset` detaches everything and returns to `Configured`.
//!
//! Every public entry point validates the state before touching the plugin,
//! so a misused process fails with a typed error instead of calling into
//! the hook.

use crate::config::{ConfInfo, Config};
use crate::pipeline::datum::{Datum, DatumStatus};
use crate::pipeline::edge::EdgeRef;
use crate::pipeline::error::{ProcessError, ProcessResult};
use crate::pipeline::plugin::{ProcessPlugin, ProcessProperty, Properties};
use crate::pipeline::port::{PortDirection, PortInfo, PortType};
use crate::pipeline::process_core::{ProcessCore, ProcessState};
use crate::pipeline::snapshot::ProcessSnapshot;
use crate::pipeline::sync::{self, DataCheck, Verdict};
use std::sync::Arc;

/// Message carried by the error datum emitted on a synchronization fault.
pub const DESYNC_MESSAGE: &str = "required inputs are not synchronized";

/// Message carried by the error datum forwarded from an errored input.
pub const INPUT_ERROR_MESSAGE: &str = "error in a required input";

/// A process instance: framework state plus the concrete behavior.
pub struct Process {
    core: ProcessCore,
    plugin: Box<dyn ProcessPlugin>,
}

impl Process {
    /// Build a process from its construction snapshot and run its
    /// declaration hook.
    pub fn new<P: ProcessPlugin + 'static>(config: Config, plugin: P) -> ProcessResult<Self> {
        Self::from_boxed(config, Box::new(plugin))
    }

    pub fn from_boxed(config: Config, mut plugin: Box<dyn ProcessPlugin>) -> ProcessResult<Self> {
        let mut core = ProcessCore::new(config)?;
        plugin.on_declare(&mut core)?;
        tracing::debug!(
            "Created process '{}' of type '{}' ({} inputs, {} outputs)",
            core.name(),
            core.process_type(),
            core.input_ports().len(),
            core.output_ports().len()
        );
        Ok(Self { core, plugin })
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn process_type(&self) -> &str {
        self.core.process_type()
    }

    pub fn state(&self) -> ProcessState {
        self.core.state()
    }

    pub fn is_complete(&self) -> bool {
        self.core.is_complete()
    }

    pub fn data_checking_level(&self) -> DataCheck {
        self.core.data_checking_level()
    }

    /// Read-only view of the core, for inspection.
    pub fn core(&self) -> &ProcessCore {
        &self.core
    }

    // ── Lifecycle ──

    pub fn configure(&mut self) -> ProcessResult<()> {
        if self.core.state() != ProcessState::Created {
            return Err(ProcessError::AlreadyConfigured {
                name: self.name().to_string(),
            });
        }
        self.plugin.on_configure(&mut self.core)?;
        self.core.set_state(ProcessState::Configured);
        tracing::debug!("Configured process '{}'", self.name());
        Ok(())
    }

    pub fn init(&mut self) -> ProcessResult<()> {
        match self.core.state() {
            ProcessState::Created => {
                return Err(ProcessError::Unconfigured {
                    name: self.name().to_string(),
                })
            }
            ProcessState::Initialized => {
                return Err(ProcessError::Reinitialized {
                    name: self.name().to_string(),
                })
            }
            ProcessState::Configured => {}
        }
        self.plugin.on_init(&mut self.core)?;
        self.core.set_state(ProcessState::Initialized);
        tracing::info!("Initialized process '{}'", self.name());
        Ok(())
    }

    /// Detach every edge and clear run state so the process can be
    /// reconnected. A process that was never configured stays `Created`.
    ///
    /// The transition happens before the reset hook runs, so a failing hook
    /// still leaves the process detached and `Configured`.
    pub fn reset(&mut self) -> ProcessResult<()> {
        self.core.detach_all();
        if self.core.state() == ProcessState::Initialized {
            self.core.set_state(ProcessState::Configured);
        }
        tracing::debug!("Reset process '{}'", self.name());
        self.plugin.on_reset(&mut self.core)
    }

    /// Run one step.
    ///
    /// A complete process only emits its heartbeat. Otherwise the data check
    /// decides between calling the step hook and forwarding a fault.
    pub fn step(&mut self) -> ProcessResult<()> {
        if self.core.state() != ProcessState::Initialized {
            return Err(ProcessError::Uninitialized {
                name: self.name().to_string(),
            });
        }

        if !self.core.is_complete() {
            let check_sync = !self.properties().contains(&ProcessProperty::UnsyncInput);
            let heads = self.core.required_heads();
            match sync::verdict(self.core.data_checking_level(), check_sync, &heads) {
                Verdict::Step => self.plugin.on_step(&mut self.core)?,
                Verdict::Desync => {
                    tracing::warn!(
                        "Process '{}' has unsynchronized inputs; dropping one step of each",
                        self.name()
                    );
                    self.core.push_to_all_outputs(&Datum::error(DESYNC_MESSAGE));
                    for head in &heads {
                        self.core
                            .drain_input(&head.port, head.frequency.tokens_per_step());
                    }
                }
                Verdict::Propagate(status) => {
                    let datum = match status {
                        DatumStatus::Error => Datum::error(INPUT_ERROR_MESSAGE),
                        other => Datum::marker(other),
                    };
                    if status == DatumStatus::Complete {
                        self.core.mark_process_as_complete();
                    }
                    tracing::debug!(
                        "Process '{}' forwarding {} instead of stepping",
                        self.name(),
                        status
                    );
                    self.core.push_to_all_outputs(&datum);
                    for head in &heads {
                        self.core
                            .drain_input(&head.port, head.frequency.tokens_per_step());
                    }
                }
            }
        }

        self.core.push_heartbeat();
        Ok(())
    }

    /// Apply new values for tunable keys. Returns the keys that changed.
    pub fn reconfigure(&mut self, update: &Config) -> ProcessResult<Vec<String>> {
        if self.core.state() != ProcessState::Initialized {
            return Err(ProcessError::ReconfigureBeforeInit {
                name: self.name().to_string(),
            });
        }
        let applied = self.core.registry_mut().reconfigure(update);
        self.plugin.on_reconfigure(&mut self.core, update)?;
        if !applied.is_empty() {
            tracing::info!("Reconfigured '{}': {:?}", self.name(), applied);
        }
        Ok(applied)
    }

    /// The plugin's properties, plus `UnsyncInput` when data checking is off.
    pub fn properties(&self) -> Properties {
        let mut props = self.plugin.properties();
        if self.core.data_checking_level() == DataCheck::None {
            props.insert(ProcessProperty::UnsyncInput);
        }
        props
    }

    // ── Connections ──

    pub fn connect_input_port(&mut self, port: &str, edge: Option<EdgeRef>) -> ProcessResult<()> {
        self.core.connect(PortDirection::Input, port, edge)
    }

    pub fn connect_output_port(&mut self, port: &str, edge: Option<EdgeRef>) -> ProcessResult<()> {
        self.core.connect(PortDirection::Output, port, edge)
    }

    // ── Ports ──

    pub fn input_ports(&self) -> Vec<String> {
        self.core.input_ports()
    }

    pub fn output_ports(&self) -> Vec<String> {
        self.core.output_ports()
    }

    pub fn input_port_info(&self, port: &str) -> ProcessResult<Arc<PortInfo>> {
        self.core.input_port_info(port)
    }

    pub fn output_port_info(&self, port: &str) -> ProcessResult<Arc<PortInfo>> {
        self.core.output_port_info(port)
    }

    /// Propose a concrete type for an input port.
    ///
    /// `Ok(false)` means the process refused the type; errors are reserved
    /// for misuse (after init, unknown port, static type).
    pub fn set_input_port_type(
        &mut self,
        port: &str,
        proposed: impl Into<PortType>,
    ) -> ProcessResult<bool> {
        let proposed = proposed.into();
        self.core
            .check_type_proposal(PortDirection::Input, port, &proposed)?;
        self.plugin
            .on_set_input_port_type(&mut self.core, port, &proposed)
    }

    pub fn set_output_port_type(
        &mut self,
        port: &str,
        proposed: impl Into<PortType>,
    ) -> ProcessResult<bool> {
        let proposed = proposed.into();
        self.core
            .check_type_proposal(PortDirection::Output, port, &proposed)?;
        self.plugin
            .on_set_output_port_type(&mut self.core, port, &proposed)
    }

    // ── Configuration ──

    pub fn available_config(&self) -> Vec<String> {
        self.core.registry().available()
    }

    pub fn available_tunable_config(&self) -> Vec<String> {
        self.core.registry().available_tunable()
    }

    pub fn config_info(&self, key: &str) -> ProcessResult<Arc<ConfInfo>> {
        Ok(self.core.registry().info(key)?)
    }

    /// Serializable description of the process as it stands.
    pub fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot::capture(&self.core, &self.properties())
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process").field("core", &self.core).finish()
    }
}

//! Per-process state shared between the lifecycle and the process hooks.
//!
//! [`ProcessCore`] owns the port registries, the configuration registry,
//! the type resolver and the bookkeeping for stamps and completion. Hooks
//! receive `&mut ProcessCore` and use the `declare_*`, `grab_*` and
//! `push_*` families; the lifecycle drives the crate-private half.

use crate::config::{
    ConfInfo, Config, ConfigRegistry, CONFIG_NAME, CONFIG_TYPE, DEFAULT_PROCESS_NAME,
    DEFAULT_PROCESS_TYPE, STATIC_INPUT_PREFIX,
};
use crate::pipeline::datum::{Datum, EdgeDatum, Stamp};
use crate::pipeline::edge::EdgeRef;
use crate::pipeline::error::{ProcessError, ProcessResult};
use crate::pipeline::port::{
    Frequency, PortDirection, PortFlag, PortFlags, PortInfo, PortType, PORT_HEARTBEAT,
};
use crate::pipeline::resolver::{Resolution, TypeResolver};
use crate::pipeline::sync::{DataCheck, InputHead};
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Lifecycle position of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Created,
    Configured,
    Initialized,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Created => f.write_str("created"),
            ProcessState::Configured => f.write_str("configured"),
            ProcessState::Initialized => f.write_str("initialized"),
        }
    }
}

/// One declared port and what is bound to it.
struct PortEntry {
    /// Type as declared; `info.port_type` may have been resolved since.
    declared: PortType,
    info: Arc<PortInfo>,
    /// At most one for inputs.
    edges: Vec<EdgeRef>,
    /// Stamp the next pushed datum receives. Outputs only.
    next_stamp: Stamp,
}

impl PortEntry {
    fn new(info: PortInfo) -> Self {
        Self {
            declared: info.port_type.clone(),
            info: Arc::new(info),
            edges: Vec::new(),
            next_stamp: Stamp::default(),
        }
    }
}

/// Ports, configuration and run state of one process.
pub struct ProcessCore {
    name: String,
    process_type: String,
    state: ProcessState,
    complete: bool,
    check_level: DataCheck,
    config: ConfigRegistry,
    inputs: BTreeMap<String, PortEntry>,
    outputs: BTreeMap<String, PortEntry>,
    resolver: TypeResolver,
}

impl ProcessCore {
    /// Build a core over a construction snapshot. Declares the reserved
    /// configuration keys and the heartbeat output.
    pub(crate) fn new(config: Config) -> ProcessResult<Self> {
        let name = config
            .get_raw(CONFIG_NAME)
            .unwrap_or(DEFAULT_PROCESS_NAME)
            .to_string();
        let process_type = config
            .get_raw(CONFIG_TYPE)
            .unwrap_or(DEFAULT_PROCESS_TYPE)
            .to_string();

        let mut registry = ConfigRegistry::new(config);
        registry.declare(
            CONFIG_NAME,
            ConfInfo::new(DEFAULT_PROCESS_NAME, "The name of the process.", false),
        )?;
        registry.declare(
            CONFIG_TYPE,
            ConfInfo::new(DEFAULT_PROCESS_TYPE, "The type of the process.", false),
        )?;

        let mut core = Self {
            name,
            process_type,
            state: ProcessState::Created,
            complete: false,
            check_level: DataCheck::default(),
            config: registry,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            resolver: TypeResolver::new(),
        };
        core.declare_output_port(
            PORT_HEARTBEAT,
            PortInfo::new(
                PortType::None,
                PortFlags::new(),
                "Outputs the heartbeat stamp with its status.",
            ),
        )?;
        Ok(core)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn process_type(&self) -> &str {
        &self.process_type
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn data_checking_level(&self) -> DataCheck {
        self.check_level
    }

    // ── Declarations ──

    pub fn declare_input_port(
        &mut self,
        port: impl Into<String>,
        info: PortInfo,
    ) -> ProcessResult<()> {
        self.declare_port(PortDirection::Input, port.into(), info)
    }

    pub fn declare_output_port(
        &mut self,
        port: impl Into<String>,
        info: PortInfo,
    ) -> ProcessResult<()> {
        self.declare_port(PortDirection::Output, port.into(), info)
    }

    fn declare_port(
        &mut self,
        direction: PortDirection,
        port: String,
        mut info: PortInfo,
    ) -> ProcessResult<()> {
        self.ensure_mutable_declarations(&port)?;
        if self.ports(direction).contains_key(&port) {
            return Err(ProcessError::DuplicatePort {
                name: self.name.clone(),
                direction,
                port,
            });
        }
        self.check_flags(direction, &port, &info.flags)?;

        let tag = info.port_type.flow_tag().map(str::to_string);
        self.resolver
            .register((direction, port.clone()), tag.as_deref());
        let declared = info.port_type.clone();
        if let Some(pinned) = tag.as_deref().and_then(|t| self.resolver.tag_type(t)) {
            tracing::debug!(
                "Port '{}' on '{}' joins a class already resolved to '{}'",
                port,
                self.name,
                pinned
            );
            info = info.retyped(PortType::Concrete(pinned));
        }

        if direction == PortDirection::Input && info.flags.is_static() {
            let key = format!("{}{}", STATIC_INPUT_PREFIX, port);
            if !self.config.is_declared(&key) {
                let description = format!(
                    "A default value to use for the '{}' port if it is not connected.",
                    port
                );
                self.config
                    .declare(key, ConfInfo::new("", description, false))?;
            }
        }

        tracing::trace!("Declared {} port '{}' on '{}'", direction, port, self.name);
        let mut entry = PortEntry::new(info);
        entry.declared = declared;
        self.ports_mut(direction).insert(port, entry);
        Ok(())
    }

    fn check_flags(
        &self,
        direction: PortDirection,
        port: &str,
        flags: &PortFlags,
    ) -> ProcessResult<()> {
        let mismatch = |reason: &str| ProcessError::FlagMismatch {
            name: self.name.clone(),
            port: port.to_string(),
            reason: reason.to_string(),
        };
        if flags.is_required() && flags.is_static() {
            return Err(mismatch("a required port cannot be static"));
        }
        let input_only = [PortFlag::InputStatic, PortFlag::InputMutable, PortFlag::InputNoDep];
        let output_only = [PortFlag::OutputConst, PortFlag::OutputShared];
        match direction {
            PortDirection::Output if input_only.iter().any(|f| flags.contains(*f)) => {
                Err(mismatch("input-only flag on an output port"))
            }
            PortDirection::Input if output_only.iter().any(|f| flags.contains(*f)) => {
                Err(mismatch("output-only flag on an input port"))
            }
            _ => {
                if flags.contains(PortFlag::OutputConst) && flags.contains(PortFlag::OutputShared)
                {
                    return Err(mismatch("a const output cannot also be shared"));
                }
                Ok(())
            }
        }
    }

    pub fn remove_input_port(&mut self, port: &str) -> ProcessResult<()> {
        self.remove_port(PortDirection::Input, port)
    }

    /// Remove an output port. The heartbeat port cannot be removed.
    pub fn remove_output_port(&mut self, port: &str) -> ProcessResult<()> {
        if port == PORT_HEARTBEAT {
            return Err(ProcessError::ReservedPort {
                name: self.name.clone(),
                port: port.to_string(),
            });
        }
        self.remove_port(PortDirection::Output, port)
    }

    fn remove_port(&mut self, direction: PortDirection, port: &str) -> ProcessResult<()> {
        self.ensure_mutable_declarations(port)?;
        if self.ports_mut(direction).remove(port).is_none() {
            return Err(self.no_such_port(direction, port));
        }
        self.resolver.unregister(&(direction, port.to_string()));
        tracing::trace!("Removed {} port '{}' from '{}'", direction, port, self.name);
        Ok(())
    }

    pub fn set_input_port_frequency(
        &mut self,
        port: &str,
        frequency: Frequency,
    ) -> ProcessResult<()> {
        self.set_port_frequency(PortDirection::Input, port, frequency)
    }

    pub fn set_output_port_frequency(
        &mut self,
        port: &str,
        frequency: Frequency,
    ) -> ProcessResult<()> {
        self.set_port_frequency(PortDirection::Output, port, frequency)
    }

    fn set_port_frequency(
        &mut self,
        direction: PortDirection,
        port: &str,
        frequency: Frequency,
    ) -> ProcessResult<()> {
        self.ensure_mutable_declarations(port)?;
        let entry = self.entry_mut(direction, port)?;
        entry.info = Arc::new(PortInfo {
            frequency,
            ..(*entry.info).clone()
        });
        Ok(())
    }

    fn ensure_mutable_declarations(&self, port: &str) -> ProcessResult<()> {
        if self.state == ProcessState::Initialized {
            return Err(ProcessError::DeclareAfterInit {
                name: self.name.clone(),
                port: port.to_string(),
            });
        }
        Ok(())
    }

    // ── Configuration ──

    pub fn declare_configuration_key(
        &mut self,
        key: impl Into<String>,
        info: ConfInfo,
    ) -> ProcessResult<()> {
        Ok(self.config.declare(key, info)?)
    }

    /// Current value of a declared key, falling back to its default.
    pub fn config_value<T>(&self, key: &str) -> ProcessResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.config.value(key)?)
    }

    /// The configuration the process was built from, including any applied
    /// reconfiguration.
    pub fn get_config(&self) -> &Config {
        self.config.snapshot()
    }

    pub(crate) fn registry(&self) -> &ConfigRegistry {
        &self.config
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ConfigRegistry {
        &mut self.config
    }

    pub fn set_data_checking_level(&mut self, level: DataCheck) {
        tracing::debug!("Data checking on '{}' set to {}", self.name, level);
        self.check_level = level;
    }

    /// Stop stepping. Idempotent.
    pub fn mark_process_as_complete(&mut self) {
        if !self.complete {
            tracing::debug!("Process '{}' is complete", self.name);
        }
        self.complete = true;
    }

    // ── Port queries ──

    pub fn input_ports(&self) -> Vec<String> {
        self.inputs.keys().cloned().collect()
    }

    pub fn output_ports(&self) -> Vec<String> {
        self.outputs.keys().cloned().collect()
    }

    pub fn input_port_info(&self, port: &str) -> ProcessResult<Arc<PortInfo>> {
        Ok(self.entry(PortDirection::Input, port)?.info.clone())
    }

    pub fn output_port_info(&self, port: &str) -> ProcessResult<Arc<PortInfo>> {
        Ok(self.entry(PortDirection::Output, port)?.info.clone())
    }

    pub fn has_input_port_edge(&self, port: &str) -> ProcessResult<bool> {
        Ok(!self.entry(PortDirection::Input, port)?.edges.is_empty())
    }

    pub fn count_output_port_edges(&self, port: &str) -> ProcessResult<usize> {
        Ok(self.entry(PortDirection::Output, port)?.edges.len())
    }

    // ── Type negotiation ──

    /// Default negotiation for a dependent input port.
    pub fn resolve_input_port_type(
        &mut self,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<bool> {
        self.resolve_port_type(PortDirection::Input, port, proposed)
    }

    /// Default negotiation for a dependent output port.
    pub fn resolve_output_port_type(
        &mut self,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<bool> {
        self.resolve_port_type(PortDirection::Output, port, proposed)
    }

    /// Reject proposals that are errors regardless of what the process
    /// wants: after init, on unknown ports, or against a static type.
    pub(crate) fn check_type_proposal(
        &self,
        direction: PortDirection,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<()> {
        if self.state == ProcessState::Initialized {
            return Err(ProcessError::SetTypeOnInitialized {
                name: self.name.clone(),
                port: port.to_string(),
            });
        }
        let entry = self.entry(direction, port)?;
        let current = &entry.info.port_type;
        let is_static = matches!(entry.declared, PortType::Concrete(_) | PortType::None);
        if is_static && current != proposed {
            return Err(ProcessError::StaticTypeReset {
                name: self.name.clone(),
                port: port.to_string(),
                current: current.clone(),
                proposed: proposed.clone(),
            });
        }
        Ok(())
    }

    fn resolve_port_type(
        &mut self,
        direction: PortDirection,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<bool> {
        self.check_type_proposal(direction, port, proposed)?;
        let entry = self.entry(direction, port)?;
        if entry.info.port_type == *proposed {
            return Ok(true);
        }
        let PortType::Concrete(concrete) = proposed else {
            tracing::debug!(
                "Refusing non-concrete type '{}' for port '{}' on '{}'",
                proposed,
                port,
                self.name
            );
            return Ok(false);
        };
        match entry.declared {
            PortType::Any => return Ok(true),
            PortType::Concrete(_) | PortType::None => return Ok(false),
            PortType::DataDependent | PortType::FlowDependent(_) => {}
        }
        if entry.info.port_type.is_concrete() {
            tracing::debug!(
                "Port '{}' on '{}' is already '{}', refusing '{}'",
                port,
                self.name,
                entry.info.port_type,
                proposed
            );
            return Ok(false);
        }

        let key = (direction, port.to_string());
        let members = match self.resolver.resolve(&key, concrete) {
            Resolution::Resolved(members) => members,
            Resolution::Unchanged => vec![key],
            Resolution::Conflict(existing) => {
                tracing::debug!(
                    "Type class of port '{}' on '{}' is already '{}'",
                    port,
                    self.name,
                    existing
                );
                return Ok(false);
            }
        };
        for (member_dir, member) in members {
            if let Some(entry) = self.ports_mut(member_dir).get_mut(&member) {
                entry.info = Arc::new(entry.info.retyped(proposed.clone()));
            }
        }
        tracing::debug!(
            "Resolved {} port '{}' on '{}' to '{}'",
            direction,
            port,
            self.name,
            concrete
        );
        Ok(true)
    }

    // ── Data movement ──

    /// Look at the datum `index` positions from the head of an input edge.
    ///
    /// Returns `None` when the port is unbound or the edge is that short.
    pub fn peek_at_port(&self, port: &str, index: usize) -> ProcessResult<Option<EdgeDatum>> {
        let entry = self.entry(PortDirection::Input, port)?;
        Ok(entry.edges.first().and_then(|edge| edge.peek(index)))
    }

    pub fn peek_at_datum_on_port(&self, port: &str, index: usize) -> ProcessResult<Option<Datum>> {
        Ok(self.peek_at_port(port, index)?.map(|ed| ed.datum))
    }

    /// Remove the head of an input edge, blocking until one arrives.
    pub fn grab_from_port(&self, port: &str) -> ProcessResult<EdgeDatum> {
        let entry = self.entry(PortDirection::Input, port)?;
        let edge = entry
            .edges
            .first()
            .ok_or_else(|| ProcessError::MissingConnection {
                name: self.name.clone(),
                direction: PortDirection::Input,
                port: port.to_string(),
            })?;
        Ok(edge.pop())
    }

    pub fn grab_datum_from_port(&self, port: &str) -> ProcessResult<Datum> {
        Ok(self.grab_from_port(port)?.datum)
    }

    /// Grab the head datum and extract a `T` from it.
    pub fn grab_from_port_as<T: Any + Clone>(&self, port: &str) -> ProcessResult<T> {
        let datum = self.grab_datum_from_port(port)?;
        datum
            .get::<T>()
            .cloned()
            .ok_or_else(|| ProcessError::BadDatumCast {
                name: self.name.clone(),
                port: port.to_string(),
                status: datum.status(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Like [`grab_from_port_as`](Self::grab_from_port_as), except that an
    /// unbound static input reads its `static/<port>` configuration value.
    pub fn grab_input_as<T>(&self, port: &str) -> ProcessResult<T>
    where
        T: Any + Clone + FromStr,
        T::Err: fmt::Display,
    {
        let entry = self.entry(PortDirection::Input, port)?;
        if entry.edges.is_empty() && entry.info.flags.is_static() {
            return self.config_value(&format!("{}{}", STATIC_INPUT_PREFIX, port));
        }
        self.grab_from_port_as(port)
    }

    /// Send `datum` to every edge on an output port under the port's next
    /// stamp. An unbound port still advances its stamp.
    pub fn push_datum_to_port(&mut self, port: &str, datum: Datum) -> ProcessResult<()> {
        let entry = self.entry_mut(PortDirection::Output, port)?;
        push_to_entry(entry, datum);
        Ok(())
    }

    pub fn push_to_port_as<T: Any + Send + Sync>(
        &mut self,
        port: &str,
        value: T,
    ) -> ProcessResult<()> {
        self.push_datum_to_port(port, Datum::new(value))
    }

    /// Stamp the next datum on `port` will receive.
    pub fn output_port_stamp(&self, port: &str) -> ProcessResult<Stamp> {
        Ok(self.entry(PortDirection::Output, port)?.next_stamp)
    }

    // ── Lifecycle support ──

    pub(crate) fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    pub(crate) fn connect(
        &mut self,
        direction: PortDirection,
        port: &str,
        edge: Option<EdgeRef>,
    ) -> ProcessResult<()> {
        let Some(edge) = edge else {
            return Err(ProcessError::NullEdge {
                name: self.name.clone(),
                direction,
                port: port.to_string(),
            });
        };
        match self.state {
            ProcessState::Initialized => {
                return Err(ProcessError::ConnectAfterInit {
                    name: self.name.clone(),
                    port: port.to_string(),
                })
            }
            ProcessState::Created => {
                return Err(ProcessError::Unconfigured {
                    name: self.name.clone(),
                })
            }
            ProcessState::Configured => {}
        }
        let name = self.name.clone();
        let entry = self.entry_mut(direction, port)?;
        if direction == PortDirection::Input && !entry.edges.is_empty() {
            return Err(ProcessError::PortReconnect {
                name,
                port: port.to_string(),
            });
        }
        tracing::debug!(
            "Connected edge {} to {} port '{}' on '{}'",
            edge.id(),
            direction,
            port,
            name
        );
        entry.edges.push(edge);
        Ok(())
    }

    /// Drop every edge and rewind all stamps.
    pub(crate) fn detach_all(&mut self) {
        for entry in self.inputs.values_mut().chain(self.outputs.values_mut()) {
            entry.edges.clear();
            entry.next_stamp = Stamp::default();
        }
        self.complete = false;
    }

    /// Heads of the bound required inputs.
    pub(crate) fn required_heads(&self) -> Vec<InputHead> {
        self.inputs
            .iter()
            .filter(|(_, entry)| entry.info.flags.is_required())
            .filter_map(|(port, entry)| {
                let edge = entry.edges.first()?;
                Some(InputHead {
                    port: port.clone(),
                    frequency: entry.info.frequency,
                    head: edge.peek(0),
                })
            })
            .collect()
    }

    /// Discard up to `count` queued datums from an input without blocking.
    pub(crate) fn drain_input(&self, port: &str, count: usize) -> usize {
        let Some(edge) = self.inputs.get(port).and_then(|e| e.edges.first()) else {
            return 0;
        };
        (0..count).take_while(|_| edge.try_pop().is_some()).count()
    }

    /// Push `datum` on every output except the heartbeat.
    pub(crate) fn push_to_all_outputs(&mut self, datum: &Datum) {
        for (port, entry) in self.outputs.iter_mut() {
            if port != PORT_HEARTBEAT {
                push_to_entry(entry, datum.clone());
            }
        }
    }

    pub(crate) fn push_heartbeat(&mut self) {
        let datum = if self.complete {
            Datum::complete()
        } else {
            Datum::empty()
        };
        if let Some(entry) = self.outputs.get_mut(PORT_HEARTBEAT) {
            push_to_entry(entry, datum);
        }
    }

    // ── Lookup ──

    fn ports(&self, direction: PortDirection) -> &BTreeMap<String, PortEntry> {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    fn ports_mut(&mut self, direction: PortDirection) -> &mut BTreeMap<String, PortEntry> {
        match direction {
            PortDirection::Input => &mut self.inputs,
            PortDirection::Output => &mut self.outputs,
        }
    }

    fn no_such_port(&self, direction: PortDirection, port: &str) -> ProcessError {
        ProcessError::NoSuchPort {
            name: self.name.clone(),
            direction,
            port: port.to_string(),
        }
    }

    fn entry(&self, direction: PortDirection, port: &str) -> ProcessResult<&PortEntry> {
        self.ports(direction)
            .get(port)
            .ok_or_else(|| self.no_such_port(direction, port))
    }

    fn entry_mut(&mut self, direction: PortDirection, port: &str) -> ProcessResult<&mut PortEntry> {
        let name = &self.name;
        let ports = match direction {
            PortDirection::Input => &mut self.inputs,
            PortDirection::Output => &mut self.outputs,
        };
        ports
            .get_mut(port)
            .ok_or_else(|| ProcessError::NoSuchPort {
                name: name.clone(),
                direction,
                port: port.to_string(),
            })
    }

    pub(crate) fn connected_edges(&self, direction: PortDirection, port: &str) -> usize {
        self.ports(direction).get(port).map_or(0, |e| e.edges.len())
    }
}

fn push_to_entry(entry: &mut PortEntry, datum: Datum) {
    let stamp = entry.next_stamp;
    entry.next_stamp = stamp.next();
    for edge in &entry.edges {
        edge.push(EdgeDatum::new(datum.clone(), stamp));
    }
}

impl fmt::Debug for ProcessCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessCore")
            .field("name", &self.name)
            .field("type", &self.process_type)
            .field("state", &self.state)
            .field("complete", &self.complete)
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! Serializable description of a process.
//!
//! Used by graph tooling to list what a process declares without holding a
//! reference to it, and by tests to compare whole declarations at once.

use crate::error::Result;
use crate::pipeline::plugin::{ProcessProperty, Properties};
use crate::pipeline::port::{PortDirection, PortInfo};
use crate::pipeline::process_core::{ProcessCore, ProcessState};
use crate::pipeline::sync::DataCheck;
use serde::Serialize;

/// Snapshot of one port.
#[derive(Debug, Clone, Serialize)]
pub struct PortSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub info: PortInfo,
    pub edges: usize,
}

/// Snapshot of one declared configuration key.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub key: String,
    pub value: String,
    pub default: String,
    pub description: String,
    pub tunable: bool,
}

/// Snapshot of a whole process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub process_type: String,
    pub state: ProcessState,
    pub complete: bool,
    pub data_check: DataCheck,
    pub properties: Vec<ProcessProperty>,
    pub inputs: Vec<PortSnapshot>,
    pub outputs: Vec<PortSnapshot>,
    pub config: Vec<ConfigSnapshot>,
}

impl ProcessSnapshot {
    pub(crate) fn capture(core: &ProcessCore, properties: &Properties) -> Self {
        let ports = |direction: PortDirection| -> Vec<PortSnapshot> {
            let names = match direction {
                PortDirection::Input => core.input_ports(),
                PortDirection::Output => core.output_ports(),
            };
            names
                .into_iter()
                .filter_map(|name| {
                    let info = match direction {
                        PortDirection::Input => core.input_port_info(&name),
                        PortDirection::Output => core.output_port_info(&name),
                    }
                    .ok()?;
                    Some(PortSnapshot {
                        edges: core.connected_edges(direction, &name),
                        info: (*info).clone(),
                        name,
                    })
                })
                .collect()
        };

        let registry = core.registry();
        let config = registry
            .available()
            .into_iter()
            .filter_map(|key| {
                let info = registry.info(&key).ok()?;
                let value = registry.value_raw(&key).ok()?.to_string();
                Some(ConfigSnapshot {
                    value,
                    default: info.default.clone(),
                    description: info.description.clone(),
                    tunable: info.tunable,
                    key,
                })
            })
            .collect();

        Self {
            name: core.name().to_string(),
            process_type: core.process_type().to_string(),
            state: core.state(),
            complete: core.is_complete(),
            data_check: core.data_checking_level(),
            properties: properties.iter().copied().collect(),
            inputs: ports(PortDirection::Input),
            outputs: ports(PortDirection::Output),
            config,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn input(&self, name: &str) -> Option<&PortSnapshot> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&PortSnapshot> {
        self.outputs.iter().find(|p| p.name == name)
    }
}

//! Builders that take a process from construction to initialized with
//! in-memory edges on the requested ports

use flowproc::pipeline::{MemoryEdge, Process, ProcessPlugin, PORT_HEARTBEAT};
use flowproc::Config;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An initialized process plus the edges bound to it.
pub struct Harness {
    pub process: Process,
    inputs: BTreeMap<String, Arc<MemoryEdge>>,
    outputs: BTreeMap<String, Arc<MemoryEdge>>,
}

impl Harness {
    pub fn input(&self, port: &str) -> &MemoryEdge {
        self.inputs.get(port).expect("input edge not bound")
    }

    pub fn output(&self, port: &str) -> &MemoryEdge {
        self.outputs.get(port).expect("output edge not bound")
    }

    pub fn heartbeat(&self) -> &MemoryEdge {
        self.output(PORT_HEARTBEAT)
    }

    pub fn step(&mut self) {
        self.process.step().expect("step failed");
    }
}

/// Builder for test processes
pub struct ProcessBuilder<P> {
    plugin: P,
    config: Config,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl<P: ProcessPlugin + 'static> ProcessBuilder<P> {
    pub fn new(name: &str, plugin: P) -> Self {
        Self {
            plugin,
            config: Config::for_process(name, "test"),
            inputs: Vec::new(),
            outputs: vec![PORT_HEARTBEAT.to_string()],
        }
    }

    pub fn config(mut self, key: &str, value: impl ToString) -> Self {
        self.config.set_value(key, value);
        self
    }

    pub fn input(mut self, port: &str) -> Self {
        self.inputs.push(port.to_string());
        self
    }

    pub fn output(mut self, port: &str) -> Self {
        self.outputs.push(port.to_string());
        self
    }

    /// Construct and configure without binding anything.
    pub fn configured(self) -> Process {
        let mut process = Process::new(self.config, self.plugin).expect("construction failed");
        process.configure().expect("configure failed");
        process
    }

    pub fn build(self) -> Harness {
        let inputs = self.inputs.clone();
        let outputs = self.outputs.clone();
        let mut process = self.configured();

        let mut harness_inputs = BTreeMap::new();
        for port in inputs {
            let edge = MemoryEdge::shared();
            process
                .connect_input_port(&port, Some(edge.clone()))
                .expect("connect input failed");
            harness_inputs.insert(port, edge);
        }
        let mut harness_outputs = BTreeMap::new();
        for port in outputs {
            let edge = MemoryEdge::shared();
            process
                .connect_output_port(&port, Some(edge.clone()))
                .expect("connect output failed");
            harness_outputs.insert(port, edge);
        }
        process.init().expect("init failed");

        Harness {
            process,
            inputs: harness_inputs,
            outputs: harness_outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::plugins::Passthrough;
    use flowproc::pipeline::ProcessState;

    #[test]
    fn test_builder_binds_heartbeat() {
        let harness = ProcessBuilder::new("pass", Passthrough::default())
            .input("in")
            .output("out")
            .build();
        assert_eq!(harness.process.state(), ProcessState::Initialized);
        assert!(harness.process.core().has_input_port_edge("in").unwrap());
        assert_eq!(
            harness
                .process
                .core()
                .count_output_port_edges(PORT_HEARTBEAT)
                .unwrap(),
            1
        );
    }
}

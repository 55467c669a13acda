//! Integration tests for port type negotiation

mod common;

use common::builders::ProcessBuilder;
use common::plugins::{Adder, FrameReader, GrayOnly, Passthrough};
use flowproc::pipeline::{
    PortFlags, PortInfo, PortType, Process, ProcessCore, ProcessPlugin, ProcessResult,
};
use flowproc::Config;

fn passthrough() -> Process {
    Process::new(Config::for_process("pass", "passthrough"), Passthrough::default()).unwrap()
}

#[test]
fn test_flow_tag_resolves_both_directions() {
    common::init_logging();
    let mut process = passthrough();
    assert_eq!(
        process.input_port_info("in").unwrap().port_type,
        PortType::flow_dependent("pass")
    );

    assert!(process.set_input_port_type("in", "image").unwrap());
    assert_eq!(
        process.input_port_info("in").unwrap().port_type,
        PortType::concrete("image")
    );
    assert_eq!(
        process.output_port_info("out").unwrap().port_type,
        PortType::concrete("image")
    );

    // Re-proposing the resolved type is accepted; a different one is refused.
    assert!(process.set_output_port_type("out", "image").unwrap());
    assert!(!process.set_output_port_type("out", "mask").unwrap());
    assert_eq!(
        process.output_port_info("out").unwrap().port_type,
        PortType::concrete("image")
    );
}

#[test]
fn test_resolution_keeps_flags_and_description() {
    let mut process = passthrough();
    process.set_output_port_type("out", "image").unwrap();
    let info = process.input_port_info("in").unwrap();
    assert!(info.flags.is_required());
    assert_eq!(info.description, "Input.");
}

#[test]
fn test_sentinel_proposals_are_refused() {
    let mut process = passthrough();
    assert!(!process.set_input_port_type("in", PortType::Any).unwrap());
    assert!(!process
        .set_input_port_type("in", PortType::DataDependent)
        .unwrap());
    assert!(process.input_port_info("in").unwrap().port_type.is_dependent());
}

#[test]
fn test_static_types_cannot_change() {
    let mut process = Process::new(Config::new(), Adder::default()).unwrap();
    assert!(process.set_input_port_type("a", "integer").unwrap());
    let err = process.set_input_port_type("a", "float").unwrap_err();
    assert_eq!(err.kind(), "static type reset");

    let err = process
        .set_output_port_type("_heartbeat", "integer")
        .unwrap_err();
    assert_eq!(err.kind(), "static type reset");
}

#[test]
fn test_any_accepts_everything() {
    struct Sink;
    impl ProcessPlugin for Sink {
        fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
            core.declare_input_port("in", PortInfo::new(PortType::Any, PortFlags::new(), "Anything."))
        }
        fn on_step(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
            Ok(())
        }
    }

    let mut process = Process::new(Config::new(), Sink).unwrap();
    assert!(process.set_input_port_type("in", "image").unwrap());
    assert!(process.set_input_port_type("in", "mask").unwrap());
    assert_eq!(process.input_port_info("in").unwrap().port_type, PortType::Any);
}

#[test]
fn test_type_is_frozen_after_init() {
    let mut harness = ProcessBuilder::new("pass", Passthrough::default())
        .input("in")
        .output("out")
        .build();
    let err = harness
        .process
        .set_input_port_type("in", "image")
        .unwrap_err();
    assert_eq!(err.kind(), "set type on initialized");
}

#[test]
fn test_unknown_port() {
    let mut process = passthrough();
    let err = process.set_input_port_type("missing", "image").unwrap_err();
    assert_eq!(err.kind(), "no such port");
}

#[test]
fn test_process_may_refuse_a_type() {
    let mut process = Process::new(Config::new(), GrayOnly).unwrap();
    assert!(!process.set_input_port_type("in", "rgb").unwrap());
    assert!(process.input_port_info("in").unwrap().port_type.is_dependent());

    assert!(process.set_input_port_type("in", "gray").unwrap());
    assert_eq!(
        process.output_port_info("out").unwrap().port_type,
        PortType::concrete("gray")
    );
}

#[test]
fn test_data_dependent_output_resolves_at_configure() {
    let mut process = Process::new(
        Config::for_process("reader", "frame_reader").with("format", "yuv420"),
        FrameReader,
    )
    .unwrap();
    assert_eq!(
        process.output_port_info("frame").unwrap().port_type,
        PortType::DataDependent
    );

    process.configure().unwrap();
    assert_eq!(
        process.output_port_info("frame").unwrap().port_type,
        PortType::concrete("yuv420")
    );
}

#[test]
fn test_late_port_joins_resolved_class() {
    struct Splitter;
    impl ProcessPlugin for Splitter {
        fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
            core.declare_input_port(
                "in",
                PortInfo::new(PortType::flow_dependent("t"), PortFlags::required(), ""),
            )
        }
        fn on_configure(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
            core.declare_output_port(
                "copy",
                PortInfo::new(PortType::flow_dependent("t"), PortFlags::new(), ""),
            )
        }
        fn on_step(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
            Ok(())
        }
    }

    let mut process = Process::new(Config::new(), Splitter).unwrap();
    assert!(process.set_input_port_type("in", "depth").unwrap());
    process.configure().unwrap();
    assert_eq!(
        process.output_port_info("copy").unwrap().port_type,
        PortType::concrete("depth")
    );
}

/// One input fanned out to two outputs, all sharing the tag `t`.
struct Tee;

impl ProcessPlugin for Tee {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        let shared = || PortType::flow_dependent("t");
        core.declare_input_port("in", PortInfo::new(shared(), PortFlags::required(), ""))?;
        core.declare_output_port("left", PortInfo::new(shared(), PortFlags::new(), ""))?;
        core.declare_output_port("right", PortInfo::new(shared(), PortFlags::new(), ""))
    }

    fn on_step(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
        Ok(())
    }
}

#[test]
fn test_three_co_tagged_ports_share_one_type() {
    let mut process = Process::new(Config::new(), Tee).unwrap();
    let depth = PortType::concrete("depth");
    let types = |p: &Process| {
        [
            p.input_port_info("in").unwrap().port_type.clone(),
            p.output_port_info("left").unwrap().port_type.clone(),
            p.output_port_info("right").unwrap().port_type.clone(),
        ]
    };

    assert!(process.set_output_port_type("left", "depth").unwrap());
    assert_eq!(types(&process), [depth.clone(), depth.clone(), depth.clone()]);

    assert!(!process.set_input_port_type("in", "rgb").unwrap());
    assert_eq!(types(&process), [depth.clone(), depth.clone(), depth]);
}

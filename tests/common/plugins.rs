//! Small processes used across the integration tests

use flowproc::config::ConfInfo;
use flowproc::pipeline::{
    DataCheck, Datum, PortFlag, PortFlags, PortInfo, PortType, ProcessCore, ProcessPlugin,
    ProcessProperty, ProcessResult, Properties,
};
use flowproc::Config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counter shared with the test after the plugin moves into a `Process`.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Emits `start, start + step, ...` on `number` and completes once the
/// value passes `end`.
#[derive(Default)]
pub struct NumberSource {
    next: Option<i64>,
    pub reconfigured: Counter,
}

impl ProcessPlugin for NumberSource {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        core.declare_output_port(
            "number",
            PortInfo::new("integer", PortFlags::new(), "The generated numbers."),
        )?;
        core.declare_configuration_key("start", ConfInfo::new(0, "First value.", false))?;
        core.declare_configuration_key("end", ConfInfo::new(10, "Last value.", false))?;
        core.declare_configuration_key("step", ConfInfo::new(1, "Increment.", true))
    }

    fn on_init(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        self.next = Some(core.config_value("start")?);
        Ok(())
    }

    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        let end: i64 = core.config_value("end")?;
        let step: i64 = core.config_value("step")?;
        let current = self.next.unwrap_or_default();
        if current > end {
            core.mark_process_as_complete();
            return core.push_datum_to_port("number", Datum::complete());
        }
        self.next = Some(current + step);
        core.push_to_port_as("number", current)
    }

    fn on_reset(&mut self, _core: &mut ProcessCore) -> ProcessResult<()> {
        self.next = None;
        Ok(())
    }

    fn on_reconfigure(&mut self, _core: &mut ProcessCore, _update: &Config) -> ProcessResult<()> {
        self.reconfigured.bump();
        Ok(())
    }

    fn properties(&self) -> Properties {
        [ProcessProperty::NoReentrancy].into_iter().collect()
    }
}

/// Adds the required inputs `a` and `b` into `sum`.
#[derive(Default)]
pub struct Adder {
    pub steps: Counter,
    pub level: Option<DataCheck>,
}

impl ProcessPlugin for Adder {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        if let Some(level) = self.level {
            core.set_data_checking_level(level);
        }
        core.declare_input_port("a", PortInfo::new("integer", PortFlags::required(), "Left."))?;
        core.declare_input_port("b", PortInfo::new("integer", PortFlags::required(), "Right."))?;
        core.declare_output_port("sum", PortInfo::new("integer", PortFlags::new(), "a + b"))
    }

    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        self.steps.bump();
        let a: i64 = core.grab_from_port_as("a")?;
        let b: i64 = core.grab_from_port_as("b")?;
        core.push_to_port_as("sum", a + b)
    }
}

/// Forwards `in` to `out`. Both ports share the flow tag `pass`.
#[derive(Default)]
pub struct Passthrough {
    pub steps: Counter,
}

impl ProcessPlugin for Passthrough {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        core.declare_input_port(
            "in",
            PortInfo::new(PortType::flow_dependent("pass"), PortFlags::required(), "Input."),
        )?;
        core.declare_output_port(
            "out",
            PortInfo::new(PortType::flow_dependent("pass"), PortFlags::new(), "Same as input."),
        )
    }

    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        self.steps.bump();
        let datum = core.grab_datum_from_port("in")?;
        core.push_datum_to_port("out", datum)
    }
}

/// Passthrough variant that only accepts `gray` on its input.
#[derive(Default)]
pub struct GrayOnly;

impl ProcessPlugin for GrayOnly {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        core.declare_input_port(
            "in",
            PortInfo::new(PortType::flow_dependent("px"), PortFlags::required(), "Gray input."),
        )?;
        core.declare_output_port(
            "out",
            PortInfo::new(PortType::flow_dependent("px"), PortFlags::new(), "Gray output."),
        )
    }

    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        let datum = core.grab_datum_from_port("in")?;
        core.push_datum_to_port("out", datum)
    }

    fn on_set_input_port_type(
        &mut self,
        core: &mut ProcessCore,
        port: &str,
        proposed: &PortType,
    ) -> ProcessResult<bool> {
        if *proposed != PortType::concrete("gray") {
            return Ok(false);
        }
        core.resolve_input_port_type(port, proposed)
    }
}

/// Source whose output type comes from the `format` key.
#[derive(Default)]
pub struct FrameReader;

impl ProcessPlugin for FrameReader {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        core.declare_output_port(
            "frame",
            PortInfo::new(PortType::DataDependent, PortFlags::new(), "Decoded frames."),
        )?;
        core.declare_configuration_key("format", ConfInfo::new("rgb", "Pixel format.", false))
    }

    fn on_configure(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        let format: String = core.config_value("format")?;
        if !core.resolve_output_port_type("frame", &PortType::concrete(format.clone()))? {
            return Err(anyhow::anyhow!("cannot produce frames as '{}'", format).into());
        }
        Ok(())
    }

    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        core.push_to_port_as("frame", vec![0u8; 4])
    }
}

/// `y = x + offset`, where `offset` is a static input.
#[derive(Default)]
pub struct Offset;

impl ProcessPlugin for Offset {
    fn on_declare(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        core.declare_input_port("x", PortInfo::new("integer", PortFlags::required(), "Value."))?;
        core.declare_input_port(
            "offset",
            PortInfo::new(
                "integer",
                PortFlags::new().with(PortFlag::InputStatic),
                "Amount to add.",
            ),
        )?;
        core.declare_output_port("y", PortInfo::new("integer", PortFlags::new(), "x + offset"))
    }

    fn on_step(&mut self, core: &mut ProcessCore) -> ProcessResult<()> {
        let x: i64 = core.grab_from_port_as("x")?;
        let offset: i64 = core.grab_input_as("offset")?;
        core.push_to_port_as("y", x + offset)
    }
}

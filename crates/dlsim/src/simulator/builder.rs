use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::Simulator;
use crate::{
    SimulatorError,
    backend::InterpreterBackend,
    debug::{CompilationTrace, CompilationTraceResult, TraceOptions},
    ir::Program,
    parser, syntax,
};

fn compile(
    name: &str,
    code: &str,
    top: &str,
    trace_opts: &TraceOptions,
    trace_out: Option<&mut CompilationTrace>,
) -> Result<Program, SimulatorError> {
    let file = syntax::parse_named(name, code)?;
    log::debug!("parsed {} module(s) from `{}`", file.modules.len(), name);
    let program = parser::build_program(&file, top, trace_opts, trace_out)?;
    log::debug!(
        "scheduled {} logic path(s) over {} instance(s)",
        program.eval_comb.len(),
        program.instance_ids.len()
    );
    Ok(program)
}

/// Build and run options, loadable from the `[simulation]` table of a TOML file.
///
/// ```toml
/// [simulation]
/// require_all_inputs = true
/// vcd = "waves.vcd"
///
/// [simulation.trace]
/// scheduled_comb_blocks = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorOptions {
    /// Fail `run()` while any input has never been written.
    pub require_all_inputs: bool,
    /// Dump every successful run to this VCD file.
    pub vcd: Option<PathBuf>,
    pub trace: TraceOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OptionsFile {
    simulation: SimulatorOptions,
}

impl SimulatorOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, SimulatorError> {
        toml::from_str::<OptionsFile>(text)
            .map(|file| file.simulation)
            .map_err(|err| SimulatorError::Config(err.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimulatorError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// A fluent builder for configuring and initializing a [`Simulator`].
pub struct SimulatorBuilder<'a> {
    code: &'a str,
    top: &'a str,
    name: &'a str,
    options: SimulatorOptions,
}

impl<'a> SimulatorBuilder<'a> {
    pub fn new(code: &'a str, top: &'a str) -> Self {
        Self {
            code,
            top,
            name: "netlist",
            options: SimulatorOptions::default(),
        }
    }

    /// Name shown for the source in diagnostics, usually its file path.
    pub fn source_name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    /// Replace every option at once.
    pub fn options(mut self, options: SimulatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Make `run()` fail while an input has never been set.
    pub fn require_all_inputs(mut self, enable: bool) -> Self {
        self.options.require_all_inputs = enable;
        self
    }

    /// Enable VCD dumping to the specified file.
    pub fn vcd<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.options.vcd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Configure compilation tracing options.
    pub fn trace(mut self, trace: TraceOptions) -> Self {
        self.options.trace = trace;
        self
    }

    pub fn trace_sim_modules(mut self) -> Self {
        self.options.trace.sim_modules = true;
        self
    }

    pub fn trace_flattened_comb_blocks(mut self) -> Self {
        self.options.trace.flattened_comb_blocks = true;
        self
    }

    pub fn trace_scheduled_comb_blocks(mut self) -> Self {
        self.options.trace.scheduled_comb_blocks = true;
        self
    }

    pub fn trace_on_build(mut self) -> Self {
        self.options.trace.output_to_stdout = true;
        self
    }

    fn instantiate(options: &SimulatorOptions, program: Program) -> Result<Simulator, SimulatorError> {
        let backend = InterpreterBackend::new(&program)?;
        let mut sim =
            Simulator::with_backend_and_program(backend, program, options.require_all_inputs)?;
        if let Some(path) = &options.vcd {
            sim.vcd_writer = Some(crate::vcd::VcdWriter::new(path, &sim.program, sim.layout())?);
        }
        Ok(sim)
    }

    /// Compiles the netlist and constructs the simulator.
    pub fn build(self) -> Result<Simulator, SimulatorError> {
        let program = compile(self.name, self.code, self.top, &self.options.trace, None)?;
        Self::instantiate(&self.options, program)
    }

    /// Compiles the netlist and constructs the simulator, while capturing
    /// compilation trace data as configured by [`TraceOptions`].
    pub fn build_with_trace(self) -> CompilationTraceResult {
        let mut trace = CompilationTrace::default();
        let res = compile(
            self.name,
            self.code,
            self.top,
            &self.options.trace,
            Some(&mut trace),
        )
        .and_then(|program| Self::instantiate(&self.options, program));

        if self.options.trace.output_to_stdout {
            trace.print();
        }

        CompilationTraceResult { res, trace }
    }
}

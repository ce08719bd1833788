use serde::Deserialize;

mod output;
pub(crate) use output::{format_paths, format_sim_modules};

/// Which intermediate stages of a build to capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceOptions {
    pub sim_modules: bool,
    pub flattened_comb_blocks: bool,
    pub scheduled_comb_blocks: bool,
    pub output_to_stdout: bool,
}

impl TraceOptions {
    pub fn all() -> Self {
        Self {
            sim_modules: true,
            flattened_comb_blocks: true,
            scheduled_comb_blocks: true,
            output_to_stdout: false,
        }
    }
}

/// Text dumps of the stages selected in [`TraceOptions`].
#[derive(Debug, Clone, Default)]
pub struct CompilationTrace {
    pub sim_modules: Option<String>,
    pub flattened_comb_blocks: Option<String>,
    pub scheduled_comb_blocks: Option<String>,
}

impl CompilationTrace {
    pub fn print(&self) {
        if let Some(modules) = &self.sim_modules {
            println!("=== Lowered modules ===\n{}", modules);
        }
        if let Some(blocks) = &self.flattened_comb_blocks {
            println!("=== Flattened logic paths ===\n{}", blocks);
        }
        if let Some(blocks) = &self.scheduled_comb_blocks {
            println!("=== Scheduled logic paths ===\n{}", blocks);
        }
    }
}

pub struct CompilationTraceResult {
    pub res: Result<crate::simulator::Simulator, crate::simulator::SimulatorError>,
    pub trace: CompilationTrace,
}

impl CompilationTraceResult {
    pub fn expect(self, msg: &str) -> crate::simulator::Simulator {
        match self.res {
            Ok(sim) => sim,
            Err(err) => {
                self.trace.print();
                panic!("{}: {:?}", msg, err);
            }
        }
    }

    pub fn unwrap(self) -> crate::simulator::Simulator {
        match self.res {
            Ok(sim) => sim,
            Err(err) => {
                self.trace.print();
                panic!("{:?}", err);
            }
        }
    }
}

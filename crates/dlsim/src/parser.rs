use crate::{HashMap, flatting};
use miette::Diagnostic;
use thiserror::Error;

use crate::debug::{CompilationTrace, TraceOptions};
use crate::ir::{Program, SimModule};
use crate::parser::module::ModuleParser;
use crate::parser::registry::ModuleRegistry;
use crate::syntax::{Item, SourceFile};

mod expression;
pub mod module;
pub mod registry;
mod scheduler;
pub use scheduler::SchedulerError;
pub(crate) use scheduler::sort;

#[derive(Error, Debug, Diagnostic)]
pub enum ParserError {
    #[error(transparent)]
    #[diagnostic(code(dlsim::scheduler))]
    Scheduler(SchedulerError<String>),

    #[error("unknown module `{name}` instantiated in `{parent}`")]
    #[diagnostic(code(dlsim::unknown_module))]
    UnknownModule { name: String, parent: String },

    #[error("unknown variable `{name}` in module `{module}`")]
    #[diagnostic(code(dlsim::unknown_variable))]
    UnknownVariable { module: String, name: String },

    #[error("module `{module}` has no port `{port}` (instance `{instance}`)")]
    #[diagnostic(code(dlsim::unknown_port))]
    UnknownPort {
        module: String,
        instance: String,
        port: String,
    },

    #[error("`{name}` is declared more than once in `{scope}`")]
    #[diagnostic(code(dlsim::duplicate_name))]
    DuplicateName { scope: String, name: String },

    #[error("recursive instantiation: {chain}")]
    #[diagnostic(
        code(dlsim::recursive_instantiation),
        help("a module may not contain an instance of itself, directly or indirectly")
    )]
    RecursiveInstantiation { chain: String },

    #[error("cannot assign to `{name}` in module `{module}`: {reason}")]
    #[diagnostic(code(dlsim::invalid_assign_target))]
    InvalidAssignTarget {
        module: String,
        name: String,
        reason: String,
    },

    #[error("bit range {range} is out of bounds for `{name}` ({width} bits) in module `{module}`")]
    #[diagnostic(code(dlsim::bit_range))]
    BitRangeOutOfBounds {
        module: String,
        name: String,
        range: String,
        width: usize,
    },

    #[error("invalid connection of port `{port}` on instance `{instance}`: {reason}")]
    #[diagnostic(code(dlsim::port_connection))]
    PortConnection {
        instance: String,
        port: String,
        reason: String,
    },

    #[error("invalid expression in module `{module}`: {reason}")]
    #[diagnostic(code(dlsim::invalid_expression))]
    InvalidExpression { module: String, reason: String },

    #[error("top module `{0}` is not defined")]
    #[diagnostic(
        code(dlsim::missing_top),
        help("the top module must be declared in the netlist source")
    )]
    MissingTop(String),
}

/// Lowers every module reachable from `top`, keyed by module name.
pub fn parse_modules(
    file: &SourceFile,
    top: &str,
) -> Result<HashMap<String, SimModule>, ParserError> {
    let registry = ModuleRegistry::new(file)?;
    let root = registry
        .get(top)
        .ok_or_else(|| ParserError::MissingTop(top.to_string()))?;

    // Worklist of reachable module declarations, deduplicated by name.
    let mut modules: HashMap<String, SimModule> = HashMap::default();
    let mut worklist = vec![root];
    while let Some(decl) = worklist.pop() {
        if modules.contains_key(&decl.name) {
            continue;
        }
        let sim_module = ModuleParser::parse(decl, &registry)?;
        for item in &decl.items {
            if let Item::Inst(inst) = item
                && let Some(child) = registry.get(&inst.module)
                && !modules.contains_key(&child.name)
            {
                worklist.push(child);
            }
        }
        modules.insert(decl.name.clone(), sim_module);
    }
    Ok(modules)
}

/// Runs the whole front half of the pipeline: lowering, flattening, scheduling.
pub(crate) fn build_program(
    file: &SourceFile,
    top: &str,
    trace_opts: &TraceOptions,
    mut trace: Option<&mut CompilationTrace>,
) -> Result<Program, ParserError> {
    let modules = parse_modules(file, top)?;
    log::debug!("lowered {} modules under top `{}`", modules.len(), top);

    if let Some(t) = trace.as_deref_mut()
        && trace_opts.sim_modules
    {
        t.sim_modules = Some(crate::debug::format_sim_modules(&modules));
    }

    flatting::flatten(top, &modules, trace_opts, trace)
}

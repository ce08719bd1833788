use miette::Diagnostic;
use thiserror::Error;

use crate::ir::PortDirection;
use crate::value::ValueError;

#[derive(Error, Debug, Diagnostic)]
pub enum SimulatorError {
    #[error("unknown pin `{0}`")]
    #[diagnostic(code(dlsim::unknown_pin))]
    UnknownPin(String),

    #[error("pin `{pin}` is not an {expected} pin")]
    #[diagnostic(code(dlsim::direction))]
    DirectionMismatch {
        pin: String,
        expected: PortDirection,
    },

    #[error("cannot set pin `{pin}`: {source}")]
    #[diagnostic(code(dlsim::range))]
    Range {
        pin: String,
        #[source]
        source: ValueError,
    },

    #[error("pin `{pin}` is {width} bits wide and cannot be accessed with `{accessor}`")]
    #[diagnostic(code(dlsim::width))]
    WidthMismatch {
        pin: String,
        width: usize,
        accessor: &'static str,
    },

    #[error("outputs are not available before the first run")]
    #[diagnostic(code(dlsim::not_evaluated), help("call `run()` after setting the inputs"))]
    NotEvaluated,

    #[error("input `{0}` was never set")]
    #[diagnostic(
        code(dlsim::unset_input),
        help("set every input before `run()`, or disable `require_all_inputs`")
    )]
    UnsetInput(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] crate::SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    SIRParser(#[from] crate::ParserError),

    #[error("Runtime error: {0}")]
    #[diagnostic(code(dlsim::runtime))]
    Runtime(#[from] crate::RuntimeErrorCode),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(dlsim::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(dlsim::io))]
    Io(#[from] std::io::Error),
}

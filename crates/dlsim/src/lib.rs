//! Combinational circuit simulation.
//!
//! A circuit is written in a small module language, compiled into a scheduled
//! list of logic paths and interpreted over fixed-width bit vectors:
//!
//! ```
//! use dlsim::Simulator;
//!
//! let src = r#"
//!     module Add (a: input logic<8>, b: input logic<8>, sum: output logic<8>) {
//!         assign sum = a + b;
//!     }
//! "#;
//! let mut sim = Simulator::builder(src, "Add").build()?;
//! sim.set_pin_unsigned("a", 200)?;
//! sim.set_pin_unsigned("b", 100)?;
//! sim.run()?;
//! assert_eq!(sim.read_pin_unsigned("sum")?, 44);
//! assert_eq!(sim.read_pin_signed("sum")?, 44);
//! # Ok::<(), dlsim::SimulatorError>(())
//! ```

mod backend;
mod bench;
mod context_width;
mod debug;
mod flatting;
mod ir;
mod logic_tree;
mod parser;
mod simulator;
pub mod syntax;
mod value;
mod vcd;

pub use backend::MemoryLayout;
pub use backend::SimulatorErrorCode as RuntimeErrorCode;
pub use bench::{TestBench, bridge};
pub use debug::{CompilationTrace, CompilationTraceResult, TraceOptions};
pub(crate) use fxhash::FxHashMap as HashMap;
pub(crate) use fxhash::FxHashSet as HashSet;
pub use ir::{AbsoluteAddr, BinaryOp, PinInfo, PinRef, PortDirection, UnaryOp};
pub use num_bigint::{BigInt, BigUint};
pub use parser::ParserError;
pub use parser::SchedulerError;
pub use simulator::Simulator;
pub use simulator::SimulatorBuilder;
pub use simulator::SimulatorError;
pub use simulator::SimulatorOptions;
pub use syntax::SyntaxError;
pub use value::{Bits, ValueError};

mod memory_layout;
mod runtime;

pub use memory_layout::MemoryLayout;
pub use runtime::{InterpreterBackend, SimulatorErrorCode};

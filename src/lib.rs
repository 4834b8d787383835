// Loading
mod loader;
pub use loader::Program;

// Running
mod runtime;
pub use runtime::{RunFlag, RunState, Status, MEMORY_SIZE, REGISTER_COUNT, SP_INIT};
mod alu;
pub use alu::AluOp;
mod stack;
pub mod opcode;
pub use opcode::{Instruction, Opcode};
mod output;
pub use output::{trace_line, Output};

pub mod error;
pub use error::{Access, RuntimeError, RuntimeErrorKind};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;

use std::ops::Range;
use std::{error::Error, fmt, io};

use miette::{miette, LabeledSpan, Report, Severity};

// Runtime errors

/// Fatal error raised while executing an instruction. Always aborts the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeError {
    /// Address of the instruction which failed
    pub pc: u8,
    pub kind: RuntimeErrorKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Byte at PC is not a known opcode.
    UnsupportedOpcode { opcode: u8 },
    /// ALU was asked to perform something other than `ADD`, `MUL` or `CMP`.
    UnsupportedAluOperation { opcode: u8 },
    OutOfBounds(Access),
    /// Output sink rejected a `PRN`.
    Output(io::ErrorKind),
}

/// What an out-of-bounds access tried to reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Memory(usize),
    Register(u8),
    /// Push with SP already at address 0
    StackOverflow,
    /// Pop with nothing on the stack
    StackUnderflow,
}

impl RuntimeErrorKind {
    pub(crate) fn at(self, pc: u8) -> RuntimeError {
        RuntimeError { pc, kind: self }
    }
}

impl From<Access> for RuntimeErrorKind {
    fn from(access: Access) -> Self {
        Self::OutOfBounds(access)
    }
}

impl Error for RuntimeError {}
impl Error for RuntimeErrorKind {}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at address 0x{:02X})", self.kind, self.pc)
    }
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedOpcode { opcode } => {
                write!(f, "Unsupported opcode 0b{:08b}", opcode)
            }
            Self::UnsupportedAluOperation { opcode } => {
                write!(f, "Unsupported ALU operation 0b{:08b}", opcode)
            }
            Self::OutOfBounds(access) => write!(f, "Out of bounds access: {}", access),
            Self::Output(kind) => write!(f, "Failed to write output: {}", kind),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(addr) => write!(f, "memory address 0x{:X}", addr),
            Self::Register(index) => write!(f, "register R{}", index),
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::StackUnderflow => write!(f, "stack underflow"),
        }
    }
}

pub fn runtime_error(err: RuntimeError) -> Report {
    let (code, help) = match err.kind {
        RuntimeErrorKind::UnsupportedOpcode { .. } => (
            "runtime::unsupported_opcode",
            "the program counter reached a byte that is not an instruction",
        ),
        RuntimeErrorKind::UnsupportedAluOperation { .. } => (
            "runtime::unsupported_alu_op",
            "only ADD, MUL and CMP are handled by the ALU",
        ),
        RuntimeErrorKind::OutOfBounds(Access::StackOverflow | Access::StackUnderflow) => (
            "runtime::stack",
            "make sure every PUSH/CALL is matched by exactly one POP/RET",
        ),
        RuntimeErrorKind::OutOfBounds(_) => (
            "runtime::out_of_bounds",
            "registers range from R0 to R7 and memory from 0x00 to 0xFF",
        ),
        RuntimeErrorKind::Output(_) => ("runtime::output", "check that stdout is writable"),
    };
    miette!(
        severity = Severity::Error,
        code = code,
        help = help,
        "Execution aborted: {err}",
    )
}

// Loader errors

pub fn load_bad_literal(span: Range<usize>, src: &str, reason: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::bad_lit",
        help = "each line must hold one binary literal of at most 8 bits, like 10000010",
        labels = vec![LabeledSpan::at(span, reason)],
        "Malformed program line",
    )
    .with_source_code(src.to_string())
}

pub fn load_too_large(span: Range<usize>, src: &str, max: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = format!("the machine only has {max} bytes of memory"),
        labels = vec![LabeledSpan::at(span, "does not fit in memory")],
        "Program is too large",
    )
    .with_source_code(src.to_string())
}

pub fn load_image_too_large(addr: usize, len: usize, max: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::too_large",
        help = format!("the machine only has {max} bytes of memory"),
        "Program of {len} bytes cannot be loaded at address 0x{addr:02X}",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_display() {
        let err = RuntimeErrorKind::UnsupportedOpcode { opcode: 0xFF }.at(0x12);
        assert_eq!(
            err.to_string(),
            "Unsupported opcode 0b11111111 (at address 0x12)"
        );

        let err = RuntimeErrorKind::from(Access::Register(9)).at(0);
        assert_eq!(
            err.to_string(),
            "Out of bounds access: register R9 (at address 0x00)"
        );
    }
}

use std::cell::RefCell;
use std::fmt::Write as _;

use colored::Colorize;

use crate::runtime::{RunState, SP_INIT};

thread_local! {
    static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
}

/// Diagnostic output for the machine. Always goes to stderr, leaving stdout to `PRN`.
pub struct Output;

impl Output {
    pub fn set_minimal(new_value: bool) -> bool {
        IS_MINIMAL.with(|value| value.replace(new_value))
    }

    pub fn is_minimal() -> bool {
        IS_MINIMAL.with(|value| *value.borrow())
    }

    /// Print the state of the machine before the instruction at PC runs.
    pub fn trace(state: &RunState) {
        let line = trace_line(state);
        if Self::is_minimal() {
            eprintln!("{line}");
        } else {
            eprintln!("{}", line.dimmed());
        }
    }

    pub fn print_registers(state: &RunState) {
        if Self::is_minimal() {
            for (i, reg) in state.registers().iter().enumerate() {
                eprintln!("R{} {}", i, reg);
            }
            eprintln!("PC {}", state.pc());
            eprintln!("SP {}", state.sp());
            eprintln!("FL {:?}", state.flag());
            return;
        }

        eprintln!("\x1b[2m┌──────────────────────────┐\x1b[0m");
        eprintln!("\x1b[2m│      \x1b[3mhex  uint   binary\x1b[0m\x1b[2m │\x1b[0m");
        for (i, reg) in state.registers().iter().enumerate() {
            eprintln!(
                "\x1b[2m│\x1b[0m {}  0x{:02x}  {:>4}  {:08b} \x1b[2m│\x1b[0m",
                format!("R{i}").bold(),
                reg,
                reg,
                reg
            );
        }
        eprintln!(
            "\x1b[2m│\x1b[0m {}  0x{:02x}  {}  0x{:02x}     \x1b[2m│\x1b[0m",
            "PC".bold(),
            state.pc(),
            "SP".bold(),
            state.sp()
        );
        eprintln!(
            "\x1b[2m│\x1b[0m {}  {:<19}\x1b[2m│\x1b[0m",
            "FL".bold(),
            format!("{:?}", state.flag())
        );
        eprintln!("\x1b[2m└──────────────────────────┘\x1b[0m");
        if state.sp() != SP_INIT {
            eprintln!(
                "{} {} byte(s) left on the stack",
                "warning:".yellow(),
                SP_INIT - state.sp()
            );
        }
    }
}

/// `TRACE: PC | OP A B | R0 .. R7 | decoded`, all in hex. Bytes past the end of memory show as
/// `--`.
pub fn trace_line(state: &RunState) -> String {
    let pc = state.pc() as usize;
    let mut line = format!("TRACE: {:02X} |", pc);
    for addr in pc..pc + 3 {
        let _ = match state.peek(addr) {
            Some(byte) => write!(line, " {:02X}", byte),
            None => write!(line, " --"),
        };
    }
    line.push_str(" |");
    for reg in state.registers() {
        let _ = write!(line, " {:02X}", reg);
    }
    let _ = match state.fetch() {
        Ok(instr) => write!(line, " | {}", instr),
        Err(_) => write!(line, " | ???"),
    };
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn trace_format() {
        let mut state = RunState::new();
        state.load(0, &[Opcode::LDI as u8, 0, 8]).unwrap();
        state.set_reg(7, 0xAB).unwrap();
        assert_eq!(
            trace_line(&state),
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 AB | LDI R0, 8"
        );
    }

    #[test]
    fn trace_at_end_of_memory() {
        let mut state = RunState::new();
        state.load(0xFF, &[0xFF]).unwrap();
        assert_eq!(
            trace_line(&state),
            "TRACE: FF | FF -- -- | 00 00 00 00 00 00 00 00 | ???"
        );
    }

    #[test]
    fn minimal_flag_round_trip() {
        assert!(!Output::set_minimal(true));
        assert!(Output::is_minimal());
        assert!(Output::set_minimal(false));
    }
}

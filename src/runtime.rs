use std::io::{self, Write};

use miette::Result;

use crate::alu::AluOp;
use crate::error::{self, Access, RuntimeError, RuntimeErrorKind};
use crate::loader::Program;
use crate::opcode::{Instruction, Opcode};
use crate::output::Output;

/// Bytes of addressable memory, shared by program, data and stack.
pub const MEMORY_SIZE: usize = 0x100;
/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;
/// Initial stack pointer. The stack grows down from here towards address 0.
pub const SP_INIT: u8 = 0xF3;

/// Represents complete machine state during runtime.
pub struct RunState {
    /// System memory - 256 bytes
    mem: Box<[u8; MEMORY_SIZE]>,
    /// 8x 8-bit registers
    reg: [u8; REGISTER_COUNT],
    /// Program counter
    pc: u8,
    /// Stack pointer
    pub(crate) sp: u8,
    /// Outcome of the most recent `CMP`
    flag: RunFlag,
    status: Status,
    trace: bool,
}

/// Outcome of the last comparison. Exactly one is held at a time and it is only replaced by
/// another `CMP`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunFlag {
    #[default]
    Unset,
    Equal,
    LessThan,
    GreaterThan,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Running,
    /// Stopped by `HLT`
    Halted,
    /// Stopped by a fatal error
    Aborted,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        self != Status::Running
    }
}

/// What the dispatcher does with PC once a handler is finished. Exactly one per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Move past the instruction and its operands
    Next,
    /// Handler chose the next PC
    Jump(u8),
    Halt,
}

pub type Fault = RuntimeErrorKind;

type Handler = fn(&mut RunState, Instruction, &mut dyn Write) -> Result<Flow, Fault>;

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> RunState {
        RunState {
            mem: Box::new([0; MEMORY_SIZE]),
            reg: [0; REGISTER_COUNT],
            pc: 0,
            sp: SP_INIT,
            flag: RunFlag::Unset,
            status: Status::Running,
            trace: false,
        }
    }

    // Not generic because of miette error
    pub fn try_from(program: &Program) -> Result<RunState> {
        let mut state = RunState::new();
        state.load(program.orig(), program.bytes())?;
        Ok(state)
    }

    /// Copy an image into memory at `orig` and point PC at its first byte.
    pub fn load(&mut self, orig: u8, image: &[u8]) -> Result<()> {
        let start = orig as usize;
        if start + image.len() > MEMORY_SIZE {
            return Err(error::load_image_too_large(start, image.len(), MEMORY_SIZE));
        }
        self.mem[start..start + image.len()].copy_from_slice(image);
        self.pc = orig;
        Ok(())
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn pc(&self) -> u8 {
        self.pc
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn flag(&self) -> RunFlag {
        self.flag
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.reg
    }

    pub fn reg(&self, index: u8) -> Result<u8, Fault> {
        self.reg
            .get(index as usize)
            .copied()
            .ok_or(Access::Register(index).into())
    }

    pub fn set_reg(&mut self, index: u8, value: u8) -> Result<(), Fault> {
        let slot = self
            .reg
            .get_mut(index as usize)
            .ok_or(Access::Register(index))?;
        *slot = value;
        Ok(())
    }

    pub fn ram_read(&self, addr: usize) -> Result<u8, Fault> {
        self.mem
            .get(addr)
            .copied()
            .ok_or(Access::Memory(addr).into())
    }

    pub fn ram_write(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        let cell = self.mem.get_mut(addr).ok_or(Access::Memory(addr))?;
        *cell = value;
        Ok(())
    }

    /// Read memory without failing. Used for display only.
    pub fn peek(&self, addr: usize) -> Option<u8> {
        self.mem.get(addr).copied()
    }

    /// Decode the instruction at PC.
    ///
    /// Operand slots the opcode does not use are left as zero, so an instruction in the last bytes
    /// of memory only fails if it actually needs an operand past the end.
    pub fn fetch(&self) -> Result<Instruction, Fault> {
        let pc = self.pc as usize;
        let byte = self.ram_read(pc)?;
        let opcode =
            Opcode::try_from(byte).map_err(|()| Fault::UnsupportedOpcode { opcode: byte })?;

        let mut operands = [0; 2];
        for (i, operand) in operands
            .iter_mut()
            .take(opcode.operand_count() as usize)
            .enumerate()
        {
            *operand = self.ram_read(pc + 1 + i)?;
        }

        Ok(Instruction {
            opcode,
            operand_a: operands[0],
            operand_b: operands[1],
        })
    }

    /// Run until `HLT` or a fatal error.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), RuntimeError> {
        while self.status == Status::Running {
            self.step(out)?;
        }
        Ok(())
    }

    /// Execute a single instruction. Does nothing once the machine has stopped.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Status, RuntimeError> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }
        if self.trace {
            Output::trace(self);
        }

        let pc = self.pc;
        match self.cycle(out) {
            Ok(()) => Ok(self.status),
            Err(fault) => {
                self.status = Status::Aborted;
                Err(fault.at(pc))
            }
        }
    }

    fn cycle(&mut self, out: &mut dyn Write) -> Result<(), Fault> {
        let instr = self.fetch()?;
        let flow = Self::handler(instr.opcode)(self, instr, out)?;
        match flow {
            Flow::Next => {
                let next = self.pc as usize + instr.opcode.width() as usize;
                // Falling off the end of memory is never a valid fetch
                self.pc = u8::try_from(next).map_err(|_| Access::Memory(next))?;
            }
            Flow::Jump(addr) => self.pc = addr,
            Flow::Halt => self.status = Status::Halted,
        }
        Ok(())
    }

    /// Dispatch table. Operand count lives alongside in [`Opcode::operand_count`].
    fn handler(opcode: Opcode) -> Handler {
        match opcode {
            Opcode::HLT => Self::hlt,
            Opcode::RET => Self::ret,
            Opcode::IRET => Self::iret,
            Opcode::PUSH => Self::push,
            Opcode::POP => Self::pop,
            Opcode::PRN => Self::prn,
            Opcode::CALL => Self::call,
            Opcode::JMP => Self::jmp,
            Opcode::JEQ => Self::jeq,
            Opcode::JNE => Self::jne,
            Opcode::LDI => Self::ldi,
            Opcode::ADD | Opcode::MUL | Opcode::CMP => Self::alu_instr,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: RunFlag) {
        self.flag = flag;
    }

    fn hlt(&mut self, _instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        Ok(Flow::Halt)
    }

    fn iret(&mut self, _instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        // No interrupts exist to return from
        Ok(Flow::Next)
    }

    fn ldi(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        self.set_reg(instr.operand_a, instr.operand_b)?;
        Ok(Flow::Next)
    }

    fn prn(&mut self, instr: Instruction, out: &mut dyn Write) -> Result<Flow, Fault> {
        let val = self.reg(instr.operand_a)?;
        writeln!(out, "{val}").map_err(|e: io::Error| Fault::Output(e.kind()))?;
        Ok(Flow::Next)
    }

    fn alu_instr(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        let op = AluOp::try_from(instr.opcode)?;
        self.alu(op, instr.operand_a, instr.operand_b)?;
        Ok(Flow::Next)
    }

    fn jmp(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        self.branch(instr, true)
    }

    fn jeq(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        self.branch(instr, self.flag == RunFlag::Equal)
    }

    fn jne(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        self.branch(instr, self.flag != RunFlag::Equal)
    }

    /// All jumps take their target from the register named by the first operand.
    fn branch(&mut self, instr: Instruction, taken: bool) -> Result<Flow, Fault> {
        let target = self.reg(instr.operand_a)?;
        if taken {
            Ok(Flow::Jump(target))
        } else {
            Ok(Flow::Next)
        }
    }
}

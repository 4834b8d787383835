//! Stack and subroutine instructions.
//!
//! The stack lives in main memory, growing down from [`SP_INIT`] towards address 0. Nothing
//! stops it from growing into the program image; keeping the two apart is up to the program.
//! Likewise every `CALL` must be matched by exactly one `RET` - the machine does not track
//! frames, it only refuses to pop past the bottom of the stack.

use std::io::Write;

use crate::error::Access;
use crate::opcode::Instruction;
use crate::runtime::{Fault, Flow, RunState, SP_INIT};

impl RunState {
    pub(crate) fn push(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        let val = self.reg(instr.operand_a)?;
        self.push_val(val)?;
        Ok(Flow::Next)
    }

    pub(crate) fn pop(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        // Check the destination first so a bad register leaves the stack untouched
        self.reg(instr.operand_a)?;
        let val = self.pop_val()?;
        self.set_reg(instr.operand_a, val)?;
        Ok(Flow::Next)
    }

    pub(crate) fn call(&mut self, instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        let target = self.reg(instr.operand_a)?;
        // Return to the instruction right after `CALL` and its operand
        let return_addr = self.pc() as usize + instr.opcode.width() as usize;
        let return_addr = u8::try_from(return_addr).map_err(|_| Access::Memory(return_addr))?;
        self.push_val(return_addr)?;
        Ok(Flow::Jump(target))
    }

    pub(crate) fn ret(&mut self, _instr: Instruction, _out: &mut dyn Write) -> Result<Flow, Fault> {
        let return_addr = self.pop_val()?;
        Ok(Flow::Jump(return_addr))
    }

    fn push_val(&mut self, val: u8) -> Result<(), Fault> {
        // Decrement stack
        self.sp = self.sp.checked_sub(1).ok_or(Access::StackOverflow)?;
        // Save onto stack
        self.ram_write(self.sp as usize, val)
    }

    fn pop_val(&mut self) -> Result<u8, Fault> {
        if self.sp >= SP_INIT {
            return Err(Access::StackUnderflow.into());
        }
        let val = self.ram_read(self.sp as usize)?;
        self.sp += 1;
        Ok(val)
    }
}

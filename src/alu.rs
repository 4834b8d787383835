use std::cmp::Ordering;

use crate::opcode::Opcode;
use crate::runtime::{Fault, RunFlag, RunState};

/// Operations carried out by the arithmetic/logic unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Mul,
    Cmp,
}

impl TryFrom<Opcode> for AluOp {
    type Error = Fault;

    fn try_from(opcode: Opcode) -> Result<Self, Self::Error> {
        match opcode {
            Opcode::ADD => Ok(AluOp::Add),
            Opcode::MUL => Ok(AluOp::Mul),
            Opcode::CMP => Ok(AluOp::Cmp),
            _ => Err(Fault::UnsupportedAluOperation {
                opcode: opcode as u8,
            }),
        }
    }
}

impl RunState {
    /// Apply `op` to registers `reg_a` and `reg_b`. Arithmetic writes back into `reg_a` and wraps
    /// at 8 bits; `CMP` only replaces the flag.
    pub fn alu(&mut self, op: AluOp, reg_a: u8, reg_b: u8) -> Result<(), Fault> {
        let a = self.reg(reg_a)?;
        let b = self.reg(reg_b)?;
        match op {
            AluOp::Add => self.set_reg(reg_a, a.wrapping_add(b))?,
            AluOp::Mul => self.set_reg(reg_a, a.wrapping_mul(b))?,
            AluOp::Cmp => self.set_flag(match a.cmp(&b) {
                Ordering::Equal => RunFlag::Equal,
                Ordering::Less => RunFlag::LessThan,
                Ordering::Greater => RunFlag::GreaterThan,
            }),
        }
        Ok(())
    }
}

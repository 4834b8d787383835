use std::fmt;

/// Every instruction understood by the machine.
///
/// The discriminant is the byte the instruction is encoded as. The upper bits of that byte happen
/// to encode the operand count and ALU class, but the machine never derives anything from them;
/// see [`Opcode::operand_count`] and [`Opcode::is_alu`].
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    /// Stop the machine
    HLT = 0b0000_0001,
    /// Pop return address into PC
    RET = 0b0001_0001,
    /// Return from interrupt. Recognised, does nothing
    IRET = 0b0001_0011,
    /// Push register onto the stack
    PUSH = 0b0100_0101,
    /// Pop top of stack into register
    POP = 0b0100_0110,
    /// Print register as decimal
    PRN = 0b0100_0111,
    /// Push return address and jump to address held in register
    CALL = 0b0101_0000,
    /// Jump to address held in register
    JMP = 0b0101_0100,
    /// Jump if last compare was equal
    JEQ = 0b0101_0101,
    /// Jump if last compare was not equal
    JNE = 0b0101_0110,
    /// Load immediate byte into register
    LDI = 0b1000_0010,
    ADD = 0b1010_0000,
    MUL = 0b1010_0010,
    CMP = 0b1010_0111,
}

impl Opcode {
    pub const ALL: [Opcode; 14] = [
        Opcode::HLT,
        Opcode::RET,
        Opcode::IRET,
        Opcode::PUSH,
        Opcode::POP,
        Opcode::PRN,
        Opcode::CALL,
        Opcode::JMP,
        Opcode::JEQ,
        Opcode::JNE,
        Opcode::LDI,
        Opcode::ADD,
        Opcode::MUL,
        Opcode::CMP,
    ];

    /// Number of operand bytes following the opcode byte.
    pub const fn operand_count(self) -> u8 {
        match self {
            Opcode::HLT | Opcode::RET | Opcode::IRET => 0,
            Opcode::PUSH
            | Opcode::POP
            | Opcode::PRN
            | Opcode::CALL
            | Opcode::JMP
            | Opcode::JEQ
            | Opcode::JNE => 1,
            Opcode::LDI | Opcode::ADD | Opcode::MUL | Opcode::CMP => 2,
        }
    }

    /// Total encoded width, opcode byte included.
    pub const fn width(self) -> u8 {
        1 + self.operand_count()
    }

    /// Whether the instruction is carried out by the ALU.
    pub const fn is_alu(self) -> bool {
        matches!(self, Opcode::ADD | Opcode::MUL | Opcode::CMP)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::HLT => "HLT",
            Opcode::RET => "RET",
            Opcode::IRET => "IRET",
            Opcode::PUSH => "PUSH",
            Opcode::POP => "POP",
            Opcode::PRN => "PRN",
            Opcode::CALL => "CALL",
            Opcode::JMP => "JMP",
            Opcode::JEQ => "JEQ",
            Opcode::JNE => "JNE",
            Opcode::LDI => "LDI",
            Opcode::ADD => "ADD",
            Opcode::MUL => "MUL",
            Opcode::CMP => "CMP",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .into_iter()
            .find(|opcode| *opcode as u8 == byte)
            .ok_or(())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single decoded instruction. Only lives for one cycle of the run loop.
///
/// Both operand slots are always present; instructions taking fewer operands ignore the rest.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand_a: u8,
    pub operand_b: u8,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::LDI => write!(f, "LDI R{}, {}", self.operand_a, self.operand_b),
            op if op.operand_count() == 2 => {
                write!(f, "{} R{}, R{}", op, self.operand_a, self.operand_b)
            }
            op if op.operand_count() == 1 => write!(f, "{} R{}", op, self.operand_a),
            op => write!(f, "{}", op),
        }
    }
}

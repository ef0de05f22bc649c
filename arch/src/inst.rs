use std::fmt;

use color_print::cformat;
use serde::{Deserialize, Serialize};

use crate::{format::Format, op::Opcode, reg::Reg};

/// Mnemonic of a statement, looked up once when the statement is built.
///
/// Names missing from the opcode table are kept so the assembler can report
/// them at the statement's location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mnemonic {
    Known(Opcode),
    Unknown(String),
}

impl From<&str> for Mnemonic {
    fn from(s: &str) -> Self {
        match Opcode::parse(s) {
            Some(op) => Mnemonic::Known(op),
            None => Mnemonic::Unknown(s.to_string()),
        }
    }
}

impl From<String> for Mnemonic {
    fn from(s: String) -> Self {
        match Opcode::parse(&s) {
            Some(op) => Mnemonic::Known(op),
            None => Mnemonic::Unknown(s),
        }
    }
}

impl From<Opcode> for Mnemonic {
    fn from(op: Opcode) -> Self {
        Mnemonic::Known(op)
    }
}

impl From<Mnemonic> for String {
    fn from(m: Mnemonic) -> Self {
        m.to_string()
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mnemonic::Known(op) => f.write_str(op.mnemonic()),
            Mnemonic::Unknown(s) => f.write_str(s),
        }
    }
}

// ----------------------------------------------------------------------------
// Operands

/// Decoded operands, one variant per instruction format.
///
/// Registers are register numbers. Constants have been checked to fit an
/// `i32` by the parser but not against the per-format bit budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operands {
    Empty,
    Addr(String),
    Reg(u8),
    RegConst(u8, i32),
    RegAddr(u8, String),
    RegReg(u8, u8),
    RegRegConst(u8, u8, i32),
    RegRegAddr(u8, u8, String),
    Const(i32),
    RegRegReg(u8, u8, u8),
}

impl Operands {
    pub fn format(&self) -> Format {
        match self {
            Operands::Empty => Format::Op,
            Operands::Addr(_) => Format::Addr,
            Operands::Reg(_) => Format::Reg,
            Operands::RegConst(..) => Format::RegConst,
            Operands::RegAddr(..) => Format::RegAddr,
            Operands::RegReg(..) => Format::RegReg,
            Operands::RegRegConst(..) => Format::RegRegConst,
            Operands::RegRegAddr(..) => Format::RegRegAddr,
            Operands::Const(_) => Format::Const,
            Operands::RegRegReg(..) => Format::RegRegReg,
        }
    }

    /// Symbolic address operand, if the shape has one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Operands::Addr(s) | Operands::RegAddr(_, s) | Operands::RegRegAddr(_, _, s) => Some(s),
            _ => None,
        }
    }

    /// Immediate operand, if the shape has one.
    pub fn constant(&self) -> Option<i32> {
        match self {
            Operands::RegConst(_, c) | Operands::RegRegConst(_, _, c) | Operands::Const(c) => {
                Some(*c)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = Reg::name;
        match self {
            Operands::Empty => Ok(()),
            Operands::Addr(a) => write!(f, "{a}"),
            Operands::Reg(r1) => write!(f, "{}", r(*r1)),
            Operands::RegConst(r1, c) => write!(f, "{},{c}", r(*r1)),
            Operands::RegAddr(r1, a) => write!(f, "{},{a}", r(*r1)),
            Operands::RegReg(r1, r2) => write!(f, "{},{}", r(*r1), r(*r2)),
            Operands::RegRegConst(r1, r2, c) => write!(f, "{},{c}({})", r(*r1), r(*r2)),
            Operands::RegRegAddr(r1, r2, a) => write!(f, "{},{},{a}", r(*r1), r(*r2)),
            Operands::Const(c) => write!(f, "{c}"),
            Operands::RegRegReg(r1, r2, r3) => write!(f, "{},{},{}", r(*r1), r(*r2), r(*r3)),
        }
    }
}

// ----------------------------------------------------------------------------
// Instruction

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Mnemonic,
    pub operands: Operands,
}

impl Instruction {
    pub fn new(op: impl Into<Mnemonic>, operands: Operands) -> Self {
        Instruction {
            op: op.into(),
            operands,
        }
    }

    pub fn format(&self) -> Format {
        self.operands.format()
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self.op {
            Mnemonic::Known(op) => Some(op),
            Mnemonic::Unknown(_) => None,
        }
    }

    pub fn cformat(&self) -> String {
        match self.op {
            Mnemonic::Known(op) if op.is_directive() => {
                cformat!("<c>{:<8}</><b>{}</>", op.mnemonic(), self.operands)
            }
            Mnemonic::Known(op) => cformat!("<r>{:<8}</><b>{}</>", op.mnemonic(), self.operands),
            Mnemonic::Unknown(ref s) => cformat!("<r,u>{:<8}</><b>{}</>", s, self.operands),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operands {
            Operands::Empty => write!(f, "{}", self.op),
            _ => write!(f, "{} {}", self.op, self.operands),
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};
use xpvm_arch::{Instruction, Operands};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

// ----------------------------------------------------------------------------
// Statement

/// One source line as handed over by the parser: a label, an instruction or
/// directive, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instr: Option<Instruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
}

impl Statement {
    pub fn new(label: Option<&str>, instr: Option<Instruction>) -> Self {
        Statement {
            label: label.map(str::to_string),
            instr,
            loc: None,
        }
    }

    /// Label-only line.
    pub fn label(name: &str) -> Self {
        Statement::new(Some(name), None)
    }

    pub fn op(op: &str, operands: Operands) -> Self {
        Statement::new(None, Some(Instruction::new(op, operands)))
    }

    pub fn labeled(name: &str, op: &str, operands: Operands) -> Self {
        Statement::new(Some(name), Some(Instruction::new(op, operands)))
    }

    pub fn at(mut self, file: &str, line: usize) -> Self {
        self.loc = Some(Location {
            file: file.to_string(),
            line,
        });
        self
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.label, &self.instr) {
            (Some(label), Some(instr)) => write!(f, "{label}: {instr}"),
            (Some(label), None) => write!(f, "{label}:"),
            (None, Some(instr)) => write!(f, "    {instr}"),
            (None, None) => Ok(()),
        }
    }
}

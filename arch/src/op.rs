use std::fmt;

use bimap::BiMap;
use once_cell::sync::Lazy;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::format::Format;

/// Encoding byte reserved for directives, which emit no machine opcode.
pub const DIRECTIVE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
    Halt,
    Load,
    Store,
    Ldimm,
    Ldaddr,
    Ldind,
    Stind,
    Addf,
    Subf,
    Divf,
    Mulf,
    Addi,
    Subi,
    Divi,
    Muli,
    Call,
    Ret,
    Blt,
    Bgt,
    Beq,
    Jmp,
    Cmpxchg,
    Getpid,
    Getpn,
    Push,
    Pop,
    Ldblkid,
    Throw,
    And,
    Or,
    Xor,

    // Directives
    Word,
    Alloc,
    Import,
    Export,
}

static OP_STR: Lazy<BiMap<&'static str, Opcode>> = Lazy::new(|| {
    let mut map = BiMap::new();
    for op in Opcode::iter() {
        map.insert(op.into(), op);
    }
    map
});

static OP_BIN: Lazy<BiMap<Opcode, u8>> = Lazy::new(|| {
    let mut map = BiMap::new();
    map.insert(Opcode::Halt, 0x00);
    map.insert(Opcode::Load, 0x01);
    map.insert(Opcode::Store, 0x02);
    map.insert(Opcode::Ldimm, 0x03);
    map.insert(Opcode::Ldaddr, 0x04);
    map.insert(Opcode::Ldind, 0x05);
    map.insert(Opcode::Stind, 0x06);
    map.insert(Opcode::Addf, 0x07);
    map.insert(Opcode::Subf, 0x08);
    map.insert(Opcode::Divf, 0x09);
    map.insert(Opcode::Mulf, 0x0A);
    map.insert(Opcode::Addi, 0x0B);
    map.insert(Opcode::Subi, 0x0C);
    map.insert(Opcode::Divi, 0x0D);
    map.insert(Opcode::Muli, 0x0E);
    map.insert(Opcode::Call, 0x0F);
    map.insert(Opcode::Ret, 0x10);
    map.insert(Opcode::Blt, 0x11);
    map.insert(Opcode::Bgt, 0x12);
    map.insert(Opcode::Beq, 0x13);
    map.insert(Opcode::Jmp, 0x14);
    map.insert(Opcode::Cmpxchg, 0x15);
    map.insert(Opcode::Getpid, 0x16);
    map.insert(Opcode::Getpn, 0x17);
    map.insert(Opcode::Push, 0x18);
    map.insert(Opcode::Pop, 0x19);
    map.insert(Opcode::Ldblkid, 0x1A);
    map.insert(Opcode::Throw, 0x1B);
    map.insert(Opcode::And, 0x1C);
    map.insert(Opcode::Or, 0x1D);
    map.insert(Opcode::Xor, 0x1E);
    map
});

impl Opcode {
    pub fn parse(s: &str) -> Option<Opcode> {
        OP_STR.get_by_left(s).copied()
    }

    pub fn mnemonic(self) -> &'static str {
        self.into()
    }

    /// Operand shape the source statement must have.
    pub fn format(self) -> Format {
        use Opcode::*;
        match self {
            Halt | Ret => Format::Op,
            Call | Jmp | Import | Export => Format::Addr,
            Getpid | Getpn | Push | Pop | Throw => Format::Reg,
            Ldimm => Format::RegConst,
            Load | Store | Ldaddr | Ldblkid => Format::RegAddr,
            Addf | Subf | Divf | Mulf | Addi | Subi | Divi | Muli => Format::RegReg,
            Ldind | Stind => Format::RegRegConst,
            Blt | Bgt | Beq | Cmpxchg => Format::RegRegAddr,
            Word | Alloc => Format::Const,
            And | Or | Xor => Format::RegRegReg,
        }
    }

    /// Shape of the emitted word. `ldblkid` names a block in the source but
    /// is encoded with the block index as a register+constant word.
    pub fn encoded_format(self) -> Format {
        match self {
            Opcode::Ldblkid => Format::RegConst,
            op => op.format(),
        }
    }

    /// Machine encoding, `None` for directives.
    pub fn encoding(self) -> Option<u8> {
        OP_BIN.get_by_left(&self).copied()
    }

    pub fn is_directive(self) -> bool {
        matches!(
            self,
            Opcode::Word | Opcode::Alloc | Opcode::Import | Opcode::Export
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Format a mnemonic's operands must have, or `None` if it is unknown.
pub fn verify_opcode(name: &str) -> Option<Format> {
    Opcode::parse(name).map(Opcode::format)
}

/// Encoding byte of a mnemonic; directives yield [`DIRECTIVE`].
pub fn encoding_of(name: &str) -> Option<u8> {
    Opcode::parse(name).map(|op| op.encoding().unwrap_or(DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_opcode {
        ($($name:ident: $mnemonic:expr => $format:expr, $enc:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(verify_opcode($mnemonic), Some($format));
                    assert_eq!(encoding_of($mnemonic), Some($enc));
                }
            )*
        }
    }

    test_opcode! {
        test_halt: "halt" => Format::Op, 0x00,
        test_load: "load" => Format::RegAddr, 0x01,
        test_ldimm: "ldimm" => Format::RegConst, 0x03,
        test_ldind: "ldind" => Format::RegRegConst, 0x05,
        test_addf: "addf" => Format::RegReg, 0x07,
        test_call: "call" => Format::Addr, 0x0F,
        test_blt: "blt" => Format::RegRegAddr, 0x11,
        test_push: "push" => Format::Reg, 0x18,
        test_ldblkid: "ldblkid" => Format::RegAddr, 0x1A,
        test_xor: "xor" => Format::RegRegReg, 0x1E,
        test_word: "word" => Format::Const, DIRECTIVE,
        test_alloc: "alloc" => Format::Const, DIRECTIVE,
        test_import: "import" => Format::Addr, DIRECTIVE,
        test_export: "export" => Format::Addr, DIRECTIVE,
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(verify_opcode("hcf"), None);
        assert_eq!(encoding_of("hcf"), None);
        // mnemonics are case-sensitive
        assert_eq!(Opcode::parse("HALT"), None);
    }

    #[test]
    fn every_instruction_has_unique_encoding() {
        for op in Opcode::iter() {
            match op.encoding() {
                Some(byte) => {
                    assert_ne!(byte, DIRECTIVE);
                    assert_eq!(OP_BIN.get_by_right(&byte), Some(&op));
                }
                None => assert!(op.is_directive(), "{op} has no encoding"),
            }
            assert_eq!(Opcode::parse(op.mnemonic()), Some(op));
        }
    }

    #[test]
    fn ldblkid_is_rewritten() {
        assert_eq!(Opcode::Ldblkid.format(), Format::RegAddr);
        assert_eq!(Opcode::Ldblkid.encoded_format(), Format::RegConst);
        assert_eq!(Opcode::Load.encoded_format(), Format::RegAddr);
    }
}

use crate::format::Format;

/// Operand fields of one instruction with every symbol already resolved.
///
/// Addresses are PC-relative word offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fields {
    Op,
    Addr(i32),
    Reg(u8),
    RegConst(u8, i32),
    RegAddr(u8, i32),
    RegReg(u8, u8),
    RegRegConst(u8, u8, i32),
    RegRegAddr(u8, u8, i32),
    RegRegReg(u8, u8, u8),
}

impl Fields {
    pub fn format(&self) -> Format {
        match self {
            Fields::Op => Format::Op,
            Fields::Addr(_) => Format::Addr,
            Fields::Reg(_) => Format::Reg,
            Fields::RegConst(..) => Format::RegConst,
            Fields::RegAddr(..) => Format::RegAddr,
            Fields::RegReg(..) => Format::RegReg,
            Fields::RegRegConst(..) => Format::RegRegConst,
            Fields::RegRegAddr(..) => Format::RegRegAddr,
            Fields::RegRegReg(..) => Format::RegRegReg,
        }
    }
}

fn high(opcode: u8, r1: u8, r2: u8, low: u8) -> u32 {
    ((opcode as u32) << 24) | ((r1 as u32) << 16) | ((r2 as u32) << 8) | (low as u32)
}

fn addr20(addr: i32) -> u32 {
    ((addr as u32) & 0xF_FFFF) << 12
}

/// Pack one instruction word.
///
/// Fields wider than their slot are truncated; range checks happen before
/// encoding.
pub fn encode(opcode: u8, fields: Fields) -> u32 {
    match fields {
        Fields::Op => opcode as u32,
        Fields::Addr(addr) => addr20(addr) | opcode as u32,
        Fields::Reg(reg) => high(opcode, reg, 0, 0),
        Fields::RegConst(reg, c) => high(opcode, reg, 0, 0) | ((c as u32) & 0xFFFF),
        Fields::RegAddr(reg, addr) => {
            addr20(addr) | (((reg as u32) & 0xF) << 8) | opcode as u32
        }
        Fields::RegReg(r1, r2) => high(opcode, r1, r2, 0),
        Fields::RegRegConst(r1, r2, c) => high(opcode, r1, r2, c as u8),
        // reg2 (15..8) and the 16-bit address (15..0) overlap and are OR-ed
        Fields::RegRegAddr(r1, r2, addr) => high(opcode, r1, r2, 0) | ((addr as u32) & 0xFFFF),
        Fields::RegRegReg(r1, r2, r3) => high(opcode, r1, r2, r3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_word {
        ($($name:ident: $opcode:expr, $fields:expr => $expect:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let bin = encode($opcode, $fields);
                    assert_eq!(bin, $expect, "{:?} -> {:08X}", $fields, bin);
                }
            )*
        }
    }

    test_word! {
        test_op: 0x10, Fields::Op => 0x0000_0010,
        test_addr: 0x14, Fields::Addr(2) => 0x0000_2014,
        test_addr_negative: 0x14, Fields::Addr(-1) => 0xFFFF_F014,
        test_reg: 0x18, Fields::Reg(5) => 0x1805_0000,
        test_reg_const: 0x03, Fields::RegConst(1, 0x1234) => 0x0301_1234,
        test_reg_const_negative: 0x03, Fields::RegConst(1, -2) => 0x0301_FFFE,
        test_reg_addr: 0x01, Fields::RegAddr(3, 5) => 0x0000_5301,
        test_reg_addr_negative: 0x01, Fields::RegAddr(15, -3) => 0xFFFF_DF01,
        test_reg_reg: 0x07, Fields::RegReg(1, 2) => 0x0701_0200,
        test_reg_reg_const: 0x05, Fields::RegRegConst(1, 14, -8) => 0x0501_0EF8,
        test_reg_reg_reg: 0x1C, Fields::RegRegReg(1, 2, 3) => 0x1C01_0203,
    }

    #[test]
    fn reg_reg_addr_overlaps_reg2() {
        // address 0 leaves reg2 visible
        assert_eq!(encode(0x13, Fields::RegRegAddr(1, 2, 0)), 0x1301_0200);
        // small address only touches the low byte
        assert_eq!(encode(0x13, Fields::RegRegAddr(1, 2, 4)), 0x1301_0204);
        // a backward branch sets every bit of the low half, hiding reg2
        assert_eq!(encode(0x13, Fields::RegRegAddr(1, 2, -1)), 0x1301_FFFF);
        // high address bits are OR-ed into reg2
        assert_eq!(encode(0x13, Fields::RegRegAddr(1, 2, 0x0100)), 0x1301_0300);
    }

    #[test]
    fn fields_report_their_format() {
        assert_eq!(Fields::RegRegAddr(0, 0, 0).format(), Format::RegRegAddr);
        assert_eq!(Fields::Op.format(), Format::Op);
    }
}

use num_enum::IntoPrimitive;
use strum::{Display, EnumIter};

/// Operand shape of an xpvm instruction.
///
/// The discriminant is the format number used by the object file
/// documentation and by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, Display, EnumIter)]
#[repr(u8)]
pub enum Format {
    #[strum(serialize = "opcode-only")]
    Op = 1,
    #[strum(serialize = "symbol-addr")]
    Addr = 2,
    #[strum(serialize = "single-register")]
    Reg = 3,
    #[strum(serialize = "register+constant")]
    RegConst = 4,
    #[strum(serialize = "register+symbol-addr")]
    RegAddr = 5,
    #[strum(serialize = "two-register")]
    RegReg = 6,
    #[strum(serialize = "two-register+const8")]
    RegRegConst = 7,
    #[strum(serialize = "two-register+symbol-addr")]
    RegRegAddr = 8,
    #[strum(serialize = "word/alloc-constant")]
    Const = 9,
    #[strum(serialize = "three-register")]
    RegRegReg = 10,
}

impl Format {
    /// Width of the PC-relative address field, for formats that carry one.
    pub fn addr_bits(self) -> Option<u8> {
        match self {
            Format::Addr | Format::RegAddr => Some(20),
            Format::RegRegAddr => Some(16),
            _ => None,
        }
    }

    /// Width of the immediate field, for formats that carry one.
    ///
    /// `Const` is the word/alloc directive shape: its value only has to fit
    /// an `i32`, which the parser already guarantees.
    pub fn const_bits(self) -> Option<u8> {
        match self {
            Format::RegConst => Some(16),
            Format::RegRegConst => Some(8),
            _ => None,
        }
    }
}

/// True iff `value` sign-extends losslessly from its low `n` bits.
pub fn fits_in_bits(value: i32, n: u8) -> bool {
    match n {
        0 => value == 0,
        32..=u8::MAX => true,
        _ => {
            let shift = 32 - u32::from(n);
            (value << shift) >> shift == value
        }
    }
}

/// Word offset from the instruction after `reference` to `defined`.
///
/// The referencing instruction's own word has already been counted when the
/// operand is evaluated, so the effective PC is `reference + 1`.
pub fn pc_relative(defined: u32, reference: u32) -> i32 {
    defined.wrapping_sub(reference.wrapping_add(1)) as i32
}

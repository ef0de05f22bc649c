/// Register numbers as handed over by the parser.
///
/// `sp`, `fp` and `pc` arrive already converted to 13, 14 and 15.
pub struct Reg;

impl Reg {
    pub const SP: u8 = 13;
    pub const FP: u8 = 14;
    pub const PC: u8 = 15;

    pub fn name(reg: u8) -> String {
        match reg {
            Reg::SP => "sp".to_string(),
            Reg::FP => "fp".to_string(),
            Reg::PC => "pc".to_string(),
            _ => format!("r{reg}"),
        }
    }
}

#[test]
fn test_reg_names() {
    assert_eq!(Reg::name(3), "r3");
    assert_eq!(Reg::name(13), "sp");
    assert_eq!(Reg::name(14), "fp");
    assert_eq!(Reg::name(15), "pc");
}

//! AMD64 (x86_64) register numbering, as used in `CV_REG_*` fields.

use super::register_set;

register_set! {
    /// Identifies an AMD64 register.
    pub enum Amd64Reg;

    NONE = 0,

    AL = 1,
    CL = 2,
    DL = 3,
    BL = 4,
    AH = 5,
    CH = 6,
    DH = 7,
    BH = 8,
    AX = 9,
    CX = 10,
    DX = 11,
    BX = 12,
    SP = 13,
    BP = 14,
    SI = 15,
    DI = 16,

    EAX = 17,
    ECX = 18,
    EDX = 19,
    EBX = 20,
    ESP = 21,
    EBP = 22,
    ESI = 23,
    EDI = 24,

    ES = 25,
    CS = 26,
    SS = 27,
    DS = 28,
    FS = 29,
    GS = 30,

    EFLAGS = 34,

    ST0 = 128,
    ST1 = 129,
    ST2 = 130,
    ST3 = 131,
    ST4 = 132,
    ST5 = 133,
    ST6 = 134,
    ST7 = 135,

    XMM0 = 154,
    XMM1 = 155,
    XMM2 = 156,
    XMM3 = 157,
    XMM4 = 158,
    XMM5 = 159,
    XMM6 = 160,
    XMM7 = 161,

    MM0 = 146,
    MM1 = 147,
    MM2 = 148,
    MM3 = 149,
    MM4 = 150,
    MM5 = 151,
    MM6 = 152,
    MM7 = 153,

    RAX = 328,
    RBX = 329,
    RCX = 330,
    RDX = 331,
    RSI = 332,
    RDI = 333,
    RBP = 334,
    RSP = 335,
    R8 = 336,
    R9 = 337,
    R10 = 338,
    R11 = 339,
    R12 = 340,
    R13 = 341,
    R14 = 342,
    R15 = 343,
    RIP = 344,

    R8B = 345,
    R9B = 346,
    R10B = 347,
    R11B = 348,
    R12B = 349,
    R13B = 350,
    R14B = 351,
    R15B = 352,

    R8W = 353,
    R9W = 354,
    R10W = 355,
    R11W = 356,
    R12W = 357,
    R13W = 358,
    R14W = 359,
    R15W = 360,

    R8D = 361,
    R9D = 362,
    R10D = 363,
    R11D = 364,
    R12D = 365,
    R13D = 366,
    R14D = 367,
    R15D = 368,

    XMM8 = 369,
    XMM9 = 370,
    XMM10 = 371,
    XMM11 = 372,
    XMM12 = 373,
    XMM13 = 374,
    XMM14 = 375,
    XMM15 = 376,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        assert_eq!(Amd64Reg::RBP.get_name(), Some("RBP"));
        assert_eq!(Amd64Reg::from_name("RSP"), Some(Amd64Reg::RSP));
        assert_eq!(Amd64Reg(0xffff).get_name(), None);
    }
}

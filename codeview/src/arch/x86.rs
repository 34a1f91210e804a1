//! x86 register numbering, as used in `CV_REG_*` fields (frame-relative locals, `S_DEFRANGE_REGISTER`,
//! thread-local storage access, etc.)

use super::register_set;

register_set! {
    /// Identifies an x86 register.
    pub enum X86Reg;

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

    IP = 31,
    FLAGS = 32,
    EIP = 33,
    EFLAGS = 34,

    CR0 = 80,
    CR1 = 81,
    CR2 = 82,
    CR3 = 83,
    CR4 = 84,

    DR0 = 90,
    DR1 = 91,
    DR2 = 92,
    DR3 = 93,
    DR4 = 94,
    DR5 = 95,
    DR6 = 96,
    DR7 = 97,

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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        assert_eq!(X86Reg::EBP.get_name(), Some("EBP"));
        assert_eq!(X86Reg::from_name("ESP"), Some(X86Reg::ESP));
        assert_eq!(X86Reg(0xffff).get_name(), None);
    }
}

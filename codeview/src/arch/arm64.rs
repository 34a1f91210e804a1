//! ARM64 register numbering, as used in `CV_REG_*` fields. Covers ARM64, ARM64EC, and ARM64X.

use super::register_set;

register_set! {
    /// Identifies an ARM64 register.
    pub enum Arm64Reg;

    NONE = 0,

    X0 = 10,
    X1 = 11,
    X2 = 12,
    X3 = 13,
    X4 = 14,
    X5 = 15,
    X6 = 16,
    X7 = 17,
    X8 = 18,
    X9 = 19,
    X10 = 20,
    X11 = 21,
    X12 = 22,
    X13 = 23,
    X14 = 24,
    X15 = 25,
    X16 = 26,
    X17 = 27,
    X18 = 28,
    X19 = 29,
    X20 = 30,
    X21 = 31,
    X22 = 32,
    X23 = 33,
    X24 = 34,
    X25 = 35,
    X26 = 36,
    X27 = 37,
    X28 = 38,

    FP = 39,
    LR = 40,
    SP = 41,
    ZR = 42,
    PC = 43,

    V0 = 50,
    V1 = 51,
    V2 = 52,
    V3 = 53,
    V4 = 54,
    V5 = 55,
    V6 = 56,
    V7 = 57,
    V8 = 58,
    V9 = 59,
    V10 = 60,
    V11 = 61,
    V12 = 62,
    V13 = 63,
    V14 = 64,
    V15 = 65,
    V16 = 66,
    V17 = 67,
    V18 = 68,
    V19 = 69,
    V20 = 70,
    V21 = 71,
    V22 = 72,
    V23 = 73,
    V24 = 74,
    V25 = 75,
    V26 = 76,
    V27 = 77,
    V28 = 78,
    V29 = 79,
    V30 = 80,
    V31 = 81,

    NZCV = 90,
    FPSR = 91,
    FPCR = 92,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        assert_eq!(Arm64Reg::FP.get_name(), Some("FP"));
        assert_eq!(Arm64Reg::from_name("SP"), Some(Arm64Reg::SP));
        assert_eq!(Arm64Reg(0xffff).get_name(), None);
    }
}

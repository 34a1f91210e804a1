//! Decodes "numeric leaves": the variable-width integer (and, rarely, floating-point or string)
//! encoding used for sizes, offsets, and enumerator values embedded inline in type records.
//!
//! A numeric leaf begins with a `u16` tag. If the tag is `< 0x8000` it *is* the value (an
//! unsigned integer in `0..0x8000`). Otherwise the tag selects one of the `LF_CHAR` .. `LF_REAL16`
//! leaf kinds (see [`crate::types::Leaf`]), which determines the width and signedness of the
//! value that follows.

use crate::parser::{Parse, Parser, ParserError};
use crate::types::Leaf;
use std::fmt;

/// A decoded numeric leaf.
///
/// Most numeric leaves encountered in practice are small unsigned integers (array lengths, field
/// offsets, enumerator values); the [`Self::Bytes`] variant exists so that floating-point,
/// 128-bit, and decimal encodings can still be represented (and re-encoded losslessly) without
/// every caller having to handle them specially.
#[derive(Copy, Clone, Debug)]
pub enum Number<'a> {
    /// A signed value that fits in an `i64` (covers `LF_CHAR`, `LF_SHORT`, `LF_LONG`,
    /// `LF_QUADWORD`, and the `< 0x8000` immediate form).
    Signed(i64),
    /// An unsigned value that fits in a `u64` (covers `LF_USHORT`, `LF_ULONG`,
    /// `LF_UQUADWORD`, and the `< 0x8000` immediate form).
    Unsigned(u64),
    /// A 128-bit signed value (`LF_OCTWORD`).
    Signed128(i128),
    /// A 128-bit unsigned value (`LF_UOCTWORD`).
    Unsigned128(u128),
    /// Any other numeric-leaf encoding (floating point, decimal, date, UTF-8 string, or an
    /// unrecognized tag), kept as the raw bytes that followed the tag.
    Bytes(Leaf, &'a [u8]),
}

impl<'a> Number<'a> {
    /// Returns the value as an unsigned 64-bit integer, if it fits. Negative signed values do
    /// not "fit" and return `None`.
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Self::Signed(v) => u64::try_from(v).ok(),
            Self::Unsigned(v) => Some(v),
            Self::Signed128(v) => u64::try_from(v).ok(),
            Self::Unsigned128(v) => u64::try_from(v).ok(),
            Self::Bytes(..) => None,
        }
    }

    /// Returns the value as `usize`, if it fits. This is the common case for sizes and counts.
    pub fn as_usize(self) -> Option<usize> {
        self.as_u64().and_then(|v| usize::try_from(v).ok())
    }

    /// Returns the value as a signed 64-bit integer, if it fits.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Signed(v) => Some(v),
            Self::Unsigned(v) => i64::try_from(v).ok(),
            Self::Signed128(v) => i64::try_from(v).ok(),
            Self::Unsigned128(v) => i64::try_from(v).ok(),
            Self::Bytes(..) => None,
        }
    }
}

impl<'a> fmt::Display for Number<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed128(v) => write!(f, "{v}"),
            Self::Unsigned128(v) => write!(f, "{v}"),
            Self::Bytes(kind, bytes) => write!(f, "<{kind:?}: {} bytes>", bytes.len()),
        }
    }
}

impl<'a> Parse<'a> for Number<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let tag = p.u16()?;
        let leaf = Leaf(tag);
        if leaf.is_immediate_numeric() {
            return Ok(Self::Unsigned(tag as u64));
        }

        Ok(match leaf {
            Leaf::LF_CHAR => Self::Signed(p.i8()? as i64),
            Leaf::LF_SHORT => Self::Signed(p.i16()? as i64),
            Leaf::LF_USHORT => Self::Unsigned(p.u16()? as u64),
            Leaf::LF_LONG => Self::Signed(p.i32()? as i64),
            Leaf::LF_ULONG => Self::Unsigned(p.u32()? as u64),
            Leaf::LF_QUADWORD => Self::Signed(p.i64()?),
            Leaf::LF_UQUADWORD => Self::Unsigned(p.u64()?),
            Leaf::LF_OCTWORD => Self::Signed128(p.i128()?),
            Leaf::LF_UOCTWORD => Self::Unsigned128(p.u128()?),
            Leaf::LF_REAL32 => Self::Bytes(leaf, p.bytes(4)?),
            Leaf::LF_REAL64 => Self::Bytes(leaf, p.bytes(8)?),
            Leaf::LF_REAL80 => Self::Bytes(leaf, p.bytes(10)?),
            Leaf::LF_REAL128 => Self::Bytes(leaf, p.bytes(16)?),
            Leaf::LF_REAL48 => Self::Bytes(leaf, p.bytes(6)?),
            Leaf::LF_REAL16 => Self::Bytes(leaf, p.bytes(2)?),
            Leaf::LF_COMPLEX32 => Self::Bytes(leaf, p.bytes(8)?),
            Leaf::LF_COMPLEX64 => Self::Bytes(leaf, p.bytes(16)?),
            Leaf::LF_COMPLEX80 => Self::Bytes(leaf, p.bytes(20)?),
            Leaf::LF_COMPLEX128 => Self::Bytes(leaf, p.bytes(32)?),
            Leaf::LF_DECIMAL => Self::Bytes(leaf, p.bytes(14)?),
            Leaf::LF_DATE => Self::Bytes(leaf, p.bytes(8)?),
            Leaf::LF_UTF8STRING => Self::Bytes(leaf, p.strz()?.as_ref()),
            Leaf::LF_VARSTRING => {
                let len = p.u16()? as usize;
                Self::Bytes(leaf, p.bytes(len)?)
            }
            _ => return Err(ParserError::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate() {
        let bytes = [0x34, 0x12];
        let n: Number = Parser::new(&bytes).parse().unwrap();
        assert_eq!(n.as_u64(), Some(0x1234));
    }

    #[test]
    fn test_ulong() {
        let bytes = [0x04, 0x80, 0x78, 0x56, 0x34, 0x12];
        let n: Number = Parser::new(&bytes).parse().unwrap();
        assert_eq!(n.as_u64(), Some(0x1234_5678));
    }

    #[test]
    fn test_quadword_negative() {
        let bytes = [0x09, 0x80, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let n: Number = Parser::new(&bytes).parse().unwrap();
        assert_eq!(n.as_i64(), Some(-1));
    }
}

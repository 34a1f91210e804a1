//! Code for iterating through symbol streams.

use super::{Sym, SymKind};
use crate::parser::{Parser, ParserMut};
use crate::utils::iter::HasRestLen;
use std::mem::take;

/// Parses a symbol record stream and iterates [`Sym`] values.
#[derive(Clone)]
pub struct SymIter<'a> {
    buffer: &'a [u8],
}

impl<'a> SymIter<'a> {
    /// Starts a new iterator.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Returns the data that has not yet been parsed.
    pub fn rest(&self) -> &'a [u8] {
        self.buffer
    }
}

impl<'a> HasRestLen for SymIter<'a> {
    fn rest_len(&self) -> usize {
        self.buffer.len()
    }
}

impl<'a> Iterator for SymIter<'a> {
    type Item = Sym<'a>;

    /// Finds the next symbol record.
    ///
    /// Like [`crate::types::iter::TypesIter`], this makes the guarantee that if it cannot decode
    /// the next record, it does not modify `self.buffer`, so that the caller can recover the
    /// exact bytes of an unparseable tail.
    fn next(&mut self) -> Option<Sym<'a>> {
        if self.buffer.is_empty() {
            return None;
        }

        let mut p = Parser::new(self.buffer);

        let record_len = p.u16().ok()?;
        if record_len < 2 {
            return None;
        }

        let kind = p.u16().ok()?;

        let Ok(data) = p.bytes(record_len as usize - 2) else {
            return None;
        };

        self.buffer = p.into_rest();

        Some(Sym {
            kind: SymKind(kind),
            data,
        })
    }
}

/// Parses a symbol record stream and iterates mutable symbol records.
pub struct SymIterMut<'a> {
    buffer: &'a mut [u8],
}

impl<'a> SymIterMut<'a> {
    /// Starts a new iterator.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }
}

impl<'a> HasRestLen for SymIterMut<'a> {
    fn rest_len(&self) -> usize {
        self.buffer.len()
    }
}

/// A mutable view of one symbol record.
pub struct SymMut<'a> {
    /// The kind of the symbol.
    pub kind: SymKind,
    /// The contents of the record, excluding `len` and `kind`.
    pub data: &'a mut [u8],
}

impl<'a> Iterator for SymIterMut<'a> {
    type Item = SymMut<'a>;

    fn next(&mut self) -> Option<SymMut<'a>> {
        if self.buffer.is_empty() {
            return None;
        }

        let mut p = ParserMut::new(take(&mut self.buffer));

        let record_len = p.u16().ok()?;
        if record_len < 2 {
            return None;
        }

        let kind = p.u16().ok()?;

        let Ok(data) = p.bytes_mut(record_len as usize - 2) else {
            return None;
        };

        self.buffer = p.into_rest();

        Some(SymMut {
            kind: SymKind(kind),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sym_iter() {
        #[rustfmt::skip]
        let data = &[
            2, 0, 6, 0, // len=2, S_END
            4, 0, 6, 0, 0xaa, 0xbb, // len=4, S_END, 2 extra bytes
        ];

        let mut i = SymIter::new(data);

        let s0 = i.next().unwrap();
        assert_eq!(s0.kind, SymKind::S_END);
        assert!(s0.data.is_empty());

        let s1 = i.next().unwrap();
        assert_eq!(s1.kind, SymKind::S_END);
        assert_eq!(s1.data, &[0xaa, 0xbb]);

        assert!(i.next().is_none());
    }

    #[test]
    fn test_truncated_record_does_not_advance() {
        let data = &[5, 0, 6, 0];
        let mut i = SymIter::new(data);
        assert!(i.next().is_none());
        assert_eq!(i.rest(), data);
    }
}

//! Decodes the contents of `LF_FIELDLIST` records.
//!
//! Unlike most type records, `LF_FIELDLIST` has no record-level framing of its own: it is a bare
//! sequence of member sub-records (`LF_MEMBER`, `LF_ONEMETHOD`, `LF_ENUMERATE`, ...), each with
//! its own two-byte `LF_*` discriminant, packed back to back and padded out to a 4-byte boundary
//! with `LF_PAD0`..`LF_PAD15` bytes (any byte `>= 0xf0`; the low nibble is the number of
//! additional padding bytes that follow it).

use crate::parser::{Parser, ParserError};
use crate::types::{Leaf, MemberAttributes, Number, TypeIndex};
use bstr::BStr;

/// One decoded member of an `LF_FIELDLIST` record.
#[derive(Clone, Debug)]
pub enum FieldListItem<'a> {
    /// `LF_BCLASS`: a direct, non-virtual base class.
    BaseClass {
        /// Access/method-property bits (only `access()` is meaningful here).
        attr: MemberAttributes,
        /// The base class's type.
        base_type: TypeIndex,
        /// Offset of the base class subobject within the derived class.
        offset: Number<'a>,
    },
    /// `LF_VBCLASS` / `LF_IVBCLASS`: a virtual (or indirect virtual) base class.
    VirtualBaseClass {
        /// `true` for `LF_IVBCLASS` (indirect virtual base).
        indirect: bool,
        /// Access/method-property bits.
        attr: MemberAttributes,
        /// The virtual base class's type.
        base_type: TypeIndex,
        /// Type of the virtual base pointer.
        vbptr_type: TypeIndex,
        /// Offset of the virtual base pointer from the address point of the class.
        vbpoff: Number<'a>,
        /// Offset of the base within the virtual base table.
        vbind: Number<'a>,
    },
    /// `LF_ENUMERATE`: one enumerator of an `LF_ENUM`.
    Enumerate {
        /// Access bits.
        attr: MemberAttributes,
        /// The enumerator's value.
        value: Number<'a>,
        /// The enumerator's name.
        name: &'a BStr,
    },
    /// `LF_MEMBER`: a non-static data member.
    Member {
        /// Access bits.
        attr: MemberAttributes,
        /// The member's type.
        ty: TypeIndex,
        /// Byte offset of the member within the containing type.
        offset: Number<'a>,
        /// The member's name.
        name: &'a BStr,
    },
    /// `LF_STMEMBER`: a static data member.
    StaticMember {
        /// Access bits.
        attr: MemberAttributes,
        /// The member's type.
        ty: TypeIndex,
        /// The member's name.
        name: &'a BStr,
    },
    /// `LF_METHOD`: one or more overloads of a method, sharing a name.
    Method {
        /// Number of overloads; see `LF_METHODLIST` at `method_list`.
        count: u16,
        /// The `LF_METHODLIST` record describing each overload.
        method_list: TypeIndex,
        /// The method's name.
        name: &'a BStr,
    },
    /// `LF_ONEMETHOD`: a single (non-overloaded) method.
    OneMethod {
        /// Access/method-property bits.
        attr: MemberAttributes,
        /// The method's type (an `LF_MFUNCTION`).
        ty: TypeIndex,
        /// Vtable slot offset; present only when `attr.is_introducing_virtual()`.
        vtable_offset: Option<u32>,
        /// The method's name.
        name: &'a BStr,
    },
    /// `LF_NESTEDTYPE` / `LF_NESTEDTYPEEX`: a nested type name.
    NestedType {
        /// Access bits; always zero for plain `LF_NESTEDTYPE`.
        attr: MemberAttributes,
        /// The nested type.
        ty: TypeIndex,
        /// The nested type's name.
        name: &'a BStr,
    },
    /// `LF_VFUNCTAB`: declares that this class has a virtual function table of the given type at
    /// offset 0.
    VirtualFunctionTablePointer {
        /// The vtable's type (usually an `LF_VTSHAPE`, accessed through a pointer).
        ty: TypeIndex,
    },
    /// `LF_VFUNCOFF`: like `LF_VFUNCTAB`, but the vtable pointer is not at offset 0.
    VirtualFunctionTableOffset {
        /// The vtable's type.
        ty: TypeIndex,
        /// Byte offset of the vtable pointer within the class.
        offset: u32,
    },
    /// `LF_FRIENDCLS`: declares a friend class.
    FriendClass {
        /// The friend class's type.
        ty: TypeIndex,
    },
    /// `LF_FRIENDFCN`: declares a friend function.
    FriendFunction {
        /// The friend function's type.
        ty: TypeIndex,
        /// The friend function's name.
        name: &'a BStr,
    },
    /// `LF_INDEX`: continues this field list in another `LF_FIELDLIST` record, used when the
    /// member list is too large to fit a single record.
    Index {
        /// The type index of the continuation `LF_FIELDLIST` record.
        continuation: TypeIndex,
    },
}

/// Iterates the member sub-records of an `LF_FIELDLIST` record's contents.
///
/// Unlike [`crate::types::iter::TypesIter`], there is no enclosing `len`/`kind` framing per item;
/// each item's length is implied by its own fields. An unrecognized sub-record kind cannot be
/// skipped (its length is unknown), so it ends iteration; everything decoded up to that point
/// remains valid.
#[derive(Clone)]
pub struct FieldListIter<'a> {
    buffer: &'a [u8],
    /// Set once an unrecognized sub-record kind or a parse failure is encountered.
    stopped: bool,
}

impl<'a> FieldListIter<'a> {
    /// Starts a new iterator over the contents of an `LF_FIELDLIST` record (the bytes after the
    /// record's own `len`/`kind` header).
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            stopped: false,
        }
    }

    /// Returns the data that has not yet been parsed. If iteration stopped early because of an
    /// unrecognized sub-record kind, this is the tail starting at that sub-record's own `LF_*`
    /// discriminant.
    pub fn rest(&self) -> &'a [u8] {
        self.buffer
    }

    fn skip_padding(&mut self) {
        let mut n = 0;
        while n < self.buffer.len() && self.buffer[n] >= 0xf0 {
            n += 1;
        }
        self.buffer = &self.buffer[n..];
    }

    fn parse_one(&mut self) -> Result<FieldListItem<'a>, ParserError> {
        let mut p = Parser::new(self.buffer);
        let kind = Leaf(p.u16()?);

        let item = match kind {
            Leaf::LF_BCLASS => {
                let attr = MemberAttributes(p.u16()?);
                let base_type = p.type_index()?;
                let offset = p.number()?;
                FieldListItem::BaseClass {
                    attr,
                    base_type,
                    offset,
                }
            }

            Leaf::LF_VBCLASS | Leaf::LF_IVBCLASS => {
                let attr = MemberAttributes(p.u16()?);
                let base_type = p.type_index()?;
                let vbptr_type = p.type_index()?;
                let vbpoff = p.number()?;
                let vbind = p.number()?;
                FieldListItem::VirtualBaseClass {
                    indirect: kind == Leaf::LF_IVBCLASS,
                    attr,
                    base_type,
                    vbptr_type,
                    vbpoff,
                    vbind,
                }
            }

            Leaf::LF_ENUMERATE => {
                let attr = MemberAttributes(p.u16()?);
                let value = p.number()?;
                let name = p.strz()?;
                FieldListItem::Enumerate { attr, value, name }
            }

            Leaf::LF_MEMBER => {
                let attr = MemberAttributes(p.u16()?);
                let ty = p.type_index()?;
                let offset = p.number()?;
                let name = p.strz()?;
                FieldListItem::Member {
                    attr,
                    ty,
                    offset,
                    name,
                }
            }

            Leaf::LF_STMEMBER => {
                let attr = MemberAttributes(p.u16()?);
                let ty = p.type_index()?;
                let name = p.strz()?;
                FieldListItem::StaticMember { attr, ty, name }
            }

            Leaf::LF_METHOD => {
                let count = p.u16()?;
                let method_list = p.type_index()?;
                let name = p.strz()?;
                FieldListItem::Method {
                    count,
                    method_list,
                    name,
                }
            }

            Leaf::LF_ONEMETHOD => {
                let attr = MemberAttributes(p.u16()?);
                let ty = p.type_index()?;
                let vtable_offset = if attr.is_introducing_virtual() {
                    Some(p.u32()?)
                } else {
                    None
                };
                let name = p.strz()?;
                FieldListItem::OneMethod {
                    attr,
                    ty,
                    vtable_offset,
                    name,
                }
            }

            Leaf::LF_NESTEDTYPE => {
                p.skip(2)?; // padding
                let ty = p.type_index()?;
                let name = p.strz()?;
                FieldListItem::NestedType {
                    attr: MemberAttributes(0),
                    ty,
                    name,
                }
            }

            Leaf::LF_NESTEDTYPEEX => {
                let attr = MemberAttributes(p.u16()?);
                let ty = p.type_index()?;
                let name = p.strz()?;
                FieldListItem::NestedType { attr, ty, name }
            }

            Leaf::LF_VFUNCTAB => {
                p.skip(2)?; // padding
                let ty = p.type_index()?;
                FieldListItem::VirtualFunctionTablePointer { ty }
            }

            Leaf::LF_VFUNCOFF => {
                p.skip(2)?; // padding
                let ty = p.type_index()?;
                let offset = p.u32()?;
                FieldListItem::VirtualFunctionTableOffset { ty, offset }
            }

            Leaf::LF_FRIENDCLS => {
                p.skip(2)?; // padding
                let ty = p.type_index()?;
                FieldListItem::FriendClass { ty }
            }

            Leaf::LF_FRIENDFCN => {
                p.skip(2)?; // padding
                let ty = p.type_index()?;
                let name = p.strz()?;
                FieldListItem::FriendFunction { ty, name }
            }

            Leaf::LF_INDEX => {
                p.skip(2)?; // padding
                let continuation = p.type_index()?;
                FieldListItem::Index { continuation }
            }

            _ => return Err(ParserError::new()),
        };

        self.buffer = p.into_rest();
        Ok(item)
    }
}

impl<'a> Iterator for FieldListIter<'a> {
    type Item = FieldListItem<'a>;

    fn next(&mut self) -> Option<FieldListItem<'a>> {
        if self.stopped {
            return None;
        }

        self.skip_padding();
        if self.buffer.is_empty() {
            return None;
        }

        match self.parse_one() {
            Ok(item) => Some(item),
            Err(_) => {
                self.stopped = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_member_and_enumerate() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // LF_MEMBER: attr=3 (public), type=0x1020, offset=4 (immediate), name="x\0"
            0x05, 0x14, // LF_MEMBER = 0x1405
            0x03, 0x00,
            0x20, 0x10, 0x00, 0x00,
            0x04, 0x00,
            b'x', 0,
            0xf1, // a stray LF_PAD1 byte between members, which must be skipped
            // LF_ENUMERATE: attr=3, value=5 (immediate), name="Red\0"
            0x02, 0x15, // LF_ENUMERATE = 0x1502
            0x03, 0x00,
            0x05, 0x00,
            b'R', b'e', b'd', 0,
        ];

        let mut it = FieldListIter::new(data);

        match it.next().unwrap() {
            FieldListItem::Member {
                attr,
                ty,
                offset,
                name,
            } => {
                assert_eq!(attr.access(), 3);
                assert_eq!(ty, TypeIndex(0x1020));
                assert_eq!(offset.as_u64(), Some(4));
                assert_eq!(name, "x");
            }
            other => panic!("unexpected item: {other:?}"),
        }

        match it.next().unwrap() {
            FieldListItem::Enumerate { value, name, .. } => {
                assert_eq!(value.as_u64(), Some(5));
                assert_eq!(name, "Red");
            }
            other => panic!("unexpected item: {other:?}"),
        }

        assert!(it.next().is_none());
    }

    #[test]
    fn stops_at_unrecognized_kind_without_panicking() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x02, 0x15, // LF_ENUMERATE
            0x00, 0x00,
            0x01, 0x00,
            b'A', 0,
            0xff, 0xff, // every byte here is >= 0xf0, so this is consumed as padding, not as an
                        // unrecognized sub-record
        ];
        let mut it = FieldListIter::new(data);
        assert!(it.next().is_some());
        // 0xffff is >= 0xf0 in its low byte so it is consumed as padding, leaving nothing.
        assert!(it.next().is_none());
    }

    #[test]
    fn one_method_introducing_virtual_has_vtable_offset() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x0b, 0x14, // LF_ONEMETHOD = 0x140b
            (4 << 2), 0x00, // access=0; method_property=IntroducingVirtual(4)
            0x30, 0x10, 0x00, 0x00, // type index
            0x08, 0x00, 0x00, 0x00, // vtable offset
            b'f', 0,
        ];
        let mut it = FieldListIter::new(data);
        match it.next().unwrap() {
            FieldListItem::OneMethod {
                attr,
                vtable_offset,
                name,
                ..
            } => {
                assert!(attr.is_introducing_virtual());
                assert_eq!(vtable_offset, Some(8));
                assert_eq!(name, "f");
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }
}

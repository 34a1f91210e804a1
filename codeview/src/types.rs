//! Decodes type records. Reads type streams (`.debug$T` sections, or the TPI/IPI streams of a
//! PDB).
//!
//! # References
//!
//! * [`cvinfo.h`](https://github.com/microsoft/microsoft-pdb/blob/805655a28bd8198004be2ac27e6e0290121a5e89/include/cvinfo.h)
//! * [CodeView Type Records](https://llvm.org/docs/PDB/CodeViewTypes.html)

pub mod fieldlist;
pub mod iter;
pub mod number;
pub mod primitive;

#[doc(inline)]
pub use number::Number;

use crate::parser::{Parse, Parser, ParserError};
use bstr::BStr;
use std::fmt::Debug;
use zerocopy::byteorder::{LE, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Identifies a type record, either a builtin (`< 0x1000`) or a record within a type stream.
///
/// Builtin type indices describe a small, fixed vocabulary of primitive C/C++ types (see
/// [`primitive`]). All other type indices name the `i`-th record of a type stream, where
/// `i = value - 0x1000`; there is no other indirection.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct TypeIndex(pub u32);

impl TypeIndex {
    /// The first type index assigned to a record within a type stream. Indices below this value
    /// name a builtin type; see [`primitive::PRIMITIVES`].
    pub const FIRST_NONPRIMITIVE: u32 = 0x1000;

    /// `true` if this type index names a builtin (primitive) type.
    pub fn is_primitive(self) -> bool {
        self.0 < Self::FIRST_NONPRIMITIVE
    }

    /// If this is not a builtin type index, returns the zero-based slot within the type stream
    /// that defines it.
    pub fn stream_index(self) -> Option<usize> {
        if self.is_primitive() {
            None
        } else {
            Some((self.0 - Self::FIRST_NONPRIMITIVE) as usize)
        }
    }
}

impl Debug for TypeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_primitive() {
            primitive::dump_primitive_type_index(f, *self)
        } else {
            write!(f, "0x{:04x}", self.0)
        }
    }
}

/// Little-endian on-disk form of [`TypeIndex`].
pub type TypeIndexLe = U32<LE>;

/// Identifies a record in the IPI (ID) stream. Distinct from [`TypeIndex`] only by convention;
/// the two streams share the same record framing and numbering scheme.
pub type ItemId = u32;

/// Little-endian on-disk form of [`ItemId`].
pub type ItemIdLe = U32<LE>;

macro_rules! cv_leaf {
    (
        $( #[$a:meta] )*
        $v:vis struct $ty_name:ident;
        $( $(#[$ca:meta])* $name:ident = $value:expr, )*
    ) => {
        $( #[$a] )*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        $v struct $ty_name(pub u16);

        #[allow(missing_docs, non_upper_case_globals)]
        impl $ty_name {
            $(
                $(#[$ca])*
                pub const $name: $ty_name = $ty_name($value);
            )*

            const NAMES: &'static [(u16, &'static str)] = &[
                $( ($value, stringify!($name)), )*
            ];

            /// Looks up the name of a leaf kind, if it is recognized.
            pub fn name(self) -> Option<&'static str> {
                // NAMES is declared in ascending numeric order above, which matches declaration
                // order; binary_search requires a sorted slice, so we search linearly instead
                // since leaf kinds are not declared in strictly increasing numeric order here.
                Self::NAMES.iter().find(|&&(v, _)| v == self.0).map(|&(_, n)| n)
            }
        }

        impl core::fmt::Debug for $ty_name {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match self.name() {
                    Some(s) => f.write_str(s),
                    None => write!(f, "LF_??(0x{:04x})", self.0),
                }
            }
        }
    }
}

cv_leaf! {
    /// Identifies the kind of a type record (`LF_*`), or of a numeric-leaf tag embedded inline in
    /// a record.
    pub struct Leaf;

    /// `VTSHAPE` - virtual function table shape.
    LF_VTSHAPE = 0x000a,
    /// Marks the end of an argument list.
    LF_LABEL = 0x000e,
    /// An explicit "no type".
    LF_NULL = 0x000f,
    /// Precompiled-types end marker.
    LF_ENDPRECOMP = 0x0014,

    /// Internal padding placeholder used by `LF_SKIP`.
    LF_SKIP = 0x1200,
    /// List of argument type indices, used by `LF_PROCEDURE`/`LF_MFUNCTION`.
    LF_ARGLIST = 0x1201,
    /// Unordered set of class/struct/union/enum members.
    LF_FIELDLIST = 0x1203,
    /// List of base classes (legacy, rarely emitted by modern compilers).
    LF_DERIVED = 0x1204,
    /// A bitfield member's base type, width, and bit position.
    LF_BITFIELD = 0x1205,
    /// List of overloads for `LF_METHOD`.
    LF_METHODLIST = 0x1206,
    LF_DIMCONU = 0x1207,
    LF_DIMCONLU = 0x1208,
    LF_DIMVARU = 0x1209,
    LF_DIMVARLU = 0x120a,

    /// A direct, non-virtual base class.
    LF_BCLASS = 0x1400,
    /// A virtual base class.
    LF_VBCLASS = 0x1401,
    /// An indirect virtual base class.
    LF_IVBCLASS = 0x1402,
    LF_FRIENDFCN = 0x1403,
    /// A continuation link to another `LF_FIELDLIST` record.
    LF_INDEX = 0x1404,
    /// An enumerator (name + value) within an `LF_ENUM`'s field list.
    LF_ENUMERATE = 0x1502,
    /// A non-static data member.
    LF_MEMBER = 0x1405,
    /// A static data member.
    LF_STMEMBER = 0x1406,
    /// An overload set for a method name.
    LF_METHOD = 0x1407,
    /// A nested type name.
    LF_NESTEDTYPE = 0x1408,
    /// The virtual function table pointer.
    LF_VFUNCTAB = 0x1409,
    LF_FRIENDCLS = 0x140a,
    /// A single method (possibly virtual).
    LF_ONEMETHOD = 0x140b,
    /// A virtual function table entry with an explicit offset.
    LF_VFUNCOFF = 0x140c,
    LF_NESTEDTYPEEX = 0x140d,
    LF_MEMBERMODIFY = 0x140e,
    LF_MANAGED = 0x140f,

    LF_ALIAS = 0x150a,
    /// Precompiled-types start marker.
    LF_PRECOMP = 0x1509,
    /// An array type.
    LF_ARRAY = 0x1503,
    /// A `class` type.
    LF_CLASS = 0x1504,
    /// A `struct` type.
    LF_STRUCTURE = 0x1505,
    /// A `union` type.
    LF_UNION = 0x1506,
    /// An `enum` type.
    LF_ENUM = 0x1507,
    /// A `TypeServer2` record, used for `/Zi` precompiled-type sharing.
    LF_TYPESERVER2 = 0x1515,
    /// A COM interface type.
    LF_INTERFACE = 0x1519,
    LF_BINTERFACE = 0x151a,
    /// The virtual function table type itself (distinct from `LF_VTSHAPE`).
    LF_VFTABLE = 0x151d,
    /// Legacy path to a `LF_VFTABLE`.
    LF_VFTPATH = 0x1303,

    /// A modifier (`const`/`volatile`/`unaligned`) applied to another type.
    LF_MODIFIER = 0x1001,
    /// A pointer, pointer-to-data-member, or pointer-to-member-function type.
    LF_POINTER = 0x1002,
    /// A non-member function type.
    LF_PROCEDURE = 0x1008,
    /// A member function type.
    LF_MFUNCTION = 0x1009,

    /// A function ID, used by `S_INLINESITE` and call-site metadata.
    LF_FUNC_ID = 0x1601,
    /// A member function ID.
    LF_MFUNC_ID = 0x1602,
    /// Build information referenced from `S_BUILDINFO`.
    LF_BUILDINFO = 0x1603,
    /// A list of `LF_STRING_ID` records, used to represent source-file search paths.
    LF_SUBSTR_LIST = 0x1604,
    /// An interned string.
    LF_STRING_ID = 0x1605,
    /// Associates a UDT with the source line where it was defined.
    LF_UDT_SRC_LINE = 0x1606,
    /// Like [`Self::LF_UDT_SRC_LINE`], but also records the owning module.
    LF_UDT_MOD_SRC_LINE = 0x1607,
    /// A "huge" class/struct record (supports member counts and sizes beyond `LF_CLASS`'s limits).
    LF_CLASS2 = 0x1608,
    LF_STRUCTURE2 = 0x1609,
    LF_UNION2 = 0x160a,
    LF_INTERFACE2 = 0x160b,

    /// `char`
    LF_CHAR = 0x8000,
    /// `i16`
    LF_SHORT = 0x8001,
    /// `u16`
    LF_USHORT = 0x8002,
    /// `i32`
    LF_LONG = 0x8003,
    /// `u32`
    LF_ULONG = 0x8004,
    LF_REAL32 = 0x8005,
    LF_REAL64 = 0x8006,
    LF_REAL80 = 0x8007,
    LF_REAL128 = 0x8008,
    /// `i64`
    LF_QUADWORD = 0x8009,
    /// `u64`
    LF_UQUADWORD = 0x800a,
    LF_REAL48 = 0x800b,
    LF_COMPLEX32 = 0x800c,
    LF_COMPLEX64 = 0x800d,
    LF_COMPLEX80 = 0x800e,
    LF_COMPLEX128 = 0x800f,
    LF_VARSTRING = 0x8010,
    /// `i128`
    LF_OCTWORD = 0x8017,
    /// `u128`
    LF_UOCTWORD = 0x8018,
    LF_DECIMAL = 0x8019,
    LF_DATE = 0x801a,
    LF_UTF8STRING = 0x801b,
    LF_REAL16 = 0x801c,
}

impl Leaf {
    /// `true` if this leaf value is an immediate numeric value rather than a tag that selects a
    /// wider encoding. See [`number::Number`].
    pub fn is_immediate_numeric(self) -> bool {
        self.0 < 0x8000
    }

    /// `true` if this leaf kind may begin a top-level type record (as opposed to a sub-record
    /// nested inside a field list, or a numeric-leaf tag).
    pub fn can_start_record(self) -> bool {
        (0x1000..0x8000).contains(&self.0)
    }
}

/// Bit layout of the `attr` field of `LF_POINTER`.
///
/// The mode field (bits 5..8) selects whether this is a plain pointer, a reference, or one of the
/// pointer-to-member forms. A widely-copied but incorrect implementation computes the mode as
/// `(attrs & 0x07) >> 5`, which always yields zero since the mask is applied before the shift;
/// the correct form shifts first.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct PointerFlags(pub u32);

impl PointerFlags {
    /// Pointer kind: near, far, huge, based, etc. Bits `[0:5)`.
    pub fn kind(self) -> u32 {
        self.0 & 0x1f
    }

    /// Pointer mode: pointer, reference, pointer-to-data-member, pointer-to-member-function, etc.
    /// Bits `[5:8)`.
    pub fn mode(self) -> u32 {
        (self.0 >> 5) & 0x07
    }

    /// `true` if [`Self::mode`] is `PointerToDataMember` (2) or `PointerToMemberFunction` (3).
    pub fn is_pointer_to_member(self) -> bool {
        matches!(self.mode(), 2 | 3)
    }

    /// Is the pointer itself flagged `const`?
    pub fn is_const(self) -> bool {
        self.0 & (1 << 10) != 0
    }

    /// Is the pointer itself flagged `volatile`?
    pub fn is_volatile(self) -> bool {
        self.0 & (1 << 9) != 0
    }

    /// Is the pointer itself flagged `__unaligned`?
    pub fn is_unaligned(self) -> bool {
        self.0 & (1 << 11) != 0
    }

    /// Is this a flat (32-bit, `__based(void)`) pointer?
    pub fn is_flat32(self) -> bool {
        self.0 & (1 << 8) != 0
    }
}

impl Debug for PointerFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PointerFlags {{ kind: {}, mode: {}, const: {}, volatile: {} }}",
            self.kind(),
            self.mode(),
            self.is_const(),
            self.is_volatile()
        )
    }
}

/// Pointer modes, as returned by [`PointerFlags::mode`].
pub const CV_PTR_MODE_PTR: u32 = 0;
/// A reference (`T&`).
pub const CV_PTR_MODE_REF: u32 = 1;
/// A pointer-to-data-member (`T C::*`).
pub const CV_PTR_MODE_PMEM: u32 = 2;
/// A pointer-to-member-function (`R (C::*)(Args...)`).
pub const CV_PTR_MODE_PMFUNC: u32 = 3;
/// An rvalue reference (`T&&`).
pub const CV_PTR_MODE_RVREF: u32 = 4;

/// Method properties, as stored in the low 3 bits (after the 2-bit access field) of
/// [`MemberAttributes`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum MethodProperty {
    Vanilla = 0,
    Virtual = 1,
    Static = 2,
    Friend = 3,
    IntroducingVirtual = 4,
    PureVirtual = 5,
    PureIntroducingVirtual = 6,
    Reserved = 7,
}

impl MethodProperty {
    fn from_bits(bits: u16) -> Self {
        match bits {
            0 => Self::Vanilla,
            1 => Self::Virtual,
            2 => Self::Static,
            3 => Self::Friend,
            4 => Self::IntroducingVirtual,
            5 => Self::PureVirtual,
            6 => Self::PureIntroducingVirtual,
            _ => Self::Reserved,
        }
    }
}

/// The 16-bit `CV_fldattr_t` bitfield that precedes the type index (or method-list index) in
/// every field-list sub-record that describes a class/struct/union member.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct MemberAttributes(pub u16);

impl MemberAttributes {
    /// Access control: 0 = none specified, 1 = private, 2 = protected, 3 = public.
    pub fn access(self) -> u16 {
        self.0 & 0x3
    }

    /// The method property (virtual-ness) of this member, when the member is a method.
    pub fn method_property(self) -> MethodProperty {
        MethodProperty::from_bits((self.0 >> 2) & 0x7)
    }

    /// `true` if this member is a `static`, `virtual`, `pure virtual`, or introducing-virtual
    /// method.
    pub fn is_virtual(self) -> bool {
        matches!(
            self.method_property(),
            MethodProperty::Virtual
                | MethodProperty::IntroducingVirtual
                | MethodProperty::PureVirtual
                | MethodProperty::PureIntroducingVirtual
        )
    }

    /// `true` if this member introduces a new virtual function table slot, meaning an
    /// additional `u32` vtable offset follows the type index in `LF_ONEMETHOD`.
    pub fn is_introducing_virtual(self) -> bool {
        matches!(
            self.method_property(),
            MethodProperty::IntroducingVirtual | MethodProperty::PureIntroducingVirtual
        )
    }

    /// Compiler-generated member (not written by the user).
    pub fn is_compiler_generated(self) -> bool {
        self.0 & (1 << 5) != 0
    }

    /// Is accessible via an implicit pointer conversion without a cast (`pseudo`)?
    pub fn is_pseudo(self) -> bool {
        self.0 & (1 << 6) != 0
    }

    /// `noinherit`
    pub fn is_no_inherit(self) -> bool {
        self.0 & (1 << 7) != 0
    }

    /// `noconstruct`
    pub fn is_no_construct(self) -> bool {
        self.0 & (1 << 8) != 0
    }

    /// Compiler-generated compile-time-only overload (C++11 `override`/`final` propagation).
    pub fn is_compiler_generated_overload(self) -> bool {
        self.0 & (1 << 9) != 0
    }

    /// `sealed`
    pub fn is_sealed(self) -> bool {
        self.0 & (1 << 10) != 0
    }
}

impl Debug for MemberAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemberAttributes {{ access: {}, method_property: {:?} }}",
            self.access(),
            self.method_property()
        )
    }
}

/// `LF_MODIFIER`'s flag bits.
pub mod modifier_flags {
    /// `const`
    pub const CONST: u16 = 1 << 0;
    /// `volatile`
    pub const VOLATILE: u16 = 1 << 1;
    /// `__unaligned`
    pub const UNALIGNED: u16 = 1 << 2;
}

/// Fixed-size header shared by `LF_CLASS`, `LF_STRUCTURE`, `LF_INTERFACE`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct ClassFixed {
    pub member_count: zerocopy::U16<LE>,
    pub properties: zerocopy::U16<LE>,
    pub field_list: TypeIndexLe,
    pub derived_list: TypeIndexLe,
    pub vtable_shape: TypeIndexLe,
}

/// `LF_CLASS`, `LF_STRUCTURE`, `LF_INTERFACE`, `LF_UNION`'s `properties` bit layout.
pub mod class_properties {
    /// Structure has constructors/destructors.
    pub const CTOR: u16 = 1 << 0;
    /// Class has overloaded operators.
    pub const OVLOPS: u16 = 1 << 1;
    /// This is a nested class.
    pub const IS_NESTED: u16 = 1 << 2;
    /// Class contains nested types.
    pub const CNESTED: u16 = 1 << 3;
    /// Overloaded assignment (`=`).
    pub const OPASSIGN: u16 = 1 << 4;
    /// Has methods other than constructors/destructors/assignment.
    pub const OPCAST: u16 = 1 << 5;
    /// This is a forward reference; the real definition appears in a later record.
    pub const FORWARD_REF: u16 = 1 << 7;
    /// A scoped definition (has a separate "linkage" name, carried as a second NUL-terminated
    /// string after the display name).
    pub const HAS_UNIQUE_NAME: u16 = 1 << 9;
    /// This is an intrinsic type (e.g. a vector/matrix HLSL intrinsic).
    pub const INTRINSIC: u16 = 1 << 10;
}

/// Parsed form of `LF_CLASS`, `LF_STRUCTURE`, `LF_INTERFACE`.
#[derive(Clone, Debug)]
pub struct Aggregate<'a> {
    #[allow(missing_docs)]
    pub fixed: &'a ClassFixed,
    /// Size in bytes of an instance of this type, if complete.
    pub size: Number<'a>,
    /// Display name.
    pub name: &'a BStr,
    /// Present only if `properties & HAS_UNIQUE_NAME`: the mangled/linkage name, used to
    /// correlate separately-compiled definitions of the same type.
    pub unique_name: Option<&'a BStr>,
}

impl<'a> Parse<'a> for Aggregate<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let fixed: &'a ClassFixed = p.get()?;
        let size = p.number()?;
        let name = p.strz()?;
        let unique_name = if fixed.properties.get() & class_properties::HAS_UNIQUE_NAME != 0 {
            Some(p.strz()?)
        } else {
            None
        };
        Ok(Self {
            fixed,
            size,
            name,
            unique_name,
        })
    }
}

/// Fixed-size header of `LF_UNION`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct UnionFixed {
    pub member_count: zerocopy::U16<LE>,
    pub properties: zerocopy::U16<LE>,
    pub field_list: TypeIndexLe,
}

/// Parsed form of `LF_UNION`.
#[derive(Clone, Debug)]
pub struct Union<'a> {
    #[allow(missing_docs)]
    pub fixed: &'a UnionFixed,
    /// Size in bytes.
    pub size: Number<'a>,
    /// Display name.
    pub name: &'a BStr,
    /// Linkage name, if `HAS_UNIQUE_NAME` is set.
    pub unique_name: Option<&'a BStr>,
}

impl<'a> Parse<'a> for Union<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let fixed: &'a UnionFixed = p.get()?;
        let size = p.number()?;
        let name = p.strz()?;
        let unique_name = if fixed.properties.get() & class_properties::HAS_UNIQUE_NAME != 0 {
            Some(p.strz()?)
        } else {
            None
        };
        Ok(Self {
            fixed,
            size,
            name,
            unique_name,
        })
    }
}

/// Fixed-size header of `LF_ENUM`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct EnumFixed {
    pub member_count: zerocopy::U16<LE>,
    pub properties: zerocopy::U16<LE>,
    pub underlying_type: TypeIndexLe,
    pub field_list: TypeIndexLe,
}

/// Parsed form of `LF_ENUM`.
#[derive(Clone, Debug)]
pub struct Enum<'a> {
    #[allow(missing_docs)]
    pub fixed: &'a EnumFixed,
    /// Display name.
    pub name: &'a BStr,
    /// Linkage name, if `HAS_UNIQUE_NAME` is set.
    pub unique_name: Option<&'a BStr>,
}

impl<'a> Parse<'a> for Enum<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let fixed: &'a EnumFixed = p.get()?;
        let name = p.strz()?;
        let unique_name = if fixed.properties.get() & class_properties::HAS_UNIQUE_NAME != 0 {
            Some(p.strz()?)
        } else {
            None
        };
        Ok(Self {
            fixed,
            name,
            unique_name,
        })
    }
}

/// `LF_POINTER`'s fixed header.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct PointerFixed {
    pub referent: TypeIndexLe,
    pub attrs: zerocopy::U32<LE>,
}

/// Tail data present only when `PointerFlags::is_pointer_to_member`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct PointerToMemberTail {
    pub containing_class: TypeIndexLe,
    pub representation: zerocopy::U16<LE>,
}

/// Parsed form of `LF_POINTER`.
#[derive(Clone, Debug)]
pub struct Pointer<'a> {
    #[allow(missing_docs)]
    pub fixed: &'a PointerFixed,
    /// Present only for pointer-to-data-member and pointer-to-member-function pointers.
    pub member_tail: Option<&'a PointerToMemberTail>,
}

impl<'a> Pointer<'a> {
    /// Decoded flags/mode/kind for this pointer.
    pub fn flags(&self) -> PointerFlags {
        PointerFlags(self.fixed.attrs.get())
    }
}

impl<'a> Parse<'a> for Pointer<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let fixed: &'a PointerFixed = p.get()?;
        let member_tail = if PointerFlags(fixed.attrs.get()).is_pointer_to_member() {
            Some(p.get()?)
        } else {
            None
        };
        Ok(Self { fixed, member_tail })
    }
}

/// `LF_MODIFIER`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug, Clone)]
#[allow(missing_docs)]
pub struct Modifier {
    pub modified_type: TypeIndexLe,
    pub flags: zerocopy::U16<LE>,
}

/// `LF_VTSHAPE`.
#[derive(Clone, Debug)]
pub struct VtShape {
    /// Number of descriptor entries. The descriptors themselves (4-bit vtable-entry-shape codes)
    /// are not decoded; they carry no type-index or name information of interest to a dumper.
    pub entry_count: u32,
}

impl<'a> Parse<'a> for VtShape {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        Ok(Self {
            entry_count: p.u16()? as u32,
        })
    }
}

/// `LF_UDT_SRC_LINE` / `LF_UDT_MOD_SRC_LINE`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct UdtSrcLine {
    pub udt: TypeIndexLe,
    pub source_file_string_id: ItemIdLe,
    pub line: zerocopy::U32<LE>,
}

/// `LF_PROCEDURE`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct Procedure {
    pub return_type: TypeIndexLe,
    pub calling_convention: u8,
    pub options: u8,
    pub num_params: zerocopy::U16<LE>,
    pub arg_list: TypeIndexLe,
}

/// `LF_MFUNCTION`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct MemberFunction {
    pub return_type: TypeIndexLe,
    pub containing_class: TypeIndexLe,
    pub this_type: TypeIndexLe,
    pub calling_convention: u8,
    pub options: u8,
    pub num_params: zerocopy::U16<LE>,
    pub arg_list: TypeIndexLe,
    pub this_adjustment: zerocopy::I32<LE>,
}

/// `LF_ARGLIST` / `LF_SUBSTR_LIST`.
#[derive(Clone, Debug)]
pub struct ArgList<'a> {
    /// The argument (or substring) type indices.
    pub args: &'a [TypeIndexLe],
}

impl<'a> Parse<'a> for ArgList<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let count = p.u32()? as usize;
        Ok(Self {
            args: p.slice(count)?,
        })
    }
}

/// `LF_TYPESERVER2`.
#[derive(Clone, Debug)]
pub struct TypeServer2<'a> {
    /// The PDB's GUID.
    pub guid: uuid::Uuid,
    /// The PDB's age (incremented on each link that mutates it).
    pub age: u32,
    /// Path to the PDB.
    pub name: &'a BStr,
}

impl<'a> Parse<'a> for TypeServer2<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let guid_bytes: [u8; 16] = p.array()?;
        Ok(Self {
            guid: uuid::Uuid::from_bytes_le(guid_bytes),
            age: p.u32()?,
            name: p.strz()?,
        })
    }
}

/// `LF_ARRAY`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct ArrayFixed {
    pub element_type: TypeIndexLe,
    pub index_type: TypeIndexLe,
}

/// Parsed form of `LF_ARRAY`.
#[derive(Clone, Debug)]
pub struct Array<'a> {
    #[allow(missing_docs)]
    pub fixed: &'a ArrayFixed,
    /// Total size in bytes of the array.
    pub length: Number<'a>,
    /// Display name; usually empty for compiler-generated array types.
    pub name: &'a BStr,
}

impl<'a> Parse<'a> for Array<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        Ok(Self {
            fixed: p.get()?,
            length: p.number()?,
            name: p.strz()?,
        })
    }
}

/// `LF_BITFIELD`.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Debug)]
#[allow(missing_docs)]
pub struct BitField {
    pub base_type: TypeIndexLe,
    pub length: u8,
    pub position: u8,
}

/// `LF_STRING_ID` / `LF_FUNC_ID` / `LF_MFUNC_ID`: records that contribute a name to the
/// UDT-name table (see [`crate::types::primitive`] for builtins, and the orchestrator for the
/// append-as-you-go table built from the type stream).
#[derive(Clone, Debug)]
pub struct StringId<'a> {
    /// Parent scope ID (0 for `LF_STRING_ID` / global `LF_FUNC_ID`).
    pub parent_scope: ItemId,
    /// For `LF_FUNC_ID`/`LF_MFUNC_ID`: the function's type. For `LF_STRING_ID`: unused (0).
    pub function_type: TypeIndex,
    /// The interned string (path fragment or function display name).
    pub name: &'a BStr,
}

impl<'a> StringId<'a> {
    fn parse_func_id(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        Ok(Self {
            parent_scope: p.u32()?,
            function_type: p.type_index()?,
            name: p.strz()?,
        })
    }

    fn parse_string_id(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        Ok(Self {
            parent_scope: p.u32()?,
            function_type: TypeIndex(0),
            name: p.strz()?,
        })
    }
}

/// `LF_BUILDINFO`.
#[derive(Clone, Debug)]
pub struct BuildInfo<'a> {
    /// Each entry is an `ItemId` pointing at an `LF_STRING_ID`: in order, the current directory,
    /// the build tool, the source file, the PDB, and the compiler command line.
    pub args: &'a [ItemIdLe],
}

impl<'a> Parse<'a> for BuildInfo<'a> {
    fn from_parser(p: &mut Parser<'a>) -> Result<Self, ParserError> {
        let count = p.u16()? as usize;
        Ok(Self {
            args: p.slice(count)?,
        })
    }
}

/// Parsed form of a type record. Every variant borrows from the original record bytes.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub enum TypeData<'a> {
    Unknown,
    Aggregate(Aggregate<'a>),
    Union(Union<'a>),
    Enum(Enum<'a>),
    Pointer(Pointer<'a>),
    Modifier(&'a Modifier),
    VtShape(VtShape),
    UdtSrcLine(&'a UdtSrcLine),
    Procedure(&'a Procedure),
    MemberFunction(&'a MemberFunction),
    ArgList(ArgList<'a>),
    TypeServer2(TypeServer2<'a>),
    FieldList(&'a [u8]),
    Array(Array<'a>),
    BitField(&'a BitField),
    StringId(StringId<'a>),
    BuildInfo(BuildInfo<'a>),
}

impl<'a> TypeData<'a> {
    /// Parses the payload of a type record, given its kind.
    pub fn parse(kind: Leaf, p: &mut Parser<'a>) -> Result<Self, ParserError> {
        Ok(match kind {
            Leaf::LF_CLASS | Leaf::LF_STRUCTURE | Leaf::LF_INTERFACE => {
                Self::Aggregate(p.parse()?)
            }
            Leaf::LF_UNION => Self::Union(p.parse()?),
            Leaf::LF_ENUM => Self::Enum(p.parse()?),
            Leaf::LF_POINTER => Self::Pointer(p.parse()?),
            Leaf::LF_MODIFIER => Self::Modifier(p.get()?),
            Leaf::LF_VTSHAPE => Self::VtShape(p.parse()?),
            Leaf::LF_UDT_SRC_LINE | Leaf::LF_UDT_MOD_SRC_LINE => Self::UdtSrcLine(p.get()?),
            Leaf::LF_PROCEDURE => Self::Procedure(p.get()?),
            Leaf::LF_MFUNCTION => Self::MemberFunction(p.get()?),
            Leaf::LF_ARGLIST | Leaf::LF_SUBSTR_LIST => Self::ArgList(p.parse()?),
            Leaf::LF_TYPESERVER2 => Self::TypeServer2(p.parse()?),
            Leaf::LF_FIELDLIST => Self::FieldList(p.take_rest()),
            Leaf::LF_ARRAY => Self::Array(p.parse()?),
            Leaf::LF_BITFIELD => Self::BitField(p.get()?),
            Leaf::LF_FUNC_ID | Leaf::LF_MFUNC_ID => Self::StringId(StringId::parse_func_id(p)?),
            Leaf::LF_STRING_ID => Self::StringId(StringId::parse_string_id(p)?),
            Leaf::LF_BUILDINFO => Self::BuildInfo(p.parse()?),
            _ => Self::Unknown,
        })
    }

    /// The display name recorded for this type record, if the record carries one. This is the
    /// name stored at this record's slot in the UDT-name table.
    pub fn display_name(&self) -> Option<&'a BStr> {
        match self {
            Self::Aggregate(a) => Some(a.name),
            Self::Union(u) => Some(u.name),
            Self::Enum(e) => Some(e.name),
            Self::Array(a) => Some(a.name),
            Self::StringId(s) => Some(s.name),
            _ => None,
        }
    }
}

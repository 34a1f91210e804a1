//! The COFF symbol table: fixed-size 18-byte entries (`IMAGE_SYMBOL`), each optionally followed
//! by one or more 18-byte auxiliary records whose interpretation depends on the primary symbol's
//! storage class and section value.
//!
//! # References
//!
//! * <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#coff-symbol-table>

use bstr::BStr;
use zerocopy::byteorder::{LE, I16, U16, U32};
use zerocopy_derive::*;

/// Size in bytes of one symbol table entry, auxiliary or primary.
pub const IMAGE_SIZEOF_SYMBOL: usize = 18;

/// One entry (`IMAGE_SYMBOL`) of the COFF symbol table.
///
/// `name` holds the symbol's short name if it fits in 8 bytes; otherwise the first 4 bytes are
/// zero and the last 4 bytes are a byte offset into the string table that follows the symbol
/// table (see [`Self::short_name`]). Uses unaligned little-endian fields: entries are 18 bytes
/// wide, so only every other entry in a symbol table lands on a 4-byte boundary.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct IMAGE_SYMBOL {
    pub name: [u8; 8],
    pub value: U32<LE>,
    /// 1-based index of the section this symbol is defined in. Two special values:
    /// [`IMAGE_SYM_UNDEFINED`] (extern, unresolved) and [`IMAGE_SYM_ABSOLUTE`] (not
    /// section-relative, e.g. an absolute constant).
    pub section_number: I16<LE>,
    pub kind: U16<LE>,
    pub storage_class: SymbolStorageClass,
    pub number_of_aux_symbols: u8,
}

static_assertions::const_assert_eq!(core::mem::size_of::<IMAGE_SYMBOL>(), IMAGE_SIZEOF_SYMBOL);

/// `section_number` value meaning "no section; this is an external symbol resolved by the
/// linker."
pub const IMAGE_SYM_UNDEFINED: i16 = 0;
/// `section_number` value meaning "absolute value, not relocatable."
pub const IMAGE_SYM_ABSOLUTE: i16 = -1;
/// `section_number` value meaning "provides general type or debugging information, but does not
/// correspond to a section."
pub const IMAGE_SYM_DEBUG: i16 = -2;

impl IMAGE_SYMBOL {
    /// If the name fits inline, returns it; otherwise returns `None` and the name must be
    /// resolved through the string table via its offset ([`Self::long_name_offset`]).
    pub fn short_name(&self) -> Option<&BStr> {
        if self.name[0..4] != [0, 0, 0, 0] {
            let end = self.name.iter().position(|&b| b == 0).unwrap_or(8);
            Some(BStr::new(&self.name[..end]))
        } else {
            None
        }
    }

    /// If [`Self::short_name`] is `None`, the byte offset into the string table where this
    /// symbol's name is found.
    pub fn long_name_offset(&self) -> u32 {
        u32::from_le_bytes(self.name[4..8].try_into().unwrap())
    }

    /// `true` if this is `IMAGE_SYM_CLASS_EXTERNAL` and `section_number` is
    /// [`IMAGE_SYM_UNDEFINED`] and `value` is 0 — an unresolved external reference rather than a
    /// definition.
    pub fn is_external_undefined(&self) -> bool {
        self.storage_class == SymbolStorageClass::EXTERNAL
            && self.section_number.get() == IMAGE_SYM_UNDEFINED
            && self.value.get() == 0
    }

    /// `true` if this symbol begins a `.debug$S`/`.debug$T`-style section definition, i.e. its
    /// name matches a section name and its storage class is `IMAGE_SYM_CLASS_STATIC` with one
    /// aux symbol holding [`AuxSectionDefinition`].
    pub fn is_section_definition(&self) -> bool {
        self.storage_class == SymbolStorageClass::STATIC && self.number_of_aux_symbols == 1
    }
}

/// `IMAGE_SYMBOL::storage_class` values (`SymbolStorageClass` in COFF terminology).
#[derive(Copy, Clone, Eq, PartialEq, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(transparent)]
pub struct SymbolStorageClass(pub u8);

macro_rules! storage_classes {
    ( $( $name:ident = $value:expr, )* ) => {
        impl SymbolStorageClass {
            $( pub const $name: SymbolStorageClass = SymbolStorageClass($value); )*

            /// Looks up the name of a storage class, if it is recognized.
            pub fn to_str_opt(self) -> Option<&'static str> {
                Some(match self.0 {
                    $( $value => stringify!($name), )*
                    _ => return None,
                })
            }
        }
    }
}

storage_classes! {
    END_OF_FUNCTION = 0xff,
    NULL = 0,
    AUTOMATIC = 1,
    EXTERNAL = 2,
    STATIC = 3,
    REGISTER = 4,
    EXTERNAL_DEF = 5,
    LABEL = 6,
    UNDEFINED_LABEL = 7,
    MEMBER_OF_STRUCT = 8,
    ARGUMENT = 9,
    STRUCT_TAG = 10,
    MEMBER_OF_UNION = 11,
    UNION_TAG = 12,
    TYPE_DEFINITION = 13,
    UNDEFINED_STATIC = 14,
    ENUM_TAG = 15,
    MEMBER_OF_ENUM = 16,
    REGISTER_PARAM = 17,
    BIT_FIELD = 18,
    BLOCK = 100,
    FUNCTION = 101,
    END_OF_STRUCT = 102,
    FILE = 103,
    SECTION = 104,
    WEAK_EXTERNAL = 105,
    CLR_TOKEN = 107,
}

impl core::fmt::Debug for SymbolStorageClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.to_str_opt() {
            Some(s) => f.write_str(s),
            None => write!(f, "??({})", self.0),
        }
    }
}

/// `IMAGE_SYM_CLASS_FUNCTION`/`IMAGE_SYM_CLASS_WEAK_EXTERNAL`-style aux record describing a
/// `.bf`/`.ef`-bracketed function definition (one per `IMAGE_SYM_CLASS_EXTERNAL` function
/// symbol, when line-number info is present).
#[repr(C)]
#[derive(Copy, Clone, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct AuxFunctionDefinition {
    /// Symbol table index of the corresponding `.bf` symbol.
    pub tag_index: U32<LE>,
    /// Size in bytes of the function's code.
    pub total_size: U32<LE>,
    /// File offset of the function's line-number entries (legacy COFF debug info; unused for
    /// CodeView).
    pub pointer_to_line_number: U32<LE>,
    /// Symbol table index of the next function symbol, or 0 if this is the last.
    pub pointer_to_next_function: U32<LE>,
    pub unused: [u8; 2],
}

/// Aux record following an `IMAGE_SYM_CLASS_WEAK_EXTERNAL` symbol.
#[repr(C)]
#[derive(Copy, Clone, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct AuxWeakExternal {
    /// Symbol table index of the symbol to use if the weak external is unresolved.
    pub tag_index: U32<LE>,
    /// One of the `IMAGE_WEAK_EXTERN_SEARCH_*` values.
    pub characteristics: U32<LE>,
    pub unused: [u8; 10],
}

/// Aux record following an `IMAGE_SYM_CLASS_STATIC` symbol that defines a section (e.g.
/// `.debug$S`, `.text`, or a COMDAT section).
#[repr(C)]
#[derive(Copy, Clone, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
pub struct AuxSectionDefinition {
    pub length: U32<LE>,
    pub number_of_relocations: U16<LE>,
    pub number_of_linenumbers: U16<LE>,
    pub checksum: U32<LE>,
    pub number: U16<LE>,
    /// One of the `IMAGE_COMDAT_SELECT_*` values if this is a COMDAT section.
    pub selection: u8,
    pub unused: [u8; 3],
}

/// Aux record following an `IMAGE_SYM_CLASS_FILE` symbol: an ASCII (or, for long names, UTF-8)
/// file name, zero-padded and spanning `number_of_aux_symbols * 18` bytes.
pub struct AuxFileName<'a> {
    pub name: &'a BStr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_fits_inline() {
        let sym = IMAGE_SYMBOL {
            name: *b"@comp.id",
            value: U32::new(0),
            section_number: I16::new(IMAGE_SYM_ABSOLUTE),
            kind: U16::new(0),
            storage_class: SymbolStorageClass::STATIC,
            number_of_aux_symbols: 0,
        };
        assert_eq!(sym.short_name().unwrap(), "@comp.id");
    }

    #[test]
    fn long_name_is_a_string_table_offset() {
        let mut name = [0u8; 8];
        name[4..8].copy_from_slice(&100u32.to_le_bytes());
        let sym = IMAGE_SYMBOL {
            name,
            value: U32::new(0),
            section_number: I16::new(1),
            kind: U16::new(0),
            storage_class: SymbolStorageClass::EXTERNAL,
            number_of_aux_symbols: 0,
        };
        assert!(sym.short_name().is_none());
        assert_eq!(sym.long_name_offset(), 100);
    }

    #[test]
    fn storage_class_debug_names() {
        assert_eq!(format!("{:?}", SymbolStorageClass::EXTERNAL), "EXTERNAL");
        assert_eq!(format!("{:?}", SymbolStorageClass(0xaa)), "??(170)");
    }
}

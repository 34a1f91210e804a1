//! COFF relocation records (`IMAGE_RELOCATION`).
//!
//! Each image section that needs relocating (almost always `.debug$S`/`.debug$T`, since those are
//! the only sections a dumper cares about) is followed in the file by an array of
//! `IMAGE_RELOCATION` entries, whose count and position are given by
//! [`IMAGE_SECTION_HEADER::number_of_relocations`](crate::section::IMAGE_SECTION_HEADER) and
//! `pointer_to_relocations`.
//!
//! # References
//!
//! * <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#coff-relocations-object-only>

use zerocopy::byteorder::{LE, U16, U32};
use zerocopy_derive::*;

/// One `IMAGE_RELOCATION` entry. This layout is shared by every machine type; only the meaning
/// of `relocation_type` (see [`crate::reloc::reloc_type_str`]) is machine-specific.
///
/// Uses unaligned little-endian fields: the 10-byte entries in a relocation array do not keep
/// each `virtual_address`/`symbol_table_index` on a 4-byte boundary.
#[repr(C)]
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct IMAGE_RELOCATION {
    /// Offset, relative to the start of the section, of the location to be patched.
    pub virtual_address: U32<LE>,
    /// Zero-based index into the COFF symbol table of the symbol this relocation resolves to.
    pub symbol_table_index: U32<LE>,
    /// Machine-specific relocation kind. See [`crate::reloc`].
    pub relocation_type: U16<LE>,
}

pub const IMAGE_SIZEOF_RELOCATION: usize = 10;

static_assertions::const_assert_eq!(
    core::mem::size_of::<IMAGE_RELOCATION>(),
    IMAGE_SIZEOF_RELOCATION
);

/// A section's relocations, indexed for fast lookup by patched offset.
///
/// A dumper walks a section's bytes left to right; relocations are stored in file order (which is
/// usually, but is not guaranteed to be, ascending `virtual_address` order), so looking one up by
/// offset benefits from an index built once up front rather than a linear scan per query.
#[derive(Clone, Debug, Default)]
pub struct RelocationTable {
    /// `(virtual_address, index into entries)`, sorted by `virtual_address`.
    by_offset: Vec<(u32, u32)>,
    entries: Vec<IMAGE_RELOCATION>,
}

impl RelocationTable {
    /// Builds a lookup table from a section's raw relocation array.
    pub fn new(entries: Vec<IMAGE_RELOCATION>) -> Self {
        let mut by_offset: Vec<(u32, u32)> = entries
            .iter()
            .enumerate()
            .map(|(i, r)| (r.virtual_address.get(), i as u32))
            .collect();
        by_offset.sort_unstable_by_key(|&(addr, _)| addr);
        Self { by_offset, entries }
    }

    /// All relocations, in file order.
    pub fn entries(&self) -> &[IMAGE_RELOCATION] {
        &self.entries
    }

    /// Returns the relocation whose `virtual_address` equals `offset`, if any.
    ///
    /// If more than one relocation targets the same offset (unusual, but not forbidden by the
    /// format), the first one encountered in file order is returned.
    pub fn at_offset(&self, offset: u32) -> Option<&IMAGE_RELOCATION> {
        let start = self.by_offset.partition_point(|&(addr, _)| addr < offset);
        let &(addr, i) = self.by_offset.get(start)?;
        (addr == offset).then(|| &self.entries[i as usize])
    }

    /// Returns every relocation whose `virtual_address` falls within `range`.
    pub fn in_range(&self, range: std::ops::Range<u32>) -> impl Iterator<Item = &IMAGE_RELOCATION> {
        let start = self.by_offset.partition_point(|&(addr, _)| addr < range.start);
        self.by_offset[start..]
            .iter()
            .take_while(move |&&(addr, _)| addr < range.end)
            .map(|&(_, i)| &self.entries[i as usize])
    }
}

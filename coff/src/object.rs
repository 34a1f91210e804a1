//! Reads a COFF object file (`.obj`) well enough to locate its sections, their relocations, and
//! the COFF symbol table — everything a CodeView dumper needs without any PE/image-loading
//! support.
//!
//! # References
//!
//! * <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#coff-file-header-object-and-image>

use crate::image::IMAGE_FILE_HEADER;
use crate::relocation::{RelocationTable, IMAGE_RELOCATION};
use crate::section::IMAGE_SECTION_HEADER;
use crate::symbol::{IMAGE_SIZEOF_SYMBOL, IMAGE_SYMBOL};
use anyhow::{bail, Context};
use bstr::BStr;
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// A parsed COFF object file.
///
/// All accessors return zero-copy views into the original byte buffer; this type owns none of
/// its data.
pub struct CoffObject<'a> {
    bytes: &'a [u8],
    header: &'a IMAGE_FILE_HEADER,
    sections: &'a [IMAGE_SECTION_HEADER],
    symbols: &'a [IMAGE_SYMBOL],
    /// Everything after the symbol table: a `u32` total length (inclusive of itself) followed
    /// by NUL-terminated strings.
    string_table: &'a [u8],
}

/// Casts `count` consecutive `T`s out of `bytes` starting at `offset`.
///
/// `T` need not derive `Unaligned`; if the requested range does not fall on a boundary `T`
/// actually requires, this returns an error rather than parsing garbage.
fn slice_of<'a, T>(bytes: &'a [u8], offset: usize, count: usize) -> anyhow::Result<&'a [T]>
where
    T: FromBytes + Immutable + KnownLayout,
{
    let byte_len = count
        .checked_mul(core::mem::size_of::<T>())
        .context("size overflow")?;
    let slice = bytes.get(offset..offset + byte_len).with_context(|| {
        format!(
            "range {offset}..{} is out of bounds ({} bytes)",
            offset + byte_len,
            bytes.len()
        )
    })?;
    let (items, _) = <[T]>::ref_from_prefix_with_elems(slice, count)
        .ok()
        .context("misaligned or truncated array")?;
    Ok(items)
}

impl<'a> CoffObject<'a> {
    /// Parses the file header, section table, and symbol table of a COFF object. Section data
    /// and relocations are resolved lazily through [`Self::section_data`]/[`Self::relocations`].
    pub fn parse(bytes: &'a [u8]) -> anyhow::Result<Self> {
        let (header, _) = IMAGE_FILE_HEADER::ref_from_prefix(bytes)
            .ok()
            .context("file too small for IMAGE_FILE_HEADER")?;

        if header.machine.get() == crate::machine::IMAGE_FILE_MACHINE::IMAGE_FILE_MACHINE_UNKNOWN.0
            && header.number_of_sections.get() == 0
        {
            bail!("not a recognizable COFF object (machine=0, no sections)");
        }

        let header_len = core::mem::size_of::<IMAGE_FILE_HEADER>();
        let sections_offset = header_len + header.size_of_optional_header.get() as usize;
        let sections: &[IMAGE_SECTION_HEADER] =
            slice_of(bytes, sections_offset, header.number_of_sections.get() as usize)
                .context("reading section table")?;

        let symbols_offset = header.pointer_to_symbol_table.get() as usize;
        let symbols: &[IMAGE_SYMBOL] = if header.pointer_to_symbol_table.get() == 0 {
            &[]
        } else {
            slice_of(bytes, symbols_offset, header.number_of_symbols.get() as usize)
                .context("reading symbol table")?
        };

        let string_table_offset =
            symbols_offset + header.number_of_symbols.get() as usize * IMAGE_SIZEOF_SYMBOL;
        let string_table = bytes.get(string_table_offset..).unwrap_or(&[]);

        Ok(Self {
            bytes,
            header,
            sections,
            symbols,
            string_table,
        })
    }

    /// The file header.
    pub fn header(&self) -> &'a IMAGE_FILE_HEADER {
        self.header
    }

    /// The section table, in file order (1-based section numbers index this with an offset of
    /// one, per COFF convention).
    pub fn sections(&self) -> &'a [IMAGE_SECTION_HEADER] {
        self.sections
    }

    /// The raw COFF symbol table, including auxiliary records (which appear as ordinary-looking
    /// entries but must be skipped over using `number_of_aux_symbols`; see
    /// [`Self::primary_symbols`]).
    pub fn symbols(&self) -> &'a [IMAGE_SYMBOL] {
        self.symbols
    }

    /// Iterates only the primary symbol table entries, automatically skipping each symbol's aux
    /// records.
    pub fn primary_symbols(&self) -> PrimarySymbolIter<'a> {
        PrimarySymbolIter {
            symbols: self.symbols,
            index: 0,
        }
    }

    /// Resolves a symbol's name, following the string table indirection for long names.
    pub fn symbol_name(&self, sym: &IMAGE_SYMBOL) -> anyhow::Result<&'a BStr> {
        if let Some(short) = sym.short_name() {
            return Ok(short);
        }
        self.string_table_entry(sym.long_name_offset())
    }

    /// Looks up a NUL-terminated string at `offset` within the string table that follows the
    /// symbol table. Offsets less than 4 are invalid; the first 4 bytes are the table's own
    /// encoded length.
    pub fn string_table_entry(&self, offset: u32) -> anyhow::Result<&'a BStr> {
        let offset = offset as usize;
        if offset < 4 {
            bail!("string table offset {offset} is reserved (encodes the table's length)");
        }
        let rest = self
            .string_table
            .get(offset..)
            .with_context(|| format!("string table offset {offset} is out of range"))?;
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        Ok(BStr::new(&rest[..end]))
    }

    /// Returns the section header for a 1-based section number, or `None` for the special
    /// values [`crate::symbol::IMAGE_SYM_UNDEFINED`]/[`crate::symbol::IMAGE_SYM_ABSOLUTE`]/
    /// [`crate::symbol::IMAGE_SYM_DEBUG`] or an out-of-range index.
    pub fn section(&self, section_number: i16) -> Option<&'a IMAGE_SECTION_HEADER> {
        if section_number <= 0 {
            return None;
        }
        self.sections.get(section_number as usize - 1)
    }

    /// Looks up a section by name (e.g. `.debug$S`). If more than one section shares a name
    /// (legal in COFF; the linker distinguishes them via COMDAT symbols), the first is returned.
    pub fn section_by_name(&self, name: &str) -> Option<(usize, &'a IMAGE_SECTION_HEADER)> {
        self.sections
            .iter()
            .enumerate()
            .find(|(_, s)| s.name() == name.as_bytes())
    }

    /// Every section sharing `name`, in file order, together with their 0-based section index.
    pub fn sections_by_name<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = (usize, &'a IMAGE_SECTION_HEADER)> + 's {
        self.sections
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.name() == name.as_bytes())
    }

    /// The raw contents of a section, as stored in the file.
    pub fn section_data(&self, section: &IMAGE_SECTION_HEADER) -> anyhow::Result<&'a [u8]> {
        if section.size_of_raw_data == 0 {
            return Ok(&[]);
        }
        let start = section.pointer_to_raw_data as usize;
        let end = start + section.size_of_raw_data as usize;
        self.bytes
            .get(start..end)
            .with_context(|| format!("section {:?} data range {start}..{end} is out of bounds", section.name()))
    }

    /// Builds a lookup table of a section's relocations.
    pub fn relocations(&self, section: &IMAGE_SECTION_HEADER) -> anyhow::Result<RelocationTable> {
        let entries: &[IMAGE_RELOCATION] = slice_of(
            self.bytes,
            section.pointer_to_relocations as usize,
            section.number_of_relocations as usize,
        )
        .context("reading section relocations")?;
        Ok(RelocationTable::new(entries.to_vec()))
    }
}

/// Iterates the primary (non-auxiliary) entries of a COFF symbol table.
pub struct PrimarySymbolIter<'a> {
    symbols: &'a [IMAGE_SYMBOL],
    index: usize,
}

impl<'a> Iterator for PrimarySymbolIter<'a> {
    /// The symbol table index of the primary symbol, and the symbol itself.
    type Item = (usize, &'a IMAGE_SYMBOL);

    fn next(&mut self) -> Option<Self::Item> {
        let sym = self.symbols.get(self.index)?;
        let item = (self.index, sym);
        self.index += 1 + sym.number_of_aux_symbols as usize;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolStorageClass;
    use zerocopy::byteorder::{LE, I16, U16, U32};
    use zerocopy::IntoBytes;

    fn build_object() -> Vec<u8> {
        let header = IMAGE_FILE_HEADER {
            machine: U16::new(0x8664),
            number_of_sections: U16::new(1),
            time_date_stamp: U32::new(0),
            pointer_to_symbol_table: U32::new(0), // patched below
            number_of_symbols: U32::new(1),
            size_of_optional_header: U16::new(0),
            characteristics: U16::new(0),
        };

        let mut section_name = [0u8; 8];
        section_name[..8].copy_from_slice(b".debug$S");
        let section = IMAGE_SECTION_HEADER {
            name: section_name,
            physical_address_or_virtual_size: 0,
            virtual_address: 0,
            size_of_raw_data: 4,
            pointer_to_raw_data: 0, // patched below
            pointer_to_relocations: 0,
            pointer_to_linenumbers: 0,
            number_of_relocations: 0,
            number_of_linenumbers: 0,
            characteristics: Default::default(),
        };

        let mut name = [0u8; 8];
        name[4..8].copy_from_slice(&4u32.to_le_bytes());
        let symbol = IMAGE_SYMBOL {
            name,
            value: U32::new(0),
            section_number: I16::new(1),
            kind: U16::new(0),
            storage_class: SymbolStorageClass::STATIC,
            number_of_aux_symbols: 0,
        };

        let mut bytes = header.as_bytes().to_vec();
        let header_len = bytes.len();
        bytes.extend_from_slice(section.as_bytes());
        let section_data_offset = bytes.len();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let symbols_offset = bytes.len();
        bytes.extend_from_slice(symbol.as_bytes());
        let string_table_offset = bytes.len();
        bytes.extend_from_slice(&8u32.to_le_bytes()); // table length incl. itself
        bytes.extend_from_slice(b"long\0");

        bytes[8..12].copy_from_slice(&(symbols_offset as u32).to_le_bytes()); // pointer_to_symbol_table
        let section_header_offset = header_len;
        bytes[section_header_offset + 20..section_header_offset + 24]
            .copy_from_slice(&(section_data_offset as u32).to_le_bytes()); // pointer_to_raw_data
        let _ = string_table_offset;
        bytes
    }

    #[test]
    fn parses_header_sections_and_symbols() {
        let bytes = build_object();
        let obj = CoffObject::parse(&bytes).unwrap();
        assert_eq!(obj.sections().len(), 1);
        assert_eq!(obj.sections()[0].name(), ".debug$S");
        assert_eq!(obj.section_data(&obj.sections()[0]).unwrap(), &[0xde, 0xad, 0xbe, 0xef]);

        let (_, sym) = obj.primary_symbols().next().unwrap();
        assert_eq!(obj.symbol_name(sym).unwrap(), "long");
    }

    #[test]
    fn section_by_name_and_number() {
        let bytes = build_object();
        let obj = CoffObject::parse(&bytes).unwrap();
        let (idx, sect) = obj.section_by_name(".debug$S").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(obj.section(1).unwrap() as *const _, sect as *const _);
        assert!(obj.section(0).is_none());
    }
}

//! Decodes the `.debug$S` subsection stream: the container format that holds symbol records
//! (wrapped as a `SYMBOLS` subsection), per-function line tables, the string table, and file
//! checksums.
//!
//! # References
//!
//! * `cvinfo.h`, `DEBUG_S_SUBSECTION_TYPE`
//! * [CodeView Line Tables](https://llvm.org/docs/PDB/CodeViewLineTables.html)

use crate::parser::{Parser, ParserError};
use crate::utils::iter::HasRestLen;
use anyhow::{bail, Context};
use bstr::BStr;
use std::fmt;
use zerocopy::byteorder::{LE, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

macro_rules! subsection_kinds {
    ( $( $(#[$a:meta])* $name:ident = $value:expr, )* ) => {
        impl SubsectionKind {
            $(
                $(#[$a])*
                pub const $name: SubsectionKind = SubsectionKind($value);
            )*

            const NAMES: &'static [(u32, &'static str)] = &[
                $( ($value, stringify!($name)), )*
            ];

            /// Looks up the name of a subsection kind, if it is recognized.
            pub fn name(self) -> Option<&'static str> {
                Self::NAMES.iter().find(|&&(v, _)| v == self.0).map(|&(_, n)| n)
            }
        }
    }
}

/// Identifies the kind of data in a `.debug$S` subsection.
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(transparent)]
pub struct SubsectionKind(pub u32);

subsection_kinds! {
    /// Contains a stream of symbol records, exactly like `.debug$S`'s top-level `SYMBOLS` stream
    /// in a PDB module stream.
    SYMBOLS = 0xf1,
    /// Contains line-number tables for one function (a "contribution").
    LINES = 0xf2,
    /// A flat, NUL-separated blob of file name strings, referenced by offset from
    /// [`FileChecksum`].
    STRING_TABLE = 0xf3,
    /// File checksums and pointers to file names. There should be at most one of these per
    /// object file.
    FILE_CHECKSUMS = 0xf4,
    /// Stack unwind information for one function.
    FRAMEDATA = 0xf5,
    INLINEELINES = 0xf6,
    CROSSSCOPEIMPORTS = 0xf7,
    CROSSSCOPEEXPORTS = 0xf8,
    IL_LINES = 0xf9,
    FUNC_MDTOKEN_MAP = 0xfa,
    TYPE_MDTOKEN_MAP = 0xfb,
    MERGED_ASSEMBLYINPUT = 0xfc,
    COFF_SYMBOL_RVA = 0xfd,
}

/// Set on a subsection's `kind` field to indicate that the subsection's contents should be
/// skipped rather than interpreted; used by the linker to invalidate a subsection without
/// physically removing it.
pub const SUBSECTION_IGNORE: u32 = 0x8000_0000;

impl SubsectionKind {
    /// `true` if the high bit is set, meaning this subsection's contents should be skipped.
    pub fn is_ignored(self) -> bool {
        self.0 & SUBSECTION_IGNORE != 0
    }

    /// The kind value with the ignore bit masked off.
    pub fn without_ignore_bit(self) -> SubsectionKind {
        SubsectionKind(self.0 & !SUBSECTION_IGNORE)
    }
}

impl fmt::Debug for SubsectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = self.without_ignore_bit();
        match bare.name() {
            Some(s) => write!(f, "{s}"),
            None => write!(f, "??(0x{:x})", bare.0),
        }?;
        if self.is_ignored() {
            write!(f, " [ignored]")?;
        }
        Ok(())
    }
}

/// The fixed-size header that precedes every `.debug$S` subsection: a `u32` kind and a `u32`
/// byte count (not counting the header itself, and not counting the alignment padding that
/// follows the payload).
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
struct SubsectionHeader {
    kind: U32<LE>,
    size: U32<LE>,
}

/// One subsection of a `.debug$S` stream.
pub struct Subsection<'a> {
    /// The kind of data in this subsection, including the ignore bit if set.
    pub kind: SubsectionKind,
    /// The subsection's payload, excluding the header and any trailing alignment padding.
    pub data: &'a [u8],
}

/// Iterates the subsections of a `.debug$S` (or `.debug$T`-adjacent `.debug$S`) stream.
///
/// Like [`crate::syms::iter::SymIter`] and [`crate::types::iter::TypesIter`], a subsection whose
/// header or payload cannot be fully decoded ends iteration without consuming any more bytes, so
/// a caller can recover the exact offset and contents of a truncated tail.
#[derive(Clone)]
pub struct SubsectionIter<'a> {
    rest: &'a [u8],
}

impl<'a> SubsectionIter<'a> {
    /// Starts iterating the subsections in `bytes`, the full contents of a `.debug$S` section.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }

    /// Returns the data that has not yet been parsed.
    pub fn rest(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> HasRestLen for SubsectionIter<'a> {
    fn rest_len(&self) -> usize {
        self.rest.len()
    }
}

impl<'a> Iterator for SubsectionIter<'a> {
    type Item = Subsection<'a>;

    fn next(&mut self) -> Option<Subsection<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        let mut p = Parser::new(self.rest);
        let Ok(header) = p.get::<SubsectionHeader>() else {
            return None;
        };
        let size = header.size.get() as usize;

        let Ok(data) = p.bytes(size) else {
            return None;
        };

        // The payload is padded out to a 4-byte boundary; this padding is not part of `size`.
        let alignment_len = (4 - (size & 3)) & 3;
        if p.skip(alignment_len).is_err() {
            return None;
        }

        self.rest = p.into_rest();

        Some(Subsection {
            kind: SubsectionKind(header.kind.get()),
            data,
        })
    }
}

/// The flat string table carried in a `STRING_TABLE` subsection: a sequence of NUL-terminated
/// strings, referenced by byte offset from [`FileChecksum::name_offset`].
///
/// By convention offset 0 names the empty string, and every other valid offset is preceded by a
/// NUL byte (the terminator of the previous string); [`Self::get`] checks this invariant.
#[derive(Copy, Clone)]
pub struct StringTable<'a> {
    bytes: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Wraps the contents of a `STRING_TABLE` subsection.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Looks up the NUL-terminated string at `offset`.
    pub fn get(&self, offset: u32) -> anyhow::Result<&'a BStr> {
        let offset = offset as usize;
        if offset != 0 {
            match self.bytes.get(offset - 1) {
                Some(0) => {}
                Some(_) => bail!("string table offset {offset} does not start a string"),
                None => bail!("string table offset {offset} is out of range"),
            }
        }
        let rest = self
            .bytes
            .get(offset..)
            .with_context(|| format!("string table offset {offset} is out of range"))?;
        let mut p = Parser::new(rest);
        p.strz()
            .with_context(|| format!("string at offset {offset} is not NUL-terminated"))
    }
}

/// The hash algorithm used for a [`FileChecksum`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(transparent)]
pub struct ChecksumKind(pub u8);

impl ChecksumKind {
    /// No checksum is recorded for this file.
    pub const NONE: ChecksumKind = ChecksumKind(0);
    /// MD5 (`/ZH:MD5`).
    pub const MD5: ChecksumKind = ChecksumKind(1);
    /// SHA-1 (`/ZH:SHA1`).
    pub const SHA_1: ChecksumKind = ChecksumKind(2);
    /// SHA-256 (`/ZH:SHA_256`).
    pub const SHA_256: ChecksumKind = ChecksumKind(3);

    const NAMES: [&'static str; 4] = ["NONE", "MD5", "SHA_1", "SHA_256"];
}

impl fmt::Debug for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMES.get(self.0 as usize) {
            Some(name) => f.write_str(name),
            None => write!(f, "??({})", self.0),
        }
    }
}

/// The fixed-size header of one entry in a `FILE_CHECKSUMS` subsection. The checksum bytes
/// (`checksum_size` of them) immediately follow.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Debug)]
pub struct FileChecksumHeader {
    /// Byte offset of this file's name within the `STRING_TABLE` subsection.
    pub name_offset: U32<LE>,
    /// Length in bytes of the checksum data that follows this header.
    pub checksum_size: u8,
    /// The hash algorithm used for the checksum.
    pub checksum_kind: ChecksumKind,
}

/// One decoded entry of a `FILE_CHECKSUMS` subsection.
pub struct FileChecksum<'a> {
    /// The fixed-size header.
    pub header: &'a FileChecksumHeader,
    /// The raw checksum bytes (`header.checksum_size` of them).
    pub checksum: &'a [u8],
}

/// Wraps a `FILE_CHECKSUMS` subsection's bytes and resolves the `file_key` values found in
/// [`LinesFileSegment::file_key`].
///
/// Entries are variable-length (the checksum payload widens some entries beyond the nominal
/// 8-byte header), so a `file_key` is not `index * entry_size`; it is a direct byte offset into
/// this subsection, always pointing at the start of a [`FileChecksumHeader`]. This is the same
/// addressing scheme used for the analogous `NameIndex` values inside a PDB's module streams.
#[derive(Copy, Clone)]
pub struct FileChecksumsTable<'a> {
    bytes: &'a [u8],
}

impl<'a> FileChecksumsTable<'a> {
    /// Wraps the contents of a `FILE_CHECKSUMS` subsection.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Iterates every entry in declaration order.
    pub fn iter(&self) -> FileChecksumIter<'a> {
        FileChecksumIter { bytes: self.bytes }
    }

    /// Resolves a `file_key` (a byte offset into this subsection) to the checksum entry at that
    /// offset.
    pub fn get(&self, file_key: u32) -> anyhow::Result<FileChecksum<'a>> {
        let tail = self
            .bytes
            .get(file_key as usize..)
            .with_context(|| format!("file key 0x{file_key:x} is out of range of FILE_CHECKSUMS"))?;
        FileChecksumIter { bytes: tail }
            .next()
            .with_context(|| format!("failed to decode FileChecksum at file key 0x{file_key:x}"))
    }
}

/// Iterates the entries of a `FILE_CHECKSUMS` subsection in declaration order.
#[derive(Clone)]
pub struct FileChecksumIter<'a> {
    bytes: &'a [u8],
}

impl<'a> Iterator for FileChecksumIter<'a> {
    type Item = FileChecksum<'a>;

    fn next(&mut self) -> Option<FileChecksum<'a>> {
        if self.bytes.is_empty() {
            return None;
        }

        let mut p = Parser::new(self.bytes);
        let len_before = p.len();
        let header: &FileChecksumHeader = p.get().ok()?;
        let checksum = p.bytes(header.checksum_size as usize).ok()?;

        let record_len = len_before - p.len();
        let _ = p.skip((4 - (record_len & 3)) & 3);

        self.bytes = p.into_rest();
        Some(FileChecksum { header, checksum })
    }
}

/// Set on [`LinesHeader::flags`] when each line entry in this subsection is followed by a
/// column-number entry.
pub const LINES_HAVE_COLUMNS: u16 = 0x1;

/// The fixed-size header of a `LINES` subsection: the relocatable code range this line table
/// describes, followed by a sequence of [`LinesFileSegment`]s.
///
/// `reloc_offset`/`reloc_segment` are zero in an unlinked `.obj`; the real code address is
/// resolved through the COFF relocation that targets this subsection's first 6 bytes (see
/// `coff::RelocationTable`).
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Debug)]
pub struct LinesHeader {
    /// Relocated against the function this line table belongs to; zero until relocations are
    /// applied.
    pub reloc_offset: U32<LE>,
    /// Relocated against the section index of the function; zero until relocations are applied.
    pub reloc_segment: U16<LE>,
    /// Bit 0: [`LINES_HAVE_COLUMNS`].
    pub flags: U16<LE>,
    /// Length in bytes of the code range this line table covers.
    pub code_size: U32<LE>,
}

impl LinesHeader {
    /// `true` if every line entry in this subsection is followed by a column entry.
    pub fn have_columns(&self) -> bool {
        self.flags.get() & LINES_HAVE_COLUMNS != 0
    }
}

/// The fixed-size header of one file segment within a `LINES` subsection.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Debug)]
pub struct LinesFileSegmentHeader {
    /// A byte offset into the `FILE_CHECKSUMS` subsection; resolve with
    /// [`FileChecksumsTable::get`].
    pub file_key: U32<LE>,
    /// The number of [`LineEntry`] (and, if present, [`ColumnEntry`]) records that follow.
    pub entry_count: U32<LE>,
    /// Size in bytes of this file segment, including this 12-byte header.
    pub segment_bytes: U32<LE>,
}

/// One `(code offset, source line)` mapping.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone)]
pub struct LineEntry {
    /// Byte offset from the start of the function's code range.
    pub offset: U32<LE>,
    /// Bits 0-23: 1-based starting line number. Bits 24-30: delta to the ending line number, if
    /// this entry spans more than one line. Bit 31: set if this is a statement boundary (as
    /// opposed to only an expression boundary).
    pub line_and_flags: U32<LE>,
}

impl LineEntry {
    /// The 1-based starting line number.
    pub fn line_start(&self) -> u32 {
        self.line_and_flags.get() & 0x00ff_ffff
    }

    /// If non-zero, `line_start() + delta_to_line_end()` is the last line covered by this entry.
    pub fn delta_to_line_end(&self) -> u32 {
        (self.line_and_flags.get() >> 24) & 0x7f
    }

    /// `true` if this entry marks a statement boundary rather than only an expression boundary.
    pub fn is_statement(&self) -> bool {
        self.line_and_flags.get() & 0x8000_0000 != 0
    }
}

impl fmt::Debug for LineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+0x{:x} L{}", self.offset.get(), self.line_start())?;
        let delta = self.delta_to_line_end();
        if delta != 0 {
            write!(f, "..+{delta}")?;
        }
        if self.is_statement() {
            write!(f, " stmt")?;
        }
        Ok(())
    }
}

/// "Just My Code" sentinel line numbers: a compiler emits one of these instead of a real source
/// line to mark code the debugger should step over without entering (e.g. security cookie
/// checks, or code attributed to a file the user has asked not to step into).
pub fn is_jmc_no_step_line(line: u32) -> bool {
    matches!(line, 0xfeefee | 0xf00f00)
}

/// One file segment of a `LINES` subsection: a source file, and the `(offset, line)` mappings
/// within it.
pub struct LinesFileSegment<'a> {
    /// The fixed-size header.
    pub header: &'a LinesFileSegmentHeader,
    /// `true` if [`Self::columns`] has data.
    have_columns: bool,
    lines: &'a [LineEntry],
    column_bytes: &'a [u8],
}

impl<'a> LinesFileSegment<'a> {
    /// The `(offset, line)` entries in this segment, in code-offset order.
    pub fn lines(&self) -> &'a [LineEntry] {
        self.lines
    }

    /// The column entries for this segment, one per entry in [`Self::lines`], if the subsection
    /// records columns.
    pub fn columns(&self) -> Option<&'a [ColumnEntry]> {
        if !self.have_columns {
            return None;
        }
        let (columns, _) = <[ColumnEntry]>::ref_from_prefix_with_elems(
            self.column_bytes,
            self.lines.len(),
        )
        .ok()?;
        Some(columns)
    }
}

/// A pair of `(start, end)` column numbers for one [`LineEntry`], present only when
/// [`LinesHeader::have_columns`] is set.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Debug)]
pub struct ColumnEntry {
    /// 1-based starting column.
    pub start_column: U16<LE>,
    /// 1-based ending column.
    pub end_column: U16<LE>,
}

/// Parses a `LINES` subsection's fixed header and prepares to iterate its file segments.
pub struct LinesSubsection<'a> {
    /// The fixed-size header.
    pub header: &'a LinesHeader,
    segments: &'a [u8],
}

impl<'a> LinesSubsection<'a> {
    /// Parses the header of a `LINES` subsection.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ParserError> {
        let mut p = Parser::new(bytes);
        Ok(Self {
            header: p.get()?,
            segments: p.into_rest(),
        })
    }

    /// Iterates the file segments that follow the header.
    pub fn file_segments(&self) -> LinesFileSegmentIter<'a> {
        LinesFileSegmentIter {
            bytes: self.segments,
            have_columns: self.header.have_columns(),
        }
    }
}

/// Iterates the file segments of a [`LinesSubsection`].
#[derive(Clone)]
pub struct LinesFileSegmentIter<'a> {
    bytes: &'a [u8],
    have_columns: bool,
}

impl<'a> Iterator for LinesFileSegmentIter<'a> {
    type Item = LinesFileSegment<'a>;

    fn next(&mut self) -> Option<LinesFileSegment<'a>> {
        if self.bytes.is_empty() {
            return None;
        }

        let mut p = Parser::new(self.bytes);
        let header: &LinesFileSegmentHeader = p.get().ok()?;

        let entry_count = header.entry_count.get() as usize;
        let lines_bytes = entry_count.checked_mul(std::mem::size_of::<LineEntry>())?;
        let body_len = (header.segment_bytes.get() as usize)
            .checked_sub(std::mem::size_of::<LinesFileSegmentHeader>())?;
        if body_len < lines_bytes {
            return None;
        }

        let body = p.bytes(body_len).ok()?;
        let (lines, column_bytes) = <[LineEntry]>::ref_from_prefix_with_elems(body, entry_count).ok()?;

        self.bytes = p.into_rest();
        Some(LinesFileSegment {
            header,
            have_columns: self.have_columns,
            lines,
            column_bytes,
        })
    }
}

/// Flags describing a `FRAMEDATA` entry.
///
/// See `FrameData::Flags` in `CodeView.h`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(transparent)]
pub struct FrameDataFlags(pub u32);

impl FrameDataFlags {
    /// Function has structured exception handling.
    pub const HAS_SEH: u32 = 1 << 0;
    /// Function has an exception handler.
    pub const HAS_EH: u32 = 1 << 1;
    /// This is the first `FRAMEDATA` record for its function.
    pub const IS_FUNCTION_START: u32 = 1 << 2;
}

/// The fixed-size body of one `FRAMEDATA` subsection entry.
///
/// A `FRAMEDATA` subsection's payload is this struct preceded by a 4-byte relocation placeholder
/// (resolved through the COFF relocation targeting the first 4 bytes of the subsection, the same
/// way as [`LinesHeader::reloc_offset`]): the full payload is `4 + size_of::<FrameDataHeader>()`
/// bytes.
#[repr(C)]
#[derive(IntoBytes, FromBytes, Immutable, KnownLayout, Unaligned, Clone, Debug)]
pub struct FrameDataHeader {
    /// Relocated against the function's symbol; zero until relocations are applied.
    pub rva_start: U32<LE>,
    /// Length in bytes of the code block this frame data covers.
    pub code_size: U32<LE>,
    /// Count of bytes of locals in the frame.
    pub locals_size: U32<LE>,
    /// Count of bytes of parameters in the frame.
    pub params_size: U32<LE>,
    /// Maximum number of bytes pushed on the stack by this function.
    pub max_stack_size: U32<LE>,
    /// Byte offset into the `STRING_TABLE` subsection of a string describing the frame's
    /// unwind/exception-handling procedure (not a relocation; a plain string offset).
    pub frame_func_string_offset: U32<LE>,
    /// Length in bytes of the function's prologue.
    pub prologue_size: U16<LE>,
    /// Count of bytes used to save callee-save registers.
    pub saved_regs_size: U16<LE>,
    /// See [`FrameDataFlags`].
    pub flags: U32<LE>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsection_iter_respects_alignment_padding() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0xf4, 0, 0, 0,      // FILE_CHECKSUMS
            2, 0, 0, 0,         // size = 2
            0xab, 0xcd,         // payload
            0xaa, 0xaa,         // 2 bytes of alignment padding

            0xf3, 0, 0, 0,      // STRING_TABLE
            3, 0, 0, 0,         // size = 3
            b'a', b'b', 0,      // payload
            0xaa,               // 1 byte of alignment padding
        ];

        let mut it = SubsectionIter::new(data);
        let sub0 = it.next().unwrap();
        assert_eq!(sub0.kind, SubsectionKind::FILE_CHECKSUMS);
        assert_eq!(sub0.data, &[0xab, 0xcd]);

        let sub1 = it.next().unwrap();
        assert_eq!(sub1.kind, SubsectionKind::STRING_TABLE);
        assert_eq!(sub1.data, b"ab\0");

        assert!(it.next().is_none());
        assert!(it.rest().is_empty());
    }

    #[test]
    fn ignore_bit_is_exposed_but_does_not_stop_iteration() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0xf1, 0, 0, 0x80,   // SYMBOLS, with the ignore bit set
            0, 0, 0, 0,         // size = 0
        ];
        let sub = SubsectionIter::new(data).next().unwrap();
        assert!(sub.kind.is_ignored());
        assert_eq!(sub.kind.without_ignore_bit(), SubsectionKind::SYMBOLS);
    }

    #[test]
    fn string_table_get() {
        let data = b"\0foo\0bar\0";
        let table = StringTable::new(data);
        assert_eq!(table.get(0).unwrap(), "");
        assert_eq!(table.get(1).unwrap(), "foo");
        assert_eq!(table.get(5).unwrap(), "bar");
        assert!(table.get(2).is_err()); // not a string start
        assert!(table.get(100).is_err()); // out of range
    }

    #[test]
    fn file_checksums_table_resolves_by_byte_offset() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            1, 0, 0, 0, 0, 0, 0xaa, 0xaa,       // entry at offset 0: name_offset=1, no checksum
            2, 0, 0, 0, 16, 1,                  // entry at offset 8: name_offset=2, MD5 (16 bytes)
            0xc0, 0xc1, 0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7,
            0xc8, 0xc9, 0xca, 0xcb, 0xcc, 0xcd, 0xce, 0xcf,
        ];

        let table = FileChecksumsTable::new(data);

        let e0 = table.get(0).unwrap();
        assert_eq!(e0.header.name_offset.get(), 1);
        assert_eq!(e0.header.checksum_kind, ChecksumKind::NONE);

        let e1 = table.get(8).unwrap();
        assert_eq!(e1.header.name_offset.get(), 2);
        assert_eq!(e1.header.checksum_kind, ChecksumKind::MD5);
        assert_eq!(e1.checksum.len(), 16);

        assert!(table.get(0x1000).is_err());

        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn lines_subsection_decodes_one_file_segment_without_columns() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // LinesHeader
            0, 0, 0, 0,     // reloc_offset
            0, 0,           // reloc_segment
            0, 0,           // flags (no columns)
            0x20, 0, 0, 0,  // code_size = 0x20

            // LinesFileSegmentHeader
            0, 0, 0, 0,     // file_key = 0
            2, 0, 0, 0,     // entry_count = 2
            28, 0, 0, 0,    // segment_bytes = 12 + 2*8 = 28

            // LineEntry 0: offset=0, line 10, statement
            0, 0, 0, 0,
            10, 0, 0, 0x80,
            // LineEntry 1: offset=0x10, line 12
            0x10, 0, 0, 0,
            12, 0, 0, 0,
        ];

        let lines = LinesSubsection::parse(data).unwrap();
        assert_eq!(lines.header.code_size.get(), 0x20);

        let segments: Vec<_> = lines.file_segments().collect();
        assert_eq!(segments.len(), 1);

        let seg = &segments[0];
        assert_eq!(seg.header.file_key.get(), 0);
        assert_eq!(seg.lines().len(), 2);
        assert_eq!(seg.lines()[0].line_start(), 10);
        assert!(seg.lines()[0].is_statement());
        assert_eq!(seg.lines()[1].offset.get(), 0x10);
        assert!(seg.columns().is_none());
    }

    #[test]
    fn jmc_sentinel_lines_are_recognized() {
        assert!(is_jmc_no_step_line(0xfeefee));
        assert!(is_jmc_no_step_line(0xf00f00));
        assert!(!is_jmc_no_step_line(42));
    }

    #[test]
    fn frame_data_header_parses_after_the_relocation_placeholder() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0, 0, 0, 0,     // relocation placeholder (4 bytes)
            0, 0, 0, 0,     // rva_start
            0x10, 0, 0, 0,  // code_size
            0x20, 0, 0, 0,  // locals_size
            8, 0, 0, 0,     // params_size
            0x40, 0, 0, 0,  // max_stack_size
            1, 0, 0, 0,     // frame_func_string_offset
            4, 0,           // prologue_size
            0x18, 0,        // saved_regs_size
            1, 0, 0, 0,     // flags = HAS_SEH
        ];

        let mut p = Parser::new(&data[4..]);
        let header: &FrameDataHeader = p.get().unwrap();
        assert_eq!(header.code_size.get(), 0x10);
        assert_eq!(header.flags.get(), FrameDataFlags::HAS_SEH);
    }
}

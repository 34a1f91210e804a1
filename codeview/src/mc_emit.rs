//! Assembler-side state for `.cv_file` / `.cv_loc` directives, and the serializers that turn
//! that state into the `.debug$S` subsections the rest of this crate reads back.
//!
//! This models the write side of the format: `CodeViewContext` plays the role of LLVM's
//! `MCContext`-owned `CodeViewContext`, and `CvLoc`/`CvLineEntry` play the role of `MCCVLoc` /
//! `MCCVLineEntry`. There is no assembler here, so a "label" is just the byte offset of the
//! instruction the `.cv_loc` directive applied to, rather than an `MCSymbol`.
//!
//! # References
//!
//! * `llvm/MC/MCCodeView.h`, `llvm/MC/MCCodeView.cpp`

use crate::encoder::Encoder;
use crate::subsection::{ChecksumKind, SubsectionKind};
use bstr::BStr;
use std::collections::BTreeMap;

/// The state carried by a `.cv_loc` directive: which function it belongs to, and the
/// source position it names.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CvLoc {
    /// The function id (index into the functions this context tracks line tables for) this
    /// location belongs to.
    pub function_id: u32,
    /// 1-based index into [`CodeViewContext::filenames`].
    pub file_num: u32,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column, or 0 if unknown.
    pub column: u16,
    /// Marks the instruction after a function's prologue.
    pub prologue_end: bool,
    /// `true` unless this location only marks an expression boundary.
    pub is_stmt: bool,
}

/// A line table entry: a `.cv_loc` location, tied to the code offset of the instruction
/// assembled immediately after it was seen.
#[derive(Clone, Copy, Debug)]
pub struct CvLineEntry {
    /// Byte offset, from the start of the function, of the instruction this location applies to.
    pub offset: u32,
    /// The `.cv_loc` state in effect when `offset` was assembled.
    pub loc: CvLoc,
}

/// Holds state from `.cv_file` and `.cv_loc` directives for later emission into `.debug$S`.
///
/// Modeled as a plain value owned by whatever stands in for an assembler context here, not a
/// global: nothing in this module reaches for thread-local or process-wide state.
#[derive(Clone, Debug, Default)]
pub struct CodeViewContext {
    /// Absolute or as-given source paths, indexed by `file_num - 1`. An empty string marks an
    /// allocated-but-unused slot (see [`Self::is_unused_file_number`]).
    filenames: Vec<String>,
    /// `true` once a `.cv_loc` directive has set [`Self::current_loc`] and no line entry has
    /// been recorded for it yet.
    loc_seen: bool,
    current_loc: CvLoc,
    /// Line entries recorded so far, grouped by function id, in the order they were recorded.
    lines_by_function: BTreeMap<u32, Vec<CvLineEntry>>,
}

impl CodeViewContext {
    /// Starts an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The "populated" predicate: `true` if `.cv_file n` has already recorded a name for this
    /// slot. This is the reader-side check a `.cv_loc FileNumber` reference should use.
    pub fn is_valid_file_number(&self, n: u32) -> bool {
        if n == 0 {
            return false;
        }
        let idx = (n - 1) as usize;
        self.filenames.get(idx).is_some_and(|name| !name.is_empty())
    }

    /// The complement of [`Self::is_valid_file_number`]: `true` if slot `n` is free for a
    /// `.cv_file` directive to claim, either because it is out of range or because it was never
    /// given a name.
    pub fn is_unused_file_number(&self, n: u32) -> bool {
        if n == 0 {
            return true;
        }
        let idx = (n - 1) as usize;
        self.filenames.get(idx).is_none_or(String::is_empty)
    }

    /// Records a `.cv_file n "filename"` directive. Grows the filename table if needed. Fails
    /// (returns `false`, does not overwrite) if slot `n` is already occupied.
    pub fn add_file(&mut self, n: u32, filename: &str) -> bool {
        assert!(n > 0, "file numbers are 1-based");
        if !self.is_unused_file_number(n) {
            return false;
        }
        let idx = (n - 1) as usize;
        if idx >= self.filenames.len() {
            self.filenames.resize(idx + 1, String::new());
        }
        let filename = if filename.is_empty() { "<stdin>" } else { filename };
        self.filenames[idx] = filename.to_string();
        true
    }

    /// The filenames recorded so far, in file-number order (index 0 is file number 1).
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Records a `.cv_loc` directive's state, to be attached to the next assembled instruction.
    pub fn set_current_loc(&mut self, loc: CvLoc) {
        self.current_loc = loc;
        self.loc_seen = true;
    }

    /// Called when an instruction is assembled. If a `.cv_loc` directive is pending, consumes it
    /// into a new line entry at `offset` and clears the pending flag; otherwise does nothing.
    pub fn record_line_entry(&mut self, offset: u32) {
        if !self.loc_seen {
            return;
        }
        let loc = self.current_loc;
        self.lines_by_function
            .entry(loc.function_id)
            .or_default()
            .push(CvLineEntry { offset, loc });
        self.loc_seen = false;
    }

    /// The line entries recorded for one function id, in recording order.
    pub fn function_line_entries(&self, function_id: u32) -> &[CvLineEntry] {
        self.lines_by_function
            .get(&function_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Serializes a `STRING_TABLE` subsection payload: every filename, in file-number order,
    /// NUL-terminated, with the table itself starting with an implicit empty string at offset 0
    /// (matching [`crate::subsection::StringTable`]'s addressing convention).
    ///
    /// Returns the payload bytes together with each filename's offset (1-based file number ->
    /// byte offset), for use when building the matching `FILE_CHECKSUMS` subsection.
    pub fn emit_string_table(&self) -> (Vec<u8>, Vec<u32>) {
        let mut buf = Vec::new();
        buf.push(0); // offset 0 is the empty string
        let mut offsets = Vec::with_capacity(self.filenames.len());
        for name in &self.filenames {
            offsets.push(buf.len() as u32);
            buf.extend_from_slice(name.as_bytes());
            buf.push(0);
        }
        (buf, offsets)
    }

    /// Serializes a `FILE_CHECKSUMS` subsection payload, with no checksum data recorded (an
    /// assembler that never ran `/ZH` over its inputs has none to report).
    ///
    /// `string_offsets` is the second element returned by [`Self::emit_string_table`], one entry
    /// per filename. Returns the payload bytes together with each filename's `file_key` (a byte
    /// offset into this subsection, per [`crate::subsection::FileChecksumsTable`]'s addressing).
    pub fn emit_file_checksums(&self, string_offsets: &[u32]) -> (Vec<u8>, Vec<u32>) {
        let mut buf = Vec::new();
        let mut file_keys = Vec::with_capacity(string_offsets.len());
        for &name_offset in string_offsets {
            file_keys.push(buf.len() as u32);
            let mut e = Encoder::new(&mut buf);
            e.u32(name_offset);
            e.u8(0); // checksum_size
            e.u8(ChecksumKind::NONE.0);
            // pad to a 4-byte boundary: a 6-byte header needs 2 bytes
            e.u16(0);
        }
        (buf, file_keys)
    }

    /// Serializes a `LINES` subsection payload for one function, grouping this function's
    /// recorded entries into contiguous runs that share a file number, exactly mirroring
    /// `emitLineTableForFunction`'s grouping.
    ///
    /// `file_keys[file_num - 1]` gives the `file_key` to use for each file-segment header,
    /// i.e. the second element returned by [`Self::emit_file_checksums`].
    pub fn emit_line_table_for_function(
        &self,
        function_id: u32,
        code_size: u32,
        file_keys: &[u32],
    ) -> Vec<u8> {
        let entries = self.function_line_entries(function_id);
        let have_columns = entries.iter().any(|e| e.loc.column != 0);

        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        e.u32(0); // reloc_offset: resolved by the linker against this function's symbol
        e.u16(0); // reloc_segment: likewise
        e.u16(if have_columns { 1 } else { 0 });
        e.u32(code_size);

        let mut i = 0;
        while i < entries.len() {
            let file_num = entries[i].loc.file_num;
            let run_end = entries[i..]
                .iter()
                .position(|en| en.loc.file_num != file_num)
                .map_or(entries.len(), |rel| i + rel);
            let run = &entries[i..run_end];

            let file_key = file_keys
                .get((file_num.saturating_sub(1)) as usize)
                .copied()
                .unwrap_or(0);
            let segment_bytes =
                12 + 8 * run.len() as u32 + if have_columns { 4 * run.len() as u32 } else { 0 };

            let mut e = Encoder::new(&mut buf);
            e.u32(file_key);
            e.u32(run.len() as u32);
            e.u32(segment_bytes);
            for entry in run {
                let mut line_and_flags = entry.loc.line & 0x00ff_ffff;
                if entry.loc.is_stmt {
                    line_and_flags |= 0x8000_0000;
                }
                e.u32(entry.offset);
                e.u32(line_and_flags);
            }
            if have_columns {
                for entry in run {
                    e.u16(entry.loc.column);
                    e.u16(entry.loc.column);
                }
            }

            i = run_end;
        }

        buf
    }

    /// Wraps a subsection payload with its `kind`/`size` header and pads it out to a 4-byte
    /// boundary, as every subsection in a `.debug$S` stream must be.
    pub fn wrap_subsection(kind: SubsectionKind, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut e = Encoder::new(&mut buf);
        e.u32(kind.0);
        e.u32(payload.len() as u32);
        e.bytes(payload);
        let pad = (4 - (payload.len() & 3)) & 3;
        for _ in 0..pad {
            e.u8(0);
        }
        buf
    }
}

/// Looks up a filename for display, given a 1-based file number, or `None` if unallocated.
pub fn filename_for(ctx: &CodeViewContext, file_num: u32) -> Option<&BStr> {
    if file_num == 0 {
        return None;
    }
    ctx.filenames
        .get((file_num - 1) as usize)
        .filter(|n| !n.is_empty())
        .map(|n| BStr::new(n.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsection::{FileChecksumsTable, LinesSubsection, StringTable};

    #[test]
    fn file_number_predicates() {
        let mut ctx = CodeViewContext::new();
        assert!(ctx.is_unused_file_number(1));
        assert!(!ctx.is_valid_file_number(1));

        assert!(ctx.add_file(1, "main.c"));
        assert!(ctx.is_valid_file_number(1));
        assert!(!ctx.is_unused_file_number(1));

        // slot 1 is occupied now; a second attempt to claim it fails.
        assert!(!ctx.add_file(1, "other.c"));

        // slot 3 was never named even though the table grew past it.
        assert!(ctx.add_file(4, "other.c"));
        assert!(ctx.is_unused_file_number(3));
        assert!(!ctx.is_valid_file_number(3));
    }

    #[test]
    fn empty_filename_becomes_stdin() {
        let mut ctx = CodeViewContext::new();
        assert!(ctx.add_file(1, ""));
        assert_eq!(ctx.filenames()[0], "<stdin>");
    }

    #[test]
    fn record_line_entry_only_fires_once_per_loc() {
        let mut ctx = CodeViewContext::new();
        ctx.add_file(1, "main.c");
        ctx.set_current_loc(CvLoc {
            function_id: 0,
            file_num: 1,
            line: 10,
            column: 0,
            prologue_end: false,
            is_stmt: true,
        });
        ctx.record_line_entry(0x0);
        ctx.record_line_entry(0x4); // no pending loc: ignored

        let entries = ctx.function_line_entries(0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[0].loc.line, 10);
    }

    #[test]
    fn round_trips_through_the_reader_side_of_this_crate() {
        let mut ctx = CodeViewContext::new();
        ctx.add_file(1, "main.c");

        ctx.set_current_loc(CvLoc {
            function_id: 0,
            file_num: 1,
            line: 5,
            column: 0,
            prologue_end: false,
            is_stmt: true,
        });
        ctx.record_line_entry(0);
        ctx.set_current_loc(CvLoc {
            function_id: 0,
            file_num: 1,
            line: 6,
            column: 0,
            prologue_end: false,
            is_stmt: true,
        });
        ctx.record_line_entry(4);

        let (string_table, string_offsets) = ctx.emit_string_table();
        let (checksums, file_keys) = ctx.emit_file_checksums(&string_offsets);
        let lines = ctx.emit_line_table_for_function(0, 0x10, &file_keys);

        let table = StringTable::new(&string_table);
        assert_eq!(table.get(string_offsets[0]).unwrap(), "main.c");

        let checksums_table = FileChecksumsTable::new(&checksums);
        let entry = checksums_table.get(file_keys[0]).unwrap();
        assert_eq!(
            table.get(entry.header.name_offset.get()).unwrap(),
            "main.c"
        );

        let parsed = LinesSubsection::parse(&lines).unwrap();
        assert_eq!(parsed.header.code_size.get(), 0x10);
        let segments: Vec<_> = parsed.file_segments().collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].header.file_key.get(), file_keys[0]);
        assert_eq!(segments[0].lines().len(), 2);
        assert_eq!(segments[0].lines()[0].line_start(), 5);
        assert_eq!(segments[0].lines()[1].line_start(), 6);
    }
}

//! Two-pass driver: first every `.debug$T` section is scanned to build the user-defined-type
//! name table, then every `.debug$S` section is scanned and dumped, resolving type-index names
//! against that table and linkage names against the object's COFF relocations.

use crate::error::CvError;
use crate::sink::DumpSink;
use crate::type_index::format_type_index;
use anyhow::{bail, Context};
use bstr::BStr;
use codeview::arch::{Arch, ArchReg};
use codeview::subsection::{
    is_jmc_no_step_line, FileChecksumsTable, FrameDataFlags, FrameDataHeader, LinesSubsection,
    StringTable, SubsectionIter, SubsectionKind,
};
use codeview::syms::{Sym, SymData, SymIter};
use codeview::types::fieldlist::{FieldListItem, FieldListIter};
use codeview::types::iter::{build_types_starts, TypesIter};
use codeview::types::{Number, TypeData, TypeIndex};
use codeview::{HasRestLen, IteratorWithRangesExt};
use coff::{CoffObject, RelocationTable, IMAGE_SECTION_HEADER};
use std::collections::HashSet;

/// The fixed `u32` signature that opens every `.debug$T`/`.debug$S` section.
pub const DEBUG_SECTION_MAGIC: u32 = 0x0000_0004;

/// The display name recorded for each type record, indexed by definition order (`0x1000 + i`).
///
/// Append-only: a type stream is scanned front to back, and forward references (a record naming
/// a type index greater than its own) are resolved purely by index, never by linking definitions
/// together, so a lookup against a slot not yet written simply returns `None`.
#[derive(Default)]
pub struct UdtNames {
    names: Vec<Option<String>>,
}

impl UdtNames {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one slot, for the next sequential type index.
    pub fn push(&mut self, name: Option<String>) {
        self.names.push(name);
    }

    /// The number of slots recorded so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// `true` if no slots have been recorded.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The recorded display name for `ti`, if it names a record in range with a non-empty name.
    pub fn get(&self, ti: TypeIndex) -> Option<&str> {
        let slot = ti.stream_index()?;
        self.names.get(slot)?.as_deref()
    }
}

/// Scans one `.debug$T` section, building its UDT-name table and emitting one scope per record.
pub fn scan_type_section(data: &[u8], sink: &mut dyn DumpSink) -> anyhow::Result<UdtNames> {
    let body = check_magic(data, sink)?;
    let starts = build_types_starts(0, body);
    let mut names = UdtNames::new();

    sink.open_list("Types");
    for record in TypesIter::new(body) {
        let ti = TypeIndex(TypeIndex::FIRST_NONPRIMITIVE + names.len() as u32);
        match record.parse() {
            Ok(data) => {
                sink.open_dict(record.kind.name().unwrap_or("LF_??"));
                sink.hex("TypeIndex", ti.0 as u64);
                if let Some(name) = data.display_name() {
                    sink.string("Name", name.as_ref());
                }
                names.push(data.display_name().map(|n| n.to_string()));
                dump_type_extra(&data, body, &starts, &names, sink);
                sink.close();
            }
            Err(_) => {
                sink.line(&format!(
                    "error: failed to decode {:?} record at type index 0x{:04x}",
                    record.kind, ti.0
                ));
                names.push(None);
            }
        }
    }
    sink.close();

    Ok(names)
}

/// Renders a numeric leaf as a decimal field, falling back to its `Display` form for the rare
/// values (128-bit, or a floating-point/decimal encoding) that don't fit in a `u64`.
fn dump_number(sink: &mut dyn DumpSink, name: &str, n: Number<'_>) {
    match n.as_u64() {
        Some(v) => sink.u_num(name, v),
        None => sink.line(&format!("{name}: {n}")),
    }
}

/// Looks up the type record at `ti` by its stream slot, using the byte offsets `scan_type_section`
/// computed up front. Field lists are addressed this way rather than sequentially, since a
/// `field_list` type index can point either earlier or later in the stream.
fn lookup_type_record<'a>(
    body: &'a [u8],
    starts: &[u32],
    ti: TypeIndex,
) -> Option<codeview::types::iter::TypeRecord<'a>> {
    let slot = ti.stream_index()?;
    let start = *starts.get(slot)? as usize;
    TypesIter::new(body.get(start..)?).next()
}

fn dump_type_extra(
    data: &TypeData<'_>,
    body: &[u8],
    starts: &[u32],
    names: &UdtNames,
    sink: &mut dyn DumpSink,
) {
    match data {
        TypeData::Pointer(ptr) => {
            sink.hex("isPointerToMember", ptr.member_tail.is_some() as u64);
        }
        TypeData::Array(arr) => {
            dump_number(sink, "Length", arr.length);
        }
        TypeData::Aggregate(a) => {
            dump_number(sink, "SizeOf", a.size);
            dump_field_list(TypeIndex(a.fixed.field_list.get()), body, starts, names, sink);
        }
        TypeData::Union(u) => {
            dump_number(sink, "SizeOf", u.size);
            dump_field_list(TypeIndex(u.fixed.field_list.get()), body, starts, names, sink);
        }
        TypeData::Enum(e) => {
            dump_field_list(TypeIndex(e.fixed.field_list.get()), body, starts, names, sink);
        }
        _ => {}
    }
}

/// Recurses into the `LF_FIELDLIST` record named by `field_list_ti`, emitting one entry per
/// member. `LF_INDEX` continuations (used when a field list is too large for one record) are
/// followed transparently, so the caller sees one flat `Members` list.
fn dump_field_list(
    field_list_ti: TypeIndex,
    body: &[u8],
    starts: &[u32],
    names: &UdtNames,
    sink: &mut dyn DumpSink,
) {
    if field_list_ti.0 == 0 {
        return;
    }

    sink.open_list("Members");
    let mut ti = field_list_ti;
    loop {
        let Some(record) = lookup_type_record(body, starts, ti) else {
            sink.line(&format!(
                "error: field list {} not found",
                format_type_index(ti, names)
            ));
            break;
        };
        let Ok(TypeData::FieldList(bytes)) = record.parse() else {
            sink.line(&format!(
                "error: {} is not an LF_FIELDLIST",
                format_type_index(ti, names)
            ));
            break;
        };

        let mut next = None;
        for item in FieldListIter::new(bytes) {
            match item {
                FieldListItem::Index { continuation } => next = Some(continuation),
                other => dump_field_list_item(&other, names, sink),
            }
        }
        match next {
            Some(continuation) => ti = continuation,
            None => break,
        }
    }
    sink.close();
}

fn dump_field_list_item(item: &FieldListItem<'_>, names: &UdtNames, sink: &mut dyn DumpSink) {
    const ACCESS_NAMES: &[(u64, &str)] = &[
        (0, "None"),
        (1, "Private"),
        (2, "Protected"),
        (3, "Public"),
    ];

    match item {
        FieldListItem::BaseClass {
            attr,
            base_type,
            offset,
        } => {
            sink.open_dict("BaseClass");
            sink.line(&format!("Type: {}", format_type_index(*base_type, names)));
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            dump_number(sink, "Offset", *offset);
            sink.close();
        }
        FieldListItem::VirtualBaseClass {
            indirect,
            attr,
            base_type,
            vbptr_type,
            vbpoff,
            vbind,
        } => {
            sink.open_dict(if *indirect { "IndirectVirtualBaseClass" } else { "VirtualBaseClass" });
            sink.line(&format!("Type: {}", format_type_index(*base_type, names)));
            sink.line(&format!("VbptrType: {}", format_type_index(*vbptr_type, names)));
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            dump_number(sink, "VbpOffset", *vbpoff);
            dump_number(sink, "VbIndex", *vbind);
            sink.close();
        }
        FieldListItem::Enumerate { attr, value, name } => {
            sink.open_dict("Enumerate");
            sink.string("Name", name.as_ref());
            dump_number(sink, "Value", *value);
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            sink.close();
        }
        FieldListItem::Member {
            attr,
            ty,
            offset,
            name,
        } => {
            sink.open_dict("Member");
            sink.string("Name", name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            dump_number(sink, "Offset", *offset);
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            sink.close();
        }
        FieldListItem::StaticMember { attr, ty, name } => {
            sink.open_dict("StaticMember");
            sink.string("Name", name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            sink.close();
        }
        FieldListItem::Method {
            count,
            method_list,
            name,
        } => {
            sink.open_dict("Method");
            sink.string("Name", name.as_ref());
            sink.u_num("Count", *count as u64);
            sink.line(&format!("MethodList: {}", format_type_index(*method_list, names)));
            sink.close();
        }
        FieldListItem::OneMethod {
            attr,
            ty,
            vtable_offset,
            name,
        } => {
            sink.open_dict("OneMethod");
            sink.string("Name", name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            if let Some(off) = vtable_offset {
                sink.hex("VtableOffset", *off as u64);
            }
            sink.close();
        }
        FieldListItem::NestedType { attr, ty, name } => {
            sink.open_dict("NestedType");
            sink.string("Name", name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.enum_by_name("Access", attr.access() as u64, ACCESS_NAMES);
            sink.close();
        }
        FieldListItem::VirtualFunctionTablePointer { ty } => {
            sink.open_dict("VirtualFunctionTablePointer");
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.close();
        }
        FieldListItem::VirtualFunctionTableOffset { ty, offset } => {
            sink.open_dict("VirtualFunctionTableOffset");
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.hex("Offset", *offset as u64);
            sink.close();
        }
        FieldListItem::FriendClass { ty } => {
            sink.open_dict("FriendClass");
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.close();
        }
        FieldListItem::FriendFunction { ty, name } => {
            sink.open_dict("FriendFunction");
            sink.string("Name", name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(*ty, names)));
            sink.close();
        }
        FieldListItem::Index { .. } => unreachable!("continuations are consumed by dump_field_list"),
    }
}

fn check_magic<'a>(data: &'a [u8], sink: &mut dyn DumpSink) -> anyhow::Result<&'a [u8]> {
    let magic = data
        .get(0..4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
    if magic != Some(DEBUG_SECTION_MAGIC) {
        bail!(CvError::InvalidMagic);
    }
    sink.hex("Magic", DEBUG_SECTION_MAGIC as u64);
    Ok(&data[4..])
}

struct PendingLines<'a> {
    payload_abs_start: usize,
    data: &'a [u8],
}

struct PendingFrameData<'a> {
    payload_abs_start: usize,
    data: &'a [u8],
}

/// Scans one `.debug$S` section: dumps symbol records inline, and holds `Lines`/`FrameData`
/// subsections until the subsection loop completes (so they can be keyed and deduplicated by
/// linkage name) per the ordering requirement in the orchestrator state machine.
pub fn dump_debug_s_section(
    obj: &CoffObject<'_>,
    section: &IMAGE_SECTION_HEADER,
    names: &UdtNames,
    sink: &mut dyn DumpSink,
) -> anyhow::Result<()> {
    let bytes = obj.section_data(section)?;
    let body = check_magic(bytes, sink)?;
    let relocs = obj.relocations(section)?;

    let mut string_table: Option<&[u8]> = None;
    let mut file_checksums: Option<&[u8]> = None;
    let mut pending_lines: Vec<PendingLines> = Vec::new();
    let mut pending_framedata: Vec<PendingFrameData> = Vec::new();

    for (range, subsec) in SubsectionIter::new(body).with_ranges() {
        // `range` is relative to `body` (i.e. excludes the 4-byte magic); the 8-byte subsection
        // header (kind + size) precedes the payload within that range.
        let payload_abs_start = 4 + range.start + 8;
        let kind = subsec.kind.without_ignore_bit();

        if subsec.kind.is_ignored() {
            continue;
        }

        if kind.0 == SubsectionKind::SYMBOLS.0 {
            dump_symbols(subsec.data, payload_abs_start, obj, &relocs, names, sink)?;
        } else if kind.0 == SubsectionKind::STRING_TABLE.0 {
            if string_table.is_some() {
                sink.line(&format!("error: {}", CvError::DuplicateSubsection));
                continue;
            }
            string_table = Some(subsec.data);
        } else if kind.0 == SubsectionKind::FILE_CHECKSUMS.0 {
            if file_checksums.is_some() {
                sink.line(&format!("error: {}", CvError::DuplicateSubsection));
                continue;
            }
            file_checksums = Some(subsec.data);
        } else if kind.0 == SubsectionKind::LINES.0 {
            pending_lines.push(PendingLines {
                payload_abs_start,
                data: subsec.data,
            });
        } else if kind.0 == SubsectionKind::FRAMEDATA.0 {
            pending_framedata.push(PendingFrameData {
                payload_abs_start,
                data: subsec.data,
            });
        } else {
            sink.line(&format!(
                "{}: {} bytes (not dumped)",
                subsec.kind.name().unwrap_or("??"),
                subsec.data.len()
            ));
        }
    }

    let strings = StringTable::new(string_table.unwrap_or(&[]));
    let checksums = FileChecksumsTable::new(file_checksums.unwrap_or(&[]));

    let mut seen_functions: HashSet<String> = HashSet::new();

    for pending in &pending_lines {
        if let Err(e) = dump_lines_subsection(pending, obj, &relocs, &strings, &checksums, &mut seen_functions, sink) {
            sink.line(&format!("error: {e:#}"));
        }
    }

    for pending in &pending_framedata {
        if let Err(e) = dump_framedata_subsection(pending, obj, &relocs, &strings, &mut seen_functions, sink) {
            sink.line(&format!("error: {e:#}"));
        }
    }

    Ok(())
}

/// Maps a COFF `Machine` value to the register set a `Register` field in a symbol record should
/// be interpreted with. Unrecognized machines fall back to AMD64, the common case for this
/// crate's inputs; an unrecognized register index still renders as `??(0x..)` rather than panic.
fn arch_of(machine: u16) -> Arch {
    use coff::IMAGE_FILE_MACHINE;
    match IMAGE_FILE_MACHINE(machine) {
        IMAGE_FILE_MACHINE::IMAGE_FILE_MACHINE_I386 => Arch::X86,
        IMAGE_FILE_MACHINE::IMAGE_FILE_MACHINE_ARM64 => Arch::ARM64,
        _ => Arch::AMD64,
    }
}

fn resolve_linkage_name<'a>(
    obj: &CoffObject<'a>,
    relocs: &RelocationTable,
    abs_offset: usize,
) -> anyhow::Result<&'a BStr> {
    let reloc = relocs
        .at_offset(abs_offset as u32)
        .ok_or(CvError::UnresolvedRelocation)?;
    let index = reloc.symbol_table_index.get() as usize;
    let symbol = obj
        .symbols()
        .get(index)
        .with_context(|| format!("relocation at 0x{abs_offset:x} names out-of-range symbol {index}"))?;
    obj.symbol_name(symbol)
}

fn dump_symbols<'a>(
    data: &'a [u8],
    payload_abs_start: usize,
    obj: &CoffObject<'a>,
    relocs: &RelocationTable,
    names: &UdtNames,
    sink: &mut dyn DumpSink,
) -> anyhow::Result<()> {
    sink.open_list("Symbols");
    let mut in_function_scope = false;
    let mut open_scopes = 0u32;

    for (range, sym) in SymIter::new(data).with_ranges() {
        let record_abs_start = payload_abs_start + range.start + 4;
        match dump_one_symbol(&sym, record_abs_start, obj, relocs, names, sink, &mut in_function_scope) {
            Ok(starts) => {
                if starts {
                    open_scopes += 1;
                }
                if sym.kind.ends_scope() && open_scopes > 0 {
                    open_scopes -= 1;
                }
            }
            Err(e) => sink.line(&format!("error: {e:#}")),
        }
    }

    for _ in 0..open_scopes {
        sink.close();
    }
    sink.close();
    Ok(())
}

/// Dumps one symbol record. Returns whether this record opened a scope that must later be closed
/// by a matching `S_END`/`S_PROC_ID_END` (rather than closed immediately, as leaf records are).
fn dump_one_symbol<'a>(
    sym: &Sym<'a>,
    record_abs_start: usize,
    obj: &CoffObject<'a>,
    relocs: &RelocationTable,
    names: &UdtNames,
    sink: &mut dyn DumpSink,
    in_function_scope: &mut bool,
) -> anyhow::Result<bool> {
    if sym.kind.ends_scope() {
        sink.line(sym.kind.name().unwrap_or("S_END"));
        if sym.kind.is_proc() || *in_function_scope {
            *in_function_scope = false;
        }
        sink.close();
        return Ok(false);
    }

    let data = sym.parse().context("decoding symbol record")?;
    let starts_scope = sym.kind.starts_scope();
    sink.open_dict(sym.kind.name().unwrap_or("S_??"));

    match &data {
        SymData::Proc(proc) => {
            if *in_function_scope {
                bail!(CvError::InvariantViolation(
                    "ProcStart encountered while already inside a procedure scope".into()
                ));
            }
            *in_function_scope = true;
            sink.string("Name", proc.name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(TypeIndex(proc.fixed.proc_type.get()), names)));
            sink.hex("CodeSize", proc.fixed.proc_len.get() as u64);
            let code_offset_abs = record_abs_start + 28;
            match resolve_linkage_name(obj, relocs, code_offset_abs) {
                Ok(name) => sink.string("LinkageName", name.as_ref()),
                Err(_) => sink.line("LinkageName: <unresolved relocation>"),
            }
            sink.flags_by_name(
                "Flags",
                proc.flags().bits() as u64,
                &[
                    (ProcFlagsBits::NOFPO, "NoFPO"),
                    (ProcFlagsBits::INT, "Interrupt"),
                    (ProcFlagsBits::FAR, "Far"),
                    (ProcFlagsBits::NEVER, "Never"),
                    (ProcFlagsBits::NOTREACHED, "NotReached"),
                    (ProcFlagsBits::CUST_CALL, "CustomCallingConvention"),
                    (ProcFlagsBits::NOINLINE, "NoInline"),
                    (ProcFlagsBits::OPTDBGINFO, "OptimizedDebugInfo"),
                ],
            );
        }
        SymData::Udt(udt) => {
            sink.string("Name", udt.name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(udt.type_, names)));
        }
        SymData::Data(d) => {
            sink.string("Name", d.name.as_ref());
            sink.line(&format!(
                "Type: {}",
                format_type_index(TypeIndex(d.header.type_.get()), names)
            ));
        }
        SymData::ThreadData(d) => {
            sink.string("Name", d.name.as_ref());
            sink.line(&format!(
                "Type: {}",
                format_type_index(TypeIndex(d.header.type_.get()), names)
            ));
        }
        SymData::RegRel(r) => {
            sink.string("Name", r.name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(TypeIndex(r.fixed.ty.get()), names)));
            sink.hex("Offset", r.fixed.offset.get() as u64);
            let reg = ArchReg::new(arch_of(obj.header().machine.get()), r.fixed.register.get());
            sink.line(&format!("Register: {reg}"));
        }
        SymData::BpRel(r) => {
            sink.string("Name", r.name.as_ref());
            sink.line(&format!("Type: {}", format_type_index(TypeIndex(r.fixed.ty.get()), names)));
            sink.hex("Offset", r.fixed.offset.get() as i64 as u64);
        }
        SymData::Local(l) => {
            sink.string("Name", l.name.as_ref());
            sink.line(&format!(
                "Type: {}",
                format_type_index(TypeIndex(l.fixed.ty.get()), names)
            ));
        }
        SymData::Constant(c) => {
            sink.string("Name", c.name.as_ref());
        }
        SymData::Pub(p) => {
            sink.string("Name", p.name.as_ref());
        }
        SymData::Block(_) => {
            sink.line("(lexical block)");
        }
        SymData::FrameProc(fp) => {
            sink.hex("FrameSize", fp.frame_size.get() as u64);
            sink.flags_by_name(
                "Flags",
                fp.flags().bits() as u64,
                &[
                    (FrameProcFlagsBits::USES_ALLOCA, "UsesAlloca"),
                    (FrameProcFlagsBits::USES_SETJMP, "UsesSetJmp"),
                    (FrameProcFlagsBits::USES_LONGJMP, "UsesLongJmp"),
                    (FrameProcFlagsBits::USES_EH, "UsesEH"),
                    (FrameProcFlagsBits::HAS_SEH, "HasSEH"),
                    (FrameProcFlagsBits::NAKED, "Naked"),
                    (FrameProcFlagsBits::SECURITY_CHECKS, "SecurityChecks"),
                    (FrameProcFlagsBits::GS_CHECK, "GSCheck"),
                    (FrameProcFlagsBits::SAFE_BUFFERS, "SafeBuffers"),
                ],
            );
        }
        SymData::ObjName(o) => {
            sink.string("Name", o.name.as_ref());
        }
        SymData::Compile3(c) => {
            sink.string("Version", c.name.as_ref());
        }
        SymData::Label(l) => {
            sink.string("Name", l.name.as_ref());
        }
        SymData::UsingNamespace(u) => {
            sink.string("Name", u.namespace.as_ref());
        }
        SymData::Unknown => {
            sink.binary_block("Data", sym.data);
        }
        _ => {
            sink.line(&format!("{:?}", data));
        }
    }

    if !starts_scope {
        sink.close();
    }
    Ok(starts_scope)
}

/// Named bit constants mirrored from [`codeview::syms::ProcFlags`], since `bitflags!`-style
/// constants aren't directly usable as `u64` table entries.
struct ProcFlagsBits;
impl ProcFlagsBits {
    const NOFPO: u64 = 1 << 0;
    const INT: u64 = 1 << 1;
    const FAR: u64 = 1 << 2;
    const NEVER: u64 = 1 << 3;
    const NOTREACHED: u64 = 1 << 4;
    const CUST_CALL: u64 = 1 << 5;
    const NOINLINE: u64 = 1 << 6;
    const OPTDBGINFO: u64 = 1 << 7;
}

/// Named bit constants mirrored from [`codeview::syms::FrameProcFlags`], since `bitflags!`-style
/// constants aren't directly usable as `u64` table entries.
struct FrameProcFlagsBits;
impl FrameProcFlagsBits {
    const USES_ALLOCA: u64 = 1 << 0;
    const USES_SETJMP: u64 = 1 << 1;
    const USES_LONGJMP: u64 = 1 << 2;
    const USES_EH: u64 = 1 << 4;
    const HAS_SEH: u64 = 1 << 6;
    const NAKED: u64 = 1 << 7;
    const SECURITY_CHECKS: u64 = 1 << 8;
    const GS_CHECK: u64 = 1 << 12;
    const SAFE_BUFFERS: u64 = 1 << 13;
}

fn dump_lines_subsection<'a>(
    pending: &PendingLines<'a>,
    obj: &CoffObject<'a>,
    relocs: &RelocationTable,
    strings: &StringTable<'a>,
    checksums: &FileChecksumsTable<'a>,
    seen_functions: &mut HashSet<String>,
    sink: &mut dyn DumpSink,
) -> anyhow::Result<()> {
    let linkage_name = resolve_linkage_name(obj, relocs, pending.payload_abs_start)
        .context("resolving Lines subsection linkage name")?;

    if !seen_functions.insert(linkage_name.to_string()) {
        bail!(CvError::DuplicateFunction(linkage_name.to_string()));
    }

    let lines = LinesSubsection::parse(pending.data).map_err(|_| CvError::MalformedRecord)?;

    sink.open_dict("FunctionLineTable");
    sink.string("LinkageName", linkage_name.as_ref());
    sink.hex("CodeSize", lines.header.code_size.get() as u64);
    sink.hex("Flags", lines.header.flags.get() as u64);

    for segment in lines.file_segments() {
        let entry_count = segment.header.entry_count.get() as usize;
        let expected = 12 + 8 * entry_count
            + if lines.header.have_columns() { 4 * entry_count } else { 0 };
        if segment.header.segment_bytes.get() as usize != expected {
            bail!(CvError::InvariantViolation(format!(
                "segment_bytes {} does not match 12 + 8*{entry_count} (+columns)",
                segment.header.segment_bytes.get()
            )));
        }

        let file_key = segment.header.file_key.get();
        let filename = checksums
            .get(file_key)
            .ok()
            .and_then(|fc| strings.get(fc.header.name_offset.get()).ok());

        sink.open_dict("FilenameSegment");
        match filename {
            Some(name) => sink.string("Filename", name.as_ref()),
            None => sink.line("Filename: <unresolved>"),
        }

        let columns = segment.columns();
        for (i, entry) in segment.lines().iter().enumerate() {
            if entry.offset.get() >= lines.header.code_size.get() {
                bail!(CvError::InvariantViolation(format!(
                    "line entry offset 0x{:x} is not less than code_size 0x{:x}",
                    entry.offset.get(),
                    lines.header.code_size.get()
                )));
            }

            let line_text = if is_jmc_no_step_line(entry.line_start()) {
                "<no-step>".to_string()
            } else {
                entry.line_start().to_string()
            };
            let mut text = format!("+0x{:x} -> {line_text}", entry.offset.get());
            if let Some(cols) = columns {
                if let Some(c) = cols.get(i) {
                    text.push_str(&format!(" (col {}..{})", c.start_column.get(), c.end_column.get()));
                }
            }
            sink.line(&text);
        }
        sink.close();
    }

    sink.close();
    Ok(())
}

fn dump_framedata_subsection<'a>(
    pending: &PendingFrameData<'a>,
    obj: &CoffObject<'a>,
    relocs: &RelocationTable,
    strings: &StringTable<'a>,
    seen_functions: &mut HashSet<String>,
    sink: &mut dyn DumpSink,
) -> anyhow::Result<()> {
    let linkage_name = resolve_linkage_name(obj, relocs, pending.payload_abs_start)
        .context("resolving FrameData subsection linkage name")?;

    if !seen_functions.insert(format!("frame:{linkage_name}")) {
        bail!(CvError::DuplicateFunction(linkage_name.to_string()));
    }

    let body = pending
        .data
        .get(4..)
        .ok_or(CvError::MalformedRecord)?;
    let header = <FrameDataHeader as zerocopy::FromBytes>::ref_from_bytes(body)
        .map_err(|_| CvError::MalformedRecord)?;

    sink.open_dict("FrameData");
    sink.string("LinkageName", linkage_name.as_ref());
    sink.hex("CodeSize", header.code_size.get() as u64);
    sink.hex("LocalsSize", header.locals_size.get() as u64);
    sink.hex("ParamsSize", header.params_size.get() as u64);
    sink.hex("MaxStackSize", header.max_stack_size.get() as u64);
    if let Ok(name) = strings.get(header.frame_func_string_offset.get()) {
        sink.string("FrameFunc", name.as_ref());
    }
    sink.flags_by_name(
        "Flags",
        header.flags.get() as u64,
        &[
            (FrameDataFlags::HAS_SEH as u64, "HasSEH"),
            (FrameDataFlags::HAS_EH as u64, "HasEH"),
            (FrameDataFlags::IS_FUNCTION_START as u64, "IsFunctionStart"),
        ],
    );
    sink.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::TextSink;

    #[test]
    fn empty_debug_t_yields_an_empty_table_and_the_magic_field() {
        let data = [0x04, 0x00, 0x00, 0x00];
        let mut sink = TextSink::new();
        let names = scan_type_section(&data, &mut sink).unwrap();
        assert!(names.is_empty());
        let out = sink.into_string();
        assert!(out.contains("Magic: 0x4"));
    }

    #[test]
    fn arch_of_maps_known_machines_and_falls_back_to_amd64() {
        assert_eq!(arch_of(0x014c), Arch::X86);
        assert_eq!(arch_of(0xaa64), Arch::ARM64);
        assert_eq!(arch_of(0x8664), Arch::AMD64);
        assert_eq!(arch_of(0x0000), Arch::AMD64); // unknown machine falls back rather than panics
    }

    #[test]
    fn missing_magic_is_rejected() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut sink = TextSink::new();
        let err = scan_type_section(&data, &mut sink).unwrap_err();
        assert!(err.to_string().to_lowercase().contains("magic"));
    }

    #[test]
    fn single_string_id_is_recorded_at_slot_zero() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x04, 0x00, 0x00, 0x00,                 // magic
            0x0a, 0x00, 0x05, 0x16,                  // len=10, kind=LF_STRING_ID
            0x00, 0x00, 0x00, 0x00,                  // parent_scope = 0
            b'a', b'b', b'c', 0x00,                  // name "abc"
        ];
        let mut sink = TextSink::new();
        let names = scan_type_section(data, &mut sink).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names.get(TypeIndex(0x1000)), Some("abc"));
    }

    #[test]
    fn lf_class_with_size_and_name_is_recorded() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x04, 0x00, 0x00, 0x00,                          // magic
            0x18, 0x00, 0x04, 0x15,                          // len=24, kind=LF_CLASS
            0x02, 0x00,                                      // member_count = 2
            0x00, 0x00,                                      // properties = 0
            0x00, 0x10, 0x00, 0x00,                          // field_list = 0x1000
            0x00, 0x00, 0x00, 0x00,                          // derived_list = 0
            0x00, 0x00, 0x00, 0x00,                          // vtable_shape = 0
            0x02, 0x00,                                      // size: inline numeric leaf = 2
            b'F', b'o', b'o', 0x00,                          // name "Foo"
        ];
        let mut sink = TextSink::new();
        let names = scan_type_section(data, &mut sink).unwrap();
        assert_eq!(names.get(TypeIndex(0x1000)), Some("Foo"));
        let out = sink.into_string();
        assert!(out.contains("TypeIndex: 0x1000"));
        assert!(out.contains("Name: Foo"));
        assert!(out.contains("SizeOf: 2"));
    }

    #[test]
    fn lf_fieldlist_members_are_recursed_into() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0x04, 0x00, 0x00, 0x00,                          // magic

            // slot 0 (type index 0x1000): LF_FIELDLIST with one LF_MEMBER
            0x0e, 0x00, 0x03, 0x12,                          // len=14, kind=LF_FIELDLIST
            0x05, 0x14,                                      // LF_MEMBER
            0x03, 0x00,                                      // attr = public
            0x20, 0x10, 0x00, 0x00,                          // type = 0x1020
            0x04, 0x00,                                      // offset: inline numeric leaf = 4
            b'x', 0x00,                                      // name "x"

            // slot 1 (type index 0x1001): LF_CLASS referencing the field list above
            0x18, 0x00, 0x04, 0x15,                          // len=24, kind=LF_CLASS
            0x02, 0x00,                                      // member_count = 2
            0x00, 0x00,                                      // properties = 0
            0x00, 0x10, 0x00, 0x00,                          // field_list = 0x1000
            0x00, 0x00, 0x00, 0x00,                          // derived_list = 0
            0x00, 0x00, 0x00, 0x00,                          // vtable_shape = 0
            0x02, 0x00,                                      // size: inline numeric leaf = 2
            b'F', b'o', b'o', 0x00,                          // name "Foo"
        ];
        let mut sink = TextSink::new();
        let names = scan_type_section(data, &mut sink).unwrap();
        assert_eq!(names.get(TypeIndex(0x1001)), Some("Foo"));

        let out = sink.into_string();
        assert!(out.contains("TypeIndex: 0x1001"));
        assert!(out.contains("SizeOf: 2"));
        assert!(out.contains("Members: ["));
        assert!(out.contains("Name: \"x\""));
        assert!(out.contains("Offset: 4"));
    }

    #[test]
    fn lf_pointer_to_member_function_reports_the_tail() {
        use codeview::types::{Leaf, TypeData, CV_PTR_MODE_PMFUNC};
        use codeview::parser::Parser;

        // kind=Near64 (0x0a), mode=PointerToMemberFunction (3) at bits [5:8) -> attrs = 0x0a | (3 << 5)
        let attrs: u32 = 0x0a | (3 << 5);
        #[rustfmt::skip]
        let body: &[u8] = &[
            0x03, 0x10, 0x00, 0x00,                          // referent = 0x1003
            (attrs & 0xff) as u8, (attrs >> 8) as u8, 0x00, 0x00,
            0x03, 0x10, 0x00, 0x00,                          // containing_class = 0x1003
            0x06, 0x00,                                      // representation = GeneralFunction (6)
        ];
        let mut p = Parser::new(body);
        let parsed = TypeData::parse(Leaf::LF_POINTER, &mut p).unwrap();
        let ptr = match parsed {
            TypeData::Pointer(ptr) => ptr,
            other => panic!("expected Pointer, got {other:?}"),
        };
        assert!(ptr.flags().is_pointer_to_member());
        assert_eq!(ptr.flags().mode(), CV_PTR_MODE_PMFUNC);
        let tail = ptr.member_tail.expect("pointer-to-member tail");
        assert_eq!(tail.containing_class.get(), 0x1003);
        assert_eq!(tail.representation.get(), 6);
    }
}

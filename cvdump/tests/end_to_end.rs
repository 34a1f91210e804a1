//! End-to-end scenarios exercising the orchestrator against a synthetic COFF object: one
//! function's `Lines` subsection, and the duplicate-function error this crate reports when two
//! `Lines` subsections resolve to the same linkage name.

use coff::{CoffObject, IMAGE_FILE_HEADER, IMAGE_RELOCATION, IMAGE_SECTION_HEADER, IMAGE_SYMBOL};
use codeview::mc_emit::{CodeViewContext, CvLoc};
use codeview::subsection::SubsectionKind;
use cvdump::orchestrator::{dump_debug_s_section, UdtNames};
use cvdump::sink::TextSink;
use zerocopy::byteorder::{LE, I16, U16, U32};
use zerocopy::IntoBytes;

/// Builds a `.debug$S` section body (including the leading magic) for a single function
/// `linkage_name`, with one `Lines` subsection over `[0, code_size)`.
fn build_debug_s_body(code_size: u32) -> Vec<u8> {
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

    let (string_table, string_offsets) = ctx.emit_string_table();
    let (checksums, file_keys) = ctx.emit_file_checksums(&string_offsets);
    let lines = ctx.emit_line_table_for_function(0, code_size, &file_keys);

    let mut body = 4u32.to_le_bytes().to_vec(); // DEBUG_SECTION_MAGIC
    body.extend(CodeViewContext::wrap_subsection(SubsectionKind::STRING_TABLE, &string_table));
    body.extend(CodeViewContext::wrap_subsection(SubsectionKind::FILE_CHECKSUMS, &checksums));
    body.extend(CodeViewContext::wrap_subsection(SubsectionKind::LINES, &lines));
    body
}

/// Offset, from the start of a `.debug$S` section's body (magic included), of the `reloc_offset`
/// field inside its (first and only) `Lines` subsection — the spot a relocation must target for
/// the orchestrator to resolve that function's linkage name.
fn lines_reloc_offset(body: &[u8]) -> u32 {
    use codeview::subsection::SubsectionIter;
    use codeview::{HasRestLen, IteratorWithRangesExt};

    for (range, subsec) in SubsectionIter::new(&body[4..]).with_ranges() {
        if subsec.kind.without_ignore_bit().0 == SubsectionKind::LINES.0 {
            return (4 + range.start + 8) as u32;
        }
    }
    panic!("no Lines subsection found");
}

/// Assembles a minimal one-section COFF object: a single `.debug$S` section with `body` as its
/// raw data, a symbol table with one external symbol named `_main`, and one relocation in the
/// `.debug$S` section pointing `reloc_offset` at that symbol.
fn build_object(body: &[u8], reloc_offset: u32) -> Vec<u8> {
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
        size_of_raw_data: body.len() as u32,
        pointer_to_raw_data: 0, // patched below
        pointer_to_relocations: 0, // patched below
        pointer_to_linenumbers: 0,
        number_of_relocations: 1,
        number_of_linenumbers: 0,
        characteristics: Default::default(),
    };

    let mut name = [0u8; 8];
    name[..5].copy_from_slice(b"_main");
    let symbol = IMAGE_SYMBOL {
        name,
        value: U32::new(0),
        section_number: I16::new(1),
        kind: U16::new(0),
        storage_class: coff::SymbolStorageClass::EXTERNAL,
        number_of_aux_symbols: 0,
    };

    let reloc = IMAGE_RELOCATION {
        virtual_address: U32::new(reloc_offset),
        symbol_table_index: U32::new(0),
        relocation_type: U16::new(0),
    };

    let mut bytes = header.as_bytes().to_vec();
    let header_len = bytes.len();
    bytes.extend_from_slice(section.as_bytes());
    let section_header_offset = header_len;

    let section_data_offset = bytes.len();
    bytes.extend_from_slice(body);

    let relocs_offset = bytes.len();
    bytes.extend_from_slice(reloc.as_bytes());

    let symbols_offset = bytes.len();
    bytes.extend_from_slice(symbol.as_bytes());

    bytes[8..12].copy_from_slice(&(symbols_offset as u32).to_le_bytes());
    bytes[section_header_offset + 20..section_header_offset + 24]
        .copy_from_slice(&(section_data_offset as u32).to_le_bytes());
    bytes[section_header_offset + 24..section_header_offset + 28]
        .copy_from_slice(&(relocs_offset as u32).to_le_bytes());

    bytes
}

#[test]
fn one_function_lines_subsection_dumps_its_line_table() {
    let body = build_debug_s_body(0x10);
    let reloc_offset = lines_reloc_offset(&body);
    let bytes = build_object(&body, reloc_offset);

    let obj = CoffObject::parse(&bytes).unwrap();
    let (_, section) = obj.section_by_name(".debug$S").unwrap();
    let names = UdtNames::new();
    let mut sink = TextSink::new();
    dump_debug_s_section(&obj, section, &names, &mut sink).unwrap();

    let out = sink.into_string();
    assert!(out.contains("LinkageName:") && out.contains("_main"), "{out}");
    assert!(out.contains("Filename:") && out.contains("main.c"), "{out}");
    assert!(out.contains("+0x0 -> 5"), "{out}");
}

#[test]
fn duplicate_lines_for_the_same_function_is_reported_once() {
    let one = build_debug_s_body(0x10);
    let reloc_offset_one = lines_reloc_offset(&one);

    // Concatenate two independent `.debug$S` bodies' worth of subsections (sans the second
    // magic) so the section contains two `Lines` subsections, both resolving to `_main`.
    let two_subsections = &one[4..];
    let mut body = one.clone();
    let second_subsections_start = body.len();
    body.extend_from_slice(two_subsections);

    let reloc_offset_two = (second_subsections_start + (lines_reloc_offset(&one) as usize - 4)) as u32;

    let header = IMAGE_FILE_HEADER {
        machine: U16::new(0x8664),
        number_of_sections: U16::new(1),
        time_date_stamp: U32::new(0),
        pointer_to_symbol_table: U32::new(0),
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
        size_of_raw_data: body.len() as u32,
        pointer_to_raw_data: 0,
        pointer_to_relocations: 0,
        pointer_to_linenumbers: 0,
        number_of_relocations: 2,
        number_of_linenumbers: 0,
        characteristics: Default::default(),
    };

    let mut name = [0u8; 8];
    name[..5].copy_from_slice(b"_main");
    let symbol = IMAGE_SYMBOL {
        name,
        value: U32::new(0),
        section_number: I16::new(1),
        kind: U16::new(0),
        storage_class: coff::SymbolStorageClass::EXTERNAL,
        number_of_aux_symbols: 0,
    };

    let relocs = [
        IMAGE_RELOCATION {
            virtual_address: U32::new(reloc_offset_one),
            symbol_table_index: U32::new(0),
            relocation_type: U16::new(0),
        },
        IMAGE_RELOCATION {
            virtual_address: U32::new(reloc_offset_two),
            symbol_table_index: U32::new(0),
            relocation_type: U16::new(0),
        },
    ];

    let mut bytes = header.as_bytes().to_vec();
    let header_len = bytes.len();
    bytes.extend_from_slice(section.as_bytes());
    let section_header_offset = header_len;

    let section_data_offset = bytes.len();
    bytes.extend_from_slice(&body);

    let relocs_offset = bytes.len();
    bytes.extend_from_slice(relocs[0].as_bytes());
    bytes.extend_from_slice(relocs[1].as_bytes());

    let symbols_offset = bytes.len();
    bytes.extend_from_slice(symbol.as_bytes());

    bytes[8..12].copy_from_slice(&(symbols_offset as u32).to_le_bytes());
    bytes[section_header_offset + 20..section_header_offset + 24]
        .copy_from_slice(&(section_data_offset as u32).to_le_bytes());
    bytes[section_header_offset + 24..section_header_offset + 28]
        .copy_from_slice(&(relocs_offset as u32).to_le_bytes());

    let obj = CoffObject::parse(&bytes).unwrap();
    let (_, section) = obj.section_by_name(".debug$S").unwrap();
    let names = UdtNames::new();
    let mut sink = TextSink::new();
    dump_debug_s_section(&obj, section, &names, &mut sink).unwrap();

    let out = sink.into_string();
    let function_dumps = out.matches("FunctionLineTable").count();
    assert_eq!(function_dumps, 1, "only the first Lines subsection should be emitted: {out}");
    assert!(out.to_lowercase().contains("duplicate"), "{out}");
}

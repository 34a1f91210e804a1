//! CLI entry point: opens a COFF object file, drives the orchestrator over its `.debug$T` and
//! `.debug$S` sections, and writes the resulting dump to stdout. See [`crate::orchestrator`].

#![forbid(unused_must_use)]

use anyhow::Context;
use clap::Parser;
use coff::CoffObject;
use cvdump::orchestrator;
use cvdump::sink::{DumpSink, TextSink};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;

/// Dumps CodeView debug information (`.debug$S` / `.debug$T`) from a COFF object file.
#[derive(Parser)]
#[command(name = "cvdump", version, about)]
struct Args {
    /// One or more COFF object files (`.obj`) to dump.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Dump the raw bytes of each `.debug$S` subsection alongside its decoded contents.
    #[arg(long)]
    codeview_subsection_bytes: bool,

    /// Dump each section's COFF relocation table.
    #[arg(long)]
    section_relocations: bool,

    /// Dump the COFF symbol table.
    #[arg(long)]
    section_symbols: bool,

    /// Dump the raw bytes of every section.
    #[arg(long)]
    section_data: bool,

    /// When dumping relocations, also print the resolved symbol name for each entry.
    #[arg(long)]
    expand_relocs: bool,

    /// Increase logging verbosity. Repeat for more (`-v` = debug, `-vv` = trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    configure_tracing(args.verbose);

    let mut any_error = false;
    for input in &args.inputs {
        if let Err(e) = dump_one_file(&args, input) {
            eprintln!("{input:?}: {e:#}");
            any_error = true;
        }
    }

    if any_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn configure_tracing(verbose: u8) {
    let max_level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn dump_one_file(args: &Args, path: &PathBuf) -> anyhow::Result<()> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(2);
        }
    };

    let obj = CoffObject::parse(&bytes).context("parsing COFF object")?;
    let mut sink = TextSink::new();

    sink.open_dict(&path.display().to_string());

    if args.section_data || args.section_symbols || args.section_relocations {
        dump_object_overview(args, &obj, &mut sink)?;
    }

    // §5: `.debug$T` is scanned before any `.debug$S` so type-index names can be resolved.
    let mut names = orchestrator::UdtNames::new();
    for (_, section) in obj.sections_by_name(".debug$T") {
        let data = obj.section_data(section)?;
        sink.open_dict(".debug$T");
        match orchestrator::scan_type_section(data, &mut sink) {
            Ok(scanned) => names = scanned,
            Err(e) => sink.line(&format!("error: {e:#}")),
        }
        sink.close();
    }

    for (_, section) in obj.sections_by_name(".debug$S") {
        sink.open_dict(".debug$S");
        if args.codeview_subsection_bytes {
            dump_raw_subsection_bytes(&obj, section, &mut sink)?;
        }
        if let Err(e) = orchestrator::dump_debug_s_section(&obj, section, &names, &mut sink) {
            sink.line(&format!("error: {e:#}"));
        }
        sink.close();
    }

    sink.close();
    print!("{}", sink.into_string());
    Ok(())
}

fn dump_raw_subsection_bytes(
    obj: &CoffObject<'_>,
    section: &coff::IMAGE_SECTION_HEADER,
    sink: &mut dyn DumpSink,
) -> anyhow::Result<()> {
    use codeview::subsection::SubsectionIter;

    let data = obj.section_data(section)?;
    let body = data.get(4..).unwrap_or(&[]);
    sink.open_list("RawSubsections");
    for subsec in SubsectionIter::new(body) {
        sink.open_dict(subsec.kind.name().unwrap_or("??"));
        sink.binary_block("Bytes", subsec.data);
        sink.close();
    }
    sink.close();
    Ok(())
}

fn dump_object_overview(
    args: &Args,
    obj: &CoffObject<'_>,
    sink: &mut dyn DumpSink,
) -> anyhow::Result<()> {
    let machine = obj.header().machine.get();

    if args.section_symbols {
        sink.open_list("Symbols");
        for (index, sym) in obj.primary_symbols() {
            sink.open_dict(&format!("[{index}]"));
            match obj.symbol_name(sym) {
                Ok(name) => sink.string("Name", name.as_ref()),
                Err(_) => sink.line("Name: <unresolved>"),
            }
            sink.hex("Value", sym.value.get() as u64);
            sink.u_num("SectionNumber", sym.section_number.get() as u64);
            sink.close();
        }
        sink.close();
    }

    if args.section_data || args.section_relocations {
        sink.open_list("Sections");
        for section in obj.sections() {
            sink.open_dict(&section.name().to_string());

            if args.section_data {
                let data = obj.section_data(section)?;
                sink.binary_block("Data", data);
            }

            if args.section_relocations {
                let relocs = obj.relocations(section)?;
                sink.open_list("Relocations");
                for reloc in relocs.entries() {
                    sink.open_dict("Relocation");
                    sink.hex("VirtualAddress", reloc.virtual_address.get() as u64);
                    let type_name =
                        coff::reloc_type_str(coff::IMAGE_FILE_MACHINE(machine), reloc.relocation_type.get())
                            .unwrap_or("??");
                    sink.line(&format!("Type: {type_name}"));
                    if args.expand_relocs {
                        let index = reloc.symbol_table_index.get() as usize;
                        match obj.symbols().get(index).and_then(|s| obj.symbol_name(s).ok()) {
                            Some(name) => sink.string("Symbol", name.as_ref()),
                            None => sink.line("Symbol: <unresolved>"),
                        }
                    }
                    sink.close();
                }
                sink.close();
            }

            sink.close();
        }
        sink.close();
    }

    Ok(())
}

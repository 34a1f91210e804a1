//! A structured, scope-stack dump sink: the text output is built from a small set of scope and
//! leaf calls rather than ad hoc `write!`s scattered through the dumper, so that one error path
//! (see [`crate::orchestrator`]) can always close out whatever scopes are open and splice in an
//! `error` node without leaving a malformed tree.

use dump_utils::indent;
use std::fmt::Write;

/// Where a dump sink's output goes and how it is shaped.
///
/// Two calls bracket every scope: [`Self::open_dict`]/[`Self::open_list`] to begin one, and
/// [`Self::close`] to end the most recently opened one. Leaves never nest.
pub trait DumpSink {
    /// Begins a named scope whose children are labeled fields (rendered `name: ...`).
    fn open_dict(&mut self, name: &str);
    /// Begins a named scope whose children are positional entries (rendered `- ...`).
    fn open_list(&mut self, name: &str);
    /// Ends the most recently opened scope.
    fn close(&mut self);

    /// An unsigned integer, printed in decimal.
    fn u_num(&mut self, name: &str, value: u64);
    /// An integer, printed in hex (`0x...`).
    fn hex(&mut self, name: &str, value: u64);
    /// An integer, printed in hex, with a descriptive label alongside it (e.g. a resolved name).
    fn hex_with_label(&mut self, name: &str, label: &str, value: u64);
    /// An enum-valued field: looks up `value` in `table` (a `(value, name)` list) and prints the
    /// matched name, falling back to a `??(value)` rendering if nothing matches.
    fn enum_by_name(&mut self, name: &str, value: u64, table: &[(u64, &str)]);
    /// A bitset field: prints every set bit whose value appears in `table`, then any remaining
    /// unnamed bits as a hex residue.
    fn flags_by_name(&mut self, name: &str, value: u64, table: &[(u64, &str)]);
    /// A raw byte blob, rendered as a hex dump.
    fn binary_block(&mut self, name: &str, bytes: &[u8]);
    /// A string field (not necessarily valid UTF-8).
    fn string(&mut self, name: &str, bytes: &[u8]);
    /// A free-form line of text, e.g. an error message or a section banner.
    fn line(&mut self, text: &str);
}

enum Scope {
    Dict,
    List,
}

/// The one concrete sink this crate ships: an indentation-based plain-text writer, one scope per
/// indent level, matching this codebase's other `println!`-based dump tools.
pub struct TextSink {
    out: String,
    scopes: Vec<Scope>,
}

impl TextSink {
    /// Starts an empty sink.
    pub fn new() -> Self {
        Self {
            out: String::new(),
            scopes: Vec::new(),
        }
    }

    /// Consumes the sink and returns everything written to it.
    pub fn into_string(self) -> String {
        self.out
    }

    fn depth(&self) -> u32 {
        self.scopes.len() as u32 * 2
    }

    fn write_line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}{}", indent(self.depth()), text);
    }

    fn bstr(bytes: &[u8]) -> String {
        bstr::BStr::new(bytes).to_string()
    }
}

impl Default for TextSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpSink for TextSink {
    fn open_dict(&mut self, name: &str) {
        self.write_line(&format!("{name}:"));
        self.scopes.push(Scope::Dict);
    }

    fn open_list(&mut self, name: &str) {
        self.write_line(&format!("{name}: ["));
        self.scopes.push(Scope::List);
    }

    fn close(&mut self) {
        if let Some(Scope::List) = self.scopes.pop() {
            self.write_line("]");
        }
    }

    fn u_num(&mut self, name: &str, value: u64) {
        self.write_line(&format!("{name}: {value}"));
    }

    fn hex(&mut self, name: &str, value: u64) {
        self.write_line(&format!("{name}: 0x{value:x}"));
    }

    fn hex_with_label(&mut self, name: &str, label: &str, value: u64) {
        self.write_line(&format!("{name}: 0x{value:x} ({label})"));
    }

    fn enum_by_name(&mut self, name: &str, value: u64, table: &[(u64, &str)]) {
        match table.iter().find(|&&(v, _)| v == value) {
            Some(&(_, label)) => self.write_line(&format!("{name}: {label}")),
            None => self.write_line(&format!("{name}: ??(0x{value:x})")),
        }
    }

    fn flags_by_name(&mut self, name: &str, value: u64, table: &[(u64, &str)]) {
        let mut named = Vec::new();
        let mut residue = value;
        for &(bit, label) in table {
            if bit != 0 && value & bit == bit {
                named.push(label);
                residue &= !bit;
            }
        }
        if named.is_empty() && residue == 0 {
            self.write_line(&format!("{name}: [none]"));
        } else if residue == 0 {
            self.write_line(&format!("{name}: [{}]", named.join(" | ")));
        } else {
            self.write_line(&format!(
                "{name}: [{}] (residue 0x{residue:x})",
                named.join(" | ")
            ));
        }
    }

    fn binary_block(&mut self, name: &str, bytes: &[u8]) {
        self.write_line(&format!("{name}: {} bytes", bytes.len()));
        for line in format!("{:?}", dump_utils::HexDump::new(bytes)).lines() {
            self.write_line(line);
        }
    }

    fn string(&mut self, name: &str, bytes: &[u8]) {
        self.write_line(&format!("{name}: {:?}", Self::bstr(bytes)));
    }

    fn line(&mut self, text: &str) {
        self.write_line(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_and_list_nest_with_indentation() {
        let mut s = TextSink::new();
        s.open_dict("Proc");
        s.string("Name", b"main");
        s.open_list("Args");
        s.hex("Arg", 0x1000);
        s.close();
        s.close();

        let text = s.into_string();
        assert!(text.contains("Proc:"));
        assert!(text.contains("  Name:"));
        assert!(text.contains("  Args: ["));
        assert!(text.contains("    Arg: 0x1000"));
        assert!(text.contains("  ]"));
    }

    #[test]
    fn flags_by_name_reports_residue() {
        let mut s = TextSink::new();
        s.flags_by_name("Flags", 0b101, &[(0b001, "A"), (0b010, "B")]);
        let text = s.into_string();
        assert!(text.contains("[A] (residue 0x4)"));
    }

    #[test]
    fn enum_by_name_falls_back_on_unknown_value() {
        let mut s = TextSink::new();
        s.enum_by_name("Kind", 99, &[(1, "One")]);
        assert!(s.into_string().contains("??(0x63)"));
    }
}

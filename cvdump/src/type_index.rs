//! Prints a [`TypeIndex`] the way `cvdump` wants it in dump output: builtins render through
//! [`codeview::types::primitive::dump_primitive_type_index`], and everything else is looked up in
//! the UDT-name table the orchestrator builds from the `.debug$T` stream (see
//! [`crate::orchestrator::UdtNames`]).

use crate::orchestrator::UdtNames;
use codeview::types::primitive::dump_primitive_type_index;
use codeview::types::TypeIndex;
use std::fmt;

/// Renders `ti` as `0x#### (Name)` for a resolved non-primitive, `0x####` alone for an
/// unresolved (forward-referenced, or out-of-range) one, or the primitive's own name.
pub fn format_type_index(ti: TypeIndex, names: &UdtNames) -> String {
    if ti.is_primitive() {
        struct Primitive(TypeIndex);
        impl fmt::Display for Primitive {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                dump_primitive_type_index(f, self.0)
            }
        }
        return Primitive(ti).to_string();
    }

    match names.get(ti) {
        Some(name) if !name.is_empty() => format!("0x{:04x} ({name})", ti.0),
        _ => format!("0x{:04x}", ti.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_renders_through_the_builtin_table() {
        let names = UdtNames::new();
        let rendered = format_type_index(TypeIndex::T_INT4, &names);
        assert!(!rendered.contains("0x"), "primitives don't use hex form: {rendered}");
    }

    #[test]
    fn resolved_udt_shows_its_name() {
        let mut names = UdtNames::new();
        names.push(Some("Foo".into()));
        let ti = TypeIndex(TypeIndex::FIRST_NONPRIMITIVE);
        assert_eq!(format_type_index(ti, &names), "0x1000 (Foo)");
    }

    #[test]
    fn unresolved_forward_reference_shows_bare_hex() {
        let names = UdtNames::new();
        let ti = TypeIndex(TypeIndex::FIRST_NONPRIMITIVE + 5);
        assert_eq!(format_type_index(ti, &names), "0x1005");
    }
}

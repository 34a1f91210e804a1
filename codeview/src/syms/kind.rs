//! Identifies the kind of a symbol record (`S_*`).

use std::fmt::Debug;

macro_rules! sym_kinds {
    (
        $( #[$a:meta] )*
        $v:vis struct $ty_name:ident;
        $( $(#[$ca:meta])* $name:ident = $value:expr, )*
    ) => {
        $( #[$a] )*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        $v struct $ty_name(pub u16);

        #[allow(missing_docs, non_upper_case_globals)]
        impl $ty_name {
            $(
                $(#[$ca])*
                pub const $name: $ty_name = $ty_name($value);
            )*

            const NAMES: &'static [(u16, &'static str)] = &[
                $( ($value, stringify!($name)), )*
            ];

            /// Looks up the name of a symbol kind, if it is recognized.
            pub fn name(self) -> Option<&'static str> {
                Self::NAMES.iter().find(|&&(v, _)| v == self.0).map(|&(_, n)| n)
            }
        }

        impl core::fmt::Debug for $ty_name {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match self.name() {
                    Some(s) => f.write_str(s),
                    None => write!(f, "S_??(0x{:04x})", self.0),
                }
            }
        }
    }
}

sym_kinds! {
    /// The 16-bit discriminant that precedes the payload of every symbol record.
    pub struct SymKind;

    /// Closes the most recently opened scope-starting record (`S_GPROC32`, `S_LPROC32`,
    /// `S_BLOCK32`, `S_THUNK32`, ...).
    S_END = 0x0006,
    /// Legacy string-form `S_PUB32` (CodeView 4 and earlier).
    S_PUB32_ST = 0x0a42,
    /// Legacy annotation record (key/value pairs attached to an address).
    S_ANNOTATION = 0x1019,
    /// Records the per-procedure frame layout (locals size, saved-regs size, params size).
    S_FRAMEPROC = 0x1012,

    /// The name and signature of the object (`.obj`) file this module was compiled from.
    S_OBJNAME = 0x1101,
    /// A thunk: a small compiler/linker-generated trampoline function.
    S_THUNK32 = 0x1102,
    /// Opens a nested lexical block within a procedure.
    S_BLOCK32 = 0x1103,
    /// A goto label.
    S_LABEL32 = 0x1105,
    /// A named constant value.
    S_CONSTANT = 0x1107,
    /// A user-defined type name (a "named" alias for a type index, not a type definition).
    S_UDT = 0x1108,
    /// Like `S_UDT`, for types recorded by a COBOL front end.
    S_COBOLUDT = 0x1109,
    /// A local variable or parameter addressed as an offset from the frame pointer (`EBP`),
    /// x86-only; superseded on other platforms by `S_REGREL32`.
    S_BPREL32 = 0x110b,

    /// A module-local (file-static) global variable.
    S_LDATA32 = 0x110c,
    /// An externally visible global variable.
    S_GDATA32 = 0x110d,
    /// A public (linker-visible) symbol: name plus address, no type information.
    S_PUB32 = 0x110e,
    /// A module-local function.
    S_LPROC32 = 0x110f,
    /// An externally visible function.
    S_GPROC32 = 0x1110,
    /// A local variable or parameter addressed relative to a register (commonly the frame
    /// pointer).
    S_REGREL32 = 0x1111,
    /// A module-local thread-local variable.
    S_LTHREAD32 = 0x1112,
    /// An externally visible thread-local variable.
    S_GTHREAD32 = 0x1113,

    /// A module-local managed (CLR) data item.
    S_LMANDATA = 0x111c,
    /// An externally visible managed (CLR) data item.
    S_GMANDATA = 0x111d,

    /// Introduces a `using namespace` directive in scope at this point.
    S_UNAMESPACE = 0x1124,
    /// A reference to an `S_GPROC32`/`S_LPROC32` defined in the global symbol stream, used so
    /// that module-local symbol streams can refer to it without duplicating its full record.
    S_PROCREF = 0x1125,
    /// A reference to an `S_GDATA32`/`S_LDATA32`.
    S_DATAREF = 0x1126,
    /// Like `S_PROCREF`, for procedures with static (not external) linkage.
    S_LPROCREF = 0x1127,
    /// A reference to an `S_ANNOTATION`.
    S_ANNOTATIONREF = 0x1128,

    /// An externally visible managed (CLR) procedure.
    S_GMANPROC = 0x112a,
    /// A module-local managed (CLR) procedure.
    S_LMANPROC = 0x112b,
    /// A linker-generated trampoline (e.g. for incremental linking or ILT indirection).
    S_TRAMPOLINE = 0x112c,
    /// A named constant whose type is a managed (CLR) type.
    S_MANCONSTANT = 0x112d,

    /// Describes an image section (for `/DEBUG`-enabled binaries built with `/INCREMENTAL`).
    S_SECTION = 0x1136,
    /// Describes a COFF group (a named collection of sections merged by the linker).
    S_COFFGROUP = 0x1137,
    /// Records the caller's address for an inlined or tail call.
    S_CALLSITEINFO = 0x1139,
    /// Records the location of the `/GS` stack cookie for a function.
    S_FRAMECOOKIE = 0x113a,
    /// The compiler version and target-machine information for this module (CodeView 8+).
    S_COMPILE3 = 0x113c,
    /// A local variable or parameter (address given by a subsequent `S_DEFRANGE*` record).
    S_LOCAL = 0x113e,
    /// A generic live-range record for the preceding `S_LOCAL`.
    S_DEFRANGE = 0x113f,
    /// A live range expressed as a single register.
    S_DEFRANGE_REGISTER = 0x1141,
    /// A live range expressed as an offset from a frame pointer.
    S_DEFRANGE_FRAMEPOINTER_REL = 0x1142,
    /// A live range for one field of a struct-valued local, expressed as a register.
    S_DEFRANGE_SUBFIELD_REGISTER = 0x1143,
    /// Like `S_DEFRANGE_FRAMEPOINTER_REL`, but valid for the entire lifetime of the function.
    S_DEFRANGE_FRAMEPOINTER_REL_FULL_SCOPE = 0x1144,
    /// A live range expressed as an offset from a register, with an explicit address range.
    S_DEFRANGE_REGISTER_REL = 0x1145,

    /// Records the toolchain command line and input/output file names used to build this module.
    S_BUILDINFO = 0x114c,
    /// Opens an inline-site scope (records that a function call was inlined at this point).
    S_INLINESITE = 0x114d,
    /// Closes the most recently opened `S_INLINESITE`/`S_INLINESITE2`.
    S_INLINESITE_END = 0x114e,

    /// Closes an `S_GPROC32_ID`/`S_LPROC32_ID`/`S_LPROC32_DPC`/`S_LPROC32_DPC_ID` scope. Distinct
    /// from `S_END` only so that tools which use `ItemId` function references can tell PGO
    /// "identified" procedures apart from ordinary ones.
    S_PROC_ID_END = 0x114f,

    /// An ARM switch-table jump table.
    S_ARMSWITCHTABLE = 0x1159,
    /// The set of functions this function calls (best-effort; used by some profilers).
    S_CALLEES = 0x115a,
    /// The set of functions that call this function (best-effort).
    S_CALLERS = 0x115b,
    /// Like `S_INLINESITE`, but the callee is named by an `ItemId` rather than a `TypeIndex`.
    S_INLINESITE2 = 0x115d,
    /// Records the functions inlined into this function (used alongside `S_CALLEES`).
    S_INLINEES = 0x115c,
    /// Marks a call site that allocates from a heap (used by some static analyzers).
    S_HEAPALLOCSITE = 0x115e,
    /// Marks a function as hot-patchable and records its padding layout.
    S_HOTPATCHFUNC = 0x1168,

    /// An externally visible function, named by an `ItemId` (into the IPI stream) rather than a
    /// `TypeIndex`. Emitted instead of `S_GPROC32` when a module's type info is hashed into the
    /// IPI stream (`/Zo` "enhanced debugging").
    S_GPROC32_ID = 0x1146,
    /// A module-local function, named by an `ItemId`. See `S_GPROC32_ID`.
    S_LPROC32_ID = 0x1147,
    /// A module-local function optimized under "deterministic profile-guided" (`/DPC`)
    /// conditions, named by a `TypeIndex`.
    S_LPROC32_DPC = 0x1155,
    /// Like `S_LPROC32_DPC`, named by an `ItemId`.
    S_LPROC32_DPC_ID = 0x1156,
}

impl SymKind {
    /// `true` if a record of this kind opens a new lexical/procedure scope that will later be
    /// closed by a matching `S_END` or `S_INLINESITE_END`.
    ///
    /// This covers every scope-starting kind in the symbol stream, not just procedures: a plain
    /// `S_BLOCK32` opens and closes a scope exactly like a procedure does, just without its own
    /// frame.
    pub fn starts_scope(self) -> bool {
        self.is_proc() || matches!(self, Self::S_BLOCK32 | Self::S_THUNK32)
    }

    /// `true` if a record of this kind is one of the `S_*PROC32*` procedure kinds (by `TypeIndex`
    /// or by `ItemId`, ordinary or PGO/DPC).
    pub fn is_proc(self) -> bool {
        matches!(
            self,
            Self::S_GPROC32
                | Self::S_LPROC32
                | Self::S_GPROC32_ID
                | Self::S_LPROC32_ID
                | Self::S_LPROC32_DPC
                | Self::S_LPROC32_DPC_ID
                | Self::S_GMANPROC
                | Self::S_LMANPROC
        )
    }

    /// `true` if a record of this kind is an `S_INLINESITE`/`S_INLINESITE2`, which opens a scope
    /// closed by `S_INLINESITE_END` rather than a plain `S_END`.
    pub fn starts_inline_scope(self) -> bool {
        matches!(self, Self::S_INLINESITE | Self::S_INLINESITE2)
    }

    /// `true` if a record of this kind closes a scope opened by [`Self::starts_scope`].
    ///
    /// `S_PROC_ID_END` closes `S_GPROC32_ID`/`S_LPROC32_ID`/`S_LPROC32_DPC`/`S_LPROC32_DPC_ID`
    /// scopes; plain `S_END` closes every other scope-starting kind.
    pub fn ends_scope(self) -> bool {
        matches!(self, Self::S_END | Self::S_PROC_ID_END)
    }

    /// `true` if a record of this kind closes a scope opened by
    /// [`Self::starts_inline_scope`].
    pub fn ends_inline_scope(self) -> bool {
        matches!(self, Self::S_INLINESITE_END)
    }

    /// `true` if this is one of the `S_*REF` record kinds, which store a module index and a
    /// symbol-stream offset pointing at the record they refer to, rather than full record data.
    pub fn is_refsym_source(self) -> bool {
        matches!(
            self,
            Self::S_PROCREF | Self::S_LPROCREF | Self::S_DATAREF | Self::S_ANNOTATIONREF
        )
    }

    /// `true` if a record of this kind may be the target of one of the `S_*REF` record kinds
    /// (i.e. it is a record that lives in the global symbol stream and is referred to, rather
    /// than duplicated, from per-module symbol streams).
    pub fn is_refsym_target(self) -> bool {
        matches!(
            self,
            Self::S_GPROC32
                | Self::S_LPROC32
                | Self::S_GDATA32
                | Self::S_LDATA32
                | Self::S_GMANDATA
                | Self::S_LMANDATA
                | Self::S_ANNOTATION
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(SymKind::S_GPROC32.name(), Some("S_GPROC32"));
        assert_eq!(SymKind(0xffff).name(), None);
    }

    #[test]
    fn test_scopes() {
        assert!(SymKind::S_GPROC32.starts_scope());
        assert!(SymKind::S_END.ends_scope());
        assert!(!SymKind::S_UDT.starts_scope());
        assert!(SymKind::S_BLOCK32.starts_scope());
        assert!(SymKind::S_GPROC32_ID.starts_scope());
        assert!(SymKind::S_LPROC32_DPC_ID.starts_scope());
        assert!(SymKind::S_PROC_ID_END.ends_scope());
    }

    #[test]
    fn test_refsyms() {
        assert!(SymKind::S_PROCREF.is_refsym_source());
        assert!(SymKind::S_GPROC32.is_refsym_target());
        assert!(!SymKind::S_PROCREF.is_refsym_target());
    }
}

//! Tagged error kinds for the core decoders, distinct from the `anyhow::Error` the orchestrator
//! and CLI actually propagate: call sites that need to distinguish "this subsection is corrupt,
//! abandon it" from "the whole `.debug$S` is unreadable" match on these instead of string-sniffing
//! an `anyhow` chain.

use std::fmt;

/// One of the failure modes a decoder can report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CvError {
    /// A read ran past the end of its container.
    Truncated,
    /// A record's declared length was too short, or its declared size crossed the container end.
    MalformedRecord,
    /// The leading `u32` of a `.debug$S`/`.debug$T` section was not [`crate::orchestrator::DEBUG_SECTION_MAGIC`].
    InvalidMagic,
    /// A second `StringTable` or `FileChecksums` subsection appeared in one `.debug$S`.
    DuplicateSubsection,
    /// Two `Lines` or `FrameData` subsections resolved to the same linkage name.
    DuplicateFunction(String),
    /// A structural invariant (segment-size formula, offset bound, NUL-preceded string offset,
    /// `ProcEnd` with no matching `ProcStart`) did not hold.
    InvariantViolation(String),
    /// No COFF relocation targeted the byte offset a linkage name had to be resolved from.
    UnresolvedRelocation,
    /// A numeric-leaf tag this crate does not decode.
    UnsupportedNumericLeaf(u16),
}

impl fmt::Display for CvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated read"),
            Self::MalformedRecord => write!(f, "malformed record framing"),
            Self::InvalidMagic => write!(f, "missing or incorrect DEBUG_SECTION_MAGIC"),
            Self::DuplicateSubsection => write!(f, "duplicate StringTable or FileChecksums subsection"),
            Self::DuplicateFunction(name) => write!(f, "duplicate line table or frame data for `{name}`"),
            Self::InvariantViolation(msg) => write!(f, "invariant violated: {msg}"),
            Self::UnresolvedRelocation => write!(f, "no relocation at the required offset"),
            Self::UnsupportedNumericLeaf(tag) => write!(f, "unsupported numeric leaf tag 0x{tag:04x}"),
        }
    }
}

impl std::error::Error for CvError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_function_carries_the_linkage_name_in_its_message() {
        let e = CvError::DuplicateFunction("_main".into());
        assert!(e.to_string().contains("_main"));
    }
}

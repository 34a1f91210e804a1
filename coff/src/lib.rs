//! Definitions for Portable Executable (PE) COFF binaries (Windows binaries)

#![allow(non_camel_case_types)]
#![forbid(unsafe_code)]

mod dll_characteristics;
mod image;
mod machine;
mod object;
mod reloc;
mod relocation;
mod section;
mod symbol;

pub use dll_characteristics::*;
pub use image::*;
pub use machine::*;
pub use object::*;
pub use reloc::*;
pub use relocation::*;
pub use section::*;
pub use symbol::*;

//! Small iterator helpers shared by the stream iterators in [`crate::types::iter`] and
//! [`crate::syms::iter`].

pub mod iter;

//! Adapters for tracking the byte range consumed by each item of a record-framing iterator.

/// Implemented by iterators that parse records out of a shrinking byte buffer, where the
/// remaining length of the buffer tells you how many bytes have been consumed so far.
pub trait HasRestLen {
    /// The number of bytes that have not yet been consumed.
    fn rest_len(&self) -> usize;
}

/// Wraps an iterator that implements [`HasRestLen`] and yields `(Range<usize>, Item)` pairs,
/// where the range gives the byte offsets (relative to the start of the original buffer) that
/// were consumed to produce that item.
pub struct IteratorWithRanges<I> {
    inner: I,
    total_len: usize,
    pos: usize,
}

impl<I: HasRestLen> IteratorWithRanges<I> {
    /// The number of bytes consumed so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Gives access to the wrapped iterator, e.g. to call `rest()` on it after iteration stops.
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<I: Iterator + HasRestLen> Iterator for IteratorWithRanges<I> {
    type Item = (std::ops::Range<usize>, I::Item);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos;
        let item = self.inner.next()?;
        let consumed = self.total_len - self.inner.rest_len();
        self.pos = consumed;
        Some((start..consumed, item))
    }
}

/// Extension trait that adds [`with_ranges`](Self::with_ranges) to any iterator that implements
/// [`HasRestLen`].
pub trait IteratorWithRangesExt: Iterator + HasRestLen + Sized {
    /// Wraps this iterator so that it yields the byte range consumed by each item, alongside the
    /// item itself.
    fn with_ranges(self) -> IteratorWithRanges<Self> {
        let total_len = self.rest_len();
        IteratorWithRanges {
            inner: self,
            total_len,
            pos: 0,
        }
    }
}

impl<I: Iterator + HasRestLen> IteratorWithRangesExt for I {}

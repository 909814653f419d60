//! Lazy, single-pass value sequences for grouped records.
//!
//! After a shuffle the engine hands each group to the type layer as a key and a
//! cursor over opaque values. [`LazyValues`] decodes those values one at a time
//! as the consumer asks for them:
//!
//! - nothing is read ahead, and at most one decoded value is alive at a time, so
//!   a group may be far larger than memory;
//! - the value function is initialized once, on the first call to `next`;
//! - once the cursor runs dry the sequence stays exhausted, even if the cursor
//!   would later produce more;
//! - removal is only available when the cursor implements [`RemovableCursor`].
//!
//! ```
//! use ironbeam_types::*;
//! use ironbeam_types::lazy::LazyValues;
//!
//! let longs = Native.longs();
//! let raw = vec![Datum::Int(1), Datum::Int(2), Datum::Int(3)];
//! let total: i64 = LazyValues::new(raw.into_iter(), longs.input_fn())
//!     .sum::<Result<i64, _>>()?;
//! assert_eq!(total, 6);
//! # Ok::<(), ConversionError>(())
//! ```

use crate::datum::Datum;
use crate::error::ConversionError;
use crate::map_fn::SharedMapFn;
use std::iter::FusedIterator;

/// Why a removal request could not be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RemoveError {
    #[error("remove() called before next()")]
    NothingReturned,
    #[error("the current element was already removed")]
    AlreadyRemoved,
}

/// An engine cursor that can delete the element it returned last.
pub trait RemovableCursor: Iterator<Item = Datum> {
    /// # Errors
    /// See [`RemoveError`].
    fn remove_last(&mut self) -> Result<(), RemoveError>;
}

pub struct LazyValues<I, V> {
    cursor: I,
    map_fn: SharedMapFn<Datum, V>,
    initialized: bool,
    exhausted: bool,
}

impl<I, V> LazyValues<I, V>
where
    I: Iterator<Item = Datum>,
{
    pub fn new(cursor: I, map_fn: SharedMapFn<Datum, V>) -> Self {
        Self {
            cursor,
            map_fn,
            initialized: false,
            exhausted: false,
        }
    }
}

impl<I, V> LazyValues<I, V>
where
    I: RemovableCursor,
{
    /// Remove the value most recently returned by `next` from the underlying group.
    ///
    /// # Errors
    /// Forwards the cursor's [`RemoveError`].
    pub fn remove(&mut self) -> Result<(), RemoveError> {
        self.cursor.remove_last()
    }
}

impl<I, V> Iterator for LazyValues<I, V>
where
    I: Iterator<Item = Datum>,
{
    type Item = Result<V, ConversionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if !self.initialized {
            self.map_fn.initialize();
            self.initialized = true;
        }
        match self.cursor.next() {
            Some(raw) => Some(self.map_fn.map(raw)),
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else {
            self.cursor.size_hint()
        }
    }
}

impl<I, V> FusedIterator for LazyValues<I, V> where I: Iterator<Item = Datum> {}

/// A cursor over a borrowed group buffer that supports removal.
///
/// Elements are cloned out as they are visited; [`RemovableCursor::remove_last`]
/// deletes the last visited element from the buffer itself.
pub struct BufferCursor<'a> {
    buf: &'a mut Vec<Datum>,
    pos: usize,
    last: Option<usize>,
    removed: bool,
}

impl<'a> BufferCursor<'a> {
    pub fn new(buf: &'a mut Vec<Datum>) -> Self {
        Self {
            buf,
            pos: 0,
            last: None,
            removed: false,
        }
    }
}

impl Iterator for BufferCursor<'_> {
    type Item = Datum;

    fn next(&mut self) -> Option<Datum> {
        let item = self.buf.get(self.pos)?.clone();
        self.last = Some(self.pos);
        self.removed = false;
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.buf.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl RemovableCursor for BufferCursor<'_> {
    fn remove_last(&mut self) -> Result<(), RemoveError> {
        match self.last {
            Some(_) if self.removed => Err(RemoveError::AlreadyRemoved),
            Some(idx) => {
                self.buf.remove(idx);
                self.pos = idx;
                self.removed = true;
                Ok(())
            }
            None => Err(RemoveError::NothingReturned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Native, PTypeFamily};

    #[test]
    fn buffer_cursor_removes_visited_elements() {
        let mut buf = vec![Datum::Int(1), Datum::Int(2), Datum::Int(3)];
        let mut values = LazyValues::new(BufferCursor::new(&mut buf), Native.longs().input_fn());
        assert_eq!(values.remove(), Err(RemoveError::NothingReturned));
        assert_eq!(values.next(), Some(Ok(1)));
        assert_eq!(values.next(), Some(Ok(2)));
        assert_eq!(values.remove(), Ok(()));
        assert_eq!(values.remove(), Err(RemoveError::AlreadyRemoved));
        assert_eq!(values.next(), Some(Ok(3)));
        assert_eq!(values.next(), None);
        drop(values);
        assert_eq!(buf, vec![Datum::Int(1), Datum::Int(3)]);
    }

    #[test]
    fn conversion_errors_do_not_end_the_sequence() {
        let raw = vec![Datum::Int(1), Datum::from("x"), Datum::Int(3)];
        let out: Vec<_> = LazyValues::new(raw.into_iter(), Native.longs().input_fn()).collect();
        assert_eq!(out.len(), 3);
        assert!(out[1].is_err());
        assert_eq!(out[2], Ok(3));
    }
}

//! Instrumented cursors and conversion functions.

use crate::datum::Datum;
use crate::error::ConversionError;
use crate::map_fn::{MapFn, SharedMapFn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counter handed out by the instrumented helpers.
#[derive(Clone, Debug, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A value cursor that counts every successful pull.
///
/// Keep the [`Counter`] from [`pulls`](Self::pulls) before handing the cursor
/// away; it stays live after the cursor is moved or dropped.
pub struct CountingCursor {
    inner: std::vec::IntoIter<Datum>,
    pulls: Counter,
}

impl CountingCursor {
    #[must_use]
    pub fn new(values: Vec<Datum>) -> Self {
        Self {
            inner: values.into_iter(),
            pulls: Counter::default(),
        }
    }

    #[must_use]
    pub fn pulls(&self) -> Counter {
        self.pulls.clone()
    }
}

impl Iterator for CountingCursor {
    type Item = Datum;

    fn next(&mut self) -> Option<Datum> {
        let item = self.inner.next()?;
        self.pulls.bump();
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Yields `first`, reports the end once, then yields `second`.
///
/// Real engine cursors are not required to stay finished; this one deliberately
/// does not.
pub struct ResumingCursor {
    first: std::vec::IntoIter<Datum>,
    second: std::vec::IntoIter<Datum>,
    ended_once: bool,
}

impl ResumingCursor {
    #[must_use]
    pub fn new(first: Vec<Datum>, second: Vec<Datum>) -> Self {
        Self {
            first: first.into_iter(),
            second: second.into_iter(),
            ended_once: false,
        }
    }
}

impl Iterator for ResumingCursor {
    type Item = Datum;

    fn next(&mut self) -> Option<Datum> {
        if let Some(item) = self.first.next() {
            return Some(item);
        }
        if !self.ended_once {
            self.ended_once = true;
            return None;
        }
        self.second.next()
    }
}

/// Wraps a conversion function and counts `initialize` and `map` calls.
pub struct CountingMapFn<O> {
    inner: SharedMapFn<Datum, O>,
    initializations: Counter,
    calls: Counter,
}

impl<O> CountingMapFn<O> {
    #[must_use]
    pub fn new(inner: SharedMapFn<Datum, O>) -> Self {
        Self {
            inner,
            initializations: Counter::default(),
            calls: Counter::default(),
        }
    }

    #[must_use]
    pub fn initializations(&self) -> usize {
        self.initializations.get()
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<O> MapFn<Datum, O> for CountingMapFn<O> {
    fn initialize(&self) {
        self.initializations.bump();
        self.inner.initialize();
    }

    fn map(&self, input: Datum) -> Result<O, ConversionError> {
        self.calls.bump();
        self.inner.map(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resuming_cursor_yields_after_end() {
        let mut c = ResumingCursor::new(vec![Datum::Int(1)], vec![Datum::Int(2)]);
        assert_eq!(c.next(), Some(Datum::Int(1)));
        assert_eq!(c.next(), None);
        assert_eq!(c.next(), Some(Datum::Int(2)));
    }

    #[test]
    fn counting_cursor_ignores_end_of_stream() {
        let mut c = CountingCursor::new(vec![Datum::Null]);
        let pulls = c.pulls();
        while c.next().is_some() {}
        assert_eq!(c.next(), None);
        assert_eq!(pulls.get(), 1);
    }
}

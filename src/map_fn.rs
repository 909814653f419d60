//! Conversion functions.
//!
//! A [`MapFn`] turns one value into another on the per-record hot path. The
//! descriptors in [`crate::ptype`] expose a pair of them (runtime -> typed and
//! typed -> runtime), and the grouped type composes them into the function that
//! wraps each group's values in a [`LazyValues`](crate::lazy::LazyValues).
//!
//! Functions are shared across worker tasks behind an `Arc`, so both methods
//! take `&self`. Implementations that need per-context state keep it in a
//! `OnceLock` (or similar) populated by [`MapFn::initialize`].

use crate::error::ConversionError;
use std::marker::PhantomData;
use std::sync::Arc;

pub trait MapFn<I, O>: Send + Sync {
    /// Per-context setup. Called before the first [`map`](MapFn::map); must
    /// tolerate being called more than once.
    fn initialize(&self) {}

    /// Transform one input.
    ///
    /// # Errors
    /// Returns a [`ConversionError`] when `input` does not conform to the
    /// function's declared domain.
    fn map(&self, input: I) -> Result<O, ConversionError>;
}

impl<I, O, M> MapFn<I, O> for Arc<M>
where
    M: MapFn<I, O> + ?Sized,
{
    fn initialize(&self) {
        (**self).initialize();
    }

    fn map(&self, input: I) -> Result<O, ConversionError> {
        (**self).map(input)
    }
}

/// Shared, type-erased conversion function.
pub type SharedMapFn<I, O> = Arc<dyn MapFn<I, O>>;

/// A stateless [`MapFn`] backed by a closure.
pub struct FnMap<I, O, F>(F, PhantomData<fn(I) -> O>);

impl<I, O, F> MapFn<I, O> for FnMap<I, O, F>
where
    F: Fn(I) -> Result<O, ConversionError> + Send + Sync,
{
    fn map(&self, input: I) -> Result<O, ConversionError> {
        (self.0)(input)
    }
}

/// Wrap a fallible closure as a shared [`MapFn`].
pub fn fn_map<I, O, F>(f: F) -> SharedMapFn<I, O>
where
    I: 'static,
    O: 'static,
    F: Fn(I) -> Result<O, ConversionError> + Send + Sync + 'static,
{
    Arc::new(FnMap(f, PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_map_reports_closure_errors() {
        let parse = fn_map(|s: String| {
            s.parse::<i64>()
                .map_err(|_| ConversionError::new("i64", "digits", s))
        });
        assert_eq!(parse.map("21".to_string()), Ok(21));
        assert!(parse.map("x".to_string()).is_err());
    }
}

//! Testing utilities for typed pipelines.
//!
//! Instrumented stand-ins for engine pieces plus assertions for typed outputs:
//!
//! - [`CountingCursor`]: a value cursor that counts how many values were pulled
//! - [`ResumingCursor`]: a cursor that yields again after reporting the end
//! - [`CountingMapFn`]: a conversion function that counts initializations and calls
//! - [`assert_round_trip`]: every value survives a converter unchanged
//! - [`assert_kv_collections_equal`] and [`assert_grouped_kv_equal`]: order-independent
//!   comparisons of keyed outputs
//!
//! # Quick Start
//!
//! ```
//! use ironbeam_types::*;
//! use ironbeam_types::lazy::LazyValues;
//! use ironbeam_types::testing::*;
//! use std::sync::Arc;
//!
//! let cursor = CountingCursor::new(vec![Datum::Int(1), Datum::Int(2), Datum::Int(3)]);
//! let pulls = cursor.pulls();
//! let map_fn = Arc::new(CountingMapFn::new(Native.longs().input_fn()));
//!
//! let shared: SharedMapFn<Datum, i64> = map_fn.clone();
//! let mut values = LazyValues::new(cursor, shared);
//! assert_eq!(values.next(), Some(Ok(1)));
//! assert_eq!(pulls.get(), 1);
//! assert_eq!(map_fn.initializations(), 1);
//! ```

pub mod assertions;
pub mod cursors;

pub use assertions::*;
pub use cursors::*;

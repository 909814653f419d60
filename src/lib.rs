//! # ironbeam-types
//!
//! The typed value layer of a distributed batch engine. Pipeline stages declare
//! what strongly typed values (single values, pairs, collections, keyed tables)
//! flow between them; this crate converts between those typed values and the
//! opaque runtime records the engine shuffles and stores.
//!
//! ## Key Features
//!
//! - **Descriptors** - [`PType<T>`] and [`TableType<K, V>`] carry a converter, an
//!   input function and their ordered sub-types
//! - **Two serialization families** - [`Native`] (structural, order preserving) and
//!   [`Postcard`] (compact bytes for any serde type)
//! - **Grouped tables** - [`GroupedType<K, V>`] configures the shuffle and delivers
//!   each key's values as a lazy, single-pass [`LazyValues`]
//! - **Targets** - shape-checked outputs: JSON Lines files and key/value store tables
//! - **Local runner** - executes a configured group-by in-process, sequentially or
//!   in parallel
//!
//! ## Quick Start
//!
//! ```
//! use ironbeam_types::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let p = Pipeline::default();
//! let table = table_of(&Native.strings(), &Native.longs())?;
//! let (_, grouped) = p.group_by_key(&table, &GroupingOptions::default())?;
//!
//! let rows = vec![
//!     ("a".to_string(), 1),
//!     ("b".to_string(), 5),
//!     ("a".to_string(), 2),
//!     ("a".to_string(), 3),
//! ];
//! let mut sums = Runner::default().run_grouped(&p, &grouped, &rows, |k, values| {
//!     Ok((k, values.sum::<Result<i64, _>>()?))
//! })?;
//! sums.sort();
//! assert_eq!(sums, vec![("a".to_string(), 6), ("b".to_string(), 5)]);
//!
//! // Grouped records have no flattened form.
//! assert!(p.write_default(&grouped, "out/sums.jsonl").is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`ptype`] - value, pair, collection and table descriptors
//! - [`family`] - the `Native` and `Postcard` serialization families
//! - [`grouped`] - grouped tables and shuffle configuration
//! - [`lazy`] - lazy value sequences over engine cursors
//! - [`target`] - output targets and shape acceptance
//! - [`pipeline`] - stage declaration against a [`JobConf`]
//! - [`runner`] - in-process execution of a configured group-by
//! - [`io`] - JSON Lines target and path size estimates
//! - [`testing`] - instrumented cursors and assertions

pub mod converter;
pub mod datum;
pub mod descriptor;
pub mod error;
pub mod family;
pub mod grouped;
pub mod io;
pub mod job;
pub mod lazy;
pub mod map_fn;
pub mod pipeline;
pub mod ptype;
pub mod runner;
pub mod shuffle;
pub mod stage_id;
pub mod target;
pub mod testing;
pub mod type_token;

pub use converter::{Converter, KeyValueConverter, RuntimeRecord, ValueConverter};
pub use datum::Datum;
pub use descriptor::{Descriptor, DescriptorKind, Family, TypeDescriptor};
pub use error::{ConversionError, TypeError};
pub use family::{Native, NativeValue, PTypeFamily, Postcard};
pub use grouped::{GroupedInputFn, GroupedType};
pub use job::JobConf;
pub use lazy::{LazyValues, RemovableCursor};
pub use map_fn::{MapFn, SharedMapFn, fn_map};
pub use pipeline::{Pipeline, Stage, StageKind};
pub use ptype::{PBound, PType, TableType, collections, pairs, table_of};
pub use runner::{ExecMode, Group, Runner};
pub use shuffle::{
    GroupingOptions, HashPartitioner, KeyComparator, NaturalOrder, Partitioner, ReverseOrder,
    ShufflePolicies,
};
pub use stage_id::StageId;
pub use target::{KeyValueStoreTarget, Mutation, Target, mutations};
pub use type_token::{OutputShape, ShapeTag, TypeTag};

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::JsonlTarget;

//! Type tags and produced-shape tags.
//!
//! This module provides:
//! - [`TypeTag`]: a lightweight runtime type identifier captured at the call site
//!   where a descriptor is constructed, so later code never has to recover a
//!   generic parameter by inspection.
//! - [`OutputShape`]: whether a converter produces a plain value or a key/value pair.
//! - [`ShapeTag`]: the pair of the two above. Targets declare the shape tags they
//!   accept and acceptance is a plain tag comparison.

use std::any::{TypeId, type_name};
use std::fmt::{Display, Formatter, Result as FormatResult};

/// A lightweight runtime type tag.
///
/// `TypeTag` carries the `TypeId` and a readable type name.
///
/// ```
/// use ironbeam_types::type_token::TypeTag;
/// let tag = TypeTag::of::<u32>();
/// assert_eq!(tag.name, "u32");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Stable Rust type identifier.
    pub id: TypeId,
    /// Human-readable type name (best-effort).
    pub name: &'static str,
}

impl TypeTag {
    /// Construct a tag for `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.write_str(self.name)
    }
}

/// What a converter hands to the engine for each record.
///
/// Fixed when the converter is constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputShape {
    /// The record is a single value; the runtime key slot is `Datum::Null`.
    Value,
    /// The record is a key/value pair; both runtime slots are populated.
    KeyValue,
}

/// The produced shape of a descriptor: its typed element plus its output shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeTag {
    pub tag: TypeTag,
    pub output: OutputShape,
}

impl ShapeTag {
    #[must_use]
    pub fn value_of<T: 'static>() -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            output: OutputShape::Value,
        }
    }

    #[must_use]
    pub fn key_value_of<T: 'static>() -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            output: OutputShape::KeyValue,
        }
    }
}

impl Display for ShapeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self.output {
            OutputShape::Value => write!(f, "{}", self.tag),
            OutputShape::KeyValue => write!(f, "{} (key/value)", self.tag),
        }
    }
}

//! The opaque runtime representation.
//!
//! Every value that crosses a stage boundary is a [`Datum`]. The engine moves,
//! partitions, sorts and stores datums without knowing the typed value behind
//! them; descriptors in [`crate::ptype`] translate in both directions.
//!
//! `Datum` is totally ordered and hashable. Floats go through
//! [`OrderedFloat`] so `NaN` has a fixed place in the order.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Bytes(Vec<u8>),
    Pair(Box<Datum>, Box<Datum>),
    List(Vec<Datum>),
}

impl Datum {
    #[must_use]
    pub fn pair(first: Datum, second: Datum) -> Self {
        Datum::Pair(Box::new(first), Box::new(second))
    }

    /// Short variant name, used in conversion errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Bool(_) => "bool",
            Datum::Int(_) => "int",
            Datum::Float(_) => "float",
            Datum::Text(_) => "text",
            Datum::Bytes(_) => "bytes",
            Datum::Pair(..) => "pair",
            Datum::List(_) => "list",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

impl Display for Datum {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Int(i) => write!(f, "{i}"),
            Datum::Float(x) => write!(f, "{}", x.0),
            Datum::Text(s) => write!(f, "{s:?}"),
            Datum::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Datum::Pair(a, b) => write!(f, "({a}, {b})"),
            Datum::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::Int(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::Text(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_order_follows_values() {
        assert!(Datum::Int(2) < Datum::Int(10));
        assert!(Datum::from("a") < Datum::from("b"));
        assert!(Datum::Float(OrderedFloat(1.5)) < Datum::Float(OrderedFloat(f64::NAN)));
    }

    #[test]
    fn display_nests() {
        let d = Datum::pair(Datum::from("k"), Datum::List(vec![Datum::Int(1), Datum::Null]));
        assert_eq!(d.to_string(), "(\"k\", [1, null])");
    }
}

//! Output targets and shape acceptance.
//!
//! A [`Target`] is where a pipeline stage writes its records. Before anything is
//! scheduled the pipeline asks the target whether it [accepts](Target::accept) the
//! stage's descriptor; acceptance compares the descriptor's [`ShapeTag`] with the
//! shapes the target declares. Grouped descriptors are never accepted.
//!
//! Built-in targets:
//! - [`JsonlTarget`](crate::io::jsonl::JsonlTarget) (feature `io-jsonl`): the default
//!   file target of every non-grouped descriptor.
//! - [`KeyValueStoreTarget`]: a table in an external key/value store, which only
//!   persists [`Mutation`] records.

use crate::descriptor::{DescriptorKind, TypeDescriptor};
use crate::error::{Result, TypeError};
use crate::family::Postcard;
use crate::job::{JobConf, OUTPUT_FORMAT, OUTPUT_TABLE};
use crate::ptype::PType;
use crate::type_token::ShapeTag;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::LazyLock;
use tracing::debug;

pub trait Target: Display + Send + Sync {
    /// Whether records of `shape` can be persisted here.
    fn accepts_shape(&self, shape: &ShapeTag) -> bool;

    /// Whether this target can persist `ptype`. Grouped descriptors never qualify.
    fn accept(&self, ptype: &dyn TypeDescriptor) -> bool {
        ptype.descriptor().kind() != DescriptorKind::Grouped && self.accepts_shape(&ptype.shape())
    }

    /// Record this target's output settings in `job`.
    ///
    /// # Errors
    /// [`TypeError::Configuration`] if the job lacks something the target needs.
    fn configure(&self, job: &mut JobConf, ptype: &dyn TypeDescriptor) -> Result<()>;
}

/// A row mutation for a key/value store: the row key and the cells to put.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mutation {
    pub row: String,
    pub cells: BTreeMap<String, Vec<u8>>,
}

impl Mutation {
    pub fn new(row: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            cells: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn put(mut self, column: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }
}

/// The descriptor of [`Mutation`] records.
#[must_use]
pub fn mutations() -> PType<Mutation> {
    Postcard.records()
}

/// Engine resource a job must provide before writing to a key/value store.
pub const KVSTORE_RESOURCE: &str = "kvstore";

static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]{0,254}$").expect("valid table name regex")
});

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyValueStoreTarget {
    table: String,
}

impl KeyValueStoreTarget {
    /// # Errors
    /// [`TypeError::Configuration`] if `table` is not a valid table name.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !TABLE_NAME.is_match(&table) {
            return Err(TypeError::configuration(format!("invalid table name '{table}'")));
        }
        Ok(Self { table })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl Display for KeyValueStoreTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "KeyValueStore({})", self.table)
    }
}

impl Target for KeyValueStoreTarget {
    fn accepts_shape(&self, shape: &ShapeTag) -> bool {
        *shape == ShapeTag::value_of::<Mutation>()
    }

    fn configure(&self, job: &mut JobConf, ptype: &dyn TypeDescriptor) -> Result<()> {
        job.require_resource(KVSTORE_RESOURCE).map_err(|e| {
            TypeError::configuration_from(format!("cannot wire {self}"), e.into())
        })?;
        job.set(OUTPUT_FORMAT, "kvstore");
        job.set(OUTPUT_TABLE, self.table.as_str());
        debug!(table = %self.table, ptype = ptype.type_name(), "configured key/value store output");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Native, PTypeFamily};

    #[test]
    fn table_names_are_validated() {
        assert!(KeyValueStoreTarget::new("events.v2").is_ok());
        assert!(KeyValueStoreTarget::new("").is_err());
        assert!(KeyValueStoreTarget::new("bad name").is_err());
        assert!(KeyValueStoreTarget::new(".hidden").is_err());
    }

    #[test]
    fn only_mutations_are_accepted() -> Result<()> {
        let target = KeyValueStoreTarget::new("events")?;
        assert!(target.accept(&mutations()));
        assert!(!target.accept(&Native.strings()));
        assert!(!target.accept(&Postcard.records::<(String, i64)>()));
        Ok(())
    }

    #[test]
    fn displays_table() -> Result<()> {
        assert_eq!(KeyValueStoreTarget::new("events")?.to_string(), "KeyValueStore(events)");
        Ok(())
    }
}

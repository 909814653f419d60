//! The grouped table type.
//!
//! A [`GroupedType<K, V>`] describes the output of a group-by over a
//! [`TableType<K, V>`]: one `(K, values)` record per key, where the values are a
//! [`LazyValues`] streamed from the engine rather than a materialized `Vec<V>`.
//!
//! At the storage layer a grouped record is still a key/value pair, so the
//! converter, the sub-types and the family all come from the table type. What
//! the grouped type adds:
//!
//! - [`GroupedType::grouping_converter`]: how records are presented to the
//!   shuffle's partitioner and comparators;
//! - [`GroupedType::configure_shuffle`]: writes the shuffle policies into the job;
//! - [`GroupedType::input_fn`]: wraps each `(key, value cursor)` into a typed
//!   `(K, LazyValues)`.
//!
//! A grouped type has no flattened on-disk form. Asking it for a default target
//! fails immediately, so writing a grouped stream directly is caught while the
//! pipeline is being declared.
//!
//! ```
//! use ironbeam_types::*;
//! use std::path::Path;
//!
//! let table = table_of(&Native.strings(), &Native.longs())?;
//! let grouped = table.grouped();
//!
//! let mut job = JobConf::default();
//! grouped.configure_shuffle(&mut job, &GroupingOptions::builder().num_partitions(4).build())?;
//! assert_eq!(job.num_partitions(), Some(4));
//!
//! assert!(grouped.default_target(Path::new("out.jsonl")).is_err());
//! # Ok::<(), TypeError>(())
//! ```

use crate::converter::Converter;
use crate::datum::Datum;
use crate::descriptor::{
    Descriptor, DescriptorKind, Family, TypeDescriptor, grouped_write_error,
};
use crate::error::{ConversionError, Result, TypeError};
use crate::job::{
    JobConf, SHUFFLE_FAMILY, SHUFFLE_GROUPING_COMPARATOR, SHUFFLE_KEY_TYPE, SHUFFLE_PARTITIONER,
    SHUFFLE_PARTITIONS, SHUFFLE_SORT_COMPARATOR, SHUFFLE_VALUE_TYPE,
};
use crate::lazy::LazyValues;
use crate::map_fn::{MapFn, SharedMapFn};
use crate::ptype::{PBound, TableType};
use crate::shuffle::GroupingOptions;
use crate::target::Target;
use crate::type_token::{OutputShape, ShapeTag};
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct GroupedType<K, V> {
    table: TableType<K, V>,
    descriptor: Descriptor,
}

impl<K, V> Clone for GroupedType<K, V> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            descriptor: self.descriptor.clone(),
        }
    }
}

impl<K, V> Debug for GroupedType<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("GroupedType")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<K: PBound, V: PBound> GroupedType<K, V> {
    #[must_use]
    pub fn new(table: &TableType<K, V>) -> Self {
        let descriptor = table.descriptor().derive(
            DescriptorKind::Grouped,
            ShapeTag::key_value_of::<GroupedType<K, V>>(),
        );
        Self {
            table: table.clone(),
            descriptor,
        }
    }

    #[must_use]
    pub fn table_type(&self) -> &TableType<K, V> {
        &self.table
    }

    #[must_use]
    pub fn converter(&self) -> Arc<dyn Converter<(K, V)>> {
        self.table.converter()
    }

    #[must_use]
    pub fn grouping_converter(&self) -> Arc<dyn Converter<(K, V)>> {
        self.table.grouping_converter()
    }

    /// Converts `(key, value cursor)` pairs from the engine into `(K, LazyValues)`.
    #[must_use]
    pub fn input_fn(&self) -> GroupedInputFn<K, V> {
        GroupedInputFn {
            keys: self.table.key_type().input_fn(),
            values: self.table.value_type().input_fn(),
        }
    }

    /// Install this type's shuffle settings and policies into `job`.
    ///
    /// Everything is validated before `job` is touched; on error the job is
    /// unchanged. Calling this again with the same options leaves the job as it
    /// was after the first call. Without a partition count any earlier one is
    /// cleared, so the engine default applies.
    ///
    /// # Errors
    /// [`TypeError::Configuration`] when the partition count is zero, the job
    /// lacks the codec resource for this type's family, or the grouping
    /// converter does not produce key/value records.
    pub fn configure_shuffle(&self, job: &mut JobConf, options: &GroupingOptions) -> Result<()> {
        let family = self.family();
        self.check_wiring(job, options, family).map_err(|e| {
            TypeError::configuration_from(
                format!("cannot configure shuffle for {}", self.type_name()),
                e.into(),
            )
        })?;

        let policies = options.resolve();
        match options.num_partitions {
            Some(n) => job.set(SHUFFLE_PARTITIONS, n.to_string()),
            None => {
                job.unset(SHUFFLE_PARTITIONS);
            }
        }
        job.set(SHUFFLE_FAMILY, family.name());
        job.set(SHUFFLE_KEY_TYPE, self.table.key_type().type_name());
        job.set(SHUFFLE_VALUE_TYPE, self.table.value_type().type_name());
        job.set(SHUFFLE_PARTITIONER, policies.partitioner.name());
        job.set(SHUFFLE_SORT_COMPARATOR, policies.sort.name());
        job.set(SHUFFLE_GROUPING_COMPARATOR, policies.grouping.name());
        debug!(
            job = job.name(),
            grouped = self.type_name(),
            ?policies,
            partitions = ?options.num_partitions,
            "configured shuffle"
        );
        job.install_shuffle(policies);
        Ok(())
    }

    fn check_wiring(&self, job: &JobConf, options: &GroupingOptions, family: Family) -> Result<()> {
        if options.num_partitions == Some(0) {
            return Err(TypeError::configuration("num_partitions must be at least 1"));
        }
        job.require_resource(family.codec_resource())?;
        let shape = self.grouping_converter().output_shape();
        if shape != OutputShape::KeyValue {
            return Err(TypeError::ShapeMismatch {
                type_name: self.type_name().to_string(),
                expected: OutputShape::KeyValue,
                found: shape,
            });
        }
        Ok(())
    }
}

impl<K: PBound, V: PBound> TypeDescriptor for GroupedType<K, V> {
    fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    fn family(&self) -> Family {
        self.table.family()
    }

    fn sub_types(&self) -> &[Descriptor] {
        self.table.sub_types()
    }

    /// Always fails: grouped records have no flattened form.
    fn default_target(&self, _path: &Path) -> Result<Box<dyn Target>> {
        Err(grouped_write_error(self.type_name()))
    }
}

/// Maps one engine group to `(K, LazyValues)`.
///
/// The key is decoded eagerly; values are decoded as the consumer pulls them.
pub struct GroupedInputFn<K, V> {
    keys: SharedMapFn<Datum, K>,
    values: SharedMapFn<Datum, V>,
}

impl<K, V> Clone for GroupedInputFn<K, V> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            values: Arc::clone(&self.values),
        }
    }
}

impl<K, V, I> MapFn<(Datum, I), (K, LazyValues<I::IntoIter, V>)> for GroupedInputFn<K, V>
where
    I: IntoIterator<Item = Datum>,
{
    fn initialize(&self) {
        self.keys.initialize();
        self.values.initialize();
    }

    fn map(
        &self,
        (key, values): (Datum, I),
    ) -> std::result::Result<(K, LazyValues<I::IntoIter, V>), ConversionError> {
        let key = self.keys.map(key)?;
        Ok((key, LazyValues::new(values.into_iter(), Arc::clone(&self.values))))
    }
}

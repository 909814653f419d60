//! Shuffle policies and grouping options.
//!
//! A group-by repartitions records by key, sorts each partition and splits it
//! into runs of equal keys. The type layer does not perform any of that; it only
//! tells the engine *how*, by installing three policies into the job:
//!
//! - a [`Partitioner`] choosing the partition of each runtime key,
//! - a sort [`KeyComparator`] ordering keys inside a partition,
//! - a grouping [`KeyComparator`] deciding which adjacent keys share a group.
//!
//! [`GroupingOptions`] lets a pipeline override any of them and the partition
//! count. Unset fields fall back to [`HashPartitioner`] and [`NaturalOrder`].

use crate::datum::Datum;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub trait Partitioner: Send + Sync {
    /// Stable name recorded in the job configuration.
    fn name(&self) -> &str;

    /// Partition index in `0..partitions` for `key`. `partitions` is at least 1.
    fn partition(&self, key: &Datum, partitions: usize) -> usize;
}

pub trait KeyComparator: Send + Sync {
    /// Stable name recorded in the job configuration.
    fn name(&self) -> &str;

    fn compare(&self, left: &Datum, right: &Datum) -> Ordering;
}

/// Hash of the runtime key, modulo the partition count.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashPartitioner;

impl Partitioner for HashPartitioner {
    fn name(&self) -> &str {
        "hash"
    }

    #[allow(clippy::cast_possible_truncation)]
    fn partition(&self, key: &Datum, partitions: usize) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % partitions.max(1) as u64) as usize
    }
}

/// The total order of [`Datum`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl KeyComparator for NaturalOrder {
    fn name(&self) -> &str {
        "natural"
    }

    fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        left.cmp(right)
    }
}

/// [`NaturalOrder`], descending.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReverseOrder;

impl KeyComparator for ReverseOrder {
    fn name(&self) -> &str {
        "reverse"
    }

    fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        right.cmp(left)
    }
}

/// The three policies a configured job shuffles with.
#[derive(Clone)]
pub struct ShufflePolicies {
    pub partitioner: Arc<dyn Partitioner>,
    pub sort: Arc<dyn KeyComparator>,
    pub grouping: Arc<dyn KeyComparator>,
}

impl ShufflePolicies {
    /// `(partitioner, sort, grouping)` names.
    #[must_use]
    pub fn names(&self) -> (&str, &str, &str) {
        (self.partitioner.name(), self.sort.name(), self.grouping.name())
    }
}

impl Default for ShufflePolicies {
    fn default() -> Self {
        Self {
            partitioner: Arc::new(HashPartitioner),
            sort: Arc::new(NaturalOrder),
            grouping: Arc::new(NaturalOrder),
        }
    }
}

impl PartialEq for ShufflePolicies {
    fn eq(&self, other: &Self) -> bool {
        self.names() == other.names()
    }
}

impl Debug for ShufflePolicies {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let (partitioner, sort, grouping) = self.names();
        f.debug_struct("ShufflePolicies")
            .field("partitioner", &partitioner)
            .field("sort", &sort)
            .field("grouping", &grouping)
            .finish()
    }
}

/// Per-group-by overrides. Every field is optional.
#[derive(Clone, Default)]
pub struct GroupingOptions {
    pub num_partitions: Option<usize>,
    pub partitioner: Option<Arc<dyn Partitioner>>,
    pub sort_comparator: Option<Arc<dyn KeyComparator>>,
    pub grouping_comparator: Option<Arc<dyn KeyComparator>>,
}

impl GroupingOptions {
    #[must_use]
    pub fn builder() -> GroupingOptionsBuilder {
        GroupingOptionsBuilder::default()
    }

    /// Fill unset policies with the defaults.
    #[must_use]
    pub fn resolve(&self) -> ShufflePolicies {
        let defaults = ShufflePolicies::default();
        ShufflePolicies {
            partitioner: self.partitioner.clone().unwrap_or(defaults.partitioner),
            sort: self.sort_comparator.clone().unwrap_or(defaults.sort),
            grouping: self.grouping_comparator.clone().unwrap_or(defaults.grouping),
        }
    }
}

impl Debug for GroupingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("GroupingOptions")
            .field("num_partitions", &self.num_partitions)
            .field("partitioner", &self.partitioner.as_ref().map(|p| p.name()))
            .field("sort_comparator", &self.sort_comparator.as_ref().map(|c| c.name()))
            .field(
                "grouping_comparator",
                &self.grouping_comparator.as_ref().map(|c| c.name()),
            )
            .finish()
    }
}

#[derive(Default)]
pub struct GroupingOptionsBuilder {
    options: GroupingOptions,
}

impl GroupingOptionsBuilder {
    #[must_use]
    pub fn num_partitions(mut self, n: usize) -> Self {
        self.options.num_partitions = Some(n);
        self
    }

    #[must_use]
    pub fn partitioner(mut self, partitioner: impl Partitioner + 'static) -> Self {
        self.options.partitioner = Some(Arc::new(partitioner));
        self
    }

    #[must_use]
    pub fn sort_comparator(mut self, comparator: impl KeyComparator + 'static) -> Self {
        self.options.sort_comparator = Some(Arc::new(comparator));
        self
    }

    #[must_use]
    pub fn grouping_comparator(mut self, comparator: impl KeyComparator + 'static) -> Self {
        self.options.grouping_comparator = Some(Arc::new(comparator));
        self
    }

    #[must_use]
    pub fn build(self) -> GroupingOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_partitioner_is_stable_and_in_range() {
        let key = Datum::from("alpha");
        let p = HashPartitioner.partition(&key, 7);
        assert!(p < 7);
        assert_eq!(p, HashPartitioner.partition(&key, 7));
        assert_eq!(HashPartitioner.partition(&key, 1), 0);
    }

    #[test]
    fn unset_options_resolve_to_defaults() {
        let resolved = GroupingOptions::builder()
            .sort_comparator(ReverseOrder)
            .build()
            .resolve();
        assert_eq!(resolved.names(), ("hash", "reverse", "natural"));
    }
}

//! In-process execution of a configured group-by.
//!
//! The [`Runner`] plays the engine's part for a single shuffle so pipelines can
//! be exercised end to end without a cluster:
//!
//! 1. encode each `(K, V)` twice: the grouping converter gives the shuffle key,
//!    the record converter gives the payload,
//! 2. route it to a partition by shuffle key with the job's partitioner,
//! 3. sort every partition with the sort comparator and cut it into runs of
//!    shuffle keys the grouping comparator considers equal,
//! 4. hand each run's payload (the first record's key and every record's value)
//!    to [`GroupedType::input_fn`] and the caller's reducer as a lazily decoded
//!    [`Group`].
//!
//! Output is in partition order, then key order within each partition, in both
//! execution modes.

use crate::converter::RuntimeRecord;
use crate::datum::Datum;
use crate::descriptor::TypeDescriptor;
use crate::grouped::{GroupedInputFn, GroupedType};
use crate::lazy::LazyValues;
use crate::map_fn::MapFn;
use crate::pipeline::Pipeline;
use crate::ptype::PBound;
use crate::shuffle::ShufflePolicies;
use anyhow::{Result, anyhow, bail};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::vec::IntoIter;
use tracing::debug;

/// The values of one key, decoded on demand.
pub type Group<V> = LazyValues<IntoIter<Datum>, V>;

/// A record in flight: what the comparators see, and what the reducer gets.
struct Shuffled {
    shuffle_key: Datum,
    payload: RuntimeRecord,
}

#[derive(Clone, Copy, Debug)]
pub enum ExecMode {
    Sequential,
    /// Partitions are reduced on a rayon pool. `threads: None` uses the global pool;
    /// `partitions` applies when the job does not set a partition count.
    Parallel {
        threads: Option<usize>,
        partitions: Option<usize>,
    },
}

pub struct Runner {
    pub mode: ExecMode,
    pub default_partitions: usize,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            mode: ExecMode::Parallel {
                threads: None,
                partitions: None,
            },
            default_partitions: 2 * num_cpus::get().max(2),
        }
    }
}

impl Runner {
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            mode: ExecMode::Sequential,
            ..Self::default()
        }
    }

    /// Shuffle `records` as `pipeline`'s job is configured and reduce every group.
    ///
    /// # Errors
    /// Fails if the job has no shuffle installed, a record does not convert
    /// (the error names the job), the partitioner returns an out-of-range index,
    /// or `reduce` fails. Nothing is counted as processed on error.
    pub fn run_grouped<K, V, O, F>(
        &self,
        pipeline: &Pipeline,
        grouped: &GroupedType<K, V>,
        records: &[(K, V)],
        reduce: F,
    ) -> Result<Vec<O>>
    where
        K: PBound,
        V: PBound,
        O: Send,
        F: Fn(K, Group<V>) -> Result<O> + Send + Sync,
    {
        let job = pipeline.job();
        let Some(policies) = job.shuffle().cloned() else {
            bail!(
                "job '{}' has no shuffle configured; declare a group-by for {} first",
                job.name(),
                grouped.type_name()
            );
        };
        let stage = job.name();
        let partitions = job
            .num_partitions()
            .or(match self.mode {
                ExecMode::Parallel { partitions, .. } => partitions,
                ExecMode::Sequential => None,
            })
            .unwrap_or(self.default_partitions)
            .max(1);

        let grouping = grouped.grouping_converter();
        let converter = grouped.converter();
        let mut buckets: Vec<Vec<Shuffled>> = Vec::new();
        buckets.resize_with(partitions, Vec::new);
        for record in records {
            let shuffle_key = grouping.to_runtime(record).map_err(|e| e.in_stage(stage))?.key;
            let payload = converter.to_runtime(record).map_err(|e| e.in_stage(stage))?;
            let idx = policies.partitioner.partition(&shuffle_key, partitions);
            buckets
                .get_mut(idx)
                .ok_or_else(|| {
                    anyhow!(
                        "partitioner '{}' chose partition {idx} of {partitions}",
                        policies.partitioner.name()
                    )
                })?
                .push(Shuffled {
                    shuffle_key,
                    payload,
                });
        }
        debug!(
            job = stage,
            records = records.len(),
            partitions,
            mode = ?self.mode,
            "running shuffle"
        );

        let input_fn = grouped.input_fn();
        let reduce_one =
            |part: Vec<Shuffled>| reduce_partition(part, &policies, &input_fn, &reduce, stage);
        let reduced: Vec<Vec<O>> = match self.mode {
            ExecMode::Sequential => buckets
                .into_iter()
                .map(reduce_one)
                .collect::<Result<_>>()?,
            ExecMode::Parallel { threads, .. } => {
                let run = || {
                    buckets
                        .into_par_iter()
                        .map(reduce_one)
                        .collect::<Result<Vec<_>>>()
                };
                match threads {
                    Some(t) => rayon::ThreadPoolBuilder::new()
                        .num_threads(t)
                        .build()?
                        .install(run)?,
                    None => run()?,
                }
            }
        };

        pipeline.add_records_processed(records.len() as u64);
        Ok(reduced.into_iter().flatten().collect())
    }
}

fn reduce_partition<K, V, O, F>(
    mut part: Vec<Shuffled>,
    policies: &ShufflePolicies,
    input_fn: &GroupedInputFn<K, V>,
    reduce: &F,
    stage: &str,
) -> Result<Vec<O>>
where
    F: Fn(K, Group<V>) -> Result<O>,
{
    if part.is_empty() {
        return Ok(Vec::new());
    }
    part.sort_by(|a, b| policies.sort.compare(&a.shuffle_key, &b.shuffle_key));
    <GroupedInputFn<K, V> as MapFn<(Datum, Vec<Datum>), (K, Group<V>)>>::initialize(input_fn);

    let mut out = Vec::new();
    let mut records = part.into_iter().peekable();
    while let Some(first) = records.next() {
        let Shuffled {
            shuffle_key,
            payload,
        } = first;
        let mut values = vec![payload.value];
        while let Some(next) = records.next_if(|r| {
            policies.grouping.compare(&shuffle_key, &r.shuffle_key) == Ordering::Equal
        }) {
            values.push(next.payload.value);
        }
        let (k, group) = <GroupedInputFn<K, V> as MapFn<(Datum, Vec<Datum>), (K, Group<V>)>>::map(
            input_fn,
            (payload.key, values),
        )
        .map_err(|e| e.in_stage(stage))?;
        out.push(reduce(k, group)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Native, PTypeFamily};
    use crate::ptype::table_of;
    use crate::shuffle::GroupingOptions;

    #[test]
    fn runs_require_a_configured_shuffle() -> Result<()> {
        let table = table_of(&Native.strings(), &Native.longs())?;
        let err = Runner::sequential()
            .run_grouped(&Pipeline::default(), &table.grouped(), &[], |k: String, _| Ok(k))
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default();
        assert!(err.contains("no shuffle configured"), "got: {err}");
        Ok(())
    }

    #[test]
    fn single_partition_yields_sorted_keys() -> Result<()> {
        let p = Pipeline::default();
        let table = table_of(&Native.strings(), &Native.longs())?;
        let options = GroupingOptions::builder().num_partitions(1).build();
        let (_, grouped) = p.group_by_key(&table, &options)?;
        let rows = vec![("b".to_string(), 1), ("a".to_string(), 2), ("b".to_string(), 3)];
        let keys =
            Runner::sequential().run_grouped(&p, &grouped, &rows, |k, vs| Ok((k, vs.count())))?;
        assert_eq!(keys, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(p.records_processed(), 3);
        Ok(())
    }
}

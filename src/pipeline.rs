//! Pipeline declaration.
//!
//! A [`Pipeline`] owns the [`JobConf`] being assembled and the ordered list of
//! declared stages. Declaring a stage validates it against the type layer right
//! away: a group-by configures the shuffle, a write asks the target whether it
//! accepts the descriptor. A rejected declaration leaves both the job and the
//! stage list untouched, so nothing is ever scheduled for it.
//!
//! `Pipeline` is a cheap handle; clones share the same state.

use crate::descriptor::{Descriptor, DescriptorKind, TypeDescriptor, grouped_write_error};
use crate::error::{Result, TypeError};
use crate::grouped::GroupedType;
use crate::job::JobConf;
use crate::ptype::{PBound, TableType};
use crate::shuffle::GroupingOptions;
use crate::stage_id::StageId;
use crate::target::Target;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Clone)]
pub enum StageKind {
    GroupBy,
    Write { target: Arc<dyn Target> },
}

impl Debug for StageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            StageKind::GroupBy => f.write_str("GroupBy"),
            StageKind::Write { target } => write!(f, "Write({target})"),
        }
    }
}

/// A declared stage and the descriptor of the records it produces or consumes.
#[derive(Clone, Debug)]
pub struct Stage {
    pub id: StageId,
    pub kind: StageKind,
    pub descriptor: Descriptor,
}

struct PipelineInner {
    next_id: u64,
    job: JobConf,
    stages: Vec<Stage>,
    records_processed: u64,
}

pub struct Pipeline {
    inner: Arc<Mutex<PipelineInner>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(JobConf::default())
    }
}

impl Clone for Pipeline {
    fn clone(&self) -> Self {
        Pipeline {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(job: JobConf) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PipelineInner {
                next_id: 0,
                job,
                stages: Vec::new(),
                records_processed: 0,
            })),
        }
    }

    // Every critical section leaves the state consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, PipelineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declare a group-by over `table` and configure the job's shuffle for it.
    ///
    /// A job shuffles once; a later group-by replaces the earlier one's settings.
    ///
    /// # Errors
    /// Whatever [`GroupedType::configure_shuffle`] reports. The job and stage
    /// list are unchanged on error.
    pub fn group_by_key<K: PBound, V: PBound>(
        &self,
        table: &TableType<K, V>,
        options: &GroupingOptions,
    ) -> Result<(StageId, GroupedType<K, V>)> {
        let grouped = table.grouped();
        let mut g = self.lock();
        let mut job = g.job.clone();
        grouped.configure_shuffle(&mut job, options)?;
        g.job = job;
        let id = Self::push_stage(&mut g, StageKind::GroupBy, grouped.descriptor().clone());
        debug!(%id, grouped = grouped.type_name(), "declared group-by");
        Ok((id, grouped))
    }

    /// Declare a write of `ptype` records to `target`.
    ///
    /// # Errors
    /// [`TypeError::UnsupportedShape`] naming the type if it is grouped or the
    /// target does not accept it; the target's configuration error otherwise.
    /// The job and stage list are unchanged on error.
    pub fn write(&self, ptype: &dyn TypeDescriptor, target: Box<dyn Target>) -> Result<StageId> {
        if ptype.descriptor().kind() == DescriptorKind::Grouped {
            return Err(grouped_write_error(ptype.type_name()));
        }
        if !target.accept(ptype) {
            return Err(TypeError::unsupported(
                ptype.type_name(),
                format!("{target} does not accept records of shape {}", ptype.shape()),
            ));
        }
        let mut g = self.lock();
        let mut job = g.job.clone();
        target.configure(&mut job, ptype)?;
        g.job = job;
        let id = Self::push_stage(
            &mut g,
            StageKind::Write {
                target: Arc::from(target),
            },
            ptype.descriptor().clone(),
        );
        debug!(%id, ptype = ptype.type_name(), "declared write");
        Ok(id)
    }

    /// [`write`](Self::write) to the descriptor's default target at `path`.
    ///
    /// # Errors
    /// Fails for grouped descriptors, which have no default target.
    pub fn write_default(
        &self,
        ptype: &dyn TypeDescriptor,
        path: impl AsRef<Path>,
    ) -> Result<StageId> {
        let target = ptype.default_target(path.as_ref())?;
        self.write(ptype, target)
    }

    fn push_stage(g: &mut PipelineInner, kind: StageKind, descriptor: Descriptor) -> StageId {
        let id = StageId::new(g.next_id);
        g.next_id += 1;
        g.stages.push(Stage { id, kind, descriptor });
        id
    }

    /// Snapshot of the job configuration.
    #[must_use]
    pub fn job(&self) -> JobConf {
        self.lock().job.clone()
    }

    #[must_use]
    pub fn stages(&self) -> Vec<Stage> {
        self.lock().stages.clone()
    }

    /// Records run through this pipeline's stages so far.
    #[must_use]
    pub fn records_processed(&self) -> u64 {
        self.lock().records_processed
    }

    pub(crate) fn add_records_processed(&self, n: u64) {
        self.lock().records_processed += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Native, PTypeFamily};
    use crate::ptype::table_of;

    #[test]
    fn stage_ids_are_sequential() -> Result<()> {
        let p = Pipeline::default();
        let table = table_of(&Native.strings(), &Native.longs())?;
        let (first, _) = p.group_by_key(&table, &GroupingOptions::default())?;
        let second = p.write_default(&table, "out/t.jsonl")?;
        assert_eq!((first.raw(), second.raw()), (0, 1));
        assert_eq!(p.stages().len(), 2);
        Ok(())
    }

    #[test]
    fn clones_share_state() -> Result<()> {
        let p = Pipeline::default();
        let q = p.clone();
        q.write_default(&Native.strings(), "out/s.jsonl")?;
        assert_eq!(p.stages().len(), 1);
        Ok(())
    }
}

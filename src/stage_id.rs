//! Sequential identifiers for stages declared on a [`Pipeline`](crate::pipeline::Pipeline).
//!
//! Small, `Copy` and hashable, so they work as map keys when inspecting a plan.

use std::fmt::{Display, Formatter, Result as FormatResult};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StageId(u64);

impl StageId {
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    /// The underlying sequence number.
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for StageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "stage-{}", self.0)
    }
}

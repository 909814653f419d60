//! The engine's job configuration handle.
//!
//! [`JobConf`] is what the type layer writes into while a pipeline is being
//! assembled: string settings (in the spirit of a Hadoop `Configuration`), the
//! installed shuffle policies, and the set of resources the engine has made
//! available to the job. It is mutated only during single-threaded job setup.
//!
//! Two configurations are equal when their settings, resources and policy
//! names are equal; [`JobConf::fingerprint`] condenses the same state into a
//! SHA-256 digest.

use crate::descriptor::Family;
use crate::error::{Result, TypeError};
use crate::shuffle::ShufflePolicies;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

pub const SHUFFLE_PARTITIONS: &str = "ironbeam.shuffle.partitions";
pub const SHUFFLE_FAMILY: &str = "ironbeam.shuffle.family";
pub const SHUFFLE_KEY_TYPE: &str = "ironbeam.shuffle.key.type";
pub const SHUFFLE_VALUE_TYPE: &str = "ironbeam.shuffle.value.type";
pub const SHUFFLE_PARTITIONER: &str = "ironbeam.shuffle.partitioner";
pub const SHUFFLE_SORT_COMPARATOR: &str = "ironbeam.shuffle.sort.comparator";
pub const SHUFFLE_GROUPING_COMPARATOR: &str = "ironbeam.shuffle.grouping.comparator";
pub const OUTPUT_FORMAT: &str = "ironbeam.output.format";
pub const OUTPUT_PATH: &str = "ironbeam.output.path";
pub const OUTPUT_TABLE: &str = "ironbeam.output.table";

#[derive(Clone, Debug)]
pub struct JobConf {
    name: String,
    settings: BTreeMap<String, String>,
    resources: BTreeSet<String>,
    shuffle: Option<ShufflePolicies>,
}

impl Default for JobConf {
    /// A job with the codecs of both built-in families registered.
    fn default() -> Self {
        let mut job = Self::empty("ironbeam-job");
        job.register_resource(Family::Native.codec_resource());
        job.register_resource(Family::Postcard.codec_resource());
        job
    }
}

impl PartialEq for JobConf {
    fn eq(&self, other: &Self) -> bool {
        self.settings == other.settings
            && self.resources == other.resources
            && self.shuffle == other.shuffle
    }
}

impl JobConf {
    /// A job with no settings and no registered resources.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: BTreeMap::new(),
            resources: BTreeSet::new(),
            shuffle: None,
        }
    }

    /// [`JobConf::default`] under another name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.settings.remove(key)
    }

    #[must_use]
    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    pub fn register_resource(&mut self, resource: impl Into<String>) {
        self.resources.insert(resource.into());
    }

    #[must_use]
    pub fn has_resource(&self, resource: &str) -> bool {
        self.resources.contains(resource)
    }

    /// # Errors
    /// [`TypeError::Configuration`] if the engine did not register `resource`.
    pub fn require_resource(&self, resource: &str) -> Result<()> {
        if self.has_resource(resource) {
            Ok(())
        } else {
            Err(TypeError::configuration(format!(
                "job '{}' is missing required resource '{resource}'",
                self.name
            )))
        }
    }

    pub(crate) fn install_shuffle(&mut self, policies: ShufflePolicies) {
        self.shuffle = Some(policies);
    }

    #[must_use]
    pub fn shuffle(&self) -> Option<&ShufflePolicies> {
        self.shuffle.as_ref()
    }

    /// The configured shuffle partition count, if any.
    #[must_use]
    pub fn num_partitions(&self) -> Option<usize> {
        self.get(SHUFFLE_PARTITIONS).and_then(|n| n.parse().ok())
    }

    /// Hex SHA-256 over settings and resources.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (k, v) in &self.settings {
            hasher.update(k.as_bytes());
            hasher.update([0u8]);
            hasher.update(v.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update([0xffu8]);
        for r in &self.resources {
            hasher.update(r.as_bytes());
            hasher.update([0u8]);
        }
        hasher.finalize().iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "settings": self.settings,
            "resources": self.resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registers_family_codecs() {
        let job = JobConf::default();
        assert!(job.has_resource("codec.native"));
        assert!(job.has_resource("codec.postcard"));
        assert!(JobConf::empty("bare").require_resource("codec.native").is_err());
    }

    #[test]
    fn fingerprint_tracks_settings() {
        let mut a = JobConf::default();
        let b = JobConf::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
        a.set(SHUFFLE_PARTITIONS, "3");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.num_partitions(), Some(3));
    }

    #[test]
    fn json_dump_lists_settings() {
        let mut job = JobConf::empty("dump");
        job.set(OUTPUT_TABLE, "events");
        let v = job.to_json();
        assert_eq!(v["settings"][OUTPUT_TABLE], "events");
        assert_eq!(v["name"], "dump");
    }
}

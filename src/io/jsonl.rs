//! JSON Lines file target.
//!
//! [`JsonlTarget`] is the default target of every non-grouped descriptor. It
//! accepts both value and key/value shapes and stores one [`RuntimeRecord`] per
//! line, so anything a converter can produce can be written and read back.
//!
//! # Notes
//! - Empty or whitespace-only lines are skipped on read.
//! - `NaN` floats are serialized as JSON `null` and do not read back.

use crate::converter::{Converter, RuntimeRecord};
use crate::descriptor::TypeDescriptor;
use crate::error::Result as TypeResult;
use crate::job::{JobConf, OUTPUT_FORMAT, OUTPUT_PATH};
use crate::target::Target;
use crate::type_token::ShapeTag;
use anyhow::{Context, Result};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::fs::{File, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JsonlTarget {
    path: PathBuf,
}

impl JsonlTarget {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write records, one JSON document per line. Parent directories are
    /// created as needed.
    ///
    /// # Returns
    /// The number of records written.
    ///
    /// # Errors
    /// Returns an error if the file or its parent directories cannot be created,
    /// or a record fails to serialize.
    pub fn write_records(&self, records: &[RuntimeRecord]) -> Result<usize> {
        let path = self.path.as_path();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
        }
        let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut w = BufWriter::new(f);
        for (i, record) in records.iter().enumerate() {
            serde_json::to_writer(&mut w, record)
                .with_context(|| format!("serialize record #{} to {}", i, path.display()))?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
        debug!(path = %path.display(), records = records.len(), "wrote jsonl");
        Ok(records.len())
    }

    /// Convert typed values with `converter` and write them.
    ///
    /// # Errors
    /// Fails on the first value that does not convert, before anything is written.
    pub fn write_values<T>(&self, converter: &dyn Converter<T>, values: &[T]) -> Result<usize> {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                converter
                    .to_runtime(v)
                    .with_context(|| format!("convert value #{i} for {}", self.path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.write_records(&records)
    }

    /// Read every record back.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a line fails to parse.
    pub fn read_records(&self) -> Result<Vec<RuntimeRecord>> {
        let path = self.path.as_path();
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let mut out = Vec::new();
        for (i, line) in BufReader::new(f).lines().enumerate() {
            let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RuntimeRecord = serde_json::from_str(&line).with_context(|| {
                format!("parse JSONL line {} in {}: {}", i + 1, path.display(), line)
            })?;
            out.push(record);
        }
        Ok(out)
    }

    /// Read records back and rebuild typed values with `converter`.
    ///
    /// # Errors
    /// Read and parse errors as in [`read_records`](Self::read_records), plus
    /// conversion errors for records that do not match the declared type.
    pub fn read_values<T>(&self, converter: &dyn Converter<T>) -> Result<Vec<T>> {
        self.read_records()?
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                converter
                    .from_runtime(r.key, r.value)
                    .with_context(|| format!("convert record #{i} from {}", self.path.display()))
            })
            .collect()
    }
}

impl Display for JsonlTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "Jsonl({})", self.path.display())
    }
}

impl Target for JsonlTarget {
    /// Both value and key/value records are written as-is.
    fn accepts_shape(&self, _shape: &ShapeTag) -> bool {
        true
    }

    fn configure(&self, job: &mut JobConf, _ptype: &dyn TypeDescriptor) -> TypeResult<()> {
        job.set(OUTPUT_FORMAT, "jsonl");
        job.set(OUTPUT_PATH, self.path.display().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::family::{Native, PTypeFamily};
    use crate::ptype::table_of;

    #[test]
    fn table_values_survive_a_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = JsonlTarget::new(dir.path().join("nested/out.jsonl"));
        let table = table_of(&Native.strings(), &Native.doubles())?;
        let rows = vec![("a".to_string(), 1.5), ("b".to_string(), -2.0)];

        assert_eq!(target.write_values(table.converter().as_ref(), &rows)?, 2);
        assert_eq!(target.read_values(table.converter().as_ref())?, rows);
        Ok(())
    }

    #[test]
    fn value_records_leave_key_null() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = JsonlTarget::new(dir.path().join("v.jsonl"));
        target.write_values(Native.longs().converter().as_ref(), &[7])?;
        let records = target.read_records()?;
        assert_eq!(records, vec![RuntimeRecord::value(Datum::Int(7))]);
        Ok(())
    }

    #[test]
    fn configure_records_path() {
        let mut job = JobConf::default();
        let target = JsonlTarget::new("out/part.jsonl");
        assert!(target.configure(&mut job, &Native.strings()).is_ok());
        assert_eq!(job.get(OUTPUT_FORMAT), Some("jsonl"));
        assert_eq!(job.get(OUTPUT_PATH), Some("out/part.jsonl"));
    }
}

//! I/O glue: file targets and path inspection.

#[cfg(feature = "io-jsonl")]
pub mod jsonl;

pub mod path;

// src/store.rs
//! JSON group archives: the durable output of a run.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::options::DecodePolicy;
use crate::error::{PipelineError, Result, Skip};
use crate::file::write_atomic;
use crate::model::{ArchiveRecord, ClassifiedOrder};

/// Overwrite `path` with the full record list of one group.
pub fn save_archive(path: &Path, orders: &[ClassifiedOrder]) -> Result<()> {
    let records: Vec<ArchiveRecord> = orders.iter().map(ArchiveRecord::from).collect();
    save_records(path, &records)
}

pub fn save_records(path: &Path, records: &[ArchiveRecord]) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(records).map_err(|e| PipelineError::json(path, e))?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Archive {
    pub records: Vec<ArchiveRecord>,
    /// Elements that were not record objects.
    pub skipped: Vec<Skip>,
}

/// Read an archive. The file must be a JSON array; elements that are not
/// record-shaped are handled per `policy`.
pub fn load_archive(path: &Path, policy: DecodePolicy) -> Result<Archive> {
    let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let values: Vec<Value> = serde_json::from_str(&text).map_err(|e| PipelineError::json(path, e))?;

    let mut archive = Archive::default();
    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<ArchiveRecord>(value) {
            Ok(rec) => archive.records.push(rec),
            Err(e) => {
                let err = PipelineError::parse(format!("{} [{i}]", path.display()), e.to_string());
                match policy {
                    DecodePolicy::Abort => return Err(err),
                    DecodePolicy::SkipAndCount => archive.skipped.push(Skip::from(&err)),
                }
            }
        }
    }
    if !archive.skipped.is_empty() {
        tracing::warn!(path = %path.display(), skipped = archive.skipped.len(), "archive records skipped");
    }
    Ok(archive)
}

/// Typed orders from an archive; records without a readable entry date count as skips.
pub fn load_orders(path: &Path, policy: DecodePolicy) -> Result<(Vec<ClassifiedOrder>, Vec<Skip>)> {
    let Archive { records, mut skipped } = load_archive(path, policy)?;
    let mut orders = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        match rec.to_classified() {
            Some(c) => orders.push(c),
            None => {
                let err = PipelineError::MissingField { field: "data_entrada", item: format!("{} [{i}]", path.display()) };
                match policy {
                    DecodePolicy::Abort => return Err(err),
                    DecodePolicy::SkipAndCount => skipped.push(Skip::from(&err)),
                }
            }
        }
    }
    Ok((orders, skipped))
}

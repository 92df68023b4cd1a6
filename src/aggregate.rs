// src/aggregate.rs
//! Group classified orders per responsible party and persist one archive per group.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::options::GroupKey;
use crate::core::sanitize::{manager_stem, party_name, slugify};
use crate::error::{PipelineError, Result};
use crate::file::{ensure_directory, list_files};
use crate::model::ClassifiedOrder;
use crate::store::save_archive;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Archive file stem. Two names with the same stem share one group.
    pub key: String,
    /// First spelling seen, uppercased.
    pub name: String,
    pub orders: Vec<ClassifiedOrder>,
}

impl Group {
    pub fn file_name(&self) -> String {
        join!(&self.key, ".json")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Grouping {
    pub groups: Vec<Group>,
    /// Orders with no usable responsible party.
    pub dropped: usize,
}

fn file_key(group: &GroupKey, name: &str) -> String {
    match group {
        GroupKey::Provider => slugify(name),
        GroupKey::Manager(_) => manager_stem(name),
    }
}

/// Group orders by `key`. Groups come back sorted by file key.
pub fn group(orders: Vec<ClassifiedOrder>, key: &GroupKey) -> Grouping {
    let mut by_key: BTreeMap<String, Group> = BTreeMap::new();
    let mut dropped = 0usize;

    for c in orders {
        let raw = match key {
            GroupKey::Provider => c.order.provider.as_deref(),
            GroupKey::Manager(name) => Some(name.as_str()),
        };
        let Some(name) = raw.and_then(party_name) else {
            dropped += 1;
            continue;
        };
        let stem = file_key(key, &name);
        if stem.is_empty() {
            dropped += 1;
            continue;
        }
        by_key
            .entry(stem.clone())
            .or_insert_with(|| Group { key: stem, name, orders: Vec::new() })
            .orders
            .push(c);
    }

    if dropped > 0 {
        tracing::warn!(dropped, "orders without a responsible party left out of grouping");
    }
    Grouping { groups: by_key.into_values().collect(), dropped }
}

/// Write every group to `dir/<key>.json`, replacing what a previous run left there.
pub fn persist(groups: &[Group], dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;
    let mut written = Vec::with_capacity(groups.len());
    for g in groups {
        let path = dir.join(g.file_name());
        save_archive(&path, &g.orders)?;
        tracing::debug!(group = %g.name, orders = g.orders.len(), path = %path.display(), "archive written");
        written.push(path);
    }
    Ok(written)
}

/// Remove archives in `dir` that are not in `keep`. Returns how many went.
pub fn prune_stale(dir: &Path, keep: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    for path in known_archives(dir)? {
        if !keep.contains(&path) {
            fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            removed += 1;
        }
    }
    if removed > 0 {
        tracing::info!(removed, dir = %dir.display(), "stale archives removed");
    }
    Ok(removed)
}

/// Archives already present in `dir`.
pub fn known_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    list_files(dir, &["json"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::model::ServiceOrder;
    use chrono::NaiveDate;

    fn order(id: &str, provider: Option<&str>) -> ClassifiedOrder {
        classify(ServiceOrder {
            order_id: s!(id),
            fleet_id: None,
            model: None,
            requester: None,
            provider: provider.map(str::to_string),
            entry_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            estimated_exit_date: None,
            service_description: None,
        })
    }

    #[test]
    fn accent_and_case_variants_merge_into_one_group() {
        let g = group(vec![order("1", Some("João Só")), order("2", Some("JOAO SO")), order("3", Some("Outra"))], &GroupKey::Provider);
        assert_eq!(g.groups.len(), 2);
        let joao = g.groups.iter().find(|x| x.key == "joao_so").unwrap();
        assert_eq!(joao.orders.len(), 2);
        assert_eq!(joao.name, "JOÃO SÓ");
        assert_eq!(joao.file_name(), "joao_so.json");
    }

    #[test]
    fn orders_without_provider_are_dropped_and_counted() {
        let g = group(vec![order("1", None), order("2", Some("!!!")), order("3", Some("A"))], &GroupKey::Provider);
        assert_eq!(g.dropped, 2);
        assert_eq!(g.groups.len(), 1);
    }

    #[test]
    fn manager_mode_puts_everything_under_the_manager() {
        let g = group(vec![order("1", None), order("2", Some("X"))], &GroupKey::Manager(s!("Ana Paula")));
        assert_eq!(g.groups.len(), 1);
        assert_eq!(g.groups[0].file_name(), "ANA_PAULA.json");
        assert_eq!(g.groups[0].orders.len(), 2);
    }

    #[test]
    fn persist_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let first = group(vec![order("1", Some("A")), order("2", Some("A"))], &GroupKey::Provider);
        persist(&first.groups, dir.path()).unwrap();
        let second = group(vec![order("3", Some("A"))], &GroupKey::Provider);
        let written = persist(&second.groups, dir.path()).unwrap();

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 1);
        assert_eq!(known_archives(dir.path()).unwrap(), written);
    }

    #[test]
    fn prune_removes_groups_missing_from_this_run() {
        let dir = tempfile::tempdir().unwrap();
        let before = group(vec![order("1", Some("A")), order("2", Some("B"))], &GroupKey::Provider);
        persist(&before.groups, dir.path()).unwrap();
        let now = group(vec![order("3", Some("B"))], &GroupKey::Provider);
        let written = persist(&now.groups, dir.path()).unwrap();

        assert_eq!(prune_stale(dir.path(), &written).unwrap(), 1);
        assert_eq!(known_archives(dir.path()).unwrap(), written);
    }
}

// src/classify.rs
//! Release-authority and completeness classification.
//!
//! `classify` is a pure function of the order: the primary tag comes from the
//! first entry of [`MARKERS`] found anywhere in the folded description, the
//! missing-estimate flag from the estimated exit date alone.

use std::collections::BTreeMap;

use crate::core::sanitize::fold_key;
use crate::model::{ClassifiedOrder, ReleasedBy, ServiceOrder};

/// Markers in priority order, compared against the description folded to
/// lowercase ASCII with single spaces. A new marker gets an explicit slot here.
pub const MARKERS: &[(&str, ReleasedBy)] = &[
    ("liberado sr. mauricio", ReleasedBy::Mauricio),
    ("liberado sr mauricio", ReleasedBy::Mauricio),
    ("liberado pelo sr. mauricio", ReleasedBy::Mauricio),
    ("liberado pelo mauricio", ReleasedBy::Mauricio),
    ("liberado pelo gestor", ReleasedBy::Gestor),
    ("liberado gestor", ReleasedBy::Gestor),
    ("liberado pela gerencia", ReleasedBy::Gestor),
];

pub fn released_by(description: Option<&str>) -> ReleasedBy {
    let Some(text) = description else {
        return ReleasedBy::Unclassified;
    };
    let folded = fold_key(text);
    MARKERS
        .iter()
        .find(|(marker, _)| folded.contains(marker))
        .map(|&(_, who)| who)
        .unwrap_or(ReleasedBy::Unclassified)
}

pub fn classify(order: ServiceOrder) -> ClassifiedOrder {
    let released_by = released_by(order.service_description.as_deref());
    let missing_estimate = order.estimated_exit_date.is_none();
    ClassifiedOrder { order, released_by, missing_estimate }
}

pub fn classify_all(orders: Vec<ServiceOrder>) -> Vec<ClassifiedOrder> {
    orders.into_iter().map(classify).collect()
}

/// Orders partitioned by release authority, plus the missing-estimate list.
/// Every order sits in exactly one authority bucket; the estimate list overlaps freely.
#[derive(Clone, Debug, Default)]
pub struct Buckets {
    pub by_release: BTreeMap<ReleasedBy, Vec<ClassifiedOrder>>,
    pub missing_estimate: Vec<ClassifiedOrder>,
}

impl Buckets {
    pub fn partition(orders: &[ClassifiedOrder]) -> Self {
        let mut buckets = Buckets::default();
        for c in orders {
            buckets.by_release.entry(c.released_by).or_default().push(c.clone());
            if c.missing_estimate {
                buckets.missing_estimate.push(c.clone());
            }
        }
        buckets
    }

    pub fn count(&self, who: ReleasedBy) -> usize {
        self.by_release.get(&who).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.by_release.values().map(Vec::len).sum()
    }
}

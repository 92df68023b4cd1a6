// src/normalize.rs
//! Raw table → `ServiceOrder[]`.
//!
//! Pure transform over an exported [`Table`]: schema check, row filters, date
//! parsing, cell cleanup. A missing column aborts; everything else is a per-row
//! keep/drop decision tallied in [`NormalizeSummary`].

use crate::config::consts::STATUS_OPEN;
use crate::config::options::{ColumnMap, FilterSpec};
use crate::core::dates::parse_day_first;
use crate::core::sanitize::normalize_ws;
use crate::csv::Table;
use crate::error::{PipelineError, Result};
use crate::model::ServiceOrder;

/// Resolved header positions for one table.
#[derive(Clone, Copy, Debug)]
struct Columns {
    unit: usize,
    status: usize,
    entry_date: usize,
    estimated_exit: usize,
    actual_exit: usize,
    order_id: usize,
    fleet_id: usize,
    model: usize,
    requester: usize,
    provider: usize,
    service: usize,
}

impl Columns {
    fn resolve(table: &Table, map: &ColumnMap) -> Result<Self> {
        let required = map.required();
        let mut found = [0usize; 11];
        let mut missing = Vec::new();
        for (slot, (_, header)) in found.iter_mut().zip(required.iter()) {
            match table.column(header) {
                Some(idx) => *slot = idx,
                None => missing.push(header.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::Schema { missing });
        }
        let [unit, status, entry_date, estimated_exit, actual_exit, order_id, fleet_id, model, requester, provider, service] =
            found;
        Ok(Self {
            unit, status, entry_date, estimated_exit, actual_exit,
            order_id, fleet_id, model, requester, provider, service,
        })
    }
}

/// Why a row did not make it. Counted, not logged per row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowDrop {
    Unit,
    Status,
    NoEstimate,
    AlreadyExited,
    NoRequester,
    NoEntryDate,
    OutsideWindow,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub rows_in: usize,
    pub kept: usize,
    pub dropped_unit: usize,
    pub dropped_status: usize,
    pub dropped_no_estimate: usize,
    pub dropped_exited: usize,
    pub dropped_no_requester: usize,
    pub dropped_no_entry_date: usize,
    pub dropped_window: usize,
}

impl NormalizeSummary {
    fn count(&mut self, why: RowDrop) {
        let slot = match why {
            RowDrop::Unit => &mut self.dropped_unit,
            RowDrop::Status => &mut self.dropped_status,
            RowDrop::NoEstimate => &mut self.dropped_no_estimate,
            RowDrop::AlreadyExited => &mut self.dropped_exited,
            RowDrop::NoRequester => &mut self.dropped_no_requester,
            RowDrop::NoEntryDate => &mut self.dropped_no_entry_date,
            RowDrop::OutsideWindow => &mut self.dropped_window,
        };
        *slot += 1;
    }

    pub fn dropped(&self) -> usize {
        self.rows_in - self.kept
    }
}

/// Normalize every row of `table` against `filter`.
pub fn normalize(table: &Table, columns: &ColumnMap, filter: &FilterSpec) -> Result<(Vec<ServiceOrder>, NormalizeSummary)> {
    let cols = Columns::resolve(table, columns)?;
    let mut summary = NormalizeSummary { rows_in: table.rows.len(), ..Default::default() };
    let mut orders = Vec::new();

    for row in &table.rows {
        match normalize_row(row, &cols, filter) {
            Ok(order) => {
                orders.push(order);
                summary.kept += 1;
            }
            Err(why) => summary.count(why),
        }
    }

    tracing::info!(
        rows = summary.rows_in,
        kept = summary.kept,
        dropped = summary.dropped(),
        "normalized export table"
    );
    tracing::debug!(?summary, "row drop breakdown");
    Ok((orders, summary))
}

fn normalize_row(row: &[String], c: &Columns, filter: &FilterSpec) -> std::result::Result<ServiceOrder, RowDrop> {
    let cell = |idx: usize| Table::cell(row, idx);

    let unit = parse_unit(cell(c.unit)).ok_or(RowDrop::Unit)?;
    if !filter.units.contains(&unit) {
        return Err(RowDrop::Unit);
    }
    if !cell(c.status).trim().eq_ignore_ascii_case(STATUS_OPEN) {
        return Err(RowDrop::Status);
    }

    let estimated_exit_date = parse_day_first(cell(c.estimated_exit));
    if filter.require_estimate && estimated_exit_date.is_none() {
        return Err(RowDrop::NoEstimate);
    }
    if parse_day_first(cell(c.actual_exit)).is_some() {
        return Err(RowDrop::AlreadyExited);
    }

    let requester = text(cell(c.requester));
    if filter.window.is_some() && requester.is_none() {
        return Err(RowDrop::NoRequester);
    }

    let entry_date = parse_day_first(cell(c.entry_date)).ok_or(RowDrop::NoEntryDate)?;
    if let Some(window) = &filter.window {
        if !window.contains(entry_date) {
            return Err(RowDrop::OutsideWindow);
        }
    }

    Ok(ServiceOrder {
        order_id: order_id(cell(c.order_id)),
        fleet_id: text(cell(c.fleet_id)),
        model: text(cell(c.model)),
        requester,
        provider: text(cell(c.provider)),
        entry_date,
        estimated_exit_date,
        service_description: description(cell(c.service)),
    })
}

/// Unit codes arrive as "4", "04" or "4.0" depending on the exporter.
fn parse_unit(raw: &str) -> Option<u32> {
    let s = raw.trim();
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.parse().ok()
}

/// Single-line free text: whitespace collapsed, blank → None.
fn text(raw: &str) -> Option<String> {
    let s = normalize_ws(raw);
    (!s.is_empty()).then_some(s)
}

/// Multi-line free text: line endings unified, each line trimmed, outer blank lines removed.
fn description(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    let s = joined.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Undo the float rendering spreadsheets give numeric ids ("12345.0" → "12345").
fn order_id(raw: &str) -> String {
    let s = raw.trim();
    match s.strip_suffix(".0") {
        Some(int) if !int.is_empty() && int.bytes().all(|b| b.is_ascii_digit()) => int.to_string(),
        _ => s.to_string(),
    }
}

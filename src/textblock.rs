// src/textblock.rs
//! Intermediate text document: one fixed-layout block per order.
//!
//! ```text
//! Solicitante: Ana
//! Frota: F-01
//! Modelo: Volvo FH
//! OS: 101
//! Data Entrada: 10/04/2025
//! Previsão Saída: 01/05/2025
//! Prestador: Oficina A
//! Serviço: Liberado Sr. Mauricio
//! --------------------------------------------------
//! ```
//!
//! Lines are positional: the parser never looks at label text. The description
//! is last and owns every remaining line of its block, so multi-line
//! descriptions survive. A description line made only of the delimiter would
//! split its block; that input is not defended against. Likewise a value that
//! is literally `---` is indistinguishable from the placeholder and reads back
//! as absent.

use crate::config::consts::{BLOCK_DELIMITER_CHAR, BLOCK_DELIMITER_LEN, PLACEHOLDER};
use crate::config::options::DecodePolicy;
use crate::core::dates::{format_date, parse_block_date};
use crate::error::{PipelineError, Result, Skip};
use crate::model::ServiceOrder;

/// Field order of a block. Changing order or count breaks existing documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Requester,
    Fleet,
    Model,
    OrderId,
    EntryDate,
    EstimatedExit,
    Provider,
    Service,
}

pub struct BlockSchema;

impl BlockSchema {
    pub const FIELDS: [(Field, &'static str); 8] = [
        (Field::Requester, "Solicitante"),
        (Field::Fleet, "Frota"),
        (Field::Model, "Modelo"),
        (Field::OrderId, "OS"),
        (Field::EntryDate, "Data Entrada"),
        (Field::EstimatedExit, "Previsão Saída"),
        (Field::Provider, "Prestador"),
        (Field::Service, "Serviço"),
    ];

    pub fn delimiter() -> String {
        std::iter::repeat_n(BLOCK_DELIMITER_CHAR, BLOCK_DELIMITER_LEN).collect()
    }

    fn is_delimiter(line: &str) -> bool {
        let line = line.trim_end_matches('\r');
        line.len() == BLOCK_DELIMITER_LEN && line.chars().all(|c| c == BLOCK_DELIMITER_CHAR)
    }
}

/* ---------------- Serialize ---------------- */

fn render_value(order: &ServiceOrder, field: Field) -> String {
    match field {
        Field::Requester => or_placeholder!(order.requester.as_deref()),
        Field::Fleet => or_placeholder!(order.fleet_id.as_deref()),
        Field::Model => or_placeholder!(order.model.as_deref()),
        Field::OrderId => order.order_id.clone(),
        Field::EntryDate => format_date(order.entry_date),
        Field::EstimatedExit => order.estimated_exit_date.map(format_date).unwrap_or_else(|| s!(PLACEHOLDER)),
        Field::Provider => or_placeholder!(order.provider.as_deref()),
        Field::Service => or_placeholder!(order.service_description.as_deref()),
    }
}

pub fn serialize_block(order: &ServiceOrder) -> String {
    let mut out = String::new();
    for (field, label) in BlockSchema::FIELDS {
        out.push_str(&join!(label, ": ", &render_value(order, field), "\n"));
    }
    out
}

/// Every block followed by a delimiter line.
pub fn serialize(orders: &[ServiceOrder]) -> String {
    let delim = BlockSchema::delimiter();
    let mut doc = String::new();
    for order in orders {
        doc.push_str(&serialize_block(order));
        doc.push_str(&delim);
        doc.push('\n');
    }
    doc
}

/* ---------------- Parse ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub blocks: usize,
    pub parsed: usize,
    pub skipped: Vec<Skip>,
}

/// Split on delimiter lines; trimmed, non-empty chunks only.
pub fn split_blocks(doc: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in doc.lines() {
        if BlockSchema::is_delimiter(line) {
            blocks.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    blocks.push(current.join("\n"));
    blocks.into_iter().map(|b| b.trim().to_string()).filter(|b| !b.is_empty()).collect()
}

fn split_value(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, v)| v.trim())
}

fn optional(value: &str) -> Option<String> {
    (!value.is_empty() && !value.eq_ignore_ascii_case(PLACEHOLDER)).then(|| value.to_string())
}

/// Decode one block. `item` names the block in errors.
pub fn parse_block(block: &str, item: &str) -> Result<ServiceOrder> {
    let lines: Vec<&str> = block.lines().collect();
    let want = BlockSchema::FIELDS.len();
    if lines.len() < want {
        return Err(PipelineError::parse(item, format!("expected {want} lines, found {}", lines.len())));
    }

    let mut values: Vec<&str> = Vec::with_capacity(want);
    for (idx, line) in lines.iter().take(want).enumerate() {
        let value = split_value(line).ok_or_else(|| {
            PipelineError::parse(item, format!("line {} ({}) has no ':'", idx + 1, BlockSchema::FIELDS[idx].1))
        })?;
        values.push(value);
    }

    // Description continues over the remaining lines.
    let mut service = s!(values[7]);
    for extra in &lines[want..] {
        service.push('\n');
        service.push_str(extra);
    }

    let entry_date = parse_block_date(values[4])
        .ok_or_else(|| PipelineError::parse(item, format!("bad entry date {:?}", values[4])))?;
    let estimated_exit_date = match optional(values[5]) {
        None => None,
        Some(v) => Some(
            parse_block_date(&v).ok_or_else(|| PipelineError::parse(item, format!("bad estimated exit {v:?}")))?,
        ),
    };

    Ok(ServiceOrder {
        requester: optional(values[0]),
        fleet_id: optional(values[1]),
        model: optional(values[2]),
        order_id: s!(values[3]),
        entry_date,
        estimated_exit_date,
        provider: optional(values[6]),
        service_description: optional(service.trim()),
    })
}

/// Decode a whole document under `policy`.
pub fn parse(doc: &str, policy: DecodePolicy) -> Result<(Vec<ServiceOrder>, ParseSummary)> {
    let blocks = split_blocks(doc);
    let mut summary = ParseSummary { blocks: blocks.len(), ..Default::default() };
    let mut orders = Vec::with_capacity(blocks.len());

    for (i, block) in blocks.iter().enumerate() {
        let item = format!("block #{}", i + 1);
        match parse_block(block, &item) {
            Ok(order) => orders.push(order),
            Err(err) => match policy {
                DecodePolicy::Abort => return Err(err),
                DecodePolicy::SkipAndCount => {
                    tracing::debug!(%err, "skipping malformed block");
                    summary.skipped.push(Skip::from(&err));
                }
            },
        }
    }
    summary.parsed = orders.len();

    if !summary.skipped.is_empty() {
        tracing::warn!(skipped = summary.skipped.len(), blocks = summary.blocks, "malformed text blocks skipped");
    }
    Ok((orders, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order(id: &str) -> ServiceOrder {
        ServiceOrder {
            order_id: s!(id),
            fleet_id: Some(s!("F-01")),
            model: Some(s!("Volvo FH 540")),
            requester: Some(s!("Ana")),
            provider: Some(s!("Oficina: Central")),
            entry_date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            estimated_exit_date: Some(NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()),
            service_description: Some(s!("Liberado Sr. Mauricio\nAguardando peça: bomba")),
        }
    }

    #[test]
    fn block_has_eight_labelled_lines_then_delimiter() {
        let doc = serialize(&[order("101")]);
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines[0], "Solicitante: Ana");
        assert_eq!(lines[3], "OS: 101");
        assert_eq!(lines[4], "Data Entrada: 10/04/2025");
        assert_eq!(lines[5], "Previsão Saída: 01/05/2025");
        assert_eq!(lines.last().copied(), Some("-".repeat(50).as_str()));
    }

    #[test]
    fn round_trip_keeps_every_field() {
        let mut sparse = order("202");
        sparse.fleet_id = None;
        sparse.provider = None;
        sparse.estimated_exit_date = None;
        sparse.service_description = None;
        let input = vec![order("101"), sparse];

        let (out, summary) = parse(&serialize(&input), DecodePolicy::Abort).unwrap();
        assert_eq!(out, input);
        assert_eq!(summary.blocks, 2);
        assert!(summary.skipped.is_empty());
    }

    #[test]
    fn placeholder_is_case_insensitive_on_read() {
        let block = "Solicitante: ---\nFrota: x\nModelo: y\nOS: 1\nData Entrada: 01/01/2025\nPrevisão Saída: ---\nPrestador: ---\nServiço: z";
        let o = parse_block(block, "b").unwrap();
        assert_eq!(o.requester, None);
        assert_eq!(o.estimated_exit_date, None);
        assert_eq!(o.provider, None);
    }

    #[test]
    fn literal_placeholder_value_reads_back_as_absent() {
        let mut o = order("303");
        o.fleet_id = Some(s!(PLACEHOLDER));
        let (out, _) = parse(&serialize(&[o]), DecodePolicy::Abort).unwrap();
        assert_eq!(out[0].fleet_id, None);
    }

    #[test]
    fn short_block_is_skipped_and_counted() {
        let doc = format!("{}{}\nOS: 9\nlixo\n{}\n", serialize(&[order("1")]), "Solicitante: x", BlockSchema::delimiter());
        let (out, summary) = parse(&doc, DecodePolicy::SkipAndCount).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].item, "block #2");
        assert!(summary.skipped[0].reason.contains("expected 8 lines"));
    }

    #[test]
    fn abort_policy_fails_on_first_broken_block() {
        let doc = format!("sem dois pontos\n{}\n", BlockSchema::delimiter());
        assert!(matches!(parse(&doc, DecodePolicy::Abort), Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn line_without_colon_is_malformed() {
        let block = "Solicitante: a\nFrota b\nModelo: y\nOS: 1\nData Entrada: 01/01/2025\nPrevisão Saída: ---\nPrestador: ---\nServiço: z";
        let err = parse_block(block, "b").unwrap_err();
        assert!(err.to_string().contains("line 2 (Frota)"));
    }

    #[test]
    fn trailing_and_repeated_delimiters_yield_no_empty_blocks() {
        let d = BlockSchema::delimiter();
        let doc = format!("{d}\n\n{}{d}\n{d}\n", serialize(&[order("1")]));
        assert_eq!(split_blocks(&doc).len(), 1);
    }
}

// src/runner.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::{
    aggregate,
    classify::{self, Buckets},
    config::options::{GroupKey, PipelineOptions},
    csv::Table,
    error::{PipelineError, Result},
    file::{latest_export, write_atomic},
    model::{ClassifiedOrder, ReleasedBy},
    normalize::{self, NormalizeSummary},
    progress::Progress,
    store::save_archive,
    textblock::{self, ParseSummary},
};

/// Summary of what one run produced.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub input: PathBuf,
    pub normalize: NormalizeSummary,
    pub parse: ParseSummary,
    pub by_release: BTreeMap<ReleasedBy, usize>,
    pub missing_estimate: usize,
    pub groups: usize,
    /// Orders left out of grouping for lack of a responsible party.
    pub ungrouped: usize,
    pub stale_removed: usize,
    pub files_written: Vec<PathBuf>,
}

impl RunSummary {
    /// Human tally, one line per fact; every skip names its block.
    pub fn tally(&self) -> Vec<String> {
        let mut lines = vec![
            format!("input: {}", self.input.display()),
            format!(
                "rows: {} read, {} kept, {} filtered out",
                self.normalize.rows_in,
                self.normalize.kept,
                self.normalize.dropped()
            ),
            format!(
                "blocks: {} total, {} parsed, {} skipped",
                self.parse.blocks,
                self.parse.parsed,
                self.parse.skipped.len()
            ),
        ];
        lines.extend(self.parse.skipped.iter().map(|s| format!("  skipped {s}")));
        for (who, n) in &self.by_release {
            lines.push(format!("released by {who}: {n}"));
        }
        lines.push(format!("missing estimate: {}", self.missing_estimate));
        lines.push(format!("groups: {} ({} orders without responsible party)", self.groups, self.ungrouped));
        if self.stale_removed > 0 {
            lines.push(format!("stale archives removed: {}", self.stale_removed));
        }
        lines.push(format!("files written: {}", self.files_written.len()));
        lines
    }
}

/// Normalize → serialize → parse → classify, all in memory.
/// Returns the intermediate document alongside the classified orders.
pub fn process_table(
    table: &Table,
    opts: &PipelineOptions,
) -> Result<(String, Vec<ClassifiedOrder>, NormalizeSummary, ParseSummary)> {
    let (orders, norm) = normalize::normalize(table, &opts.columns, &opts.filter)?;
    let doc = textblock::serialize(&orders);
    let (parsed, parse) = textblock::parse(&doc, opts.decode)?;
    Ok((doc, classify::classify_all(parsed), norm, parse))
}

/// Full run: read the export, write the text document, bucket archives and group archives.
/// Any stage error aborts the run; nothing is resumed.
pub fn run(opts: &PipelineOptions, mut progress: Option<&mut dyn Progress>) -> Result<RunSummary> {
    let input = if opts.input.is_dir() { latest_export(&opts.input)? } else { opts.input.clone() };
    tracing::info!(input = %input.display(), "pipeline run started");
    let mut log = |msg: &str| {
        if let Some(p) = progress.as_deref_mut() {
            p.log(msg);
        }
    };

    let group_key = match &opts.group {
        GroupKey::Manager(name) if name.trim().is_empty() => GroupKey::manager_from_path(&input)
            .ok_or_else(|| PipelineError::InvalidArgument(format!("no manager name for {}", input.display())))?,
        other => other.clone(),
    };

    log("reading export");
    let table = Table::load(&input, opts.delimiter, opts.header_row)?;
    let (orders, norm) = normalize::normalize(&table, &opts.columns, &opts.filter)?;

    // The text document is the durable artifact; decode what was actually written.
    log("writing text document");
    let doc_path = opts.text_document_path();
    write_atomic(&doc_path, textblock::serialize(&orders).as_bytes())?;
    let doc = fs::read_to_string(&doc_path).map_err(|e| PipelineError::io(&doc_path, e))?;
    let (parsed, parse) = textblock::parse(&doc, opts.decode)?;

    log("classifying");
    let classified = classify::classify_all(parsed);
    let buckets = Buckets::partition(&classified);
    let mut files_written = vec![doc_path];

    for who in ReleasedBy::ALL {
        let path = opts.release_dir().join(join!(who.tag(), ".json"));
        save_archive(&path, buckets.by_release.get(&who).map(Vec::as_slice).unwrap_or(&[]))?;
        files_written.push(path);
    }
    save_archive(&opts.missing_estimate_path(), &buckets.missing_estimate)?;
    files_written.push(opts.missing_estimate_path());

    log("writing group archives");
    let grouping = aggregate::group(classified, &group_key);
    let group_dir = opts.group_dir();
    let written = aggregate::persist(&grouping.groups, &group_dir)?;
    // Provider archives are a full recompute; manager dirs hold one file per source, so leave them.
    let stale_removed = match group_key {
        GroupKey::Provider => aggregate::prune_stale(&group_dir, &written)?,
        GroupKey::Manager(_) => 0,
    };
    files_written.extend(written);

    let summary = RunSummary {
        input,
        normalize: norm,
        parse,
        by_release: ReleasedBy::ALL.into_iter().map(|w| (w, buckets.count(w))).collect(),
        missing_estimate: buckets.missing_estimate.len(),
        groups: grouping.groups.len(),
        ungrouped: grouping.dropped,
        stale_removed,
        files_written,
    };
    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    tracing::info!(
        kept = summary.normalize.kept,
        groups = summary.groups,
        files = summary.files_written.len(),
        "pipeline run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::options::DecodePolicy;

    const EXPORT: &str = "Unidade;Status;Data Entrada;Previsão Saída;Data Saída;OS;Frota;Modelo;Solicitante;Prestador;Serviço\n\
        4;ABERTO;10/04/2025;01/05/2025;;101;F1;M1;Ana;Oficina A;\"Liberado pelo gestor\nTroca de óleo\"\n\
        5;ABERTO;11/04/2025;02/05/2025;;102;F2;M2;;Oficina B;sem marcador\n";

    #[test]
    fn in_memory_chain_keeps_every_filtered_order() {
        let table = Table::parse(EXPORT, None, 0).unwrap();
        let opts = PipelineOptions { decode: DecodePolicy::Abort, ..Default::default() };
        let (doc, classified, norm, parse) = process_table(&table, &opts).unwrap();

        assert_eq!(norm.kept, 2);
        assert_eq!(parse.parsed, 2);
        assert!(doc.contains("Serviço: Liberado pelo gestor\nTroca de óleo"));
        let who: Vec<ReleasedBy> = classified.iter().map(|c| c.released_by).collect();
        assert_eq!(who, vec![ReleasedBy::Gestor, ReleasedBy::Unclassified]);
        assert_eq!(classified[1].order.requester, None);
    }

    #[test]
    fn tally_names_each_skipped_block() {
        let mut summary = RunSummary::default();
        summary.parse.blocks = 2;
        summary.parse.parsed = 1;
        summary.parse.skipped.push(crate::error::Skip::new("block #2", "expected 8 lines, found 3"));
        let lines = summary.tally();
        assert!(lines.iter().any(|l| l == "  skipped block #2: expected 8 lines, found 3"));
        assert!(lines.contains(&s!("blocks: 2 total, 1 parsed, 1 skipped")));
    }
}

// src/report.rs
//! Group archive → paginated landscape PDF table.
//!
//! Rendering is a pure function of the archive records and a timestamp; the
//! PDF holds no state of its own and can be regenerated at any time.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb};

use crate::config::consts::PLACEHOLDER;
use crate::config::options::DecodePolicy;
use crate::core::sanitize::fold_key;
use crate::error::{PipelineError, Result, Skip};
use crate::file::{ensure_directory, list_files, sibling_output, write_atomic};
use crate::model::ArchiveRecord;
use crate::progress::Progress;
use crate::store::load_archive;

// A4 landscape, millimetres.
const PAGE_W: f32 = 297.0;
const PAGE_H: f32 = 210.0;
const MARGIN: f32 = 10.0;
const BAND_H: f32 = 14.0;
const HEADER_ROW_H: f32 = 8.0;
const ROW_H: f32 = 7.0;
const FOOTER_Y: f32 = 8.0;
const TABLE_TOP: f32 = PAGE_H - MARGIN - BAND_H - 4.0;
const ROWS_PER_PAGE: usize = ((TABLE_TOP - HEADER_ROW_H - 16.0) / ROW_H) as usize;
const FONT_SIZE: f32 = 8.0;
/// Rough Helvetica advance at 8pt, used to cut cell text to its column.
const MM_PER_CHAR: f32 = 1.55;

/// (header, width mm). Widths add up to the printable width.
const COLUMNS: [(&str, f32); 9] = [
    ("", 3.0),
    ("OS", 20.0),
    ("Frota", 22.0),
    ("Modelo", 35.0),
    ("Entrada", 22.0),
    ("Previsão", 22.0),
    ("Prestador", 45.0),
    ("Serviço", 80.0),
    ("Liberado por", 28.0),
];

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Cosmetic side marker from the description. Not part of the data contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowMarker {
    Stopped,
    Released,
    Plain,
}

impl RowMarker {
    pub fn of(record: &ArchiveRecord) -> Self {
        let text = fold_key(record.servico.as_deref().unwrap_or(""));
        if text.contains("parado") {
            RowMarker::Stopped
        } else if ["liberado", "finalizado", "concluido"].iter().any(|t| text.contains(t)) {
            RowMarker::Released
        } else {
            RowMarker::Plain
        }
    }

    fn color(self) -> Option<Color> {
        match self {
            RowMarker::Stopped => Some(rgb(0.80, 0.15, 0.15)),
            RowMarker::Released => Some(rgb(0.15, 0.60, 0.25)),
            RowMarker::Plain => None,
        }
    }
}

fn cells(r: &ArchiveRecord) -> [String; 8] {
    let released = r.liberado_por.map(|x| s!(x.label())).unwrap_or_else(|| s!(PLACEHOLDER));
    [
        s!(ArchiveRecord::show(&r.os)),
        s!(ArchiveRecord::show(&r.frota)),
        s!(ArchiveRecord::show(&r.modelo)),
        s!(ArchiveRecord::show(&r.data_entrada)),
        s!(ArchiveRecord::show(&r.previsao_saida)),
        s!(ArchiveRecord::show(&r.prestador)),
        ArchiveRecord::show(&r.servico).replace('\n', " / "),
        released,
    ]
}

/// Cut `text` so it fits `width_mm`, marking the cut with "...".
fn fit(text: &str, width_mm: f32) -> String {
    let max = ((width_mm - 1.5) / MM_PER_CHAR).max(1.0) as usize;
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    join!(&text.chars().take(keep).collect::<String>(), "...")
}

pub fn page_count(rows: usize) -> usize {
    rows.div_ceil(ROWS_PER_PAGE).max(1)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn fill_rect(layer: &PdfLayerReference, color: Color, x: f32, y: f32, w: f32, h: f32) {
    layer.set_fill_color(color);
    layer.add_rect(Rect::new(Mm(x), Mm(y), Mm(x + w), Mm(y + h)));
}

fn draw_band(layer: &PdfLayerReference, fonts: &Fonts, title: &str, subtitle: &str) {
    let y = PAGE_H - MARGIN - BAND_H;
    fill_rect(layer, rgb(0.12, 0.23, 0.40), MARGIN, y, PAGE_W - 2.0 * MARGIN, BAND_H);
    layer.set_fill_color(rgb(1.0, 1.0, 1.0));
    layer.use_text(title, 13.0, Mm(MARGIN + 3.0), Mm(y + 7.5), &fonts.bold);
    layer.use_text(subtitle, 9.0, Mm(MARGIN + 3.0), Mm(y + 2.5), &fonts.regular);
}

fn draw_header_row(layer: &PdfLayerReference, fonts: &Fonts) {
    let y = TABLE_TOP - HEADER_ROW_H;
    fill_rect(layer, rgb(0.80, 0.84, 0.90), MARGIN, y, PAGE_W - 2.0 * MARGIN, HEADER_ROW_H);
    layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    let mut x = MARGIN;
    for (name, width) in COLUMNS {
        if !name.is_empty() {
            layer.use_text(name, FONT_SIZE, Mm(x + 1.0), Mm(y + 2.6), &fonts.bold);
        }
        x += width;
    }
}

fn draw_row(layer: &PdfLayerReference, fonts: &Fonts, slot: usize, record: &ArchiveRecord) {
    let y = TABLE_TOP - HEADER_ROW_H - (slot as f32 + 1.0) * ROW_H;
    if slot % 2 == 1 {
        fill_rect(layer, rgb(0.94, 0.94, 0.94), MARGIN, y, PAGE_W - 2.0 * MARGIN, ROW_H);
    }
    if let Some(color) = RowMarker::of(record).color() {
        fill_rect(layer, color, MARGIN, y + 0.8, COLUMNS[0].1 - 1.0, ROW_H - 1.6);
    }

    layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    let mut x = MARGIN + COLUMNS[0].1;
    for (text, (_, width)) in cells(record).iter().zip(COLUMNS.iter().skip(1)) {
        layer.use_text(fit(text, *width), FONT_SIZE, Mm(x + 1.0), Mm(y + 2.3), &fonts.regular);
        x += width;
    }
}

fn draw_footer(layer: &PdfLayerReference, fonts: &Fonts, generated: &str, count: usize, page: usize, pages: usize) {
    layer.set_fill_color(rgb(0.35, 0.35, 0.35));
    let left = format!("Gerado em {generated} - {count} registro(s)");
    layer.use_text(left, 7.5, Mm(MARGIN), Mm(FOOTER_Y), &fonts.regular);
    let right = format!("Página {page} de {pages}");
    layer.use_text(right, 7.5, Mm(PAGE_W - MARGIN - 25.0), Mm(FOOTER_Y), &fonts.regular);
}

/// Render one group. Returns the PDF bytes.
pub fn render_pdf(title: &str, subtitle: &str, records: &[ArchiveRecord], generated_at: NaiveDateTime) -> Result<Vec<u8>> {
    let pdf_err = |what: &str, e: &dyn std::fmt::Display| PipelineError::Pdf(format!("{what}: {e}"));

    let (doc, first_page, first_layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| pdf_err("font", &e))?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(|e| pdf_err("font", &e))?,
    };

    let generated = generated_at.format("%d/%m/%Y %H:%M").to_string();
    let pages = page_count(records.len());
    let mut chunks = records.chunks(ROWS_PER_PAGE);

    for page in 1..=pages {
        let layer = if page == 1 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        draw_band(&layer, &fonts, title, subtitle);
        draw_header_row(&layer, &fonts);
        for (slot, record) in chunks.next().unwrap_or(&[]).iter().enumerate() {
            draw_row(&layer, &fonts, slot, record);
        }
        draw_footer(&layer, &fonts, &generated, records.len(), page, pages);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(|e| pdf_err("save", &e))?;
    buf.into_inner().map_err(|e| pdf_err("buffer", &e))
}

fn subtitle_for(path: &Path, records: &[ArchiveRecord]) -> String {
    records
        .iter()
        .find_map(|r| r.prestador.as_deref().filter(|p| !p.trim().is_empty() && *p != PLACEHOLDER))
        .map(str::to_string)
        .unwrap_or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_uppercase()).unwrap_or_default())
}

/// What a single-mode render produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub records: usize,
    /// Elements left out of the PDF, each with its decode reason.
    pub skipped: Vec<Skip>,
}

fn no_decodable_records(item: &str, skipped: &[Skip]) -> Skip {
    let reasons: Vec<String> = skipped.iter().map(Skip::to_string).collect();
    Skip::new(item, format!("no decodable record ({})", reasons.join("; ")))
}

/// Single-archive mode: any load or render problem is fatal, and so is an
/// archive whose elements all fail to decode.
pub fn render_archive(input: &Path, output: &Path, title: &str, policy: DecodePolicy) -> Result<ArchiveReport> {
    let archive = load_archive(input, policy)?;
    if archive.records.is_empty() && !archive.skipped.is_empty() {
        let skip = no_decodable_records(&input.display().to_string(), &archive.skipped);
        return Err(PipelineError::parse(skip.item, skip.reason));
    }
    let subtitle = subtitle_for(input, &archive.records);
    let bytes = render_pdf(title, &subtitle, &archive.records, Local::now().naive_local())?;
    write_atomic(output, &bytes)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        records = archive.records.len(),
        skipped = archive.skipped.len(),
        "report written"
    );
    Ok(ArchiveReport { records: archive.records.len(), skipped: archive.skipped })
}

#[derive(Clone, Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    pub written: Vec<PathBuf>,
    /// Archives that hold no elements at all (`[]`).
    pub skipped: Vec<Skip>,
    /// Unreadable archives, archives with nothing decodable, render or write failures.
    pub failed: Vec<Skip>,
    /// Elements left out of otherwise rendered reports.
    pub record_skips: Vec<Skip>,
}

impl BatchSummary {
    pub fn success_count(&self) -> usize {
        self.written.len()
    }

    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn error_count(&self) -> usize {
        self.failed.len()
    }
}

/// Batch mode: one PDF per `*.json` in `in_dir`, written to `out_dir/<stem>.pdf`.
/// Only an unreadable `in_dir` is fatal; each archive succeeds, skips or fails on its own.
pub fn render_dir(
    in_dir: &Path,
    out_dir: &Path,
    title: &str,
    policy: DecodePolicy,
    progress: &mut dyn Progress,
) -> Result<BatchSummary> {
    let archives = list_files(in_dir, &["json"])?;
    ensure_directory(out_dir)?;
    let generated_at = Local::now().naive_local();
    let mut summary = BatchSummary::default();
    progress.begin(archives.len());

    for path in archives {
        summary.processed += 1;
        let item = path.display().to_string();
        let archive = match load_archive(&path, policy) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(%e, "archive not readable");
                summary.failed.push(Skip::from(&e));
                continue;
            }
        };
        if archive.records.is_empty() {
            if archive.skipped.is_empty() {
                summary.skipped.push(Skip::new(item, "empty archive"));
            } else {
                tracing::warn!(archive = %item, skipped = archive.skipped.len(), "no decodable record");
                summary.failed.push(no_decodable_records(&item, &archive.skipped));
            }
            continue;
        }

        let target = sibling_output(&path, out_dir, "pdf");
        let subtitle = subtitle_for(&path, &archive.records);
        let result = render_pdf(title, &subtitle, &archive.records, generated_at).and_then(|bytes| write_atomic(&target, &bytes));
        match result {
            Ok(()) => {
                progress.item_done(&target);
                summary.written.push(target);
                summary.record_skips.extend(archive.skipped);
            }
            Err(e) => {
                tracing::warn!(%e, archive = %item, "report failed");
                summary.failed.push(Skip::new(item, e.to_string()));
            }
        }
    }

    progress.finish();
    tracing::info!(
        processed = summary.processed,
        succeeded = summary.success_count(),
        skipped = summary.skip_count(),
        failed = summary.error_count(),
        records_skipped = summary.record_skips.len(),
        "batch report finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ReleasedBy;

    fn record(os: &str, servico: &str) -> ArchiveRecord {
        ArchiveRecord {
            os: Some(s!(os)),
            frota: Some(s!("F-1")),
            data_entrada: Some(s!("01/04/2025")),
            prestador: Some(s!("OFICINA A")),
            servico: Some(s!(servico)),
            liberado_por: Some(ReleasedBy::Unclassified),
            ..Default::default()
        }
    }

    fn at() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn column_widths_fill_the_printable_width() {
        let total: f32 = COLUMNS.iter().map(|(_, w)| w).sum();
        assert!((total - (PAGE_W - 2.0 * MARGIN)).abs() < 0.01);
    }

    #[test]
    fn renders_a_pdf_even_for_many_pages() {
        let records: Vec<_> = (0..ROWS_PER_PAGE * 2 + 1).map(|i| record(&i.to_string(), "troca de pneu")).collect();
        assert_eq!(page_count(records.len()), 3);
        let bytes = render_pdf("Ordens", "OFICINA A", &records, at()).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn empty_group_still_gets_one_page() {
        assert_eq!(page_count(0), 1);
        let bytes = render_pdf("Ordens", "-", &[], at()).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn marker_reads_stopped_before_released() {
        assert_eq!(RowMarker::of(&record("1", "Veículo PARADO, liberado amanhã")), RowMarker::Stopped);
        assert_eq!(RowMarker::of(&record("1", "Serviço concluído")), RowMarker::Released);
        assert_eq!(RowMarker::of(&record("1", "orçamento")), RowMarker::Plain);
    }

    #[test]
    fn long_cells_are_cut_with_ellipsis() {
        let cut = fit(&"x".repeat(200), 20.0);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() < 20);
        assert_eq!(fit("curto", 20.0), "curto");
    }

    #[test]
    fn missing_keys_render_as_placeholder() {
        let c = cells(&ArchiveRecord::default());
        assert!(c.iter().all(|v| v == crate::config::consts::PLACEHOLDER));
    }
}

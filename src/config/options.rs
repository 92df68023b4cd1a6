// src/config/options.rs
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::consts::*;
use crate::csv::Delim;

/// Everything one pipeline run needs. Built from `Default` and overridden by the CLI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Export file, or a directory in which the newest export is picked.
    pub input: PathBuf,
    /// Rows above the header row (banner lines some exports carry).
    pub header_row: usize,
    /// `None` → sniff from the header line.
    pub delimiter: Option<Delim>,
    pub columns: ColumnMap,
    pub filter: FilterSpec,
    pub group: GroupKey,
    pub out_dir: PathBuf,
    pub decode: DecodePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_DIR),
            header_row: DEFAULT_HEADER_ROW,
            delimiter: None,
            columns: ColumnMap::default(),
            filter: FilterSpec::default(),
            group: GroupKey::Provider,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            decode: DecodePolicy::SkipAndCount,
        }
    }
}

impl PipelineOptions {
    pub fn text_document_path(&self) -> PathBuf {
        self.out_dir.join(TEXT_DOCUMENT_FILE)
    }

    /// Directory that receives one archive per group.
    pub fn group_dir(&self) -> PathBuf {
        match self.group {
            GroupKey::Provider => self.out_dir.join(PROVIDER_SUBDIR),
            GroupKey::Manager(_) => self.out_dir.join(MANAGER_SUBDIR),
        }
    }

    pub fn release_dir(&self) -> PathBuf {
        self.out_dir.join(RELEASE_SUBDIR)
    }

    pub fn missing_estimate_path(&self) -> PathBuf {
        self.out_dir.join(MISSING_ESTIMATE_FILE)
    }
}

/// Header names of the columns the normalizer reads.
/// Matching ignores case, accents and surrounding whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMap {
    pub unit: String,
    pub status: String,
    pub entry_date: String,
    pub estimated_exit: String,
    pub actual_exit: String,
    pub order_id: String,
    pub fleet_id: String,
    pub model: String,
    pub requester: String,
    pub provider: String,
    pub service: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            unit: s!("Unidade"),
            status: s!("Status"),
            entry_date: s!("Data Entrada"),
            estimated_exit: s!("Previsão Saída"),
            actual_exit: s!("Data Saída"),
            order_id: s!("OS"),
            fleet_id: s!("Frota"),
            model: s!("Modelo"),
            requester: s!("Solicitante"),
            provider: s!("Prestador"),
            service: s!("Serviço"),
        }
    }
}

impl ColumnMap {
    /// (field name, header) pairs in a fixed order, for schema checks.
    pub fn required(&self) -> [(&'static str, &str); 11] {
        [
            ("unit", self.unit.as_str()),
            ("status", self.status.as_str()),
            ("entry_date", self.entry_date.as_str()),
            ("estimated_exit", self.estimated_exit.as_str()),
            ("actual_exit", self.actual_exit.as_str()),
            ("order_id", self.order_id.as_str()),
            ("fleet_id", self.fleet_id.as_str()),
            ("model", self.model.as_str()),
            ("requester", self.requester.as_str()),
            ("provider", self.provider.as_str()),
            ("service", self.service.as_str()),
        ]
    }
}

/// Inclusive date range on the entry date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    pub units: Vec<u32>,
    /// Keep only rows with a parseable estimated exit date.
    pub require_estimate: bool,
    /// Windowed variant: requester must be present and entry date inside the window.
    pub window: Option<DateWindow>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::backlog()
    }
}

impl FilterSpec {
    /// Open orders still waiting on their predicted close.
    pub fn backlog() -> Self {
        Self { units: ALLOWED_UNITS.to_vec(), require_estimate: true, window: None }
    }

    /// Open orders that entered inside `window`, with or without an estimate.
    pub fn windowed(window: DateWindow) -> Self {
        Self { units: ALLOWED_UNITS.to_vec(), require_estimate: false, window: Some(window) }
    }
}

/// Which responsible party an archive is keyed by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupKey {
    /// The order's own provider field.
    Provider,
    /// Every order of a per-manager source file belongs to this manager.
    Manager(String),
}

impl GroupKey {
    /// Manager name taken from the source file stem, e.g. `exports/ana_paula.csv` → `ana_paula`.
    pub fn manager_from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_string_lossy();
        let stem = stem.trim();
        (!stem.is_empty()).then(|| GroupKey::Manager(stem.to_string()))
    }
}

/// What a decode site does with a structurally broken item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Drop the item, record it as a skip, keep going.
    #[default]
    SkipAndCount,
    /// Fail the whole stage on the first broken item.
    Abort,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Archive file (single mode) or directory of archives (batch mode).
    pub input: PathBuf,
    /// PDF file (single mode) or output directory (batch mode).
    pub output: PathBuf,
    pub title: String,
    /// Applied to every archive element.
    pub decode: DecodePolicy,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_REPORT_INPUT),
            output: PathBuf::from(DEFAULT_REPORT_OUTPUT),
            title: s!(DEFAULT_REPORT_TITLE),
            decode: DecodePolicy::SkipAndCount,
        }
    }
}

impl ReportOptions {
    pub fn is_batch(&self) -> bool {
        self.input.is_dir()
    }
}

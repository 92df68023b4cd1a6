// src/cli.rs
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use crate::config::consts::{DEFAULT_LOG_PATH, DEFAULT_OUT_DIR, REPORT_SUBDIR};
use crate::config::options::{DateWindow, DecodePolicy, FilterSpec, GroupKey, PipelineOptions, ReportOptions};
use crate::core::dates::parse_day_first;
use crate::csv::Delim;
use crate::error::{PipelineError, Result};
use crate::progress::{ConsoleProgress, Progress};
use crate::{log, report, runner};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GroupArg {
    Provider,
    Manager,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DelimArg {
    Csv,
    Tsv,
    Semicolon,
}

impl From<DelimArg> for Delim {
    fn from(d: DelimArg) -> Self {
        match d {
            DelimArg::Csv => Delim::Csv,
            DelimArg::Tsv => Delim::Tsv,
            DelimArg::Semicolon => Delim::Semicolon,
        }
    }
}

/// Shared logging flags.
#[derive(clap::Args, Debug)]
pub struct LogArgs {
    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Append logs to this file instead of stderr (bare flag: .store/debug.log)
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_LOG_PATH)]
    pub log_file: Option<PathBuf>,
}

impl LogArgs {
    pub fn init(&self) -> Result<()> {
        log::init(self.log_file.as_deref(), self.verbose)
    }
}

#[derive(Parser, Debug)]
#[command(name = "os_pipeline", version)]
#[command(about = "Filter an open service-order export, classify it and write per-group archives")]
pub struct PipelineArgs {
    /// Export file, or a directory (newest export inside is used)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = DEFAULT_OUT_DIR)]
    pub out: PathBuf,

    /// Group archives by provider or by manager
    #[arg(short, long, value_enum, default_value_t = GroupArg::Provider)]
    pub group: GroupArg,

    /// Manager name for --group manager (default: input file stem)
    #[arg(long)]
    pub manager: Option<String>,

    /// Window start, DD/MM/YYYY (enables the windowed filter)
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Window end, DD/MM/YYYY, inclusive
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Non-blank rows above the header row
    #[arg(long, default_value_t = 0)]
    pub header_row: usize,

    /// Field separator (default: detect)
    #[arg(long, value_enum)]
    pub delimiter: Option<DelimArg>,

    /// Abort on the first malformed text block instead of skipping it
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

fn date_arg(flag: &str, raw: &str) -> Result<NaiveDate> {
    parse_day_first(raw).ok_or_else(|| PipelineError::InvalidArgument(format!("{flag}: not a date: {raw}")))
}

impl PipelineArgs {
    pub fn to_options(&self) -> Result<PipelineOptions> {
        let mut opts = PipelineOptions::default();
        if let Some(input) = &self.input {
            opts.input = input.clone();
        }
        opts.out_dir = self.out.clone();
        opts.header_row = self.header_row;
        opts.delimiter = self.delimiter.map(Delim::from);
        opts.decode = if self.strict { DecodePolicy::Abort } else { DecodePolicy::SkipAndCount };
        opts.group = match self.group {
            GroupArg::Provider => GroupKey::Provider,
            // Blank name → resolved from the input file stem by the runner.
            GroupArg::Manager => GroupKey::Manager(self.manager.clone().unwrap_or_default()),
        };
        if let (Some(from), Some(to)) = (&self.from, &self.to) {
            let (start, end) = (date_arg("--from", from)?, date_arg("--to", to)?);
            let window = DateWindow::new(start, end)
                .ok_or_else(|| PipelineError::InvalidArgument(format!("--from {from} is after --to {to}")))?;
            opts.filter = FilterSpec::windowed(window);
        }
        Ok(opts)
    }
}

pub fn run_pipeline(args: &PipelineArgs) -> Result<()> {
    args.log.init()?;
    let opts = args.to_options()?;
    let mut progress = ConsoleProgress::default();
    let summary = runner::run(&opts, Some(&mut progress as &mut dyn Progress))?;
    for line in summary.tally() {
        println!("{line}");
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "os_report", version)]
#[command(about = "Render group archives as PDF tables")]
pub struct ReportArgs {
    /// Archive file, or a directory of archives (batch mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// PDF file, or the output directory in batch mode
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report title
    #[arg(long)]
    pub title: Option<String>,

    /// Fail an archive on its first undecodable element instead of skipping it
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub log: LogArgs,
}

impl ReportArgs {
    pub fn to_options(&self) -> ReportOptions {
        let mut opts = ReportOptions::default();
        if let Some(input) = &self.input {
            opts.input = input.clone();
        }
        if let Some(title) = &self.title {
            opts.title = title.clone();
        }
        if self.strict {
            opts.decode = DecodePolicy::Abort;
        }
        match &self.output {
            Some(output) => opts.output = output.clone(),
            // Batch default: a sibling `relatorios/` next to the archive dir.
            None if opts.is_batch() => {
                opts.output = opts.input.parent().unwrap_or(&opts.input).join(REPORT_SUBDIR);
            }
            None => {}
        }
        opts
    }
}

/// Single mode fails on an unreadable archive. Batch mode only fails when the
/// directory itself cannot be listed; per-archive problems land in the tally.
pub fn run_report(args: &ReportArgs) -> Result<()> {
    args.log.init()?;
    let opts = args.to_options();

    if !opts.is_batch() {
        let done = report::render_archive(&opts.input, &opts.output, &opts.title, opts.decode)?;
        for skip in &done.skipped {
            println!("skipped record {skip}");
        }
        println!(
            "wrote {} ({} records, {} skipped)",
            opts.output.display(),
            done.records,
            done.skipped.len()
        );
        return Ok(());
    }

    let mut progress = ConsoleProgress::default();
    let summary = report::render_dir(&opts.input, &opts.output, &opts.title, opts.decode, &mut progress)?;
    for skip in &summary.skipped {
        println!("skipped {skip}");
    }
    for fail in &summary.failed {
        println!("failed  {fail}");
    }
    for skip in &summary.record_skips {
        println!("skipped record {skip}");
    }
    println!(
        "processed: {}, succeeded: {}, skipped: {}, failed: {}, records skipped: {}",
        summary.processed,
        summary.success_count(),
        summary.skip_count(),
        summary.error_count(),
        summary.record_skips.len()
    );
    Ok(())
}

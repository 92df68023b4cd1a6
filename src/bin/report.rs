// src/bin/report.rs
use clap::Parser;
use os_pipeline::cli::{self, ReportArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = ReportArgs::parse();
    if let Err(e) = cli::run_report(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

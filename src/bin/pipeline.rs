// src/bin/pipeline.rs
use clap::Parser;
use os_pipeline::cli::{self, PipelineArgs};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = PipelineArgs::parse();
    if let Err(e) = cli::run_pipeline(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

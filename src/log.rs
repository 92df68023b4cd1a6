// src/log.rs
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt::time::uptime};

use crate::config::consts::LOG_ENV;
use crate::error::{PipelineError, Result};
use crate::file::ensure_directory;

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "os_pipeline=debug" } else { "os_pipeline=info" }))
}

/// Install the global subscriber: stderr, or appended to `file` when given.
/// A second call is a no-op.
pub fn init(file: Option<&Path>, verbose: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_timer(uptime())
        .with_target(false);

    match file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_directory(parent)?;
            }
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| PipelineError::io(path, e))?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(f)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

// src/lib.rs

#[macro_use]
pub mod macros;

pub mod config;
pub mod core;
pub mod error;

pub mod aggregate;
pub mod classify;
pub mod csv;
pub mod file;
pub mod log;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod runner;
pub mod store;
pub mod textblock;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{PipelineError, Result};

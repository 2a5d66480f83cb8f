pub mod comparison;
pub mod config;
pub mod run;
pub mod synth;

use marchenko_core::MarchenkoError;
use marchenko_io::{ReadError, WriteError};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: ReadError,
    },
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),
    #[error(transparent)]
    Engine(#[from] MarchenkoError),
}

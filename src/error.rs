//! Application errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot open log file {path}: {source}")]
    Logger {
        path: PathBuf,
        source: std::io::Error,
    },
}

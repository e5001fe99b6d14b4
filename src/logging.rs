//! Logger setup.
//!
//! The terminal is in raw mode while the demo runs, so records only go to
//! stderr when `RUST_LOG` asks for them. With a log file they default to
//! `info`.

use std::fs::File;
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::error::DemoError;

pub fn init(log_file: Option<&Path>) -> Result<(), DemoError> {
    let mut builder = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| DemoError::Logger {
                path: path.to_path_buf(),
                source,
            })?;
            let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
            builder.target(Target::Pipe(Box::new(file)));
            builder
        }
        None => Builder::from_env(Env::default().default_filter_or("off")),
    };
    // A second init (as in tests) keeps the first logger
    let _ = builder.try_init();
    Ok(())
}

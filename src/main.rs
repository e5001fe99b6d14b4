use clap::Parser;

use orbit::cli::Args;
use orbit::error::DemoError;
use orbit::{app, logging};

/// Main function
fn main() -> Result<(), DemoError> {
    let config = Args::parse().into_config()?;
    logging::init(config.log_file.as_deref())?;

    match &config.export {
        Some(export) => {
            let svg = app::export_svg(&config, export)?;
            println!("wrote {} ({} bytes)", export.path.display(), svg.len());
            Ok(())
        }
        None => app::run(&config),
    }
}

//! Command line interface for pipenv-pex.
//!
//! Parses arguments, runs the bundler and turns its result into an exit code
//! with a colored message.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::bundler::{BundleOptions, Bundler};
use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let runtime_config = RuntimeConfig::from(&args);

    if let Err(reason) = args.validate() {
        runtime_config.error(&CliError::InvalidArguments { reason }.to_string())?;
        return Ok(2);
    }

    let strategy = args.strategy();
    let options = BundleOptions {
        start_dir: std::env::current_dir()?,
        pipfile: args.pipfile,
        max_depth: args.max_depth,
        exclude: args.exclude,
        strategy,
        pex_bin: args.pex_bin,
        pex_args: args.pex_args,
    };

    match Bundler::new(options).bundle(&runtime_config).await {
        Ok(_) => Ok(0),
        Err(e) => {
            log::debug!("Bundling failed: {:?}", e);
            runtime_config.error(&e.to_string())?;
            if let Some(hint) = e.recovery_suggestion() {
                runtime_config.error(hint)?;
            }
            Ok(1)
        }
    }
}

//! Bundle orchestration.
//!
//! The [`Bundler`] turns a Pipenv project into a `.pex` file:
//!
//! 1. Checks that pex was given an entry point
//! 2. Resolves the output path and clears any previous archive
//! 3. Reads the locked dependencies
//! 4. Hides excluded files for the duration of the pex run
//!
//! # Example
//!
//! ```no_run
//! use pipenv_pex::bundler::{BundleOptions, Bundler};
//! use pipenv_pex::cli::RuntimeConfig;
//!
//! # async fn example() -> pipenv_pex::Result<()> {
//! let options = BundleOptions {
//!     pex_args: vec!["--entry-point".into(), "app.main".into()],
//!     ..BundleOptions::new(std::env::current_dir()?)
//! };
//! let output = Bundler::new(options)
//!     .bundle(&RuntimeConfig::new(false, false))
//!     .await?;
//! println!("Built {}", output.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod exclude;
mod orchestrator;
pub mod utils;

pub use error::{Error, ErrorExt, Result};
pub use orchestrator::{BundleOptions, Bundler};

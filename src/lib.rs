//! Build self-contained `.pex` executables from Pipenv projects.
//!
//! This library provides the pieces behind the `pipenv-pex` command:
//! - Pipfile discovery and `Pipfile.lock` dependency extraction ([`project`])
//! - Scoped exclusion of files pex must not bundle ([`bundler::exclude`])
//! - Passthrough argument inspection and pex execution ([`pex`])
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod pex;
pub mod project;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};

//! Top-level error types.
//!
//! [`BundlerError`] is what the CLI reports. Packaging and filesystem
//! failures arrive wrapped from [`crate::bundler::Error`].

use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all bundler operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("{0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipfile.lock parsing errors
    #[error("Invalid Pipfile.lock: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipfile parsing errors
    #[error("Invalid Pipfile: {0}")]
    Toml(#[from] toml::de::Error),

    /// Exclusion or pex errors
    #[error("{0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments or project layout
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("No {argument} given!")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Hint printed under the error message, if there is a useful one.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Cli(CliError::MissingArgument { .. }) => {
                Some("Pass one of -m, -e or --entry-point, e.g. `pipenv-pex -e app.main`")
            }
            Self::Json(_) => Some("Regenerate the lockfile with `pipenv lock`"),
            _ => None,
        }
    }
}

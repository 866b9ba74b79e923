//! Error types for packaging and filesystem operations.
//!
//! Filesystem failures carry the operation and the path that failed so a
//! half-finished stash or copy can be diagnosed from the message alone.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for packaging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while excluding sources and running pex.
#[derive(Error, Debug)]
pub enum Error {
    /// Raw IO error without path context
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Filesystem operation failed on a specific path
    #[error("Failed {action} ({}): {source}", .path.display())]
    Fs {
        /// What was being done, e.g. "stashing excluded entry"
        action: &'static str,
        /// Path the operation failed on
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// External command could not be spawned or awaited
    #[error("Failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command name
        command: String,
        /// Underlying IO error
        error: std::io::Error,
    },

    /// External command ran but exited unsuccessfully
    #[error("`{command}` exited with {status}")]
    CommandExited {
        /// Command name
        command: String,
        /// Exit status as reported by the OS
        status: std::process::ExitStatus,
    },

    /// The run was interrupted (Ctrl-C) while pex was running
    #[error("Interrupted while running {0}")]
    Interrupted(String),

    /// Invalid exclusion glob
    #[error("Invalid exclusion pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Directory traversal error
    #[error("Directory walk failed: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Path outside of the tree being copied
    #[error("Path prefix error: {0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Catch-all with a descriptive message
    #[error("{0}")]
    GenericError(String),
}

/// Attach filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Wraps an IO error with the action being performed and the path involved.
    fn fs_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Fs {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Return early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_context_keeps_action_and_path() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = res.fs_context("restoring stashed entry", "/tmp/x").unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("restoring stashed entry"));
        assert!(msg.contains("/tmp/x"));
        assert!(msg.contains("gone"));
    }
}

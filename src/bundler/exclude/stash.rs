//! Move-based exclusion: excluded entries are renamed into a stash and back.
//!
//! The stash lives in the project's parent directory. A rename only moves a
//! directory entry when source and destination share a filesystem; across
//! filesystems it degrades to a full copy, and `rename(2)` refuses outright.

use super::ExclusionMatcher;
use crate::bundler::error::{Error, ErrorExt, Result};
use path_absolutize::Absolutize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Top-level project entries moved out of the way.
///
/// Entries are moved back by [`StashedEntries::restore`] or, failing that,
/// when the value is dropped. Until then every excluded entry is either in
/// the project or in the stash.
#[derive(Debug)]
pub struct StashedEntries {
    origin: PathBuf,
    stash: Option<TempDir>,
    moved: Vec<OsString>,
}

impl StashedEntries {
    /// Moves the immediate children of `origin` matching `matcher` into a
    /// fresh stash directory beside `origin`.
    ///
    /// If a move fails midway, the entries already moved are put back
    /// before the error is returned.
    pub async fn stash(origin: &Path, matcher: &ExclusionMatcher) -> Result<Self> {
        // `.` or `a/..` have a lexical parent inside the directory itself
        let origin = origin
            .absolutize()
            .fs_context("resolving sources directory", origin)?;
        let origin: &Path = &origin;
        if !origin.is_dir() {
            return Err(Error::GenericError(format!(
                "Sources directory does not exist or is not a directory: {}",
                origin.display()
            )));
        }
        let parent = origin.parent().ok_or_else(|| {
            Error::GenericError(format!(
                "Cannot stash files of {}: it has no parent directory",
                origin.display()
            ))
        })?;

        let stash = tempfile::Builder::new()
            .prefix(".pipenv-pex-stash-")
            .tempdir_in(parent)
            .fs_context("creating stash directory", parent)?;

        let mut stashed = Self {
            origin: origin.to_path_buf(),
            stash: Some(stash),
            moved: Vec::new(),
        };

        let mut entries = tokio::fs::read_dir(origin)
            .await
            .fs_context("listing sources directory", origin)?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .fs_context("listing sources directory", origin)?
        {
            if matcher.is_match(&entry.file_name()) {
                names.push(entry.file_name());
            }
        }

        // On `?` below, `stashed` is dropped and puts back what was moved
        let stash_dir = stashed.stash_dir()?.to_path_buf();
        for name in names {
            let from = origin.join(&name);
            log::debug!("Stashing {}", from.display());
            tokio::fs::rename(&from, stash_dir.join(&name))
                .await
                .fs_context("stashing excluded entry", &from)?;
            stashed.moved.push(name);
        }

        Ok(stashed)
    }

    /// The project directory, now without the stashed entries.
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Names of the entries currently in the stash.
    pub fn stashed_names(&self) -> &[OsString] {
        &self.moved
    }

    /// Moves every stashed entry back and removes the stash directory.
    pub async fn restore(mut self) -> Result<()> {
        self.restore_entries()?;
        if let Some(stash) = self.stash.take() {
            let path = stash.path().to_path_buf();
            stash.close().fs_context("removing stash directory", &path)?;
        }
        Ok(())
    }

    fn stash_dir(&self) -> Result<&Path> {
        self.stash
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| Error::GenericError("Stash directory already released".to_string()))
    }

    /// Renames stashed entries back into the origin.
    ///
    /// Keeps going past failures so as many entries as possible return home,
    /// then reports the first error. Entries that could not be moved stay
    /// recorded in `moved`.
    fn restore_entries(&mut self) -> Result<()> {
        let stash_dir = self.stash_dir()?.to_path_buf();
        let mut first_error = None;
        let mut remaining = Vec::new();

        for name in std::mem::take(&mut self.moved) {
            let from = stash_dir.join(&name);
            let to = self.origin.join(&name);
            log::debug!("Restoring {}", to.display());
            if let Err(e) = std::fs::rename(&from, &to) {
                log::error!("Failed to restore {}: {}", to.display(), e);
                first_error.get_or_insert(Error::Fs {
                    action: "restoring stashed entry",
                    path: to,
                    source: e,
                });
                remaining.push(name);
            }
        }

        self.moved = remaining;
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for StashedEntries {
    fn drop(&mut self) {
        if self.stash.is_none() {
            return;
        }
        if let Err(e) = self.restore_entries() {
            log::error!("Stashed files were not fully restored: {}", e);
        }
        if !self.moved.is_empty() {
            // Never delete a stash that still holds project files
            if let Some(stash) = self.stash.take() {
                let kept = stash.keep();
                log::error!(
                    "Unrestored entries left in {}; move them back to {} manually",
                    kept.display(),
                    self.origin.display()
                );
            }
        }
    }
}

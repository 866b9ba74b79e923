//! File system utilities for bundling.
//!
//! Provides filtered tree copies with symlink preservation and idempotent
//! removal helpers.

use crate::bail;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::exclude::ExclusionMatcher;
use std::{
    io::{self},
    path::Path,
};
use tokio::fs;

/// Makes a symbolic link to a directory.
#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a directory.
#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

/// Makes a symbolic link to a file.
#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Recursively copies a directory, skipping every entry whose file name
/// matches `matcher` at any depth.
///
/// A skipped directory is not descended into. Symlinks are recreated rather
/// than followed. Fails if the source path is not a directory or doesn't
/// exist, or if the destination path already exists.
pub async fn copy_dir_filtered(from: &Path, to: &Path, matcher: &ExclusionMatcher) -> Result<()> {
    if !from.is_dir() {
        bail!("{} is not a directory", from.display());
    }
    if to.exists() {
        bail!("{} already exists", to.display());
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();
    let matcher = matcher.clone();

    tokio::task::spawn_blocking(move || -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).fs_context("creating copy destination", parent)?;
        }

        let walker = walkdir::WalkDir::new(&from)
            .follow_links(false)
            .into_iter()
            // depth 0 is the root itself, which is never excluded
            .filter_entry(|entry| entry.depth() == 0 || !matcher.is_match(entry.file_name()));

        for entry in walker {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                if entry.path().is_dir() {
                    symlink_dir(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
                } else {
                    symlink_file(&target, &dest_path)
                        .fs_context("creating symlink", &dest_path)?;
                }
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path)
                    .fs_context("creating directory", &dest_path)?;
            } else {
                log::trace!("copy {} -> {}", entry.path().display(), dest_path.display());
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

/// Removes a file if it exists.
///
/// Returns `true` if a file was removed.
pub async fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Fs {
            action: "removing existing output",
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

//! Copy-based exclusion: a filtered copy of the project in a temp workspace.

use super::ExclusionMatcher;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::utils::fs::copy_dir_filtered;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary copy of a project tree minus excluded entries.
///
/// The workspace is deleted by [`TempProjectDir::cleanup`] or, failing
/// that, when the value is dropped.
#[derive(Debug)]
pub struct TempProjectDir {
    workspace: TempDir,
    dest: PathBuf,
}

impl TempProjectDir {
    /// Copies `origin` into a fresh temporary directory, skipping matches.
    ///
    /// The copy keeps the project directory's own name so pex sees the same
    /// top-level layout.
    pub async fn create(origin: &Path, matcher: &ExclusionMatcher) -> Result<Self> {
        if !origin.is_dir() {
            return Err(Error::GenericError(format!(
                "Sources directory does not exist or is not a directory: {}",
                origin.display()
            )));
        }

        let workspace = tempfile::Builder::new()
            .prefix("pipenv-pex-")
            .tempdir()
            .fs_context("creating temporary workspace", std::env::temp_dir())?;

        let name = origin.file_name().unwrap_or(OsStr::new("sources"));
        let dest = workspace.path().join(name);

        log::debug!(
            "Copying {} to {} minus exclusions",
            origin.display(),
            dest.display()
        );
        // `workspace` is dropped on error, taking any partial copy with it
        copy_dir_filtered(origin, &dest, matcher).await?;

        Ok(Self { workspace, dest })
    }

    /// The filtered copy.
    pub fn path(&self) -> &Path {
        &self.dest
    }

    /// Deletes the workspace.
    pub async fn cleanup(self) -> Result<()> {
        let Self { workspace, .. } = self;
        let root = workspace.path().to_path_buf();
        tokio::task::spawn_blocking(move || workspace.close())
            .await
            .map_err(|e| Error::GenericError(format!("Cleanup task panicked: {}", e)))?
            .fs_context("removing temporary workspace", &root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn listing(root: &Path) -> BTreeSet<PathBuf> {
        walkdir::WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().path().strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    fn project() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app/__pycache__")).unwrap();
        std::fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        std::fs::write(dir.path().join("app/__init__.py"), "").unwrap();
        std::fs::write(dir.path().join("app/main.py"), "print('hi')").unwrap();
        std::fs::write(dir.path().join("app/__pycache__/main.cpython-311.pyc"), "").unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        std::fs::write(dir.path().join("Pipfile"), "").unwrap();
        dir
    }

    #[tokio::test]
    async fn copy_excludes_matches_and_leaves_origin_alone() {
        let origin = project();
        let before = listing(origin.path());
        let matcher = ExclusionMatcher::glob(["Pipfile", ".git*", "__pycache__"]).unwrap();

        let copy = TempProjectDir::create(origin.path(), &matcher).await.unwrap();
        let copied = listing(copy.path());
        let expected: BTreeSet<PathBuf> = ["app", "app/__init__.py", "app/main.py"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(copied, expected);
        assert_eq!(listing(origin.path()), before);

        let copy_path = copy.path().to_path_buf();
        copy.cleanup().await.unwrap();
        assert!(!copy_path.exists());
        assert_eq!(listing(origin.path()), before);
    }

    #[tokio::test]
    async fn dropping_the_guard_removes_the_copy() {
        let origin = project();
        let matcher = ExclusionMatcher::literal(["Pipfile"]);

        let copy_path = {
            let copy = TempProjectDir::create(origin.path(), &matcher).await.unwrap();
            assert!(copy.path().join("app/main.py").is_file());
            copy.path().to_path_buf()
        };

        assert!(!copy_path.exists());
    }

    #[tokio::test]
    async fn missing_origin_fails_before_creating_anything() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let matcher = ExclusionMatcher::literal(["Pipfile"]);

        assert!(TempProjectDir::create(&missing, &matcher).await.is_err());
    }
}

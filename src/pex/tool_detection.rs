//! External tool detection and availability checking.
//!
//! Lookups go through `which` once and are cached for the rest of the run.

use super::PexCommand;
use crate::bundler::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Location of `pex` on `PATH`, if any.
pub static PEX_IN_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("pex"));

/// Location of `pipenv` on `PATH`, if any.
pub static PIPENV_IN_PATH: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("pipenv"));

fn locate(tool: &str) -> Option<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            None
        }
    }
}

/// Decides how pex will be launched.
///
/// An explicit `pex_bin` wins; a bare name is looked up on `PATH`, a path is
/// used as given. Otherwise `pex` from `PATH` is used, and failing that
/// `pipenv run pex` inside the project's environment.
pub fn resolve_pex(pex_bin: Option<&Path>, pipfile: &Path) -> Result<PexCommand> {
    if let Some(bin) = pex_bin {
        let is_bare_name = bin.components().count() == 1 && !bin.is_absolute();
        let program = if is_bare_name {
            which::which(bin).map_err(|e| {
                Error::GenericError(format!("pex executable {} not found: {}", bin.display(), e))
            })?
        } else {
            bin.to_path_buf()
        };
        return Ok(PexCommand::Direct(program));
    }

    if let Some(pex) = PEX_IN_PATH.as_ref() {
        return Ok(PexCommand::Direct(pex.clone()));
    }

    if let Some(pipenv) = PIPENV_IN_PATH.as_ref() {
        log::info!("pex not in PATH, falling back to `pipenv run pex`");
        return Ok(PexCommand::Pipenv {
            pipenv: pipenv.clone(),
            pipfile: pipfile.to_path_buf(),
        });
    }

    Err(Error::GenericError(
        "pex not found. Install it into the project (`pipenv install --dev pex`) \
         or point --pex-bin / PIPENV_PEX_BIN at it"
            .to_string(),
    ))
}

/// Where a virtualenv keeps its `pex` script.
#[cfg(windows)]
const VENV_PEX: &str = "Scripts/pex.exe";
#[cfg(not(windows))]
const VENV_PEX: &str = "bin/pex";

/// Finds `pex` inside the project's Pipenv virtualenv via `pipenv --venv`.
///
/// Returns `None` when there is no virtualenv yet or it has no pex.
pub async fn pipenv_venv_pex(pipenv: &Path, pipfile: &Path) -> Option<PathBuf> {
    let output = tokio::process::Command::new(pipenv)
        .arg("--venv")
        .env("PIPENV_PIPFILE", pipfile)
        .output()
        .await;

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            log::debug!("`pipenv --venv` exited with {}", output.status);
            return None;
        }
        Err(e) => {
            log::debug!("Failed to run `pipenv --venv`: {}", e);
            return None;
        }
    };

    let venv = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    let pex = venv.join(VENV_PEX);
    if pex.is_file() {
        Some(pex)
    } else {
        log::debug!("No pex in virtualenv {}", venv.display());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_used_as_given() {
        let cmd = resolve_pex(Some(Path::new("/opt/tools/pex")), Path::new("/p/Pipfile")).unwrap();
        assert_eq!(cmd, PexCommand::Direct(PathBuf::from("/opt/tools/pex")));
    }

    #[test]
    fn unknown_bare_name_is_an_error() {
        let res = resolve_pex(
            Some(Path::new("definitely-not-a-real-pex-binary")),
            Path::new("/p/Pipfile"),
        );
        assert!(res.is_err());
    }

    #[cfg(unix)]
    fn fake_pipenv(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("pipenv");
        std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn venv_pex_is_found_through_pipenv() {
        let dir = tempfile::tempdir().unwrap();
        let venv = dir.path().join("venv");
        std::fs::create_dir_all(venv.join("bin")).unwrap();
        std::fs::write(venv.join("bin/pex"), "").unwrap();
        let pipenv = fake_pipenv(dir.path(), &format!("echo '{}'", venv.display()));

        let found = pipenv_venv_pex(&pipenv, Path::new("/p/Pipfile")).await;
        assert_eq!(found, Some(venv.join("bin/pex")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_venv_or_pex_gives_none() {
        let dir = tempfile::tempdir().unwrap();
        let no_venv = fake_pipenv(dir.path(), "echo 'No virtualenv' >&2; exit 1");
        assert_eq!(pipenv_venv_pex(&no_venv, Path::new("/p/Pipfile")).await, None);

        let empty = dir.path().join("empty-venv");
        std::fs::create_dir_all(&empty).unwrap();
        let without_pex = fake_pipenv(dir.path(), &format!("echo '{}'", empty.display()));
        assert_eq!(pipenv_venv_pex(&without_pex, Path::new("/p/Pipfile")).await, None);
    }
}

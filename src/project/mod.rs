//! Pipenv project discovery and metadata.
//!
//! A project is the directory holding the `Pipfile`. Its name is the
//! directory's name, its lockfile sits next to the `Pipfile`.

mod lockfile;

pub use lockfile::{Dependencies, Dependency, Lockfile};

use crate::cli::RuntimeConfig;
use crate::error::{BundlerError, CliError, Result};
use crate::pex::tool_detection::PIPENV_IN_PATH;
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PIPFILE: &str = "Pipfile";
pub const LOCKFILE: &str = "Pipfile.lock";

/// Default number of directories searched for a `Pipfile`, as pipenv does.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Bundler settings read from the `[pipenv-pex]` table of the Pipfile.
///
/// ```toml
/// [pipenv-pex]
/// exclude = ["docs", "*.ipynb"]
/// in-place = false
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipfileSettings {
    /// Extra exclusion patterns.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Stash excluded files in place instead of copying the project.
    pub in_place: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PipfileDocument {
    #[serde(default, rename = "pipenv-pex")]
    settings: PipfileSettings,
}

/// A located Pipenv project.
#[derive(Debug, Clone)]
pub struct Project {
    directory: PathBuf,
    pipfile: PathBuf,
    name: String,
    settings: PipfileSettings,
}

impl Project {
    /// Finds the `Pipfile` in `start` or its parents.
    ///
    /// Like pipenv, `max_depth` counts the directories looked at minus one:
    /// the default of 3 searches `start` and its parent.
    pub fn discover(start: &Path, max_depth: usize) -> Result<Self> {
        let start = absolute(start)?;
        let searched = max_depth.saturating_sub(1);

        for dir in start.ancestors().take(searched) {
            let candidate = dir.join(PIPFILE);
            if candidate.is_file() {
                log::debug!("Found Pipfile at {}", candidate.display());
                return Self::from_pipfile(&candidate);
            }
        }

        Err(BundlerError::Cli(CliError::InvalidArguments {
            reason: format!(
                "No Pipfile found in {} or its parents (searched {} director{}). \
                 Run from a Pipenv project or pass --pipfile.",
                start.display(),
                searched,
                if searched == 1 { "y" } else { "ies" }
            ),
        }))
    }

    /// Loads the project owning the given `Pipfile`.
    pub fn from_pipfile(pipfile: &Path) -> Result<Self> {
        let pipfile = absolute(pipfile)?;
        if !pipfile.is_file() {
            return Err(BundlerError::Cli(CliError::InvalidArguments {
                reason: format!("Pipfile not found: {}", pipfile.display()),
            }));
        }

        let directory = pipfile
            .parent()
            .ok_or_else(|| {
                BundlerError::Cli(CliError::InvalidArguments {
                    reason: format!("Invalid Pipfile path: {}", pipfile.display()),
                })
            })?
            .to_path_buf();

        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BundlerError::Cli(CliError::InvalidArguments {
                    reason: format!(
                        "Cannot derive a project name from {}",
                        directory.display()
                    ),
                })
            })?;

        let settings = read_settings(&pipfile)?;

        Ok(Self {
            directory,
            pipfile,
            name,
            settings,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn pipfile(&self) -> &Path {
        &self.pipfile
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &PipfileSettings {
        &self.settings
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.directory.join(LOCKFILE)
    }

    /// `{project_dir}/{project_name}.pex`
    pub fn default_output(&self) -> PathBuf {
        self.directory.join(format!("{}.pex", self.name))
    }

    /// Loads `Pipfile.lock`, running `pipenv lock` first if it is missing.
    pub async fn load_or_create_lockfile(
        &self,
        runtime_config: &RuntimeConfig,
    ) -> Result<Lockfile> {
        let path = self.lockfile_path();
        if !path.exists() {
            runtime_config.warn(&format!("{} not found, running `pipenv lock`...", LOCKFILE))?;
            self.lock().await?;
        }
        Lockfile::load(&path)
    }

    async fn lock(&self) -> Result<()> {
        let pipenv = PIPENV_IN_PATH.as_ref().ok_or_else(|| {
            BundlerError::Cli(CliError::ExecutionFailed {
                command: "pipenv lock".to_string(),
                reason: format!(
                    "{} is missing and pipenv is not in PATH to create it",
                    self.lockfile_path().display()
                ),
            })
        })?;

        let status = tokio::process::Command::new(pipenv)
            .arg("lock")
            .env("PIPENV_PIPFILE", &self.pipfile)
            .current_dir(&self.directory)
            .status()
            .await
            .map_err(|e| {
                BundlerError::Cli(CliError::ExecutionFailed {
                    command: "pipenv lock".to_string(),
                    reason: e.to_string(),
                })
            })?;

        if !status.success() {
            return Err(BundlerError::Cli(CliError::ExecutionFailed {
                command: "pipenv lock".to_string(),
                reason: format!("exited with {}", status),
            }));
        }

        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}

fn read_settings(pipfile: &Path) -> Result<PipfileSettings> {
    let content = std::fs::read_to_string(pipfile).map_err(|e| {
        BundlerError::Cli(CliError::ExecutionFailed {
            command: "read_pipfile".to_string(),
            reason: format!("Failed to read {}: {}", pipfile.display(), e),
        })
    })?;
    let document: PipfileDocument = toml::from_str(&content)?;
    Ok(document.settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIPFILE_BODY: &str = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
requests = "*"

[dev-packages]

[requires]
python_version = "3.11"
"#;

    #[test]
    fn discovers_pipfile_in_parent() {
        let root = tempfile::tempdir().unwrap();
        let proj = root.path().join("myapp");
        std::fs::create_dir_all(proj.join("src")).unwrap();
        std::fs::write(proj.join(PIPFILE), PIPFILE_BODY).unwrap();

        let project = Project::discover(&proj.join("src"), DEFAULT_MAX_DEPTH).unwrap();

        assert_eq!(project.directory(), proj.as_path());
        assert_eq!(project.name(), "myapp");
        assert_eq!(project.default_output(), proj.join("myapp.pex"));
        assert_eq!(project.lockfile_path(), proj.join("Pipfile.lock"));
        assert_eq!(project.settings(), &PipfileSettings::default());
    }

    #[test]
    fn discovery_respects_max_depth() {
        let root = tempfile::tempdir().unwrap();
        let proj = root.path().join("myapp");
        let deep = proj.join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(proj.join(PIPFILE), PIPFILE_BODY).unwrap();

        assert!(Project::discover(&deep, DEFAULT_MAX_DEPTH).is_err());
        assert!(Project::discover(&deep, 4).is_ok());
    }

    #[test]
    fn reads_pipenv_pex_table() {
        let root = tempfile::tempdir().unwrap();
        let body = format!(
            "{}\n[pipenv-pex]\nexclude = [\"docs\", \"*.ipynb\"]\nin-place = true\n",
            PIPFILE_BODY
        );
        std::fs::write(root.path().join(PIPFILE), body).unwrap();

        let project = Project::from_pipfile(&root.path().join(PIPFILE)).unwrap();

        assert_eq!(
            project.settings().exclude,
            vec!["docs".to_string(), "*.ipynb".to_string()]
        );
        assert_eq!(project.settings().in_place, Some(true));
    }

    #[test]
    fn missing_pipfile_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(Project::from_pipfile(&root.path().join(PIPFILE)).is_err());
    }
}

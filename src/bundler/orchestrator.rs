//! Main bundler orchestration.

use super::exclude::{ExcludedSources, ExclusionSet, Strategy};
use super::utils::fs::remove_file_if_exists;
use crate::cli::RuntimeConfig;
use crate::error::{CliError, Result};
use crate::pex::tool_detection::{pipenv_venv_pex, resolve_pex};
use crate::pex::{self, PexCommand, PexInvocation};
use crate::project::Project;
use path_absolutize::Absolutize;
use std::path::PathBuf;

/// What to bundle and how.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Directory the Pipfile search starts from.
    pub start_dir: PathBuf,
    /// Explicit Pipfile, bypassing the search.
    pub pipfile: Option<PathBuf>,
    pub max_depth: usize,
    /// Exclusion patterns on top of the defaults.
    pub exclude: Vec<String>,
    /// `None` defers to the Pipfile's `in-place` setting, then to copying.
    pub strategy: Option<Strategy>,
    pub pex_bin: Option<PathBuf>,
    /// Arguments passed through to pex.
    pub pex_args: Vec<String>,
}

impl BundleOptions {
    /// Options with defaults for everything but the start directory.
    pub fn new(start_dir: PathBuf) -> Self {
        Self {
            start_dir,
            pipfile: None,
            max_depth: crate::project::DEFAULT_MAX_DEPTH,
            exclude: Vec::new(),
            strategy: None,
            pex_bin: None,
            pex_args: Vec::new(),
        }
    }
}

/// Builds a `.pex` archive for a Pipenv project.
#[derive(Debug)]
pub struct Bundler {
    options: BundleOptions,
}

impl Bundler {
    pub fn new(options: BundleOptions) -> Self {
        Self { options }
    }

    /// Runs the whole bundle and returns the archive path.
    ///
    /// Nothing on disk is touched before the entry point check passes. Once
    /// excluded sources are acquired they are released whether pex succeeds,
    /// fails, or is interrupted.
    pub async fn bundle(&self, runtime_config: &RuntimeConfig) -> Result<PathBuf> {
        if !pex::has_entry_point(&self.options.pex_args) {
            return Err(CliError::MissingArgument {
                argument: "entry point (--entry-point)".to_string(),
            }
            .into());
        }

        let project = self.locate_project()?;
        log::info!(
            "Bundling project {} at {}",
            project.name(),
            project.directory().display()
        );

        let mut pex_args = self.options.pex_args.clone();
        let output = pex::resolve_output(&mut pex_args, &project.default_output());
        if output.defaulted {
            runtime_config.warn(&format!(
                "Output is {} since --output wasn't explicitly passed",
                output.path.display()
            ))?;
        }

        let lockfile = project.load_or_create_lockfile(runtime_config).await?;
        let dependencies = lockfile.dependencies()?;
        runtime_config.section("Dependencies found:")?;
        for dep in &dependencies.bundled {
            runtime_config.indent(&dep.to_string())?;
        }
        if !dependencies.editable.is_empty() {
            runtime_config.warn(&format!(
                "Skipping editable packages: {}",
                dependencies.editable.join(", ")
            ))?;
        }
        if !dependencies.unpinned.is_empty() {
            runtime_config.warn(&format!(
                "Skipping packages without a pinned version: {}",
                dependencies.unpinned.join(", ")
            ))?;
        }

        let mut exclusions = ExclusionSet::with_defaults();
        exclusions.extend(self.options.exclude.iter().cloned());
        exclusions.extend(project.settings().exclude.iter().cloned());
        let matcher = exclusions.matcher()?;
        runtime_config
            .verbose_println(&format!("Excluding: {}", exclusions.patterns().join(", ")))?;

        let pex_command = resolve_pex(self.options.pex_bin.as_deref(), project.pipfile())?;
        let (strategy, pex_command) = self
            .strategy_for(&project, pex_command, runtime_config)
            .await?;

        // the previous archive survives any failure above
        if output.path.exists() {
            runtime_config.warn(&format!(
                "{} already exists, deleting it...",
                display_path(&output.path).display()
            ))?;
            remove_file_if_exists(&output.path).await?;
        }

        runtime_config.progress("Stashing away excluded files...")?;
        let sources = ExcludedSources::acquire(project.directory(), &matcher, strategy).await?;

        runtime_config.progress("Running pex...")?;
        let requirements = dependencies.requirements();
        let built = PexInvocation::new(&pex_command, requirements, sources.path(), &pex_args)
            .run(runtime_config)
            .await;

        runtime_config.progress("Cleaning up temp files...")?;
        let released = sources.release().await;

        built?;
        released?;

        runtime_config.success("Done!")?;
        Ok(output.path)
    }

    fn locate_project(&self) -> Result<Project> {
        match &self.options.pipfile {
            Some(pipfile) => Project::from_pipfile(&self.options.start_dir.join(pipfile)),
            None => Project::discover(&self.options.start_dir, self.options.max_depth),
        }
    }

    /// Settles the exclusion strategy together with the pex command.
    ///
    /// `pipenv run pex` needs the Pipfile in place, so stashing it is only
    /// possible once pex is found inside the project's virtualenv. Without
    /// one the sources are copied instead.
    async fn strategy_for(
        &self,
        project: &Project,
        pex_command: PexCommand,
        runtime_config: &RuntimeConfig,
    ) -> Result<(Strategy, PexCommand)> {
        let strategy = self.strategy(project);
        let venv_pex = match (&pex_command, strategy) {
            (PexCommand::Pipenv { pipenv, pipfile }, Strategy::Stash) => {
                pipenv_venv_pex(pipenv, pipfile).await
            }
            _ => return Ok((strategy, pex_command)),
        };

        match venv_pex {
            Some(pex) => {
                log::info!("Using pex from the project virtualenv: {}", pex.display());
                Ok((strategy, PexCommand::Direct(pex)))
            }
            None => {
                runtime_config.warn(
                    "pex only runs through `pipenv run`, which needs the Pipfile; \
                     copying sources instead of stashing",
                )?;
                Ok((Strategy::Copy, pex_command))
            }
        }
    }

    fn strategy(&self, project: &Project) -> Strategy {
        self.options.strategy.unwrap_or_else(|| {
            match project.settings().in_place {
                Some(true) => Strategy::Stash,
                _ => Strategy::default(),
            }
        })
    }
}

/// Absolute form of a path for messages, falling back to the path as given.
fn display_path(path: &std::path::Path) -> PathBuf {
    path.absolutize()
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_path_buf())
}

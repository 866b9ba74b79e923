//! pex process execution.

use crate::bundler::error::{Error, Result};
use crate::cli::RuntimeConfig;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// How pex is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PexCommand {
    /// A pex executable.
    Direct(PathBuf),
    /// `pipenv run pex` against the given Pipfile.
    Pipenv { pipenv: PathBuf, pipfile: PathBuf },
}

impl PexCommand {
    fn command(&self) -> Command {
        match self {
            Self::Direct(program) => Command::new(program),
            Self::Pipenv { pipenv, pipfile } => {
                let mut cmd = Command::new(pipenv);
                cmd.env("PIPENV_PIPFILE", pipfile).args(["run", "pex"]);
                cmd
            }
        }
    }

    fn display_name(&self) -> String {
        match self {
            Self::Direct(program) => program.display().to_string(),
            Self::Pipenv { .. } => "pipenv run pex".to_string(),
        }
    }
}

/// A single pex run: requirements, sources and passthrough flags.
#[derive(Debug)]
pub struct PexInvocation<'a> {
    command: &'a PexCommand,
    requirements: Vec<String>,
    sources_dir: &'a Path,
    passthrough: &'a [String],
}

impl<'a> PexInvocation<'a> {
    pub fn new(
        command: &'a PexCommand,
        requirements: Vec<String>,
        sources_dir: &'a Path,
        passthrough: &'a [String],
    ) -> Self {
        Self {
            command,
            requirements,
            sources_dir,
            passthrough,
        }
    }

    /// Arguments handed to pex:
    /// `<requirements…> --sources-directory <dir> <passthrough…>`.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.requirements.iter().map(OsString::from).collect();
        args.push("--sources-directory".into());
        args.push(self.sources_dir.as_os_str().to_owned());
        args.extend(self.passthrough.iter().map(OsString::from));
        args
    }

    /// Runs pex to completion with inherited stdio.
    ///
    /// Ctrl-C kills pex and returns [`Error::Interrupted`] so the caller can
    /// still release the excluded sources.
    pub async fn run(&self, runtime_config: &RuntimeConfig) -> Result<()> {
        let name = self.command.display_name();
        let args = self.args();
        log::debug!("Running {} {:?}", name, args);
        runtime_config.verbose_println(&format!("$ {} {}", name, join_args(&args)))?;

        let mut child = self
            .command
            .command()
            .args(&args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CommandFailed {
                command: name.clone(),
                error: e,
            })?;

        // `None` means Ctrl-C arrived first
        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::signal::ctrl_c() => None,
        };

        let status = match waited {
            Some(status) => status.map_err(|e| Error::CommandFailed {
                command: name.clone(),
                error: e,
            })?,
            None => {
                runtime_config.warn("Interrupted, stopping pex...")?;
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill pex: {}", e);
                }
                return Err(Error::Interrupted(name));
            }
        };

        if !status.success() {
            return Err(Error::CommandExited {
                command: name,
                status,
            });
        }

        Ok(())
    }
}

fn join_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_come_first_then_sources_then_passthrough() {
        let command = PexCommand::Direct(PathBuf::from("pex"));
        let passthrough = vec!["-e".to_string(), "app.main".to_string()];
        let invocation = PexInvocation::new(
            &command,
            vec!["requests==2.31.0".to_string(), "click==8.1.7".to_string()],
            Path::new("/tmp/work/proj"),
            &passthrough,
        );

        let expected: Vec<OsString> = [
            "requests==2.31.0",
            "click==8.1.7",
            "--sources-directory",
            "/tmp/work/proj",
            "-e",
            "app.main",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        assert_eq!(invocation.args(), expected);
    }

    #[test]
    fn pipenv_fallback_is_named_for_humans() {
        let command = PexCommand::Pipenv {
            pipenv: PathBuf::from("/usr/bin/pipenv"),
            pipfile: PathBuf::from("/p/Pipfile"),
        };
        assert_eq!(command.display_name(), "pipenv run pex");
    }
}

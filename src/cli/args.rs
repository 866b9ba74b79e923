//! Command line argument parsing and validation.
//!
//! Options of this tool come first; everything from the first unrecognized
//! token on is handed to pex untouched.

use crate::bundler::exclude::Strategy;
use crate::project::DEFAULT_MAX_DEPTH;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Generate Python executable files via pex using info from the Pipfile
#[derive(Parser, Debug)]
#[command(
    name = "pipenv-pex",
    version,
    about = "Generate Python executable files via pex using info from the Pipfile",
    long_about = "Builds a .pex archive from a Pipenv project.

Dependencies come from the default section of Pipfile.lock (editable packages are skipped).
Project files are copied to a temporary directory minus the excluded entries and passed to
pex as the sources directory. All arguments after this tool's own options go to pex.

Usage:
  pipenv-pex --entry-point app.main
  pipenv-pex -x docs -x '*.ipynb' -m app -o dist/app.pex
  pipenv-pex --in-place -e app.cli:main --python python3.11

Excluded by default: Pipfile, Pipfile.lock, .mypy_cache, __pycache__, .pytest_cache,
.git*, .idea, .vscode, .venv, *.pex"
)]
pub struct Args {
    /// Don't include these files/directories in the resulting .pex file (glob, repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Move excluded entries aside inside the project instead of copying the project
    #[arg(long)]
    pub in_place: bool,

    /// Path to the Pipfile (skips discovery)
    #[arg(long, env = "PIPENV_PIPFILE", value_name = "PATH")]
    pub pipfile: Option<PathBuf>,

    /// Number of directories searched upward for a Pipfile
    #[arg(long, env = "PIPENV_MAX_DEPTH", value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// pex executable to run
    #[arg(long, env = "PIPENV_PEX_BIN", value_name = "PATH")]
    pub pex_bin: Option<PathBuf>,

    /// Print the pex command line and other details
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Arguments passed through to pex
    #[arg(
        value_name = "PEX_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub pex_args: Vec<String>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Exclusion strategy requested on the command line.
    ///
    /// `None` leaves the choice to the Pipfile settings.
    pub fn strategy(&self) -> Option<Strategy> {
        self.in_place.then_some(Strategy::Stash)
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 && self.pipfile.is_none() {
            return Err("--max-depth must be at least 1".to_string());
        }
        if let Some(pattern) = self.exclude.iter().find(|p| p.is_empty()) {
            return Err(format!("Empty exclusion pattern: {:?}", pattern));
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }

    /// Print error message (never suppressed)
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.output.error(message)
    }
}

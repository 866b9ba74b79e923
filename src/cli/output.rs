//! Colored terminal output.
//!
//! Informational lines are green, warnings yellow, errors red on stderr.
//! `console` drops the colors by itself when the stream is not a terminal.

use console::{Term, style};

/// Writes categorized messages to the terminal.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    stdout: Term,
    stderr: Term,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            stdout: Term::stdout(),
            stderr: Term::stderr(),
        }
    }

    /// Detail shown only in verbose mode.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&style(message).dim().to_string())
    }

    /// Progress step.
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&style(message).green().to_string())
    }

    /// Plain indented line, used for lists.
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&format!("- {}", style(message).white()))
    }

    /// Heading followed by an indented list.
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout.write_line(&style(title).green().bold().to_string())
    }

    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout
            .write_line(&style(message).yellow().bright().to_string())
    }

    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.stdout
            .write_line(&style(message).green().bold().to_string())
    }

    /// Errors are shown even in quiet mode.
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.stderr.write_line(&style(message).red().to_string())
    }
}

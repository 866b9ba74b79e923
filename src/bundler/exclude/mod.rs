//! Scoped exclusion of project files from the packaged sources.
//!
//! Packaging reads the whole sources directory, so anything pex must not
//! see has to be out of the way for the duration of the run. Two strategies
//! are available behind [`ExcludedSources`]:
//!
//! - [`Strategy::Copy`] (default): the project tree is copied into a
//!   temporary workspace minus the excluded entries. The project itself is
//!   never touched.
//! - [`Strategy::Stash`]: matching top-level entries are renamed into a
//!   stash directory next to the project and renamed back afterwards.
//!
//! Either way the guard must be released, explicitly with
//! [`ExcludedSources::release`] or implicitly on drop.

mod copy;
mod stash;

pub use copy::TempProjectDir;
pub use stash::StashedEntries;

use crate::bundler::error::Result;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

/// Entries never bundled, regardless of user exclusions.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "Pipfile",
    "Pipfile.lock",
    ".mypy_cache",
    "__pycache__",
    ".pytest_cache",
    ".git*",
    ".idea",
    ".vscode",
    ".venv",
    "*.pex",
];

/// How excluded entries are kept away from pex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Copy the tree minus exclusions into a temporary workspace.
    #[default]
    Copy,
    /// Move excluded top-level entries aside and restore them afterwards.
    Stash,
}

/// Decides whether a directory entry is excluded, by file name.
#[derive(Debug, Clone)]
pub enum ExclusionMatcher {
    /// Exact file name membership.
    Literal(BTreeSet<String>),
    /// Shell-style wildcard patterns (`*`, `?`, `[...]`).
    Glob(Vec<glob::Pattern>),
}

impl ExclusionMatcher {
    /// Matcher that excludes exactly the given names.
    pub fn literal<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Literal(names.into_iter().map(Into::into).collect())
    }

    /// Matcher that excludes names matching any of the given glob patterns.
    pub fn glob<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled = patterns
            .into_iter()
            .map(|p| glob::Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::Glob(compiled))
    }

    /// Returns true if an entry with this file name should be excluded.
    pub fn is_match(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        match self {
            Self::Literal(names) => names.contains(&*name),
            Self::Glob(patterns) => patterns.iter().any(|p| p.matches(&name)),
        }
    }
}

/// Union of the default exclusions and any extra patterns.
///
/// Keeps first-seen order for display and drops duplicates.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        let mut set = Self {
            patterns: Vec::new(),
        };
        set.extend(DEFAULT_EXCLUSIONS.iter().copied());
        set
    }
}

impl ExclusionSet {
    /// Set containing only [`DEFAULT_EXCLUSIONS`].
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Adds patterns, ignoring ones already present.
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if !self.patterns.contains(&pattern) {
                self.patterns.push(pattern);
            }
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Compiles the set into a glob matcher.
    pub fn matcher(&self) -> Result<ExclusionMatcher> {
        ExclusionMatcher::glob(&self.patterns)
    }
}

/// Sources directory with excluded entries kept out of sight.
///
/// Obtained with [`ExcludedSources::acquire`]; valid until released or
/// dropped.
#[derive(Debug)]
pub enum ExcludedSources {
    Copied(TempProjectDir),
    Stashed(StashedEntries),
}

impl ExcludedSources {
    /// Hides entries of `source` matching `matcher` using `strategy`.
    ///
    /// On error nothing is left behind: a partial copy is deleted and
    /// partially stashed entries are moved back.
    pub async fn acquire(
        source: &Path,
        matcher: &ExclusionMatcher,
        strategy: Strategy,
    ) -> Result<Self> {
        match strategy {
            Strategy::Copy => Ok(Self::Copied(TempProjectDir::create(source, matcher).await?)),
            Strategy::Stash => Ok(Self::Stashed(StashedEntries::stash(source, matcher).await?)),
        }
    }

    /// Directory to hand to pex as the sources directory.
    pub fn path(&self) -> &Path {
        match self {
            Self::Copied(copy) => copy.path(),
            Self::Stashed(stash) => stash.origin(),
        }
    }

    /// Discards the copy or restores stashed entries, reporting failures.
    pub async fn release(self) -> Result<()> {
        match self {
            Self::Copied(copy) => copy.cleanup().await,
            Self::Stashed(stash) => stash.restore().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_defaults() {
        let matcher = ExclusionSet::with_defaults().matcher().unwrap();

        for name in [".git", ".gitignore", ".github", "Pipfile.lock", "old.pex"] {
            assert!(matcher.is_match(OsStr::new(name)), "{name} should match");
        }
        for name in ["main.py", "Pipfile.bak", "pkg", "git"] {
            assert!(!matcher.is_match(OsStr::new(name)), "{name} should not match");
        }
    }

    #[test]
    fn literal_matches_exact_names_only() {
        let matcher = ExclusionMatcher::literal([".git*", "bad"]);

        assert!(matcher.is_match(OsStr::new("bad")));
        assert!(matcher.is_match(OsStr::new(".git*")));
        assert!(!matcher.is_match(OsStr::new(".gitignore")));
        assert!(!matcher.is_match(OsStr::new("bad.txt")));
    }

    #[test]
    fn exclusion_set_is_a_union_without_duplicates() {
        let mut set = ExclusionSet::with_defaults();
        set.extend(["docs", "Pipfile", "docs"]);

        let patterns = set.patterns();
        assert_eq!(patterns.len(), DEFAULT_EXCLUSIONS.len() + 1);
        assert_eq!(patterns.last().map(String::as_str), Some("docs"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        assert!(ExclusionMatcher::glob(["[unclosed"]).is_err());
    }
}

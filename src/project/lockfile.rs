//! Pipfile.lock parsing and requirement extraction.

use crate::error::{BundlerError, CliError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// The parts of `Pipfile.lock` the bundler reads.
///
/// Only the `default` section matters; `develop` packages are never bundled.
/// Key order follows the file.
#[derive(Debug, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    default: serde_json::Map<String, serde_json::Value>,
}

/// One locked package entry.
#[derive(Debug, Deserialize)]
struct LockedPackage {
    version: Option<String>,
    #[serde(default)]
    editable: bool,
    #[serde(default)]
    extras: Vec<String>,
    markers: Option<String>,
}

/// A requirement handed to pex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Version specifier as locked, e.g. `==1.0`.
    pub version: String,
    pub extras: Vec<String>,
    pub markers: Option<String>,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        write!(f, "{}", self.version)?;
        if let Some(markers) = &self.markers {
            write!(f, "; {}", markers)?;
        }
        Ok(())
    }
}

/// Requirements derived from the lockfile.
#[derive(Debug, Default)]
pub struct Dependencies {
    /// Packages to bundle, in lockfile order.
    pub bundled: Vec<Dependency>,
    /// Editable packages, left out of the archive.
    pub editable: Vec<String>,
    /// Packages with no pinned version (VCS or path requirements).
    pub unpinned: Vec<String>,
}

impl Dependencies {
    /// Requirement strings in pex's command-line form.
    pub fn requirements(&self) -> Vec<String> {
        self.bundled.iter().map(ToString::to_string).collect()
    }
}

impl Lockfile {
    /// Reads and parses a `Pipfile.lock`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BundlerError::Cli(CliError::ExecutionFailed {
                command: "read_lockfile".to_string(),
                reason: format!("Failed to read {}: {}", path.display(), e),
            })
        })?;
        Self::parse(&content)
    }

    /// Parses lockfile JSON.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Splits the `default` section into bundled, editable and unpinned
    /// packages.
    pub fn dependencies(&self) -> Result<Dependencies> {
        let mut deps = Dependencies::default();

        for (name, value) in &self.default {
            let package: LockedPackage = serde_json::from_value(value.clone()).map_err(|e| {
                BundlerError::Cli(CliError::InvalidArguments {
                    reason: format!("Malformed lockfile entry '{}': {}", name, e),
                })
            })?;

            if package.editable {
                log::debug!("Skipping editable package {}", name);
                deps.editable.push(name.clone());
                continue;
            }

            match package.version {
                Some(version) => deps.bundled.push(Dependency {
                    name: name.clone(),
                    version,
                    extras: package.extras,
                    markers: package.markers,
                }),
                None => {
                    log::debug!("Skipping unpinned package {}", name);
                    deps.unpinned.push(name.clone());
                }
            }
        }

        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editable_packages_are_left_out() {
        let lock = Lockfile::parse(
            r#"{
                "_meta": {"hash": {"sha256": "abc"}},
                "default": {
                    "A": {"version": "==1.0"},
                    "B": {"version": "==2.0", "editable": true}
                },
                "develop": {"pytest": {"version": "==8.0.0"}}
            }"#,
        )
        .unwrap();

        let deps = lock.dependencies().unwrap();
        assert_eq!(deps.requirements(), vec!["A==1.0".to_string()]);
        assert_eq!(deps.editable, vec!["B".to_string()]);
    }

    #[test]
    fn editable_false_is_bundled() {
        let lock = Lockfile::parse(
            r#"{"default": {"C": {"version": "==3.0", "editable": false}}}"#,
        )
        .unwrap();

        let deps = lock.dependencies().unwrap();
        assert_eq!(deps.requirements(), vec!["C==3.0".to_string()]);
        assert!(deps.editable.is_empty());
    }

    #[test]
    fn lockfile_order_is_preserved() {
        let lock = Lockfile::parse(
            r#"{"default": {
                "zipp": {"version": "==3.17.0"},
                "attrs": {"version": "==23.1.0"}
            }}"#,
        )
        .unwrap();

        assert_eq!(
            lock.dependencies().unwrap().requirements(),
            vec!["zipp==3.17.0".to_string(), "attrs==23.1.0".to_string()]
        );
    }

    #[test]
    fn extras_and_markers_are_rendered() {
        let lock = Lockfile::parse(
            r#"{"default": {
                "requests": {
                    "version": "==2.31.0",
                    "extras": ["socks", "security"],
                    "markers": "python_version >= '3.7'",
                    "hashes": ["sha256:deadbeef"]
                }
            }}"#,
        )
        .unwrap();

        assert_eq!(
            lock.dependencies().unwrap().requirements(),
            vec!["requests[socks,security]==2.31.0; python_version >= '3.7'".to_string()]
        );
    }

    #[test]
    fn unpinned_entries_are_reported_not_bundled() {
        let lock = Lockfile::parse(
            r#"{"default": {
                "mylib": {"git": "https://example.com/mylib.git", "ref": "abc123"},
                "six": {"version": "==1.16.0"}
            }}"#,
        )
        .unwrap();

        let deps = lock.dependencies().unwrap();
        assert_eq!(deps.requirements(), vec!["six==1.16.0".to_string()]);
        assert_eq!(deps.unpinned, vec!["mylib".to_string()]);
    }

    #[test]
    fn missing_default_section_means_no_dependencies() {
        let lock = Lockfile::parse(r#"{"_meta": {}}"#).unwrap();
        assert!(lock.dependencies().unwrap().bundled.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Lockfile::parse("{not json").is_err());
    }
}

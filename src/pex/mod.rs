//! Inspection of the arguments passed through to pex.
//!
//! pex owns its flag grammar; this module only looks for the handful of
//! flags the bundler has to know about and otherwise leaves the argument
//! list alone.

mod runner;
pub mod tool_detection;

pub use runner::{PexCommand, PexInvocation};

use std::path::{Path, PathBuf};

/// Flags that give pex an entry point.
pub const ENTRY_POINT_FLAGS: &[&str] = &[
    "-m",
    "-e",
    "--entry-point",
    "-c",
    "--script",
    "--console-script",
];

/// Flags that set the output file, in lookup order.
pub const OUTPUT_FLAGS: &[&str] = &["-o", "--output", "--output-file"];

/// Returns true if any token names an entry point, either as a flag
/// followed by a value or as `--flag=value`.
pub fn has_entry_point(args: &[String]) -> bool {
    args.iter().any(|arg| {
        ENTRY_POINT_FLAGS.iter().any(|flag| {
            arg == flag || (flag.starts_with("--") && long_flag_value(arg, flag).is_some())
        })
    })
}

/// Output path explicitly given in the passthrough arguments.
///
/// Flags are tried in [`OUTPUT_FLAGS`] order and the first one present
/// decides. A flag that is the final token has no value, and the result
/// is `None` rather than an error. `--flag=value` forms are consulted
/// only when no space-separated flag is present.
pub fn explicit_output(args: &[String]) -> Option<PathBuf> {
    for flag in OUTPUT_FLAGS {
        if let Some(index) = args.iter().position(|arg| arg == flag) {
            return args.get(index + 1).map(PathBuf::from);
        }
    }

    args.iter().find_map(|arg| {
        OUTPUT_FLAGS
            .iter()
            .filter(|flag| flag.starts_with("--"))
            .find_map(|flag| long_flag_value(arg, flag))
            .map(PathBuf::from)
    })
}

/// Where pex will write the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub path: PathBuf,
    /// True when no output flag was given and the default was appended.
    pub defaulted: bool,
}

/// Resolves the output path, appending `--output <default>` to `args` when
/// none was given explicitly.
pub fn resolve_output(args: &mut Vec<String>, default: &Path) -> ResolvedOutput {
    if let Some(path) = explicit_output(args) {
        return ResolvedOutput {
            path,
            defaulted: false,
        };
    }

    args.push("--output".to_string());
    args.push(default.to_string_lossy().into_owned());
    ResolvedOutput {
        path: default.to_path_buf(),
        defaulted: true,
    }
}

fn long_flag_value<'a>(arg: &'a str, flag: &str) -> Option<&'a str> {
    arg.strip_prefix(flag)?.strip_prefix('=')
}

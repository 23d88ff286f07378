//! Source/target path pairing and target wildcard handling.
//!
//! After alias expansion an image entry has one or more source templates and
//! one or more target templates. [`pair_paths`] combines them into the full
//! cartesian product of concrete pairs, anchoring relative paths at the
//! config's base directory and normalizing the result lexically.
//!
//! ## Target wildcard extension
//!
//! A target path may end in `*.ext` — a literal `*` immediately followed by
//! a file extension, anchored at the end of the string. After glob expansion
//! the wildcard is replaced with the matched source file's basename:
//!
//! ```text
//! target template: "out/*.png"    matched source: "icons/Icon-60.png"
//! rewritten:       "out/Icon-60.png"
//! ```
//!
//! Targets without the wildcard are used verbatim for every match, so
//! multiple source matches overwrite the same file — that is the config
//! author's responsibility.

use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path};

/// One concrete source/target combination, pre-glob.
///
/// Both paths are absolute and normalized; `source` may still contain glob
/// metacharacters and `target` a trailing `*.ext` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub source: String,
    pub target: String,
}

/// Combine every resolved source with every resolved target.
///
/// The result has `sources.len() * targets.len()` entries in source-major
/// order. No deduplication is performed — degenerate alias sets that expand
/// to equal paths produce repeated pairs.
pub fn pair_paths(sources: &[String], targets: &[String], base_path: &Path) -> Vec<PathPair> {
    let mut pairs = Vec::with_capacity(sources.len() * targets.len());
    for source in sources {
        for target in targets {
            pairs.push(PathPair {
                source: normalize(&anchored(source, base_path)),
                target: normalize(&anchored(target, base_path)),
            });
        }
    }
    pairs
}

/// Prefix `base` onto `path` unless it is already absolute.
fn anchored(path: &str, base: &Path) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        format!("{}{}{}", base.display(), MAIN_SEPARATOR, path)
    }
}

/// Lexically normalize a path string.
///
/// Collapses redundant separators, resolves `.` and `..` components without
/// touching the filesystem, and rewrites separators to the platform one.
/// Glob metacharacters pass through untouched.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/') || path.starts_with('\\');
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => match stack.last() {
                Some(&"..") | None => {
                    if !absolute {
                        stack.push("..");
                    }
                }
                Some(_) => {
                    stack.pop();
                }
            },
            other => stack.push(other),
        }
    }
    let body = stack.join(MAIN_SEPARATOR_STR);
    if absolute {
        format!("{MAIN_SEPARATOR}{body}")
    } else if body.is_empty() {
        ".".to_string()
    } else {
        body
    }
}

/// Split a trailing `*.ext` wildcard off a target template.
///
/// Returns the extension *including* the leading dot (`".png"`) when the
/// template ends with `*.<alphanumeric>`. A `*` anywhere else in the path
/// does not count as a wildcard target, and neither does a non-alphanumeric
/// extension.
pub fn wildcard_extension(target: &str) -> Option<&str> {
    let star = target.rfind('*')?;
    let rest = &target[star + 1..];
    let ext = rest.strip_prefix('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(rest)
}

/// Rewrite a wildcard target for one matched source file.
///
/// The `*.ext` pattern is replaced with `<matched stem><ext>`, keeping the
/// target's directory prefix. Returns `None` when the target carries no
/// wildcard extension.
pub fn rewrite_wildcard_target(target: &str, matched_source: &Path) -> Option<String> {
    let ext = wildcard_extension(target)?;
    let stem = matched_source.file_stem()?.to_string_lossy();
    let dir = Path::new(target)
        .parent()
        .filter(|p| !p.as_os_str().is_empty());
    Some(match dir {
        Some(dir) => format!("{}{}{}{}", dir.display(), MAIN_SEPARATOR, stem, ext),
        None => format!("{stem}{ext}"),
    })
}

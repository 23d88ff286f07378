//! Configuration loading and normalization.
//!
//! The tool is driven by a JSON config file describing image entries,
//! aliases and tags:
//!
//! ```json
//! {
//!   "basePath": "",
//!   "tags": "ios,android",
//!   "aliases": [
//!     "this string is a comment",
//!     { "name": "<lang>", "value": ["en", "de"] },
//!     { "name": "<res>", "value": "res/<lang>" }
//!   ],
//!   "images": [
//!     {
//!       "sourcePath": "art/icon-*.png",
//!       "targetPath": "<res>/icons/*.png",
//!       "resolution": "57x57",
//!       "tags": "ios"
//!     }
//!   ],
//!   "quality": 0.85,
//!   "optimize": { "optipng": "-o2", "jpgtran": "-copy none" }
//! }
//! ```
//!
//! An optional `config-local.json` next to the config file is shallow-merged
//! over it (top-level keys replace), letting machine-specific settings like
//! `basePath` stay out of version control.
//!
//! ## Comment entries
//!
//! JSON has no comments, so array entries in `images`/`aliases` that are
//! not objects are treated as comments and dropped. Object entries are
//! validated strictly — unknown keys are rejected to catch typos early.
//!
//! ## Normalization
//!
//! Loading produces an immutable [`Config`] with all defaults applied:
//! per-image values merged with the global ones, tag sets and alias values
//! in canonical list form, resolutions parsed, and alias definitions that
//! reference other aliases fully expanded (a cycle is a load error, see
//! [`ConfigError::CircularAlias`]).

use crate::alias::{self, AliasDef};
use crate::imaging::params::{Quality, Resolution, TransformOptions};
use crate::paths;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the local override file searched next to the config file.
const LOCAL_CONFIG_FILENAME: &str = "config-local.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    Missing(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config root must be a JSON object")]
    NotAnObject,
    #[error("invalid images[] entry: {0}")]
    Image(serde_json::Error),
    #[error("invalid aliases[] entry: {0}")]
    Alias(serde_json::Error),
    #[error("alias {0:?} has no values")]
    EmptyAlias(String),
    #[error("invalid resolution {0:?} (expected \"WxH\" or \"WxH!\")")]
    InvalidResolution(String),
    #[error("roundCorners must be a corner fraction or false")]
    InvalidRoundCorners,
    #[error("circular alias reference involving {0:?}")]
    CircularAlias(String),
}

/// Settings supplied on the command line, merged over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Active tags; empty means "use the config's tags".
    pub tags: Vec<String>,
    /// Extra aliases, appended after the config-declared ones.
    pub aliases: Vec<AliasDef>,
}

/// Fully normalized configuration, immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute directory all relative config paths are anchored at.
    pub base_path: PathBuf,
    pub images: Vec<ImageSpec>,
    pub aliases: Vec<AliasDef>,
    pub active_tags: BTreeSet<String>,
    pub optimizers: OptimizerConfig,
}

/// Flag strings for the post-resize optimizers. `None` disables the tool.
#[derive(Debug, Clone, Default)]
pub struct OptimizerConfig {
    pub optipng: Option<String>,
    pub jpegtran: Option<String>,
}

/// One image entry with all global defaults merged in.
#[derive(Debug, Clone)]
pub struct ImageSpec {
    /// Template: may contain alias tokens and/or a glob pattern.
    pub source_path: String,
    /// Template: may contain alias tokens and a trailing `*.ext` wildcard.
    pub target_path: String,
    pub resolution: Resolution,
    pub tags: BTreeSet<String>,
    pub quality: Quality,
    pub proportional: bool,
    pub round_corners: Option<f64>,
    pub optimize: bool,
    pub options: TransformOptions,
    pub pre_params: Option<String>,
    pub post_params: Option<String>,
}

/// Load, merge and normalize the configuration.
pub fn load(
    config_path: &Path,
    local_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<Config, ConfigError> {
    let merged = read_merged(config_path, local_path)?;
    normalize(merged, config_path, overrides)
}

/// Read the config file and shallow-merge the local override file over it.
///
/// The main file is required; the local file is optional and defaults to
/// `config-local.json` in the same directory.
pub fn read_merged(config_path: &Path, local_path: Option<&Path>) -> Result<Value, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::Missing(config_path.to_path_buf()));
    }
    let mut root: Value = serde_json::from_str(&fs::read_to_string(config_path)?)?;
    if !root.is_object() {
        return Err(ConfigError::NotAnObject);
    }

    let local = match local_path {
        Some(path) => path.to_path_buf(),
        None => config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(LOCAL_CONFIG_FILENAME),
    };
    if local.exists() {
        let overlay: Value = serde_json::from_str(&fs::read_to_string(&local)?)?;
        let Value::Object(overlay) = overlay else {
            return Err(ConfigError::NotAnObject);
        };
        if let Value::Object(base) = &mut root {
            for (key, value) in overlay {
                base.insert(key, value);
            }
        }
    }

    Ok(root)
}

/// Normalize a merged config value into a [`Config`].
pub fn normalize(
    value: Value,
    config_path: &Path,
    overrides: &CliOverrides,
) -> Result<Config, ConfigError> {
    let raw: RawConfig = serde_json::from_value(value)?;

    let base_path = resolve_base_path(raw.base_path.as_deref(), config_path)?;

    let active_tags = if !overrides.tags.is_empty() {
        overrides.tags.iter().cloned().collect()
    } else {
        match raw.tags {
            Some(tags) => tags.split_csv().into_iter().collect(),
            None => BTreeSet::from(["all".to_string()]),
        }
    };

    let mut aliases = Vec::new();
    for entry in raw.aliases {
        // Non-object entries are comments.
        if !entry.is_object() {
            continue;
        }
        let raw_alias: RawAlias = serde_json::from_value(entry).map_err(ConfigError::Alias)?;
        let values = raw_alias.value.into_list();
        if values.is_empty() {
            return Err(ConfigError::EmptyAlias(raw_alias.name));
        }
        aliases.push(AliasDef {
            name: raw_alias.name,
            values,
        });
    }
    aliases.extend(overrides.aliases.iter().cloned());
    resolve_alias_references(&mut aliases)?;

    let mut images = Vec::new();
    for entry in raw.images {
        if !entry.is_object() {
            continue;
        }
        let image: RawImage = serde_json::from_value(entry).map_err(ConfigError::Image)?;

        let resolution = Resolution::parse(&image.resolution)
            .ok_or_else(|| ConfigError::InvalidResolution(image.resolution.clone()))?;

        let round_corners = match image.round_corners {
            Some(value) => value.into_fraction()?,
            None => match raw.round_corners {
                Some(value) => value.into_fraction()?,
                None => None,
            },
        };

        images.push(ImageSpec {
            source_path: image.source_path,
            target_path: image.target_path,
            resolution,
            tags: match image.tags {
                Some(tags) => tags.split_csv().into_iter().collect(),
                None => BTreeSet::from(["all".to_string()]),
            },
            quality: image
                .quality
                .or(raw.quality)
                .map(Quality::from_fraction)
                .unwrap_or_default(),
            proportional: image.proportional.or(raw.proportional).unwrap_or(false),
            round_corners,
            optimize: image.optimize.map(|flag| flag.enabled()).unwrap_or(true),
            options: image.options.unwrap_or_default(),
            pre_params: image
                .pre_image_magic_parameters
                .or_else(|| raw.pre_image_magic_parameters.clone()),
            post_params: image
                .image_magic_parameters
                .or_else(|| raw.image_magic_parameters.clone()),
        });
    }

    Ok(Config {
        base_path,
        images,
        aliases,
        active_tags,
        optimizers: raw
            .optimize
            .map(RawOptimize::into_config)
            .unwrap_or_default(),
    })
}

/// Default base path is the config file's directory; either way the result
/// is absolutized against the current working directory and normalized.
fn resolve_base_path(
    configured: Option<&str>,
    config_path: &Path,
) -> Result<PathBuf, ConfigError> {
    let base = match configured {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let absolute = if base.is_absolute() {
        base
    } else {
        std::env::current_dir()?.join(base)
    };
    Ok(PathBuf::from(paths::normalize(
        &absolute.display().to_string(),
    )))
}

/// Expand alias definitions that reference other aliases.
///
/// Each pass substitutes one level of references (against a snapshot, so
/// ordering in the alias list does not matter). An acyclic definition graph
/// stabilizes within `aliases.len()` passes. Cycles are rejected up front
/// via the dependency graph; definitions that keep reintroducing tokens
/// (a self-referential value pulled in by another alias) are caught by the
/// pass bound.
fn resolve_alias_references(aliases: &mut Vec<AliasDef>) -> Result<(), ConfigError> {
    if let Some(name) = alias_cycle(aliases) {
        return Err(ConfigError::CircularAlias(name));
    }
    for _ in 0..aliases.len() {
        if !references_remain(aliases) {
            return Ok(());
        }
        let snapshot = aliases.clone();
        for (index, def) in aliases.iter_mut().enumerate() {
            let others: Vec<AliasDef> = snapshot
                .iter()
                .enumerate()
                .filter(|(other_index, _)| *other_index != index)
                .map(|(_, other)| other.clone())
                .collect();
            def.values = def
                .values
                .iter()
                .flat_map(|value| alias::resolve(value, &others))
                .collect();
        }
    }
    if let Some(def) = aliases.iter().find(|def| references_other(def, aliases)) {
        return Err(ConfigError::CircularAlias(def.name.clone()));
    }
    Ok(())
}

/// Find a reference cycle between distinct aliases, returning the name of
/// one alias on the cycle. A value containing the alias's *own* token is
/// not an edge — it stays literal.
fn alias_cycle(aliases: &[AliasDef]) -> Option<String> {
    let edges: Vec<Vec<usize>> = aliases
        .iter()
        .map(|def| {
            aliases
                .iter()
                .enumerate()
                .filter(|(_, other)| {
                    other.name != def.name
                        && def.values.iter().any(|value| value.contains(&other.name))
                })
                .map(|(index, _)| index)
                .collect()
        })
        .collect();

    // Three-color depth-first search: 0 unvisited, 1 in progress, 2 done.
    fn dfs(node: usize, edges: &[Vec<usize>], state: &mut [u8]) -> Option<usize> {
        state[node] = 1;
        for &next in &edges[node] {
            match state[next] {
                1 => return Some(next),
                0 => {
                    if let Some(hit) = dfs(next, edges, state) {
                        return Some(hit);
                    }
                }
                _ => {}
            }
        }
        state[node] = 2;
        None
    }

    let mut state = vec![0u8; aliases.len()];
    for start in 0..aliases.len() {
        if state[start] == 0 {
            if let Some(hit) = dfs(start, &edges, &mut state) {
                return Some(aliases[hit].name.clone());
            }
        }
    }
    None
}

fn references_remain(aliases: &[AliasDef]) -> bool {
    aliases.iter().any(|def| references_other(def, aliases))
}

/// Does any of `def`'s values still contain another alias's token?
/// (A value containing the alias's *own* token stays literal.)
fn references_other(def: &AliasDef, aliases: &[AliasDef]) -> bool {
    def.values.iter().any(|value| {
        aliases
            .iter()
            .any(|other| other.name != def.name && value.contains(&other.name))
    })
}

// ============================================================================
// Raw (on-disk) representation
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct RawConfig {
    base_path: Option<String>,
    tags: Option<StringOrSeq>,
    images: Vec<Value>,
    aliases: Vec<Value>,
    proportional: Option<bool>,
    quality: Option<f64>,
    round_corners: Option<RawRoundCorners>,
    optimize: Option<RawOptimize>,
    image_magic_parameters: Option<String>,
    pre_image_magic_parameters: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAlias {
    name: String,
    value: StringOrSeq,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawImage {
    source_path: String,
    target_path: String,
    resolution: String,
    tags: Option<StringOrSeq>,
    quality: Option<f64>,
    proportional: Option<bool>,
    round_corners: Option<RawRoundCorners>,
    optimize: Option<RawFlag>,
    options: Option<TransformOptions>,
    image_magic_parameters: Option<String>,
    pre_image_magic_parameters: Option<String>,
}

/// A value that may be a bare string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StringOrSeq {
    One(String),
    Many(Vec<String>),
}

impl StringOrSeq {
    /// Coerce to a list without splitting (alias values).
    fn into_list(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }

    /// Coerce to a list, splitting a bare string on commas (tag lists).
    fn split_csv(self) -> Vec<String> {
        match self {
            Self::One(value) => value.split(',').map(str::to_string).collect(),
            Self::Many(values) => values,
        }
    }
}

/// `true`/`false` or the string forms the original config dialect allowed.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Text(String),
}

impl RawFlag {
    fn enabled(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Text(text) => text != "false",
        }
    }
}

/// `roundCorners` is a corner fraction, or `false` to switch it off
/// (distinct from absent, which inherits the global setting).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RawRoundCorners {
    Fraction(f64),
    Toggle(bool),
}

impl RawRoundCorners {
    fn into_fraction(self) -> Result<Option<f64>, ConfigError> {
        match self {
            Self::Fraction(value) => Ok(Some(value)),
            Self::Toggle(false) => Ok(None),
            Self::Toggle(true) => Err(ConfigError::InvalidRoundCorners),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptimize {
    optipng: Option<RawOptimizerFlags>,
    jpgtran: Option<RawOptimizerFlags>,
}

impl RawOptimize {
    fn into_config(self) -> OptimizerConfig {
        OptimizerConfig {
            optipng: self.optipng.and_then(RawOptimizerFlags::into_flags),
            jpegtran: self.jpgtran.and_then(RawOptimizerFlags::into_flags),
        }
    }
}

/// Optimizer entry: a flags string, `true` (enabled, no flags) or `false`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawOptimizerFlags {
    Flags(String),
    Toggle(bool),
}

impl RawOptimizerFlags {
    fn into_flags(self) -> Option<String> {
        match self {
            Self::Flags(flags) => Some(flags),
            Self::Toggle(true) => Some(String::new()),
            Self::Toggle(false) => None,
        }
    }
}

//! Task resolution — from image entries to concrete source/target pairs.
//!
//! This is the stage between config normalization and execution. For every
//! image entry that survives the tag filter it:
//!
//! 1. expands alias tokens in the source and target templates,
//! 2. pairs the results into the cartesian product of concrete paths,
//! 3. matches each pair's source against the filesystem with glob
//!    semantics (case-insensitive, matches resolved to real paths),
//! 4. rewrites a trailing `*.ext` wildcard in the target from the matched
//!    file's basename.
//!
//! Entries are resolved in parallel, but all results are joined in entry
//! order regardless of individual failures — a pattern that matches
//! nothing or fails to read just contributes zero tasks and a warning,
//! never aborts the batch. Execution downstream is strictly sequential;
//! only this resolution stage fans out.

use crate::alias;
use crate::config::{Config, ImageSpec};
use crate::imaging::params::{Quality, Resolution, TransformOptions};
use crate::paths::{self, PathPair};
use glob::MatchOptions;
use rayon::prelude::*;
use std::path::PathBuf;

/// A fully concrete, executable resize unit.
///
/// Both paths are absolute; the source exists at resolution time (it was a
/// glob match). Tasks are created fresh per run and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTask {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub resolution: Resolution,
    pub quality: Quality,
    pub proportional: bool,
    pub round_corners: Option<f64>,
    pub optimize: bool,
    pub options: TransformOptions,
    pub pre_params: Option<String>,
    pub post_params: Option<String>,
}

/// Everything the resolution stage produced.
#[derive(Debug, Default)]
pub struct ResolvedBatch {
    /// Tasks in config order (entry, then source variant, then glob match).
    pub tasks: Vec<ImageTask>,
    /// Non-fatal problems: patterns without matches, unreadable paths.
    pub warnings: Vec<String>,
    /// Image entries excluded by the tag filter.
    pub filtered_out: usize,
}

/// Resolve all image entries of a config into concrete tasks.
pub fn resolve_tasks(config: &Config) -> ResolvedBatch {
    let (active, filtered): (Vec<&ImageSpec>, Vec<&ImageSpec>) = config
        .images
        .iter()
        .partition(|spec| !spec.tags.is_disjoint(&config.active_tags));

    let per_image: Vec<(Vec<ImageTask>, Vec<String>)> = active
        .par_iter()
        .map(|spec| expand_image(spec, config))
        .collect();

    let mut batch = ResolvedBatch {
        filtered_out: filtered.len(),
        ..Default::default()
    };
    for (tasks, warnings) in per_image {
        batch.tasks.extend(tasks);
        batch.warnings.extend(warnings);
    }
    batch
}

/// Expand one image entry into tasks: aliases → pairs → glob.
fn expand_image(spec: &ImageSpec, config: &Config) -> (Vec<ImageTask>, Vec<String>) {
    let sources = alias::resolve(&spec.source_path, &config.aliases);
    let targets = alias::resolve(&spec.target_path, &config.aliases);
    let pairs = paths::pair_paths(&sources, &targets, &config.base_path);

    let mut tasks = Vec::new();
    let mut warnings = Vec::new();
    for pair in &pairs {
        expand_pair(pair, spec, &mut tasks, &mut warnings);
    }
    (tasks, warnings)
}

/// Match one pair's source against the filesystem.
fn expand_pair(
    pair: &PathPair,
    spec: &ImageSpec,
    tasks: &mut Vec<ImageTask>,
    warnings: &mut Vec<String>,
) {
    // Glob patterns use forward slashes on every platform.
    let pattern = pair.source.replace('\\', "/");
    let options = MatchOptions {
        case_sensitive: false,
        // `*` must not cross directory boundaries (`**` does).
        require_literal_separator: true,
        // Dotfiles are only matched when spelled out.
        require_literal_leading_dot: true,
    };

    let entries = match glob::glob_with(&pattern, options) {
        Ok(entries) => entries,
        Err(error) => {
            warnings.push(format!("invalid source pattern {:?}: {}", pair.source, error));
            return;
        }
    };

    let mut matched = 0usize;
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(error) => {
                warnings.push(format!("skipping unreadable match: {error}"));
                continue;
            }
        };
        // Symlinks are resolved so downstream sees filesystem-real paths.
        let real = match std::fs::canonicalize(&path) {
            Ok(real) => real,
            Err(error) => {
                warnings.push(format!(
                    "skipping {}: cannot resolve real path: {error}",
                    path.display()
                ));
                continue;
            }
        };
        matched += 1;

        let target = paths::rewrite_wildcard_target(&pair.target, &real)
            .unwrap_or_else(|| pair.target.clone());

        tasks.push(ImageTask {
            source_path: real,
            target_path: PathBuf::from(target),
            resolution: spec.resolution,
            quality: spec.quality,
            proportional: spec.proportional,
            round_corners: spec.round_corners,
            optimize: spec.optimize,
            options: spec.options.clone(),
            pre_params: spec.pre_params.clone(),
            post_params: spec.post_params.clone(),
        });
    }

    if matched == 0 {
        warnings.push(format!("source pattern {:?} matched no files", pair.source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasDef;
    use crate::config::OptimizerConfig;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn spec(source: &str, target: &str) -> ImageSpec {
        ImageSpec {
            source_path: source.to_string(),
            target_path: target.to_string(),
            resolution: Resolution::parse("57x57").unwrap(),
            tags: BTreeSet::from(["all".to_string()]),
            quality: Quality::default(),
            proportional: false,
            round_corners: None,
            optimize: true,
            options: TransformOptions::default(),
            pre_params: None,
            post_params: None,
        }
    }

    fn config_at(base: &Path) -> Config {
        Config {
            base_path: base.to_path_buf(),
            images: Vec::new(),
            aliases: Vec::new(),
            active_tags: BTreeSet::from(["all".to_string()]),
            optimizers: OptimizerConfig::default(),
        }
    }

    /// Canonicalized tempdir (macOS tempdirs sit behind a symlink).
    fn real_tempdir(tmp: &TempDir) -> PathBuf {
        tmp.path().canonicalize().unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn literal_source_resolves_to_one_task() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("icon.png"));

        let mut config = config_at(&base);
        config.images = vec![spec("icon.png", "out/icon.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 1);
        assert!(batch.warnings.is_empty());
        assert_eq!(batch.tasks[0].source_path, base.join("icon.png"));
        assert_eq!(batch.tasks[0].target_path, base.join("out/icon.png"));
    }

    #[test]
    fn glob_source_yields_one_task_per_match() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("art/icon-60.png"));
        touch(&base.join("art/icon-120.png"));
        touch(&base.join("art/readme.txt"));

        let mut config = config_at(&base);
        config.images = vec![spec("art/icon-*.png", "out/*.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 2);
        // Glob matches come back sorted; wildcard targets follow the
        // matched basenames.
        assert_eq!(batch.tasks[0].target_path, base.join("out/icon-120.png"));
        assert_eq!(batch.tasks[1].target_path, base.join("out/icon-60.png"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("Icon.PNG"));

        let mut config = config_at(&base);
        config.images = vec![spec("*.png", "out/flat.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 1);
        assert_eq!(batch.tasks[0].source_path, base.join("Icon.PNG"));
    }

    #[test]
    fn target_without_wildcard_is_used_verbatim_for_every_match() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("a.png"));
        touch(&base.join("b.png"));

        let mut config = config_at(&base);
        config.images = vec![spec("*.png", "out/single.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(batch.tasks[0].target_path, batch.tasks[1].target_path);
    }

    #[test]
    fn unmatched_pattern_warns_and_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);

        let mut config = config_at(&base);
        config.images = vec![spec("missing.png", "out/missing.png")];

        let batch = resolve_tasks(&config);
        assert!(batch.tasks.is_empty());
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].contains("matched no files"));
    }

    #[test]
    fn tag_filter_excludes_non_intersecting_entries() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("icon.png"));

        let mut tagged = spec("icon.png", "out/a.png");
        tagged.tags = BTreeSet::from(["ios".to_string(), "retina".to_string()]);
        let untagged = spec("icon.png", "out/b.png");

        let mut config = config_at(&base);
        config.images = vec![tagged, untagged];

        // Active "all": the explicitly tagged entry does not intersect.
        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 1);
        assert_eq!(batch.filtered_out, 1);
        assert_eq!(batch.tasks[0].target_path, base.join("out/b.png"));

        // Active "ios": only the tagged entry runs.
        config.active_tags = BTreeSet::from(["ios".to_string()]);
        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 1);
        assert_eq!(batch.tasks[0].target_path, base.join("out/a.png"));
    }

    #[test]
    fn aliases_fan_out_into_task_per_combination() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("art/en/icon.png"));
        touch(&base.join("art/de/icon.png"));

        let mut config = config_at(&base);
        config.aliases = vec![AliasDef::new("<lang>", &["en", "de"])];
        config.images = vec![spec("art/<lang>/icon.png", "out/<lang>/icon.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 2);
        assert_eq!(batch.tasks[0].source_path, base.join("art/en/icon.png"));
        assert_eq!(batch.tasks[0].target_path, base.join("out/en/icon.png"));
        assert_eq!(batch.tasks[1].target_path, base.join("out/de/icon.png"));
    }

    #[test]
    fn alias_combination_missing_on_disk_warns_but_keeps_others() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("art/en/icon.png"));

        let mut config = config_at(&base);
        config.aliases = vec![AliasDef::new("<lang>", &["en", "de"])];
        config.images = vec![spec("art/<lang>/icon.png", "out/<lang>/icon.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 1);
        assert_eq!(batch.warnings.len(), 1);
        assert!(batch.warnings[0].contains("matched no files"));
    }

    #[test]
    fn entry_order_is_preserved_across_parallel_resolution() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        for name in ["a.png", "b.png", "c.png", "d.png"] {
            touch(&base.join(name));
        }

        let mut config = config_at(&base);
        config.images = ["a.png", "b.png", "c.png", "d.png"]
            .iter()
            .map(|name| spec(name, &format!("out/{name}")))
            .collect();

        let batch = resolve_tasks(&config);
        let targets: Vec<_> = batch
            .tasks
            .iter()
            .map(|t| t.target_path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(targets, vec!["a.png", "b.png", "c.png", "d.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_sources_resolve_to_real_paths() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("real/icon.png"));
        std::os::unix::fs::symlink(base.join("real"), base.join("link")).unwrap();

        let mut config = config_at(&base);
        config.images = vec![spec("link/icon.png", "out/icon.png")];

        let batch = resolve_tasks(&config);
        assert_eq!(batch.tasks.len(), 1);
        assert_eq!(batch.tasks[0].source_path, base.join("real/icon.png"));
    }

    #[test]
    fn resolution_is_repeatable() {
        let tmp = TempDir::new().unwrap();
        let base = real_tempdir(&tmp);
        touch(&base.join("art/icon-60.png"));
        touch(&base.join("art/icon-120.png"));

        let mut config = config_at(&base);
        config.aliases = vec![AliasDef::new("<d>", &["60", "120"])];
        config.images = vec![spec("art/icon-<d>.png", "out/<d>/*.png")];

        let first = resolve_tasks(&config);
        let second = resolve_tasks(&config);
        assert_eq!(first.tasks, second.tasks);
    }
}

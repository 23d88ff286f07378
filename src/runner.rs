//! Sequential execution of resolved image tasks.
//!
//! Tasks run strictly one at a time: a single external process is in
//! flight at any moment, so console output stays in task order and the
//! external tools are never hammered with parallel invocations. Failures
//! follow best-effort batch semantics: a broken task is recorded and the
//! batch moves on. Only target-directory creation aborts the run, since it
//! signals a misconfigured target tree rather than one bad image.
//!
//! Already-written target files are never rolled back when a later task
//! fails.

use crate::config::{Config, OptimizerConfig};
use crate::imaging::magick::{extension_lowercase, is_jpeg_target};
use crate::imaging::params::{OptimizeRequest, Optimizer, ResizeRequest, Resolution};
use crate::imaging::ImageBackend;
use crate::resolve::ImageTask;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("could not create target directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What happened to a single task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskStatus {
    /// Resize (and optimization, where applicable) succeeded.
    Created,
    /// Source file disappeared between resolution and execution.
    MissingSource,
    /// The resize process failed; nothing usable was written.
    ResizeFailed(String),
    /// Resize succeeded but the optimizer failed — the unoptimized target
    /// file is in place.
    OptimizeFailed(String),
}

#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub source: PathBuf,
    pub target: PathBuf,
    pub resolution: Resolution,
    pub status: TaskStatus,
}

/// Result of running a batch: one outcome per task, in task order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
    pub warnings: Vec<String>,
}

impl BatchReport {
    /// Targets written, including those whose optimizer pass failed.
    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(o.status, TaskStatus::Created | TaskStatus::OptimizeFailed(_))
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.created()
    }
}

/// Run all tasks in order against the given backend.
pub fn run_batch(
    tasks: &[ImageTask],
    config: &Config,
    backend: &impl ImageBackend,
) -> Result<BatchReport, RunError> {
    let mut report = BatchReport::default();

    for task in tasks {
        if let Some(parent) = task.target_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| RunError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let status = run_task(task, config, backend, &mut report.warnings);
        report.outcomes.push(TaskOutcome {
            source: task.source_path.clone(),
            target: task.target_path.clone(),
            resolution: task.resolution,
            status,
        });
    }

    Ok(report)
}

fn run_task(
    task: &ImageTask,
    config: &Config,
    backend: &impl ImageBackend,
    warnings: &mut Vec<String>,
) -> TaskStatus {
    if !task.source_path.exists() {
        return TaskStatus::MissingSource;
    }

    if task.round_corners.is_some_and(|f| f > 0.001) && is_jpeg_target(&task.target_path) {
        warnings.push(format!(
            "JPEG does not support transparency, round corners skipped for {}",
            task.target_path.display()
        ));
    }

    let request = ResizeRequest {
        source: task.source_path.clone(),
        target: task.target_path.clone(),
        resolution: task.resolution,
        proportional: task.proportional,
        quality: task.quality,
        round_corners: task.round_corners,
        options: task.options.clone(),
        pre_params: task.pre_params.clone(),
        post_params: task.post_params.clone(),
        working_dir: config.base_path.clone(),
    };
    if let Err(error) = backend.resize(&request) {
        return TaskStatus::ResizeFailed(error.to_string());
    }

    if task.optimize {
        if let Some((optimizer, flags)) = optimizer_for(&task.target_path, &config.optimizers) {
            let request = OptimizeRequest {
                target: task.target_path.clone(),
                optimizer,
                flags,
            };
            if let Err(error) = backend.optimize(&request) {
                return TaskStatus::OptimizeFailed(error.to_string());
            }
        }
    }

    TaskStatus::Created
}

/// Pick the optimizer for a target file, if one is configured for its
/// format.
fn optimizer_for(target: &Path, optimizers: &OptimizerConfig) -> Option<(Optimizer, String)> {
    match extension_lowercase(target).as_str() {
        "png" => optimizers
            .optipng
            .clone()
            .map(|flags| (Optimizer::Optipng, flags)),
        "jpg" | "jpeg" => optimizers
            .jpegtran
            .clone()
            .map(|flags| (Optimizer::Jpegtran, flags)),
        _ => None,
    }
}

//! ImageMagick / optimizer subprocess backend.
//!
//! All pixel work is delegated to external binaries: ImageMagick's
//! `convert` for resizing and `optipng`/`jpegtran` for post-resize
//! optimization. This module owns the argument-list construction (pure
//! functions, unit-tested without the binaries) and the actual process
//! invocation.
//!
//! ## Round corners
//!
//! Rounded corners are produced by compositing an alpha clip mask: a black
//! polygon + white circle drawn into one corner, mirrored to the other
//! three with `-flip`/`-flop`, multiplied together and applied with
//! `CopyOpacity`. The radius is `min(W, H) * 0.5 * round_corners`. JPEG
//! targets cannot carry the mask (no alpha channel), so it is skipped for
//! them.

use super::backend::{BackendError, ImageBackend};
use super::params::{OptimizeRequest, Optimizer, ResizeRequest};
use std::path::Path;
use std::process::Command;

/// Production backend shelling out to `convert`, `optipng` and `jpegtran`.
pub struct MagickBackend {
    convert_command: String,
}

impl MagickBackend {
    pub fn new() -> Self {
        Self {
            convert_command: "convert".to_string(),
        }
    }
}

impl Default for MagickBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for MagickBackend {
    fn resize(&self, request: &ResizeRequest) -> Result<(), BackendError> {
        let args = convert_args(request);
        run_tool(&self.convert_command, &args, Some(&request.working_dir))
    }

    fn optimize(&self, request: &OptimizeRequest) -> Result<(), BackendError> {
        let args = optimize_args(request);
        run_tool(request.optimizer.command(), &args, None)
    }
}

/// True for target formats without an alpha channel.
pub fn is_jpeg_target(path: &Path) -> bool {
    matches!(
        extension_lowercase(path).as_str(),
        "jpg" | "jpeg"
    )
}

/// Lowercased file extension, empty when absent.
pub fn extension_lowercase(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Build the full `convert` argument list for a resize request.
///
/// Argument order: source, pre-passthrough params, resize geometry,
/// quality, round-corner mask, typed transforms, post-passthrough params,
/// target.
pub fn convert_args(request: &ResizeRequest) -> Vec<String> {
    let mut args = vec![request.source.display().to_string()];

    if let Some(pre) = &request.pre_params {
        args.extend(pre.split_whitespace().map(str::to_string));
    }

    args.extend(["-resize".to_string(), request.geometry()]);
    args.extend(["-quality".to_string(), request.quality.value().to_string()]);

    if let Some(fraction) = request.round_corners {
        if fraction > 0.001 && !is_jpeg_target(&request.target) {
            args.extend(round_corner_args(
                request.resolution.width,
                request.resolution.height,
                fraction,
            ));
        }
    }

    args.extend(request.options.to_args());

    if let Some(post) = &request.post_params {
        args.extend(post.split_whitespace().map(str::to_string));
    }

    args.push(request.target.display().to_string());
    args
}

/// The alpha clip-mask compositing sequence for rounded corners.
fn round_corner_args(width: u32, height: u32, fraction: f64) -> Vec<String> {
    let radius = f64::from(width.min(height)) * 0.5 * fraction;
    let draw = format!(
        "fill black polygon 0,0 0,{radius} {radius},0 fill white circle {radius},{radius} {radius},0"
    );
    [
        "(", "+clone", "-alpha", "extract",
        "-draw", draw.as_str(),
        "(", "+clone", "-flip", ")", "-compose", "Multiply", "-composite",
        "(", "+clone", "-flop", ")", "-compose", "Multiply", "-composite",
        ")", "-alpha", "off", "-compose", "CopyOpacity", "-composite",
        "-filter", "cubic",
        "-define", "filter:b=0",
        "-define", "filter:c=2.2",
        "-define", "filter:blur=1.05",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Build the optimizer argument list: user flags, then the in-place
/// output/input pair in each tool's own dialect.
pub fn optimize_args(request: &OptimizeRequest) -> Vec<String> {
    let target = request.target.display().to_string();
    let mut args: Vec<String> = request
        .flags
        .split_whitespace()
        .map(str::to_string)
        .collect();
    match request.optimizer {
        Optimizer::Optipng => args.extend(["-out".to_string(), target.clone(), target]),
        Optimizer::Jpegtran => args.extend(["-outfile".to_string(), target.clone(), target]),
    }
    args
}

/// Run an external tool, capturing output and mapping non-zero exits to
/// [`BackendError::CommandFailed`].
fn run_tool(program: &str, args: &[String], dir: Option<&Path>) -> Result<(), BackendError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let output = cmd.output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(BackendError::CommandFailed {
            tool: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

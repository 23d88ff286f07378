//! Image processing backend trait and shared error type.
//!
//! The [`ImageBackend`] trait defines the two operations the task runner
//! needs: resize and optimize. The production implementation is
//! [`MagickBackend`](super::magick::MagickBackend), which shells out to
//! ImageMagick `convert` and the `optipng`/`jpegtran` optimizers. Tests use
//! the recording [`MockBackend`](tests::MockBackend).

use super::params::{OptimizeRequest, ResizeRequest};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} failed (exit {code}): {stderr}")]
    CommandFailed {
        tool: String,
        code: i32,
        stderr: String,
    },
}

/// Trait for image processing backends.
///
/// Both operations write their result to the request's target path; the
/// caller owns directory creation and existence checks.
pub trait ImageBackend: Sync {
    /// Resize a source image to the requested geometry.
    fn resize(&self, request: &ResizeRequest) -> Result<(), BackendError>;

    /// Run a lossless optimizer over an already-written target file.
    fn optimize(&self, request: &OptimizeRequest) -> Result<(), BackendError>;
}

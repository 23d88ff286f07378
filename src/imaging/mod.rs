//! Imaging layer — all pixel work happens in external tools.
//!
//! | Operation | Tool |
//! |---|---|
//! | **Resize** | ImageMagick `convert` (resize, quality, corner mask, transforms) |
//! | **PNG optimization** | `optipng` |
//! | **JPEG optimization** | `jpegtran` |
//!
//! The module is split into:
//! - **Parameters**: data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait (+ recording mock for tests)
//! - **Magick**: argument construction and subprocess invocation

pub mod backend;
pub mod magick;
pub mod params;

pub use backend::{BackendError, ImageBackend};
pub use magick::MagickBackend;
pub use params::{
    OptimizeRequest, Optimizer, Quality, Resolution, ResizeRequest, TransformOptions,
};

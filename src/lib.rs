//! # iconmill
//!
//! A batch image resizer for generating platform icon and asset sets
//! (iOS/Android launcher icons, splash screens, store assets) from a JSON
//! configuration. Your config is the data source: image entries declare a
//! source template, a target template and a resolution; aliases and glob
//! patterns fan one entry out into a whole asset set.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Load      config.json (+ config-local.json)  →  Config
//! 2. Resolve   Config  →  Vec<ImageTask>   (aliases × paths × glob)
//! 3. Run       tasks   →  resized/optimized files on disk
//! ```
//!
//! The stages are strictly separated:
//!
//! - **Load** is the only stage that can fail the run — everything
//!   downstream is best-effort per image.
//! - **Resolve** is pure path logic over the config plus read-only glob
//!   matching; it never writes anything.
//! - **Run** invokes the external tools one task at a time, so the output
//!   log stays in task order and only one subprocess is ever in flight.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | JSON config loading, local-override merge, normalization |
//! | [`alias`] | Placeholder token expansion (`<lang>`, `<density>`, ...) |
//! | [`paths`] | Source/target pairing, normalization, `*.ext` wildcard |
//! | [`resolve`] | Glob expansion and tag filtering into concrete tasks |
//! | [`runner`] | Sequential task execution with best-effort semantics |
//! | [`imaging`] | Backend trait + ImageMagick/optipng/jpegtran drivers |
//! | [`output`] | CLI output formatting for the pipeline stages |
//!
//! # Design Decisions
//!
//! ## External Tools Over In-Process Codecs
//!
//! All pixel work runs in ImageMagick `convert`, `optipng` and `jpegtran`
//! subprocesses. Icon sets lean on ImageMagick behavior that config
//! authors already know (geometry flags, `-draw` masks, parameter
//! passthrough), and the binaries are ubiquitous on the CI machines this
//! tool targets. The [`imaging::ImageBackend`] trait keeps the pipeline
//! testable without any of them installed.
//!
//! ## Deterministic Expansion Order
//!
//! Alias expansion is leftmost-occurrence-first and depth-first
//! ([`alias::resolve`]), pair generation is source-major, and glob matches
//! arrive sorted. Two runs over the same config and filesystem produce the
//! same task list in the same order — which makes batch logs diffable and
//! target overwrites reproducible.
//!
//! ## One Config Value, No Ambient State
//!
//! CLI flags are merged into the config exactly once
//! ([`config::CliOverrides`]); the resulting [`config::Config`] is
//! immutable and threaded through every stage as a parameter. The working
//! directory for external processes is scoped to each child via
//! `Command::current_dir`, never mutated on the tool's own process.

pub mod alias;
pub mod config;
pub mod imaging;
pub mod output;
pub mod paths;
pub mod resolve;
pub mod runner;

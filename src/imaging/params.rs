//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`runner`](crate::runner) (which decides what
//! images to create) and the [`backend`](super::backend) (which drives the
//! external tools). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing pipeline logic.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Build from the config's 0.0-1.0 fraction (0.75 → 75).
    pub fn from_fraction(fraction: f64) -> Self {
        Self::new((fraction * 100.0).round() as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Target pixel dimensions parsed from `"WxH"` or `"WxH!"`.
///
/// The `!` suffix marks exact resizing — the aspect ratio of the source is
/// ignored. Without it, exactness still applies unless the image entry asks
/// for proportional resizing (see [`ResizeRequest::geometry`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub exact: bool,
}

impl Resolution {
    /// Parse a resolution string. Exactly two numeric components are
    /// required; anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let (body, exact) = match text.strip_suffix('!') {
            Some(body) => (body, true),
            None => (text, false),
        };
        let (w, h) = body.split_once('x')?;
        if w.is_empty() || h.is_empty() || h.contains('x') {
            return None;
        }
        Some(Self {
            width: w.parse().ok()?,
            height: h.parse().ok()?,
            exact,
        })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.exact {
            write!(f, "!")?;
        }
        Ok(())
    }
}

/// Blur parameters: `-blur {radius}x{sigma}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlurParams {
    pub radius: f64,
    pub sigma: f64,
}

/// Sharpening parameters: `-sharpen {radius}x{sigma}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharpenParams {
    pub radius: f64,
    pub sigma: f64,
}

/// Extra per-image transforms, validated at config load.
///
/// This is the enumerated replacement for free-form tool parameters: every
/// supported transform has a typed shape, and unknown keys are rejected by
/// serde with a clear error instead of being passed through blindly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    pub flip: bool,
    pub flop: bool,
    pub grayscale: bool,
    pub strip: bool,
    pub rotate: Option<f64>,
    pub blur: Option<BlurParams>,
    pub sharpen: Option<SharpenParams>,
}

impl TransformOptions {
    /// Command-line arguments in a fixed emission order.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.flip {
            args.push("-flip".to_string());
        }
        if self.flop {
            args.push("-flop".to_string());
        }
        if self.grayscale {
            args.extend(["-colorspace".to_string(), "Gray".to_string()]);
        }
        if self.strip {
            args.push("-strip".to_string());
        }
        if let Some(degrees) = self.rotate {
            args.extend(["-rotate".to_string(), degrees.to_string()]);
        }
        if let Some(blur) = &self.blur {
            args.extend(["-blur".to_string(), format!("{}x{}", blur.radius, blur.sigma)]);
        }
        if let Some(sharpen) = &self.sharpen {
            args.extend([
                "-sharpen".to_string(),
                format!("{}x{}", sharpen.radius, sharpen.sigma),
            ]);
        }
        args
    }
}

/// Full specification of one resize invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeRequest {
    pub source: PathBuf,
    pub target: PathBuf,
    pub resolution: Resolution,
    /// When false, the target geometry is forced exact even without a `!`
    /// in the resolution.
    pub proportional: bool,
    pub quality: Quality,
    /// Corner radius as a fraction (0.0-1.0) of half the smaller target
    /// edge. Only meaningful for formats with an alpha channel.
    pub round_corners: Option<f64>,
    pub options: TransformOptions,
    /// Raw passthrough arguments inserted before the resize.
    pub pre_params: Option<String>,
    /// Raw passthrough arguments appended after all generated ones.
    pub post_params: Option<String>,
    /// Working directory for the external process (the config base path,
    /// so relative paths inside passthrough params resolve consistently).
    pub working_dir: PathBuf,
}

impl ResizeRequest {
    /// The geometry argument: `WxH!` unless the entry asked for
    /// proportional resizing and the resolution itself carries no `!`.
    pub fn geometry(&self) -> String {
        if self.resolution.exact || !self.proportional {
            format!("{}x{}!", self.resolution.width, self.resolution.height)
        } else {
            format!("{}x{}", self.resolution.width, self.resolution.height)
        }
    }
}

/// Which post-resize optimizer applies to a target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimizer {
    Optipng,
    Jpegtran,
}

impl Optimizer {
    pub fn command(self) -> &'static str {
        match self {
            Self::Optipng => "optipng",
            Self::Jpegtran => "jpegtran",
        }
    }
}

/// Full specification of one optimizer invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeRequest {
    pub target: PathBuf,
    pub optimizer: Optimizer,
    /// User-configured flags, whitespace-separated. May be empty.
    pub flags: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_from_fraction_rounds_to_percent() {
        assert_eq!(Quality::from_fraction(0.75).value(), 75);
        assert_eq!(Quality::from_fraction(0.999).value(), 100);
        assert_eq!(Quality::from_fraction(0.0).value(), 1);
    }

    #[test]
    fn quality_default_is_75() {
        assert_eq!(Quality::default().value(), 75);
    }

    #[test]
    fn resolution_parses_both_forms() {
        let plain = Resolution::parse("120x80").unwrap();
        assert_eq!((plain.width, plain.height, plain.exact), (120, 80, false));

        let exact = Resolution::parse("120x80!").unwrap();
        assert_eq!((exact.width, exact.height, exact.exact), (120, 80, true));
    }

    #[test]
    fn resolution_rejects_malformed_strings() {
        for bad in ["120", "120x", "x80", "120x80x2", "axb", "120x80!!", "120!x80"] {
            assert!(Resolution::parse(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn resolution_display_round_trips() {
        assert_eq!(Resolution::parse("57x57").unwrap().to_string(), "57x57");
        assert_eq!(Resolution::parse("57x57!").unwrap().to_string(), "57x57!");
    }

    #[test]
    fn geometry_forces_exact_unless_proportional() {
        let mut request = request_fixture();
        request.resolution = Resolution::parse("100x50").unwrap();
        request.proportional = false;
        assert_eq!(request.geometry(), "100x50!");

        request.proportional = true;
        assert_eq!(request.geometry(), "100x50");

        // A `!` in the resolution wins over proportional.
        request.resolution = Resolution::parse("100x50!").unwrap();
        assert_eq!(request.geometry(), "100x50!");
    }

    #[test]
    fn transform_options_emit_in_fixed_order() {
        let options = TransformOptions {
            flip: true,
            grayscale: true,
            rotate: Some(90.0),
            blur: Some(BlurParams { radius: 0.0, sigma: 2.0 }),
            ..Default::default()
        };
        assert_eq!(
            options.to_args(),
            vec!["-flip", "-colorspace", "Gray", "-rotate", "90", "-blur", "0x2"]
        );
    }

    #[test]
    fn empty_transform_options_emit_nothing() {
        assert!(TransformOptions::default().to_args().is_empty());
    }

    #[test]
    fn transform_options_reject_unknown_keys() {
        let result: Result<TransformOptions, _> =
            serde_json::from_str(r#"{"flip": true, "emboss": true}"#);
        assert!(result.is_err());
    }

    fn request_fixture() -> ResizeRequest {
        ResizeRequest {
            source: "in.png".into(),
            target: "out.png".into(),
            resolution: Resolution::parse("10x10").unwrap(),
            proportional: false,
            quality: Quality::default(),
            round_corners: None,
            options: TransformOptions::default(),
            pre_params: None,
            post_params: None,
            working_dir: ".".into(),
        }
    }
}

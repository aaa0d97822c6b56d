use std::collections::HashMap;

use thiserror::Error;

use crate::core::charset::{self, Charset};
use crate::core::color::{self, Rgb};
use crate::core::size::{self, DEFAULT_DIMENSION};

pub const MIN_MARGIN: u32 = 0;
pub const MAX_MARGIN: u32 = 50;
pub const MIN_QUIET_ZONE: u32 = 0;
pub const MAX_QUIET_ZONE: u32 = 100;
pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 600;
pub const DEFAULT_DPI: u32 = 96;

/// QR-standard error correction level.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorCorrection {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrection {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "L" => Some(ErrorCorrection::L),
            "M" => Some(ErrorCorrection::M),
            "Q" => Some(ErrorCorrection::Q),
            "H" => Some(ErrorCorrection::H),
            _ => None,
        }
    }
}

/// Requested output container. `jpg` is folded into `Jpeg`; both
/// spellings behave identically.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    Png,
    Gif,
    Jpeg,
    Svg,
    Eps,
}

impl OutputFormat {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "svg" => Some(OutputFormat::Svg),
            "eps" => Some(OutputFormat::Eps),
            _ => None,
        }
    }
}

/// Raster container actually produced. GIF requests are served as PNG:
/// the raster engine has no GIF writer, and the historical behavior is
/// to accept the format and substitute a PNG byte stream.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RasterFormat {
    Png,
    Gif,
    Jpeg,
}

/// Top-level rendering dispatch derived from the requested format.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderPlan {
    Svg,
    Eps,
    Raster(RasterFormat),
}

/// Target color resolution of raster output. Ignored for vector formats.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BitDepth {
    One,
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "1" => Some(BitDepth::One),
            "8" => Some(BitDepth::Eight),
            "16" => Some(BitDepth::Sixteen),
            "24" => Some(BitDepth::TwentyFour),
            "32" => Some(BitDepth::ThirtyTwo),
            _ => None,
        }
    }
}

/// Fully validated, fully defaulted rendering configuration. Constructed
/// once per request by [`validate`]; the pipeline never reads the raw
/// parameter bag again.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// Payload bytes, already charset-converted. Never empty.
    pub payload: Vec<u8>,
    /// True when charset conversion fell back to the original bytes.
    pub charset_degraded: bool,
    /// Square side length in pixels, 10..=1000.
    pub dimension: u32,
    pub error_correction: ErrorCorrection,
    pub foreground: Rgb,
    pub background: Rgb,
    /// Pixel padding added around the finished raster image, 0..=50.
    pub margin_px: u32,
    /// Quiet zone width in module units, 0..=100.
    pub quiet_zone: u32,
    pub format: OutputFormat,
    pub bit_depth: BitDepth,
    pub dpi: u32,
    pub optimize: bool,
}

impl RenderRequest {
    pub fn plan(&self) -> RenderPlan {
        match self.format {
            OutputFormat::Svg => RenderPlan::Svg,
            OutputFormat::Eps => RenderPlan::Eps,
            OutputFormat::Png => RenderPlan::Raster(RasterFormat::Png),
            OutputFormat::Gif => RenderPlan::Raster(RasterFormat::Gif),
            OutputFormat::Jpeg => RenderPlan::Raster(RasterFormat::Jpeg),
        }
    }
}

/// Client-caused parameter failure. The `Display` output is the
/// user-facing 400 message and names the offending parameter together
/// with the expected grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter `data`")]
    MissingData,
    #[error("invalid `size` parameter: expected `WxH` with equal sides between 10 and 1000, got `{0}`")]
    InvalidSize(String),
    #[error("invalid `color` parameter: expected 3 or 6 hex digits or `R-G-B` decimals 0-255, got `{0}`")]
    InvalidColor(String),
    #[error("invalid `bgcolor` parameter: expected 3 or 6 hex digits or `R-G-B` decimals 0-255, got `{0}`")]
    InvalidBgColor(String),
    #[error("invalid `charset-source` parameter: expected UTF-8 or ISO-8859-1, got `{0}`")]
    InvalidCharsetSource(String),
    #[error("invalid `charset-target` parameter: expected UTF-8 or ISO-8859-1, got `{0}`")]
    InvalidCharsetTarget(String),
    #[error("invalid `ecc` parameter: expected one of L, M, Q, H, got `{0}`")]
    InvalidEcc(String),
    #[error("invalid `format` parameter: expected one of png, gif, jpeg, jpg, svg, eps, got `{0}`")]
    InvalidFormat(String),
    #[error("invalid `depth` parameter: expected one of 1, 8, 16, 24, 32, got `{0}`")]
    InvalidDepth(String),
    #[error("invalid `dpi` parameter: expected an integer between 72 and 600, got `{0}`")]
    InvalidDpi(String),
    #[error("invalid `margin` parameter: expected an integer between 0 and 50, got `{0}`")]
    InvalidMargin(String),
    #[error("invalid `qzone` parameter: expected an integer between 0 and 100, got `{0}`")]
    InvalidQuietZone(String),
}

/// Validates the merged query/form parameter bag into a [`RenderRequest`].
///
/// Defaults apply only when a key is entirely absent; a present but
/// malformed value is always a hard failure. Checks short-circuit in a
/// fixed order so only one error is ever reported per call.
pub fn validate(params: &HashMap<String, String>) -> Result<RenderRequest, ValidationError> {
    let data = params
        .get("data")
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingData)?;

    let dimension = match params.get("size") {
        None => DEFAULT_DIMENSION,
        Some(raw) => size::parse(raw).ok_or_else(|| ValidationError::InvalidSize(raw.clone()))?,
    };

    let foreground = match params.get("color") {
        None => Rgb::BLACK,
        Some(raw) => color::parse(raw).ok_or_else(|| ValidationError::InvalidColor(raw.clone()))?,
    };

    let background = match params.get("bgcolor") {
        None => Rgb::WHITE,
        Some(raw) => {
            color::parse(raw).ok_or_else(|| ValidationError::InvalidBgColor(raw.clone()))?
        }
    };

    let source = match params.get("charset-source") {
        None => Charset::Utf8,
        Some(raw) => {
            Charset::parse(raw).ok_or_else(|| ValidationError::InvalidCharsetSource(raw.clone()))?
        }
    };

    let target = match params.get("charset-target") {
        None => Charset::Utf8,
        Some(raw) => {
            Charset::parse(raw).ok_or_else(|| ValidationError::InvalidCharsetTarget(raw.clone()))?
        }
    };

    let error_correction = match params.get("ecc") {
        None => ErrorCorrection::L,
        Some(raw) => {
            ErrorCorrection::parse(raw).ok_or_else(|| ValidationError::InvalidEcc(raw.clone()))?
        }
    };

    let format = match params.get("format") {
        None => OutputFormat::Png,
        Some(raw) => {
            OutputFormat::parse(raw).ok_or_else(|| ValidationError::InvalidFormat(raw.clone()))?
        }
    };

    let bit_depth = match params.get("depth") {
        None => BitDepth::TwentyFour,
        Some(raw) => {
            BitDepth::parse(raw).ok_or_else(|| ValidationError::InvalidDepth(raw.clone()))?
        }
    };

    let dpi = match params.get("dpi") {
        None => DEFAULT_DPI,
        Some(raw) => parse_ranged(raw, MIN_DPI, MAX_DPI)
            .ok_or_else(|| ValidationError::InvalidDpi(raw.clone()))?,
    };

    let margin_px = match params.get("margin") {
        None => 0,
        Some(raw) => parse_ranged(raw, MIN_MARGIN, MAX_MARGIN)
            .ok_or_else(|| ValidationError::InvalidMargin(raw.clone()))?,
    };

    let quiet_zone = match params.get("qzone") {
        None => 0,
        Some(raw) => parse_ranged(raw, MIN_QUIET_ZONE, MAX_QUIET_ZONE)
            .ok_or_else(|| ValidationError::InvalidQuietZone(raw.clone()))?,
    };

    let optimize = matches!(
        params.get("optimize").map(String::as_str),
        Some("true") | Some("1")
    );

    let converted = charset::convert(data, source, target);
    if converted.degraded {
        tracing::debug!("charset conversion degraded, keeping original payload bytes");
    }

    Ok(RenderRequest {
        payload: converted.bytes,
        charset_degraded: converted.degraded,
        dimension,
        error_correction,
        foreground,
        background,
        margin_px,
        quiet_zone,
        format,
        bit_depth,
        dpi,
        optimize,
    })
}

fn parse_ranged(raw: &str, min: u32, max: u32) -> Option<u32> {
    if raw.is_empty() || raw.len() > 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|v| (min..=max).contains(v))
}

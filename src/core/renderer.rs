use anyhow::{Result, anyhow};
use image::RgbImage;

use crate::core::encoder;
use crate::core::optimizer::Optimizer;
use crate::core::raster;
use crate::core::request::{BitDepth, RasterFormat, RenderPlan, RenderRequest};
use crate::settings::Config;

pub const CONTENT_TYPE_PNG: &str = "image/png";
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";
pub const CONTENT_TYPE_SVG: &str = "image/svg+xml";
pub const CONTENT_TYPE_EPS: &str = "application/postscript";

/// Finished image, owned by the request handler until it is written to
/// the response. Nothing is cached or shared across requests.
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Result of the blocking raster stage: encoded bytes plus whether the
/// branch taken is eligible for the optimizer pass.
struct RasterOutput {
    bytes: Vec<u8>,
    content_type: &'static str,
    optimizable: bool,
}

pub struct EngineStatus {
    pub optimizer_available: bool,
    pub available_permits: usize,
    pub max_concurrent: usize,
}

/// Drives format-specific rendering and post-processing for one
/// validated request at a time.
pub struct RenderingEngine {
    optimizer: Optimizer,
}

impl RenderingEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            optimizer: Optimizer::new(config.optimizer_bin.clone(), config.optimizer_slots),
        }
    }

    pub fn health_check(&self) -> EngineStatus {
        EngineStatus {
            optimizer_available: self.optimizer.available(),
            available_permits: self.optimizer.available_permits(),
            max_concurrent: self.optimizer.max_concurrent(),
        }
    }

    pub async fn render(&self, request: RenderRequest) -> Result<RenderedImage> {
        match request.plan() {
            RenderPlan::Svg => {
                let matrix = encoder::encode(&request.payload, request.error_correction)?;
                // The vector path has no pixel margin, bit depth, or DPI:
                // those are raster-only concepts. Only the quiet zone is
                // carried over, in module units.
                let svg = matrix.to_svg(
                    request.dimension,
                    request.quiet_zone,
                    request.foreground,
                    request.background,
                );
                Ok(RenderedImage {
                    bytes: svg.into_bytes(),
                    content_type: CONTENT_TYPE_SVG,
                })
            }
            RenderPlan::Eps => Ok(RenderedImage {
                bytes: eps_placeholder(request.dimension).into_bytes(),
                content_type: CONTENT_TYPE_EPS,
            }),
            RenderPlan::Raster(format) => {
                let depth = request.bit_depth;
                let optimize = request.optimize;
                let raster =
                    tokio::task::spawn_blocking(move || Self::render_raster(&request, format))
                        .await
                        .map_err(|e| anyhow!("raster task join error: {e}"))??;

                let bytes = if optimize && raster.optimizable {
                    self.optimizer.optimize(raster.bytes, depth).await
                } else {
                    raster.bytes
                };
                Ok(RenderedImage {
                    bytes,
                    content_type: raster.content_type,
                })
            }
        }
    }

    fn render_raster(request: &RenderRequest, format: RasterFormat) -> Result<RasterOutput> {
        let matrix = encoder::encode(&request.payload, request.error_correction)?;
        let mut img: RgbImage = matrix.to_raster(
            request.dimension,
            request.quiet_zone,
            request.foreground,
            request.background,
        );
        if request.margin_px > 0 {
            img = raster::add_margin(&img, request.margin_px, request.background);
        }

        match format {
            RasterFormat::Jpeg => Ok(RasterOutput {
                bytes: raster::encode_jpeg(&img, request.bit_depth, request.dpi)?,
                content_type: CONTENT_TYPE_JPEG,
                optimizable: false,
            }),
            // No GIF writer in the raster engine; the request is accepted
            // but the produced container is PNG.
            RasterFormat::Gif => Ok(RasterOutput {
                bytes: raster::encode_png(&img, BitDepth::TwentyFour, request.dpi)?,
                content_type: CONTENT_TYPE_PNG,
                optimizable: false,
            }),
            RasterFormat::Png => Ok(RasterOutput {
                bytes: raster::encode_png(&img, request.bit_depth, request.dpi)?,
                content_type: CONTENT_TYPE_PNG,
                // 16-bit grayscale is deliberately excluded from the
                // optimizer pass.
                optimizable: request.bit_depth != BitDepth::Sixteen,
            }),
        }
    }
}

/// Placeholder EPS wrapper: a bounding-box frame at the requested
/// dimension, not a vector rendering of the QR pattern.
fn eps_placeholder(dimension: u32) -> String {
    format!(
        "%!PS-Adobe-3.0 EPSF-3.0\n\
         %%BoundingBox: 0 0 {dimension} {dimension}\n\
         %%EndComments\n\
         newpath\n\
         0 0 moveto\n\
         {dimension} 0 lineto\n\
         {dimension} {dimension} lineto\n\
         0 {dimension} lineto\n\
         closepath\n\
         stroke\n\
         %%EOF\n"
    )
}

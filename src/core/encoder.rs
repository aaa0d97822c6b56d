use anyhow::{Result, anyhow};
use image::{ImageBuffer, RgbImage, imageops};
use qrcode::{EcLevel, QrCode};

use crate::core::color::Rgb;
use crate::core::request::ErrorCorrection;

/// Module matrix of an encoded QR symbol, detached from the encoder
/// library's own types.
pub struct QrMatrix {
    width: u32,
    modules: Vec<bool>,
}

/// Encodes `payload` into a QR module matrix at the given error
/// correction level.
pub fn encode(payload: &[u8], level: ErrorCorrection) -> Result<QrMatrix> {
    let ec = match level {
        ErrorCorrection::L => EcLevel::L,
        ErrorCorrection::M => EcLevel::M,
        ErrorCorrection::Q => EcLevel::Q,
        ErrorCorrection::H => EcLevel::H,
    };
    let qr = QrCode::with_error_correction_level(payload, ec)
        .map_err(|e| anyhow!("QR encoding failed: {e:?}"))?;

    let width = qr.width() as u32;
    let modules = qr
        .to_colors()
        .into_iter()
        .map(|c| c == qrcode::Color::Dark)
        .collect();

    Ok(QrMatrix { width, modules })
}

impl QrMatrix {
    pub fn width(&self) -> u32 {
        self.width
    }

    fn module(&self, x: u32, y: u32) -> bool {
        self.modules[(y * self.width + x) as usize]
    }

    /// Paints the symbol into an RGB buffer of exactly
    /// `dimension` x `dimension` pixels. The quiet zone is expressed in
    /// module units; the module grid is scaled with nearest-neighbor
    /// filtering so edges stay crisp.
    pub fn to_raster(&self, dimension: u32, quiet_zone: u32, fg: Rgb, bg: Rgb) -> RgbImage {
        let grid = self.width + 2 * quiet_zone;
        let mut modules = ImageBuffer::from_pixel(grid, grid, image::Rgb::from(bg));
        let dark = image::Rgb::from(fg);
        for y in 0..self.width {
            for x in 0..self.width {
                if self.module(x, y) {
                    modules.put_pixel(x + quiet_zone, y + quiet_zone, dark);
                }
            }
        }
        imageops::resize(&modules, dimension, dimension, imageops::FilterType::Nearest)
    }

    /// Emits an SVG document for the symbol. The viewBox is in module
    /// units (including the quiet zone) while width/height carry the
    /// requested pixel dimension; dark modules become a single path.
    pub fn to_svg(&self, dimension: u32, quiet_zone: u32, fg: Rgb, bg: Rgb) -> String {
        let grid = self.width + 2 * quiet_zone;
        let mut path = String::new();
        for y in 0..self.width {
            for x in 0..self.width {
                if self.module(x, y) {
                    if !path.is_empty() {
                        path.push(' ');
                    }
                    path.push_str(&format!(
                        "M{},{}h1v1h-1z",
                        x + quiet_zone,
                        y + quiet_zone
                    ));
                }
            }
        }

        let mut doc = String::new();
        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{dimension}\" height=\"{dimension}\" viewBox=\"0 0 {grid} {grid}\" shape-rendering=\"crispEdges\" stroke=\"none\">\n"
        ));
        doc.push_str(&format!(
            "\t<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
            bg.to_hex()
        ));
        doc.push_str(&format!("\t<path d=\"{path}\" fill=\"{}\"/>\n", fg.to_hex()));
        doc.push_str("</svg>\n");
        doc
    }
}

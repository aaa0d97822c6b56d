use std::io::Cursor;

use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageBuffer, ImageEncoder, RgbImage, imageops};

use crate::core::color::Rgb;
use crate::core::request::BitDepth;

const JPEG_QUALITY: u8 = 85;
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Extends the canvas by `margin` pixels on all four sides, filled with
/// the background color. The result is net-larger than the input; margin
/// is additive, not inset.
pub fn add_margin(img: &RgbImage, margin: u32, bg: Rgb) -> RgbImage {
    let side = img.width() + 2 * margin;
    let mut canvas = ImageBuffer::from_pixel(side, side, image::Rgb::from(bg));
    imageops::overlay(&mut canvas, img, i64::from(margin), i64::from(margin));
    canvas
}

/// Serializes the buffer as PNG at the requested bit depth and tags the
/// stream with DPI metadata.
///
/// - 1-bit: midpoint threshold (128 per channel) to a two-color palette
///   at maximum compression effort
/// - 8/16-bit: grayscale
/// - 24-bit: RGB, 32-bit: RGBA (no color reduction)
pub fn encode_png(img: &RgbImage, depth: BitDepth, dpi: u32) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        let data: Vec<u8> = match depth {
            BitDepth::One => {
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_depth(png::BitDepth::One);
                // index 0 = black, index 1 = white
                encoder.set_palette(vec![0, 0, 0, 255, 255, 255]);
                encoder.set_compression(png::Compression::Best);
                pack_bilevel(img)
            }
            BitDepth::Eight => {
                encoder.set_color(png::ColorType::Grayscale);
                encoder.set_depth(png::BitDepth::Eight);
                DynamicImage::ImageRgb8(img.clone()).to_luma8().into_raw()
            }
            BitDepth::Sixteen => {
                encoder.set_color(png::ColorType::Grayscale);
                encoder.set_depth(png::BitDepth::Sixteen);
                DynamicImage::ImageRgb8(img.clone())
                    .to_luma16()
                    .into_raw()
                    .iter()
                    .flat_map(|v| v.to_be_bytes())
                    .collect()
            }
            BitDepth::TwentyFour => {
                encoder.set_color(png::ColorType::Rgb);
                encoder.set_depth(png::BitDepth::Eight);
                img.as_raw().clone()
            }
            BitDepth::ThirtyTwo => {
                encoder.set_color(png::ColorType::Rgba);
                encoder.set_depth(png::BitDepth::Eight);
                DynamicImage::ImageRgb8(img.clone()).to_rgba8().into_raw()
            }
        };
        let mut writer = encoder.write_header().context("writing PNG header")?;
        writer
            .write_image_data(&data)
            .context("writing PNG image data")?;
        writer.finish().context("finishing PNG stream")?;
    }
    tag_png_dpi(&mut out, dpi)?;
    Ok(out)
}

/// Serializes the buffer as JPEG at a fixed quality factor. An 8-bit
/// depth request converts to grayscale first. DPI metadata is written in
/// a second pass over the encoded bytes so it cannot disturb the quality
/// settings already applied.
pub fn encode_jpeg(img: &RgbImage, depth: BitDepth, dpi: u32) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut cursor = Cursor::new(Vec::new());
    if depth == BitDepth::Eight {
        let gray = DynamicImage::ImageRgb8(img.clone()).to_luma8();
        JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY).write_image(
            gray.as_raw(),
            width,
            height,
            ExtendedColorType::L8,
        )?;
    } else {
        JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY).write_image(
            img.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;
    }
    let mut bytes = cursor.into_inner();
    tag_jfif_dpi(&mut bytes, dpi)?;
    Ok(bytes)
}

/// Thresholds to pure black/white and packs one bit per pixel, rows
/// padded to byte boundaries, MSB first. Bit value 1 maps to palette
/// index 1 (white).
fn pack_bilevel(img: &RgbImage) -> Vec<u8> {
    let gray = DynamicImage::ImageRgb8(img.clone()).to_luma8();
    let width = gray.width() as usize;
    let row_bytes = width.div_ceil(8);
    let mut data = vec![0u8; row_bytes * gray.height() as usize];
    for (x, y, px) in gray.enumerate_pixels() {
        if px.0[0] >= 128 {
            data[y as usize * row_bytes + x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    data
}

/// Inserts a pHYs chunk right after IHDR, converting DPI to pixels per
/// meter. A separate pass over the serialized stream keeps resolution
/// tagging independent of the pixel encoding above.
fn tag_png_dpi(bytes: &mut Vec<u8>, dpi: u32) -> Result<()> {
    // signature (8) + IHDR length/type (8) + data (13) + crc (4)
    const PHYS_OFFSET: usize = 33;
    if bytes.len() < PHYS_OFFSET || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        bail!("malformed PNG stream, cannot tag resolution");
    }
    let ppm = (f64::from(dpi) / 0.0254).round() as u32;
    let mut chunk = Vec::with_capacity(21);
    chunk.extend_from_slice(&9u32.to_be_bytes());
    chunk.extend_from_slice(b"pHYs");
    chunk.extend_from_slice(&ppm.to_be_bytes());
    chunk.extend_from_slice(&ppm.to_be_bytes());
    chunk.push(1); // unit: meter
    let crc = crc32(&chunk[4..]);
    chunk.extend_from_slice(&crc.to_be_bytes());
    bytes.splice(PHYS_OFFSET..PHYS_OFFSET, chunk);
    Ok(())
}

/// Patches the JFIF APP0 density fields to dots-per-inch, inserting a
/// fresh APP0 segment after SOI when the encoder did not emit one.
fn tag_jfif_dpi(bytes: &mut Vec<u8>, dpi: u32) -> Result<()> {
    if bytes.len() < 2 || bytes[..2] != [0xFF, 0xD8] {
        bail!("malformed JPEG stream, cannot tag resolution");
    }
    let density = u16::try_from(dpi).unwrap_or(u16::MAX).to_be_bytes();
    let has_jfif = bytes.len() >= 18 && bytes[2..4] == [0xFF, 0xE0] && &bytes[6..11] == b"JFIF\0";
    if has_jfif {
        bytes[13] = 1; // unit: dots per inch
        bytes[14..16].copy_from_slice(&density);
        bytes[16..18].copy_from_slice(&density);
    } else {
        let mut app0 = vec![0xFF, 0xE0, 0x00, 0x10];
        app0.extend_from_slice(b"JFIF\0");
        app0.extend_from_slice(&[0x01, 0x02, 0x01]);
        app0.extend_from_slice(&density);
        app0.extend_from_slice(&density);
        app0.extend_from_slice(&[0x00, 0x00]); // no thumbnail
        bytes.splice(2..2, app0);
    }
    Ok(())
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in data {
        crc ^= u32::from(b);
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

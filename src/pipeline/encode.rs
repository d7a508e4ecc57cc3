//! Image encoding: `DynamicImage` → PNG bytes.
//!
//! Every image block carries PNG regardless of where the pixels came from
//! (a rasterised PDF page or a decoded JPEG/GIF/WebP/...). PNG is lossless,
//! so rendered text stays crisp, and it is readable by every consumer.

use crate::error::ExtractionError;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG.
///
/// The PNG encoder supports 8/16-bit luma, luma+alpha, RGB and RGBA. Images
/// in any other colour type (32-bit float HDR, for instance) are widened to
/// the nearest supported type first so the colour mode survives as closely
/// as PNG allows.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let widened;
    let img = match img {
        DynamicImage::ImageRgb32F(_) => {
            widened = DynamicImage::ImageRgb16(img.to_rgb16());
            &widened
        }
        DynamicImage::ImageRgba32F(_) => {
            widened = DynamicImage::ImageRgba16(img.to_rgba16());
            &widened
        }
        _ => img,
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ExtractionError::ImageEncode(e.to_string()))?;

    debug!(
        "Encoded {}x{} {:?} → {} bytes PNG",
        img.width(),
        img.height(),
        img.color(),
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb32FImage, Rgba, RgbaImage};

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert!(png.starts_with(PNG_MAGIC));
    }

    #[test]
    fn grayscale_stays_grayscale() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([128])));
        let png = encode_png(&img).unwrap();
        let back = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(back.color(), image::ColorType::L8);
    }

    #[test]
    fn float_images_are_widened() {
        let img = DynamicImage::ImageRgb32F(Rgb32FImage::new(3, 2));
        let png = encode_png(&img).unwrap();
        let back = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(back.color(), image::ColorType::Rgb16);
        assert_eq!((back.width(), back.height()), (3, 2));
    }
}

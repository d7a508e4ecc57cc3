//! Image extractor: decode any supported raster format, re-encode as PNG.

use crate::error::ExtractionError;
use crate::output::ContentBlock;
use crate::pipeline::encode::encode_png;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Turn an image file into exactly one image block.
///
/// The declared `media_type` (from the sniffer) picks the decoder; when the
/// `image` crate does not know that MIME type the format is guessed from the
/// bytes instead. Multi-frame formats (GIF, animated WebP, multi-page TIFF)
/// contribute their first frame only.
pub fn extract_image(bytes: &[u8], media_type: &str) -> Result<Vec<ContentBlock>, ExtractionError> {
    let decode_err = |detail: String| ExtractionError::ImageDecode {
        media_type: media_type.to_string(),
        detail,
    };

    let mut reader = ImageReader::new(Cursor::new(bytes));
    match ImageFormat::from_mime_type(media_type) {
        Some(format) => reader.set_format(format),
        None => {
            reader = reader
                .with_guessed_format()
                .map_err(|e| decode_err(e.to_string()))?;
        }
    }

    let img = reader.decode().map_err(|e| decode_err(e.to_string()))?;
    debug!(
        "Decoded {media_type}: {}x{} {:?}",
        img.width(),
        img.height(),
        img.color()
    );

    let png = encode_png(&img)?;
    Ok(vec![ContentBlock::image(None, media_type, png)])
}

//! Image codec helpers: uploaded bytes → `DynamicImage`, and
//! `DynamicImage` → PNG for the Tesseract subprocess, which reads its input
//! from a file.

use crate::error::ExtractionError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Decode an uploaded image (PNG or JPEG) from memory.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ExtractionError> {
    image::load_from_memory(bytes).map_err(|e| ExtractionError::ImageDecode {
        detail: e.to_string(),
    })
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_then_decode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[..4], b"\x89PNG");

        let back = decode_image(&png).expect("decode should succeed");
        assert_eq!((back.width(), back.height()), (10, 10));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ExtractionError::ImageDecode { .. }));
    }
}

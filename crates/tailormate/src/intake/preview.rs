//! Thumbnail previews for image documents.

use std::io::Cursor;

use image::{GenericImageView, ImageFormat};
use serde::Serialize;

/// A PNG-encoded thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub png: Vec<u8>,
}

impl Preview {
    pub const MEDIA_TYPE: &'static str = "image/png";
}

/// True for media types a preview is attempted for.
pub fn is_previewable(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// Builds a thumbnail whose longest side is at most `max_edge`.
///
/// Smaller images keep their size. Returns `None` when the bytes do not
/// decode as an image.
pub fn build_preview(bytes: &[u8], max_edge: u32) -> Option<Preview> {
    let _span = tracing::debug_span!("intake.preview", size = bytes.len()).entered();

    let img = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(error = %e, "Image did not decode, skipping preview");
            return None;
        }
    };

    let (width, height) = img.dimensions();
    let img = if width > max_edge || height > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };

    let mut png = Vec::new();
    if let Err(e) = img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
        tracing::debug!(error = %e, "Failed to encode preview");
        return None;
    }

    let (width, height) = img.dimensions();
    Some(Preview { width, height, png })
}

#[cfg(test)]
pub(crate) fn encode_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_image_is_scaled_to_max_edge() {
        let preview = build_preview(&encode_test_png(600, 300), 256).unwrap();
        assert_eq!(preview.width, 256);
        assert!(preview.height <= 128 && preview.height >= 127);
        assert!(image::load_from_memory(&preview.png).is_ok());
    }

    #[test]
    fn test_small_image_keeps_size() {
        let preview = build_preview(&encode_test_png(40, 20), 256).unwrap();
        assert_eq!((preview.width, preview.height), (40, 20));
    }

    #[test]
    fn test_garbage_bytes_give_no_preview() {
        assert!(build_preview(b"definitely not an image", 256).is_none());
    }

    #[test]
    fn test_is_previewable() {
        assert!(is_previewable("image/jpeg"));
        assert!(!is_previewable("application/pdf"));
    }
}

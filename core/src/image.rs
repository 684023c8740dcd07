use std::path::Path;

use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageError};

/// Largest photo accepted for a product.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// JPEG quality for stored photos.
pub const JPEG_QUALITY: u8 = 80;

/// Longest edge of a stored photo, in pixels.
pub const MAX_IMAGE_EDGE: u32 = 2048;

/// Read a picked photo from disk and check that it is an image.
pub fn load_image(path: &Path) -> Result<Vec<u8>> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    if meta.len() > MAX_IMAGE_BYTES {
        bail!(
            "Image {} is too large ({} bytes, max {MAX_IMAGE_BYTES})",
            path.display(),
            meta.len()
        );
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image: {}", path.display()))?;
    check_image(&bytes).with_context(|| format!("Rejected {}", path.display()))?;
    Ok(bytes)
}

pub fn check_image(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        bail!("Image file is empty");
    }
    if !infer::is_image(bytes) {
        bail!("Not a recognized image format");
    }
    Ok(())
}

/// Re-encode a photo as JPEG, scaled down to fit within `MAX_IMAGE_EDGE`.
///
/// Formats the decoder doesn't know (HEIC, AVIF, ...) are kept as picked.
pub fn compress_image(bytes: &[u8]) -> Result<Vec<u8>> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(ImageError::Unsupported(e)) => {
            tracing::debug!(error = %e, "photo format not decodable, storing as picked");
            return Ok(bytes.to_vec());
        }
        Err(e) => return Err(e).context("Failed to decode image"),
    };

    let (width, height) = decoded.dimensions();
    let scaled = if width.max(height) > MAX_IMAGE_EDGE {
        decoded.resize(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE, FilterType::Triangle)
    } else {
        decoded
    };

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&scaled.to_rgb8())
        .context("Failed to encode image as JPEG")?;
    tracing::debug!(
        from = bytes.len(),
        to = out.len(),
        width = scaled.width(),
        height = scaled.height(),
        "compressed photo"
    );
    Ok(out)
}

/// MIME type sniffed from the image header, if recognized.
#[must_use]
pub fn image_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes)
        .filter(|t| t.matcher_type() == infer::MatcherType::Image)
        .map(|t| t.mime_type())
}

use crate::error::{AppError, Result};
use crate::provider::{PixelBuffer, TargetSize};
use std::path::Path;

/// Decodes an image file and scales it down to fit `size`, keeping the aspect ratio.
///
/// Blocking; run it on a worker thread, never on the session's context.
/// Images already smaller than `size` are not upscaled.
pub fn load_image_blocking(path: &Path, size: TargetSize) -> Result<PixelBuffer> {
    if size.width == 0 || size.height == 0 {
        return Err(AppError::ImageLoad(format!(
            "Invalid target size {}x{}",
            size.width, size.height
        )));
    }

    let img = image::ImageReader::open(path)
        .map_err(|e| AppError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| AppError::ImageLoad(format!("{}: {}", path.display(), e)))?
        .decode()?;

    let img = if img.width() > size.width || img.height() > size.height {
        img.thumbnail(size.width, size.height)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(PixelBuffer {
        data: rgb.into_raw(),
        width,
        height,
    })
}

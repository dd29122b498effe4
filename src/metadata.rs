//! XMP metadata handling for kept photos.
//!
//! A kept photo is marked as a favorite by writing the XMP `Rating` property.

use crate::error::{AppError, Result};
use std::path::Path;
use xmp_toolkit::{OpenFileOptions, XmpFile, XmpMeta, XmpValue};

const XMP_NAMESPACE: &str = "http://ns.adobe.com/xap/1.0/";
const RATING_PROPERTY: &str = "Rating";
const MAX_RATING: u8 = 5;

fn open_xmp(path: &Path, options: OpenFileOptions) -> std::result::Result<XmpFile, String> {
    let path_str = path.to_str().ok_or_else(|| "Invalid UTF-8 in file path".to_string())?;
    let mut xmp_file = XmpFile::new().map_err(|e| format!("Failed to create XmpFile: {}", e))?;
    xmp_file
        .open_file(path_str, options)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    Ok(xmp_file)
}

/// Extracts and validates the rating value from XMP metadata.
fn extract_rating_from_xmp(xmp_meta: XmpMeta) -> Option<u8> {
    let rating_property = xmp_meta.property(XMP_NAMESPACE, RATING_PROPERTY)?;
    let rating = rating_property.value.parse::<u8>().ok()?;

    if rating <= MAX_RATING {
        Some(rating)
    } else {
        None
    }
}

/// Read XMP Rating from an image file.
///
/// Returns `Ok(Some(rating))` if a valid rating exists (0-5),
/// `Ok(None)` if no rating is set,
/// `Err` if reading fails.
pub fn read_xmp_rating(path: &Path) -> Result<Option<u8>> {
    let mut xmp_file =
        open_xmp(path, OpenFileOptions::default().only_xmp().for_read()).map_err(AppError::XmpRead)?;
    let rating = xmp_file.xmp().and_then(extract_rating_from_xmp);
    xmp_file.close();
    Ok(rating)
}

/// Write XMP Rating to an image file.
///
/// Rating must be in range 0-5.
pub fn write_xmp_rating(path: &Path, rating: u8) -> Result<()> {
    if rating > MAX_RATING {
        return Err(AppError::XmpWrite(format!(
            "Rating must be 0-{}, got {}",
            MAX_RATING, rating
        )));
    }

    let mut xmp_file = open_xmp(path, OpenFileOptions::default().only_xmp().for_update())
        .map_err(AppError::XmpWrite)?;

    let mut xmp_meta = match xmp_file.xmp() {
        Some(xmp) => xmp,
        None => XmpMeta::new()
            .map_err(|e| AppError::XmpWrite(format!("Failed to create new XMP: {}", e)))?,
    };

    xmp_meta
        .set_property(
            XMP_NAMESPACE,
            RATING_PROPERTY,
            &XmpValue::new(rating.to_string()),
        )
        .map_err(|e| AppError::XmpWrite(format!("Failed to set Rating: {}", e)))?;

    xmp_file
        .put_xmp(&xmp_meta)
        .map_err(|e| AppError::XmpWrite(format!("Failed to put XMP: {}", e)))?;
    xmp_file.close();

    Ok(())
}

/// Marks a photo as a favorite unless it already carries `rating`.
///
/// Returns whether the file was written.
pub fn mark_favorite(path: &Path, rating: u8) -> Result<bool> {
    if let Ok(Some(existing)) = read_xmp_rating(path) {
        if existing == rating {
            return Ok(false);
        }
    }
    write_xmp_rating(path, rating)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_rating_is_rejected_before_opening() {
        let result = write_xmp_rating(Path::new("/definitely/not/here.jpg"), 6);
        match result {
            Err(AppError::XmpWrite(msg)) => assert!(msg.contains("0-5")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn marking_twice_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept.png");
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        assert_eq!(read_xmp_rating(&path).unwrap(), None);
        assert!(mark_favorite(&path, 5).unwrap());
        assert_eq!(read_xmp_rating(&path).unwrap(), Some(5));
        assert!(!mark_favorite(&path, 5).unwrap());
        assert!(mark_favorite(&path, 4).unwrap());
        assert_eq!(read_xmp_rating(&path).unwrap(), Some(4));
    }

    #[test]
    fn missing_file_fails_to_mark() {
        let dir = tempfile::tempdir().unwrap();
        let result = mark_favorite(&dir.path().join("gone.jpg"), 5);
        assert!(matches!(result, Err(AppError::XmpWrite(_))));
    }
}

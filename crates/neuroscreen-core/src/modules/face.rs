//! Image decoding and face crop persistence.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::domain::FaceRegion;
use crate::error::AnalysisError;

/// Decodes the image at `path`, detecting the format from its content.
///
/// # Errors
///
/// Returns [`AnalysisError::BadImage`] naming the path if decoding fails.
pub fn load_image(path: &Path) -> Result<DynamicImage, AnalysisError> {
    let decode = || -> image::ImageResult<DynamicImage> {
        ImageReader::open(path)?.with_guessed_format()?.decode()
    };
    decode().map_err(|source| AnalysisError::BadImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of the face crop written next to `path`: `<stem>_face.<ext>`.
#[must_use]
pub fn face_crop_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_face.{}", ext.to_string_lossy()),
        None => format!("{stem}_face"),
    };
    path.with_file_name(name)
}

/// Crops `region` out of `image`, clamped to the image bounds.
///
/// Returns `None` if the region lies entirely outside the image.
#[must_use]
pub fn crop_face(image: &DynamicImage, region: FaceRegion) -> Option<DynamicImage> {
    let region = region.clamp_to(image.width(), image.height())?;
    Some(image.crop_imm(region.x, region.y, region.width, region.height))
}

/// Crops `region` out of `image` and writes it next to `path`.
///
/// The crop is encoded in the same format as the original file. Returns the
/// path written.
///
/// # Errors
///
/// Returns an error if the region lies outside the image or the file cannot
/// be written.
pub fn crop_to_sibling(
    path: &Path,
    image: &DynamicImage,
    region: FaceRegion,
) -> anyhow::Result<PathBuf> {
    let crop = crop_face(image, region)
        .ok_or_else(|| anyhow::anyhow!("face region {region:?} is outside the image"))?;

    let out = face_crop_path(path);
    let format = ImageFormat::from_path(&out)?;
    // JPEG has no alpha channel.
    let crop = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(crop.to_rgb8())
    } else {
        crop
    };
    crop.save_with_format(&out, format)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_face_crop_path() {
        assert_eq!(
            face_crop_path(Path::new("/up/abc.jpg")),
            PathBuf::from("/up/abc_face.jpg")
        );
        assert_eq!(
            face_crop_path(Path::new("up/photo.v2.png")),
            PathBuf::from("up/photo.v2_face.png")
        );
    }

    #[test]
    fn test_crop_written_with_region_size() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("upload.jpg");
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 40, Rgba([9, 9, 9, 255])));

        let out = crop_to_sibling(&path, &image, FaceRegion::new(10, 5, 20, 30))
            .unwrap_or_else(|e| panic!("{e:#}"));
        assert_eq!(out, dir.path().join("upload_face.jpg"));

        let crop = load_image(&out).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!((crop.width(), crop.height()), (20, 30));
    }

    #[test]
    fn test_crop_outside_image_fails() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("upload.png");
        let image = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        assert!(crop_to_sibling(&path, &image, FaceRegion::new(20, 20, 5, 5)).is_err());
    }

    #[test]
    fn test_load_image_ignores_misleading_extension() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("really_a_png.jpg");
        let image = DynamicImage::ImageRgba8(RgbaImage::new(6, 4));
        image
            .save_with_format(&path, ImageFormat::Png)
            .unwrap_or_else(|e| panic!("{e}"));

        let decoded = load_image(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }

    #[test]
    fn test_load_image_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            load_image(&path),
            Err(AnalysisError::BadImage { .. })
        ));
    }
}

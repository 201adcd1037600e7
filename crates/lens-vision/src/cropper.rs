//! Bounding-box cropping.
//!
//! Converts normalized boxes to pixel rectangles, drops any rectangle that
//! does not fit inside the source image, and writes each surviving region to
//! `{stem}-crop-{uuid}.jpg` in the output directory.
//!
//! This is blocking image work; async callers should go through
//! `tokio::task::spawn_blocking`.

use std::path::Path;

use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, error, warn};
use uuid::Uuid;

use lens_models::{CroppedDetectedObject, DetectedObject, PixelRect};

use crate::error::{VisionError, VisionResult};
use crate::metrics;

/// Crop every object that fits inside the image.
///
/// # Errors
/// - `InvalidImage` if the image dimensions cannot be determined, are zero,
///   or the image cannot be decoded.
/// - `Io` if the output directory cannot be created.
///
/// Per-object problems (out-of-bounds boxes, failed writes) are logged and
/// the object is left out of the result.
pub fn crop_objects_from_image(
    image_path: &Path,
    objects: &[DetectedObject],
    output_dir: &Path,
) -> VisionResult<Vec<CroppedDetectedObject>> {
    let (image_width, image_height) = probe_dimensions(image_path)?;

    let planned: Vec<(&DetectedObject, PixelRect)> = objects
        .iter()
        .filter_map(|object| {
            let rect = object.bounding_box.to_pixel_rect(image_width, image_height);
            if rect.fits_within(image_width, image_height) {
                Some((object, rect))
            } else {
                warn!(
                    tag = %object.tag,
                    left = rect.left,
                    top = rect.top,
                    width = rect.width,
                    height = rect.height,
                    "Skipping object due to invalid crop"
                );
                metrics::record_crop_skipped("out_of_bounds");
                None
            }
        })
        .collect();

    if planned.is_empty() {
        return Ok(Vec::new());
    }

    let image = decode(image_path)?;
    std::fs::create_dir_all(output_dir)?;

    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    let mut cropped = Vec::with_capacity(planned.len());
    for (object, rect) in planned {
        let output_path = output_dir.join(format!("{}-crop-{}.jpg", stem, Uuid::new_v4()));

        match extract_region(&image, &object.tag, rect, &output_path) {
            Ok(()) => {
                debug!(tag = %object.tag, path = %output_path.display(), "Cropped object");
                metrics::record_crop_written();
                cropped.push(CroppedDetectedObject::from_object(object, output_path));
            }
            Err(e) => {
                error!(error = %e, "Crop extraction failed");
                metrics::record_crop_skipped("extraction_failed");
            }
        }
    }

    Ok(cropped)
}

/// Read image dimensions without decoding pixel data.
pub fn probe_dimensions(image_path: &Path) -> VisionResult<(u32, u32)> {
    let (width, height) = ImageReader::open(image_path)
        .map_err(|e| VisionError::invalid_image(image_path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| VisionError::invalid_image(image_path, e.to_string()))?
        .into_dimensions()
        .map_err(|e| VisionError::invalid_image(image_path, e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(VisionError::invalid_image(image_path, "Invalid image dimensions"));
    }

    Ok((width, height))
}

fn decode(image_path: &Path) -> VisionResult<DynamicImage> {
    ImageReader::open(image_path)
        .map_err(|e| VisionError::invalid_image(image_path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| VisionError::invalid_image(image_path, e.to_string()))?
        .decode()
        .map_err(|e| VisionError::invalid_image(image_path, e.to_string()))
}

fn extract_region(
    image: &DynamicImage,
    label: &str,
    rect: PixelRect,
    output_path: &Path,
) -> VisionResult<()> {
    // fits_within guarantees non-negative, in-bounds values
    let region = image.crop_imm(
        rect.left as u32,
        rect.top as u32,
        rect.width as u32,
        rect.height as u32,
    );

    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(region.to_rgb8())
        .save_with_format(output_path, ImageFormat::Jpeg)
        .map_err(|e| VisionError::crop_extraction(label, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use lens_models::BoundingBox;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, Rgb([120, 80, 40]))
            .save(&path)
            .unwrap();
        path
    }

    fn object(tag: &str, bbox: BoundingBox) -> DetectedObject {
        DetectedObject::new(tag, 0.9, bbox)
    }

    #[test]
    fn test_crops_in_bounds_object() {
        let dir = TempDir::new().unwrap();
        let image_path = write_test_image(dir.path(), "photo.png", 100, 50);
        let out = dir.path().join("cropped");

        let objects = vec![object("tower", BoundingBox::new(0.3, 0.2, 0.1, 0.2))];
        let cropped = crop_objects_from_image(&image_path, &objects, &out).unwrap();

        assert_eq!(cropped.len(), 1);
        let crop = &cropped[0];
        assert_eq!(crop.label, "tower");
        assert_eq!(crop.bounding_box, objects[0].bounding_box);
        assert!(crop.cropped_image_path.exists());
        assert!(crop.cropped_image_path.starts_with(&out));

        let file_name = crop.cropped_image_path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("photo-crop-"));
        assert!(file_name.ends_with(".jpg"));

        let (w, h) = image::image_dimensions(&crop.cropped_image_path).unwrap();
        assert_eq!((w, h), (10, 10));
    }

    #[test]
    fn test_skips_out_of_bounds_boxes() {
        let dir = TempDir::new().unwrap();
        let image_path = write_test_image(dir.path(), "photo.png", 100, 100);
        let out = dir.path().join("cropped");

        let objects = vec![
            object("overflow-right", BoundingBox::new(0.8, 0.1, 0.5, 0.2)),
            object("overflow-bottom", BoundingBox::new(0.1, 0.9, 0.2, 0.3)),
            object("negative", BoundingBox::new(-0.1, 0.1, 0.2, 0.2)),
            object("degenerate", BoundingBox::new(0.5, 0.5, 0.001, 0.2)),
            object("ok", BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
        ];

        let cropped = crop_objects_from_image(&image_path, &objects, &out).unwrap();
        assert!(cropped.len() <= objects.len());
        let labels: Vec<_> = cropped.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["ok"]);

        let (w, h) = image::image_dimensions(&cropped[0].cropped_image_path).unwrap();
        assert_eq!((w, h), (100, 100));
    }

    #[test]
    fn test_extreme_coordinates_are_skipped() {
        let dir = TempDir::new().unwrap();
        let image_path = write_test_image(dir.path(), "photo.png", 100, 100);
        let out = dir.path().join("cropped");

        let objects = vec![
            object("huge", BoundingBox::new(-1e300, 0.1, 2e300, 0.2)),
            object("infinite", BoundingBox::new(0.1, 0.1, f64::INFINITY, 0.2)),
            object("nan", BoundingBox::new(f64::NAN, 0.1, 0.2, 0.2)),
        ];

        let cropped = crop_objects_from_image(&image_path, &objects, &out).unwrap();
        assert!(cropped.is_empty());
    }

    #[test]
    fn test_unique_names_for_repeated_objects() {
        let dir = TempDir::new().unwrap();
        let image_path = write_test_image(dir.path(), "photo.png", 64, 64);
        let bbox = BoundingBox::new(0.25, 0.25, 0.5, 0.5);
        let objects = vec![object("tower", bbox), object("tower", bbox)];

        let cropped = crop_objects_from_image(&image_path, &objects, dir.path()).unwrap();
        assert_eq!(cropped.len(), 2);
        assert_ne!(cropped[0].cropped_image_path, cropped[1].cropped_image_path);
    }

    #[test]
    fn test_invalid_image_is_reported() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("broken.png");
        std::fs::write(&image_path, b"definitely not an image").unwrap();

        let objects = vec![object("tower", BoundingBox::new(0.1, 0.1, 0.2, 0.2))];
        let result = crop_objects_from_image(&image_path, &objects, dir.path());
        assert!(matches!(result, Err(VisionError::InvalidImage { .. })));
    }

    #[test]
    fn test_missing_image_is_reported() {
        let dir = TempDir::new().unwrap();
        let result = crop_objects_from_image(&dir.path().join("missing.jpg"), &[], dir.path());
        assert!(matches!(result, Err(VisionError::InvalidImage { .. })));
    }

    #[test]
    fn test_no_output_dir_created_when_nothing_survives() {
        let dir = TempDir::new().unwrap();
        let image_path = write_test_image(dir.path(), "photo.png", 10, 10);
        let out = dir.path().join("cropped");

        let objects = vec![object("tower", BoundingBox::new(0.9, 0.9, 0.5, 0.5))];
        let cropped = crop_objects_from_image(&image_path, &objects, &out).unwrap();
        assert!(cropped.is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_probe_dimensions() {
        let dir = TempDir::new().unwrap();
        let image_path = write_test_image(dir.path(), "photo.png", 32, 16);
        assert_eq!(probe_dimensions(&image_path).unwrap(), (32, 16));
    }
}

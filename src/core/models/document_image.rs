use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage};

use crate::core::models::DetectionBox;

#[derive(Clone)]
pub struct DocumentImage {
    pixels: Arc<RgbImage>,
}

impl std::fmt::Debug for DocumentImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl DocumentImage {
    pub fn build_from_dynamic_image(image: DynamicImage) -> Self {
        log::debug!(
            "[DOCUMENT_IMAGE] building from {:?} {}x{}",
            image.color(),
            image.width(),
            image.height()
        );

        Self {
            pixels: Arc::new(image.into_rgb8()),
        }
    }

    pub fn decode_from_bytes(encoded: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(encoded).context("Failed to decode image bytes")?;
        Ok(Self::build_from_dynamic_image(image))
    }

    pub fn decode_from_path(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to open image at {:?}", path))?;
        Ok(Self::build_from_dynamic_image(image))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn crop_region(&self, detection: &DetectionBox) -> Result<RgbImage> {
        if detection.width() == 0 || detection.height() == 0 {
            anyhow::bail!("Crop dimensions must be greater than zero");
        }
        if detection.x_max > self.width() || detection.y_max > self.height() {
            anyhow::bail!(
                "Crop region ({},{})-({},{}) exceeds image bounds {}x{}",
                detection.x_min,
                detection.y_min,
                detection.x_max,
                detection.y_max,
                self.width(),
                self.height()
            );
        }

        log::debug!(
            "[DOCUMENT_IMAGE] Cropping '{}': {}x{} at ({}, {})",
            detection.label,
            detection.width(),
            detection.height(),
            detection.x_min,
            detection.y_min
        );

        Ok(image::imageops::crop_imm(
            self.pixels.as_ref(),
            detection.x_min,
            detection.y_min,
            detection.width(),
            detection.height(),
        )
        .to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbaImage};
    use std::io::Cursor;

    fn gradient_image(width: u32, height: u32) -> DocumentImage {
        let pixels = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]));
        DocumentImage::build_from_dynamic_image(DynamicImage::ImageRgb8(pixels))
    }

    #[test]
    fn test_build_converts_rgba_to_rgb() {
        let rgba = RgbaImage::from_pixel(4, 3, image::Rgba([10, 20, 30, 255]));

        let document = DocumentImage::build_from_dynamic_image(DynamicImage::ImageRgba8(rgba));

        assert_eq!(document.width(), 4);
        assert_eq!(document.height(), 3);
        assert_eq!(document.pixels().get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_decode_from_bytes_reads_png() {
        let source = RgbImage::from_pixel(8, 6, Rgb([200, 100, 50]));
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(source)
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .unwrap();

        let document = DocumentImage::decode_from_bytes(&encoded).unwrap();

        assert_eq!(document.width(), 8);
        assert_eq!(document.height(), 6);
    }

    #[test]
    fn test_decode_from_bytes_rejects_garbage() {
        let result = DocumentImage::decode_from_bytes(b"definitely not an image");

        assert!(result.is_err());
    }

    #[test]
    fn test_crop_region_copies_expected_pixels() {
        let document = gradient_image(50, 40);
        let detection = DetectionBox::new("NAME", 10, 5, 30, 15);

        let crop = document.crop_region(&detection).unwrap();

        assert_eq!(crop.dimensions(), (20, 10));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([10, 5, 0]));
        assert_eq!(crop.get_pixel(19, 9), &Rgb([29, 14, 0]));
    }

    #[test]
    fn test_crop_region_rejects_out_of_bounds_box() {
        let document = gradient_image(50, 40);
        let detection = DetectionBox::new("NAME", 10, 5, 60, 15);

        assert!(document.crop_region(&detection).is_err());
    }
}

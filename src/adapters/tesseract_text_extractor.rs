use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use rusty_tesseract::{Args, Image as TesseractImage};

use crate::core::interfaces::adapters::TextExtractor;

pub struct TesseractTextExtractor {
    args: Args,
}

impl TesseractTextExtractor {
    pub fn build(language: &str) -> Result<Self> {
        log::info!("[TESSERACT_OCR] Initializing Tesseract text extractor ({})", language);

        let version = rusty_tesseract::get_tesseract_version()
            .map_err(|error| anyhow::anyhow!("Tesseract binary is not available: {:?}", error))?;
        log::debug!("[TESSERACT_OCR] Found tesseract {}", version.trim());

        Ok(Self {
            args: Self::build_args(language),
        })
    }

    fn build_args(language: &str) -> Args {
        Args {
            lang: language.to_string(),
            config_variables: HashMap::new(),
            ..Args::default()
        }
    }

    fn recognize_blocking(region: &RgbImage, args: &Args) -> Result<String> {
        let temp_file = tempfile::Builder::new()
            .prefix("id-region-")
            .suffix(".png")
            .tempfile()
            .context("Failed to create temporary crop file")?;

        region
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .context("Failed to write crop for OCR")?;

        let tesseract_image = TesseractImage::from_path(temp_file.path())
            .map_err(|error| anyhow::anyhow!("Failed to create Tesseract image: {:?}", error))?;

        let extracted_text = rusty_tesseract::image_to_string(&tesseract_image, args)
            .map_err(|error| anyhow::anyhow!("Failed to extract text from image: {:?}", error))?;

        Ok(extracted_text.trim().to_string())
    }
}

#[async_trait]
impl TextExtractor for TesseractTextExtractor {
    async fn recognize(&self, region: RgbImage) -> Result<String> {
        log::debug!(
            "[TESSERACT_OCR] Recognizing {}x{} region",
            region.width(),
            region.height()
        );

        let args = self.args.clone();
        let extracted_text =
            tokio::task::spawn_blocking(move || Self::recognize_blocking(&region, &args))
                .await
                .context("Tesseract worker stopped unexpectedly")??;

        log::debug!(
            "[TESSERACT_OCR] Extracted {} characters",
            extracted_text.len()
        );

        Ok(extracted_text)
    }
}

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn recognize(&self, region: RgbImage) -> Result<String>;
}

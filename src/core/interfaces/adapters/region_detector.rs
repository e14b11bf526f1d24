use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::{DetectionBox, DocumentImage};

/// Finding nothing is `Ok(vec![])`; an error means the model could not run.
#[async_trait]
pub trait RegionDetector: Send + Sync {
    async fn detect(&self, image: &DocumentImage) -> Result<Vec<DetectionBox>>;
}

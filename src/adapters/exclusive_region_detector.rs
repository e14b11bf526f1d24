use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::interfaces::adapters::RegionDetector;
use crate::core::models::{DetectionBox, DocumentImage};

pub struct ExclusiveRegionDetector {
    inner: Arc<dyn RegionDetector>,
    gate: Arc<Mutex<()>>,
}

impl ExclusiveRegionDetector {
    pub fn wrap(inner: Arc<dyn RegionDetector>) -> Self {
        log::info!("[EXCLUSIVE_DETECTOR] Detection calls will be serialized");
        Self {
            inner,
            gate: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl RegionDetector for ExclusiveRegionDetector {
    async fn detect(&self, image: &DocumentImage) -> Result<Vec<DetectionBox>> {
        let guard = Arc::clone(&self.gate).lock_owned().await;
        let inner = Arc::clone(&self.inner);
        let image = image.clone();

        // The spawned task owns the guard; dropping this future does not release it.
        tokio::spawn(async move {
            let _guard = guard;
            inner.detect(&image).await
        })
        .await
        .context("Exclusive detection task stopped unexpectedly")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ConcurrencyTracker {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl RegionDetector for ConcurrencyTracker {
        async fn detect(&self, _image: &DocumentImage) -> Result<Vec<DetectionBox>> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_active, Ordering::SeqCst);
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![DetectionBox::new("NAME", 0, 0, 1, 1)])
        }
    }

    fn blank_document() -> DocumentImage {
        DocumentImage::build_from_dynamic_image(DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
    }

    async fn run_concurrently(detector: &dyn RegionDetector, calls: usize) {
        let document = blank_document();
        let runs = (0..calls).map(|_| detector.detect(&document));
        let results = futures::future::join_all(runs).await;
        assert!(results.iter().all(|result| result.is_ok()));
    }

    #[tokio::test]
    async fn test_unwrapped_detector_observes_overlap() {
        let tracker = ConcurrencyTracker::default();

        run_concurrently(&tracker, 4).await;

        assert!(tracker.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_wrapped_detector_never_overlaps() {
        let tracker = Arc::new(ConcurrencyTracker::default());
        let exclusive = ExclusiveRegionDetector::wrap(tracker.clone());

        run_concurrently(&exclusive, 4).await;

        assert_eq!(tracker.peak.load(Ordering::SeqCst), 1);
    }
}

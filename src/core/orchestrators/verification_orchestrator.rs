use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use image::DynamicImage;
use uuid::Uuid;

use crate::core::interfaces::adapters::{RegionDetector, TextExtractor};
use crate::core::models::{
    DetectionBox, DocumentImage, FailureReason, FieldRecord, PipelineSettings, Verdict,
    VerificationReport,
};
use crate::core::services::{verhoeff_checksum, FieldAssembler};
use crate::global_constants::LOG_TAG_PIPELINE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Detecting,
    Extracting,
    Assembling,
    Validating,
}

struct StageFailure {
    stage: PipelineStage,
    reason: FailureReason,
    source: anyhow::Error,
}

impl StageFailure {
    fn new(stage: PipelineStage, reason: FailureReason, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            reason,
            source: source.into(),
        }
    }
}

type StageResult = Result<(Verdict, FieldRecord), StageFailure>;

pub struct VerificationOrchestrator {
    region_detector: Arc<dyn RegionDetector>,
    text_extractor: Arc<dyn TextExtractor>,
    field_assembler: FieldAssembler,
    extraction_concurrency: usize,
    default_timeout: Option<Duration>,
    expected_identifier_length: Option<usize>,
}

impl VerificationOrchestrator {
    pub fn build(
        region_detector: Arc<dyn RegionDetector>,
        text_extractor: Arc<dyn TextExtractor>,
        settings: &PipelineSettings,
    ) -> Self {
        let extraction_concurrency = settings.extraction_concurrency().max(1);
        log::info!(
            "{} Building orchestrator: identifier label '{}', {} concurrent extractions",
            LOG_TAG_PIPELINE,
            settings.identifier_label,
            extraction_concurrency
        );

        Self {
            region_detector,
            text_extractor,
            field_assembler: FieldAssembler::build(&settings.identifier_label),
            extraction_concurrency,
            default_timeout: settings.timeout(),
            expected_identifier_length: settings.expected_identifier_length,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub async fn verify_bytes(&self, encoded: &[u8]) -> VerificationReport {
        self.verify_bytes_within(encoded, self.default_timeout).await
    }

    pub async fn verify_bytes_within(
        &self,
        encoded: &[u8],
        timeout: Option<Duration>,
    ) -> VerificationReport {
        let run_id = Uuid::new_v4().to_string();
        log::info!(
            "{} run {} started from {} encoded bytes",
            LOG_TAG_PIPELINE,
            run_id,
            encoded.len()
        );

        let run = async {
            let image = DocumentImage::decode_from_bytes(encoded).map_err(|error| {
                StageFailure::new(PipelineStage::Start, FailureReason::UnreadableImage, error)
            })?;
            self.run_stages(&run_id, image).await
        };

        self.finish(&run_id, timeout, run).await
    }

    pub async fn verify_path(&self, path: &Path) -> VerificationReport {
        self.verify_path_within(path, self.default_timeout).await
    }

    pub async fn verify_path_within(
        &self,
        path: &Path,
        timeout: Option<Duration>,
    ) -> VerificationReport {
        let run_id = Uuid::new_v4().to_string();
        log::info!("{} run {} started from {:?}", LOG_TAG_PIPELINE, run_id, path);

        let run = async {
            let image = DocumentImage::decode_from_path(path).map_err(|error| {
                StageFailure::new(PipelineStage::Start, FailureReason::UnreadableImage, error)
            })?;
            self.run_stages(&run_id, image).await
        };

        self.finish(&run_id, timeout, run).await
    }

    pub async fn verify_image(&self, image: DynamicImage) -> VerificationReport {
        self.verify_image_within(image, self.default_timeout).await
    }

    pub async fn verify_image_within(
        &self,
        image: DynamicImage,
        timeout: Option<Duration>,
    ) -> VerificationReport {
        let run_id = Uuid::new_v4().to_string();
        log::info!(
            "{} run {} started from decoded {}x{} image",
            LOG_TAG_PIPELINE,
            run_id,
            image.width(),
            image.height()
        );

        let document = DocumentImage::build_from_dynamic_image(image);
        let run = self.run_stages(&run_id, document);

        self.finish(&run_id, timeout, run).await
    }

    async fn finish(
        &self,
        run_id: &str,
        timeout: Option<Duration>,
        run: impl Future<Output = StageResult>,
    ) -> VerificationReport {
        let started_at = Instant::now();

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(outcome) => outcome,
                Err(_) => Err(StageFailure::new(
                    PipelineStage::Start,
                    FailureReason::Timeout,
                    anyhow::anyhow!("run exceeded {:?}", limit),
                )),
            },
            None => run.await,
        };

        match outcome {
            Ok((verdict, fields)) => {
                log::info!(
                    "{} run {} finished in {:?}: {}",
                    LOG_TAG_PIPELINE,
                    run_id,
                    started_at.elapsed(),
                    verdict
                );
                VerificationReport {
                    run_id: run_id.to_string(),
                    verdict,
                    fields,
                }
            }
            Err(failure) => {
                log::error!(
                    "{} run {} failed during {:?} ({}): {:#}",
                    LOG_TAG_PIPELINE,
                    run_id,
                    failure.stage,
                    failure.reason,
                    failure.source
                );
                VerificationReport::failed(run_id.to_string(), failure.reason)
            }
        }
    }

    async fn run_stages(&self, run_id: &str, image: DocumentImage) -> StageResult {
        log::debug!("{} run {} entering {:?}", LOG_TAG_PIPELINE, run_id, PipelineStage::Detecting);
        let detections = self.detect_regions(&image).await?;
        log::info!(
            "{} run {} detected {} regions",
            LOG_TAG_PIPELINE,
            run_id,
            detections.len()
        );

        log::debug!("{} run {} entering {:?}", LOG_TAG_PIPELINE, run_id, PipelineStage::Extracting);
        let texts = self.extract_texts(&image, &detections).await?;

        log::debug!("{} run {} entering {:?}", LOG_TAG_PIPELINE, run_id, PipelineStage::Assembling);
        let assembled = self.field_assembler.assemble(detections.iter().zip(texts));
        if assembled.identifier.is_empty() {
            log::warn!("{} run {}: no identifier detected", LOG_TAG_PIPELINE, run_id);
            return Ok((Verdict::NotDetected, assembled.record));
        }

        log::debug!("{} run {} entering {:?}", LOG_TAG_PIPELINE, run_id, PipelineStage::Validating);
        let verdict = self.validate_identifier(run_id, assembled.identifier)?;
        Ok((verdict, assembled.record))
    }

    async fn detect_regions(
        &self,
        image: &DocumentImage,
    ) -> Result<Vec<DetectionBox>, StageFailure> {
        let raw_detections = self.region_detector.detect(image).await.map_err(|error| {
            StageFailure::new(PipelineStage::Detecting, FailureReason::DetectionFailed, error)
        })?;

        let (width, height) = (image.width(), image.height());
        let detections = raw_detections
            .iter()
            .filter_map(|detection| {
                let clamped = detection.clamped_to(width, height);
                if clamped.is_none() {
                    log::warn!(
                        "{} rejected '{}' box ({},{})-({},{}) outside {}x{} image",
                        LOG_TAG_PIPELINE,
                        detection.label,
                        detection.x_min,
                        detection.y_min,
                        detection.x_max,
                        detection.y_max,
                        width,
                        height
                    );
                }
                clamped
            })
            .collect();

        Ok(detections)
    }

    // Results stay in detection order; the first failure aborts the batch.
    async fn extract_texts(
        &self,
        image: &DocumentImage,
        detections: &[DetectionBox],
    ) -> Result<Vec<String>, StageFailure> {
        stream::iter(detections.iter().map(|detection| {
            let crop = image.crop_region(detection);
            let text_extractor = Arc::clone(&self.text_extractor);
            async move {
                let region = crop?;
                let text = text_extractor.recognize(region).await?;
                Ok::<_, anyhow::Error>(text.trim().to_string())
            }
        }))
        .buffered(self.extraction_concurrency)
        .try_collect::<Vec<String>>()
        .await
        .map_err(|error| {
            StageFailure::new(PipelineStage::Extracting, FailureReason::ExtractionFailed, error)
        })
    }

    fn validate_identifier(
        &self,
        run_id: &str,
        identifier: String,
    ) -> Result<Verdict, StageFailure> {
        if let Some(expected_length) = self.expected_identifier_length {
            if identifier.len() != expected_length {
                log::warn!(
                    "{} run {}: identifier has {} digits, expected {}",
                    LOG_TAG_PIPELINE,
                    run_id,
                    identifier.len(),
                    expected_length
                );
                return Ok(Verdict::Invalid(identifier));
            }
        }

        match verhoeff_checksum::validate(&identifier) {
            Ok(true) => Ok(Verdict::Valid(identifier)),
            Ok(false) => Ok(Verdict::Invalid(identifier)),
            Err(error) => Err(StageFailure::new(
                PipelineStage::Validating,
                FailureReason::ChecksumPreconditionViolated,
                error,
            )),
        }
    }
}

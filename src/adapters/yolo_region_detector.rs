use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{imageops, Rgb, RgbImage};
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;

use crate::core::interfaces::adapters::RegionDetector;
use crate::core::models::{DetectionBox, DocumentImage, PipelineSettings};

const LETTERBOX_FILL: Rgb<u8> = Rgb([114, 114, 114]);
const BOX_COORDINATE_ROWS: usize = 4;

#[derive(Debug, Clone)]
struct DecodeParams {
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    class_index: usize,
    confidence: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

/// Expects a `[1, 3, S, S]` RGB input in `[0, 1]` and a `[1, 4 + classes, anchors]`
/// output whose first four rows are centre x, centre y, width and height.
pub struct YoloRegionDetector {
    model: Arc<Model>,
    labels: Arc<Vec<String>>,
    params: DecodeParams,
}

impl YoloRegionDetector {
    pub fn build(settings: &PipelineSettings) -> Result<Self> {
        log::info!(
            "[YOLO_DETECTOR] Loading detection model from {:?}",
            settings.detection_model_path
        );

        let model = Model::load_file(&settings.detection_model_path)
            .with_context(|| {
                format!(
                    "Failed to load detection model {:?}",
                    settings.detection_model_path
                )
            })?;

        log::info!(
            "[YOLO_DETECTOR] Model loaded with {} labels: {:?}",
            settings.label_vocabulary.len(),
            settings.label_vocabulary
        );

        Ok(Self {
            model: Arc::new(model),
            labels: Arc::new(settings.label_vocabulary.clone()),
            params: DecodeParams {
                input_size: settings.detector_input_size,
                confidence_threshold: settings.confidence_threshold,
                iou_threshold: settings.iou_threshold,
            },
        })
    }

    fn detect_blocking(
        model: &Model,
        labels: &[String],
        params: &DecodeParams,
        image: &DocumentImage,
    ) -> Result<Vec<DetectionBox>> {
        let (input, scale) = build_input_tensor(image.pixels(), params.input_size);

        let raw_output = model
            .run_one(input.view().into(), None)
            .context("Detection model inference failed")?;
        let output: NdTensor<f32, 3> = raw_output
            .try_into()
            .map_err(|error| anyhow::anyhow!("Unexpected detection output: {:?}", error))?;

        let [batch, rows, anchors] = output.shape();
        if batch != 1 || rows <= BOX_COORDINATE_ROWS {
            anyhow::bail!(
                "Detection output has shape [{}, {}, {}], expected [1, >4, N]",
                batch,
                rows,
                anchors
            );
        }

        let values: Vec<f32> = output.iter().copied().collect();
        let candidates = decode_predictions(&values, rows, anchors, params.confidence_threshold);
        let kept = non_maximum_suppression(candidates, params.iou_threshold);

        Ok(kept
            .into_iter()
            .map(|candidate| to_detection_box(&candidate, scale, labels))
            .collect())
    }
}

#[async_trait]
impl RegionDetector for YoloRegionDetector {
    async fn detect(&self, image: &DocumentImage) -> Result<Vec<DetectionBox>> {
        log::debug!(
            "[YOLO_DETECTOR] Running detection on {}x{} image",
            image.width(),
            image.height()
        );

        let model = Arc::clone(&self.model);
        let labels = Arc::clone(&self.labels);
        let params = self.params.clone();
        let image = image.clone();

        let detections = tokio::task::spawn_blocking(move || {
            Self::detect_blocking(&model, &labels, &params, &image)
        })
        .await
        .context("Detection worker stopped unexpectedly")??;

        log::info!("[YOLO_DETECTOR] Detected {} regions", detections.len());
        Ok(detections)
    }
}

// Letterbox anchored top-left
fn build_input_tensor(image: &RgbImage, size: u32) -> (NdTensor<f32, 4>, f32) {
    let (width, height) = image.dimensions();
    let scale = size as f32 / width.max(height).max(1) as f32;
    let scaled_width = ((width as f32 * scale).round() as u32).clamp(1, size);
    let scaled_height = ((height as f32 * scale).round() as u32).clamp(1, size);

    let resized = imageops::resize(
        image,
        scaled_width,
        scaled_height,
        imageops::FilterType::Triangle,
    );
    let mut canvas = RgbImage::from_pixel(size, size, LETTERBOX_FILL);
    imageops::replace(&mut canvas, &resized, 0, 0);

    let side = size as usize;
    let mut tensor = NdTensor::zeros([1, 3, side, side]);
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for channel in 0..3 {
            tensor[[0, channel, y as usize, x as usize]] = pixel.0[channel] as f32 / 255.0;
        }
    }

    (tensor, scale)
}

fn decode_predictions(
    values: &[f32],
    rows: usize,
    anchors: usize,
    confidence_threshold: f32,
) -> Vec<Candidate> {
    let value_at = |row: usize, anchor: usize| values[row * anchors + anchor];
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let best = (BOX_COORDINATE_ROWS..rows)
            .map(|row| (row - BOX_COORDINATE_ROWS, value_at(row, anchor)))
            .max_by(|left, right| left.1.partial_cmp(&right.1).unwrap_or(Ordering::Equal));

        let Some((class_index, confidence)) = best else {
            continue;
        };
        if confidence < confidence_threshold {
            continue;
        }

        let centre_x = value_at(0, anchor);
        let centre_y = value_at(1, anchor);
        let half_width = value_at(2, anchor) / 2.0;
        let half_height = value_at(3, anchor) / 2.0;

        candidates.push(Candidate {
            class_index,
            confidence,
            x1: centre_x - half_width,
            y1: centre_y - half_height,
            x2: centre_x + half_width,
            y2: centre_y + half_height,
        });
    }

    candidates
}

fn intersection_over_union(a: &Candidate, b: &Candidate) -> f32 {
    let overlap_width = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let overlap_height = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = overlap_width * overlap_height;
    let union = a.area() + b.area() - intersection;

    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

fn non_maximum_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|left, right| {
        right
            .confidence
            .partial_cmp(&left.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let suppressed = kept.iter().any(|existing| {
            existing.class_index == candidate.class_index
                && intersection_over_union(existing, &candidate) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }

    kept
}

fn to_detection_box(candidate: &Candidate, scale: f32, labels: &[String]) -> DetectionBox {
    let label = labels
        .get(candidate.class_index)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", candidate.class_index));
    let to_source = |value: f32| (value / scale).max(0.0).round() as u32;

    DetectionBox::new(
        &label,
        to_source(candidate.x1),
        to_source(candidate.y1),
        to_source(candidate.x2),
        to_source(candidate.y2),
    )
    .with_confidence(candidate.confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        class_index: usize,
        confidence: f32,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> Candidate {
        Candidate {
            class_index,
            confidence,
            x1,
            y1,
            x2,
            y2,
        }
    }

    fn labels() -> Vec<String> {
        vec!["AADHAR_NUMBER".to_string(), "NAME".to_string()]
    }

    #[test]
    fn test_build_input_tensor_letterboxes_wide_image() {
        let image = RgbImage::from_pixel(64, 32, Rgb([255, 0, 0]));

        let (tensor, scale) = build_input_tensor(&image, 32);

        assert_eq!(tensor.shape(), [1, 3, 32, 32]);
        assert_eq!(scale, 0.5);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        let fill = 114.0 / 255.0;
        assert!((tensor[[0, 0, 31, 0]] - fill).abs() < 1e-6);
        assert!((tensor[[0, 2, 31, 31]] - fill).abs() < 1e-6);
    }

    #[test]
    fn test_decode_predictions_picks_best_class_above_threshold() {
        // 2 classes, 3 anchors laid out as [rows][anchors].
        let values = vec![
            10.0, 50.0, 90.0, // centre x
            10.0, 50.0, 90.0, // centre y
            4.0, 20.0, 8.0, // width
            2.0, 10.0, 8.0, // height
            0.9, 0.1, 0.2, // class 0
            0.05, 0.7, 0.1, // class 1
        ];

        let candidates = decode_predictions(&values, 6, 3, 0.5);

        assert_eq!(
            candidates,
            vec![
                candidate(0, 0.9, 8.0, 9.0, 12.0, 11.0),
                candidate(1, 0.7, 40.0, 45.0, 60.0, 55.0),
            ]
        );
    }

    #[test]
    fn test_intersection_over_union() {
        let a = candidate(0, 0.9, 0.0, 0.0, 10.0, 10.0);
        let b = candidate(0, 0.8, 5.0, 0.0, 15.0, 10.0);
        let disjoint = candidate(0, 0.8, 20.0, 20.0, 30.0, 30.0);

        assert!((intersection_over_union(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(intersection_over_union(&a, &disjoint), 0.0);
        assert_eq!(intersection_over_union(&a, &a), 1.0);
    }

    #[test]
    fn test_non_maximum_suppression_is_per_class_and_sorted() {
        let candidates = vec![
            candidate(0, 0.6, 1.0, 1.0, 11.0, 11.0),
            candidate(0, 0.9, 0.0, 0.0, 10.0, 10.0),
            candidate(1, 0.7, 0.0, 0.0, 10.0, 10.0),
            candidate(0, 0.5, 50.0, 50.0, 60.0, 60.0),
        ];

        let kept = non_maximum_suppression(candidates, 0.45);

        let confidences: Vec<f32> = kept.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_to_detection_box_scales_back_and_names_unknown_classes() {
        let known = to_detection_box(&candidate(1, 0.8, 10.0, 20.0, 30.0, 40.0), 0.5, &labels());
        let unknown = to_detection_box(&candidate(7, 0.8, -4.0, 0.0, 8.0, 8.0), 1.0, &labels());

        assert_eq!(known.label, "NAME");
        assert_eq!((known.x_min, known.y_min, known.x_max, known.y_max), (20, 40, 60, 80));
        assert_eq!(known.confidence, 0.8);
        assert_eq!(unknown.label, "class_7");
        assert_eq!(unknown.x_min, 0);
    }
}

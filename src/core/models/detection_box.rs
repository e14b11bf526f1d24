use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
    pub label: String,
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    pub confidence: f32,
}

impl DetectionBox {
    pub fn new(label: &str, x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Self {
        Self {
            label: label.to_string(),
            x_min,
            y_min,
            x_max,
            y_max,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }

    /// `None` when nothing of the box remains inside the image.
    pub fn clamped_to(&self, image_width: u32, image_height: u32) -> Option<Self> {
        let x_min = self.x_min.min(image_width);
        let y_min = self.y_min.min(image_height);
        let x_max = self.x_max.min(image_width);
        let y_max = self.y_max.min(image_height);

        if x_min >= x_max || y_min >= y_max {
            log::debug!(
                "[DETECTION_BOX] rejecting '{}' ({},{})-({},{}) against {}x{}",
                self.label,
                self.x_min,
                self.y_min,
                self.x_max,
                self.y_max,
                image_width,
                image_height
            );
            return None;
        }

        Some(Self {
            label: self.label.clone(),
            x_min,
            y_min,
            x_max,
            y_max,
            confidence: self.confidence,
        })
    }
}

//! Wire types for the detection service.

use serde::{Deserialize, Serialize};

use croscope_protocols::BoundingBox;

/// `POST {endpoint}/detect` body.
#[derive(Debug, Serialize)]
pub struct DetectRequest {
    /// Base64-encoded image.
    pub image: String,
    pub media_type: String,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// One detected UI element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    #[serde(alias = "class", alias = "label")]
    pub class_name: String,
    pub confidence: f32,
    #[serde(alias = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    /// Whether the class name contains any of `classes`, case-insensitively.
    pub fn is_any(&self, classes: &[&str]) -> bool {
        let name = self.class_name.to_lowercase();
        classes.iter().any(|c| name.contains(c))
    }

    pub fn center_y(&self) -> f32 {
        self.bbox.y + self.bbox.height / 2.0
    }
}

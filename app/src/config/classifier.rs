use serde::Deserialize;

use crate::models::{FingerExtensionClassifier, DEFAULT_FINGER_THRESHOLD, DEFAULT_THUMB_THRESHOLD};

/// Joint angle thresholds in degrees; a finger is extended above its threshold.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub thumb_threshold: f32,
    pub finger_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thumb_threshold: DEFAULT_THUMB_THRESHOLD,
            finger_threshold: DEFAULT_FINGER_THRESHOLD,
        }
    }
}

impl ClassifierConfig {
    pub fn classifier(&self) -> FingerExtensionClassifier {
        FingerExtensionClassifier::new(self.thumb_threshold, self.finger_threshold)
    }
}

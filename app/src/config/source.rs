use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_SOCKET: &str = "/tmp/handpose.sock";
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.7;

/// Where the hand pose estimator listens, and how much of its output to trust.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub socket: PathBuf,
    pub min_detection_confidence: f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            socket: PathBuf::from(DEFAULT_SOCKET),
            min_detection_confidence: DEFAULT_MIN_DETECTION_CONFIDENCE,
        }
    }
}

use std::ops::Index;

use error_stack::Report;
use glam::Vec3A;
use serde::Deserialize;

use crate::{GError, HasGlamPosition};

pub const NUM_LANDMARKS: usize = 21;

/// Hand joint ids, in the order the pose estimator reports them.
#[allow(dead_code)]
pub mod joints {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

#[derive(Default, Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(from = "[f32; 3]")]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for LandmarkPoint {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3A> for LandmarkPoint {
    fn from(v: Vec3A) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl HasGlamPosition for LandmarkPoint {
    fn pos(&self) -> Vec3A {
        Vec3A::new(self.x, self.y, self.z)
    }
}

/// The 21 landmarks of a single tracked hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: [LandmarkPoint; NUM_LANDMARKS],
}

impl HandObservation {
    pub fn new(landmarks: [LandmarkPoint; NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    pub fn landmarks(&self) -> &[LandmarkPoint; NUM_LANDMARKS] {
        &self.landmarks
    }
}

impl Index<usize> for HandObservation {
    type Output = LandmarkPoint;

    fn index(&self, joint: usize) -> &Self::Output {
        &self.landmarks[joint]
    }
}

impl TryFrom<Vec<LandmarkPoint>> for HandObservation {
    type Error = Report<GError>;

    fn try_from(value: Vec<LandmarkPoint>) -> std::result::Result<Self, Self::Error> {
        let len = value.len();
        let landmarks: [LandmarkPoint; NUM_LANDMARKS] = value.try_into().map_err(|_| {
            Report::new(GError::InvalidObservation).attach_printable(format!(
                "expected {NUM_LANDMARKS} landmarks, got {len}"
            ))
        })?;

        Ok(Self { landmarks })
    }
}

/// What the hand pose estimator saw during one cycle.
#[derive(Debug, Clone, PartialEq, strum_macros::EnumIs)]
pub enum Observation {
    NoHand,
    Hand(HandObservation),
}

impl Observation {
    pub fn hand(&self) -> Option<&HandObservation> {
        match self {
            Self::Hand(hand) => Some(hand),
            Self::NoHand => None,
        }
    }
}

impl From<Option<HandObservation>> for Observation {
    fn from(value: Option<HandObservation>) -> Self {
        value.map_or(Self::NoHand, Self::Hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_landmark_count() {
        let short = vec![LandmarkPoint::default(); 20];
        assert!(HandObservation::try_from(short).is_err());

        let long = vec![LandmarkPoint::default(); 22];
        assert!(HandObservation::try_from(long).is_err());
    }

    #[test]
    fn indexes_by_joint_id() {
        let points = (0..NUM_LANDMARKS)
            .map(|i| LandmarkPoint::new(i as f32, 0.0, 0.0))
            .collect::<Vec<_>>();
        let hand = HandObservation::try_from(points).unwrap();

        assert_eq!(hand[joints::WRIST].x, 0.0);
        assert_eq!(hand[joints::INDEX_TIP].x, 8.0);
        assert_eq!(hand[joints::PINKY_TIP].x, 20.0);
    }

    #[test]
    fn deserializes_from_triples() {
        let point: LandmarkPoint = serde_json::from_str("[0.25, 0.5, -0.125]").unwrap();
        assert_eq!(point, LandmarkPoint::new(0.25, 0.5, -0.125));
    }
}

use std::fmt;
use std::ops::Index;

use crate::math::joint_angle;
use crate::models::hand::{joints, HandObservation};

pub const DEFAULT_THUMB_THRESHOLD: f32 = 150.0;
pub const DEFAULT_FINGER_THRESHOLD: f32 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Joints whose angle decides extension: (base, middle joint, tip).
    ///
    /// The thumb skips its IP joint and measures CMC-MCP-TIP instead.
    pub fn joints(&self) -> (usize, usize, usize) {
        match self {
            Self::Thumb => (joints::THUMB_CMC, joints::THUMB_MCP, joints::THUMB_TIP),
            Self::Index => (joints::INDEX_MCP, joints::INDEX_PIP, joints::INDEX_TIP),
            Self::Middle => (joints::MIDDLE_MCP, joints::MIDDLE_PIP, joints::MIDDLE_TIP),
            Self::Ring => (joints::RING_MCP, joints::RING_PIP, joints::RING_TIP),
            Self::Pinky => (joints::PINKY_MCP, joints::PINKY_PIP, joints::PINKY_TIP),
        }
    }

    fn position(&self) -> usize {
        *self as usize
    }
}

/// Which fingers are straightened, ordered thumb to pinky.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionVector([bool; 5]);

impl ExtensionVector {
    pub fn new(extended: [bool; 5]) -> Self {
        Self(extended)
    }

    pub fn extended_count(&self) -> usize {
        self.0.iter().filter(|x| **x).count()
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger.position()]
    }

    pub fn as_array(&self) -> [bool; 5] {
        self.0
    }
}

impl From<[u8; 5]> for ExtensionVector {
    fn from(bits: [u8; 5]) -> Self {
        Self(bits.map(|b| b != 0))
    }
}

impl Index<Finger> for ExtensionVector {
    type Output = bool;

    fn index(&self, finger: Finger) -> &Self::Output {
        &self.0[finger.position()]
    }
}

impl fmt::Display for ExtensionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, extended) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", u8::from(*extended))?;
        }
        write!(f, "]")
    }
}

/// Decides finger extension from the angle at each finger's middle joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerExtensionClassifier {
    pub thumb_threshold: f32,
    pub finger_threshold: f32,
}

impl Default for FingerExtensionClassifier {
    fn default() -> Self {
        Self {
            thumb_threshold: DEFAULT_THUMB_THRESHOLD,
            finger_threshold: DEFAULT_FINGER_THRESHOLD,
        }
    }
}

impl FingerExtensionClassifier {
    pub fn new(thumb_threshold: f32, finger_threshold: f32) -> Self {
        Self {
            thumb_threshold,
            finger_threshold,
        }
    }

    pub fn threshold(&self, finger: Finger) -> f32 {
        match finger {
            Finger::Thumb => self.thumb_threshold,
            _ => self.finger_threshold,
        }
    }

    pub fn is_extended(&self, hand: &HandObservation, finger: Finger) -> bool {
        let (base, mid, tip) = finger.joints();
        joint_angle(&hand[base], &hand[mid], &hand[tip]) > self.threshold(finger)
    }

    pub fn classify(&self, hand: &HandObservation) -> ExtensionVector {
        ExtensionVector(Finger::ALL.map(|finger| self.is_extended(hand, finger)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::hand::{LandmarkPoint, NUM_LANDMARKS};

    /// Builds a hand where each finger is laid out along its own ray from the
    /// wrist, either straight or folded back over itself.
    pub(crate) fn hand_with(extended: [bool; 5]) -> HandObservation {
        let mut points = [LandmarkPoint::default(); NUM_LANDMARKS];

        for (finger, straight) in Finger::ALL.iter().zip(extended) {
            let (base, mid, tip) = finger.joints();
            let lane = finger.position() as f32 * 0.1;

            points[base] = LandmarkPoint::new(lane, 0.5, 0.0);
            points[mid] = LandmarkPoint::new(lane, 0.4, 0.0);
            // the joint between mid and tip isn't measured, keep it between them
            points[mid + 1] = LandmarkPoint::new(lane, 0.35, 0.0);
            points[tip] = if straight {
                LandmarkPoint::new(lane, 0.3, 0.0)
            } else {
                LandmarkPoint::new(lane + 0.05, 0.45, 0.0)
            };
        }

        HandObservation::new(points)
    }

    #[test]
    fn open_hand_is_fully_extended() {
        let classifier = FingerExtensionClassifier::default();
        let vector = classifier.classify(&hand_with([true; 5]));

        assert_eq!(vector, ExtensionVector::new([true; 5]));
        assert_eq!(vector.extended_count(), 5);
    }

    #[test]
    fn fist_is_fully_curled() {
        let classifier = FingerExtensionClassifier::default();
        let vector = classifier.classify(&hand_with([false; 5]));

        assert_eq!(vector.extended_count(), 0);
    }

    #[test]
    fn each_finger_is_independent() {
        let classifier = FingerExtensionClassifier::default();
        let pattern = [false, true, true, false, false];

        assert_eq!(
            classifier.classify(&hand_with(pattern)),
            ExtensionVector::new(pattern)
        );
    }

    #[test]
    fn thumb_uses_lower_threshold() {
        let mut points = *hand_with([false; 5]).landmarks();
        // 155 degrees at the thumb MCP: over the thumb threshold, under the finger one
        let bend = 155f32.to_radians();
        points[joints::THUMB_CMC] = LandmarkPoint::new(1.0, 0.0, 0.0);
        points[joints::THUMB_MCP] = LandmarkPoint::new(0.0, 0.0, 0.0);
        points[joints::THUMB_TIP] = LandmarkPoint::new(bend.cos(), bend.sin(), 0.0);
        let hand = HandObservation::new(points);

        let classifier = FingerExtensionClassifier::default();
        assert!(classifier.is_extended(&hand, Finger::Thumb));
        assert!(!FingerExtensionClassifier::new(160.0, 160.0).is_extended(&hand, Finger::Thumb));
    }

    #[test]
    fn collapsed_finger_counts_as_curled() {
        let mut points = *hand_with([true; 5]).landmarks();
        points[joints::INDEX_PIP] = points[joints::INDEX_MCP];
        let hand = HandObservation::new(points);

        let vector = FingerExtensionClassifier::default().classify(&hand);
        assert!(!vector[Finger::Index]);
        assert!(vector[Finger::Middle]);
    }

    #[test]
    fn displays_as_bits() {
        let vector = ExtensionVector::from([0, 1, 1, 0, 0]);
        assert_eq!(vector.to_string(), "[0, 1, 1, 0, 0]");
    }
}

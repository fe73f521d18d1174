mod fingers;
mod gesture;
mod hand;

pub use fingers::{
    ExtensionVector, Finger, FingerExtensionClassifier, DEFAULT_FINGER_THRESHOLD,
    DEFAULT_THUMB_THRESHOLD,
};
pub use gesture::Gesture;
pub use hand::{joints, HandObservation, LandmarkPoint, Observation, NUM_LANDMARKS};

#[cfg(test)]
pub(crate) use fingers::tests::hand_with;

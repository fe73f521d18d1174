use std::sync::Arc;
use std::thread::{self, JoinHandle};

use error_stack::{Result, ResultExt};
use log::{debug, info};

use crate::models::{ExtensionVector, FingerExtensionClassifier, Gesture, Observation};
use crate::state::GestureContext;
use crate::traits::HandPoseSource;
use crate::GError;

/// How a processing run went.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub cycles: u64,
    pub changes: u64,
    pub last: Gesture,
}

/// Pulls observations from the estimator and publishes the resulting gesture.
pub struct ProcessingLoop<S> {
    source: S,
    classifier: FingerExtensionClassifier,
    context: Arc<GestureContext>,
}

pub fn classify_observation(
    classifier: &FingerExtensionClassifier,
    observation: &Observation,
) -> (Option<ExtensionVector>, Gesture) {
    match observation.hand() {
        Some(hand) => {
            let fingers = classifier.classify(hand);
            (Some(fingers), Gesture::classify(&fingers))
        }
        None => (None, Gesture::None),
    }
}

impl<S: HandPoseSource> ProcessingLoop<S> {
    pub fn new(
        source: S,
        classifier: FingerExtensionClassifier,
        context: Arc<GestureContext>,
    ) -> Self {
        Self {
            source,
            classifier,
            context,
        }
    }

    /// Runs until the source ends, fails, or the context is stopped.
    ///
    /// The shared gesture is only written when it differs from the previous
    /// cycle's result.
    pub fn run(mut self) -> Result<LoopSummary, GError> {
        let mut summary = LoopSummary {
            last: self.context.gesture().get(),
            ..Default::default()
        };

        while self.context.is_running() {
            let Some(observation) = self
                .source
                .next_observation()
                .change_context(GError::SourceError)?
            else {
                info!("hand pose stream ended after {} cycles", summary.cycles);
                break;
            };

            summary.cycles += 1;
            let (fingers, gesture) = classify_observation(&self.classifier, &observation);

            if gesture != summary.last {
                if let Some(fingers) = fingers {
                    debug!("fingers: {fingers}");
                }
                info!("gesture: {} -> {}", summary.last, gesture);

                self.context.gesture().set(gesture);
                summary.last = gesture;
                summary.changes += 1;
            }
        }

        Ok(summary)
    }
}

impl<S: HandPoseSource + Send + 'static> ProcessingLoop<S> {
    pub fn spawn(self) -> JoinHandle<Result<LoopSummary, GError>> {
        thread::spawn(move || self.run())
    }
}

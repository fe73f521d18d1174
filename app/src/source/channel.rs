use std::collections::VecDeque;

use error_stack::Result;
use flume::{unbounded, Receiver, RecvError, Sender};

use crate::models::Observation;
use crate::traits::HandPoseSource;
use crate::GError;

/// Observations pushed by an in-process producer. Dropping every sender ends
/// the stream.
pub struct ChannelSource {
    receiver: Receiver<Observation>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Observation>) -> Self {
        Self { receiver }
    }

    pub fn unbounded() -> (Sender<Observation>, Self) {
        let (sender, receiver) = unbounded();
        (sender, Self::new(receiver))
    }
}

impl HandPoseSource for ChannelSource {
    fn next_observation(&mut self) -> Result<Option<Observation>, GError> {
        match self.receiver.recv() {
            Ok(observation) => Ok(Some(observation)),
            Err(RecvError::Disconnected) => Ok(None),
        }
    }
}

/// A fixed, prerecorded sequence of observations.
#[derive(Default, Debug, Clone)]
pub struct ReplaySource {
    observations: VecDeque<Observation>,
}

impl ReplaySource {
    pub fn new(observations: impl IntoIterator<Item = Observation>) -> Self {
        Self {
            observations: observations.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.observations.len()
    }
}

impl FromIterator<Observation> for ReplaySource {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl HandPoseSource for ReplaySource {
    fn next_observation(&mut self) -> Result<Option<Observation>, GError> {
        Ok(self.observations.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ends_when_senders_drop() {
        let (sender, mut source) = ChannelSource::unbounded();
        sender.send(Observation::NoHand).unwrap();
        drop(sender);

        assert_eq!(source.next_observation().unwrap(), Some(Observation::NoHand));
        assert_eq!(source.next_observation().unwrap(), None);
    }

    #[test]
    fn replay_drains_in_order() {
        let hand = crate::models::hand_with([true; 5]);
        let mut source: ReplaySource = [Observation::Hand(hand.clone()), Observation::NoHand]
            .into_iter()
            .collect();

        assert_eq!(source.remaining(), 2);
        assert_eq!(source.next_observation().unwrap(), Some(Observation::Hand(hand)));
        assert_eq!(source.next_observation().unwrap(), Some(Observation::NoHand));
        assert_eq!(source.next_observation().unwrap(), None);
    }
}

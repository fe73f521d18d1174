use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

use error_stack::{Result, ResultExt};
use log::debug;
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::models::{HandObservation, LandmarkPoint, Observation};
use crate::traits::{HandPoseSource, WantIpc};
use crate::GError;

/// Hand pose estimator running as a separate process.
///
/// Every cycle a frame counter is written as a request, and the estimator answers
/// with one length prefixed JSON [`HandPoseMessage`]. An empty answer or a closed
/// socket ends the stream.
pub struct IpcHandPose<S = UnixStream> {
    stream: S,
    min_detection_confidence: f32,
    frame: u32,
}

impl IpcHandPose<UnixStream> {
    pub fn connect(config: &SourceConfig) -> Result<Self, GError> {
        let stream = UnixStream::connect(&config.socket)
            .change_context(GError::IpcError)
            .attach_printable_lazy(|| {
                format!("Couldn't reach the estimator at {}", config.socket.display())
            })?;

        Ok(Self::new(stream, config.min_detection_confidence))
    }
}

impl<S: Read + Write> IpcHandPose<S> {
    pub fn new(stream: S, min_detection_confidence: f32) -> Self {
        Self {
            stream,
            min_detection_confidence,
            frame: 0,
        }
    }

    fn decode(&self, msg: &[u8]) -> Result<Observation, GError> {
        let msg: HandPoseMessage = serde_json::from_slice(msg)
            .change_context(GError::IpcError)
            .attach_printable("Estimator sent malformed JSON")?;

        let Some(landmarks) = msg.landmarks else {
            return Ok(Observation::NoHand);
        };

        if let Some(score) = msg.score {
            if score < self.min_detection_confidence {
                debug!("dropping hand with score {score} in frame {}", self.frame);
                return Ok(Observation::NoHand);
            }
        }

        let hand = HandObservation::try_from(landmarks).change_context(GError::SourceError)?;
        Ok(Observation::Hand(hand))
    }
}

impl<S: Read + Write> WantIpc for IpcHandPose<S> {
    type Stream = S;

    fn ipc_stream(&mut self) -> &mut Self::Stream {
        &mut self.stream
    }
}

impl<S: Read + Write> HandPoseSource for IpcHandPose<S> {
    fn next_observation(&mut self) -> Result<Option<Observation>, GError> {
        self.frame = self.frame.wrapping_add(1);
        if !self
            .send_request(self.frame)
            .attach_printable("Couldn't request the next frame")?
        {
            return Ok(None);
        }

        match self.recv_ipc()? {
            Some(msg) if !msg.is_empty() => self.decode(&msg).map(Some),
            _ => Ok(None),
        }
    }
}

/// One estimator answer. `landmarks` is null when no hand was found.
#[derive(Default, Debug, Deserialize)]
pub struct HandPoseMessage {
    pub landmarks: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub score: Option<f32>,
}

#[cfg(test)]
mod tests {
    use std::thread;

    use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};

    use super::*;
    use crate::models::NUM_LANDMARKS;

    fn reply(stream: &mut UnixStream, body: &str) {
        stream.read_u32::<NetworkEndian>().unwrap();
        stream
            .write_u32::<NetworkEndian>(body.len() as u32)
            .unwrap();
        stream.write_all(body.as_bytes()).unwrap();
    }

    fn landmarks_json(count: usize) -> String {
        let points = vec!["[0.5, 0.5, 0.0]"; count].join(",");
        format!("[{points}]")
    }

    #[test]
    fn reads_hands_until_eof() {
        let (client, mut estimator) = UnixStream::pair().unwrap();

        let handle = thread::spawn(move || {
            reply(&mut estimator, &format!(r#"{{"landmarks": {}, "score": 0.9}}"#, landmarks_json(NUM_LANDMARKS)));
            reply(&mut estimator, r#"{"landmarks": null}"#);
            reply(&mut estimator, &format!(r#"{{"landmarks": {}, "score": 0.2}}"#, landmarks_json(NUM_LANDMARKS)));
        });

        let mut source = IpcHandPose::new(client, 0.7);
        assert!(source.next_observation().unwrap().unwrap().is_hand());
        assert!(source.next_observation().unwrap().unwrap().is_no_hand());
        // below the confidence threshold
        assert!(source.next_observation().unwrap().unwrap().is_no_hand());

        handle.join().unwrap();
        assert!(source.next_observation().unwrap().is_none());
    }

    #[test]
    fn empty_frame_ends_stream() {
        let (client, mut estimator) = UnixStream::pair().unwrap();

        let handle = thread::spawn(move || reply(&mut estimator, ""));

        let mut source = IpcHandPose::new(client, 0.7);
        assert!(source.next_observation().unwrap().is_none());
        handle.join().unwrap();
    }

    #[test]
    fn wrong_landmark_count_is_an_error() {
        let (client, mut estimator) = UnixStream::pair().unwrap();

        let handle = thread::spawn(move || {
            reply(&mut estimator, &format!(r#"{{"landmarks": {}}}"#, landmarks_json(5)));
        });

        let mut source = IpcHandPose::new(client, 0.7);
        let err = source.next_observation().unwrap_err();
        assert!(matches!(err.current_context(), GError::SourceError));
        handle.join().unwrap();
    }
}

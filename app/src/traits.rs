use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use error_stack::{Result, ResultExt};
use glam::Vec3A;

use std::io::{ErrorKind, Read, Write};

use crate::models::Observation;
use crate::GError;

pub trait HasGlamPosition {
    fn pos(&self) -> Vec3A;
}

/// The external hand pose estimator, seen from the processing loop.
pub trait HandPoseSource {
    /// Blocks until the next observation is available.
    ///
    /// `Ok(None)` means the stream has ended and no more observations will come.
    fn next_observation(&mut self) -> Result<Option<Observation>, GError>;
}

impl<S: HandPoseSource + ?Sized> HandPoseSource for Box<S> {
    fn next_observation(&mut self) -> Result<Option<Observation>, GError> {
        (**self).next_observation()
    }
}

/// Length prefixed framing shared with the estimator process.
pub(crate) trait WantIpc {
    type Stream: Read + Write;

    fn ipc_stream(&mut self) -> &mut Self::Stream;

    /// Asks the estimator for the next frame. `Ok(false)` if it has hung up.
    fn send_request(&mut self, frame: u32) -> Result<bool, GError> {
        match self.ipc_stream().write_u32::<NetworkEndian>(frame) {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.kind(), ErrorKind::BrokenPipe | ErrorKind::ConnectionReset) => {
                Ok(false)
            }
            Err(e) => Err(e).change_context(GError::IpcError),
        }
    }

    /// Reads one framed message. `Ok(None)` if the peer closed the stream
    /// cleanly before the next frame.
    fn recv_ipc(&mut self) -> Result<Option<Vec<u8>>, GError> {
        let msg_len = match self.ipc_stream().read_u32::<NetworkEndian>() {
            Ok(len) => len as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e).change_context(GError::IpcError),
        };

        let mut msg = vec![0; msg_len];
        self.ipc_stream()
            .read_exact(&mut msg)
            .change_context(GError::IpcError)
            .attach_printable("Stream ended in the middle of a frame")?;

        Ok(Some(msg))
    }
}

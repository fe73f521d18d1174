use std::io::{ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use error_stack::{Report, Result, ResultExt};
use log::{info, warn};

use crate::models::Gesture;
use crate::GError;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RETRY: Duration = Duration::from_secs(2);

/// Reading end of the gesture stream.
pub struct GestureClient {
    stream: TcpStream,
    current: Gesture,
    buf: [u8; 1024],
}

impl GestureClient {
    /// Tries every address `addr` resolves to, each with [`CONNECT_TIMEOUT`].
    pub fn connect(addr: &str) -> Result<Self, GError> {
        let addrs = addr
            .to_socket_addrs()
            .change_context(GError::ConnectionError)
            .attach_printable_lazy(|| format!("Couldn't resolve {addr}"))?;

        let mut last_err = None;
        for candidate in addrs {
            match TcpStream::connect_timeout(&candidate, CONNECT_TIMEOUT) {
                Ok(stream) => return Ok(Self::from_stream(stream)),
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => Report::new(e).change_context(GError::ConnectionError),
            None => Report::new(GError::ConnectionError),
        })
        .attach_printable_lazy(|| format!("address: {addr}"))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            current: Gesture::default(),
            buf: [0; 1024],
        }
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), GError> {
        self.stream
            .set_read_timeout(timeout)
            .change_context(GError::ConnectionError)
    }

    /// Last label decoded from the stream.
    pub fn current(&self) -> Gesture {
        self.current
    }

    /// Blocks for the next chunk and returns the gesture it ends with.
    ///
    /// A chunk ending mid-label keeps the previous gesture. `Ok(None)` once the
    /// server closes the connection.
    pub fn next_gesture(&mut self) -> Result<Option<Gesture>, GError> {
        let read = self
            .stream
            .read(&mut self.buf)
            .change_context(GError::CommError)?;

        if read == 0 {
            return Ok(None);
        }

        let chunk = String::from_utf8_lossy(&self.buf[..read]);
        if let Some(gesture) = Gesture::from_wire_chunk(&chunk) {
            self.current = gesture;
        }

        Ok(Some(self.current))
    }
}

/// Follows the server at `addr`, reconnecting after `retry` whenever the
/// connection drops, and reports every change of gesture. Returns once
/// `keep_going` is false.
pub fn watch(
    addr: &str,
    retry: Duration,
    keep_going: impl Fn() -> bool,
    mut on_change: impl FnMut(Gesture),
) {
    let mut last = None;

    while keep_going() {
        let mut client = match GestureClient::connect(addr) {
            Ok(client) => client,
            Err(e) => {
                warn!("{e}, retrying in {retry:?}");
                thread::sleep(retry);
                continue;
            }
        };
        info!("connected to {addr}");

        // wake up regularly to notice a stop request
        if let Err(e) = client.set_read_timeout(Some(Duration::from_millis(500))) {
            warn!("{e:?}");
        }

        while keep_going() {
            match client.next_gesture() {
                Ok(Some(gesture)) => {
                    if last != Some(gesture) {
                        last = Some(gesture);
                        on_change(gesture);
                    }
                }
                Ok(None) => {
                    warn!("server closed the connection, reconnecting");
                    break;
                }
                Err(e) => {
                    let timed_out = e.downcast_ref::<std::io::Error>().is_some_and(|io| {
                        matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
                    });
                    if timed_out {
                        continue;
                    }
                    warn!("lost connection: {e}, reconnecting");
                    break;
                }
            }
        }

        if keep_going() {
            thread::sleep(retry);
        }
    }
}

use std::collections::HashMap;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use error_stack::{Result, ResultExt};
use flume::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use crate::state::GestureContext;
use crate::GError;

/// A send blocked this long means the client stopped reading.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Streams the current gesture to one client, once per tick, until a write
/// fails or the registry stops it. Never reads from the client.
pub struct Session {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    context: Arc<GestureContext>,
    tick: Duration,
    stop: Receiver<()>,
}

impl Session {
    /// Returns the number of labels sent.
    pub fn run(mut self) -> Result<u64, GError> {
        let _client = self.context.client_guard();
        info!(
            "session {} opened for {} ({} connected)",
            self.id,
            self.peer,
            self.context.connected_clients()
        );

        let mut sent = 0;
        let result = loop {
            let gesture = self.context.gesture().get();
            if let Err(e) = self.stream.write_all(gesture.to_wire()) {
                break Err(e)
                    .change_context(GError::SessionError)
                    .attach_printable_lazy(|| format!("peer {} after {sent} sends", self.peer));
            }
            sent += 1;

            match self.stop.recv_timeout(self.tick) {
                Err(RecvTimeoutError::Timeout) => {}
                // the registry dropped its end
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break Ok(sent),
            }
        };

        let _ = self.stream.shutdown(Shutdown::Both);
        result
    }
}

struct SessionEntry {
    peer: SocketAddr,
    stream: TcpStream,
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Every session spawned by a server, so shutdown can close and join them all.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, SessionEntry>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        context: Arc<GestureContext>,
        tick: Duration,
    ) -> Result<u64, GError> {
        stream
            .set_nonblocking(false)
            .and_then(|_| stream.set_nodelay(true))
            .and_then(|_| stream.set_write_timeout(Some(WRITE_TIMEOUT)))
            .change_context(GError::SessionError)
            .attach_printable("Couldn't configure client socket")?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (stop, stop_receiver) = bounded(1);
        let session = Session {
            id,
            peer,
            stream: stream
                .try_clone()
                .change_context(GError::SessionError)?,
            context,
            tick,
            stop: stop_receiver,
        };

        let handle = thread::Builder::new()
            .name(format!("session-{id}"))
            .spawn(move || match session.run() {
                Ok(sent) => info!("session {id} for {peer} stopped after {sent} sends"),
                Err(e) => {
                    info!("session {id} for {peer} closed: {e}");
                    debug!("{e:?}");
                }
            })
            .change_context(GError::SessionError)
            .attach_printable("Couldn't spawn session thread")?;

        self.lock().insert(
            id,
            SessionEntry {
                peer,
                stream,
                stop,
                handle,
            },
        );

        Ok(id)
    }

    /// Joins sessions whose client has gone away. Returns how many were removed.
    pub fn reap(&self) -> usize {
        let finished = {
            let mut sessions = self.lock();
            let ids = sessions
                .iter()
                .filter(|(_, entry)| entry.handle.is_finished())
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();

            ids.into_iter()
                .filter_map(|id| sessions.remove(&id))
                .collect::<Vec<_>>()
        };

        let count = finished.len();
        for entry in finished {
            Self::join(entry);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| !entry.handle.is_finished())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every connection and waits for all session threads to exit.
    pub fn shutdown(&self) {
        let sessions = self.lock().drain().map(|(_, entry)| entry).collect::<Vec<_>>();
        if !sessions.is_empty() {
            info!("closing {} session(s)", sessions.len());
        }

        for entry in &sessions {
            let _ = entry.stop.try_send(());
            if let Err(e) = entry.stream.shutdown(Shutdown::Both) {
                debug!("closing {}: {e}", entry.peer);
            }
        }

        for entry in sessions {
            Self::join(entry);
        }
    }

    fn join(entry: SessionEntry) {
        if entry.handle.join().is_err() {
            warn!("session thread for {} panicked", entry.peer);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

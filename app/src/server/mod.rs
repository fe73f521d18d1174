use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use error_stack::{Result, ResultExt};
use log::{error, info, warn};

mod session;

pub use session::{Session, SessionRegistry, WRITE_TIMEOUT};

use crate::config::ServerConfig;
use crate::state::GestureContext;
use crate::GError;

/// How often a nonblocking accept is retried while idle.
pub const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Stops a running [`BroadcastServer`] from another thread.
#[derive(Clone, Debug, Default)]
pub struct ServerHandle {
    shutdown: Arc<AtomicBool>,
}

impl ServerHandle {
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Accepts clients and gives each one a [`Session`] streaming the shared gesture.
pub struct BroadcastServer {
    listener: TcpListener,
    context: Arc<GestureContext>,
    tick: Duration,
    sessions: SessionRegistry,
    handle: ServerHandle,
}

impl BroadcastServer {
    pub fn bind(addr: &str, context: Arc<GestureContext>, tick: Duration) -> Result<Self, GError> {
        let listener = TcpListener::bind(addr)
            .change_context(GError::BindError)
            .attach_printable_lazy(|| format!("address: {addr}"))?;
        // polled, so shutdown never waits on a blocked accept
        listener
            .set_nonblocking(true)
            .change_context(GError::BindError)?;

        Ok(Self {
            listener,
            context,
            tick,
            sessions: SessionRegistry::new(),
            handle: ServerHandle::default(),
        })
    }

    pub fn from_config(config: &ServerConfig, context: Arc<GestureContext>) -> Result<Self, GError> {
        Self::bind(&config.addr(), context, config.tick())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, GError> {
        self.listener
            .local_addr()
            .change_context(GError::BindError)
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Accepts until shut down or the listener fails. Either way the listener is
    /// closed and every session is closed and joined before returning.
    pub fn run(self) -> Result<(), GError> {
        let Self {
            listener,
            context,
            tick,
            sessions,
            handle,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            info!("broadcasting gestures on {addr}, waiting for connection");
        }

        let result = loop {
            if handle.is_shutdown() {
                break Ok(());
            }

            match listener.accept() {
                Ok((stream, peer)) => {
                    sessions.reap();
                    if let Err(e) = sessions.spawn(stream, peer, Arc::clone(&context), tick) {
                        warn!("dropping connection from {peer}: {e:?}");
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                            | ErrorKind::Interrupted
                    ) =>
                {
                    warn!("failed to accept connection: {e}");
                }
                Err(e) => break Err(e).change_context(GError::AcceptError),
            }
        };

        drop(listener);
        sessions.shutdown();

        match &result {
            Ok(()) => info!("broadcast server stopped"),
            Err(e) => error!("broadcast server failed: {e:?}"),
        }
        result
    }

    pub fn spawn(self) -> (ServerHandle, JoinHandle<Result<(), GError>>) {
        let handle = self.handle();
        (handle, thread::spawn(move || self.run()))
    }
}

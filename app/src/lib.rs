use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;

use error_stack::{Report, ResultExt};
use log::{info, warn};

mod error;

pub mod client;
pub mod config;
pub mod math;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod state;
pub mod traits;

pub use config::Config;
pub use error::GError;
pub use models::{ExtensionVector, FingerExtensionClassifier, Gesture, HandObservation, Observation};
pub use pipeline::{LoopSummary, ProcessingLoop};
pub use server::{BroadcastServer, ServerHandle};
pub use state::{GestureContext, SharedGestureState};
pub use traits::{HandPoseSource, HasGlamPosition};

/// Wires the processing loop and the broadcast server around one context.
pub struct App {
    pub config: Config,
    pub context: Arc<GestureContext>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            context: GestureContext::shared(),
        }
    }

    /// Binds the listener first, then starts classifying observations from
    /// `source`. Each runs on its own thread.
    pub fn start<S>(&self, source: S) -> error_stack::Result<RunningApp, GError>
    where
        S: HandPoseSource + Send + 'static,
    {
        let server = BroadcastServer::from_config(&self.config.server, Arc::clone(&self.context))?;
        let local_addr = server.local_addr()?;
        let (server_handle, server_thread) = server.spawn();

        let processing = ProcessingLoop::new(
            source,
            self.config.classifier.classifier(),
            Arc::clone(&self.context),
        )
        .spawn();

        Ok(RunningApp {
            context: Arc::clone(&self.context),
            local_addr,
            server_handle,
            server_thread: Some(server_thread),
            processing: Some(processing),
        })
    }
}

type Worker<T> = Option<JoinHandle<error_stack::Result<T, GError>>>;

pub struct RunningApp {
    context: Arc<GestureContext>,
    local_addr: SocketAddr,
    server_handle: ServerHandle,
    server_thread: Worker<()>,
    processing: Worker<LoopSummary>,
}

impl RunningApp {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn context(&self) -> &Arc<GestureContext> {
        &self.context
    }

    pub fn processing_finished(&self) -> bool {
        self.processing.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn server_finished(&self) -> bool {
        self.server_thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Collects the processing loop's outcome once it has ended on its own.
    /// Sessions keep streaming the last gesture afterwards.
    pub fn take_processing_result(&mut self) -> Option<error_stack::Result<LoopSummary, GError>> {
        if !self.processing_finished() {
            return None;
        }
        self.processing.take().map(join_worker)
    }

    /// Stops both halves. The server is always joined; the processing loop is
    /// joined only if it isn't blocked waiting on its source.
    pub fn shutdown(mut self) -> error_stack::Result<(), GError> {
        self.context.stop();
        self.server_handle.shutdown();

        let server = self.server_thread.take().map(join_worker).unwrap_or(Ok(()));

        match self.take_processing_result() {
            Some(Ok(summary)) => info!(
                "processed {} cycles, {} gesture changes",
                summary.cycles, summary.changes
            ),
            Some(Err(e)) => warn!("processing loop failed: {e:?}"),
            None if self.processing.is_some() => {
                warn!("processing loop still waiting on its source, leaving it behind")
            }
            None => {}
        }

        server
    }
}

fn join_worker<T>(
    handle: JoinHandle<error_stack::Result<T, GError>>,
) -> error_stack::Result<T, GError> {
    handle
        .join()
        .map_err(|_| Report::new(GError::CommError))
        .attach_printable("worker thread panicked")?
}

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::Gesture;

/// The latest published gesture.
///
/// A single lock guards the value, so a reader always sees one complete write.
#[derive(Debug, Default)]
pub struct SharedGestureState {
    current: Mutex<Gesture>,
}

impl SharedGestureState {
    pub fn new(initial: Gesture) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    pub fn get(&self) -> Gesture {
        // a Gesture is Copy, so a poisoned lock still holds a whole value
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, gesture: Gesture) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = gesture;
    }
}

/// Everything the processing loop and the broadcast server share, built once
/// at startup and handed to both.
#[derive(Debug)]
pub struct GestureContext {
    gesture: SharedGestureState,
    clients: AtomicUsize,
    running: AtomicBool,
}

impl Default for GestureContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureContext {
    pub fn new() -> Self {
        Self {
            gesture: SharedGestureState::default(),
            clients: AtomicUsize::new(0),
            running: AtomicBool::new(true),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn gesture(&self) -> &SharedGestureState {
        &self.gesture
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.load(Ordering::SeqCst)
    }

    pub fn is_client_connected(&self) -> bool {
        self.connected_clients() > 0
    }

    /// Counts a client as connected for as long as the guard lives.
    pub fn client_guard(self: &Arc<Self>) -> ClientGuard {
        self.clients.fetch_add(1, Ordering::SeqCst);
        ClientGuard {
            context: Arc::clone(self),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the processing loop to finish after its current cycle.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct ClientGuard {
    context: Arc<GestureContext>,
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.context.clients.fetch_sub(1, Ordering::SeqCst);
    }
}

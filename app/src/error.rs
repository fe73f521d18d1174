use std::fmt;

use error_stack::Context;

#[derive(Debug)]
pub enum GError {
    CommError,
    ConnectionError,
    IpcError,
    ConfigError,
    SourceError,
    BindError,
    AcceptError,
    SessionError,
    InvalidObservation,
}

impl fmt::Display for GError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommError => write!(f, "Error in channel"),
            Self::ConnectionError => write!(f, "Couldn't connect to gesture server"),
            Self::IpcError => write!(f, "Error while communicating with hand pose process"),
            Self::ConfigError => write!(f, "Error in loading config"),
            Self::SourceError => write!(f, "Hand pose source failed"),
            Self::BindError => write!(f, "Couldn't bind the gesture listener"),
            Self::AcceptError => write!(f, "Listener failed while accepting connections"),
            Self::SessionError => write!(f, "Error while streaming to client"),
            Self::InvalidObservation => write!(f, "Malformed hand observation"),
        }
    }
}

impl Context for GError {}

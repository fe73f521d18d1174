use std::fmt;

use crate::models::fingers::{ExtensionVector, Finger};

/// Gesture labels published to clients.
///
/// The string form is exactly what goes on the wire; `None` is sent as a single
/// space so a client overwriting its display with it blanks the label.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::EnumIs,
    strum_macros::AsRefStr,
)]
pub enum Gesture {
    Rock,
    Scissors,
    Paper,
    #[default]
    #[strum(serialize = " ")]
    None,
}

impl Gesture {
    pub const ALL: [Gesture; 4] = [Self::Rock, Self::Scissors, Self::Paper, Self::None];

    /// Maps an extension vector to a gesture. Rules are checked in order and the
    /// first match wins.
    pub fn classify(fingers: &ExtensionVector) -> Self {
        let extended = fingers.extended_count();

        // a stray thumb still counts as a fist
        if extended <= 1 {
            Self::Rock
        } else if fingers[Finger::Index]
            && fingers[Finger::Middle]
            && !fingers[Finger::Ring]
            && !fingers[Finger::Pinky]
        {
            Self::Scissors
        } else if extended >= 4 {
            Self::Paper
        } else {
            Self::None
        }
    }

    pub fn wire_label(&self) -> &str {
        self.as_ref()
    }

    pub fn to_wire(&self) -> &[u8] {
        self.wire_label().as_bytes()
    }

    /// Recovers the latest label from a chunk read off the wire.
    ///
    /// Labels arrive back to back with no delimiter, so only the label the chunk
    /// ends with is trusted. Returns `None` if the chunk ends mid-label.
    pub fn from_wire_chunk(chunk: &str) -> Option<Self> {
        if chunk.is_empty() {
            return None;
        }

        if chunk.ends_with(' ') {
            return Some(Self::None);
        }

        [Self::Rock, Self::Scissors, Self::Paper]
            .into_iter()
            .find(|gesture| chunk.ends_with(gesture.wire_label()))
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            other => write!(f, "{}", other.wire_label()),
        }
    }
}

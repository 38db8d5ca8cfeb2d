//! Shared types for the mental poker workspace.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod cards;

pub use cards::{Card, CardDecodeError, CardRank, CardSuit};

/// Opaque unique identifier for a table participant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Assign a fresh random identifier.
    pub fn random() -> Self {
        PlayerId(Uuid::new_v4())
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

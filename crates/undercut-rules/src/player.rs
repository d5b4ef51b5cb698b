//! Per-room participant state.

use serde::{Deserialize, Serialize};

/// One participant in one room.
///
/// A player is created on join and removed on leave; rounds only mutate
/// the per-round fields (`current_number`, `has_submitted`, `is_ready`).
/// An eliminated player stays in the room's player list for the
/// scoreboard but is excluded from submission and readiness logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique within the room (not globally).
    pub username: String,
    /// Exactly one player in a non-empty room has this set.
    pub is_host: bool,
    /// Ready flag, cleared at the start of every round.
    pub is_ready: bool,
    /// Starts at 0 and only ever decreases.
    pub score: i32,
    /// The number submitted this round, if any. Always in [0, 100].
    pub current_number: Option<i32>,
    pub has_submitted: bool,
    pub is_eliminated: bool,
}

impl Player {
    /// Creates a fresh player with no score and no round state.
    pub fn new(username: impl Into<String>, is_host: bool) -> Self {
        Self {
            username: username.into(),
            is_host,
            is_ready: false,
            score: 0,
            current_number: None,
            has_submitted: false,
            is_eliminated: false,
        }
    }

    /// Clears the per-round fields, leaving score and elimination intact.
    pub fn reset_for_round(&mut self) {
        self.current_number = None;
        self.has_submitted = false;
        self.is_ready = false;
    }
}

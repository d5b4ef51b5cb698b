//! Room lifecycle state and settings.

use serde::{Deserialize, Serialize};

use crate::RoomCode;

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → Playing → ShowingResults → Playing (next round) → … → Finished
/// ```
///
/// - **Waiting**: room exists, accepting joins, host can change settings.
/// - **Playing**: a round is open for submissions; the deadline is armed.
/// - **ShowingResults**: the last round's results are on screen; when
///   every active player readies up the next round starts.
/// - **Finished**: at most one active player remains. Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Waiting,
    Playing,
    ShowingResults,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if a game is underway (a round is open or results
    /// are being shown between rounds).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing | Self::ShowingResults)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
            Self::ShowingResults => write!(f, "ShowingResults"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

/// Host-configurable room settings, mutable only while `Waiting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    /// How long each round stays open before stragglers are auto-submitted.
    pub round_time_secs: u32,
    /// Whether player chat is relayed to the room.
    pub allow_chat: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            round_time_secs: 180,
            allow_chat: true,
        }
    }
}

/// A snapshot of room metadata (not the player list).
///
/// This is what `RoomUpdated` carries and what `get_room` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    /// Reassigned when the host leaves.
    pub host_username: String,
    pub state: RoomState,
    /// Incremented on every transition into `Playing`.
    pub current_round: u32,
    pub settings: RoomSettings,
}

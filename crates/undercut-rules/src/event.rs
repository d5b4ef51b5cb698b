//! Events the engine publishes to room subscribers.
//!
//! The engine is agnostic to how delivery happens: the room actor hands
//! each event to a `Broadcaster` collaborator and moves on. The JSON
//! shape is internally tagged so a transport layer can switch on `type`
//! without deserializing the whole payload.

use serde::{Deserialize, Serialize};

use crate::{Player, RoomSnapshot, RoundResult};

/// A per-room event for the transport layer to fan out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// The player list changed (join, leave, ready, scores).
    PlayersUpdated { players: Vec<Player> },

    /// Room metadata changed (state, host, settings, round counter).
    RoomUpdated { room: RoomSnapshot },

    /// A round is open for submissions.
    RoundStarted {
        round: u32,
        /// Seconds until stragglers are auto-submitted.
        round_time_secs: u32,
    },

    /// A round was resolved; scoreboard attached.
    RoundResults { result: RoundResult },

    /// One active player remains; the game is over.
    GameFinished { winner: String },

    /// A player chat line, relayed only when the room allows chat.
    Chat { username: String, message: String },

    /// Generic system notice for the room.
    Notice { message: String },
}

//! Error types for the room layer.

use undercut_rules::RoomCode;

/// Errors that can occur during room operations.
///
/// Every engine operation reports failure through this enum instead of
/// panicking across the room boundary; the transport layer translates
/// variants into user-facing notices. Validation always happens before
/// mutation, so a returned error means nothing changed.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (or was destroyed).
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// No player with that username is in the room.
    #[error("player {0} not found in room")]
    PlayerNotFound(String),

    /// The room already holds the maximum number of players.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The username is already taken within the room.
    #[error("username {0} is already taken in this room")]
    DuplicateUsername(String),

    /// The action is not legal in the room's current state — for
    /// example starting a game that is already running, or an
    /// eliminated player trying to act.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// A host-only action was attempted by a non-host.
    #[error("only the host may do that")]
    Unauthorized,

    /// A submission outside [0, 100].
    #[error("number {0} is out of range (0-100)")]
    InvalidNumber(i32),

    /// Rejected room settings.
    #[error("invalid room settings: {0}")]
    InvalidSettings(String),

    /// The room's command channel is closed; the actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

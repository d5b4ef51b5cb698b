//! Pure game rules for Undercut.
//!
//! Everything in this crate is synchronous, I/O-free logic operating on
//! plain data. The room actor in `undercut-room` owns a player list and
//! calls into [`resolve_round`] at the right moments; this crate never
//! touches a channel, a clock, or a socket.
//!
//! # Key types
//!
//! - [`RoomCode`] — 5-digit room identifier
//! - [`Player`] — per-room participant state
//! - [`RoomState`] — lifecycle state machine
//! - [`GameEvent`] — what the engine publishes to room subscribers
//! - [`resolve_round`] — scoring, elimination, and the special rules

mod code;
mod event;
mod player;
mod round;
mod state;

pub use code::RoomCode;
pub use event::GameEvent;
pub use player::Player;
pub use round::{
    resolve_round, PlayerScore, Resolution, RoundOutcome, RoundResult,
    DUPLICATE_RULE_MAX_ACTIVE, ELIMINATION_FLOOR, EXACT_HIT_MAX_ACTIVE,
    EXACT_HIT_TOLERANCE, MAX_NUMBER, MAX_PLAYERS, MIN_PLAYERS,
    REVERSAL_MAX_ACTIVE, TARGET_FACTOR,
};
pub use state::{RoomSettings, RoomSnapshot, RoomState};

//! Room orchestration for Undercut.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! player list, round state machine, and deadline clock. The
//! [`RoomRegistry`] is the engine's public surface; transport and
//! persistence stay behind the [`Broadcaster`] and [`HistoryStore`]
//! collaborator traits.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates/destroys rooms, routes every operation
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`Broadcaster`] / [`HistoryStore`] — external collaborators
//! - [`RoomError`] — the failure taxonomy for all operations

mod error;
mod hooks;
mod registry;
mod room;

pub use error::RoomError;
pub use hooks::{
    Broadcaster, ChannelBroadcaster, HistoryStore, NullBroadcaster,
    NullHistory,
};
pub use registry::RoomRegistry;
pub use room::RoomHandle;

// Re-export the data model so embedders can depend on this crate alone.
pub use undercut_rules::{
    GameEvent, Player, PlayerScore, RoomCode, RoomSettings, RoomSnapshot,
    RoomState, RoundResult,
};

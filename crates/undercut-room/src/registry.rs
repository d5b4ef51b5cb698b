//! Room registry: creates, tracks, and destroys rooms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;
use undercut_rules::{
    Player, RoomCode, RoomSettings, RoomSnapshot, RoomState, RoundResult,
};

use crate::room::spawn_room;
use crate::{Broadcaster, HistoryStore, RoomError, RoomHandle};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns the set of live rooms, keyed by room code.
///
/// This is the engine's entire public surface: every operation on a
/// room goes through here and is serialized by that room's actor
/// mailbox, so operations on distinct rooms never contend. The registry
/// itself has the lifecycle of the process — created at startup, torn
/// down with it, nothing persisted.
///
/// The code→room map sits behind its own mutex, held only long enough
/// to clone a handle or adjust an entry and never across an await. All
/// methods take `&self`, so the embedding layer shares the registry by
/// reference (or `Arc`) across connection handlers.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomCode, RoomHandle>>,
    broadcaster: Arc<dyn Broadcaster>,
    history: Arc<dyn HistoryStore>,
}

impl RoomRegistry {
    /// Creates an empty registry wired to the given collaborators.
    pub fn new(
        broadcaster: Arc<dyn Broadcaster>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            broadcaster,
            history,
        }
    }

    /// Creates a room with a fresh unique 5-digit code.
    ///
    /// The host is not yet a player — they join explicitly like anyone
    /// else, and become host by matching the room's host username.
    pub fn create_room(&self, host_username: &str) -> RoomSnapshot {
        let mut rng = rand::rng();
        let mut rooms = self.rooms();
        let code = loop {
            let candidate = RoomCode::generate(&mut rng);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            code.clone(),
            host_username.to_string(),
            self.broadcaster.clone(),
            self.history.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        rooms.insert(code.clone(), handle);
        drop(rooms);
        info!(%code, host = host_username, "room created");

        RoomSnapshot {
            code,
            host_username: host_username.to_string(),
            state: RoomState::Waiting,
            current_round: 0,
            settings: RoomSettings::default(),
        }
    }

    /// Returns a metadata snapshot of a room.
    pub async fn get_room(
        &self,
        code: &RoomCode,
    ) -> Result<RoomSnapshot, RoomError> {
        self.handle(code)?.snapshot().await
    }

    /// Returns a room's players in join order.
    pub async fn get_players(
        &self,
        code: &RoomCode,
    ) -> Result<Vec<Player>, RoomError> {
        self.handle(code)?.players().await
    }

    /// Adds a player to a room.
    pub async fn join(
        &self,
        code: &RoomCode,
        username: &str,
    ) -> Result<(), RoomError> {
        self.handle(code)?.join(username).await
    }

    /// Removes a player from a room; destroys the room when it empties.
    pub async fn leave(
        &self,
        code: &RoomCode,
        username: &str,
    ) -> Result<(), RoomError> {
        let handle = self.handle(code)?;
        let remaining = handle.leave(username).await?;
        if remaining == 0 {
            // The actor stops on its own; drop our handle to it.
            self.rooms().remove(code);
            info!(%code, "room destroyed");
        }
        Ok(())
    }

    /// Sets a player's ready flag; may auto-advance to the next round.
    pub async fn set_ready(
        &self,
        code: &RoomCode,
        username: &str,
        ready: bool,
    ) -> Result<(), RoomError> {
        self.handle(code)?.set_ready(username, ready).await
    }

    /// Starts the game (host only, from `Waiting`).
    pub async fn start_game(
        &self,
        code: &RoomCode,
        username: &str,
    ) -> Result<(), RoomError> {
        self.handle(code)?.start_game(username).await
    }

    /// Submits a number for the current round.
    pub async fn submit_number(
        &self,
        code: &RoomCode,
        username: &str,
        number: i32,
    ) -> Result<(), RoomError> {
        self.handle(code)?.submit_number(username, number).await
    }

    /// Updates room settings (host only, while `Waiting`).
    pub async fn update_settings(
        &self,
        code: &RoomCode,
        username: &str,
        round_time_secs: u32,
        allow_chat: bool,
    ) -> Result<(), RoomError> {
        self.handle(code)?
            .update_settings(username, round_time_secs, allow_chat)
            .await
    }

    /// Relays a chat line to the room's subscribers if chat is allowed.
    pub async fn send_chat(
        &self,
        code: &RoomCode,
        username: &str,
        message: &str,
    ) -> Result<(), RoomError> {
        self.handle(code)?.chat(username, message).await
    }

    /// Forces resolution of the current round. Idempotent; `None` when
    /// the round was already resolved.
    pub async fn resolve_round(
        &self,
        code: &RoomCode,
    ) -> Result<Option<RoundResult>, RoomError> {
        self.handle(code)?.resolve_round().await
    }

    /// Shuts a room down and forgets it, regardless of occupancy.
    pub async fn destroy_room(
        &self,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms()
            .remove(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        info!(%code, "room destroyed");
        Ok(())
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Codes of all live rooms.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms().keys().cloned().collect()
    }

    fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms()
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomHandle>> {
        // Room handles can't be left in a broken state by a panicking
        // holder, so a poisoned map is safe to keep using.
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

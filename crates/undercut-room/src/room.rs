//! Room actor: an isolated Tokio task that owns one game's state.
//!
//! Each room runs in its own task, reachable only through an mpsc
//! command channel — no shared mutable state, just message passing.
//! That single serialized access path is what makes every operation on
//! a room linearizable with respect to the others: a submit can never
//! interleave with a leave, and the round deadline (polled from the
//! same `select!` loop) can never race a command.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use undercut_clock::RoundClock;
use undercut_rules::{
    resolve_round, GameEvent, Player, Resolution, RoomCode, RoomSettings,
    RoomSnapshot, RoomState, RoundResult, MAX_NUMBER, MAX_PLAYERS,
    MIN_PLAYERS,
};

use crate::{Broadcaster, HistoryStore, RoomError};

/// Commands sent to a room actor through its channel.
///
/// Each variant is one engine operation; the `oneshot::Sender` is the
/// reply channel the caller waits on.
pub(crate) enum RoomCommand {
    Join {
        username: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Reply carries the number of players remaining, so the registry
    /// can drop the room when it empties.
    Leave {
        username: String,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },
    SetReady {
        username: String,
        ready: bool,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    StartGame {
        username: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Submit {
        username: String,
        number: i32,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    UpdateSettings {
        username: String,
        round_time_secs: u32,
        allow_chat: bool,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Fire-and-forget chat relay, gated by the room's settings.
    Chat { username: String, message: String },
    /// Explicit resolution attempt. Idempotent: replies `None` when the
    /// current round was already resolved.
    Resolve {
        reply: oneshot::Sender<Option<RoundResult>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Players {
        reply: oneshot::Sender<Vec<Player>>,
    },
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone — just an
/// `mpsc::Sender` wrapper. The registry holds one per live room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub async fn join(&self, username: &str) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            username: username.to_string(),
            reply,
        })
        .await?
    }

    /// Removes a player; returns how many players remain.
    pub async fn leave(&self, username: &str) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::Leave {
            username: username.to_string(),
            reply,
        })
        .await?
    }

    pub async fn set_ready(
        &self,
        username: &str,
        ready: bool,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SetReady {
            username: username.to_string(),
            ready,
            reply,
        })
        .await?
    }

    pub async fn start_game(&self, username: &str) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StartGame {
            username: username.to_string(),
            reply,
        })
        .await?
    }

    pub async fn submit_number(
        &self,
        username: &str,
        number: i32,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Submit {
            username: username.to_string(),
            number,
            reply,
        })
        .await?
    }

    pub async fn update_settings(
        &self,
        username: &str,
        round_time_secs: u32,
        allow_chat: bool,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::UpdateSettings {
            username: username.to_string(),
            round_time_secs,
            allow_chat,
            reply,
        })
        .await?
    }

    /// Relays a chat line (fire-and-forget).
    pub async fn chat(
        &self,
        username: &str,
        message: &str,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Chat {
                username: username.to_string(),
                message: message.to_string(),
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Attempts to resolve the current round. Returns `None` if there
    /// is no unresolved round (already resolved, or not playing).
    pub async fn resolve_round(
        &self,
    ) -> Result<Option<RoundResult>, RoomError> {
        self.request(|reply| RoomCommand::Resolve { reply }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    pub async fn players(&self) -> Result<Vec<Player>, RoomError> {
        self.request(|reply| RoomCommand::Players { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Sends a command and waits for its oneshot reply.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    host_username: String,
    state: RoomState,
    current_round: u32,
    settings: RoomSettings,
    /// Join order is load-bearing: host succession and scoring
    /// tie-breaks both use it.
    players: Vec<Player>,
    clock: RoundClock,
    broadcaster: Arc<dyn Broadcaster>,
    history: Arc<dyn HistoryStore>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or the last player leaves.
    async fn run(mut self) {
        info!(code = %self.code, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd) {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                round = self.clock.wait() => self.handle_deadline(round),
            }
        }

        info!(code = %self.code, "room actor stopped");
    }

    /// Dispatches one command. Returns `true` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { username, reply } => {
                let _ = reply.send(self.handle_join(&username));
            }
            RoomCommand::Leave { username, reply } => {
                let result = self.handle_leave(&username);
                let emptied = matches!(result, Ok(0));
                let _ = reply.send(result);
                if emptied {
                    info!(code = %self.code, "last player left, room closing");
                    return true;
                }
            }
            RoomCommand::SetReady {
                username,
                ready,
                reply,
            } => {
                let _ = reply.send(self.handle_set_ready(&username, ready));
            }
            RoomCommand::StartGame { username, reply } => {
                let _ = reply.send(self.handle_start_game(&username));
            }
            RoomCommand::Submit {
                username,
                number,
                reply,
            } => {
                let _ = reply.send(self.handle_submit(&username, number));
            }
            RoomCommand::UpdateSettings {
                username,
                round_time_secs,
                allow_chat,
                reply,
            } => {
                let _ = reply.send(self.handle_update_settings(
                    &username,
                    round_time_secs,
                    allow_chat,
                ));
            }
            RoomCommand::Chat { username, message } => {
                self.handle_chat(username, message);
            }
            RoomCommand::Resolve { reply } => {
                let _ = reply.send(self.try_resolve());
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            RoomCommand::Players { reply } => {
                let _ = reply.send(self.players.clone());
            }
            RoomCommand::Shutdown => {
                info!(code = %self.code, "room shutting down");
                return true;
            }
        }
        false
    }

    fn handle_join(&mut self, username: &str) -> Result<(), RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "cannot join a room in state {}",
                self.state
            )));
        }
        if self.players.iter().any(|p| p.username == username) {
            return Err(RoomError::DuplicateUsername(username.to_string()));
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        let is_host = username == self.host_username;
        self.players.push(Player::new(username, is_host));
        info!(
            code = %self.code,
            username,
            players = self.players.len(),
            "player joined"
        );

        self.publish_players();
        self.publish_room();
        self.notice(format!("{username} joined the room"));
        Ok(())
    }

    fn handle_leave(&mut self, username: &str) -> Result<usize, RoomError> {
        let index = self
            .players
            .iter()
            .position(|p| p.username == username)
            .ok_or_else(|| RoomError::PlayerNotFound(username.to_string()))?;

        let departed = self.players.remove(index);
        info!(
            code = %self.code,
            username,
            players = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            self.clock.disarm();
            return Ok(0);
        }

        // Host succession: first remaining player by join order.
        if departed.is_host {
            self.players[0].is_host = true;
            self.host_username = self.players[0].username.clone();
            info!(
                code = %self.code,
                host = %self.host_username,
                "host reassigned"
            );
        }

        self.publish_players();
        self.publish_room();
        self.notice(format!("{username} left the room"));
        Ok(self.players.len())
    }

    fn handle_set_ready(
        &mut self,
        username: &str,
        ready: bool,
    ) -> Result<(), RoomError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.username == username)
            .ok_or_else(|| RoomError::PlayerNotFound(username.to_string()))?;
        if player.is_eliminated {
            return Err(RoomError::InvalidState(
                "eliminated players cannot change readiness".into(),
            ));
        }

        player.is_ready = ready;
        self.publish_players();
        self.notice(if ready {
            format!("{username} is ready")
        } else {
            format!("{username} is no longer ready")
        });

        // Between rounds, unanimous readiness advances the game.
        if self.state == RoomState::ShowingResults {
            let active: Vec<&Player> = self
                .players
                .iter()
                .filter(|p| !p.is_eliminated)
                .collect();
            if active.len() >= MIN_PLAYERS && active.iter().all(|p| p.is_ready)
            {
                self.begin_round(true);
            }
        }
        Ok(())
    }

    fn handle_start_game(&mut self, username: &str) -> Result<(), RoomError> {
        if self.state != RoomState::Waiting {
            return Err(RoomError::InvalidState(format!(
                "cannot start a game in state {}",
                self.state
            )));
        }
        if username != self.host_username {
            return Err(RoomError::Unauthorized);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(RoomError::InvalidState(format!(
                "need at least {MIN_PLAYERS} players to start"
            )));
        }
        if !self.players.iter().all(|p| p.is_ready) {
            return Err(RoomError::InvalidState(
                "all players must be ready".into(),
            ));
        }

        self.begin_round(false);
        Ok(())
    }

    /// Opens a new round: clears per-round fields, bumps the counter,
    /// arms the deadline, and announces the round.
    ///
    /// `clear_ready` distinguishes the between-rounds auto-advance
    /// (ready flags are consumed) from the initial host start (ready
    /// flags were the start condition and are cleared at resolution).
    fn begin_round(&mut self, clear_ready: bool) {
        for player in self.players.iter_mut().filter(|p| !p.is_eliminated) {
            player.current_number = None;
            player.has_submitted = false;
            if clear_ready {
                player.is_ready = false;
            }
        }

        self.state = RoomState::Playing;
        self.current_round += 1;
        self.clock.arm(
            self.current_round,
            Duration::from_secs(u64::from(self.settings.round_time_secs)),
        );
        info!(
            code = %self.code,
            round = self.current_round,
            "round started"
        );

        self.publish(GameEvent::RoundStarted {
            round: self.current_round,
            round_time_secs: self.settings.round_time_secs,
        });
        self.publish_room();
        self.publish_players();
        self.notice(format!(
            "round {} started — pick a number from 0 to 100",
            self.current_round
        ));
    }

    fn handle_submit(
        &mut self,
        username: &str,
        number: i32,
    ) -> Result<(), RoomError> {
        if self.state != RoomState::Playing {
            return Err(RoomError::InvalidState(format!(
                "no round open for submissions in state {}",
                self.state
            )));
        }
        if !(0..=MAX_NUMBER).contains(&number) {
            return Err(RoomError::InvalidNumber(number));
        }
        let player = self
            .players
            .iter_mut()
            .find(|p| p.username == username)
            .ok_or_else(|| RoomError::PlayerNotFound(username.to_string()))?;
        if player.is_eliminated {
            return Err(RoomError::InvalidState(
                "eliminated players cannot submit".into(),
            ));
        }
        if player.has_submitted {
            return Err(RoomError::InvalidState(
                "number already submitted this round".into(),
            ));
        }

        player.current_number = Some(number);
        player.has_submitted = true;
        self.notice(format!("{username} submitted a number"));

        // Early completion: everyone in, resolve now and cancel the
        // deadline.
        let all_in = self
            .players
            .iter()
            .filter(|p| !p.is_eliminated)
            .all(|p| p.has_submitted);
        if all_in {
            self.clock.disarm();
            self.try_resolve();
        }
        Ok(())
    }

    fn handle_update_settings(
        &mut self,
        username: &str,
        round_time_secs: u32,
        allow_chat: bool,
    ) -> Result<(), RoomError> {
        if self.state != RoomState::Waiting {
            return Err(RoomError::InvalidState(format!(
                "cannot change settings in state {}",
                self.state
            )));
        }
        if username != self.host_username {
            return Err(RoomError::Unauthorized);
        }
        if round_time_secs == 0 {
            return Err(RoomError::InvalidSettings(
                "round time must be at least 1 second".into(),
            ));
        }

        self.settings.round_time_secs = round_time_secs;
        self.settings.allow_chat = allow_chat;
        self.publish_room();
        self.notice("room settings updated".to_string());
        Ok(())
    }

    fn handle_chat(&mut self, username: String, message: String) {
        if self.settings.allow_chat {
            self.publish(GameEvent::Chat { username, message });
        }
    }

    /// Deadline expiry: force-complete stragglers, then resolve.
    ///
    /// The fired round number is the staleness token — a deadline armed
    /// for an earlier round (or firing after resolution already moved
    /// the state on) must be a no-op.
    fn handle_deadline(&mut self, round: u32) {
        if self.state != RoomState::Playing || round != self.current_round {
            warn!(
                code = %self.code,
                fired = round,
                current = self.current_round,
                state = %self.state,
                "stale round deadline ignored"
            );
            return;
        }

        let mut rng = rand::rng();
        for player in self
            .players
            .iter_mut()
            .filter(|p| !p.is_eliminated && !p.has_submitted)
        {
            player.current_number = Some(rng.random_range(0..=MAX_NUMBER));
            player.has_submitted = true;
            info!(
                code = %self.code,
                username = %player.username,
                "deadline reached, random number submitted"
            );
        }

        self.notice(format!(
            "time is up for round {} — resolving",
            self.current_round
        ));
        self.try_resolve();
    }

    /// Resolves the current round exactly once.
    ///
    /// The `Playing` state is the per-round resolution token: the first
    /// caller (all-submitted path, deadline, or explicit resolve)
    /// transitions the state; every later caller observes a non-playing
    /// room and returns `None` without touching anything.
    fn try_resolve(&mut self) -> Option<RoundResult> {
        if self.state != RoomState::Playing {
            return None;
        }

        match resolve_round(&mut self.players) {
            Resolution::Resolved(outcome) => {
                self.clock.disarm();
                self.state = if outcome.finished {
                    RoomState::Finished
                } else {
                    RoomState::ShowingResults
                };
                info!(
                    code = %self.code,
                    round = self.current_round,
                    winner = %outcome.result.winner_username,
                    finished = outcome.finished,
                    "round resolved"
                );

                self.publish(GameEvent::RoundResults {
                    result: outcome.result.clone(),
                });
                self.history.record(
                    &self.code,
                    self.current_round,
                    &outcome.result,
                );
                self.publish_room();
                self.publish_players();

                if outcome.finished {
                    if let Some(winner) = outcome.champion {
                        self.notice(format!("game over — {winner} wins!"));
                        self.publish(GameEvent::GameFinished { winner });
                    }
                }
                Some(outcome.result)
            }
            Resolution::NotReady => {
                // Only reachable when resolve is forced before the
                // deadline ran; flags were reset so the round restarts.
                warn!(
                    code = %self.code,
                    round = self.current_round,
                    "resolution attempted with missing submissions"
                );
                self.notice("round could not be resolved, submit again".into());
                self.publish_players();
                None
            }
            Resolution::NoValidNumbers => {
                // Every submission was nullified by the duplicate rule.
                // Keep the round open and give players a fresh deadline.
                self.clock.arm(
                    self.current_round,
                    Duration::from_secs(u64::from(
                        self.settings.round_time_secs,
                    )),
                );
                self.notice(
                    "all numbers cancelled each other out — submit again"
                        .into(),
                );
                self.publish_players();
                None
            }
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host_username: self.host_username.clone(),
            state: self.state,
            current_round: self.current_round,
            settings: self.settings.clone(),
        }
    }

    fn publish(&self, event: GameEvent) {
        self.broadcaster.publish(&self.code, event);
    }

    fn publish_players(&self) {
        self.publish(GameEvent::PlayersUpdated {
            players: self.players.clone(),
        });
    }

    fn publish_room(&self) {
        self.publish(GameEvent::RoomUpdated {
            room: self.snapshot(),
        });
    }

    fn notice(&self, message: String) {
        self.publish(GameEvent::Notice { message });
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    code: RoomCode,
    host_username: String,
    broadcaster: Arc<dyn Broadcaster>,
    history: Arc<dyn HistoryStore>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        code: code.clone(),
        host_username,
        state: RoomState::Waiting,
        current_round: 0,
        settings: RoomSettings::default(),
        players: Vec::new(),
        clock: RoundClock::new(),
        broadcaster,
        history,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}

//! Per-round deadline timer for Undercut.
//!
//! One [`RoundClock`] lives inside each room actor. When a round starts
//! the actor arms the clock with the round number and the room's time
//! limit; the actor's `tokio::select!` loop polls [`RoundClock::wait`]
//! alongside its command channel. When the deadline fires the actor
//! force-completes stragglers and attempts resolution; when every player
//! submits early the actor disarms the clock instead.
//!
//! Because the clock is polled from the same task that mutates room
//! state, a firing can never race a command — but it can still be
//! *stale* (the round it was armed for already resolved through the
//! all-submitted path before the actor disarmed it, or a new round
//! started). The fired round number is the staleness token: the actor
//! ignores any firing whose round does not match the current one.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         round = clock.wait() => self.handle_deadline(round),
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::debug;

/// A one-shot deadline for the current round.
///
/// While disarmed, [`wait`](Self::wait) pends forever, which is exactly
/// what a `select!` loop wants — the other branches keep running.
#[derive(Debug, Default)]
pub struct RoundClock {
    deadline: Option<(u32, TokioInstant)>,
}

impl RoundClock {
    /// Creates a disarmed clock.
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arms the deadline for `round`, superseding any previous deadline.
    pub fn arm(&mut self, round: u32, after: Duration) {
        debug!(round, after_secs = after.as_secs(), "round deadline armed");
        self.deadline = Some((round, TokioInstant::now() + after));
    }

    /// Cancels the pending deadline, if any. Idempotent.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("round deadline disarmed");
        }
    }

    /// The round the clock is currently armed for, if any.
    pub fn armed_round(&self) -> Option<u32> {
        self.deadline.map(|(round, _)| round)
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Waits until the armed deadline and returns its round number,
    /// disarming the clock. Pends forever while disarmed.
    pub async fn wait(&mut self) -> u32 {
        let (round, at) = match self.deadline {
            Some(deadline) => deadline,
            None => {
                // Never completes — select! keeps serving other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(at).await;
        self.deadline = None;
        debug!(round, "round deadline fired");
        round
    }
}

//! Collaborator interfaces: event fan-out and history persistence.
//!
//! The engine never touches a socket or a database. Room actors hand
//! events to a [`Broadcaster`] and finalized rounds to a
//! [`HistoryStore`]; both calls are fire-and-forget, so a slow or
//! failing collaborator can never stall a room.

use tokio::sync::mpsc;
use undercut_rules::{GameEvent, RoomCode, RoundResult};

/// Fans engine events out to the subscribers of a room.
///
/// Implementations must not block: push into a channel, a queue, or a
/// pub/sub client and return.
pub trait Broadcaster: Send + Sync + 'static {
    fn publish(&self, code: &RoomCode, event: GameEvent);
}

/// Durably records finalized round results.
///
/// The engine emits one call per resolved round; expanding it into one
/// record per participating player is the store's concern. The engine
/// never waits for the write.
pub trait HistoryStore: Send + Sync + 'static {
    fn record(&self, code: &RoomCode, round: u32, result: &RoundResult);
}

/// A broadcaster that drops every event. Useful in tests and for
/// headless simulations.
#[derive(Debug, Default)]
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _code: &RoomCode, _event: GameEvent) {}
}

/// A history store that records nothing.
#[derive(Debug, Default)]
pub struct NullHistory;

impl HistoryStore for NullHistory {
    fn record(&self, _code: &RoomCode, _round: u32, _result: &RoundResult) {}
}

/// A broadcaster backed by an unbounded channel.
///
/// The transport layer (or a test) holds the receiving end and forwards
/// events however it likes. Sending never blocks; if the receiver is
/// gone the event is silently dropped, matching how a room treats a
/// disconnected subscriber.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    tx: mpsc::UnboundedSender<(RoomCode, GameEvent)>,
}

impl ChannelBroadcaster {
    /// Creates the broadcaster and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(RoomCode, GameEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, code: &RoomCode, event: GameEvent) {
        let _ = self.tx.send((code.clone(), event));
    }
}

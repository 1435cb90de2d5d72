//! Observer seam: match events broadcast to any number of passive
//! consumers. Dropping every receiver never affects the game.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::{GameSummary, RoundResult};

/// Events emitted once per round plus once at game end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    RoundCompleted(RoundResult),
    GameOver(GameSummary),
}

const EVENT_CAPACITY: usize = 64;

/// Build the event channel with a capacity generous enough that a
/// briefly stalled observer does not lose rounds.
pub fn channel() -> (broadcast::Sender<MatchEvent>, broadcast::Receiver<MatchEvent>) {
    broadcast::channel(EVENT_CAPACITY)
}

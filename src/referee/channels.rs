//! Channel plumbing between the referee and the eight player tasks.
//!
//! Two distinct primitives, deliberately kept separate:
//! - a broadcast notice channel, fire-and-forget, no delivery ack;
//! - one dedicated command/report channel pair per player, so every
//!   report is attributable to exactly one player.

use tokio::sync::{broadcast, mpsc};

use crate::domain::{slot_of, Team, NUM_PLAYERS};

/// Round-phase notification broadcast to all players
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Apply energy decay, then report current energy
    Decay,
    /// Compute effort from the assigned position, then report it
    ReportEffort,
}

/// Point-to-point commands sent from the referee to one player
#[derive(Debug, Clone, Copy)]
pub enum PlayerCommand {
    /// Position multiplier 1..4 assigned for the current round
    Position(u8),
    /// Graceful stop; the player task exits after handling it
    Shutdown,
}

/// Reports sent from one player to the referee on its dedicated channel
#[derive(Debug, Clone, Copy)]
pub enum PlayerReport {
    Energy {
        id: u8,
        energy: u32,
    },
    Effort {
        id: u8,
        position: u8,
        energy: u32,
        effort: u32,
    },
}

impl PlayerReport {
    pub fn player_id(&self) -> u8 {
        match self {
            PlayerReport::Energy { id, .. } => *id,
            PlayerReport::Effort { id, .. } => *id,
        }
    }
}

/// Referee-side endpoint for one player
pub struct PlayerLink {
    pub id: u8,
    pub team: Team,
    pub slot: u8,
    pub commands: mpsc::Sender<PlayerCommand>,
    pub reports: mpsc::Receiver<PlayerReport>,
    /// Last energy the player reported; fallback value when it goes silent
    pub last_energy: u32,
}

/// Player-side endpoint handed to a spawned player task
pub struct PlayerSeat {
    pub id: u8,
    pub team: Team,
    pub slot: u8,
    pub initial_energy: u32,
    pub notices: broadcast::Receiver<Notice>,
    pub commands: mpsc::Receiver<PlayerCommand>,
    pub reports: mpsc::Sender<PlayerReport>,
}

/// Per-phase each player sends at most one report and receives at most
/// one command, so small buffers are plenty.
const CHANNEL_CAPACITY: usize = 4;

/// Build the full channel fabric for one match.
///
/// Returns the referee-side links and the player-side seats, both in
/// player-id order. `initial` holds the starting energy per player.
pub fn wire(
    initial: &[u32; NUM_PLAYERS],
    notice_tx: &broadcast::Sender<Notice>,
) -> (Vec<PlayerLink>, Vec<PlayerSeat>) {
    let mut links = Vec::with_capacity(NUM_PLAYERS);
    let mut seats = Vec::with_capacity(NUM_PLAYERS);

    for id in 0..NUM_PLAYERS as u8 {
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (report_tx, report_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let team = Team::of_player(id);
        let slot = slot_of(id);

        links.push(PlayerLink {
            id,
            team,
            slot,
            commands: command_tx,
            reports: report_rx,
            last_energy: initial[id as usize],
        });
        seats.push(PlayerSeat {
            id,
            team,
            slot,
            initial_energy: initial[id as usize],
            notices: notice_tx.subscribe(),
            commands: command_rx,
            reports: report_tx,
        });
    }

    (links, seats)
}

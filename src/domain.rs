//! Core value types shared by the players, the referee and observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Players per team
pub const TEAM_SIZE: usize = 4;
/// Total players in a match
pub const NUM_PLAYERS: usize = TEAM_SIZE * 2;

/// One of the two competing teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    One,
    Two,
}

impl Team {
    /// Zero-based index usable for `[T; 2]` lookups
    pub fn index(self) -> usize {
        match self {
            Team::One => 0,
            Team::Two => 1,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    /// Team of a player id: team one holds ids 0..4, team two ids 4..8
    pub fn of_player(id: u8) -> Team {
        if (id as usize) < TEAM_SIZE {
            Team::One
        } else {
            Team::Two
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::One => write!(f, "team 1"),
            Team::Two => write!(f, "team 2"),
        }
    }
}

/// Slot of a player within its team (0..4)
pub fn slot_of(id: u8) -> u8 {
    id % TEAM_SIZE as u8
}

/// Activity state of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// Upright and pulling; energy > 0
    Active,
    /// Energy hit zero; waiting for the next decay tick to start recovering
    Fallen,
    /// Recovery timer armed; back to Active when it fires
    Recovering,
}

/// Winner of a single round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundWinner {
    Tie,
    Team(Team),
}

impl RoundWinner {
    /// Round-winner rule: a team wins when its total meets the threshold
    /// and strictly exceeds the other team's. Anything else is a tie.
    pub fn decide(totals: [u32; 2], threshold: u32) -> RoundWinner {
        if totals[0] >= threshold && totals[0] > totals[1] {
            RoundWinner::Team(Team::One)
        } else if totals[1] >= threshold && totals[1] > totals[0] {
            RoundWinner::Team(Team::Two)
        } else {
            RoundWinner::Tie
        }
    }
}

/// Why the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// A team won two rounds in a row
    ConsecutiveWins,
    /// Wall-clock budget exhausted
    TimeLimit,
    /// Round budget exhausted
    RoundLimit,
}

/// Per-player line of a round result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: u8,
    pub team: Team,
    pub slot: u8,
    /// Position multiplier 1..4 assigned this round
    pub position: u8,
    pub energy: u32,
    pub effort: u32,
    pub fallen: bool,
    /// False when this entry was filled in by the timeout fallback
    pub responded: bool,
}

/// Outcome of one full round; immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub match_id: Uuid,
    pub round: u32,
    pub players: Vec<PlayerRecord>,
    pub team_totals: [u32; 2],
    pub winner: RoundWinner,
    pub completed_at: DateTime<Utc>,
}

impl RoundResult {
    /// Records for one team, in slot order
    pub fn team_players(&self, team: Team) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter().filter(move |p| p.team == team)
    }
}

/// Final outcome of a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub match_id: Uuid,
    pub rounds_played: u32,
    pub score: [u32; 2],
    pub winner: RoundWinner,
    pub reason: GameOverReason,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_of_player_split() {
        for id in 0..TEAM_SIZE as u8 {
            assert_eq!(Team::of_player(id), Team::One);
        }
        for id in TEAM_SIZE as u8..NUM_PLAYERS as u8 {
            assert_eq!(Team::of_player(id), Team::Two);
        }
    }

    #[test]
    fn test_slot_wraps_per_team() {
        assert_eq!(slot_of(0), 0);
        assert_eq!(slot_of(3), 3);
        assert_eq!(slot_of(4), 0);
        assert_eq!(slot_of(7), 3);
    }

    #[test]
    fn test_round_winner_requires_threshold() {
        // Ahead but below threshold: tie
        assert_eq!(RoundWinner::decide([90, 40], 100), RoundWinner::Tie);
    }

    #[test]
    fn test_round_winner_requires_strict_lead() {
        // Both at threshold, equal totals: tie
        assert_eq!(RoundWinner::decide([400, 400], 100), RoundWinner::Tie);
    }

    #[test]
    fn test_round_winner_decided() {
        assert_eq!(
            RoundWinner::decide([400, 250], 100),
            RoundWinner::Team(Team::One)
        );
        assert_eq!(
            RoundWinner::decide([120, 300], 100),
            RoundWinner::Team(Team::Two)
        );
    }
}

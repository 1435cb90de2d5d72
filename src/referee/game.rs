//! GameController: the round loop and the termination policy.
//!
//! Policy checks run in a fixed order after every round: a two-win
//! streak crowns a champion, then the wall-clock budget, then the
//! round budget. Time expiry and round expiry both resolve the final
//! winner by score comparison.

use rand::Rng;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::channels::{wire, Notice};
use super::round::RoundCoordinator;
use crate::config::MatchConfig;
use crate::domain::{GameOverReason, GameSummary, RoundWinner, Team, NUM_PLAYERS, TEAM_SIZE};
use crate::error::{Result, RopewarError};
use crate::events::MatchEvent;
use crate::player::Player;

/// Score and win-streak bookkeeping across rounds
#[derive(Debug, Default)]
pub struct Scoreboard {
    pub score: [u32; 2],
    last_winner: Option<Team>,
    consecutive_wins: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, winner: RoundWinner) {
        match winner {
            RoundWinner::Team(team) => {
                self.score[team.index()] += 1;
                if self.last_winner == Some(team) {
                    self.consecutive_wins += 1;
                } else {
                    self.last_winner = Some(team);
                    self.consecutive_wins = 1;
                }
            }
            RoundWinner::Tie => {
                self.last_winner = None;
                self.consecutive_wins = 0;
            }
        }
    }

    /// Champion by decisive run: two wins in a row
    pub fn streak_champion(&self) -> Option<Team> {
        if self.consecutive_wins >= 2 {
            self.last_winner
        } else {
            None
        }
    }

    /// Final winner by score comparison; equal scores tie
    pub fn leader(&self) -> RoundWinner {
        if self.score[0] > self.score[1] {
            RoundWinner::Team(Team::One)
        } else if self.score[1] > self.score[0] {
            RoundWinner::Team(Team::Two)
        } else {
            RoundWinner::Tie
        }
    }
}

pub struct GameController {
    cfg: MatchConfig,
    match_id: Uuid,
    coordinator: RoundCoordinator,
    players: Vec<JoinHandle<()>>,
    events: broadcast::Sender<MatchEvent>,
    scoreboard: Scoreboard,
}

impl GameController {
    /// Validate the config, wire the channel fabric, spawn the eight
    /// player tasks and return a controller ready to run.
    pub fn launch(cfg: MatchConfig, events: broadcast::Sender<MatchEvent>) -> Result<Self> {
        cfg.validate()
            .map_err(|errors| RopewarError::Validation(errors.join("; ")))?;

        let match_id = Uuid::new_v4();
        let initial = draw_initial_energies(&cfg);
        let (notice_tx, _initial_rx) = broadcast::channel::<Notice>(32);
        let (links, seats) = wire(&initial, &notice_tx);

        let players = seats
            .into_iter()
            .map(|seat| Player::spawn(seat, cfg.clone()))
            .collect();
        let coordinator = RoundCoordinator::new(match_id, notice_tx, links, &cfg);

        info!(%match_id, ?initial, "match launched");
        Ok(Self::from_parts(cfg, match_id, coordinator, players, events))
    }

    /// Assemble a controller from pre-built parts. Lets callers seed
    /// specific team lineups instead of drawing random energies.
    pub fn from_parts(
        cfg: MatchConfig,
        match_id: Uuid,
        coordinator: RoundCoordinator,
        players: Vec<JoinHandle<()>>,
        events: broadcast::Sender<MatchEvent>,
    ) -> Self {
        Self {
            cfg,
            match_id,
            coordinator,
            players,
            events,
            scoreboard: Scoreboard::new(),
        }
    }

    /// Play rounds until the termination policy fires, then shut the
    /// player tasks down and return the summary.
    pub async fn run(mut self) -> Result<GameSummary> {
        let started = Instant::now();
        let budget = Duration::from_secs(self.cfg.game_duration_secs);
        let mut round = 0u32;

        let (winner, reason) = loop {
            round += 1;
            let result = self.coordinator.run_round(round).await;
            self.scoreboard.record(result.winner);
            info!(
                round,
                totals = ?result.team_totals,
                winner = ?result.winner,
                score = ?self.scoreboard.score,
                "round complete"
            );
            self.emit(MatchEvent::RoundCompleted(result));

            if let Some(champion) = self.scoreboard.streak_champion() {
                info!(%champion, "two wins in a row, game ends early");
                break (RoundWinner::Team(champion), GameOverReason::ConsecutiveWins);
            }
            // Time budget is checked before the round budget
            if started.elapsed() >= budget {
                info!(
                    duration_secs = self.cfg.game_duration_secs,
                    "game duration reached"
                );
                break (self.scoreboard.leader(), GameOverReason::TimeLimit);
            }
            if round >= self.cfg.rounds_to_win {
                break (self.scoreboard.leader(), GameOverReason::RoundLimit);
            }

            if self.cfg.round_pause_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.cfg.round_pause_ms)).await;
            }
        };

        let summary = GameSummary {
            match_id: self.match_id,
            rounds_played: round,
            score: self.scoreboard.score,
            winner,
            reason,
            finished_at: chrono::Utc::now(),
        };
        info!(
            rounds = summary.rounds_played,
            score = ?summary.score,
            winner = ?summary.winner,
            reason = ?summary.reason,
            "game over"
        );
        self.emit(MatchEvent::GameOver(summary.clone()));

        self.coordinator.shutdown_players().await;
        for handle in self.players.drain(..) {
            handle
                .await
                .map_err(|err| RopewarError::Internal(format!("player task failed: {err}")))?;
        }

        Ok(summary)
    }

    fn emit(&self, event: MatchEvent) {
        // Observers are optional; no subscriber is not an error
        let _ = self.events.send(event);
    }
}

/// Draw the starting energies: four uniform draws per team, sorted
/// ascending so slot 0 holds the lowest. Reproduces the original's
/// deterministic first-round position assignment.
fn draw_initial_energies(cfg: &MatchConfig) -> [u32; NUM_PLAYERS] {
    let mut rng = rand::thread_rng();
    let mut out = [0u32; NUM_PLAYERS];
    for team in 0..2 {
        let mut draws: Vec<u32> = (0..TEAM_SIZE)
            .map(|_| rng.gen_range(cfg.energy_min..=cfg.energy_max))
            .collect();
        draws.sort_unstable();
        for (slot, energy) in draws.into_iter().enumerate() {
            out[team * TEAM_SIZE + slot] = energy;
        }
    }
    out
}

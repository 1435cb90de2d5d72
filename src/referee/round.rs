//! RoundCoordinator: drives one full round through two barriers.
//!
//! Phase order is fixed: decay broadcast, energy gather, ranking,
//! position unicast, effort broadcast, effort gather, aggregation.
//! Each gather is a full barrier collected in slot order on the
//! players' dedicated channels, bounded per player by the configured
//! timeout. A silent or malformed player is downgraded to a
//! round-participation failure (last-known energy, effort 0) so the
//! game keeps moving; the controller only ever sees a finished
//! `RoundResult`.

use chrono::Utc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;
use tracing::{debug, warn};
use uuid::Uuid;

use super::channels::{Notice, PlayerCommand, PlayerLink, PlayerReport};
use crate::config::MatchConfig;
use crate::domain::{PlayerRecord, RoundResult, RoundWinner, Team, NUM_PLAYERS, TEAM_SIZE};
use crate::ranking::assign_positions;

pub struct RoundCoordinator {
    match_id: Uuid,
    notice_tx: broadcast::Sender<Notice>,
    links: Vec<PlayerLink>,
    win_threshold: u32,
    /// None reproduces the reference stall behavior (no bound)
    gather_timeout: Option<Duration>,
}

impl RoundCoordinator {
    pub fn new(
        match_id: Uuid,
        notice_tx: broadcast::Sender<Notice>,
        links: Vec<PlayerLink>,
        cfg: &MatchConfig,
    ) -> Self {
        let gather_timeout = match cfg.gather_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        Self {
            match_id,
            notice_tx,
            links,
            win_threshold: cfg.win_threshold,
            gather_timeout,
        }
    }

    /// Run one round to completion. Never returns a transport error:
    /// every per-round failure is resolved into the result itself.
    pub async fn run_round(&mut self, round: u32) -> RoundResult {
        // Phase 1+2: decay, then the first barrier
        self.discard_stale_reports();
        self.broadcast(Notice::Decay);
        let energies = self.gather_energy(round).await;

        // Phase 3: rank each team by current energy
        let mut positions = [0u8; NUM_PLAYERS];
        for team in [Team::One, Team::Two] {
            let base = team.index() * TEAM_SIZE;
            let reports: [(u8, u32); TEAM_SIZE] =
                std::array::from_fn(|i| (self.links[base + i].id, energies[base + i].0));
            for (id, position) in assign_positions(&reports) {
                positions[id as usize] = position;
            }
        }

        // Phase 4: positions go out point-to-point before any effort notice
        for link in &self.links {
            let position = positions[link.id as usize];
            if link
                .commands
                .send(PlayerCommand::Position(position))
                .await
                .is_err()
            {
                // Dead player; its effort gather falls back below
                warn!(round, player = link.id, "position unicast failed");
            }
        }

        // Phase 5+6: effort, then the second barrier
        self.discard_stale_reports();
        self.broadcast(Notice::ReportEffort);
        let players = self.gather_effort(round, &positions, &energies).await;

        // Phase 7: aggregate and decide
        let mut team_totals = [0u32; 2];
        for record in &players {
            team_totals[record.team.index()] += record.effort;
        }
        let winner = RoundWinner::decide(team_totals, self.win_threshold);

        debug!(round, ?team_totals, ?winner, "round aggregated");

        RoundResult {
            match_id: self.match_id,
            round,
            players,
            team_totals,
            winner,
            completed_at: Utc::now(),
        }
    }

    /// Ask every player to stop. Best effort; a closed channel means the
    /// player is already gone.
    pub async fn shutdown_players(&self) {
        for link in &self.links {
            let _ = link.commands.send(PlayerCommand::Shutdown).await;
        }
    }

    /// Throw away reports still queued from an earlier phase, i.e.
    /// answers that arrived after their gather already timed out.
    /// Reports carry only a player id, so anything left in the channel
    /// when a new notice goes out would otherwise be accepted as that
    /// player's fresh answer one phase later.
    fn discard_stale_reports(&mut self) {
        for link in &mut self.links {
            while let Ok(report) = link.reports.try_recv() {
                warn!(player = link.id, ?report, "discarding stale report");
            }
        }
    }

    fn broadcast(&self, notice: Notice) {
        // Fire-and-forget: an error only means no live receiver remains
        if self.notice_tx.send(notice).is_err() {
            warn!(?notice, "no live players to notify");
        }
    }

    /// First barrier: one energy report per player, slot order.
    /// Returns `(energy, responded)` per player id.
    async fn gather_energy(&mut self, round: u32) -> Vec<(u32, bool)> {
        let mut out = Vec::with_capacity(NUM_PLAYERS);
        for idx in 0..self.links.len() {
            let report = Self::recv_report(&mut self.links[idx], self.gather_timeout).await;
            let link = &mut self.links[idx];
            match report {
                Some(PlayerReport::Energy { id, energy }) if id == link.id => {
                    link.last_energy = energy;
                    out.push((energy, true));
                }
                Some(other) => {
                    warn!(
                        round,
                        player = link.id,
                        report = ?other,
                        "malformed energy report, using last known"
                    );
                    out.push((link.last_energy, false));
                }
                None => {
                    warn!(
                        round,
                        player = link.id,
                        "no energy report, using last known"
                    );
                    out.push((link.last_energy, false));
                }
            }
        }
        out
    }

    /// Second barrier: one effort report per player, slot order.
    async fn gather_effort(
        &mut self,
        round: u32,
        positions: &[u8; NUM_PLAYERS],
        energies: &[(u32, bool)],
    ) -> Vec<PlayerRecord> {
        let mut out = Vec::with_capacity(NUM_PLAYERS);
        for idx in 0..self.links.len() {
            let report = Self::recv_report(&mut self.links[idx], self.gather_timeout).await;
            let link = &mut self.links[idx];
            let record = match report {
                Some(PlayerReport::Effort {
                    id,
                    position,
                    energy,
                    effort,
                }) if id == link.id => {
                    link.last_energy = energy;
                    PlayerRecord {
                        id,
                        team: link.team,
                        slot: link.slot,
                        position,
                        energy,
                        effort,
                        fallen: energy == 0,
                        responded: energies[idx].1,
                    }
                }
                other => {
                    if let Some(report) = other {
                        warn!(round, player = link.id, ?report, "malformed effort report");
                    } else {
                        warn!(round, player = link.id, "no effort report, effort counts as 0");
                    }
                    PlayerRecord {
                        id: link.id,
                        team: link.team,
                        slot: link.slot,
                        position: positions[link.id as usize],
                        energy: link.last_energy,
                        effort: 0,
                        fallen: link.last_energy == 0,
                        responded: false,
                    }
                }
            };
            out.push(record);
        }
        out
    }

    async fn recv_report(link: &mut PlayerLink, timeout: Option<Duration>) -> Option<PlayerReport> {
        match timeout {
            Some(bound) => time::timeout(bound, link.reports.recv()).await.ok().flatten(),
            None => link.reports.recv().await,
        }
    }
}

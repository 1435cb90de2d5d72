//! Player agent: one tokio task per player, sole owner of its state.
//!
//! The task reacts to two broadcast notices (decay, report-effort) and
//! to point-to-point commands from the referee. Recovery after a fall
//! is a pinned timer armed inside the run loop, never a blocking sleep,
//! so the player stays responsive to notices while it is down.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::MatchConfig;
use crate::domain::{PlayerState, Team};
use crate::referee::{Notice, PlayerCommand, PlayerReport, PlayerSeat};

/// Energy/activity state machine, separated from the task plumbing so
/// the transitions are unit-testable with a seeded RNG.
#[derive(Debug)]
pub struct PlayerCore {
    pub id: u8,
    pub team: Team,
    pub slot: u8,
    state: PlayerState,
    energy: u32,
    assigned_position: Option<u8>,
}

impl PlayerCore {
    pub fn new(id: u8, team: Team, slot: u8, energy: u32) -> Self {
        let state = if energy > 0 {
            PlayerState::Active
        } else {
            PlayerState::Fallen
        };
        Self {
            id,
            team,
            slot,
            state,
            energy,
            assigned_position: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn energy(&self) -> u32 {
        self.energy
    }

    pub fn active(&self) -> bool {
        self.state == PlayerState::Active
    }

    /// Handle a decay notice. Returns the recovery delay to arm when the
    /// transition is Fallen -> Recovering, `None` otherwise.
    pub fn apply_decay(&mut self, cfg: &MatchConfig, rng: &mut impl Rng) -> Option<Duration> {
        match self.state {
            PlayerState::Active => {
                if cfg.fall_chance > 0.0 && rng.gen_bool(cfg.fall_chance) {
                    self.energy = 0;
                    self.state = PlayerState::Fallen;
                } else {
                    let decrease = rng.gen_range(cfg.decrease_min..=cfg.decrease_max);
                    self.energy = self.energy.saturating_sub(decrease);
                    if self.energy == 0 {
                        self.state = PlayerState::Fallen;
                    }
                }
                None
            }
            PlayerState::Fallen => {
                self.state = PlayerState::Recovering;
                let secs = rng.gen_range(cfg.recovery_min_secs..=cfg.recovery_max_secs);
                Some(Duration::from_secs(secs))
            }
            // Timer already armed; wait for it to fire
            PlayerState::Recovering => None,
        }
    }

    /// Recovery timer fired: draw a fresh energy and stand back up.
    pub fn finish_recovery(&mut self, cfg: &MatchConfig, rng: &mut impl Rng) {
        self.energy = rng.gen_range(cfg.energy_min..=cfg.energy_max);
        self.state = if self.energy > 0 {
            PlayerState::Active
        } else {
            PlayerState::Fallen
        };
    }

    pub fn assign_position(&mut self, position: u8) {
        self.assigned_position = Some(position);
    }

    pub fn energy_report(&self) -> PlayerReport {
        PlayerReport::Energy {
            id: self.id,
            energy: self.energy,
        }
    }

    /// Build the effort report, consuming the round's position assignment.
    /// A missing assignment fails closed as position 0, effort 0.
    pub fn effort_report(&mut self) -> PlayerReport {
        let position = self.assigned_position.take().unwrap_or(0);
        let effort = if self.active() {
            self.energy * position as u32
        } else {
            0
        };
        PlayerReport::Effort {
            id: self.id,
            position,
            energy: self.energy,
            effort,
        }
    }
}

/// The spawned player task: state machine plus its channel endpoints
pub struct Player {
    core: PlayerCore,
    cfg: MatchConfig,
    seat: PlayerSeat,
}

impl Player {
    pub fn new(seat: PlayerSeat, cfg: MatchConfig) -> Self {
        let core = PlayerCore::new(seat.id, seat.team, seat.slot, seat.initial_energy);
        Self { core, cfg, seat }
    }

    pub fn spawn(seat: PlayerSeat, cfg: MatchConfig) -> JoinHandle<()> {
        tokio::spawn(Self::new(seat, cfg).run())
    }

    pub async fn run(mut self) {
        let mut rng = StdRng::from_entropy();
        let recovery = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(recovery);

        debug!(
            player = self.core.id,
            energy = self.core.energy(),
            "player task started"
        );

        loop {
            tokio::select! {
                notice = self.seat.notices.recv() => match notice {
                    Ok(Notice::Decay) => {
                        if let Some(delay) = self.core.apply_decay(&self.cfg, &mut rng) {
                            recovery.as_mut().reset(Instant::now() + delay);
                            debug!(
                                player = self.core.id,
                                delay_secs = delay.as_secs(),
                                "fallen, recovery timer armed"
                            );
                        }
                        let report = self.core.energy_report();
                        if self.send(report).await.is_err() {
                            break;
                        }
                    }
                    Ok(Notice::ReportEffort) => {
                        // The position unicast may still be queued on the
                        // command channel; drain it first so the assignment
                        // is applied before the effort is computed.
                        let shutdown = self.drain_commands();
                        let report = self.core.effort_report();
                        if self.send(report).await.is_err() || shutdown {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(player = self.core.id, skipped, "notice channel lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                cmd = self.seat.commands.recv() => match cmd {
                    Some(PlayerCommand::Position(p)) => self.core.assign_position(p),
                    Some(PlayerCommand::Shutdown) | None => break,
                },
                _ = &mut recovery, if self.core.state() == PlayerState::Recovering => {
                    self.core.finish_recovery(&self.cfg, &mut rng);
                    debug!(
                        player = self.core.id,
                        energy = self.core.energy(),
                        "recovered"
                    );
                }
            }
        }

        debug!(player = self.core.id, "player task stopped");
    }

    /// Apply any queued commands without waiting. Returns true when a
    /// shutdown was among them.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.seat.commands.try_recv() {
                Ok(PlayerCommand::Position(p)) => self.core.assign_position(p),
                Ok(PlayerCommand::Shutdown) => return true,
                Err(_) => return false,
            }
        }
    }

    async fn send(&self, report: PlayerReport) -> Result<(), ()> {
        self.seat.reports.send(report).await.map_err(|_| {
            debug!(player = self.core.id, "report channel closed, stopping");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MatchConfig {
        MatchConfig {
            energy_min: 50,
            energy_max: 100,
            decrease_min: 10,
            decrease_max: 10,
            recovery_min_secs: 2,
            recovery_max_secs: 5,
            win_threshold: 100,
            game_duration_secs: 60,
            rounds_to_win: 10,
            fall_chance: 0.0,
            gather_timeout_ms: 2000,
            round_pause_ms: 0,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn invariant_holds(core: &PlayerCore) -> bool {
        core.active() == (core.energy() > 0)
    }

    #[test]
    fn test_starts_fallen_at_zero_energy() {
        let core = PlayerCore::new(0, Team::One, 0, 0);
        assert_eq!(core.state(), PlayerState::Fallen);
        assert!(invariant_holds(&core));
    }

    #[test]
    fn test_decay_subtracts_within_range() {
        let mut core = PlayerCore::new(0, Team::One, 0, 50);
        let delay = core.apply_decay(&cfg(), &mut rng());

        assert!(delay.is_none());
        assert_eq!(core.energy(), 40);
        assert_eq!(core.state(), PlayerState::Active);
        assert!(invariant_holds(&core));
    }

    #[test]
    fn test_decay_to_zero_falls() {
        let mut core = PlayerCore::new(0, Team::One, 0, 10);
        core.apply_decay(&cfg(), &mut rng());

        assert_eq!(core.energy(), 0);
        assert_eq!(core.state(), PlayerState::Fallen);
        assert!(invariant_holds(&core));
    }

    #[test]
    fn test_certain_fall_chance_drops_player() {
        let mut config = cfg();
        config.fall_chance = 1.0;
        let mut core = PlayerCore::new(0, Team::One, 0, 80);
        core.apply_decay(&config, &mut rng());

        assert_eq!(core.energy(), 0);
        assert_eq!(core.state(), PlayerState::Fallen);
        assert!(invariant_holds(&core));
    }

    #[test]
    fn test_fallen_decay_arms_recovery() {
        let mut core = PlayerCore::new(0, Team::One, 0, 0);
        let config = cfg();
        let delay = core.apply_decay(&config, &mut rng()).unwrap();

        assert_eq!(core.state(), PlayerState::Recovering);
        let secs = delay.as_secs();
        assert!(secs >= config.recovery_min_secs && secs <= config.recovery_max_secs);
        assert_eq!(core.energy(), 0);
        assert!(invariant_holds(&core));
    }

    #[test]
    fn test_recovering_decay_is_noop() {
        let mut core = PlayerCore::new(0, Team::One, 0, 0);
        let config = cfg();
        core.apply_decay(&config, &mut rng());
        let delay = core.apply_decay(&config, &mut rng());

        assert!(delay.is_none());
        assert_eq!(core.state(), PlayerState::Recovering);
    }

    #[test]
    fn test_finish_recovery_restores_active() {
        let mut core = PlayerCore::new(0, Team::One, 0, 0);
        let config = cfg();
        core.apply_decay(&config, &mut rng());
        core.finish_recovery(&config, &mut rng());

        assert_eq!(core.state(), PlayerState::Active);
        assert!(core.energy() >= config.energy_min && core.energy() <= config.energy_max);
        assert!(invariant_holds(&core));
    }

    #[test]
    fn test_effort_uses_assigned_position() {
        let mut core = PlayerCore::new(0, Team::One, 0, 40);
        core.assign_position(3);

        match core.effort_report() {
            PlayerReport::Effort {
                position, effort, ..
            } => {
                assert_eq!(position, 3);
                assert_eq!(effort, 120);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn test_effort_fails_closed_without_assignment() {
        let mut core = PlayerCore::new(0, Team::One, 0, 40);

        match core.effort_report() {
            PlayerReport::Effort {
                position, effort, ..
            } => {
                assert_eq!(position, 0);
                assert_eq!(effort, 0);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn test_effort_zero_while_fallen() {
        let mut core = PlayerCore::new(0, Team::One, 0, 0);
        core.assign_position(1);

        match core.effort_report() {
            PlayerReport::Effort { effort, .. } => assert_eq!(effort, 0),
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[test]
    fn test_assignment_consumed_per_round() {
        let mut core = PlayerCore::new(0, Team::One, 0, 40);
        core.assign_position(2);
        let _ = core.effort_report();

        // Second report without a fresh unicast fails closed
        match core.effort_report() {
            PlayerReport::Effort { effort, .. } => assert_eq!(effort, 0),
            other => panic!("unexpected report: {other:?}"),
        }
    }
}

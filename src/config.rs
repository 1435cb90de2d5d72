use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Upper bound for `energy_max`. Effort is energy times position
/// (at most 4) and a team total sums four efforts, so energies up to
/// `u32::MAX / 16` keep every per-round arithmetic result within u32.
pub const MAX_ENERGY: u32 = u32::MAX / 16;

/// Match configuration, loaded once before any player task spawns.
///
/// Field layout mirrors the original flat config record: three
/// min/max ranges followed by the win threshold, game duration and
/// round budget.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    /// Lower bound for a freshly drawn energy level
    pub energy_min: u32,
    /// Upper bound for a freshly drawn energy level
    pub energy_max: u32,
    /// Lower bound for the per-round energy decrease
    pub decrease_min: u32,
    /// Upper bound for the per-round energy decrease
    pub decrease_max: u32,
    /// Lower bound for recovery time after a fall, in seconds
    pub recovery_min_secs: u64,
    /// Upper bound for recovery time after a fall, in seconds
    pub recovery_max_secs: u64,
    /// Minimum team total required to win a round
    pub win_threshold: u32,
    /// Wall-clock budget for the whole game, in seconds
    pub game_duration_secs: u64,
    /// Round budget: play at most this many rounds
    pub rounds_to_win: u32,
    /// Probability that an active player falls outright on a decay tick
    #[serde(default = "default_fall_chance")]
    pub fall_chance: f64,
    /// Bound on each gather phase, per player. 0 disables the bound and
    /// lets a silent player stall the round indefinitely.
    #[serde(default = "default_gather_timeout_ms")]
    pub gather_timeout_ms: u64,
    /// Pause between rounds (presentation pacing)
    #[serde(default)]
    pub round_pause_ms: u64,
}

fn default_fall_chance() -> f64 {
    0.1
}

fn default_gather_timeout_ms() -> u64 {
    2000
}

impl MatchConfig {
    /// Load configuration from a TOML file plus ROPEWAR_* environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("fall_chance", default_fall_chance())?
            .set_default("gather_timeout_ms", default_gather_timeout_ms() as i64)?
            .set_default("round_pause_ms", 0i64)?
            .add_source(File::from(path.as_ref()).required(true))
            // Override with environment variables (ROPEWAR_WIN_THRESHOLD, etc.)
            .add_source(Environment::with_prefix("ROPEWAR").try_parsing(true));

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.energy_min > self.energy_max {
            errors.push("energy_min must not exceed energy_max".to_string());
        }
        if self.energy_max > MAX_ENERGY {
            errors.push(format!("energy_max must not exceed {MAX_ENERGY}"));
        }
        if self.decrease_min > self.decrease_max {
            errors.push("decrease_min must not exceed decrease_max".to_string());
        }
        if self.recovery_min_secs > self.recovery_max_secs {
            errors.push("recovery_min_secs must not exceed recovery_max_secs".to_string());
        }
        if self.win_threshold == 0 {
            errors.push("win_threshold must be positive".to_string());
        }
        if self.game_duration_secs == 0 {
            errors.push("game_duration_secs must be positive".to_string());
        }
        if self.rounds_to_win == 0 {
            errors.push("rounds_to_win must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.fall_chance) {
            errors.push("fall_chance must be between 0 and 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

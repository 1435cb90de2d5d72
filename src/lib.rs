pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod player;
pub mod ranking;
pub mod referee;
pub mod reporter;

pub use config::MatchConfig;
pub use domain::{
    GameOverReason, GameSummary, PlayerRecord, PlayerState, RoundResult, RoundWinner, Team,
    NUM_PLAYERS, TEAM_SIZE,
};
pub use error::{Result, RopewarError};
pub use events::MatchEvent;
pub use player::{Player, PlayerCore};
pub use referee::{GameController, RoundCoordinator, Scoreboard};

//! The referee side of the match: channel fabric, round protocol and
//! game policy.

mod channels;
mod game;
mod round;

pub use channels::{wire, Notice, PlayerCommand, PlayerLink, PlayerReport, PlayerSeat};
pub use game::{GameController, Scoreboard};
pub use round::RoundCoordinator;

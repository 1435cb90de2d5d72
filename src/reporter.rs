//! Console reporter: a passive consumer of match events.
//!
//! Renders the per-round tables of the original referee (position,
//! energy, effort, FALLEN marker, energy trend vs the previous round)
//! or, in JSON mode, one serialized event per line.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::domain::{GameOverReason, GameSummary, RoundResult, RoundWinner, Team, NUM_PLAYERS};
use crate::events::MatchEvent;

pub async fn run(mut events: broadcast::Receiver<MatchEvent>, json: bool) {
    let mut prev_energy: [Option<u32>; NUM_PLAYERS] = [None; NUM_PLAYERS];

    loop {
        match events.recv().await {
            Ok(event) if json => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(%err, "failed to serialize event"),
            },
            Ok(MatchEvent::RoundCompleted(result)) => print_round(&result, &mut prev_energy),
            Ok(MatchEvent::GameOver(summary)) => print_summary(&summary),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "reporter lagged behind match events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_round(result: &RoundResult, prev_energy: &mut [Option<u32>; NUM_PLAYERS]) {
    println!("\n=== Round {} Results ===", result.round);
    for team in [Team::One, Team::Two] {
        let label = team.index() + 1;
        println!("Team {label}:");
        println!("Player | Position | Energy | Effort");
        for player in result.team_players(team) {
            let trend = match prev_energy[player.id as usize] {
                Some(previous) if player.energy < previous => "v",
                Some(previous) if player.energy > previous => "^",
                _ => " ",
            };
            let effort = if player.fallen {
                "FALLEN".to_string()
            } else {
                format!("{:>6}", player.effort)
            };
            let silent = if player.responded { "" } else { " (no response)" };
            println!(
                "T{label}-P{}  |    {}     |  {:>4} {trend} | {effort}{silent}",
                player.slot, player.position, player.energy
            );
            prev_energy[player.id as usize] = Some(player.energy);
        }
        println!();
    }
    println!(
        ">> Team 1 total: {} | Team 2 total: {}",
        result.team_totals[0], result.team_totals[1]
    );
    match result.winner {
        RoundWinner::Team(team) => println!("Round {} winner: {team}", result.round),
        RoundWinner::Tie => println!("Round {} is a tie or threshold not met", result.round),
    }
}

fn print_summary(summary: &GameSummary) {
    println!("\n=== Game Over ===");
    match summary.reason {
        GameOverReason::ConsecutiveWins => println!("Decided by two wins in a row"),
        GameOverReason::TimeLimit => println!("Game duration reached"),
        GameOverReason::RoundLimit => println!("Round budget exhausted"),
    }
    println!(
        "Score after {} rounds: {} - {}",
        summary.rounds_played, summary.score[0], summary.score[1]
    );
    match summary.winner {
        RoundWinner::Team(team) => println!("Final winner: {team}!"),
        RoundWinner::Tie => println!("Final result: it's a tie!"),
    }
}

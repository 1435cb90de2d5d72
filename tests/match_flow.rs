//! End-to-end games over the full channel fabric: real player tasks,
//! real barriers, deterministic configs (degenerate ranges, zero fall
//! chance) instead of seeded randomness.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use ropewar::config::MatchConfig;
use ropewar::domain::{GameOverReason, RoundWinner, Team, NUM_PLAYERS};
use ropewar::events::{self, MatchEvent};
use ropewar::player::Player;
use ropewar::referee::{wire, GameController, RoundCoordinator};

fn degenerate_cfg() -> MatchConfig {
    MatchConfig {
        energy_min: 50,
        energy_max: 50,
        decrease_min: 10,
        decrease_max: 10,
        // Long enough that nobody recovers mid-test
        recovery_min_secs: 600,
        recovery_max_secs: 600,
        win_threshold: 100,
        game_duration_secs: 3600,
        rounds_to_win: 3,
        fall_chance: 0.0,
        gather_timeout_ms: 2000,
        round_pause_ms: 0,
    }
}

fn launch_lineup(
    cfg: &MatchConfig,
    initial: [u32; NUM_PLAYERS],
) -> (Uuid, RoundCoordinator, Vec<JoinHandle<()>>) {
    let (notice_tx, _initial_rx) = broadcast::channel(32);
    let (links, seats) = wire(&initial, &notice_tx);
    let handles = seats
        .into_iter()
        .map(|seat| Player::spawn(seat, cfg.clone()))
        .collect();
    let match_id = Uuid::new_v4();
    let coordinator = RoundCoordinator::new(match_id, notice_tx, links, cfg);
    (match_id, coordinator, handles)
}

#[tokio::test]
async fn scenario_a_all_tied_rounds_end_in_round_limit_tie() {
    let cfg = degenerate_cfg();
    let (match_id, coordinator, handles) = launch_lineup(&cfg, [50; NUM_PLAYERS]);
    let (event_tx, mut event_rx) = events::channel();

    let controller =
        GameController::from_parts(cfg.clone(), match_id, coordinator, handles, event_tx);
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.rounds_played, 3);
    assert_eq!(summary.reason, GameOverReason::RoundLimit);
    assert_eq!(summary.winner, RoundWinner::Tie);
    assert_eq!(summary.score, [0, 0]);

    // First round: everyone 50 -> 40, both teams total 40*(1+2+3+4)
    let first = match event_rx.recv().await.unwrap() {
        MatchEvent::RoundCompleted(result) => result,
        other => panic!("expected a round event, got {other:?}"),
    };
    assert_eq!(first.team_totals, [400, 400]);
    assert_eq!(first.winner, RoundWinner::Tie);

    // Positions form a permutation of 1..=4 per team
    for team in [Team::One, Team::Two] {
        let mut positions: Vec<u8> = first.team_players(team).map(|p| p.position).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![1, 2, 3, 4]);
    }

    // Two more rounds, then game over
    for _ in 0..2 {
        assert!(matches!(
            event_rx.recv().await.unwrap(),
            MatchEvent::RoundCompleted(_)
        ));
    }
    assert!(matches!(
        event_rx.recv().await.unwrap(),
        MatchEvent::GameOver(_)
    ));
}

#[tokio::test]
async fn scenario_b_fallen_team_scores_zero_and_loses() {
    let mut cfg = degenerate_cfg();
    cfg.rounds_to_win = 1;
    // Team two starts on the ground
    let initial = [50, 50, 50, 50, 0, 0, 0, 0];
    let (match_id, coordinator, handles) = launch_lineup(&cfg, initial);
    let (event_tx, mut event_rx) = events::channel();

    let controller =
        GameController::from_parts(cfg.clone(), match_id, coordinator, handles, event_tx);
    let summary = controller.run().await.unwrap();

    let round = match event_rx.recv().await.unwrap() {
        MatchEvent::RoundCompleted(result) => result,
        other => panic!("expected a round event, got {other:?}"),
    };
    for player in round.team_players(Team::Two) {
        assert!(player.fallen);
        assert_eq!(player.effort, 0);
    }
    assert_eq!(round.team_totals[1], 0);
    assert_eq!(round.team_totals[0], 400);
    assert_eq!(round.winner, RoundWinner::Team(Team::One));

    assert_eq!(summary.rounds_played, 1);
    assert_eq!(summary.reason, GameOverReason::RoundLimit);
    assert_eq!(summary.score, [1, 0]);
    // Round budget expiry resolves by score comparison
    assert_eq!(summary.winner, RoundWinner::Team(Team::One));
}

#[tokio::test]
async fn scenario_c_two_straight_wins_end_the_game_early() {
    let mut cfg = degenerate_cfg();
    cfg.rounds_to_win = 10;
    let initial = [50, 50, 50, 50, 0, 0, 0, 0];
    let (match_id, coordinator, handles) = launch_lineup(&cfg, initial);
    let (event_tx, _event_rx) = events::channel();

    let controller = GameController::from_parts(cfg, match_id, coordinator, handles, event_tx);
    let summary = controller.run().await.unwrap();

    // Rounds 1 and 2 both go to team one; the round and time budgets
    // still had plenty left
    assert_eq!(summary.rounds_played, 2);
    assert_eq!(summary.reason, GameOverReason::ConsecutiveWins);
    assert_eq!(summary.winner, RoundWinner::Team(Team::One));
    assert_eq!(summary.score, [2, 0]);
}

#[tokio::test]
async fn scenario_d_time_limit_ends_game_resolved_by_score() {
    let mut cfg = degenerate_cfg();
    // Nothing ever decays, so every round is a tie and only the clock
    // can end the game
    cfg.decrease_min = 0;
    cfg.decrease_max = 0;
    cfg.game_duration_secs = 1;
    cfg.rounds_to_win = 100_000;
    cfg.round_pause_ms = 150;

    let (match_id, coordinator, handles) = launch_lineup(&cfg, [50; NUM_PLAYERS]);
    let (event_tx, _event_rx) = events::channel();

    let controller = GameController::from_parts(cfg, match_id, coordinator, handles, event_tx);
    let summary = controller.run().await.unwrap();

    assert_eq!(summary.reason, GameOverReason::TimeLimit);
    // Score comparison variant: equal scores resolve to a tie
    assert_eq!(summary.score, [0, 0]);
    assert_eq!(summary.winner, RoundWinner::Tie);
    assert!(summary.rounds_played < 100);
}

#[tokio::test]
async fn launch_rejects_invalid_config_before_spawning() {
    let mut cfg = degenerate_cfg();
    cfg.win_threshold = 0;
    let (event_tx, _event_rx) = events::channel();

    let err = GameController::launch(cfg, event_tx)
        .err()
        .expect("invalid config must not launch");
    assert!(err.to_string().contains("win_threshold"));
}

#[tokio::test]
async fn launched_match_plays_sorted_initial_energies() {
    let mut cfg = degenerate_cfg();
    cfg.energy_min = 40;
    cfg.energy_max = 90;
    cfg.rounds_to_win = 1;
    cfg.win_threshold = 1;
    let (event_tx, mut event_rx) = events::channel();

    let controller = GameController::launch(cfg, event_tx).unwrap();
    let summary = controller.run().await.unwrap();
    assert_eq!(summary.rounds_played, 1);

    // Initial energies are sorted per team, and one uniform decay step
    // preserves the order, so positions match slot order
    let round = match event_rx.recv().await.unwrap() {
        MatchEvent::RoundCompleted(result) => result,
        other => panic!("expected a round event, got {other:?}"),
    };
    for team in [Team::One, Team::Two] {
        for player in round.team_players(team) {
            assert_eq!(player.position, player.slot + 1);
        }
    }
}

//! Position assignment: the weakest pull gets the front of the rope.
//!
//! Pure function over one team's four energy reports. Recomputed from
//! current energies every round, never cached.

use crate::domain::TEAM_SIZE;

/// Map a team's `(player_id, energy)` pairs to `(player_id, position)`.
///
/// Stable ascending sort by energy: the k-th lowest energy receives
/// position k+1. Ties keep their original slot order, which is what
/// decides which of several fallen players (energy 0) ends up at
/// position 1.
pub fn assign_positions(reports: &[(u8, u32); TEAM_SIZE]) -> [(u8, u8); TEAM_SIZE] {
    let mut order: [usize; TEAM_SIZE] = [0, 1, 2, 3];
    order.sort_by_key(|&i| reports[i].1);

    let mut positions = [(0u8, 0u8); TEAM_SIZE];
    for (rank, &i) in order.iter().enumerate() {
        positions[i] = (reports[i].0, rank as u8 + 1);
    }
    positions
}

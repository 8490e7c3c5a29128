//! Tournament standings built from finished match results

pub mod ranking;
pub mod table;

pub use ranking::{compare_rows, rank_rows};
pub use table::StandingsTable;

use crate::types::{MatchRecord, StandingRow, TeamId, TournamentId};

/// Fold `matches` into ranked standings.
///
/// With `registered` teams every team gets a row, even without a finished
/// match; otherwise only teams that played appear.
pub fn build_standings(
    tournament_id: TournamentId,
    matches: &[MatchRecord],
    registered: Option<&[TeamId]>,
) -> Vec<StandingRow> {
    fold_standings(tournament_id, matches, registered).ranked()
}

/// Fold `matches` into a table that also keeps the folded and skipped counts
pub fn fold_standings(
    tournament_id: TournamentId,
    matches: &[MatchRecord],
    registered: Option<&[TeamId]>,
) -> StandingsTable {
    let mut table = match registered {
        Some(teams) => StandingsTable::with_teams(tournament_id, teams),
        None => StandingsTable::new(tournament_id),
    };

    for record in matches {
        table.apply(record);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchStatus;

    fn result(id: u64, a: TeamId, b: TeamId, goals: (u32, u32)) -> MatchRecord {
        MatchRecord {
            id,
            tournament_id: 4,
            team_a: Some(a),
            team_b: Some(b),
            status: MatchStatus::Finished,
            goals_a: Some(goals.0),
            goals_b: Some(goals.1),
        }
    }

    #[test]
    fn test_round_robin_ranking() {
        let matches = vec![
            result(1, 1, 2, (2, 0)),
            result(2, 3, 1, (1, 1)),
            result(3, 2, 3, (3, 0)),
        ];

        let rows = build_standings(4, &matches, None);
        let summary: Vec<(TeamId, u32, i64)> = rows
            .iter()
            .map(|r| (r.team_id, r.points, r.goal_difference))
            .collect();

        // team 1: W + D = 4 pts; team 2: L + W = 3 pts, gd +1; team 3: D + L = 1 pt
        assert_eq!(summary, vec![(1, 4, 2), (2, 3, 1), (3, 1, -3)]);
    }

    #[test]
    fn test_unplayed_teams_only_with_registration() {
        let mut open = result(1, 1, 2, (0, 0));
        open.status = MatchStatus::Open;

        assert!(build_standings(4, &[open.clone()], None).is_empty());

        let rows = build_standings(4, &[open], Some(&[1, 2]));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.played == 0));
    }

    #[test]
    fn test_fold_counts_skipped_matches() {
        let mut open = result(2, 1, 3, (0, 0));
        open.status = MatchStatus::Open;
        let mut elsewhere = result(3, 1, 2, (1, 0));
        elsewhere.tournament_id = 9;
        let matches = vec![result(1, 1, 2, (2, 1)), open, elsewhere, result(4, 2, 2, (1, 1))];

        let table = fold_standings(4, &matches, None);
        assert_eq!(table.folded(), 1);
        assert_eq!(table.skipped(), 3);
        assert_eq!(table.ranked(), build_standings(4, &matches, None));
    }
}

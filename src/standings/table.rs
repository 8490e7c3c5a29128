//! Incremental standings table for a single tournament

use crate::standings::ranking::rank_rows;
use crate::types::{MatchRecord, StandingRow, TeamId, TournamentId};
use std::collections::HashMap;
use tracing::debug;

const POINTS_FOR_WIN: u32 = 3;
const POINTS_FOR_DRAW: u32 = 1;

/// Standing rows folded from finished matches.
///
/// Every row stays consistent after each applied match, so results can be
/// fed in one at a time as they arrive.
#[derive(Debug, Clone)]
pub struct StandingsTable {
    tournament_id: TournamentId,
    rows: Vec<StandingRow>,
    index: HashMap<TeamId, usize>,
    folded: usize,
    skipped: usize,
}

impl StandingsTable {
    pub fn new(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id,
            rows: Vec::new(),
            index: HashMap::new(),
            folded: 0,
            skipped: 0,
        }
    }

    /// Table with a zero row for every registered team
    pub fn with_teams(tournament_id: TournamentId, teams: &[TeamId]) -> Self {
        let mut table = Self::new(tournament_id);
        for team in teams {
            table.row_mut(*team);
        }
        table
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    /// Fold one match into the table.
    ///
    /// Returns false when the match does not count: it is not finished, it
    /// lacks a team or a score, it belongs to another tournament, or both
    /// sides are the same team.
    pub fn apply(&mut self, record: &MatchRecord) -> bool {
        let counted = self.fold(record);
        if counted {
            self.folded += 1;
        } else {
            self.skipped += 1;
        }
        counted
    }

    /// Matches that changed the table so far
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// Matches handed to `apply` that did not count
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn fold(&mut self, record: &MatchRecord) -> bool {
        if record.tournament_id != self.tournament_id {
            debug!(
                "Skipping match {} from tournament {}",
                record.id, record.tournament_id
            );
            return false;
        }

        let Some(((team_a, goals_a), (team_b, goals_b))) = record.final_score() else {
            debug!("Skipping match {}: not a finished, complete result", record.id);
            return false;
        };
        if team_a == team_b {
            debug!("Skipping match {}: team {} on both sides", record.id, team_a);
            return false;
        }

        self.row_mut(team_a).record(goals_a, goals_b);
        self.row_mut(team_b).record(goals_b, goals_a);
        true
    }

    /// Rows sorted by points, goal difference and goals scored
    pub fn ranked(&self) -> Vec<StandingRow> {
        let mut rows = self.rows.clone();
        rank_rows(&mut rows);
        rows
    }

    pub fn get(&self, team_id: TeamId) -> Option<&StandingRow> {
        self.index.get(&team_id).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, team_id: TeamId) -> &mut StandingRow {
        let next = self.rows.len();
        let i = *self.index.entry(team_id).or_insert(next);
        if i == next {
            self.rows
                .push(StandingRow::empty(team_id, self.tournament_id));
        }
        &mut self.rows[i]
    }
}

impl StandingRow {
    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        self.goal_difference = i64::from(self.goals_for) - i64::from(self.goals_against);

        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.won += 1;
                self.points += POINTS_FOR_WIN;
            }
            std::cmp::Ordering::Equal => {
                self.drawn += 1;
                self.points += POINTS_FOR_DRAW;
            }
            std::cmp::Ordering::Less => self.lost += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchStatus;

    fn finished(id: u64, a: TeamId, b: TeamId, goals_a: u32, goals_b: u32) -> MatchRecord {
        MatchRecord {
            id,
            tournament_id: 1,
            team_a: Some(a),
            team_b: Some(b),
            status: MatchStatus::Finished,
            goals_a: Some(goals_a),
            goals_b: Some(goals_b),
        }
    }

    #[test]
    fn test_win_and_loss() {
        let mut table = StandingsTable::new(1);
        assert!(table.apply(&finished(1, 10, 20, 2, 1)));

        let winner = table.get(10).unwrap();
        assert_eq!(winner.points, 3);
        assert_eq!(winner.won, 1);
        assert_eq!(winner.goals_for, 2);
        assert_eq!(winner.goals_against, 1);
        assert_eq!(winner.goal_difference, 1);

        let loser = table.get(20).unwrap();
        assert_eq!(loser.points, 0);
        assert_eq!(loser.lost, 1);
        assert_eq!(loser.goals_for, 1);
        assert_eq!(loser.goals_against, 2);
        assert_eq!(loser.goal_difference, -1);
    }

    #[test]
    fn test_draw() {
        let mut table = StandingsTable::new(1);
        table.apply(&finished(1, 10, 20, 1, 1));

        for team in [10, 20] {
            let row = table.get(team).unwrap();
            assert_eq!(row.points, 1);
            assert_eq!(row.drawn, 1);
            assert_eq!(row.goal_difference, 0);
        }
    }

    #[test]
    fn test_skipped_matches() {
        let mut table = StandingsTable::new(1);

        let mut open = finished(1, 10, 20, 0, 0);
        open.status = MatchStatus::Open;
        assert!(!table.apply(&open));

        let mut missing_team = finished(2, 10, 20, 3, 0);
        missing_team.team_b = None;
        assert!(!table.apply(&missing_team));

        let mut missing_score = finished(3, 10, 20, 3, 0);
        missing_score.goals_a = None;
        assert!(!table.apply(&missing_score));

        let mut other_tournament = finished(4, 10, 20, 3, 0);
        other_tournament.tournament_id = 2;
        assert!(!table.apply(&other_tournament));

        assert!(!table.apply(&finished(5, 10, 10, 1, 0)));

        assert!(table.is_empty());
    }

    #[test]
    fn test_registered_teams_get_zero_rows() {
        let mut table = StandingsTable::with_teams(1, &[30, 10, 20]);
        table.apply(&finished(1, 20, 10, 4, 0));

        let ranked = table.ranked();
        let order: Vec<TeamId> = ranked.iter().map(|r| r.team_id).collect();
        assert_eq!(order, vec![20, 30, 10]);
        assert_eq!(ranked[1].played, 0);
    }

    #[test]
    fn test_invariants_hold_after_every_step() {
        let matches = [
            finished(1, 1, 2, 3, 1),
            finished(2, 2, 3, 2, 2),
            finished(3, 3, 1, 0, 1),
            finished(4, 1, 2, 0, 4),
        ];
        let mut table = StandingsTable::new(1);

        for record in &matches {
            table.apply(record);
            for row in table.ranked() {
                assert_eq!(row.points, 3 * row.won + row.drawn);
                assert_eq!(row.played, row.won + row.drawn + row.lost);
                assert_eq!(
                    row.goal_difference,
                    i64::from(row.goals_for) - i64::from(row.goals_against)
                );
            }
        }

        let total_for: u32 = table.ranked().iter().map(|r| r.goals_for).sum();
        let total_against: u32 = table.ranked().iter().map(|r| r.goals_against).sum();
        assert_eq!(total_for, total_against);
    }
}

//! Ordering of standing rows within a tournament

use std::cmp::Ordering;

use crate::types::StandingRow;

fn compare_points(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points.cmp(&a.points)
}

fn compare_goal_difference(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.goal_difference.cmp(&a.goal_difference)
}

fn compare_goals_for(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.goals_for.cmp(&a.goals_for)
}

// Tie-breakers in order of priority.
const CRITERIA: [fn(&StandingRow, &StandingRow) -> Ordering; 3] =
    [compare_points, compare_goal_difference, compare_goals_for];

/// Better row first. Rows equal on every criterion compare as `Equal`.
pub fn compare_rows(a: &StandingRow, b: &StandingRow) -> Ordering {
    CRITERIA
        .iter()
        .map(|criterion| criterion(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Stable sort, so fully tied rows keep their input order.
pub fn rank_rows(rows: &mut [StandingRow]) {
    rows.sort_by(compare_rows);
}

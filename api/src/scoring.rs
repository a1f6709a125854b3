//! Score bookkeeping done on the client. The backend owns the real totals;
//! these are display approximations.

use crate::{Score, Team};
use std::cmp::Ordering;

/// Replace the score for `(team_id, round_number)` or append it.
/// Returns true when an existing entry was replaced.
pub fn upsert_score(scores: &mut Vec<Score>, score: Score) -> bool {
    match scores
        .iter_mut()
        .find(|s| s.team_id == score.team_id && s.round_number == score.round_number)
    {
        Some(existing) => {
            *existing = score;
            true
        }
        None => {
            scores.push(score);
            false
        }
    }
}

/// Sum of points over the team's non-eliminated rounds.
pub fn cumulative_score(team_id: &str, scores: &[Score]) -> u32 {
    scores
        .iter()
        .filter(|s| s.team_id == team_id && !s.eliminated)
        .map(|s| s.points)
        .sum()
}

pub fn is_eliminated(team_id: &str, scores: &[Score]) -> bool {
    scores.iter().any(|s| s.team_id == team_id && s.eliminated)
}

/// Points for a ticket holding `team_ids`.
pub fn ticket_points<S: AsRef<str>>(team_ids: &[S], scores: &[Score]) -> u32 {
    team_ids
        .iter()
        .map(|id| cumulative_score(id.as_ref(), scores))
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub team_id: String,
    pub label: String,
    pub seed: String,
    pub points: u32,
    pub eliminated: bool,
}

/// Teams ordered by cumulative score, highest first; ties go to the better
/// (lower) seed.
pub fn standings(teams: &[Team], scores: &[Score]) -> Vec<Standing> {
    let mut rows: Vec<Standing> = teams
        .iter()
        .map(|team| Standing {
            team_id: team.id.clone(),
            label: team.label(),
            seed: team.seed_number.clone(),
            points: cumulative_score(&team.id, scores),
            eliminated: is_eliminated(&team.id, scores),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| compare_seeds(&a.seed, &b.seed))
    });
    rows
}

fn compare_seeds(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(team: &str, round: u32, points: u32, eliminated: bool) -> Score {
        Score {
            tournament_id: "t1".into(),
            team_id: team.into(),
            round_number: round,
            points,
            eliminated,
        }
    }

    fn team(id: &str, seed: &str, name: &str) -> Team {
        Team {
            id: id.into(),
            seed_number: seed.into(),
            team_name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_replaces_same_team_and_round() {
        let mut scores = vec![score("a", 1, 10, false)];
        assert!(!upsert_score(&mut scores, score("a", 2, 5, false)));
        assert!(upsert_score(&mut scores, score("a", 1, 12, false)));
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].points, 12);
    }

    #[test]
    fn upsert_keeps_one_entry_per_pair() {
        let mut scores = Vec::new();
        for points in [1, 2, 3] {
            upsert_score(&mut scores, score("a", 1, points, false));
            upsert_score(&mut scores, score("b", 1, points, false));
        }
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn eliminated_rounds_do_not_count() {
        let scores = vec![
            score("a", 1, 10, false),
            score("a", 2, 20, false),
            score("a", 3, 30, true),
            score("b", 1, 99, false),
        ];
        assert_eq!(cumulative_score("a", &scores), 30);
        assert!(is_eliminated("a", &scores));
        assert!(!is_eliminated("b", &scores));
        assert_eq!(cumulative_score("missing", &scores), 0);
    }

    #[test]
    fn ticket_points_sum_team_totals() {
        let scores = vec![score("a", 1, 10, false), score("b", 1, 4, false)];
        assert_eq!(ticket_points(&["a", "b", "c"], &scores), 14);
    }

    #[test]
    fn standings_sort_by_points_then_seed() {
        let teams = vec![
            team("a", "10", "Owls"),
            team("b", "2", "Hawks"),
            team("c", "1", "Bears"),
        ];
        let scores = vec![
            score("a", 1, 8, false),
            score("b", 1, 5, false),
            score("c", 1, 5, false),
        ];
        let order: Vec<String> = standings(&teams, &scores)
            .into_iter()
            .map(|s| s.team_id)
            .collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }
}

//! Machine-readable solution report (`--json`).

use klotski_core::{Board, Identity, Rules, Step};
use serde::Serialize;

use crate::solver::Outcome;
use crate::stats::SearchStats;

/// One transition on the solution path.
#[derive(Debug, Serialize)]
pub struct MoveRecord {
    /// 1-based move number
    pub number: usize,
    pub step: Step,
    /// Human-readable pattern, e.g. "down-left"
    pub description: String,
    /// Board after the move, one string per row
    pub board: Vec<String>,
}

/// Counters copied out of `SearchStats`.
#[derive(Debug, Serialize)]
pub struct StatsRecord {
    pub expanded: u64,
    pub discovered: u64,
    pub duplicates: u64,
    pub max_frontier: usize,
    pub layers: Vec<u64>,
    pub elapsed_secs: f64,
}

impl From<&SearchStats> for StatsRecord {
    fn from(stats: &SearchStats) -> Self {
        Self {
            expanded: stats.expanded,
            discovered: stats.discovered,
            duplicates: stats.duplicates,
            max_frontier: stats.max_frontier,
            layers: stats.layers.clone(),
            elapsed_secs: stats.elapsed_secs(),
        }
    }
}

/// A search that ended without a solution.
#[derive(Debug, Serialize)]
pub struct OutcomeReport {
    /// "exhausted" or "interrupted"
    pub outcome: &'static str,
    pub rules: Rules,
    pub identity: Identity,
    pub stats: StatsRecord,
}

impl OutcomeReport {
    pub fn new(outcome: Outcome, rules: Rules, identity: Identity, stats: &SearchStats) -> Self {
        Self {
            outcome: outcome.name(),
            rules,
            identity,
            stats: StatsRecord::from(stats),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Full solution: the settings, the start, and every move.
#[derive(Debug, Serialize)]
pub struct SolutionReport {
    /// Always "solved"
    pub outcome: &'static str,
    pub rules: Rules,
    pub identity: Identity,
    pub move_count: usize,
    pub start: Vec<String>,
    pub moves: Vec<MoveRecord>,
    pub stats: StatsRecord,
}

impl SolutionReport {
    /// Build a report from a path and the moves between its boards.
    pub fn new(
        rules: Rules,
        identity: Identity,
        path: &[Board],
        steps: &[Step],
        stats: &SearchStats,
    ) -> Self {
        let moves = steps
            .iter()
            .zip(path.iter().skip(1))
            .enumerate()
            .map(|(i, (step, board))| MoveRecord {
                number: i + 1,
                step: *step,
                description: step.pattern.to_string(),
                board: board.rows(),
            })
            .collect();

        Self {
            outcome: "solved",
            rules,
            identity,
            move_count: steps.len(),
            start: path.first().map(Board::rows).unwrap_or_default(),
            moves,
            stats: StatsRecord::from(stats),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    fn short_path() -> Vec<Board> {
        let rules = Rules::default();
        let start = Board::new();
        let (_, first) = start.successors(&rules)[0];
        let (_, second) = first
            .successors(&rules)
            .into_iter()
            .find(|(_, b)| *b != start)
            .unwrap();
        vec![start, first, second]
    }

    #[test]
    fn test_report_moves() {
        let path = short_path();
        let steps = path::steps(&path).unwrap();
        let report = SolutionReport::new(
            Rules::default(),
            Identity::Labelled,
            &path,
            &steps,
            &SearchStats::new(),
        );

        assert_eq!(report.move_count, 2);
        assert_eq!(report.start, Board::new().rows());
        assert_eq!(report.moves[0].number, 1);
        assert_eq!(report.moves[1].board, path[2].rows());
        assert_eq!(report.moves[0].description, steps[0].pattern.to_string());
    }

    #[test]
    fn test_report_json() {
        let path = short_path();
        let steps = path::steps(&path).unwrap();
        let report = SolutionReport::new(
            Rules::default(),
            Identity::Interchangeable,
            &path,
            &steps,
            &SearchStats::new(),
        );

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["move_count"], 2);
        assert_eq!(value["identity"], "Interchangeable");
        assert_eq!(value["start"][0], "B B B B G");
        assert_eq!(value["moves"].as_array().unwrap().len(), 2);
        assert_eq!(value["rules"]["combos"], true);
        assert_eq!(value["outcome"], "solved");
    }

    #[test]
    fn test_outcome_report_json() {
        let mut stats = SearchStats::new();
        stats.record_discovered(0);
        stats.record_expanded(0, 0);

        let cases = [(Outcome::Exhausted, "exhausted"), (Outcome::Interrupted, "interrupted")];
        for (outcome, name) in cases {
            let report = OutcomeReport::new(outcome, Rules::default(), Identity::Labelled, &stats);
            let value: serde_json::Value =
                serde_json::from_str(&report.to_json().unwrap()).unwrap();
            assert_eq!(value["outcome"], name);
            assert_eq!(value["identity"], "Labelled");
            assert_eq!(value["stats"]["expanded"], 1);
            assert_eq!(value["stats"]["layers"][0], 1);
        }
    }
}

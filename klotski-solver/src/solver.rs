//! Breadth-first shortest-path search with a predecessor map.

use std::collections::{HashMap, VecDeque};
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use klotski_core::{Board, Identity, Puzzle, PuzzleError, Rules};
use log::debug;
use xxhash_rust::xxh64::Xxh64Builder;

use crate::movegen::MoveGenerator;
use crate::path::{self, PathError};
use crate::stats::SearchStats;

/// Seed for the predecessor map hasher.
pub const HASH_SEED: u64 = 39;

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The first solved board dequeued.
    Solved(Board),
    /// Every reachable board was expanded without reaching the goal.
    Exhausted,
    /// The running flag was cleared before the search finished.
    Interrupted,
}

impl Outcome {
    pub const fn name(&self) -> &'static str {
        match self {
            Outcome::Solved(_) => "solved",
            Outcome::Exhausted => "exhausted",
            Outcome::Interrupted => "interrupted",
        }
    }
}

/// Search settings that are independent of the puzzle instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    pub rules: Rules,
    pub identity: Identity,
    /// Seconds between progress log lines
    pub log_interval_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            identity: Identity::default(),
            log_interval_secs: 5,
        }
    }
}

/// BFS solver.
///
/// The predecessor map doubles as the visited set. Keys are
/// `identity.key(board)`; values are the actual board that was expanded to
/// reach the key, or None for the start.
pub struct Solver<S = Xxh64Builder> {
    pub config: SearchConfig,
    /// Predecessor map: key -> board it was reached from
    pub predecessors: HashMap<Board, Option<Board>, S>,
    /// Search statistics
    pub stats: SearchStats,
}

impl Solver {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_hasher(config, Xxh64Builder::new(HASH_SEED))
    }
}

impl<S: BuildHasher> Solver<S> {
    /// Create a solver whose predecessor map uses the given hasher.
    pub fn with_hasher(config: SearchConfig, hasher: S) -> Self {
        Self {
            config,
            predecessors: HashMap::with_hasher(hasher),
            stats: SearchStats::new(),
        }
    }

    /// Search from `puzzle.start` until a solved board is dequeued.
    ///
    /// Any previous search state is discarded. Returns `Outcome::Interrupted`
    /// as soon as `running` is cleared. Fails before searching if the puzzle
    /// does not validate.
    pub fn solve(
        &mut self,
        puzzle: &Puzzle,
        running: Arc<AtomicBool>,
    ) -> Result<Outcome, PuzzleError> {
        puzzle.validate()?;
        let SearchConfig { rules, identity, log_interval_secs } = self.config;

        self.predecessors.clear();
        self.stats = SearchStats::new();

        let mut frontier: VecDeque<(Board, u32)> = VecDeque::new();
        self.predecessors.insert(identity.key(&puzzle.start), None);
        self.stats.record_discovered(0);
        frontier.push_back((puzzle.start, 0));

        while let Some((board, depth)) = frontier.pop_front() {
            if !running.load(Ordering::Relaxed) {
                return Ok(Outcome::Interrupted);
            }

            if puzzle.is_solved(&board) {
                debug!("solved at depth {} after {} expansions", depth, self.stats.expanded);
                self.stats.depth = depth;
                return Ok(Outcome::Solved(board));
            }

            let mut gen = MoveGenerator::new(&board, rules);
            while let Some((_, next)) = gen.next(&board) {
                let key = identity.key(&next);
                if self.predecessors.contains_key(&key) {
                    self.stats.duplicates += 1;
                    continue;
                }
                self.predecessors.insert(key, Some(board));
                self.stats.record_discovered(depth + 1);
                frontier.push_back((next, depth + 1));
            }

            self.stats.record_expanded(depth, frontier.len());
            if self.stats.should_log(log_interval_secs) {
                self.stats.log_progress(frontier.len());
            }
        }

        Ok(Outcome::Exhausted)
    }

    /// Boards from the start to `solved`, inclusive.
    pub fn path(&self, solved: Board) -> Result<Vec<Board>, PathError> {
        path::reconstruct(solved, &self.predecessors, self.config.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasherDefault, Hasher};

    use klotski_core::{cell_bit, Color, Direction, Mechanism, Pattern, Piece, Step};

    /// Optimal length of the classic puzzle with combo moves.
    const CLASSIC_MOVES: usize = 81;

    fn running() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    fn interchangeable(rules: Rules) -> SearchConfig {
        SearchConfig {
            rules,
            identity: Identity::Interchangeable,
            log_interval_secs: 3600,
        }
    }

    /// Solve and return the path, panicking on anything but success.
    fn solve_path<S: BuildHasher>(solver: &mut Solver<S>, puzzle: &Puzzle) -> Vec<Board> {
        match solver.solve(puzzle, running()).unwrap() {
            Outcome::Solved(board) => solver.path(board).unwrap(),
            other => panic!("expected a solution, got {:?}", other),
        }
    }

    /// Red square one slide left of the target.
    fn one_move_board() -> Board {
        Board::from_pieces([
            Piece::new(Color::Blue, [0b11000, 0, 0, 0]),
            Piece::new(Color::Blue, [0b00110, 0, 0, 0]),
            Piece::new(Color::Green, [0b00001, 0, 0, 0]),
            Piece::new(Color::Red, [0, 0b00110, 0b00110, 0]),
            Piece::new(Color::Purple, [0, 0b10000, 0b10000, 0]),
            Piece::new(Color::Green, [0, 0b01000, 0, 0]),
            Piece::new(Color::Green, [0, 0, 0b01000, 0]),
            Piece::new(Color::Blue, [0, 0, 0, 0b11000]),
            Piece::new(Color::Blue, [0, 0, 0, 0b00110]),
            Piece::new(Color::Green, [0, 0, 0, 0b00001]),
        ])
    }

    /// Every lookup lands in the same bucket.
    #[derive(Default)]
    struct CollidingHasher;

    impl Hasher for CollidingHasher {
        fn finish(&self) -> u64 {
            0
        }
        fn write(&mut self, _bytes: &[u8]) {}
    }

    // ========== Classic Puzzle ==========

    #[test]
    fn test_solve_classic() {
        let mut solver = Solver::new(interchangeable(Rules::default()));
        let puzzle = Puzzle::classic();
        let path = solve_path(&mut solver, &puzzle);

        assert_eq!(path.len() - 1, CLASSIC_MOVES);
        assert_eq!(path[0], Board::new());
        assert!(puzzle.is_solved(path.last().unwrap()));
        assert!(!path[..path.len() - 1].iter().any(|b| puzzle.is_solved(b)));
        assert!(solver.predecessors.len() <= 25_955);
        assert!(solver.stats.expanded < 30_000);
        assert_eq!(solver.stats.depth as usize, CLASSIC_MOVES);

        for board in solver.predecessors.keys() {
            assert!(board.is_valid(), "invalid layout recorded:\n{}", board);
        }
        println!("States discovered: {}", solver.stats.discovered);
    }

    #[test]
    fn test_path_is_connected() {
        let rules = Rules::default();
        let mut solver = Solver::new(interchangeable(rules));
        let path = solve_path(&mut solver, &Puzzle::classic());

        let steps = path::steps(&path).unwrap();
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(path[i].apply(*step, &rules), Some(path[i + 1]));
        }
    }

    #[test]
    fn test_bitmask_mechanism_same_length() {
        let mut solver = Solver::new(interchangeable(Rules::new(Mechanism::Bitmask)));
        let path = solve_path(&mut solver, &Puzzle::classic());
        assert_eq!(path.len() - 1, CLASSIC_MOVES);
    }

    #[test]
    fn test_single_steps_only() {
        let mut solver = Solver::new(interchangeable(Rules::single_steps(Mechanism::Composed)));
        let path = solve_path(&mut solver, &Puzzle::classic());
        assert_eq!(path.len() - 1, 116);
        for step in path::steps(&path).unwrap() {
            assert!(!step.pattern.is_combo());
        }
    }

    #[test]
    fn test_resolve_same_length() {
        let mut solver = Solver::new(interchangeable(Rules::default()));
        let puzzle = Puzzle::classic();
        let first = solve_path(&mut solver, &puzzle);
        let second = solve_path(&mut solver, &puzzle);
        assert_eq!(first.len(), second.len());

        let mut fresh = Solver::new(interchangeable(Rules::default()));
        assert_eq!(solve_path(&mut fresh, &puzzle).len(), first.len());
    }

    #[test]
    #[ignore] // ~10M states and several GB - run manually with: cargo test test_solve_labelled --release -- --ignored
    fn test_solve_labelled() {
        let config = SearchConfig {
            log_interval_secs: 60,
            ..SearchConfig::default()
        };
        let mut solver = Solver::new(config);
        let path = solve_path(&mut solver, &Puzzle::classic());
        assert_eq!(path.len() - 1, CLASSIC_MOVES);
        println!("States discovered: {}", solver.stats.discovered);
    }

    // ========== Optimality ==========

    #[test]
    fn test_solved_start() {
        let mut solver = Solver::new(SearchConfig::default());
        let slide = Step {
            piece: Board::RED_INDEX,
            pattern: Pattern::Single(Direction::Right),
        };
        let start = one_move_board().apply(slide, &Rules::default()).unwrap();
        let puzzle = Puzzle::classic().with_start(start);

        assert_eq!(solver.solve(&puzzle, running()), Ok(Outcome::Solved(start)));
        assert_eq!(solver.path(start).unwrap(), vec![start]);
        assert_eq!(solver.stats.expanded, 0);
    }

    #[test]
    fn test_one_move() {
        let mut solver = Solver::new(SearchConfig::default());
        let puzzle = Puzzle::classic().with_start(one_move_board());
        let path = solve_path(&mut solver, &puzzle);
        assert_eq!(path.len(), 2);
        assert_eq!(path[0], one_move_board());
    }

    #[test]
    fn test_suffix_optimality() {
        // Every board on an optimal path is exactly its remaining length away.
        let mut solver = Solver::new(interchangeable(Rules::default()));
        let classic = Puzzle::classic();
        let path = solve_path(&mut solver, &classic);
        let total = path.len() - 1;

        for k in [total - 1, total - 5, total - 20, total / 2, 1] {
            let puzzle = classic.with_start(path[k]);
            let suffix = solve_path(&mut solver, &puzzle);
            assert_eq!(suffix.len() - 1, total - k, "from move {}", k);
        }
    }

    // ========== Outcomes ==========

    #[test]
    fn test_exhausted() {
        // A single cell can never equal the red square's occupancy.
        let puzzle = Puzzle::new(Board::new(), Board::RED_INDEX, cell_bit(0, 0));
        let mut solver = Solver::new(interchangeable(Rules::default()));

        assert_eq!(solver.solve(&puzzle, running()), Ok(Outcome::Exhausted));
        assert_eq!(solver.predecessors.len(), 25_955);
        assert_eq!(solver.stats.expanded, 25_955);
        assert_eq!(solver.stats.layers.iter().sum::<u64>(), 25_955);
    }

    #[test]
    fn test_interrupted() {
        let mut solver = Solver::new(SearchConfig::default());
        let stopped = Arc::new(AtomicBool::new(false));
        assert_eq!(solver.solve(&Puzzle::classic(), stopped), Ok(Outcome::Interrupted));
        assert_eq!(solver.stats.expanded, 0);
    }

    #[test]
    fn test_every_state_expanded_once() {
        let puzzle = Puzzle::new(Board::new(), Board::RED_INDEX, cell_bit(0, 0));
        let mut solver = Solver::new(interchangeable(Rules::default()));
        solver.solve(&puzzle, running()).unwrap();
        assert_eq!(solver.stats.expanded, solver.stats.discovered);
    }

    #[test]
    fn test_invalid_puzzle_rejected() {
        let mut solver = Solver::new(SearchConfig::default());

        let puzzle = Puzzle::new(Board::new(), 10, klotski_core::SOLUTION_MASK);
        assert_eq!(
            solver.solve(&puzzle, running()),
            Err(PuzzleError::GoalPieceOutOfRange(10))
        );

        let overlapping = Board::new().with_piece(5, Piece::new(Color::Green, [0, 0b10000, 0, 0]));
        let puzzle = Puzzle::classic().with_start(overlapping);
        assert_eq!(
            solver.solve(&puzzle, running()),
            Err(PuzzleError::InvalidStart(overlapping))
        );
        assert!(solver.predecessors.is_empty());
    }

    // ========== Hashing ==========

    #[test]
    fn test_map_hasher_consistent_with_eq() {
        let hasher = Xxh64Builder::new(HASH_SEED);
        let board = Board::new();
        let copy = Board::from_pieces(*board.pieces());
        assert_eq!(board, copy);
        assert_eq!(hasher.hash_one(board), hasher.hash_one(copy));

        // Relabelled boards share a key under interchangeable identity.
        let mut pieces = *board.pieces();
        pieces.swap(5, 6);
        let relabelled = Board::from_pieces(pieces);
        let key = |b: &Board| Identity::Interchangeable.key(b);
        assert_ne!(board, relabelled);
        assert_eq!(key(&board), key(&relabelled));
        assert_eq!(hasher.hash_one(key(&board)), hasher.hash_one(key(&relabelled)));

        // Every successor stays distinguishable from its parent.
        for (_, next) in board.successors(&Rules::default()) {
            assert_ne!(next, board);
            let mut map: HashMap<Board, (), Xxh64Builder> =
                HashMap::with_hasher(Xxh64Builder::new(HASH_SEED));
            map.insert(board, ());
            assert!(!map.contains_key(&next));
        }
    }

    #[test]
    fn test_colliding_hasher() {
        // Equal hashes must never merge unequal boards.
        let mut reference = Solver::new(interchangeable(Rules::default()));
        let path = solve_path(&mut reference, &Puzzle::classic());
        let puzzle = Puzzle::classic().with_start(path[path.len() - 6]);

        let mut solver = Solver::with_hasher(
            interchangeable(Rules::default()),
            BuildHasherDefault::<CollidingHasher>::default(),
        );
        let suffix = solve_path(&mut solver, &puzzle);
        assert_eq!(suffix.len() - 1, 5);
    }
}

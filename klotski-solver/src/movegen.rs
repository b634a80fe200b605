//! Lazy successor generator for the search loop.
//!
//! Instead of collecting every successor up front, this iterator produces
//! them one at a time, tracking which piece and pattern to try next.

use klotski_core::{Board, Pattern, Rules, Step, PIECE_COUNT};

/// Lazy successor generator.
///
/// Generates moves in order:
/// 1. Pieces by index
/// 2. For each piece, its single steps then its combo moves
pub struct MoveGenerator {
    rules: Rules,
    /// Union of all pieces' cells
    occupancy: u32,
    /// Current piece
    piece_idx: usize,
    /// Patterns left to try for the current piece
    patterns: &'static [Pattern],
}

impl MoveGenerator {
    /// Create a new move generator for the given board.
    pub fn new(board: &Board, rules: Rules) -> Self {
        Self {
            rules,
            occupancy: board.occupancy(),
            piece_idx: 0,
            patterns: rules.patterns(board.piece(0).color()),
        }
    }

    /// Get the next legal move and the board it produces, or None if
    /// exhausted.
    pub fn next(&mut self, board: &Board) -> Option<(Step, Board)> {
        while self.piece_idx < PIECE_COUNT {
            let piece = board.piece(self.piece_idx);
            let others = self.occupancy & !piece.occupancy();

            while let Some((&pattern, rest)) = self.patterns.split_first() {
                self.patterns = rest;
                if let Some(moved) = self.rules.apply(piece, pattern, others) {
                    let step = Step { piece: self.piece_idx, pattern };
                    return Some((step, board.with_piece(self.piece_idx, moved)));
                }
            }

            // Done with this piece
            self.piece_idx += 1;
            if self.piece_idx < PIECE_COUNT {
                self.patterns = self.rules.patterns(board.piece(self.piece_idx).color());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use klotski_core::Mechanism;

    #[test]
    fn test_initial_position_move_count() {
        let board = Board::new();
        let mut gen = MoveGenerator::new(&board, Rules::default());
        let mut count = 0;
        while gen.next(&board).is_some() {
            count += 1;
        }
        // Two greens beside the gap: right and diagonal each.
        // Two corner greens: one and two cells into the gap.
        assert_eq!(count, 8);
    }

    #[test]
    fn test_generator_vs_successors() {
        for rules in [
            Rules::default(),
            Rules::new(Mechanism::Bitmask),
            Rules::single_steps(Mechanism::Composed),
        ] {
            let board = Board::new();

            // Get moves from generator
            let mut gen = MoveGenerator::new(&board, rules);
            let mut gen_moves = Vec::new();
            while let Some(found) = gen.next(&board) {
                gen_moves.push(found);
            }

            // Same moves, same order
            assert_eq!(gen_moves, board.successors(&rules));
        }
    }

    #[test]
    fn test_generator_exhausted_stays_exhausted() {
        let board = Board::new();
        let mut gen = MoveGenerator::new(&board, Rules::default());
        while gen.next(&board).is_some() {}
        assert_eq!(gen.next(&board), None);
    }
}

//! Hard-coded combined-mask legality checks.
//!
//! Each pattern is a single expression over shifted copies of the piece's
//! occupancy, with no per-class restriction. On a board with exactly two
//! empty cells only a single-cell piece can ever make a combo move, so this
//! mechanism reaches the same states as the per-class composition in
//! [`Piece::apply`](crate::Piece::apply). `tests/rules.rs` checks that
//! exhaustively on the classic layout.

use crate::{
    Direction, Horizontal, Pattern, Piece, Vertical, BOTTOM_ROW_MASK, LEFT_COLUMN_MASK,
    RIGHT_COLUMN_MASK, TOP_ROW_MASK,
};

const TOP_TWO_ROWS: u32 = TOP_ROW_MASK | (TOP_ROW_MASK >> 5);
const BOTTOM_TWO_ROWS: u32 = BOTTOM_ROW_MASK | (BOTTOM_ROW_MASK << 5);
const LEFT_TWO_COLUMNS: u32 = LEFT_COLUMN_MASK | (LEFT_COLUMN_MASK >> 1);
const RIGHT_TWO_COLUMNS: u32 = RIGHT_COLUMN_MASK | (RIGHT_COLUMN_MASK << 1);

/// Apply any pattern to any piece.
pub fn apply(piece: Piece, pattern: Pattern, others: u32) -> Option<Piece> {
    use Direction::*;

    match pattern {
        Pattern::Single(Up) => up(piece, others),
        Pattern::Single(Down) => down(piece, others),
        Pattern::Single(Left) => left(piece, others),
        Pattern::Single(Right) => right(piece, others),
        Pattern::Double(Up) => up_twice(piece, others),
        Pattern::Double(Down) => down_twice(piece, others),
        Pattern::Double(Left) => left_twice(piece, others),
        Pattern::Double(Right) => right_twice(piece, others),
        Pattern::Diagonal { vertical, horizontal } => match (vertical, horizontal) {
            (Vertical::Up, Horizontal::Left) => up_left(piece, others),
            (Vertical::Up, Horizontal::Right) => up_right(piece, others),
            (Vertical::Down, Horizontal::Left) => down_left(piece, others),
            (Vertical::Down, Horizontal::Right) => down_right(piece, others),
        },
    }
}

#[inline]
fn accept(piece: Piece, moved: u32, swept: u32, others: u32) -> Option<Piece> {
    if swept & others != 0 {
        return None;
    }
    Some(piece.with_occupancy(moved))
}

pub fn up(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & TOP_ROW_MASK != 0 {
        return None;
    }
    accept(piece, bits << 5, bits << 5, others)
}

pub fn down(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & BOTTOM_ROW_MASK != 0 {
        return None;
    }
    accept(piece, bits >> 5, bits >> 5, others)
}

pub fn left(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & LEFT_COLUMN_MASK != 0 {
        return None;
    }
    accept(piece, bits << 1, bits << 1, others)
}

pub fn right(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & RIGHT_COLUMN_MASK != 0 {
        return None;
    }
    accept(piece, bits >> 1, bits >> 1, others)
}

pub fn up_twice(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & TOP_TWO_ROWS != 0 {
        return None;
    }
    accept(piece, bits << 10, (bits << 5) | (bits << 10), others)
}

pub fn down_twice(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & BOTTOM_TWO_ROWS != 0 {
        return None;
    }
    accept(piece, bits >> 10, (bits >> 5) | (bits >> 10), others)
}

pub fn left_twice(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & LEFT_TWO_COLUMNS != 0 {
        return None;
    }
    accept(piece, bits << 2, (bits << 1) | (bits << 2), others)
}

pub fn right_twice(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & RIGHT_TWO_COLUMNS != 0 {
        return None;
    }
    accept(piece, bits >> 2, (bits >> 1) | (bits >> 2), others)
}

/// Diagonal: clear if either corner cell path is open.
#[inline]
fn diagonal(piece: Piece, vertical: u32, horizontal: u32, target: u32, others: u32) -> Option<Piece> {
    let vertical_first = (vertical | target) & others == 0;
    let horizontal_first = (horizontal | target) & others == 0;
    if vertical_first || horizontal_first {
        Some(piece.with_occupancy(target))
    } else {
        None
    }
}

pub fn up_left(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & (TOP_ROW_MASK | LEFT_COLUMN_MASK) != 0 {
        return None;
    }
    diagonal(piece, bits << 5, bits << 1, bits << 6, others)
}

pub fn up_right(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & (TOP_ROW_MASK | RIGHT_COLUMN_MASK) != 0 {
        return None;
    }
    diagonal(piece, bits << 5, bits >> 1, bits << 4, others)
}

pub fn down_left(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & (BOTTOM_ROW_MASK | LEFT_COLUMN_MASK) != 0 {
        return None;
    }
    diagonal(piece, bits >> 5, bits << 1, bits >> 4, others)
}

pub fn down_right(piece: Piece, others: u32) -> Option<Piece> {
    let bits = piece.occupancy();
    if bits & (BOTTOM_ROW_MASK | RIGHT_COLUMN_MASK) != 0 {
        return None;
    }
    diagonal(piece, bits >> 5, bits >> 1, bits >> 6, others)
}

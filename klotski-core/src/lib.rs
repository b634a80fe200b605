//! Klotski (Hua Rong Dao) board logic with bit-packed piece representation.
//!
//! # Board Layout
//!
//! The board is 4 rows by 5 columns. Ten pieces cover 18 of the 20 cells:
//!
//! ```text
//!   B B B B G        R = 2x2 square (red)
//!   R R P G _        P = vertical domino (purple)
//!   R R P G _        B = horizontal domino (blue)
//!   B B B B G        G = single cell (green)
//! ```
//!
//! The puzzle is solved when the red square covers rows 1-2, columns 3-4.
//!
//! # Occupancy Encoding (20-bit)
//!
//! ```text
//! Bits 15-19: row 0 (top)
//! Bits 10-14: row 1
//! Bits 5-9:   row 2
//! Bits 0-4:   row 3 (bottom)
//!
//! Within a row the highest bit is column 0 (left):
//!   (r,0)=bit 4  (r,1)=bit 3  (r,2)=bit 2  (r,3)=bit 1  (r,4)=bit 0
//! ```
//!
//! Moving up shifts left by 5, moving down shifts right by 5, moving left
//! shifts left by 1 and moving right shifts right by 1.
//!
//! # Piece Encoding (32-bit)
//!
//! ```text
//! Bits 0-19:  occupancy
//! Bits 20-21: color (0=Red, 1=Green, 2=Blue, 3=Purple)
//! Bits 22-31: unused (zero)
//! ```

pub mod bitmask;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of rows on the board.
pub const ROWS: usize = 4;
/// Number of columns on the board.
pub const COLS: usize = 5;
/// Number of cells on the board.
pub const CELLS: usize = ROWS * COLS;
/// Number of pieces in every layout.
pub const PIECE_COUNT: usize = 10;
/// Cells covered by pieces in every reachable layout (two stay empty).
pub const OCCUPIED_CELLS: u32 = 18;

/// All 20 cells.
pub const BOARD_MASK: u32 = (1 << CELLS) - 1;
pub const TOP_ROW_MASK: u32 = 0b11111_00000_00000_00000;
pub const BOTTOM_ROW_MASK: u32 = 0b00000_00000_00000_11111;
pub const LEFT_COLUMN_MASK: u32 = 0b10000_10000_10000_10000;
pub const RIGHT_COLUMN_MASK: u32 = 0b00001_00001_00001_00001;

/// Target region for the red square: rows 1-2, columns 3-4.
pub const SOLUTION_MASK: u32 = 0b00000_00011_00011_00000;

/// Bit for the cell at (row, col).
#[inline]
pub const fn cell_bit(row: usize, col: usize) -> u32 {
    1 << ((ROWS - 1 - row) * COLS + (COLS - 1 - col))
}

/// Build an occupancy mask from four 5-bit row masks, top row first.
#[inline]
pub const fn rows_to_mask(rows: [u8; ROWS]) -> u32 {
    ((rows[0] as u32 & 0x1F) << 15)
        | ((rows[1] as u32 & 0x1F) << 10)
        | ((rows[2] as u32 & 0x1F) << 5)
        | (rows[3] as u32 & 0x1F)
}

/// Piece class. The class fixes the shape and the combo moves it may make.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    /// The 2x2 square whose position decides the puzzle.
    Red = 0,
    /// Single cell.
    Green = 1,
    /// Horizontal domino.
    Blue = 2,
    /// Vertical domino.
    Purple = 3,
}

impl Color {
    /// Convert from the 2-bit encoding.
    #[inline]
    pub const fn from_bits(bits: u32) -> Color {
        match bits & 0b11 {
            0 => Color::Red,
            1 => Color::Green,
            2 => Color::Blue,
            _ => Color::Purple,
        }
    }

    /// Character used when printing a board.
    pub const fn symbol(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Blue => 'B',
            Color::Purple => 'P',
        }
    }

    /// Number of cells a piece of this class covers.
    pub const fn cell_count(self) -> u32 {
        match self {
            Color::Red => 4,
            Color::Green => 1,
            Color::Blue | Color::Purple => 2,
        }
    }

    /// Every pattern this class may try: the four single steps followed by
    /// its combo moves.
    pub fn patterns(self) -> &'static [Pattern] {
        match self {
            Color::Red => &SINGLE_PATTERNS,
            Color::Green => &ALL_PATTERNS,
            Color::Blue => &BLUE_PATTERNS,
            Color::Purple => &PURPLE_PATTERNS,
        }
    }

    /// Combo moves this class may make in addition to single steps.
    ///
    /// The red square gets none: with only two empty cells it never has a
    /// clear alternate path.
    pub fn combos(self) -> &'static [Pattern] {
        &self.patterns()[Pattern::SINGLES.len()..]
    }

    /// Get all classes as an iterator.
    pub fn all() -> impl Iterator<Item = Color> {
        [Color::Red, Color::Green, Color::Blue, Color::Purple].into_iter()
    }
}

/// Direction of a single one-cell slide.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Cells a piece must stay clear of to slide this way.
    #[inline]
    pub const fn edge_mask(self) -> u32 {
        match self {
            Direction::Up => TOP_ROW_MASK,
            Direction::Down => BOTTOM_ROW_MASK,
            Direction::Left => LEFT_COLUMN_MASK,
            Direction::Right => RIGHT_COLUMN_MASK,
        }
    }

    /// Translate an occupancy mask one cell in this direction.
    ///
    /// Only meaningful when the mask does not touch `edge_mask()`.
    #[inline]
    pub const fn shift(self, occupancy: u32) -> u32 {
        match self {
            Direction::Up => (occupancy << COLS) & BOARD_MASK,
            Direction::Down => occupancy >> COLS,
            Direction::Left => (occupancy << 1) & BOARD_MASK,
            Direction::Right => occupancy >> 1,
        }
    }

    /// Row and column delta.
    #[inline]
    pub const fn offset(self) -> (i8, i8) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Vertical component of a diagonal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Vertical {
    Up,
    Down,
}

impl Vertical {
    #[inline]
    pub const fn direction(self) -> Direction {
        match self {
            Vertical::Up => Direction::Up,
            Vertical::Down => Direction::Down,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Vertical {
        match self {
            Vertical::Up => Vertical::Down,
            Vertical::Down => Vertical::Up,
        }
    }
}

/// Horizontal component of a diagonal.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Horizontal {
    Left,
    Right,
}

impl Horizontal {
    #[inline]
    pub const fn direction(self) -> Direction {
        match self {
            Horizontal::Left => Direction::Left,
            Horizontal::Right => Direction::Right,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Horizontal {
        match self {
            Horizontal::Left => Horizontal::Right,
            Horizontal::Right => Horizontal::Left,
        }
    }
}

/// One search-graph edge: how a single piece relocates.
///
/// Double steps and diagonals are combo moves. They count as one move even
/// though the piece passes through an intermediate cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Pattern {
    /// One cell in a direction.
    Single(Direction),
    /// Two cells in the same direction. Both cells on the way must be clear.
    Double(Direction),
    /// One cell vertically and one horizontally, along either L-shaped path.
    Diagonal { vertical: Vertical, horizontal: Horizontal },
}

use Direction::{Down, Left, Right, Up};

/// The four one-cell slides.
static SINGLE_PATTERNS: [Pattern; 4] = Pattern::SINGLES;
static BLUE_PATTERNS: [Pattern; 6] = [
    Pattern::Single(Up),
    Pattern::Single(Down),
    Pattern::Single(Left),
    Pattern::Single(Right),
    Pattern::Double(Left),
    Pattern::Double(Right),
];
static PURPLE_PATTERNS: [Pattern; 6] = [
    Pattern::Single(Up),
    Pattern::Single(Down),
    Pattern::Single(Left),
    Pattern::Single(Right),
    Pattern::Double(Up),
    Pattern::Double(Down),
];
/// Every pattern: single steps, then every combo.
static ALL_PATTERNS: [Pattern; 12] = [
    Pattern::Single(Up),
    Pattern::Single(Down),
    Pattern::Single(Left),
    Pattern::Single(Right),
    Pattern::Double(Up),
    Pattern::Double(Down),
    Pattern::Double(Left),
    Pattern::Double(Right),
    Pattern::Diagonal { vertical: Vertical::Up, horizontal: Horizontal::Left },
    Pattern::Diagonal { vertical: Vertical::Up, horizontal: Horizontal::Right },
    Pattern::Diagonal { vertical: Vertical::Down, horizontal: Horizontal::Left },
    Pattern::Diagonal { vertical: Vertical::Down, horizontal: Horizontal::Right },
];

impl Pattern {
    /// The four one-cell slides.
    pub const SINGLES: [Pattern; 4] = [
        Pattern::Single(Up),
        Pattern::Single(Down),
        Pattern::Single(Left),
        Pattern::Single(Right),
    ];

    /// Every combo pattern, regardless of piece class.
    pub const COMBOS: [Pattern; 8] = [
        Pattern::Double(Up),
        Pattern::Double(Down),
        Pattern::Double(Left),
        Pattern::Double(Right),
        Pattern::Diagonal { vertical: Vertical::Up, horizontal: Horizontal::Left },
        Pattern::Diagonal { vertical: Vertical::Up, horizontal: Horizontal::Right },
        Pattern::Diagonal { vertical: Vertical::Down, horizontal: Horizontal::Left },
        Pattern::Diagonal { vertical: Vertical::Down, horizontal: Horizontal::Right },
    ];

    /// The direction pair this pattern is composed of.
    ///
    /// A single step has no second direction. A diagonal lists its vertical
    /// component first, but either order may be taken.
    #[inline]
    pub const fn steps(self) -> (Direction, Option<Direction>) {
        match self {
            Pattern::Single(dir) => (dir, None),
            Pattern::Double(dir) => (dir, Some(dir)),
            Pattern::Diagonal { vertical, horizontal } => {
                (vertical.direction(), Some(horizontal.direction()))
            }
        }
    }

    #[inline]
    pub const fn is_combo(self) -> bool {
        !matches!(self, Pattern::Single(_))
    }

    /// Row and column delta of the whole move.
    pub const fn offset(self) -> (i8, i8) {
        match self.steps() {
            (first, None) => first.offset(),
            (first, Some(second)) => {
                let (r1, c1) = first.offset();
                let (r2, c2) = second.offset();
                (r1 + r2, c1 + c2)
            }
        }
    }

    /// Pattern with the given row and column delta, if one exists.
    pub fn from_offset(drow: i8, dcol: i8) -> Option<Pattern> {
        let vertical = match drow.signum() {
            -1 => Some(Vertical::Up),
            1 => Some(Vertical::Down),
            _ => None,
        };
        let horizontal = match dcol.signum() {
            -1 => Some(Horizontal::Left),
            1 => Some(Horizontal::Right),
            _ => None,
        };
        match (drow.abs(), dcol.abs(), vertical, horizontal) {
            (1, 0, Some(v), None) => Some(Pattern::Single(v.direction())),
            (0, 1, None, Some(h)) => Some(Pattern::Single(h.direction())),
            (2, 0, Some(v), None) => Some(Pattern::Double(v.direction())),
            (0, 2, None, Some(h)) => Some(Pattern::Double(h.direction())),
            (1, 1, Some(vertical), Some(horizontal)) => {
                Some(Pattern::Diagonal { vertical, horizontal })
            }
            _ => None,
        }
    }

    /// The pattern that moves a piece back to where it came from.
    pub const fn reverse(self) -> Pattern {
        match self {
            Pattern::Single(dir) => Pattern::Single(dir.opposite()),
            Pattern::Double(dir) => Pattern::Double(dir.opposite()),
            Pattern::Diagonal { vertical, horizontal } => Pattern::Diagonal {
                vertical: vertical.opposite(),
                horizontal: horizontal.opposite(),
            },
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Single(dir) => write!(f, "{}", dir.name()),
            Pattern::Double(dir) => write!(f, "{} x2", dir.name()),
            Pattern::Diagonal { vertical, horizontal } => {
                write!(f, "{}-{}", vertical.direction().name(), horizontal.direction().name())
            }
        }
    }
}

/// Which legality mechanism evaluates combo moves.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
pub enum Mechanism {
    /// Combo moves are direction pairs composed from single-step checks,
    /// restricted per class by `Color::combos()`.
    #[default]
    Composed,
    /// Combo moves are hard-coded combined-mask checks, offered to every
    /// piece. See [`bitmask`].
    Bitmask,
}

/// Move rules for a search: the legality mechanism and whether combo moves
/// are allowed at all.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Rules {
    pub mechanism: Mechanism,
    pub combos: bool,
}

impl Rules {
    pub const fn new(mechanism: Mechanism) -> Rules {
        Rules { mechanism, combos: true }
    }

    /// Only the four one-cell slides.
    pub const fn single_steps(mechanism: Mechanism) -> Rules {
        Rules { mechanism, combos: false }
    }

    /// Patterns to try for a piece of the given class, single steps first.
    pub fn patterns(&self, color: Color) -> &'static [Pattern] {
        match (self.combos, self.mechanism) {
            (false, _) => &SINGLE_PATTERNS,
            (true, Mechanism::Composed) => color.patterns(),
            (true, Mechanism::Bitmask) => &ALL_PATTERNS,
        }
    }

    /// Apply a pattern to a piece against the occupancy of all other pieces.
    #[inline]
    pub fn apply(&self, piece: Piece, pattern: Pattern, others: u32) -> Option<Piece> {
        match self.mechanism {
            Mechanism::Composed => piece.apply(pattern, others),
            Mechanism::Bitmask => bitmask::apply(piece, pattern, others),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::new(Mechanism::Composed)
    }
}

/// One piece: class plus occupied cells, packed in a u32.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Piece(pub u32);

impl Piece {
    const COLOR_SHIFT: u32 = 20;

    /// Create a piece from its class and four row masks, top row first.
    /// Each row mask uses bit 4 for column 0.
    #[inline]
    pub const fn new(color: Color, rows: [u8; ROWS]) -> Piece {
        Piece::from_parts(color, rows_to_mask(rows))
    }

    #[inline]
    pub const fn from_parts(color: Color, occupancy: u32) -> Piece {
        Piece(((color as u32) << Self::COLOR_SHIFT) | (occupancy & BOARD_MASK))
    }

    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn color(self) -> Color {
        Color::from_bits(self.0 >> Self::COLOR_SHIFT)
    }

    #[inline]
    pub const fn occupancy(self) -> u32 {
        self.0 & BOARD_MASK
    }

    /// The 5-bit mask for a row (0 = top).
    #[inline]
    pub const fn row(self, row: usize) -> u8 {
        ((self.occupancy() >> ((ROWS - 1 - row) * COLS)) & 0x1F) as u8
    }

    #[inline]
    pub const fn cell_count(self) -> u32 {
        self.occupancy().count_ones()
    }

    #[inline]
    pub const fn covers(self, row: usize, col: usize) -> bool {
        self.occupancy() & cell_bit(row, col) != 0
    }

    /// Same class, different cells.
    #[inline]
    pub const fn with_occupancy(self, occupancy: u32) -> Piece {
        Piece::from_parts(self.color(), occupancy)
    }

    /// Top-left corner of the piece's bounding box.
    pub fn anchor(self) -> Option<(usize, usize)> {
        let occupancy = self.occupancy();
        if occupancy == 0 {
            return None;
        }
        let row = (0..ROWS).find(|&r| self.row(r) != 0)?;
        let col = (0..COLS).find(|&c| (0..ROWS).any(|r| self.covers(r, c)))?;
        Some((row, col))
    }

    /// Slide one cell. Returns None at the edge or on collision.
    #[inline]
    pub const fn step(self, dir: Direction, others: u32) -> Option<Piece> {
        let occupancy = self.occupancy();
        if occupancy & dir.edge_mask() != 0 {
            return None;
        }
        let moved = dir.shift(occupancy);
        if moved & others != 0 {
            return None;
        }
        Some(self.with_occupancy(moved))
    }

    /// Two single steps in sequence, `first` then `second`.
    #[inline]
    pub fn step_twice(self, first: Direction, second: Direction, others: u32) -> Option<Piece> {
        self.step(first, others)?.step(second, others)
    }

    /// Compose a direction pair from single steps.
    ///
    /// The move is legal if either ordering of the pair is clear. For a
    /// double step both orderings are the same path.
    pub fn compose(self, first: Direction, second: Direction, others: u32) -> Option<Piece> {
        self.step_twice(first, second, others)
            .or_else(|| self.step_twice(second, first, others))
    }

    /// Apply a pattern using direction-pair composition.
    ///
    /// Class restrictions are not checked here; see `Rules::patterns`.
    pub fn apply(self, pattern: Pattern, others: u32) -> Option<Piece> {
        match pattern.steps() {
            (dir, None) => self.step(dir, others),
            (first, Some(second)) => self.compose(first, second, others),
        }
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Piece({:?} {:05b}/{:05b}/{:05b}/{:05b})",
            self.color(),
            self.row(0),
            self.row(1),
            self.row(2),
            self.row(3)
        )
    }
}

/// A move: which piece and which pattern.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Step {
    pub piece: usize,
    pub pattern: Pattern,
}

/// How the search identifies nodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Serialize, Deserialize)]
pub enum Identity {
    /// Every piece keeps its index; two layouts that differ only by swapping
    /// two same-class pieces are distinct.
    #[default]
    Labelled,
    /// Same-class pieces are interchangeable. Nodes are keyed by
    /// `Board::canonical()`.
    Interchangeable,
}

impl Identity {
    /// Key used for deduplication.
    #[inline]
    pub fn key(self, board: &Board) -> Board {
        match self {
            Identity::Labelled => *board,
            Identity::Interchangeable => board.canonical(),
        }
    }
}

/// The classic starting layout.
const INITIAL_PIECES: [Piece; PIECE_COUNT] = [
    Piece::new(Color::Blue, [0b11000, 0b00000, 0b00000, 0b00000]),
    Piece::new(Color::Blue, [0b00110, 0b00000, 0b00000, 0b00000]),
    Piece::new(Color::Green, [0b00001, 0b00000, 0b00000, 0b00000]),
    Piece::new(Color::Red, [0b00000, 0b11000, 0b11000, 0b00000]),
    Piece::new(Color::Purple, [0b00000, 0b00100, 0b00100, 0b00000]),
    Piece::new(Color::Green, [0b00000, 0b00010, 0b00000, 0b00000]),
    Piece::new(Color::Green, [0b00000, 0b00000, 0b00010, 0b00000]),
    Piece::new(Color::Blue, [0b00000, 0b00000, 0b00000, 0b11000]),
    Piece::new(Color::Blue, [0b00000, 0b00000, 0b00000, 0b00110]),
    Piece::new(Color::Green, [0b00000, 0b00000, 0b00000, 0b00001]),
];

/// Complete layout: ten pieces in a fixed order.
///
/// The order is a labelling ("piece #i"), not a geometric property. Boards
/// are values; moves produce a new board.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Board {
    pieces: [Piece; PIECE_COUNT],
}

impl Board {
    /// Index of the red square in the classic layout.
    pub const RED_INDEX: usize = 3;

    /// The classic starting layout.
    #[inline]
    pub const fn new() -> Board {
        Board { pieces: INITIAL_PIECES }
    }

    #[inline]
    pub const fn from_pieces(pieces: [Piece; PIECE_COUNT]) -> Board {
        Board { pieces }
    }

    #[inline]
    pub fn pieces(&self) -> &[Piece; PIECE_COUNT] {
        &self.pieces
    }

    #[inline]
    pub fn piece(&self, index: usize) -> Piece {
        self.pieces[index]
    }

    /// Union of every piece's cells.
    #[inline]
    pub fn occupancy(&self) -> u32 {
        self.pieces.iter().fold(0, |acc, p| acc | p.occupancy())
    }

    /// Union of every piece's cells except the one at `index`.
    #[inline]
    pub fn others(&self, index: usize) -> u32 {
        self.pieces
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .fold(0, |acc, (_, p)| acc | p.occupancy())
    }

    /// Cells no piece covers.
    #[inline]
    pub fn empty_cells(&self) -> u32 {
        !self.occupancy() & BOARD_MASK
    }

    /// Same board with one piece replaced.
    #[inline]
    pub fn with_piece(&self, index: usize, piece: Piece) -> Board {
        let mut next = *self;
        next.pieces[index] = piece;
        next
    }

    /// Check that no pieces overlap, every piece keeps its class's size and
    /// exactly 18 cells are covered.
    pub fn is_valid(&self) -> bool {
        let mut seen = 0u32;
        for piece in &self.pieces {
            let occupancy = piece.occupancy();
            if occupancy & seen != 0 || piece.cell_count() != piece.color().cell_count() {
                return false;
            }
            seen |= occupancy;
        }
        seen.count_ones() == OCCUPIED_CELLS
    }

    /// Piece covering a cell, if any.
    pub fn piece_at(&self, row: usize, col: usize) -> Option<(usize, Piece)> {
        self.pieces
            .iter()
            .copied()
            .enumerate()
            .find(|(_, p)| p.covers(row, col))
    }

    /// Apply a move, or None if it is not legal here.
    #[inline]
    pub fn apply(&self, step: Step, rules: &Rules) -> Option<Board> {
        let piece = self.pieces[step.piece];
        let moved = rules.apply(piece, step.pattern, self.others(step.piece))?;
        Some(self.with_piece(step.piece, moved))
    }

    /// Generate all legal moves.
    pub fn legal_moves(&self, rules: &Rules) -> Vec<Step> {
        self.successors(rules).into_iter().map(|(step, _)| step).collect()
    }

    /// Generate all legal moves together with the board each one produces.
    pub fn successors(&self, rules: &Rules) -> Vec<(Step, Board)> {
        let all = self.occupancy();
        let mut out = Vec::new();
        for (index, &piece) in self.pieces.iter().enumerate() {
            let others = all & !piece.occupancy();
            for &pattern in rules.patterns(piece.color()) {
                if let Some(moved) = rules.apply(piece, pattern, others) {
                    out.push((Step { piece: index, pattern }, self.with_piece(index, moved)));
                }
            }
        }
        out
    }

    /// The move that turns this board into `next`, if they differ by exactly
    /// one piece's translation.
    pub fn step_to(&self, next: &Board) -> Option<Step> {
        let mut changed = self
            .pieces
            .iter()
            .zip(next.pieces.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b);
        let (index, (before, after)) = changed.next()?;
        if changed.next().is_some() || before.color() != after.color() {
            return None;
        }
        let (r0, c0) = before.anchor()?;
        let (r1, c1) = after.anchor()?;
        let pattern = Pattern::from_offset(r1 as i8 - r0 as i8, c1 as i8 - c0 as i8)?;
        Some(Step { piece: index, pattern })
    }

    /// Same layout with same-class pieces sorted by occupancy.
    ///
    /// Each index keeps its class, so two boards share a canonical form iff
    /// they differ only by relabelling interchangeable pieces.
    pub fn canonical(&self) -> Board {
        let mut canonical = *self;
        for color in Color::all() {
            let slots: Vec<usize> = (0..PIECE_COUNT)
                .filter(|&i| self.pieces[i].color() == color)
                .collect();
            let mut group: Vec<Piece> = slots.iter().map(|&i| self.pieces[i]).collect();
            group.sort_unstable();
            for (&slot, piece) in slots.iter().zip(group) {
                canonical.pieces[slot] = piece;
            }
        }
        canonical
    }

    /// Board rendered as text rows, one character per cell.
    pub fn rows(&self) -> Vec<String> {
        (0..ROWS)
            .map(|row| {
                (0..COLS)
                    .map(|col| {
                        self.piece_at(row, col)
                            .map(|(_, p)| p.color().symbol())
                            .unwrap_or('_')
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rows().join("\n"))
    }
}

/// Fixed puzzle instance: where to start and what counts as solved.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Puzzle {
    pub start: Board,
    /// Index of the piece whose position decides the puzzle.
    pub goal_piece: usize,
    /// Exact occupancy the goal piece must have.
    pub target: u32,
}

impl Puzzle {
    pub const fn new(start: Board, goal_piece: usize, target: u32) -> Puzzle {
        Puzzle { start, goal_piece, target }
    }

    /// The classic layout with the red square moving to the right edge.
    pub const fn classic() -> Puzzle {
        Puzzle::new(Board::new(), Board::RED_INDEX, SOLUTION_MASK)
    }

    /// Same goal, different starting layout.
    pub const fn with_start(self, start: Board) -> Puzzle {
        Puzzle { start, ..self }
    }

    /// Check that the goal piece exists and the start layout is legal.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        if self.goal_piece >= PIECE_COUNT {
            return Err(PuzzleError::GoalPieceOutOfRange(self.goal_piece));
        }
        if !self.start.is_valid() {
            return Err(PuzzleError::InvalidStart(self.start));
        }
        Ok(())
    }

    /// Exact equality: overlapping the target is not enough.
    ///
    /// Never true when the goal piece index is out of range.
    #[inline]
    pub fn is_solved(&self, board: &Board) -> bool {
        board
            .pieces()
            .get(self.goal_piece)
            .is_some_and(|p| p.occupancy() == self.target)
    }
}

/// A puzzle that cannot be searched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PuzzleError {
    /// The goal piece index is not below `PIECE_COUNT`.
    GoalPieceOutOfRange(usize),
    /// The start layout has overlapping or misshapen pieces.
    InvalidStart(Board),
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::GoalPieceOutOfRange(index) => {
                write!(f, "goal piece {} out of range (board has {} pieces)", index, PIECE_COUNT)
            }
            PuzzleError::InvalidStart(board) => write!(f, "invalid start layout:\n{}", board),
        }
    }
}

impl std::error::Error for PuzzleError {}

impl Default for Puzzle {
    fn default() -> Self {
        Self::classic()
    }
}

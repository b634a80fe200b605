//! Path reconstruction from the predecessor map.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::hash::BuildHasher;

use klotski_core::{Board, Identity, Step};

/// The predecessor map is inconsistent with the board it was asked about.
///
/// Either case is a defect in the search, not a user-facing condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A board on the chain was never recorded.
    Missing(Board),
    /// The chain is longer than the map, so it loops.
    Cycle { length: usize },
    /// Two consecutive boards are not one move apart.
    Disconnected { index: usize },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Missing(board) => {
                write!(f, "board missing from predecessor map:\n{}", board)
            }
            PathError::Cycle { length } => {
                write!(f, "predecessor chain loops after {} boards", length)
            }
            PathError::Disconnected { index } => {
                write!(f, "boards {} and {} are not one move apart", index, index + 1)
            }
        }
    }
}

impl Error for PathError {}

/// Walk predecessors from `solved` back to the start.
///
/// Returns the boards in forward order, start first and `solved` last.
/// Map keys are `identity.key(board)`; values are the actual boards
/// expanded.
pub fn reconstruct<S: BuildHasher>(
    solved: Board,
    predecessors: &HashMap<Board, Option<Board>, S>,
    identity: Identity,
) -> Result<Vec<Board>, PathError> {
    let mut path = vec![solved];
    let mut current = solved;

    loop {
        match predecessors.get(&identity.key(&current)) {
            None => return Err(PathError::Missing(current)),
            Some(None) => break,
            Some(Some(prev)) => {
                if path.len() > predecessors.len() {
                    return Err(PathError::Cycle { length: path.len() });
                }
                path.push(*prev);
                current = *prev;
            }
        }
    }

    path.reverse();
    Ok(path)
}

/// Moves between consecutive boards of a path.
pub fn steps(path: &[Board]) -> Result<Vec<Step>, PathError> {
    path.windows(2)
        .enumerate()
        .map(|(index, pair)| {
            pair[0]
                .step_to(&pair[1])
                .ok_or(PathError::Disconnected { index })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use klotski_core::Rules;

    fn chain(len: usize) -> Vec<Board> {
        // Follow the first legal move that leads somewhere new.
        let rules = Rules::default();
        let mut boards = vec![Board::new()];
        while boards.len() < len {
            let last = *boards.last().unwrap();
            let next = last
                .successors(&rules)
                .into_iter()
                .map(|(_, b)| b)
                .find(|b| !boards.contains(b))
                .unwrap();
            boards.push(next);
        }
        boards
    }

    fn map_for(boards: &[Board]) -> HashMap<Board, Option<Board>> {
        let mut map = HashMap::new();
        map.insert(boards[0], None);
        for pair in boards.windows(2) {
            map.insert(pair[1], Some(pair[0]));
        }
        map
    }

    #[test]
    fn test_reconstruct_forward_order() {
        let boards = chain(6);
        let map = map_for(&boards);
        let path = reconstruct(boards[5], &map, Identity::Labelled).unwrap();
        assert_eq!(path, boards);
    }

    #[test]
    fn test_reconstruct_start_only() {
        let start = Board::new();
        let mut map = HashMap::new();
        map.insert(start, None);
        assert_eq!(reconstruct(start, &map, Identity::Labelled), Ok(vec![start]));
    }

    #[test]
    fn test_reconstruct_missing_board() {
        let boards = chain(3);
        let map = map_for(&boards[..2]);
        assert_eq!(
            reconstruct(boards[2], &map, Identity::Labelled),
            Err(PathError::Missing(boards[2]))
        );
    }

    #[test]
    fn test_reconstruct_detects_cycle() {
        let boards = chain(3);
        let mut map = HashMap::new();
        map.insert(boards[0], Some(boards[2]));
        map.insert(boards[1], Some(boards[0]));
        map.insert(boards[2], Some(boards[1]));
        assert!(matches!(
            reconstruct(boards[2], &map, Identity::Labelled),
            Err(PathError::Cycle { .. })
        ));
    }

    #[test]
    fn test_steps_between_boards() {
        let boards = chain(5);
        let steps = steps(&boards).unwrap();
        assert_eq!(steps.len(), 4);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(boards[i].apply(*step, &Rules::default()), Some(boards[i + 1]));
        }
    }

    #[test]
    fn test_steps_disconnected() {
        let boards = chain(3);
        let skipped = [boards[0], boards[0]];
        assert_eq!(steps(&skipped), Err(PathError::Disconnected { index: 0 }));
    }
}

//! Board bounds and grid movement primitives

use serde::{Deserialize, Serialize};

/// A grid coordinate. Row 0 is the top edge, so NORTH decreases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Robot facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// 90° counter-clockwise: NORTH → WEST → SOUTH → EAST → NORTH
    pub fn left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    /// 90° clockwise
    pub fn right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// 180° turn
    pub fn reverse(self) -> Self {
        self.left().left()
    }

    /// Unit step along this direction
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}

/// Static rectangular board. Only boundary semantics live here; tiles,
/// conveyors, and lasers are handled by separate resolution passes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self { width, height }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Take a single step from `pos` towards `dir`, clamped to the board.
    /// A robot pressing against the edge simply stays put, no wrap.
    pub fn step(&self, pos: Position, dir: Direction) -> Position {
        let (dx, dy) = dir.delta();
        Position {
            x: (pos.x + dx).clamp(0, self.width - 1),
            y: (pos.y + dy).clamp(0, self.height - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_four_times_is_identity() {
        for dir in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ] {
            assert_eq!(dir.left().left().left().left(), dir);
        }
    }

    #[test]
    fn right_is_inverse_of_left() {
        for dir in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ] {
            assert_eq!(dir.left().right(), dir);
        }
    }

    #[test]
    fn reverse_twice_is_identity() {
        for dir in [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ] {
            assert_eq!(dir.reverse().reverse(), dir);
        }
    }

    #[test]
    fn step_clamps_at_every_edge() {
        let board = Board::new(4, 3);
        assert_eq!(
            board.step(Position::new(0, 0), Direction::North),
            Position::new(0, 0)
        );
        assert_eq!(
            board.step(Position::new(0, 0), Direction::West),
            Position::new(0, 0)
        );
        assert_eq!(
            board.step(Position::new(3, 2), Direction::South),
            Position::new(3, 2)
        );
        assert_eq!(
            board.step(Position::new(3, 2), Direction::East),
            Position::new(3, 2)
        );
    }

    #[test]
    fn step_moves_inside_bounds() {
        let board = Board::new(4, 3);
        assert_eq!(
            board.step(Position::new(1, 1), Direction::East),
            Position::new(2, 1)
        );
        assert_eq!(
            board.step(Position::new(1, 1), Direction::North),
            Position::new(1, 0)
        );
    }
}

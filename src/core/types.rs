//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Interned action identifier
///
/// Identifiers are handed out sequentially by the [`StringInterner`] and are
/// never renumbered, so hot-path dispatch compares integers instead of names.
///
/// [`StringInterner`]: crate::core::interner::StringInterner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl ActionId {
    /// Sentinel returned when there is nothing to do (empty genome)
    pub const NONE: ActionId = ActionId(u32::MAX);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Index of a slot in the simulator's cell pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub usize);

/// Simulation tick counter
pub type Tick = u64;

/// Facing of a cell on the grid
///
/// North is negative Y, South is positive Y, matching row-major screen layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    North,
    East,
    South,
    West,
    None,
}

impl Direction {
    /// Rotate 90 degrees clockwise. `None` stays `None`.
    pub fn turn_right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            Direction::None => Direction::None,
        }
    }

    /// Rotate 90 degrees counter-clockwise. `None` stays `None`.
    pub fn turn_left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
            Direction::None => Direction::None,
        }
    }

    /// Unit step for this facing
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::None => (0, 0),
        }
    }

    /// Coordinates of the tile in front of (x, y). May be out of bounds.
    pub fn forward_of(self, x: i32, y: i32) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }
}

/// RGBA display attribute attached to interned identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const GRAY: Color = Color::rgb(130, 130, 130);
    pub const GREEN: Color = Color::rgb(0, 228, 48);
    pub const BLUE: Color = Color::rgb(0, 121, 241);
    pub const RED: Color = Color::rgb(230, 41, 55);
    pub const YELLOW: Color = Color::rgb(253, 249, 0);
    pub const ORANGE: Color = Color::rgb(255, 161, 0);
    pub const PURPLE: Color = Color::rgb(200, 122, 255);
}

impl Default for Color {
    fn default() -> Self {
        Color::GRAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_right_cycle() {
        let mut d = Direction::North;
        let mut seen = Vec::new();
        for _ in 0..4 {
            d = d.turn_right();
            seen.push(d);
        }
        assert_eq!(
            seen,
            vec![Direction::East, Direction::South, Direction::West, Direction::North]
        );
    }

    #[test]
    fn test_turn_left_is_inverse_of_right() {
        for d in [Direction::North, Direction::East, Direction::South, Direction::West] {
            assert_eq!(d.turn_right().turn_left(), d);
            assert_eq!(d.turn_left().turn_right(), d);
        }
    }

    #[test]
    fn test_none_is_fixed_point() {
        assert_eq!(Direction::None.turn_left(), Direction::None);
        assert_eq!(Direction::None.turn_right(), Direction::None);
        assert_eq!(Direction::None.forward_of(3, 4), (3, 4));
    }

    #[test]
    fn test_forward_of() {
        assert_eq!(Direction::North.forward_of(2, 2), (2, 1));
        assert_eq!(Direction::East.forward_of(2, 2), (3, 2));
        assert_eq!(Direction::South.forward_of(2, 2), (2, 3));
        assert_eq!(Direction::West.forward_of(0, 0), (-1, 0));
    }

    #[test]
    fn test_action_id_sentinel() {
        assert!(ActionId::NONE.is_none());
        assert!(!ActionId(0).is_none());
    }
}

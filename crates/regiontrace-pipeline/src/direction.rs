//! Headings for the wall-follow walk.
//!
//! Directions are named by their step vector in image coordinates with
//! the walk's own convention: `Up` steps `+y`. Rotations are table
//! lookups rather than vector arithmetic on raw tuples.

use serde::{Deserialize, Serialize};

/// One of the four axis-aligned headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Step `(0, 1)`.
    Up,
    /// Step `(1, 0)`.
    Right,
    /// Step `(0, -1)`.
    Down,
    /// Step `(-1, 0)`.
    Left,
}

impl Direction {
    /// All four headings in clockwise order starting at `Up`.
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// The `(dx, dy)` step for this heading.
    #[must_use]
    pub const fn step(self) -> (i64, i64) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 0),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
        }
    }

    /// Quarter turn mapping `(dx, dy)` to `(dy, -dx)`.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// Quarter turn mapping `(dx, dy)` to `(-dy, dx)`.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Right => Self::Up,
            Self::Down => Self::Right,
            Self::Left => Self::Down,
        }
    }

    /// Offset from a pixel's index to the lattice corner recorded for a
    /// walk step taken with this heading.
    ///
    /// Pixel `(x, y)` covers the unit square `[x, x+1] x [y, y+1]`; the
    /// walk keeps the outside on the heading side, and each step records
    /// the corner of that side which the outline passes through.
    #[must_use]
    pub const fn corner_offset(self) -> (i64, i64) {
        match self {
            Self::Up => (0, 1),
            Self::Right => (1, 1),
            Self::Down => (1, 0),
            Self::Left => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clockwise_matches_vector_rotation() {
        for d in Direction::ALL {
            let (dx, dy) = d.step();
            assert_eq!(d.clockwise().step(), (dy, -dx), "{d:?}");
        }
    }

    #[test]
    fn counter_clockwise_matches_vector_rotation() {
        for d in Direction::ALL {
            let (dx, dy) = d.step();
            assert_eq!(d.counter_clockwise().step(), (-dy, dx), "{d:?}");
        }
    }

    #[test]
    fn rotations_are_inverse() {
        for d in Direction::ALL {
            assert_eq!(d.clockwise().counter_clockwise(), d);
            assert_eq!(d.clockwise().clockwise().clockwise().clockwise(), d);
        }
    }

    #[test]
    fn corner_offsets() {
        assert_eq!(Direction::Up.corner_offset(), (0, 1));
        assert_eq!(Direction::Right.corner_offset(), (1, 1));
        assert_eq!(Direction::Down.corner_offset(), (1, 0));
        assert_eq!(Direction::Left.corner_offset(), (0, 0));
    }
}

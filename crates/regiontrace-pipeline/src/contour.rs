//! Contour tracing: turn a region's boundary pixels into a closed polygon.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use at runtime.
//!
//! # Wall following
//!
//! The only algorithm today walks the boundary like a turtle with one
//! hand on the outside wall. The walk state is a heading plus a pixel.
//! The heading points at the outside of the region; the walk advances
//! along the heading rotated clockwise. At each step it prefers, in order:
//!
//! 1. turning around an outer corner: the cell one step forward and one
//!    step toward the outside, taking the counter-clockwise heading;
//! 2. going straight: the cell one step forward, keeping the heading;
//! 3. turning at an inner corner in place: heading rotates clockwise.
//!
//! The walk ends when it would re-enter its initial state. Revisiting a
//! pixel with a different heading is expected at concave corners.
//!
//! Each visited state is converted to a lattice corner (see
//! [`Direction::corner_offset`]) so the polygon runs along pixel edges
//! rather than through pixel centers, then collinear vertices are dropped
//! and the result is mirrored into Cartesian coordinates.

use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryPixelSet;
use crate::direction::Direction;
use crate::types::{Coordinate, Polygon};

/// Selects which contour tracing algorithm to use.
///
/// Ships with [`WallFollow`](Self::WallFollow) only. Additional variants
/// can be added without changing the `PipelineConfig` struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Right-hand wall following over the boundary pixel set.
    #[default]
    WallFollow,
}

/// Per-call tracing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceOptions {
    /// Grid height, used to mirror the outline into Cartesian space.
    pub height: u32,
    /// Step budget; `None` means [`state_space_bound`].
    pub max_steps: Option<usize>,
}

/// Why a boundary could not be traced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    /// There is nothing to walk.
    #[error("boundary pixel set is empty")]
    EmptyBoundary,

    /// The walk used up its step budget without returning to its start.
    #[error("walk from {start} did not return within {steps} steps")]
    NonTerminating {
        /// Start pixel of the walk.
        start: Coordinate,
        /// Steps taken.
        steps: usize,
    },
}

/// Trait for contour tracing strategies.
///
/// Input: the boundary pixels of one region (image space).
/// Output: one closed polygon in Cartesian space (origin bottom-left).
pub trait ContourTracer {
    /// Trace the outline of the region whose boundary is `boundary`.
    ///
    /// # Errors
    ///
    /// Returns a [`TraceError`] if the boundary is empty or the walk
    /// exceeds its step budget.
    fn trace(
        &self,
        boundary: &BoundaryPixelSet,
        options: &TraceOptions,
    ) -> Result<Polygon, TraceError>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(
        &self,
        boundary: &BoundaryPixelSet,
        options: &TraceOptions,
    ) -> Result<Polygon, TraceError> {
        match *self {
            Self::WallFollow => trace_wall_follow(boundary, options),
        }
    }
}

/// One state of the wall-follow walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalkState {
    /// Points from the current pixel toward the outside of the region.
    pub heading: Direction,
    /// Current pixel (image space).
    pub position: Coordinate,
}

impl WalkState {
    /// The lattice corner this state contributes to the outline.
    #[must_use]
    pub const fn corner(self) -> Coordinate {
        let (dx, dy) = self.heading.corner_offset();
        self.position.offset(dx, dy)
    }
}

/// Number of distinct walk states over `boundary_len` pixels, plus one
/// full turn of slack.
///
/// The walk is deterministic, so if it has not come back after visiting
/// this many states it never will.
#[must_use]
pub const fn state_space_bound(boundary_len: usize) -> usize {
    boundary_len.saturating_mul(4).saturating_add(4)
}

/// Advance the walk by one step.
#[must_use]
pub fn next_state(boundary: &BoundaryPixelSet, state: WalkState) -> WalkState {
    let forward = state.heading.clockwise();
    let (fx, fy) = forward.step();
    let (ox, oy) = state.heading.step();

    let ahead = state.position.offset(fx, fy);
    let around = ahead.offset(ox, oy);

    if boundary.contains(around) {
        WalkState {
            heading: state.heading.counter_clockwise(),
            position: around,
        }
    } else if boundary.contains(ahead) {
        WalkState {
            heading: state.heading,
            position: ahead,
        }
    } else {
        WalkState {
            heading: forward,
            position: state.position,
        }
    }
}

/// Walk the boundary from its bottom-most pixel heading `Up` until the
/// next state would be the initial one.
///
/// The returned states start with the initial state; every state is
/// distinct.
///
/// # Errors
///
/// Returns [`TraceError::EmptyBoundary`] for an empty set and
/// [`TraceError::NonTerminating`] once `max_steps` steps (default
/// [`state_space_bound`]) have been taken without closing the loop.
pub fn walk(
    boundary: &BoundaryPixelSet,
    max_steps: Option<usize>,
) -> Result<Vec<WalkState>, TraceError> {
    let start_pixel = boundary.start_pixel().ok_or(TraceError::EmptyBoundary)?;
    let start = WalkState {
        heading: Direction::Up,
        position: start_pixel,
    };
    let budget = max_steps.unwrap_or_else(|| state_space_bound(boundary.len()));

    let mut states = vec![start];
    let mut current = start;
    loop {
        let next = next_state(boundary, current);
        if next == start {
            return Ok(states);
        }
        if states.len() >= budget {
            return Err(TraceError::NonTerminating {
                start: start_pixel,
                steps: states.len(),
            });
        }
        states.push(next);
        current = next;
    }
}

/// Drop repeated vertices and vertices in the middle of a straight run.
///
/// The input is treated as a closed ring. A vertex where the outline
/// doubles back on itself is kept.
#[must_use]
pub fn remove_collinear(mut vertices: Vec<Coordinate>) -> Vec<Coordinate> {
    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    let n = vertices.len();
    if n < 3 {
        return vertices;
    }

    (0..n)
        .filter(|&i| {
            let prev = vertices[(i + n - 1) % n];
            let here = vertices[i];
            let next = vertices[(i + 1) % n];
            !passes_straight_through(prev, here, next)
        })
        .map(|i| vertices[i])
        .collect()
}

fn passes_straight_through(prev: Coordinate, here: Coordinate, next: Coordinate) -> bool {
    let (ax, ay) = (here.x - prev.x, here.y - prev.y);
    let (bx, by) = (next.x - here.x, next.y - here.y);
    ax * by - ay * bx == 0 && ax * bx + ay * by > 0
}

/// Right-hand wall following.
fn trace_wall_follow(
    boundary: &BoundaryPixelSet,
    options: &TraceOptions,
) -> Result<Polygon, TraceError> {
    let states = walk(boundary, options.max_steps)?;
    let corners = states.iter().map(|s| s.corner()).collect();
    Ok(Polygon::new(remove_collinear(corners)).flip_y(options.height))
}

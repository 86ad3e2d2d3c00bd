//! Boundary extraction: the pixels of a region that touch the outside.

use std::collections::BTreeSet;

use crate::segment::Region;
use crate::types::Coordinate;

/// The pixels of one region with at least one 4-connected neighbor that
/// is not part of that region.
///
/// A neighbor beyond the edge of the grid is not part of any region, so
/// pixels along the canvas edge are always boundary pixels. This keeps
/// regions that touch the edge closed along it and lets adjacent outlines
/// tile the canvas without gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryPixelSet(BTreeSet<Coordinate>);

impl BoundaryPixelSet {
    /// Wrap an explicit coordinate set.
    ///
    /// Mostly useful for driving the tracer directly; pipeline code gets
    /// its sets from [`extract_boundary`].
    #[must_use]
    pub const fn new(pixels: BTreeSet<Coordinate>) -> Self {
        Self(pixels)
    }

    /// Whether `c` is a boundary pixel.
    #[must_use]
    pub fn contains(&self, c: Coordinate) -> bool {
        self.0.contains(&c)
    }

    /// Number of boundary pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the boundary pixels in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.0.iter()
    }

    /// Where a wall-follow walk begins: the pixel with the largest `y`,
    /// ties broken by the smallest `x`.
    ///
    /// Nothing in the set lies below this pixel, so the step below it is
    /// guaranteed to be outside the region.
    #[must_use]
    pub fn start_pixel(&self) -> Option<Coordinate> {
        self.0
            .iter()
            .copied()
            .max_by(|a, b| a.y.cmp(&b.y).then(b.x.cmp(&a.x)))
    }
}

/// Collect the boundary pixels of `region`.
#[must_use]
pub fn extract_boundary<C>(region: &Region<C>) -> BoundaryPixelSet {
    BoundaryPixelSet(
        region
            .pixels()
            .iter()
            .copied()
            .filter(|p| p.neighbors().iter().any(|&n| !region.contains(n)))
            .collect(),
    )
}

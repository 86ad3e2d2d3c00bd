//! Region segmentation: partition a pixel grid into maximal 4-connected
//! components of identical color.
//!
//! Every coordinate ends up in exactly one [`Region`]. Seeds are taken in
//! row-major order (top row first, left to right), so region ids are
//! stable for a given grid and double as the tie-break key when regions
//! are later ordered by size.

use std::collections::{BTreeSet, VecDeque};

use crate::grid::PixelGrid;
use crate::types::{Coordinate, Dimensions, PipelineError};

/// A maximal set of same-color, 4-connected pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<C> {
    id: usize,
    color: C,
    pixels: BTreeSet<Coordinate>,
}

impl<C> Region<C> {
    /// Discovery index of this region.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// The color shared by every pixel of the region.
    #[must_use]
    pub const fn color(&self) -> &C {
        &self.color
    }

    /// All pixel coordinates of the region (image space).
    #[must_use]
    pub const fn pixels(&self) -> &BTreeSet<Coordinate> {
        &self.pixels
    }

    /// Whether `c` is one of the region's pixels.
    ///
    /// Out-of-grid coordinates are never members.
    #[must_use]
    pub fn contains(&self, c: Coordinate) -> bool {
        self.pixels.contains(&c)
    }

    /// Number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns `true` if the region has no pixels. Never the case for
    /// regions produced by [`segment`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// The partition of a grid into regions, plus a per-pixel label map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation<C> {
    dimensions: Dimensions,
    regions: Vec<Region<C>>,
    labels: Vec<usize>,
}

impl<C> Segmentation<C> {
    /// Source grid dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Regions in discovery order; `regions()[i].id() == i`.
    #[must_use]
    pub fn regions(&self) -> &[Region<C>] {
        &self.regions
    }

    /// Consume the segmentation, keeping only the regions.
    #[must_use]
    pub fn into_regions(self) -> Vec<Region<C>> {
        self.regions
    }

    /// The region containing pixel `(x, y)`, or `None` out of bounds.
    #[must_use]
    pub fn region_at(&self, x: u32, y: u32) -> Option<&Region<C>> {
        if x >= self.dimensions.width || y >= self.dimensions.height {
            return None;
        }
        let index = y as usize * self.dimensions.width as usize + x as usize;
        self.labels
            .get(index)
            .and_then(|&label| self.regions.get(label))
    }
}

/// Partition `grid` into maximal 4-connected same-color regions.
///
/// Each not-yet-labelled pixel, visited in row-major order, seeds a
/// breadth-first flood fill restricted to neighbors whose color equals
/// the seed's.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyGrid`] if the grid has zero width or
/// height.
pub fn segment<G: PixelGrid>(grid: &G) -> Result<Segmentation<G::Color>, PipelineError> {
    let dimensions = grid.dimensions();
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(PipelineError::EmptyGrid {
            width: dimensions.width,
            height: dimensions.height,
        });
    }

    let width = dimensions.width as usize;
    let height = dimensions.height as usize;
    let mut labels: Vec<Option<usize>> = vec![None; width * height];
    let mut regions = Vec::new();
    let mut queue = VecDeque::new();

    for seed_y in 0..dimensions.height {
        for seed_x in 0..dimensions.width {
            let seed_index = seed_y as usize * width + seed_x as usize;
            if labels[seed_index].is_some() {
                continue;
            }

            let id = regions.len();
            let color = grid.color_at(seed_x, seed_y);
            let mut pixels = BTreeSet::new();

            labels[seed_index] = Some(id);
            queue.push_back((seed_x, seed_y));

            while let Some((x, y)) = queue.pop_front() {
                pixels.insert(Coordinate::new(i64::from(x), i64::from(y)));

                for (nx, ny) in four_neighbors(x, y, dimensions) {
                    let index = ny as usize * width + nx as usize;
                    if labels[index].is_none() && grid.color_at(nx, ny) == color {
                        labels[index] = Some(id);
                        queue.push_back((nx, ny));
                    }
                }
            }

            regions.push(Region { id, color, pixels });
        }
    }

    tracing::debug!(
        width = dimensions.width,
        height = dimensions.height,
        regions = regions.len(),
        "segmented grid"
    );

    Ok(Segmentation {
        dimensions,
        regions,
        // Every pixel was labelled by the scan above.
        labels: labels.into_iter().map(Option::unwrap_or_default).collect(),
    })
}

/// In-bounds 4-connected neighbors of `(x, y)`.
fn four_neighbors(x: u32, y: u32, dimensions: Dimensions) -> impl Iterator<Item = (u32, u32)> {
    let left = x.checked_sub(1).map(|nx| (nx, y));
    let up = y.checked_sub(1).map(|ny| (x, ny));
    let right = (x + 1 < dimensions.width).then(|| (x + 1, y));
    let down = (y + 1 < dimensions.height).then(|| (x, y + 1));
    [right, down, left, up].into_iter().flatten()
}

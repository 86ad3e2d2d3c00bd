//! The read-only pixel grid the pipeline consumes.
//!
//! The core never decodes files itself. Anything that can report a width,
//! a height, and a comparable color per coordinate can be vectorized:
//! decoded `image` buffers implement [`PixelGrid`] directly, and
//! [`VecGrid`] holds any color type in memory.

use std::fmt::Debug;
use std::hash::Hash;

use image::{GrayImage, ImageBuffer, RgbaImage};

use crate::types::Dimensions;

/// A width x height array of colors addressable by integer coordinate.
///
/// Implementations must be pure: `color_at` returns the same value for
/// the same coordinate for the lifetime of the grid. The pipeline only
/// calls `color_at` with `x < width()` and `y < height()`.
pub trait PixelGrid {
    /// Pixel color. Two pixels belong to the same region iff their
    /// colors compare equal.
    type Color: Clone + Eq + Hash + Debug + Send + Sync;

    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Color of the pixel at column `x`, row `y` (row 0 is the top).
    fn color_at(&self, x: u32, y: u32) -> Self::Color;

    /// Width and height together.
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

impl PixelGrid for RgbaImage {
    type Color = [u8; 4];

    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn color_at(&self, x: u32, y: u32) -> [u8; 4] {
        self.get_pixel(x, y).0
    }
}

impl PixelGrid for GrayImage {
    type Color = u8;

    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn color_at(&self, x: u32, y: u32) -> u8 {
        self.get_pixel(x, y).0[0]
    }
}

impl<G: PixelGrid + ?Sized> PixelGrid for &G {
    type Color = G::Color;

    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn color_at(&self, x: u32, y: u32) -> Self::Color {
        (**self).color_at(x, y)
    }
}

/// A row-major in-memory grid of arbitrary colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecGrid<C> {
    width: u32,
    height: u32,
    pixels: Vec<C>,
}

impl<C> VecGrid<C> {
    /// Wrap a row-major pixel vector.
    ///
    /// Returns `None` if `pixels.len() != width * height`.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<C>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a grid from equally long rows, top row first.
    ///
    /// Returns `None` for ragged rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<C>>) -> Option<Self> {
        let height = u32::try_from(rows.len()).ok()?;
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        let width = u32::try_from(width).ok()?;
        Self::new(width, height, rows.into_iter().flatten().collect())
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> C) -> Self {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl VecGrid<char> {
    /// Build a grid from text rows, one character per pixel.
    ///
    /// Handy for describing small layouts:
    ///
    /// ```
    /// use regiontrace_pipeline::{PixelGrid, VecGrid};
    ///
    /// let grid = VecGrid::from_text(&["ab", "bb"]).unwrap();
    /// assert_eq!(grid.width(), 2);
    /// assert_eq!(grid.color_at(0, 0), 'a');
    /// assert_eq!(grid.color_at(0, 1), 'b');
    /// ```
    #[must_use]
    pub fn from_text(rows: &[&str]) -> Option<Self> {
        Self::from_rows(rows.iter().map(|r| r.chars().collect()).collect())
    }
}

impl<C: Clone + Eq + Hash + Debug + Send + Sync> PixelGrid for VecGrid<C> {
    type Color = C;

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn color_at(&self, x: u32, y: u32) -> C {
        // In-bounds by the trait contract; u32 -> usize is lossless here.
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index].clone()
    }
}

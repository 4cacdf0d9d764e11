//! Dense 2D grid of tiles

use crate::core::types::CellId;

/// Generic dense 2D grid, row-major
///
/// Coordinates are signed so callers can ask about the tile in front of an
/// edge cell without casting; anything outside `[0, width) x [0, height)`
/// resolves to `None`.
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index_of(x, y).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        self.index_of(x, y).map(move |i| &mut self.data[i])
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(i) = self.index_of(x, y) {
            self.data[i] = value;
        }
    }

    /// Reset every tile to its default value
    pub fn fill_default(&mut self) {
        self.data.fill(T::default());
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate tiles with their coordinates, row by row
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &T)> + '_ {
        let width = self.width.max(1);
        self.data
            .iter()
            .enumerate()
            .map(move |(i, tile)| ((i % width) as i32, (i / width) as i32, tile))
    }
}

/// One grid position. Holds a non-owning reference into the cell pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    pub occupant: Option<CellId>,
}

impl Tile {
    pub fn has_cell(&self) -> bool {
        self.occupant.is_some()
    }
}

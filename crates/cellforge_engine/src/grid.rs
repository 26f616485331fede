//! The cell grid.
//!
//! Cells are single bytes in row-major order; state zero is dead, the rule's
//! maximum state is fully alive, values between are decaying. The grid keeps
//! a population count and a grown bounding box incrementally; the engine
//! replaces both with tight values after each step.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::memory::MemoryProvider;

/// Inclusive bounds of the live cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// A single-cell box.
    #[must_use]
    pub fn at(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// Grows the box to cover `(x, y)`.
    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

pub struct CellGrid {
    pub(crate) cells: Vec<u8>,
    width: u32,
    height: u32,
    pub(crate) population: u64,
    pub(crate) bounding_box: Option<BoundingBox>,
    provider: Arc<dyn MemoryProvider>,
}

impl CellGrid {
    pub fn new(width: u32, height: u32, provider: Arc<dyn MemoryProvider>) -> Self {
        let cells = provider.allocate_bytes(width as usize * height as usize, "cells");
        Self {
            cells,
            width,
            height,
            population: 0,
            bounding_box: None,
            provider,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn population(&self) -> u64 {
        self.population
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Writes one cell, keeping the population and growing the bounding box.
    pub fn set(&mut self, x: u32, y: u32, state: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        let old = self.cells[index];
        self.cells[index] = state;
        match (old, state) {
            (0, s) if s != 0 => self.population += 1,
            (o, 0) if o != 0 => self.population -= 1,
            _ => {}
        }
        if state != 0 {
            match &mut self.bounding_box {
                Some(bbox) => bbox.include(x, y),
                None => self.bounding_box = Some(BoundingBox::at(x, y)),
            }
        }
    }

    /// One full row of cells.
    #[must_use]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    /// Kills every cell.
    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.population = 0;
        self.bounding_box = None;
    }

    /// Replaces the allocation with an empty grid of the new dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.cells = self
            .provider
            .allocate_bytes(width as usize * height as usize, "cells");
        self.width = width;
        self.height = height;
        self.population = 0;
        self.bounding_box = None;
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::TrackingPool;

    fn grid(width: u32, height: u32) -> CellGrid {
        CellGrid::new(width, height, TrackingPool::new())
    }

    #[test]
    fn test_set_tracks_population_and_bbox() {
        let mut g = grid(8, 8);
        g.set(2, 3, 1);
        g.set(5, 1, 1);
        g.set(2, 3, 0);
        assert_eq!(g.population(), 1);
        // The box grows on writes and only tightens on a step.
        let bbox = g.bounding_box().unwrap();
        assert_eq!((bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y), (2, 1, 5, 3));
    }

    #[test]
    fn test_out_of_bounds_reads_dead() {
        let mut g = grid(4, 4);
        g.set(9, 9, 1);
        assert_eq!(g.get(9, 9), 0);
        assert_eq!(g.population(), 0);
    }

    #[test]
    fn test_clear_and_resize() {
        let mut g = grid(4, 4);
        g.set(1, 1, 2);
        g.clear();
        assert_eq!(g.population(), 0);
        assert!(g.bounding_box().is_none());
        g.set(1, 1, 2);
        g.resize(6, 6);
        assert_eq!(g.get(1, 1), 0);
        assert_eq!((g.width(), g.height()), (6, 6));
    }
}

//! Per-ellipse hit rasters and their cache.
//!
//! A raster records, for every grid point inside one ellipse's padded
//! bounding box, whether the point is outside, inside the ellipse, or only
//! inside its padded outline. Grid points sit at integer multiples of the
//! sample step, so a raster can be reused wherever the same ellipse shows
//! up again, regardless of how the overall bounding box has moved.
//!
//! The cache is keyed on the exact bit patterns of the five parameters.
//! Step and padding are fixed per cache, so an ellipse that did not move
//! between two iterations always finds its raster again. Entries are never
//! modified; a changed parameter always produces a new entry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::geometry::{ellipse_bounding_box, point_in_ellipse, EllipseParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Hit {
    Outside,
    Core,
    Padding,
}

/// Exact identity of a raster: the five ellipse parameters, compared bit
/// for bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterKey {
    x: u64,
    y: u64,
    a: u64,
    b: u64,
    rotation: u64,
}

impl RasterKey {
    pub fn new(params: &EllipseParams) -> Self {
        Self {
            x: params.x.to_bits(),
            y: params.y.to_bits(),
            a: params.a.to_bits(),
            b: params.b.to_bits(),
            rotation: params.rotation.to_bits(),
        }
    }
}

/// Grid index of the last sample at or before `v`.
pub fn grid_floor(v: f64, step: f64) -> i64 {
    (v / step).floor() as i64
}

#[derive(Debug)]
pub struct EllipseRaster {
    x0: i64,
    y0: i64,
    width: usize,
    height: usize,
    cells: Vec<Hit>,
}

impl EllipseRaster {
    pub fn build(params: &EllipseParams, padding: f64, step: f64) -> Self {
        let bb = ellipse_bounding_box(
            params.x,
            params.y,
            params.a + padding,
            params.b + padding,
            params.rotation,
        );
        let x0 = grid_floor(bb.p1.x, step);
        let y0 = grid_floor(bb.p1.y, step);
        let x1 = grid_floor(bb.p2.x, step) + 1;
        let y1 = grid_floor(bb.p2.y, step) + 1;
        let width = (x1 - x0).max(0) as usize + 1;
        let height = (y1 - y0).max(0) as usize + 1;

        let mut cells = Vec::with_capacity(width * height);
        for row in 0..height {
            let y = (y0 + row as i64) as f64 * step;
            for col in 0..width {
                let x = (x0 + col as i64) as f64 * step;
                let hit = if point_in_ellipse(
                    x,
                    y,
                    params.x,
                    params.y,
                    params.a,
                    params.b,
                    params.rotation,
                ) {
                    Hit::Core
                } else if point_in_ellipse(
                    x,
                    y,
                    params.x,
                    params.y,
                    params.a + padding,
                    params.b + padding,
                    params.rotation,
                ) {
                    Hit::Padding
                } else {
                    Hit::Outside
                };
                cells.push(hit);
            }
        }

        Self {
            x0,
            y0,
            width,
            height,
            cells,
        }
    }

    /// Classification of global grid point `(ix, iy)`.
    #[inline]
    pub fn hit(&self, ix: i64, iy: i64) -> Hit {
        let col = ix - self.x0;
        let row = iy - self.y0;
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return Hit::Outside;
        }
        self.cells[row as usize * self.width + col as usize]
    }

    #[cfg(test)]
    pub(crate) fn core_count(&self) -> usize {
        self.cells.iter().filter(|&&h| h == Hit::Core).count()
    }
}

/// Append-only raster store for one sampling step and padding.
pub struct RasterCache {
    step: f64,
    padding: f64,
    capacity: usize,
    entries: HashMap<RasterKey, Arc<EllipseRaster>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl RasterCache {
    pub fn new(step: f64, padding: f64, capacity: usize) -> Self {
        Self {
            step,
            padding,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Fetch the raster for `params`, building it on first sight.
    pub fn get(&mut self, params: &EllipseParams) -> Arc<EllipseRaster> {
        let key = RasterKey::new(params);
        if let Some(r) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(r);
        }
        self.misses += 1;
        if self.entries.len() >= self.capacity {
            // Whole-cache drop; live Arcs held by callers stay valid.
            self.entries.clear();
            self.evictions += 1;
        }
        let raster = Arc::new(EllipseRaster::build(params, self.padding, self.step));
        self.entries.insert(key, Arc::clone(&raster));
        raster
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

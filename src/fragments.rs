//! Zone bitmaps: connected fragments and label anchor points.
//!
//! A zone that lays out as several disconnected pieces reads badly, so the
//! sampler can record each zone's sample points in a bitmap. Flood filling
//! the bitmap (4-connected, explicit stack) gives the fragment sizes; all
//! fragments beyond the largest count towards the split-zone penalty.

/// Fragments smaller than this are treated as sampling noise.
pub const MIN_FRAGMENT_POINTS: usize = 10;

/// Centering passes when refining a label anchor.
const MAX_CENTERING_PASSES: u32 = 20;

#[derive(Debug, Clone)]
pub struct ZoneBitmap {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl ZoneBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize) {
        self.cells[row * self.width + col] = true;
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> bool {
        col < self.width && row < self.height && self.cells[row * self.width + col]
    }

    fn get_signed(&self, col: i64, row: i64) -> bool {
        col >= 0 && row >= 0 && self.get(col as usize, row as usize)
    }

    /// Sizes of the 4-connected fragments, in discovery order (row-major
    /// scan of each fragment's first cell).
    pub fn fragment_sizes(&self) -> Vec<usize> {
        let mut fragment_of = vec![0u32; self.cells.len()];
        let mut sizes = Vec::new();
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for row in 0..self.height {
            for col in 0..self.width {
                let index = row * self.width + col;
                if !self.cells[index] || fragment_of[index] != 0 {
                    continue;
                }
                let id = sizes.len() as u32 + 1;
                fragment_of[index] = id;
                stack.push((col, row));
                let mut size = 0usize;

                while let Some((c, r)) = stack.pop() {
                    size += 1;
                    let neighbours = [
                        (c as i64, r as i64 - 1),
                        (c as i64, r as i64 + 1),
                        (c as i64 - 1, r as i64),
                        (c as i64 + 1, r as i64),
                    ];
                    for (nc, nr) in neighbours {
                        if !self.get_signed(nc, nr) {
                            continue;
                        }
                        let ni = nr as usize * self.width + nc as usize;
                        if fragment_of[ni] == 0 {
                            fragment_of[ni] = id;
                            stack.push((nc as usize, nr as usize));
                        }
                    }
                }
                sizes.push(size);
            }
        }
        sizes
    }

    fn marked_neighbours(&self, col: usize, row: usize) -> usize {
        let (c, r) = (col as i64, row as i64);
        [(c, r - 1), (c, r + 1), (c - 1, r), (c + 1, r)]
            .iter()
            .filter(|&&(nc, nr)| self.get_signed(nc, nr))
            .count()
    }

    /// Find a point well inside the zone for placing its label.
    ///
    /// Starts from `preferred` when that cell is marked, else from `first`.
    /// An edge seed is swapped for the nearest fully interior cell, then
    /// the point is alternately centred along x and y.
    pub fn interior_point(&self, preferred: Option<(usize, usize)>, first: (usize, usize)) -> (usize, usize) {
        let (mut col, mut row) = match preferred {
            Some((c, r)) if self.get(c, r) => (c, r),
            _ => first,
        };

        if self.marked_neighbours(col, row) < 4 {
            if let Some(p) = self.nearest_interior(col, row) {
                col = p.0;
                row = p.1;
            }
        }

        for _ in 0..MAX_CENTERING_PASSES {
            let mut moved = false;

            let (lo, hi) = self.extent(col, row, true);
            let mid = lo + (hi - lo + 1) / 2;
            if mid != col {
                col = mid;
                moved = true;
            }

            let (lo, hi) = self.extent(col, row, false);
            let mid = lo + (hi - lo + 1) / 2;
            if mid != row {
                row = mid;
                moved = true;
            }

            if !moved {
                break;
            }
        }
        (col, row)
    }

    fn nearest_interior(&self, col: usize, row: usize) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), i64)> = None;
        for r in 0..self.height {
            for c in 0..self.width {
                if !self.get(c, r) || self.marked_neighbours(c, r) < 4 {
                    continue;
                }
                let dc = c as i64 - col as i64;
                let dr = r as i64 - row as i64;
                let d = dc * dc + dr * dr;
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some(((c, r), d));
                }
            }
        }
        best.map(|(p, _)| p)
    }

    /// Marked run through `(col, row)` along one axis, as inclusive
    /// `(lo, hi)` indices on that axis. An unmarked start gives `(i, i)`.
    fn extent(&self, col: usize, row: usize, horizontal: bool) -> (usize, usize) {
        let at = |i: usize| {
            if horizontal {
                self.get(i, row)
            } else {
                self.get(col, i)
            }
        };
        let start = if horizontal { col } else { row };
        if !at(start) {
            return (start, start);
        }
        let mut lo = start;
        while lo > 0 && at(lo - 1) {
            lo -= 1;
        }
        let mut hi = start;
        let limit = if horizontal { self.width } else { self.height };
        while hi + 1 < limit && at(hi + 1) {
            hi += 1;
        }
        (lo, hi)
    }
}

/// Points in all fragments except the largest, ignoring noise fragments.
pub fn split_points(fragment_sizes: &[usize]) -> usize {
    if fragment_sizes.len() <= 1 {
        return 0;
    }
    let mut sorted = fragment_sizes.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted[1..]
        .iter()
        .filter(|&&s| s >= MIN_FRAGMENT_POINTS)
        .sum()
}

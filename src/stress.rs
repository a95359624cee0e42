//! venneuler-compatible stress.
//!
//! Kept separate from the fitness so layouts can be compared with
//! venneuler's published numbers. Ellipses are recentred around
//! (0.5, 0.5), rasterized on a fixed square grid, and each non-empty
//! zone's pixel share (in percent) is regressed through the origin against
//! its desired proportion. Stress is the residual sum of squares over the
//! total sum of squares.
//!
//! Zones that are neither desired nor present contribute nothing to any of
//! the sums, so only the union of desired and rasterized zones is visited
//! rather than all 2^n label combinations.

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::geometry::{ellipse_bounding_box, point_in_ellipse, EllipseParams};
use crate::zone::ZoneKey;

/// Pixels along each side of the raster.
pub const GRID_SIZE: usize = 200;

/// Zone areas as percentages of all covered pixels.
pub fn zone_areas(ellipses: &[EllipseParams]) -> BTreeMap<ZoneKey, f64> {
    if ellipses.is_empty() {
        return BTreeMap::new();
    }
    let n = ellipses.len() as f64;
    let cx = ellipses.iter().map(|e| e.x).sum::<f64>() / n;
    let cy = ellipses.iter().map(|e| e.y).sum::<f64>() / n;
    let recentred: Vec<EllipseParams> = ellipses
        .iter()
        .map(|e| EllipseParams {
            x: 0.5 + e.x - cx,
            y: 0.5 + e.y - cy,
            ..*e
        })
        .collect();

    let mut mins = f64::INFINITY;
    let mut maxs = f64::NEG_INFINITY;
    for e in &recentred {
        let bb = ellipse_bounding_box(e.x, e.y, e.a, e.b, e.rotation);
        mins = mins.min(bb.p1.x).min(bb.p1.y);
        maxs = maxs.max(bb.p2.x).max(bb.p2.y);
    }
    let scale = maxs - mins;
    if !(scale.is_finite() && scale > 0.0) {
        return BTreeMap::new();
    }
    let size = GRID_SIZE as f64;

    let bitmaps: Vec<Vec<bool>> = recentred
        .par_iter()
        .map(|e| {
            let xi = (e.x - mins) / scale * size;
            let yi = (e.y - mins) / scale * size;
            let ai = e.a / scale * size;
            let bi = e.b / scale * size;
            let mut cells = vec![false; GRID_SIZE * GRID_SIZE];
            for x in 0..GRID_SIZE {
                for y in 0..GRID_SIZE {
                    cells[x * GRID_SIZE + y] =
                        point_in_ellipse(x as f64, y as f64, xi, yi, ai, bi, e.rotation);
                }
            }
            cells
        })
        .collect();

    // Each worker counts its rows, then the partial tables are merged.
    let counts = (0..GRID_SIZE)
        .into_par_iter()
        .fold(HashMap::<ZoneKey, u32>::new, |mut acc, x| {
            for y in 0..GRID_SIZE {
                let cell = x * GRID_SIZE + y;
                let mut key = ZoneKey::EMPTY;
                for (i, bitmap) in bitmaps.iter().enumerate() {
                    if bitmap[cell] {
                        key.insert(i);
                    }
                }
                if !key.is_empty() {
                    *acc.entry(key).or_insert(0) += 1;
                }
            }
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (key, count) in b {
                *a.entry(key).or_insert(0) += count;
            }
            a
        });

    let total: u32 = counts.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .into_iter()
        .map(|(key, count)| (key, 100.0 * count as f64 / total as f64))
        .collect()
}

/// Stress of `ellipses` against the desired proportions.
///
/// Zero when there is nothing to regress (no covered pixels or no desired
/// area).
pub fn venneuler_stress(ellipses: &[EllipseParams], desired: &BTreeMap<ZoneKey, f64>) -> f64 {
    let areas = zone_areas(ellipses);

    let mut keys: Vec<ZoneKey> = desired.keys().chain(areas.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    let pairs: Vec<(f64, f64)> = keys
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| {
            (
                desired.get(k).copied().unwrap_or(0.0),
                areas.get(k).copied().unwrap_or(0.0),
            )
        })
        .collect();

    let xx: f64 = pairs.iter().map(|(x, _)| x * x).sum();
    let xy: f64 = pairs.iter().map(|(x, y)| x * y).sum();
    let sst: f64 = pairs.iter().map(|(_, y)| y * y).sum();
    if xx == 0.0 || sst == 0.0 {
        return 0.0;
    }
    let slope = xy / xx;
    let sse: f64 = pairs
        .iter()
        .map(|(x, y)| {
            let residual = y - x * slope;
            residual * residual
        })
        .sum();
    sse / sst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::circle;

    fn table(entries: &[(&[usize], f64)]) -> BTreeMap<ZoneKey, f64> {
        entries
            .iter()
            .map(|(idx, p)| (ZoneKey::from_indices(idx.iter().copied()), *p))
            .collect()
    }

    #[test]
    fn areas_are_percentages() {
        let areas = zone_areas(&[circle(0.0, 0.0, 1.0), circle(1.0, 0.0, 1.0)]);
        let sum: f64 = areas.values().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(areas.len(), 3);
    }

    #[test]
    fn areas_independent_of_translation() {
        let a = zone_areas(&[circle(0.0, 0.0, 1.0), circle(1.0, 0.5, 0.7)]);
        let b = zone_areas(&[circle(10.0, -4.0, 1.0), circle(11.0, -3.5, 0.7)]);
        for (key, pa) in &a {
            assert!((pa - b[key]).abs() < 0.5, "{key:?}");
        }
    }

    #[test]
    fn matching_layout_has_low_stress() {
        let desired = table(&[(&[0], 0.5), (&[1], 0.5)]);
        let stress = venneuler_stress(&[circle(0.0, 0.0, 1.0), circle(3.0, 0.0, 1.0)], &desired);
        assert!(stress < 1e-3, "stress {stress}");
    }

    #[test]
    fn unwanted_overlap_raises_stress() {
        let desired = table(&[(&[0], 0.5), (&[1], 0.5)]);
        let apart = venneuler_stress(&[circle(0.0, 0.0, 1.0), circle(3.0, 0.0, 1.0)], &desired);
        let overlapping = venneuler_stress(&[circle(0.0, 0.0, 1.0), circle(0.8, 0.0, 1.0)], &desired);
        assert!(overlapping > apart + 0.05, "{overlapping} vs {apart}");
    }

    #[test]
    fn degenerate_input_is_zero() {
        assert_eq!(venneuler_stress(&[], &table(&[(&[0], 1.0)])), 0.0);
        assert_eq!(venneuler_stress(&[circle(0.0, 0.0, 0.0)], &table(&[(&[0], 1.0)])), 0.0);
        assert_eq!(venneuler_stress(&[circle(0.0, 0.0, 1.0)], &BTreeMap::new()), 0.0);
    }
}

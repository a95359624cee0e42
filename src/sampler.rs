//! Grid area sampling of zone proportions.
//!
//! The combined bounding box of all ellipses, padded by a fraction of the
//! largest radius, is swept on a regular grid. Each grid point is
//! classified by the set of ellipses containing it (its zone) and by the
//! set whose padded outlines contain it (its expanded zone). Zone
//! proportions are point counts divided by the number of points inside at
//! least one ellipse.
//!
//! The step and the padding are fixed the first time a sampler sees a
//! non-degenerate layout and reused for the rest of the run, so fitness
//! values from different iterations are comparable. Grid points sit on
//! multiples of the step, which lets per-ellipse rasters be cached across
//! iterations: a raster depends only on its own ellipse.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::fragments::{split_points, ZoneBitmap};
use crate::geometry::{union_bounding_box, BoundingBox, EllipseParams, Point};
use crate::raster::{grid_floor, EllipseRaster, Hit, RasterCache};
use crate::types::SamplerSettings;
use crate::zone::ZoneKey;

#[derive(Debug, Clone, Copy, Default)]
pub struct SampleOptions {
    /// Record per-zone bitmaps and analyse fragments.
    pub fragments: bool,
    /// Compute a label anchor inside each zone. Implies `fragments`.
    pub label_positions: bool,
}

impl SampleOptions {
    pub fn areas_only() -> Self {
        Self::default()
    }

    pub fn with_fragments() -> Self {
        Self {
            fragments: true,
            label_positions: false,
        }
    }

    pub fn full() -> Self {
        Self {
            fragments: true,
            label_positions: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZoneSample {
    pub points: usize,
    pub proportion: f64,
    pub average_position: Point,
    /// First grid point met in the sweep; always inside the zone.
    pub first_position: Point,
    /// Number of connected fragments, when fragments were analysed.
    pub fragments: Option<usize>,
    /// Points outside the largest fragment as a share of all inside points.
    pub split_proportion: f64,
    pub label_position: Option<Point>,
}

#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub zones: BTreeMap<ZoneKey, ZoneSample>,
    /// Expanded-zone proportions.
    pub expanded: BTreeMap<ZoneKey, f64>,
    pub total_points: usize,
    pub expanded_total_points: usize,
    /// Union bounding box of the ellipses, without padding.
    pub bounding_box: Option<BoundingBox>,
    pub step: f64,
}

impl Sample {
    /// Sampled proportion of `key`, zero when it was not seen.
    pub fn proportion(&self, key: ZoneKey) -> f64 {
        self.zones.get(&key).map_or(0.0, |z| z.proportion)
    }

    pub fn proportion_sum(&self) -> f64 {
        self.zones.values().map(|z| z.proportion).sum()
    }
}

struct ZoneAccumulator {
    points: usize,
    sum_x: f64,
    sum_y: f64,
    first: (usize, usize),
    bitmap: Option<ZoneBitmap>,
}

pub struct AreaSampler {
    settings: SamplerSettings,
    cache: Option<RasterCache>,
}

impl AreaSampler {
    pub fn new(settings: SamplerSettings) -> Self {
        Self {
            settings,
            cache: None,
        }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// The frozen step, once one has been chosen.
    pub fn step(&self) -> Option<f64> {
        self.cache.as_ref().map(RasterCache::step)
    }

    pub fn cache(&self) -> Option<&RasterCache> {
        self.cache.as_ref()
    }

    pub fn sample(&mut self, ellipses: &[EllipseParams], options: SampleOptions) -> Sample {
        let Some(bb) = union_bounding_box(ellipses) else {
            return Sample::default();
        };

        if self.cache.is_none() {
            let max_radius = ellipses
                .iter()
                .map(EllipseParams::max_radius)
                .fold(0.0, f64::max);
            let padding = self.settings.padding_factor * max_radius;
            let padded = bb.padded(padding);
            let diff_min = padded.width().min(padded.height());
            let step = diff_min / self.settings.samples_per_dimension.max(1) as f64;
            if !(step.is_finite() && step > 0.0) {
                return Sample {
                    bounding_box: Some(bb),
                    ..Sample::default()
                };
            }
            log::debug!("area sample step frozen at {step}, padding {padding}");
            self.cache = Some(RasterCache::new(
                step,
                padding,
                self.settings.raster_cache_capacity,
            ));
        }
        let Some(cache) = self.cache.as_mut() else {
            return Sample::default();
        };
        let step = cache.step();
        let padded = bb.padded(cache.padding());

        let rasters: Vec<Arc<EllipseRaster>> = ellipses.iter().map(|e| cache.get(e)).collect();

        let ix0 = grid_floor(padded.p1.x, step);
        let iy0 = grid_floor(padded.p1.y, step);
        let ix1 = grid_floor(padded.p2.x, step);
        let iy1 = grid_floor(padded.p2.y, step);
        let width = (ix1 - ix0 + 1).max(0) as usize;
        let height = (iy1 - iy0 + 1).max(0) as usize;

        let want_bitmaps = options.fragments || options.label_positions;
        let mut zones: HashMap<ZoneKey, ZoneAccumulator> = HashMap::new();
        let mut expanded: HashMap<ZoneKey, usize> = HashMap::new();
        let mut total_points = 0usize;
        let mut expanded_total_points = 0usize;

        for row in 0..height {
            let iy = iy0 + row as i64;
            let y = iy as f64 * step;
            for col in 0..width {
                let ix = ix0 + col as i64;
                let mut key = ZoneKey::EMPTY;
                let mut expanded_key = ZoneKey::EMPTY;
                for (i, raster) in rasters.iter().enumerate() {
                    match raster.hit(ix, iy) {
                        Hit::Core => {
                            key.insert(i);
                            expanded_key.insert(i);
                        }
                        Hit::Padding => expanded_key.insert(i),
                        Hit::Outside => {}
                    }
                }

                if !expanded_key.is_empty() {
                    *expanded.entry(expanded_key).or_insert(0) += 1;
                    expanded_total_points += 1;
                }
                if key.is_empty() {
                    continue;
                }
                total_points += 1;

                let x = ix as f64 * step;
                let acc = zones.entry(key).or_insert_with(|| ZoneAccumulator {
                    points: 0,
                    sum_x: 0.0,
                    sum_y: 0.0,
                    first: (col, row),
                    bitmap: want_bitmaps.then(|| ZoneBitmap::new(width, height)),
                });
                acc.points += 1;
                acc.sum_x += x;
                acc.sum_y += y;
                if let Some(bitmap) = acc.bitmap.as_mut() {
                    bitmap.set(col, row);
                }
            }
        }

        let grid_point = |col: usize, row: usize| {
            Point::new(
                (ix0 + col as i64) as f64 * step,
                (iy0 + row as i64) as f64 * step,
            )
        };

        let mut result = Sample {
            zones: BTreeMap::new(),
            expanded: expanded
                .into_iter()
                .map(|(k, n)| (k, n as f64 / expanded_total_points as f64))
                .collect(),
            total_points,
            expanded_total_points,
            bounding_box: Some(bb),
            step,
        };

        for (key, acc) in zones {
            let average_position =
                Point::new(acc.sum_x / acc.points as f64, acc.sum_y / acc.points as f64);
            let mut fragments = None;
            let mut split_proportion = 0.0;
            let mut label_position = None;

            if let Some(bitmap) = acc.bitmap.as_ref() {
                let sizes = bitmap.fragment_sizes();
                if sizes.len() > 1 {
                    let split = split_points(&sizes);
                    split_proportion = split as f64 / total_points as f64;
                    log::trace!("split zone {key:?}: fragments {sizes:?}, penalty {split_proportion}");
                }
                fragments = Some(sizes.len());

                if options.label_positions {
                    let pc = (average_position.x / step).round() as i64 - ix0;
                    let pr = (average_position.y / step).round() as i64 - iy0;
                    let preferred = (pc >= 0 && pr >= 0).then_some((pc as usize, pr as usize));
                    let (col, row) = bitmap.interior_point(preferred, acc.first);
                    label_position = Some(grid_point(col, row));
                }
            }

            result.zones.insert(
                key,
                ZoneSample {
                    points: acc.points,
                    proportion: acc.points as f64 / total_points as f64,
                    average_position,
                    first_position: grid_point(acc.first.0, acc.first.1),
                    fragments,
                    split_proportion,
                    label_position,
                },
            );
        }

        result
    }
}

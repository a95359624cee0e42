//! Fitness evaluation: seven penalty components and their normalization.
//!
//! Each component is non-negative and lower is better. Components live on
//! very different scales, so every one is divided by the largest value it
//! has taken so far in the run before the weights are applied.

use serde::{Deserialize, Serialize};

use crate::diagram::Diagram;
use crate::geometry::{distance, EllipseParams};
use crate::sampler::Sample;
use crate::types::FitnessWeights;
use crate::zone::ZoneKey;

/// Keeps the normalized value of a component below 1 and the division
/// defined while its running maximum is still zero.
pub const EPSILON: f64 = 1e-12;

/// Escalation added to the separation factor per forbidden label pair in
/// an unwanted zone.
const UNWANTED_PAIR_FACTOR_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessComponents {
    pub zone_area_difference: f64,
    pub unwanted_zone: f64,
    pub circle_distortion: f64,
    pub split_zone: f64,
    pub missing_one_label_zone: f64,
    pub missing_two_or_more_label_zone: f64,
    pub unwanted_expanded_overlap: f64,
}

impl FitnessComponents {
    pub const COUNT: usize = 7;

    pub const NAMES: [&'static str; Self::COUNT] = [
        "zoneAreaDifference",
        "unwantedZone",
        "circleDistortion",
        "splitZone",
        "missingOneLabelZone",
        "missingTwoOrMoreLabelZone",
        "unwantedExpandedOverlap",
    ];

    pub fn as_array(&self) -> [f64; Self::COUNT] {
        [
            self.zone_area_difference,
            self.unwanted_zone,
            self.circle_distortion,
            self.split_zone,
            self.missing_one_label_zone,
            self.missing_two_or_more_label_zone,
            self.unwanted_expanded_overlap,
        ]
    }

    /// Score `params` (one entry per diagram ellipse) against its sample.
    pub fn compute(diagram: &Diagram, params: &[EllipseParams], sample: &Sample) -> Self {
        let mut fitness = FitnessComponents::default();
        if params.is_empty() {
            return fitness;
        }
        let desired = diagram.desired_table();

        let mut all_zones: Vec<ZoneKey> = desired.keys().copied().collect();
        for key in sample.zones.keys() {
            if !desired.contains_key(key) {
                all_zones.push(*key);
            }
        }

        for key in all_zones {
            let actual = match sample.zones.get(&key) {
                Some(z) => z.proportion,
                None => {
                    missing_zone_penalty(key, params, sample, &mut fitness);
                    0.0
                }
            };
            let difference = match desired.get(&key) {
                Some(&want) => (actual - want).abs(),
                None => {
                    let difference = actual;
                    unwanted_zone_penalty(key, difference, diagram, params, &mut fitness);
                    difference
                }
            };
            fitness.zone_area_difference += difference;

            if let Some(z) = sample.zones.get(&key) {
                fitness.split_zone += z.split_proportion;
            }
        }

        fitness.unwanted_expanded_overlap = unwanted_expanded_overlap(diagram, params.len(), sample);

        fitness.circle_distortion = params
            .iter()
            .map(|p| 1.0 - p.a.min(p.b) / p.a.max(p.b))
            .sum::<f64>()
            / params.len() as f64;

        log::trace!("fitness components: {fitness:?}");
        fitness
    }
}

/// True when some desired zone contains both ellipses.
fn jointly_desired(diagram: &Diagram, i: usize, j: usize) -> bool {
    diagram
        .desired_zones()
        .iter()
        .any(|z| z.key.contains(i) && z.key.contains(j))
}

fn separation_deficit(p: &EllipseParams, q: &EllipseParams) -> f64 {
    (p.max_radius() + q.max_radius() - distance(p.centre(), q.centre())).max(0.0)
}

fn missing_zone_penalty(
    missing: ZoneKey,
    params: &[EllipseParams],
    sample: &Sample,
    fitness: &mut FitnessComponents,
) {
    if missing.len() == 1 {
        // Push the ellipse away from everything else.
        let Some(c) = missing.indices().next() else {
            return;
        };
        for (e, p) in params.iter().enumerate() {
            if e != c {
                fitness.missing_one_label_zone += separation_deficit(&params[c], p);
            }
        }
        return;
    }

    // Sampled zone sharing the most labels; ties keep the one with fewer labels.
    let mut best: Option<(ZoneKey, usize)> = None;
    for key in sample.zones.keys() {
        let shared = key.intersection(missing).len();
        if shared == 0 {
            continue;
        }
        best = match best {
            Some((_, n)) if shared < n => best,
            Some((b, n)) if shared == n && key.len() >= b.len() => best,
            _ => Some((*key, shared)),
        };
    }
    let Some((closest, shared)) = best else {
        return;
    };
    let Some(anchor) = sample.zones.get(&closest).map(|z| z.first_position) else {
        return;
    };
    log::trace!("missing zone {missing:?}: closest sampled zone {closest:?}");

    // Pull the ellipses the closest zone lacks towards it.
    for j in missing.difference(closest).indices() {
        fitness.missing_two_or_more_label_zone += distance(params[j].centre(), anchor);
    }

    // The closest zone has every wanted label plus extras: separate them.
    if shared == missing.len() {
        for j in closest.difference(missing).indices() {
            for k in missing.indices() {
                fitness.missing_two_or_more_label_zone += separation_deficit(&params[k], &params[j]);
            }
        }
    }
}

fn unwanted_zone_penalty(
    unwanted: ZoneKey,
    difference: f64,
    diagram: &Diagram,
    params: &[EllipseParams],
    fitness: &mut FitnessComponents,
) {
    if diagram
        .desired_zones()
        .iter()
        .any(|z| unwanted.is_subset_of(z.key))
    {
        // A lone ellipse sticking out where only its overlaps are wanted.
        if unwanted.len() == 1 {
            fitness.unwanted_zone += difference;
        }
        return;
    }

    let mut factor = 1.0;
    let members: Vec<usize> = unwanted.indices().collect();
    for (n, &i) in members.iter().enumerate() {
        for &j in &members[n + 1..] {
            if jointly_desired(diagram, i, j) {
                continue;
            }
            factor += UNWANTED_PAIR_FACTOR_STEP;
            fitness.unwanted_zone += separation_deficit(&params[i], &params[j]) * factor;
        }
    }
}

fn unwanted_expanded_overlap(diagram: &Diagram, n: usize, sample: &Sample) -> f64 {
    let mut total = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            if jointly_desired(diagram, i, j) {
                continue;
            }
            total += sample
                .expanded
                .iter()
                .filter(|(key, _)| key.contains(i) && key.contains(j))
                .map(|(_, proportion)| proportion)
                .sum::<f64>();
        }
    }
    total
}

/// Running maximum per component, kept for a whole run.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    max: [f64; FitnessComponents::COUNT],
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running_max(&self) -> &[f64; FitnessComponents::COUNT] {
        &self.max
    }

    /// Raise the running maxima to `components` and return the normalized
    /// values.
    pub fn normalize(&mut self, components: &FitnessComponents) -> [f64; FitnessComponents::COUNT] {
        let raw = components.as_array();
        let mut out = [0.0; FitnessComponents::COUNT];
        for (c, value) in raw.into_iter().enumerate() {
            if value > self.max[c] {
                self.max[c] = value;
            }
            out[c] = value / (self.max[c] + EPSILON);
        }
        out
    }

    /// Weighted mean of the normalized components.
    pub fn scalar(&mut self, components: &FitnessComponents, weights: &FitnessWeights) -> f64 {
        let normalized = self.normalize(components);
        let weighted: f64 = normalized
            .iter()
            .zip(weights.as_array())
            .map(|(n, w)| n * w)
            .sum();
        weighted / FitnessComponents::COUNT as f64
    }
}

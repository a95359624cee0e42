//! The owned diagram: ellipses, desired zones and duplicate groups.
//!
//! Ellipses are indexed in global contour order (labels sorted), which is
//! the bit order of every `ZoneKey`. The desired zone table and the
//! duplicate groups are fixed once the diagram is built; only ellipse
//! parameters change during optimization.

use std::collections::{BTreeMap, HashMap};

use crate::error::LayoutError;
use crate::geometry::EllipseParams;
use crate::prng::{Pcg32, Stream};
use crate::types::{DiagramSpec, InitialLayout};
use crate::zone::{ZoneKey, MAX_ELLIPSES};

/// Centre used for every ellipse by the stacked initial layout.
const STACKED_CENTRE: (f64, f64) = (1.0, 1.0);

#[derive(Debug, Clone)]
pub struct Ellipse {
    pub label: String,
    /// Area the ellipse must keep; resize moves recompute `b` from it.
    pub target_area: f64,
    pub params: EllipseParams,
}

#[derive(Debug, Clone)]
pub struct DesiredZone {
    pub key: ZoneKey,
    /// Proportion after rescaling so all desired zones sum to 1.
    pub proportion: f64,
    /// Proportion as supplied.
    pub original_proportion: f64,
}

/// The default diagram has no ellipses and no zones.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    ellipses: Vec<Ellipse>,
    labels: Vec<String>,
    desired: Vec<DesiredZone>,
    desired_by_key: BTreeMap<ZoneKey, f64>,
    /// `representative[i]` is the index whose geometry ellipse `i` mirrors.
    representative: Vec<usize>,
}

impl Diagram {
    /// Validate a specification and lay out its ellipses.
    pub fn from_spec(
        spec: &DiagramSpec,
        initial: &InitialLayout,
        seed: u64,
    ) -> Result<Self, LayoutError> {
        // Drop zero-proportion zones, validating the rest.
        let mut zones: Vec<(&[String], f64)> = Vec::with_capacity(spec.zones.len());
        for z in &spec.zones {
            if z.labels.is_empty() {
                return Err(LayoutError::EmptyZone);
            }
            if !z.proportion.is_finite() || z.proportion < 0.0 {
                return Err(LayoutError::InvalidProportion {
                    zone: z.labels.join(","),
                    value: z.proportion,
                });
            }
            if z.proportion == 0.0 {
                continue;
            }
            zones.push((&z.labels, z.proportion));
        }
        if zones.is_empty() {
            log::debug!("no zones with a non-zero proportion, empty layout");
            return Ok(Self::default());
        }

        let mut labels: Vec<String> = Vec::new();
        for (zone_labels, _) in &zones {
            for l in zone_labels.iter() {
                if !labels.contains(l) {
                    labels.push(l.clone());
                }
            }
        }
        labels.sort();
        if labels.len() > MAX_ELLIPSES {
            return Err(LayoutError::TooManyEllipses {
                count: labels.len(),
                max: MAX_ELLIPSES,
            });
        }
        let index_of: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let total: f64 = zones.iter().map(|(_, p)| p).sum();
        let mut desired = Vec::with_capacity(zones.len());
        let mut desired_by_key = BTreeMap::new();
        for (zone_labels, proportion) in &zones {
            let mut key = ZoneKey::EMPTY;
            for l in zone_labels.iter() {
                let i = index_of[l.as_str()];
                if key.contains(i) {
                    return Err(LayoutError::RepeatedLabel {
                        zone: zone_labels.join(","),
                        label: l.clone(),
                    });
                }
                key.insert(i);
            }
            let scaled = proportion / total;
            if desired_by_key.insert(key, scaled).is_some() {
                return Err(LayoutError::DuplicateZone {
                    zone: key.display(&labels).to_string(),
                });
            }
            desired.push(DesiredZone {
                key,
                proportion: scaled,
                original_proportion: *proportion,
            });
        }

        let target_areas: Vec<f64> = (0..labels.len())
            .map(|i| {
                desired
                    .iter()
                    .filter(|z| z.key.contains(i))
                    .map(|z| z.proportion)
                    .sum()
            })
            .collect();

        let params = initial_params(&labels, &target_areas, initial, seed)?;

        let ellipses = labels
            .iter()
            .zip(target_areas)
            .zip(params)
            .map(|((label, target_area), params)| Ellipse {
                label: label.clone(),
                target_area,
                params,
            })
            .collect();

        let representative = duplicate_groups(labels.len(), &desired);

        let mut diagram = Diagram {
            ellipses,
            labels,
            desired,
            desired_by_key,
            representative,
        };
        for i in 0..diagram.ellipses.len() {
            let r = diagram.representative[i];
            if r != i {
                diagram.ellipses[i].params = diagram.ellipses[r].params;
            }
        }
        Ok(diagram)
    }

    pub fn len(&self) -> usize {
        self.ellipses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ellipses.is_empty()
    }

    pub fn ellipses(&self) -> &[Ellipse] {
        &self.ellipses
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn target_area(&self, index: usize) -> f64 {
        self.ellipses[index].target_area
    }

    /// Snapshot of every ellipse's parameters, indexed like `ellipses()`.
    pub fn params(&self) -> Vec<EllipseParams> {
        self.ellipses.iter().map(|e| e.params).collect()
    }

    pub fn desired_zones(&self) -> &[DesiredZone] {
        &self.desired
    }

    /// Desired proportion keyed by zone, in key order.
    pub fn desired_table(&self) -> &BTreeMap<ZoneKey, f64> {
        &self.desired_by_key
    }

    pub fn desired_proportion(&self, key: ZoneKey) -> Option<f64> {
        self.desired_by_key.get(&key).copied()
    }

    /// True when ellipse `index` mirrors another and is not optimized itself.
    pub fn is_duplicate(&self, index: usize) -> bool {
        self.representative[index] != index
    }

    pub fn representative(&self, index: usize) -> usize {
        self.representative[index]
    }

    /// Copy each representative's geometry onto the ellipses that mirror it.
    pub fn mirror_duplicates(&self, params: &mut [EllipseParams]) {
        for (i, &r) in self.representative.iter().enumerate() {
            if r != i {
                params[i] = params[r];
            }
        }
    }

    /// Commit new parameters for a representative and its duplicates.
    pub fn set_params(&mut self, index: usize, params: EllipseParams) {
        let rep = self.representative[index];
        for i in 0..self.ellipses.len() {
            if i == index || self.representative[i] == rep {
                self.ellipses[i].params = params;
            }
        }
    }

    pub fn zone_name(&self, key: ZoneKey) -> String {
        key.display(&self.labels).to_string()
    }
}

fn initial_params(
    labels: &[String],
    target_areas: &[f64],
    initial: &InitialLayout,
    seed: u64,
) -> Result<Vec<EllipseParams>, LayoutError> {
    match initial {
        InitialLayout::Stacked => Ok(target_areas
            .iter()
            .map(|&area| EllipseParams::circle_with_area(STACKED_CENTRE.0, STACKED_CENTRE.1, area))
            .collect()),
        InitialLayout::Random { max_x, max_y } => {
            let mut rng = Pcg32::for_stream(seed, Stream::InitialLayout);
            Ok(target_areas
                .iter()
                .map(|&area| {
                    let x = rng.next_up_to(*max_x);
                    let y = rng.next_up_to(*max_y);
                    EllipseParams::circle_with_area(x, y, area)
                })
                .collect())
        }
        InitialLayout::Explicit { ellipses } => {
            if ellipses.len() != labels.len() {
                return Err(LayoutError::InitialLayoutMismatch {
                    expected: labels.len(),
                    found: ellipses.len(),
                });
            }
            let mut params: Vec<Option<EllipseParams>> = vec![None; labels.len()];
            for e in ellipses {
                let i = labels
                    .iter()
                    .position(|l| *l == e.label)
                    .ok_or_else(|| LayoutError::UnknownLabel {
                        label: e.label.clone(),
                    })?;
                params[i] = Some(e.params);
            }
            params
                .into_iter()
                .zip(labels)
                .map(|(p, label)| {
                    p.ok_or_else(|| LayoutError::UnknownLabel {
                        label: label.clone(),
                    })
                })
                .collect()
        }
    }
}

/// For each ellipse, the lowest index with exactly the same desired-zone
/// membership.
fn duplicate_groups(n: usize, desired: &[DesiredZone]) -> Vec<usize> {
    let mut first_with: HashMap<Vec<usize>, usize> = HashMap::new();
    (0..n)
        .map(|i| {
            let membership: Vec<usize> = desired
                .iter()
                .enumerate()
                .filter(|(_, z)| z.key.contains(i))
                .map(|(zi, _)| zi)
                .collect();
            *first_with.entry(membership).or_insert(i)
        })
        .collect()
}

/// Build a diagram from `(labels, proportion)` zones and explicit geometry.
#[cfg(test)]
pub(crate) fn test_diagram(zones: &[(&[&str], f64)], ellipses: &[(&str, EllipseParams)]) -> Diagram {
    use crate::types::{LabeledEllipse, ZoneSpec};

    let spec = DiagramSpec {
        zones: zones
            .iter()
            .map(|(labels, proportion)| ZoneSpec {
                labels: labels.iter().map(|l| l.to_string()).collect(),
                proportion: *proportion,
            })
            .collect(),
    };
    let initial = InitialLayout::Explicit {
        ellipses: ellipses
            .iter()
            .map(|(label, params)| LabeledEllipse {
                label: label.to_string(),
                params: *params,
            })
            .collect(),
    };
    Diagram::from_spec(&spec, &initial, 0).expect("test diagram")
}

#[cfg(test)]
pub(crate) fn circle(x: f64, y: f64, r: f64) -> EllipseParams {
    EllipseParams {
        x,
        y,
        a: r,
        b: r,
        rotation: 0.0,
    }
}

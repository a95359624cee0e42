//! Data types for the layout engine's JSON interchange format.
//!
//! Every struct here derives Serialize + Deserialize. Tunable constants
//! carry serde default functions so callers only send what they override.

use serde::{Deserialize, Serialize};

use crate::fitness::FitnessComponents;
use crate::geometry::{EllipseParams, Point};
use crate::report::{FitTransform, ZoneRow};

// -- Specification -------------------------------------------------

/// One desired zone: the labels whose intersection it is and its share of
/// the total area. Proportions need not sum to 1; they are rescaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub labels: Vec<String>,
    pub proportion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiagramSpec {
    #[serde(default)]
    pub zones: Vec<ZoneSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledEllipse {
    pub label: String,
    #[serde(flatten)]
    pub params: EllipseParams,
}

/// Where ellipses start before optimization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialLayout {
    /// Every ellipse a circle of its target area centred at (1, 1).
    #[default]
    Stacked,
    /// Circles with centres drawn uniformly from `[0, max_x) x [0, max_y)`.
    Random { max_x: f64, max_y: f64 },
    /// Caller-supplied geometry for every label.
    Explicit { ellipses: Vec<LabeledEllipse> },
}

// -- Tuning --------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    HillClimbing,
    SimulatedAnnealing,
}

fn default_center_shift() -> f64 {
    0.13
}
fn default_radius_length() -> f64 {
    0.03
}
fn default_angle() -> f64 {
    0.1
}

/// Step sizes for the move vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveSettings {
    #[serde(default = "default_center_shift")]
    pub center_shift: f64,
    #[serde(default = "default_radius_length")]
    pub radius_length: f64,
    #[serde(default = "default_angle")]
    pub angle: f64,
}

impl Default for MoveSettings {
    fn default() -> Self {
        Self {
            center_shift: 0.13,
            radius_length: 0.03,
            angle: 0.1,
        }
    }
}

fn default_initial_temperature() -> f64 {
    0.75
}
fn default_cool_down() -> f64 {
    0.8
}
fn default_max_iterations() -> u32 {
    45
}
fn default_temperature_iterations() -> u32 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingSettings {
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    /// Multiplier applied to the temperature after each temperature level.
    #[serde(default = "default_cool_down")]
    pub cool_down: f64,
    /// Number of temperature levels.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Steps taken at each temperature level.
    #[serde(default = "default_temperature_iterations")]
    pub temperature_iterations: u32,
}

impl Default for AnnealingSettings {
    fn default() -> Self {
        Self {
            initial_temperature: 0.75,
            cool_down: 0.8,
            max_iterations: 45,
            temperature_iterations: 15,
        }
    }
}

fn default_zone_area_difference_weight() -> f64 {
    16.35
}
fn default_unwanted_zone_weight() -> f64 {
    0.1
}
fn default_split_zone_weight() -> f64 {
    0.0
}
fn default_missing_one_label_zone_weight() -> f64 {
    27.6
}
fn default_missing_two_or_more_label_zone_weight() -> f64 {
    12.35
}
fn default_unwanted_expanded_overlap_weight() -> f64 {
    3.6
}
fn default_circle_distortion_weight() -> f64 {
    0.0
}

/// Per-component weights applied after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    #[serde(default = "default_zone_area_difference_weight")]
    pub zone_area_difference: f64,
    #[serde(default = "default_unwanted_zone_weight")]
    pub unwanted_zone: f64,
    #[serde(default = "default_circle_distortion_weight")]
    pub circle_distortion: f64,
    #[serde(default = "default_split_zone_weight")]
    pub split_zone: f64,
    #[serde(default = "default_missing_one_label_zone_weight")]
    pub missing_one_label_zone: f64,
    #[serde(default = "default_missing_two_or_more_label_zone_weight")]
    pub missing_two_or_more_label_zone: f64,
    #[serde(default = "default_unwanted_expanded_overlap_weight")]
    pub unwanted_expanded_overlap: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            zone_area_difference: 16.35,
            unwanted_zone: 0.1,
            circle_distortion: 0.0,
            split_zone: 0.0,
            missing_one_label_zone: 27.6,
            missing_two_or_more_label_zone: 12.35,
            unwanted_expanded_overlap: 3.6,
        }
    }
}

impl FitnessWeights {
    /// Weights in `FitnessComponents::NAMES` order.
    pub fn as_array(&self) -> [f64; FitnessComponents::COUNT] {
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

    /// Every component weighted 1.
    pub fn uniform() -> Self {
        Self {
            zone_area_difference: 1.0,
            unwanted_zone: 1.0,
            circle_distortion: 1.0,
            split_zone: 1.0,
            missing_one_label_zone: 1.0,
            missing_two_or_more_label_zone: 1.0,
            unwanted_expanded_overlap: 1.0,
        }
    }
}

fn default_samples_per_dimension() -> u32 {
    50
}
fn default_padding_factor() -> f64 {
    0.15
}
fn default_raster_cache_capacity() -> usize {
    4096
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Samples across the smaller side of the padded bounding box when the
    /// step is frozen at the start of a run.
    #[serde(default = "default_samples_per_dimension")]
    pub samples_per_dimension: u32,
    /// Padding around each ellipse, as a fraction of the largest radius of
    /// any ellipse, used for expanded-zone detection.
    #[serde(default = "default_padding_factor")]
    pub padding_factor: f64,
    /// Build zone bitmaps during optimization so split zones are scored.
    #[serde(default)]
    pub track_split_zones: bool,
    /// Rasters kept before the cache is cleared.
    #[serde(default = "default_raster_cache_capacity")]
    pub raster_cache_capacity: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            samples_per_dimension: 50,
            padding_factor: 0.15,
            track_split_zones: false,
            raster_cache_capacity: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OptimizerSettings {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub moves: MoveSettings,
    #[serde(default)]
    pub annealing: AnnealingSettings,
    #[serde(default)]
    pub weights: FitnessWeights,
    #[serde(default)]
    pub sampler: SamplerSettings,
    /// Hill climbing: on convergence, switch once to the extended move set
    /// and keep going instead of finishing.
    #[serde(default)]
    pub extended_moves_on_convergence: bool,
    /// Optional external step budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
}

// -- Engine I/O ----------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutParams {
    #[serde(default)]
    pub seed: u64,
    pub diagram: DiagramSpec,
    #[serde(default)]
    pub initial_layout: InitialLayout,
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    /// Canvas to fit the finished layout into, if the caller renders it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasSize>,
    /// Compute a label anchor inside every zone of the finished layout.
    #[serde(default = "default_label_positions")]
    pub label_positions: bool,
}

fn default_label_positions() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneAnchor {
    pub zone: String,
    pub position: Point,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResult {
    pub ellipses: Vec<LabeledEllipse>,
    pub zones: Vec<ZoneRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_positions: Vec<ZoneAnchor>,
    /// Sum of |actual - desired| over all zones, in percent.
    pub total_area_difference: f64,
    pub stress: f64,
    pub fitness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<FitnessComponents>,
    #[serde(default)]
    pub steps_completed: u32,
    #[serde(default)]
    pub evaluated_solutions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<FitTransform>,
}

// -- Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_minimal_json() {
        let json = r#"{
            "diagram": {
                "zones": [
                    {"labels": ["a"], "proportion": 0.5},
                    {"labels": ["b"], "proportion": 0.5}
                ]
            }
        }"#;
        let params: LayoutParams = serde_json::from_str(json).expect("deserialize");
        assert_eq!(params.seed, 0);
        assert_eq!(params.diagram.zones.len(), 2);
        assert_eq!(params.optimizer.strategy, Strategy::HillClimbing);
        assert_eq!(params.optimizer.moves.center_shift, 0.13);
        assert_eq!(params.optimizer.annealing.max_iterations, 45);
        assert_eq!(params.optimizer.weights.missing_one_label_zone, 27.6);
        assert!(matches!(params.initial_layout, InitialLayout::Stacked));

        let out = serde_json::to_string(&params).expect("serialize");
        let _: LayoutParams = serde_json::from_str(&out).expect("re-deserialize");
    }

    #[test]
    fn partial_weights_keep_defaults() {
        let json = r#"{"zone_area_difference": 2.0}"#;
        let w: FitnessWeights = serde_json::from_str(json).expect("deserialize");
        assert_eq!(w.zone_area_difference, 2.0);
        assert_eq!(w.unwanted_zone, 0.1);
        assert_eq!(w.unwanted_expanded_overlap, 3.6);
    }

    #[test]
    fn strategy_and_layout_tags() {
        let json = r#"{
            "seed": 3,
            "diagram": {"zones": [{"labels": ["a"], "proportion": 1.0}]},
            "initial_layout": {"kind": "explicit", "ellipses": [
                {"label": "a", "x": 0.0, "y": 0.0, "a": 1.0, "b": 0.5, "rotation": 0.2}
            ]},
            "optimizer": {"strategy": "simulated_annealing", "max_steps": 10}
        }"#;
        let params: LayoutParams = serde_json::from_str(json).expect("deserialize");
        assert_eq!(params.optimizer.strategy, Strategy::SimulatedAnnealing);
        assert_eq!(params.optimizer.max_steps, Some(10));
        match params.initial_layout {
            InitialLayout::Explicit { ellipses } => {
                assert_eq!(ellipses[0].label, "a");
                assert_eq!(ellipses[0].params.b, 0.5);
            }
            other => panic!("unexpected layout {other:?}"),
        }
    }
}

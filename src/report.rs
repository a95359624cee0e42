//! Zone area report and canvas fitting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::diagram::Diagram;
use crate::geometry::BoundingBox;
use crate::sampler::Sample;
use crate::zone::ZoneKey;

/// Fixed label padding in canvas units, before the relative margin.
const CANVAS_FONT_PADDING: f64 = 12.0;
const CANVAS_MARGIN_FRACTION: f64 = 0.02;

/// One zone of the area table. Proportions are fractions of the covered
/// area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRow {
    pub zone: String,
    pub desired: f64,
    pub actual: f64,
    pub difference: f64,
    /// Present in the layout but not wanted.
    #[serde(default)]
    pub unwanted: bool,
    /// Wanted but absent from the layout.
    #[serde(default)]
    pub missing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub rows: Vec<ZoneRow>,
    /// Sum of row differences, in percent.
    pub total_area_difference: f64,
}

impl ZoneReport {
    /// Rows for every desired or sampled zone, largest desired share first.
    pub fn build(diagram: &Diagram, sample: &Sample) -> Self {
        let desired = diagram.desired_table();
        let mut keys: Vec<ZoneKey> = desired.keys().chain(sample.zones.keys()).copied().collect();
        keys.sort_unstable();
        keys.dedup();

        let mut rows: Vec<ZoneRow> = keys
            .into_iter()
            .filter(|k| !k.is_empty())
            .map(|key| {
                let want = desired.get(&key).copied().unwrap_or(0.0);
                let actual = sample.proportion(key);
                ZoneRow {
                    zone: diagram.zone_name(key),
                    desired: want,
                    actual,
                    difference: (want - actual).abs(),
                    unwanted: want == 0.0,
                    missing: want != 0.0 && actual == 0.0,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.desired
                .partial_cmp(&a.desired)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.zone.cmp(&b.zone))
        });

        let total_area_difference = rows.iter().map(|r| r.difference).sum::<f64>() * 100.0;
        Self {
            rows,
            total_area_difference,
        }
    }

    /// CSV with percentages and a trailing total line.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("Zone,Desired,Actual,Difference\n");
        for row in &self.rows {
            out.push_str(&format!(
                "\"{}\",{},{},{}\n",
                row.zone,
                row.desired * 100.0,
                row.actual * 100.0,
                row.difference * 100.0
            ));
        }
        out.push_str(&format!("Total:,,,{}\n", self.total_area_difference));
        out
    }
}

/// Scale and translation mapping layout coordinates onto a canvas:
/// `canvas = (layout + translate) * scaling`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitTransform {
    pub scaling: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

/// Fit `bounds` inside a `width` x `height` canvas, centred, leaving room
/// for labels around the edge. `None` for an empty box or canvas.
pub fn fit_to_canvas(bounds: &BoundingBox, width: f64, height: f64) -> Option<FitTransform> {
    let padding = CANVAS_FONT_PADDING + width.min(height) * CANVAS_MARGIN_FRACTION;
    let desired_width = width - 2.0 * padding;
    let desired_height = height - 2.0 * padding;
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 || desired_width <= 0.0 || desired_height <= 0.0 {
        return None;
    }
    let scaling = (desired_height / bounds.height()).min(desired_width / bounds.width());
    let centre = bounds.centre();
    Some(FitTransform {
        scaling,
        translate_x: (width / 2.0) / scaling - centre.x,
        translate_y: (height / 2.0) / scaling - centre.y,
    })
}

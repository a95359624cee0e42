//! One-shot layout: build the diagram, optimize it, report on it.

use std::time::Duration;

use crate::diagram::Diagram;
use crate::error::LayoutError;
use crate::optimizer::Optimizer;
use crate::report::{fit_to_canvas, ZoneReport};
use crate::sampler::SampleOptions;
use crate::stress::venneuler_stress;
use crate::types::{LabeledEllipse, LayoutParams, LayoutResult, ZoneAnchor};

pub fn layout(params: &LayoutParams) -> Result<LayoutResult, LayoutError> {
    let diagram = Diagram::from_spec(&params.diagram, &params.initial_layout, params.seed)?;
    log::debug!(
        "layout of {} ellipses and {} zones",
        diagram.len(),
        diagram.desired_zones().len()
    );

    let mut optimizer = Optimizer::new(diagram, params.optimizer.clone(), params.seed);
    optimizer.run_to_completion(Duration::ZERO, |_, _| {}, || {});

    let options = if params.label_positions {
        SampleOptions::full()
    } else {
        SampleOptions::with_fragments()
    };
    let sample = optimizer.sample(options);
    let stats = optimizer.stats();
    let fitness = optimizer.fitness();
    let components = *optimizer.components();
    let diagram = optimizer.into_diagram();
    // An empty layout has no fitness vector.
    let components = (!diagram.is_empty()).then_some(components);

    let report = ZoneReport::build(&diagram, &sample);
    let label_positions = sample
        .zones
        .iter()
        .filter_map(|(key, zone)| {
            zone.label_position.map(|position| ZoneAnchor {
                zone: diagram.zone_name(*key),
                position,
            })
        })
        .collect();
    let geometry = diagram.params();
    let stress = venneuler_stress(&geometry, diagram.desired_table());
    let transform = params.canvas.and_then(|canvas| {
        sample
            .bounding_box
            .and_then(|bb| fit_to_canvas(&bb, canvas.width, canvas.height))
    });

    let ellipses = diagram
        .ellipses()
        .iter()
        .map(|e| LabeledEllipse {
            label: e.label.clone(),
            params: e.params,
        })
        .collect();

    Ok(LayoutResult {
        ellipses,
        zones: report.rows,
        label_positions,
        total_area_difference: report.total_area_difference,
        stress,
        fitness,
        components,
        steps_completed: stats.steps,
        evaluated_solutions: stats.evaluated_solutions,
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanvasSize, DiagramSpec, InitialLayout, OptimizerSettings, ZoneSpec};

    fn params(zones: &[(&[&str], f64)]) -> LayoutParams {
        LayoutParams {
            seed: 1,
            diagram: DiagramSpec {
                zones: zones
                    .iter()
                    .map(|(labels, proportion)| ZoneSpec {
                        labels: labels.iter().map(|l| l.to_string()).collect(),
                        proportion: *proportion,
                    })
                    .collect(),
            },
            initial_layout: InitialLayout::Stacked,
            optimizer: OptimizerSettings {
                max_steps: Some(80),
                ..OptimizerSettings::default()
            },
            canvas: Some(CanvasSize {
                width: 400.0,
                height: 300.0,
            }),
            label_positions: true,
        }
    }

    #[test]
    fn stacked_pair_is_pulled_apart() {
        let result = layout(&params(&[(&["b"], 1.0), (&["a"], 1.0), (&["a", "b"], 0.5)])).expect("layout");
        let labels: Vec<&str> = result.ellipses.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["a", "b"]);
        assert!(result.steps_completed > 0);
        assert!(result.evaluated_solutions > result.steps_completed as u64);

        // Starting fully stacked, "a" and "b" alone are both missing;
        // after optimizing every desired zone shows up.
        for row in &result.zones {
            assert!(!row.missing, "{} missing", row.zone);
        }
        assert_eq!(result.label_positions.len(), result.zones.iter().filter(|r| r.actual > 0.0).count());
        assert!(result.stress >= 0.0);
        assert!(result.transform.is_some());
        assert!(result.components.is_some());
    }

    #[test]
    fn zero_proportions_give_empty_layout() {
        let result = layout(&params(&[(&["a"], 0.0), (&["a", "b"], 0.0)])).expect("layout");
        assert!(result.ellipses.is_empty());
        assert!(result.zones.is_empty());
        assert!(result.label_positions.is_empty());
        assert!(result.components.is_none());
        assert!(result.transform.is_none());
        assert_eq!(result.steps_completed, 0);
        assert_eq!(result.stress, 0.0);
    }

    #[test]
    fn invalid_spec_is_an_error() {
        let err = layout(&params(&[(&["a"], -1.0)])).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidProportion { .. }));
    }
}

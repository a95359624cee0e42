//! Area-proportional Euler diagram layout with ellipses.
//!
//! The engine places one ellipse per label so that every combination of
//! overlapping ellipses covers the requested share of the total area. It
//! samples zone areas on a grid, scores layouts with a weighted,
//! normalized fitness and improves them by hill climbing or simulated
//! annealing.
//!
//! [`layout_json`] takes a JSON string (layout params) and returns a JSON
//! string (layout result). With the `python` feature the same function is
//! importable from Python.

pub mod annealing;
pub mod diagram;
pub mod error;
pub mod fitness;
pub mod fragments;
pub mod geometry;
pub mod layout;
pub mod moves;
pub mod optimizer;
pub mod prng;
pub mod raster;
pub mod report;
pub mod sampler;
pub mod stress;
pub mod types;
pub mod zone;

pub use error::LayoutError;
pub use layout::layout;

/// Run a layout from the JSON params schema, returning the JSON result.
pub fn layout_json(params_json: &str) -> Result<String, LayoutError> {
    let params: types::LayoutParams = serde_json::from_str(params_json)?;
    let result = layout::layout(&params)?;
    Ok(serde_json::to_string(&result)?)
}

#[cfg(feature = "python")]
mod python {
    use pyo3::prelude::*;

    /// Run the layout engine.
    ///
    /// Takes a JSON string matching the layout params schema and returns a
    /// JSON string matching the layout result schema.
    #[pyfunction]
    fn layout_json(params_json: &str) -> PyResult<String> {
        super::layout_json(params_json).map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("layout failed: {e}"))
        })
    }

    /// Euler diagram layout engine, importable from Python.
    #[pymodule]
    fn edeap_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(layout_json, m)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let json = r#"{
            "seed": 2,
            "diagram": {"zones": [
                {"labels": ["a"], "proportion": 0.4},
                {"labels": ["b"], "proportion": 0.4},
                {"labels": ["a", "b"], "proportion": 0.2}
            ]},
            "optimizer": {"max_steps": 10},
            "label_positions": false
        }"#;
        let out = layout_json(json).expect("layout");
        let result: types::LayoutResult = serde_json::from_str(&out).expect("result json");
        assert_eq!(result.ellipses.len(), 2);
        assert!(result.steps_completed <= 10);
        assert!(result.label_positions.is_empty());
        assert!(result.components.is_some());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(layout_json("{"), Err(LayoutError::Json(_))));
        let no_labels = r#"{"diagram": {"zones": [{"labels": [], "proportion": 0.5}]}}"#;
        assert!(matches!(layout_json(no_labels), Err(LayoutError::EmptyZone)));
    }

    #[test]
    fn zero_proportions_give_empty_result() {
        let out = layout_json(r#"{"diagram": {"zones": [{"labels": ["a"], "proportion": 0.0}]}}"#)
            .expect("empty layout");
        let result: types::LayoutResult = serde_json::from_str(&out).expect("result json");
        assert!(result.ellipses.is_empty());
        assert!(result.zones.is_empty());
        assert!(result.components.is_none());
    }
}

//! Errors raised while turning caller input into a `Diagram`.
//!
//! Once a diagram has been built the layout core is infallible.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("zone with no labels in specification")]
    EmptyZone,
    #[error("zone \"{zone}\" has invalid proportion {value}")]
    InvalidProportion { zone: String, value: f64 },
    #[error("zone \"{zone}\" is specified more than once")]
    DuplicateZone { zone: String },
    #[error("label \"{label}\" appears twice in zone \"{zone}\"")]
    RepeatedLabel { zone: String, label: String },
    #[error("{count} contours exceeds the supported maximum of {max}")]
    TooManyEllipses { count: usize, max: usize },
    #[error("initial layout has {found} ellipses, specification needs {expected}")]
    InitialLayoutMismatch { expected: usize, found: usize },
    #[error("initial layout refers to unknown label \"{label}\"")]
    UnknownLabel { label: String },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

//! Move vocabulary for the local search.
//!
//! A move maps one ellipse's parameters to a candidate; nothing is changed
//! in place. Resizing adjusts `a` and recomputes `b` so the ellipse keeps
//! its target area.

use std::f64::consts::PI;

use crate::geometry::{normalize_rotation, EllipseParams};
use crate::types::MoveSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    RightX,
    LeftX,
    UpY,
    DownY,
    GrowA,
    ShrinkA,
    RotateForward,
    RotateBack,
    GrowARotateForward,
    ShrinkARotateForward,
    GrowARotateBack,
    ShrinkARotateBack,
}

/// Hill climbing and annealing draw from the primary vocabulary until the
/// search stalls, then from the extended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovePhase {
    #[default]
    Primary,
    Extended,
}

const PRIMARY: [Move; 8] = [
    Move::RightX,
    Move::LeftX,
    Move::UpY,
    Move::DownY,
    Move::GrowA,
    Move::ShrinkA,
    Move::RotateForward,
    Move::RotateBack,
];

const EXTENDED: [Move; 12] = [
    Move::RightX,
    Move::LeftX,
    Move::UpY,
    Move::DownY,
    Move::GrowA,
    Move::ShrinkA,
    Move::RotateForward,
    Move::RotateBack,
    Move::GrowARotateForward,
    Move::ShrinkARotateForward,
    Move::GrowARotateBack,
    Move::ShrinkARotateBack,
];

impl MovePhase {
    /// Moves of this phase in index order.
    pub fn moves(self) -> &'static [Move] {
        match self {
            MovePhase::Primary => &PRIMARY,
            MovePhase::Extended => &EXTENDED,
        }
    }
}

impl Move {
    /// 1-based index; lower indices win ties.
    pub fn index(self) -> u8 {
        match self {
            Move::RightX => 1,
            Move::LeftX => 2,
            Move::UpY => 3,
            Move::DownY => 4,
            Move::GrowA => 5,
            Move::ShrinkA => 6,
            Move::RotateForward => 7,
            Move::RotateBack => 8,
            Move::GrowARotateForward => 9,
            Move::ShrinkARotateForward => 10,
            Move::GrowARotateBack => 11,
            Move::ShrinkARotateBack => 12,
        }
    }

    /// Rotation alone is meaningless for a circle.
    pub fn is_pure_rotation(self) -> bool {
        matches!(self, Move::RotateForward | Move::RotateBack)
    }

    pub fn applies_to(self, params: &EllipseParams) -> bool {
        !(self.is_pure_rotation() && params.is_circle())
    }

    /// `(dx, dy, da, drotation)` as multiples of the configured step sizes.
    fn deltas(self) -> (f64, f64, f64, f64) {
        match self {
            Move::RightX => (1.0, 0.0, 0.0, 0.0),
            Move::LeftX => (-1.0, 0.0, 0.0, 0.0),
            Move::UpY => (0.0, 1.0, 0.0, 0.0),
            Move::DownY => (0.0, -1.0, 0.0, 0.0),
            Move::GrowA => (0.0, 0.0, 1.0, 0.0),
            Move::ShrinkA => (0.0, 0.0, -1.0, 0.0),
            Move::RotateForward => (0.0, 0.0, 0.0, 1.0),
            Move::RotateBack => (0.0, 0.0, 0.0, -1.0),
            Move::GrowARotateForward => (0.0, 0.0, 1.0, 1.0),
            Move::ShrinkARotateForward => (0.0, 0.0, -1.0, 1.0),
            Move::GrowARotateBack => (0.0, 0.0, 1.0, -1.0),
            Move::ShrinkARotateBack => (0.0, 0.0, -1.0, -1.0),
        }
    }

    /// Candidate parameters, or `None` when the move would collapse `a`.
    pub fn apply(
        self,
        params: &EllipseParams,
        target_area: f64,
        settings: &MoveSettings,
    ) -> Option<EllipseParams> {
        let (dx, dy, da, dr) = self.deltas();
        let mut next = *params;
        next.x += dx * settings.center_shift;
        next.y += dy * settings.center_shift;
        if da != 0.0 {
            next.a += da * settings.radius_length;
            if next.a <= 0.0 {
                return None;
            }
            next.b = target_area / (PI * next.a);
        }
        if dr != 0.0 {
            next.rotation = normalize_rotation(next.rotation + dr * settings.angle);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ellipse() -> EllipseParams {
        EllipseParams {
            x: 0.5,
            y: -0.25,
            a: 1.2,
            b: 0.8,
            rotation: 3.1,
        }
    }

    #[test]
    fn indices_follow_vocabulary_order() {
        let idx: Vec<u8> = MovePhase::Extended.moves().iter().map(|m| m.index()).collect();
        assert_eq!(idx, (1..=12).collect::<Vec<u8>>());
        assert_eq!(MovePhase::Primary.moves().len(), 8);
        assert_eq!(&MovePhase::Extended.moves()[..8], MovePhase::Primary.moves());
    }

    #[test]
    fn resize_preserves_target_area() {
        let e = ellipse();
        let target = e.area();
        let settings = MoveSettings::default();
        for &m in MovePhase::Extended.moves() {
            let next = m.apply(&e, target, &settings).expect("valid move");
            assert!((next.a * next.b * PI - target).abs() < 1e-12, "{m:?}");
        }
    }

    #[test]
    fn rotation_stays_in_half_turn() {
        let settings = MoveSettings::default();
        let mut e = ellipse();
        let target = e.area();
        for _ in 0..200 {
            e = Move::RotateForward.apply(&e, target, &settings).expect("rotation");
            assert!((0.0..PI).contains(&e.rotation), "{}", e.rotation);
        }
        e.rotation = 0.05;
        let back = Move::ShrinkARotateBack.apply(&e, target, &settings).expect("combined");
        assert!((0.0..PI).contains(&back.rotation));
        assert!((back.rotation - (PI - 0.05)).abs() < 1e-12);
    }

    #[test]
    fn collapsing_radius_is_rejected() {
        let e = EllipseParams { a: 0.02, ..ellipse() };
        let settings = MoveSettings::default();
        assert!(Move::ShrinkA.apply(&e, 1.0, &settings).is_none());
        assert!(Move::ShrinkARotateBack.apply(&e, 1.0, &settings).is_none());
        assert!(Move::GrowA.apply(&e, 1.0, &settings).is_some());
    }

    #[test]
    fn translation_leaves_shape() {
        let e = ellipse();
        let settings = MoveSettings::default();
        let next = Move::DownY.apply(&e, e.area(), &settings).expect("move");
        assert_eq!((next.x, next.a, next.b, next.rotation), (e.x, e.a, e.b, e.rotation));
        assert!((next.y - (e.y - settings.center_shift)).abs() < 1e-15);
    }

    #[test]
    fn circles_skip_pure_rotation() {
        let c = EllipseParams { a: 1.0, b: 1.0, ..ellipse() };
        assert!(!Move::RotateForward.applies_to(&c));
        assert!(!Move::RotateBack.applies_to(&c));
        assert!(Move::GrowARotateForward.applies_to(&c));
        assert!(Move::RotateBack.applies_to(&ellipse()));
    }
}

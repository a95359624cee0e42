//! Ellipse geometry: containment, bounding boxes and distances.
//!
//! Ellipses are stored as centre, two radii and a rotation in radians.
//! `radius_a` runs along the rotated x axis, `radius_b` along the rotated
//! y axis.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box, `p1` is the minimum corner and `p2` the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub p1: Point,
    pub p2: Point,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.p2.x - self.p1.x
    }

    pub fn height(&self) -> f64 {
        self.p2.y - self.p1.y
    }

    pub fn centre(&self) -> Point {
        Point::new((self.p1.x + self.p2.x) / 2.0, (self.p1.y + self.p2.y) / 2.0)
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            p1: Point::new(self.p1.x.min(other.p1.x), self.p1.y.min(other.p1.y)),
            p2: Point::new(self.p2.x.max(other.p2.x), self.p2.y.max(other.p2.y)),
        }
    }

    pub fn padded(&self, padding: f64) -> BoundingBox {
        BoundingBox {
            p1: Point::new(self.p1.x - padding, self.p1.y - padding),
            p2: Point::new(self.p2.x + padding, self.p2.y + padding),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseParams {
    pub x: f64,
    pub y: f64,
    pub a: f64,
    pub b: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl EllipseParams {
    /// A circle of the given area centred at (x, y).
    pub fn circle_with_area(x: f64, y: f64, area: f64) -> Self {
        let radius = (area / PI).sqrt();
        Self {
            x,
            y,
            a: radius,
            b: radius,
            rotation: 0.0,
        }
    }

    pub fn centre(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max_radius(&self) -> f64 {
        self.a.max(self.b)
    }

    pub fn is_circle(&self) -> bool {
        self.a == self.b
    }

    pub fn area(&self) -> f64 {
        PI * self.a * self.b
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        point_in_ellipse(x, y, self.x, self.y, self.a, self.b, self.rotation)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        ellipse_bounding_box(self.x, self.y, self.a, self.b, self.rotation)
    }
}

/// Point-in-rotated-ellipse test.
///
/// Points outside the square of half-width `max(rx, ry)` around the centre
/// are rejected before any trigonometry.
pub fn point_in_ellipse(x: f64, y: f64, cx: f64, cy: f64, rx: f64, ry: f64, rot: f64) -> bool {
    let big_r = rx.max(ry);
    if x < cx - big_r || x > cx + big_r || y < cy - big_r || y > cy + big_r {
        return false;
    }

    let dx = x - cx;
    let dy = y - cy;
    let cos = rot.cos();
    let sin = rot.sin();

    let u = cos * dx + sin * dy;
    let v = sin * dx - cos * dy;

    (u * u) / (rx * rx) + (v * v) / (ry * ry) <= 1.0
}

/// Tight axis-aligned bounding box of a rotated ellipse.
pub fn ellipse_bounding_box(cx: f64, cy: f64, rx: f64, ry: f64, rot: f64) -> BoundingBox {
    let acos = rx * rot.cos();
    let bsin = ry * rot.sin();
    let half_w = (acos * acos + bsin * bsin).sqrt();

    let asin = rx * rot.sin();
    let bcos = ry * rot.cos();
    let half_h = (asin * asin + bcos * bcos).sqrt();

    BoundingBox {
        p1: Point::new(cx - half_w, cy - half_h),
        p2: Point::new(cx + half_w, cy + half_h),
    }
}

pub fn distance(p1: Point, p2: Point) -> f64 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}

/// Wrap an angle into `[0, π)`.
pub fn normalize_rotation(rot: f64) -> f64 {
    let r = rot.rem_euclid(PI);
    // rem_euclid can round up to exactly PI for tiny negative inputs
    if r >= PI {
        0.0
    } else {
        r
    }
}

/// Union bounding box of all ellipses, or `None` when there are none.
pub fn union_bounding_box(ellipses: &[EllipseParams]) -> Option<BoundingBox> {
    ellipses
        .iter()
        .map(EllipseParams::bounding_box)
        .reduce(|acc, bb| acc.union(&bb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_is_inside() {
        assert!(point_in_ellipse(2.0, 3.0, 2.0, 3.0, 1.0, 0.5, 0.3));
    }

    #[test]
    fn axis_extremes() {
        // Unrotated: a along x, b along y.
        assert!(point_in_ellipse(1.99, 0.0, 0.0, 0.0, 2.0, 1.0, 0.0));
        assert!(!point_in_ellipse(0.0, 1.5, 0.0, 0.0, 2.0, 1.0, 0.0));
        // Quarter turn swaps the axes.
        assert!(point_in_ellipse(0.0, 1.99, 0.0, 0.0, 2.0, 1.0, PI / 2.0));
        assert!(!point_in_ellipse(1.5, 0.0, 0.0, 0.0, 2.0, 1.0, PI / 2.0));
    }

    #[test]
    fn outside_square_rejected() {
        assert!(!point_in_ellipse(10.0, 0.0, 0.0, 0.0, 2.0, 1.0, 0.7));
    }

    #[test]
    fn bounding_box_unrotated() {
        let bb = ellipse_bounding_box(1.0, 1.0, 2.0, 1.0, 0.0);
        assert!((bb.p1.x - -1.0).abs() < 1e-12);
        assert!((bb.p2.x - 3.0).abs() < 1e-12);
        assert!((bb.p1.y - 0.0).abs() < 1e-12);
        assert!((bb.p2.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bounding_box_quarter_turn() {
        let bb = ellipse_bounding_box(0.0, 0.0, 2.0, 1.0, PI / 2.0);
        assert!((bb.width() - 2.0).abs() < 1e-9);
        assert!((bb.height() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_contains_boundary_samples() {
        let e = EllipseParams {
            x: 0.5,
            y: -0.25,
            a: 1.7,
            b: 0.6,
            rotation: 0.9,
        };
        let bb = e.bounding_box();
        for i in 0..360 {
            let t = (i as f64).to_radians();
            let lx = e.a * t.cos();
            let ly = e.b * t.sin();
            let px = e.x + lx * e.rotation.cos() - ly * e.rotation.sin();
            let py = e.y + lx * e.rotation.sin() + ly * e.rotation.cos();
            assert!(px >= bb.p1.x - 1e-9 && px <= bb.p2.x + 1e-9);
            assert!(py >= bb.p1.y - 1e-9 && py <= bb.p2.y + 1e-9);
        }
    }

    #[test]
    fn distance_345() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn rotation_wraps_into_half_turn() {
        for r in [-0.1, 0.0, 3.2, -7.0, 10.0, PI, -PI, -1e-18] {
            let n = normalize_rotation(r);
            assert!((0.0..PI).contains(&n), "{r} -> {n}");
        }
        assert!((normalize_rotation(-0.1) - (PI - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn circle_with_area_round_trips() {
        let c = EllipseParams::circle_with_area(1.0, 1.0, 0.5);
        assert!(c.is_circle());
        assert!((c.area() - 0.5).abs() < 1e-12);
    }
}

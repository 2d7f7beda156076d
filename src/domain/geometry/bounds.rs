//! Parameter intervals and axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A closed parameter interval `[t0, t1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(rename = "T0", alias = "t0")]
    pub t0: f64,
    #[serde(rename = "T1", alias = "t1")]
    pub t1: f64,
}

impl Interval {
    #[must_use]
    pub const fn new(t0: f64, t1: f64) -> Self {
        Self { t0, t1 }
    }

    /// The unit interval `[0, 1]`.
    #[must_use]
    pub const fn unit() -> Self {
        Self::new(0.0, 1.0)
    }

    /// A full turn `[0, 2π]`.
    #[must_use]
    pub const fn full_turn() -> Self {
        Self::new(0.0, std::f64::consts::TAU)
    }

    /// Signed length `t1 - t0`.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.t1 - self.t0
    }

    /// Map a normalized parameter `s ∈ [0, 1]` into this interval.
    ///
    /// `s == 1.0` returns `t1` exactly.
    #[must_use]
    pub fn parameter_at(&self, s: f64) -> f64 {
        if s >= 1.0 {
            return self.t1;
        }
        self.t0 + s * self.length()
    }

    /// Map a parameter of this interval back to `[0, 1]`.
    #[must_use]
    pub fn normalized_parameter_at(&self, t: f64) -> f64 {
        let len = self.length();
        if len == 0.0 {
            return 0.0;
        }
        (t - self.t0) / len
    }

    /// Whether both ends are finite and `t0 < t1`.
    #[must_use]
    pub fn is_increasing(&self) -> bool {
        self.t0.is_finite() && self.t1.is_finite() && self.t0 < self.t1
    }

    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t0.min(self.t1) && t <= self.t0.max(self.t1)
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::unit()
    }
}

/// An axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "Min")]
    pub min: Point3<f64>,
    #[serde(rename = "Max")]
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Create a box from two corners, correcting inverted axes.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Tight box around a set of points, `None` if there are none.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for point in iter {
            bbox.expand_to_include(point);
        }
        Some(bbox)
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = Point3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Point3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = *self;
        merged.expand_to_include(&other.min);
        merged.expand_to_include(&other.max);
        merged
    }

    /// Union of an iterator of boxes, `None` if it is empty.
    #[must_use]
    pub fn union_all(boxes: impl IntoIterator<Item = Self>) -> Option<Self> {
        boxes.into_iter().reduce(|acc, b| acc.union(&b))
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.coords.iter().chain(self.max.coords.iter()).all(|c| c.is_finite())
    }
}

/// Exact bounding box of a circular arc.
///
/// The arc is `center + radius * (cos θ * x_axis + sin θ * y_axis)` for
/// `θ ∈ angle`; `x_axis` and `y_axis` must be orthonormal. Besides the two
/// end points, each coordinate reaches its extremes where
/// `θ = atan2(y_i, x_i) + kπ`.
#[must_use]
pub fn arc_bounds(
    center: &Point3<f64>,
    x_axis: &Vector3<f64>,
    y_axis: &Vector3<f64>,
    radius: f64,
    angle: Interval,
) -> BoundingBox {
    let point_at = |theta: f64| center + (x_axis * theta.cos() + y_axis * theta.sin()) * radius;
    let (lo, hi) = (angle.t0.min(angle.t1), angle.t0.max(angle.t1));

    let mut bbox = BoundingBox::new(point_at(lo), point_at(hi));
    for axis in 0..3 {
        let phase = y_axis[axis].atan2(x_axis[axis]);
        let first = ((lo - phase) / std::f64::consts::PI).ceil() as i64;
        let last = ((hi - phase) / std::f64::consts::PI).floor() as i64;
        for k in first..=last {
            let theta = (k as f64).mul_add(std::f64::consts::PI, phase);
            bbox.expand_to_include(&point_at(theta));
        }
    }
    bbox
}

/// A unit vector perpendicular to `v`.
#[must_use]
pub fn arbitrary_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());

    let reference = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };

    v.cross(&reference).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_parameter_at_hits_end_exactly() {
        let domain = Interval::new(0.3, 7.1);
        assert_eq!(domain.parameter_at(0.0), 0.3);
        assert_eq!(domain.parameter_at(1.0), 7.1);
        assert_relative_eq!(domain.normalized_parameter_at(3.7), 0.5);
    }

    #[test]
    fn test_from_points() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 5.0, 3.0),
            Point3::new(-2.0, 8.0, 1.0),
        ];
        let bbox = BoundingBox::from_points(points.iter()).unwrap();
        assert_eq!(bbox.min, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(10.0, 8.0, 3.0));
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_full_circle_bounds() {
        let bbox = arc_bounds(
            &Point3::new(1.0, 2.0, 3.0),
            &Vector3::x(),
            &Vector3::y(),
            2.0,
            Interval::full_turn(),
        );
        assert_relative_eq!(bbox.min, Point3::new(-1.0, 0.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(bbox.max, Point3::new(3.0, 4.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_arc_bounds_are_tight() {
        let bbox = arc_bounds(
            &Point3::origin(),
            &Vector3::x(),
            &Vector3::y(),
            1.0,
            Interval::new(0.0, FRAC_PI_2),
        );
        assert_relative_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(bbox.max, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-12);

        let upper = arc_bounds(
            &Point3::origin(),
            &Vector3::x(),
            &Vector3::y(),
            1.0,
            Interval::new(FRAC_PI_2 / 2.0, PI - FRAC_PI_2 / 2.0),
        );
        // Apex at θ = π/2 must be included even though neither end reaches it.
        assert_relative_eq!(upper.max.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_arbitrary_perpendicular() {
        let v = Vector3::new(0.3, -2.0, 0.7);
        let perp = arbitrary_perpendicular(&v);
        assert_relative_eq!(perp.dot(&v), 0.0, epsilon = 1e-12);
        assert_relative_eq!(perp.norm(), 1.0, epsilon = 1e-12);
    }
}

//! Host curve geometry.
//!
//! Every curve is evaluated over its *domain*: the natural parameter range of
//! its shape, or an explicit reparameterization when the host supplies one.

use nalgebra::{Point3, Point4, Vector3};
use serde::{Deserialize, Serialize};

use super::bounds::{arbitrary_perpendicular, Interval};
use crate::domain::EncodeError;

/// Distance under which two points are treated as coincident.
pub const ZERO_TOLERANCE: f64 = 1e-10;

/// A parametric curve as exposed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    #[serde(flatten)]
    pub shape: CurveShape,

    /// Reparameterized domain; the shape's natural domain when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Interval>,
}

/// Curve shapes the host hands over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveShape {
    /// Straight segment; natural domain `[0, length]`.
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    /// Connected segments; natural domain `[0, segment count]`.
    Polyline { points: Vec<Point3<f64>> },
    /// Circular arc; natural domain is the sweep angle in radians.
    Arc {
        center: Point3<f64>,
        normal: Vector3<f64>,
        radius: f64,
        #[serde(default = "Interval::full_turn")]
        angle: Interval,
        /// Direction of angle zero; any perpendicular of `normal` if absent.
        #[serde(default)]
        x_axis: Option<Vector3<f64>>,
    },
    /// Rational B-spline; natural domain `[knots[p], knots[n]]`.
    Nurbs(NurbsCurve),
}

impl Curve {
    #[must_use]
    pub const fn new(shape: CurveShape) -> Self {
        Self {
            shape,
            domain: None,
        }
    }

    #[must_use]
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self::new(CurveShape::Line { start, end })
    }

    /// Reparameterize onto `domain`.
    #[must_use]
    pub const fn with_domain(mut self, domain: Interval) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Check that the curve can be evaluated.
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if let Some(domain) = self.domain {
            if !domain.is_increasing() {
                return Err(EncodeError::NonFinite("curve domain"));
            }
        }

        match &self.shape {
            CurveShape::Line { start, end } => {
                if !is_finite_point(start) || !is_finite_point(end) {
                    return Err(EncodeError::NonFinite("line"));
                }
            }
            CurveShape::Polyline { points } => {
                if points.len() < 2 {
                    return Err(EncodeError::Empty("polyline needs at least two points"));
                }
                if !points.iter().all(is_finite_point) {
                    return Err(EncodeError::NonFinite("polyline"));
                }
            }
            CurveShape::Arc {
                center,
                normal,
                radius,
                angle,
                ..
            } => {
                if !is_finite_point(center)
                    || !radius.is_finite()
                    || *radius <= 0.0
                    || !angle.is_increasing()
                    || angle.length() > std::f64::consts::TAU + ZERO_TOLERANCE
                    || normal.norm() <= ZERO_TOLERANCE
                {
                    return Err(EncodeError::NonFinite("arc"));
                }
            }
            CurveShape::Nurbs(nurbs) => nurbs.validate()?,
        }
        Ok(())
    }

    /// The natural parameter range of the shape.
    #[must_use]
    pub fn natural_domain(&self) -> Interval {
        match &self.shape {
            CurveShape::Line { start, end } => Interval::new(0.0, (end - start).norm()),
            CurveShape::Polyline { points } => {
                Interval::new(0.0, points.len().saturating_sub(1) as f64)
            }
            CurveShape::Arc { angle, .. } => *angle,
            CurveShape::Nurbs(nurbs) => nurbs.domain(),
        }
    }

    /// The parameter range samples are taken over.
    #[must_use]
    pub fn domain(&self) -> Interval {
        self.domain.unwrap_or_else(|| self.natural_domain())
    }

    /// Evaluate the curve at parameter `t` of [`Self::domain`].
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        let s = self.domain().normalized_parameter_at(t).clamp(0.0, 1.0);
        let u = self.natural_domain().parameter_at(s);

        match &self.shape {
            CurveShape::Line { start, end } => {
                let len = (end - start).norm();
                if len <= ZERO_TOLERANCE {
                    *start
                } else {
                    start + (end - start) * (u / len)
                }
            }
            CurveShape::Polyline { points } => {
                let last_segment = points.len().saturating_sub(2);
                let index = (u.floor().max(0.0) as usize).min(last_segment);
                let local = u - index as f64;
                points[index] + (points[index + 1] - points[index]) * local
            }
            CurveShape::Arc {
                center,
                normal,
                radius,
                x_axis,
                ..
            } => {
                let (x, y) = arc_frame(normal, x_axis.as_ref());
                center + (x * u.cos() + y * u.sin()) * *radius
            }
            CurveShape::Nurbs(nurbs) => nurbs.point_at(u),
        }
    }

    /// `count + 1` points at evenly spaced parameters spanning the domain.
    #[must_use]
    pub fn sample(&self, count: usize) -> Vec<Point3<f64>> {
        let domain = self.domain();
        let count = count.max(1);
        (0..=count)
            .map(|i| self.point_at(domain.parameter_at(i as f64 / count as f64)))
            .collect()
    }

    #[must_use]
    pub fn start_point(&self) -> Point3<f64> {
        self.point_at(self.domain().t0)
    }

    #[must_use]
    pub fn end_point(&self) -> Point3<f64> {
        self.point_at(self.domain().t1)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        match &self.shape {
            CurveShape::Line { .. } => false,
            CurveShape::Polyline { points } => {
                points.len() > 2 && (points[0] - points[points.len() - 1]).norm() <= ZERO_TOLERANCE
            }
            CurveShape::Arc { angle, .. } => {
                angle.length().abs() >= std::f64::consts::TAU - ZERO_TOLERANCE
            }
            CurveShape::Nurbs(_) => (self.start_point() - self.end_point()).norm() <= ZERO_TOLERANCE,
        }
    }

    /// Polynomial degree of the curve's NURBS form.
    #[must_use]
    pub const fn degree(&self) -> usize {
        match &self.shape {
            CurveShape::Line { .. } | CurveShape::Polyline { .. } => 1,
            CurveShape::Arc { .. } => 2,
            CurveShape::Nurbs(nurbs) => nurbs.degree,
        }
    }

    /// Arc length of the whole curve.
    #[must_use]
    pub fn length(&self) -> f64 {
        match &self.shape {
            CurveShape::Line { start, end } => (end - start).norm(),
            CurveShape::Polyline { points } => {
                points.windows(2).map(|pair| (pair[1] - pair[0]).norm()).sum()
            }
            CurveShape::Arc { radius, angle, .. } => radius * angle.length().abs(),
            CurveShape::Nurbs(nurbs) => nurbs.length(),
        }
    }
}

/// Orthonormal in-plane axes for an arc.
fn arc_frame(normal: &Vector3<f64>, x_axis: Option<&Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let z = normal.normalize();
    let x = x_axis
        .map(|x| x - z * z.dot(x))
        .filter(|x| x.norm() > ZERO_TOLERANCE)
        .map_or_else(|| arbitrary_perpendicular(&z), |x| x.normalize());
    (x, z.cross(&x))
}

fn is_finite_point(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}

/// Non-uniform rational B-spline curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurbsCurve {
    pub degree: usize,
    pub control_points: Vec<Point3<f64>>,
    /// One weight per control point; all ones when empty.
    #[serde(default)]
    pub weights: Vec<f64>,
    /// Full knot vector of length `control_points + degree + 1`.
    pub knots: Vec<f64>,
}

impl NurbsCurve {
    /// Check weights and knot vector.
    ///
    /// # Errors
    /// Returns `EncodeError::InvalidNurbs` describing the problem.
    pub fn validate(&self) -> Result<(), EncodeError> {
        let n = self.control_points.len();
        let p = self.degree;

        if p == 0 {
            return Err(EncodeError::InvalidNurbs("degree must be at least 1".into()));
        }
        if n <= p {
            return Err(EncodeError::InvalidNurbs(format!(
                "degree {p} needs more than {p} control points, got {n}"
            )));
        }
        if !self.weights.is_empty() && self.weights.len() != n {
            return Err(EncodeError::InvalidNurbs(format!(
                "control points ({n}) and weights ({}) must have same length",
                self.weights.len()
            )));
        }
        if let Some((i, w)) = self
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w <= 0.0)
        {
            return Err(EncodeError::InvalidNurbs(format!("weight {i} is not positive: {w}")));
        }
        let expected_knots = n
            .checked_add(p)
            .and_then(|k| k.checked_add(1))
            .ok_or_else(|| EncodeError::InvalidNurbs(format!("degree {p} is out of range")))?;
        if self.knots.len() != expected_knots {
            return Err(EncodeError::InvalidNurbs(format!(
                "expected {expected_knots} knots, got {}",
                self.knots.len()
            )));
        }
        if self.knots.windows(2).any(|k| !(k[0] <= k[1])) {
            return Err(EncodeError::InvalidNurbs("knot vector not non-decreasing".into()));
        }
        if !self.domain().is_increasing() {
            return Err(EncodeError::InvalidNurbs("empty knot domain".into()));
        }
        if !self.control_points.iter().all(is_finite_point) {
            return Err(EncodeError::NonFinite("NURBS control points"));
        }
        Ok(())
    }

    #[must_use]
    pub fn domain(&self) -> Interval {
        let p = self.degree;
        let n = self.control_points.len();
        match (self.knots.get(p), self.knots.get(n)) {
            (Some(&t0), Some(&t1)) => Interval::new(t0, t1),
            _ => Interval::new(0.0, 0.0),
        }
    }

    fn weight(&self, i: usize) -> f64 {
        self.weights.get(i).copied().unwrap_or(1.0)
    }

    /// Knot span index containing `u`.
    fn find_span(&self, u: f64) -> usize {
        let n = self.control_points.len();
        let p = self.degree;

        if u >= self.knots[n] {
            return n - 1;
        }

        let mut low = p;
        let mut high = n;
        while low < high {
            let mid = (low + high) / 2;
            if self.knots[mid] > u {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low - 1
    }

    /// Non-zero basis functions at `u` for `span`.
    fn basis_functions(&self, span: usize, u: f64) -> Vec<f64> {
        let p = self.degree;
        let mut basis = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        basis[0] = 1.0;

        for j in 1..=p {
            left[j] = u - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - u;

            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                if denom.abs() > 1e-15 {
                    let temp = basis[r] / denom;
                    basis[r] = right[r + 1].mul_add(temp, saved);
                    saved = left[j - r] * temp;
                } else {
                    basis[r] = saved;
                    saved = 0.0;
                }
            }
            basis[j] = saved;
        }
        basis
    }

    /// Evaluate at knot parameter `u`, clamped to the domain.
    #[must_use]
    pub fn point_at(&self, u: f64) -> Point3<f64> {
        let domain = self.domain();
        let u = u.clamp(domain.t0, domain.t1);
        let span = self.find_span(u);
        let basis = self.basis_functions(span, u);

        let mut h = Point4::new(0.0, 0.0, 0.0, 0.0);
        for (i, b) in basis.iter().enumerate() {
            let idx = span - self.degree + i;
            let w = self.weight(idx);
            let cp = &self.control_points[idx];
            h.x += cp.x * w * b;
            h.y += cp.y * w * b;
            h.z += cp.z * w * b;
            h.w += w * b;
        }
        Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
    }

    fn derivative_at(&self, u: f64) -> Vector3<f64> {
        let domain = self.domain();
        let h = 1e-7 * domain.length().max(1.0);
        let hi = (u + h).min(domain.t1);
        let lo = (u - h).max(domain.t0);
        (self.point_at(hi) - self.point_at(lo)) / (hi - lo)
    }

    /// Arc length, integrated span by span with adaptive Simpson.
    #[must_use]
    pub fn length(&self) -> f64 {
        let domain = self.domain();
        self.knots
            .windows(2)
            .filter(|k| k[0] < k[1] && k[0] >= domain.t0 && k[1] <= domain.t1)
            .map(|k| adaptive_length(self, k[0], k[1], 1e-10, 20))
            .sum()
    }
}

fn adaptive_length(curve: &NurbsCurve, a: f64, b: f64, tolerance: f64, max_depth: usize) -> f64 {
    fn simpson(curve: &NurbsCurve, a: f64, b: f64) -> f64 {
        let mid = (a + b) / 2.0;
        let fa = curve.derivative_at(a).norm();
        let fm = curve.derivative_at(mid).norm();
        let fb = curve.derivative_at(b).norm();
        (b - a) / 6.0 * 4.0f64.mul_add(fm, fa + fb)
    }

    fn refine(curve: &NurbsCurve, a: f64, b: f64, tolerance: f64, whole: f64, depth: usize) -> f64 {
        let mid = (a + b) / 2.0;
        let left = simpson(curve, a, mid);
        let right = simpson(curve, mid, b);
        let combined = left + right;

        if depth == 0 || (combined - whole).abs() < 15.0 * tolerance {
            combined + (combined - whole) / 15.0
        } else {
            refine(curve, a, mid, tolerance / 2.0, left, depth - 1)
                + refine(curve, mid, b, tolerance / 2.0, right, depth - 1)
        }
    }

    refine(curve, a, b, tolerance, simpson(curve, a, b), max_depth)
}

//! Host surface geometry.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::bounds::{arbitrary_perpendicular, arc_bounds, BoundingBox, Interval};
use super::curve::ZERO_TOLERANCE;
use crate::domain::EncodeError;

/// Parametric direction of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    U,
    V,
}

/// Untrimmed parametric surfaces.
///
/// Normals follow `∂S/∂u × ∂S/∂v`; for cylinders and spheres that is the
/// outward direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Surface {
    /// Rectangle `u x v` in the plane through `origin`.
    ///
    /// The axes only give directions: they are normalized and `y_axis` is
    /// made perpendicular to `x_axis`, so parameters are world distances.
    Plane {
        origin: Point3<f64>,
        x_axis: Vector3<f64>,
        y_axis: Vector3<f64>,
        u: Interval,
        v: Interval,
    },
    /// Round cylinder around `axis` through `origin`; U is the angle, V the height.
    Cylinder {
        origin: Point3<f64>,
        axis: Vector3<f64>,
        radius: f64,
        #[serde(default = "Interval::full_turn")]
        angle: Interval,
        height: Interval,
    },
    /// Full sphere; U is longitude, V latitude.
    Sphere { center: Point3<f64>, radius: f64 },
}

impl Surface {
    /// Plane patch covering `u x v` along the two axes.
    #[must_use]
    pub fn plane(origin: Point3<f64>, x_axis: Vector3<f64>, y_axis: Vector3<f64>, u: Interval, v: Interval) -> Self {
        Self::Plane {
            origin,
            x_axis,
            y_axis,
            u,
            v,
        }
    }

    /// Check that the surface can be measured.
    ///
    /// # Errors
    /// Returns `EncodeError::NonFinite` for degenerate definitions.
    pub fn validate(&self) -> Result<(), EncodeError> {
        let finite = |p: &Point3<f64>| p.coords.iter().all(|c| c.is_finite());
        let ok = match self {
            Self::Plane {
                origin,
                x_axis,
                y_axis,
                u,
                v,
            } => {
                finite(origin)
                    && u.is_increasing()
                    && v.is_increasing()
                    && x_axis.norm() > ZERO_TOLERANCE
                    && x_axis.normalize().cross(&y_axis.normalize()).norm() > ZERO_TOLERANCE
            }
            Self::Cylinder {
                origin,
                axis,
                radius,
                angle,
                height,
            } => {
                finite(origin)
                    && axis.norm() > ZERO_TOLERANCE
                    && radius.is_finite()
                    && *radius > 0.0
                    && angle.is_increasing()
                    && angle.length() <= TAU + ZERO_TOLERANCE
                    && height.is_increasing()
            }
            Self::Sphere { center, radius } => finite(center) && radius.is_finite() && *radius > 0.0,
        };

        if ok {
            Ok(())
        } else {
            Err(EncodeError::NonFinite("surface"))
        }
    }

    #[must_use]
    pub const fn domain(&self, dir: Direction) -> Interval {
        match (self, dir) {
            (Self::Plane { u, .. }, Direction::U) => *u,
            (Self::Plane { v, .. }, Direction::V) => *v,
            (Self::Cylinder { angle, .. }, Direction::U) => *angle,
            (Self::Cylinder { height, .. }, Direction::V) => *height,
            (Self::Sphere { .. }, Direction::U) => Interval::full_turn(),
            (Self::Sphere { .. }, Direction::V) => Interval::new(-FRAC_PI_2, FRAC_PI_2),
        }
    }

    #[must_use]
    pub fn is_closed(&self, dir: Direction) -> bool {
        match (self, dir) {
            (Self::Cylinder { angle, .. }, Direction::U) => angle.length() >= TAU - ZERO_TOLERANCE,
            (Self::Sphere { .. }, Direction::U) => true,
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_planar(&self) -> bool {
        matches!(self, Self::Plane { .. })
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        match self {
            Self::Plane { u, v, .. } => u.length() * v.length(),
            Self::Cylinder {
                radius,
                angle,
                height,
                ..
            } => radius * angle.length() * height.length(),
            Self::Sphere { radius, .. } => 4.0 * PI * radius * radius,
        }
    }

    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Self::Plane { u, v, .. } => {
                let (x, y) = self.plane_axes();
                let origin = self.plane_origin();
                let corners = [
                    origin + x * u.t0 + y * v.t0,
                    origin + x * u.t1 + y * v.t0,
                    origin + x * u.t0 + y * v.t1,
                    origin + x * u.t1 + y * v.t1,
                ];
                let mut bbox = BoundingBox::new(corners[0], corners[1]);
                bbox.expand_to_include(&corners[2]);
                bbox.expand_to_include(&corners[3]);
                bbox
            }
            Self::Cylinder {
                origin,
                axis,
                radius,
                angle,
                height,
            } => {
                let (x, y, z) = cylinder_frame(axis);
                let bottom = arc_bounds(&(origin + z * height.t0), &x, &y, *radius, *angle);
                let top = arc_bounds(&(origin + z * height.t1), &x, &y, *radius, *angle);
                bottom.union(&top)
            }
            Self::Sphere { center, radius } => {
                let r = Vector3::repeat(*radius);
                BoundingBox::new(center - r, center + r)
            }
        }
    }

    /// Flux of the position field through the surface, `∬ p · n dA`.
    ///
    /// Summed over the faces of a closed shell and divided by three this is
    /// the enclosed volume.
    #[must_use]
    pub fn position_flux(&self) -> f64 {
        match self {
            Self::Plane { .. } => {
                let (x, y) = self.plane_axes();
                let normal = x.cross(&y);
                self.plane_origin().coords.dot(&normal) * self.area()
            }
            Self::Cylinder {
                origin,
                axis,
                radius,
                angle,
                height,
            } => {
                let (x, y, _) = cylinder_frame(axis);
                let swept = x * (angle.t1.sin() - angle.t0.sin()) + y * (angle.t0.cos() - angle.t1.cos());
                radius * height.length() * radius.mul_add(angle.length(), origin.coords.dot(&swept))
            }
            Self::Sphere { radius, .. } => 4.0 * PI * radius.powi(3),
        }
    }

    fn plane_origin(&self) -> Point3<f64> {
        match self {
            Self::Plane { origin, .. } => *origin,
            _ => Point3::origin(),
        }
    }

    /// Orthonormal plane axes; `y` is made perpendicular to `x`.
    fn plane_axes(&self) -> (Vector3<f64>, Vector3<f64>) {
        match self {
            Self::Plane { x_axis, y_axis, .. } => {
                let x = x_axis.normalize();
                let y = (y_axis - x * x.dot(y_axis)).normalize();
                (x, y)
            }
            _ => (Vector3::x(), Vector3::y()),
        }
    }
}

/// Right-handed frame `(x, y, axis)` for a cylinder.
fn cylinder_frame(axis: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let z = axis.normalize();
    let x = arbitrary_perpendicular(&z);
    (x, z.cross(&x), z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Surface {
        Surface::plane(
            Point3::origin(),
            Vector3::x(),
            Vector3::y(),
            Interval::unit(),
            Interval::unit(),
        )
    }

    #[test]
    fn test_plane_measures() {
        let plane = Surface::plane(
            Point3::new(0.0, 0.0, 5.0),
            Vector3::x() * 3.0,
            Vector3::y(),
            Interval::new(1.0, 3.0),
            Interval::new(0.0, 4.0),
        );
        plane.validate().unwrap();
        assert!(plane.is_planar());
        assert!(!plane.is_closed(Direction::U));
        assert_relative_eq!(plane.area(), 8.0);

        let bbox = plane.bounding_box();
        assert_eq!(bbox.min, Point3::new(1.0, 0.0, 5.0));
        assert_eq!(bbox.max, Point3::new(3.0, 4.0, 5.0));
        assert_relative_eq!(plane.position_flux(), 40.0);
    }

    #[test]
    fn test_cylinder_measures() {
        let cylinder = Surface::Cylinder {
            origin: Point3::new(1.0, 1.0, 0.0),
            axis: Vector3::z(),
            radius: 2.0,
            angle: Interval::full_turn(),
            height: Interval::new(0.0, 3.0),
        };
        assert!(cylinder.is_closed(Direction::U));
        assert!(!cylinder.is_closed(Direction::V));
        assert!(!cylinder.is_planar());
        assert_relative_eq!(cylinder.area(), 12.0 * PI, epsilon = 1e-12);

        let bbox = cylinder.bounding_box();
        assert_relative_eq!(bbox.min, Point3::new(-1.0, -1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(bbox.max, Point3::new(3.0, 3.0, 3.0), epsilon = 1e-12);

        // Full lateral surface: r * h * r * 2π, independent of the offset.
        assert_relative_eq!(cylinder.position_flux(), 24.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere_domains() {
        let sphere = Surface::Sphere {
            center: Point3::origin(),
            radius: 1.0,
        };
        assert!(sphere.is_closed(Direction::U));
        assert!(!sphere.is_closed(Direction::V));
        assert_eq!(sphere.domain(Direction::V), Interval::new(-FRAC_PI_2, FRAC_PI_2));
        assert_relative_eq!(sphere.position_flux() / 3.0, 4.0 / 3.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_surface_rejected() {
        let flat = Surface::plane(
            Point3::origin(),
            Vector3::x(),
            Vector3::x(),
            Interval::unit(),
            Interval::unit(),
        );
        assert!(flat.validate().is_err());
        assert!(unit_square().validate().is_ok());
    }

    #[test]
    fn test_cylinder_sweep_past_full_turn_rejected() {
        let cylinder = |angle: Interval| Surface::Cylinder {
            origin: Point3::origin(),
            axis: Vector3::z(),
            radius: 1.0,
            angle,
            height: Interval::unit(),
        };
        assert!(cylinder(Interval::full_turn()).validate().is_ok());
        assert!(matches!(
            cylinder(Interval::new(0.0, 2.0 * TAU)).validate(),
            Err(EncodeError::NonFinite(_))
        ));
        assert!(cylinder(Interval::new(0.0, 1e12)).validate().is_err());
    }
}

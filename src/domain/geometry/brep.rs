//! Boundary representations: faces, edges and vertices of a shell.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::bounds::{BoundingBox, Interval};
use super::curve::Curve;
use super::surface::Surface;
use crate::domain::EncodeError;

/// One face of a boundary representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrepFace {
    pub surface: Surface,
    /// Face normal is opposite to the surface normal.
    #[serde(default)]
    pub reversed: bool,
}

impl BrepFace {
    #[must_use]
    pub const fn new(surface: Surface) -> Self {
        Self {
            surface,
            reversed: false,
        }
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.surface.area()
    }

    fn signed_flux(&self) -> f64 {
        let flux = self.surface.position_flux();
        if self.reversed {
            -flux
        } else {
            flux
        }
    }
}

/// A shell of faces joined along edges.
///
/// `is_solid` and `is_manifold` are topology facts reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brep {
    pub faces: Vec<BrepFace>,
    #[serde(default)]
    pub edges: Vec<Curve>,
    #[serde(default)]
    pub vertices: Vec<Point3<f64>>,
    #[serde(default)]
    pub is_solid: bool,
    #[serde(default = "default_manifold")]
    pub is_manifold: bool,
}

const fn default_manifold() -> bool {
    true
}

impl Brep {
    /// # Errors
    /// Returns an error for a shell without faces or with a degenerate part.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.faces.is_empty() {
            return Err(EncodeError::Empty("brep has no faces"));
        }
        for face in &self.faces {
            face.surface.validate()?;
        }
        for edge in &self.edges {
            edge.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.faces.iter().map(BrepFace::area).sum()
    }

    /// Enclosed volume; only defined for solids.
    #[must_use]
    pub fn volume(&self) -> Option<f64> {
        if !self.is_solid {
            return None;
        }
        let flux: f64 = self.faces.iter().map(BrepFace::signed_flux).sum();
        Some((flux / 3.0).abs())
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::union_all(self.faces.iter().map(|f| f.surface.bounding_box()))
    }

    /// Closed axis-aligned box with outward-facing planar faces.
    #[must_use]
    pub fn box_solid(min: Point3<f64>, max: Point3<f64>) -> Self {
        use nalgebra::Vector3;

        let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
        let span = |a: f64, b: f64| Interval::new(a, b);
        let faces = vec![
            // bottom, -Z
            Surface::plane(Point3::new(0.0, 0.0, min.z), y, x, span(min.y, max.y), span(min.x, max.x)),
            // top, +Z
            Surface::plane(Point3::new(0.0, 0.0, max.z), x, y, span(min.x, max.x), span(min.y, max.y)),
            // front, -Y
            Surface::plane(Point3::new(0.0, min.y, 0.0), x, z, span(min.x, max.x), span(min.z, max.z)),
            // back, +Y
            Surface::plane(Point3::new(0.0, max.y, 0.0), z, x, span(min.z, max.z), span(min.x, max.x)),
            // left, -X
            Surface::plane(Point3::new(min.x, 0.0, 0.0), z, y, span(min.z, max.z), span(min.y, max.y)),
            // right, +X
            Surface::plane(Point3::new(max.x, 0.0, 0.0), y, z, span(min.y, max.y), span(min.z, max.z)),
        ]
        .into_iter()
        .map(BrepFace::new)
        .collect();

        let vertices: Vec<Point3<f64>> = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();

        // Corners differing in exactly one coordinate bit share an edge.
        let edges = (0..8usize)
            .flat_map(|a| [1usize, 2, 4].into_iter().map(move |bit| (a, a | bit)))
            .filter(|(a, b)| a != b)
            .map(|(a, b)| Curve::line(vertices[a], vertices[b]))
            .collect();

        Self {
            faces,
            edges,
            vertices,
            is_solid: true,
            is_manifold: true,
        }
    }

    /// The same box with its top face removed.
    #[must_use]
    pub fn open_box(min: Point3<f64>, max: Point3<f64>) -> Self {
        let mut shell = Self::box_solid(min, max);
        shell.faces.remove(1);
        shell.is_solid = false;
        shell
    }
}

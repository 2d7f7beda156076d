//! Polygon meshes.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::bounds::BoundingBox;
use crate::domain::EncodeError;

/// A triangle or quad referencing mesh vertices by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeshFace {
    Triangle([usize; 3]),
    Quad([usize; 4]),
}

impl MeshFace {
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        match self {
            Self::Triangle(idx) => idx,
            Self::Quad(idx) => idx,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    #[serde(default)]
    pub faces: Vec<MeshFace>,
}

impl Mesh {
    /// # Errors
    /// Returns an error if a face points past the vertex list.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if !self.vertices.iter().all(|p| p.coords.iter().all(|c| c.is_finite())) {
            return Err(EncodeError::NonFinite("mesh vertices"));
        }
        for (face, f) in self.faces.iter().enumerate() {
            if let Some(&vertex) = f.indices().iter().find(|&&i| i >= self.vertices.len()) {
                return Err(EncodeError::MeshIndexOutOfRange {
                    face,
                    vertex,
                    vertex_count: self.vertices.len(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faces_deserialize_by_arity() {
        let faces: Vec<MeshFace> = serde_json::from_str("[[0,1,2],[0,1,2,3]]").unwrap();
        assert_eq!(faces[0], MeshFace::Triangle([0, 1, 2]));
        assert_eq!(faces[1], MeshFace::Quad([0, 1, 2, 3]));
    }

    #[test]
    fn test_out_of_range_index() {
        let mesh = Mesh {
            vertices: vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            faces: vec![MeshFace::Triangle([0, 1, 2]), MeshFace::Triangle([0, 2, 3])],
        };
        assert_eq!(
            mesh.validate(),
            Err(EncodeError::MeshIndexOutOfRange {
                face: 1,
                vertex: 3,
                vertex_count: 3,
            })
        );
    }
}

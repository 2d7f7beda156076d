//! Host geometry object model.
//!
//! This is the read-only view of the source application's document that the
//! encoder consumes. The set of geometry kinds is closed: anything the
//! encoder has no dedicated record for arrives as [`Geometry::Other`].

pub mod bounds;
pub mod brep;
pub mod curve;
pub mod mesh;
pub mod surface;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use bounds::{BoundingBox, Interval};
pub use brep::{Brep, BrepFace};
pub use curve::{Curve, CurveShape, NurbsCurve};
pub use mesh::{Mesh, MeshFace};
pub use surface::{Direction, Surface};

/// Every geometry kind the host exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Curve(Curve),
    Surface(Surface),
    Brep(Brep),
    Mesh(Mesh),
    Other(OtherGeometry),
}

/// Geometry without a dedicated interchange record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OtherGeometry {
    Point { location: Point3<f64> },
    PointCloud { points: Vec<Point3<f64>> },
    TextDot { location: Point3<f64>, text: String },
    /// A kind this crate has no model for, reduced to the points it carried.
    /// Built by the scene loader, never read from or written to JSON.
    #[serde(skip)]
    Unrecognized { kind: String, points: Vec<Point3<f64>> },
}

impl OtherGeometry {
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Self::Point { location } | Self::TextDot { location, .. } => {
                Some(BoundingBox::new(*location, *location))
            }
            Self::PointCloud { points } | Self::Unrecognized { points, .. } => {
                BoundingBox::from_points(points)
            }
        }
    }
}

impl Geometry {
    /// Host object-type name, as the source application reports it.
    #[must_use]
    pub fn object_type(&self) -> &str {
        match self {
            Self::Curve(_) => "Curve",
            Self::Surface(_) => "Surface",
            Self::Brep(brep) if brep.faces.len() == 1 => "Surface",
            Self::Brep(_) => "Brep",
            Self::Mesh(_) => "Mesh",
            Self::Other(OtherGeometry::Point { .. }) => "Point",
            Self::Other(OtherGeometry::PointCloud { .. }) => "PointSet",
            Self::Other(OtherGeometry::TextDot { .. }) => "TextDot",
            Self::Other(OtherGeometry::Unrecognized { kind, .. }) => kind,
        }
    }
}

/// Display color, stored as 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

const fn opaque() -> u8 {
    255
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Packed `0xAARRGGBB` as a signed 32-bit integer.
    #[must_use]
    pub const fn to_argb(self) -> i32 {
        i32::from_be_bytes([self.a, self.r, self.g, self.b])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

/// Per-object attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_layer")]
    pub layer: String,
    #[serde(default)]
    pub color: Color,
}

fn default_layer() -> String {
    "Default".to_string()
}

impl Default for ObjectAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            layer: default_layer(),
            color: Color::default(),
        }
    }
}

/// A document object: identity, attributes and geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostObject {
    pub id: Uuid,
    #[serde(default)]
    pub attributes: ObjectAttributes,
    pub geometry: Geometry,
}

impl HostObject {
    /// New object with a fresh id and default attributes.
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: Uuid::new_v4(),
            attributes: ObjectAttributes::default(),
            geometry,
        }
    }

    #[must_use]
    pub fn on_layer(mut self, layer: impl Into<String>) -> Self {
        self.attributes.layer = layer.into();
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.attributes.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_packs_argb() {
        assert_eq!(Color::rgb(255, 0, 0).to_argb(), 0xFFFF_0000_u32 as i32);
        assert_eq!(Color { r: 1, g: 2, b: 3, a: 0 }.to_argb(), 0x0001_0203);
    }

    #[test]
    fn test_object_type_names() {
        let solid = Geometry::Brep(Brep::box_solid(Point3::origin(), Point3::new(1.0, 1.0, 1.0)));
        assert_eq!(solid.object_type(), "Brep");

        let dot = Geometry::Other(OtherGeometry::TextDot {
            location: Point3::origin(),
            text: "A".into(),
        });
        assert_eq!(dot.object_type(), "TextDot");

        let extrusion = Geometry::Other(OtherGeometry::Unrecognized {
            kind: "extrusion".into(),
            points: vec![Point3::origin()],
        });
        assert_eq!(extrusion.object_type(), "extrusion");
    }

    #[test]
    fn test_scene_object_deserializes() {
        let json = r#"{
            "id": "6f1c1d7e-2a4b-4c1e-9d1a-3b7e2f0c5a11",
            "attributes": { "name": "rail", "layer": "Curves", "color": { "r": 10, "g": 20, "b": 30 } },
            "geometry": { "kind": "curve", "type": "line", "start": [0, 0, 0], "end": [1, 0, 0] }
        }"#;
        let object: HostObject = serde_json::from_str(json).unwrap();
        assert_eq!(object.attributes.layer, "Curves");
        assert_eq!(object.attributes.color.a, 255);
        assert!(matches!(
            object.geometry,
            Geometry::Curve(Curve {
                shape: CurveShape::Line { .. },
                domain: None
            })
        ));
    }
}

//! Interchange document models.
//!
//! These are the records written into a sync folder. Field names are
//! PascalCase on the wire; the geometry payload is flattened into its
//! object next to the `GeometryType` tag.

use chrono::{DateTime, Utc};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geometry::{BoundingBox, Interval};

/// Version of the interchange schema written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Full snapshot of one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportDocument {
    pub format_version: u32,
    pub timestamp: DateTime<Utc>,
    pub target_file: String,
    pub source_file: String,
    pub objects: Vec<ExportedObject>,
}

/// Cheap freshness record written beside the export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncMetadata {
    pub target_file: String,
    pub source_file: String,
    pub last_sync: DateTime<Utc>,
    pub object_count: usize,
}

impl ExportDocument {
    /// Metadata describing this document.
    #[must_use]
    pub fn metadata(&self) -> SyncMetadata {
        SyncMetadata {
            target_file: self.target_file.clone(),
            source_file: self.source_file.clone(),
            last_sync: self.timestamp,
            object_count: self.objects.len(),
        }
    }
}

/// One encoded host object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportedObject {
    pub id: Uuid,
    pub name: String,
    pub layer: String,
    pub object_type: String,
    /// Packed ARGB.
    pub color: i32,
    #[serde(flatten)]
    pub geometry: GeometryPayload,
}

/// Geometry record, tagged by `GeometryType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "GeometryType")]
pub enum GeometryPayload {
    Curve(CurvePayload),
    Surface(SurfacePayload),
    ClosedPolysurface(ClosedPolysurfacePayload),
    OpenPolysurface(OpenPolysurfacePayload),
    Brep(BrepPayload),
    Mesh(MeshPayload),
    Other(OtherPayload),
}

impl GeometryPayload {
    /// The `GeometryType` tag value.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Curve(_) => "Curve",
            Self::Surface(_) => "Surface",
            Self::ClosedPolysurface(_) => "ClosedPolysurface",
            Self::OpenPolysurface(_) => "OpenPolysurface",
            Self::Brep(_) => "Brep",
            Self::Mesh(_) => "Mesh",
            Self::Other(_) => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurvePayload {
    pub points: Vec<Point3<f64>>,
    pub is_closed: bool,
    pub degree: usize,
    pub length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SurfacePayload {
    pub domain_u: Interval,
    pub domain_v: Interval,
    pub is_closed_u: bool,
    pub is_closed_v: bool,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FacePayload {
    pub index: usize,
    pub surface: SurfacePayload,
    pub area: f64,
    pub is_planar: bool,
    pub orientation_reversed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgePayload {
    pub index: usize,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClosedPolysurfacePayload {
    pub is_manifold: bool,
    pub volume: f64,
    pub area: f64,
    pub bounding_box: BoundingBox,
    pub faces: Vec<FacePayload>,
    pub edges: Vec<EdgePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OpenPolysurfacePayload {
    pub faces: Vec<FacePayload>,
    pub is_manifold: bool,
    pub face_count: usize,
    pub edge_count: usize,
    pub vertex_count: usize,
    pub area: f64,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrepPayload {
    pub surface: SurfacePayload,
    pub area: f64,
    pub is_planar: bool,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshFaceKind {
    Triangle,
    Quad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshFacePayload {
    #[serde(rename = "Type")]
    pub kind: MeshFaceKind,
    pub vertices: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeshPayload {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<MeshFacePayload>,
    pub vertex_count: usize,
    pub face_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OtherPayload {
    pub bounding_box: BoundingBox,
}

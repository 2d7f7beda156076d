//! Geometry export encoder.
//!
//! Turns one host object into one interchange record. Dispatch is a single
//! exhaustive match over [`Geometry`]; boundary representations are split
//! into closed, open and single-face records by their topology.

use crate::domain::geometry::{Brep, BrepFace, Curve, Direction, Mesh, MeshFace, OtherGeometry, Surface};
use crate::domain::models::{
    BrepPayload, ClosedPolysurfacePayload, CurvePayload, EdgePayload, FacePayload, MeshFaceKind,
    MeshFacePayload, MeshPayload, OpenPolysurfacePayload, OtherPayload, SurfacePayload,
};
use crate::domain::{EncodeError, ExportedObject, Geometry, GeometryPayload, HostObject};

/// Encoding parameters.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Parameter steps per curve; `curve_samples + 1` points are written.
    pub curve_samples: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { curve_samples: 100 }
    }
}

/// Encode one host object.
///
/// # Errors
/// Returns an `EncodeError` if the geometry is degenerate; the caller skips
/// the object.
pub fn encode(object: &HostObject, options: &EncodeOptions) -> Result<ExportedObject, EncodeError> {
    Ok(ExportedObject {
        id: object.id,
        name: object.attributes.name.clone(),
        layer: object.attributes.layer.clone(),
        object_type: object.geometry.object_type().to_string(),
        color: object.attributes.color.to_argb(),
        geometry: encode_geometry(&object.geometry, options)?,
    })
}

/// Encode geometry alone.
///
/// # Errors
/// See [`encode`].
pub fn encode_geometry(geometry: &Geometry, options: &EncodeOptions) -> Result<GeometryPayload, EncodeError> {
    match geometry {
        Geometry::Curve(curve) => encode_curve(curve, options).map(GeometryPayload::Curve),
        Geometry::Surface(surface) => {
            surface.validate()?;
            Ok(GeometryPayload::Surface(surface_payload(surface)))
        }
        Geometry::Brep(brep) => encode_brep(brep),
        Geometry::Mesh(mesh) => encode_mesh(mesh).map(GeometryPayload::Mesh),
        Geometry::Other(other) => encode_other(other).map(GeometryPayload::Other),
    }
}

fn encode_curve(curve: &Curve, options: &EncodeOptions) -> Result<CurvePayload, EncodeError> {
    curve.validate()?;
    Ok(CurvePayload {
        points: curve.sample(options.curve_samples),
        is_closed: curve.is_closed(),
        degree: curve.degree(),
        length: curve.length(),
    })
}

fn surface_payload(surface: &Surface) -> SurfacePayload {
    SurfacePayload {
        domain_u: surface.domain(Direction::U),
        domain_v: surface.domain(Direction::V),
        is_closed_u: surface.is_closed(Direction::U),
        is_closed_v: surface.is_closed(Direction::V),
        area: surface.area(),
    }
}

fn face_payload(index: usize, face: &BrepFace) -> FacePayload {
    FacePayload {
        index,
        surface: surface_payload(&face.surface),
        area: face.area(),
        is_planar: face.surface.is_planar(),
        orientation_reversed: face.reversed,
    }
}

fn encode_brep(brep: &Brep) -> Result<GeometryPayload, EncodeError> {
    brep.validate()?;
    let bounding_box = brep.bounding_box().ok_or(EncodeError::Empty("brep has no faces"))?;
    let faces = || -> Vec<FacePayload> {
        brep.faces
            .iter()
            .enumerate()
            .map(|(i, f)| face_payload(i, f))
            .collect()
    };

    if let Some(volume) = brep.volume() {
        let edges = brep
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| EdgePayload {
                index,
                start: edge.start_point(),
                end: edge.end_point(),
                length: edge.length(),
            })
            .collect();

        return Ok(GeometryPayload::ClosedPolysurface(ClosedPolysurfacePayload {
            is_manifold: brep.is_manifold,
            volume,
            area: brep.area(),
            bounding_box,
            faces: faces(),
            edges,
        }));
    }

    if brep.faces.len() > 1 {
        return Ok(GeometryPayload::OpenPolysurface(OpenPolysurfacePayload {
            faces: faces(),
            is_manifold: brep.is_manifold,
            face_count: brep.faces.len(),
            edge_count: brep.edges.len(),
            vertex_count: brep.vertices.len(),
            area: brep.area(),
            bounding_box,
        }));
    }

    let face = &brep.faces[0];
    Ok(GeometryPayload::Brep(BrepPayload {
        surface: surface_payload(&face.surface),
        area: face.area(),
        is_planar: face.surface.is_planar(),
        bounding_box,
    }))
}

fn encode_mesh(mesh: &Mesh) -> Result<MeshPayload, EncodeError> {
    mesh.validate()?;
    let faces = mesh
        .faces
        .iter()
        .map(|face| MeshFacePayload {
            kind: match face {
                MeshFace::Triangle(_) => MeshFaceKind::Triangle,
                MeshFace::Quad(_) => MeshFaceKind::Quad,
            },
            vertices: face.indices().to_vec(),
        })
        .collect();

    Ok(MeshPayload {
        vertices: mesh.vertices.clone(),
        faces,
        vertex_count: mesh.vertices.len(),
        face_count: mesh.faces.len(),
    })
}

fn encode_other(other: &OtherGeometry) -> Result<OtherPayload, EncodeError> {
    let bounding_box = other
        .bounding_box()
        .ok_or(EncodeError::Empty("no points to bound"))?;
    if !bounding_box.is_finite() {
        return Err(EncodeError::NonFinite("bounding box"));
    }
    Ok(OtherPayload { bounding_box })
}

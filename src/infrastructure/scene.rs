//! Scene dumps written by the source application.
//!
//! A scene is the host document as JSON: the path of the document it came
//! from and its objects in the host geometry model. Objects are read one at
//! a time; one the geometry model cannot parse is kept as an unrecognized
//! kind with the points it carried, or skipped if it carried none.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::geometry::{ObjectAttributes, OtherGeometry};
use crate::domain::{AppError, Geometry, HostObject, Result};

#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Document the scene was dumped from.
    pub source_file: Option<PathBuf>,
    pub objects: Vec<HostObject>,
    /// Objects dropped because nothing could be read from them.
    pub skipped: usize,
}

impl Scene {
    /// Source path to key target memory by, defaulting to the scene file.
    #[must_use]
    pub fn source_path(&self, scene_path: &Path) -> PathBuf {
        self.source_file
            .clone()
            .unwrap_or_else(|| scene_path.to_path_buf())
    }
}

/// Document shape before objects are interpreted.
#[derive(Deserialize)]
struct RawScene {
    #[serde(default)]
    source_file: Option<PathBuf>,
    #[serde(default)]
    objects: Vec<Value>,
}

/// Load a scene dump.
///
/// # Errors
/// Returns error if the file cannot be read or is not a scene document.
/// Individual objects never fail the load.
pub fn load_scene(path: &Path) -> Result<Scene> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read scene {}", path.display()), e))?;
    let scene = parse_scene(&content).map_err(|e| AppError::Scene {
        message: format!("{}: {e}", path.display()),
    })?;

    tracing::debug!(
        path = %path.display(),
        objects = scene.objects.len(),
        skipped = scene.skipped,
        "Scene loaded"
    );
    Ok(scene)
}

fn parse_scene(content: &str) -> serde_json::Result<Scene> {
    let raw: RawScene = serde_json::from_str(content)?;
    let mut scene = Scene {
        source_file: raw.source_file,
        ..Scene::default()
    };

    for (index, value) in raw.objects.into_iter().enumerate() {
        match read_object(value) {
            Some(object) => scene.objects.push(object),
            None => {
                tracing::warn!(index, "Skipping scene object without readable geometry");
                scene.skipped += 1;
            }
        }
    }
    Ok(scene)
}

fn read_object(value: Value) -> Option<HostObject> {
    let error = match serde_json::from_value::<HostObject>(value.clone()) {
        Ok(object) => return Some(object),
        Err(e) => e,
    };

    let id = value
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let attributes = value
        .get("attributes")
        .and_then(|a| serde_json::from_value::<ObjectAttributes>(a.clone()).ok())
        .unwrap_or_default();

    let geometry = value.get("geometry")?;
    let kind = geometry
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let mut points = Vec::new();
    collect_points(geometry, &mut points);
    if points.is_empty() {
        tracing::debug!(%id, %kind, error = %error, "No points in unreadable geometry");
        return None;
    }

    tracing::warn!(%id, %kind, error = %error, "Unrecognized geometry, keeping its points");
    Some(HostObject {
        id,
        attributes,
        geometry: Geometry::Other(OtherGeometry::Unrecognized { kind, points }),
    })
}

/// Every `[x, y, z]` number triple anywhere inside `value`.
fn collect_points(value: &Value, points: &mut Vec<Point3<f64>>) {
    match value {
        Value::Array(items) => {
            let coords: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if items.len() == 3 && coords.len() == 3 {
                let point = Point3::new(coords[0], coords[1], coords[2]);
                if point.coords.iter().all(|c| c.is_finite()) {
                    points.push(point);
                }
            } else {
                items.iter().for_each(|item| collect_points(item, points));
            }
        }
        Value::Object(fields) => fields.values().for_each(|field| collect_points(field, points)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_scene() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.json");
        fs::write(
            &path,
            r#"{
                "source_file": "/models/bracket.3dm",
                "objects": [
                    { "id": "00000000-0000-0000-0000-000000000001",
                      "geometry": { "kind": "other", "type": "point", "location": [1, 2, 3] } },
                    { "id": "00000000-0000-0000-0000-000000000002",
                      "geometry": { "kind": "mesh", "vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,2]] } }
                ]
            }"#,
        )
        .unwrap();

        let scene = load_scene(&path).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.skipped, 0);
        assert_eq!(scene.source_path(&path), PathBuf::from("/models/bracket.3dm"));
    }

    #[test]
    fn test_source_defaults_to_scene_path() {
        let scene = Scene::default();
        assert_eq!(scene.source_path(Path::new("/tmp/s.json")), PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn test_unknown_kind_does_not_sink_the_scene() {
        let scene = parse_scene(
            r#"{ "objects": [
                { "id": "00000000-0000-0000-0000-000000000001",
                  "geometry": { "kind": "curve", "type": "line", "start": [0, 0, 0], "end": [2, 0, 0] } },
                { "id": "00000000-0000-0000-0000-000000000002",
                  "attributes": { "layer": "Walls" },
                  "geometry": { "kind": "extrusion", "profile": [[0, 0, 0], [1, 0, 0]], "height": [0, 0, 4] } },
                { "geometry": { "kind": "extrusion" } }
            ] }"#,
        )
        .unwrap();

        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.skipped, 1);
        assert!(matches!(scene.objects[0].geometry, Geometry::Curve(_)));

        let salvaged = &scene.objects[1];
        assert_eq!(salvaged.id, Uuid::from_u128(2));
        assert_eq!(salvaged.attributes.layer, "Walls");
        assert_eq!(salvaged.geometry.object_type(), "extrusion");
        let Geometry::Other(OtherGeometry::Unrecognized { points, .. }) = &salvaged.geometry else {
            panic!("expected an unrecognized object");
        };
        assert_eq!(points.len(), 3);
        assert!(points.contains(&Point3::new(0.0, 0.0, 4.0)));
    }

    #[test]
    fn test_malformed_known_kind_keeps_points() {
        let scene = parse_scene(
            r#"{ "objects": [
                { "geometry": { "kind": "mesh", "vertices": [[0, 0, 0], [1, 1, 1]], "faces": "bad" } }
            ] }"#,
        )
        .unwrap();

        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].geometry.object_type(), "mesh");
    }

    #[test]
    fn test_invalid_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scene.json");
        fs::write(&path, r#"{ "objects": 5 }"#).unwrap();
        assert!(matches!(load_scene(&path), Err(AppError::Scene { .. })));
    }
}

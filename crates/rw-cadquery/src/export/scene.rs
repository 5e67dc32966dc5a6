//! Scene JSON for the browser viewer.
//!
//! The payload is a flat JSON array, one element per assembly part:
//!
//! ```json
//! [{
//!   "shape": "<VTKFile ...>",
//!   "color": [1, 0.8, 0, 1],
//!   "position": [0, 0, 0],
//!   "orientation": [0, 0, 0]
//! }]
//! ```
//!
//! `shape` is a VTK XML `PolyData` document of the part's triangles in local
//! coordinates; `orientation` holds XYZ Euler angles in radians.

use std::fmt::Write;

use serde::Serialize;

use crate::error::CadError;
use crate::geometry::{Assembly, Location, Mesh, Part};

#[derive(Debug, Serialize)]
struct SceneElement {
    shape: String,
    color: [f64; 4],
    position: [f64; 3],
    orientation: [f64; 3],
}

impl SceneElement {
    fn from_part(part: &Part<'_>) -> Self {
        let location = Location::from_isometry(&part.placement);
        Self {
            shape: polydata(&part.shape.tessellate()),
            color: part.color.channels(),
            position: location.translation,
            orientation: location.rotation,
        }
    }
}

/// Serialize an assembly as compact scene JSON.
///
/// # Errors
///
/// Returns [`CadError::Json`] if serialization fails.
pub fn export_scene_json(assembly: &Assembly) -> Result<String, CadError> {
    let elements: Vec<SceneElement> = assembly
        .parts()
        .iter()
        .map(SceneElement::from_part)
        .collect();

    tracing::debug!(parts = elements.len(), "Exported scene");
    Ok(serde_json::to_string(&elements)?)
}

/// VTK XML `PolyData` document with ASCII arrays.
fn polydata(mesh: &Mesh) -> String {
    let mut points = String::new();
    for [x, y, z] in &mesh.vertices {
        let _ = write!(points, "{x} {y} {z} ");
    }
    let mut connectivity = String::new();
    let mut offsets = String::new();
    for (i, [a, b, c]) in mesh.triangles.iter().enumerate() {
        let _ = write!(connectivity, "{a} {b} {c} ");
        let _ = write!(offsets, "{} ", (i + 1) * 3);
    }

    format!(
        concat!(
            r#"<?xml version="1.0"?>"#,
            r#"<VTKFile type="PolyData" version="0.1" byte_order="LittleEndian">"#,
            "<PolyData>",
            r#"<Piece NumberOfPoints="{points}" NumberOfVerts="0" NumberOfLines="0" NumberOfStrips="0" NumberOfPolys="{polys}">"#,
            "<Points>",
            r#"<DataArray type="Float64" NumberOfComponents="3" format="ascii">{point_data}</DataArray>"#,
            "</Points>",
            "<Polys>",
            r#"<DataArray type="Int64" Name="connectivity" format="ascii">{connectivity}</DataArray>"#,
            r#"<DataArray type="Int64" Name="offsets" format="ascii">{offsets}</DataArray>"#,
            "</Polys>",
            "</Piece>",
            "</PolyData>",
            "</VTKFile>",
        ),
        points = mesh.vertices.len(),
        polys = mesh.triangles.len(),
        point_data = points.trim_end(),
        connectivity = connectivity.trim_end(),
        offsets = offsets.trim_end(),
    )
}

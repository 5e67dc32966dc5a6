//! Typed values handed back by a geometry kernel.
//!
//! The set is closed: a binding in a script environment is a [`Shape`], a
//! [`Sketch`], an [`Assembly`], or a plain scalar. Exporters only ever see
//! the first three, through [`Geometry`].

mod triangulate;

use std::borrow::Cow;

use nalgebra::{Isometry3, Point3 as NPoint3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

pub(crate) use triangulate::newell_normal;

/// A point in model space.
pub type Point3 = [f64; 3];

/// Default color applied when a bare shape or sketch becomes an assembly.
pub const DEFAULT_COLOR: Rgba = Rgba([1.0, 0.8, 0.0, 1.0]);

/// RGBA color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgba(pub [f64; 4]);

impl Rgba {
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self([r, g, b, a])
    }

    #[must_use]
    pub fn channels(self) -> [f64; 4] {
        self.0
    }
}

impl Default for Rgba {
    fn default() -> Self {
        DEFAULT_COLOR
    }
}

/// A planar face bounded by an outer loop and optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub outer: Vec<Point3>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point3>>,
}

impl Face {
    /// All boundary loops, outer first.
    pub fn loops(&self) -> impl Iterator<Item = &[Point3]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    fn transformed(&self, iso: &Isometry3<f64>) -> Self {
        let map = |points: &[Point3]| -> Vec<Point3> {
            points.iter().map(|p| transform_point(iso, *p)).collect()
        };
        Self {
            outer: map(self.outer.as_slice()),
            holes: self.holes.iter().map(|h| map(h.as_slice())).collect(),
        }
    }
}

/// Triangle tessellation of a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub triangles: Vec<[u32; 3]>,
}

/// A solid or surface, described by its boundary faces.
///
/// Kernels may attach their own tessellation; without one, faces are
/// ear-clipped with their holes. A shape may also carry only a mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub faces: Vec<Face>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Mesh>,
}

impl Shape {
    #[must_use]
    pub fn from_faces(faces: Vec<Face>) -> Self {
        Self { faces, mesh: None }
    }

    /// Faces for edge drawing.
    ///
    /// A mesh-only shape yields one triangular face per mesh triangle;
    /// triangles indexing past the vertex list are skipped.
    #[must_use]
    pub fn boundary_faces(&self) -> Cow<'_, [Face]> {
        let Some(mesh) = self.mesh.as_ref().filter(|_| self.faces.is_empty()) else {
            return Cow::Borrowed(&self.faces);
        };
        let vertex = |i: u32| {
            usize::try_from(i)
                .ok()
                .and_then(|i| mesh.vertices.get(i))
                .copied()
        };
        let faces = mesh
            .triangles
            .iter()
            .filter_map(|&[a, b, c]| {
                Some(Face {
                    outer: vec![vertex(a)?, vertex(b)?, vertex(c)?],
                    holes: Vec::new(),
                })
            })
            .collect();
        Cow::Owned(faces)
    }

    /// Triangle mesh for scene export.
    #[must_use]
    pub fn tessellate(&self) -> Mesh {
        if let Some(mesh) = &self.mesh {
            return mesh.clone();
        }

        let mut mesh = Mesh::default();
        for face in &self.faces {
            let triangles = triangulate::triangulate(face);
            if triangles.is_empty() {
                continue;
            }
            let base = mesh.vertices.len();
            mesh.vertices.extend(face.loops().flatten().copied());
            for triangle in triangles {
                let [Ok(a), Ok(b), Ok(c)] = triangle.map(|i| u32::try_from(base + i)) else {
                    return mesh;
                };
                mesh.triangles.push([a, b, c]);
            }
        }
        mesh
    }
}

/// A 2D sketch: planar faces, usually in the XY plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sketch {
    #[serde(default)]
    pub faces: Vec<Face>,
}

/// Placement of an assembly node relative to its parent.
///
/// `rotation` holds XYZ Euler angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
}

impl Location {
    #[must_use]
    pub fn to_isometry(self) -> Isometry3<f64> {
        let [x, y, z] = self.translation;
        let [rx, ry, rz] = self.rotation;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(rx, ry, rz),
        )
    }

    #[must_use]
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        let t = iso.translation.vector;
        let (rx, ry, rz) = iso.rotation.euler_angles();
        Self {
            translation: [t.x, t.y, t.z],
            rotation: [rx, ry, rz],
        }
    }
}

/// Tree of shapes, each node with its own color and location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Assembly>,
}

impl Assembly {
    /// Single-node assembly holding `shape`.
    #[must_use]
    pub fn from_shape(shape: Shape, color: Rgba) -> Self {
        Self {
            shape: Some(shape),
            color: Some(color),
            ..Self::default()
        }
    }

    /// Every node with a shape, in depth-first order, with world placement.
    ///
    /// Nodes without a color take the nearest ancestor's, else
    /// [`DEFAULT_COLOR`].
    #[must_use]
    pub fn parts(&self) -> Vec<Part<'_>> {
        let mut parts = Vec::new();
        self.collect_parts(&Isometry3::identity(), DEFAULT_COLOR, &mut parts);
        parts
    }

    fn collect_parts<'a>(
        &'a self,
        parent: &Isometry3<f64>,
        inherited: Rgba,
        parts: &mut Vec<Part<'a>>,
    ) {
        let placement = parent * self.location.to_isometry();
        let color = self.color.unwrap_or(inherited);

        if let Some(shape) = &self.shape {
            parts.push(Part {
                shape,
                color,
                placement,
            });
        }
        for child in &self.children {
            child.collect_parts(&placement, color, parts);
        }
    }
}

/// A shape placed in world coordinates by [`Assembly::parts`].
#[derive(Debug, Clone, Copy)]
pub struct Part<'a> {
    pub shape: &'a Shape,
    pub color: Rgba,
    pub placement: Isometry3<f64>,
}

/// Any value bound by a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    Shape(Shape),
    Sketch(Sketch),
    Assembly(Assembly),
    /// Numbers, strings and other non-geometric bindings.
    Scalar {
        #[serde(default)]
        value: serde_json::Value,
    },
}

impl Value {
    /// Geometric view of this value, `None` for scalars.
    #[must_use]
    pub fn as_geometry(&self) -> Option<Geometry<'_>> {
        match self {
            Self::Shape(shape) => Some(Geometry::Shape(shape)),
            Self::Sketch(sketch) => Some(Geometry::Sketch(sketch)),
            Self::Assembly(assembly) => Some(Geometry::Assembly(assembly)),
            Self::Scalar { .. } => None,
        }
    }
}

/// A renderable value selected from an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry<'a> {
    Shape(&'a Shape),
    Sketch(&'a Sketch),
    Assembly(&'a Assembly),
}

impl Geometry<'_> {
    /// Flatten into boundary faces in world coordinates.
    #[must_use]
    pub fn to_compound(&self) -> Compound {
        let faces = match self {
            Self::Shape(shape) => shape.boundary_faces().into_owned(),
            Self::Sketch(sketch) => sketch.faces.clone(),
            Self::Assembly(assembly) => {
                let mut faces = Vec::new();
                for part in assembly.parts() {
                    let boundary = part.shape.boundary_faces();
                    faces.extend(boundary.iter().map(|face| face.transformed(&part.placement)));
                }
                faces
            }
        };
        Compound { faces }
    }
}

/// Boundary faces of a flattened value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    pub faces: Vec<Face>,
}

impl Compound {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.iter().all(|f| f.outer.len() < 2)
    }
}

pub(crate) fn transform_point(iso: &Isometry3<f64>, [x, y, z]: Point3) -> Point3 {
    let p = iso.transform_point(&NPoint3::new(x, y, z));
    [p.x, p.y, p.z]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Axis-aligned box with one corner at the origin.
    pub(crate) fn cuboid(dx: f64, dy: f64, dz: f64) -> Shape {
        let p = |x: f64, y: f64, z: f64| [x * dx, y * dy, z * dz];
        let quad = |a, b, c, d| Face {
            outer: vec![a, b, c, d],
            holes: Vec::new(),
        };
        Shape::from_faces(vec![
            quad(p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)),
            quad(p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)),
            quad(p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)),
            quad(p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.), p(1., 1., 0.)),
            quad(p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.), p(0., 1., 0.)),
            quad(p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)),
        ])
    }

    pub(crate) fn square_sketch(size: f64) -> Sketch {
        Sketch {
            faces: vec![Face {
                outer: vec![[0., 0., 0.], [size, 0., 0.], [size, size, 0.], [0., size, 0.]],
                holes: Vec::new(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::cuboid;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_deserialize_tagged() {
        let json = r#"{"type":"shape","faces":[{"outer":[[0,0,0],[1,0,0],[1,1,0]]}]}"#;
        let value: Value = serde_json::from_str(json).unwrap();

        let Value::Shape(shape) = value else {
            panic!("expected shape");
        };
        assert_eq!(shape.faces.len(), 1);
        assert!(shape.faces[0].holes.is_empty());
    }

    #[test]
    fn test_value_deserialize_scalar() {
        let value: Value = serde_json::from_str(r#"{"type":"scalar","value":10}"#).unwrap();
        assert_eq!(
            value,
            Value::Scalar {
                value: serde_json::json!(10)
            }
        );
        assert!(value.as_geometry().is_none());
    }

    #[test]
    fn test_tessellate_cuboid() {
        let mesh = cuboid(1.0, 1.0, 1.0).tessellate();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangles.len(), 12);
    }

    #[test]
    fn test_tessellate_leaves_holes_open() {
        let plate = Shape::from_faces(vec![Face {
            outer: vec![[0., 0., 1.], [4., 0., 1.], [4., 4., 1.], [0., 4., 1.]],
            holes: vec![vec![[1., 1., 1.], [1., 3., 1.], [3., 3., 1.], [3., 1., 1.]]],
        }]);

        let mesh = plate.tessellate();

        assert_eq!(mesh.vertices.len(), 8);
        let area: f64 = mesh
            .triangles
            .iter()
            .map(|&[a, b, c]| {
                let [pa, pb, pc] = [a, b, c].map(|i| mesh.vertices[i as usize]);
                ((pb[0] - pa[0]) * (pc[1] - pa[1]) - (pb[1] - pa[1]) * (pc[0] - pa[0])) / 2.0
            })
            .sum();
        assert!((area - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_tessellate_prefers_kernel_mesh() {
        let shape = Shape {
            faces: Vec::new(),
            mesh: Some(Mesh {
                vertices: vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
                triangles: vec![[0, 1, 2]],
            }),
        };
        assert_eq!(shape.tessellate().triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_mesh_only_shape_has_triangle_faces() {
        let shape = Shape {
            faces: Vec::new(),
            mesh: Some(Mesh {
                vertices: vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.], [0., 0., 1.]],
                triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 9]],
            }),
        };

        let compound = Geometry::Shape(&shape).to_compound();

        assert_eq!(compound.faces.len(), 2);
        assert_eq!(compound.faces[1].outer, vec![[0., 0., 0.], [1., 0., 0.], [0., 0., 1.]]);
        assert!(!compound.is_empty());
    }

    #[test]
    fn test_parts_compose_locations_and_inherit_color() {
        let red = Rgba::new(1.0, 0.0, 0.0, 1.0);
        let assembly = Assembly {
            color: Some(red),
            location: Location {
                translation: [10.0, 0.0, 0.0],
                rotation: [0.0; 3],
            },
            children: vec![Assembly {
                shape: Some(cuboid(1.0, 1.0, 1.0)),
                location: Location {
                    translation: [0.0, 5.0, 0.0],
                    rotation: [0.0; 3],
                },
                ..Assembly::default()
            }],
            ..Assembly::default()
        };

        let parts = assembly.parts();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].color, red);
        let location = Location::from_isometry(&parts[0].placement);
        assert_eq!(location.translation, [10.0, 5.0, 0.0]);
    }

    #[test]
    fn test_assembly_compound_applies_placement() {
        let assembly = Assembly {
            shape: Some(cuboid(1.0, 1.0, 1.0)),
            location: Location {
                translation: [0.0, 0.0, 3.0],
                rotation: [0.0; 3],
            },
            ..Assembly::default()
        };

        let compound = Geometry::Assembly(&assembly).to_compound();

        assert_eq!(compound.faces.len(), 6);
        assert!(compound.faces[0].outer.iter().all(|p| (p[2] - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_empty_compound() {
        let shape = Shape::default();
        assert!(Geometry::Shape(&shape).to_compound().is_empty());
    }
}

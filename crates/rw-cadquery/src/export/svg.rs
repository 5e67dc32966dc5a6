//! Orthographic SVG projection of boundary faces.
//!
//! Faces are projected along [`VIEW_DIRECTION`]. Edges shared with at least
//! one face turned toward the viewer are drawn solid; edges bounding only
//! faces turned away are drawn as dashed grey hidden lines. Sketches have no
//! back side, so all of their edges are visible.

use std::collections::BTreeMap;
use std::fmt::Write;

use nalgebra::Vector3;

use crate::error::CadError;
use crate::geometry::{Compound, Geometry, Point3, newell_normal};

/// Direction from the model toward the viewer.
pub const VIEW_DIRECTION: Point3 = [-1.75, 1.1, 5.0];

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 240.0;
const MARGIN_LEFT: f64 = 200.0;
const MARGIN_TOP: f64 = 20.0;
const FILL_RATIO: f64 = 0.75;

const VISIBLE_STROKE: &str = "rgb(0, 0, 0)";
const HIDDEN_STROKE: &str = "rgb(160, 160, 160)";

/// Quantized edge endpoints, smaller first.
type EdgeKey = ([i64; 3], [i64; 3]);

/// Render geometry as an SVG document.
///
/// # Errors
///
/// Returns [`CadError::NoRenderableResult`] if the geometry has no edges.
pub fn export_svg(geometry: &Geometry<'_>) -> Result<String, CadError> {
    let compound = geometry.to_compound();
    if compound.is_empty() {
        return Err(CadError::NoRenderableResult);
    }

    let camera = Camera::new(VIEW_DIRECTION);
    let two_sided = matches!(geometry, Geometry::Sketch(_));
    let edges = classify_edges(&compound, &camera, two_sided);
    if edges.is_empty() {
        return Err(CadError::NoRenderableResult);
    }

    let projected: Vec<([f64; 2], [f64; 2], bool)> = edges
        .iter()
        .map(|edge| (camera.project(edge.a), camera.project(edge.b), edge.visible))
        .collect();

    let (min, max) = bounds(projected.iter().flat_map(|(a, b, _)| [*a, *b]));
    let scale = unit_scale(max[0] - min[0], max[1] - min[1]);
    let translate_x = -min[0] + MARGIN_LEFT / scale;
    let translate_y = -max[1] - MARGIN_TOP / scale;

    let mut visible = String::new();
    let mut hidden = String::new();
    for (a, b, is_visible) in &projected {
        let path = if *is_visible { &mut visible } else { &mut hidden };
        let _ = write!(
            path,
            "M{},{} L{},{} ",
            number(a[0]),
            number(a[1]),
            number(b[0]),
            number(b[1])
        );
    }

    let mut svg = String::with_capacity(visible.len() + hidden.len() + 1024);
    svg.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#);
    svg.push('\n');
    let _ = writeln!(
        svg,
        r#"<svg xmlns:svg="http://www.w3.org/2000/svg" xmlns="http://www.w3.org/2000/svg" width="{}" height="{}">"#,
        number(WIDTH),
        number(HEIGHT)
    );
    let _ = writeln!(
        svg,
        r#"  <g transform="scale({s}, -{s}) translate({tx},{ty})" stroke-width="{w}" fill="none">"#,
        s = number(scale),
        tx = number(translate_x),
        ty = number(translate_y),
        w = number(1.0 / scale),
    );
    if !hidden.is_empty() {
        let _ = writeln!(
            svg,
            r#"    <g stroke="{HIDDEN_STROKE}" fill="none" stroke-dasharray="{d},{d}"><path d="{}"/></g>"#,
            hidden.trim_end(),
            d = number(2.0 / scale),
        );
    }
    if !visible.is_empty() {
        let _ = writeln!(
            svg,
            r#"    <g stroke="{VISIBLE_STROKE}" fill="none"><path d="{}"/></g>"#,
            visible.trim_end()
        );
    }
    svg.push_str("  </g>\n");
    write_axes(&mut svg, &camera);
    svg.push_str("</svg>\n");

    tracing::debug!(edges = projected.len(), "Exported SVG");
    Ok(svg)
}

struct Edge {
    a: Point3,
    b: Point3,
    visible: bool,
}

/// Orthonormal view basis with world Z kept upright on screen.
struct Camera {
    toward_viewer: Vector3<f64>,
    right: Vector3<f64>,
    up: Vector3<f64>,
}

impl Camera {
    fn new([x, y, z]: Point3) -> Self {
        let toward_viewer = Vector3::new(x, y, z).normalize();
        let world_up = if toward_viewer.z.abs() > 0.999 {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let right = world_up.cross(&toward_viewer).normalize();
        let up = toward_viewer.cross(&right);
        Self {
            toward_viewer,
            right,
            up,
        }
    }

    fn project(&self, [x, y, z]: Point3) -> [f64; 2] {
        let p = Vector3::new(x, y, z);
        [p.dot(&self.right), p.dot(&self.up)]
    }

    fn faces_viewer(&self, loop_points: &[Point3]) -> bool {
        let normal = newell_normal(loop_points);
        normal.norm() < 1e-12 || normal.dot(&self.toward_viewer) > 0.0
    }
}

fn classify_edges(compound: &Compound, camera: &Camera, two_sided: bool) -> Vec<Edge> {
    let mut index: BTreeMap<EdgeKey, usize> = BTreeMap::new();
    let mut edges: Vec<Edge> = Vec::new();

    for face in &compound.faces {
        let front = two_sided || camera.faces_viewer(&face.outer);
        for points in face.loops() {
            if points.len() < 2 {
                continue;
            }
            let closing = usize::from(points.len() > 2);
            for i in 0..points.len() - 1 + closing {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                let key = edge_key(a, b);
                if key.0 == key.1 {
                    continue;
                }
                match index.get(&key) {
                    Some(&at) => edges[at].visible |= front,
                    None => {
                        index.insert(key, edges.len());
                        edges.push(Edge {
                            a,
                            b,
                            visible: front,
                        });
                    }
                }
            }
        }
    }

    edges
}

#[allow(clippy::cast_possible_truncation)]
fn quantize(p: Point3) -> [i64; 3] {
    p.map(|c| (c * 1e6).round() as i64)
}

fn edge_key(a: Point3, b: Point3) -> EdgeKey {
    let (qa, qb) = (quantize(a), quantize(b));
    if qa <= qb { (qa, qb) } else { (qb, qa) }
}

fn bounds(points: impl Iterator<Item = [f64; 2]>) -> ([f64; 2], [f64; 2]) {
    points.fold(
        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
        |(min, max), p| {
            (
                [min[0].min(p[0]), min[1].min(p[1])],
                [max[0].max(p[0]), max[1].max(p[1])],
            )
        },
    )
}

fn unit_scale(x_len: f64, y_len: f64) -> f64 {
    let candidates = [(WIDTH, x_len), (HEIGHT, y_len)];
    candidates
        .iter()
        .filter(|(_, len)| *len > 1e-9)
        .map(|(size, len)| size / len * FILL_RATIO)
        .reduce(f64::min)
        .unwrap_or(1.0)
}

/// Small axis triad in the lower left corner, in screen pixels.
fn write_axes(svg: &mut String, camera: &Camera) {
    const ORIGIN: [f64; 2] = [30.0, HEIGHT - 30.0];
    const LENGTH: f64 = 20.0;

    svg.push_str(r#"  <g transform="scale(1, -1)" stroke="rgb(0, 0, 255)" fill="none">"#);
    svg.push('\n');
    for (label, axis) in [("X", [1.0, 0.0, 0.0]), ("Y", [0.0, 1.0, 0.0]), ("Z", [0.0, 0.0, 1.0])] {
        let [u, v] = camera.project(axis);
        let end = [ORIGIN[0] + u * LENGTH, -ORIGIN[1] + v * LENGTH];
        let _ = writeln!(
            svg,
            r#"    <line x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
            number(ORIGIN[0]),
            number(-ORIGIN[1]),
            number(end[0]),
            number(end[1]),
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" transform="scale(1, -1)" font-size="10" stroke="none" fill="rgb(0, 0, 255)">{label}</text>"#,
            number(end[0]),
            number(-end[1]),
        );
    }
    svg.push_str("  </g>\n");
}

/// Format a coordinate with at most four decimals.
fn number(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_owned(),
        other => other.to_owned(),
    }
}

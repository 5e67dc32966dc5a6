//! Ear-clipping triangulation of planar faces with holes.
//!
//! Each face is projected onto the coordinate plane most perpendicular to
//! its normal. Holes are bridged into the outer loop through a mutually
//! visible vertex pair, and the resulting single ring is clipped ear by ear.

use nalgebra::Vector3;

use super::{Face, Point3};

const EPSILON: f64 = 1e-12;

type Point2 = [f64; 2];

/// Area-weighted normal of a closed polygon.
pub(crate) fn newell_normal(points: &[Point3]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        normal.x += (a[1] - b[1]) * (a[2] + b[2]);
        normal.y += (a[2] - b[2]) * (a[0] + b[0]);
        normal.z += (a[0] - b[0]) * (a[1] + b[1]);
    }
    normal
}

/// Triangles over the points of `face.loops()`, flattened in order.
///
/// Triangles keep the winding of the outer loop. Degenerate faces yield
/// nothing.
pub(crate) fn triangulate(face: &Face) -> Vec<[usize; 3]> {
    if face.outer.len() < 3 {
        return Vec::new();
    }
    let normal = newell_normal(&face.outer);
    let axis = normal.iamax();
    if normal[axis].abs() < EPSILON {
        return Vec::new();
    }

    // Cyclic axis order keeps a loop counterclockwise about +axis
    // counterclockwise in the plane; mirroring handles -axis.
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let mirror = normal[axis].signum();
    let points: Vec<Point2> = face
        .loops()
        .flatten()
        .map(|p| [p[u] * mirror, p[v]])
        .collect();

    let mut ring: Vec<usize> = (0..face.outer.len()).collect();
    let mut holes = Vec::with_capacity(face.holes.len());
    let mut offset = face.outer.len();
    for hole in &face.holes {
        let mut indices: Vec<usize> = (offset..offset + hole.len()).collect();
        offset += hole.len();
        if indices.len() < 3 {
            continue;
        }
        if signed_area(&indices, &points) > 0.0 {
            indices.reverse();
        }
        holes.push(indices);
    }

    holes.sort_by(|a, b| rightmost(b, &points).total_cmp(&rightmost(a, &points)));
    for k in 0..holes.len() {
        let (bridged, pending) = holes.split_at(k + 1);
        bridge(&mut ring, &bridged[k], pending, &points);
    }

    ear_clip(ring, &points)
}

fn signed_area(ring: &[usize], points: &[Point2]) -> f64 {
    ring_edges(ring)
        .map(|(a, b)| points[a][0] * points[b][1] - points[b][0] * points[a][1])
        .sum::<f64>()
        / 2.0
}

fn rightmost(ring: &[usize], points: &[Point2]) -> f64 {
    ring.iter()
        .map(|&i| points[i][0])
        .fold(f64::NEG_INFINITY, f64::max)
}

fn ring_edges(ring: &[usize]) -> impl Iterator<Item = (usize, usize)> {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

/// Splice `hole` into `ring` through the closest ring vertex its rightmost
/// vertex can see.
fn bridge(ring: &mut Vec<usize>, hole: &[usize], pending: &[Vec<usize>], points: &[Point2]) {
    let Some(start) =
        (0..hole.len()).max_by(|&a, &b| points[hole[a]][0].total_cmp(&points[hole[b]][0]))
    else {
        return;
    };
    let from = hole[start];

    let blocked = |to: usize| {
        let (a, b) = (points[from], points[to]);
        ring_edges(ring.as_slice())
            .chain(ring_edges(hole))
            .chain(pending.iter().flat_map(|h| ring_edges(h)))
            .filter(|&(c, d)| c != from && d != from && c != to && d != to)
            .any(|(c, d)| segments_touch(a, b, points[c], points[d]))
    };

    let mut candidates: Vec<usize> = (0..ring.len()).collect();
    candidates.sort_by(|&a, &b| {
        let (da, db) = (points[ring[a]], points[ring[b]]);
        distance2(points[from], da).total_cmp(&distance2(points[from], db))
    });
    let Some(at) = candidates.into_iter().find(|&i| !blocked(ring[i])) else {
        tracing::debug!("Hole without a visible outer vertex skipped");
        return;
    };

    let to = ring[at];
    let mut spliced: Vec<usize> = hole[start..].iter().chain(&hole[..=start]).copied().collect();
    spliced.push(to);
    let tail = ring.split_off(at + 1);
    ring.extend(spliced);
    ring.extend(tail);
}

fn ear_clip(mut ring: Vec<usize>, points: &[Point2]) -> Vec<[usize; 3]> {
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
    let mut i = 0;
    let mut stalled = 0;

    while ring.len() > 3 {
        let n = ring.len();
        i %= n;
        let corner = [ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]];

        if is_ear(&ring, corner, points) {
            triangles.push(corner);
            ring.remove(i);
            stalled = 0;
        } else if stalled > n {
            // No ear left: drop a zero-area corner, else clip anyway.
            let flat = (0..n).find(|&j| {
                let [a, b, c] = [ring[(j + n - 1) % n], ring[j], ring[(j + 1) % n]];
                orient(points[a], points[b], points[c]).abs() < EPSILON
            });
            if let Some(j) = flat {
                ring.remove(j);
            } else {
                triangles.push(corner);
                ring.remove(i);
            }
            stalled = 0;
        } else {
            i += 1;
            stalled += 1;
        }
    }

    if let [a, b, c] = ring[..]
        && orient(points[a], points[b], points[c]).abs() >= EPSILON
    {
        triangles.push([a, b, c]);
    }
    triangles
}

/// Convex corner with no other ring vertex inside or on it.
fn is_ear(ring: &[usize], [prev, cur, next]: [usize; 3], points: &[Point2]) -> bool {
    let triangle = [points[prev], points[cur], points[next]];
    orient(triangle[0], triangle[1], triangle[2]) > EPSILON
        && !ring
            .iter()
            .filter(|&&p| p != prev && p != cur && p != next)
            .any(|&p| in_triangle(points[p], triangle))
}

fn orient(a: Point2, b: Point2, c: Point2) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn in_triangle(point: Point2, [a, b, c]: [Point2; 3]) -> bool {
    orient(a, b, point) >= -EPSILON
        && orient(b, c, point) >= -EPSILON
        && orient(c, a, point) >= -EPSILON
}

fn distance2(a: Point2, b: Point2) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Whether closed segments `p1 p2` and `q1 q2` share any point.
fn segments_touch(p1: Point2, p2: Point2, q1: Point2, q2: Point2) -> bool {
    let (d1, d2) = (orient(q1, q2, p1), orient(q1, q2, p2));
    let (d3, d4) = (orient(p1, p2, q1), orient(p1, p2, q2));
    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        return true;
    }
    (d1.abs() < EPSILON && on_segment(p1, q1, q2))
        || (d2.abs() < EPSILON && on_segment(p2, q1, q2))
        || (d3.abs() < EPSILON && on_segment(q1, p1, p2))
        || (d4.abs() < EPSILON && on_segment(q2, p1, p2))
}

/// For `point` collinear with `start end`, whether it lies between them.
fn on_segment(point: Point2, start: Point2, end: Point2) -> bool {
    (0..2).all(|axis| {
        point[axis] >= start[axis].min(end[axis]) - EPSILON
            && point[axis] <= start[axis].max(end[axis]) + EPSILON
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lift(ring: &[[f64; 2]]) -> Vec<Point3> {
        ring.iter().map(|&[x, y]| [x, y, 0.0]).collect()
    }

    fn face(outer: &[[f64; 2]], holes: &[&[[f64; 2]]]) -> Face {
        Face {
            outer: lift(outer),
            holes: holes.iter().map(|h| lift(h)).collect(),
        }
    }

    /// Signed areas in the XY plane, one per triangle.
    fn areas(face: &Face, triangles: &[[usize; 3]]) -> Vec<f64> {
        let points: Vec<Point3> = face.loops().flatten().copied().collect();
        triangles
            .iter()
            .map(|&[a, b, c]| {
                let [pa, pb, pc] = [points[a], points[b], points[c]];
                orient([pa[0], pa[1]], [pb[0], pb[1]], [pc[0], pc[1]]) / 2.0
            })
            .collect()
    }

    fn covers(face: &Face, triangles: &[[usize; 3]], [x, y]: [f64; 2]) -> bool {
        let points: Vec<Point2> = face.loops().flatten().map(|p| [p[0], p[1]]).collect();
        triangles.iter().any(|&[a, b, c]| {
            let tri = [points[a], points[b], points[c]];
            // Strictly inside, either winding
            let sides = [
                orient(tri[0], tri[1], [x, y]),
                orient(tri[1], tri[2], [x, y]),
                orient(tri[2], tri[0], [x, y]),
            ];
            sides.iter().all(|&v| v > EPSILON) || sides.iter().all(|&v| v < -EPSILON)
        })
    }

    #[test]
    fn test_square() {
        let square = face(&[[0., 0.], [1., 0.], [1., 1.], [0., 1.]], &[]);

        let triangles = triangulate(&square);

        assert_eq!(triangles.len(), 2);
        assert!(areas(&square, &triangles).iter().all(|&a| a > 0.0));
    }

    #[test]
    fn test_concave_outline_keeps_area_and_winding() {
        // U shape: 3 x 2 with a 1 x 1 notch cut from the top edge.
        let notched = face(
            &[[0., 0.], [3., 0.], [3., 2.], [2., 2.], [2., 1.], [1., 1.], [1., 2.], [0., 2.]],
            &[],
        );

        let triangles = triangulate(&notched);
        let areas = areas(&notched, &triangles);

        assert_eq!(triangles.len(), 6);
        assert!(areas.iter().all(|&a| a > 0.0));
        assert!((areas.iter().sum::<f64>() - 5.0).abs() < 1e-9);
        assert!(!covers(&notched, &triangles, [1.5, 1.5]));
    }

    #[test]
    fn test_plate_with_hole() {
        let plate = face(
            &[[0., 0.], [4., 0.], [4., 4.], [0., 4.]],
            &[&[[1., 1.], [3., 1.], [3., 3.], [1., 3.]]],
        );

        let triangles = triangulate(&plate);
        let areas = areas(&plate, &triangles);

        assert!(areas.iter().all(|&a| a > 0.0));
        assert!((areas.iter().sum::<f64>() - 12.0).abs() < 1e-9);
        assert!(!covers(&plate, &triangles, [2.0, 2.0]));
        assert!(covers(&plate, &triangles, [0.5, 2.0]));
    }

    #[test]
    fn test_two_holes() {
        let plate = face(
            &[[0., 0.], [6., 0.], [6., 3.], [0., 3.]],
            &[
                &[[1., 1.], [2., 1.], [2., 2.], [1., 2.]],
                &[[4., 0.5], [5., 0.5], [5., 2.5], [4., 2.5]],
            ],
        );

        let triangles = triangulate(&plate);
        let areas = areas(&plate, &triangles);

        assert!(areas.iter().all(|&a| a > 0.0));
        assert!((areas.iter().sum::<f64>() - 15.0).abs() < 1e-9);
        assert!(!covers(&plate, &triangles, [1.5, 1.5]));
        assert!(!covers(&plate, &triangles, [4.5, 1.5]));
    }

    #[test]
    fn test_clockwise_face_keeps_its_winding() {
        let square = face(&[[0., 0.], [0., 1.], [1., 1.], [1., 0.]], &[]);

        let triangles = triangulate(&square);

        assert_eq!(triangles.len(), 2);
        assert!(areas(&square, &triangles).iter().all(|&a| a < 0.0));
    }

    #[test]
    fn test_degenerate_face() {
        let line = face(&[[0., 0.], [1., 0.], [2., 0.]], &[]);
        assert!(triangulate(&line).is_empty());
    }
}

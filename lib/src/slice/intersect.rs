//! Mesh-plane intersection and contour reconstruction.
//!
//! For one height, every triangle straddling the plane contributes one
//! segment. Segments are stitched end to end into loops; loops that close
//! within [`CHAIN_EPSILON`] become the raw boundary of the layer, anything
//! else is reported and dropped.

use crate::clipper::union_even_odd;
use crate::geometry::{ExPolygons, Line, Point, Polygon, Polyline, Vertex};
use crate::mesh::validate_vertices;
use crate::{scale, CoordF, Result};
use log::{debug, warn};

/// Endpoint matching tolerance when chaining segments (mm).
pub const CHAIN_EPSILON: CoordF = 0.05;

/// Segment where one triangle crosses the plane at `height`.
///
/// Returns `None` unless the plane lies strictly between the lowest and
/// highest vertex, so triangles that only touch the plane contribute nothing.
pub fn intersect_triangle(triangle: &[Vertex; 3], height: CoordF) -> Option<Line> {
    let mut v = *triangle;
    v.sort_by(|a, b| a.z.total_cmp(&b.z));
    let [low, mid, high] = v;

    if !(low.z < height && height < high.z) {
        return None;
    }

    let cross = |a: Vertex, b: Vertex| -> Point {
        let t = (height - a.z) / (b.z - a.z);
        a.lerp(&b, t).to_point_xy()
    };

    let (p1, p2) = if mid.z < height {
        (cross(low, high), cross(mid, high))
    } else {
        (cross(low, mid), cross(low, high))
    };
    Some(Line::new(p1, p2))
}

/// All crossing segments of a triangle soup at `height`.
pub fn intersect_mesh(vertices: &[Vertex], height: CoordF) -> Result<Vec<Line>> {
    validate_vertices(vertices)?;
    Ok(vertices
        .chunks_exact(3)
        .filter_map(|t| intersect_triangle(&[t[0], t[1], t[2]], height))
        .collect())
}

/// Output of [`chain_segments`].
#[derive(Debug, Default, Clone)]
pub struct ChainedLoops {
    /// Chains whose open end returned to their start. The last point repeats
    /// the first within tolerance.
    pub closed: Vec<Polyline>,
    /// Chains that ran out of matching segments before closing.
    pub open: Vec<Polyline>,
}

/// Stitch unordered segments into chains.
///
/// Starting from the first unused segment, the remaining pool is scanned for a
/// segment with either endpoint within `epsilon` (mm) of the open end; the
/// first match found is consumed, reversed when it matched on its second
/// endpoint. A chain ends when nothing matches.
pub fn chain_segments(mut segments: Vec<Line>, epsilon: CoordF) -> ChainedLoops {
    let eps_sq = {
        let e = scale(epsilon) as i128;
        e * e
    };
    let mut result = ChainedLoops::default();

    while !segments.is_empty() {
        let first = segments.remove(0);
        let mut points = vec![first.a, first.b];

        loop {
            let end = points[points.len() - 1];
            let found = segments.iter().enumerate().find_map(|(i, s)| {
                if end.distance_squared(&s.a) < eps_sq {
                    Some((i, s.b))
                } else if end.distance_squared(&s.b) < eps_sq {
                    Some((i, s.a))
                } else {
                    None
                }
            });
            match found {
                Some((i, next)) => {
                    segments.remove(i);
                    points.push(next);
                }
                None => break,
            }
        }

        let start = points[0];
        let end = points[points.len() - 1];
        let before_end = points[points.len() - 2];
        if points.len() > 3 && end.distance_squared(&start) < eps_sq {
            result.closed.push(Polyline::from_points(points));
        } else if points.len() > 3 && before_end.distance_squared(&start) < eps_sq {
            // Last segment doubled back past the start
            points.pop();
            result.closed.push(Polyline::from_points(points));
        } else {
            result.open.push(Polyline::from_points(points));
        }
    }

    result
}

/// Closed chain to polygon: the repeated end point is dropped.
fn chain_to_polygon(chain: &Polyline) -> Polygon {
    let mut points = chain.points().to_vec();
    points.pop();
    Polygon::from_points(points)
}

/// Canonical boundary of the model at `height`.
///
/// Crossing segments are chained into loops; open chains are logged and
/// discarded. Closed loops are merged with even-odd fill.
pub fn layer_boundary(vertices: &[Vertex], height: CoordF) -> Result<ExPolygons> {
    let segments = intersect_mesh(vertices, height)?;
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let segment_count = segments.len();
    let chains = chain_segments(segments, CHAIN_EPSILON);
    for open in &chains.open {
        warn!(
            "Discarding open contour at z={:.4}: {} points, gap {:.3}mm",
            height,
            open.len(),
            open.first_point().distance_mm(&open.last_point())
        );
    }

    let loops: Vec<Polygon> = chains
        .closed
        .iter()
        .map(chain_to_polygon)
        .filter(|p| p.is_valid())
        .collect();
    debug!(
        "z={:.4}: {} segments, {} loops, {} open",
        height,
        segment_count,
        loops.len(),
        chains.open.len()
    );
    Ok(union_even_odd(&loops))
}

//! Path simplification.
//!
//! Offsetting and chaining leave near-collinear vertices behind; walls run
//! through Douglas-Peucker before they are emitted so the G-code is not
//! flooded with sub-micron moves.

use super::{Line, Point, Polygon};
use crate::{scale, Coord, CoordF};

/// Tolerance applied to wall loops after offsetting (mm).
pub const WALL_SIMPLIFY_TOLERANCE: CoordF = 0.00125;

/// Douglas-Peucker line simplification.
///
/// Keeps every point whose distance to the chord between its retained
/// neighbours exceeds `tolerance` (mm). The first and last points are always
/// preserved.
pub fn douglas_peucker(points: &[Point], tolerance: CoordF) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let tolerance_sq = scale(tolerance) as f64 * scale(tolerance) as f64;

    // Stack-based so long chains cannot overflow the call stack
    let mut stack = vec![(0, points.len() - 1)];
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    while let Some((anchor_idx, floater_idx)) = stack.pop() {
        if anchor_idx + 1 >= floater_idx {
            continue;
        }

        let anchor = points[anchor_idx];
        let floater = points[floater_idx];

        let mut max_dist_sq = 0.0;
        let mut furthest_idx = anchor_idx;
        for (i, p) in points
            .iter()
            .enumerate()
            .take(floater_idx)
            .skip(anchor_idx + 1)
        {
            let dist_sq = Line::distance_to_squared(*p, anchor, floater);
            if dist_sq > max_dist_sq {
                max_dist_sq = dist_sq;
                furthest_idx = i;
            }
        }

        if max_dist_sq > tolerance_sq {
            keep[furthest_idx] = true;
            stack.push((anchor_idx, furthest_idx));
            stack.push((furthest_idx, floater_idx));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Douglas-Peucker for a closed loop.
///
/// The loop is opened at its first vertex and closed again afterwards, so the
/// closing edge is simplified too. Loops that would collapse below three
/// vertices are returned unchanged.
pub fn douglas_peucker_polygon(polygon: &Polygon, tolerance: CoordF) -> Polygon {
    let points = polygon.points();
    if points.len() <= 3 {
        return polygon.clone();
    }

    let mut open = points.to_vec();
    open.push(points[0]);
    let mut simplified = douglas_peucker(&open, tolerance);
    simplified.pop();

    if simplified.len() < 3 {
        return polygon.clone();
    }

    Polygon::from_points(simplified)
}

/// Drop consecutive points closer than `tolerance` (scaled units).
pub fn remove_duplicate_points(points: &[Point], tolerance: Coord) -> Vec<Point> {
    let tolerance_sq = tolerance as i128 * tolerance as i128;
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        match result.last() {
            Some(last) if last.distance_squared(p) <= tolerance_sq => {}
            _ => result.push(*p),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_douglas_peucker_removes_collinear() {
        let pts = vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(1.0, 0.0),
            Point::new_scale(2.0, 0.0),
            Point::new_scale(3.0, 0.0),
        ];
        let s = douglas_peucker(&pts, 0.01);
        assert_eq!(s, vec![pts[0], pts[3]]);
    }

    #[test]
    fn test_douglas_peucker_keeps_corner() {
        let pts = vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(5.0, 0.0),
            Point::new_scale(5.0, 5.0),
        ];
        assert_eq!(douglas_peucker(&pts, 0.01).len(), 3);
    }

    #[test]
    fn test_douglas_peucker_polygon_square_with_midpoints() {
        let poly = Polygon::from_points(vec![
            Point::new_scale(0.0, 0.0),
            Point::new_scale(5.0, 0.0),
            Point::new_scale(10.0, 0.0),
            Point::new_scale(10.0, 10.0),
            Point::new_scale(0.0, 10.0),
            Point::new_scale(0.0, 5.0),
        ]);
        let s = douglas_peucker_polygon(&poly, 0.01);
        assert_eq!(s.len(), 4);
        assert!((s.area_mm2() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_remove_duplicate_points() {
        let pts = vec![Point::new(0, 0), Point::new(1, 0), Point::new(100, 0)];
        assert_eq!(remove_duplicate_points(&pts, 2).len(), 2);
    }
}

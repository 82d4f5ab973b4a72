//! Path sequencing for fill moves.
//!
//! Fill lines come out of clipping in lattice order, which makes the head
//! jump back and forth across the layer. [`sequence_paths`] reorders them with
//! a greedy nearest-endpoint walk so each path starts close to where the
//! previous one ended. Walls are not reordered.
//!
//! # Algorithm
//!
//! 1. Take the first path as is
//! 2. Find the unused path whose start or end is nearest to the current end
//! 3. Append it, reversed when its end was the nearer point
//! 4. Repeat until no paths remain
//!
//! Ties keep the first candidate found, so the result only depends on the
//! input order. Quadratic in the number of paths.

use crate::geometry::{Point, Polyline};
use crate::CoordF;

/// Reorder `paths` to shorten travel between them.
///
/// The output is a permutation of the input in which any path may be
/// reversed; no path is added, dropped or split.
pub fn sequence_paths(paths: Vec<Polyline>) -> Vec<Polyline> {
    if paths.len() < 2 {
        return paths;
    }

    let mut pool: Vec<Option<Polyline>> = paths.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(pool.len());

    let Some(first) = pool[0].take() else {
        return ordered;
    };
    let mut cursor = first.last_point();
    ordered.push(first);

    for _ in 1..pool.len() {
        let Some((idx, reverse)) = nearest_endpoint(&pool, cursor) else {
            break;
        };
        let Some(mut next) = pool[idx].take() else {
            break;
        };
        if reverse {
            next.reverse();
        }
        cursor = next.last_point();
        ordered.push(next);
    }

    ordered
}

/// Index of the unused path with an endpoint nearest to `from`, and whether
/// that endpoint is its end.
fn nearest_endpoint(pool: &[Option<Polyline>], from: Point) -> Option<(usize, bool)> {
    let mut best: Option<(usize, bool)> = None;
    let mut best_dist_sq = i128::MAX;

    for (idx, path) in pool.iter().enumerate() {
        let Some(path) = path else {
            continue;
        };
        let to_start = from.distance_squared(&path.first_point());
        let to_end = from.distance_squared(&path.last_point());
        if to_start < best_dist_sq {
            best_dist_sq = to_start;
            best = Some((idx, false));
        }
        if to_end < best_dist_sq {
            best_dist_sq = to_end;
            best = Some((idx, true));
        }
    }
    best
}

/// Total travel distance (mm) between consecutive paths.
pub fn travel_distance(paths: &[Polyline]) -> CoordF {
    paths
        .windows(2)
        .map(|w| w[0].last_point().distance_mm(&w[1].first_point()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Polyline {
        Polyline::segment(Point::new_scale(x0, y0), Point::new_scale(x1, y1))
    }

    /// Direction-independent key for multiset comparison.
    fn key(p: &Polyline) -> Vec<Point> {
        let fwd = p.points().to_vec();
        let mut rev = fwd.clone();
        rev.reverse();
        let cmp = |a: &Vec<Point>, b: &Vec<Point>| {
            a.iter().map(|q| (q.x, q.y)).cmp(b.iter().map(|q| (q.x, q.y)))
        };
        if cmp(&fwd, &rev).is_le() {
            fwd
        } else {
            rev
        }
    }

    #[test]
    fn test_sequence_empty_and_single() {
        assert!(sequence_paths(Vec::new()).is_empty());
        let one = vec![seg(0.0, 0.0, 1.0, 0.0)];
        assert_eq!(sequence_paths(one.clone()), one);
    }

    #[test]
    fn test_sequence_keeps_first_path() {
        let paths = vec![seg(5.0, 0.0, 6.0, 0.0), seg(0.0, 0.0, 1.0, 0.0)];
        let ordered = sequence_paths(paths.clone());
        assert_eq!(ordered[0], paths[0]);
    }

    #[test]
    fn test_sequence_reverses_on_end_match() {
        // Second path ends next to the first one's end
        let paths = vec![seg(0.0, 0.0, 10.0, 0.0), seg(0.0, 1.0, 10.0, 1.0)];
        let ordered = sequence_paths(paths);
        assert_eq!(ordered[1].first_point(), Point::new_scale(10.0, 1.0));
        assert_eq!(ordered[1].last_point(), Point::new_scale(0.0, 1.0));
    }

    #[test]
    fn test_sequence_picks_nearest() {
        let paths = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(50.0, 0.0, 51.0, 0.0),
            seg(2.0, 0.0, 3.0, 0.0),
            seg(20.0, 0.0, 21.0, 0.0),
        ];
        let ordered = sequence_paths(paths);
        let starts: Vec<f64> = ordered.iter().map(|p| p.first_point().x_mm()).collect();
        assert_eq!(starts, vec![0.0, 2.0, 20.0, 50.0]);
    }

    #[test]
    fn test_sequence_tie_keeps_first_found() {
        let paths = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(2.0, 0.0, 3.0, 0.0),
            seg(0.0, 5.0, 1.0, 1.0),
            seg(1.0, 1.0, 1.0, 5.0),
        ];
        // Paths 1 and 2 are both 1mm away from (1, 0)
        let ordered = sequence_paths(paths.clone());
        assert_eq!(ordered[1], paths[1]);
    }

    #[test]
    fn test_sequence_preserves_multiset() {
        let paths: Vec<Polyline> = (0..20)
            .map(|i| {
                let f = i as f64;
                seg((f * 7.0) % 13.0, f, (f * 3.0) % 11.0, f + 0.5)
            })
            .collect();
        let ordered = sequence_paths(paths.clone());
        assert_eq!(ordered.len(), paths.len());

        let mut before: Vec<Vec<Point>> = paths.iter().map(key).collect();
        let mut after: Vec<Vec<Point>> = ordered.iter().map(key).collect();
        let sort = |v: &mut Vec<Vec<Point>>| {
            v.sort_by(|a, b| a.iter().map(|q| (q.x, q.y)).cmp(b.iter().map(|q| (q.x, q.y))))
        };
        sort(&mut before);
        sort(&mut after);
        assert_eq!(before, after);
    }

    #[test]
    fn test_sequence_reduces_travel() {
        let paths: Vec<Polyline> = [0.0, 8.0, 2.0, 6.0, 4.0]
            .iter()
            .map(|&y| seg(0.0, y, 10.0, y))
            .collect();
        let before = travel_distance(&paths);
        let after = travel_distance(&sequence_paths(paths));
        assert!(after < before);
    }
}

//! Polygon boolean and offset operations.
//!
//! Thin adapter over `geo-clipper`: coordinates are converted to millimetre
//! `geo` polygons, processed by Clipper and converted back to scaled
//! [`ExPolygon`]s. Everything the slicing core needs from a polygon kernel
//! lives here:
//! - union / intersection / difference
//! - inward and outward offsets
//! - simplification and area filtering
//! - even-odd canonicalisation of raw loops
//! - clipping open paths against regions

use crate::geometry::{douglas_peucker_polygon, ExPolygon, ExPolygons, Line, Point, Polygon, Polyline};
use crate::{scale, unscale, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Clipper works on integers; geo-clipper multiplies mm by this factor.
const CLIPPER_FACTOR: CoordF = 1000.0;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    Round,
    /// Mitered corners
    #[default]
    Miter,
}

impl From<OffsetJoinType> for JoinType {
    fn from(jt: OffsetJoinType) -> Self {
        match jt {
            OffsetJoinType::Square => JoinType::Square,
            OffsetJoinType::Round => JoinType::Round(0.25),
            OffsetJoinType::Miter => JoinType::Miter(2.0),
        }
    }
}

fn ring_to_geo(poly: &Polygon) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = poly
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    LineString::new(ring)
}

fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&expoly.contour),
        expoly.holes.iter().map(ring_to_geo).collect(),
    )
}

fn geo_to_ring(ring: &LineString<f64>) -> Polygon {
    // Polygon::from_points drops the repeated closing coordinate
    Polygon::from_points(ring.coords().map(|c| Point::new(scale(c.x), scale(c.y))).collect())
}

fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> ExPolygon {
    let mut ex = ExPolygon::with_holes(
        geo_to_ring(geo_poly.exterior()),
        geo_poly.interiors().iter().map(geo_to_ring).collect(),
    );
    ex.normalize();
    ex
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(geo_to_expolygon)
        .filter(|ex| !ex.is_empty())
        .collect()
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Union of two sets of regions.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return union_ex(clip);
    }
    if clip.is_empty() {
        return union_ex(subject);
    }

    let result = expolygons_to_geo_multi(subject).union(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Merge a single set of possibly overlapping regions.
pub fn union_ex(polygons: &[ExPolygon]) -> ExPolygons {
    if polygons.is_empty() {
        return vec![];
    }

    let empty = MultiPolygon::<f64>::new(Vec::new());
    let result = expolygons_to_geo_multi(polygons).union(&empty, CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Intersection of two sets of regions.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }

    let result =
        expolygons_to_geo_multi(subject).intersection(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Difference of two sets of regions (subject - clip).
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return subject.to_vec();
    }

    let result =
        expolygons_to_geo_multi(subject).difference(&expolygons_to_geo_multi(clip), CLIPPER_FACTOR);
    geo_multi_to_expolygons(&result)
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset regions by `delta` mm. Positive grows, negative shrinks.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }

    let result = expolygons_to_geo_multi(expolygons).offset(
        delta,
        join_type.into(),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Shrink (inset) regions by `distance` mm.
pub fn shrink(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, -distance.abs(), join_type)
}

/// Grow (outset) regions by `distance` mm.
pub fn grow(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, distance.abs(), join_type)
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Douglas-Peucker every ring; regions whose contour collapses are dropped,
/// collapsed holes are removed from their region.
pub fn simplify_expolygons(expolygons: &[ExPolygon], tolerance: CoordF) -> ExPolygons {
    expolygons
        .iter()
        .filter_map(|ex| {
            let contour = douglas_peucker_polygon(&ex.contour, tolerance);
            if !contour.is_valid() {
                return None;
            }
            let holes = ex
                .holes
                .iter()
                .map(|h| douglas_peucker_polygon(h, tolerance))
                .filter(Polygon::is_valid)
                .collect();
            Some(ExPolygon::with_holes(contour, holes))
        })
        .collect()
}

/// Drop regions whose net area is below `min_area_mm2`.
pub fn remove_small(expolygons: &[ExPolygon], min_area_mm2: CoordF) -> ExPolygons {
    expolygons
        .iter()
        .filter(|ex| ex.area_mm2().abs() >= min_area_mm2)
        .cloned()
        .collect()
}

/// Total net area in mm².
pub fn total_area_mm2(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|ex| ex.area_mm2()).sum()
}

/// Build regions from unordered closed loops with even-odd fill.
///
/// A loop enclosed by an even number of other loops bounds material, an odd
/// number marks a hole. Holes attach to the smallest loop one level up that
/// contains them. The assembled regions are unioned so coincident or
/// overlapping loops collapse into one boundary.
pub fn union_even_odd(loops: &[Polygon]) -> ExPolygons {
    let loops: Vec<&Polygon> = loops.iter().filter(|p| p.is_valid()).collect();
    if loops.is_empty() {
        return vec![];
    }

    let depth: Vec<usize> = loops
        .iter()
        .enumerate()
        .map(|(i, inner)| {
            let probe = inner[0];
            loops
                .iter()
                .enumerate()
                .filter(|&(j, outer)| j != i && outer.contains_point(&probe))
                .count()
        })
        .collect();

    let mut regions: Vec<(usize, ExPolygon)> = Vec::new();
    for (i, lp) in loops.iter().enumerate() {
        if depth[i] % 2 == 0 {
            let mut contour = (*lp).clone();
            contour.make_counter_clockwise();
            regions.push((i, ExPolygon::new(contour)));
        }
    }

    for (i, lp) in loops.iter().enumerate() {
        if depth[i] % 2 == 0 {
            continue;
        }
        let probe = lp[0];
        let parent = regions
            .iter_mut()
            .filter(|(j, ex)| depth[*j] + 1 == depth[i] && ex.contour.contains_point(&probe))
            .min_by(|(_, a), (_, b)| {
                a.contour
                    .area()
                    .abs()
                    .total_cmp(&b.contour.area().abs())
            });
        if let Some((_, ex)) = parent {
            let mut hole = (*lp).clone();
            hole.make_clockwise();
            ex.holes.push(hole);
        }
    }

    let regions: ExPolygons = regions.into_iter().map(|(_, ex)| ex).collect();
    union_ex(&regions)
}

// ============================================================================
// Open-path clipping
// ============================================================================

/// Keep the parts of open paths that lie inside `regions`.
///
/// Each edge is split at every crossing with a region ring; the pieces whose
/// midpoint is inside are kept and consecutive kept pieces are rejoined.
pub fn clip_polylines(polylines: &[Polyline], regions: &[ExPolygon]) -> Vec<Polyline> {
    if polylines.is_empty() || regions.is_empty() {
        return vec![];
    }

    let rings: Vec<Line> = regions
        .iter()
        .flat_map(|ex| ex.polygons().flat_map(|p| p.edges()))
        .collect();

    let mut result = Vec::new();
    for polyline in polylines {
        let mut current: Vec<Point> = Vec::new();
        for edge in polyline.edges() {
            for (a, b) in clip_segment(&edge, &rings, regions) {
                if current.last() == Some(&a) {
                    current.push(b);
                } else {
                    if current.len() >= 2 {
                        result.push(Polyline::from_points(std::mem::take(&mut current)));
                    }
                    current = vec![a, b];
                }
            }
        }
        if current.len() >= 2 {
            result.push(Polyline::from_points(current));
        }
    }
    result
}

fn clip_segment(edge: &Line, rings: &[Line], regions: &[ExPolygon]) -> Vec<(Point, Point)> {
    let mut ts: Vec<CoordF> = rings
        .iter()
        .filter_map(|r| edge.intersection_param(r))
        .filter(|t| *t > 0.0 && *t < 1.0)
        .collect();
    ts.push(0.0);
    ts.push(1.0);
    ts.sort_by(|a, b| a.total_cmp(b));
    ts.dedup();

    let mut pieces: Vec<(Point, Point)> = Vec::new();
    for w in ts.windows(2) {
        let a = edge.point_at(w[0]);
        let b = edge.point_at(w[1]);
        if a == b {
            continue;
        }
        let mid = edge.point_at((w[0] + w[1]) / 2.0);
        if !point_in_expolygons(&mid, regions) {
            continue;
        }
        if let Some(last) = pieces.last_mut().filter(|last| last.1 == a) {
            last.1 = b;
        } else {
            pieces.push((a, b));
        }
    }
    pieces
}

/// Check if a point is inside any of the given regions.
pub fn point_in_expolygons(pt: &Point, expolygons: &[ExPolygon]) -> bool {
    expolygons.iter().any(|ex| ex.contains_point(pt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_square_mm(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size))
    }

    fn square_ex(x: f64, y: f64, size: f64) -> ExPolygon {
        make_square_mm(x, y, size).into()
    }

    #[test]
    fn test_union_overlapping() {
        let a = square_ex(0.0, 0.0, 10.0);
        let b = square_ex(5.0, 0.0, 10.0);
        let u = union(&[a], &[b]);
        assert_eq!(u.len(), 1);
        assert!((total_area_mm2(&u) - 150.0).abs() < 0.01);
    }

    #[test]
    fn test_intersection_and_difference() {
        let a = [square_ex(0.0, 0.0, 10.0)];
        let b = [square_ex(5.0, 5.0, 10.0)];
        assert!((total_area_mm2(&intersection(&a, &b)) - 25.0).abs() < 0.01);
        assert!((total_area_mm2(&difference(&a, &b)) - 75.0).abs() < 0.01);
        assert!(intersection(&a, &[]).is_empty());
        assert_eq!(difference(&a, &[]).len(), 1);
    }

    #[test]
    fn test_shrink_and_grow() {
        let sq = [square_ex(0.0, 0.0, 10.0)];
        let inner = shrink(&sq, 1.0, OffsetJoinType::Miter);
        assert!((total_area_mm2(&inner) - 64.0).abs() < 0.01);

        let outer = grow(&sq, 1.0, OffsetJoinType::Miter);
        assert!((total_area_mm2(&outer) - 144.0).abs() < 0.01);

        // Shrinking past the half-width collapses the region
        assert!(shrink(&sq, 6.0, OffsetJoinType::Miter).is_empty());
    }

    #[test]
    fn test_remove_small() {
        let regions = vec![square_ex(0.0, 0.0, 10.0), square_ex(20.0, 0.0, 0.1)];
        let kept = remove_small(&regions, 0.25);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_union_even_odd_nesting() {
        // Outer square, hole, and an island inside the hole
        let outer = make_square_mm(0.0, 0.0, 30.0);
        let mut hole = make_square_mm(5.0, 5.0, 20.0);
        hole.reverse();
        let island = make_square_mm(10.0, 10.0, 10.0);

        let regions = union_even_odd(&[island, outer, hole]);
        assert_eq!(regions.len(), 2);
        let total = total_area_mm2(&regions);
        assert!((total - (900.0 - 400.0 + 100.0)).abs() < 0.01, "area {}", total);
        for ex in &regions {
            assert!(ex.contour.is_counter_clockwise());
        }
    }

    #[test]
    fn test_union_even_odd_orients_clockwise_input() {
        let mut cw = make_square_mm(0.0, 0.0, 10.0);
        cw.reverse();
        let single = union_even_odd(&[cw]);
        assert_eq!(single.len(), 1);
        assert!(single[0].contour.is_counter_clockwise());
        assert!((total_area_mm2(&single) - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_union_even_odd_disjoint_loops() {
        let regions = union_even_odd(&[
            make_square_mm(0.0, 0.0, 5.0),
            make_square_mm(10.0, 0.0, 5.0),
        ]);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_clip_polylines_through_square() {
        let region = [square_ex(0.0, 0.0, 10.0)];
        let line = Polyline::segment(Point::new_scale(-5.0, 5.0), Point::new_scale(15.0, 5.0));
        let clipped = clip_polylines(&[line], &region);
        assert_eq!(clipped.len(), 1);
        assert!((clipped[0].length_mm() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_clip_polylines_respects_holes() {
        let mut hole = make_square_mm(4.0, 0.0, 2.0);
        hole.make_clockwise();
        let region = [ExPolygon::with_holes(make_square_mm(0.0, -5.0, 10.0), vec![hole])];
        let line = Polyline::segment(Point::new_scale(-1.0, 1.0), Point::new_scale(11.0, 1.0));
        let clipped = clip_polylines(&[line], &region);
        assert_eq!(clipped.len(), 2);
        let total: f64 = clipped.iter().map(|p| p.length_mm()).sum();
        assert!((total - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_clip_polylines_outside() {
        let region = [square_ex(0.0, 0.0, 10.0)];
        let line = Polyline::segment(Point::new_scale(20.0, 0.0), Point::new_scale(30.0, 10.0));
        assert!(clip_polylines(&[line], &region).is_empty());
    }
}

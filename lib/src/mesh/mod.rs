//! Triangle soup container.
//!
//! A [`Mesh`] is a flat vertex sequence where every consecutive triple is one
//! triangle. The triple invariant is checked once on construction; everything
//! downstream can rely on it.

pub mod stl;

use crate::geometry::{Point3F, Vertex};
use crate::{CoordF, Error, Result};
use std::fmt;

pub use stl::load_stl;

/// A triangulated surface stored as a triangle soup.
#[derive(Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
}

/// Check the triangle-triple invariant on a raw vertex sequence.
pub fn validate_vertices(vertices: &[Vertex]) -> Result<()> {
    if vertices.len() % 3 != 0 {
        return Err(Error::InvalidMesh(vertices.len()));
    }
    Ok(())
}

impl Mesh {
    /// Wrap a vertex sequence, rejecting lengths that are not a multiple of 3.
    pub fn from_vertices(vertices: Vec<Vertex>) -> Result<Self> {
        validate_vertices(&vertices)?;
        Ok(Self { vertices })
    }

    /// Build a soup from an indexed vertex list.
    fn from_indexed(corners: &[Point3F], triangles: &[[usize; 3]]) -> Self {
        let vertices = triangles
            .iter()
            .flat_map(|tri| tri.iter().map(|&i| corners[i]))
            .collect();
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3F, Point3F)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Point3F::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Point3F::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        }))
    }

    /// Lowest and highest Z.
    pub fn z_range(&self) -> Option<(CoordF, CoordF)> {
        self.bounds().map(|(lo, hi)| (lo.z, hi.z))
    }

    /// Enclosed volume (mm³) by summing signed tetrahedra against the origin.
    pub fn volume(&self) -> CoordF {
        let total: CoordF = self
            .triangles()
            .map(|[a, b, c]| {
                let cross = Point3F::new(
                    b.y * c.z - b.z * c.y,
                    b.z * c.x - b.x * c.z,
                    b.x * c.y - b.y * c.x,
                );
                (a.x * cross.x + a.y * cross.y + a.z * cross.z) / 6.0
            })
            .sum();
        total.abs()
    }

    pub fn translate(&mut self, v: Point3F) {
        for vertex in &mut self.vertices {
            *vertex = *vertex + v;
        }
    }

    /// Move the XY centre of the bounding box to the origin.
    pub fn center_xy(&mut self) {
        if let Some((lo, hi)) = self.bounds() {
            self.translate(Point3F::new(-(lo.x + hi.x) / 2.0, -(lo.y + hi.y) / 2.0, 0.0));
        }
    }

    /// Place the mesh on the Z=0 plane (bottom touching).
    pub fn place_on_bed(&mut self) {
        if let Some((lo, _)) = self.bounds() {
            self.translate(Point3F::new(0.0, 0.0, -lo.z));
        }
    }

    /// Builder form of [`Mesh::place_on_bed`].
    pub fn placed_on_bed(mut self) -> Self {
        self.place_on_bed();
        self
    }

    /// Axis-aligned cube of edge `size`, centred at the origin.
    pub fn cube(size: CoordF) -> Self {
        let h = size / 2.0;
        let corners = [
            // Bottom face
            Point3F::new(-h, -h, -h),
            Point3F::new(h, -h, -h),
            Point3F::new(h, h, -h),
            Point3F::new(-h, h, -h),
            // Top face
            Point3F::new(-h, -h, h),
            Point3F::new(h, -h, h),
            Point3F::new(h, h, h),
            Point3F::new(-h, h, h),
        ];
        let triangles = [
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];
        Self::from_indexed(&corners, &triangles)
    }

    /// Square-based pyramid standing on Z=0, apex above the origin.
    pub fn pyramid(base: CoordF, height: CoordF) -> Self {
        let h = base / 2.0;
        let corners = [
            Point3F::new(-h, -h, 0.0),
            Point3F::new(h, -h, 0.0),
            Point3F::new(h, h, 0.0),
            Point3F::new(-h, h, 0.0),
            Point3F::new(0.0, 0.0, height),
        ];
        let triangles = [
            // Base
            [0, 2, 1],
            [0, 3, 2],
            // Sides
            [0, 1, 4],
            [1, 2, 4],
            [2, 3, 4],
            [3, 0, 4],
        ];
        Self::from_indexed(&corners, &triangles)
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mesh({} triangles)", self.triangle_count())
    }
}

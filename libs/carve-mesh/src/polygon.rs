//! # Polygons
//!
//! Planar convex polygons with per-vertex attributes: the unit of currency
//! for BSP clipping and CSG. Non-convex vertex loops are tessellated into
//! convex pieces before admission; the `Polygon` type itself only ever
//! holds convex, coplanar, counter-clockwise loops.
//!
//! Each polygon carries an `id` labelling the group of fragments that arose
//! from splitting one source polygon. Splitting allocates a fresh id shared
//! by the two halves; detessellation merges fragments of the same group
//! back together.

use std::sync::atomic::{AtomicU64, Ordering};

use config::constants::EPSILON;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::material::Material;
use crate::math::{LineSegment, Transform};
use crate::plane::{Plane, PointClass, PolygonClass};
use crate::vertex::Vertex;

// =============================================================================
// ID ALLOCATION
// =============================================================================

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh polygon group id.
pub(crate) fn fresh_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

// =============================================================================
// POLYGON
// =============================================================================

/// A convex planar polygon.
///
/// Invariants (enforced at construction):
/// - at least 3 vertices, all coplanar within tolerance
/// - convex, non-self-intersecting loop
/// - vertices wind counter-clockwise seen from the plane normal side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
    material: Option<Material>,
    id: u64,
}

impl PartialEq for Polygon {
    /// Content equality: vertices, plane, and material. The split-group
    /// id is bookkeeping and two separately built copies of the same
    /// surface compare equal despite carrying different ids.
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.plane == other.plane
            && self.material == other.material
    }
}

impl Polygon {
    /// Creates a polygon from a convex coplanar vertex loop.
    ///
    /// The plane is fitted with Newell's method; winding is taken as given
    /// (the normal points to the side from which the loop is CCW). Vertices
    /// with zero normals receive the plane normal.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::DegeneratePolygon`] for fewer than 3 distinct
    ///   vertices, collinear loops, or non-convex loops
    /// - [`GeometryError::NonPlanarPolygon`] when a vertex is off-plane
    pub fn new(vertices: Vec<Vertex>) -> Result<Self, GeometryError> {
        Self::with_material(vertices, None)
    }

    /// Creates a polygon with an attached material.
    pub fn with_material(
        vertices: Vec<Vertex>,
        material: Option<Material>,
    ) -> Result<Self, GeometryError> {
        let vertices = dedup_coincident(vertices);
        if vertices.len() < 3 {
            return Err(GeometryError::DegeneratePolygon(
                "fewer than 3 distinct vertices".to_string(),
            ));
        }
        let positions: Vec<DVec3> = vertices.iter().map(|v| v.position).collect();
        let plane = Plane::from_loop(&positions).ok_or_else(|| {
            GeometryError::DegeneratePolygon("vertices are collinear".to_string())
        })?;
        for p in &positions {
            if !plane.contains_point(*p) {
                return Err(GeometryError::NonPlanarPolygon);
            }
        }
        if !is_convex_loop(&positions, plane.normal) {
            return Err(GeometryError::DegeneratePolygon(
                "vertex loop is not convex".to_string(),
            ));
        }
        Ok(Self::from_parts(vertices, plane, material, fresh_id()))
    }

    /// Tessellates an arbitrary simple vertex loop into convex polygons.
    ///
    /// Convex input passes through as a single polygon; non-convex loops
    /// are ear-clipped into triangles. All output shares one group id.
    pub fn tessellating(
        vertices: Vec<Vertex>,
        material: Option<Material>,
    ) -> Result<Vec<Polygon>, GeometryError> {
        match Self::with_material(vertices.clone(), material.clone()) {
            Ok(poly) => Ok(vec![poly]),
            Err(GeometryError::DegeneratePolygon(_)) | Err(GeometryError::NonPlanarPolygon) => {
                let vertices = dedup_coincident(vertices);
                let positions: Vec<DVec3> = vertices.iter().map(|v| v.position).collect();
                let plane = Plane::from_loop(&positions).ok_or_else(|| {
                    GeometryError::DegeneratePolygon("vertices are collinear".to_string())
                })?;
                let triangles = ear_clip(&positions, &plane)?;
                let id = fresh_id();
                let polys = triangles
                    .into_iter()
                    .map(|[a, b, c]| {
                        let verts = vec![
                            vertices[a].clone(),
                            vertices[b].clone(),
                            vertices[c].clone(),
                        ];
                        let tri_plane = Plane::from_points(
                            verts[0].position,
                            verts[1].position,
                            verts[2].position,
                        )
                        .unwrap_or(plane);
                        Self::from_parts(verts, tri_plane, material.clone(), id)
                    })
                    .collect();
                Ok(polys)
            }
            Err(other) => Err(other),
        }
    }

    /// Internal constructor for pieces whose invariants are already known.
    pub(crate) fn from_parts(
        mut vertices: Vec<Vertex>,
        plane: Plane,
        material: Option<Material>,
        id: u64,
    ) -> Self {
        for v in &mut vertices {
            if v.normal == DVec3::ZERO {
                v.normal = plane.normal;
            }
        }
        Self {
            vertices,
            plane,
            material,
            id,
        }
    }

    /// Polygon vertices in counter-clockwise order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Supporting plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Attached material, if any.
    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Split-group id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns a copy with the material replaced.
    #[must_use]
    pub fn with_material_replaced(&self, material: Option<Material>) -> Polygon {
        Polygon {
            material,
            ..self.clone()
        }
    }

    /// Centroid of the vertex positions.
    pub fn center(&self) -> DVec3 {
        let sum: DVec3 = self.vertices.iter().map(|v| v.position).sum();
        sum / self.vertices.len() as f64
    }

    /// Undirected edges of the loop.
    pub fn edges(&self) -> impl Iterator<Item = LineSegment> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| {
            LineSegment::new(
                self.vertices[i].position,
                self.vertices[(i + 1) % n].position,
            )
        })
    }

    /// The polygon facing the other way: reversed winding, negated vertex
    /// normals, flipped plane. The group id is preserved.
    #[must_use]
    pub fn flipped(&self) -> Polygon {
        let mut vertices: Vec<Vertex> = self.vertices.iter().map(Vertex::inverted).collect();
        vertices.reverse();
        Polygon {
            vertices,
            plane: self.plane.flipped(),
            material: self.material.clone(),
            id: self.id,
        }
    }

    /// Applies a transform; winding is reversed when the transform flips
    /// handedness so the plane normal keeps pointing outward.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Polygon {
        let mut vertices: Vec<Vertex> = self
            .vertices
            .iter()
            .map(|v| v.transformed(transform))
            .collect();
        if transform.is_flipped() {
            vertices.reverse();
            for v in &mut vertices {
                v.normal = -v.normal;
            }
        }
        let positions: Vec<DVec3> = vertices.iter().map(|v| v.position).collect();
        let plane = Plane::from_loop(&positions).unwrap_or(self.plane);
        Polygon {
            vertices,
            plane,
            material: self.material.clone(),
            id: self.id,
        }
    }

    /// Classifies this polygon against a plane (bitwise vertex aggregate).
    pub fn classify(&self, plane: &Plane) -> PolygonClass {
        self.vertices
            .iter()
            .fold(PolygonClass::Coplanar, |class, v| {
                class.union(plane.classify_point(v.position))
            })
    }

    /// Partitions this polygon by a plane into the four buckets.
    ///
    /// Coplanar polygons route to `coplanar_front` or `coplanar_back` by
    /// the sign of the normal dot product. Spanning polygons are cut along
    /// the plane: intersection vertices are interpolated (`t = (w - n.a) /
    /// (n.(b - a))`) and both halves receive a fresh shared group id so
    /// later passes can tell fragments of one source apart from unrelated
    /// coplanar geometry.
    pub fn split_into(
        &self,
        plane: &Plane,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        match self.classify(plane) {
            PolygonClass::Coplanar => {
                if self.plane.normal.dot(plane.normal) > 0.0 {
                    coplanar_front.push(self.clone());
                } else {
                    coplanar_back.push(self.clone());
                }
            }
            PolygonClass::Front => front.push(self.clone()),
            PolygonClass::Back => back.push(self.clone()),
            PolygonClass::Spanning => {
                let mut front_verts: Vec<Vertex> = Vec::with_capacity(self.vertices.len() + 2);
                let mut back_verts: Vec<Vertex> = Vec::with_capacity(self.vertices.len() + 2);
                let n = self.vertices.len();
                for i in 0..n {
                    let a = &self.vertices[i];
                    let b = &self.vertices[(i + 1) % n];
                    let ca = plane.classify_point(a.position);
                    let cb = plane.classify_point(b.position);

                    if ca != PointClass::Back {
                        front_verts.push(a.clone());
                    }
                    if ca != PointClass::Front {
                        back_verts.push(a.clone());
                    }
                    if (ca == PointClass::Front && cb == PointClass::Back)
                        || (ca == PointClass::Back && cb == PointClass::Front)
                    {
                        let denom = plane.normal.dot(b.position - a.position);
                        let t = (plane.w - plane.normal.dot(a.position)) / denom;
                        let v = a.lerp(b, t.clamp(0.0, 1.0));
                        front_verts.push(v.clone());
                        back_verts.push(v);
                    }
                }

                let pair_id = fresh_id();
                if front_verts.len() >= 3 {
                    front.push(Polygon::from_parts(
                        front_verts,
                        self.plane,
                        self.material.clone(),
                        pair_id,
                    ));
                }
                if back_verts.len() >= 3 {
                    back.push(Polygon::from_parts(
                        back_verts,
                        self.plane,
                        self.material.clone(),
                        pair_id,
                    ));
                }
            }
        }
    }

    /// Fan-triangulates this (convex) polygon.
    pub fn triangulated(&self) -> Vec<Polygon> {
        if self.vertices.len() == 3 {
            return vec![self.clone()];
        }
        (1..self.vertices.len() - 1)
            .map(|i| {
                Polygon::from_parts(
                    vec![
                        self.vertices[0].clone(),
                        self.vertices[i].clone(),
                        self.vertices[i + 1].clone(),
                    ],
                    self.plane,
                    self.material.clone(),
                    self.id,
                )
            })
            .collect()
    }

    /// Attempts a conservative merge with another polygon.
    ///
    /// Succeeds only when both lie on the same plane, belong to the same
    /// split group, share a full edge, and the merged loop stays convex.
    /// Returns `None` otherwise.
    pub fn merged(&self, other: &Polygon) -> Option<Polygon> {
        if self.id != other.id
            || !self.plane.approx_eq(&other.plane)
            || self.material != other.material
        {
            return None;
        }
        let n = self.vertices.len();
        let m = other.vertices.len();
        for i in 0..n {
            let a0 = self.vertices[i].position;
            let a1 = self.vertices[(i + 1) % n].position;
            for j in 0..m {
                let b0 = other.vertices[j].position;
                let b1 = other.vertices[(j + 1) % m].position;
                // Shared edge traversed in opposite directions.
                if crate::math::approx_eq_vec(a0, b1) && crate::math::approx_eq_vec(a1, b0) {
                    // Walk self after the shared edge, then other after it.
                    let mut merged: Vec<Vertex> = Vec::with_capacity(n + m - 2);
                    for k in 1..n {
                        merged.push(self.vertices[(i + 1 + k) % n].clone());
                    }
                    for k in 1..m {
                        merged.push(other.vertices[(j + 1 + k) % m].clone());
                    }
                    let merged = dedup_coincident(merged);
                    if merged.len() < 3 {
                        return None;
                    }
                    let positions: Vec<DVec3> = merged.iter().map(|v| v.position).collect();
                    if !is_convex_loop(&positions, self.plane.normal) {
                        return None;
                    }
                    return Some(Polygon::from_parts(
                        merged,
                        self.plane,
                        self.material.clone(),
                        self.id,
                    ));
                }
            }
        }
        None
    }
}

/// Merges coplanar fragments of common split groups back together.
///
/// Conservative: only full-edge, convexity-preserving merges happen, so the
/// result covers exactly the same surface with fewer polygons.
pub fn detessellate(mut polygons: Vec<Polygon>) -> Vec<Polygon> {
    let mut merged_any = true;
    while merged_any {
        merged_any = false;
        let mut out: Vec<Polygon> = Vec::with_capacity(polygons.len());
        'outer: for poly in polygons.drain(..) {
            for existing in out.iter_mut() {
                if let Some(merged) = existing.merged(&poly) {
                    *existing = merged;
                    merged_any = true;
                    continue 'outer;
                }
            }
            out.push(poly);
        }
        polygons = out;
    }
    polygons
}

// =============================================================================
// LOOP HELPERS
// =============================================================================

/// Removes consecutive coincident vertices (including a coincident
/// first/last pair).
fn dedup_coincident(vertices: Vec<Vertex>) -> Vec<Vertex> {
    let mut out: Vec<Vertex> = Vec::with_capacity(vertices.len());
    for v in vertices {
        if out.last().map_or(true, |prev: &Vertex| !prev.is_coincident(&v)) {
            out.push(v);
        }
    }
    while out.len() > 1 && out[0].is_coincident(out.last().unwrap()) {
        out.pop();
    }
    out
}

/// Checks that a loop is convex with respect to the given normal.
fn is_convex_loop(points: &[DVec3], normal: DVec3) -> bool {
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b - a).cross(c - b);
        if cross.dot(normal) < -EPSILON {
            return false;
        }
    }
    true
}

/// Ear-clips a simple loop (projected into its plane) into triangles.
///
/// Returns index triples with the input winding.
pub(crate) fn ear_clip(
    points: &[DVec3],
    plane: &Plane,
) -> Result<Vec<[usize; 3]>, GeometryError> {
    if points.len() < 3 {
        return Err(GeometryError::DegeneratePolygon(
            "fewer than 3 vertices".to_string(),
        ));
    }

    // Build a 2D basis in the plane.
    let u = pick_basis(plane.normal);
    let v = plane.normal.cross(u);
    let projected: Vec<DVec2> = points
        .iter()
        .map(|p| DVec2::new(p.dot(u), p.dot(v)))
        .collect();

    let mut indices: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);

    while indices.len() > 3 {
        let n = indices.len();
        let mut clipped = false;
        for i in 0..n {
            let prev = projected[indices[(i + n - 1) % n]];
            let curr = projected[indices[i]];
            let next = projected[indices[(i + 1) % n]];
            if cross2(curr - prev, next - curr) <= EPSILON {
                continue; // reflex or degenerate corner
            }
            let is_ear = indices
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != (i + n - 1) % n && *k != i && *k != (i + 1) % n)
                .all(|(_, &idx)| !point_in_triangle(projected[idx], prev, curr, next));
            if is_ear {
                triangles.push([
                    indices[(i + n - 1) % n],
                    indices[i],
                    indices[(i + 1) % n],
                ]);
                indices.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            return Err(GeometryError::DegeneratePolygon(
                "loop is self-intersecting or degenerate".to_string(),
            ));
        }
    }
    triangles.push([indices[0], indices[1], indices[2]]);
    Ok(triangles)
}

/// Any unit vector not parallel to `normal`.
fn pick_basis(normal: DVec3) -> DVec3 {
    let candidate = if normal.x.abs() < 0.9 { DVec3::X } else { DVec3::Y };
    (candidate - normal * candidate.dot(normal)).normalize()
}

#[inline]
fn cross2(a: DVec2, b: DVec2) -> f64 {
    a.x * b.y - a.y * b.x
}

fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    let d1 = cross2(b - a, p - a);
    let d2 = cross2(c - b, p - b);
    let d3 = cross2(a - c, p - c);
    let has_neg = d1 < -EPSILON || d2 < -EPSILON || d3 < -EPSILON;
    let has_pos = d1 > EPSILON || d2 > EPSILON || d3 > EPSILON;
    !(has_neg && has_pos)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Polygon {
        Polygon::new(vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 1.0, 0.0)),
            Vertex::new(DVec3::new(0.0, 1.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_computes_plane_and_normals() {
        let poly = quad();
        assert_relative_eq!(poly.plane().normal.z, 1.0, epsilon = 1e-12);
        for v in poly.vertices() {
            assert_relative_eq!(v.normal.z, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_plane_consistency_invariant() {
        let poly = quad();
        for v in poly.vertices() {
            let d = poly.plane().normal.dot(v.position) - poly.plane().w;
            assert!(d.abs() <= EPSILON);
        }
    }

    #[test]
    fn test_new_rejects_non_planar() {
        let result = Polygon::new(vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 1.0, 0.5)),
            Vertex::new(DVec3::new(0.0, 1.0, 0.0)),
        ]);
        assert_eq!(result, Err(GeometryError::NonPlanarPolygon));
    }

    #[test]
    fn test_new_rejects_non_convex() {
        let result = Polygon::new(vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(2.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(2.0, 2.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 0.5, 0.0)), // dent
            Vertex::new(DVec3::new(0.0, 2.0, 0.0)),
        ]);
        assert!(matches!(result, Err(GeometryError::DegeneratePolygon(_))));
    }

    #[test]
    fn test_tessellating_non_convex() {
        let polys = Polygon::tessellating(
            vec![
                Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
                Vertex::new(DVec3::new(2.0, 0.0, 0.0)),
                Vertex::new(DVec3::new(2.0, 2.0, 0.0)),
                Vertex::new(DVec3::new(1.0, 0.5, 0.0)),
                Vertex::new(DVec3::new(0.0, 2.0, 0.0)),
            ],
            None,
        )
        .unwrap();
        assert!(polys.len() >= 3);
        let id = polys[0].id();
        assert!(polys.iter().all(|p| p.id() == id));
    }

    #[test]
    fn test_flip_roundtrip() {
        let poly = quad();
        let back = poly.flipped().flipped();
        assert_eq!(poly.vertices().len(), back.vertices().len());
        assert!(poly.plane().approx_eq(back.plane()));
    }

    #[test]
    fn test_split_spanning() {
        let poly = quad();
        let plane = Plane::new(DVec3::X, 0.5);
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        poly.split_into(&plane, &mut cf, &mut cb, &mut f, &mut b);
        assert_eq!(f.len(), 1);
        assert_eq!(b.len(), 1);
        assert!(cf.is_empty() && cb.is_empty());
        // Fragments share a fresh id distinct from the source.
        assert_eq!(f[0].id(), b[0].id());
        assert_ne!(f[0].id(), poly.id());
        // Interpolated vertices sit on the cut plane.
        let on_plane = f[0]
            .vertices()
            .iter()
            .filter(|v| (v.position.x - 0.5).abs() <= EPSILON)
            .count();
        assert_eq!(on_plane, 2);
    }

    #[test]
    fn test_split_coplanar_routing() {
        let poly = quad();
        let same = Plane::new(DVec3::Z, 0.0);
        let opposite = Plane::new(-DVec3::Z, 0.0);
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        poly.split_into(&same, &mut cf, &mut cb, &mut f, &mut b);
        assert_eq!(cf.len(), 1);
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        poly.split_into(&opposite, &mut cf, &mut cb, &mut f, &mut b);
        assert_eq!(cb.len(), 1);
    }

    #[test]
    fn test_merge_split_halves() {
        let poly = quad();
        let plane = Plane::new(DVec3::X, 0.5);
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        poly.split_into(&plane, &mut cf, &mut cb, &mut f, &mut b);
        let merged = f[0].merged(&b[0]).expect("halves should merge");
        assert_eq!(merged.vertices().len(), 4);
        assert!(merged.plane().approx_eq(poly.plane()));
    }

    #[test]
    fn test_merge_rejects_different_groups() {
        let a = quad();
        let b = Polygon::new(vec![
            Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(2.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(2.0, 1.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 1.0, 0.0)),
        ])
        .unwrap();
        assert!(a.merged(&b).is_none());
    }

    #[test]
    fn test_detessellate_reduces_count() {
        let poly = quad();
        let plane = Plane::new(DVec3::X, 0.5);
        let (mut cf, mut cb, mut f, mut b) = (vec![], vec![], vec![], vec![]);
        poly.split_into(&plane, &mut cf, &mut cb, &mut f, &mut b);
        let mut pieces = f;
        pieces.extend(b);
        assert_eq!(detessellate(pieces).len(), 1);
    }

    #[test]
    fn test_triangulated() {
        let tris = quad().triangulated();
        assert_eq!(tris.len(), 2);
        assert!(tris.iter().all(|t| t.vertices().len() == 3));
    }

    #[test]
    fn test_transform_flip_reverses_winding() {
        let poly = quad();
        let mirrored = poly.transformed(&Transform::scale(DVec3::new(-1.0, 1.0, 1.0)));
        // Normal flips along with winding reversal.
        assert_relative_eq!(mirrored.plane().normal.z, 1.0, epsilon = 1e-12);
    }
}

//! # Watertightness
//!
//! Edge-multiplicity bookkeeping: a mesh is watertight when every
//! undirected edge appears an even number of times. Repair inserts
//! T-junction vertices into neighbouring polygons; it is best-effort and
//! callers re-check afterwards.

use std::collections::HashMap;

use glam::DVec3;

use crate::math::{LineSegment, VectorKey};
use crate::polygon::Polygon;

/// Counts undirected edge multiplicity across a polygon set.
pub fn edge_counts(polygons: &[Polygon]) -> HashMap<LineSegment, usize> {
    let mut counts: HashMap<LineSegment, usize> = HashMap::new();
    for poly in polygons {
        for edge in poly.edges() {
            *counts.entry(edge).or_insert(0) += 1;
        }
    }
    counts
}

/// Returns true when every undirected edge has even multiplicity.
pub fn is_watertight(polygons: &[Polygon]) -> bool {
    edge_counts(polygons).values().all(|&count| count % 2 == 0)
}

/// Edges with odd multiplicity (the boundary of the holes).
pub fn hole_edges(polygons: &[Polygon]) -> Vec<LineSegment> {
    edge_counts(polygons)
        .into_iter()
        .filter(|(_, count)| count % 2 != 0)
        .map(|(edge, _)| edge)
        .collect()
}

/// Best-effort T-junction repair.
///
/// For every hole-edge endpoint, finds polygons with an edge passing
/// through that point and inserts the point into their vertex loop.
/// Inserting a point on an existing edge keeps the loop convex, so polygon
/// invariants are preserved. Callers must re-check [`is_watertight`]: holes
/// that are not T-junctions stay open.
pub fn make_watertight(polygons: &[Polygon]) -> Vec<Polygon> {
    let holes = hole_edges(polygons);
    if holes.is_empty() {
        return polygons.to_vec();
    }

    // Candidate insertion points: hole-edge endpoints, deduplicated.
    let mut points: HashMap<VectorKey, DVec3> = HashMap::new();
    for edge in &holes {
        points.entry(VectorKey::new(edge.start)).or_insert(edge.start);
        points.entry(VectorKey::new(edge.end)).or_insert(edge.end);
    }

    polygons
        .iter()
        .map(|poly| {
            let mut inserted = poly.clone();
            for point in points.values() {
                inserted = insert_point(&inserted, *point);
            }
            inserted
        })
        .collect()
}

/// Inserts `point` into the polygon loop when it lies strictly inside one
/// of its edges; returns the polygon unchanged otherwise.
fn insert_point(poly: &Polygon, point: DVec3) -> Polygon {
    let vertices = poly.vertices();
    let n = vertices.len();
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        let segment = LineSegment::new(a.position, b.position);
        if !segment.contains_point(point) {
            continue;
        }
        let edge_len = (b.position - a.position).length();
        let t = (point - a.position).length() / edge_len;
        let mut v = a.lerp(b, t);
        v.position = point; // exact endpoint, not the lerp approximation
        let mut new_vertices = vertices.to_vec();
        new_vertices.insert(i + 1, v);
        return Polygon::from_parts(
            new_vertices,
            *poly.plane(),
            poly.material().cloned(),
            poly.id(),
        );
    }
    poly.clone()
}

/// Splits polygons into maximal connected components under edge sharing.
pub fn connected_components(polygons: &[Polygon]) -> Vec<Vec<Polygon>> {
    if polygons.is_empty() {
        return Vec::new();
    }

    // Union-find over polygon indices, joined through shared edges.
    let mut parent: Vec<usize> = (0..polygons.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        let mut walk = i;
        while parent[walk] != root {
            let next = parent[walk];
            parent[walk] = root;
            walk = next;
        }
        root
    }

    let mut edge_owner: HashMap<LineSegment, usize> = HashMap::new();
    for (i, poly) in polygons.iter().enumerate() {
        for edge in poly.edges() {
            match edge_owner.get(&edge) {
                Some(&owner) => {
                    let a = find(&mut parent, owner);
                    let b = find(&mut parent, i);
                    parent[a] = b;
                }
                None => {
                    edge_owner.insert(edge, i);
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<Polygon>> = HashMap::new();
    for (i, poly) in polygons.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(poly.clone());
    }
    let mut components: Vec<Vec<Polygon>> = groups.into_values().collect();
    // Deterministic order: largest first, ties by first polygon id.
    components.sort_by_key(|c| (usize::MAX - c.len(), c.first().map_or(0, |p| p.id())));
    components
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    #[test]
    fn test_cube_is_watertight() {
        let cube = primitives::cube();
        assert!(is_watertight(cube.polygons()));
        assert!(hole_edges(cube.polygons()).is_empty());
    }

    #[test]
    fn test_open_surface_is_not_watertight() {
        let mut polys = primitives::cube().polygons().to_vec();
        polys.pop();
        assert!(!is_watertight(&polys));
        // The removed face leaves four boundary edges.
        assert_eq!(hole_edges(&polys).len(), 4);
    }

    #[test]
    fn test_cube_single_component() {
        let cube = primitives::cube();
        let components = connected_components(cube.polygons());
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), cube.polygons().len());
    }

    #[test]
    fn test_disjoint_cubes_two_components() {
        let mut polys = primitives::cube().polygons().to_vec();
        let other = primitives::cube()
            .transformed(&crate::math::Transform::offset(glam::DVec3::splat(5.0)));
        polys.extend(other.polygons().iter().cloned());
        let components = connected_components(&polys);
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn test_tjunction_repair() {
        use crate::vertex::Vertex;
        use glam::DVec3;

        // A unit square face split into two half-squares on one side and a
        // full square on the other produces a T-junction at the midpoint.
        let full = Polygon::new(vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(0.0, 0.0, 1.0)),
            Vertex::new(DVec3::new(1.0, 0.0, 1.0)),
            Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
        ])
        .unwrap();
        let half_a = Polygon::new(vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 0.0, 0.0)),
            Vertex::new(DVec3::new(1.0, 0.0, 0.5)),
            Vertex::new(DVec3::new(0.0, 0.0, 0.5)),
        ])
        .unwrap();
        let half_b = Polygon::new(vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.5)),
            Vertex::new(DVec3::new(1.0, 0.0, 0.5)),
            Vertex::new(DVec3::new(1.0, 0.0, 1.0)),
            Vertex::new(DVec3::new(0.0, 0.0, 1.0)),
        ])
        .unwrap();

        let polys = vec![full, half_a, half_b];
        assert!(!is_watertight(&polys));
        let repaired = make_watertight(&polys);
        assert!(is_watertight(&repaired));
        // The full face gained the two midpoints.
        assert_eq!(repaired[0].vertices().len(), 6);
    }
}

//! # Convex Hull
//!
//! 3D convex hull by the quickhull algorithm: seed tetrahedron from
//! extreme points, then repeatedly lift the farthest outside point onto
//! the hull across its horizon.
//!
//! Planar input (including the minimal 3-point case) degenerates to a
//! flat double-sided fan rather than an error; fewer than 3 non-collinear
//! points is unrecoverable.

use config::constants::EPSILON;
use glam::DVec3;

use crate::error::GeometryError;
use crate::material::Material;
use crate::math::VectorKey;
use crate::mesh::Mesh;
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::vertex::Vertex;

/// Computes the convex hull of a point set.
///
/// The output mesh is marked convex. Coplanar input produces the
/// degenerate flat fan (both sides emitted, so the sheet is watertight in
/// the edge-multiplicity sense).
///
/// # Errors
///
/// [`GeometryError::DegenerateHull`] when fewer than 3 non-collinear
/// points remain after deduplication.
pub fn hull(points: &[DVec3], material: Option<&Material>) -> Result<Mesh, GeometryError> {
    let points = dedup(points);
    let plane = first_plane(&points).ok_or(GeometryError::DegenerateHull)?;

    if points.iter().all(|p| plane.contains_point(*p)) {
        return flat_hull(&points, &plane, material);
    }

    let faces = quickhull(&points)?;
    let polygons = faces
        .iter()
        .map(|face| {
            let vertices = face
                .vertices
                .iter()
                .map(|&i| Vertex::with_normal(points[i], face.plane.normal))
                .collect();
            Polygon::from_parts(vertices, face.plane, material.cloned(), crate::polygon::fresh_id())
        })
        .collect();
    Ok(Mesh::with_flags(polygons, Some(true), Some(true)))
}

fn dedup(points: &[DVec3]) -> Vec<DVec3> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(points.len());
    for &p in points {
        if seen.insert(VectorKey::new(p)) {
            out.push(p);
        }
    }
    out
}

/// Plane through the first non-collinear triple.
fn first_plane(points: &[DVec3]) -> Option<Plane> {
    if points.len() < 3 {
        return None;
    }
    let a = points[0];
    let b = *points
        .iter()
        .max_by(|p, q| {
            (**p - a)
                .length_squared()
                .partial_cmp(&(**q - a).length_squared())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
    points
        .iter()
        .find_map(|&c| Plane::from_points(a, b, c))
}

/// Degenerate hull: the 2D convex outline, fanned front and back.
fn flat_hull(
    points: &[DVec3],
    plane: &Plane,
    material: Option<&Material>,
) -> Result<Mesh, GeometryError> {
    let outline = planar_outline(points, plane);
    if outline.len() < 3 {
        return Err(GeometryError::DegenerateHull);
    }
    let vertices: Vec<Vertex> = outline
        .iter()
        .map(|&p| Vertex::with_normal(p, plane.normal))
        .collect();
    let front = Polygon::tessellating(vertices, material.cloned())?;
    let mut polygons = front.clone();
    polygons.extend(front.iter().map(Polygon::flipped));
    Ok(Mesh::with_flags(polygons, Some(true), Some(true)))
}

/// 2D convex outline of coplanar points (gift wrapping), wound
/// counter-clockwise about the plane normal.
fn planar_outline(points: &[DVec3], plane: &Plane) -> Vec<DVec3> {
    // Start from the most distant point pair to anchor the wrap.
    let start = (0..points.len())
        .min_by(|&i, &j| {
            points[i]
                .x
                .partial_cmp(&points[j].x)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    points[i]
                        .y
                        .partial_cmp(&points[j].y)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        })
        .unwrap_or(0);

    let mut outline = Vec::new();
    let mut current = start;
    loop {
        outline.push(points[current]);
        let mut next = (current + 1) % points.len();
        for candidate in 0..points.len() {
            if candidate == current {
                continue;
            }
            let turn = (points[next] - points[current])
                .cross(points[candidate] - points[current])
                .dot(plane.normal);
            let further = (points[candidate] - points[current]).length_squared()
                > (points[next] - points[current]).length_squared();
            if turn < -EPSILON || (turn.abs() <= EPSILON && further) {
                next = candidate;
            }
        }
        current = next;
        if current == start || outline.len() > points.len() {
            break;
        }
    }
    outline
}

// =============================================================================
// QUICKHULL
// =============================================================================

#[derive(Debug, Clone)]
struct HullFace {
    vertices: [usize; 3],
    plane: Plane,
    /// Points strictly outside this face, by index.
    outside: Vec<usize>,
}

impl HullFace {
    fn new(v: [usize; 3], points: &[DVec3]) -> Option<Self> {
        let plane = Plane::from_points(points[v[0]], points[v[1]], points[v[2]])?;
        Some(Self {
            vertices: v,
            plane,
            outside: Vec::new(),
        })
    }
}

fn quickhull(points: &[DVec3]) -> Result<Vec<HullFace>, GeometryError> {
    let mut faces = initial_simplex(points)?;
    let all: Vec<usize> = (0..points.len()).collect();
    assign_outside(&mut faces, &all, points);

    // Each lift consumes at least one point, so this terminates well
    // before the safety bound.
    let mut budget = points.len() * points.len() + 64;
    while let Some(face_idx) = faces.iter().position(|f| !f.outside.is_empty()) {
        budget = budget.checked_sub(1).ok_or(GeometryError::DegenerateHull)?;

        let face = &faces[face_idx];
        let &apex = face
            .outside
            .iter()
            .max_by(|&&a, &&b| {
                face.plane
                    .signed_distance(points[a])
                    .partial_cmp(&face.plane.signed_distance(points[b]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("outside set is non-empty");

        // Faces the apex can see.
        let visible: Vec<usize> = (0..faces.len())
            .filter(|&i| faces[i].plane.signed_distance(points[apex]) > EPSILON)
            .collect();

        // Directed edges of visible faces; the horizon is each edge whose
        // reverse belongs to a hidden face.
        let mut edges = std::collections::HashSet::new();
        for &i in &visible {
            let [a, b, c] = faces[i].vertices;
            edges.insert((a, b));
            edges.insert((b, c));
            edges.insert((c, a));
        }
        let horizon: Vec<(usize, usize)> = edges
            .iter()
            .filter(|(a, b)| !edges.contains(&(*b, *a)))
            .copied()
            .collect();

        // Points orphaned by the removed faces.
        let mut orphans: Vec<usize> = Vec::new();
        for &i in &visible {
            orphans.extend(faces[i].outside.iter().copied());
        }
        orphans.retain(|&p| p != apex);

        let keep: Vec<HullFace> = faces
            .iter()
            .enumerate()
            .filter(|(i, _)| !visible.contains(i))
            .map(|(_, f)| f.clone())
            .collect();
        faces = keep;
        for (a, b) in horizon {
            if let Some(face) = HullFace::new([a, b, apex], points) {
                faces.push(face);
            }
        }
        assign_outside(&mut faces, &orphans, points);
    }
    Ok(faces)
}

/// Seeds the hull with an outward-wound tetrahedron over extreme points.
fn initial_simplex(points: &[DVec3]) -> Result<Vec<HullFace>, GeometryError> {
    // Most distant pair along the axes.
    let (mut a, mut b) = (0, 0);
    for axis in [DVec3::X, DVec3::Y, DVec3::Z] {
        let lo = (0..points.len())
            .min_by(|&i, &j| cmp_f64(points[i].dot(axis), points[j].dot(axis)))
            .unwrap_or(0);
        let hi = (0..points.len())
            .max_by(|&i, &j| cmp_f64(points[i].dot(axis), points[j].dot(axis)))
            .unwrap_or(0);
        if (points[hi] - points[lo]).length_squared()
            > (points[b] - points[a]).length_squared()
        {
            a = lo;
            b = hi;
        }
    }
    if (points[b] - points[a]).length_squared() <= EPSILON * EPSILON {
        return Err(GeometryError::DegenerateHull);
    }

    // Farthest point from the line a-b.
    let dir = (points[b] - points[a]).normalize();
    let c = (0..points.len())
        .max_by(|&i, &j| {
            let di = (points[i] - points[a]).cross(dir).length_squared();
            let dj = (points[j] - points[a]).cross(dir).length_squared();
            cmp_f64(di, dj)
        })
        .ok_or(GeometryError::DegenerateHull)?;
    let base = Plane::from_points(points[a], points[b], points[c])
        .ok_or(GeometryError::DegenerateHull)?;

    // Farthest point from the base plane.
    let d = (0..points.len())
        .max_by(|&i, &j| {
            cmp_f64(
                base.signed_distance(points[i]).abs(),
                base.signed_distance(points[j]).abs(),
            )
        })
        .ok_or(GeometryError::DegenerateHull)?;
    if base.signed_distance(points[d]).abs() <= EPSILON {
        return Err(GeometryError::DegenerateHull);
    }

    // Wind the four faces so every normal points away from the centroid.
    let centroid = (points[a] + points[b] + points[c] + points[d]) / 4.0;
    let mut faces = Vec::with_capacity(4);
    for tri in [[a, b, c], [a, b, d], [a, c, d], [b, c, d]] {
        let face = HullFace::new(tri, points).ok_or(GeometryError::DegenerateHull)?;
        let face = if face.plane.signed_distance(centroid) > 0.0 {
            HullFace::new([tri[0], tri[2], tri[1]], points)
                .ok_or(GeometryError::DegenerateHull)?
        } else {
            face
        };
        faces.push(face);
    }
    Ok(faces)
}

fn assign_outside(faces: &mut [HullFace], candidates: &[usize], points: &[DVec3]) {
    for &p in candidates {
        for face in faces.iter_mut() {
            if face.plane.signed_distance(points[p]) > EPSILON {
                face.outside.push(p);
                break;
            }
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> std::cmp::Ordering {
    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hull_tetrahedron() {
        let points = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
        ];
        let mesh = hull(&points, None).unwrap();
        assert_eq!(mesh.polygons().len(), 4);
        assert!(mesh.is_convex());
        assert!(mesh.is_watertight());
        assert!(mesh.contains_point(DVec3::splat(0.1)));
        assert!(!mesh.contains_point(DVec3::splat(0.9)));
    }

    #[test]
    fn test_hull_ignores_interior_points() {
        let mut points = vec![
            DVec3::new(-1.0, -1.0, -1.0),
            DVec3::new(1.0, -1.0, -1.0),
            DVec3::new(1.0, 1.0, -1.0),
            DVec3::new(-1.0, 1.0, -1.0),
            DVec3::new(-1.0, -1.0, 1.0),
            DVec3::new(1.0, -1.0, 1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(-1.0, 1.0, 1.0),
        ];
        points.push(DVec3::ZERO); // interior
        points.push(DVec3::splat(0.25)); // interior
        let mesh = hull(&points, None).unwrap();
        // Cube corners only: 12 hull triangles.
        assert_eq!(mesh.polygons().len(), 12);
        let bounds = mesh.bounds();
        assert!((bounds.max.x - 1.0).abs() < 1e-9);
        assert!((bounds.min.x + 1.0).abs() < 1e-9);
        assert!(mesh.contains_point(DVec3::splat(0.99)));
    }

    #[test]
    fn test_hull_three_points_flat_fan() {
        let points = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let mesh = hull(&points, None).unwrap();
        assert_eq!(mesh.polygons().len(), 2); // front and back
        assert!(mesh.is_convex());
        assert!(mesh.is_watertight());
    }

    #[test]
    fn test_hull_coplanar_points_flat_fan() {
        let points = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::Y,
            DVec3::new(0.5, 0.5, 0.0), // interior of the square
        ];
        let mesh = hull(&points, None).unwrap();
        assert!(mesh.is_convex());
        // Outline is the square; interior point is swallowed.
        let unique: std::collections::HashSet<_> = mesh
            .polygons()
            .iter()
            .flat_map(|p| p.vertices().iter().map(|v| VectorKey::new(v.position)))
            .collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_hull_collinear_fails() {
        let points = [DVec3::ZERO, DVec3::X, DVec3::X * 2.0];
        assert_eq!(hull(&points, None), Err(GeometryError::DegenerateHull));
    }

    #[test]
    fn test_hull_too_few_fails() {
        assert_eq!(
            hull(&[DVec3::ZERO, DVec3::X], None),
            Err(GeometryError::DegenerateHull)
        );
    }
}

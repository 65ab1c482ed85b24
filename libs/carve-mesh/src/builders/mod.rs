//! # Mesh Builders
//!
//! Operators that turn paths and point sets into meshes: fill, extrude
//! (straight or along a guide path), lathe, loft, and convex hull.
//!
//! Builders mark watertightness on their output when the construction
//! guarantees it (closed planar sections, profiles meeting the axis);
//! convexity is only claimed by the hull.

mod hull;

pub use hull::hull;

use glam::{DQuat, DVec3};

use config::constants::EPSILON;

use crate::error::GeometryError;
use crate::material::Material;
use crate::math::Transform;
use crate::mesh::Mesh;
use crate::path::Path;
use crate::polygon::Polygon;
use crate::vertex::Vertex;

// =============================================================================
// FILL
// =============================================================================

/// Fills closed subpaths with flat double-sided faces.
///
/// Both sides are emitted so every edge has even multiplicity and the
/// result counts as watertight. Open subpaths have no face and are
/// skipped; a path with no closed subpath fills to the empty mesh.
pub fn fill(path: &Path, material: Option<&Material>) -> Result<Mesh, GeometryError> {
    let closed: Vec<Path> = path
        .subpaths()
        .into_iter()
        .filter(Path::is_closed)
        .collect();
    if closed.is_empty() {
        return Ok(Mesh::empty());
    }
    let mut polygons = Vec::new();
    for subpath in closed {
        let front = subpath.face_polygons(material)?;
        polygons.extend(front.iter().map(Polygon::flipped));
        polygons.extend(front);
    }
    Ok(Mesh::with_flags(polygons, None, Some(true)))
}

// =============================================================================
// EXTRUDE
// =============================================================================

/// Extrudes a section along a straight axis, centered on the section.
///
/// Side walls come from the section's edge vertices (curve-smoothed
/// normals survive onto the walls); caps close the ends for closed planar
/// subpaths, and only then is the output marked watertight.
pub fn extrude(
    shape: &Path,
    along: DVec3,
    material: Option<&Material>,
) -> Result<Mesh, GeometryError> {
    if along.length_squared() <= EPSILON * EPSILON {
        return Err(GeometryError::DegeneratePath(
            "extrusion axis has zero length".to_string(),
        ));
    }
    let half = along * 0.5;
    let mut polygons = Vec::new();
    let mut watertight = true;

    for sub in shape.subpaths() {
        let edge_vertices = sub.edge_vertices();
        if edge_vertices.is_empty() {
            continue;
        }
        for pair in edge_vertices.chunks(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let quad = vec![
                wall_vertex(a, -half, 0.0),
                wall_vertex(b, -half, 0.0),
                wall_vertex(b, half, 1.0),
                wall_vertex(a, half, 1.0),
            ];
            polygons.extend(wall_polygons(quad, material));
        }

        if sub.is_closed() && sub.plane().is_some() {
            let faces = sub.face_polygons(material)?;
            let up = faces[0].plane().normal.dot(along) >= 0.0;
            for face in faces {
                let (top, bottom) = if up {
                    (
                        face.transformed(&Transform::offset(half)),
                        face.flipped().transformed(&Transform::offset(-half)),
                    )
                } else {
                    (
                        face.flipped().transformed(&Transform::offset(half)),
                        face.transformed(&Transform::offset(-half)),
                    )
                };
                polygons.push(top);
                polygons.push(bottom);
            }
        } else {
            watertight = false;
        }
    }

    let polygons = ensure_outward(polygons, watertight);
    Ok(Mesh::with_flags(polygons, None, Some(watertight)))
}

/// Sweeps a section along a guide path.
///
/// The section is oriented perpendicular to the guide at every point
/// using parallel transport of the initial frame, which avoids sudden
/// twists around inflections. Caps are added at open guide ends when the
/// section is closed.
pub fn extrude_along(
    shape: &Path,
    rail: &Path,
    material: Option<&Material>,
) -> Result<Mesh, GeometryError> {
    let rail_points = rail.points();
    if rail_points.len() < 2 {
        return Err(GeometryError::DegeneratePath(
            "extrusion guide needs at least 2 points".to_string(),
        ));
    }
    let rail_closed = rail.is_closed();
    let ring_count = if rail_closed {
        rail_points.len() - 1
    } else {
        rail_points.len()
    };

    // Tangents, then parallel-transported frames.
    let tangent_at = |i: usize| -> DVec3 {
        let prev = if i > 0 {
            rail_points[i - 1].position
        } else if rail_closed {
            rail_points[ring_count - 1].position
        } else {
            rail_points[0].position
        };
        let next = if i + 1 < rail_points.len() {
            rail_points[i + 1].position
        } else if rail_closed {
            rail_points[1].position
        } else {
            rail_points[i].position
        };
        (next - prev).normalize_or_zero()
    };
    let mut frames = Vec::with_capacity(ring_count);
    let mut rotation = DQuat::from_rotation_arc(DVec3::Z, tangent_at(0));
    let mut prev_tangent = tangent_at(0);
    for i in 0..ring_count {
        let tangent = tangent_at(i);
        rotation = DQuat::from_rotation_arc(prev_tangent, tangent) * rotation;
        prev_tangent = tangent;
        frames.push(Transform {
            offset: rail_points[i].position,
            rotation,
            scale: DVec3::ONE,
        });
    }

    let mut polygons = Vec::new();
    let mut watertight = rail_closed;
    let section_closed = shape.is_closed() && shape.plane().is_some();

    let edge_vertices = shape.edge_vertices();
    let span_count = if rail_closed { ring_count } else { ring_count - 1 };
    let rail_length = rail.length().max(f64::MIN_POSITIVE);
    let mut travelled = 0.0;
    for i in 0..span_count {
        let j = (i + 1) % ring_count;
        let v0 = travelled / rail_length;
        travelled += (rail_points[i + 1].position - rail_points[i].position).length();
        let v1 = travelled / rail_length;
        for pair in edge_vertices.chunks(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let quad = vec![
                ring_vertex(a, &frames[i], v0),
                ring_vertex(b, &frames[i], v0),
                ring_vertex(b, &frames[j], v1),
                ring_vertex(a, &frames[j], v1),
            ];
            polygons.extend(wall_polygons(quad, material));
        }
    }

    if !rail_closed {
        if section_closed {
            let faces = shape.face_polygons(material)?;
            for face in &faces {
                polygons.push(face.flipped().transformed(&frames[0]));
                polygons.push(face.transformed(&frames[ring_count - 1]));
            }
        } else {
            watertight = false;
        }
    }
    if !section_closed {
        watertight = false;
    }

    let polygons = ensure_outward(polygons, watertight);
    Ok(Mesh::with_flags(polygons, None, Some(watertight)))
}

// =============================================================================
// LATHE
// =============================================================================

/// Revolves a profile around the Y axis in `segments` angular slices.
///
/// The profile is first clipped to the x <= 0 half-plane. Seam slices
/// share exact positions (angle indices wrap modulo `segments`), so the
/// seam is merged rather than duplicated. The result is watertight when
/// each profile subpath is closed or starts and ends on the axis.
pub fn lathe(
    profile: &Path,
    segments: u32,
    material: Option<&Material>,
) -> Result<Mesh, GeometryError> {
    let segments = segments.max(3);
    let clipped = profile.clipped_to_y_axis();
    if clipped.points().len() < 2 {
        return Err(GeometryError::DegeneratePath(
            "lathe profile is empty after clipping to the axis".to_string(),
        ));
    }

    let mut polygons = Vec::new();
    let mut watertight = true;
    for sub in clipped.subpaths() {
        let edge_vertices = sub.edge_vertices();
        if edge_vertices.is_empty() {
            continue;
        }
        let on_axis = |v: &Vertex| v.position.x.abs() <= EPSILON;
        if !sub.is_closed() {
            let first = &edge_vertices[0];
            let last = &edge_vertices[edge_vertices.len() - 1];
            if !on_axis(first) || !on_axis(last) {
                watertight = false;
            }
        }

        for pair in edge_vertices.chunks(2) {
            let (a, b) = (&pair[0], &pair[1]);
            for j in 0..segments {
                let theta0 = angle(j, segments);
                let theta1 = angle((j + 1) % segments, segments);
                let u0 = f64::from(j) / f64::from(segments);
                let u1 = f64::from(j + 1) / f64::from(segments);
                let quad = vec![
                    revolved(a, theta0, u0),
                    revolved(b, theta0, u0),
                    revolved(b, theta1, u1),
                    revolved(a, theta1, u1),
                ];
                polygons.extend(wall_polygons(quad, material));
            }
        }
    }

    let polygons = ensure_outward(polygons, watertight);
    Ok(Mesh::with_flags(polygons, None, Some(watertight)))
}

fn angle(step: u32, segments: u32) -> f64 {
    std::f64::consts::TAU * f64::from(step) / f64::from(segments)
}

/// Rotates an XY-plane profile vertex around the Y axis.
fn revolved(v: &Vertex, theta: f64, u: f64) -> Vertex {
    let (sin, cos) = theta.sin_cos();
    let rotate = |p: DVec3| DVec3::new(p.x * cos, p.y, -p.x * sin);
    Vertex::with_normal(rotate(v.position), rotate(v.normal))
        .with_texcoord(DVec3::new(u, v.texcoord.y, 0.0))
        .with_color(v.color)
}

// =============================================================================
// LOFT
// =============================================================================

/// Triangulates ruled surfaces between successive sections.
///
/// Sections are resampled to a common vertex count by arc length. Closed
/// end sections are capped, and only a loft whose every section is closed
/// and whose ends are capped is marked watertight.
pub fn loft(sections: &[Path], material: Option<&Material>) -> Result<Mesh, GeometryError> {
    if sections.len() < 2 {
        return Err(GeometryError::DegeneratePath(
            "loft needs at least 2 sections".to_string(),
        ));
    }
    let all_closed = sections.iter().all(|s| s.is_closed());
    let samples = sections
        .iter()
        .map(|s| ring_positions(s).len())
        .max()
        .unwrap_or(0)
        .max(2);

    let mut resampled_any = false;
    let rings: Vec<Vec<DVec3>> = sections
        .iter()
        .map(|s| {
            let ring = ring_positions(s);
            if ring.len() == samples {
                ring
            } else {
                resampled_any = true;
                resample(s, samples)
            }
        })
        .collect();

    let mut polygons = Vec::new();
    let ring_len = rings[0].len();
    for (step, window) in rings.windows(2).enumerate() {
        let (r0, r1) = (&window[0], &window[1]);
        let v0 = step as f64 / (rings.len() - 1) as f64;
        let v1 = (step + 1) as f64 / (rings.len() - 1) as f64;
        let spans = if all_closed { ring_len } else { ring_len - 1 };
        for i in 0..spans {
            let j = (i + 1) % ring_len;
            let u0 = i as f64 / spans as f64;
            let u1 = (i + 1) as f64 / spans as f64;
            let quad = vec![
                Vertex::new(r0[i]).with_texcoord(DVec3::new(u0, v0, 0.0)),
                Vertex::new(r0[j]).with_texcoord(DVec3::new(u1, v0, 0.0)),
                Vertex::new(r1[j]).with_texcoord(DVec3::new(u1, v1, 0.0)),
                Vertex::new(r1[i]).with_texcoord(DVec3::new(u0, v1, 0.0)),
            ];
            polygons.extend(wall_polygons(quad, material));
        }
    }

    // Resampling moves ring vertices off the section's own points, so the
    // caps would no longer share wall edges.
    let mut watertight = all_closed && !resampled_any;
    let first = sections.first().unwrap();
    let last = sections.last().unwrap();
    for (section, flip) in [(first, true), (last, false)] {
        if section.is_closed() && section.plane().is_some() {
            for face in section.face_polygons(material)? {
                polygons.push(if flip { face.flipped() } else { face });
            }
        } else {
            watertight = false;
        }
    }

    let polygons = ensure_outward(polygons, watertight);
    Ok(Mesh::with_flags(polygons, None, Some(watertight)))
}

/// Section positions with a closed section's duplicate endpoint removed.
fn ring_positions(path: &Path) -> Vec<DVec3> {
    let points = path.points();
    let take = if path.is_closed() {
        points.len() - 1
    } else {
        points.len()
    };
    points[..take].iter().map(|p| p.position).collect()
}

/// Resamples a path to exactly `samples` points by arc length.
fn resample(path: &Path, samples: usize) -> Vec<DVec3> {
    let points = path.points();
    let closed = path.is_closed();
    let total = path.length().max(f64::MIN_POSITIVE);
    let divisions = if closed { samples } else { samples - 1 };

    let mut out = Vec::with_capacity(samples);
    for k in 0..samples {
        let target = total * k as f64 / divisions as f64;
        let mut travelled = 0.0;
        let mut position = points[0].position;
        for w in points.windows(2) {
            let len = (w[1].position - w[0].position).length();
            if travelled + len >= target || len <= 0.0 {
                let t = if len > 0.0 { (target - travelled) / len } else { 0.0 };
                position = w[0].position.lerp(w[1].position, t.clamp(0.0, 1.0));
                break;
            }
            travelled += len;
            position = w[1].position;
        }
        out.push(position);
    }
    out
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

fn wall_vertex(v: &Vertex, offset: DVec3, height: f64) -> Vertex {
    Vertex::with_normal(v.position + offset, v.normal)
        .with_texcoord(DVec3::new(v.texcoord.y, height, 0.0))
        .with_color(v.color)
}

fn ring_vertex(v: &Vertex, frame: &Transform, along: f64) -> Vertex {
    let mut out = v.transformed(frame);
    out.texcoord = DVec3::new(v.texcoord.y, along, 0.0);
    out
}

/// Builds a polygon from a wall quad, splitting into triangles when the
/// quad is non-planar (curved surfaces) and dropping degenerate slivers
/// (seam and pole collapses).
fn wall_polygons(quad: Vec<Vertex>, material: Option<&Material>) -> Vec<Polygon> {
    match Polygon::with_material(quad.clone(), material.cloned()) {
        Ok(poly) => vec![poly],
        Err(_) => {
            let mut out = Vec::new();
            for tri in [[0, 1, 2], [0, 2, 3]] {
                let vertices: Vec<Vertex> =
                    tri.iter().map(|&i| quad[i].clone()).collect();
                if let Ok(poly) = Polygon::with_material(vertices, material.cloned()) {
                    out.push(poly);
                }
            }
            out
        }
    }
}

/// Flips the whole surface when a closed construction came out inside-out
/// (negative enclosed volume). Open surfaces are left as built.
fn ensure_outward(polygons: Vec<Polygon>, closed: bool) -> Vec<Polygon> {
    if !closed || polygons.is_empty() {
        return polygons;
    }
    let mut volume = 0.0;
    for poly in &polygons {
        for tri in poly.triangulated() {
            let v = tri.vertices();
            volume += v[0]
                .position
                .dot(v[1].position.cross(v[2].position));
        }
    }
    if volume < 0.0 {
        polygons.iter().map(Polygon::flipped).collect()
    } else {
        polygons
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathPoint;
    use approx::assert_relative_eq;

    #[test]
    fn test_fill_square_is_double_sided() {
        let mesh = fill(&Path::square(), None).unwrap();
        assert_eq!(mesh.polygons().len(), 2);
        assert!(mesh.is_watertight());
    }

    #[test]
    fn test_fill_open_path_is_empty() {
        let open = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::X),
            PathPoint::sharp(DVec3::Y),
        ]);
        assert!(fill(&open, None).unwrap().is_empty());
    }

    #[test]
    fn test_extrude_square_is_box() {
        let mesh = extrude(&Path::square(), DVec3::Z, None).unwrap();
        // 4 walls + 2 caps.
        assert_eq!(mesh.polygons().len(), 6);
        assert!(mesh.is_watertight());
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min.z, -0.5, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.z, 0.5, epsilon = 1e-9);
        assert!(mesh.contains_point(DVec3::ZERO));
    }

    #[test]
    fn test_extrude_open_path_is_open_surface() {
        let open = Path::from_points(vec![
            PathPoint::sharp(DVec3::new(-1.0, 0.0, 0.0)),
            PathPoint::sharp(DVec3::new(1.0, 0.0, 0.0)),
        ]);
        let mesh = extrude(&open, DVec3::Z, None).unwrap();
        assert_eq!(mesh.polygons().len(), 1);
        assert!(!mesh.is_watertight());
    }

    #[test]
    fn test_extrude_zero_axis_fails() {
        let result = extrude(&Path::square(), DVec3::ZERO, None);
        assert!(matches!(result, Err(GeometryError::DegeneratePath(_))));
    }

    #[test]
    fn test_extrude_along_straight_rail_matches_linear() {
        let rail = Path::from_points(vec![
            PathPoint::sharp(DVec3::new(0.0, 0.0, -0.5)),
            PathPoint::sharp(DVec3::new(0.0, 0.0, 0.5)),
        ]);
        let swept = extrude_along(&Path::square(), &rail, None).unwrap();
        assert!(swept.is_watertight());
        assert!(swept.contains_point(DVec3::ZERO));
        let bounds = swept.bounds();
        assert_relative_eq!(bounds.min.z, -0.5, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.z, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_lathe_square_profile_is_cylinder() {
        // Left half-square profile revolves into a cylinder.
        let profile = Path::from_points(vec![
            PathPoint::sharp(DVec3::new(0.0, 0.5, 0.0)),
            PathPoint::sharp(DVec3::new(-0.5, 0.5, 0.0)),
            PathPoint::sharp(DVec3::new(-0.5, -0.5, 0.0)),
            PathPoint::sharp(DVec3::new(0.0, -0.5, 0.0)),
        ]);
        let mesh = lathe(&profile, 16, None).unwrap();
        assert!(mesh.is_watertight());
        assert!(mesh.contains_point(DVec3::ZERO));
        assert!(mesh.contains_point(DVec3::new(0.4, 0.0, 0.0)));
        assert!(!mesh.contains_point(DVec3::new(0.6, 0.0, 0.0)));
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.max.y, 0.5, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.x, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_lathe_seam_is_merged() {
        let profile = Path::from_points(vec![
            PathPoint::sharp(DVec3::new(0.0, 0.5, 0.0)),
            PathPoint::sharp(DVec3::new(-0.5, 0.0, 0.0)),
            PathPoint::sharp(DVec3::new(0.0, -0.5, 0.0)),
        ]);
        let mesh = lathe(&profile, 8, None).unwrap();
        // Watertight without repair means the seam shares exact vertices.
        assert!(mesh.is_watertight());
    }

    #[test]
    fn test_loft_between_squares() {
        use crate::math::Transform;
        let bottom = Path::square().transformed(&Transform::offset(DVec3::new(0.0, 0.0, -0.5)));
        let top = Path::square().transformed(&Transform::offset(DVec3::new(0.0, 0.0, 0.5)));
        let mesh = loft(&[bottom, top], None).unwrap();
        assert!(mesh.is_watertight());
        assert!(mesh.contains_point(DVec3::ZERO));
    }

    #[test]
    fn test_loft_tapered_sections() {
        use crate::math::Transform;
        let bottom = Path::square().transformed(&Transform::offset(DVec3::new(0.0, 0.0, -0.5)));
        let top = Path::square()
            .transformed(&Transform::scale(DVec3::new(0.5, 0.5, 1.0)))
            .transformed(&Transform::offset(DVec3::new(0.0, 0.0, 0.5)));
        let mesh = loft(&[bottom, top], None).unwrap();
        assert!(mesh.is_watertight());
        assert!(mesh.contains_point(DVec3::ZERO));
        // Narrow at the top, wide at the bottom.
        assert!(mesh.contains_point(DVec3::new(0.4, 0.4, -0.45)));
        assert!(!mesh.contains_point(DVec3::new(0.4, 0.4, 0.45)));
    }

    #[test]
    fn test_loft_needs_two_sections() {
        let result = loft(&[Path::square()], None);
        assert!(matches!(result, Err(GeometryError::DegeneratePath(_))));
    }
}

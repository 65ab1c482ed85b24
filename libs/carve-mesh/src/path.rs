//! # Paths
//!
//! Ordered sequences of sharp/smooth control points in 3D: the input to
//! the extrude, lathe, loft, and fill builders.
//!
//! A path with curved control points is expanded at construction: each
//! curved point becomes a quadratic arc through the midpoints of its
//! neighbours, sampled `detail` times per half-arc. Expanded samples stay
//! marked as curved so side-wall normals smooth across them.

use config::constants::EPSILON;
use glam::{DVec2, DVec3};

use crate::error::GeometryError;
use crate::material::{Color, Material};
use crate::math::{approx_eq_vec, Bounds};
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::vertex::Vertex;

// =============================================================================
// PATH POINT
// =============================================================================

/// A path control point.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPoint {
    /// Position in scene space.
    pub position: DVec3,
    /// Smooth (curve) points get interpolated geometry and smoothed
    /// side-wall normals; sharp points produce hard edges.
    pub is_curved: bool,
    /// Optional per-point color, carried onto generated vertices.
    pub color: Option<Color>,
    /// Optional texture-coordinate override.
    pub texcoord: Option<DVec3>,
}

impl PathPoint {
    /// A sharp corner point.
    pub fn sharp(position: DVec3) -> Self {
        Self {
            position,
            is_curved: false,
            color: None,
            texcoord: None,
        }
    }

    /// A smooth curve control point.
    pub fn curved(position: DVec3) -> Self {
        Self {
            is_curved: true,
            ..Self::sharp(position)
        }
    }

    /// Returns a copy with the given color.
    #[must_use]
    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    fn lerp(&self, other: &PathPoint, t: f64) -> PathPoint {
        let color = match (self.color, other.color) {
            (Some(a), Some(b)) => Some(a.lerp(&b, t)),
            (a, b) => a.or(b),
        };
        PathPoint {
            position: self.position.lerp(other.position, t),
            is_curved: self.is_curved && other.is_curved,
            color,
            texcoord: None,
        }
    }
}

// =============================================================================
// PATH
// =============================================================================

/// An ordered, possibly closed point sequence.
///
/// A path is closed when its first and last positions coincide.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    points: Vec<PathPoint>,
}

impl Path {
    /// Path over already-expanded points.
    pub fn from_points(points: Vec<PathPoint>) -> Self {
        Self { points }
    }

    /// Path from control points, expanding curves at the given detail.
    ///
    /// Each curved control point is replaced by samples of the quadratic
    /// arc from the midpoint (or sharp anchor) before it to the midpoint
    /// (or sharp anchor) after it, `detail` segments per half-arc.
    pub fn new(points: Vec<PathPoint>, detail: u32) -> Self {
        Self {
            points: flatten_curves(points, detail.max(1)),
        }
    }

    /// The (expanded) point list.
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// True when first and last positions coincide.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2
            && approx_eq_vec(
                self.points[0].position,
                self.points[self.points.len() - 1].position,
            )
    }

    /// Bounds of all points.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.points.iter().map(|p| p.position))
    }

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].position - w[0].position).length())
            .sum()
    }

    /// The supporting plane, when all points are coplanar.
    ///
    /// The normal follows the winding (Newell's method): a loop that reads
    /// counter-clockwise from +Z has normal +Z. Returns `None` for
    /// non-planar or degenerate paths.
    pub fn plane(&self) -> Option<Plane> {
        let positions: Vec<DVec3> = self.loop_positions();
        let plane = Plane::from_loop(&positions)?;
        if positions.iter().all(|p| plane.contains_point(*p)) {
            Some(plane)
        } else {
            None
        }
    }

    /// True when no two non-adjacent edges cross.
    ///
    /// Non-planar paths are reported simple; crossing detection happens in
    /// the path's plane.
    pub fn is_simple(&self) -> bool {
        let plane = match self.plane() {
            Some(p) => p,
            None => return true,
        };
        let points = project_to_plane(&self.loop_positions(), &plane);
        let n = points.len();
        if n < 4 {
            return true;
        }
        let closed = self.is_closed();
        let segments = if closed { n } else { n - 1 };
        for i in 0..segments {
            for j in (i + 1)..segments {
                // Skip adjacent segments (they share an endpoint).
                if j == i + 1 || (closed && i == 0 && j == segments - 1) {
                    continue;
                }
                let (a0, a1) = (points[i], points[(i + 1) % n]);
                let (b0, b1) = (points[j], points[(j + 1) % n]);
                if segments_cross(a0, a1, b0, b1) {
                    return false;
                }
            }
        }
        true
    }

    /// Decomposes the path at self-touching joints.
    ///
    /// Walking the points, whenever a position matches an earlier
    /// non-adjacent position of the subpath in progress, the loop between
    /// the two is closed off and the walk continues from the joint.
    pub fn subpaths(&self) -> Vec<Path> {
        let mut result: Vec<Path> = Vec::new();
        let mut current: Vec<PathPoint> = Vec::new();
        for point in &self.points {
            let earlier = current
                .iter()
                .position(|q| approx_eq_vec(q.position, point.position));
            if let Some(idx) = earlier {
                if idx + 1 < current.len() {
                    let mut looped = current.split_off(idx);
                    looped.push(point.clone());
                    result.push(Path::from_points(looped));
                    // The joint continues the remaining walk.
                    current.push(point.clone());
                    continue;
                }
            }
            current.push(point.clone());
        }
        if current.len() > 1 {
            result.push(Path::from_points(current));
        } else if result.is_empty() && !self.points.is_empty() {
            result.push(self.clone());
        }
        result
    }

    /// Tessellates each closed subpath into filled face polygons.
    ///
    /// Faces wind with the path: the polygon normal matches the path
    /// plane's. Texture coordinates map the face's bounds to the unit
    /// square.
    pub fn face_polygons(
        &self,
        material: Option<&Material>,
    ) -> Result<Vec<Polygon>, GeometryError> {
        let mut faces = Vec::new();
        for subpath in self.subpaths() {
            if !subpath.is_closed() {
                continue;
            }
            let plane = subpath.plane().ok_or_else(|| {
                GeometryError::DegeneratePath("cannot fill a non-planar path".to_string())
            })?;
            let bounds = subpath.bounds();
            let size = bounds.size().max(DVec3::splat(f64::MIN_POSITIVE));
            let vertices: Vec<Vertex> = subpath.points[..subpath.points.len() - 1]
                .iter()
                .map(|p| {
                    let uv = (p.position - bounds.min) / size;
                    Vertex::with_normal(p.position, plane.normal)
                        .with_texcoord(p.texcoord.unwrap_or(uv))
                        .with_color(p.color)
                })
                .collect();
            faces.extend(Polygon::tessellating(vertices, material.cloned())?);
        }
        if faces.is_empty() {
            return Err(GeometryError::DegeneratePath(
                "path has no closed subpath to fill".to_string(),
            ));
        }
        Ok(faces)
    }

    /// Emits side-wall vertex pairs, one `(start, end)` pair per segment.
    ///
    /// Where consecutive segments meet at a curved point the duplicated
    /// joint vertices share the averaged normal; sharp joints keep each
    /// segment's own outward normal. The `texcoord.y` channel carries
    /// cumulative arc length normalized to [0, 1].
    pub fn edge_vertices(&self) -> Vec<Vertex> {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        let closed = self.is_closed();
        let normal = self
            .plane()
            .map(|p| p.normal)
            .unwrap_or_else(|| fallback_normal(&self.points));

        let segment_count = n - 1;
        let mut directions = Vec::with_capacity(segment_count);
        let mut lengths = Vec::with_capacity(segment_count);
        for w in self.points.windows(2) {
            let d = w[1].position - w[0].position;
            lengths.push(d.length());
            directions.push(d.normalize_or_zero());
        }
        let total: f64 = lengths.iter().sum();
        let total = if total <= f64::MIN_POSITIVE { 1.0 } else { total };
        let seg_normals: Vec<DVec3> = directions
            .iter()
            .map(|d| d.cross(normal).normalize_or_zero())
            .collect();

        let joint_normal = |point_idx: usize, seg_idx: usize| -> DVec3 {
            let point = &self.points[point_idx];
            if !point.is_curved {
                return seg_normals[seg_idx];
            }
            // Neighbouring segment across this joint, wrapping when closed.
            let other = if point_idx == seg_idx {
                // Start of segment: previous segment ends here.
                if seg_idx > 0 {
                    Some(seg_idx - 1)
                } else if closed {
                    Some(segment_count - 1)
                } else {
                    None
                }
            } else {
                // End of segment: next segment starts here.
                if seg_idx + 1 < segment_count {
                    Some(seg_idx + 1)
                } else if closed {
                    Some(0)
                } else {
                    None
                }
            };
            match other {
                Some(o) => (seg_normals[seg_idx] + seg_normals[o]).normalize_or_zero(),
                None => seg_normals[seg_idx],
            }
        };

        let mut vertices = Vec::with_capacity(segment_count * 2);
        let mut travelled = 0.0;
        for i in 0..segment_count {
            let start = &self.points[i];
            let end = &self.points[i + 1];
            let v0 = travelled / total;
            travelled += lengths[i];
            let v1 = travelled / total;
            vertices.push(
                Vertex::with_normal(start.position, joint_normal(i, i))
                    .with_texcoord(DVec3::new(0.0, v0, 0.0))
                    .with_color(start.color),
            );
            vertices.push(
                Vertex::with_normal(end.position, joint_normal(i + 1, i))
                    .with_texcoord(DVec3::new(0.0, v1, 0.0))
                    .with_color(end.color),
            );
        }
        vertices
    }

    /// Splits the path against the plane `x = 0`, retaining the x <= 0
    /// half-space. Used by the lathe builder to keep profiles on one side
    /// of the axis of revolution.
    pub fn clipped_to_y_axis(&self) -> Path {
        let mut out: Vec<PathPoint> = Vec::new();
        let n = self.points.len();
        for i in 0..n {
            let mut point = self.points[i].clone();
            let x = point.position.x;
            if x <= EPSILON {
                if x > 0.0 {
                    point.position.x = 0.0;
                }
                out.push(point.clone());
            }
            if i + 1 < n {
                let next = &self.points[i + 1];
                let (x0, x1) = (point.position.x, next.position.x);
                if (x0 < -EPSILON && x1 > EPSILON) || (x0 > EPSILON && x1 < -EPSILON) {
                    let t = x0 / (x0 - x1);
                    let mut crossing = point.lerp(next, t);
                    crossing.position.x = 0.0;
                    out.push(crossing);
                }
            }
        }
        Path::from_points(out)
    }

    /// Applies a transform to every point.
    #[must_use]
    pub fn transformed(&self, transform: &crate::math::Transform) -> Path {
        Path {
            points: self
                .points
                .iter()
                .map(|p| PathPoint {
                    position: transform.apply(p.position),
                    ..p.clone()
                })
                .collect(),
        }
    }

    /// Positions with a closed path's duplicate endpoint removed.
    fn loop_positions(&self) -> Vec<DVec3> {
        let mut positions: Vec<DVec3> = self.points.iter().map(|p| p.position).collect();
        if self.is_closed() {
            positions.pop();
        }
        positions
    }
}

// =============================================================================
// SHAPE CONSTRUCTORS
// =============================================================================

impl Path {
    /// Closed circle of diameter 1 in the XY plane, `segments` straight
    /// edges, counter-clockwise, all points smooth.
    pub fn circle(segments: u32) -> Path {
        let segments = segments.max(3);
        let r = 0.5;
        let mut points = Vec::with_capacity(segments as usize + 1);
        for i in 0..=segments {
            let theta = std::f64::consts::TAU * f64::from(i % segments) / f64::from(segments);
            points.push(PathPoint::curved(DVec3::new(
                r * theta.cos(),
                r * theta.sin(),
                0.0,
            )));
        }
        Path::from_points(points)
    }

    /// Closed unit square in the XY plane, counter-clockwise.
    pub fn square() -> Path {
        Self::rectangle(1.0, 1.0)
    }

    /// Closed axis-aligned rectangle in the XY plane.
    pub fn rectangle(width: f64, height: f64) -> Path {
        let (w, h) = (width * 0.5, height * 0.5);
        Path::from_points(vec![
            PathPoint::sharp(DVec3::new(-w, -h, 0.0)),
            PathPoint::sharp(DVec3::new(w, -h, 0.0)),
            PathPoint::sharp(DVec3::new(w, h, 0.0)),
            PathPoint::sharp(DVec3::new(-w, h, 0.0)),
            PathPoint::sharp(DVec3::new(-w, -h, 0.0)),
        ])
    }

    /// Closed regular polygon of circumradius `radius`, apex up.
    pub fn regular_polygon(sides: u32, radius: f64) -> Path {
        let sides = sides.max(3);
        let start = std::f64::consts::FRAC_PI_2;
        let mut points = Vec::with_capacity(sides as usize + 1);
        for i in 0..=sides {
            let theta = start + std::f64::consts::TAU * f64::from(i % sides) / f64::from(sides);
            points.push(PathPoint::sharp(DVec3::new(
                radius * theta.cos(),
                radius * theta.sin(),
                0.0,
            )));
        }
        Path::from_points(points)
    }

    /// Closed rounded rectangle; corner arcs are sampled smooth points.
    pub fn roundrect(width: f64, height: f64, radius: f64, detail: u32) -> Path {
        let r = radius.clamp(0.0, width.min(height) * 0.5);
        if r <= EPSILON {
            return Self::rectangle(width, height);
        }
        let (w, h) = (width * 0.5, height * 0.5);
        let arc_steps = (detail / 4).max(1);
        // Corner centers, counter-clockwise from bottom-right, with the
        // angle each corner arc starts at.
        let corners = [
            (DVec3::new(w - r, -(h - r), 0.0), -std::f64::consts::FRAC_PI_2),
            (DVec3::new(w - r, h - r, 0.0), 0.0),
            (DVec3::new(-(w - r), h - r, 0.0), std::f64::consts::FRAC_PI_2),
            (DVec3::new(-(w - r), -(h - r), 0.0), std::f64::consts::PI),
        ];
        let mut points = Vec::new();
        for (center, start) in corners {
            for step in 0..=arc_steps {
                let theta = start
                    + std::f64::consts::FRAC_PI_2 * f64::from(step) / f64::from(arc_steps);
                points.push(PathPoint::curved(
                    center + DVec3::new(r * theta.cos(), r * theta.sin(), 0.0),
                ));
            }
        }
        points.push(points[0].clone());
        Path::from_points(points)
    }
}

// =============================================================================
// CURVE EXPANSION
// =============================================================================

/// Expands curved control points into quadratic arc samples.
fn flatten_curves(points: Vec<PathPoint>, detail: u32) -> Vec<PathPoint> {
    if points.iter().all(|p| !p.is_curved) || points.len() < 3 {
        return points;
    }
    let closed = points.len() > 2
        && approx_eq_vec(points[0].position, points[points.len() - 1].position);
    // Work on the ring without the duplicate closing point.
    let ring: &[PathPoint] = if closed {
        &points[..points.len() - 1]
    } else {
        &points
    };
    let n = ring.len();
    let neighbor = |i: isize| -> Option<&PathPoint> {
        if closed {
            Some(&ring[i.rem_euclid(n as isize) as usize])
        } else if i < 0 || i >= n as isize {
            None
        } else {
            Some(&ring[i as usize])
        }
    };

    let mut out: Vec<PathPoint> = Vec::new();
    for i in 0..n {
        let point = &ring[i];
        let (prev, next) = (neighbor(i as isize - 1), neighbor(i as isize + 1));
        if !point.is_curved || prev.is_none() || next.is_none() {
            // Sharp points and open-path endpoints pass through.
            out.push(PathPoint {
                is_curved: false,
                ..point.clone()
            });
            continue;
        }
        let (prev, next) = (prev.unwrap(), next.unwrap());
        let a0 = if prev.is_curved {
            prev.lerp(point, 0.5)
        } else {
            prev.clone()
        };
        let a1 = if next.is_curved {
            point.lerp(next, 0.5)
        } else {
            next.clone()
        };
        // Quadratic arc a0 -> point -> a1, `detail` segments per half.
        let steps = detail * 2;
        for step in 1..=steps {
            let t = f64::from(step) / f64::from(steps);
            if t >= 1.0 && !next.is_curved {
                break; // the sharp anchor emits itself
            }
            let q0 = a0.lerp(point, t);
            let q1 = point.lerp(&a1, t);
            let mut sample = q0.lerp(&q1, t);
            sample.is_curved = true;
            out.push(sample);
        }
    }
    if closed && !out.is_empty() {
        let first = out[0].clone();
        out.push(first);
    }
    out
}

// =============================================================================
// GEOMETRY HELPERS
// =============================================================================

fn project_to_plane(positions: &[DVec3], plane: &Plane) -> Vec<DVec2> {
    let u = if plane.normal.x.abs() < 0.9 {
        (DVec3::X - plane.normal * plane.normal.x).normalize()
    } else {
        (DVec3::Y - plane.normal * plane.normal.y).normalize()
    };
    let v = plane.normal.cross(u);
    positions
        .iter()
        .map(|p| DVec2::new(p.dot(u), p.dot(v)))
        .collect()
}

fn segments_cross(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> bool {
    let d = |p: DVec2, q: DVec2, r: DVec2| (q - p).perp_dot(r - p);
    let d1 = d(b0, b1, a0);
    let d2 = d(b0, b1, a1);
    let d3 = d(a0, a1, b0);
    let d4 = d(a0, a1, b1);
    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

/// Any usable normal for a path without a fitted plane.
fn fallback_normal(points: &[PathPoint]) -> DVec3 {
    for w in points.windows(3) {
        let n = (w[1].position - w[0].position).cross(w[2].position - w[1].position);
        if n.length_squared() > EPSILON * EPSILON {
            return n.normalize();
        }
    }
    DVec3::Z
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_detection() {
        assert!(Path::square().is_closed());
        let open = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::X),
        ]);
        assert!(!open.is_closed());
    }

    #[test]
    fn test_plane_follows_winding() {
        // Counter-clockwise square has normal +Z.
        let plane = Path::square().plane().unwrap();
        assert_relative_eq!(plane.normal.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_planar_path_has_no_plane() {
        let path = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::X),
            PathPoint::sharp(DVec3::new(1.0, 1.0, 0.0)),
            PathPoint::sharp(DVec3::new(0.0, 1.0, 1.0)),
            PathPoint::sharp(DVec3::ZERO),
        ]);
        assert!(path.plane().is_none());
    }

    #[test]
    fn test_is_simple() {
        assert!(Path::square().is_simple());
        // Lopsided bowtie: two non-adjacent edges cross.
        let bowtie = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::new(1.0, 1.0, 0.0)),
            PathPoint::sharp(DVec3::new(1.0, 0.0, 0.0)),
            PathPoint::sharp(DVec3::new(0.0, 2.0, 0.0)),
            PathPoint::sharp(DVec3::ZERO),
        ]);
        assert!(!bowtie.is_simple());
    }

    #[test]
    fn test_subpaths_plain_path() {
        let square = Path::square();
        let subs = square.subpaths();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].points().len(), square.points().len());
    }

    #[test]
    fn test_subpaths_figure_eight() {
        // Two loops joined at the origin.
        let figure = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::new(1.0, 0.0, 0.0)),
            PathPoint::sharp(DVec3::new(1.0, 1.0, 0.0)),
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::new(-1.0, 0.0, 0.0)),
            PathPoint::sharp(DVec3::new(-1.0, -1.0, 0.0)),
            PathPoint::sharp(DVec3::ZERO),
        ]);
        let subs = figure.subpaths();
        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| s.is_closed()));
    }

    #[test]
    fn test_subpath_roundtrip_points() {
        let figure = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::X),
            PathPoint::sharp(DVec3::new(1.0, 1.0, 0.0)),
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::new(-1.0, 0.0, 0.0)),
            PathPoint::sharp(DVec3::ZERO),
        ]);
        let total: usize = figure.subpaths().iter().map(|s| s.points().len()).sum();
        // Concatenation reproduces the source modulo duplicated joints.
        assert!(total >= figure.points().len());
    }

    #[test]
    fn test_curve_expansion_segment_count() {
        // point/curve/point at detail 4: two half-arcs of 4 segments each.
        let path = Path::new(
            vec![
                PathPoint::sharp(DVec3::new(-1.0, 0.0, 0.0)),
                PathPoint::curved(DVec3::new(0.0, 1.0, 0.0)),
                PathPoint::sharp(DVec3::new(1.0, 0.0, 0.0)),
            ],
            4,
        );
        assert_eq!(path.points().len(), 9); // 8 segments
        let ev = path.edge_vertices();
        assert_eq!(ev.len(), 16); // 8 position-pairs
    }

    #[test]
    fn test_curve_endpoint_normals_are_segment_normals() {
        let path = Path::new(
            vec![
                PathPoint::sharp(DVec3::new(-1.0, 0.0, 0.0)),
                PathPoint::curved(DVec3::new(0.0, 1.0, 0.0)),
                PathPoint::sharp(DVec3::new(1.0, 0.0, 0.0)),
            ],
            4,
        );
        let ev = path.edge_vertices();
        let first_dir =
            (path.points()[1].position - path.points()[0].position).normalize();
        let plane_normal = path.plane().map(|p| p.normal).unwrap_or(DVec3::Z);
        let expected = first_dir.cross(plane_normal).normalize();
        assert_relative_eq!(ev[0].normal.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(ev[0].normal.y, expected.y, epsilon = 1e-9);
    }

    #[test]
    fn test_circle_edge_vertices_texcoords() {
        let circle = Path::circle(4);
        assert_eq!(circle.points().len(), 5); // 4 segments
        let ev = circle.edge_vertices();
        assert_eq!(ev.len(), 8);
        let expected = [0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0];
        for (vertex, want) in ev.iter().zip(expected) {
            assert_relative_eq!(vertex.texcoord.y, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_circle_joint_normals_are_smoothed() {
        let ev = Path::circle(4).edge_vertices();
        // Joint between segment 0 and 1 is duplicated at indices 1 and 2
        // and shares the averaged normal.
        assert_relative_eq!(ev[1].normal.x, ev[2].normal.x, epsilon = 1e-12);
        assert_relative_eq!(ev[1].normal.y, ev[2].normal.y, epsilon = 1e-12);
    }

    #[test]
    fn test_face_polygons_square() {
        let faces = Path::square().face_polygons(None).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].vertices().len(), 4);
        assert_relative_eq!(faces[0].plane().normal.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_face_polygons_rejects_open_path() {
        let open = Path::from_points(vec![
            PathPoint::sharp(DVec3::ZERO),
            PathPoint::sharp(DVec3::X),
            PathPoint::sharp(DVec3::Y),
        ]);
        assert!(open.face_polygons(None).is_err());
    }

    #[test]
    fn test_clip_to_y_axis() {
        // A square straddling x=0 keeps only its left half.
        let clipped = Path::square().clipped_to_y_axis();
        assert!(clipped.points().iter().all(|p| p.position.x <= EPSILON));
        let bounds = clipped.bounds();
        assert_relative_eq!(bounds.min.x, -0.5, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_regular_polygon() {
        let tri = Path::regular_polygon(3, 0.5);
        assert!(tri.is_closed());
        assert_eq!(tri.points().len(), 4);
        // Apex points up.
        assert_relative_eq!(tri.points()[0].position.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_roundrect_degenerates_to_rectangle() {
        let rect = Path::roundrect(2.0, 1.0, 0.0, 16);
        assert_eq!(rect.points().len(), 5);
    }

    #[test]
    fn test_roundrect_stays_in_bounds() {
        let rr = Path::roundrect(2.0, 1.0, 0.25, 16);
        assert!(rr.is_closed());
        let bounds = rr.bounds();
        assert_relative_eq!(bounds.max.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.y, 0.5, epsilon = 1e-9);
    }
}

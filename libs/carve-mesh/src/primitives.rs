//! # Solid Primitives
//!
//! Unit-sized solids centered on the origin. Sizing and placement happen
//! through scene transforms, so every primitive here spans [-0.5, 0.5] on
//! its principal axes.
//!
//! Curved primitives are expressed through the lathe so `detail` and
//! normal smoothing behave the same everywhere.

use glam::DVec3;

use config::constants::MIN_DETAIL;

use crate::builders;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::path::{Path, PathPoint};
use crate::plane::Plane;
use crate::polygon::Polygon;
use crate::vertex::Vertex;

/// Unit cube: 6 quads, watertight, convex.
pub fn cube() -> Mesh {
    cube_with_material(None)
}

/// Unit cube carrying a material.
pub fn cube_with_material(material: Option<&Material>) -> Mesh {
    let h = 0.5;
    // Face corners wound counter-clockwise seen from outside.
    let faces: [([f64; 3], [[f64; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]]),
        ([-1.0, 0.0, 0.0], [[-h, -h, h], [-h, h, h], [-h, h, -h], [-h, -h, -h]]),
        ([0.0, 1.0, 0.0], [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]]),
        ([0.0, -1.0, 0.0], [[-h, -h, h], [-h, -h, -h], [h, -h, -h], [h, -h, h]]),
        ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
        ([0.0, 0.0, -1.0], [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
    ];
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let polygons = faces
        .iter()
        .map(|(normal, corners)| {
            let n = DVec3::from_array(*normal);
            let vertices: Vec<Vertex> = corners
                .iter()
                .zip(uvs)
                .map(|(c, uv)| {
                    Vertex::with_normal(DVec3::from_array(*c), n)
                        .with_texcoord(DVec3::new(uv[0], uv[1], 0.0))
                })
                .collect();
            let plane = Plane::from_normal_and_point(n, DVec3::from_array(corners[0]));
            Polygon::from_parts(vertices, plane, material.cloned(), crate::polygon::fresh_id())
        })
        .collect();
    Mesh::with_flags(polygons, Some(true), Some(true))
}

/// Unit-diameter sphere: a lathed semicircle profile.
///
/// `detail` sets the angular segments; the profile uses half as many
/// stacks (minimum 2).
pub fn sphere(detail: u32) -> Mesh {
    sphere_with_material(detail, None)
}

/// Unit-diameter sphere carrying a material.
pub fn sphere_with_material(detail: u32, material: Option<&Material>) -> Mesh {
    let detail = detail.max(MIN_DETAIL);
    let stacks = (detail / 2).max(2);
    let r = 0.5;
    let mut points = Vec::with_capacity(stacks as usize + 1);
    for i in 0..=stacks {
        let t = std::f64::consts::PI * f64::from(i) / f64::from(stacks);
        // Top pole to bottom pole along the -x side.
        let point = DVec3::new(-r * t.sin(), r * t.cos(), 0.0);
        if i == 0 || i == stacks {
            points.push(PathPoint::sharp(point));
        } else {
            points.push(PathPoint::curved(point));
        }
    }
    let mesh = builders::lathe(&Path::from_points(points), detail, material)
        .expect("semicircle profile is never degenerate");
    mark_convex(mesh)
}

/// Unit cylinder (diameter and height 1) around the Y axis.
pub fn cylinder(detail: u32) -> Mesh {
    cylinder_with_material(detail, None)
}

/// Unit cylinder carrying a material.
pub fn cylinder_with_material(detail: u32, material: Option<&Material>) -> Mesh {
    let profile = Path::from_points(vec![
        PathPoint::sharp(DVec3::new(0.0, 0.5, 0.0)),
        PathPoint::sharp(DVec3::new(-0.5, 0.5, 0.0)),
        PathPoint::sharp(DVec3::new(-0.5, -0.5, 0.0)),
        PathPoint::sharp(DVec3::new(0.0, -0.5, 0.0)),
    ]);
    let mesh = builders::lathe(&profile, detail.max(MIN_DETAIL), material)
        .expect("cylinder profile is never degenerate");
    mark_convex(mesh)
}

/// Unit cone (base diameter and height 1) around the Y axis, apex up.
pub fn cone(detail: u32) -> Mesh {
    cone_with_material(detail, None)
}

/// Unit cone carrying a material.
pub fn cone_with_material(detail: u32, material: Option<&Material>) -> Mesh {
    let profile = Path::from_points(vec![
        PathPoint::sharp(DVec3::new(0.0, 0.5, 0.0)),
        PathPoint::sharp(DVec3::new(-0.5, -0.5, 0.0)),
        PathPoint::sharp(DVec3::new(0.0, -0.5, 0.0)),
    ]);
    let mesh = builders::lathe(&profile, detail.max(MIN_DETAIL), material)
        .expect("cone profile is never degenerate");
    mark_convex(mesh)
}

/// Pyramid with a regular `sides`-gon base, apex up, unit height.
pub fn pyramid(sides: u32, material: Option<&Material>) -> Mesh {
    let sides = sides.max(3);
    let apex = DVec3::new(0.0, 0.5, 0.0);
    // Base ring in the XZ plane at y = -0.5.
    let ring: Vec<DVec3> = base_ring(sides);

    let mut polygons = Vec::new();
    // Base face wound to face -Y.
    let base_vertices: Vec<Vertex> = ring
        .iter()
        .rev()
        .map(|&p| Vertex::with_normal(p, -DVec3::Y))
        .collect();
    let base_plane = Plane::from_normal_and_point(-DVec3::Y, ring[0]);
    polygons.push(Polygon::from_parts(
        base_vertices,
        base_plane,
        material.cloned(),
        crate::polygon::fresh_id(),
    ));
    for i in 0..sides as usize {
        let a = ring[i];
        let b = ring[(i + 1) % sides as usize];
        if let Ok(side) = Polygon::with_material(
            vec![Vertex::new(a), Vertex::new(b), Vertex::new(apex)],
            material.cloned(),
        ) {
            polygons.push(side);
        }
    }
    Mesh::with_flags(polygons, Some(true), Some(true))
}

/// Prism with a regular `sides`-gon cross-section, unit height along Y.
pub fn prism(sides: u32, material: Option<&Material>) -> Mesh {
    let sides = sides.max(3);
    // The base ring sits at y = -0.5, so walls rise to +0.5 unshifted.
    let ring = base_ring(sides);
    let mut polygons = Vec::new();
    for i in 0..sides as usize {
        let a = ring[i];
        let b = ring[(i + 1) % sides as usize];
        let quad = vec![
            Vertex::new(a),
            Vertex::new(b),
            Vertex::new(b + DVec3::Y),
            Vertex::new(a + DVec3::Y),
        ];
        if let Ok(side) = Polygon::with_material(quad, material.cloned()) {
            polygons.push(side);
        }
    }
    // Caps: top faces +Y, base reversed to face -Y.
    let top: Vec<Vertex> = ring
        .iter()
        .map(|&p| Vertex::with_normal(p + DVec3::Y, DVec3::Y))
        .collect();
    let bottom: Vec<Vertex> = ring
        .iter()
        .rev()
        .map(|&p| Vertex::with_normal(p, -DVec3::Y))
        .collect();
    for cap in [top, bottom] {
        if let Ok(face) = Polygon::with_material(cap, material.cloned()) {
            polygons.push(face);
        }
    }
    Mesh::with_flags(polygons, Some(true), Some(true))
}

/// Regular polygon ring of circumradius 0.5 in the XZ plane at y = -0.5,
/// wound so side walls face outward.
fn base_ring(sides: u32) -> Vec<DVec3> {
    (0..sides)
        .map(|i| {
            let theta = std::f64::consts::TAU * f64::from(i) / f64::from(sides);
            DVec3::new(0.5 * theta.sin(), -0.5, 0.5 * theta.cos())
        })
        .collect()
}

fn mark_convex(mesh: Mesh) -> Mesh {
    Mesh::with_flags(mesh.polygons().to_vec(), Some(true), Some(mesh.is_watertight()))
}

// =============================================================================
// TESTS
// =============================================================================

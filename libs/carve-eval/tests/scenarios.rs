//! End-to-end scenarios: source text through evaluation and mesh builds.

use std::sync::Arc;

use carve_eval::{evaluate, Delegate, GeometryKind, InMemoryFiles, Scene};
use carve_mesh::NEVER_CANCELLED;
use glam::DVec3;

fn scene(source: &str) -> Scene {
    let scene = evaluate(source, Arc::new(InMemoryFiles::new())).expect("evaluates");
    scene.build_meshes(NEVER_CANCELLED).expect("builds");
    scene
}

fn scene_with_log(source: &str) -> (Scene, Vec<String>) {
    let files = Arc::new(InMemoryFiles::new());
    let scene = evaluate(source, files.clone() as Arc<dyn Delegate>).expect("evaluates");
    scene.build_meshes(NEVER_CANCELLED).expect("builds");
    (scene, files.log())
}

#[test]
fn cube_size_two() {
    let scene = scene("cube { size 2 }");
    let mesh = scene.children[0].built_mesh().unwrap();
    assert_eq!(mesh.polygons().len(), 6);
    let bounds = mesh.bounds();
    assert!((bounds.min - DVec3::splat(-1.0)).length() < 1e-9);
    assert!((bounds.max - DVec3::splat(1.0)).length() < 1e-9);
    assert!(mesh.is_watertight());
    assert!(mesh.is_convex());
}

#[test]
fn difference_cube_sphere() {
    let scene = scene("difference {\ncube { size 2 }\nsphere { size 1.2 }\n}");
    let mesh = scene.children[0]
        .built_mesh()
        .unwrap()
        .make_watertight();
    assert!(mesh.is_watertight());
    // The sphere carved out the center.
    assert!(!mesh.contains_point(DVec3::ZERO));
    assert!(mesh.contains_point(DVec3::new(0.95, 0.0, 0.0)));
}

#[test]
fn curve_path_detail_four() {
    let scene = scene("detail 4\npath {\npoint -1 0\ncurve 0 1\npoint 1 0\n}");
    let shapes = match &scene.children[0].kind {
        GeometryKind::Fill { shapes } => shapes,
        other => panic!("expected fill node, got {other:?}"),
    };
    let edge_vertices = shapes[0].edge_vertices();
    // Two half-arcs of 4 segments each: 8 position-pairs.
    assert_eq!(edge_vertices.len(), 16);

    // Endpoint normals are the outward normals of the end segments.
    let points = shapes[0].points();
    let plane_normal = shapes[0].plane().unwrap().normal;
    let first_dir = (points[1].position - points[0].position).normalize();
    let expected = first_dir.cross(plane_normal).normalize();
    assert!((edge_vertices[0].normal - expected).length() < 1e-9);

    let n = points.len();
    let last_dir = (points[n - 1].position - points[n - 2].position).normalize();
    let expected = last_dir.cross(plane_normal).normalize();
    assert!((edge_vertices[15].normal - expected).length() < 1e-9);
}

#[test]
fn for_loop_prints_evens() {
    let (_, log) = scene_with_log("for i in 0 to 5 step 2 { print i }");
    assert_eq!(log, vec!["0", "2", "4"]);
}

#[test]
fn circle_edge_vertices_texcoords() {
    let scene = scene("detail 4\ncircle");
    let shapes = match &scene.children[0].kind {
        GeometryKind::Fill { shapes } => shapes,
        other => panic!("expected fill node, got {other:?}"),
    };
    let circle = &shapes[0];
    assert_eq!(circle.points().len(), 5); // 4 segments
    let edge_vertices = circle.edge_vertices();
    assert_eq!(edge_vertices.len(), 8);
    let expected = [0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0];
    for (vertex, want) in edge_vertices.iter().zip(expected) {
        assert!((vertex.texcoord.y - want).abs() < 1e-9);
    }
}

#[test]
fn rnd_sequence_is_reproducible() {
    let source = "seed 1\nprint rnd\nprint rnd\nprint rnd\nprint rnd";
    let (_, first) = scene_with_log(source);
    let (_, second) = scene_with_log(source);
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    // Values are in [0, 1) and not all identical.
    let values: Vec<f64> = first.iter().map(|s| s.parse().unwrap()).collect();
    assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
    assert!(values.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn evaluator_determinism_byte_identical() {
    let source = "seed 9\nfor i in 1 to 3 {\ntranslate rnd 0 0\ncube { size 0.5 + rnd }\n}";
    let a = scene(source);
    let b = scene(source);
    assert_eq!(a.children.len(), b.children.len());
    for (left, right) in a.children.iter().zip(&b.children) {
        assert_eq!(left.built_mesh().unwrap(), right.built_mesh().unwrap());
    }
}

#[test]
fn lathe_sphere_roundtrip() {
    let scene = scene("lathe {\npath {\npoint 0 0.5\ncurve -0.5 0\npoint 0 -0.5\n}\n}");
    let mesh = scene.children[0].built_mesh().unwrap();
    assert!(mesh.is_watertight());
    assert!(mesh.contains_point(DVec3::ZERO));
}

#[test]
fn extrude_default_square() {
    let scene = scene("extrude");
    let mesh = scene.children[0].built_mesh().unwrap();
    assert!(mesh.is_watertight());
    assert!(mesh.contains_point(DVec3::ZERO));
}

#[test]
fn hull_of_path_points() {
    let scene = scene(
        "hull {\npath {\npoint 0 0 0\npoint 1 0 0\npoint 0 1 0\npoint 0 0 1\n}\n}",
    );
    let mesh = scene.children[0].built_mesh().unwrap();
    assert!(mesh.is_convex());
    assert!(mesh.contains_point(DVec3::splat(0.1)));
}

#[test]
fn imported_mesh_document() {
    let doc = carve_mesh::MeshDocument::from_mesh(&carve_mesh::primitives::cube());
    let mut files = InMemoryFiles::new();
    files.insert("part.json", doc.to_json().unwrap());

    let scene = evaluate("import \"part.json\"", Arc::new(files)).unwrap();
    scene.build_meshes(NEVER_CANCELLED).unwrap();
    let mesh = scene.children[0].built_mesh().unwrap();
    assert_eq!(mesh.polygons().len(), 6);
}

#[test]
fn text_degrades_without_font_engine() {
    // A document using text still evaluates and builds; the text block
    // just produces no paths.
    let scene = scene("text\ncube");
    assert_eq!(scene.children.len(), 1);
    assert!(matches!(scene.children[0].kind, GeometryKind::Cube));
}

#[test]
fn named_nodes_survive_to_scene() {
    let scene = scene("cube {\nname \"chassis\"\n}");
    assert_eq!(scene.children[0].name.as_deref(), Some("chassis"));
}

#[test]
fn nested_groups_compose_transforms() {
    let scene = scene("group {\ntranslate 1 0 0\ngroup {\ntranslate 1 0 0\ncube\n}\n}");
    let mesh = scene.children[0].built_mesh().unwrap();
    assert!((mesh.bounds().center().x - 2.0).abs() < 1e-9);
}

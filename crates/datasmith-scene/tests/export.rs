//! End-to-end export/import tests over a real scratch directory.

use std::path::Path;

use datasmith_scene::{
    Actor, ActorKind, Material, MeshRecord, ParseOptions, ReadPolicy, Scene, SceneError,
    StaticMesh, Transform,
};
use glam::{DVec3, Vec2, Vec3};
use md5::{Digest, Md5};

/// One triangle, three unique vertices, three loop entries.
fn triangle_mesh(name: &str) -> StaticMesh {
    let mut mesh = StaticMesh::new(name);
    mesh.record.vertices = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ];
    mesh.record.triangles = vec![0, 1, 2];
    mesh.record.vertex_normals = vec![Vec3::Z; 3];
    mesh.record.uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
    mesh.record.tris_material_slot = vec![0];
    mesh.record.tris_smoothing_group = vec![0];
    mesh.set_material(0, "checker");
    mesh
}

fn sample_scene() -> Scene {
    let mut scene = Scene::new("triangle");
    scene.add_mesh(triangle_mesh("Tri"));
    scene.add_material(Material::simple("checker"));

    let mut root = Actor::new("root");
    root.transform = Transform {
        scale: DVec3::ONE,
        ..Transform::default()
    };
    let mut child = Actor::with_kind(
        "Tri",
        ActorKind::Mesh {
            mesh: "Tri".to_string(),
        },
    );
    child.transform.scale = DVec3::ONE;
    root.children.add("Tri", child);
    scene.add_actor(root);
    scene
}

#[test]
fn save_produces_assets_and_document() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = sample_scene();
    scene.save(dir.path(), "triangle").unwrap();

    let assets_dir = dir.path().join("triangle_Assets");
    assert!(assets_dir.is_dir());

    // the binary asset round-trips
    let mesh_path = assets_dir.join("Tri.udsmesh");
    let decoded = MeshRecord::read_from_path(&mesh_path, ReadPolicy::Strict).unwrap();
    assert_eq!(decoded.name, "Tri");
    assert_eq!(decoded.triangles, vec![0, 1, 2]);
    assert_eq!(decoded.vertices.len(), 3);

    // the document's Hash element carries the md5 of the written bytes
    let mesh_bytes = std::fs::read(&mesh_path).unwrap();
    let mut hasher = Md5::new();
    hasher.update(&mesh_bytes);
    let expected_hash = format!("{:x}", hasher.finalize());

    let document = std::fs::read_to_string(dir.path().join("triangle.udatasmith")).unwrap();
    assert!(document.contains(&format!(r#"<Hash value="{expected_hash}"/>"#)));
    assert!(document.contains(r#"<file path="triangle_Assets/Tri.udsmesh"/>"#));
}

#[test]
fn saved_scene_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = sample_scene();
    scene.save(dir.path(), "triangle").unwrap();

    let parsed = Scene::parse_file(
        dir.path().join("triangle.udatasmith"),
        &ParseOptions::new(),
    )
    .unwrap();

    assert_eq!(parsed.name, "triangle");
    assert_eq!(parsed.objects.len(), 1);
    assert_eq!(parsed.meshes.len(), 1);
    assert_eq!(parsed.materials.len(), 1);

    let root = parsed.objects.get("root").unwrap();
    let child = root.children.get("Tri").unwrap();
    assert!(matches!(&child.kind, ActorKind::Mesh { mesh } if mesh == "Tri"));
    // the weak mesh reference resolves against the mesh registry
    assert!(matches!(&child.kind, ActorKind::Mesh { mesh } if parsed.meshes.contains(mesh)));

    let mesh = parsed.meshes.get("Tri").unwrap();
    assert_eq!(mesh.record.triangles, vec![0, 1, 2]);
    assert_eq!(mesh.record.uvs.len(), 3);
    assert_eq!(mesh.hash.len(), 32);
    // the mesh declared material id 0, so no default slot is appended
    assert_eq!(mesh.materials.len(), 1);
    assert_eq!(mesh.materials.get(&0).map(String::as_str), Some("checker"));
}

#[test]
fn save_into_existing_directory_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("triangle_Assets")).unwrap();

    let mut scene = sample_scene();
    scene.save(dir.path(), "triangle").unwrap();
    scene.save(dir.path(), "triangle").unwrap(); // resave over itself
    assert!(dir.path().join("triangle.udatasmith").is_file());
}

#[test]
fn missing_mesh_asset_aborts_parse() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = sample_scene();
    scene.save(dir.path(), "triangle").unwrap();
    std::fs::remove_file(dir.path().join("triangle_Assets/Tri.udsmesh")).unwrap();

    let err = Scene::parse_file(
        dir.path().join("triangle.udatasmith"),
        &ParseOptions::new(),
    )
    .unwrap_err();
    match err {
        SceneError::MeshFile { path, .. } => {
            assert!(path.ends_with(Path::new("triangle_Assets/Tri.udsmesh")));
        }
        other => panic!("expected MeshFile, got {other:?}"),
    }
}

#[test]
fn corrupt_mesh_asset_aborts_parse() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = sample_scene();
    scene.save(dir.path(), "triangle").unwrap();

    let mesh_path = dir.path().join("triangle_Assets/Tri.udsmesh");
    let bytes = std::fs::read(&mesh_path).unwrap();
    std::fs::write(&mesh_path, &bytes[..bytes.len() / 2]).unwrap();

    let err = Scene::parse_file(
        dir.path().join("triangle.udatasmith"),
        &ParseOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, SceneError::MeshFile { .. }));
}

#[test]
fn document_is_indented() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = sample_scene();
    scene.save(dir.path(), "triangle").unwrap();

    let document = std::fs::read_to_string(dir.path().join("triangle.udatasmith")).unwrap();
    assert!(document.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(document.contains("\n  <Version>"));
    assert!(document.contains("\n  <StaticMesh"));
}

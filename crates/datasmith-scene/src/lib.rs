//! datasmith-scene: scene-graph model and document codec for the
//! Datasmith interchange format.
//!
//! A scene is a set of name-keyed registries (actors, meshes, materials,
//! textures) serialized to a `.udatasmith` XML document; each mesh's
//! geometry lives in a sibling `{scene}_Assets/{mesh}.udsmesh` binary
//! file (see the `datasmith-mesh` crate) and is linked from the document
//! by relative path and MD5 content hash.
//!
//! # Export
//!
//! ```no_run
//! use datasmith_scene::{Actor, ActorKind, Scene, StaticMesh};
//!
//! let mut scene = Scene::new("room");
//! scene.add_mesh(StaticMesh::new("Floor"));
//! scene.add_actor(Actor::with_kind(
//!     "Floor",
//!     ActorKind::Mesh { mesh: "Floor".to_string() },
//! ));
//! scene.save("/tmp/out", "room")?;
//! # Ok::<(), datasmith_scene::SceneError>(())
//! ```
//!
//! # Import
//!
//! ```no_run
//! use datasmith_scene::{ParseOptions, Scene};
//!
//! let scene = Scene::parse_file("/tmp/out/room.udatasmith", &ParseOptions::new())?;
//! for mesh in scene.meshes.values() {
//!     println!("{}: {} triangles", mesh.name, mesh.record.triangle_count());
//! }
//! # Ok::<(), datasmith_scene::SceneError>(())
//! ```

pub mod actor;
pub mod error;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod xml;

pub use actor::{Actor, ActorKind, CameraParams, LightParams, LightType, Transform};
pub use error::{Result, SceneError};
pub use material::{MasterMaterial, Material, MaterialProperty, Texture};
pub use mesh::StaticMesh;
pub use node::{sanitize_name, NodeKind, Registry};
pub use scene::{ParseOptions, Scene, ASSETS_SUFFIX, SCENE_EXTENSION};
pub use xml::XmlElement;

// geometry payload types come from the mesh codec crate
pub use datasmith_mesh::{MeshError, MeshRecord, OpaqueBlocks, ReadPolicy};

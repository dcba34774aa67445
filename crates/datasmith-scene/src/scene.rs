//! The top-level scene container: registries, document parse/render, save.

use std::fs;
use std::path::Path;

use datasmith_mesh::{codec, ReadPolicy};

use crate::actor::Actor;
use crate::error::{Result, SceneError};
use crate::material::{Material, Texture};
use crate::mesh::StaticMesh;
use crate::node::{NodeKind, Registry};
use crate::xml::XmlElement;

/// File extension of the scene document.
pub const SCENE_EXTENSION: &str = "udatasmith";

/// Suffix of the directory that holds a scene's binary assets.
pub const ASSETS_SUFFIX: &str = "_Assets";

/// Options governing document parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Strict (default) fails on material-id and mesh-tag violations;
    /// lenient logs and carries on.
    pub policy: ReadPolicy,
}

impl ParseOptions {
    /// Strict parsing; the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient parsing.
    pub fn lenient() -> Self {
        Self {
            policy: ReadPolicy::Lenient,
        }
    }
}

/// A full interchange scene.
///
/// Owns four name-keyed registries. Top-level actors live in `objects`;
/// nested actors are owned by their parent's `children` registry.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Scene name; names the document and the assets directory on save.
    pub name: String,
    /// Format version carried in the document.
    pub version: String,
    /// Producer SDK version carried in the document.
    pub sdk_version: String,
    /// Producing host application.
    pub host: String,
    pub materials: Registry<Material>,
    pub meshes: Registry<StaticMesh>,
    pub objects: Registry<Actor>,
    pub textures: Registry<Texture>,
}

impl Scene {
    /// Create an empty scene with default producer metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.20".to_string(),
            sdk_version: "4.20E1".to_string(),
            host: "Blender".to_string(),
            materials: Registry::new(),
            meshes: Registry::new(),
            objects: Registry::new(),
            textures: Registry::new(),
        }
    }

    /// Register a top-level actor; an existing actor under the same name
    /// wins.
    pub fn add_actor(&mut self, actor: Actor) -> &mut Actor {
        let name = actor.name.clone();
        self.objects.add(&name, actor)
    }

    /// Register a mesh; an existing mesh under the same name wins.
    pub fn add_mesh(&mut self, mesh: StaticMesh) -> &mut StaticMesh {
        let name = mesh.name.clone();
        self.meshes.add(&name, mesh)
    }

    /// Register a material; an existing material under the same name wins.
    pub fn add_material(&mut self, material: Material) -> &mut Material {
        let name = material.name().to_string();
        self.materials.add(&name, material)
    }

    /// Register a texture; an existing texture under the same name wins.
    pub fn add_texture(&mut self, texture: Texture) -> &mut Texture {
        let name = texture.name.clone();
        self.textures.add(&name, texture)
    }

    /// Parse a scene document from disk. Referenced binary mesh assets
    /// are resolved against the document's directory and decoded
    /// immediately; any missing or malformed asset aborts the parse.
    pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Scene> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse_str(&text, base_dir, &name, options)
    }

    /// Parse a scene document from text, resolving asset paths against
    /// `base_dir`.
    pub fn parse_str(
        text: &str,
        base_dir: &Path,
        name: &str,
        options: &ParseOptions,
    ) -> Result<Scene> {
        let root = XmlElement::parse(text)?;
        if root.tag != "DatasmithUnrealScene" {
            return Err(SceneError::parse(format!(
                "unexpected root element {:?}",
                root.tag
            )));
        }

        let mut scene = Scene::new(name);
        scene.version = required_text(&root, "Version")?;
        scene.sdk_version = required_text(&root, "SDKVersion")?;
        scene.host = required_text(&root, "Host")?;

        for element in &root.children {
            match NodeKind::from_tag(&element.tag) {
                Some(kind) if kind.is_actor() => {
                    let actor = Actor::parse(element)?;
                    scene.add_actor(actor);
                }
                Some(NodeKind::StaticMesh) => {
                    let mesh = StaticMesh::parse(element, base_dir, options)?;
                    scene.add_mesh(mesh);
                }
                Some(NodeKind::Material) | Some(NodeKind::MasterMaterial) => {
                    let material = Material::parse(element)?;
                    scene.add_material(material);
                }
                Some(NodeKind::Texture) => {
                    let texture = Texture::parse(element)?;
                    scene.add_texture(texture);
                }
                _ => {} // unknown top-level tags are skipped
            }
        }
        Ok(scene)
    }

    /// Render the full document tree.
    ///
    /// Top-level order is fixed regardless of registration order:
    /// objects, then meshes, then materials, then textures. Call after
    /// [`save`] has stamped mesh paths and hashes when exporting.
    ///
    /// [`save`]: Scene::save
    pub fn render(&self) -> XmlElement {
        let mut root = XmlElement::new("DatasmithUnrealScene")
            .child(XmlElement::new("Version").text(&self.version))
            .child(XmlElement::new("SDKVersion").text(&self.sdk_version))
            .child(XmlElement::new("Host").text(&self.host))
            .child(
                XmlElement::new("Application")
                    .attr("Vendor", "Blender")
                    .attr("ProductName", "Blender")
                    .attr("ProductVersion", "2.80"),
            )
            .child(
                XmlElement::new("User")
                    .attr("ID", "00000000000000000000000000000000")
                    .attr("OS", "Windows 8.1"),
            );

        for actor in self.objects.values() {
            root.push(actor.render());
        }
        for mesh in self.meshes.values() {
            root.push(mesh.render());
        }
        for material in self.materials.values() {
            root.push(material.render());
        }
        for texture in self.textures.values() {
            root.push(texture.render());
        }
        root
    }

    /// Save the scene under `base_dir` as `{name}.udatasmith` plus a
    /// `{name}_Assets` directory holding one binary file per mesh.
    ///
    /// Every mesh is encoded and hashed before the document is rendered,
    /// so the emitted `Hash` elements match the bytes on disk. Both the
    /// document and each asset are written all-or-nothing.
    pub fn save(&mut self, base_dir: impl AsRef<Path>, name: &str) -> Result<()> {
        let base_dir = base_dir.as_ref();
        self.name = name.to_string();

        let assets_dir = format!("{name}{ASSETS_SUFFIX}");
        // tolerates an existing directory; any other failure propagates
        fs::create_dir_all(base_dir.join(&assets_dir))?;

        for mesh in self.meshes.values_mut() {
            mesh.save(base_dir, &assets_dir)?;
        }
        for texture in self.textures.values_mut() {
            texture.save();
        }

        let document = self.render().to_document_string()?;
        let path = base_dir.join(format!("{name}.{SCENE_EXTENSION}"));
        codec::write_file_atomic(&path, document.as_bytes())?;
        Ok(())
    }
}

fn required_text(root: &XmlElement, tag: &str) -> Result<String> {
    root.child_text(tag)
        .map(str::to_string)
        .ok_or_else(|| SceneError::parse(format!("document has no {tag} element")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MasterMaterial;

    #[test]
    fn test_render_order_is_fixed() {
        let mut scene = Scene::new("s");
        // register in scrambled order
        scene.add_texture(Texture::new("t"));
        scene.add_material(Material::Master(MasterMaterial::new("m")));
        scene.add_mesh(StaticMesh::new("mesh"));
        scene.add_actor(Actor::new("a"));

        let root = scene.render();
        let tags: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec![
                "Version",
                "SDKVersion",
                "Host",
                "Application",
                "User",
                "Actor",
                "StaticMesh",
                "MasterMaterial",
                "Texture",
            ]
        );
    }

    #[test]
    fn test_metadata_round_trip() {
        let scene = Scene::new("meta");
        let document = scene.render().to_document_string().unwrap();

        let parsed =
            Scene::parse_str(&document, Path::new("."), "meta", &ParseOptions::new()).unwrap();
        assert_eq!(parsed.version, "0.20");
        assert_eq!(parsed.sdk_version, "4.20E1");
        assert_eq!(parsed.host, "Blender");
    }

    #[test]
    fn test_unknown_top_level_tags_are_skipped() {
        let document = "\
            <DatasmithUnrealScene>\
              <Version>0.20</Version>\
              <SDKVersion>4.20E1</SDKVersion>\
              <Host>Blender</Host>\
              <MetaData reference=\"Actor.Cube\"/>\
              <Environment name=\"sky\"/>\
            </DatasmithUnrealScene>";
        let scene =
            Scene::parse_str(document, Path::new("."), "s", &ParseOptions::new()).unwrap();
        assert!(scene.objects.is_empty());
        assert!(scene.meshes.is_empty());
    }

    #[test]
    fn test_wrong_root_element() {
        let err = Scene::parse_str("<Other/>", Path::new("."), "s", &ParseOptions::new())
            .unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_missing_metadata_is_error() {
        let document = "<DatasmithUnrealScene><Version>0.20</Version></DatasmithUnrealScene>";
        let err =
            Scene::parse_str(document, Path::new("."), "s", &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_actor_missing_transform_aborts_parse() {
        let document = "\
            <DatasmithUnrealScene>\
              <Version>0.20</Version>\
              <SDKVersion>4.20E1</SDKVersion>\
              <Host>Blender</Host>\
              <Actor name=\"orphan\" layer=\"Layer0\"/>\
            </DatasmithUnrealScene>";
        let err =
            Scene::parse_str(document, Path::new("."), "s", &ParseOptions::new()).unwrap_err();
        assert!(matches!(err, SceneError::MissingTransform { .. }));
    }

    #[test]
    fn test_top_level_dedup() {
        let mut scene = Scene::new("s");
        scene.add_actor(Actor::new("dup"));
        let mut other = Actor::new("dup");
        other.layer = "Layer7".to_string();
        scene.add_actor(other);

        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects.get("dup").unwrap().layer, "Layer0");
    }
}

//! The static-mesh node: binary asset linking and material slot mapping.

use std::path::{Path, PathBuf};

use datasmith_mesh::{codec, MeshRecord, ReadPolicy, MESH_EXTENSION};
use indexmap::IndexMap;
use md5::{Digest, Md5};

use crate::error::{Result, SceneError};
use crate::node::{sanitize_name, NodeKind};
use crate::scene::ParseOptions;
use crate::xml::XmlElement;

/// A mesh node of the scene graph.
///
/// Owns the decoded binary record plus the scene-level bookkeeping the
/// binary format does not carry: the local material table, the on-disk
/// location of the asset, and its content hash.
#[derive(Debug, Clone, Default)]
pub struct StaticMesh {
    /// Node name; the registry key.
    pub name: String,
    /// Display label; defaults to the name.
    pub label: String,
    /// The geometry payload.
    pub record: MeshRecord,
    /// Local material slot index to scene material name.
    pub materials: IndexMap<u32, String>,
    /// Path of the binary asset relative to the scene document, forward
    /// slashes; set once the mesh has been saved or parsed.
    pub relative_path: Option<String>,
    /// Hex MD5 digest of the binary asset's bytes; set at save time.
    pub hash: String,
}

impl StaticMesh {
    /// Create an empty mesh node.
    pub fn new(name: impl Into<String>) -> Self {
        let name = sanitize_name(&name.into());
        Self {
            label: name.clone(),
            record: MeshRecord::new(&name),
            name,
            ..Self::default()
        }
    }

    /// Bind a local material slot to a scene material name.
    pub fn set_material(&mut self, slot: u32, material: impl Into<String>) {
        self.materials.insert(slot, material.into());
    }

    /// Render the mesh element. Call only after [`save`] on export paths,
    /// so `file` and `Hash` carry their final values.
    ///
    /// [`save`]: StaticMesh::save
    pub fn render(&self) -> XmlElement {
        let mut element = XmlElement::new(NodeKind::StaticMesh.tag())
            .attr("name", &self.name)
            .attr("label", &self.label);
        for (id, material) in &self.materials {
            element.push(
                XmlElement::new("Material")
                    .attr("id", id.to_string())
                    .attr("name", sanitize_name(material)),
            );
        }
        if let Some(path) = &self.relative_path {
            element.push(XmlElement::new("file").attr("path", path.replace('\\', "/")));
        }
        element.push(XmlElement::new("LightmapUV").attr("value", "-1"));
        element.push(XmlElement::new("Hash").attr("value", &self.hash));
        element
    }

    /// Parse a `StaticMesh` element, loading and decoding the referenced
    /// binary asset relative to `base_dir` immediately.
    pub(crate) fn parse(
        element: &XmlElement,
        base_dir: &Path,
        options: &ParseOptions,
    ) -> Result<StaticMesh> {
        let name = element
            .attr_value("name")
            .ok_or_else(|| SceneError::parse("StaticMesh element has no name"))?;
        let label = element.attr_value("label").unwrap_or(name);

        let relative = element
            .find_child("file")
            .and_then(|f| f.attr_value("path"))
            .ok_or_else(|| SceneError::parse(format!("StaticMesh '{name}' has no file element")))?;
        let asset_path = resolve_asset_path(base_dir, relative);
        let record = MeshRecord::read_from_path(&asset_path, options.policy).map_err(
            |source| SceneError::MeshFile {
                path: asset_path,
                source,
            },
        )?;

        let mut mesh = StaticMesh {
            name: sanitize_name(name),
            label: label.to_string(),
            record,
            materials: IndexMap::new(),
            relative_path: Some(relative.to_string()),
            hash: element.child_value("Hash").unwrap_or_default().to_string(),
        };
        mesh.remap_materials(element, options)?;
        Ok(mesh)
    }

    /// Renumber the document's material ids into a dense local-index
    /// space and remap the per-triangle slot array through it.
    ///
    /// Slot 0 is reserved: when no document id maps to 0, a dense slot
    /// bound to `default_material` is appended for it.
    fn remap_materials(&mut self, element: &XmlElement, options: &ParseOptions) -> Result<()> {
        let mut source_to_local: IndexMap<u32, u32> = IndexMap::new();
        for (index, material) in element.children_named("Material").enumerate() {
            let id = material
                .attr_value("id")
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| {
                    SceneError::parse(format!("mesh '{}': Material without valid id", self.name))
                })?;
            let material_name = material.attr_value("name").ok_or_else(|| {
                SceneError::parse(format!("mesh '{}': Material without name", self.name))
            })?;
            source_to_local.insert(id, index as u32);
            self.materials.insert(index as u32, material_name.to_string());
        }

        if !source_to_local.contains_key(&0) {
            let appended = source_to_local.len() as u32;
            source_to_local.insert(0, appended);
            self.materials.insert(appended, "default_material".to_string());
        }

        let unmapped = self
            .record
            .tris_material_slot
            .iter()
            .find(|slot| !source_to_local.contains_key(*slot));
        if let Some(&material_id) = unmapped {
            match options.policy {
                ReadPolicy::Strict => {
                    return Err(SceneError::MaterialIndex {
                        mesh: self.name.clone(),
                        material_id,
                    })
                }
                ReadPolicy::Lenient => {
                    log::warn!(
                        "mesh '{}' references undeclared material id {material_id}; \
                         leaving slots unmapped",
                        self.name
                    );
                    return Ok(());
                }
            }
        }

        for slot in &mut self.record.tris_material_slot {
            *slot = source_to_local[&*slot];
        }
        Ok(())
    }

    /// Encode the binary asset into `{base_dir}/{assets_dir}`, then record
    /// the relative path and the MD5 of the written bytes.
    pub(crate) fn save(&mut self, base_dir: &Path, assets_dir: &str) -> Result<()> {
        let file_name = format!("{}.{}", self.name, MESH_EXTENSION);
        let bytes = self.record.encode_to_vec()?;
        codec::write_file_atomic(&base_dir.join(assets_dir).join(&file_name), &bytes)?;

        let mut hasher = Md5::new();
        hasher.update(&bytes);
        self.hash = format!("{:x}", hasher.finalize());
        self.relative_path = Some(format!("{assets_dir}/{file_name}"));
        Ok(())
    }
}

/// Join a document-relative asset path onto the document's directory,
/// accepting either separator.
fn resolve_asset_path(base_dir: &Path, relative: &str) -> PathBuf {
    let mut path = base_dir.to_path_buf();
    for part in relative.split(['/', '\\']).filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

//! Materials, master materials and textures.

use indexmap::IndexMap;

use crate::error::{Result, SceneError};
use crate::node::{sanitize_name, NodeKind};
use crate::xml::XmlElement;

use crate::actor::format_float;

/// A typed key/value property of a master material.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialProperty {
    /// RGBA color, components 0..1.
    Color { r: f64, g: f64, b: f64, a: f64 },
    Bool(bool),
}

impl MaterialProperty {
    /// Serialized `type` attribute value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            MaterialProperty::Color { .. } => "Color",
            MaterialProperty::Bool(_) => "Bool",
        }
    }

    /// Serialized `val` attribute value.
    pub fn value_string(&self) -> String {
        match self {
            MaterialProperty::Color { r, g, b, a } => format!(
                "(R={},G={},B={},A={})",
                format_float(*r),
                format_float(*g),
                format_float(*b),
                format_float(*a)
            ),
            MaterialProperty::Bool(true) => "true".to_string(),
            MaterialProperty::Bool(false) => "false".to_string(),
        }
    }

    fn render(&self, name: &str) -> XmlElement {
        XmlElement::new("KeyValueProperty")
            .attr("name", name)
            .attr("type", self.type_name())
            .attr("val", self.value_string())
    }

    /// Parse one `KeyValueProperty` element; unknown property types are
    /// skipped rather than erroring, mirroring the document-level policy.
    fn parse(element: &XmlElement) -> Result<Option<(String, MaterialProperty)>> {
        let name = element
            .attr_value("name")
            .ok_or_else(|| SceneError::parse("KeyValueProperty has no name"))?
            .to_string();
        let value = element.attr_value("val").unwrap_or_default();

        let property = match element.attr_value("type") {
            Some("Color") => parse_color_value(value).ok_or_else(|| {
                SceneError::parse(format!("property '{name}': bad color value {value:?}"))
            })?,
            Some("Bool") => MaterialProperty::Bool(value == "true"),
            other => {
                log::debug!("skipping material property '{name}' of type {other:?}");
                return Ok(None);
            }
        };
        Ok(Some((name, property)))
    }
}

/// Parse a `(R=..,G=..,B=..,A=..)` color value.
fn parse_color_value(value: &str) -> Option<MaterialProperty> {
    let inner = value.strip_prefix('(')?.strip_suffix(')')?;
    let (mut r, mut g, mut b, mut a) = (0.0, 0.0, 0.0, 1.0);
    for part in inner.split(',') {
        let (key, number) = part.split_once('=')?;
        let number: f64 = number.trim().parse().ok()?;
        match key.trim() {
            "R" => r = number,
            "G" => g = number,
            "B" => b = number,
            "A" => a = number,
            _ => return None,
        }
    }
    Some(MaterialProperty::Color { r, g, b, a })
}

/// A master material: a named bundle of typed properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterMaterial {
    pub name: String,
    /// Properties in registration order.
    pub properties: IndexMap<String, MaterialProperty>,
}

impl MasterMaterial {
    /// Create an empty master material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: sanitize_name(&name.into()),
            properties: IndexMap::new(),
        }
    }

    /// Set a property, replacing any previous value under the name.
    pub fn set_property(&mut self, name: impl Into<String>, property: MaterialProperty) {
        self.properties.insert(name.into(), property);
    }
}

/// A material node; simple materials carry nothing but their name.
#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Simple { name: String },
    Master(MasterMaterial),
}

impl Material {
    /// Create a simple material.
    pub fn simple(name: impl Into<String>) -> Self {
        Material::Simple {
            name: sanitize_name(&name.into()),
        }
    }

    /// The node name.
    pub fn name(&self) -> &str {
        match self {
            Material::Simple { name } => name,
            Material::Master(master) => &master.name,
        }
    }

    /// The XML element tag for this material's kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Material::Simple { .. } => NodeKind::Material.tag(),
            Material::Master(_) => NodeKind::MasterMaterial.tag(),
        }
    }

    /// Render the material element.
    pub fn render(&self) -> XmlElement {
        match self {
            Material::Simple { name } => XmlElement::new(self.tag()).attr("name", name),
            Material::Master(master) => {
                let mut element = XmlElement::new(self.tag())
                    .attr("name", &master.name)
                    .attr("Type", "1")
                    .attr("Quality", "0")
                    .attr("label", &master.name);
                for (name, property) in &master.properties {
                    element.push(property.render(name));
                }
                element
            }
        }
    }

    /// Parse a `Material` or `MasterMaterial` element.
    pub(crate) fn parse(element: &XmlElement) -> Result<Material> {
        let name = element
            .attr_value("name")
            .ok_or_else(|| SceneError::parse(format!("{} element has no name", element.tag)))?;

        match NodeKind::from_tag(&element.tag) {
            Some(NodeKind::Material) => Ok(Material::simple(name)),
            Some(NodeKind::MasterMaterial) => {
                let mut master = MasterMaterial::new(name);
                for child in element.children_named("KeyValueProperty") {
                    if let Some((prop_name, property)) = MaterialProperty::parse(child)? {
                        master.properties.insert(prop_name, property);
                    }
                }
                Ok(Material::Master(master))
            }
            _ => Err(SceneError::parse(format!(
                "element {:?} is not a material kind",
                element.tag
            ))),
        }
    }
}

/// A texture node.
///
/// Binary persistence is a stub: `save` records a placeholder hash label
/// and writes no bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture {
    pub name: String,
    /// Source image path as carried in the document.
    pub file: String,
    /// Content hash of the image payload.
    pub hash: String,
}

impl Texture {
    /// Create a texture node with no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: sanitize_name(&name.into()),
            file: String::new(),
            hash: String::new(),
        }
    }

    /// Render the texture element.
    pub fn render(&self) -> XmlElement {
        XmlElement::new(NodeKind::Texture.tag())
            .attr("name", &self.name)
            .attr("file", &self.file)
            .child(XmlElement::new("Hash").attr("value", &self.hash))
    }

    /// Parse a `Texture` element.
    pub(crate) fn parse(element: &XmlElement) -> Result<Texture> {
        let name = element
            .attr_value("name")
            .ok_or_else(|| SceneError::parse("Texture element has no name"))?;
        Ok(Texture {
            name: sanitize_name(name),
            file: element.attr_value("file").unwrap_or_default().to_string(),
            hash: element.child_value("Hash").unwrap_or_default().to_string(),
        })
    }

    /// Record the placeholder hash for an unsaved payload.
    // TODO: write the source image bytes into the assets directory and
    // hash them once texture payloads are carried by the host contract.
    pub(crate) fn save(&mut self) {
        log::debug!("texture '{}': payload persistence not implemented", self.name);
        if self.hash.is_empty() {
            self.hash = "file md5 hash".to_string();
        }
    }
}

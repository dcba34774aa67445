//! The actor family: plain actors, mesh actors, lights and cameras.

use glam::{DQuat, DVec3};

use crate::error::{Result, SceneError};
use crate::node::{sanitize_name, NodeKind, Registry};
use crate::xml::{parse_float, XmlElement};

/// Six-decimal fixed format used for every numeric value in the document.
pub(crate) fn format_float(value: f64) -> String {
    format!("{value:.6}")
}

/// An actor's local transform.
///
/// All components default to zero, scale and rotation included;
/// documents in the wild carry explicit values on every actor, so the
/// defaults only surface for hand-built nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation.
    pub translation: DVec3,
    /// Rotation quaternion.
    pub rotation: DQuat,
    /// Per-axis scale.
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DQuat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            scale: DVec3::ZERO,
        }
    }
}

impl Transform {
    pub(crate) fn render(&self) -> XmlElement {
        XmlElement::new("Transform")
            .attr("tx", format_float(self.translation.x))
            .attr("ty", format_float(self.translation.y))
            .attr("tz", format_float(self.translation.z))
            .attr("qw", format_float(self.rotation.w))
            .attr("qx", format_float(self.rotation.x))
            .attr("qy", format_float(self.rotation.y))
            .attr("qz", format_float(self.rotation.z))
            .attr("sx", format_float(self.scale.x))
            .attr("sy", format_float(self.scale.y))
            .attr("sz", format_float(self.scale.z))
    }

    pub(crate) fn parse(element: &XmlElement) -> Result<Self> {
        let field = |key: &str| -> Result<f64> {
            match element.attr_value(key) {
                Some(value) => parse_float(value, "Transform"),
                None => Ok(0.0),
            }
        };
        Ok(Self {
            translation: DVec3::new(field("tx")?, field("ty")?, field("tz")?),
            rotation: DQuat::from_xyzw(field("qx")?, field("qy")?, field("qz")?, field("qw")?),
            scale: DVec3::new(field("sx")?, field("sy")?, field("sz")?),
        })
    }
}

/// Supported light shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightType {
    #[default]
    Point,
    Spot,
}

impl LightType {
    /// Serialized `type` attribute value.
    pub const fn as_str(self) -> &'static str {
        match self {
            LightType::Point => "PointLight",
            LightType::Spot => "SpotLight",
        }
    }

    /// Parse the `type` attribute value.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PointLight" => Some(LightType::Point),
            "SpotLight" => Some(LightType::Spot),
            _ => None,
        }
    }
}

/// Light parameters; intensity is in candelas.
#[derive(Debug, Clone, PartialEq)]
pub struct LightParams {
    pub light_type: LightType,
    pub intensity: f64,
    pub intensity_units: String,
    /// Linear RGB, 0..1.
    pub color: [f64; 3],
    /// Degrees; only meaningful for spot lights.
    pub inner_cone_angle: f64,
    /// Degrees; only meaningful for spot lights.
    pub outer_cone_angle: f64,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            intensity: 1500.0,
            intensity_units: "Candelas".to_string(),
            color: [1.0, 1.0, 1.0],
            inner_cone_angle: 22.5,
            outer_cone_angle: 25.0,
        }
    }
}

impl LightParams {
    fn parse(element: &XmlElement, actor: &str) -> Result<Self> {
        let mut params = Self::default();
        let type_attr = element
            .attr_value("type")
            .ok_or_else(|| SceneError::parse(format!("light '{actor}' has no type attribute")))?;
        params.light_type = LightType::from_str(type_attr)
            .ok_or_else(|| SceneError::parse(format!("unknown light type {type_attr:?}")))?;

        if let Some(value) = element.child_value("Intensity") {
            params.intensity = parse_float(value, "Intensity")?;
        }
        if let Some(value) = element.child_value("IntensityUnits") {
            params.intensity_units = value.to_string();
        }
        if let Some(color) = element.find_child("Color") {
            for (slot, key) in params.color.iter_mut().zip(["R", "G", "B"]) {
                if let Some(value) = color.attr_value(key) {
                    *slot = parse_float(value, "Color")?;
                }
            }
        }
        if let Some(value) = element.child_value("InnerConeAngle") {
            params.inner_cone_angle = parse_float(value, "InnerConeAngle")?;
        }
        if let Some(value) = element.child_value("OuterConeAngle") {
            params.outer_cone_angle = parse_float(value, "OuterConeAngle")?;
        }
        Ok(params)
    }

    fn render_into(&self, element: &mut XmlElement) {
        element.push(value_element("Intensity", format_float(self.intensity)));
        element.push(value_element("IntensityUnits", &self.intensity_units));
        element.push(
            XmlElement::new("Color")
                .attr("usetemp", "0")
                .attr("temperature", "6500.0")
                .attr("R", format_float(self.color[0]))
                .attr("G", format_float(self.color[1]))
                .attr("B", format_float(self.color[2])),
        );
        if self.light_type == LightType::Spot {
            element.push(value_element(
                "InnerConeAngle",
                format_float(self.inner_cone_angle),
            ));
            element.push(value_element(
                "OuterConeAngle",
                format_float(self.outer_cone_angle),
            ));
        }
    }
}

/// Physical camera parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    /// Millimeters.
    pub sensor_width: f64,
    pub sensor_aspect_ratio: f64,
    /// Scene units.
    pub focus_distance: f64,
    pub f_stop: f64,
    /// Millimeters.
    pub focal_length: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            sensor_width: 36.0,
            sensor_aspect_ratio: 1.777778,
            focus_distance: 1000.0,
            f_stop: 5.6,
            focal_length: 32.0,
        }
    }
}

impl CameraParams {
    fn parse(element: &XmlElement) -> Result<Self> {
        let mut params = Self::default();
        let fields: [(&str, &mut f64); 5] = [
            ("SensorWidth", &mut params.sensor_width),
            ("SensorAspectRatio", &mut params.sensor_aspect_ratio),
            ("FocusDistance", &mut params.focus_distance),
            ("FStop", &mut params.f_stop),
            ("FocalLength", &mut params.focal_length),
        ];
        for (tag, slot) in fields {
            if let Some(value) = element.child_value(tag) {
                *slot = parse_float(value, tag)?;
            }
        }
        Ok(params)
    }

    fn render_into(&self, element: &mut XmlElement) {
        element.push(value_element("SensorWidth", format_float(self.sensor_width)));
        element.push(value_element(
            "SensorAspectRatio",
            format_float(self.sensor_aspect_ratio),
        ));
        element.push(value_element(
            "FocusDistance",
            format_float(self.focus_distance),
        ));
        element.push(value_element("FStop", format_float(self.f_stop)));
        element.push(value_element("FocalLength", format_float(self.focal_length)));
        element.push(XmlElement::new("Post"));
    }
}

fn value_element(tag: &str, value: impl Into<String>) -> XmlElement {
    XmlElement::new(tag).attr("value", value)
}

/// What a specific actor is, beyond its shared transform and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActorKind {
    /// A plain grouping actor.
    #[default]
    Group,
    /// References a mesh by name; resolved against the scene's mesh
    /// registry, never owned.
    Mesh { mesh: String },
    Light(LightParams),
    Camera(CameraParams),
}

/// One node of the actor hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    /// Node name; unique among siblings.
    pub name: String,
    /// Layer label.
    pub layer: String,
    pub transform: Transform,
    pub kind: ActorKind,
    /// Owned child actors.
    pub children: Registry<Actor>,
}

impl Actor {
    /// Create a plain grouping actor on the default layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ActorKind::Group)
    }

    /// Create an actor of the given kind on the default layer.
    pub fn with_kind(name: impl Into<String>, kind: ActorKind) -> Self {
        Self {
            name: sanitize_name(&name.into()),
            layer: "Layer0".to_string(),
            transform: Transform::default(),
            kind,
            children: Registry::new(),
        }
    }

    /// The XML element tag for this actor's kind.
    pub fn tag(&self) -> &'static str {
        match self.kind {
            ActorKind::Group => NodeKind::Actor.tag(),
            ActorKind::Mesh { .. } => NodeKind::ActorMesh.tag(),
            ActorKind::Light(_) => NodeKind::Light.tag(),
            ActorKind::Camera(_) => NodeKind::Camera.tag(),
        }
    }

    /// Render this actor and its subtree.
    pub fn render(&self) -> XmlElement {
        let mut element = XmlElement::new(self.tag())
            .attr("name", &self.name)
            .attr("layer", &self.layer);
        if let ActorKind::Light(params) = &self.kind {
            element.set_attr("type", params.light_type.as_str());
            element.set_attr("enabled", "1");
        }

        element.push(self.transform.render());

        if !self.children.is_empty() {
            let mut container = XmlElement::new("children");
            for child in self.children.values() {
                container.push(child.render());
            }
            element.push(container);
        }

        match &self.kind {
            ActorKind::Group => {}
            ActorKind::Mesh { mesh } => {
                element.push(XmlElement::new("mesh").attr("name", sanitize_name(mesh)));
            }
            ActorKind::Light(params) => params.render_into(&mut element),
            ActorKind::Camera(params) => params.render_into(&mut element),
        }
        element
    }

    /// Parse an actor-family element, recursing into its `children`.
    pub(crate) fn parse(element: &XmlElement) -> Result<Actor> {
        let name = element
            .attr_value("name")
            .ok_or_else(|| SceneError::parse(format!("{} element has no name", element.tag)))?
            .to_string();
        let layer = element.attr_value("layer").unwrap_or("Layer0").to_string();

        let transform_element = element
            .find_child("Transform")
            .ok_or_else(|| SceneError::MissingTransform {
                actor: name.clone(),
            })?;
        let transform = Transform::parse(transform_element)?;

        let kind = match NodeKind::from_tag(&element.tag) {
            Some(NodeKind::Actor) => ActorKind::Group,
            Some(NodeKind::ActorMesh) => {
                let mesh = element
                    .find_child("mesh")
                    .and_then(|m| m.attr_value("name"))
                    .ok_or_else(|| {
                        SceneError::parse(format!("ActorMesh '{name}' has no mesh element"))
                    })?;
                ActorKind::Mesh {
                    mesh: mesh.to_string(),
                }
            }
            Some(NodeKind::Light) => ActorKind::Light(LightParams::parse(element, &name)?),
            Some(NodeKind::Camera) => ActorKind::Camera(CameraParams::parse(element)?),
            _ => {
                return Err(SceneError::parse(format!(
                    "element {:?} is not an actor kind",
                    element.tag
                )))
            }
        };

        let mut actor = Actor {
            name: sanitize_name(&name),
            layer,
            transform,
            kind,
            children: Registry::new(),
        };

        if let Some(container) = element.find_child("children") {
            for child_element in &container.children {
                match NodeKind::from_tag(&child_element.tag) {
                    Some(kind) if kind.is_actor() => {
                        let child = Actor::parse(child_element)?;
                        let child_name = child.name.clone();
                        actor.children.add(&child_name, child);
                    }
                    _ => {} // unknown child tags are skipped
                }
            }
        }

        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_render_format() {
        let transform = Transform {
            translation: DVec3::new(1.0, -2.5, 0.0),
            rotation: DQuat::from_xyzw(0.0, 0.0, 0.0, 1.0),
            scale: DVec3::ONE,
        };
        let element = transform.render();
        assert_eq!(element.attr_value("tx"), Some("1.000000"));
        assert_eq!(element.attr_value("ty"), Some("-2.500000"));
        assert_eq!(element.attr_value("qw"), Some("1.000000"));
        assert_eq!(element.attr_value("sz"), Some("1.000000"));
    }

    #[test]
    fn test_transform_parse_round_trip() {
        let transform = Transform {
            translation: DVec3::new(10.0, 20.0, 30.0),
            rotation: DQuat::from_xyzw(0.5, 0.5, 0.5, 0.5),
            scale: DVec3::new(1.0, 2.0, 3.0),
        };
        let parsed = Transform::parse(&transform.render()).unwrap();
        assert_eq!(parsed, transform);
    }

    #[test]
    fn test_missing_transform_is_error() {
        let element = XmlElement::new("Actor").attr("name", "orphan").attr("layer", "Layer0");
        let err = Actor::parse(&element).unwrap_err();
        match err {
            SceneError::MissingTransform { actor } => assert_eq!(actor, "orphan"),
            other => panic!("expected MissingTransform, got {other:?}"),
        }
    }

    #[test]
    fn test_actor_round_trip_with_children() {
        let mut parent = Actor::new("root");
        parent.children.add(
            "leaf",
            Actor::with_kind(
                "leaf",
                ActorKind::Mesh {
                    mesh: "Cube.001".to_string(),
                },
            ),
        );

        let element = parent.render();
        assert_eq!(element.tag, "Actor");
        let container = element.find_child("children").unwrap();
        assert_eq!(container.children.len(), 1);
        let leaf = &container.children[0];
        assert_eq!(leaf.tag, "ActorMesh");
        assert_eq!(
            leaf.find_child("mesh").unwrap().attr_value("name"),
            Some("Cube_001")
        );

        let parsed = Actor::parse(&element).unwrap();
        assert_eq!(parsed.name, "root");
        assert_eq!(parsed.children.len(), 1);
        let parsed_leaf = parsed.children.get("leaf").unwrap();
        assert!(matches!(&parsed_leaf.kind, ActorKind::Mesh { mesh } if mesh == "Cube_001"));
    }

    #[test]
    fn test_spot_light_emits_cone_angles() {
        let spot = Actor::with_kind(
            "lamp",
            ActorKind::Light(LightParams {
                light_type: LightType::Spot,
                ..LightParams::default()
            }),
        );
        let element = spot.render();
        assert_eq!(element.tag, "Light");
        assert_eq!(element.attr_value("type"), Some("SpotLight"));
        assert_eq!(element.attr_value("enabled"), Some("1"));
        assert_eq!(element.child_value("InnerConeAngle"), Some("22.500000"));
        assert_eq!(element.child_value("OuterConeAngle"), Some("25.000000"));

        let point = Actor::with_kind("bulb", ActorKind::Light(LightParams::default()));
        let element = point.render();
        assert!(element.find_child("InnerConeAngle").is_none());
    }

    #[test]
    fn test_light_parse_reads_values() {
        let mut light = Actor::with_kind(
            "lamp",
            ActorKind::Light(LightParams {
                light_type: LightType::Spot,
                intensity: 800.0,
                color: [0.25, 0.5, 0.75],
                ..LightParams::default()
            }),
        );
        light.transform.scale = DVec3::ONE;

        let parsed = Actor::parse(&light.render()).unwrap();
        match parsed.kind {
            ActorKind::Light(params) => {
                assert_eq!(params.light_type, LightType::Spot);
                assert_eq!(params.intensity, 800.0);
                assert_eq!(params.color, [0.25, 0.5, 0.75]);
            }
            other => panic!("expected light, got {other:?}"),
        }
    }

    #[test]
    fn test_camera_round_trip() {
        let camera = Actor::with_kind("cam", ActorKind::Camera(CameraParams::default()));
        let element = camera.render();
        assert_eq!(element.tag, "Camera");
        assert_eq!(element.child_value("SensorWidth"), Some("36.000000"));
        assert_eq!(element.child_value("SensorAspectRatio"), Some("1.777778"));
        assert!(element.find_child("Post").is_some());

        let parsed = Actor::parse(&element).unwrap();
        assert!(matches!(parsed.kind, ActorKind::Camera(p) if p == CameraParams::default()));
    }
}

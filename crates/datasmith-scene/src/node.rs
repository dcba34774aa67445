//! Node identity, name sanitization, and the per-kind registries.

use indexmap::IndexMap;

/// Replace characters the interchange dialect cannot carry in names.
///
/// Idempotent: sanitizing a sanitized name is a no-op.
pub fn sanitize_name(name: &str) -> String {
    name.replace('.', "_")
}

/// The closed set of element kinds a scene document can carry.
///
/// The kind tag doubles as the XML element name and selects the registry
/// a node lives in: the actor family shares the scene's object registry,
/// both material kinds share the material registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Actor,
    ActorMesh,
    Light,
    Camera,
    StaticMesh,
    Material,
    MasterMaterial,
    Texture,
}

impl NodeKind {
    /// The XML element tag for this kind.
    pub const fn tag(self) -> &'static str {
        match self {
            NodeKind::Actor => "Actor",
            NodeKind::ActorMesh => "ActorMesh",
            NodeKind::Light => "Light",
            NodeKind::Camera => "Camera",
            NodeKind::StaticMesh => "StaticMesh",
            NodeKind::Material => "Material",
            NodeKind::MasterMaterial => "MasterMaterial",
            NodeKind::Texture => "Texture",
        }
    }

    /// Map an element tag back to a kind. Unknown tags are skipped by the
    /// document parser, so this returns `None` rather than erroring.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Actor" => Some(NodeKind::Actor),
            "ActorMesh" => Some(NodeKind::ActorMesh),
            "Light" => Some(NodeKind::Light),
            "Camera" => Some(NodeKind::Camera),
            "StaticMesh" => Some(NodeKind::StaticMesh),
            "Material" => Some(NodeKind::Material),
            "MasterMaterial" => Some(NodeKind::MasterMaterial),
            "Texture" => Some(NodeKind::Texture),
            _ => None,
        }
    }

    /// Whether this kind belongs to the actor family.
    pub const fn is_actor(self) -> bool {
        matches!(
            self,
            NodeKind::Actor | NodeKind::ActorMesh | NodeKind::Light | NodeKind::Camera
        )
    }
}

/// Name-keyed, insertion-ordered registry with first-writer-wins identity.
///
/// Names are sanitized on every lookup and insert, so `"a.b"` and `"a_b"`
/// address the same node. Construction through [`get_or_insert_with`]
/// never overwrites: the first node registered under a name is the node,
/// later constructions return it unchanged.
///
/// [`get_or_insert_with`]: Registry::get_or_insert_with
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: IndexMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Look up the node registered under `name`, creating it with `init`
    /// if absent. `init` receives the sanitized name.
    ///
    /// Panics on an empty name; that is a construction misuse, not a data
    /// error.
    pub fn get_or_insert_with(&mut self, name: &str, init: impl FnOnce(&str) -> T) -> &mut T {
        let key = sanitize_name(name);
        assert!(!key.is_empty(), "scene node must have a non-empty name");
        self.entries.entry(key.clone()).or_insert_with(|| init(&key))
    }

    /// Register `value` under `name` unless the name is already taken.
    /// Returns the registered node either way.
    pub fn add(&mut self, name: &str, value: T) -> &mut T {
        self.get_or_insert_with(name, |_| value)
    }

    /// Look up a node by (sanitized) name.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(&sanitize_name(name))
    }

    /// Mutable lookup by (sanitized) name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(&sanitize_name(name))
    }

    /// Whether a node is registered under the (sanitized) name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&sanitize_name(name))
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate node values in registration order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Mutably iterate node values in registration order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_is_idempotent() {
        assert_eq!(sanitize_name("a.b.c"), "a_b_c");
        assert_eq!(sanitize_name(&sanitize_name("a.b.c")), "a_b_c");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn test_first_writer_wins() {
        let mut registry: Registry<u32> = Registry::new();
        registry.get_or_insert_with("node", |_| 1);
        let second = registry.get_or_insert_with("node", |_| 2);
        assert_eq!(*second, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sanitized_names_collide() {
        let mut registry: Registry<u32> = Registry::new();
        registry.get_or_insert_with("Cube.001", |_| 1);
        assert!(registry.contains("Cube_001"));
        let same = registry.get_or_insert_with("Cube_001", |_| 2);
        assert_eq!(*same, 1);
    }

    #[test]
    #[should_panic(expected = "non-empty name")]
    fn test_empty_name_panics() {
        let mut registry: Registry<u32> = Registry::new();
        registry.get_or_insert_with("", |_| 1);
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in [
            NodeKind::Actor,
            NodeKind::ActorMesh,
            NodeKind::Light,
            NodeKind::Camera,
            NodeKind::StaticMesh,
            NodeKind::Material,
            NodeKind::MasterMaterial,
            NodeKind::Texture,
        ] {
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(NodeKind::from_tag("MetaData"), None);
    }
}

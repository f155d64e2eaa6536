use rustc_hash::FxHashMap;

use crate::scene::NodeHandle;
use crate::scene::transform::Transform;
use crate::variant::Variant;

/// A scene node.
///
/// Keeps the data the animation engine reads and writes every frame: the
/// hierarchy links, the local transform, and the attribute storage variant
/// tracks target.
///
/// # Hierarchy
///
/// Nodes form a tree through parent-child relationships:
/// - `parent`: handle of the parent node (`None` for root nodes)
/// - `children`: list of child node handles
///
/// # Attribute storage
///
/// - `components`: named attribute sets (`"Text3D" -> { "Font Size" -> 24.5 }`),
///   addressed by `"Child/@Component/Attribute"` paths
/// - `vars`: free-form variables on the node itself, addressed by
///   `"@/Variables/Key"` paths
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Node name, used for path and bone lookups.
    pub name: String,
    /// Parent node handle (`None` for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles
    pub(crate) children: Vec<NodeHandle>,

    /// Local transform (hot data accessed every frame)
    pub transform: Transform,

    /// Named attribute sets exposed to variant tracks.
    pub components: FxHashMap<String, FxHashMap<String, Variant>>,
    /// Node variables exposed to variant tracks.
    pub vars: FxHashMap<String, Variant>,
}

impl Node {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_transform(name: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            ..Self::default()
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Reads an attribute from a named attribute set.
    #[must_use]
    pub fn attribute(&self, component: &str, attribute: &str) -> Option<&Variant> {
        self.components.get(component)?.get(attribute)
    }

    /// Writes an attribute into a named attribute set, creating the set on
    /// first use.
    pub fn set_attribute(&mut self, component: &str, attribute: &str, value: Variant) {
        self.components
            .entry(component.to_string())
            .or_default()
            .insert(attribute.to_string(), value);
    }

    /// Reads a node variable.
    #[must_use]
    pub fn var(&self, name: &str) -> Option<&Variant> {
        self.vars.get(name)
    }

    /// Writes a node variable.
    pub fn set_var(&mut self, name: &str, value: Variant) {
        self.vars.insert(name.to_string(), value);
    }
}

use crate::scene::{NodeHandle, Scene};

/// Parsed form of a variant track's target path.
///
/// Two shapes are understood:
/// - `"Child A/Child B/@Component/Attribute"`: descend by direct child
///   names from the controller's node, then address an attribute within a
///   named attribute set.
/// - `"@/Variables/Key"`: a variable on the controller's node itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeTarget {
    Variable {
        name: String,
    },
    Attribute {
        node_path: Vec<String>,
        component: String,
        attribute: String,
    },
}

impl AttributeTarget {
    /// Parses a target path. Returns `None` for malformed paths; the caller
    /// treats the track as inert.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let mut node_path = Vec::new();
        let mut segments = path.split('/');

        loop {
            let segment = segments.next()?;
            if let Some(component) = segment.strip_prefix('@') {
                if component.is_empty() {
                    // "@/Variables/Key" addresses the controller's node.
                    if segments.next()? != "Variables" || !node_path.is_empty() {
                        return None;
                    }
                    let name = segments.next()?;
                    if segments.next().is_some() {
                        return None;
                    }
                    return Some(Self::Variable {
                        name: name.to_string(),
                    });
                }
                let attribute = segments.next()?;
                if segments.next().is_some() {
                    return None;
                }
                return Some(Self::Attribute {
                    node_path,
                    component: component.to_string(),
                    attribute: attribute.to_string(),
                });
            }
            if segment.is_empty() {
                return None;
            }
            node_path.push(segment.to_string());
        }
    }
}

/// A target path resolved against the scene.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedTarget {
    pub node: NodeHandle,
    pub kind: ResolvedKind,
}

#[derive(Debug, Clone)]
pub(crate) enum ResolvedKind {
    Variable(String),
    Attribute { component: String, attribute: String },
}

/// Resolves a target path relative to the controller's node. `None` when
/// the path is malformed or names a child that does not exist.
pub(crate) fn resolve(scene: &Scene, root: NodeHandle, path: &str) -> Option<ResolvedTarget> {
    match AttributeTarget::parse(path)? {
        AttributeTarget::Variable { name } => Some(ResolvedTarget {
            node: root,
            kind: ResolvedKind::Variable(name),
        }),
        AttributeTarget::Attribute {
            node_path,
            component,
            attribute,
        } => {
            let mut node = root;
            for segment in &node_path {
                node = scene.find_child(node, segment)?;
            }
            Some(ResolvedTarget {
                node,
                kind: ResolvedKind::Attribute {
                    component,
                    attribute,
                },
            })
        }
    }
}

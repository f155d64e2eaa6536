use bitflags::bitflags;
use glam::{Affine3A, Quat, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::scene::node::Node;
use crate::scene::transform::Transform;
use crate::scene::{NodeHandle, Scene};

/// Hash used for bone name lookups.
#[must_use]
pub fn bone_name_hash(name: &str) -> u64 {
    xxh3_64(name.as_bytes())
}

bitflags! {
    /// Collision shapes supported by a bone. Consumed by physics/raycast
    /// subsystems, carried through untouched by the animation engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BoneCollisionFlags: u8 {
        const SPHERE = 1 << 0;
        const BOX = 1 << 1;
    }
}

/// Axis-aligned local-space bounding box, carried per bone for collision
/// subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }
}

/// One joint in a skeleton hierarchy.
///
/// `parent_index` of a non-root bone always references a previously-defined
/// index; the hierarchy is acyclic and traversable root-to-leaf in index
/// order. Root detection is by index equality with the skeleton's stored root
/// index, never by the parent index value (`0` is a valid parent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    /// Bone name.
    pub name: String,
    /// Bone name hash.
    pub name_hash: u64,
    /// Parent bone index.
    pub parent_index: u32,
    /// Bind-pose position.
    pub initial_position: Vec3,
    /// Bind-pose rotation.
    pub initial_rotation: Quat,
    /// Bind-pose scale.
    pub initial_scale: Vec3,
    /// Bind-pose-to-model-space inverse, consumed by skinning.
    pub offset_matrix: Affine3A,
    /// Bones with this flag unset are excluded from animation writes.
    pub animated: bool,
    /// Supported collision shapes.
    pub collision_mask: BoneCollisionFlags,
    /// Collision sphere radius.
    pub radius: f32,
    /// Local-space bounding box.
    pub bounding_box: BoundingBox,
    /// Scene node currently bound to this bone. Non-owning; rebound by the
    /// host after deserialization.
    #[serde(skip)]
    pub node: Option<NodeHandle>,
}

impl Bone {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            name_hash: bone_name_hash(name),
            parent_index: 0,
            initial_position: Vec3::ZERO,
            initial_rotation: Quat::IDENTITY,
            initial_scale: Vec3::ONE,
            offset_matrix: Affine3A::IDENTITY,
            animated: true,
            collision_mask: BoneCollisionFlags::empty(),
            radius: 0.0,
            bounding_box: BoundingBox::default(),
            node: None,
        }
    }

    /// Bind-pose local transform.
    #[must_use]
    pub fn bind_transform(&self) -> Transform {
        Transform::from_trs(
            self.initial_position,
            self.initial_rotation,
            self.initial_scale,
        )
    }
}

/// Hierarchical collection of bones.
///
/// Owns the bone sequence; bones are addressed by index. Serialization
/// round-trips the bone list and root index losslessly; node bindings are
/// runtime state and are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skeleton {
    bones: Vec<Bone>,
    root_bone_index: u32,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces this skeleton's bone list and root index wholesale. Node
    /// bindings resolved against the previous definition are invalidated.
    pub fn define(&mut self, src: &Skeleton) {
        self.bones = src.bones.clone();
        for bone in &mut self.bones {
            bone.node = None;
        }
        self.root_bone_index = src.root_bone_index;
    }

    pub fn set_root_bone_index(&mut self, index: u32) {
        if (index as usize) < self.bones.len() {
            self.root_bone_index = index;
        } else {
            log::error!("Root bone index {index} out of bounds, ignored");
        }
    }

    #[inline]
    #[must_use]
    pub fn root_bone_index(&self) -> u32 {
        self.root_bone_index
    }

    pub fn add_bone(&mut self, bone: Bone) -> u32 {
        self.bones.push(bone);
        (self.bones.len() - 1) as u32
    }

    #[inline]
    #[must_use]
    pub fn num_bones(&self) -> u32 {
        self.bones.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Modifiable bone access, for hosts that patch bind poses or bindings.
    pub fn bones_mut(&mut self) -> &mut [Bone] {
        &mut self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, index: u32) -> Option<&Bone> {
        self.bones.get(index as usize)
    }

    pub fn bone_mut(&mut self, index: u32) -> Option<&mut Bone> {
        self.bones.get_mut(index as usize)
    }

    #[must_use]
    pub fn root_bone(&self) -> Option<&Bone> {
        self.bone(self.root_bone_index)
    }

    /// Bone index by name. `None` when absent.
    #[must_use]
    pub fn bone_index(&self, name: &str) -> Option<u32> {
        self.bones
            .iter()
            .position(|bone| bone.name == name)
            .map(|i| i as u32)
    }

    /// Bone index by name hash. `None` when absent.
    #[must_use]
    pub fn bone_index_by_hash(&self, name_hash: u64) -> Option<u32> {
        self.bones
            .iter()
            .position(|bone| bone.name_hash == name_hash)
            .map(|i| i as u32)
    }

    /// Bone index by bound scene node. `None` when absent.
    #[must_use]
    pub fn bone_index_by_node(&self, node: NodeHandle) -> Option<u32> {
        self.bones
            .iter()
            .position(|bone| bone.node == Some(node))
            .map(|i| i as u32)
    }

    /// Parent of the given bone. `None` for the root bone only.
    #[must_use]
    pub fn bone_parent(&self, index: u32) -> Option<&Bone> {
        if index == self.root_bone_index {
            return None;
        }
        let bone = self.bone(index)?;
        self.bone(bone.parent_index)
    }

    /// Whether `index` lies in the subtree rooted at `subtree_root`
    /// (inclusive).
    #[must_use]
    pub fn is_in_subtree(&self, index: u32, subtree_root: u32) -> bool {
        let mut current = index;
        // Bounded walk; parent indices always reference previously-defined
        // bones, so the chain terminates at the root.
        for _ in 0..=self.bones.len() {
            if current == subtree_root {
                return true;
            }
            if current == self.root_bone_index {
                return false;
            }
            match self.bone(current) {
                Some(bone) => current = bone.parent_index,
                None => return false,
            }
        }
        false
    }

    /// Reassigns every animated bone's bound node to the bind-pose local
    /// transform and marks the transforms dirty.
    pub fn reset(&self, nodes: &mut SlotMap<NodeHandle, Node>) {
        self.reset_silent(nodes);
        for bone in &self.bones {
            if !bone.animated {
                continue;
            }
            if let Some(node) = bone.node.and_then(|handle| nodes.get_mut(handle)) {
                node.transform.mark_dirty();
            }
        }
    }

    /// As [`Skeleton::reset`], but leaves dirty-marking to the caller's next
    /// transform pass.
    pub fn reset_silent(&self, nodes: &mut SlotMap<NodeHandle, Node>) {
        for bone in &self.bones {
            if !bone.animated {
                continue;
            }
            let Some(node) = bone.node.and_then(|handle| nodes.get_mut(handle)) else {
                continue;
            };
            node.transform.position = bone.initial_position;
            node.transform.rotation = bone.initial_rotation;
            node.transform.scale = bone.initial_scale;
        }
    }

    /// Instantiates one scene node per bone at bind pose under `parent`,
    /// recording the handles as the bones' bindings. Returns the root bone's
    /// node handle.
    pub fn spawn_nodes(&mut self, scene: &mut Scene, parent: NodeHandle) -> Option<NodeHandle> {
        for index in 0..self.bones.len() {
            let bone = &self.bones[index];
            let node = Node::with_transform(&bone.name, bone.bind_transform());

            let attach_to = if index as u32 == self.root_bone_index {
                parent
            } else {
                match self.bones[bone.parent_index as usize].node {
                    Some(handle) => handle,
                    None => {
                        log::warn!(
                            "Bone '{}' parent has no node, attaching to skeleton parent",
                            bone.name
                        );
                        parent
                    }
                }
            };

            let handle = scene.add_child(attach_to, node);
            self.bones[index].node = Some(handle);
        }
        self.root_bone().and_then(|bone| bone.node)
    }

    /// Folds each bone's offset matrix through its current world matrix,
    /// producing the skinning matrices relative to the mesh's own transform.
    #[must_use]
    pub fn joint_matrices(
        &self,
        nodes: &SlotMap<NodeHandle, Node>,
        mesh_world_inverse: Affine3A,
    ) -> Vec<Affine3A> {
        self.bones
            .iter()
            .map(|bone| {
                let Some(node) = bone.node.and_then(|handle| nodes.get(handle)) else {
                    return Affine3A::IDENTITY;
                };
                mesh_world_inverse * node.transform.world_matrix * bone.offset_matrix
            })
            .collect()
    }
}

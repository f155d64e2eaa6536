//! Scene graph collaborator.
//!
//! The animation engine writes into scene nodes; this module provides the
//! minimal node model it targets:
//! - `Node`: named scene node (hierarchy, transform, attribute storage)
//! - `Transform`: local TRS with cached local/world matrices
//! - `Scene`: node container and world matrix propagation
//! - `Skeleton`: bone hierarchy bound to scene nodes

pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use node::Node;
pub use scene::Scene;
pub use skeleton::{Bone, BoneCollisionFlags, BoundingBox, Skeleton, bone_name_hash};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}

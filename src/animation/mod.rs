//! Layered animation evaluation.
//!
//! - `clip`: immutable animation resources (bone tracks + variant tracks)
//! - `tracks`: keyframe storage and sampling
//! - `layer`: per-instance playback state (time, weight, fades, blend mode)
//! - `binding`: attribute path resolution against the scene
//! - `reset`: frame baseline seeding (full vs. soft reset)
//! - `mixer`: the ordered replace/additive composition fold
//! - `controller`: layer lifecycle and per-frame evaluation entry point

pub mod binding;
pub mod clip;
pub mod controller;
pub mod layer;
mod mixer;
pub mod reset;
pub mod tracks;
pub mod values;

pub use binding::AttributeTarget;
pub use clip::Animation;
pub use controller::AnimationController;
pub use layer::{AnimationLayer, BlendMode, LayerState};
pub use reset::{BaselineProvider, FullReset, SoftReset};
pub use tracks::{
    BoneTrack, ChannelMask, InterpolationMode, KeyframeCursor, KeyframeTrack, VariantTrack,
};
pub use values::Interpolatable;

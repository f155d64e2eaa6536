#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod errors;
pub mod scene;
pub mod variant;

pub use animation::{
    Animation, AnimationController, AnimationLayer, BaselineProvider, BlendMode, BoneTrack,
    ChannelMask, FullReset, InterpolationMode, KeyframeTrack, LayerState, SoftReset, VariantTrack,
};
pub use errors::{AnimationError, Result};
pub use scene::{Bone, Node, NodeHandle, Scene, Skeleton, Transform};
pub use variant::{Variant, VariantKind};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::animation::binding::{self, ResolvedTarget};
use crate::animation::clip::Animation;
use crate::animation::tracks::{BoneTrack, KeyframeCursor};
use crate::scene::{NodeHandle, Scene, Skeleton};

/// How a layer's sampled values combine with the accumulated result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Interpolate the accumulated value toward the layer's value by the
    /// layer's weight.
    Replace,
    /// Add the weighted delta from the track's base value.
    Additive,
}

/// Sampling cursors for the three channels of one bone track.
#[derive(Debug, Clone, Default)]
pub(crate) struct BoneTrackCursors {
    pub position: KeyframeCursor,
    pub rotation: KeyframeCursor,
    pub scale: KeyframeCursor,
}

/// Serializable snapshot of a layer's playback state.
///
/// Animations are referenced by name; the host re-resolves them on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerState {
    pub animation: String,
    pub time: f32,
    pub weight: f32,
    pub target_weight: f32,
    pub fade_speed: f32,
    pub speed: f32,
    pub blend_mode: BlendMode,
    pub looped: bool,
    pub layer_index: u32,
    pub start_bone: Option<String>,
    pub auto_fade_time: f32,
    pub remove_on_fade: bool,
}

/// Mutable playback state of one animation instance.
///
/// A layer is keyed by `(animation name, layer index)` within its
/// controller. Smaller layer indices are composed first; later layers
/// override or add to their result according to their blend mode and
/// weight.
pub struct AnimationLayer {
    animation: Arc<Animation>,

    pub(crate) time: f32,
    pub(crate) weight: f32,
    target_weight: f32,
    fade_speed: f32,
    pub(crate) speed: f32,
    pub(crate) blend_mode: BlendMode,
    pub(crate) looped: bool,
    pub(crate) layer_index: u32,
    start_bone: Option<String>,
    auto_fade_time: f32,
    remove_on_fade: bool,

    // Resolved bindings; rebuilt when the start bone or blend mode changes.
    pub(crate) bone_bindings: SmallVec<[Option<u32>; 8]>,
    pub(crate) attribute_bindings: SmallVec<[Option<ResolvedTarget>; 4]>,
    pub(crate) bindings_dirty: bool,

    pub(crate) bone_cursors: Vec<BoneTrackCursors>,
    pub(crate) variant_cursors: Vec<KeyframeCursor>,
}

impl AnimationLayer {
    #[must_use]
    pub fn new(animation: Arc<Animation>, layer_index: u32) -> Self {
        let bone_cursors = vec![BoneTrackCursors::default(); animation.tracks().len()];
        let variant_cursors = vec![KeyframeCursor::default(); animation.variant_tracks().len()];
        Self {
            animation,
            time: 0.0,
            weight: 0.0,
            target_weight: 0.0,
            fade_speed: 0.0,
            speed: 1.0,
            blend_mode: BlendMode::Replace,
            looped: false,
            layer_index,
            start_bone: None,
            auto_fade_time: 0.0,
            remove_on_fade: false,
            bone_bindings: SmallVec::new(),
            attribute_bindings: SmallVec::new(),
            bindings_dirty: true,
            bone_cursors,
            variant_cursors,
        }
    }

    #[inline]
    #[must_use]
    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[inline]
    #[must_use]
    pub fn target_weight(&self) -> f32 {
        self.target_weight
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    #[must_use]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    #[inline]
    #[must_use]
    pub fn looped(&self) -> bool {
        self.looped
    }

    #[inline]
    #[must_use]
    pub fn layer_index(&self) -> u32 {
        self.layer_index
    }

    #[must_use]
    pub fn start_bone(&self) -> Option<&str> {
        self.start_bone.as_deref()
    }

    /// Sets the time cursor directly, clamped to the animation's length.
    pub fn set_time(&mut self, time: f32) {
        self.time = time.clamp(0.0, self.animation.length());
    }

    /// Sets the weight directly, cancelling any fade in progress.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
        self.target_weight = weight;
        self.fade_speed = 0.0;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        if self.blend_mode != mode {
            self.blend_mode = mode;
            self.bindings_dirty = true;
        }
    }

    pub fn set_looped(&mut self, looped: bool) {
        self.looped = looped;
    }

    /// Restricts the layer to the subtree rooted at the named bone, or
    /// lifts the restriction with `None`.
    pub fn set_start_bone(&mut self, bone_name: Option<&str>) {
        self.start_bone = bone_name.map(str::to_string);
        self.bindings_dirty = true;
    }

    /// Fade-out duration used when a non-looping layer reaches its end
    /// naturally. Zero removes the layer immediately after the end pose has
    /// been applied.
    pub fn set_auto_fade_time(&mut self, time: f32) {
        self.auto_fade_time = time;
    }

    /// Starts a linear weight fade toward `target` over `duration` seconds.
    /// Non-positive durations apply the target immediately.
    pub fn set_fade(&mut self, target: f32, duration: f32) {
        self.target_weight = target;
        if duration <= 0.0 || (target - self.weight).abs() <= f32::EPSILON {
            self.weight = target;
            self.fade_speed = 0.0;
        } else {
            self.fade_speed = (target - self.weight) / duration;
        }
    }

    /// Fade in and keep: used by `play` for both fresh and reused layers.
    pub(crate) fn revive(&mut self, looped: bool, fade_in: f32) {
        self.looped = looped;
        self.remove_on_fade = false;
        self.set_fade(1.0, fade_in);
    }

    /// Fade out and remove once silent.
    pub(crate) fn mark_for_removal(&mut self, fade_out: f32) {
        self.remove_on_fade = true;
        self.set_fade(0.0, fade_out);
    }

    #[must_use]
    pub(crate) fn should_remove(&self) -> bool {
        self.remove_on_fade && self.weight <= 0.0 && self.target_weight <= 0.0
    }

    /// Advances the weight fade.
    pub(crate) fn update_fade(&mut self, dt: f32) {
        if self.fade_speed == 0.0 {
            return;
        }
        self.weight += self.fade_speed * dt;
        let reached = if self.fade_speed > 0.0 {
            self.weight >= self.target_weight
        } else {
            self.weight <= self.target_weight
        };
        if reached {
            self.weight = self.target_weight;
            self.fade_speed = 0.0;
        }
    }

    /// Advances the time cursor. Looping layers wrap by modulo; non-looping
    /// layers clamp at the end, apply the end pose once, and begin their
    /// auto fade-out on the following frame.
    pub(crate) fn advance(&mut self, dt: f32) {
        let length = self.animation.length();

        if !self.looped
            && length > 0.0
            && self.time >= length
            && !self.remove_on_fade
        {
            self.mark_for_removal(self.auto_fade_time);
        }

        self.time += dt * self.speed;
        if self.looped {
            if length > 0.0 && (self.time >= length || self.time < 0.0) {
                self.time = self.time.rem_euclid(length);
            }
        } else {
            self.time = self.time.clamp(0.0, length.max(0.0));
        }
    }

    /// Resolves bone bindings against the skeleton: one entry per bone
    /// track, `None` for unknown bones, bones with animation disabled, and
    /// bones outside the start-bone subtree.
    pub(crate) fn rebind(&mut self, skeleton: &Skeleton) {
        let subtree_root = self.start_bone.as_deref().and_then(|name| {
            let index = skeleton.bone_index(name);
            if index.is_none() {
                log::debug!(
                    "Start bone '{name}' not found, layer applies to the whole skeleton"
                );
            }
            index
        });

        let bind = |track: &BoneTrack| -> Option<u32> {
            let index = skeleton.bone_index_by_hash(track.bone_name_hash())?;
            let bone = skeleton.bone(index)?;
            if !bone.animated {
                return None;
            }
            if let Some(root) = subtree_root {
                if !skeleton.is_in_subtree(index, root) {
                    return None;
                }
            }
            Some(index)
        };

        let animation = Arc::clone(&self.animation);
        self.bone_bindings = animation.tracks().iter().map(bind).collect();
    }

    /// Resolves variant track targets against the scene. Unresolvable paths
    /// leave the track inert.
    pub(crate) fn resolve_attributes(&mut self, scene: &Scene, root: NodeHandle) {
        let animation = Arc::clone(&self.animation);
        self.attribute_bindings = animation
            .variant_tracks()
            .iter()
            .map(|track| {
                let resolved = binding::resolve(scene, root, track.target());
                if resolved.is_none() {
                    log::debug!("Animation target '{}' not found, track inert", track.target());
                }
                if self.blend_mode == BlendMode::Additive
                    && track.base_value().is_some_and(|base| !base.is_interpolable())
                {
                    log::warn!(
                        "Additive blend on discrete track '{}' applies the sampled value unscaled",
                        track.target()
                    );
                }
                resolved
            })
            .collect();
    }

    /// Captures the playback state for serialization.
    #[must_use]
    pub fn to_state(&self) -> LayerState {
        LayerState {
            animation: self.animation.name().to_string(),
            time: self.time,
            weight: self.weight,
            target_weight: self.target_weight,
            fade_speed: self.fade_speed,
            speed: self.speed,
            blend_mode: self.blend_mode,
            looped: self.looped,
            layer_index: self.layer_index,
            start_bone: self.start_bone.clone(),
            auto_fade_time: self.auto_fade_time,
            remove_on_fade: self.remove_on_fade,
        }
    }

    /// Rebuilds a layer from a snapshot and its re-resolved animation.
    #[must_use]
    pub fn from_state(state: &LayerState, animation: Arc<Animation>) -> Self {
        let mut layer = Self::new(animation, state.layer_index);
        layer.time = state.time;
        layer.weight = state.weight;
        layer.target_weight = state.target_weight;
        layer.fade_speed = state.fade_speed;
        layer.speed = state.speed;
        layer.blend_mode = state.blend_mode;
        layer.looped = state.looped;
        layer.start_bone = state.start_bone.clone();
        layer.auto_fade_time = state.auto_fade_time;
        layer.remove_on_fade = state.remove_on_fade;
        layer
    }
}

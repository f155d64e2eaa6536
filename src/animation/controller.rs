use std::sync::Arc;

use crate::animation::clip::Animation;
use crate::animation::layer::{AnimationLayer, BlendMode, LayerState};
use crate::animation::mixer;
use crate::animation::reset::{BaselineProvider, FullReset};
use crate::errors::{AnimationError, Result};
use crate::scene::{NodeHandle, Scene, Skeleton};

/// Drives a stack of animation layers over one skeleton.
///
/// The controller owns the skeleton (whose bones are bound to scene nodes)
/// and the set of active layers, keyed by `(animation name, layer index)`.
/// [`AnimationController::update`] is the per-frame entry point: it advances
/// fades and time cursors, prunes silent layers, seeds the baseline through
/// the injected [`BaselineProvider`], and composes the layers in ascending
/// layer-index order (insertion order for equal indices).
///
/// By-name mutators address the first matching layer in composition order.
pub struct AnimationController {
    node: NodeHandle,
    skeleton: Skeleton,
    layers: Vec<AnimationLayer>,
    baseline: Box<dyn BaselineProvider>,
}

impl AnimationController {
    /// Creates a controller rooted at `node`, with full reset as the
    /// default baseline policy.
    #[must_use]
    pub fn new(node: NodeHandle, skeleton: Skeleton) -> Self {
        Self {
            node,
            skeleton,
            layers: Vec::new(),
            baseline: Box::new(FullReset),
        }
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeHandle {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Modifiable skeleton access, for hosts that patch bind poses or node
    /// bindings. Call [`AnimationController::invalidate_bindings`] if bones
    /// were added, removed or renamed.
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    /// Injects the baseline policy used to seed each frame.
    pub fn set_baseline(&mut self, baseline: Box<dyn BaselineProvider>) {
        self.baseline = baseline;
    }

    /// Forces every layer to re-resolve its bone and attribute bindings on
    /// the next update.
    pub fn invalidate_bindings(&mut self) {
        for layer in &mut self.layers {
            layer.bindings_dirty = true;
        }
    }

    #[inline]
    #[must_use]
    pub fn layers(&self) -> &[AnimationLayer] {
        &self.layers
    }

    /// Starts or resumes playback of `animation` on `layer_index`, fading
    /// the weight toward 1 over `fade_in` seconds. An already-active layer
    /// keeps its current time rather than restarting.
    pub fn play(&mut self, animation: &Arc<Animation>, layer_index: u32, looped: bool, fade_in: f32) {
        if let Some(layer) = self.find_layer_mut(animation.name(), layer_index) {
            layer.revive(looped, fade_in);
            return;
        }
        let mut layer = AnimationLayer::new(Arc::clone(animation), layer_index);
        layer.revive(looped, fade_in);
        self.layers.push(layer);
    }

    /// As [`AnimationController::play`], additionally fading every other
    /// layer out over the same duration and removing it at weight zero.
    pub fn play_exclusive(
        &mut self,
        animation: &Arc<Animation>,
        layer_index: u32,
        looped: bool,
        fade: f32,
    ) {
        self.play(animation, layer_index, looped, fade);
        for layer in &mut self.layers {
            if layer.animation().name() != animation.name() || layer.layer_index != layer_index {
                layer.mark_for_removal(fade);
            }
        }
    }

    /// Fades out every layer playing `name` and removes them at weight
    /// zero. Returns whether any layer matched.
    pub fn stop(&mut self, name: &str, fade_out: f32) -> bool {
        let mut any = false;
        for layer in &mut self.layers {
            if layer.animation().name() == name {
                layer.mark_for_removal(fade_out);
                any = true;
            }
        }
        any
    }

    /// Fades out every layer on `layer_index`.
    pub fn stop_layer(&mut self, layer_index: u32, fade_out: f32) -> bool {
        let mut any = false;
        for layer in &mut self.layers {
            if layer.layer_index == layer_index {
                layer.mark_for_removal(fade_out);
                any = true;
            }
        }
        any
    }

    /// Fades out every layer.
    pub fn stop_all(&mut self, fade_out: f32) {
        for layer in &mut self.layers {
            layer.mark_for_removal(fade_out);
        }
    }

    pub fn set_time(&mut self, name: &str, time: f32) -> bool {
        self.with_layer(name, |layer| layer.set_time(time))
    }

    pub fn set_weight(&mut self, name: &str, weight: f32) -> bool {
        self.with_layer(name, |layer| layer.set_weight(weight))
    }

    pub fn set_speed(&mut self, name: &str, speed: f32) -> bool {
        self.with_layer(name, |layer| layer.set_speed(speed))
    }

    pub fn set_blend_mode(&mut self, name: &str, mode: BlendMode) -> bool {
        self.with_layer(name, |layer| layer.set_blend_mode(mode))
    }

    pub fn set_looped(&mut self, name: &str, looped: bool) -> bool {
        self.with_layer(name, |layer| layer.set_looped(looped))
    }

    /// Restricts the named animation to the subtree rooted at `bone_name`.
    pub fn set_start_bone(&mut self, name: &str, bone_name: Option<&str>) -> bool {
        self.with_layer(name, |layer| layer.set_start_bone(bone_name))
    }

    pub fn set_auto_fade(&mut self, name: &str, fade_out: f32) -> bool {
        self.with_layer(name, |layer| layer.set_auto_fade_time(fade_out))
    }

    #[must_use]
    pub fn is_playing(&self, name: &str) -> bool {
        self.find_layer(name).is_some()
    }

    #[must_use]
    pub fn time(&self, name: &str) -> Option<f32> {
        self.find_layer(name).map(AnimationLayer::time)
    }

    #[must_use]
    pub fn weight(&self, name: &str) -> Option<f32> {
        self.find_layer(name).map(AnimationLayer::weight)
    }

    /// Evaluates one frame: advances layer fades and time cursors, removes
    /// layers that finished fading out, seeds the baseline, and composes
    /// the surviving layers in order onto the scene.
    ///
    /// Writes node local transforms and attribute values only; world matrix
    /// propagation stays with the host's scene pass.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for layer in &mut self.layers {
            layer.update_fade(dt);
            layer.advance(dt);
        }
        self.layers.retain(|layer| !layer.should_remove());
        self.layers.sort_by_key(AnimationLayer::layer_index);

        for layer in &mut self.layers {
            if layer.bindings_dirty {
                layer.rebind(&self.skeleton);
                layer.resolve_attributes(scene, self.node);
                layer.bindings_dirty = false;
            }
        }

        self.baseline.prepare(&self.skeleton, &mut scene.nodes);

        for layer in &mut self.layers {
            mixer::apply_layer(layer, &self.skeleton, scene);
        }
    }

    /// Captures every layer's playback state for serialization.
    #[must_use]
    pub fn save_state(&self) -> Vec<LayerState> {
        self.layers.iter().map(AnimationLayer::to_state).collect()
    }

    /// Replaces the layer stack from serialized state, re-resolving
    /// animations through `resolve`. Fails without modifying the controller
    /// if any animation cannot be resolved.
    pub fn restore_state<F>(&mut self, states: &[LayerState], resolve: F) -> Result<()>
    where
        F: Fn(&str) -> Option<Arc<Animation>>,
    {
        let mut layers = Vec::with_capacity(states.len());
        for state in states {
            let animation = resolve(&state.animation)
                .ok_or_else(|| AnimationError::UnknownAnimation(state.animation.clone()))?;
            layers.push(AnimationLayer::from_state(state, animation));
        }
        self.layers = layers;
        Ok(())
    }

    fn find_layer(&self, name: &str) -> Option<&AnimationLayer> {
        self.layers
            .iter()
            .find(|layer| layer.animation().name() == name)
    }

    fn find_layer_mut(&mut self, name: &str, layer_index: u32) -> Option<&mut AnimationLayer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.animation().name() == name && layer.layer_index == layer_index)
    }

    fn with_layer<F>(&mut self, name: &str, op: F) -> bool
    where
        F: FnOnce(&mut AnimationLayer),
    {
        match self
            .layers
            .iter_mut()
            .find(|layer| layer.animation().name() == name)
        {
            Some(layer) => {
                op(layer);
                true
            }
            None => false,
        }
    }
}

//! The blending composer: folds one layer's sampled values onto the scene.
//!
//! Layers are applied in ascending layer-index order by the controller; the
//! bone nodes and attribute slots themselves carry the accumulated value
//! between layers, seeded by the frame's baseline provider. Composition is
//! therefore strictly sequential and order-dependent: a Replace layer
//! interpolates the accumulated value toward its own by its weight, and an
//! Additive layer adds its weighted delta from the track's base value.

use glam::Quat;

use crate::animation::clip::Animation;
use crate::animation::layer::{AnimationLayer, BlendMode};
use crate::animation::tracks::{ChannelMask, VariantTrack};
use crate::animation::binding::ResolvedKind;
use crate::scene::{Scene, Skeleton};
use crate::variant::Variant;

/// Applies one layer's tracks for the current frame.
pub(crate) fn apply_layer(layer: &mut AnimationLayer, skeleton: &Skeleton, scene: &mut Scene) {
    let weight = layer.weight.clamp(0.0, 1.0);
    if weight <= 0.0 {
        return;
    }

    let animation = layer.animation().clone();
    apply_bone_tracks(layer, &animation, skeleton, scene, weight);
    apply_variant_tracks(layer, &animation, scene, weight);
}

fn apply_bone_tracks(
    layer: &mut AnimationLayer,
    animation: &Animation,
    skeleton: &Skeleton,
    scene: &mut Scene,
    weight: f32,
) {
    for (i, track) in animation.tracks().iter().enumerate() {
        let Some(bone_index) = layer.bone_bindings.get(i).copied().flatten() else {
            continue;
        };
        let Some(bone) = skeleton.bone(bone_index) else {
            continue;
        };
        let Some(node) = bone.node.and_then(|handle| scene.nodes.get_mut(handle)) else {
            continue;
        };

        let time = layer.time;
        let channels = track.channels();
        let cursors = &mut layer.bone_cursors[i];

        if channels.contains(ChannelMask::POSITION) {
            if let Some(keys) = track.position_track() {
                let value = keys.sample_with_cursor(time, &mut cursors.position);
                match layer.blend_mode {
                    BlendMode::Replace => {
                        node.transform.position = if weight >= 1.0 {
                            value
                        } else {
                            node.transform.position.lerp(value, weight)
                        };
                    }
                    BlendMode::Additive => {
                        node.transform.position += (value - bone.initial_position) * weight;
                    }
                }
            }
        }

        if channels.contains(ChannelMask::ROTATION) {
            if let Some(keys) = track.rotation_track() {
                let value = keys.sample_with_cursor(time, &mut cursors.rotation);
                match layer.blend_mode {
                    BlendMode::Replace => {
                        node.transform.rotation = if weight >= 1.0 {
                            value
                        } else {
                            node.transform.rotation.slerp(value, weight)
                        };
                    }
                    BlendMode::Additive => {
                        // The delta is a relative rotation from the bind
                        // pose, scaled by interpolating from identity.
                        let delta = value * bone.initial_rotation.inverse();
                        let scaled = if weight >= 1.0 {
                            delta
                        } else {
                            Quat::IDENTITY.slerp(delta, weight)
                        };
                        node.transform.rotation = scaled * node.transform.rotation;
                    }
                }
            }
        }

        if channels.contains(ChannelMask::SCALE) {
            if let Some(keys) = track.scale_track() {
                let value = keys.sample_with_cursor(time, &mut cursors.scale);
                match layer.blend_mode {
                    BlendMode::Replace => {
                        node.transform.scale = if weight >= 1.0 {
                            value
                        } else {
                            node.transform.scale.lerp(value, weight)
                        };
                    }
                    BlendMode::Additive => {
                        node.transform.scale += (value - bone.initial_scale) * weight;
                    }
                }
            }
        }
    }
}

fn apply_variant_tracks(
    layer: &mut AnimationLayer,
    animation: &Animation,
    scene: &mut Scene,
    weight: f32,
) {
    for (i, track) in animation.variant_tracks().iter().enumerate() {
        let Some(target) = layer.attribute_bindings.get(i).and_then(Option::as_ref) else {
            continue;
        };
        let value = track.sample(layer.time, &mut layer.variant_cursors[i]);
        let Some(node) = scene.nodes.get_mut(target.node) else {
            continue;
        };

        match &target.kind {
            ResolvedKind::Variable(name) => {
                let current = node.vars.get(name).cloned();
                let out = compose_variant(current, &value, track, layer.blend_mode, weight);
                node.vars.insert(name.clone(), out);
            }
            ResolvedKind::Attribute {
                component,
                attribute,
            } => {
                let current = node.attribute(component, attribute).cloned();
                let out = compose_variant(current, &value, track, layer.blend_mode, weight);
                node.set_attribute(component, attribute, out);
            }
        }
    }
}

/// Folds one sampled variant value onto a target slot.
///
/// Attributes have no bind pose; an unset target seeds from the track's
/// base value. Discrete values replace by nearest selection and, under
/// additive blending, apply unscaled (see `Variant::add_scaled_delta`).
fn compose_variant(
    current: Option<Variant>,
    value: &Variant,
    track: &VariantTrack,
    mode: BlendMode,
    weight: f32,
) -> Variant {
    let base = track
        .base_value()
        .cloned()
        .unwrap_or_else(|| value.clone());
    let current = current.unwrap_or_else(|| base.clone());
    match mode {
        BlendMode::Replace => {
            if weight >= 1.0 {
                value.clone()
            } else {
                current.lerp(value, weight)
            }
        }
        BlendMode::Additive => current.add_scaled_delta(value, &base, weight),
    }
}

//! Controller Lifecycle Tests
//!
//! Tests for:
//! - Fade-in ramps and play-exclusive crossfades (exact single-step math)
//! - Layer reuse on repeated play
//! - Natural end, auto fade and removal
//! - Full vs. soft reset divergence under an external ancestor scale
//! - Loop wrap-around
//! - Determinism and mid-animation serialization round trips

use std::sync::Arc;

use glam::Vec3;

use marionette::animation::layer::LayerState;
use marionette::animation::tracks::{BoneTrack, InterpolationMode, KeyframeTrack};
use marionette::animation::{Animation, AnimationController, BlendMode, SoftReset};
use marionette::scene::{Bone, Node, NodeHandle, Scene};
use marionette::Skeleton;

const EPSILON: f32 = 1e-4;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn quad_skeleton(quad2_bind: Vec3) -> Skeleton {
    let mut skeleton = Skeleton::new();
    skeleton.add_bone(Bone::new("Root"));

    let mut quad1 = Bone::new("Quad 1");
    quad1.parent_index = 0;
    skeleton.add_bone(quad1);

    let mut quad2 = Bone::new("Quad 2");
    quad2.parent_index = 1;
    quad2.initial_position = quad2_bind;
    skeleton.add_bone(quad2);

    skeleton
}

/// Looping translation over 2 seconds: `base` at t=0/1/2, `base - delta` at
/// t=0.5 and `base + delta` at t=1.5.
fn translation_animation(name: &str, base: Vec3, delta: Vec3) -> Arc<Animation> {
    let mut animation = Animation::new(name, 2.0);
    let mut track = BoneTrack::new("Quad 2");
    track.set_position_track(KeyframeTrack::new(
        vec![0.0, 0.5, 1.0, 1.5, 2.0],
        vec![base, base - delta, base, base + delta, base],
        InterpolationMode::Linear,
    ));
    animation.add_track(track);
    Arc::new(animation)
}

struct Rig {
    scene: Scene,
    controller: AnimationController,
    quad1: NodeHandle,
    quad2: NodeHandle,
}

fn rig(quad2_bind: Vec3) -> Rig {
    init_logging();
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Node"));
    let mut skeleton = quad_skeleton(quad2_bind);
    skeleton.spawn_nodes(&mut scene, root);
    let quad1 = skeleton.bone(1).unwrap().node.unwrap();
    let quad2 = skeleton.bone(2).unwrap().node.unwrap();
    let controller = AnimationController::new(root, skeleton);
    Rig {
        scene,
        controller,
        quad1,
        quad2,
    }
}

fn local_position(scene: &Scene, node: NodeHandle) -> Vec3 {
    scene.get_node(node).unwrap().transform.position
}

fn world_position(scene: &mut Scene, node: NodeHandle) -> Vec3 {
    scene.update_world_transforms();
    scene
        .get_node(node)
        .unwrap()
        .transform
        .world_matrix()
        .translation
        .into()
}

// ============================================================================
// Fades
// ============================================================================

#[test]
fn fade_in_blends_from_bind_pose() {
    // Tall bind pose makes the fade ramp visible in every component.
    let mut rig = rig(Vec3::new(0.0, 10.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    rig.controller.play(&translate_x, 0, true, 0.5);

    // t=0.25, weight 0.5: lerp(bind, track(0.25), 0.5)
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(-0.25, 5.5, 0.0)
    ));

    // t=0.5, weight 1: the track value verbatim
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(-1.0, 1.0, 0.0)
    ));
}

#[test]
fn play_exclusive_crossfades_and_removes() {
    let mut rig = rig(Vec3::new(0.0, 10.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);
    let translate_z = translation_animation("translate_z", Vec3::new(0.0, 1.0, 0.0), Vec3::Z * 4.0);

    rig.controller.play(&translate_x, 0, true, 0.5);
    rig.controller.update(0.25, &mut rig.scene);
    rig.controller.update(0.25, &mut rig.scene);

    rig.controller.play_exclusive(&translate_z, 0, true, 0.5);

    // t=0.75: X fading out at 0.5, Z fading in at 0.5. Fold over the bind
    // seed: lerp(lerp(bind, x(0.75), 0.5), z(0.25), 0.5).
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(-0.125, 3.25, -1.0)
    ));

    // t=1.0: X reached zero weight and is removed; Z fully in.
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(0.0, 1.0, -4.0)
    ));
    assert!(!rig.controller.is_playing("translate_x"));
    assert!(rig.controller.is_playing("translate_z"));
    assert_eq!(rig.controller.layers().len(), 1);
}

#[test]
fn play_resumes_existing_layer_without_restart() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    rig.controller.play(&translate_x, 0, true, 0.0);
    rig.controller.update(0.3, &mut rig.scene);
    assert!(approx(rig.controller.time("translate_x").unwrap(), 0.3));

    // Playing again keeps the time cursor and only re-targets the weight.
    rig.controller.play(&translate_x, 0, true, 0.5);
    assert!(approx(rig.controller.time("translate_x").unwrap(), 0.3));
    assert!(approx(rig.controller.weight("translate_x").unwrap(), 1.0));
    assert_eq!(rig.controller.layers().len(), 1);
}

#[test]
fn stop_fades_out_and_removes() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    rig.controller.play(&translate_x, 0, true, 0.0);
    rig.controller.update(0.5, &mut rig.scene);

    assert!(rig.controller.stop("translate_x", 0.2));
    rig.controller.update(0.1, &mut rig.scene);
    assert!(approx(rig.controller.weight("translate_x").unwrap(), 0.5));

    rig.controller.update(0.1, &mut rig.scene);
    assert!(!rig.controller.is_playing("translate_x"));

    assert!(!rig.controller.stop("translate_x", 0.0));
}

// ============================================================================
// Natural End
// ============================================================================

#[test]
fn natural_end_holds_end_pose_then_auto_fades() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));

    let mut animation = Animation::new("lunge", 1.0);
    let mut track = BoneTrack::new("Quad 2");
    track.set_position_track(KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(4.0, 1.0, 0.0)],
        InterpolationMode::Linear,
    ));
    animation.add_track(track);
    let animation = Arc::new(animation);

    rig.controller.play(&animation, 0, false, 0.0);
    rig.controller.set_auto_fade("lunge", 0.5);

    rig.controller.update(0.6, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(2.4, 1.0, 0.0)
    ));

    // Clamped at the end, applied at full weight.
    rig.controller.update(0.6, &mut rig.scene);
    assert!(approx(rig.controller.time("lunge").unwrap(), 1.0));
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(4.0, 1.0, 0.0)
    ));

    // The frame after reaching the end starts the auto fade.
    rig.controller.update(0.2, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(4.0, 1.0, 0.0)
    ));
    rig.controller.update(0.2, &mut rig.scene);
    assert!(approx(rig.controller.weight("lunge").unwrap(), 0.6));
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(2.4, 1.0, 0.0)
    ));

    // Fade completes and the layer is removed.
    rig.controller.update(0.2, &mut rig.scene);
    rig.controller.update(0.2, &mut rig.scene);
    rig.controller.update(0.2, &mut rig.scene);
    assert!(!rig.controller.is_playing("lunge"));
}

#[test]
fn natural_end_without_auto_fade_removes_after_end_pose() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));

    let mut animation = Animation::new("lunge", 1.0);
    let mut track = BoneTrack::new("Quad 2");
    track.set_position_track(KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(4.0, 1.0, 0.0)],
        InterpolationMode::Linear,
    ));
    animation.add_track(track);
    let animation = Arc::new(animation);

    rig.controller.play(&animation, 0, false, 0.0);

    rig.controller.update(1.0, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(4.0, 1.0, 0.0)
    ));

    rig.controller.update(0.1, &mut rig.scene);
    assert!(!rig.controller.is_playing("lunge"));
}

// ============================================================================
// Full vs. Soft Reset
// ============================================================================

#[test]
fn full_reset_discards_external_ancestor_scale() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    // External write: scale the whole arm 10x.
    rig.scene.get_node_mut(rig.quad1).unwrap().transform.scale = Vec3::splat(10.0);

    rig.controller.play(&translate_x, 0, true, 0.0);
    rig.controller.set_weight("translate_x", 0.5);

    // Frame 1: baseline reseeds from bind pose, the scale is gone.
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        world_position(&mut rig.scene, rig.quad2),
        Vec3::new(-0.25, 1.0, 0.0)
    ));
    assert!(approx_vec(
        rig.scene.get_node(rig.quad1).unwrap().transform.scale,
        Vec3::ONE
    ));

    // Frame 2: memoryless, same law against the bind seed, no compounding.
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        world_position(&mut rig.scene, rig.quad2),
        Vec3::new(-0.5, 1.0, 0.0)
    ));
}

#[test]
fn soft_reset_preserves_external_scale_and_compounds() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    rig.controller.set_baseline(Box::new(SoftReset));
    rig.scene.get_node_mut(rig.quad1).unwrap().transform.scale = Vec3::splat(10.0);

    rig.controller.play(&translate_x, 0, true, 0.0);
    rig.controller.set_weight("translate_x", 0.5);

    // Frame 1: seeded by the node's current transform (the bind pose), and
    // the external scale survives: world = 10 * local.
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(-0.25, 1.0, 0.0)
    ));
    assert!(approx_vec(
        world_position(&mut rig.scene, rig.quad2),
        Vec3::new(-2.5, 10.0, 0.0)
    ));

    // Frame 2: seeded by frame 1's output, so contributions compound.
    // lerp((-0.25,1,0), (-1,1,0), 0.5) = (-0.625,1,0)
    rig.controller.update(0.25, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(-0.625, 1.0, 0.0)
    ));
    assert!(approx_vec(
        world_position(&mut rig.scene, rig.quad2),
        Vec3::new(-6.25, 10.0, 0.0)
    ));
}

// ============================================================================
// Loop Wrap
// ============================================================================

#[test]
fn loop_wrap_matches_unwrapped_time() {
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    let mut wrapped = rig(Vec3::new(0.0, 1.0, 0.0));
    wrapped.controller.play(&translate_x, 0, true, 0.0);
    wrapped.controller.update(2.5, &mut wrapped.scene);

    let mut direct = rig(Vec3::new(0.0, 1.0, 0.0));
    direct.controller.play(&translate_x, 0, true, 0.0);
    direct.controller.update(0.5, &mut direct.scene);

    assert!(approx(wrapped.controller.time("translate_x").unwrap(), 0.5));

    let a = local_position(&wrapped.scene, wrapped.quad2);
    let b = local_position(&direct.scene, direct.quad2);
    assert_eq!(a.x.to_bits(), b.x.to_bits());
    assert_eq!(a.y.to_bits(), b.y.to_bits());
    assert_eq!(a.z.to_bits(), b.z.to_bits());
}

// ============================================================================
// Direct Mutation
// ============================================================================

#[test]
fn set_time_and_weight_mutate_live_layer() {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);

    rig.controller.play(&translate_x, 0, true, 0.0);
    assert!(rig.controller.set_time("translate_x", 0.75));
    assert!(rig.controller.set_weight("translate_x", 1.0));

    // dt=0 evaluation: sample exactly at the set time.
    rig.controller.update(0.0, &mut rig.scene);
    assert!(approx_vec(
        local_position(&rig.scene, rig.quad2),
        Vec3::new(-0.5, 1.0, 0.0)
    ));

    // Time set beyond the length clamps.
    assert!(rig.controller.set_time("translate_x", 99.0));
    assert!(approx(rig.controller.time("translate_x").unwrap(), 2.0));

    assert!(!rig.controller.set_time("unknown", 0.0));
}

// ============================================================================
// Determinism & Serialization
// ============================================================================

fn scripted_run(updates: &[f32]) -> Vec3 {
    let mut rig = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);
    let translate_z = translation_animation("translate_z", Vec3::new(0.0, 1.0, 0.0), Vec3::Z * 2.0);

    rig.controller.play(&translate_x, 0, true, 0.5);
    rig.controller.play(&translate_z, 1, true, 0.0);
    rig.controller.set_weight("translate_z", 0.75);
    rig.controller.set_blend_mode("translate_z", BlendMode::Additive);

    for &dt in updates {
        rig.controller.update(dt, &mut rig.scene);
    }
    local_position(&rig.scene, rig.quad2)
}

#[test]
fn evaluation_is_deterministic() {
    let a = scripted_run(&[0.25, 0.25, 0.3]);
    let b = scripted_run(&[0.25, 0.25, 0.3]);
    assert_eq!(a.x.to_bits(), b.x.to_bits());
    assert_eq!(a.y.to_bits(), b.y.to_bits());
    assert_eq!(a.z.to_bits(), b.z.to_bits());
}

#[test]
fn serialization_round_trip_mid_animation() {
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);
    let translate_z = translation_animation("translate_z", Vec3::new(0.0, 1.0, 0.0), Vec3::Z * 2.0);
    let animations = [Arc::clone(&translate_x), Arc::clone(&translate_z)];

    // Run the original controller mid-way through fades and playback.
    let mut original = rig(Vec3::new(0.0, 1.0, 0.0));
    original.controller.play(&translate_x, 0, true, 0.5);
    original.controller.play(&translate_z, 1, true, 0.0);
    original.controller.set_weight("translate_z", 0.75);
    original.controller.set_blend_mode("translate_z", BlendMode::Additive);
    original.controller.update(0.3, &mut original.scene);

    // Snapshot the layer stack and the skeleton.
    let state_json = serde_json::to_string(&original.controller.save_state()).unwrap();
    let skeleton_json = serde_json::to_string(original.controller.skeleton()).unwrap();

    // Continue the original for one more frame.
    original.controller.update(0.2, &mut original.scene);
    let expected = local_position(&original.scene, original.quad2);

    // Restore into a fresh scene and evaluate the same frame.
    init_logging();
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Node"));
    let mut skeleton: Skeleton = serde_json::from_str(&skeleton_json).unwrap();
    skeleton.spawn_nodes(&mut scene, root);
    let quad2 = skeleton.bone(2).unwrap().node.unwrap();

    let mut controller = AnimationController::new(root, skeleton);
    let states: Vec<LayerState> = serde_json::from_str(&state_json).unwrap();
    controller
        .restore_state(&states, |name| {
            animations.iter().find(|a| a.name() == name).cloned()
        })
        .unwrap();

    controller.update(0.2, &mut scene);
    let restored = local_position(&scene, quad2);

    assert_eq!(expected.x.to_bits(), restored.x.to_bits());
    assert_eq!(expected.y.to_bits(), restored.y.to_bits());
    assert_eq!(expected.z.to_bits(), restored.z.to_bits());
}

#[test]
fn restore_state_fails_on_unknown_animation() {
    let mut source = rig(Vec3::new(0.0, 1.0, 0.0));
    let translate_x = translation_animation("translate_x", Vec3::new(0.0, 1.0, 0.0), Vec3::X);
    source.controller.play(&translate_x, 0, true, 0.0);

    let states = source.controller.save_state();
    let mut fresh = rig(Vec3::new(0.0, 1.0, 0.0));
    let result = fresh.controller.restore_state(&states, |_| None);
    assert!(result.is_err());
}

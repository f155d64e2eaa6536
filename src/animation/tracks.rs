use bitflags::bitflags;
use glam::{Quat, Vec3};

use crate::animation::values::Interpolatable;
use crate::errors::{AnimationError, Result};
use crate::scene::bone_name_hash;
use crate::variant::Variant;

/// Interpolation strategy of a track, fixed when the track is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Per-track sampling hint.
///
/// Remembers the keyframe interval the previous query landed in so that
/// steady playback resolves in O(1); large jumps fall back to a binary
/// search. Cursor state never affects the sampled value, only search cost.
#[derive(Debug, Clone, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

/// Finds the keyframe interval containing `time`: the largest index whose
/// key time is `<= time` (ties resolve to the earlier keyframe). Assumes a
/// non-empty, time-sorted `times` slice.
pub(crate) fn locate_frame(times: &[f32], time: f32, cursor: &mut KeyframeCursor) -> usize {
    let len = times.len();
    if len == 1 {
        cursor.last_index = 0;
        return 0;
    }

    // Cursor may be stale if the layer switched tracks; clamp before use.
    let start = cursor.last_index.min(len - 1);

    let found = if time >= times[start] {
        // Steady or fast-forward playback: short forward scan.
        let mut result = None;
        for offset in 0..=MAX_SCAN_OFFSET {
            let index = start + offset;
            if index >= len - 1 {
                if time >= times[len - 1] {
                    result = Some(len - 1);
                }
                break;
            }
            if time < times[index + 1] {
                result = Some(index);
                break;
            }
        }
        result
    } else {
        // Rewind or loop wrap: short backward scan.
        let mut result = None;
        for offset in 0..=MAX_SCAN_OFFSET {
            if start < offset {
                break;
            }
            let index = start - offset;
            if time >= times[index] {
                result = Some(index);
                break;
            }
        }
        result
    };

    let index = found.unwrap_or_else(|| {
        // Large jump: binary search. partition_point returns the first key
        // strictly after `time`.
        times.partition_point(|&t| t <= time).saturating_sub(1)
    });

    cursor.last_index = index;
    index
}

/// Ordered-by-time keyframe sequence for one channel.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    /// Stateless sample. Query times outside the key range clamp to the
    /// boundary keyframes; there is no extrapolation.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        assert!(!self.times.is_empty(), "track has no keyframes");
        let next = self.times.partition_point(|&t| t <= time);
        self.sample_at_frame(next.saturating_sub(1), time)
    }

    /// Sample with a cursor hint; equivalent to [`KeyframeTrack::sample`]
    /// but O(1) for steady playback.
    #[must_use]
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        assert!(!self.times.is_empty(), "track has no keyframes");
        let index = locate_frame(&self.times, time, cursor);
        self.sample_at_frame(index, time)
    }

    /// Time of the last keyframe.
    #[must_use]
    pub fn last_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return self.values[len - 1];
        }

        match self.interpolation {
            InterpolationMode::Step => self.values[index],
            InterpolationMode::Linear => {
                let t0 = self.times[index];
                let t1 = self.times[index + 1];
                let dt = t1 - t0;
                // A query before the first key clamps to t = 0.
                let t = if dt > 1e-6 {
                    ((time - t0) / dt).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                T::interpolate_linear(self.values[index], self.values[index + 1], t)
            }
        }
    }
}

bitflags! {
    /// Which transform channels of a bone track carry keyframes. Channels
    /// outside the mask fall back to the bind pose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelMask: u8 {
        const POSITION = 1 << 0;
        const ROTATION = 1 << 1;
        const SCALE = 1 << 2;
    }
}

/// Keyframe data for one bone: up to three channels, masked.
#[derive(Debug, Clone)]
pub struct BoneTrack {
    bone_name: String,
    bone_name_hash: u64,
    channels: ChannelMask,
    position: Option<KeyframeTrack<Vec3>>,
    rotation: Option<KeyframeTrack<Quat>>,
    scale: Option<KeyframeTrack<Vec3>>,
}

impl BoneTrack {
    #[must_use]
    pub fn new(bone_name: &str) -> Self {
        Self {
            bone_name: bone_name.to_string(),
            bone_name_hash: bone_name_hash(bone_name),
            channels: ChannelMask::empty(),
            position: None,
            rotation: None,
            scale: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn bone_name(&self) -> &str {
        &self.bone_name
    }

    #[inline]
    #[must_use]
    pub fn bone_name_hash(&self) -> u64 {
        self.bone_name_hash
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> ChannelMask {
        self.channels
    }

    pub fn set_position_track(&mut self, track: KeyframeTrack<Vec3>) {
        self.channels |= ChannelMask::POSITION;
        self.position = Some(track);
    }

    pub fn set_rotation_track(&mut self, track: KeyframeTrack<Quat>) {
        self.channels |= ChannelMask::ROTATION;
        self.rotation = Some(track);
    }

    pub fn set_scale_track(&mut self, track: KeyframeTrack<Vec3>) {
        self.channels |= ChannelMask::SCALE;
        self.scale = Some(track);
    }

    #[must_use]
    pub fn position_track(&self) -> Option<&KeyframeTrack<Vec3>> {
        self.position.as_ref()
    }

    #[must_use]
    pub fn rotation_track(&self) -> Option<&KeyframeTrack<Quat>> {
        self.rotation.as_ref()
    }

    #[must_use]
    pub fn scale_track(&self) -> Option<&KeyframeTrack<Vec3>> {
        self.scale.as_ref()
    }

    /// Latest keyframe time across the masked channels.
    #[must_use]
    pub fn last_key_time(&self) -> f32 {
        let mut last = 0.0_f32;
        if let Some(track) = &self.position {
            last = last.max(track.last_time());
        }
        if let Some(track) = &self.rotation {
            last = last.max(track.last_time());
        }
        if let Some(track) = &self.scale {
            last = last.max(track.last_time());
        }
        last
    }
}

/// Keyframe data targeting an arbitrary attribute path.
///
/// Built mutably, then sealed with [`VariantTrack::commit`]: commit sorts
/// the keyframes, fixes the value type, selects the interpolation strategy
/// and defaults the additive base value to the first keyframe. Mutation
/// after commit is an error.
#[derive(Debug, Clone)]
pub struct VariantTrack {
    target: String,
    base_value: Option<Variant>,
    times: Vec<f32>,
    values: Vec<Variant>,
    interpolation: InterpolationMode,
    committed: bool,
}

impl VariantTrack {
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            base_value: None,
            times: Vec::new(),
            values: Vec::new(),
            interpolation: InterpolationMode::Linear,
            committed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    /// The reference value additive blending subtracts from. Always present
    /// after commit.
    #[must_use]
    pub fn base_value(&self) -> Option<&Variant> {
        self.base_value.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn num_keyframes(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn last_key_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn set_base_value(&mut self, value: Variant) -> Result<()> {
        if self.committed {
            return Err(AnimationError::TrackCommitted(self.target.clone()));
        }
        self.base_value = Some(value);
        Ok(())
    }

    pub fn add_keyframe(&mut self, time: f32, value: Variant) -> Result<()> {
        if self.committed {
            return Err(AnimationError::TrackCommitted(self.target.clone()));
        }
        self.times.push(time);
        self.values.push(value);
        Ok(())
    }

    /// Validates and seals the track. Idempotent on an already-committed
    /// track.
    pub fn commit(&mut self) -> Result<()> {
        if self.committed {
            return Ok(());
        }
        if self.values.is_empty() {
            return Err(AnimationError::EmptyTrack(self.target.clone()));
        }

        let expected = self.values[0].kind();
        if let Some(bad) = self.values.iter().find(|value| value.kind() != expected) {
            return Err(AnimationError::KeyframeTypeMismatch {
                track: self.target.clone(),
                expected: expected.name(),
                actual: bad.kind().name(),
            });
        }
        if let Some(base) = &self.base_value {
            if base.kind() != expected {
                return Err(AnimationError::BaseValueTypeMismatch {
                    track: self.target.clone(),
                    expected: expected.name(),
                    actual: base.kind().name(),
                });
            }
        }

        let mut order: Vec<usize> = (0..self.times.len()).collect();
        order.sort_by(|&a, &b| self.times[a].total_cmp(&self.times[b]));
        self.times = order.iter().map(|&i| self.times[i]).collect();
        self.values = order.iter().map(|&i| self.values[i].clone()).collect();

        if self.base_value.is_none() {
            self.base_value = Some(self.values[0].clone());
        }
        self.interpolation = if expected.is_interpolable() {
            InterpolationMode::Linear
        } else {
            InterpolationMode::Step
        };
        self.committed = true;
        Ok(())
    }

    /// Samples the track at `time`. Numeric tracks interpolate linearly;
    /// discrete tracks return the earlier keyframe unconditionally. Query
    /// times outside the key range clamp.
    #[must_use]
    pub fn sample(&self, time: f32, cursor: &mut KeyframeCursor) -> Variant {
        debug_assert!(self.committed, "variant track sampled before commit");
        assert!(!self.times.is_empty(), "track has no keyframes");

        let index = locate_frame(&self.times, time, cursor);
        let len = self.times.len();
        if index >= len - 1 {
            return self.values[len - 1].clone();
        }

        match self.interpolation {
            InterpolationMode::Step => self.values[index].clone(),
            InterpolationMode::Linear => {
                let t0 = self.times[index];
                let t1 = self.times[index + 1];
                let dt = t1 - t0;
                let t = if dt > 1e-6 {
                    ((time - t0) / dt).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                self.values[index].lerp(&self.values[index + 1], t)
            }
        }
    }
}

use crate::animation::tracks::{BoneTrack, VariantTrack};
use crate::errors::{AnimationError, Result};

/// Named, immutable animation resource.
///
/// Holds the bone tracks and variant tracks, plus the total length that
/// governs loop wrap-around. Tracks may define keyframes anywhere within
/// `[0, length]`. Built mutably by a loader, then shared read-only via
/// `Arc` across any number of controllers.
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    length: f32,
    tracks: Vec<BoneTrack>,
    variant_tracks: Vec<VariantTrack>,
}

impl Animation {
    #[must_use]
    pub fn new(name: &str, length: f32) -> Self {
        Self {
            name: name.to_string(),
            length,
            tracks: Vec::new(),
            variant_tracks: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total length in seconds. Authoritative for loop wrap-around,
    /// independent of where the keyframes end.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn set_length(&mut self, length: f32) {
        self.length = length;
    }

    pub fn add_track(&mut self, track: BoneTrack) {
        self.tracks.push(track);
    }

    /// Adds a variant track. The track must be committed.
    pub fn add_variant_track(&mut self, track: VariantTrack) -> Result<()> {
        if !track.is_committed() {
            return Err(AnimationError::UncommittedTrack(track.target().to_string()));
        }
        self.variant_tracks.push(track);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn tracks(&self) -> &[BoneTrack] {
        &self.tracks
    }

    #[inline]
    #[must_use]
    pub fn variant_tracks(&self) -> &[VariantTrack] {
        &self.variant_tracks
    }

    /// Latest keyframe time across all tracks. A convenience for loaders
    /// that derive the length from the data instead of setting it.
    #[must_use]
    pub fn infer_length(&self) -> f32 {
        let bone_max = self
            .tracks
            .iter()
            .map(BoneTrack::last_key_time)
            .fold(0.0_f32, f32::max);
        self.variant_tracks
            .iter()
            .map(VariantTrack::last_key_time)
            .fold(bone_max, f32::max)
    }
}

//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`AnimationError`] covers the failure modes of the
//! animation data model:
//! - Variant track commit validation (empty tracks, heterogeneous keyframes)
//! - Mutation of committed tracks
//! - Playback state restoration with unresolvable animation references
//!
//! Per-frame evaluation never fails: unknown bones or attribute paths make the
//! affected track inert, and out-of-range sample times clamp.
//!
//! # Usage
//!
//! Fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, AnimationError>`.

use thiserror::Error;

/// The main error type for the animation engine.
#[derive(Error, Debug)]
pub enum AnimationError {
    // ========================================================================
    // Variant Track Errors
    // ========================================================================
    /// A variant track was committed without any keyframes.
    #[error("Variant track '{0}' has no keyframes")]
    EmptyTrack(String),

    /// A committed variant track was mutated.
    #[error("Variant track '{0}' is committed and can no longer be modified")]
    TrackCommitted(String),

    /// A variant track mixes keyframe value types.
    #[error("Variant track '{track}' mixes value types: expected {expected}, got {actual}")]
    KeyframeTypeMismatch {
        /// The track's target path
        track: String,
        /// Type of the first keyframe
        expected: &'static str,
        /// The offending type
        actual: &'static str,
    },

    /// A variant track's base value does not match its keyframe type.
    #[error("Variant track '{track}' base value type {actual} does not match keyframes of type {expected}")]
    BaseValueTypeMismatch {
        /// The track's target path
        track: String,
        /// Type of the keyframes
        expected: &'static str,
        /// Type of the base value
        actual: &'static str,
    },

    /// An uncommitted variant track was added to an animation.
    #[error("Variant track '{0}' must be committed before it is added to an animation")]
    UncommittedTrack(String),

    // ========================================================================
    // Playback State Errors
    // ========================================================================
    /// A restored layer references an animation the host cannot resolve.
    #[error("Unknown animation: {0}")]
    UnknownAnimation(String),
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;

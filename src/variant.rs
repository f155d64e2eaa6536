//! Heterogeneous attribute values.
//!
//! [`Variant`] is the value model for animating arbitrary object attributes:
//! a closed tagged union over the types a variant track may carry. Numeric
//! variants support linear interpolation and weighted additive deltas;
//! discrete variants only support step/nearest selection.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A dynamically typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    Float(f32),
    Int(i32),
    Bool(bool),
    Str(String),
    Vector3(Vec3),
}

/// Type tag of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Float,
    Int,
    Bool,
    Str,
    Vector3,
}

impl VariantKind {
    /// Whether values of this kind can be linearly interpolated.
    #[must_use]
    pub fn is_interpolable(self) -> bool {
        matches!(self, Self::Float | Self::Int | Self::Vector3)
    }

    /// Human readable type name, used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Float => "Float",
            Self::Int => "Int",
            Self::Bool => "Bool",
            Self::Str => "Str",
            Self::Vector3 => "Vector3",
        }
    }
}

impl Variant {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Float(_) => VariantKind::Float,
            Self::Int(_) => VariantKind::Int,
            Self::Bool(_) => VariantKind::Bool,
            Self::Str(_) => VariantKind::Str,
            Self::Vector3(_) => VariantKind::Vector3,
        }
    }

    /// Whether this value supports linear interpolation.
    #[must_use]
    pub fn is_interpolable(&self) -> bool {
        self.kind().is_interpolable()
    }

    /// Interpolates between two values.
    ///
    /// Numeric values of matching kind interpolate linearly; integers
    /// interpolate in `f32` and truncate. Discrete values (and mismatched
    /// kinds) fall back to nearest selection: the earlier value below
    /// `t = 0.5`, the later value at or above it.
    #[must_use]
    pub fn lerp(&self, end: &Variant, t: f32) -> Variant {
        match (self, end) {
            (Self::Float(a), Self::Float(b)) => Self::Float(a + (b - a) * t),
            (Self::Int(a), Self::Int(b)) => {
                Self::Int((*a as f32 + (*b as f32 - *a as f32) * t) as i32)
            }
            (Self::Vector3(a), Self::Vector3(b)) => Self::Vector3(a.lerp(*b, t)),
            _ => {
                if t < 0.5 {
                    self.clone()
                } else {
                    end.clone()
                }
            }
        }
    }

    /// Applies a weighted delta on top of this value: `self + (value - base) * weight`.
    ///
    /// Defined for numeric values of matching kind; integers compute in `f32`
    /// and truncate. For discrete values the delta is undefined, so the
    /// sampled value is applied as-is, ignoring the weight.
    #[must_use]
    pub fn add_scaled_delta(&self, value: &Variant, base: &Variant, weight: f32) -> Variant {
        match (self, value, base) {
            (Self::Float(cur), Self::Float(v), Self::Float(b)) => {
                Self::Float(cur + (v - b) * weight)
            }
            (Self::Int(cur), Self::Int(v), Self::Int(b)) => {
                Self::Int((*cur as f32 + (*v as f32 - *b as f32) * weight) as i32)
            }
            (Self::Vector3(cur), Self::Vector3(v), Self::Vector3(b)) => {
                Self::Vector3(*cur + (*v - *b) * weight)
            }
            _ => value.clone(),
        }
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec3> for Variant {
    fn from(value: Vec3) -> Self {
        Self::Vector3(value)
    }
}

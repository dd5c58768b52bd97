//! Blend weights for up to [`MAX_TARGETS`] morph targets

use glam::Vec4;

use super::MAX_TARGETS;

/// Weights of the morph targets, one per target in target order.
///
/// Values are typically in `0..=1`, where 0 leaves the base untouched and 1
/// deforms fully to the target. Nothing clamps them; out-of-range weights
/// extrapolate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MorphWeights(Vec4);

impl MorphWeights {
    pub const ZERO: Self = Self(Vec4::ZERO);

    /// Build from a slice, padding missing targets with zero.
    ///
    /// Weights past [`MAX_TARGETS`] are dropped.
    pub fn new(weights: &[f32]) -> Self {
        if weights.len() > MAX_TARGETS {
            log::warn!(
                "{} morph weights given, only the first {} are used",
                weights.len(),
                MAX_TARGETS
            );
        }
        let mut values = [0.0; MAX_TARGETS];
        for (slot, weight) in values.iter_mut().zip(weights) {
            *slot = *weight;
        }
        Self(Vec4::from_array(values))
    }

    pub fn to_array(&self) -> [f32; MAX_TARGETS] {
        self.0.to_array()
    }

    /// Weight of `target`, zero when out of range
    pub fn get(&self, target: usize) -> f32 {
        self.to_array().get(target).copied().unwrap_or(0.0)
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    pub fn z(&self) -> f32 {
        self.0.z
    }

    pub fn w(&self) -> f32 {
        self.0.w
    }

    /// Component-wise interpolation, `t` is not clamped
    pub fn mix(&self, other: &Self, t: f32) -> Self {
        Self(self.0.lerp(other.0, t))
    }

    /// Largest absolute component difference
    pub fn max_abs_diff(&self, other: &Self) -> f32 {
        (self.0 - other.0).abs().max_element()
    }
}

impl<const N: usize> From<[f32; N]> for MorphWeights {
    fn from(weights: [f32; N]) -> Self {
        Self::new(&weights)
    }
}

impl From<&[f32]> for MorphWeights {
    fn from(weights: &[f32]) -> Self {
        Self::new(weights)
    }
}

impl From<Vec4> for MorphWeights {
    fn from(values: Vec4) -> Self {
        Self(values)
    }
}

impl std::ops::Index<usize> for MorphWeights {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

//! Weight animation
//!
//! [`MorphAnimator`] moves weights from an origin to a target over time.
//! Advancing is a pure transition: the animator is consumed and the next
//! animator is returned alongside the weights for this frame.

use super::keyframes::{Keyframe, KeyframeTimeline, DEFAULT_SPRING_EPSILON};
use super::MorphWeights;

/// Bounce used by [`MorphAnimation::spring`]
pub const DEFAULT_SPRING_BOUNCE: f32 = 0.2;

/// How a change in weights is animated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MorphAnimation {
    Linear { duration: f32 },
    Cubic { duration: f32 },
    /// `bounce` 0 is fully damped, towards 1 approaches an undamped
    /// oscillator. Higher bounce settles later than `duration`.
    Spring { duration: f32, bounce: f32 },
}

impl MorphAnimation {
    /// Apply the change on the next update
    pub const NONE: Self = Self::Linear { duration: 0.0 };

    pub fn linear(duration: f32) -> Self {
        Self::Linear { duration }
    }

    pub fn cubic(duration: f32) -> Self {
        Self::Cubic { duration }
    }

    pub fn spring(duration: f32) -> Self {
        Self::Spring {
            duration,
            bounce: DEFAULT_SPRING_BOUNCE,
        }
    }

    pub fn spring_with_bounce(duration: f32, bounce: f32) -> Self {
        Self::Spring { duration, bounce }
    }

    pub fn duration(&self) -> f32 {
        match self {
            Self::Linear { duration }
            | Self::Cubic { duration }
            | Self::Spring { duration, .. } => *duration,
        }
    }
}

impl Default for MorphAnimation {
    fn default() -> Self {
        Self::NONE
    }
}

/// Whether an animation still has frames left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    Running,
    Completed,
}

/// Result of advancing an animator by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphEvent {
    pub status: AnimationStatus,
    pub weights: MorphWeights,
}

#[derive(Debug, Clone, PartialEq)]
enum Curve {
    Linear { duration: f32 },
    Timeline(KeyframeTimeline),
}

/// An in-flight transition between two weight vectors
#[derive(Debug, Clone, PartialEq)]
pub struct MorphAnimator {
    origin: MorphWeights,
    target: MorphWeights,
    curve: Curve,
    elapsed: f32,
}

impl MorphAnimator {
    pub fn new(origin: MorphWeights, target: MorphWeights, animation: MorphAnimation) -> Self {
        Self::with_spring_epsilon(origin, target, animation, DEFAULT_SPRING_EPSILON)
    }

    pub fn with_spring_epsilon(
        origin: MorphWeights,
        target: MorphWeights,
        animation: MorphAnimation,
        spring_epsilon: f32,
    ) -> Self {
        let keyframe = match animation {
            MorphAnimation::Linear { duration } => {
                return Self {
                    origin,
                    target,
                    curve: Curve::Linear { duration },
                    elapsed: 0.0,
                };
            }
            MorphAnimation::Cubic { duration } => Keyframe::cubic(target, duration),
            MorphAnimation::Spring { duration, bounce } => {
                Keyframe::spring(target, duration, bounce)
            }
        };
        Self::from_timeline(KeyframeTimeline::with_spring_epsilon(
            origin,
            &[keyframe],
            spring_epsilon,
        ))
    }

    /// Animate through a custom timeline; the target is its final value
    pub fn from_timeline(timeline: KeyframeTimeline) -> Self {
        Self {
            origin: timeline.initial(),
            target: timeline.final_value(),
            curve: Curve::Timeline(timeline),
            elapsed: 0.0,
        }
    }

    pub fn origin(&self) -> MorphWeights {
        self.origin
    }

    pub fn target(&self) -> MorphWeights {
        self.target
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Time after which the animator reports completion
    pub fn duration(&self) -> f32 {
        match &self.curve {
            Curve::Linear { duration } => *duration,
            Curve::Timeline(timeline) => timeline.duration(),
        }
    }

    fn value_at(&self, time: f32) -> MorphWeights {
        match &self.curve {
            Curve::Linear { duration } => {
                let t = (time / duration).min(1.0);
                self.origin.mix(&self.target, t)
            }
            Curve::Timeline(timeline) => timeline.value(time.min(timeline.duration())),
        }
    }

    /// Advance by `delta_time` seconds.
    ///
    /// The frame that reaches the duration reports the exact target with
    /// [`AnimationStatus::Completed`]; callers drop the animator after that.
    pub fn advance(mut self, delta_time: f32) -> (Self, MorphEvent) {
        self.elapsed += delta_time;
        let event = if self.elapsed >= self.duration() {
            MorphEvent {
                status: AnimationStatus::Completed,
                weights: self.target,
            }
        } else {
            MorphEvent {
                status: AnimationStatus::Running,
                weights: self.value_at(self.elapsed),
            }
        };
        (self, event)
    }
}

/// Animation slot of a morph component
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MorphState {
    #[default]
    Idle,
    Running(MorphAnimator),
}

impl MorphState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn animator(&self) -> Option<&MorphAnimator> {
        match self {
            Self::Idle => None,
            Self::Running(animator) => Some(animator),
        }
    }
}

/// Advance the animation slot by one frame.
///
/// Returns the next state and, if an animation was active, the event for
/// this frame. A completed animation leaves the slot idle.
pub fn advance_state(state: MorphState, delta_time: f32) -> (MorphState, Option<MorphEvent>) {
    match state {
        MorphState::Idle => (MorphState::Idle, None),
        MorphState::Running(animator) => {
            let (animator, event) = animator.advance(delta_time);
            let next = match event.status {
                AnimationStatus::Running => MorphState::Running(animator),
                AnimationStatus::Completed => MorphState::Idle,
            };
            (next, Some(event))
        }
    }
}

//! Keyframe timelines for morph weights
//!
//! A timeline starts at an initial weight vector and moves through a list of
//! keyframes, each reaching its target weights over its own duration with
//! its own curve.

use std::f32::consts::TAU;

use super::MorphWeights;

/// Settling tolerance for springs, relative to the distance travelled
pub const DEFAULT_SPRING_EPSILON: f32 = 0.001;

/// Shape of the transition into a keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyframeCurve {
    Linear,
    /// Ease-in-out, zero velocity at both ends
    Cubic,
    /// Damped spring; `bounce` 0 is critically damped, 1 is undamped
    Spring { bounce: f32 },
}

/// A spring parameterised by perceptual duration and bounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub duration: f32,
    pub bounce: f32,
}

impl Spring {
    pub fn new(duration: f32, bounce: f32) -> Self {
        Self { duration, bounce }
    }

    fn angular_frequency(&self) -> f32 {
        TAU / self.duration
    }

    fn damping_ratio(&self) -> f32 {
        1.0 - self.bounce
    }

    /// Normalised step response: 0 at rest, tends to 1.
    ///
    /// A bounce above 1 would mean negative damping; it is evaluated as an
    /// undamped oscillation so the response stays bounded.
    pub fn value(&self, time: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let omega = self.angular_frequency();
        let zeta = self.damping_ratio().max(0.0);

        if (zeta - 1.0).abs() < 1e-4 {
            1.0 - (-omega * time).exp() * (1.0 + omega * time)
        } else if zeta < 1.0 {
            let damped = omega * (1.0 - zeta * zeta).sqrt();
            let decay = (-zeta * omega * time).exp();
            1.0 - decay
                * ((damped * time).cos() + zeta * omega / damped * (damped * time).sin())
        } else {
            // Two real poles, both negative, so each term only decays
            let spread = omega * (zeta * zeta - 1.0).sqrt();
            let slow = -zeta * omega + spread;
            let fast = -zeta * omega - spread;
            1.0 - (fast * (slow * time).exp() - slow * (fast * time).exp()) / (fast - slow)
        }
    }

    /// Time until the response stays within `epsilon` of its rest value.
    ///
    /// Infinite for springs with no damping; those never settle.
    pub fn settling_duration(&self, epsilon: f32) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        let omega = self.angular_frequency();
        let zeta = self.damping_ratio();
        let ln_eps = epsilon.ln();

        if zeta <= 0.0 {
            f32::INFINITY
        } else if (zeta - 1.0).abs() < 1e-4 {
            // Solve e^-u (1 + u) = epsilon for u = omega * t
            let mut u = 2.0 - ln_eps;
            for _ in 0..8 {
                let f = u - (1.0 + u).ln() + ln_eps;
                let df = u / (1.0 + u);
                u -= f / df;
            }
            u / omega
        } else if zeta < 1.0 {
            // Envelope e^(-zeta omega t) / sqrt(1 - zeta^2)
            let scale = (1.0 - zeta * zeta).sqrt();
            -(epsilon * scale).ln() / (zeta * omega)
        } else {
            // Slow pole dominates
            let slow = omega * (zeta - (zeta * zeta - 1.0).sqrt());
            -ln_eps / slow
        }
    }
}

impl KeyframeCurve {
    /// Map linear progress in `0..=1` through the curve.
    ///
    /// Springs are time based rather than progress based, so timelines
    /// evaluate them through [`Spring::value`] instead.
    fn ease(&self, progress: f32) -> f32 {
        match self {
            Self::Linear | Self::Spring { .. } => progress,
            Self::Cubic => progress * progress * (3.0 - 2.0 * progress),
        }
    }
}

/// One step of a timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub target: MorphWeights,
    pub duration: f32,
    pub curve: KeyframeCurve,
}

impl Keyframe {
    pub fn linear(target: impl Into<MorphWeights>, duration: f32) -> Self {
        Self {
            target: target.into(),
            duration,
            curve: KeyframeCurve::Linear,
        }
    }

    pub fn cubic(target: impl Into<MorphWeights>, duration: f32) -> Self {
        Self {
            target: target.into(),
            duration,
            curve: KeyframeCurve::Cubic,
        }
    }

    pub fn spring(target: impl Into<MorphWeights>, duration: f32, bounce: f32) -> Self {
        Self {
            target: target.into(),
            duration,
            curve: KeyframeCurve::Spring { bounce },
        }
    }

    fn spring_model(&self) -> Option<Spring> {
        match self.curve {
            KeyframeCurve::Spring { bounce } => Some(Spring::new(self.duration, bounce)),
            _ => None,
        }
    }
}

/// Resolved segment of a timeline
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    keyframe: Keyframe,
    spring: Option<Spring>,
    /// Time the segment takes on the timeline
    length: f32,
}

/// An initial value followed by keyframes
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTimeline {
    initial: MorphWeights,
    segments: Vec<Segment>,
    duration: f32,
}

impl KeyframeTimeline {
    pub fn new(initial: MorphWeights, keyframes: &[Keyframe]) -> Self {
        Self::with_spring_epsilon(initial, keyframes, DEFAULT_SPRING_EPSILON)
    }

    /// Build a timeline, settling springs to within `epsilon`
    pub fn with_spring_epsilon(
        initial: MorphWeights,
        keyframes: &[Keyframe],
        epsilon: f32,
    ) -> Self {
        let segments: Vec<Segment> = keyframes
            .iter()
            .map(|keyframe| {
                let spring = keyframe.spring_model();
                let length = match &spring {
                    Some(spring) => spring.settling_duration(epsilon),
                    None => keyframe.duration,
                };
                Segment {
                    keyframe: *keyframe,
                    spring,
                    length,
                }
            })
            .collect();
        let duration = segments.iter().map(|s| s.length.max(0.0)).sum();

        Self {
            initial,
            segments,
            duration,
        }
    }

    pub fn initial(&self) -> MorphWeights {
        self.initial
    }

    /// Total time to reach the last keyframe
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Weights once the timeline has finished
    pub fn final_value(&self) -> MorphWeights {
        self.segments
            .last()
            .map_or(self.initial, |s| s.keyframe.target)
    }

    /// Weights at `time` seconds, clamped to the timeline
    pub fn value(&self, time: f32) -> MorphWeights {
        let time = time.max(0.0);
        let mut from = self.initial;
        let mut start = 0.0;
        for segment in &self.segments {
            let length = segment.length.max(0.0);
            if time < start + length {
                let local = time - start;
                let eased = match &segment.spring {
                    Some(spring) => spring.value(local),
                    None => segment.keyframe.curve.ease(local / length),
                };
                return from.mix(&segment.keyframe.target, eased);
            }
            from = segment.keyframe.target;
            start += length;
        }
        self.final_value()
    }
}

//! Ambient conditions and the rule constants derived from them.
//!
//! Three scalars in `[0, 1]` (temperature, pressure, moisture) describe the
//! surroundings. Every tick they are folded into six [`RuleConstants`] via
//! clamped affine maps. New targets never apply instantly: an
//! [`EnvironmentState`] moves the scalars towards them over many ticks.

use serde::{Deserialize, Serialize};

use crate::{
    config::{Bounds, ParameterRanges},
    error::{Result, SimError},
};

/// One reading of the three ambient scalars.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ambient {
    pub temperature: f32,
    pub pressure: f32,
    pub moisture: f32,
}

impl Ambient {
    pub const fn new(temperature: f32, pressure: f32, moisture: f32) -> Self {
        Self {
            temperature,
            pressure,
            moisture,
        }
    }

    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Rejects non-finite values and values outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("temperature", self.temperature),
            ("pressure", self.pressure),
            ("moisture", self.moisture),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidAmbient { name, value });
            }
        }
        Ok(())
    }

    /// Componentwise sum, clamped back into `[0, 1]`.
    ///
    /// Non-finite deltas are treated as zero.
    pub fn nudged(&self, delta: Ambient) -> Self {
        let add = |v: f32, d: f32| {
            let d = if d.is_finite() { d } else { 0.0 };
            (v + d).clamp(0.0, 1.0)
        };
        Self::new(
            add(self.temperature, delta.temperature),
            add(self.pressure, delta.pressure),
            add(self.moisture, delta.moisture),
        )
    }

    pub fn lerp(&self, other: Ambient, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self::new(
            mix(self.temperature, other.temperature),
            mix(self.pressure, other.pressure),
            mix(self.moisture, other.moisture),
        )
    }
}

impl Default for Ambient {
    fn default() -> Self {
        Self::splat(0.5)
    }
}

/// Constants that drive the stimulation rules for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuleConstants {
    /// Ticks between stimulation-zone regenerations.
    pub rigidity: u32,
    /// Empty-neighbor count at which a walk counts as excluded.
    pub exclusion_threshold: f32,
    /// Selection budget per tick.
    pub speed: f32,
    /// Radius of the footprint scattered around each seed.
    pub stimulation_size: f32,
    /// Jitter applied to stimulation points and seed velocities.
    pub volatility: f32,
    /// Share of the budget spent on uniformly random origins.
    pub random_factor: f32,
}

impl RuleConstants {
    /// Folds an ambient reading into rule constants.
    pub fn derive(a: &Ambient, ranges: &ParameterRanges) -> Self {
        let (t, p, m) = (a.temperature, a.pressure, a.moisture);
        let rigidity = remap(2.0 * p - m, -1.0, 2.0, ranges.rigidity).floor();
        Self {
            rigidity: (rigidity as u32).max(1),
            exclusion_threshold: remap(4.0 * p - t, -1.0, 4.0, ranges.exclusion_threshold),
            speed: remap(2.0 * t + 2.0 * p - m, -1.0, 4.0, ranges.speed),
            stimulation_size: remap(3.0 * p + m, 0.0, 4.0, ranges.stimulation_size),
            volatility: remap(t - 2.0 * m, -2.0, 1.0, ranges.volatility),
            random_factor: remap(t + p, 0.0, 2.0, ranges.random_factor),
        }
    }

    /// Zone-biased and uniformly random selections for one tick.
    pub fn selection_budget(&self) -> (usize, usize) {
        let zone = (self.speed * (1.0 - self.random_factor)).max(0.0).ceil();
        let random = (self.speed * self.random_factor).max(0.0).ceil();
        (zone as usize, random as usize)
    }
}

/// Affine map from `[in_lo, in_hi]` onto `out`, clamped to `out`.
pub fn remap(value: f32, in_lo: f32, in_hi: f32, out: Bounds) -> f32 {
    let t = ((value - in_lo) / (in_hi - in_lo)).clamp(0.0, 1.0);
    out.min + (out.max - out.min) * t
}

/// Ambient scalars plus the transition currently moving them.
///
/// All three scalars share one `progress` value; a new target restarts it
/// from zero, with the current reading as the starting point.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentState {
    current: Ambient,
    previous: Ambient,
    target: Ambient,
    progress: f32,
    step: f32,
}

impl EnvironmentState {
    /// Settled environment at `initial`, advancing transitions by `step` per tick.
    pub fn new(initial: Ambient, step: f32) -> Self {
        Self {
            current: initial,
            previous: initial,
            target: initial,
            progress: 1.0,
            step,
        }
    }

    pub fn current(&self) -> Ambient {
        self.current
    }

    pub fn previous(&self) -> Ambient {
        self.previous
    }

    pub fn target(&self) -> Ambient {
        self.target
    }

    /// Fraction of the active transition already applied, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_settled(&self) -> bool {
        self.progress >= 1.0
    }

    /// Starts moving from the current reading towards `target`.
    pub fn begin_transition(&mut self, target: Ambient) -> Result<()> {
        target.validate()?;
        self.previous = self.current;
        self.target = target;
        self.progress = 0.0;
        Ok(())
    }

    /// Advances the active transition by one step.
    pub fn advance(&mut self) {
        if self.progress < 1.0 {
            self.progress = (self.progress + self.step).min(1.0);
            self.current = if self.progress >= 1.0 {
                self.target
            } else {
                self.previous.lerp(self.target, self.progress)
            };
        }
    }
}

//! Simulation configuration.
//!
//! Every field has a default, so a `membrane.toml` only needs the values it
//! wants to change:
//!
//! ```toml
//! size = 128
//! seed = 42
//! consume_stimulation_points = true
//!
//! [ranges.speed]
//! min = 4.0
//! max = 32.0
//!
//! [[generators]]
//! x = 0.5
//! y = 0.5
//! dx = 3.0
//! dy = -2.0
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    environment::Ambient,
    error::{Result, SimError},
};

/// Largest accepted grid side; keeps `size * size` comfortably in memory.
pub const MAX_SIZE: u32 = 8192;

/// Inclusive output range of one derived rule constant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Output ranges for the six constants produced by the environment mapper.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterRanges {
    pub rigidity: Bounds,
    pub exclusion_threshold: Bounds,
    pub speed: Bounds,
    pub stimulation_size: Bounds,
    pub volatility: Bounds,
    pub random_factor: Bounds,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            rigidity: Bounds::new(12.0, 48.0),
            exclusion_threshold: Bounds::new(1.9, 4.3),
            speed: Bounds::new(8.0, 64.0),
            stimulation_size: Bounds::new(4.0, 32.0),
            volatility: Bounds::new(4.0, 12.0),
            random_factor: Bounds::new(0.4, 1.0),
        }
    }
}

/// Starting state of one moving stimulation seed.
///
/// `x` and `y` are fractions of the grid side so the same file works for
/// any `size`; `dx` and `dy` are in cells per regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Side of the square grid.
    pub size: u32,
    /// Seed for the simulation's random source. `None` picks one at startup.
    pub seed: Option<u64>,
    /// A walk stops once its move counter exceeds this value.
    pub max_walk_moves: u32,
    /// Attempts a selection policy makes before giving up for this slot.
    pub max_selection_attempts: u32,
    /// Progress added to an ambient transition per tick.
    pub transition_step: f32,
    /// Regenerate stimulation points from the moving seeds.
    pub dynamic_zones: bool,
    /// Remove a stimulation point once a walk started there succeeds.
    pub consume_stimulation_points: bool,
    pub initial_ambient: Ambient,
    pub ranges: ParameterRanges,
    pub generators: Vec<GeneratorConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            size: 256,
            seed: None,
            max_walk_moves: 8192,
            max_selection_attempts: 8192,
            transition_step: 0.01,
            dynamic_zones: true,
            consume_stimulation_points: false,
            initial_ambient: Ambient::splat(0.5),
            ranges: ParameterRanges::default(),
            generators: vec![
                GeneratorConfig {
                    x: 0.25,
                    y: 0.5,
                    dx: 4.0,
                    dy: 1.0,
                },
                GeneratorConfig {
                    x: 0.25,
                    y: 0.25,
                    dx: 2.0,
                    dy: 8.0,
                },
                GeneratorConfig {
                    x: 0.5,
                    y: 0.5,
                    dx: 8.0,
                    dy: 4.0,
                },
            ],
        }
    }
}

impl SimConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    /// Checks the values that the engines rely on.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(SimError::invalid_config(format!(
                "size must be in 1..={MAX_SIZE}, got {}",
                self.size
            )));
        }
        if self.max_selection_attempts == 0 {
            return Err(SimError::invalid_config(
                "max_selection_attempts must be at least 1",
            ));
        }
        if !(self.transition_step > 0.0 && self.transition_step <= 1.0) {
            return Err(SimError::invalid_config(format!(
                "transition_step must be in (0, 1], got {}",
                self.transition_step
            )));
        }
        self.initial_ambient.validate()?;

        let ranges = [
            ("rigidity", self.ranges.rigidity),
            ("exclusion_threshold", self.ranges.exclusion_threshold),
            ("speed", self.ranges.speed),
            ("stimulation_size", self.ranges.stimulation_size),
            ("volatility", self.ranges.volatility),
            ("random_factor", self.ranges.random_factor),
        ];
        for (name, bounds) in ranges {
            if !bounds.is_valid() {
                return Err(SimError::invalid_config(format!(
                    "range {name} must be finite with min <= max, got {}..{}",
                    bounds.min, bounds.max
                )));
            }
        }
        if self.ranges.random_factor.min < 0.0 || self.ranges.random_factor.max > 1.0 {
            return Err(SimError::invalid_config(
                "random_factor range must lie inside [0, 1]",
            ));
        }
        if self.ranges.rigidity.max < 1.0 {
            return Err(SimError::invalid_config("rigidity range must reach 1"));
        }

        for (i, g) in self.generators.iter().enumerate() {
            let inside = (0.0..=1.0).contains(&g.x) && (0.0..=1.0).contains(&g.y);
            if !inside || !g.dx.is_finite() || !g.dy.is_finite() {
                return Err(SimError::invalid_config(format!(
                    "generator {i} must start inside the grid with a finite velocity"
                )));
            }
        }
        Ok(())
    }
}

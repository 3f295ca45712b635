//! Error types for membrane-core.
//!
//! Only caller mistakes are errors. A walk that finds nothing to do, or a
//! selection loop that runs out of attempts, reports `false` instead.

use thiserror::Error;

/// Main error type for simulation entry points.
#[derive(Error, Debug)]
pub enum SimError {
    /// Coordinate outside `[0, size)` on either axis.
    #[error("coordinate ({x}, {y}) is outside a {size}x{size} grid")]
    OutOfBounds { x: u32, y: u32, size: u32 },

    /// Ambient scalar that is not a finite value in `[0, 1]`.
    #[error("ambient {name} must be a finite value in [0, 1], got {value}")]
    InvalidAmbient { name: &'static str, value: f32 },

    /// Attempt to write the walk-only trail marker from outside a walk.
    #[error("bubble is a transient walk state and cannot be written directly")]
    TransientState,

    /// Configuration values that cannot produce a working simulation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// TOML parsing errors
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// File system errors
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for membrane-core operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates a new out-of-bounds error.
    #[must_use]
    pub fn out_of_bounds(x: u32, y: u32, size: u32) -> Self {
        Self::OutOfBounds { x, y, size }
    }

    /// Creates a new invalid-configuration error.
    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

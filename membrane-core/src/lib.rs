//! Core membrane-growth cellular automaton.
//!
//! Main components:
//! - [`grid`]: double-buffered cell grid and 4-neighborhood.
//! - [`phases`]: bubble walk and hardening rules.
//! - [`worklist`]: pending cells and the render-dirty log.
//! - [`stimulation`]: walk origin selection and moving seed generators.
//! - [`environment`]: ambient scalars, smoothed transitions, rule constants.
//! - [`simulation`]: the per-tick schedule tying it all together.
//! - [`config`]: TOML-loadable configuration.
//! - [`diamond`], [`feed`], [`error`], [`types`]: supporting pieces.

pub mod config;
pub mod diamond;
pub mod environment;
pub mod error;
pub mod feed;
pub mod grid;
pub mod phases;
pub mod simulation;
pub mod stimulation;
pub mod types;
pub mod worklist;

pub use config::SimConfig;
pub use environment::{Ambient, RuleConstants};
pub use error::{Result, SimError};
pub use simulation::{Simulation, TickReport};
pub use types::{Cell, Coord};

//! Core types and stepping logic for the cells artificial life simulation.
//!
//! Agents carry four packed genes. Every tick each gene reads one sensor,
//! scales the reading by its strength and drives one effector, all on a
//! toroidal grid of tiles that hold nothing, food, or a single agent.

pub mod cell;
pub mod config;
pub mod effect;
pub mod gene;
pub mod genetics;
pub mod grid;
pub mod rng;
pub mod sense;
pub mod stats;
pub mod world;

use thiserror::Error;

pub use cell::{Axis, Cell, Compass, DeadMatter, Oscillator, death_energy};
pub use config::WorldConfig;
pub use effect::{Effect, act};
pub use gene::{DecodedGene, Effector, Gene, Sensor, decode_strength};
pub use genetics::{GENES_PER_CELL, Genome, inherit, random_genome};
pub use grid::{Coord, Grid, Tile, TileKind};
pub use rng::{CellRng, EntropyError, RandomSource, ScriptedSource};
pub use sense::{scale_signal, sense};
pub use stats::{DeathCause, RunSummary, Statistics};
pub use world::{Tick, World, create_world};

/// Errors that can occur when constructing world state.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// The randomness source could not be created or reseeded.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
}

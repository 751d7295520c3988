//! Agents, dead matter and the salvage rule linking them.

use serde::{Deserialize, Serialize};

use crate::genetics::{Genome, random_genome};
use crate::rng::RandomSource;

/// Period assigned to fresh oscillators; a set-oscillator signal of 1.0
/// yields the same value.
pub const DEFAULT_OSCILLATOR_PERIOD: u32 = 100;

/// Grid axis used by movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Offset of one step of `sign` (±1) along this axis.
    #[must_use]
    pub const fn delta(self, sign: i64) -> (i64, i64) {
        match self {
            Self::X => (sign, 0),
            Self::Y => (0, sign),
        }
    }
}

/// Facing of an agent. North is +y, East is +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Compass {
    #[default]
    North,
    East,
    South,
    West,
}

impl Compass {
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Uniform random facing.
    pub fn random(rng: &mut dyn RandomSource) -> Self {
        Self::ALL[usize::from(rng.next_u8()) % Self::ALL.len()]
    }

    /// Axis and sign (±1) of one step forward.
    #[must_use]
    pub const fn axis(self) -> (Axis, i64) {
        match self {
            Self::North => (Axis::Y, 1),
            Self::South => (Axis::Y, -1),
            Self::East => (Axis::X, 1),
            Self::West => (Axis::X, -1),
        }
    }

    /// Facing produced by moving one step along `axis` with the sign of `sign`.
    #[must_use]
    pub const fn from_step(axis: Axis, sign: i64) -> Self {
        match (axis, sign >= 0) {
            (Axis::X, true) => Self::East,
            (Axis::X, false) => Self::West,
            (Axis::Y, true) => Self::North,
            (Axis::Y, false) => Self::South,
        }
    }

    /// Grid offset of the tile ahead.
    #[must_use]
    pub const fn forward(self) -> (i64, i64) {
        let (axis, sign) = self.axis();
        axis.delta(sign)
    }

    /// Grid offset of the tile behind.
    #[must_use]
    pub const fn backward(self) -> (i64, i64) {
        let (axis, sign) = self.axis();
        axis.delta(-sign)
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    /// Quarter turn clockwise.
    #[must_use]
    pub const fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Quarter turn counter-clockwise.
    #[must_use]
    pub const fn left(self) -> Self {
        self.right().opposite()
    }
}

/// Learned internal clock. `period` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oscillator {
    phase: u32,
    period: u32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            phase: 0,
            period: DEFAULT_OSCILLATOR_PERIOD,
        }
    }
}

impl Oscillator {
    /// Build an oscillator; a zero period is bumped to one.
    #[must_use]
    pub fn new(phase: u32, period: u32) -> Self {
        Self {
            phase,
            period: period.max(1),
        }
    }

    #[must_use]
    pub const fn phase(&self) -> u32 {
        self.phase
    }

    #[must_use]
    pub const fn period(&self) -> u32 {
        self.period
    }

    /// Whether the phase currently sits in an even half-cycle.
    #[must_use]
    pub const fn is_even(&self) -> bool {
        (self.phase / self.period) % 2 == 0
    }

    /// Advance one tick.
    pub fn advance(&mut self) {
        self.phase = self.phase.wrapping_add(1);
    }

    /// Retune from a gene signal.
    ///
    /// The magnitude is `|signal * 100|` truncated. Magnitudes below 10 are
    /// ignored unless exactly 1. In an even half-cycle a negative signal sets
    /// the phase to the magnitude and a positive one resets it to 1; odd
    /// half-cycles swap those roles. The magnitude always becomes the period.
    pub fn retune(&mut self, signal: f32) -> bool {
        let magnitude = (signal * 100.0).abs() as u32;
        if magnitude < 10 && magnitude != 1 {
            return false;
        }
        let negative = signal < 0.0;
        self.phase = if self.is_even() == negative { magnitude } else { 1 };
        self.period = magnitude;
        true
    }
}

/// Food left on a tile, either seeded or salvaged from a dead agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadMatter {
    pub id: u64,
    pub energy: u32,
}

impl DeadMatter {
    #[must_use]
    pub const fn new(id: u64, energy: u32) -> Self {
        Self { id, energy }
    }
}

/// A living agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    id: u64,
    pub energy: u32,
    pub age: u32,
    pub facing: Compass,
    pub oscillator: Oscillator,
    pub genome: Genome,
    #[serde(skip)]
    updated: bool,
}

impl Cell {
    #[must_use]
    pub fn new(id: u64, energy: u32, facing: Compass, genome: Genome) -> Self {
        Self {
            id,
            energy,
            age: 0,
            facing,
            oscillator: Oscillator::default(),
            genome,
            updated: false,
        }
    }

    /// Fresh agent with random id, facing and genome.
    pub fn random(rng: &mut dyn RandomSource, energy: u32) -> Self {
        let facing = Compass::random(rng);
        let id = rng.next_u64();
        let genome = random_genome(rng);
        Self::new(id, energy, facing, genome)
    }

    /// Identifier assigned at creation.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Whether the agent already acted this tick.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn mark_updated(&mut self) {
        self.updated = true;
    }

    pub(crate) fn clear_updated(&mut self) {
        self.updated = false;
    }

    /// Salvage value left behind if this agent died now.
    #[must_use]
    pub const fn death_energy(&self) -> u32 {
        death_energy(self.energy)
    }

    /// Convert into the food it leaves behind.
    #[must_use]
    pub fn into_remains(self) -> DeadMatter {
        DeadMatter::new(self.id, self.death_energy())
    }
}

/// Food value left by an agent dying with `energy`.
///
/// Below 4 the floor of 2 applies, below 32 half is kept, above that a
/// quarter.
#[must_use]
pub const fn death_energy(energy: u32) -> u32 {
    if energy < 4 {
        2
    } else if energy < 32 {
        energy / 2
    } else {
        energy / 4
    }
}

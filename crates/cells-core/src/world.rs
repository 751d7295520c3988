//! World ownership and the per-tick state machine.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::WorldError;
use crate::cell::{Cell, Compass, DeadMatter};
use crate::config::WorldConfig;
use crate::effect::{Effect, act};
use crate::genetics::inherit;
use crate::grid::{Coord, Grid, Tile};
use crate::rng::RandomSource;
use crate::sense::{scale_signal, sense};
use crate::stats::{DeathCause, Statistics};

/// Simulation clock (ticks applied since creation).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// A toroidal grid of agents and food advanced one tick at a time.
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    grid: Grid,
    tick: Tick,
}

impl World {
    /// Create a world seeded with `initial_population` random agents and
    /// the initial food, each on a distinct tile.
    pub fn new(config: WorldConfig, rng: &mut dyn RandomSource) -> Result<Self, WorldError> {
        config.validate()?;
        let mut world = Self::empty(config)?;

        let population = u64::from(world.config.initial_population);
        for _ in 0..population {
            let at = world.random_vacancy(rng);
            let cell = Cell::random(rng, world.config.initial_energy);
            world.grid.replace(at, Tile::Agent(cell));
        }
        let food = world.scatter_food(world.config.initial_food(), rng);

        debug!(
            width = world.config.width,
            height = world.config.height,
            agents = population,
            food,
            "created world"
        );
        Ok(world)
    }

    /// Create a world with no agents and no food.
    pub fn empty(config: WorldConfig) -> Result<Self, WorldError> {
        config.validate_layout()?;
        let grid = Grid::new(config.width, config.height)?;
        Ok(Self {
            config,
            grid,
            tick: Tick::zero(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access for scenario setup between ticks.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Put `cell` at `at`, returning whatever was there.
    pub fn place(&mut self, at: Coord, cell: Cell) -> Tile {
        self.grid.replace(at, Tile::Agent(cell))
    }

    /// True iff any tile holds an agent.
    #[must_use]
    pub fn has_life(&self) -> bool {
        self.grid.has_agents()
    }

    /// Advance one tick: food generation, then every agent in row-major
    /// order, then the clock.
    pub fn step(&mut self, rng: &mut dyn RandomSource) -> Statistics {
        let mut stats = Statistics::default();
        self.grid.clear_updated_flags();

        if self.tick.0.is_multiple_of(u64::from(self.config.food_interval)) {
            stats.food_placed = self.scatter_food(self.config.food_per_pass(), rng);
        }

        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                self.update_agent(Coord::new(x, y), rng, &mut stats);
            }
        }

        stats.population = self.grid.population() as u64;
        debug!(
            tick = self.tick.0,
            population = stats.population,
            deaths = stats.deaths(),
            births = stats.births,
            food = stats.food_placed,
            "tick complete"
        );
        self.tick = self.tick.next();
        stats
    }

    /// Uniformly chosen empty tile. Callers guarantee one exists.
    fn random_vacancy(&self, rng: &mut dyn RandomSource) -> Coord {
        loop {
            let at = Coord::new(
                rng.random_range(0..self.grid.width()),
                rng.random_range(0..self.grid.height()),
            );
            if self.grid.tile(at).is_empty() {
                return at;
            }
        }
    }

    /// Drop up to `quantity` food tiles onto empty tiles; returns how many landed.
    fn scatter_food(&mut self, quantity: u64, rng: &mut dyn RandomSource) -> u64 {
        let quantity = quantity.min(self.grid.vacancies() as u64);
        for _ in 0..quantity {
            let at = self.random_vacancy(rng);
            let energy = rng.next_u32().isqrt();
            let id = rng.next_u64();
            self.grid.replace(at, Tile::Food(DeadMatter::new(id, energy)));
        }
        quantity
    }

    fn bury(&mut self, at: Coord, cause: DeathCause, stats: &mut Statistics) {
        if let Some(remains) = self.grid.kill(at) {
            stats.record_death(cause);
            trace!(id = remains.id, ?cause, x = at.x, y = at.y, "agent died");
        }
    }

    /// Run one agent's genes and housekeeping. Tiles without an agent that
    /// has yet to act are skipped.
    fn update_agent(&mut self, start: Coord, rng: &mut dyn RandomSource, stats: &mut Statistics) {
        let Some(cell) = self.grid.cell(start) else {
            return;
        };
        if cell.is_updated() {
            return;
        }
        if let Some(max_age) = self.config.max_age
            && cell.age >= max_age
        {
            self.bury(start, DeathCause::OldAge, stats);
            return;
        }
        if cell.energy == 0 {
            self.bury(start, DeathCause::Starvation, stats);
            return;
        }

        let genome = cell.genome;
        let mut at = start;
        for (slot, gene) in genome.into_iter().enumerate() {
            let gene = gene.sanitize();
            let Some(cell) = self.grid.cell_mut(at) else {
                return;
            };
            cell.genome[slot] = gene;

            let reading = match self.grid.cell(at) {
                Some(cell) => sense(cell, &self.grid, at, gene.input_selector()),
                None => return,
            };
            let signal = scale_signal(reading, gene.strength_bits());
            match act(&mut self.grid, at, gene.output_selector(), signal) {
                Effect::Continue => {}
                Effect::Relocate(to) => {
                    self.grid.relocate(at, to);
                    at = to;
                }
                Effect::Killed => stats.record_death(DeathCause::Combat),
                Effect::Died(cause) => {
                    self.bury(at, cause, stats);
                    return;
                }
            }
        }

        let Some(cell) = self.grid.cell_mut(at) else {
            return;
        };
        cell.energy = cell.energy.saturating_sub(self.config.metabolism_cost);
        cell.age = cell.age.saturating_add(1);
        cell.oscillator.advance();
        cell.mark_updated();
        self.reproduce(at, rng, stats);
    }

    /// Spawn a child into the first empty tile behind, right, left or ahead
    /// of the parent once it holds enough energy.
    fn reproduce(&mut self, at: Coord, rng: &mut dyn RandomSource, stats: &mut Statistics) {
        let Some(threshold) = self.config.reproduction_threshold else {
            return;
        };
        let Some(parent) = self.grid.cell(at) else {
            return;
        };
        if parent.energy < threshold {
            return;
        }
        let facing = parent.facing;
        let nursery = [facing.opposite(), facing.right(), facing.left(), facing]
            .into_iter()
            .map(|direction| {
                let (dx, dy) = direction.forward();
                self.grid.neighbor(at, dx, dy)
            })
            .find(|spot| self.grid.tile(*spot).is_empty());
        let Some(spot) = nursery else {
            return;
        };

        let Some(parent) = self.grid.cell_mut(at) else {
            return;
        };
        let endowment = parent.energy / 2;
        parent.energy -= endowment;
        let genome = inherit(&mut parent.genome, rng);
        let parent_id = parent.id();

        let facing = Compass::random(rng);
        let id = rng.next_u64();
        let mut child = Cell::new(id, endowment, facing, genome);
        child.mark_updated();
        self.grid.replace(spot, Tile::Agent(child));
        stats.births += 1;
        trace!(parent = parent_id, child = id, x = spot.x, y = spot.y, "agent born");
    }
}

/// Seed a world from the four lifecycle parameters, everything else default.
pub fn create_world(
    width: u32,
    height: u32,
    food_interval: u32,
    initial_population: u32,
    rng: &mut dyn RandomSource,
) -> Result<World, WorldError> {
    World::new(
        WorldConfig::new(width, height, food_interval, initial_population),
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{Effector, Gene, Sensor};
    use crate::genetics::Genome;
    use crate::rng::CellRng;

    /// Strength bits decoding to 4.0; with a reading of 1 the signal is 4 * sin(1).
    const STRONG: u16 = 0x4400;

    fn inert() -> Genome {
        [Gene::new(Sensor::Age, 0, Effector::SetOscillator); 4]
    }

    fn quiet_config() -> WorldConfig {
        WorldConfig {
            reproduction_threshold: None,
            ..WorldConfig::new(6, 4, 1_000, 1)
        }
    }

    #[test]
    fn new_world_seeds_population_and_food() {
        let mut rng = CellRng::seeded(3);
        let world = World::new(WorldConfig::new(20, 10, 4, 12), &mut rng).expect("world");
        assert_eq!(world.grid().population(), 12);
        let food = world.grid().tiles().iter().filter(|t| t.is_food()).count();
        assert_eq!(food, 12);
        assert!(world.has_life());
        assert_eq!(world.tick(), Tick::zero());
    }

    #[test]
    fn seeding_caps_food_at_free_tiles() {
        let mut rng = CellRng::seeded(4);
        let world = World::new(WorldConfig::new(3, 3, 40, 5), &mut rng).expect("world");
        assert_eq!(world.grid().population(), 5);
        assert_eq!(world.grid().vacancies(), 0);
    }

    #[test]
    fn invalid_configs_fail_before_stepping() {
        let mut rng = CellRng::seeded(1);
        assert!(create_world(0, 5, 4, 1, &mut rng).is_err());
        assert!(create_world(5, 5, 4, 0, &mut rng).is_err());
        assert!(create_world(5, 5, 0, 1, &mut rng).is_err());
        assert!(World::empty(WorldConfig::new(5, 5, 4, 0)).is_ok());
    }

    #[test]
    fn old_agents_die_before_acting() {
        let mut world = World::empty(quiet_config()).expect("world");
        let at = Coord::new(1, 1);
        let mut elder = Cell::new(8, 30, Compass::North, inert());
        // energy 30 salvages half
        elder.age = 2_048;
        world.place(at, elder);

        let mut stats = Statistics::default();
        world.update_agent(at, &mut CellRng::seeded(0), &mut stats);
        assert_eq!(stats.deaths_old_age, 1);
        assert_eq!(world.grid().tile(at), &Tile::Food(DeadMatter::new(8, 15)));
    }

    #[test]
    fn survivors_pay_metabolism_and_age() {
        let mut world = World::empty(quiet_config()).expect("world");
        let at = Coord::new(2, 2);
        world.place(at, Cell::new(1, 5, Compass::North, inert()));

        let mut stats = Statistics::default();
        world.update_agent(at, &mut CellRng::seeded(0), &mut stats);
        let cell = world.grid().cell(at).expect("alive");
        assert_eq!(cell.energy, 4);
        assert_eq!(cell.age, 1);
        assert_eq!(cell.oscillator.phase(), 1);
        assert!(cell.is_updated());
        assert_eq!(stats.deaths(), 0);

        // an updated agent is skipped
        world.update_agent(at, &mut CellRng::seeded(0), &mut stats);
        assert_eq!(world.grid().cell(at).map(|c| c.age), Some(1));
    }

    #[test]
    fn genes_are_sanitized_in_place() {
        let mut world = World::empty(quiet_config()).expect("world");
        let at = Coord::new(0, 0);
        let raw = Gene::pack(Sensor::COUNT + 1, 0, Effector::COUNT * 3 + 4);
        let mut genome = inert();
        genome[2] = raw;
        world.place(at, Cell::new(1, 9, Compass::North, genome));

        world.update_agent(at, &mut CellRng::seeded(0), &mut Statistics::default());
        assert_eq!(world.grid().cell(at).expect("alive").genome[2], raw.sanitize());
    }

    #[test]
    fn relocated_agent_acts_once_per_tick() {
        let mut world = World::empty(quiet_config()).expect("world");
        let genome = [Gene::new(Sensor::Oscillator, STRONG, Effector::MoveX); 4];
        world.place(Coord::new(0, 0), Cell::new(1, 10, Compass::North, genome));

        let mut stats = Statistics::default();
        world.update_agent(Coord::new(0, 0), &mut CellRng::seeded(0), &mut stats);
        // four moves east, then the traversal reaches it again and skips it
        let at = Coord::new(4, 0);
        assert!(world.grid().cell(at).is_some_and(Cell::is_updated));
        world.update_agent(at, &mut CellRng::seeded(0), &mut stats);
        assert_eq!(world.grid().population(), 1);
        assert!(world.grid().cell(at).is_some());
        assert_eq!(world.grid().cell(at).map(|c| c.facing), Some(Compass::East));
    }

    #[test]
    fn self_termination_leaves_salvage() {
        let mut world = World::empty(quiet_config()).expect("world");
        let at = Coord::new(3, 1);
        // energy 200 reads 1.0; strength 8.0 scales it to 4 * sin(2)
        let mut genome = inert();
        genome[1] = Gene::new(Sensor::Energy, 0x4800, Effector::SelfTerminate);
        world.place(at, Cell::new(4, 200, Compass::North, genome));

        let mut stats = Statistics::default();
        world.update_agent(at, &mut CellRng::seeded(0), &mut stats);
        assert_eq!(stats.deaths_self_terminated, 1);
        assert_eq!(world.grid().tile(at), &Tile::Food(DeadMatter::new(4, 50)));
    }

    #[test]
    fn reproduction_fills_the_tile_behind_first() {
        let config = WorldConfig::new(5, 5, 1_000, 1);
        let mut world = World::empty(config).expect("world");
        let at = Coord::new(2, 2);
        world.place(at, Cell::new(1, 50, Compass::North, inert()));

        let mut stats = Statistics::default();
        world.reproduce(at, &mut CellRng::seeded(9), &mut stats);
        assert_eq!(stats.births, 1);
        assert_eq!(world.grid().cell(at).map(|c| c.energy), Some(25));
        let child = world.grid().cell(Coord::new(2, 1)).expect("child behind");
        assert_eq!(child.energy, 25);
        assert_eq!(child.age, 0);
        assert!(child.is_updated());

        // behind is taken now, so the next child goes to the right
        world.grid_mut().cell_mut(at).expect("parent").energy = 40;
        world.reproduce(at, &mut CellRng::seeded(10), &mut stats);
        assert_eq!(stats.births, 2);
        assert!(world.grid().cell(Coord::new(3, 2)).is_some());
    }

    #[test]
    fn reproduction_needs_room_and_energy() {
        let mut world = World::empty(WorldConfig::new(1, 1, 1_000, 1)).expect("world");
        let at = Coord::new(0, 0);
        world.place(at, Cell::new(1, 500, Compass::East, inert()));
        let mut stats = Statistics::default();
        world.reproduce(at, &mut CellRng::seeded(1), &mut stats);
        assert_eq!(stats.births, 0);
        assert_eq!(world.grid().cell(at).map(|c| c.energy), Some(500));

        let mut world = World::empty(WorldConfig::new(5, 5, 1_000, 1)).expect("world");
        world.place(at, Cell::new(1, 39, Compass::East, inert()));
        world.reproduce(at, &mut CellRng::seeded(1), &mut stats);
        assert_eq!(stats.births, 0);
    }

    #[test]
    fn food_generation_follows_the_interval() {
        let mut world = World::empty(WorldConfig::new(8, 8, 3, 1)).expect("world");
        let mut rng = CellRng::seeded(12);
        let placed: Vec<u64> = (0..7).map(|_| world.step(&mut rng).food_placed).collect();
        // sqrt(64) * 3 / 32 rounds to zero, so one tile per pass
        assert_eq!(placed, [1, 0, 0, 1, 0, 0, 1]);
        assert_eq!(world.tick(), Tick(7));
    }
}

use serde::{Deserialize, Serialize};

use crate::WorldError;
use crate::rng::CellRng;

/// Static configuration for a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
    /// Ticks between food generation passes.
    pub food_interval: u32,
    /// Agents seeded by [`World::new`](crate::World::new).
    pub initial_population: u32,
    /// Energy each seeded agent starts with.
    pub initial_energy: u32,
    /// Energy a surviving agent pays at the end of each tick.
    pub metabolism_cost: u32,
    /// Age at which agents die; `None` disables old age.
    pub max_age: Option<u32>,
    /// Energy at which an agent spawns a child; `None` disables births.
    pub reproduction_threshold: Option<u32>,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 225,
            food_interval: 10,
            initial_population: 2_000,
            initial_energy: 20,
            metabolism_cost: 1,
            max_age: Some(2_048),
            reproduction_threshold: Some(40),
            rng_seed: None,
        }
    }
}

/// Divisor applied to `sqrt(area) * interval` when sizing a food pass.
const FOOD_SCALE: u64 = 32;

impl WorldConfig {
    /// Shorthand for the four lifecycle parameters, everything else default.
    #[must_use]
    pub fn new(width: u32, height: u32, food_interval: u32, initial_population: u32) -> Self {
        Self {
            width,
            height,
            food_interval,
            initial_population,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Number of tiles the grid will hold.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Checks everything an unpopulated world needs.
    pub(crate) fn validate_layout(&self) -> Result<(), WorldError> {
        if self.width == 0 || self.height == 0 {
            return Err(WorldError::InvalidConfig(
                "world dimensions must be non-zero",
            ));
        }
        if self.food_interval == 0 {
            return Err(WorldError::InvalidConfig("food_interval must be non-zero"));
        }
        if self.max_age == Some(0) {
            return Err(WorldError::InvalidConfig("max_age must be positive"));
        }
        if let Some(threshold) = self.reproduction_threshold
            && threshold < 2
        {
            return Err(WorldError::InvalidConfig(
                "reproduction_threshold must be at least 2",
            ));
        }
        Ok(())
    }

    /// Validates the configuration before any tick executes.
    pub fn validate(&self) -> Result<(), WorldError> {
        self.validate_layout()?;
        if self.initial_population == 0 {
            return Err(WorldError::InvalidConfig(
                "initial_population must be non-zero",
            ));
        }
        if u64::from(self.initial_population) > self.area() {
            return Err(WorldError::InvalidConfig(
                "initial_population exceeds the number of tiles",
            ));
        }
        Ok(())
    }

    /// Builds the randomness source, from `rng_seed` when set.
    pub fn seeded_rng(&self) -> Result<CellRng, WorldError> {
        Ok(CellRng::new(self.rng_seed)?)
    }

    /// Food tiles placed by one generation pass, before capping at vacancies.
    #[must_use]
    pub fn food_per_pass(&self) -> u64 {
        (self.area().isqrt() * u64::from(self.food_interval) / FOOD_SCALE).max(1)
    }

    /// Food tiles placed when the world is created, before capping at vacancies.
    #[must_use]
    pub fn initial_food(&self) -> u64 {
        u64::from(self.initial_population) * u64::from(self.food_interval) / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        WorldConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn rejects_degenerate_values() {
        let cases = [
            WorldConfig::new(0, 10, 4, 1),
            WorldConfig::new(10, 0, 4, 1),
            WorldConfig::new(10, 10, 0, 1),
            WorldConfig::new(10, 10, 4, 0),
            WorldConfig::new(3, 3, 4, 10),
            WorldConfig {
                max_age: Some(0),
                ..WorldConfig::new(10, 10, 4, 1)
            },
            WorldConfig {
                reproduction_threshold: Some(1),
                ..WorldConfig::new(10, 10, 4, 1)
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(WorldError::InvalidConfig(_))),
                "{config:?}"
            );
        }
        WorldConfig::new(3, 3, 4, 9).validate().expect("full grid");
        WorldConfig::new(10, 10, 4, 0)
            .validate_layout()
            .expect("empty worlds only need a layout");
    }

    #[test]
    fn food_quantities_scale_with_area_and_interval() {
        // sqrt(400 * 225) = 300
        let config = WorldConfig::default();
        assert_eq!(config.food_per_pass(), 300 * 10 / 32);
        assert_eq!(config.initial_food(), 2_000 * 10 / 4);
        assert_eq!(WorldConfig::new(2, 2, 1, 1).food_per_pass(), 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: WorldConfig =
            serde_json::from_str(r#"{"width": 64, "rng_seed": 7}"#).expect("parse");
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 225);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.max_age, Some(2_048));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::RngCore;
        let config = WorldConfig::default().with_seed(5);
        let mut a = config.seeded_rng().expect("rng");
        let mut b = config.seeded_rng().expect("rng");
        assert_eq!(a.next_u64(), b.next_u64());
        assert_eq!(a.seed(), Some(5));
    }
}

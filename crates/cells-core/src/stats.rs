//! Per-tick counters and whole-run aggregates.

use serde::{Deserialize, Serialize};

/// Why an agent stopped living.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    OldAge,
    Starvation,
    Combat,
    SelfTerminated,
}

/// Counters accumulated over one tick. Zeroed at the start of every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Agents alive once the tick completed.
    pub population: u64,
    pub deaths_old_age: u64,
    pub deaths_starvation: u64,
    pub deaths_combat: u64,
    pub deaths_self_terminated: u64,
    pub food_placed: u64,
    pub births: u64,
}

impl Statistics {
    /// Deaths of every cause.
    #[must_use]
    pub const fn deaths(&self) -> u64 {
        self.deaths_old_age
            + self.deaths_starvation
            + self.deaths_combat
            + self.deaths_self_terminated
    }

    pub fn record_death(&mut self, cause: DeathCause) {
        let counter = match cause {
            DeathCause::OldAge => &mut self.deaths_old_age,
            DeathCause::Starvation => &mut self.deaths_starvation,
            DeathCause::Combat => &mut self.deaths_combat,
            DeathCause::SelfTerminated => &mut self.deaths_self_terminated,
        };
        *counter += 1;
    }

    fn fields(&self) -> [u64; 7] {
        [
            self.population,
            self.deaths_old_age,
            self.deaths_starvation,
            self.deaths_combat,
            self.deaths_self_terminated,
            self.food_placed,
            self.births,
        ]
    }

    fn from_fields(fields: [u64; 7]) -> Self {
        let [
            population,
            deaths_old_age,
            deaths_starvation,
            deaths_combat,
            deaths_self_terminated,
            food_placed,
            births,
        ] = fields;
        Self {
            population,
            deaths_old_age,
            deaths_starvation,
            deaths_combat,
            deaths_self_terminated,
            food_placed,
            births,
        }
    }

    fn combine(&self, other: &Self, op: impl Fn(u64, u64) -> u64) -> Self {
        let lhs = self.fields();
        let rhs = other.fields();
        Self::from_fields(std::array::from_fn(|idx| op(lhs[idx], rhs[idx])))
    }
}

/// Field-wise extremes and totals over every tick of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub highest: Statistics,
    pub lowest: Statistics,
    pub totals: Statistics,
}

impl RunSummary {
    /// Fold one tick's counters into the summary.
    pub fn record(&mut self, stats: &Statistics) {
        if self.ticks == 0 {
            self.highest = *stats;
            self.lowest = *stats;
        } else {
            self.highest = self.highest.combine(stats, u64::max);
            self.lowest = self.lowest.combine(stats, u64::min);
        }
        self.totals = self.totals.combine(stats, u64::saturating_add);
        self.ticks += 1;
    }

    /// Mean population over the recorded ticks.
    #[must_use]
    pub fn mean_population(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.totals.population as f64 / self.ticks as f64
        }
    }
}

//! Effector evaluation.
//!
//! Effectors never relocate an agent themselves. Movement reports the
//! destination through [`Effect::Relocate`] and death through
//! [`Effect::Died`]; the world stepper performs the single owning move or
//! conversion to food.

use crate::cell::{Axis, Compass, death_energy};
use crate::gene::Effector;
use crate::grid::{Coord, Grid, Tile};
use crate::stats::DeathCause;

/// Signal magnitude a move must exceed.
pub const MOVE_THRESHOLD: f32 = 1.0;
/// Signal magnitude self-termination must exceed.
pub const SELF_TERMINATE_THRESHOLD: f32 = 3.5;
/// Signal magnitude an attack must exceed; the sign picks ahead or behind.
pub const KILL_THRESHOLD: f32 = 2.0;
/// Flat energy price of starting a fight.
pub const COMBAT_BASE_COST: u32 = 2;

/// What the stepper must do after an effector ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing further; evaluate the next gene.
    Continue,
    /// Move the agent onto `Coord`. Any food there was already absorbed.
    Relocate(Coord),
    /// The agent killed a neighbour, whose tile is already cleared.
    Killed,
    /// The agent dies; remaining genes are skipped.
    Died(DeathCause),
}

/// Energy an attacker pays to fight a defender holding `defender_energy`.
#[must_use]
pub const fn combat_cost(defender_energy: u32) -> u32 {
    if defender_energy <= 2 {
        0
    } else {
        (defender_energy - death_energy(defender_energy)).saturating_add(COMBAT_BASE_COST)
    }
}

/// Energy a winning defender loses to an attacker that held `attacker_energy`.
#[must_use]
pub const fn defence_cost(attacker_energy: u32) -> u32 {
    COMBAT_BASE_COST
        .saturating_add(attacker_energy)
        .saturating_sub(death_energy(attacker_energy))
}

/// Apply the effector selected by `selector` to the agent at `at`.
///
/// Unknown selectors and positions without an agent are no-ops.
pub fn act(grid: &mut Grid, at: Coord, selector: u8, signal: f32) -> Effect {
    let Some(effector) = Effector::from_selector(selector) else {
        return Effect::Continue;
    };
    let Some(facing) = grid.cell(at).map(|cell| cell.facing) else {
        return Effect::Continue;
    };

    match effector {
        Effector::MoveX => step_along(grid, at, Axis::X, signal),
        Effector::MoveY => step_along(grid, at, Axis::Y, signal),
        Effector::MoveForward => {
            let (axis, sign) = facing.axis();
            step_along(grid, at, axis, signal * sign as f32)
        }
        Effector::SelfTerminate => {
            if signal.abs() > SELF_TERMINATE_THRESHOLD {
                Effect::Died(DeathCause::SelfTerminated)
            } else {
                Effect::Continue
            }
        }
        Effector::SetOscillator => {
            if let Some(cell) = grid.cell_mut(at) {
                cell.oscillator.retune(signal);
            }
            Effect::Continue
        }
        Effector::KillForward => {
            let (dx, dy) = if signal > KILL_THRESHOLD {
                facing.forward()
            } else if signal < -KILL_THRESHOLD {
                facing.backward()
            } else {
                return Effect::Continue;
            };
            let target = grid.neighbor(at, dx, dy);
            attack(grid, at, target)
        }
    }
}

/// One step along `axis` when `|signal|` clears the move threshold.
fn step_along(grid: &mut Grid, at: Coord, axis: Axis, signal: f32) -> Effect {
    let sign = if signal > MOVE_THRESHOLD {
        1
    } else if signal < -MOVE_THRESHOLD {
        -1
    } else {
        return Effect::Continue;
    };
    let (dx, dy) = axis.delta(sign);
    let to = grid.neighbor(at, dx, dy);

    let gained = match grid.tile(to) {
        Tile::Empty => 0,
        Tile::Food(food) => food.energy,
        Tile::Agent(_) => return Effect::Continue,
    };
    let Some(cell) = grid.cell_mut(at) else {
        return Effect::Continue;
    };
    cell.energy = cell.energy.saturating_add(gained);
    cell.facing = Compass::from_step(axis, sign);
    Effect::Relocate(to)
}

/// Resolve an attack from `at` onto `target`.
fn attack(grid: &mut Grid, at: Coord, target: Coord) -> Effect {
    if target == at {
        return Effect::Continue;
    }
    let defender_energy = match grid.tile(target) {
        Tile::Empty => return Effect::Continue,
        Tile::Food(food) => {
            let meal = food.energy;
            grid.clear(target);
            if let Some(cell) = grid.cell_mut(at) {
                cell.energy = cell.energy.saturating_add(meal);
            }
            return Effect::Continue;
        }
        Tile::Agent(defender) => defender.energy,
    };

    let Some(attacker) = grid.cell_mut(at) else {
        return Effect::Continue;
    };
    let before = attacker.energy;
    let after = before.saturating_sub(combat_cost(defender_energy));

    if after == 0 {
        // lost: attacker keeps its energy for salvage, the defender pays
        if let Some(defender) = grid.cell_mut(target) {
            defender.energy = defender.energy.saturating_sub(defence_cost(before));
        }
        return Effect::Died(DeathCause::Combat);
    }

    attacker.energy = after.saturating_add(death_energy(defender_energy));
    grid.clear(target);
    Effect::Killed
}

//! Sensor evaluation: agent and neighbourhood state reduced to [-1, 1].

use crate::cell::{Axis, Cell, Compass};
use crate::gene::{Sensor, decode_strength};
use crate::grid::{Coord, Grid, TileKind};

/// Age mapped onto the full sensor range.
pub const AGE_SPAN: f32 = 2048.0;
/// Energy mapped onto the full sensor range.
pub const ENERGY_SPAN: f32 = 200.0;
/// Largest magnitude a scaled gene signal can take.
pub const SIGNAL_LIMIT: f32 = 4.0;

const NEIGHBORHOOD: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Linear map of `[0, span]` onto `[-1, 1]`, saturating outside.
fn map_unit(value: f32, span: f32) -> f32 {
    (value / span * 2.0 - 1.0).clamp(-1.0, 1.0)
}

/// +1 when `kind` sits one step along +axis, -1 when one step along -axis.
fn axis_probe(grid: &Grid, at: Coord, axis: Axis, kind: TileKind) -> f32 {
    let (dx, dy) = axis.delta(1);
    if grid.kind_at(at, dx, dy) == kind {
        1.0
    } else if grid.kind_at(at, -dx, -dy) == kind {
        -1.0
    } else {
        0.0
    }
}

/// +1 when `kind` is ahead, -1 when behind.
fn facing_probe(grid: &Grid, at: Coord, facing: Compass, kind: TileKind) -> f32 {
    let (fx, fy) = facing.forward();
    let (bx, by) = facing.backward();
    if grid.kind_at(at, fx, fy) == kind {
        1.0
    } else if grid.kind_at(at, bx, by) == kind {
        -1.0
    } else {
        0.0
    }
}

/// Crowding in the 8-neighbourhood: `(occupied - 4) / 8`.
#[must_use]
pub fn density(grid: &Grid, at: Coord) -> f32 {
    let occupied = NEIGHBORHOOD
        .iter()
        .filter(|(dx, dy)| grid.kind_at(at, *dx, *dy) == TileKind::Agent)
        .count();
    (occupied as f32 - 4.0) / 8.0
}

/// Read the sensor selected by `selector` for the agent `cell` standing at `at`.
///
/// Unknown selectors read as 0.
#[must_use]
pub fn sense(cell: &Cell, grid: &Grid, at: Coord, selector: u8) -> f32 {
    let Some(sensor) = Sensor::from_selector(selector) else {
        return 0.0;
    };
    match sensor {
        Sensor::Age => map_unit(cell.age as f32, AGE_SPAN),
        Sensor::Energy => map_unit(cell.energy as f32, ENERGY_SPAN),
        Sensor::Oscillator => {
            if cell.oscillator.is_even() {
                1.0
            } else {
                -1.0
            }
        }
        Sensor::FoodX => axis_probe(grid, at, Axis::X, TileKind::Food),
        Sensor::FoodY => axis_probe(grid, at, Axis::Y, TileKind::Food),
        Sensor::FoodForward => facing_probe(grid, at, cell.facing, TileKind::Food),
        Sensor::ObstacleX => axis_probe(grid, at, Axis::X, TileKind::Agent),
        Sensor::ObstacleY => axis_probe(grid, at, Axis::Y, TileKind::Agent),
        Sensor::ObstacleForward => facing_probe(grid, at, cell.facing, TileKind::Agent),
        Sensor::Density => density(grid, at),
        Sensor::LastX => match cell.facing {
            Compass::East => 1.0,
            Compass::West => -1.0,
            Compass::North | Compass::South => 0.0,
        },
        Sensor::LastY => match cell.facing {
            Compass::North => 1.0,
            Compass::South => -1.0,
            Compass::East | Compass::West => 0.0,
        },
    }
}

/// Turn a sensor reading into an effector signal using the gene strength:
/// `clamp(reading * 4 * sin(strength / 4), -4, 4)`.
#[must_use]
pub fn scale_signal(reading: f32, strength_bits: u16) -> f32 {
    let gain = SIGNAL_LIMIT * (0.25 * decode_strength(strength_bits)).sin();
    (reading * gain).clamp(-SIGNAL_LIMIT, SIGNAL_LIMIT)
}

//! Toroidal tile storage.

use serde::{Deserialize, Serialize};

use crate::WorldError;
use crate::cell::{Cell, DeadMatter};

/// Position on the grid, always within bounds once produced by [`Grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Discriminant of a [`Tile`], cheap to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Empty,
    Food,
    Agent,
}

/// Content of one grid position. Exactly one variant is ever active.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    Food(DeadMatter),
    Agent(Cell),
}

impl Tile {
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        match self {
            Self::Empty => TileKind::Empty,
            Self::Food(_) => TileKind::Food,
            Self::Agent(_) => TileKind::Agent,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub const fn is_food(&self) -> bool {
        matches!(self, Self::Food(_))
    }

    #[must_use]
    pub const fn is_agent(&self) -> bool {
        matches!(self, Self::Agent(_))
    }

    #[must_use]
    pub const fn as_cell(&self) -> Option<&Cell> {
        match self {
            Self::Agent(cell) => Some(cell),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_food(&self) -> Option<&DeadMatter> {
        match self {
            Self::Food(food) => Some(food),
            _ => None,
        }
    }
}

/// Row-major tile array whose edges wrap on both axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Construct an all-empty grid.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::InvalidConfig("grid dimensions must be non-zero"));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(WorldError::InvalidConfig("grid dimensions overflow"))?;
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::Empty; len],
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    #[must_use]
    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    /// Reduce arbitrary signed coordinates onto the torus.
    #[must_use]
    pub fn wrap(&self, x: i64, y: i64) -> Coord {
        Coord {
            x: x.rem_euclid(i64::from(self.width)) as u32,
            y: y.rem_euclid(i64::from(self.height)) as u32,
        }
    }

    /// Flat offset of `(x, y)` after wrapping.
    #[must_use]
    pub fn index(&self, x: i64, y: i64) -> usize {
        let at = self.wrap(x, y);
        self.offset(at)
    }

    #[inline]
    fn offset(&self, at: Coord) -> usize {
        (at.y as usize) * (self.width as usize) + (at.x as usize)
    }

    /// Tile `(dx, dy)` away from `at`, wrapping around edges.
    #[must_use]
    pub fn neighbor(&self, at: Coord, dx: i64, dy: i64) -> Coord {
        self.wrap(i64::from(at.x) + dx, i64::from(at.y) + dy)
    }

    #[must_use]
    pub fn tile(&self, at: Coord) -> &Tile {
        &self.tiles[self.index(i64::from(at.x), i64::from(at.y))]
    }

    #[must_use]
    pub fn tile_mut(&mut self, at: Coord) -> &mut Tile {
        let idx = self.index(i64::from(at.x), i64::from(at.y));
        &mut self.tiles[idx]
    }

    /// Kind of the tile `(dx, dy)` away from `at`.
    #[must_use]
    pub fn kind_at(&self, at: Coord, dx: i64, dy: i64) -> TileKind {
        self.tile(self.neighbor(at, dx, dy)).kind()
    }

    #[must_use]
    pub fn cell(&self, at: Coord) -> Option<&Cell> {
        self.tile(at).as_cell()
    }

    #[must_use]
    pub fn cell_mut(&mut self, at: Coord) -> Option<&mut Cell> {
        match self.tile_mut(at) {
            Tile::Agent(cell) => Some(cell),
            _ => None,
        }
    }

    /// Store `tile` at `at`, returning the previous content.
    pub fn replace(&mut self, at: Coord, tile: Tile) -> Tile {
        std::mem::replace(self.tile_mut(at), tile)
    }

    /// Empty `at`, returning the previous content.
    pub fn clear(&mut self, at: Coord) -> Tile {
        std::mem::take(self.tile_mut(at))
    }

    /// Move the content of `from` onto `to`, overwriting whatever was there
    /// and leaving `from` empty. Returns the overwritten tile.
    pub fn relocate(&mut self, from: Coord, to: Coord) -> Tile {
        if self.index(i64::from(from.x), i64::from(from.y))
            == self.index(i64::from(to.x), i64::from(to.y))
        {
            return Tile::Empty;
        }
        let moving = self.clear(from);
        self.replace(to, moving)
    }

    /// Turn the agent at `at` into the food it leaves behind.
    ///
    /// Returns the food left behind, or `None` when `at` held no agent.
    pub fn kill(&mut self, at: Coord) -> Option<DeadMatter> {
        if !self.tile(at).is_agent() {
            return None;
        }
        let Tile::Agent(cell) = self.clear(at) else {
            return None;
        };
        let remains = cell.into_remains();
        self.replace(at, Tile::Food(remains));
        Some(remains)
    }

    /// Tiles in row-major order (`y` outer, `x` inner).
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> + '_ {
        let width = self.width as usize;
        self.tiles.iter().enumerate().map(move |(idx, tile)| {
            (
                Coord::new((idx % width) as u32, (idx / width) as u32),
                tile,
            )
        })
    }

    /// One row of tiles.
    #[must_use]
    pub fn row(&self, y: u32) -> &[Tile] {
        let width = self.width as usize;
        let start = (y % self.height) as usize * width;
        &self.tiles[start..start + width]
    }

    /// Flat tile slice in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Number of tiles holding an agent.
    #[must_use]
    pub fn population(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_agent()).count()
    }

    /// Number of tiles holding nothing.
    #[must_use]
    pub fn vacancies(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_empty()).count()
    }

    /// Whether any tile holds an agent.
    #[must_use]
    pub fn has_agents(&self) -> bool {
        self.tiles.iter().any(Tile::is_agent)
    }

    pub(crate) fn clear_updated_flags(&mut self) {
        for tile in &mut self.tiles {
            if let Tile::Agent(cell) = tile {
                cell.clear_updated();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Compass;

    fn agent(id: u64, energy: u32) -> Tile {
        Tile::Agent(Cell::new(id, energy, Compass::North, Default::default()))
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Grid::new(0, 4).is_err());
        assert!(Grid::new(4, 0).is_err());
        let grid = Grid::new(4, 3).expect("grid");
        assert_eq!(grid.area(), 12);
        assert!(grid.tiles().iter().all(Tile::is_empty));
    }

    #[test]
    fn index_wraps_both_axes() {
        let grid = Grid::new(5, 3).expect("grid");
        for y in -4..7 {
            assert_eq!(grid.index(5, y), grid.index(0, y));
            assert_eq!(grid.index(10, y), grid.index(0, y));
            assert_eq!(grid.index(-5, y), grid.index(0, y));
        }
        assert_eq!(grid.index(-1, -1), grid.index(4, 2));
        assert_eq!(grid.index(2, 3), grid.index(2, 0));
        assert_eq!(grid.index(4, 2), 14);
    }

    #[test]
    fn neighbor_crosses_edges() {
        let grid = Grid::new(4, 4).expect("grid");
        assert_eq!(grid.neighbor(Coord::new(3, 0), 1, 0), Coord::new(0, 0));
        assert_eq!(grid.neighbor(Coord::new(0, 0), 0, -1), Coord::new(0, 3));
        assert_eq!(grid.neighbor(Coord::new(1, 1), -1, 1), Coord::new(0, 2));
    }

    #[test]
    fn relocate_moves_exactly_one_tile() {
        let mut grid = Grid::new(3, 3).expect("grid");
        let from = Coord::new(0, 0);
        let to = Coord::new(2, 0);
        grid.replace(from, agent(1, 10));
        grid.replace(to, Tile::Food(DeadMatter::new(9, 4)));

        let overwritten = grid.relocate(from, to);
        assert_eq!(overwritten, Tile::Food(DeadMatter::new(9, 4)));
        assert!(grid.tile(from).is_empty());
        assert_eq!(grid.cell(to).map(Cell::id), Some(1));
        assert_eq!(grid.population(), 1);

        assert_eq!(grid.relocate(to, to), Tile::Empty);
        assert_eq!(grid.cell(to).map(Cell::id), Some(1));
    }

    #[test]
    fn kill_leaves_salvaged_food() {
        let mut grid = Grid::new(2, 2).expect("grid");
        let at = Coord::new(1, 1);
        grid.replace(at, agent(7, 20));
        let remains = grid.kill(at).expect("agent killed");
        assert_eq!(remains, DeadMatter::new(7, 10));
        assert_eq!(grid.tile(at), &Tile::Food(DeadMatter::new(7, 10)));
        assert!(grid.kill(at).is_none());
        assert!(!grid.has_agents());
    }

    #[test]
    fn iteration_is_row_major() {
        let mut grid = Grid::new(3, 2).expect("grid");
        grid.replace(Coord::new(2, 1), agent(1, 1));
        let coords: Vec<Coord> = grid.iter().map(|(at, _)| at).collect();
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[2], Coord::new(2, 0));
        assert_eq!(coords[3], Coord::new(0, 1));
        let (last, tile) = grid.iter().last().expect("tiles");
        assert_eq!(last, Coord::new(2, 1));
        assert!(tile.is_agent());
        assert_eq!(grid.row(1)[2].kind(), TileKind::Agent);
        assert_eq!(grid.vacancies(), 5);
    }

    #[test]
    fn every_tile_has_exactly_one_kind() {
        let mut grid = Grid::new(3, 1).expect("grid");
        grid.replace(Coord::new(1, 0), Tile::Food(DeadMatter::new(1, 1)));
        grid.replace(Coord::new(2, 0), agent(2, 2));
        for (_, tile) in grid.iter() {
            let flags = [tile.is_empty(), tile.is_food(), tile.is_agent()];
            assert_eq!(flags.iter().filter(|flag| **flag).count(), 1);
        }
    }
}

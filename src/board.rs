//! Fixed-size N×N grids for ship occupancy and shot outcomes.
//!
//! Cells are stored row-major: the cell at `(x, y)` lives at index
//! `y * N + x`. The textual form produced by [`Grid::serialize`] is the
//! request handed to bot processes, so its order and delimiter are fixed.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::BoardError;
use crate::config::BOARD_SIZE;

/// Numeric code used when a cell is written out.
pub trait CellCode: Copy {
    fn code(&self) -> i8;
}

/// Contents of an occupancy grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShipCell {
    #[default]
    Sea,
    /// Part of the ship at this index in the fleet.
    Ship(usize),
}

impl CellCode for ShipCell {
    fn code(&self) -> i8 {
        match self {
            ShipCell::Sea => 0,
            ShipCell::Ship(i) => *i as i8 + 1,
        }
    }
}

/// What the shooter knows about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShotCell {
    #[default]
    Unknown,
    Miss,
    Hit,
    Sunk,
}

impl CellCode for ShotCell {
    fn code(&self) -> i8 {
        match self {
            ShotCell::Unknown => 0,
            ShotCell::Miss => -1,
            ShotCell::Hit => 1,
            ShotCell::Sunk => 2,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Grid<T, const N: usize> {
    cells: Vec<T>,
}

/// Where the ships are. Hidden from the bot.
pub type OccupancyGrid = Grid<ShipCell, BOARD_SIZE>;
/// The shot history. The only thing a bot ever sees.
pub type OutcomeGrid = Grid<ShotCell, BOARD_SIZE>;

impl<T: CellCode, const N: usize> Grid<T, N> {
    /// Create a grid with every cell set to `init`.
    pub fn new(init: T) -> Self {
        Self {
            cells: vec![init; N * N],
        }
    }

    /// Number of cells in the grid.
    pub const fn len() -> usize {
        N * N
    }

    pub fn valid_coord(x: usize, y: usize) -> bool {
        x < N && y < N
    }

    /// Map a row-major cell index to `(x, y)`.
    pub fn index_to_coord(i: usize) -> Result<(usize, usize), BoardError> {
        if i >= N * N {
            return Err(BoardError::InvalidIndex(i));
        }
        Ok((i % N, i / N))
    }

    pub fn get(&self, x: usize, y: usize) -> Result<T, BoardError> {
        let idx = Self::index(x, y)?;
        Ok(self.cells[idx])
    }

    pub fn put(&mut self, x: usize, y: usize, val: T) -> Result<(), BoardError> {
        let idx = Self::index(x, y)?;
        self.cells[idx] = val;
        Ok(())
    }

    /// Uniformly random cell. Draws `x` first, then `y`.
    pub fn random_cell<R: Rng>(rng: &mut R) -> (usize, usize) {
        let x = rng.random_range(0..N);
        let y = rng.random_range(0..N);
        (x, y)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn count(&self, val: T) -> usize
    where
        T: PartialEq,
    {
        self.cells.iter().filter(|c| **c == val).count()
    }

    /// Numeric cell codes in row-major order.
    pub fn codes(&self) -> Vec<i8> {
        self.cells.iter().map(CellCode::code).collect()
    }

    /// Comma-joined cell codes in row-major order.
    pub fn serialize(&self) -> String {
        let parts: Vec<String> = self.cells.iter().map(|c| c.code().to_string()).collect();
        parts.join(",")
    }

    #[inline]
    fn index(x: usize, y: usize) -> Result<usize, BoardError> {
        if Self::valid_coord(x, y) {
            Ok(y * N + x)
        } else {
            Err(BoardError::OutOfBounds { x, y })
        }
    }
}

impl<T: CellCode, const N: usize> fmt::Display for Grid<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl<T: CellCode, const N: usize> fmt::Debug for Grid<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {{")?;
        for row in self.cells.chunks(N) {
            let line: Vec<String> = row.iter().map(|c| format!("{:>2}", c.code())).collect();
            writeln!(f, "  {}", line.join(" "))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_row_major() {
        assert_eq!(OutcomeGrid::index_to_coord(0).unwrap(), (0, 0));
        assert_eq!(OutcomeGrid::index_to_coord(9).unwrap(), (9, 0));
        assert_eq!(OutcomeGrid::index_to_coord(10).unwrap(), (0, 1));
        assert_eq!(OutcomeGrid::index_to_coord(57).unwrap(), (7, 5));
        assert_eq!(
            OutcomeGrid::index_to_coord(100),
            Err(BoardError::InvalidIndex(100))
        );
    }

    #[test]
    fn put_then_serialize() {
        let mut g = Grid::<ShotCell, 3>::new(ShotCell::Unknown);
        g.put(1, 0, ShotCell::Miss).unwrap();
        g.put(0, 2, ShotCell::Hit).unwrap();
        g.put(2, 2, ShotCell::Sunk).unwrap();
        assert_eq!(g.serialize(), "0,-1,0,0,0,0,1,0,2");
        assert_eq!(g.get(1, 0).unwrap(), ShotCell::Miss);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut g = OccupancyGrid::new(ShipCell::Sea);
        assert!(!OccupancyGrid::valid_coord(10, 0));
        assert_eq!(
            g.put(3, 10, ShipCell::Ship(0)),
            Err(BoardError::OutOfBounds { x: 3, y: 10 })
        );
        assert_eq!(g.count(ShipCell::Sea), 100);
    }

    #[test]
    fn ship_codes_are_one_based() {
        let mut g = Grid::<ShipCell, 2>::new(ShipCell::Sea);
        g.put(1, 1, ShipCell::Ship(4)).unwrap();
        assert_eq!(g.codes(), vec![0, 0, 0, 5]);
    }
}

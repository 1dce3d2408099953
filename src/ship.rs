//! Ship definitions and random fleet placement on the occupancy grid.

use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{OccupancyGrid, ShipCell};

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Type of ship: name and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipType {
    name: &'static str,
    length: usize,
}

impl ShipType {
    /// Create a new ship type.
    pub const fn new(name: &'static str, length: usize) -> Self {
        Self { name, length }
    }

    /// Ship's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ship's length.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// The run of cells a ship of `length` would cover from `(x, y)`.
///
/// Cells may fall outside the grid; callers check before placing.
pub fn ship_run(x: usize, y: usize, length: usize, orientation: Orientation) -> Vec<(usize, usize)> {
    (0..length)
        .map(|i| match orientation {
            Orientation::Horizontal => (x + i, y),
            Orientation::Vertical => (x, y + i),
        })
        .collect()
}

/// Tag `run` with `ship` if every cell is in bounds and still sea.
///
/// Returns whether the ship was placed. The grid is untouched on failure.
pub fn try_place(grid: &mut OccupancyGrid, ship: usize, run: &[(usize, usize)]) -> bool {
    let free = run.iter().all(|&(x, y)| {
        OccupancyGrid::valid_coord(x, y) && matches!(grid.get(x, y), Ok(ShipCell::Sea))
    });
    if !free {
        return false;
    }
    for &(x, y) in run {
        if grid.put(x, y, ShipCell::Ship(ship)).is_err() {
            return false;
        }
    }
    true
}

/// Randomly arrange `fleet` on an empty grid.
///
/// Placement order is shuffled, then each ship gets a random start cell and
/// orientation until a run fits. All randomness comes from `rng` in a fixed
/// order, so a seeded generator yields the same layout every time.
pub fn arrange_fleet<R: Rng>(grid: &mut OccupancyGrid, fleet: &[ShipType], rng: &mut R) {
    let mut order: Vec<usize> = (0..fleet.len()).collect();
    order.shuffle(rng);
    for ship in order {
        let length = fleet[ship].length();
        loop {
            let (x, y) = OccupancyGrid::random_cell(rng);
            let orientation = if rng.random::<bool>() {
                Orientation::Vertical
            } else {
                Orientation::Horizontal
            };
            let run = ship_run(x, y, length, orientation);
            if try_place(grid, ship, &run) {
                trace!("{} at {:?} {:?}", fleet[ship].name(), (x, y), orientation);
                break;
            }
        }
    }
}

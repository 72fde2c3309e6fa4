use serde::Serialize;

use crate::types::{CellId, HouseholdId, Pos};

/// Anything that can stand on a grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Occupant {
    Cell(CellId),
    Household(HouseholdId),
}

/// Multi-occupancy index from grid position to the entities placed there.
/// Entities are static once placed; there is no removal or movement.
pub struct SpatialGrid {
    width: usize,
    height: usize,
    /// Row-major, `y * width + x`.
    slots: Vec<Vec<Occupant>>,
}

impl SpatialGrid {
    pub fn new(width: usize, height: usize) -> Self {
        SpatialGrid { width, height, slots: vec![Vec::new(); width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> usize {
        assert!(self.contains(pos), "position {pos} outside {}x{} grid", self.width, self.height);
        pos.y * self.width + pos.x
    }

    /// Panics if `pos` is outside the grid.
    pub fn place(&mut self, pos: Pos, occupant: Occupant) {
        let i = self.index(pos);
        self.slots[i].push(occupant);
    }

    /// Occupants at `pos` in placement order. Panics if `pos` is outside the grid.
    pub fn contents(&self, pos: Pos) -> &[Occupant] {
        &self.slots[self.index(pos)]
    }

    /// The climate cell at `pos`, if the first occupant placed there is one.
    /// Returns `None` for out-of-grid positions.
    pub fn climate_cell_at(&self, pos: Pos) -> Option<CellId> {
        if !self.contains(pos) {
            return None;
        }
        match self.contents(pos).first() {
            Some(Occupant::Cell(id)) => Some(*id),
            _ => None,
        }
    }

    /// Every coordinate, x-major then y.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Pos::new(x, y)))
    }
}

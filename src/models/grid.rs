//! Assignment grid.
//!
//! A dense (window × location) arena mapping each cell to at most one team.
//! The solver keeps one grid for judging sessions and one for matches and
//! rebuilds both from scratch on every attempt. All mutation goes through
//! [`Grid::assign`] and [`Grid::unassign`], so a cell can never silently
//! hold two teams.

use serde::{Deserialize, Serialize};

/// Dense team-index grid, row-major by window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    windows: usize,
    locations: usize,
    cells: Vec<Option<usize>>,
}

impl Grid {
    /// Creates an empty grid.
    pub fn new(windows: usize, locations: usize) -> Self {
        Self {
            windows,
            locations,
            cells: vec![None; windows * locations],
        }
    }

    /// Number of window rows.
    #[inline]
    pub fn window_count(&self) -> usize {
        self.windows
    }

    /// Number of location columns.
    #[inline]
    pub fn location_count(&self) -> usize {
        self.locations
    }

    #[inline]
    fn offset(&self, window: usize, location: usize) -> Option<usize> {
        (window < self.windows && location < self.locations)
            .then_some(window * self.locations + location)
    }

    /// Team in a cell, if any. Out-of-range cells read as empty.
    pub fn get(&self, window: usize, location: usize) -> Option<usize> {
        self.offset(window, location).and_then(|i| self.cells[i])
    }

    /// Whether a cell exists and is empty.
    pub fn is_free(&self, window: usize, location: usize) -> bool {
        self.offset(window, location)
            .is_some_and(|i| self.cells[i].is_none())
    }

    /// Places a team into an empty cell.
    ///
    /// Returns `false` (and changes nothing) if the cell is occupied or
    /// out of range.
    pub fn assign(&mut self, window: usize, location: usize, team: usize) -> bool {
        match self.offset(window, location) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(team);
                true
            }
            _ => false,
        }
    }

    /// Clears a cell, returning the team it held.
    pub fn unassign(&mut self, window: usize, location: usize) -> Option<usize> {
        self.offset(window, location)
            .and_then(|i| self.cells[i].take())
    }

    /// Cells of one window row.
    pub fn row(&self, window: usize) -> &[Option<usize>] {
        if window >= self.windows {
            return &[];
        }
        let start = window * self.locations;
        &self.cells[start..start + self.locations]
    }

    /// Occupied cells as `(window, location, team)`, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|team| (i / self.locations, i % self.locations, team))
        })
    }

    /// Number of occupied cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

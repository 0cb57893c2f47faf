//! Schedule (solution) model.
//!
//! A schedule is the accepted solver result for one division: the session
//! and match timelines, the two filled grids, and the rosters needed to
//! resolve grid indices back to identifiers.

use serde::{Deserialize, Serialize};

use super::{Grid, Location, Stage, Team, Window};
use crate::scheduler::ScheduleScore;

/// A solved tournament schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Division this schedule belongs to.
    pub division_id: String,
    /// Team roster (grid cells index into this).
    pub teams: Vec<Team>,
    /// Judging rooms (session grid columns).
    pub rooms: Vec<Location>,
    /// Robot-game tables (match grid columns).
    pub tables: Vec<Location>,
    /// Judging session windows (session grid rows).
    pub sessions: Vec<Window>,
    /// Match windows (match grid rows).
    pub matches: Vec<Window>,
    /// Session × room assignments.
    pub session_grid: Grid,
    /// Match × table assignments.
    pub match_grid: Grid,
    /// Gap score of the accepted attempt.
    pub score: ScheduleScore,
    /// Base seed the run was started with.
    pub seed: u64,
    /// Index of the accepted attempt.
    pub attempt: u32,
}

/// One team placed at one location during one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned team ID.
    pub team_id: String,
    /// Stage of the event.
    pub stage: Stage,
    /// Round within the stage.
    pub round: u32,
    /// Session or match number.
    pub number: u32,
    /// Room or table ID.
    pub location_id: String,
    /// Start time (ms).
    pub start_ms: i64,
    /// End time (ms).
    pub end_ms: i64,
}

impl Assignment {
    /// Duration (end - start) in ms.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

impl Schedule {
    fn grid_assignments<'a>(
        &'a self,
        windows: &'a [Window],
        grid: &'a Grid,
        locations: &'a [Location],
    ) -> impl Iterator<Item = Assignment> + 'a {
        grid.occupied().filter_map(move |(w, l, t)| {
            let window = windows.get(w)?;
            Some(Assignment {
                team_id: self.teams.get(t)?.id.clone(),
                stage: window.stage,
                round: window.round,
                number: window.number,
                location_id: locations.get(l)?.id.clone(),
                start_ms: window.start_ms(),
                end_ms: window.end_ms(),
            })
        })
    }

    /// All assignments: sessions first, then matches, each row-major.
    pub fn assignments(&self) -> Vec<Assignment> {
        self.grid_assignments(&self.sessions, &self.session_grid, &self.rooms)
            .chain(self.grid_assignments(&self.matches, &self.match_grid, &self.tables))
            .collect()
    }

    /// A team's assignments in chronological order.
    pub fn assignments_for_team(&self, team_id: &str) -> Vec<Assignment> {
        let mut out: Vec<Assignment> = self
            .assignments()
            .into_iter()
            .filter(|a| a.team_id == team_id)
            .collect();
        out.sort_by_key(|a| (a.start_ms, a.stage));
        out
    }

    /// All assignments at a given room or table.
    pub fn assignments_for_location(&self, location_id: &str) -> Vec<Assignment> {
        self.assignments()
            .into_iter()
            .filter(|a| a.location_id == location_id)
            .collect()
    }

    /// How often a team visits a location within a stage.
    pub fn visits(&self, team_id: &str, stage: Stage, location_id: &str) -> usize {
        self.assignments()
            .iter()
            .filter(|a| a.team_id == team_id && a.stage == stage && a.location_id == location_id)
            .count()
    }

    /// Number of filled cells across both grids.
    pub fn assignment_count(&self) -> usize {
        self.session_grid.filled_count() + self.match_grid.filled_count()
    }
}

//! Session and match tables.
//!
//! The canonical boundary format between the solver and any storage or
//! reporting system. One row per session (or match), fixed time columns,
//! and one column per room (or table) holding the assigned team ID.
//!
//! | Table | Fixed columns | Location columns |
//! |-------|---------------|------------------|
//! | [`SessionTable`] | number, start, end | one per room ID |
//! | [`MatchTable`] | number, start, end, stage, round | one per table ID |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Grid, Location, Schedule, Stage, Team, Window};

/// Identifies one filled cell independently of grid layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    /// Stage of the event.
    pub stage: Stage,
    /// Round within the stage.
    pub round: u32,
    /// Session or match number.
    pub number: u32,
    /// Room or table ID.
    pub location_id: String,
}

/// Cell → team ID.
pub type AssignmentMap = BTreeMap<CellKey, String>;

/// One judging session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Session number.
    pub number: u32,
    /// Session start.
    pub start_time: DateTime<Utc>,
    /// Session end.
    pub end_time: DateTime<Utc>,
    /// Team ID per room column (`None` = empty).
    pub teams: Vec<Option<String>>,
}

/// Judging sessions × rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTable {
    /// Room IDs, one per team column.
    pub rooms: Vec<String>,
    /// Session rows in chronological order.
    pub rows: Vec<SessionRow>,
}

/// One match row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    /// Global match number.
    pub number: u32,
    /// Match start.
    pub start_time: DateTime<Utc>,
    /// Match end.
    pub end_time: DateTime<Utc>,
    /// Practice or ranking.
    pub stage: Stage,
    /// Round within the stage.
    pub round: u32,
    /// Team ID per table column (`None` = empty).
    pub teams: Vec<Option<String>>,
}

/// Matches × tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTable {
    /// Table IDs, one per team column.
    pub tables: Vec<String>,
    /// Match rows in chronological order.
    pub rows: Vec<MatchRow>,
}

/// Both tables for one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTables {
    /// Division the tables belong to.
    pub division_id: String,
    /// Judging session table.
    pub sessions: SessionTable,
    /// Match table.
    pub matches: MatchTable,
}

fn to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn row_teams(grid: &Grid, window: usize, teams: &[Team]) -> Vec<Option<String>> {
    grid.row(window)
        .iter()
        .map(|cell| cell.and_then(|t| teams.get(t)).map(|t| t.id.clone()))
        .collect()
}

fn location_ids(locations: &[Location]) -> Vec<String> {
    locations.iter().map(|l| l.id.clone()).collect()
}

fn collect_row(
    map: &mut AssignmentMap,
    stage: Stage,
    round: u32,
    number: u32,
    columns: &[String],
    teams: &[Option<String>],
) {
    for (location_id, team) in columns.iter().zip(teams) {
        if let Some(team) = team {
            map.insert(
                CellKey {
                    stage,
                    round,
                    number,
                    location_id: location_id.clone(),
                },
                team.clone(),
            );
        }
    }
}

impl SessionTable {
    /// Builds the session table from a session grid.
    pub fn from_grid(sessions: &[Window], grid: &Grid, rooms: &[Location], teams: &[Team]) -> Self {
        let rows = sessions
            .iter()
            .enumerate()
            .map(|(w, window)| SessionRow {
                number: window.number,
                start_time: to_datetime(window.start_ms()),
                end_time: to_datetime(window.end_ms()),
                teams: row_teams(grid, w, teams),
            })
            .collect();
        Self {
            rooms: location_ids(rooms),
            rows,
        }
    }

    /// Filled cells keyed by (judging, 1, session, room).
    pub fn assignments(&self) -> AssignmentMap {
        let mut map = AssignmentMap::new();
        for row in &self.rows {
            collect_row(&mut map, Stage::Judging, 1, row.number, &self.rooms, &row.teams);
        }
        map
    }
}

impl MatchTable {
    /// Builds the match table from a match grid.
    pub fn from_grid(matches: &[Window], grid: &Grid, tables: &[Location], teams: &[Team]) -> Self {
        let rows = matches
            .iter()
            .enumerate()
            .map(|(w, window)| MatchRow {
                number: window.number,
                start_time: to_datetime(window.start_ms()),
                end_time: to_datetime(window.end_ms()),
                stage: window.stage,
                round: window.round,
                teams: row_teams(grid, w, teams),
            })
            .collect();
        Self {
            tables: location_ids(tables),
            rows,
        }
    }

    /// Filled cells keyed by (stage, round, match, table).
    pub fn assignments(&self) -> AssignmentMap {
        let mut map = AssignmentMap::new();
        for row in &self.rows {
            collect_row(&mut map, row.stage, row.round, row.number, &self.tables, &row.teams);
        }
        map
    }
}

impl ScheduleTables {
    /// Serializes both tables to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses tables from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Filled cells of both tables.
    pub fn assignments(&self) -> AssignmentMap {
        let mut map = self.sessions.assignments();
        map.extend(self.matches.assignments());
        map
    }
}

impl Schedule {
    /// Renders the schedule as session and match tables.
    pub fn to_tables(&self) -> ScheduleTables {
        ScheduleTables {
            division_id: self.division_id.clone(),
            sessions: SessionTable::from_grid(
                &self.sessions,
                &self.session_grid,
                &self.rooms,
                &self.teams,
            ),
            matches: MatchTable::from_grid(&self.matches, &self.match_grid, &self.tables, &self.teams),
        }
    }

    /// Filled cells of both grids.
    pub fn assignment_map(&self) -> AssignmentMap {
        self.assignments()
            .into_iter()
            .map(|a| {
                (
                    CellKey {
                        stage: a.stage,
                        round: a.round,
                        number: a.number,
                        location_id: a.location_id,
                    },
                    a.team_id,
                )
            })
            .collect()
    }
}

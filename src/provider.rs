//! Roster provider seam.
//!
//! Team, room, and table master data live outside the solver. The
//! generator fetches them once through [`RosterProvider`] before any
//! solving starts, so attempts never block on I/O.

use thiserror::Error;

use crate::models::{Location, Team};

/// A failed roster fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{call} failed: {message}")]
pub struct ProviderError {
    /// Which call failed (`teams`, `rooms`, `tables`).
    pub call: &'static str,
    /// Provider-supplied description.
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error.
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}

/// Source of a division's teams and locations.
pub trait RosterProvider {
    /// Teams in the division.
    fn teams(&self) -> Result<Vec<Team>, ProviderError>;

    /// Judging rooms.
    fn rooms(&self) -> Result<Vec<Location>, ProviderError>;

    /// Robot-game tables.
    fn tables(&self) -> Result<Vec<Location>, ProviderError>;
}

impl<P: RosterProvider + ?Sized> RosterProvider for &P {
    fn teams(&self) -> Result<Vec<Team>, ProviderError> {
        (**self).teams()
    }

    fn rooms(&self) -> Result<Vec<Location>, ProviderError> {
        (**self).rooms()
    }

    fn tables(&self) -> Result<Vec<Location>, ProviderError> {
        (**self).tables()
    }
}

/// A provider over rosters already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    teams: Vec<Team>,
    rooms: Vec<Location>,
    tables: Vec<Location>,
}

impl InMemoryRoster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the teams.
    pub fn with_teams(mut self, teams: Vec<Team>) -> Self {
        self.teams = teams;
        self
    }

    /// Sets the rooms.
    pub fn with_rooms(mut self, rooms: Vec<Location>) -> Self {
        self.rooms = rooms;
        self
    }

    /// Sets the tables.
    pub fn with_tables(mut self, tables: Vec<Location>) -> Self {
        self.tables = tables;
        self
    }

    /// Roster with numbered teams `1..=teams`, rooms `R1..`, tables `T1..`.
    pub fn numbered(teams: usize, rooms: usize, tables: usize) -> Self {
        Self {
            teams: (1..=teams)
                .map(|n| Team::numbered(format!("team-{n}"), n as u32))
                .collect(),
            rooms: (1..=rooms)
                .map(|n| Location::room(format!("R{n}")).with_name(format!("Room {n}")))
                .collect(),
            tables: (1..=tables)
                .map(|n| Location::table(format!("T{n}")).with_name(format!("Table {n}")))
                .collect(),
        }
    }
}

impl RosterProvider for InMemoryRoster {
    fn teams(&self) -> Result<Vec<Team>, ProviderError> {
        Ok(self.teams.clone())
    }

    fn rooms(&self) -> Result<Vec<Location>, ProviderError> {
        Ok(self.rooms.clone())
    }

    fn tables(&self) -> Result<Vec<Location>, ProviderError> {
        Ok(self.tables.clone())
    }
}

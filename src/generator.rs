//! End-to-end schedule generation for one division.
//!
//! [`ScheduleGenerator`] wires the pipeline together:
//!
//! 1. fetch teams, rooms, and tables from the [`RosterProvider`];
//! 2. check input integrity;
//! 3. build session and match timelines;
//! 4. validate session/match feasibility;
//! 5. run the multi-attempt solver;
//! 6. assemble the [`Schedule`].
//!
//! All I/O happens in step 1. Steps 2–6 are pure computation.
//!
//! # Example
//!
//! ```
//! use u_tournament::generator::ScheduleGenerator;
//! use u_tournament::models::ScheduleConfig;
//! use u_tournament::provider::InMemoryRoster;
//!
//! let config = ScheduleConfig::from_json(r#"{
//!     "division_id": "div-1",
//!     "matches_start": "2024-03-01T08:00:00Z",
//!     "practice_rounds": 1,
//!     "ranking_rounds": 1,
//!     "match_length_seconds": 300,
//!     "practice_match_cycle_time_seconds": 1200,
//!     "ranking_match_cycle_time_seconds": 1200,
//!     "judging_start": "2024-03-01T09:00:00Z",
//!     "judging_session_length_seconds": 1800,
//!     "judging_cycle_time_seconds": 3600,
//!     "seed": 42
//! }"#).unwrap();
//!
//! let schedule = ScheduleGenerator::new(InMemoryRoster::numbered(8, 4, 2), config)
//!     .generate()
//!     .unwrap();
//! assert_eq!(schedule.assignment_count(), 8 + 16);
//! assert!(schedule.score.min_gap_ms >= 15 * 60 * 1000);
//! ```

use rand::Rng;
use std::sync::atomic::AtomicBool;
use tracing::info;

use crate::error::ScheduleError;
use crate::models::{Location, Schedule, ScheduleConfig, SolverSettings, Team};
use crate::provider::RosterProvider;
use crate::scheduler::{AssignmentSolver, MultiAttemptOptimizer, SolverInput};
use crate::timeline::{build_timelines, ScheduleTimelines};
use crate::validation::validate_input;
use crate::validator::{Validator, ValidatorEntry};

/// Everything computed before solving.
#[derive(Debug, Clone)]
struct Prepared {
    teams: Vec<Team>,
    rooms: Vec<Location>,
    tables: Vec<Location>,
    timelines: ScheduleTimelines,
    entries: Vec<ValidatorEntry>,
}

/// Generates a schedule for one division.
#[derive(Debug, Clone)]
pub struct ScheduleGenerator<P> {
    provider: P,
    config: ScheduleConfig,
    settings: SolverSettings,
}

impl<P: RosterProvider> ScheduleGenerator<P> {
    /// Creates a generator with default solver settings.
    pub fn new(provider: P, config: ScheduleConfig) -> Self {
        Self {
            provider,
            config,
            settings: SolverSettings::default(),
        }
    }

    /// Sets the solver settings.
    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The schedule request.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// The solver settings.
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn prepare(&self) -> Result<Prepared, ScheduleError> {
        let teams = self.provider.teams()?;
        let rooms = self.provider.rooms()?;
        let tables = self.provider.tables()?;

        validate_input(&self.config, &self.settings, &teams, &rooms, &tables)
            .map_err(ScheduleError::InvalidInput)?;

        let timelines = build_timelines(&self.config, teams.len(), rooms.len(), tables.len());
        let entries = Validator::new(
            &timelines.sessions.windows,
            &timelines.matches.windows,
            self.settings.min_gap_ms(),
        )
        .validate()?;

        info!(
            division = %self.config.division_id,
            teams = teams.len(),
            sessions = timelines.sessions.windows.len(),
            matches = timelines.matches.windows.len(),
            "prepared schedule inputs"
        );

        Ok(Prepared {
            teams,
            rooms,
            tables,
            timelines,
            entries,
        })
    }

    /// Runs every check without solving.
    ///
    /// Returns the validator's per-session diagnostic.
    pub fn validate(&self) -> Result<Vec<ValidatorEntry>, ScheduleError> {
        self.prepare().map(|p| p.entries)
    }

    /// Generates a schedule.
    pub fn generate(&self) -> Result<Schedule, ScheduleError> {
        self.generate_with_stop(&AtomicBool::new(false))
    }

    /// Generates a schedule, checking `stop` between attempts.
    pub fn generate_with_stop(&self, stop: &AtomicBool) -> Result<Schedule, ScheduleError> {
        let prepared = self.prepare()?;
        let seed = self.config.seed.unwrap_or_else(|| {
            let seed = rand::rng().random();
            info!(seed, "no seed configured, drew one");
            seed
        });

        let input = SolverInput {
            teams: &prepared.teams,
            rooms: &prepared.rooms,
            tables: &prepared.tables,
            sessions: &prepared.timelines.sessions.windows,
            matches: &prepared.timelines.matches.windows,
            entries: &prepared.entries,
        };
        let solver = AssignmentSolver::new(input, &self.settings);
        let best = MultiAttemptOptimizer::new(solver, &self.settings, seed).run(stop)?;

        info!(
            division = %self.config.division_id,
            seed,
            attempt = best.index,
            attempts = best.attempts,
            min_gap_ms = best.attempt.score.min_gap_ms,
            "schedule generated"
        );

        let Prepared {
            teams,
            rooms,
            tables,
            timelines,
            ..
        } = prepared;
        Ok(Schedule {
            division_id: self.config.division_id.clone(),
            teams,
            rooms,
            tables,
            sessions: timelines.sessions.windows,
            matches: timelines.matches.windows,
            session_grid: best.attempt.session_grid,
            match_grid: best.attempt.match_grid,
            score: best.attempt.score,
            seed,
            attempt: best.index,
        })
    }
}

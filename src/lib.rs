//! Tournament timetable generation.
//!
//! Builds conflict-free judging and robot-game timetables for one
//! division: every team visits one judging room and plays one match per
//! round, never double-booked, with a minimum gap between any two of its
//! events and a cap on how often it reuses the same table.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Team`, `Location`, `Window`, `Grid`,
//!   `ScheduleConfig`, `Schedule`, session/match tables
//! - **`timeline`**: Session and match windows from per-stage parameters
//! - **`validation`**: Input integrity checks (duplicate IDs, durations, breaks)
//! - **`validator`**: Session/match gap feasibility with per-round diagnostics
//! - **`scheduler`**: Assignment solver, multi-attempt optimizer, gap KPIs
//! - **`provider`**: Roster provider seam
//! - **`generator`**: The end-to-end pipeline
//! - **`error`**: Typed scheduling failures
//!
//! # Pipeline
//!
//! ```text
//! RosterProvider ─► validate_input ─► build_timelines ─► Validator
//!                                                          │
//!        Schedule ◄── MultiAttemptOptimizer ◄── AssignmentSolver
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"

pub mod error;
pub mod generator;
pub mod models;
pub mod provider;
pub mod scheduler;
pub mod timeline;
pub mod validation;
pub mod validator;

pub use error::ScheduleError;
pub use generator::ScheduleGenerator;

//! Tournament scheduling domain models.
//!
//! Provides the core data types for describing a division's timetable
//! problem and its solution.
//!
//! # Domain Mappings
//!
//! | u-tournament | Judging | Robot Game |
//! |--------------|---------|------------|
//! | Location | Room | Table |
//! | Window | Session | Match |
//! | Stage | judging | practice / ranking |
//! | Grid | session × room | match × table |

mod config;
mod grid;
mod location;
pub(crate) mod schedule;
mod table;
mod team;
mod window;

pub use config::{Break, BreakPhase, ScheduleConfig, SolverSettings};
pub(crate) use config::seconds_to_ms;
pub use grid::Grid;
pub use location::{Location, LocationKind};
pub use schedule::{Assignment, Schedule};
pub use table::{AssignmentMap, CellKey, MatchRow, MatchTable, ScheduleTables, SessionRow, SessionTable};
pub use team::{Team, TeamHandle};
pub use window::{Stage, TimeWindow, Window};

//! Team assignment, attempt optimization, and KPI evaluation.
//!
//! # Algorithm
//!
//! `AssignmentSolver` runs one randomized attempt: judging sessions first,
//! then validator-seeded reservations, then round by round a chronological
//! greedy fill. A maximum-weight assignment completes any round the greedy
//! pass leaves short. Scores are not optimal, but a round fails only when
//! no complete assignment of it exists, and every result seats each team
//! once per round and, outside permissive mode, keeps the minimum gap.
//!
//! `MultiAttemptOptimizer` repeats attempts in parallel batches under
//! independent seeded streams, skips attempts that dead-end, and keeps
//! the best-scoring one.
//!
//! # KPI
//!
//! `ScheduleKpi` scores a schedule by the smallest idle gap any team gets
//! between two of its events, with the mean gap as a tie-breaker.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Burke et al. (2004), "The state of the art of nurse rostering"

mod kpi;
mod optimizer;
mod solver;

pub use kpi::{ScheduleKpi, ScheduleScore, TeamGaps};
pub use optimizer::{attempt_rng, BestAttempt, MultiAttemptOptimizer};
pub use solver::{AssignmentSolver, Attempt, SolverInput};

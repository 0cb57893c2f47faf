//! Scheduling failures.
//!
//! Every fatal condition reaches the caller as one typed
//! [`ScheduleError`]. The attempt loop retries only what a fresh random
//! draw can change: score variance and dead-ended attempts. Everything
//! else aborts the run.
//!
//! | Variant | Raised by | Retry? |
//! |---------|-----------|--------|
//! | `InvalidInput` | input validation | fix the request |
//! | `ValidationInfeasible` | feasibility validator | fix the request |
//! | `GapConstraintUnsatisfiable` | solver fill | next attempt; surfaced when all dead-end |
//! | `StructuralViolation` | solver post-check | never (defect) |
//! | `ScheduleQualityNotReached` | attempt loop | relax the threshold |
//! | `UpstreamDataUnavailable` | roster provider | retry the fetch |
//! | `Cancelled` | stop flag | caller's choice |

use thiserror::Error;

use crate::models::Stage;
use crate::provider::ProviderError;
use crate::validation::ValidationError;
use crate::validator::ValidatorEntry;

/// A typed scheduling failure.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Roster or configuration failed integrity checks.
    #[error("invalid schedule input ({} issue(s)): {}", .0.len(), summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A session's padded window leaves too little compatible match capacity.
    #[error(
        "session {session} does not have enough matches to fill all slots \
         in {stage} round {round} ({available} of {required} slots)"
    )]
    ValidationInfeasible {
        /// Session number.
        session: u32,
        /// Stage of the short round.
        stage: Stage,
        /// Round number within the stage.
        round: u32,
        /// Candidate slots left after cross-referencing.
        available: usize,
        /// Slots the session needs.
        required: usize,
        /// Full per-session / per-round diagnostic.
        diagnostic: Vec<ValidatorEntry>,
    },

    /// No complete assignment of a round keeps the minimum gap and the
    /// table visit limit. The named cell is the first one left empty.
    #[error(
        "no team can play {stage} match {number} (round {round}) at table {location} \
         within the minimum gap and table visit limit"
    )]
    GapConstraintUnsatisfiable {
        /// Stage of the match.
        stage: Stage,
        /// Round number within the stage.
        round: u32,
        /// Match number.
        number: u32,
        /// Table ID.
        location: String,
    },

    /// A team is missing from, or duplicated in, a round.
    #[error("team {team} appears {occurrences} time(s) in {stage} round {round}")]
    StructuralViolation {
        /// Stage of the round.
        stage: Stage,
        /// Round number within the stage.
        round: u32,
        /// Team ID.
        team: String,
        /// How often the team was placed (expected exactly once).
        occurrences: usize,
    },

    /// Attempt budget exhausted below the minimum acceptable score.
    #[error(
        "no acceptable schedule found after {attempts} attempt(s) \
         (required minimum gap {required_ms} ms, best {best_min_gap_ms:?} ms)"
    )]
    ScheduleQualityNotReached {
        /// Attempts run.
        attempts: u32,
        /// Required minimum per-team gap (ms).
        required_ms: i64,
        /// Best minimum gap reached, if any attempt finished.
        best_min_gap_ms: Option<i64>,
    },

    /// The roster provider failed.
    #[error("roster data unavailable: {0}")]
    UpstreamDataUnavailable(#[from] ProviderError),

    /// The stop flag was raised between attempts.
    #[error("schedule generation cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts completed before cancellation.
        attempts: u32,
    },
}

impl ScheduleError {
    /// Whether the caller should retry the roster fetch rather than the solve.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ScheduleError::UpstreamDataUnavailable(_))
    }

    /// Whether the failure points at a solver defect rather than the input.
    pub fn is_internal(&self) -> bool {
        matches!(self, ScheduleError::StructuralViolation { .. })
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

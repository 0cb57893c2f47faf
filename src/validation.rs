//! Input validation for schedule requests.
//!
//! Checks structural integrity of the roster and configuration before
//! any timeline is built. Detects:
//! - Duplicate team, room, or table IDs
//! - Empty rosters and location pools
//! - Zero-length events and cycles shorter than the event they space
//! - Requests without any match round
//! - Breaks pointing past the last event they could follow
//! - Unusable solver settings
//!
//! All issues are collected; nothing is reported one at a time.

use crate::models::{BreakPhase, Location, ScheduleConfig, SolverSettings, Team};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// The division has no teams.
    EmptyRoster,
    /// No rooms or no tables.
    EmptyLocationPool,
    /// An event length or cycle time is zero.
    InvalidDuration,
    /// Events would overlap at the same location.
    CycleShorterThanEvent,
    /// Practice and ranking rounds are both zero.
    NoMatchRounds,
    /// A break is zero-length or follows a nonexistent event.
    InvalidBreak,
    /// Attempt bounds or selection breadth are unusable.
    InvalidSolverSetting,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

fn check_unique<'a>(
    label: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {label} ID: {id}"),
            ));
        }
    }
}

/// Validates a schedule request.
///
/// Checks:
/// 1. No duplicate team, room, or table IDs
/// 2. At least one team, one room, and one table
/// 3. Event lengths and cycle times are positive
/// 4. Each cycle time is at least its event length
/// 5. At least one practice or ranking round
/// 6. Breaks are positive and follow an event that exists
/// 7. Solver settings are usable
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    config: &ScheduleConfig,
    settings: &SolverSettings,
    teams: &[Team],
    rooms: &[Location],
    tables: &[Location],
) -> ValidationResult {
    let mut errors = Vec::new();

    check_unique("team", teams.iter().map(|t| t.id.as_str()), &mut errors);
    check_unique("room", rooms.iter().map(|r| r.id.as_str()), &mut errors);
    check_unique("table", tables.iter().map(|t| t.id.as_str()), &mut errors);

    if teams.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            format!("Division '{}' has no teams", config.division_id),
        ));
    }
    if rooms.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyLocationPool,
            "No judging rooms",
        ));
    }
    if tables.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyLocationPool,
            "No robot-game tables",
        ));
    }

    let durations = [
        ("judging session length", config.judging_session_length_seconds),
        ("judging cycle time", config.judging_cycle_time_seconds),
        ("match length", config.match_length_seconds),
        ("practice cycle time", config.practice_match_cycle_time_seconds),
        ("ranking cycle time", config.ranking_match_cycle_time_seconds),
    ];
    for (name, seconds) in durations {
        if seconds == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!("{name} must be positive"),
            ));
        }
    }

    let cycles = [
        (
            "judging",
            config.judging_cycle_time_seconds,
            config.judging_session_length_seconds,
        ),
        (
            "practice",
            config.practice_match_cycle_time_seconds,
            config.match_length_seconds,
        ),
        (
            "ranking",
            config.ranking_match_cycle_time_seconds,
            config.match_length_seconds,
        ),
    ];
    for (name, cycle, length) in cycles {
        if cycle < length {
            errors.push(ValidationError::new(
                ValidationErrorKind::CycleShorterThanEvent,
                format!("{name} cycle time {cycle}s is shorter than the event length {length}s"),
            ));
        }
    }

    if config.total_match_rounds() == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoMatchRounds,
            "At least one practice or ranking round is required",
        ));
    }

    // Upper bounds on event numbers; exact counts depend on timeline sizing.
    let sessions = if rooms.is_empty() {
        0
    } else {
        teams.len().div_ceil(rooms.len())
    };
    let matches = teams.len() * config.total_match_rounds() as usize;
    for brk in &config.breaks {
        if brk.duration_seconds == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBreak,
                format!("Break after {:?} event {} has zero length", brk.phase, brk.after),
            ));
        }
        let last = match brk.phase {
            BreakPhase::Judging => sessions,
            BreakPhase::Match => matches,
        };
        if brk.after == 0 || brk.after as usize > last {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidBreak,
                format!(
                    "Break after {:?} event {} does not follow a scheduled event",
                    brk.phase, brk.after
                ),
            ));
        }
    }

    if settings.max_attempts == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSolverSetting,
            "max_attempts must be positive",
        ));
    }
    if settings.min_attempts > settings.max_attempts {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSolverSetting,
            format!(
                "min_attempts {} exceeds max_attempts {}",
                settings.min_attempts, settings.max_attempts
            ),
        ));
    }
    if settings.top_k == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSolverSetting,
            "top_k must be positive",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

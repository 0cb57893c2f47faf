//! Schedule generation configuration.
//!
//! [`ScheduleConfig`] is the per-division request consumed verbatim from
//! the caller (field names match the scheduler request on the wire).
//! [`SolverSettings`] holds the solver knobs that are not part of the
//! request: minimum gap, attempt budget, score threshold, and selection
//! breadth.
//!
//! # Example
//!
//! ```
//! use u_tournament::models::ScheduleConfig;
//!
//! let json = r#"{
//!     "division_id": "div-1",
//!     "matches_start": "2024-03-01T10:00:00Z",
//!     "practice_rounds": 1,
//!     "ranking_rounds": 3,
//!     "match_length_seconds": 150,
//!     "practice_match_cycle_time_seconds": 600,
//!     "ranking_match_cycle_time_seconds": 480,
//!     "stagger_matches": false,
//!     "judging_start": "2024-03-01T08:30:00Z",
//!     "judging_session_length_seconds": 1800,
//!     "judging_cycle_time_seconds": 2400,
//!     "breaks": [{ "event_type": "judging", "after": 2, "duration_seconds": 900 }]
//! }"#;
//! let config = ScheduleConfig::from_json(json).unwrap();
//! assert_eq!(config.total_match_rounds(), 4);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Stage;

/// Which event family a break shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakPhase {
    /// Shifts judging sessions only.
    Judging,
    /// Shifts matches (practice and ranking) only.
    Match,
}

impl BreakPhase {
    /// The phase a stage's breaks are keyed by.
    pub fn of(stage: Stage) -> Self {
        match stage {
            Stage::Judging => BreakPhase::Judging,
            Stage::Practice | Stage::Ranking => BreakPhase::Match,
        }
    }
}

/// A pause inserted after a specific event of a phase.
///
/// `after` is the 1-based session number (judging) or global match number
/// (matches). Breaks are cumulative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    /// Phase this break shifts.
    #[serde(rename = "event_type", alias = "phase")]
    pub phase: BreakPhase,
    /// Event number after which the break starts.
    pub after: u32,
    /// Break duration (seconds).
    pub duration_seconds: u32,
}

impl Break {
    /// Creates a judging break.
    pub fn judging(after: u32, duration_seconds: u32) -> Self {
        Self {
            phase: BreakPhase::Judging,
            after,
            duration_seconds,
        }
    }

    /// Creates a match break.
    pub fn matches(after: u32, duration_seconds: u32) -> Self {
        Self {
            phase: BreakPhase::Match,
            after,
            duration_seconds,
        }
    }

    /// Duration in milliseconds.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        seconds_to_ms(self.duration_seconds)
    }
}

/// Schedule request for one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Division being scheduled.
    pub division_id: String,
    /// First match start.
    pub matches_start: DateTime<Utc>,
    /// Number of practice rounds.
    pub practice_rounds: u32,
    /// Number of ranking rounds.
    pub ranking_rounds: u32,
    /// Match length (seconds).
    pub match_length_seconds: u32,
    /// Start-to-start spacing of practice matches (seconds).
    pub practice_match_cycle_time_seconds: u32,
    /// Start-to-start spacing of ranking matches (seconds).
    pub ranking_match_cycle_time_seconds: u32,
    /// Alternate matches between the two halves of the table pool.
    #[serde(default)]
    pub stagger_matches: bool,
    /// First judging session start.
    pub judging_start: DateTime<Utc>,
    /// Judging session length (seconds).
    pub judging_session_length_seconds: u32,
    /// Start-to-start spacing of judging sessions (seconds).
    pub judging_cycle_time_seconds: u32,
    /// Ordered break directives.
    #[serde(default)]
    pub breaks: Vec<Break>,
    /// Explicit random seed; drawn once and logged when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Display timezone (IANA name). Carried through, never used for solving.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ScheduleConfig {
    /// Parses a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Practice plus ranking rounds.
    pub fn total_match_rounds(&self) -> u32 {
        self.practice_rounds + self.ranking_rounds
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Adds a break directive.
    pub fn with_break(mut self, brk: Break) -> Self {
        self.breaks.push(brk);
        self
    }
}

/// Solver knobs.
///
/// Defaults mirror the tournament defaults: a 15-minute minimum gap
/// between any two events of a team, up to 50 attempts, and the top three
/// longest-waiting teams as the random pick set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Minimum gap between two events of the same team (seconds).
    pub min_gap_seconds: u32,
    /// Attempts to run before a result may be accepted.
    pub min_attempts: u32,
    /// Attempt budget.
    pub max_attempts: u32,
    /// Minimum acceptable schedule score: smallest per-team gap (seconds).
    pub min_score_seconds: u32,
    /// Number of longest-waiting candidates to pick from at random.
    pub top_k: usize,
    /// Relax the gap constraint instead of failing when no team fits.
    pub permissive: bool,
    /// Attempts run in parallel per batch.
    pub parallelism: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            min_gap_seconds: 15 * 60,
            min_attempts: 1,
            max_attempts: 50,
            min_score_seconds: 0,
            top_k: 3,
            permissive: false,
            parallelism: 4,
        }
    }
}

impl SolverSettings {
    /// Creates the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum gap (seconds).
    pub fn with_min_gap(mut self, seconds: u32) -> Self {
        self.min_gap_seconds = seconds;
        self
    }

    /// Sets the attempt bounds.
    pub fn with_attempts(mut self, min_attempts: u32, max_attempts: u32) -> Self {
        self.min_attempts = min_attempts;
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the minimum acceptable score (seconds).
    pub fn with_min_score(mut self, seconds: u32) -> Self {
        self.min_score_seconds = seconds;
        self
    }

    /// Sets the random pick breadth.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Enables permissive gap handling.
    pub fn with_permissive(mut self, permissive: bool) -> Self {
        self.permissive = permissive;
        self
    }

    /// Sets the number of attempts run per parallel batch.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Minimum gap in milliseconds.
    #[inline]
    pub fn min_gap_ms(&self) -> i64 {
        seconds_to_ms(self.min_gap_seconds)
    }

    /// Minimum acceptable score in milliseconds.
    #[inline]
    pub fn min_score_ms(&self) -> i64 {
        seconds_to_ms(self.min_score_seconds)
    }
}

/// Converts whole seconds to milliseconds.
#[inline]
pub(crate) fn seconds_to_ms(seconds: u32) -> i64 {
    i64::from(seconds) * 1000
}

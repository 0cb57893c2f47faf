//! Time window models.
//!
//! Every schedulable event in a tournament (judging session, practice match,
//! ranking match) occupies a [`Window`]: a half-open time interval tagged
//! with its stage, round, ordinal number, and the locations it spans.
//!
//! # Time Model
//! All times are in milliseconds since the Unix epoch. Conversion to and
//! from wall-clock timestamps happens at the configuration and table
//! boundary only.
//!
//! # Padding
//! Two windows are *separated by* a gap `g` when one ends at least `g`
//! before the other starts. The comparison is inclusive: a gap of exactly
//! `g` is accepted. Padding is applied symmetrically, so separation does
//! not depend on which window comes first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tournament stage.
///
/// A single stage enum drives timeline construction, break lookup,
/// visit limits, and table formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Judging sessions in rooms.
    Judging,
    /// Practice matches at tables.
    Practice,
    /// Ranking matches at tables.
    Ranking,
}

impl Stage {
    /// All stages in chronological processing order.
    pub const ALL: [Stage; 3] = [Stage::Judging, Stage::Practice, Stage::Ranking];

    /// Dense index for per-stage lookup tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Stage::Judging => 0,
            Stage::Practice => 1,
            Stage::Ranking => 2,
        }
    }

    /// Whether this stage is played at tables.
    #[inline]
    pub fn is_match(self) -> bool {
        !matches!(self, Stage::Judging)
    }

    /// Lowercase name, as used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Judging => "judging",
            Stage::Practice => "practice",
            Stage::Ranking => "ranking",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (ms, inclusive).
    pub start_ms: i64,
    /// Interval end (ms, exclusive).
    pub end_ms: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Duration of this window (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_ms < other.end_ms && other.start_ms < self.end_ms
    }

    /// This window widened by `padding_ms` on both sides.
    ///
    /// Negative padding is treated as zero.
    pub fn padded(&self, padding_ms: i64) -> Self {
        let pad = padding_ms.max(0);
        Self::new(self.start_ms - pad, self.end_ms + pad)
    }

    /// Whether the two windows are at least `gap_ms` apart (inclusive).
    ///
    /// Equivalent to: the other window does not overlap this window
    /// padded by `gap_ms`.
    pub fn is_separated_from(&self, other: &Self, gap_ms: i64) -> bool {
        !self.padded(gap_ms).overlaps(other)
    }

    /// Signed gap between the end of the earlier window and the start of
    /// the later one. Negative when the windows overlap.
    pub fn gap_to(&self, other: &Self) -> i64 {
        if self.start_ms <= other.start_ms {
            other.start_ms - self.end_ms
        } else {
            self.start_ms - other.end_ms
        }
    }
}

/// One scheduled event slot: a session or a match.
///
/// `locations` holds indices into the stage's location pool (rooms for
/// judging, tables for matches). A staggered match spans only half of the
/// table pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Stage this window belongs to.
    pub stage: Stage,
    /// Round within the stage (1-based). Judging has a single round.
    pub round: u32,
    /// Ordinal number (1-based). Session number for judging, global match
    /// number for matches.
    pub number: u32,
    /// Time interval.
    pub time: TimeWindow,
    /// Location indices this window spans.
    pub locations: Vec<usize>,
}

impl Window {
    /// Creates a new window.
    pub fn new(stage: Stage, round: u32, number: u32, time: TimeWindow) -> Self {
        Self {
            stage,
            round,
            number,
            time,
            locations: Vec::new(),
        }
    }

    /// Sets the locations this window spans.
    pub fn with_locations(mut self, locations: Vec<usize>) -> Self {
        self.locations = locations;
        self
    }

    /// Number of team slots in this window.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.locations.len()
    }

    /// Start time (ms).
    #[inline]
    pub fn start_ms(&self) -> i64 {
        self.time.start_ms
    }

    /// End time (ms).
    #[inline]
    pub fn end_ms(&self) -> i64 {
        self.time.end_ms
    }
}

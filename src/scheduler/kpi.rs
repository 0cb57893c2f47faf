//! Schedule quality metrics (KPIs).
//!
//! Scores a schedule by the idle time each team gets between consecutive
//! events. The solver uses the same metric to rank attempts.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Team min gap | Smallest end-to-next-start gap of one team |
//! | Team mean gap | Mean end-to-next-start gap of one team |
//! | Schedule min gap | Smallest team min gap (primary score) |
//! | Schedule mean gap | Mean of team mean gaps (tie-breaker) |
//!
//! Overlapping events yield a gap of zero, never a negative one. Teams with
//! fewer than two events have no gaps and do not affect the score.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{Schedule, TimeWindow};

/// Gap statistics of one team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGaps {
    /// Team index in the roster.
    pub team: usize,
    /// Events the team attends.
    pub events: usize,
    /// Smallest gap (ms).
    pub min_gap_ms: i64,
    /// Mean gap (ms).
    pub mean_gap_ms: f64,
}

/// Aggregate schedule score. Larger is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleScore {
    /// Smallest per-team gap (ms). `i64::MAX` when no team has two events.
    pub min_gap_ms: i64,
    /// Mean of per-team mean gaps (ms).
    pub mean_gap_ms: f64,
}

impl ScheduleScore {
    /// Orders by min gap, then mean gap.
    pub fn cmp_quality(&self, other: &Self) -> Ordering {
        self.min_gap_ms
            .cmp(&other.min_gap_ms)
            .then_with(|| self.mean_gap_ms.total_cmp(&other.mean_gap_ms))
    }

    /// Whether the score reaches a required minimum gap.
    pub fn meets(&self, min_gap_ms: i64) -> bool {
        self.min_gap_ms >= min_gap_ms
    }
}

/// Schedule performance indicators.
///
/// All time values are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Aggregate score.
    pub score: ScheduleScore,
    /// Per-team statistics for teams with at least two events.
    pub teams: Vec<TeamGaps>,
}

/// Gap statistics of one team's events, if it has at least two.
fn team_gaps(team: usize, events: &[TimeWindow]) -> Option<TeamGaps> {
    if events.len() < 2 {
        return None;
    }
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|w| (w.start_ms, w.end_ms));

    let gaps: Vec<i64> = sorted
        .windows(2)
        .map(|pair| pair[0].gap_to(&pair[1]).max(0))
        .collect();
    let min_gap_ms = gaps.iter().copied().min()?;
    let mean_gap_ms = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;

    Some(TeamGaps {
        team,
        events: events.len(),
        min_gap_ms,
        mean_gap_ms,
    })
}

impl ScheduleKpi {
    /// Computes KPIs from each team's event windows (indexed by team).
    pub fn from_events(events: &[Vec<TimeWindow>]) -> Self {
        let teams: Vec<TeamGaps> = events
            .iter()
            .enumerate()
            .filter_map(|(team, windows)| team_gaps(team, windows))
            .collect();

        let min_gap_ms = teams
            .iter()
            .map(|t| t.min_gap_ms)
            .min()
            .unwrap_or(i64::MAX);
        let mean_gap_ms = if teams.is_empty() {
            0.0
        } else {
            teams.iter().map(|t| t.mean_gap_ms).sum::<f64>() / teams.len() as f64
        };

        Self {
            score: ScheduleScore {
                min_gap_ms,
                mean_gap_ms,
            },
            teams,
        }
    }

    /// Computes KPIs from a solved schedule's grids.
    pub fn calculate(schedule: &Schedule) -> Self {
        let mut events = vec![Vec::new(); schedule.teams.len()];
        let grids = [
            (&schedule.sessions, &schedule.session_grid),
            (&schedule.matches, &schedule.match_grid),
        ];
        for (windows, grid) in grids {
            for (w, _, team) in grid.occupied() {
                if let (Some(window), Some(slot)) = (windows.get(w), events.get_mut(team)) {
                    slot.push(window.time);
                }
            }
        }
        Self::from_events(&events)
    }

    /// Statistics of one team, if it has at least two events.
    pub fn team(&self, team: usize) -> Option<&TeamGaps> {
        self.teams.iter().find(|t| t.team == team)
    }

    /// Whether the schedule meets the given minimum gap.
    pub fn meets_threshold(&self, min_gap_ms: i64) -> bool {
        self.score.meets(min_gap_ms)
    }
}

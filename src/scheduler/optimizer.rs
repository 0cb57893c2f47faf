//! Multi-attempt optimization.
//!
//! Solver attempts differ only in their random draws, so the loop runs
//! them in parallel batches and keeps the best feasible one.
//!
//! # Algorithm
//!
//! 1. Attempt `i` draws from `ChaCha8Rng::seed_from_u64(seed)` on stream
//!    `i`. Attempts share nothing mutable.
//! 2. Run `parallelism` attempts at a time with rayon, then fold their
//!    results in index order.
//! 3. Keep the best score (min gap, then mean gap). On ties the earlier
//!    attempt wins.
//! 4. Stop once at least `min_attempts` ran and the best score reaches
//!    `min_score`; fail once `max_attempts` ran without reaching it.
//!
//! Folding in index order makes the outcome independent of batch size.
//! An attempt that runs into a round with no complete assignment is a
//! dead end: the loop drops it and moves on, and reports the first dead
//! end only when no attempt succeeded. Any other attempt error aborts
//! the run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::cmp::Ordering as Quality;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::solver::{AssignmentSolver, Attempt};
use crate::error::ScheduleError;
use crate::models::SolverSettings;

/// Random source of attempt `index` for a run seeded with `seed`.
pub fn attempt_rng(seed: u64, index: u32) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(u64::from(index));
    rng
}

/// The accepted attempt of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BestAttempt {
    /// Index of the accepted attempt.
    pub index: u32,
    /// Attempts evaluated before stopping.
    pub attempts: u32,
    /// The attempt itself.
    pub attempt: Attempt,
}

/// Runs solver attempts until one is good enough.
#[derive(Debug, Clone)]
pub struct MultiAttemptOptimizer<'a> {
    solver: AssignmentSolver<'a>,
    settings: &'a SolverSettings,
    seed: u64,
}

impl<'a> MultiAttemptOptimizer<'a> {
    /// Creates an optimizer for a solver and base seed.
    pub fn new(solver: AssignmentSolver<'a>, settings: &'a SolverSettings, seed: u64) -> Self {
        Self {
            solver,
            settings,
            seed,
        }
    }

    /// Base seed of the run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs attempts until acceptance, exhaustion, error, or cancellation.
    ///
    /// # Errors
    /// - The first [`ScheduleError::GapConstraintUnsatisfiable`] (in index
    ///   order) when every attempt dead-ended.
    /// - Any other attempt error, at once.
    /// - [`ScheduleError::Cancelled`] once `stop` is raised.
    /// - [`ScheduleError::ScheduleQualityNotReached`] when the budget runs
    ///   out below the minimum score.
    pub fn run(&self, stop: &AtomicBool) -> Result<BestAttempt, ScheduleError> {
        let max_attempts = self.settings.max_attempts;
        let min_attempts = self.settings.min_attempts;
        let required_ms = self.settings.min_score_ms();
        let batch = self.settings.parallelism.max(1) as u32;

        let mut best: Option<(u32, Attempt)> = None;
        let mut dead_end: Option<ScheduleError> = None;
        let mut done: u32 = 0;

        while done < max_attempts {
            if stop.load(Ordering::Relaxed) {
                warn!(attempts = done, "schedule generation cancelled");
                return Err(ScheduleError::Cancelled { attempts: done });
            }

            let end = done.saturating_add(batch).min(max_attempts);
            let results: Vec<(u32, Result<Attempt, ScheduleError>)> = (done..end)
                .into_par_iter()
                .map(|i| {
                    if stop.load(Ordering::Relaxed) {
                        return (i, Err(ScheduleError::Cancelled { attempts: i }));
                    }
                    let mut rng = attempt_rng(self.seed, i);
                    (i, self.solver.attempt(&mut rng))
                })
                .collect();

            for (i, result) in results {
                done = i + 1;
                let attempt = match result {
                    Ok(attempt) => attempt,
                    Err(e @ ScheduleError::GapConstraintUnsatisfiable { .. }) => {
                        debug!(attempt = i, error = %e, "attempt reached a dead end");
                        if dead_end.is_none() {
                            dead_end = Some(e);
                        }
                        continue;
                    }
                    Err(e) => {
                        warn!(attempt = i, error = %e, "attempt failed");
                        return Err(e);
                    }
                };
                debug!(
                    attempt = i,
                    min_gap_ms = attempt.score.min_gap_ms,
                    mean_gap_ms = attempt.score.mean_gap_ms,
                    "attempt scored"
                );

                let improves = best.as_ref().map_or(true, |(_, b)| {
                    attempt.score.cmp_quality(&b.score) == Quality::Greater
                });
                if improves {
                    best = Some((i, attempt));
                }

                if let Some((index, accepted)) = &best {
                    if done >= min_attempts && accepted.score.meets(required_ms) {
                        info!(
                            attempt = *index,
                            attempts = done,
                            min_gap_ms = accepted.score.min_gap_ms,
                            "accepted schedule"
                        );
                        return Ok(BestAttempt {
                            index: *index,
                            attempts: done,
                            attempt: accepted.clone(),
                        });
                    }
                }
            }
        }

        if best.is_none() {
            if let Some(e) = dead_end {
                warn!(attempts = done, error = %e, "every attempt reached a dead end");
                return Err(e);
            }
        }

        let best_min_gap_ms = best.map(|(_, b)| b.score.min_gap_ms);
        warn!(
            attempts = done,
            required_ms,
            best_min_gap_ms = ?best_min_gap_ms,
            "no acceptable schedule found"
        );
        Err(ScheduleError::ScheduleQualityNotReached {
            attempts: done,
            required_ms,
            best_min_gap_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScheduleConfig, Stage};
    use crate::provider::{InMemoryRoster, RosterProvider};
    use crate::scheduler::solver::SolverInput;
    use crate::timeline::{build_timelines, ScheduleTimelines};
    use crate::validator::{Validator, ValidatorEntry};
    use chrono::{TimeZone, Utc};

    struct Problem {
        roster: InMemoryRoster,
        timelines: ScheduleTimelines,
        entries: Vec<ValidatorEntry>,
    }

    fn config() -> ScheduleConfig {
        ScheduleConfig {
            division_id: "div".into(),
            matches_start: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            practice_rounds: 1,
            ranking_rounds: 1,
            match_length_seconds: 300,
            practice_match_cycle_time_seconds: 1200,
            ranking_match_cycle_time_seconds: 1200,
            stagger_matches: false,
            judging_start: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            judging_session_length_seconds: 1800,
            judging_cycle_time_seconds: 3600,
            breaks: Vec::new(),
            seed: None,
            timezone: None,
        }
    }

    fn problem_with(config: &ScheduleConfig, teams: usize, rooms: usize, tables: usize) -> Problem {
        let roster = InMemoryRoster::numbered(teams, rooms, tables);
        let timelines = build_timelines(config, teams, rooms, tables);
        let entries = Validator::new(
            &timelines.sessions.windows,
            &timelines.matches.windows,
            900_000,
        )
        .validate()
        .unwrap();
        Problem {
            roster,
            timelines,
            entries,
        }
    }

    fn problem() -> Problem {
        problem_with(&config(), 8, 4, 2)
    }

    fn run(
        p: &Problem,
        settings: &SolverSettings,
        seed: u64,
        stop: &AtomicBool,
    ) -> Result<BestAttempt, ScheduleError> {
        let teams = p.roster.teams().unwrap();
        let rooms = p.roster.rooms().unwrap();
        let tables = p.roster.tables().unwrap();
        let input = SolverInput {
            teams: &teams,
            rooms: &rooms,
            tables: &tables,
            sessions: &p.timelines.sessions.windows,
            matches: &p.timelines.matches.windows,
            entries: &p.entries,
        };
        MultiAttemptOptimizer::new(AssignmentSolver::new(input, settings), settings, seed).run(stop)
    }

    #[test]
    fn test_problem_shape() {
        let p = problem();
        assert_eq!(p.timelines.sessions.windows.len(), 2);
        assert_eq!(p.timelines.matches.windows.len(), 8);
        assert_eq!(p.timelines.matches.windows[4].stage, Stage::Ranking);
    }

    #[test]
    fn test_stops_after_min_attempts() {
        let p = problem();
        let settings = SolverSettings::default().with_attempts(3, 10);
        let best = run(&p, &settings, 11, &AtomicBool::new(false)).unwrap();
        assert_eq!(best.attempts, 3);
        assert!(best.index < 3);
        assert!(best.attempt.score.min_gap_ms >= 900_000);
    }

    #[test]
    fn test_batch_size_does_not_change_result() {
        let p = problem();
        let serial = SolverSettings::default().with_attempts(5, 5).with_parallelism(1);
        let parallel = SolverSettings::default().with_attempts(5, 5).with_parallelism(4);
        let a = run(&p, &serial, 99, &AtomicBool::new(false)).unwrap();
        let b = run(&p, &parallel, 99, &AtomicBool::new(false)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_best_attempt_wins_earliest_on_ties() {
        let p = problem();
        let settings = SolverSettings::default().with_attempts(4, 4);
        let best = run(&p, &settings, 5, &AtomicBool::new(false)).unwrap();

        let teams = p.roster.teams().unwrap();
        let rooms = p.roster.rooms().unwrap();
        let tables = p.roster.tables().unwrap();
        let solver = AssignmentSolver::new(
            SolverInput {
                teams: &teams,
                rooms: &rooms,
                tables: &tables,
                sessions: &p.timelines.sessions.windows,
                matches: &p.timelines.matches.windows,
                entries: &p.entries,
            },
            &settings,
        );
        let scores: Vec<_> = (0..4)
            .map(|i| solver.attempt(&mut attempt_rng(5, i)).unwrap().score)
            .collect();
        let expected = (0..4u32).fold(0u32, |acc, i| {
            if scores[i as usize].cmp_quality(&scores[acc as usize]) == Quality::Greater {
                i
            } else {
                acc
            }
        });
        assert_eq!(best.index, expected);
        assert_eq!(best.attempt.score, scores[expected as usize]);
    }

    #[test]
    fn test_quality_not_reached() {
        let p = problem();
        let settings = SolverSettings::default()
            .with_attempts(1, 3)
            .with_min_score(10 * 3600);
        let err = run(&p, &settings, 1, &AtomicBool::new(false)).unwrap_err();
        match err {
            ScheduleError::ScheduleQualityNotReached {
                attempts,
                required_ms,
                best_min_gap_ms,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(required_ms, 36_000_000);
                assert!(best_min_gap_ms.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_every_attempt_dead_ends() {
        // One table, two teams, matches back to back: round 2 never fits
        let config = ScheduleConfig {
            practice_rounds: 2,
            ranking_rounds: 0,
            practice_match_cycle_time_seconds: 300,
            judging_start: Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap(),
            ..config()
        };
        let p = problem_with(&config, 2, 1, 1);
        let settings = SolverSettings::default().with_attempts(1, 3);
        let err = run(&p, &settings, 4, &AtomicBool::new(false)).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::GapConstraintUnsatisfiable {
                stage: Stage::Practice,
                round: 2,
                ..
            }
        ));

        // Relaxing the gap turns the dead ends into schedules
        let settings = settings.with_permissive(true);
        let best = run(&p, &settings, 4, &AtomicBool::new(false)).unwrap();
        assert!(best.attempt.relaxed > 0);
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let p = problem();
        let settings = SolverSettings::default();
        let err = run(&p, &settings, 1, &AtomicBool::new(true)).unwrap_err();
        assert!(matches!(err, ScheduleError::Cancelled { attempts: 0 }));
    }

    #[test]
    fn test_attempt_streams_differ() {
        use rand::Rng;
        let a: u64 = attempt_rng(1, 0).random();
        let b: u64 = attempt_rng(1, 1).random();
        let c: u64 = attempt_rng(1, 0).random();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}

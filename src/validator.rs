//! Feasibility validation of session and match timelines.
//!
//! A team that attends a judging session can only play matches that are
//! at least the minimum gap away from it. For every session this module
//! finds the match rounds that come too close to the session, lists the
//! matches of each such round that remain compatible, and proves that
//! those matches offer enough slots to seat every team of the session.
//!
//! # Algorithm
//!
//! 1. Group match windows by (stage, round). A round *overlaps* a session
//!    when the round's span intersects the session padded by the minimum
//!    gap on both sides.
//! 2. For each overlapping round, a match is a *candidate* when it is
//!    separated from the session by at least the gap (inclusive).
//! 3. Cross-reference: a match claimed by several sessions stays only with
//!    the session whose tightest round has the fewest candidate slots
//!    (first session on ties) and is dropped from the others.
//! 4. Every overlapping round of every session must offer at least as many
//!    candidate slots as the session seats; otherwise fail with the full
//!    diagnostic.
//!
//! Rounds that never come near a session impose no constraint on its
//! teams and are not listed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::models::{Stage, TimeWindow, Window};

/// A match window that can host a team from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Index into the match timeline.
    pub window: usize,
    /// Global match number.
    pub number: u32,
    /// Match start (ms).
    pub start_ms: i64,
    /// Match end (ms).
    pub end_ms: i64,
    /// Team slots the match offers.
    pub slots: usize,
}

/// A match round whose span comes within the gap of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlappingRound {
    /// Practice or ranking.
    pub stage: Stage,
    /// Round number within the stage.
    pub round: u32,
    /// Start of the round's first match (ms).
    pub start_ms: i64,
    /// End of the round's last match (ms).
    pub end_ms: i64,
    /// Compatible matches in chronological order.
    pub candidates: Vec<CandidateMatch>,
}

impl OverlappingRound {
    /// Total slots over all candidate matches.
    pub fn candidate_slots(&self) -> usize {
        self.candidates.iter().map(|c| c.slots).sum()
    }

    /// Whether a match window is among the candidates.
    pub fn has_candidate(&self, window: usize) -> bool {
        self.candidates.iter().any(|c| c.window == window)
    }
}

/// Validation result for one judging session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    /// Index into the session timeline.
    pub session: usize,
    /// Session number.
    pub number: u32,
    /// Session start (ms).
    pub start_ms: i64,
    /// Session end (ms).
    pub end_ms: i64,
    /// Teams the session seats.
    pub capacity: usize,
    /// Overlapping rounds in (stage, round) order.
    pub rounds: Vec<OverlappingRound>,
}

impl ValidatorEntry {
    /// Candidate slots of the most constrained round, if any round overlaps.
    pub fn tightest_slots(&self) -> Option<usize> {
        self.rounds.iter().map(OverlappingRound::candidate_slots).min()
    }

    /// Whether a match window is a candidate in any round.
    pub fn claims(&self, window: usize) -> bool {
        self.rounds.iter().any(|r| r.has_candidate(window))
    }

    fn release(&mut self, window: usize) {
        for round in &mut self.rounds {
            round.candidates.retain(|c| c.window != window);
        }
    }
}

/// Match window indices grouped by (stage, round).
pub(crate) fn match_rounds(matches: &[Window]) -> BTreeMap<(Stage, u32), Vec<usize>> {
    let mut rounds: BTreeMap<(Stage, u32), Vec<usize>> = BTreeMap::new();
    for (i, w) in matches.iter().enumerate() {
        rounds.entry((w.stage, w.round)).or_default().push(i);
    }
    rounds
}

/// Session/match feasibility validator.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    sessions: &'a [Window],
    matches: &'a [Window],
    padding_ms: i64,
}

impl<'a> Validator<'a> {
    /// Creates a validator. Negative padding is treated as zero.
    pub fn new(sessions: &'a [Window], matches: &'a [Window], padding_ms: i64) -> Self {
        Self {
            sessions,
            matches,
            padding_ms: padding_ms.max(0),
        }
    }

    /// Overlapping rounds and candidates per session, before
    /// cross-referencing.
    pub fn overlaps(&self) -> Vec<ValidatorEntry> {
        let rounds = match_rounds(self.matches);
        self.sessions
            .iter()
            .enumerate()
            .map(|(s, session)| {
                let padded = session.time.padded(self.padding_ms);
                let overlapping = rounds
                    .iter()
                    .filter_map(|(&(stage, round), members)| {
                        let span = TimeWindow::new(
                            members
                                .iter()
                                .map(|&m| self.matches[m].start_ms())
                                .min()?,
                            members.iter().map(|&m| self.matches[m].end_ms()).max()?,
                        );
                        if !padded.overlaps(&span) {
                            return None;
                        }
                        let candidates = members
                            .iter()
                            .filter(|&&m| {
                                session
                                    .time
                                    .is_separated_from(&self.matches[m].time, self.padding_ms)
                            })
                            .map(|&m| {
                                let w = &self.matches[m];
                                CandidateMatch {
                                    window: m,
                                    number: w.number,
                                    start_ms: w.start_ms(),
                                    end_ms: w.end_ms(),
                                    slots: w.capacity(),
                                }
                            })
                            .collect();
                        Some(OverlappingRound {
                            stage,
                            round,
                            start_ms: span.start_ms,
                            end_ms: span.end_ms,
                            candidates,
                        })
                    })
                    .collect::<Vec<_>>();

                debug!(
                    session = session.number,
                    rounds = overlapping.len(),
                    "session overlaps match rounds"
                );

                ValidatorEntry {
                    session: s,
                    number: session.number,
                    start_ms: session.start_ms(),
                    end_ms: session.end_ms(),
                    capacity: session.capacity(),
                    rounds: overlapping,
                }
            })
            .collect()
    }

    /// Runs the full validation: overlaps, cross-reference, capacity check.
    ///
    /// # Errors
    /// [`ScheduleError::ValidationInfeasible`] for the first session round
    /// (in session order) that cannot seat the session's teams.
    pub fn validate(&self) -> Result<Vec<ValidatorEntry>, ScheduleError> {
        let mut entries = self.overlaps();
        let released = cross_reference(&mut entries);

        for entry in &entries {
            for round in &entry.rounds {
                let available = round.candidate_slots();
                if available < entry.capacity {
                    warn!(
                        session = entry.number,
                        stage = %round.stage,
                        round = round.round,
                        available,
                        required = entry.capacity,
                        "session cannot be filled"
                    );
                    return Err(ScheduleError::ValidationInfeasible {
                        session: entry.number,
                        stage: round.stage,
                        round: round.round,
                        available,
                        required: entry.capacity,
                        diagnostic: entries.clone(),
                    });
                }
            }
        }

        info!(
            sessions = entries.len(),
            constrained = entries.iter().filter(|e| !e.rounds.is_empty()).count(),
            released,
            "timelines validated"
        );
        Ok(entries)
    }
}

/// Gives every contested match to a single session.
///
/// Contested matches are resolved in ascending window order. The winner is
/// the claimant whose tightest round currently has the fewest candidate
/// slots; ties go to the earlier session. Returns the number of released
/// claims.
pub fn cross_reference(entries: &mut [ValidatorEntry]) -> usize {
    let mut contested: Vec<usize> = entries
        .iter()
        .flat_map(|e| e.rounds.iter())
        .flat_map(|r| r.candidates.iter().map(|c| c.window))
        .collect();
    contested.sort_unstable();
    contested.dedup();

    let mut released = 0;
    for window in contested {
        let claimants: Vec<usize> = (0..entries.len())
            .filter(|&i| entries[i].claims(window))
            .collect();
        if claimants.len() < 2 {
            continue;
        }
        // min_by_key keeps the first minimum
        let Some(&keep) = claimants
            .iter()
            .min_by_key(|&&i| entries[i].tightest_slots().unwrap_or(usize::MAX))
        else {
            continue;
        };
        for &i in &claimants {
            if i != keep {
                entries[i].release(window);
                released += 1;
            }
        }
        debug!(
            window,
            session = entries[keep].number,
            claimants = claimants.len(),
            "resolved contested match"
        );
    }
    released
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: i64 = 60_000;

    fn session(number: u32, start: i64, end: i64, rooms: usize) -> Window {
        Window::new(Stage::Judging, 1, number, TimeWindow::new(start * MIN, end * MIN))
            .with_locations((0..rooms).collect())
    }

    fn game(stage: Stage, round: u32, number: u32, start: i64, tables: usize) -> Window {
        Window::new(stage, round, number, TimeWindow::new(start * MIN, (start + 5) * MIN))
            .with_locations((0..tables).collect())
    }

    /// Practice M1–M4 every 20 min from 0, ranking M5–M8 every 20 min from 80.
    fn matches() -> Vec<Window> {
        let mut m: Vec<Window> = (0..4)
            .map(|i| game(Stage::Practice, 1, i + 1, i as i64 * 20, 2))
            .collect();
        m.extend((0..4).map(|i| game(Stage::Ranking, 1, i + 5, 80 + i as i64 * 20, 2)));
        m
    }

    fn numbers(round: &OverlappingRound) -> Vec<u32> {
        round.candidates.iter().map(|c| c.number).collect()
    }

    #[test]
    fn test_candidates_respect_padding() {
        let sessions = vec![session(1, 60, 90, 4), session(2, 120, 150, 4)];
        let matches = matches();
        let entries = Validator::new(&sessions, &matches, 15 * MIN).overlaps();

        // S1 padded to [45, 105): practice and ranking both overlap
        assert_eq!(entries[0].rounds.len(), 2);
        assert_eq!(numbers(&entries[0].rounds[0]), vec![1, 2, 3]);
        assert_eq!(numbers(&entries[0].rounds[1]), vec![7, 8]);

        // S2 padded to [105, 165): only ranking; M6 ends exactly at 105
        assert_eq!(entries[1].rounds.len(), 1);
        assert_eq!(entries[1].rounds[0].stage, Stage::Ranking);
        assert_eq!(numbers(&entries[1].rounds[0]), vec![5, 6]);
    }

    #[test]
    fn test_feasible_timelines_validate() {
        let sessions = vec![session(1, 60, 90, 4), session(2, 120, 150, 4)];
        let matches = matches();
        let entries = Validator::new(&sessions, &matches, 15 * MIN)
            .validate()
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tightest_slots(), Some(4));
        assert_eq!(entries[1].rounds[0].candidate_slots(), 4);
    }

    #[test]
    fn test_far_session_has_no_rounds() {
        let sessions = vec![session(1, 600, 630, 4)];
        let matches = matches();
        let entries = Validator::new(&sessions, &matches, 15 * MIN)
            .validate()
            .unwrap();
        assert!(entries[0].rounds.is_empty());
        assert_eq!(entries[0].tightest_slots(), None);
    }

    #[test]
    fn test_covering_session_is_infeasible() {
        // Session padded window contains every match round
        let sessions = vec![session(1, 0, 240, 4)];
        let matches = matches();
        let err = Validator::new(&sessions, &matches, 15 * MIN)
            .validate()
            .unwrap_err();
        match err {
            ScheduleError::ValidationInfeasible {
                session,
                stage,
                available,
                required,
                diagnostic,
                ..
            } => {
                assert_eq!(session, 1);
                assert_eq!(stage, Stage::Practice);
                assert_eq!(available, 0);
                assert_eq!(required, 4);
                assert_eq!(diagnostic.len(), 1);
                assert_eq!(diagnostic[0].rounds.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exact_gap_is_compatible() {
        // Match ends 08:45, session starts 09:00, gap exactly 15 min
        let sessions = vec![session(1, 60, 90, 1)];
        let matches = vec![game(Stage::Practice, 1, 1, 40, 1), game(Stage::Practice, 1, 2, 50, 1)];
        let entries = Validator::new(&sessions, &matches, 15 * MIN).overlaps();
        assert_eq!(numbers(&entries[0].rounds[0]), vec![1]);
    }

    #[test]
    fn test_cross_reference_protects_tightest_session() {
        // Both sessions can use M1; S2 has no other option
        let sessions = vec![session(1, 30, 40, 1), session(2, 45, 55, 1)];
        let matches = vec![
            game(Stage::Practice, 1, 1, 0, 1),
            game(Stage::Practice, 1, 2, 25, 1),
            game(Stage::Practice, 1, 3, 80, 1),
        ];
        let mut entries = Validator::new(&sessions, &matches, 10 * MIN).overlaps();
        assert_eq!(numbers(&entries[0].rounds[0]), vec![1, 3]);
        assert_eq!(numbers(&entries[1].rounds[0]), vec![1, 2, 3]);

        let released = cross_reference(&mut entries);
        assert_eq!(released, 2);
        // S1 is tighter for M1 and wins the tie for M3
        assert_eq!(numbers(&entries[0].rounds[0]), vec![1, 3]);
        assert_eq!(numbers(&entries[1].rounds[0]), vec![2]);
    }

    #[test]
    fn test_cross_reference_tie_goes_to_first_session() {
        let sessions = vec![session(1, 60, 70, 1), session(2, 60, 70, 1)];
        let matches = vec![game(Stage::Practice, 1, 1, 0, 2), game(Stage::Practice, 1, 2, 65, 2)];
        let mut entries = Validator::new(&sessions, &matches, 10 * MIN).overlaps();
        assert_eq!(cross_reference(&mut entries), 1);
        assert!(entries[0].claims(0));
        assert!(!entries[1].claims(0));
    }

    #[test]
    fn test_contested_match_starves_session() {
        let sessions = vec![session(1, 60, 70, 1), session(2, 60, 70, 1)];
        let matches = vec![game(Stage::Practice, 1, 1, 0, 2), game(Stage::Practice, 1, 2, 65, 2)];
        let err = Validator::new(&sessions, &matches, 10 * MIN)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::ValidationInfeasible { session: 2, available: 0, required: 1, .. }
        ));
    }

    #[test]
    fn test_negative_padding_is_zero() {
        let sessions = vec![session(1, 0, 10, 1)];
        let matches = vec![game(Stage::Practice, 1, 1, 10, 1)];
        let entries = Validator::new(&sessions, &matches, -5 * MIN).overlaps();
        // Touching windows do not overlap at zero padding
        assert!(entries[0].rounds.is_empty());
    }
}

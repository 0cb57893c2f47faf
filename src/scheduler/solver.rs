//! Constrained team assignment: one solver attempt.
//!
//! # Algorithm
//!
//! 1. **Sessions**: shuffle the roster and fill judging sessions in
//!    chronological order, rooms in order. Surplus cells of the last
//!    session stay empty.
//! 2. **Seed**: for every session whose teams are constrained by a match
//!    round, reserve those teams into the round's candidate matches.
//! 3. **Fill**: rounds in chronological order. A round is a bipartite
//!    assignment of teams to (match, table) cells. A team may take a cell
//!    while it stays under the per-table visit limit and at least the
//!    minimum gap away from every event it already has, seeded events of
//!    later rounds included. Seeded teams start in their reserved cells.
//!    Free cells are then filled chronologically: prefer teams new to the
//!    table, rank by time since their last event, and pick uniformly
//!    among the top K.
//! 4. **Complete**: when the greedy pass leaves teams out, the round is
//!    solved as a maximum-weight assignment (Kuhn–Munkres). Weights rank
//!    seating a team first, then keeping the strict gap, then keeping the
//!    greedy pick, so a complete assignment is found whenever one exists
//!    and as few greedy picks as possible move.
//! 5. **Post-check**: every team appears exactly once per round.
//!
//! When no complete assignment of a round exists the attempt fails with
//! [`ScheduleError::GapConstraintUnsatisfiable`]. In permissive mode the
//! completion may also use cells at gap zero (teams may play back-to-back
//! but never overlap), counted as relaxed.
//!
//! # Complexity
//! Per round, O(n · c · e) for the allowed cells and O(n² · c) for the
//! completion, where n = teams, c = cells and e = events per team.
//!
//! # Reference
//! - Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching
//! - Kuhn (1955), "The Hungarian Method for the Assignment Problem"

use pathfinding::kuhn_munkres::kuhn_munkres;
use pathfinding::matrix::Matrix;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::kpi::{ScheduleKpi, ScheduleScore};
use crate::error::ScheduleError;
use crate::models::{Grid, Location, SolverSettings, Stage, Team, TimeWindow, Window};
use crate::validator::{match_rounds, ValidatorEntry};

/// Read-only inputs shared by every attempt.
#[derive(Debug, Clone, Copy)]
pub struct SolverInput<'a> {
    /// Team roster.
    pub teams: &'a [Team],
    /// Judging rooms.
    pub rooms: &'a [Location],
    /// Robot-game tables.
    pub tables: &'a [Location],
    /// Judging session windows.
    pub sessions: &'a [Window],
    /// Match windows.
    pub matches: &'a [Window],
    /// Validated session constraints.
    pub entries: &'a [ValidatorEntry],
}

/// Result of one successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Session × room assignments.
    pub session_grid: Grid,
    /// Match × table assignments.
    pub match_grid: Grid,
    /// Gap score.
    pub score: ScheduleScore,
    /// Teams placed with the gap relaxed (permissive mode only).
    pub relaxed: usize,
    /// Teams the completion step seated or moved.
    pub repaired: usize,
}

#[derive(Debug, Clone)]
struct RoundSlots {
    stage: Stage,
    round: u32,
    windows: Vec<usize>,
    /// `(window, table)` in chronological order.
    cells: Vec<(usize, usize)>,
}

/// Mutable state of one attempt. Never shared between attempts.
#[derive(Debug, Clone)]
struct AttemptState {
    sessions: Grid,
    matches: Grid,
    events: Vec<Vec<TimeWindow>>,
    session_of: Vec<Option<usize>>,
    /// `round * teams + team`
    played: Vec<bool>,
    /// `(stage * teams + team) * tables + table`
    visits: Vec<u32>,
    relaxed: usize,
}

/// Places teams into session and match grids.
///
/// The solver holds only shared references and precomputed lookups, so
/// one instance can run many attempts concurrently.
#[derive(Debug, Clone)]
pub struct AssignmentSolver<'a> {
    input: SolverInput<'a>,
    settings: &'a SolverSettings,
    rounds: Vec<RoundSlots>,
    round_of: Vec<usize>,
    visit_limits: [u32; 3],
}

fn gap_ok(events: &[TimeWindow], time: &TimeWindow, gap_ms: i64) -> bool {
    events.iter().all(|e| time.is_separated_from(e, gap_ms))
}

/// Time since the team's most recent event ending by `start_ms`.
fn waited(events: &[TimeWindow], start_ms: i64) -> i64 {
    events
        .iter()
        .filter(|e| e.end_ms <= start_ms)
        .map(|e| start_ms - e.end_ms)
        .min()
        .unwrap_or(i64::MAX)
}

/// Per-table visit limit of one stage.
///
/// Starts from `ceil(tables / rounds)`, the even spread. A staggered bank
/// that must absorb more plays than that allows raises the limit to the
/// fewest visits per table that still fit them.
fn stage_visit_limit(
    matches: &[Window],
    stage: Stage,
    rounds: usize,
    teams: usize,
    tables: usize,
) -> Option<u32> {
    if rounds == 0 || teams == 0 || tables == 0 {
        return None;
    }
    let mut bank_cells: BTreeMap<&[usize], usize> = BTreeMap::new();
    for w in matches.iter().filter(|w| w.stage == stage) {
        *bank_cells.entry(w.locations.as_slice()).or_default() += w.capacity();
    }
    let total: usize = bank_cells.values().sum();
    let plays = teams * rounds;

    let mut limit = tables.div_ceil(rounds);
    for (bank, &cells) in &bank_cells {
        if bank.is_empty() {
            continue;
        }
        // plays the other banks cannot take
        let forced = plays.saturating_sub(total - cells);
        limit = limit.max(forced.div_ceil(teams).div_ceil(bank.len()));
    }
    Some(limit as u32)
}

impl<'a> AssignmentSolver<'a> {
    /// Creates a solver for the given inputs.
    pub fn new(input: SolverInput<'a>, settings: &'a SolverSettings) -> Self {
        let chronological = |w: usize| (input.matches[w].start_ms(), input.matches[w].number);

        let mut rounds: Vec<RoundSlots> = match_rounds(input.matches)
            .into_iter()
            .map(|((stage, round), mut windows)| {
                windows.sort_by_key(|&w| chronological(w));
                let cells = windows
                    .iter()
                    .flat_map(|&w| input.matches[w].locations.iter().map(move |&l| (w, l)))
                    .collect();
                RoundSlots {
                    stage,
                    round,
                    windows,
                    cells,
                }
            })
            .collect();
        rounds.sort_by_key(|r| r.windows.first().map(|&w| chronological(w)));

        let mut round_of = vec![0; input.matches.len()];
        for (r, round) in rounds.iter().enumerate() {
            for &w in &round.windows {
                round_of[w] = r;
            }
        }

        let mut visit_limits = [u32::MAX; 3];
        for stage in [Stage::Practice, Stage::Ranking] {
            let stage_rounds = rounds.iter().filter(|r| r.stage == stage).count();
            if let Some(limit) = stage_visit_limit(
                input.matches,
                stage,
                stage_rounds,
                input.teams.len(),
                input.tables.len(),
            ) {
                visit_limits[stage.index()] = limit;
            }
        }

        Self {
            input,
            settings,
            rounds,
            round_of,
            visit_limits,
        }
    }

    /// Most visits a team may pay one table within a stage.
    pub fn visit_limit(&self, stage: Stage) -> u32 {
        self.visit_limits[stage.index()]
    }

    /// Runs one attempt with the given random source.
    ///
    /// # Errors
    /// - [`ScheduleError::GapConstraintUnsatisfiable`] when no complete
    ///   assignment of a round keeps the minimum gap and visit limits.
    /// - [`ScheduleError::StructuralViolation`] when a team is still
    ///   missing from (or duplicated in) a round after the fill.
    pub fn attempt(&self, rng: &mut ChaCha8Rng) -> Result<Attempt, ScheduleError> {
        let mut state = self.new_state();
        self.fill_sessions(&mut state, rng);
        self.seed(&mut state, rng);
        let mut repaired = 0;
        for r in 0..self.rounds.len() {
            repaired += self.fill_round(&mut state, r, rng)?;
        }
        self.check(&state)?;

        let score = ScheduleKpi::from_events(&state.events).score;
        debug!(
            min_gap_ms = score.min_gap_ms,
            mean_gap_ms = score.mean_gap_ms,
            relaxed = state.relaxed,
            repaired,
            "attempt finished"
        );

        Ok(Attempt {
            session_grid: state.sessions,
            match_grid: state.matches,
            score,
            relaxed: state.relaxed,
            repaired,
        })
    }

    fn new_state(&self) -> AttemptState {
        let teams = self.input.teams.len();
        let tables = self.input.tables.len();
        AttemptState {
            sessions: Grid::new(self.input.sessions.len(), self.input.rooms.len()),
            matches: Grid::new(self.input.matches.len(), tables),
            events: vec![Vec::new(); teams],
            session_of: vec![None; teams],
            played: vec![false; self.rounds.len() * teams],
            visits: vec![0; Stage::ALL.len() * teams * tables],
            relaxed: 0,
        }
    }

    #[inline]
    fn played_index(&self, round: usize, team: usize) -> usize {
        round * self.input.teams.len() + team
    }

    #[inline]
    fn visit_index(&self, stage: Stage, team: usize, table: usize) -> usize {
        (stage.index() * self.input.teams.len() + team) * self.input.tables.len() + table
    }

    fn visits(&self, state: &AttemptState, stage: Stage, team: usize, table: usize) -> u32 {
        state.visits[self.visit_index(stage, team, table)]
    }

    fn visit_ok(&self, state: &AttemptState, stage: Stage, team: usize, table: usize) -> bool {
        self.visits(state, stage, team, table) < self.visit_limit(stage)
    }

    fn round_index(&self, stage: Stage, round: u32) -> Option<usize> {
        self.rounds
            .iter()
            .position(|r| r.stage == stage && r.round == round)
    }

    fn place(&self, state: &mut AttemptState, w: usize, table: usize, team: usize) -> bool {
        if !state.matches.assign(w, table, team) {
            return false;
        }
        let window = &self.input.matches[w];
        state.events[team].push(window.time);
        let played = self.played_index(self.round_of[w], team);
        state.played[played] = true;
        let visit = self.visit_index(window.stage, team, table);
        state.visits[visit] += 1;
        true
    }

    fn remove(&self, state: &mut AttemptState, w: usize, table: usize) -> Option<usize> {
        let team = state.matches.unassign(w, table)?;
        let window = &self.input.matches[w];
        if let Some(pos) = state.events[team].iter().position(|e| *e == window.time) {
            state.events[team].swap_remove(pos);
        }
        let played = self.played_index(self.round_of[w], team);
        state.played[played] = false;
        let visit = self.visit_index(window.stage, team, table);
        state.visits[visit] = state.visits[visit].saturating_sub(1);
        Some(team)
    }

    fn fill_sessions(&self, state: &mut AttemptState, rng: &mut ChaCha8Rng) {
        let mut roster: Vec<usize> = (0..self.input.teams.len()).collect();
        roster.shuffle(rng);
        let mut next = roster.into_iter();

        for (s, session) in self.input.sessions.iter().enumerate() {
            for &room in &session.locations {
                let Some(team) = next.next() else {
                    return;
                };
                if state.sessions.assign(s, room, team) {
                    state.events[team].push(session.time);
                    state.session_of[team] = Some(s);
                }
            }
        }
    }

    fn seed(&self, state: &mut AttemptState, rng: &mut ChaCha8Rng) {
        let gap = self.settings.min_gap_ms();
        for entry in self.input.entries {
            if entry.rounds.is_empty() {
                continue;
            }
            let members: Vec<usize> = (0..self.input.teams.len())
                .filter(|&t| state.session_of[t] == Some(entry.session))
                .collect();

            for round in &entry.rounds {
                let Some(r) = self.round_index(round.stage, round.round) else {
                    continue;
                };
                let mut pool = members.clone();
                pool.shuffle(rng);

                for team in pool {
                    if state.played[self.played_index(r, team)] {
                        continue;
                    }
                    let cells: Vec<(usize, usize)> = round
                        .candidates
                        .iter()
                        .flat_map(|c| {
                            self.input.matches[c.window]
                                .locations
                                .iter()
                                .map(move |&l| (c.window, l))
                        })
                        .filter(|&(w, l)| {
                            state.matches.is_free(w, l)
                                && self.visit_ok(state, round.stage, team, l)
                                && gap_ok(&state.events[team], &self.input.matches[w].time, gap)
                        })
                        .collect();
                    let fresh: Vec<(usize, usize)> = cells
                        .iter()
                        .copied()
                        .filter(|&(_, l)| self.visits(state, round.stage, team, l) == 0)
                        .collect();
                    let pick_from = if fresh.is_empty() { &cells } else { &fresh };
                    if pick_from.is_empty() {
                        debug!(
                            session = entry.number,
                            stage = %round.stage,
                            round = round.round,
                            team,
                            "no candidate cell, deferring to fill"
                        );
                        continue;
                    }
                    let (w, l) = pick_from[rng.random_range(0..pick_from.len())];
                    self.place(state, w, l, team);
                }
            }
        }
    }

    fn pick(
        &self,
        state: &AttemptState,
        eligible: &[usize],
        window: &Window,
        table: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<usize> {
        let fresh: Vec<usize> = eligible
            .iter()
            .copied()
            .filter(|&t| self.visits(state, window.stage, t, table) == 0)
            .collect();
        let mut pool = if fresh.is_empty() {
            eligible.to_vec()
        } else {
            fresh
        };
        if pool.is_empty() {
            return None;
        }
        pool.sort_by_key(|&t| (Reverse(waited(&state.events[t], window.start_ms())), t));
        let k = self.settings.top_k.clamp(1, pool.len());
        Some(pool[rng.random_range(0..k)])
    }

    /// `team × cell` table of the cells of a round each team may take.
    fn allowed(&self, state: &AttemptState, round: &RoundSlots, gap_ms: i64) -> Vec<Vec<bool>> {
        (0..self.input.teams.len())
            .map(|team| {
                round
                    .cells
                    .iter()
                    .map(|&(w, l)| {
                        self.visit_ok(state, round.stage, team, l)
                            && gap_ok(&state.events[team], &self.input.matches[w].time, gap_ms)
                    })
                    .collect()
            })
            .collect()
    }

    /// Seats every team in one cell of round `r`. Returns the number of
    /// teams the completion step seated or moved.
    fn fill_round(
        &self,
        state: &mut AttemptState,
        r: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<usize, ScheduleError> {
        let round = &self.rounds[r];
        let teams = self.input.teams.len();
        if teams == 0 {
            return Ok(0);
        }

        // Lift seeds so the allowed cells only see other rounds
        let mut seeded = Vec::new();
        for (c, &(w, l)) in round.cells.iter().enumerate() {
            if let Some(team) = self.remove(state, w, l) {
                seeded.push((c, team));
            }
        }
        let strict = self.allowed(state, round, self.settings.min_gap_ms());

        let mut greedy: Vec<Option<usize>> = vec![None; teams];
        let mut taken = vec![false; round.cells.len()];
        for (c, team) in seeded {
            if strict[team][c] {
                greedy[team] = Some(c);
                taken[c] = true;
            }
        }
        for (c, &(w, l)) in round.cells.iter().enumerate() {
            if taken[c] {
                continue;
            }
            let eligible: Vec<usize> = (0..teams)
                .filter(|&t| greedy[t].is_none() && strict[t][c])
                .collect();
            if let Some(team) = self.pick(state, &eligible, &self.input.matches[w], l, rng) {
                greedy[team] = Some(c);
                taken[c] = true;
            }
        }

        let mut cell_of = greedy.clone();
        let mut repaired = 0;
        if greedy.iter().any(Option::is_none) {
            let loose = self
                .settings
                .permissive
                .then(|| self.allowed(state, round, 0));
            cell_of = self.complete(&strict, loose.as_deref(), &greedy);
            repaired = (0..teams).filter(|&t| cell_of[t] != greedy[t]).count();

            let relaxed = (0..teams)
                .filter(|&t| cell_of[t].is_some_and(|c| !strict[t][c]))
                .count();
            if relaxed > 0 {
                warn!(
                    stage = %round.stage,
                    round = round.round,
                    relaxed,
                    "relaxing minimum gap"
                );
                state.relaxed += relaxed;
            }
        }

        let unplaced = cell_of.iter().filter(|c| c.is_none()).count();
        if unplaced > 0 {
            let mut used = vec![false; round.cells.len()];
            for c in cell_of.iter().flatten() {
                used[*c] = true;
            }
            let cell = used
                .iter()
                .position(|&u| !u)
                .and_then(|c| round.cells.get(c))
                .or(round.cells.first());
            let (number, location) = match cell {
                Some(&(w, l)) => (
                    self.input.matches[w].number,
                    self.input.tables.get(l).map(|t| t.id.clone()).unwrap_or_default(),
                ),
                None => (0, String::new()),
            };
            warn!(
                stage = %round.stage,
                round = round.round,
                number,
                location = %location,
                unplaced,
                "no complete assignment keeps the minimum gap"
            );
            return Err(ScheduleError::GapConstraintUnsatisfiable {
                stage: round.stage,
                round: round.round,
                number,
                location,
            });
        }

        for (team, cell) in cell_of.iter().enumerate() {
            if let Some(c) = *cell {
                let (w, l) = round.cells[c];
                self.place(state, w, l, team);
            }
        }
        if repaired > 0 {
            debug!(stage = %round.stage, round = round.round, repaired, "completed round");
        }
        Ok(repaired)
    }

    /// Maximum-weight team to cell assignment of one round.
    ///
    /// Seating a team outweighs every strict-gap bonus combined, and one
    /// strict-gap bonus outweighs every kept greedy pick combined. Teams
    /// left on a cell they may not take come back as `None`.
    fn complete(
        &self,
        strict: &[Vec<bool>],
        loose: Option<&[Vec<bool>]>,
        greedy: &[Option<usize>],
    ) -> Vec<Option<usize>> {
        let teams = strict.len();
        let cells = strict.first().map_or(0, Vec::len);
        if cells < teams {
            return vec![None; teams];
        }
        let may = |t: usize, c: usize| strict[t][c] || loose.is_some_and(|l| l[t][c]);

        let n = teams as i64;
        let strict_bonus = n + 1;
        let seat = (n + 1) * (n + 2);
        let weights = Matrix::from_fn(teams, cells, |(t, c)| {
            if !may(t, c) {
                return 0;
            }
            let mut weight = seat;
            if strict[t][c] {
                weight += strict_bonus;
            }
            if greedy[t] == Some(c) {
                weight += 1;
            }
            weight
        });
        let (_, columns) = kuhn_munkres(&weights);
        columns
            .into_iter()
            .enumerate()
            .map(|(t, c)| may(t, c).then_some(c))
            .collect()
    }

    fn expect_once(&self, stage: Stage, round: u32, counts: &[usize]) -> Result<(), ScheduleError> {
        match counts.iter().enumerate().find(|(_, &n)| n != 1) {
            Some((team, &occurrences)) => Err(ScheduleError::StructuralViolation {
                stage,
                round,
                team: self.input.teams[team].id.clone(),
                occurrences,
            }),
            None => Ok(()),
        }
    }

    fn check(&self, state: &AttemptState) -> Result<(), ScheduleError> {
        let mut counts = vec![0usize; self.input.teams.len()];
        for (_, _, team) in state.sessions.occupied() {
            if let Some(n) = counts.get_mut(team) {
                *n += 1;
            }
        }
        self.expect_once(Stage::Judging, 1, &counts)?;

        for round in &self.rounds {
            counts.fill(0);
            for &w in &round.windows {
                for team in state.matches.row(w).iter().flatten() {
                    if let Some(n) = counts.get_mut(*team) {
                        *n += 1;
                    }
                }
            }
            self.expect_once(round.stage, round.round, &counts)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InMemoryRoster, RosterProvider};
    use crate::validator::Validator;
    use rand::SeedableRng;

    const MIN: i64 = 60_000;

    struct Fixture {
        teams: Vec<Team>,
        rooms: Vec<Location>,
        tables: Vec<Location>,
        sessions: Vec<Window>,
        matches: Vec<Window>,
        entries: Vec<ValidatorEntry>,
    }

    impl Fixture {
        fn input(&self) -> SolverInput<'_> {
            SolverInput {
                teams: &self.teams,
                rooms: &self.rooms,
                tables: &self.tables,
                sessions: &self.sessions,
                matches: &self.matches,
                entries: &self.entries,
            }
        }
    }

    fn window(stage: Stage, round: u32, number: u32, start: i64, len: i64, locs: usize) -> Window {
        Window::new(stage, round, number, TimeWindow::new(start * MIN, (start + len) * MIN))
            .with_locations((0..locs).collect())
    }

    /// 8 teams, 4 rooms, 2 tables. Sessions 09:00 and 10:00 (30 min),
    /// practice M1–M4 from 08:00, ranking M5–M8 from 09:20, 20-min cycle.
    fn tournament() -> Fixture {
        let roster = InMemoryRoster::numbered(8, 4, 2);
        let sessions = vec![
            window(Stage::Judging, 1, 1, 540, 30, 4),
            window(Stage::Judging, 1, 2, 600, 30, 4),
        ];
        let mut matches: Vec<Window> = (0..4)
            .map(|i| window(Stage::Practice, 1, i + 1, 480 + 20 * i as i64, 5, 2))
            .collect();
        matches.extend((0..4).map(|i| window(Stage::Ranking, 1, i + 5, 560 + 20 * i as i64, 5, 2)));
        let entries = Validator::new(&sessions, &matches, 15 * MIN)
            .validate()
            .unwrap();
        Fixture {
            teams: roster.teams().unwrap(),
            rooms: roster.rooms().unwrap(),
            tables: roster.tables().unwrap(),
            sessions,
            matches,
            entries,
        }
    }

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn test_attempt_places_every_team_once_per_round() {
        let fx = tournament();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        let attempt = solver.attempt(&mut rng(7)).unwrap();

        assert_eq!(attempt.session_grid.filled_count(), 8);
        assert_eq!(attempt.match_grid.filled_count(), 16);
        for range in [0..4, 4..8] {
            let mut seen: Vec<usize> = range
                .flat_map(|w| attempt.match_grid.row(w).to_vec())
                .flatten()
                .collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..8).collect::<Vec<_>>());
        }
        assert!(attempt.score.min_gap_ms >= 15 * MIN);
    }

    #[test]
    fn test_session_teams_use_candidate_matches() {
        let fx = tournament();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        let attempt = solver.attempt(&mut rng(3)).unwrap();

        // Session 1 teams play practice in M1–M3 and ranking in M7–M8
        let first: Vec<usize> = attempt.session_grid.row(0).iter().flatten().copied().collect();
        for (w, _, team) in attempt.match_grid.occupied() {
            if first.contains(&team) {
                assert!([0, 1, 2, 6, 7].contains(&w), "team {team} in window {w}");
            }
        }
    }

    #[test]
    fn test_same_seed_same_grids() {
        let fx = tournament();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        let a = solver.attempt(&mut rng(42)).unwrap();
        let b = solver.attempt(&mut rng(42)).unwrap();
        assert_eq!(a, b);
    }

    fn back_to_back() -> Fixture {
        // Two one-table rounds with no slack between matches
        let roster = InMemoryRoster::numbered(2, 1, 1);
        let sessions = vec![
            window(Stage::Judging, 1, 1, 600, 30, 1),
            window(Stage::Judging, 1, 2, 660, 30, 1),
        ];
        let matches = vec![
            window(Stage::Practice, 1, 1, 0, 5, 1),
            window(Stage::Practice, 1, 2, 5, 5, 1),
            window(Stage::Practice, 2, 3, 10, 5, 1),
            window(Stage::Practice, 2, 4, 15, 5, 1),
        ];
        let entries = Validator::new(&sessions, &matches, 15 * MIN)
            .validate()
            .unwrap();
        Fixture {
            teams: roster.teams().unwrap(),
            rooms: roster.rooms().unwrap(),
            tables: roster.tables().unwrap(),
            sessions,
            matches,
            entries,
        }
    }

    #[test]
    fn test_gap_unsatisfiable() {
        let fx = back_to_back();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        let err = solver.attempt(&mut rng(1)).unwrap_err();
        match err {
            ScheduleError::GapConstraintUnsatisfiable {
                stage,
                round,
                number,
                location,
            } => {
                assert_eq!(stage, Stage::Practice);
                assert_eq!(round, 2);
                assert_eq!(number, 3);
                assert_eq!(location, "T1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_permissive_relaxes_gap() {
        let fx = back_to_back();
        let settings = SolverSettings::default().with_permissive(true);
        let solver = AssignmentSolver::new(fx.input(), &settings);
        let attempt = solver.attempt(&mut rng(1)).unwrap();
        assert!(attempt.relaxed >= 1);
        assert!(attempt.score.min_gap_ms >= 0);
        assert!(attempt.score.min_gap_ms < 15 * MIN);
        assert_eq!(attempt.match_grid.filled_count(), 4);
    }

    #[test]
    fn test_visit_limit() {
        let fx = tournament();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        // 2 tables, 1 round per stage
        assert_eq!(solver.visit_limit(Stage::Practice), 2);
        assert_eq!(solver.visit_limit(Stage::Ranking), 2);

        // One table, two rounds: the spread of 1 cannot seat both rounds
        let fx = back_to_back();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        assert_eq!(solver.visit_limit(Stage::Practice), 2);
    }

    /// 8 teams, 4 tables, 4 practice rounds of 4 windows, banks T1–T2 and
    /// T3–T4 alternating.
    fn staggered() -> Fixture {
        let roster = InMemoryRoster::numbered(8, 4, 4);
        let matches = (0..16)
            .map(|i| {
                let bank = if i % 2 == 0 { vec![0, 1] } else { vec![2, 3] };
                Window::new(
                    Stage::Practice,
                    i / 4 + 1,
                    i + 1,
                    TimeWindow::new(20 * i as i64 * MIN, (20 * i as i64 + 5) * MIN),
                )
                .with_locations(bank)
            })
            .collect();
        Fixture {
            teams: roster.teams().unwrap(),
            rooms: roster.rooms().unwrap(),
            tables: roster.tables().unwrap(),
            sessions: vec![
                window(Stage::Judging, 1, 1, 600, 30, 4),
                window(Stage::Judging, 1, 2, 640, 30, 4),
            ],
            matches,
            entries: Vec::new(),
        }
    }

    #[test]
    fn test_staggered_banks_keep_even_spread() {
        let fx = staggered();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        assert_eq!(solver.visit_limit(Stage::Practice), 1);

        for seed in 0..4 {
            let attempt = solver.attempt(&mut rng(seed)).unwrap();
            let mut visits = vec![0; 8 * 4];
            for (_, table, team) in attempt.match_grid.occupied() {
                visits[team * 4 + table] += 1;
            }
            assert!(visits.iter().all(|&v| v == 1), "seed {seed}: {visits:?}");
        }
    }

    #[test]
    fn test_completion_moves_seeded_team() {
        // 3 teams, 3 tables, 3 practice rounds → one visit per table
        let roster = InMemoryRoster::numbered(3, 3, 3);
        let fx = Fixture {
            teams: roster.teams().unwrap(),
            rooms: roster.rooms().unwrap(),
            tables: roster.tables().unwrap(),
            sessions: vec![window(Stage::Judging, 1, 1, 600, 30, 3)],
            matches: vec![
                window(Stage::Practice, 1, 1, 0, 5, 3),
                window(Stage::Practice, 2, 2, 30, 5, 3),
                window(Stage::Practice, 3, 3, 60, 5, 3),
            ],
            entries: Vec::new(),
        };
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        assert_eq!(solver.visit_limit(Stage::Practice), 1);

        let mut state = solver.new_state();
        // Round 1: t0@T1, t1@T2, t2@T3
        for team in 0..3 {
            assert!(solver.place(&mut state, 0, team, team));
        }
        // Round 2 seeded: t1@T1, t0@T2; t2 already used T3
        solver.place(&mut state, 1, 0, 1);
        solver.place(&mut state, 1, 1, 0);

        // t2 is seated and one seeded team moves to T3
        assert_eq!(solver.fill_round(&mut state, 1, &mut rng(0)).unwrap(), 2);
        let row: Vec<usize> = state.matches.row(1).iter().flatten().copied().collect();
        assert_eq!(row.len(), 3);
        for (table, &team) in row.iter().enumerate() {
            assert_ne!(team, table, "team {team} repeats table {table}");
        }
    }

    #[test]
    fn test_fill_reroutes_gap_blocked_team() {
        // Session 1 at 01:20 leaves its team only the 01:00 match; a free
        // team picked there first has to move to 01:40
        let roster = InMemoryRoster::numbered(2, 1, 1);
        let fx = Fixture {
            teams: roster.teams().unwrap(),
            rooms: roster.rooms().unwrap(),
            tables: roster.tables().unwrap(),
            sessions: vec![
                window(Stage::Judging, 1, 1, 80, 10, 1),
                window(Stage::Judging, 1, 2, 300, 10, 1),
            ],
            matches: vec![
                window(Stage::Practice, 1, 1, 60, 5, 1),
                window(Stage::Practice, 1, 2, 100, 5, 1),
            ],
            entries: Vec::new(),
        };
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);

        let mut repaired = 0;
        for seed in 0..16 {
            let attempt = solver.attempt(&mut rng(seed)).unwrap();
            let judged_first = attempt.session_grid.row(0)[0];
            assert_eq!(attempt.match_grid.row(0), &[judged_first], "seed {seed}");
            assert!(attempt.score.min_gap_ms >= 15 * MIN);
            repaired += attempt.repaired;
        }
        assert!(repaired > 0);
    }

    #[test]
    fn test_structural_violation_reports_missing_team() {
        let fx = tournament();
        let settings = SolverSettings::default();
        let solver = AssignmentSolver::new(fx.input(), &settings);
        let mut state = solver.new_state();
        solver.fill_sessions(&mut state, &mut rng(0));
        let err = solver.check(&state).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::StructuralViolation {
                stage: Stage::Practice,
                round: 1,
                occurrences: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_waited_prefers_longest_idle() {
        let events = vec![TimeWindow::new(0, 10), TimeWindow::new(50, 60)];
        assert_eq!(waited(&events, 100), 40);
        assert_eq!(waited(&events, 55), 45);
        assert_eq!(waited(&[], 100), i64::MAX);
    }
}

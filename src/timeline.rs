//! Timeline construction.
//!
//! Turns per-family event parameters into an ordered sequence of
//! [`Window`]s, each with its ordinal number, round, and the locations it
//! spans.
//!
//! # Algorithm
//!
//! 1. Split the family's location pool into banks: one bank normally, two
//!    halves when matches are staggered (first half = `ceil(n / 2)`).
//! 2. Size a round: the fewest windows whose summed capacity seats every
//!    team, whichever bank the round starts on.
//! 3. Place `rounds × windows_per_round` windows sequentially. Window `N`
//!    uses bank `(N - 1) mod banks`, lasts the event length, and the clock
//!    advances by the cycle time.
//! 4. After window `N`, every break of the family's phase with
//!    `after == N` pushes the clock by its duration. Breaks are
//!    cumulative; judging breaks never shift matches and vice versa.
//!
//! Staggering lets two table banks run out of phase: each team still plays
//! one match per round, but a single table is only used every other cycle.

use tracing::debug;

use crate::models::{seconds_to_ms, Break, BreakPhase, ScheduleConfig, Stage, TimeWindow, Window};

/// Parameters shared by the practice and ranking families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFamily {
    /// Match length (ms).
    pub length_ms: i64,
    /// Start-to-start spacing (ms).
    pub cycle_time_ms: i64,
    /// Size of the table pool.
    pub tables: usize,
    /// Rounds in this stage.
    pub rounds: u32,
    /// Alternate between the two table halves.
    pub stagger: bool,
}

/// An event family: the per-stage parameters a timeline is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFamily {
    /// Judging sessions: one round, every session spans all rooms.
    Judging {
        /// Session length (ms).
        length_ms: i64,
        /// Start-to-start spacing (ms).
        cycle_time_ms: i64,
        /// Size of the room pool.
        rooms: usize,
    },
    /// Practice matches.
    Practice(MatchFamily),
    /// Ranking matches.
    Ranking(MatchFamily),
}

impl EventFamily {
    /// Judging family from a request.
    pub fn judging(config: &ScheduleConfig, rooms: usize) -> Self {
        EventFamily::Judging {
            length_ms: seconds_to_ms(config.judging_session_length_seconds),
            cycle_time_ms: seconds_to_ms(config.judging_cycle_time_seconds),
            rooms,
        }
    }

    /// Practice family from a request.
    pub fn practice(config: &ScheduleConfig, tables: usize) -> Self {
        EventFamily::Practice(MatchFamily {
            length_ms: seconds_to_ms(config.match_length_seconds),
            cycle_time_ms: seconds_to_ms(config.practice_match_cycle_time_seconds),
            tables,
            rounds: config.practice_rounds,
            stagger: config.stagger_matches,
        })
    }

    /// Ranking family from a request.
    pub fn ranking(config: &ScheduleConfig, tables: usize) -> Self {
        EventFamily::Ranking(MatchFamily {
            length_ms: seconds_to_ms(config.match_length_seconds),
            cycle_time_ms: seconds_to_ms(config.ranking_match_cycle_time_seconds),
            tables,
            rounds: config.ranking_rounds,
            stagger: config.stagger_matches,
        })
    }

    /// Stage of the produced windows.
    pub fn stage(&self) -> Stage {
        match self {
            EventFamily::Judging { .. } => Stage::Judging,
            EventFamily::Practice(_) => Stage::Practice,
            EventFamily::Ranking(_) => Stage::Ranking,
        }
    }

    /// Break phase that shifts this family.
    pub fn phase(&self) -> BreakPhase {
        BreakPhase::of(self.stage())
    }

    /// Event length (ms).
    pub fn length_ms(&self) -> i64 {
        match self {
            EventFamily::Judging { length_ms, .. } => *length_ms,
            EventFamily::Practice(m) | EventFamily::Ranking(m) => m.length_ms,
        }
    }

    /// Cycle time (ms).
    pub fn cycle_time_ms(&self) -> i64 {
        match self {
            EventFamily::Judging { cycle_time_ms, .. } => *cycle_time_ms,
            EventFamily::Practice(m) | EventFamily::Ranking(m) => m.cycle_time_ms,
        }
    }

    /// Number of rounds. Judging always has exactly one.
    pub fn rounds(&self) -> u32 {
        match self {
            EventFamily::Judging { .. } => 1,
            EventFamily::Practice(m) | EventFamily::Ranking(m) => m.rounds,
        }
    }

    /// Size of the location pool.
    pub fn location_count(&self) -> usize {
        match self {
            EventFamily::Judging { rooms, .. } => *rooms,
            EventFamily::Practice(m) | EventFamily::Ranking(m) => m.tables,
        }
    }

    /// Location banks windows rotate through.
    pub fn location_banks(&self) -> Vec<Vec<usize>> {
        let n = self.location_count();
        if n == 0 {
            return Vec::new();
        }
        match self {
            EventFamily::Practice(m) | EventFamily::Ranking(m) if m.stagger && n >= 2 => {
                let half = n.div_ceil(2);
                vec![(0..half).collect(), (half..n).collect()]
            }
            _ => vec![(0..n).collect()],
        }
    }

    /// Windows needed per round to seat `team_count` teams.
    ///
    /// With staggered banks of unequal size the round may start on either
    /// bank, so both rotations must seat every team.
    pub fn windows_per_round(&self, team_count: usize) -> u32 {
        let caps: Vec<usize> = self.location_banks().iter().map(Vec::len).collect();
        if caps.is_empty() || team_count == 0 {
            return 0;
        }
        let n = caps.len();
        let mut k: usize = 0;
        loop {
            k += 1;
            let seats_all = (0..n).all(|offset| {
                (0..k).map(|j| caps[(offset + j) % n]).sum::<usize>() >= team_count
            });
            if seats_all {
                return k as u32;
            }
        }
    }
}

/// Windows produced for one family plus the clock after the last window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    /// Windows in chronological order.
    pub windows: Vec<Window>,
    /// Running clock after the last window (start of the next cycle,
    /// including any trailing break).
    pub end_ms: i64,
}

/// Builds the windows of one event family.
///
/// # Example
/// ```
/// use u_tournament::timeline::{EventFamily, MatchFamily, TimelineBuilder};
///
/// let family = EventFamily::Practice(MatchFamily {
///     length_ms: 150_000,
///     cycle_time_ms: 600_000,
///     tables: 2,
///     rounds: 1,
///     stagger: false,
/// });
/// let timeline = TimelineBuilder::new(0).build(&family, 8);
/// assert_eq!(timeline.windows.len(), 4);
/// assert_eq!(timeline.windows[3].start_ms(), 1_800_000);
/// ```
#[derive(Debug, Clone)]
pub struct TimelineBuilder<'a> {
    start_ms: i64,
    first_number: u32,
    breaks: &'a [Break],
}

impl<'a> TimelineBuilder<'a> {
    /// Creates a builder starting at `start_ms` with window number 1.
    pub fn new(start_ms: i64) -> Self {
        Self {
            start_ms,
            first_number: 1,
            breaks: &[],
        }
    }

    /// Sets the break directives (all phases; filtered per family).
    pub fn with_breaks(mut self, breaks: &'a [Break]) -> Self {
        self.breaks = breaks;
        self
    }

    /// Sets the number of the first window.
    pub fn starting_number(mut self, number: u32) -> Self {
        self.first_number = number.max(1);
        self
    }

    fn break_after(&self, phase: BreakPhase, number: u32) -> i64 {
        self.breaks
            .iter()
            .filter(|b| b.phase == phase && b.after == number)
            .map(Break::duration_ms)
            .sum()
    }

    /// Builds exactly `rounds × windows_per_round(team_count)` windows.
    pub fn build(&self, family: &EventFamily, team_count: usize) -> Timeline {
        let banks = family.location_banks();
        let per_round = family.windows_per_round(team_count);
        let total = (per_round * family.rounds()) as usize;
        let stage = family.stage();
        let phase = family.phase();

        let mut clock = self.start_ms;
        let mut windows = Vec::with_capacity(total);
        for i in 0..total {
            let number = self.first_number + i as u32;
            let round = i as u32 / per_round + 1;
            let bank = &banks[(number as usize - 1) % banks.len()];
            let time = TimeWindow::new(clock, clock + family.length_ms());
            windows.push(Window::new(stage, round, number, time).with_locations(bank.clone()));

            clock += family.cycle_time_ms();
            clock += self.break_after(phase, number);
        }

        debug!(
            stage = %stage,
            windows = windows.len(),
            per_round,
            banks = banks.len(),
            "built timeline"
        );

        Timeline {
            windows,
            end_ms: clock,
        }
    }
}

/// Session and match timelines for one division.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTimelines {
    /// Judging sessions.
    pub sessions: Timeline,
    /// Practice then ranking matches, numbered globally.
    pub matches: Timeline,
}

/// Builds all timelines for a request.
///
/// Ranking matches start where the practice clock stopped and continue
/// the global match numbering.
pub fn build_timelines(
    config: &ScheduleConfig,
    team_count: usize,
    room_count: usize,
    table_count: usize,
) -> ScheduleTimelines {
    let sessions = TimelineBuilder::new(config.judging_start.timestamp_millis())
        .with_breaks(&config.breaks)
        .build(&EventFamily::judging(config, room_count), team_count);

    let practice = TimelineBuilder::new(config.matches_start.timestamp_millis())
        .with_breaks(&config.breaks)
        .build(&EventFamily::practice(config, table_count), team_count);

    let ranking = TimelineBuilder::new(practice.end_ms)
        .with_breaks(&config.breaks)
        .starting_number(practice.windows.len() as u32 + 1)
        .build(&EventFamily::ranking(config, table_count), team_count);

    let mut windows = practice.windows;
    windows.extend(ranking.windows);

    ScheduleTimelines {
        sessions,
        matches: Timeline {
            windows,
            end_ms: ranking.end_ms,
        },
    }
}

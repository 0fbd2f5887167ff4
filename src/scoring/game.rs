//! Live game state machine.
//!
//! `GameState` is a plain value: every transition borrows the current state
//! and returns the next one, so a rejected play leaves the caller's state
//! untouched and undo is just "put the old value back".
//!
//! Half-inning lifecycle:
//!   outs 0 → 3 while one side bats; on the third out the half's runs are
//!   committed to that side's line score, outs/runs/bases reset, offense and
//!   half flip, and the inning advances on Bottom → Top.
//!
//! Runs are the scorer's tally for the play. They are not derived from which
//! runners were marked as scoring.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::models::PlateAppearanceEvent;
use crate::error::ScoringError;
use crate::roster::Player;
use crate::scoring::outcome::{Base, BatterFate, GameResult, Half, Outcome, Role, RunnerFate, Side};

/// Outs that end a half-inning.
pub const OUTS_PER_HALF: u8 = 3;
/// Most runs a single plate appearance can produce.
pub const MAX_RUNS_PER_PLAY: u32 = 4;

/// Base occupancy: at most one runner per base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bases([Option<Player>; 3]);

impl Bases {
    pub fn get(&self, base: Base) -> Option<&Player> {
        self.0[base.index()].as_ref()
    }

    pub fn is_occupied(&self, base: Base) -> bool {
        self.get(base).is_some()
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Base, &Player)> {
        Base::ALL
            .into_iter()
            .filter_map(move |b| self.get(b).map(|p| (b, p)))
    }

    /// Place a runner; fails if the base is already taken.
    fn place(&mut self, base: Base, runner: Player) -> Result<(), ScoringError> {
        let slot = &mut self.0[base.index()];
        if slot.is_some() {
            return Err(ScoringError::BaseConflict(base));
        }
        *slot = Some(runner);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.0 = Default::default();
    }
}

/// Per-inning runs for one side, keyed by inning number.
pub type LineScore = BTreeMap<u32, u32>;

/// Fate of one runner who was on base when the play started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerMove {
    pub from: Base,
    pub fate: RunnerFate,
}

/// Scorer input for one of our batters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateAppearance {
    pub batter: Player,
    pub outcome: Outcome,
    #[serde(default)]
    pub runners: Vec<RunnerMove>,
    pub batter_fate: BatterFate,
    #[serde(default)]
    pub runs_scored: u32,
}

/// Final tally produced when a game ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalScore {
    pub ltp_runs: u32,
    pub opp_runs: u32,
    pub result: GameResult,
    pub our_line: LineScore,
    pub opponent_line: LineScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_date: NaiveDate,
    pub opponent: String,
    pub inning: u32,
    pub half: Half,
    pub offense: Side,
    pub outs: u8,
    pub our_role: Role,
    pub our_line: LineScore,
    pub opponent_line: LineScore,
    pub runs_this_half: u32,
    pub bases: Bases,
    pub lineup: Vec<Player>,
    pub batter_cursor: usize,
}

impl GameState {
    /// First pitch: top of the first, with the away side batting.
    ///
    /// `lineup` must be non-empty; the scorer substitutes the roster for an
    /// empty lineup before calling this.
    pub fn new(game_date: NaiveDate, opponent: &str, our_role: Role, lineup: Vec<Player>) -> Self {
        // Whoever bats in the top half has the first offense.
        let offense = if our_role.batting_half() == Half::Top {
            Side::Us
        } else {
            Side::Opponent
        };
        GameState {
            game_date,
            opponent: opponent.trim().to_string(),
            inning: 1,
            half: Half::Top,
            offense,
            outs: 0,
            our_role,
            our_line: LineScore::new(),
            opponent_line: LineScore::new(),
            runs_this_half: 0,
            bases: Bases::default(),
            lineup,
            batter_cursor: 0,
        }
    }

    pub fn current_batter(&self) -> Option<&Player> {
        self.lineup.get(self.batter_cursor)
    }

    /// Apply one of our plate appearances and return the next state together
    /// with the event to log. Nothing is mutated on error.
    pub fn plate_appearance(
        &self,
        pa: &PlateAppearance,
        timestamp: NaiveDateTime,
    ) -> Result<(GameState, PlateAppearanceEvent), ScoringError> {
        if self.offense != Side::Us {
            return Err(ScoringError::WrongHalf {
                action: "record a plate appearance",
                batting: self.offense.as_str(),
            });
        }
        let expected = self.current_batter().ok_or(ScoringError::EmptyRoster)?;
        if *expected != pa.batter {
            return Err(ScoringError::BatterOutOfTurn {
                expected: expected.display_label(),
                got: pa.batter.display_label(),
            });
        }

        let (bases, outs_added) = self.resolve_bases(pa)?;
        let runs = pa.runs_scored.min(MAX_RUNS_PER_PLAY);

        let event = PlateAppearanceEvent {
            timestamp,
            game_date: self.game_date,
            opponent: self.opponent.clone(),
            inning: self.inning,
            half: self.half,
            first_name: pa.batter.first_name.clone(),
            last_name: pa.batter.last_name.clone(),
            jersey_number: pa.batter.jersey_number,
            outcome: pa.outcome,
            rbis: runs,
        };

        let mut next = self.clone();
        next.bases = bases;
        next.outs = (self.outs as u32 + outs_added).min(OUTS_PER_HALF as u32) as u8;
        next.runs_this_half = next.runs_this_half.saturating_add(runs);
        next.batter_cursor = (self.batter_cursor + 1) % self.lineup.len();
        if next.outs >= OUTS_PER_HALF {
            next.end_half();
        }
        Ok((next, event))
    }

    /// Work out base occupancy after the play. Only runners the scorer
    /// explicitly placed stay on base; nothing is forced along.
    fn resolve_bases(&self, pa: &PlateAppearance) -> Result<(Bases, u32), ScoringError> {
        let mut fates: [Option<RunnerFate>; 3] = [None; 3];
        for mv in &pa.runners {
            if !self.bases.is_occupied(mv.from) {
                return Err(ScoringError::NoRunnerOnBase(mv.from));
            }
            let slot = &mut fates[mv.from.index()];
            if slot.is_some() {
                return Err(ScoringError::BaseConflict(mv.from));
            }
            *slot = Some(mv.fate);
        }

        let mut after = Bases::default();
        let mut outs = 0;
        for (from, runner) in self.bases.occupied() {
            let fate = fates[from.index()].ok_or(ScoringError::MissingRunnerFate(from))?;
            match fate {
                RunnerFate::Hold => after.place(from, runner.clone())?,
                RunnerFate::Advance(to) => {
                    if to <= from {
                        return Err(ScoringError::InvalidAdvance { from, to });
                    }
                    after.place(to, runner.clone())?;
                }
                RunnerFate::Scores => {}
                RunnerFate::Out => outs += 1,
            }
        }
        match pa.batter_fate {
            BatterFate::Out => outs += 1,
            BatterFate::Scores => {}
            BatterFate::Reaches(base) => after.place(base, pa.batter.clone())?,
        }
        Ok((after, outs))
    }

    /// Commit the opponent's half as a single run total.
    pub fn opponent_half(&self, runs: u32) -> Result<GameState, ScoringError> {
        if self.offense != Side::Opponent {
            return Err(ScoringError::WrongHalf {
                action: "record the opponent's half",
                batting: self.offense.as_str(),
            });
        }
        let mut next = self.clone();
        next.runs_this_half = runs;
        next.end_half();
        Ok(next)
    }

    fn end_half(&mut self) {
        self.commit_pending_runs();
        self.outs = 0;
        self.bases.clear();
        self.offense = self.offense.other();
        if self.half == Half::Bottom {
            self.inning += 1;
        }
        self.half = self.half.flipped();
    }

    fn commit_pending_runs(&mut self) {
        let inning = self.inning;
        let line = match self.offense {
            Side::Us => &mut self.our_line,
            Side::Opponent => &mut self.opponent_line,
        };
        let committed = line.entry(inning).or_insert(0);
        *committed = committed.saturating_add(self.runs_this_half);
        self.runs_this_half = 0;
    }

    /// Runs for (us, opponent) including the half in progress. Sums saturate.
    pub fn totals(&self) -> (u32, u32) {
        let sum = |line: &LineScore| line.values().fold(0u32, |acc, r| acc.saturating_add(*r));
        let (ours, theirs) = (sum(&self.our_line), sum(&self.opponent_line));
        match self.offense {
            Side::Us => (ours.saturating_add(self.runs_this_half), theirs),
            Side::Opponent => (ours, theirs.saturating_add(self.runs_this_half)),
        }
    }

    /// Close out the game: pending runs are committed and the result decided.
    pub fn finish(&self) -> FinalScore {
        let mut closed = self.clone();
        if closed.runs_this_half > 0 {
            closed.commit_pending_runs();
        }
        let (ltp_runs, opp_runs) = closed.totals();
        FinalScore {
            ltp_runs,
            opp_runs,
            result: GameResult::from_scores(ltp_runs, opp_runs),
            our_line: closed.our_line,
            opponent_line: closed.opponent_line,
        }
    }
}

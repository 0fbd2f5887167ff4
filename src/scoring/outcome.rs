//! Closed vocabularies shared by the game state machine, the event log and the
//! stat aggregator.
//!
//! The outcome → counting-stat mapping lives in one table
//! ([`Outcome::classification`]) so the aggregator never re-derives it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;

// ── Plate-appearance outcomes ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Single,
    Double,
    Triple,
    #[serde(rename = "Home Run", alias = "HomeRun")]
    HomeRun,
    Walk,
    Strikeout,
    Out,
    #[serde(rename = "Double Play", alias = "DoublePlay")]
    DoublePlay,
    #[serde(rename = "Triple Play", alias = "TriplePlay")]
    TriplePlay,
}

/// Which hit counter an outcome bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitType {
    Single,
    Double,
    Triple,
    HomeRun,
}

impl HitType {
    /// Bases credited toward slugging.
    pub fn total_bases(self) -> u32 {
        match self {
            HitType::Single => 1,
            HitType::Double => 2,
            HitType::Triple => 3,
            HitType::HomeRun => 4,
        }
    }
}

/// Everything the aggregator needs to know about an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub at_bat: bool,
    pub hit: Option<HitType>,
    pub walk: bool,
    pub strikeout: bool,
}

const fn class(at_bat: bool, hit: Option<HitType>, walk: bool, strikeout: bool) -> Classification {
    Classification {
        at_bat,
        hit,
        walk,
        strikeout,
    }
}

impl Outcome {
    pub const ALL: [Outcome; 9] = [
        Outcome::Single,
        Outcome::Double,
        Outcome::Triple,
        Outcome::HomeRun,
        Outcome::Walk,
        Outcome::Strikeout,
        Outcome::Out,
        Outcome::DoublePlay,
        Outcome::TriplePlay,
    ];

    pub fn classification(self) -> Classification {
        match self {
            Outcome::Single => class(true, Some(HitType::Single), false, false),
            Outcome::Double => class(true, Some(HitType::Double), false, false),
            Outcome::Triple => class(true, Some(HitType::Triple), false, false),
            Outcome::HomeRun => class(true, Some(HitType::HomeRun), false, false),
            Outcome::Walk => class(false, None, true, false),
            Outcome::Strikeout => class(true, None, false, true),
            Outcome::Out => class(true, None, false, false),
            Outcome::DoublePlay => class(true, None, false, false),
            Outcome::TriplePlay => class(true, None, false, false),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Single => "Single",
            Outcome::Double => "Double",
            Outcome::Triple => "Triple",
            Outcome::HomeRun => "Home Run",
            Outcome::Walk => "Walk",
            Outcome::Strikeout => "Strikeout",
            Outcome::Out => "Out",
            Outcome::DoublePlay => "Double Play",
            Outcome::TriplePlay => "Triple Play",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Outcome::ALL
            .into_iter()
            .find(|o| o.as_str().eq_ignore_ascii_case(wanted) || format!("{:?}", o) == wanted)
            .ok_or_else(|| ParseEnumError::new("outcome", s))
    }
}

// ── Innings, sides, roles ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Half {
    Top,
    Bottom,
}

impl Half {
    pub fn flipped(self) -> Half {
        match self {
            Half::Top => Half::Bottom,
            Half::Bottom => Half::Top,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Half::Top => "Top",
            Half::Bottom => "Bottom",
        }
    }
}

impl FromStr for Half {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Half::Top),
            "bottom" | "bot" => Ok(Half::Bottom),
            _ => Err(ParseEnumError::new("half", s)),
        }
    }
}

/// The side currently batting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Us,
    Opponent,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Us => Side::Opponent,
            Side::Opponent => Side::Us,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Us => "us",
            Side::Opponent => "the opponent",
        }
    }
}

/// Our designation for the game. Away bats in the top half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Home,
    Away,
}

impl Role {
    pub fn batting_half(self) -> Half {
        match self {
            Role::Away => Half::Top,
            Role::Home => Half::Bottom,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Home => "Home",
            Role::Away => "Away",
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Role::Home),
            "away" => Ok(Role::Away),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

// ── Bases and fates ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Base {
    #[serde(rename = "1B", alias = "First")]
    First,
    #[serde(rename = "2B", alias = "Second")]
    Second,
    #[serde(rename = "3B", alias = "Third")]
    Third,
}

impl Base {
    pub const ALL: [Base; 3] = [Base::First, Base::Second, Base::Third];

    pub fn index(self) -> usize {
        match self {
            Base::First => 0,
            Base::Second => 1,
            Base::Third => 2,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Base::First => "1B",
            Base::Second => "2B",
            Base::Third => "3B",
        })
    }
}

/// What happened to a runner who started the play on base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerFate {
    Hold,
    Advance(Base),
    Scores,
    Out,
}

/// What happened to the batter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatterFate {
    Out,
    Scores,
    Reaches(Base),
}

// ── Final results ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    W,
    L,
    T,
}

impl GameResult {
    pub fn from_scores(ours: u32, theirs: u32) -> GameResult {
        match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => GameResult::W,
            std::cmp::Ordering::Less => GameResult::L,
            std::cmp::Ordering::Equal => GameResult::T,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::W => "W",
            GameResult::L => "L",
            GameResult::T => "T",
        }
    }
}

impl FromStr for GameResult {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "W" | "w" => Ok(GameResult::W),
            "L" | "l" => Ok(GameResult::L),
            "T" | "t" => Ok(GameResult::T),
            _ => Err(ParseEnumError::new("result", s)),
        }
    }
}

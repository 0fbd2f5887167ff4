use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::roster::Player;
use crate::scoring::outcome::{GameResult, Half, Outcome, Role};

/// One logged plate appearance. Immutable once appended; log order is
/// chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateAppearanceEvent {
    pub timestamp: NaiveDateTime,
    pub game_date: NaiveDate,
    pub opponent: String,
    pub inning: u32,
    pub half: Half,
    pub first_name: String,
    pub last_name: String,
    pub jersey_number: i64,
    pub outcome: Outcome,
    /// Runs batted in, 0–4
    pub rbis: u32,
}

impl PlateAppearanceEvent {
    pub fn player(&self) -> Player {
        Player {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            jersey_number: self.jersey_number,
        }
    }

    /// True when the event belongs to the game identified by date and opponent.
    pub fn belongs_to(&self, game_date: NaiveDate, opponent: &str) -> bool {
        self.game_date == game_date && self.opponent == opponent
    }
}

/// Cumulative batting line for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub first_name: String,
    pub last_name: String,
    pub jersey_number: i64,
    #[serde(rename = "PA")]
    pub pa: u32,
    #[serde(rename = "AB")]
    pub ab: u32,
    #[serde(rename = "H")]
    pub hits: u32,
    #[serde(rename = "1B")]
    pub singles: u32,
    #[serde(rename = "2B")]
    pub doubles: u32,
    #[serde(rename = "3B")]
    pub triples: u32,
    #[serde(rename = "HR")]
    pub home_runs: u32,
    #[serde(rename = "BB")]
    pub walks: u32,
    #[serde(rename = "K")]
    pub strikeouts: u32,
    #[serde(rename = "RBI")]
    pub rbi: u32,
    #[serde(rename = "AVG")]
    pub avg: f64,
    #[serde(rename = "OBP")]
    pub obp: f64,
    #[serde(rename = "SLG")]
    pub slg: f64,
}

/// One finalized game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonGameRecord {
    pub date: NaiveDate,
    pub opponent: String,
    pub ltp_runs: u32,
    pub opp_runs: u32,
    pub result: GameResult,
    pub ltp_role: Role,
}

/// Multi-season counting line keyed by player full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalLine {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "PA")]
    pub pa: u32,
    #[serde(rename = "1B")]
    pub singles: u32,
    #[serde(rename = "2B")]
    pub doubles: u32,
    #[serde(rename = "3B")]
    pub triples: u32,
    #[serde(rename = "HR")]
    pub home_runs: u32,
    #[serde(rename = "BB")]
    pub walks: u32,
    #[serde(rename = "K")]
    pub strikeouts: u32,
}

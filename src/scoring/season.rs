use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::SeasonGameRecord;
use crate::scoring::game::FinalScore;
use crate::scoring::outcome::{GameResult, Role};

impl SeasonGameRecord {
    pub fn from_final(date: NaiveDate, opponent: &str, role: Role, score: &FinalScore) -> Self {
        SeasonGameRecord {
            date,
            opponent: opponent.to_string(),
            ltp_runs: score.ltp_runs,
            opp_runs: score.opp_runs,
            result: score.result,
            ltp_role: role,
        }
    }

    /// Apply an edit and recompute the result from the (possibly new) score.
    pub fn apply_edit(&mut self, edit: &SeasonEdit) {
        if let Some(date) = edit.date {
            self.date = date;
        }
        if let Some(opponent) = &edit.opponent {
            self.opponent = opponent.trim().to_string();
        }
        if let Some(runs) = edit.ltp_runs {
            self.ltp_runs = runs;
        }
        if let Some(runs) = edit.opp_runs {
            self.opp_runs = runs;
        }
        self.result = GameResult::from_scores(self.ltp_runs, self.opp_runs);
    }
}

/// Partial update to a finalized game. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonEdit {
    pub date: Option<NaiveDate>,
    pub opponent: Option<String>,
    pub ltp_runs: Option<u32>,
    pub opp_runs: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeasonSummary {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub runs_for: u32,
    pub runs_against: u32,
    pub run_differential: i64,
}

impl SeasonSummary {
    pub fn from_records(records: &[SeasonGameRecord]) -> Self {
        let mut summary = SeasonSummary::default();
        for r in records {
            match r.result {
                GameResult::W => summary.wins += 1,
                GameResult::L => summary.losses += 1,
                GameResult::T => summary.ties += 1,
            }
            summary.runs_for = summary.runs_for.saturating_add(r.ltp_runs);
            summary.runs_against = summary.runs_against.saturating_add(r.opp_runs);
        }
        summary.run_differential = summary.runs_for as i64 - summary.runs_against as i64;
        summary
    }

    /// "W-L-T"
    pub fn record_label(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

/// Game log for display: newest first, stored order kept for same-day games.
/// Each entry carries its store index so edits and deletes can address it.
pub fn newest_first(records: &[SeasonGameRecord]) -> Vec<(usize, SeasonGameRecord)> {
    let mut listed: Vec<(usize, SeasonGameRecord)> = records.iter().cloned().enumerate().collect();
    listed.sort_by(|a, b| b.1.date.cmp(&a.1.date));
    listed
}

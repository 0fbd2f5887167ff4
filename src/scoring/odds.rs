/// Outcome probabilities and American-odds quotes for one hitter.
///
/// A hitter's plate appearances are split into seven exclusive buckets: the
/// five countable outcomes, strikeouts, and a residual "ball in play out"
///
///   residual = PA − (1B + 2B + 3B + HR + BB + K),  clamped at 0
///
/// Each bucket's probability is `count / PA`. The quote follows the
/// moneyline convention:
///   p ≥ 0.5  →  −100·p / (1 − p)   (favorite)
///   p < 0.5  →  100·(1 − p) / p    (underdog)
/// with no quote for p = 0. A certainty (p = 1) also has no finite quote.
use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::db::models::HistoricalLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OddsOutcome {
    Single,
    Double,
    Triple,
    #[serde(rename = "Home Run")]
    HomeRun,
    Walk,
    Strikeout,
    #[serde(rename = "Ball-in-Play Out")]
    BallInPlayOut,
}

impl OddsOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            OddsOutcome::Single => "Single",
            OddsOutcome::Double => "Double",
            OddsOutcome::Triple => "Triple",
            OddsOutcome::HomeRun => "Home Run",
            OddsOutcome::Walk => "Walk",
            OddsOutcome::Strikeout => "Strikeout",
            OddsOutcome::BallInPlayOut => "Ball-in-Play Out",
        }
    }
}

impl fmt::Display for OddsOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OddsRow {
    pub outcome: OddsOutcome,
    pub count: u32,
    /// Percent, one decimal place.
    pub probability: f64,
    pub american_odds: Option<i32>,
}

/// Build the odds table for one hitter, highest probability first.
///
/// Returns an empty table when the hitter has no plate appearances.
pub fn compute_odds(line: &HistoricalLine) -> Vec<OddsRow> {
    if line.pa == 0 {
        return Vec::new();
    }

    let counted = [
        line.singles,
        line.doubles,
        line.triples,
        line.home_runs,
        line.walks,
        line.strikeouts,
    ]
    .into_iter()
    .fold(0u32, u32::saturating_add);
    if counted > line.pa {
        warn!(
            player = %line.name,
            pa = line.pa,
            counted,
            "Outcome counts exceed plate appearances, residual outs clamped to zero"
        );
    }
    let residual = line.pa.saturating_sub(counted);

    let buckets = [
        (OddsOutcome::Single, line.singles),
        (OddsOutcome::Double, line.doubles),
        (OddsOutcome::Triple, line.triples),
        (OddsOutcome::HomeRun, line.home_runs),
        (OddsOutcome::Walk, line.walks),
        (OddsOutcome::Strikeout, line.strikeouts),
        (OddsOutcome::BallInPlayOut, residual),
    ];

    let pa = line.pa as f64;
    let mut rows: Vec<OddsRow> = buckets
        .into_iter()
        .map(|(outcome, count)| {
            let p = count as f64 / pa;
            OddsRow {
                outcome,
                count,
                probability: (p * 1000.0).round() / 10.0,
                american_odds: american_odds(p),
            }
        })
        .collect();

    // Stable, so equal probabilities keep bucket order.
    rows.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    rows
}

/// Moneyline quote for a probability in [0, 1].
pub fn american_odds(p: f64) -> Option<i32> {
    if !(p > 0.0 && p < 1.0) {
        return None;
    }
    let odds = if p >= 0.5 {
        -100.0 * p / (1.0 - p)
    } else {
        100.0 * (1.0 - p) / p
    };
    Some(odds.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hitter(pa: u32, singles: u32, doubles: u32, home_runs: u32, walks: u32, strikeouts: u32) -> HistoricalLine {
        HistoricalLine {
            pa,
            singles,
            doubles,
            home_runs,
            walks,
            strikeouts,
            ..HistoricalLine::zero("Ava Reyes")
        }
    }

    #[test]
    fn no_plate_appearances_gives_empty_table() {
        assert!(compute_odds(&hitter(0, 0, 0, 0, 0, 0)).is_empty());
    }

    #[test]
    fn coin_flip_is_minus_one_hundred() {
        assert_eq!(american_odds(0.5), Some(-100));
    }

    #[test]
    fn favorite_negative_underdog_positive() {
        assert_eq!(american_odds(0.75), Some(-300));
        assert_eq!(american_odds(0.25), Some(300));
        assert_eq!(american_odds(0.1), Some(900));
        assert_eq!(american_odds(0.0), None);
        assert_eq!(american_odds(1.0), None);
    }

    #[test]
    fn probabilities_cover_every_plate_appearance() {
        // 20 PA: 5 1B, 2 2B, 1 HR, 3 BB, 4 K → 5 balls in play for outs
        let rows = compute_odds(&hitter(20, 5, 2, 1, 3, 4));
        assert_eq!(rows.len(), 7);

        let total: f64 = rows.iter().map(|r| r.probability).sum();
        assert_relative_eq!(total, 100.0, epsilon = 0.5);
        let counted: u32 = rows.iter().map(|r| r.count).sum();
        assert_eq!(counted, 20);

        let residual = rows.iter().find(|r| r.outcome == OddsOutcome::BallInPlayOut).unwrap();
        assert_eq!(residual.count, 5);
        assert_relative_eq!(residual.probability, 25.0);
        assert_eq!(residual.american_odds, Some(300));

        let triple = rows.iter().find(|r| r.outcome == OddsOutcome::Triple).unwrap();
        assert_eq!(triple.count, 0);
        assert_eq!(triple.american_odds, None);
    }

    #[test]
    fn rows_sorted_by_descending_probability() {
        let rows = compute_odds(&hitter(20, 5, 2, 1, 3, 4));
        assert!(rows.windows(2).all(|w| w[0].probability >= w[1].probability));
        // 1B and the residual tie at 25%; bucket order breaks the tie.
        assert_eq!(rows[0].outcome, OddsOutcome::Single);
        assert_eq!(rows[1].outcome, OddsOutcome::BallInPlayOut);
    }

    #[test]
    fn inconsistent_counts_clamp_residual() {
        // Categories sum to 12 but only 10 PA were recorded.
        let rows = compute_odds(&hitter(10, 6, 0, 0, 3, 3));
        let residual = rows.iter().find(|r| r.outcome == OddsOutcome::BallInPlayOut).unwrap();
        assert_eq!(residual.count, 0);
        assert_eq!(residual.american_odds, None);
    }

    #[test]
    fn saturated_counts_do_not_overflow() {
        let rows = compute_odds(&hitter(u32::MAX, u32::MAX, 0, 0, u32::MAX, 0));
        assert_eq!(rows.len(), 7);
        let residual = rows.iter().find(|r| r.outcome == OddsOutcome::BallInPlayOut).unwrap();
        assert_eq!(residual.count, 0);
        assert_eq!(rows[0].outcome, OddsOutcome::Single);
        assert_eq!(rows[0].american_odds, None);
    }

    #[test]
    fn probability_rounds_to_one_decimal() {
        // 1 of 3 → 33.3%
        let rows = compute_odds(&hitter(3, 1, 0, 0, 0, 0));
        let single = rows.iter().find(|r| r.outcome == OddsOutcome::Single).unwrap();
        assert_relative_eq!(single.probability, 33.3);
        assert_eq!(single.american_odds, Some(200));
    }
}

//! Stat aggregator: a deterministic fold from plate-appearance events to
//! cumulative batting lines.
//!
//! [`StatBook::apply`] is the incremental path used while scoring;
//! [`aggregate`] is the replay path used after undo or a cascading delete.
//! Both run the same per-event update, so they always agree.

use std::collections::HashMap;

use crate::db::models::{PlateAppearanceEvent, PlayerStats};
use crate::roster::Player;
use crate::scoring::outcome::HitType;

/// RBI credited by a single plate appearance is capped here.
pub const MAX_RBI_PER_PA: u32 = 4;

impl PlayerStats {
    pub fn empty(player: &Player) -> Self {
        PlayerStats {
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            jersey_number: player.jersey_number,
            pa: 0,
            ab: 0,
            hits: 0,
            singles: 0,
            doubles: 0,
            triples: 0,
            home_runs: 0,
            walks: 0,
            strikeouts: 0,
            rbi: 0,
            avg: 0.0,
            obp: 0.0,
            slg: 0.0,
        }
    }

    pub fn player(&self) -> Player {
        Player {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            jersey_number: self.jersey_number,
        }
    }

    pub fn total_bases(&self) -> u32 {
        [
            (HitType::Single, self.singles),
            (HitType::Double, self.doubles),
            (HitType::Triple, self.triples),
            (HitType::HomeRun, self.home_runs),
        ]
        .into_iter()
        .map(|(hit, count)| hit.total_bases() * count)
        .sum()
    }

    /// Count one plate appearance and refresh the rate stats.
    pub fn record(&mut self, event: &PlateAppearanceEvent) {
        let class = event.outcome.classification();
        self.pa += 1;
        if class.at_bat {
            self.ab += 1;
        }
        if let Some(hit) = class.hit {
            self.hits += 1;
            match hit {
                HitType::Single => self.singles += 1,
                HitType::Double => self.doubles += 1,
                HitType::Triple => self.triples += 1,
                HitType::HomeRun => self.home_runs += 1,
            }
        }
        if class.walk {
            self.walks += 1;
        }
        if class.strikeout {
            self.strikeouts += 1;
        }
        self.rbi += event.rbis.min(MAX_RBI_PER_PA);
        self.refresh_rates();
    }

    fn refresh_rates(&mut self) {
        self.avg = ratio(self.hits, self.ab);
        self.obp = ratio(self.hits + self.walks, self.pa);
        self.slg = ratio(self.total_bases(), self.ab);
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-player batting lines, in order of each player's first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatBook {
    rows: Vec<PlayerStats>,
    index: HashMap<Player, usize>,
}

impl StatBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from previously persisted rows.
    pub fn from_rows(rows: Vec<PlayerStats>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.player(), i))
            .collect();
        Self { rows, index }
    }

    pub fn apply(&mut self, event: &PlateAppearanceEvent) {
        let player = event.player();
        let idx = match self.index.get(&player) {
            Some(&i) => i,
            None => {
                self.rows.push(PlayerStats::empty(&player));
                self.index.insert(player, self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        self.rows[idx].record(event);
    }

    pub fn get(&self, player: &Player) -> Option<&PlayerStats> {
        self.index.get(player).map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[PlayerStats] {
        &self.rows
    }
}

/// Replay a whole event sequence from an empty book.
pub fn aggregate<'a, I>(events: I) -> StatBook
where
    I: IntoIterator<Item = &'a PlateAppearanceEvent>,
{
    let mut book = StatBook::new();
    for event in events {
        book.apply(event);
    }
    book
}

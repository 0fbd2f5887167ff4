use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Canonical player identity. Uniqueness key is the whole triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub first_name: String,
    pub last_name: String,
    pub jersey_number: i64,
}

impl Player {
    pub fn new(first_name: &str, last_name: &str, jersey_number: i64) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            jersey_number,
        }
    }

    /// "First Last", the key historical stat sources are joined on.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// "First Last (#N)", the label a scorer picks players by.
    pub fn display_label(&self) -> String {
        format!(
            "{} {} (#{})",
            self.first_name, self.last_name, self.jersey_number
        )
    }
}

/// Read-only source of player identities.
pub trait RosterProvider: Send + Sync {
    /// All players, in roster order.
    fn players(&self) -> Vec<Player>;

    fn find_by_label(&self, label: &str) -> Option<Player> {
        let label = label.trim();
        self.players()
            .into_iter()
            .find(|p| p.display_label() == label)
    }

    fn contains(&self, player: &Player) -> bool {
        self.players().iter().any(|p| p == player)
    }
}

/// In-memory roster, usually loaded from `players.csv`.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<Player>,
}

const ROSTER_COLUMNS: [&str; 3] = ["first_name", "last_name", "jersey_number"];

impl Roster {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Load a roster CSV. A missing file is an empty roster; missing columns
    /// read as blank and an unparsable jersey number reads as 0.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No roster file yet, starting with an empty roster");
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open roster: {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to read roster: {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
        let headers = reader.headers()?.clone();
        let idx: Vec<Option<usize>> = ROSTER_COLUMNS
            .iter()
            .map(|col| headers.iter().position(|h| h.trim() == *col))
            .collect();
        for (col, i) in ROSTER_COLUMNS.iter().zip(&idx) {
            if i.is_none() {
                warn!(column = col, "Roster is missing a column, treating it as blank");
            }
        }

        let mut players = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();
            let jersey = field(idx[2]).parse::<f64>().map(|n| n as i64).unwrap_or(0);
            players.push(Player::new(field(idx[0]), field(idx[1]), jersey));
        }
        Ok(Self::new(players))
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }
}

impl RosterProvider for Roster {
    fn players(&self) -> Vec<Player> {
        self.players.clone()
    }

    fn contains(&self, player: &Player) -> bool {
        self.players.contains(player)
    }
}

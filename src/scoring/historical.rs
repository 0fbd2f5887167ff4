//! Multi-season counting stats keyed by player full name.
//!
//! Past seasons arrive as user-maintained CSV exports with uneven headers, so
//! the importer is forgiving: missing columns read as zero, junk numbers read
//! as zero and "Totals" rows are dropped.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::db::models::{HistoricalLine, PlayerStats};

const NUMERIC_COLUMNS: [&str; 7] = ["PA", "1B", "2B", "3B", "HR", "BB", "K"];

impl HistoricalLine {
    pub fn zero(name: &str) -> Self {
        HistoricalLine {
            name: name.to_string(),
            pa: 0,
            singles: 0,
            doubles: 0,
            triples: 0,
            home_runs: 0,
            walks: 0,
            strikeouts: 0,
        }
    }

    /// Counts saturate on corrupt exports.
    pub fn add(&mut self, other: &HistoricalLine) {
        self.pa = self.pa.saturating_add(other.pa);
        self.singles = self.singles.saturating_add(other.singles);
        self.doubles = self.doubles.saturating_add(other.doubles);
        self.triples = self.triples.saturating_add(other.triples);
        self.home_runs = self.home_runs.saturating_add(other.home_runs);
        self.walks = self.walks.saturating_add(other.walks);
        self.strikeouts = self.strikeouts.saturating_add(other.strikeouts);
    }
}

impl From<&PlayerStats> for HistoricalLine {
    fn from(stats: &PlayerStats) -> Self {
        HistoricalLine {
            name: stats.player().full_name(),
            pa: stats.pa,
            singles: stats.singles,
            doubles: stats.doubles,
            triples: stats.triples,
            home_runs: stats.home_runs,
            walks: stats.walks,
            strikeouts: stats.strikeouts,
        }
    }
}

/// Read one historical season export. A missing file reads as empty.
pub fn import_csv(path: &Path) -> Result<Vec<HistoricalLine>> {
    if !path.exists() {
        warn!(path = %path.display(), "Historical stats file not found, skipping");
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open historical stats: {}", path.display()))?;
    let lines = import_reader(file)
        .with_context(|| format!("Failed to read historical stats: {}", path.display()))?;
    info!(path = %path.display(), players = lines.len(), "Imported historical stats");
    Ok(lines)
}

/// Decode one field. Anything that is not valid UTF-8 is read as latin-1,
/// where every byte is the code point of the same value.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.trim().to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect::<String>().trim().to_string(),
    }
}

pub fn import_reader<R: std::io::Read>(rdr: R) -> Result<Vec<HistoricalLine>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    // Byte records so a latin-1 export still loads.
    let headers: Vec<String> = reader.byte_headers()?.iter().map(decode_field).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let name_idx = column("Name");
    if name_idx.is_none() {
        warn!("Historical stats have no Name column; every row will be unnamed");
    }
    let numeric_idx: Vec<Option<usize>> = NUMERIC_COLUMNS.iter().map(|c| column(*c)).collect();
    for (col, idx) in NUMERIC_COLUMNS.iter().zip(&numeric_idx) {
        if idx.is_none() {
            warn!(column = col, "Historical stats missing column, zero-filling");
        }
    }

    let mut lines = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(decode_field)
                .unwrap_or_default()
        };
        let name = field(name_idx);
        if name.eq_ignore_ascii_case("totals") {
            continue;
        }
        let n: Vec<u32> = numeric_idx.iter().map(|&i| parse_count(&field(i))).collect();
        lines.push(HistoricalLine {
            name,
            pa: n[0],
            singles: n[1],
            doubles: n[2],
            triples: n[3],
            home_runs: n[4],
            walks: n[5],
            strikeouts: n[6],
        });
    }
    Ok(lines)
}

/// Spreadsheet exports write counts as "12", "12.0" or leave them blank.
fn parse_count(raw: &str) -> u32 {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u32)
        .unwrap_or(0)
}

/// Sum lines by exact name across any number of sources.
pub fn summarize<'a, I>(lines: I) -> BTreeMap<String, HistoricalLine>
where
    I: IntoIterator<Item = &'a HistoricalLine>,
{
    let mut summary: BTreeMap<String, HistoricalLine> = BTreeMap::new();
    for line in lines {
        summary
            .entry(line.name.clone())
            .or_insert_with(|| HistoricalLine::zero(&line.name))
            .add(line);
    }
    summary
}

/// Add a per-game delta to the row with the same name, or append it.
pub fn merge_delta(rows: &mut Vec<HistoricalLine>, delta: &HistoricalLine) {
    match rows.iter_mut().find(|r| r.name == delta.name) {
        Some(row) => row.add(delta),
        None => rows.push(delta.clone()),
    }
}

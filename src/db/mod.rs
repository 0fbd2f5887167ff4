use anyhow::{Context, Result};
use rusqlite::types::{Type, Value};
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod csv_table;
pub mod models;
pub mod table;

use models::*;
pub use csv_table::CsvTable;
pub use table::{MemoryTable, TableStore};

/// Thread-safe SQLite connection pool (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }

    /// Typed handle on one of the scorebook tables.
    pub fn table<R: SqlRow>(&self) -> SqliteTable<R> {
        SqliteTable {
            db: self.clone(),
            _row: PhantomData,
        }
    }
}

// ── Row mapping ────────────────────────────────────────────────────────────────

/// A row type stored in its own SQLite table.
pub trait SqlRow: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self>;

    /// Values in `COLUMNS` order.
    fn values(&self) -> Vec<Value>;
}

/// `SqlRow`-backed table. Row order is insertion (`rowid`) order.
pub struct SqliteTable<R> {
    db: Database,
    _row: PhantomData<fn() -> R>,
}

impl<R: SqlRow> SqliteTable<R> {
    fn select_sql() -> String {
        format!(
            "SELECT {} FROM {} ORDER BY rowid",
            R::COLUMNS.join(", "),
            R::TABLE
        )
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(",")
        )
    }
}

impl<R: SqlRow> TableStore<R> for SqliteTable<R> {
    fn load(&self) -> Result<Vec<R>> {
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&Self::select_sql())?;
        let rows = stmt
            .query_map([], R::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn append(&self, row: &R) -> Result<()> {
        let conn = self.db.conn()?;
        conn.execute(&Self::insert_sql(), params_from_iter(row.values()))?;
        Ok(())
    }

    fn replace(&self, rows: &[R]) -> Result<()> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", R::TABLE), [])?;
        {
            let mut stmt = tx.prepare(&Self::insert_sql())?;
            for row in rows {
                stmt.execute(params_from_iter(row.values()))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn truncate_last(&self) -> Result<Option<R>> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        let last: Option<i64> = tx.query_row(
            &format!("SELECT MAX(rowid) FROM {}", R::TABLE),
            [],
            |r| r.get(0),
        )?;
        let Some(rowid) = last else {
            return Ok(None);
        };
        let row = tx.query_row(
            &format!(
                "SELECT {} FROM {} WHERE rowid = ?1",
                R::COLUMNS.join(", "),
                R::TABLE
            ),
            [rowid],
            R::from_row,
        )?;
        tx.execute(&format!("DELETE FROM {} WHERE rowid = ?1", R::TABLE), [rowid])?;
        tx.commit()?;
        Ok(Some(row))
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn parse_col<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn int(n: impl Into<i64>) -> Value {
    Value::Integer(n.into())
}

impl SqlRow for PlateAppearanceEvent {
    const TABLE: &'static str = "plate_appearances";
    const COLUMNS: &'static [&'static str] = &[
        "timestamp",
        "game_date",
        "opponent",
        "inning",
        "half",
        "first_name",
        "last_name",
        "jersey_number",
        "outcome",
        "rbis",
    ];

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(PlateAppearanceEvent {
            timestamp: row.get(0)?,
            game_date: row.get(1)?,
            opponent: row.get(2)?,
            inning: row.get(3)?,
            half: parse_col(row, 4)?,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
            jersey_number: row.get(7)?,
            outcome: parse_col(row, 8)?,
            rbis: row.get(9)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()),
            text(&self.game_date.to_string()),
            text(&self.opponent),
            int(self.inning),
            text(self.half.as_str()),
            text(&self.first_name),
            text(&self.last_name),
            int(self.jersey_number),
            text(self.outcome.as_str()),
            int(self.rbis),
        ]
    }
}

impl SqlRow for PlayerStats {
    const TABLE: &'static str = "player_stats";
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "jersey_number",
        "pa",
        "ab",
        "h",
        "singles",
        "doubles",
        "triples",
        "home_runs",
        "walks",
        "strikeouts",
        "rbi",
        "avg",
        "obp",
        "slg",
    ];

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(PlayerStats {
            first_name: row.get(0)?,
            last_name: row.get(1)?,
            jersey_number: row.get(2)?,
            pa: row.get(3)?,
            ab: row.get(4)?,
            hits: row.get(5)?,
            singles: row.get(6)?,
            doubles: row.get(7)?,
            triples: row.get(8)?,
            home_runs: row.get(9)?,
            walks: row.get(10)?,
            strikeouts: row.get(11)?,
            rbi: row.get(12)?,
            avg: row.get(13)?,
            obp: row.get(14)?,
            slg: row.get(15)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.first_name),
            text(&self.last_name),
            int(self.jersey_number),
            int(self.pa),
            int(self.ab),
            int(self.hits),
            int(self.singles),
            int(self.doubles),
            int(self.triples),
            int(self.home_runs),
            int(self.walks),
            int(self.strikeouts),
            int(self.rbi),
            Value::Real(self.avg),
            Value::Real(self.obp),
            Value::Real(self.slg),
        ]
    }
}

impl SqlRow for SeasonGameRecord {
    const TABLE: &'static str = "season_history";
    const COLUMNS: &'static [&'static str] =
        &["date", "opponent", "ltp_runs", "opp_runs", "result", "ltp_role"];

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(SeasonGameRecord {
            date: row.get(0)?,
            opponent: row.get(1)?,
            ltp_runs: row.get(2)?,
            opp_runs: row.get(3)?,
            result: parse_col(row, 4)?,
            ltp_role: parse_col(row, 5)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.date.to_string()),
            text(&self.opponent),
            int(self.ltp_runs),
            int(self.opp_runs),
            text(self.result.as_str()),
            text(self.ltp_role.as_str()),
        ]
    }
}

impl SqlRow for HistoricalLine {
    const TABLE: &'static str = "season_stats";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "pa",
        "singles",
        "doubles",
        "triples",
        "home_runs",
        "walks",
        "strikeouts",
    ];

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(HistoricalLine {
            name: row.get(0)?,
            pa: row.get(1)?,
            singles: row.get(2)?,
            doubles: row.get(3)?,
            triples: row.get(4)?,
            home_runs: row.get(5)?,
            walks: row.get(6)?,
            strikeouts: row.get(7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            int(self.pa),
            int(self.singles),
            int(self.doubles),
            int(self.triples),
            int(self.home_runs),
            int(self.walks),
            int(self.strikeouts),
        ]
    }
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS plate_appearances (
    timestamp     TEXT    NOT NULL,
    game_date     TEXT    NOT NULL,
    opponent      TEXT    NOT NULL,
    inning        INTEGER NOT NULL,
    half          TEXT    NOT NULL,
    first_name    TEXT    NOT NULL,
    last_name     TEXT    NOT NULL,
    jersey_number INTEGER NOT NULL,
    outcome       TEXT    NOT NULL,
    rbis          INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS player_stats (
    first_name    TEXT    NOT NULL,
    last_name     TEXT    NOT NULL,
    jersey_number INTEGER NOT NULL,
    pa            INTEGER NOT NULL,
    ab            INTEGER NOT NULL,
    h             INTEGER NOT NULL,
    singles       INTEGER NOT NULL,
    doubles       INTEGER NOT NULL,
    triples       INTEGER NOT NULL,
    home_runs     INTEGER NOT NULL,
    walks         INTEGER NOT NULL,
    strikeouts    INTEGER NOT NULL,
    rbi           INTEGER NOT NULL,
    avg           REAL    NOT NULL,
    obp           REAL    NOT NULL,
    slg           REAL    NOT NULL
);

CREATE TABLE IF NOT EXISTS season_history (
    date      TEXT    NOT NULL,
    opponent  TEXT    NOT NULL,
    ltp_runs  INTEGER NOT NULL,
    opp_runs  INTEGER NOT NULL,
    result    TEXT    NOT NULL,
    ltp_role  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS season_stats (
    name        TEXT    NOT NULL,
    pa          INTEGER NOT NULL DEFAULT 0,
    singles     INTEGER NOT NULL DEFAULT 0,
    doubles     INTEGER NOT NULL DEFAULT 0,
    triples     INTEGER NOT NULL DEFAULT 0,
    home_runs   INTEGER NOT NULL DEFAULT 0,
    walks       INTEGER NOT NULL DEFAULT 0,
    strikeouts  INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_plate_appearances_game ON plate_appearances(game_date, opponent);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::outcome::{GameResult, Half, Outcome, Role};
    use chrono::NaiveDate;

    fn event(outcome: Outcome, rbis: u32) -> PlateAppearanceEvent {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        PlateAppearanceEvent {
            timestamp: date.and_hms_opt(19, 5, 0).unwrap(),
            game_date: date,
            opponent: "Sluggers".into(),
            inning: 2,
            half: Half::Bottom,
            first_name: "Bo".into(),
            last_name: "Lee".into(),
            jersey_number: 7,
            outcome,
            rbis,
        }
    }

    #[test]
    fn event_table_keeps_append_order() {
        let db = Database::open_in_memory().unwrap();
        let table = db.table::<PlateAppearanceEvent>();
        table.append(&event(Outcome::Single, 0)).unwrap();
        table.append(&event(Outcome::TriplePlay, 0)).unwrap();
        table.append(&event(Outcome::HomeRun, 2)).unwrap();

        let rows = table.load().unwrap();
        assert_eq!(
            rows.iter().map(|e| e.outcome).collect::<Vec<_>>(),
            vec![Outcome::Single, Outcome::TriplePlay, Outcome::HomeRun]
        );
        assert_eq!(rows[2], event(Outcome::HomeRun, 2));
    }

    #[test]
    fn truncate_last_removes_only_the_newest_row() {
        let db = Database::open_in_memory().unwrap();
        let table = db.table::<PlateAppearanceEvent>();
        table.append(&event(Outcome::Walk, 0)).unwrap();
        table.append(&event(Outcome::Double, 1)).unwrap();

        assert_eq!(table.truncate_last().unwrap(), Some(event(Outcome::Double, 1)));
        assert_eq!(table.load().unwrap(), vec![event(Outcome::Walk, 0)]);
        table.truncate_last().unwrap();
        assert_eq!(table.truncate_last().unwrap(), None);
    }

    #[test]
    fn replace_rewrites_the_table() {
        let db = Database::open_in_memory().unwrap();
        let table = db.table::<SeasonGameRecord>();
        let game = |opp: &str| SeasonGameRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            opponent: opp.into(),
            ltp_runs: 3,
            opp_runs: 3,
            result: GameResult::T,
            ltp_role: Role::Home,
        };
        table.append(&game("A")).unwrap();
        table.append(&game("B")).unwrap();
        table.replace(&[game("C")]).unwrap();
        assert_eq!(table.load().unwrap(), vec![game("C")]);
    }

    #[test]
    fn stats_rows_round_trip_rates() {
        let db = Database::open_in_memory().unwrap();
        let table = db.table::<PlayerStats>();
        let row = PlayerStats {
            first_name: "Bo".into(),
            last_name: "Lee".into(),
            jersey_number: 7,
            pa: 10,
            ab: 4,
            hits: 4,
            singles: 3,
            doubles: 0,
            triples: 0,
            home_runs: 1,
            walks: 1,
            strikeouts: 0,
            rbi: 2,
            avg: 1.0,
            obp: 0.5,
            slg: 1.75,
        };
        table.replace(std::slice::from_ref(&row)).unwrap();
        assert_eq!(table.load().unwrap(), vec![row]);
    }
}

use clap::{Parser, ValueEnum};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Where the scorebook tables live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    /// One SQLite database file
    Sqlite,
    /// One CSV file per table under `--data-dir`
    Csv,
    /// Nothing persisted; for dry runs
    Memory,
}

/// Live softball scorebook: game scoring, season history and batter odds
#[derive(Parser, Debug, Clone)]
#[command(name = "ltp-scorebook", version, about)]
pub struct Config {
    /// Storage backend for the event log, stats and season tables
    #[arg(long, env = "STORAGE", value_enum, default_value = "sqlite")]
    pub storage: StorageBackend,

    /// SQLite database path (sqlite backend)
    #[arg(long, env = "DATABASE_PATH", default_value = "scorebook.db")]
    pub database_path: String,

    /// Directory holding the table files (csv backend)
    #[arg(long, env = "DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Roster CSV with first_name,last_name,jersey_number columns
    #[arg(long, env = "ROSTER_PATH", default_value = "players.csv")]
    pub roster_path: PathBuf,

    /// Past-season stat exports (Name,PA,1B,2B,3B,HR,BB,K), read-only
    #[arg(long = "history-csv", env = "HISTORY_CSV", value_delimiter = ',')]
    pub history_csv: Vec<PathBuf>,

    /// API listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8501")]
    pub listen_addr: String,

    /// Our team's name, shown on the scoreboard and season page
    #[arg(long, env = "TEAM_NAME", default_value = "LTP")]
    pub team_name: String,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.team_name.trim().is_empty() {
            anyhow::bail!("team_name must not be empty");
        }
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("listen_addr '{}' is not a valid socket address", self.listen_addr);
        }
        let mut seen = HashSet::new();
        for path in &self.history_csv {
            if !seen.insert(path) {
                anyhow::bail!("history csv '{}' is listed more than once", path.display());
            }
        }
        Ok(())
    }
}

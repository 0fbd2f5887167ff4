use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::debug;

use super::table::TableStore;

/// A table kept as one CSV file with a header row.
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the target, so readers never see a half-written table.
#[derive(Debug, Clone)]
pub struct CsvTable<R> {
    path: PathBuf,
    _row: PhantomData<fn() -> R>,
}

impl<R> CsvTable<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _row: PhantomData,
        }
    }
}

impl<R: Serialize + DeserializeOwned> CsvTable<R> {
    fn read_all(&self) -> Result<Vec<R>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open CSV table: {}", self.path.display()))?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<R>, _>>()
            .with_context(|| format!("Failed to parse CSV table: {}", self.path.display()))?;
        Ok(rows)
    }

    fn write_all(&self, rows: &[R]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace CSV table: {}", self.path.display()))?;

        debug!(path = %self.path.display(), rows = rows.len(), "CSV table written");
        Ok(())
    }
}

impl<R: Serialize + DeserializeOwned + Clone> TableStore<R> for CsvTable<R> {
    fn load(&self) -> Result<Vec<R>> {
        self.read_all()
    }

    fn append(&self, row: &R) -> Result<()> {
        let mut rows = self.read_all()?;
        rows.push(row.clone());
        self.write_all(&rows)
    }

    fn replace(&self, rows: &[R]) -> Result<()> {
        self.write_all(rows)
    }

    fn truncate_last(&self) -> Result<Option<R>> {
        let mut rows = self.read_all()?;
        let last = rows.pop();
        if last.is_some() {
            self.write_all(&rows)?;
        }
        Ok(last)
    }
}

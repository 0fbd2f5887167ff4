use anyhow::Result;

/// An ordered, persisted table of rows.
///
/// Each write is all-or-nothing: after a crash the table holds either the old
/// rows or the new rows, never a prefix.
pub trait TableStore<R>: Send {
    /// All rows in append order. A table that was never written is empty.
    fn load(&self) -> Result<Vec<R>>;

    fn append(&self, row: &R) -> Result<()>;

    /// Rewrite the whole table.
    fn replace(&self, rows: &[R]) -> Result<()>;

    /// Remove the most recently appended row and return it.
    fn truncate_last(&self) -> Result<Option<R>>;
}

/// Volatile table, used by tests and for dry runs.
#[derive(Debug, Default)]
pub struct MemoryTable<R> {
    rows: std::sync::Mutex<Vec<R>>,
}

impl<R> MemoryTable<R> {
    pub fn new() -> Self {
        Self {
            rows: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, Vec<R>>> {
        self.rows
            .lock()
            .map_err(|_| anyhow::anyhow!("memory table lock poisoned"))
    }
}

impl<R: Clone + Send> TableStore<R> for MemoryTable<R> {
    fn load(&self) -> Result<Vec<R>> {
        Ok(self.rows()?.clone())
    }

    fn append(&self, row: &R) -> Result<()> {
        self.rows()?.push(row.clone());
        Ok(())
    }

    fn replace(&self, rows: &[R]) -> Result<()> {
        *self.rows()? = rows.to_vec();
        Ok(())
    }

    fn truncate_last(&self) -> Result<Option<R>> {
        Ok(self.rows()?.pop())
    }
}

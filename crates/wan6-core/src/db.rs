use crate::error::{Error, Result};
use crate::types::WanState;
use chrono::Utc;
use redb::{Database, DatabaseError, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime state table: interface key -> WanState (JSON)
const STATE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("wan_state");

/// Key of the single WAN unit managed by this tool.
const WAN_KEY: &str = "wan0";

const OPEN_ATTEMPTS: u32 = 50;
const OPEN_BACKOFF: Duration = Duration::from_millis(20);

/// Persistent store for the runtime WAN variables.
///
/// redb locks the file for as long as a `Database` lives, and the dhcp6c and
/// udhcpc hooks run as separate processes, so the file is only opened for the
/// duration of a single transaction.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    attempts: u32,
    backoff: Duration,
}

impl StateStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            path: path.to_path_buf(),
            attempts: OPEN_ATTEMPTS,
            backoff: OPEN_BACKOFF,
        };

        let db = store.database()?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(STATE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(store)
    }

    /// Override how often and how long to wait for another process to
    /// release the database lock.
    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    fn database(&self) -> Result<Database> {
        let mut delay = self.backoff;
        for attempt in 1..=self.attempts {
            match Database::create(&self.path) {
                Ok(db) => return Ok(db),
                Err(DatabaseError::DatabaseAlreadyOpen) if attempt < self.attempts => {
                    tracing::debug!(attempt, path = %self.path.display(), "state database busy");
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(Duration::from_millis(200));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::Database(format!(
            "{} still locked after {} attempts",
            self.path.display(),
            self.attempts
        )))
    }

    /// Current state; the default (all empty) state if nothing was saved yet.
    pub fn load(&self) -> Result<WanState> {
        let db = self.database()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(STATE_TABLE)?;
        match table.get(WAN_KEY)? {
            Some(v) => Ok(serde_json::from_str(v.value())?),
            None => Ok(WanState::default()),
        }
    }

    pub fn save(&self, state: &WanState) -> Result<()> {
        self.update(|s| *s = state.clone()).map(|_| ())
    }

    /// Load, modify and save in one write transaction. Returns the saved state.
    pub fn update<F>(&self, f: F) -> Result<WanState>
    where
        F: FnOnce(&mut WanState),
    {
        let db = self.database()?;
        let write_txn = db.begin_write()?;
        let state = {
            let mut table = write_txn.open_table(STATE_TABLE)?;
            let mut state = match table.get(WAN_KEY)? {
                Some(v) => serde_json::from_str(v.value())?,
                None => WanState::default(),
            };
            f(&mut state);
            state.updated_at = Some(Utc::now());
            let json = serde_json::to_string(&state)?;
            table.insert(WAN_KEY, json.as_str())?;
            state
        };
        write_txn.commit()?;
        tracing::debug!(?state, "wan state updated");
        Ok(state)
    }

    pub fn clear_dns6(&self) -> Result<()> {
        self.update(|s| s.dns6.clear()).map(|_| ())
    }
}

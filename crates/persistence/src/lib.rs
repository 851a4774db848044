#![deny(warnings)]

//! Persistence layer: key-value stores and the load/save boundary for the
//! records the user edits.
//!
//! Records are stored as a JSON blob under a single key, the way a browser
//! keeps them in local storage. Loading never fails: a missing, unreadable or
//! structurally invalid blob falls back to the record's defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};
use trip_core::{
    validate_assumptions, validate_trip_budget, Assumptions, TripBudget, ValidationError,
};

/// Key holding the scenario assumptions.
pub const ASSUMPTIONS_KEY: &str = "budget_assumptions";
/// Key holding the planner record.
pub const TRIP_BUDGET_KEY: &str = "trip_budget";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed store file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),
}

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store, mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object of key → string kept in one file. Every write rewrites the
/// file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// A record persisted as one JSON blob.
pub trait PersistedRecord: Serialize + DeserializeOwned + Default {
    /// Storage key.
    const KEY: &'static str;
    /// JSON pointers that must be present for a blob to be trusted.
    const REQUIRED: &'static [&'static str];

    fn validate(&self) -> Result<(), ValidationError>;
}

impl PersistedRecord for Assumptions {
    const KEY: &'static str = ASSUMPTIONS_KEY;
    const REQUIRED: &'static [&'static str] = &[
        "/flights/lhrToSin",
        "/accommodation/bali",
        "/assumedNights/bali",
        "/scenario2/newSinToLhr",
        "/scenario3/qatarBundle",
    ];

    fn validate(&self) -> Result<(), ValidationError> {
        validate_assumptions(self)
    }
}

impl PersistedRecord for TripBudget {
    const KEY: &'static str = TRIP_BUDGET_KEY;
    const REQUIRED: &'static [&'static str] = &[
        "/flights/lhrToSin",
        "/accommodation/bali",
        "/dailyExpenses/food",
        "/totalDays",
    ];

    fn validate(&self) -> Result<(), ValidationError> {
        validate_trip_budget(self)
    }
}

/// Decode a stored blob, falling back to defaults on any problem.
pub fn decode_record<R: PersistedRecord>(raw: Option<&str>) -> R {
    let Some(raw) = raw else {
        debug!(key = R::KEY, "no stored record, using defaults");
        return R::default();
    };
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(key = R::KEY, error = %e, "stored record is not JSON, using defaults");
            return R::default();
        }
    };
    if let Some(missing) = R::REQUIRED.iter().find(|p| value.pointer(p).is_none()) {
        warn!(key = R::KEY, field = *missing, "stored record incomplete, using defaults");
        return R::default();
    }
    let record: R = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            warn!(key = R::KEY, error = %e, "stored record malformed, using defaults");
            return R::default();
        }
    };
    if let Err(e) = record.validate() {
        warn!(key = R::KEY, error = %e, "stored record invalid, using defaults");
        return R::default();
    }
    record
}

/// Load/save boundary between a store and one record type.
#[derive(Debug)]
pub struct Repository<S, R> {
    store: S,
    _record: PhantomData<R>,
}

/// Repository for scenario assumptions.
pub type AssumptionsRepository<S> = Repository<S, Assumptions>;
/// Repository for the planner record.
pub type TripBudgetRepository<S> = Repository<S, TripBudget>;

impl<S: KeyValueStore, R: PersistedRecord> Repository<S, R> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// The stored record, or defaults when absent or untrustworthy. A store
    /// read failure is logged and also yields defaults.
    pub fn load(&self) -> R {
        match self.store.get(R::KEY) {
            Ok(raw) => decode_record(raw.as_deref()),
            Err(e) => {
                warn!(key = R::KEY, error = %e, "store read failed, using defaults");
                R::default()
            }
        }
    }

    pub fn save(&mut self, record: &R) -> Result<(), StoreError> {
        let blob = serde_json::to_string(record)?;
        self.store.set(R::KEY, &blob)?;
        debug!(key = R::KEY, bytes = blob.len(), "record saved");
        Ok(())
    }

    /// Persist and return the defaults.
    pub fn reset(&mut self) -> Result<R, StoreError> {
        let record = R::default();
        self.save(&record)?;
        Ok(record)
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

/// Open (creating if needed) the SQLite database at `url` and ensure the
/// key-value schema exists.
pub async fn init_db(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // One connection so `sqlite::memory:` stays a single database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;
    Ok(pool)
}

/// Key-value storage in the SQLite save database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The stored record, or defaults; read failures are logged.
    pub async fn load<R: PersistedRecord>(&self) -> R {
        match self.get(R::KEY).await {
            Ok(raw) => decode_record(raw.as_deref()),
            Err(e) => {
                warn!(key = R::KEY, error = %e, "database read failed, using defaults");
                R::default()
            }
        }
    }

    pub async fn save<R: PersistedRecord>(&self, record: &R) -> Result<(), StoreError> {
        self.set(R::KEY, &serde_json::to_string(record)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }

    #[test]
    fn missing_record_loads_defaults() {
        let repo = AssumptionsRepository::new(MemoryStore::default());
        assert_eq!(repo.load(), Assumptions::default());
    }

    #[test]
    fn save_then_load() {
        let mut repo = AssumptionsRepository::new(MemoryStore::default());
        let mut a = Assumptions::default();
        a.set_amount("flights.sinToKul", Decimal::new(75, 0)).unwrap();
        repo.save(&a).unwrap();
        assert_eq!(repo.load(), a);
    }

    #[test]
    fn untrusted_blobs_fall_back_to_defaults() {
        let defaults = Assumptions::default();
        assert_eq!(decode_record::<Assumptions>(Some("not json")), defaults);
        assert_eq!(decode_record::<Assumptions>(Some("[]")), defaults);
        let incomplete = r#"{"flights": {"lhrToSin": 1}, "accommodation": {"bali": 2}}"#;
        assert_eq!(decode_record::<Assumptions>(Some(incomplete)), defaults);

        let mut v = serde_json::to_value(&defaults).unwrap();
        v["flights"]["sinToKul"] = serde_json::Value::String("sixty".into());
        assert_eq!(decode_record::<Assumptions>(Some(&v.to_string())), defaults);

        let mut v = serde_json::to_value(&defaults).unwrap();
        v["assumedNights"]["singapore"] = 0.into();
        assert_eq!(decode_record::<Assumptions>(Some(&v.to_string())), defaults);

        let mut v = serde_json::to_value(&defaults).unwrap();
        v["flights"]["lhrToSin"] = 5e28.into();
        assert_eq!(decode_record::<Assumptions>(Some(&v.to_string())), defaults);

        let mut v = serde_json::to_value(TripBudget::default()).unwrap();
        v["dailyExpenses"]["food"] = 1e12.into();
        assert_eq!(decode_record::<TripBudget>(Some(&v.to_string())), TripBudget::default());
    }

    #[test]
    fn reset_persists_defaults() {
        let mut store = MemoryStore::default();
        store.set(ASSUMPTIONS_KEY, "{}").unwrap();
        let mut repo = AssumptionsRepository::new(store);
        assert_eq!(repo.reset().unwrap(), Assumptions::default());
        let store = repo.into_inner();
        assert!(store.get(ASSUMPTIONS_KEY).unwrap().unwrap().contains("qatarBundle"));
    }

    #[test]
    fn records_use_separate_keys() {
        let mut budget = TripBudget::default();
        budget.total_days = 20;
        let mut repo = TripBudgetRepository::new(MemoryStore::default());
        repo.save(&budget).unwrap();
        let store = repo.into_inner();
        assert!(store.get(TRIP_BUDGET_KEY).unwrap().is_some());
        assert!(store.get(ASSUMPTIONS_KEY).unwrap().is_none());
        assert_eq!(TripBudgetRepository::new(store).load().total_days, 20);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("planner.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("theme", "dark").unwrap();
            store.set(ASSUMPTIONS_KEY, "{}").unwrap();
            store.remove(ASSUMPTIONS_KEY).unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get(ASSUMPTIONS_KEY).unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner.json");
        fs::write(&path, "{oops").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Json(_))));
    }

    #[tokio::test]
    async fn sqlite_store_upserts() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        let store = SqliteStore::new(pool);
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "one").await.unwrap();
        store.set("k", "two").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("two"));
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_store_round_trips_records() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        let store = SqliteStore::new(pool);
        assert_eq!(store.load::<Assumptions>().await, Assumptions::default());
        let mut a = Assumptions::default();
        a.set_amount("scenario2.newSinToLhr", Decimal::new(199, 0)).unwrap();
        store.save(&a).await.unwrap();
        assert_eq!(store.load::<Assumptions>().await, a);
    }
}

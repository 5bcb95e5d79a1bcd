//! SQLite-backed append-only store of real behavior samples for retraining.
//! Required numeric fields are checked on the way in and on the way out; a bad row
//! fails the whole read rather than being coerced.

use crate::detection::TrackId;
use crate::error::{Error, Result};
use crate::features::{BehaviorRecord, FrameBehaviors, FEATURE_DIM};
use crate::model::Dataset;
use crate::risk::RiskLevel;
use chrono::Utc;
use ndarray::Array2;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

pub struct TrainingStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS training_samples (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        recorded_at INTEGER NOT NULL,
        track_id INTEGER NOT NULL,
        speed REAL,
        acceleration REAL,
        lane_changes INTEGER,
        erratic_movements INTEGER,
        behavior_score INTEGER,
        risk_level TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_training_recorded_at ON training_samples(recorded_at);
"#;

fn check_record(track_id: TrackId, r: &BehaviorRecord) -> Result<i64> {
    let invalid = |field| Error::InvalidRecord { track_id, field };
    let id = i64::try_from(track_id).map_err(|_| invalid("track_id"))?;
    if !r.speed.is_finite() {
        return Err(invalid("speed"));
    }
    if r.acceleration.is_some_and(|a| !a.is_finite()) {
        return Err(invalid("acceleration"));
    }
    Ok(id)
}

/// Required numeric column: NULL, text or blob is malformed.
fn numeric(row: &Row<'_>, col: usize, id: i64, field: &'static str) -> Result<f64> {
    match optional_numeric(row, col, id, field)? {
        Some(v) => Ok(v),
        None => Err(Error::MalformedSample { row: id, field }),
    }
}

/// Nullable numeric column; NULL means undefined.
fn optional_numeric(row: &Row<'_>, col: usize, id: i64, field: &'static str) -> Result<Option<f64>> {
    let v = match row.get_ref(col)? {
        ValueRef::Null => return Ok(None),
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(f) => f,
        ValueRef::Text(_) | ValueRef::Blob(_) => {
            return Err(Error::MalformedSample { row: id, field })
        }
    };
    if !v.is_finite() {
        return Err(Error::MalformedSample { row: id, field });
    }
    Ok(Some(v))
}

impl TrainingStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Append one frame's records in a single transaction. Every record is checked
    /// before anything is written. Returns the number of rows added.
    pub fn append(&self, records: &FrameBehaviors) -> Result<usize> {
        let checked = records
            .iter()
            .map(|(id, r)| check_record(*id, r).map(|stored_id| (stored_id, r)))
            .collect::<Result<Vec<_>>>()?;
        if checked.is_empty() {
            return Ok(0);
        }

        let ts = Utc::now().timestamp_millis();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO training_samples
                    (recorded_at, track_id, speed, acceleration, lane_changes, erratic_movements, behavior_score, risk_level)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (track_id, r) in &checked {
                stmt.execute(params![
                    ts,
                    track_id,
                    r.speed,
                    r.acceleration,
                    r.lane_changes,
                    r.erratic_movements,
                    r.behavior_score,
                    r.risk_level.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = checked.len(), "training samples appended");
        Ok(checked.len())
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM training_samples", [], |row| row.get(0))?;
        Ok(n.max(0) as usize)
    }

    /// All samples as a labeled dataset, labels taken from the stored risk level.
    /// Undefined acceleration becomes 0; any other missing value is an error.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, speed, acceleration, lane_changes, erratic_movements, behavior_score, risk_level
             FROM training_samples ORDER BY id",
        )?;
        let mut rows = stmt.query([])?;
        let mut features: Vec<[f64; FEATURE_DIM]> = Vec::new();
        let mut labels: Vec<RiskLevel> = Vec::new();

        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let sample = [
                numeric(row, 1, id, "speed")?,
                optional_numeric(row, 2, id, "acceleration")?.unwrap_or(0.0),
                numeric(row, 3, id, "lane_changes")?,
                numeric(row, 4, id, "erratic_movements")?,
                numeric(row, 5, id, "behavior_score")?,
            ];
            let label = match row.get_ref(6)? {
                ValueRef::Text(t) => std::str::from_utf8(t)
                    .ok()
                    .and_then(|s| s.parse::<RiskLevel>().ok()),
                _ => None,
            }
            .ok_or(Error::MalformedSample {
                row: id,
                field: "risk_level",
            })?;
            features.push(sample);
            labels.push(label);
        }

        let x = if features.is_empty() {
            Array2::zeros((0, FEATURE_DIM))
        } else {
            Array2::from(features)
        };
        Ok(Dataset::new(x, labels))
    }
}

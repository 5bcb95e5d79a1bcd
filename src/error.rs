//! Crate error type. Insufficient history and untrained models are not errors;
//! everything here is surfaced to callers of train/save/load and the training store.

use crate::detection::TrackId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to persist file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("model must be trained before saving")]
    Untrained,

    #[error("feature matrix has {rows} rows but {labels} labels were supplied")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("expected {expected} feature columns, found {found}")]
    FeatureWidth { expected: usize, found: usize },

    /// A stored or supplied training row; `row` is the store's row id or the matrix row index.
    #[error("malformed training sample {row}: {field} is missing or not a finite number")]
    MalformedSample { row: i64, field: &'static str },

    #[error("behavior record for track {track_id} cannot be stored: {field} is out of range or not finite")]
    InvalidRecord { track_id: TrackId, field: &'static str },

    #[error("corrupt model bundle: {0}")]
    CorruptBundle(String),

    #[error("classifier lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;

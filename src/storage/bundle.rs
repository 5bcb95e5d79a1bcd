//! Model bundle file: fitted scaler + forest + class order + trained flag, written
//! atomically (temp file in the same directory, then rename) and checksummed.

use crate::error::{Error, Result};
use crate::features::FEATURE_DIM;
use crate::model::{FittedModel, RandomForest, StandardScaler};
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const FORMAT: &str = "drive-risk-model";
const VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub model: RandomForest,
    pub scaler: StandardScaler,
    /// Label of each forest class index
    pub classes: Vec<RiskLevel>,
    pub is_trained: bool,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    sha256: String,
    payload: String,
}

fn checksum(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// Write `bytes` to `path` so readers see either the old file or the complete new one.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

impl ModelBundle {
    pub fn write(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_string(self)?;
        let envelope = Envelope {
            format: FORMAT.to_string(),
            version: VERSION,
            sha256: checksum(&payload),
            payload,
        };
        write_atomic(path, &serde_json::to_vec(&envelope)?)
    }

    /// Read and fully validate a bundle; nothing is returned unless every check passes.
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)?;
        let envelope: Envelope = serde_json::from_slice(&raw)
            .map_err(|e| Error::CorruptBundle(format!("unreadable envelope: {e}")))?;
        if envelope.format != FORMAT || envelope.version != VERSION {
            return Err(Error::CorruptBundle(format!(
                "unsupported format {} v{}",
                envelope.format, envelope.version
            )));
        }
        if checksum(&envelope.payload) != envelope.sha256 {
            return Err(Error::CorruptBundle("checksum mismatch".into()));
        }
        let bundle: ModelBundle = serde_json::from_str(&envelope.payload)
            .map_err(|e| Error::CorruptBundle(format!("unreadable payload: {e}")))?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn validate(&self) -> Result<()> {
        let corrupt = |msg: String| Err(Error::CorruptBundle(msg));
        if !self.is_trained {
            return corrupt("bundle is not marked trained".into());
        }
        if self.classes.is_empty() {
            return corrupt("no classes".into());
        }
        let mut sorted = self.classes.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != self.classes.len() {
            return corrupt("duplicate classes".into());
        }
        if self.model.n_classes() != self.classes.len() {
            return corrupt(format!(
                "model has {} classes, bundle lists {}",
                self.model.n_classes(),
                self.classes.len()
            ));
        }
        if self.scaler.n_features() != FEATURE_DIM
            || self.scaler.scale.len() != FEATURE_DIM
            || self.model.n_features() != FEATURE_DIM
        {
            return corrupt(format!("expected {FEATURE_DIM} features"));
        }
        let finite = self.scaler.mean.iter().all(|m| m.is_finite())
            && self.scaler.scale.iter().all(|s| s.is_finite() && *s > 0.0);
        if !finite {
            return corrupt("invalid scaler parameters".into());
        }
        self.model.validate().map_err(Error::CorruptBundle)
    }

    pub fn into_fitted(self) -> FittedModel {
        FittedModel {
            scaler: self.scaler,
            model: self.model,
            classes: self.classes,
        }
    }
}

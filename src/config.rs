//! Analyzer configuration. Scoring weights and thresholds are fixed constants in
//! [`crate::risk`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Kinematics parameters
    pub behavior: BehaviorConfig,
    /// Random forest hyperparameters
    pub classifier: ClassifierConfig,
    /// Model bundle and training data locations
    pub storage: StorageConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Assumed constant frame rate of the source (frames per second)
    pub frame_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub n_estimators: usize,
    /// None grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered per split; None means sqrt(n_features)
    pub max_features: Option<usize>,
    pub random_state: u64,
    /// Total synthetic samples, split evenly across the three labels
    pub synthetic_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Model bundle file name under `data_dir`
    pub model_file: String,
    /// Training sample database file name under `data_dir`
    pub training_db: String,
    /// Append every analyzed behavior record to the training store
    pub accumulate_training_data: bool,
    /// Retrain on accumulated data after this many new samples
    pub retrain_every: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            behavior: BehaviorConfig::default(),
            classifier: ClassifierConfig::default(),
            storage: StorageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self { frame_rate: 30.0 }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            random_state: 42,
            synthetic_samples: 1000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".drive-risk"),
            model_file: "behavior_model.json".to_string(),
            training_db: "training.db".to_string(),
            accumulate_training_data: false,
            retrain_every: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl StorageConfig {
    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join(&self.model_file)
    }

    pub fn training_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.training_db)
    }
}

impl AnalyzerConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<AnalyzerConfig>(&data) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults");
                Self::default()
            }
        }
    }
}

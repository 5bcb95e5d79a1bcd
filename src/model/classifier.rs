//! Trainable risk classifier with an explicit untrained → trained lifecycle.
//!
//! Class order is captured at training time and stored with the model; every
//! probability is attached to its label through that order, never by position.

use super::forest::{argmax, ForestParams, RandomForest};
use super::scaler::StandardScaler;
use super::{synthetic, Dataset};
use crate::config::ClassifierConfig;
use crate::detection::TrackId;
use crate::error::{Error, Result};
use crate::features::{extract_features, FrameBehaviors, FEATURE_DIM};
use crate::risk::RiskLevel;
use crate::storage::{ModelBundle, TrainingStore};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Probability per label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ClassProbabilities {
    pub safe: f64,
    pub risky: f64,
    pub dangerous: f64,
}

impl ClassProbabilities {
    pub fn get(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Safe => self.safe,
            RiskLevel::Risky => self.risky,
            RiskLevel::Dangerous => self.dangerous,
        }
    }

    fn set(&mut self, level: RiskLevel, p: f64) {
        match level {
            RiskLevel::Safe => self.safe = p,
            RiskLevel::Risky => self.risky = p,
            RiskLevel::Dangerous => self.dangerous = p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub prediction: RiskLevel,
    /// Highest class probability
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
}

pub type Verdicts = BTreeMap<TrackId, Verdict>;

/// Where training rows come from. Empty supplied or accumulated data falls back to synthetic.
pub enum TrainingSource<'a> {
    Synthetic,
    Supplied(Dataset),
    Accumulated(&'a TrainingStore),
}

impl TrainingSource<'_> {
    pub(crate) fn into_dataset(self, config: &ClassifierConfig) -> Result<Dataset> {
        let fallback = || synthetic::generate(config.synthetic_samples, config.random_state);
        let data = match self {
            TrainingSource::Synthetic => return Ok(fallback()),
            TrainingSource::Supplied(d) => d,
            TrainingSource::Accumulated(store) => store.load_dataset()?,
        };
        if data.is_empty() {
            warn!("no real training samples; falling back to synthetic data");
            return Ok(fallback());
        }
        Ok(data)
    }
}

/// Scaler, forest and the label of each forest class index.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub model: RandomForest,
    pub classes: Vec<RiskLevel>,
}

enum ModelState {
    Untrained,
    Trained(Box<FittedModel>),
}

pub struct RiskClassifier {
    config: ClassifierConfig,
    state: ModelState,
}

impl RiskClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            state: ModelState::Untrained,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, ModelState::Trained(_))
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        match &self.state {
            ModelState::Trained(m) => Some(m),
            ModelState::Untrained => None,
        }
    }

    /// Class order captured at the last training.
    pub fn classes(&self) -> Option<&[RiskLevel]> {
        self.fitted().map(|m| m.classes.as_slice())
    }

    pub fn extract_features(records: &FrameBehaviors) -> Array2<f64> {
        extract_features(records)
    }

    /// Fit scaler and forest, swap them in together, return in-sample accuracy.
    pub fn train(&mut self, source: TrainingSource<'_>) -> Result<f64> {
        let data = source.into_dataset(&self.config)?;
        let (fitted, accuracy) = fit(&self.config, data)?;
        self.state = ModelState::Trained(Box::new(fitted));
        Ok(accuracy)
    }

    /// Train on synthetic data if nothing has been fitted yet. Returns whether it trained.
    pub fn ensure_trained(&mut self) -> Result<bool> {
        if self.is_trained() {
            return Ok(false);
        }
        info!("classifier untrained; training on synthetic data");
        self.train(TrainingSource::Synthetic)?;
        Ok(true)
    }

    /// Verdict per track id, training first if needed.
    pub fn predict(&mut self, records: &FrameBehaviors) -> Result<Verdicts> {
        self.ensure_trained()?;
        self.predict_trained(records)
    }

    /// Like [`predict`](Self::predict) but never trains; `Error::Untrained` if nothing is fitted.
    pub fn predict_trained(&self, records: &FrameBehaviors) -> Result<Verdicts> {
        let fitted = self.fitted().ok_or(Error::Untrained)?;
        if records.is_empty() {
            return Ok(Verdicts::new());
        }
        let x = extract_features(records);
        let verdicts = fitted.predict_matrix(x.view())?;
        Ok(records.keys().copied().zip(verdicts).collect())
    }

    pub fn to_bundle(&self) -> Result<ModelBundle> {
        let fitted = self.fitted().ok_or(Error::Untrained)?;
        Ok(ModelBundle {
            model: fitted.model.clone(),
            scaler: fitted.scaler.clone(),
            classes: fitted.classes.clone(),
            is_trained: true,
        })
    }

    /// Persist scaler, forest and class order as one bundle. Fails if untrained.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_bundle()?.write(path)?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }

    /// Load a bundle. Missing file: `Ok(false)`, state untouched. Corrupt or incompatible
    /// bundle: state untouched until a fresh synthetic model is trained and written back.
    pub fn load(&mut self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        match ModelBundle::read(path) {
            Ok(bundle) => {
                self.state = ModelState::Trained(Box::new(bundle.into_fitted()));
                info!(path = %path.display(), "model loaded");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "error loading saved model; training new model");
                self.train(TrainingSource::Synthetic)?;
                self.save(path)?;
            }
        }
        Ok(true)
    }

    /// Append records to the real training data store. Returns rows written.
    pub fn save_training_data(&self, store: &TrainingStore, records: &FrameBehaviors) -> Result<usize> {
        store.append(records)
    }
}

impl FittedModel {
    fn predict_matrix(&self, x: ArrayView2<f64>) -> Result<Vec<Verdict>> {
        if x.ncols() != self.scaler.n_features() {
            return Err(Error::FeatureWidth {
                expected: self.scaler.n_features(),
                found: x.ncols(),
            });
        }
        let scaled = self.scaler.transform(x);
        let proba = self.model.predict_proba(scaled.view());
        Ok(proba
            .rows()
            .into_iter()
            .map(|p| {
                let mut probabilities = ClassProbabilities::default();
                for (level, v) in self.classes.iter().zip(p.iter()) {
                    probabilities.set(*level, *v);
                }
                let best = argmax(p.iter().copied());
                Verdict {
                    prediction: self.classes[best],
                    confidence: p[best],
                    probabilities,
                }
            })
            .collect())
    }
}

fn fit(config: &ClassifierConfig, data: Dataset) -> Result<(FittedModel, f64)> {
    let Dataset { x, y } = data;
    if x.ncols() != FEATURE_DIM {
        return Err(Error::FeatureWidth {
            expected: FEATURE_DIM,
            found: x.ncols(),
        });
    }
    if x.nrows() != y.len() {
        return Err(Error::ShapeMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    for (row, values) in x.rows().into_iter().enumerate() {
        if let Some(col) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::MalformedSample {
                row: row as i64,
                field: FEATURE_NAMES[col],
            });
        }
    }

    // sorted by label name, independent of the order labels first appear in
    let mut classes: Vec<RiskLevel> = y.clone();
    classes.sort_by_key(|c| c.as_str());
    classes.dedup();
    let index: Vec<usize> = y
        .iter()
        .map(|label| classes.iter().position(|c| c == label).unwrap_or_default())
        .collect();

    let scaler = StandardScaler::fit(x.view());
    let scaled = scaler.transform(x.view());
    let model = RandomForest::fit(scaled.view(), &index, classes.len(), &ForestParams::from(config));

    let predicted = model.predict(scaled.view());
    let correct = predicted.iter().zip(&index).filter(|(p, t)| p == t).count();
    let accuracy = correct as f64 / index.len() as f64;
    info!(samples = index.len(), classes = classes.len(), accuracy, "model trained");

    Ok((
        FittedModel {
            scaler,
            model,
            classes,
        },
        accuracy,
    ))
}

pub(crate) const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "speed",
    "acceleration",
    "lane_changes",
    "erratic_movements",
    "behavior_score",
];

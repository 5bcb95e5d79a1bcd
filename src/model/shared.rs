//! Classifier handle shared across analysis sessions. Predictions take the read lock;
//! training and loading take the write lock so scaler and forest swap as one unit.

use super::classifier::{RiskClassifier, TrainingSource, Verdicts};
use crate::error::{Error, Result};
use crate::features::FrameBehaviors;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone)]
pub struct SharedClassifier {
    inner: Arc<RwLock<RiskClassifier>>,
}

impl SharedClassifier {
    pub fn new(classifier: RiskClassifier) -> Self {
        Self {
            inner: Arc::new(RwLock::new(classifier)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RiskClassifier>> {
        self.inner.read().map_err(|_| Error::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RiskClassifier>> {
        self.inner.write().map_err(|_| Error::LockPoisoned)
    }

    pub fn is_trained(&self) -> Result<bool> {
        Ok(self.read()?.is_trained())
    }

    /// Returns whether this call trained the model.
    pub fn ensure_trained(&self) -> Result<bool> {
        if self.is_trained()? {
            return Ok(false);
        }
        // another handle may have trained between the two locks
        self.write()?.ensure_trained()
    }

    pub fn predict(&self, records: &FrameBehaviors) -> Result<Verdicts> {
        self.ensure_trained()?;
        self.read()?.predict_trained(records)
    }

    /// Training rows are gathered before the write lock is taken.
    pub fn train(&self, source: TrainingSource<'_>) -> Result<f64> {
        let config = self.read()?.config().clone();
        let data = source.into_dataset(&config)?;
        self.write()?.train(TrainingSource::Supplied(data))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.read()?.save(path)
    }

    pub fn load(&self, path: &Path) -> Result<bool> {
        self.write()?.load(path)
    }

    /// Run `f` with shared access to the classifier.
    pub fn with<R>(&self, f: impl FnOnce(&RiskClassifier) -> R) -> Result<R> {
        let guard = self.read()?;
        Ok(f(&*guard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;

    #[test]
    fn clones_share_state() {
        let a = SharedClassifier::new(RiskClassifier::new(ClassifierConfig {
            n_estimators: 5,
            ..ClassifierConfig::default()
        }));
        let b = a.clone();
        assert!(a.ensure_trained().unwrap());
        assert!(b.is_trained().unwrap());
        assert!(!b.ensure_trained().unwrap());
    }
}

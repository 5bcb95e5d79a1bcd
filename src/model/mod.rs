//! Risk classifier: standardization + random forest over behavior feature vectors.

mod classifier;
mod forest;
mod scaler;
mod shared;
pub mod synthetic;

pub use classifier::{ClassProbabilities, FittedModel, RiskClassifier, TrainingSource, Verdict, Verdicts};
pub use forest::{ForestParams, RandomForest};
pub use scaler::StandardScaler;
pub use shared::SharedClassifier;

use crate::risk::RiskLevel;
use ndarray::Array2;

/// Labeled feature rows; `x` has one row per entry of `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Vec<RiskLevel>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Vec<RiskLevel>) -> Self {
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty() || self.x.nrows() == 0
    }
}

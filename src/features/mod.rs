//! Per-track kinematic features and pattern detectors from raw detections.

mod kinematics;
mod patterns;
mod pipeline;
mod track;

pub use kinematics::{acceleration, speed};
pub use patterns::{detect_erratic_movement, detect_lane_change, ERRATIC_WINDOW, LANE_CHANGE_WINDOW};
pub use pipeline::BehaviorAnalyzer;
pub use track::{
    Track, TrackStore, Window, ACCELERATION_HISTORY, POSITION_HISTORY, SPEED_HISTORY,
};

use crate::detection::{Point, TrackId};
use crate::risk::RiskLevel;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of columns in a feature row:
/// speed, acceleration, lane changes, erratic movements, behavior score.
pub const FEATURE_DIM: usize = 5;

/// Snapshot of one track after one analyzed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorRecord {
    pub speed: f64,
    /// None until the track has two speed samples
    pub acceleration: Option<f64>,
    pub lane_changes: u32,
    pub erratic_movements: u32,
    pub behavior_score: u32,
    pub risk_level: RiskLevel,
    pub center: Point,
}

impl BehaviorRecord {
    /// Classifier input row. Undefined acceleration becomes 0 here only.
    pub fn to_vector(&self) -> [f64; FEATURE_DIM] {
        [
            self.speed,
            self.acceleration.unwrap_or(0.0),
            f64::from(self.lane_changes),
            f64::from(self.erratic_movements),
            f64::from(self.behavior_score),
        ]
    }
}

/// Records for one frame, keyed by track id.
pub type FrameBehaviors = BTreeMap<TrackId, BehaviorRecord>;

/// Feature matrix with one row per record, in key order. Empty input gives shape (0, 5).
pub fn extract_features(records: &FrameBehaviors) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((records.len(), FEATURE_DIM));
    for (mut row, record) in out.rows_mut().into_iter().zip(records.values()) {
        for (cell, v) in row.iter_mut().zip(record.to_vector()) {
            *cell = v;
        }
    }
    out
}

//! Frame-level and session-level aggregates over behavior records.

use super::engine::RiskLevel;
use crate::detection::TrackId;
use crate::features::BehaviorRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RiskDistribution {
    pub safe: usize,
    pub risky: usize,
    pub dangerous: usize,
}

impl RiskDistribution {
    pub fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Safe => self.safe += 1,
            RiskLevel::Risky => self.risky += 1,
            RiskLevel::Dangerous => self.dangerous += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.safe + self.risky + self.dangerous
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub total_vehicles: usize,
    pub risk_distribution: RiskDistribution,
    pub average_score: f64,
    pub alert_level: AlertLevel,
}

impl FrameSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a BehaviorRecord>) -> Self {
        let mut distribution = RiskDistribution::default();
        let mut total_score: u64 = 0;
        for r in records {
            distribution.add(r.risk_level);
            total_score += u64::from(r.behavior_score);
        }
        let total = distribution.total();
        let average_score = if total == 0 {
            0.0
        } else {
            (total_score as f64 / total as f64 * 100.0).round() / 100.0
        };
        let alert_level = if distribution.dangerous > 0 {
            AlertLevel::High
        } else if distribution.risky > 0 {
            AlertLevel::Medium
        } else {
            AlertLevel::Low
        };
        Self {
            total_vehicles: total,
            risk_distribution: distribution,
            average_score,
            alert_level,
        }
    }
}

/// Per-vehicle worst risk level seen over a whole session.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    worst: HashMap<TrackId, RiskLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_unique_vehicles: usize,
    pub dangerous_vehicles: usize,
    pub risky_vehicles: usize,
    pub safe_vehicles: usize,
}

impl SessionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, id: TrackId, level: RiskLevel) {
        self.worst
            .entry(id)
            .and_modify(|w| *w = (*w).max(level))
            .or_insert(level);
    }

    pub fn totals(&self) -> SessionTotals {
        let mut d = RiskDistribution::default();
        for level in self.worst.values() {
            d.add(*level);
        }
        SessionTotals {
            total_unique_vehicles: d.total(),
            dangerous_vehicles: d.dangerous,
            risky_vehicles: d.risky,
            safe_vehicles: d.safe,
        }
    }
}

//! Combines kinematics and detector counters into a bounded behavior score; produces risk level.
//! Weights and thresholds are fixed so labels written to the training store stay comparable.

use crate::features::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_SCORE: u32 = 100;

const HIGH_SPEED: f64 = 100.0;
const MEDIUM_SPEED: f64 = 50.0;
const HIGH_SPEED_POINTS: u32 = 30;
const MEDIUM_SPEED_POINTS: u32 = 15;
const HIGH_ACCELERATION: f64 = 50.0;
const HIGH_ACCELERATION_POINTS: u32 = 25;
const LANE_CHANGE_POINTS: u32 = 20;
const ERRATIC_POINTS: u32 = 15;

const DANGEROUS_THRESHOLD: u32 = 70;
const RISKY_THRESHOLD: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Safe,
    Risky,
    Dangerous,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Safe, RiskLevel::Risky, RiskLevel::Dangerous];

    pub fn from_score(score: u32) -> Self {
        if score >= DANGEROUS_THRESHOLD {
            RiskLevel::Dangerous
        } else if score >= RISKY_THRESHOLD {
            RiskLevel::Risky
        } else {
            RiskLevel::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Risky => "RISKY",
            RiskLevel::Dangerous => "DANGEROUS",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRiskLevel(pub String);

impl fmt::Display for UnknownRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown risk level {:?}", self.0)
    }
}

impl std::error::Error for UnknownRiskLevel {}

impl FromStr for RiskLevel {
    type Err = UnknownRiskLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAFE" => Ok(RiskLevel::Safe),
            "RISKY" => Ok(RiskLevel::Risky),
            "DANGEROUS" => Ok(RiskLevel::Dangerous),
            other => Err(UnknownRiskLevel(other.to_string())),
        }
    }
}

/// Score in [0, 100] from the track's recent speeds, accelerations and lifetime counters.
pub fn behavior_score(track: &Track) -> u32 {
    let mut score: u32 = 0;

    if !track.speeds.is_empty() {
        let avg = track.speeds.iter().sum::<f64>() / track.speeds.len() as f64;
        if avg > HIGH_SPEED {
            score += HIGH_SPEED_POINTS;
        } else if avg > MEDIUM_SPEED {
            score += MEDIUM_SPEED_POINTS;
        }
    }

    let peak_accel = track
        .accelerations
        .iter()
        .map(|a| a.abs())
        .fold(None, |acc: Option<f64>, a| Some(acc.map_or(a, |m| m.max(a))));
    if peak_accel.is_some_and(|a| a > HIGH_ACCELERATION) {
        score += HIGH_ACCELERATION_POINTS;
    }

    score = score
        .saturating_add(track.lane_change_count.saturating_mul(LANE_CHANGE_POINTS))
        .saturating_add(track.erratic_count.saturating_mul(ERRATIC_POINTS));

    score.min(MAX_SCORE)
}

/// Scores a track and labels it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, track: &Track) -> (u32, RiskLevel) {
        let score = behavior_score(track);
        (score, RiskLevel::from_score(score))
    }
}

//! Behavior scoring, risk labels and summaries.

mod engine;
mod summary;

pub use engine::{behavior_score, RiskEngine, RiskLevel, UnknownRiskLevel, MAX_SCORE};
pub use summary::{AlertLevel, FrameSummary, RiskDistribution, SessionSummary, SessionTotals};

//! drive-risk — per-vehicle driving risk from tracked image-plane positions.
//!
//! Modular structure:
//! - [`detection`] — Per-frame input from the external tracker
//! - [`features`] — Bounded track history, kinematics, pattern detectors
//! - [`risk`] — Behavior score, risk labels, frame/session summaries
//! - [`model`] — Trainable risk classifier (standardization + random forest)
//! - [`storage`] — Model bundle file and real training sample store
//! - [`pipeline`] — End-to-end per-frame processing
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod detection;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod risk;
pub mod storage;

pub use config::AnalyzerConfig;
pub use detection::{Detection, Point, TrackId};
pub use error::{Error, Result};
pub use features::{BehaviorAnalyzer, BehaviorRecord, FrameBehaviors};
pub use logging::StructuredLogger;
pub use model::{RiskClassifier, SharedClassifier, TrainingSource, Verdict};
pub use pipeline::{FrameReport, RiskPipeline, TrackAssessment};
pub use risk::{RiskEngine, RiskLevel};
pub use storage::{ModelBundle, TrainingStore};

//! Per-frame flow: detections → behavior records → classifier verdicts → merged report.
//! Optionally accumulates records as real training data and retrains on a schedule.

use crate::config::AnalyzerConfig;
use crate::detection::{Detection, TrackId};
use crate::error::Result;
use crate::features::{BehaviorAnalyzer, BehaviorRecord, FrameBehaviors};
use crate::logging::StructuredLogger;
use crate::model::{RiskClassifier, SharedClassifier, TrainingSource, Verdict};
use crate::risk::{FrameSummary, SessionSummary, SessionTotals};
use crate::storage::TrainingStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Heuristic behavior plus the classifier's opinion for one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAssessment {
    #[serde(flatten)]
    pub behavior: BehaviorRecord,
    /// None only if the classifier produced nothing for this id
    pub verdict: Option<Verdict>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub tracks: BTreeMap<TrackId, TrackAssessment>,
    pub summary: FrameSummary,
    /// In-sample accuracy if this frame triggered a retrain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrained: Option<f64>,
    /// Set when appending this frame's samples or the scheduled retrain failed.
    /// The classifier keeps its previous model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_error: Option<String>,
}

pub struct RiskPipeline {
    analyzer: BehaviorAnalyzer,
    classifier: SharedClassifier,
    training: Option<TrainingStore>,
    model_path: Option<PathBuf>,
    retrain_every: Option<usize>,
    pending_samples: usize,
    frame_index: u64,
    session: SessionSummary,
}

impl RiskPipeline {
    /// In-memory pipeline: no training store, no model file.
    pub fn new(config: &AnalyzerConfig, classifier: SharedClassifier) -> Self {
        Self {
            analyzer: BehaviorAnalyzer::new(config.behavior.clone()),
            classifier,
            training: None,
            model_path: None,
            retrain_every: None,
            pending_samples: 0,
            frame_index: 0,
            session: SessionSummary::new(),
        }
    }

    /// Pipeline backed by `config.storage`: installs the log subscriber, loads (or trains
    /// and saves) the model bundle and, when accumulation is enabled, opens the training store.
    pub fn open(config: &AnalyzerConfig) -> Result<Self> {
        StructuredLogger::init_from(&config.log);
        std::fs::create_dir_all(&config.storage.data_dir)?;
        let model_path = config.storage.model_path();
        let classifier = SharedClassifier::new(RiskClassifier::new(config.classifier.clone()));
        if !classifier.load(&model_path)? {
            classifier.train(TrainingSource::Synthetic)?;
            classifier.save(&model_path)?;
        }

        let mut pipeline = Self::new(config, classifier).with_model_path(model_path);
        if config.storage.accumulate_training_data {
            let store = TrainingStore::open(&config.storage.training_db_path())?;
            pipeline = pipeline.with_training_store(store, config.storage.retrain_every);
        }
        info!(data_dir = ?config.storage.data_dir, "risk pipeline ready");
        Ok(pipeline)
    }

    /// Accumulate every analyzed record; retrain after `retrain_every` new samples.
    pub fn with_training_store(mut self, store: TrainingStore, retrain_every: Option<usize>) -> Self {
        self.training = Some(store);
        self.retrain_every = retrain_every.filter(|n| *n > 0);
        self
    }

    /// Re-persist the model here after each scheduled retrain.
    pub fn with_model_path(mut self, path: PathBuf) -> Self {
        self.model_path = Some(path);
        self
    }

    pub fn analyzer(&self) -> &BehaviorAnalyzer {
        &self.analyzer
    }

    pub fn classifier(&self) -> &SharedClassifier {
        &self.classifier
    }

    pub fn training_store(&self) -> Option<&TrainingStore> {
        self.training.as_ref()
    }

    pub fn session_totals(&self) -> SessionTotals {
        self.session.totals()
    }

    pub fn process_frame(&mut self, detections: &[Detection], frame_height: f64) -> Result<FrameReport> {
        let behaviors = self.analyzer.analyze(detections, frame_height);
        let mut verdicts = self.classifier.predict(&behaviors)?;
        let summary = FrameSummary::from_records(behaviors.values());
        for (id, record) in &behaviors {
            self.session.observe(*id, record.risk_level);
        }

        let (retrained, training_error) = match self.accumulate(&behaviors) {
            Ok(accuracy) => (accuracy, None),
            Err(e) => {
                warn!(frame = self.frame_index, error = %e, "training data update failed");
                (None, Some(e.to_string()))
            }
        };

        let tracks = behaviors
            .into_iter()
            .map(|(id, behavior)| {
                let verdict = verdicts.remove(&id);
                (id, TrackAssessment { behavior, verdict })
            })
            .collect();

        let report = FrameReport {
            frame_index: self.frame_index,
            tracks,
            summary,
            retrained,
            training_error,
        };
        self.frame_index += 1;
        debug!(frame = report.frame_index, tracks = report.tracks.len(), "frame processed");
        Ok(report)
    }

    /// Append the frame's records and retrain when due. A failed retrain still clears the
    /// pending count so the next attempt waits for another `retrain_every` samples.
    fn accumulate(&mut self, behaviors: &FrameBehaviors) -> Result<Option<f64>> {
        let Some(store) = self.training.as_ref() else {
            return Ok(None);
        };
        self.pending_samples += store.append(behaviors)?;

        let Some(every) = self.retrain_every else {
            return Ok(None);
        };
        if self.pending_samples < every {
            return Ok(None);
        }

        self.pending_samples = 0;
        let accuracy = self.classifier.train(TrainingSource::Accumulated(store))?;
        info!(accuracy, "retrained on accumulated data");
        // the in-memory model is already swapped; the next retrain writes it again
        if let Some(path) = &self.model_path {
            if let Err(e) = self.classifier.save(path) {
                warn!(path = %path.display(), error = %e, "failed to persist retrained model");
            }
        }
        Ok(Some(accuracy))
    }
}

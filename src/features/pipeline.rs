//! Behavior pipeline: detections → track store → kinematics → detectors → score.

use super::{kinematics, patterns, BehaviorRecord, FrameBehaviors, TrackStore};
use crate::config::BehaviorConfig;
use crate::detection::Detection;
use crate::risk::RiskEngine;
use tracing::{debug, warn};

/// Folds detections into per-track state, one frame at a time and in detection order.
/// Owns its tracks; one analyzer per video source.
pub struct BehaviorAnalyzer {
    config: BehaviorConfig,
    tracks: TrackStore,
    engine: RiskEngine,
    frame_height: Option<f64>,
}

impl BehaviorAnalyzer {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            tracks: TrackStore::new(),
            engine: RiskEngine::new(),
            frame_height: None,
        }
    }

    pub fn frame_rate(&self) -> f64 {
        self.config.frame_rate
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    /// Analyze one frame. Returns a record per detected id; if an id appears twice,
    /// both detections are folded and the later record is kept.
    pub fn analyze(&mut self, detections: &[Detection], frame_height: f64) -> FrameBehaviors {
        self.check_frame_height(frame_height);

        let mut out = FrameBehaviors::new();
        for det in detections {
            if !det.center.is_finite() {
                warn!(track_id = det.id, "non-finite detection center; skipped");
                continue;
            }
            let record = self.fold(det, frame_height);
            out.insert(det.id, record);
        }
        debug!(detections = detections.len(), records = out.len(), "frame analyzed");
        out
    }

    fn fold(&mut self, det: &Detection, frame_height: f64) -> BehaviorRecord {
        let fr = self.config.frame_rate;
        let track = self.tracks.upsert(det.id, det.center);

        let speed = kinematics::speed(track, fr);
        // from the speed buffer as it stood before this frame's sample
        let acceleration = kinematics::acceleration(track, fr);
        let lane_change = patterns::detect_lane_change(track, frame_height);
        let erratic = patterns::detect_erratic_movement(track);

        if speed > 0.0 {
            track.speeds.push(speed);
        }
        if let Some(a) = acceleration {
            track.accelerations.push(a);
        }
        if lane_change {
            track.lane_change_count = track.lane_change_count.saturating_add(1);
        }
        if erratic {
            track.erratic_count = track.erratic_count.saturating_add(1);
        }

        let (behavior_score, risk_level) = self.engine.score(track);
        BehaviorRecord {
            speed,
            acceleration,
            lane_changes: track.lane_change_count,
            erratic_movements: track.erratic_count,
            behavior_score,
            risk_level,
            center: det.center,
        }
    }

    fn check_frame_height(&mut self, frame_height: f64) {
        match self.frame_height {
            None => self.frame_height = Some(frame_height),
            Some(h) if h != frame_height => {
                warn!(
                    session_height = h,
                    frame_height, "frame height changed mid-session; lane-change results not comparable"
                );
                self.frame_height = Some(frame_height);
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskLevel;

    fn analyzer() -> BehaviorAnalyzer {
        BehaviorAnalyzer::new(BehaviorConfig { frame_rate: 30.0 })
    }

    #[test]
    fn first_sighting_has_zero_speed_and_no_acceleration() {
        let mut a = analyzer();
        let out = a.analyze(&[Detection::new(1, (10.0, 10.0))], 720.0);
        let r = &out[&1];
        assert_eq!(r.speed, 0.0);
        assert_eq!(r.acceleration, None);
        assert_eq!(r.behavior_score, 0);
        assert_eq!(r.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn acceleration_lags_speed_samples() {
        let mut a = analyzer();
        // speeds 30, 60, 90 px/s
        let xs = [0.0, 1.0, 3.0, 6.0];
        let mut last = None;
        for (i, x) in xs.iter().enumerate() {
            let out = a.analyze(&[Detection::new(1, (*x, 0.0))], 720.0);
            last = Some(out[&1].clone());
            if i < 3 {
                assert_eq!(out[&1].acceleration, None, "frame {i}");
            }
        }
        // two speed samples (30, 60) existed before the third was added
        let r = last.unwrap();
        assert_eq!(r.speed, 90.0);
        assert_eq!(r.acceleration, Some(900.0));
    }

    #[test]
    fn stationary_frames_do_not_record_speed() {
        let mut a = analyzer();
        for _ in 0..5 {
            a.analyze(&[Detection::new(4, (5.0, 5.0))], 720.0);
        }
        let t = a.tracks().get(4).unwrap();
        assert!(t.speeds.is_empty());
        assert_eq!(t.positions.len(), 5);
    }

    #[test]
    fn non_finite_centers_are_skipped() {
        let mut a = analyzer();
        let out = a.analyze(&[Detection::new(9, (f64::NAN, 1.0))], 720.0);
        assert!(out.is_empty());
        assert!(a.tracks().get(9).is_none());
    }

    #[test]
    fn tracks_are_independent() {
        let mut a = analyzer();
        assert_eq!(a.frame_rate(), 30.0);
        a.analyze(&[Detection::new(1, (0.0, 0.0)), Detection::new(2, (100.0, 0.0))], 720.0);
        let out = a.analyze(&[Detection::new(1, (1.0, 0.0)), Detection::new(2, (100.0, 2.0))], 720.0);
        assert_eq!(out[&1].speed, 30.0);
        assert_eq!(out[&2].speed, 60.0);
    }
}

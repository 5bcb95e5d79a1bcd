//! Lane-change and erratic-movement detectors over recent position history.
//! Both are pure functions of the track state.

use super::track::Track;
use crate::detection::Point;
use std::f64::consts::FRAC_PI_4;

pub const LANE_CHANGE_WINDOW: usize = 10;
pub const ERRATIC_WINDOW: usize = 5;
/// Direction changes within the erratic window needed to flag the track
const ERRATIC_MIN_CHANGES: usize = 2;

/// Lateral (y) variance over the last 10 positions exceeds `(frame_height / 10)^2`.
pub fn detect_lane_change(track: &Track, frame_height: f64) -> bool {
    if track.positions.len() < LANE_CHANGE_WINDOW {
        return false;
    }
    let ys: Vec<f64> = track
        .positions
        .recent(LANE_CHANGE_WINDOW)
        .map(|p| p.y)
        .collect();
    let threshold = (frame_height / 10.0).powi(2);
    variance(&ys) > threshold
}

/// At least two direction changes sharper than 45 degrees across the last 5 positions.
pub fn detect_erratic_movement(track: &Track) -> bool {
    if track.positions.len() < ERRATIC_WINDOW {
        return false;
    }
    let recent: Vec<Point> = track.positions.recent(ERRATIC_WINDOW).copied().collect();
    let changes = recent
        .windows(3)
        .filter_map(|w| turn_angle(&w[0], &w[1], &w[2]))
        .filter(|angle| *angle > FRAC_PI_4)
        .count();
    changes >= ERRATIC_MIN_CHANGES
}

/// Angle between p1→p2 and p2→p3; None when either leg has zero length.
fn turn_angle(p1: &Point, p2: &Point, p3: &Point) -> Option<f64> {
    let v1 = (p2.x - p1.x, p2.y - p1.y);
    let v2 = (p3.x - p2.x, p3.y - p2.y);
    let n1 = v1.0.hypot(v1.1);
    let n2 = v2.0.hypot(v2.1);
    if n1 <= 0.0 || n2 <= 0.0 {
        return None;
    }
    let cos = (v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2);
    Some(cos.clamp(-1.0, 1.0).acos())
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with(points: &[(f64, f64)]) -> Track {
        let mut t = Track::new(1);
        for &p in points {
            t.positions.push(p.into());
        }
        t
    }

    #[test]
    fn lane_change_needs_ten_positions() {
        let zigzag: Vec<(f64, f64)> = (0..9)
            .map(|i| (i as f64, if i % 2 == 0 { 0.0 } else { 500.0 }))
            .collect();
        assert!(!detect_lane_change(&track_with(&zigzag), 100.0));
    }

    #[test]
    fn lane_change_threshold_scales_with_frame_height() {
        // y alternates 0/100: variance 2500
        let pts: Vec<(f64, f64)> = (0..10)
            .map(|i| (i as f64 * 5.0, if i % 2 == 0 { 0.0 } else { 100.0 }))
            .collect();
        let t = track_with(&pts);
        assert!(detect_lane_change(&t, 480.0)); // threshold 2304
        assert!(!detect_lane_change(&t, 500.0)); // threshold 2500, strict
        assert!(!detect_lane_change(&t, 1080.0));
    }

    #[test]
    fn erratic_false_for_straight_line() {
        let pts: Vec<(f64, f64)> = (0..5).map(|i| (i as f64 * 10.0, i as f64 * 2.0)).collect();
        assert!(!detect_erratic_movement(&track_with(&pts)));
    }

    #[test]
    fn erratic_true_for_reversals() {
        let pts = [(0.0, 0.0), (10.0, 0.0), (0.0, 0.0), (10.0, 0.0), (0.0, 0.0)];
        assert!(detect_erratic_movement(&track_with(&pts)));
    }

    #[test]
    fn erratic_skips_stationary_legs() {
        // one reversal, then a pause: the zero-length leg is not a turn
        let pts = [(0.0, 0.0), (10.0, 0.0), (0.0, 0.0), (0.0, 0.0), (10.0, 0.0)];
        assert!(!detect_erratic_movement(&track_with(&pts)));
    }

    #[test]
    fn erratic_needs_five_positions() {
        let pts = [(0.0, 0.0), (10.0, 0.0), (0.0, 0.0), (10.0, 0.0)];
        assert!(!detect_erratic_movement(&track_with(&pts)));
    }

    #[test]
    fn population_variance() {
        assert_eq!(variance(&[1.0, 3.0]), 1.0);
        assert_eq!(variance(&[]), 0.0);
    }
}

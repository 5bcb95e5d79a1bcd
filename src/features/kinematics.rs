//! Image-plane speed and acceleration under a constant frame rate.

use super::track::Track;

/// Distance between the two most recent positions times `frame_rate`; 0 with fewer than two.
pub fn speed(track: &Track, frame_rate: f64) -> f64 {
    let mut recent = track.positions.recent(2);
    match (recent.next(), recent.next()) {
        (Some(p1), Some(p2)) => p1.distance(p2) * frame_rate,
        _ => 0.0,
    }
}

/// Difference of the two most recent speed samples times `frame_rate`.
/// `None` until two samples exist.
pub fn acceleration(track: &Track, frame_rate: f64) -> Option<f64> {
    let mut recent = track.speeds.recent(2);
    match (recent.next(), recent.next()) {
        (Some(previous), Some(latest)) => Some((latest - previous) * frame_rate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Point;

    #[test]
    fn speed_needs_two_positions() {
        let mut t = Track::new(1);
        assert_eq!(speed(&t, 30.0), 0.0);
        t.positions.push(Point::new(0.0, 0.0));
        assert_eq!(speed(&t, 30.0), 0.0);
        t.positions.push(Point::new(3.0, 4.0));
        assert_eq!(speed(&t, 30.0), 150.0);
        t.positions.push(Point::new(3.0, 5.0));
        assert_eq!(speed(&t, 30.0), 30.0);
    }

    #[test]
    fn acceleration_undefined_until_two_speeds() {
        let mut t = Track::new(1);
        assert_eq!(acceleration(&t, 30.0), None);
        t.speeds.push(10.0);
        assert_eq!(acceleration(&t, 30.0), None);
        t.speeds.push(12.0);
        assert_eq!(acceleration(&t, 30.0), Some(60.0));
        t.speeds.push(11.0);
        assert_eq!(acceleration(&t, 30.0), Some(-30.0));
    }
}

//! Per-frame input from the external detector/tracker. Only `id` and `center`
//! are consumed; the remaining fields ride along untouched.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the external tracker; stable for the object's lifetime.
pub type TrackId = u64;

/// Image-plane point (x, y) in pixels. Deserializes from `{"x": .., "y": ..}` or `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "PointRepr")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointRepr {
    Pair(f64, f64),
    Named { x: f64, y: f64 },
}

impl From<PointRepr> for Point {
    fn from(repr: PointRepr) -> Self {
        match repr {
            PointRepr::Pair(x, y) | PointRepr::Named { x, y } => Self { x, y },
        }
    }
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One tracked object in one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub id: TrackId,
    pub center: Point,
    /// [x1, y1, x2, y2]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub class: String,
}

impl Detection {
    pub fn new(id: TrackId, center: impl Into<Point>) -> Self {
        Self {
            id,
            center: center.into(),
            bbox: None,
            confidence: 1.0,
            class: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_accepts_pair_or_named_fields() {
        let d: Detection = serde_json::from_str(r#"{"id": 3, "center": [12.5, 40.0]}"#).unwrap();
        assert_eq!(d.center, Point::new(12.5, 40.0));
        assert_eq!(d.confidence, 0.0);

        let d: Detection = serde_json::from_str(r#"{"id": 3, "center": {"x": 1.0, "y": 2.0}}"#).unwrap();
        assert_eq!(d.center, Point::new(1.0, 2.0));

        assert!(serde_json::from_str::<Point>("[1.0]").is_err());
    }

    #[test]
    fn point_serializes_with_named_fields() {
        let json = serde_json::to_string(&Point::new(1.5, -2.0)).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":-2.0}"#);
        assert_eq!(serde_json::from_str::<Point>(&json).unwrap(), Point::new(1.5, -2.0));
    }
}

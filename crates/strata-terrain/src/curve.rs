//! Immutable keyframe curves mapping a normalised input to an output value.
//!
//! Curves are shared between worker threads behind an `Arc`, so evaluation is
//! a pure query over a sorted keyframe table and never mutates state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A single curve control point with Hermite tangents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key from the left.
    #[serde(default)]
    pub in_tangent: f32,
    /// Slope leaving this key to the right.
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Piecewise cubic Hermite curve, clamped outside its first and last key.
///
/// An empty curve is the identity. A curve with a single key is constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct ResponseCurve {
    keys: Arc<[Keyframe]>,
}

impl ResponseCurve {
    /// Build a curve from keys in any order. Non-finite keys are dropped.
    pub fn new(keys: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut keys: Vec<Keyframe> = keys
            .into_iter()
            .filter(|k| k.time.is_finite() && k.value.is_finite())
            .collect();
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys: keys.into() }
    }

    /// The identity mapping on `[0, 1]`.
    pub fn identity() -> Self {
        Self::linear(&[(0.0, 0.0), (1.0, 1.0)])
    }

    /// A constant curve.
    pub fn constant(value: f32) -> Self {
        Self::new([Keyframe::new(0.0, value, 0.0, 0.0)])
    }

    /// Piecewise-linear curve through `points`.
    ///
    /// Tangents are set to the adjacent segment slopes, which makes every
    /// Hermite segment exactly linear.
    pub fn linear(points: &[(f32, f32)]) -> Self {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let slope = |i: usize| -> f32 {
            let (t0, v0) = sorted[i];
            let (t1, v1) = sorted[i + 1];
            let dt = t1 - t0;
            if dt > 0.0 { (v1 - v0) / dt } else { 0.0 }
        };

        let n = sorted.len();
        let keys = (0..n).map(|i| {
            let in_tangent = if i > 0 { slope(i - 1) } else { 0.0 };
            let out_tangent = if i + 1 < n { slope(i) } else { 0.0 };
            Keyframe::new(sorted[i].0, sorted[i].1, in_tangent, out_tangent)
        });
        Self::new(keys)
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Evaluate the curve at `t`.
    pub fn evaluate(&self, t: f32) -> f32 {
        let keys = &*self.keys;
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return t;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; t is inside (keys[i-1].time, keys[i].time].
        let i = keys.partition_point(|k| k.time < t);
        let k0 = &keys[i - 1];
        let k1 = &keys[i];
        let dt = k1.time - k0.time;
        if dt <= 0.0 {
            return k1.value;
        }

        let s = (t - k0.time) / dt;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * k0.value + h10 * dt * k0.out_tangent + h01 * k1.value + h11 * dt * k1.in_tangent
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Vec<Keyframe>> for ResponseCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<Keyframe> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_curve() {
        let curve = ResponseCurve::identity();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < EPSILON);
        }
    }

    #[test]
    fn test_linear_curve_interpolates_between_points() {
        let curve = ResponseCurve::linear(&[(0.0, 0.0), (0.5, 0.0), (1.0, 2.0)]);
        assert!(curve.evaluate(0.25).abs() < EPSILON);
        assert!((curve.evaluate(0.75) - 1.0).abs() < EPSILON);
        assert!((curve.evaluate(1.0) - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_evaluation_clamps_outside_keys() {
        let curve = ResponseCurve::linear(&[(0.2, 3.0), (0.8, 5.0)]);
        assert_eq!(curve.evaluate(-1.0), 3.0);
        assert_eq!(curve.evaluate(4.0), 5.0);
    }

    #[test]
    fn test_unsorted_keys_are_sorted() {
        let curve = ResponseCurve::new([
            Keyframe::new(1.0, 1.0, 0.0, 0.0),
            Keyframe::new(0.0, 0.0, 0.0, 0.0),
        ]);
        assert_eq!(curve.keys()[0].time, 0.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < EPSILON, "flat tangents give smoothstep midpoint");
    }

    #[test]
    fn test_constant_and_empty_curves() {
        assert_eq!(ResponseCurve::constant(4.0).evaluate(0.3), 4.0);
        assert_eq!(ResponseCurve::new([]).evaluate(0.3), 0.3);
    }

    #[test]
    fn test_curve_is_shareable_across_threads() {
        let curve = ResponseCurve::linear(&[(0.0, 0.0), (1.0, 10.0)]);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let curve = curve.clone();
                std::thread::spawn(move || curve.evaluate(i as f32 * 0.25))
            })
            .collect();
        let results: Vec<f32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for (i, r) in results.iter().enumerate() {
            assert!((r - i as f32 * 2.5).abs() < 1e-4);
        }
    }
}

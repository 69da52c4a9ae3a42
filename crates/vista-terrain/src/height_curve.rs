//! Piecewise-linear remapping curve for normalized terrain height.

/// A single `(time, value)` control point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub time: f64,
    pub value: f64,
}

/// Piecewise-linear function over control points sorted by time.
///
/// Evaluation clamps its input to the time range covered by the points, so
/// the curve is constant before the first and after the last point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightCurve {
    points: Vec<CurvePoint>,
}

impl HeightCurve {
    /// Creates a curve with no control points. It evaluates to `0.0` everywhere.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Builds a curve from `(time, value)` pairs in any order.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut curve = Self::new();
        for (time, value) in points {
            curve.add_point(time, value);
        }
        curve
    }

    /// The default terrain remap: flattens lowlands and steepens highlands.
    pub fn terrain() -> Self {
        Self::from_points([
            (0.0, 0.0),
            (0.3, 0.12),
            (0.5, 0.3),
            (0.7, 0.55),
            (0.85, 0.78),
            (1.0, 1.0),
        ])
    }

    /// Inserts a control point, keeping points sorted by time.
    ///
    /// A point whose time equals an existing one is placed after it.
    pub fn add_point(&mut self, time: f64, value: f64) {
        self.points.push(CurvePoint { time, value });
        // Insertion sort step: the curve is small and mostly built in order.
        let mut i = self.points.len() - 1;
        while i > 0 && self.points[i - 1].time > self.points[i].time {
            self.points.swap(i - 1, i);
            i -= 1;
        }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluates the curve at `t`.
    ///
    /// Zero points give `0.0`; a single point gives its value.
    pub fn evaluate(&self, t: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if self.points.len() == 1 {
            return first.value;
        }

        let t = t.clamp(first.time, last.time);

        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                let f = (t - a.time) / span;
                return a.value + (b.value - a.value) * f;
            }
        }

        last.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_empty_curve_returns_zero() {
        let curve = HeightCurve::new();
        assert_eq!(curve.evaluate(0.5), 0.0);
        assert_eq!(curve.evaluate(-10.0), 0.0);
    }

    #[test]
    fn test_single_point_returns_its_value() {
        let curve = HeightCurve::from_points([(0.4, 0.9)]);
        assert_eq!(curve.evaluate(0.0), 0.9);
        assert_eq!(curve.evaluate(0.4), 0.9);
        assert_eq!(curve.evaluate(7.0), 0.9);
    }

    #[test]
    fn test_points_sorted_on_insert() {
        let curve = HeightCurve::from_points([(1.0, 1.0), (0.0, 0.0), (0.5, 0.2), (0.25, 0.1)]);
        let times: Vec<f64> = curve.points().iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn test_clamps_outside_range() {
        let curve = HeightCurve::from_points([(0.2, 0.1), (0.8, 0.7)]);
        assert!((curve.evaluate(-1.0) - 0.1).abs() < EPSILON);
        assert!((curve.evaluate(0.0) - 0.1).abs() < EPSILON);
        assert!((curve.evaluate(0.9) - 0.7).abs() < EPSILON);
        assert!((curve.evaluate(100.0) - 0.7).abs() < EPSILON);
    }

    #[test]
    fn test_linear_interpolation_between_points() {
        let curve = HeightCurve::from_points([(0.0, 0.0), (1.0, 2.0)]);
        assert!((curve.evaluate(0.25) - 0.5).abs() < EPSILON);
        assert!((curve.evaluate(0.5) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_continuous_at_interior_points() {
        let curve = HeightCurve::terrain();
        let delta = 1e-9;
        for point in &curve.points()[1..curve.len() - 1] {
            let below = curve.evaluate(point.time - delta);
            let at = curve.evaluate(point.time);
            let above = curve.evaluate(point.time + delta);
            assert!((at - point.value).abs() < EPSILON);
            assert!((below - at).abs() < 1e-6, "jump below t={}", point.time);
            assert!((above - at).abs() < 1e-6, "jump above t={}", point.time);
        }
    }

    #[test]
    fn test_terrain_curve_monotonic() {
        let curve = HeightCurve::terrain();
        let mut prev = curve.evaluate(0.0);
        for i in 1..=1000 {
            let v = curve.evaluate(i as f64 / 1000.0);
            assert!(v >= prev, "terrain curve decreased at {}", i as f64 / 1000.0);
            prev = v;
        }
        assert!((curve.evaluate(0.0)).abs() < EPSILON);
        assert!((curve.evaluate(1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_duplicate_times_do_not_divide_by_zero() {
        let curve = HeightCurve::from_points([(0.0, 0.0), (0.5, 0.2), (0.5, 0.8), (1.0, 1.0)]);
        let v = curve.evaluate(0.5);
        assert!(v.is_finite());
        assert!((curve.evaluate(0.75) - 0.9).abs() < EPSILON);
    }
}

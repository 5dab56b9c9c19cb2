//! Adaptive curve subdivision.
//!
//! Béziers subdivide recursively at the midpoint until the control points
//! sit within a quarter pixel of the chord ([`CHORD_ERROR_FACTOR`]), with
//! recursion capped at [`MAX_RECURSION`]. Circular sweeps (arcs, round
//! joins and caps) sample at the angular step that keeps the chordal error
//! under one pixel: `theta = sqrt(2 * err / radius)`.

use cgmath::{InnerSpace, Vector2};

/// Fraction of the pixel size allowed as Bézier chord error.
pub const CHORD_ERROR_FACTOR: f32 = 0.25;
/// Maximum Bézier subdivision depth.
pub const MAX_RECURSION: u32 = 10;

/// The angular step that bounds the chordal error of a circle of
/// `radius` to `err` pixels: `sqrt(2 * err / radius)`.
pub(crate) fn pixel_theta(err: f32, radius: f32) -> f32 {
    debug_assert!(err > 0.0);
    (2.0 * err / radius.max(err)).sqrt()
}

/// A cubic Bézier in monomial-free control form.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CubicCurve {
    pub p0: Vector2<f32>,
    pub p1: Vector2<f32>,
    pub p2: Vector2<f32>,
    pub p3: Vector2<f32>,
}

impl CubicCurve {
    pub fn bezier(
        p0: Vector2<f32>,
        p1: Vector2<f32>,
        p2: Vector2<f32>,
        p3: Vector2<f32>,
    ) -> Self {
        CubicCurve { p0, p1, p2, p3 }
    }

    /// Degree-elevate a quadratic Bézier.
    pub fn quadratic(p0: Vector2<f32>, control: Vector2<f32>, p2: Vector2<f32>) -> Self {
        CubicCurve {
            p0,
            p1: p0 + (control - p0) * (2.0 / 3.0),
            p2: p2 + (control - p2) * (2.0 / 3.0),
            p3: p2,
        }
    }

    /// Largest distance of the interior control points from the chord.
    fn chord_error(&self) -> f32 {
        let chord = self.p3 - self.p0;
        let length = chord.magnitude();
        if length < 1e-12 {
            // Closed curve: fall back to control point distance.
            return (self.p1 - self.p0)
                .magnitude()
                .max((self.p2 - self.p0).magnitude());
        }
        let normal = Vector2::new(-chord.y, chord.x) / length;
        (self.p1 - self.p0)
            .dot(normal)
            .abs()
            .max((self.p2 - self.p0).dot(normal).abs())
    }

    fn split(&self) -> (CubicCurve, CubicCurve) {
        let p01 = (self.p0 + self.p1) / 2.0;
        let p12 = (self.p1 + self.p2) / 2.0;
        let p23 = (self.p2 + self.p3) / 2.0;
        let p012 = (p01 + p12) / 2.0;
        let p123 = (p12 + p23) / 2.0;
        let mid = (p012 + p123) / 2.0;
        (
            CubicCurve {
                p0: self.p0,
                p1: p01,
                p2: p012,
                p3: mid,
            },
            CubicCurve {
                p0: mid,
                p1: p123,
                p2: p23,
                p3: self.p3,
            },
        )
    }

    /// Emit the curve as a polyline with chord error at most
    /// `pixel_size * CHORD_ERROR_FACTOR`. The starting point is assumed
    /// already emitted; `emit` receives every interior point followed by
    /// the endpoint.
    pub fn tessellate<F>(&self, pixel_size: f32, emit: &mut F)
    where
        F: FnMut(Vector2<f32>),
    {
        self.subdivide(pixel_size * CHORD_ERROR_FACTOR, 0, emit);
    }

    fn subdivide<F>(&self, tolerance: f32, depth: u32, emit: &mut F)
    where
        F: FnMut(Vector2<f32>),
    {
        if depth >= MAX_RECURSION || self.chord_error() <= tolerance {
            emit(self.p3);
            return;
        }
        let (left, right) = self.split();
        left.subdivide(tolerance, depth + 1, emit);
        right.subdivide(tolerance, depth + 1, emit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flatten(curve: &CubicCurve, pixel_size: f32) -> Vec<Vector2<f32>> {
        let mut points = vec![curve.p0];
        curve.tessellate(pixel_size, &mut |point| points.push(point));
        points
    }

    fn eval(curve: &CubicCurve, t: f32) -> Vector2<f32> {
        let u = 1.0 - t;
        curve.p0 * (u * u * u)
            + curve.p1 * (3.0 * u * u * t)
            + curve.p2 * (3.0 * u * t * t)
            + curve.p3 * (t * t * t)
    }

    fn max_deviation(curve: &CubicCurve, points: &[Vector2<f32>]) -> f32 {
        // Sample the true curve densely and measure the distance to the
        // closest polyline vertex-to-vertex segment.
        let mut worst: f32 = 0.0;
        for i in 0..=256 {
            let p = eval(curve, i as f32 / 256.0);
            let mut best = f32::MAX;
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                let ab = b - a;
                let len2 = ab.dot(ab);
                let t = if len2 > 0.0 {
                    ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let d = (p - (a + ab * t)).magnitude();
                best = best.min(d);
            }
            worst = worst.max(best);
        }
        worst
    }

    #[test]
    fn quarter_pixel_error_bound() {
        let curve = CubicCurve::bezier(
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 100.0),
            Vector2::new(100.0, 100.0),
            Vector2::new(100.0, 0.0),
        );
        let points = flatten(&curve, 1.0);
        assert!(points.len() > 4);
        let deviation = max_deviation(&curve, &points);
        assert!(deviation <= 0.25 + 1e-3, "deviation {}", deviation);
        // The polyline ends exactly at the curve endpoint.
        assert_eq!(*points.last().unwrap(), Vector2::new(100.0, 0.0));
    }

    #[test]
    fn refinement_follows_pixel_size() {
        let curve = CubicCurve::bezier(
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 100.0),
            Vector2::new(100.0, 100.0),
            Vector2::new(100.0, 0.0),
        );
        let coarse = flatten(&curve, 10.0).len();
        let normal = flatten(&curve, 1.0).len();
        let fine = flatten(&curve, 0.1).len();
        assert!(coarse < normal && normal < fine);
    }

    #[test]
    fn polyline_length_is_monotone_under_refinement() {
        let curve = CubicCurve::bezier(
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 100.0),
            Vector2::new(100.0, 100.0),
            Vector2::new(100.0, 0.0),
        );
        let length = |points: &[Vector2<f32>]| -> f32 {
            points.windows(2).map(|p| (p[1] - p[0]).magnitude()).sum()
        };
        let coarse = length(&flatten(&curve, 10.0));
        let normal = length(&flatten(&curve, 1.0));
        let fine = length(&flatten(&curve, 0.1));
        assert!(coarse <= normal + 1e-3);
        assert!(normal <= fine + 1e-3);
    }

    #[test]
    fn straight_curve_emits_endpoint_only() {
        let curve = CubicCurve::bezier(
            Vector2::new(0.0, 0.0),
            Vector2::new(2.5, 0.0),
            Vector2::new(5.0, 0.0),
            Vector2::new(10.0, 0.0),
        );
        let points = flatten(&curve, 1.0);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn quadratic_elevation_preserves_endpoints() {
        let curve = CubicCurve::quadratic(
            Vector2::new(0.0, 0.0),
            Vector2::new(50.0, 100.0),
            Vector2::new(100.0, 0.0),
        );
        assert_eq!(curve.p0, Vector2::new(0.0, 0.0));
        assert_eq!(curve.p3, Vector2::new(100.0, 0.0));
        // The elevated curve peaks at the quadratic's apex t=0.5.
        let apex = eval(&curve, 0.5);
        assert!((apex.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn pixel_theta_shrinks_with_radius() {
        assert!(pixel_theta(1.0, 100.0) < pixel_theta(1.0, 10.0));
        let theta = pixel_theta(1.0, 50.0);
        assert!((theta - (2.0f32 / 50.0).sqrt()).abs() < 1e-6);
    }
}

//! Polygon triangulation and self-intersection simplification.
//!
//! The triangulator is ear clipping over an index list, reusing its
//! working buffers across calls. Input geometry arrives through the
//! [`PolygonSource`] trait so emitters can be tested against synthetic
//! polygons without building point pools.

use cgmath::Vector2;

use hal::{Error, Result};

/// Positions of a polygon, queried by index.
pub trait PolygonSource {
    /// Number of points.
    fn count(&self) -> u32;
    /// The position of one point.
    fn point(&self, index: u32) -> Vector2<f32>;
}

impl PolygonSource for [Vector2<f32>] {
    fn count(&self) -> u32 {
        self.len() as u32
    }
    fn point(&self, index: u32) -> Vector2<f32> {
        self[index as usize]
    }
}

/// Requested winding of the output triangles.
///
/// Image space has its origin in the upper-left, so clockwise here maps to
/// counter-clockwise in clip space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriangulateWinding {
    Clockwise,
    CounterClockwise,
}

/// Twice the signed area; positive for counter-clockwise in standard
/// (y-up) coordinates.
fn signed_area_doubled<P: PolygonSource + ?Sized>(source: &P, order: &[u32]) -> f32 {
    let mut area = 0.0;
    for i in 0..order.len() {
        let a = source.point(order[i]);
        let b = source.point(order[(i + 1) % order.len()]);
        area += a.x * b.y - b.x * a.y;
    }
    area
}

fn cross(origin: Vector2<f32>, a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    (a.x - origin.x) * (b.y - origin.y) - (b.x - origin.x) * (a.y - origin.y)
}

fn point_in_triangle(
    p: Vector2<f32>,
    a: Vector2<f32>,
    b: Vector2<f32>,
    c: Vector2<f32>,
) -> bool {
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Reusable simple-polygon triangulator.
#[derive(Debug, Default)]
pub struct SimplePolygon {
    order: Vec<u32>,
    indices: Vec<u32>,
}

impl SimplePolygon {
    pub fn new() -> Self {
        SimplePolygon::default()
    }

    /// Triangulate a simple polygon, producing index triples wound in the
    /// requested direction. Indices refer to the source's point indices.
    pub fn triangulate<P: PolygonSource + ?Sized>(
        &mut self,
        source: &P,
        winding: TriangulateWinding,
    ) -> Result<&[u32]> {
        let count = source.count();
        self.indices.clear();
        if count < 3 {
            return Err(Error::InvalidArg("polygon needs at least three points"));
        }

        self.order.clear();
        self.order.extend(0..count);

        // Clipping always walks the polygon in positive orientation; the
        // emitted triples are flipped afterwards when the request is for
        // the other winding. A clockwise request in image space (y down)
        // is a positive signed area in standard coordinates.
        let area = signed_area_doubled(source, &self.order);
        if area == 0.0 {
            return Err(Error::InvalidArg("degenerate polygon"));
        }
        if area < 0.0 {
            self.order.reverse();
        }
        let flip = winding == TriangulateWinding::CounterClockwise;

        let mut remaining = self.order.clone();
        let mut since_last_ear = 0;
        while remaining.len() > 3 {
            let n = remaining.len();
            let mut clipped = false;
            for i in 0..n {
                let prev = remaining[(i + n - 1) % n];
                let cur = remaining[i];
                let next = remaining[(i + 1) % n];
                let a = source.point(prev);
                let b = source.point(cur);
                let c = source.point(next);

                // Convex corners only; traversal order makes positive
                // cross products convex.
                let corner = cross(a, b, c);
                if corner <= 0.0 {
                    continue;
                }
                // No other remaining vertex may sit inside the ear.
                let blocked = remaining.iter().any(|&other| {
                    other != prev
                        && other != cur
                        && other != next
                        && point_in_triangle(source.point(other), a, b, c)
                });
                if blocked {
                    continue;
                }

                if flip {
                    self.indices.extend_from_slice(&[next, cur, prev]);
                } else {
                    self.indices.extend_from_slice(&[prev, cur, next]);
                }
                remaining.remove(i);
                clipped = true;
                break;
            }
            if clipped {
                since_last_ear = 0;
            } else {
                // Collinear runs can block every ear; drop the flattest
                // corner and retry before giving up.
                since_last_ear += 1;
                if since_last_ear > 1 {
                    return Err(Error::InvalidArg("polygon could not be triangulated"));
                }
                let n = remaining.len();
                let flattest = (0..n)
                    .min_by(|&i, &j| {
                        let corner = |k: usize| {
                            cross(
                                source.point(remaining[(k + n - 1) % n]),
                                source.point(remaining[k]),
                                source.point(remaining[(k + 1) % n]),
                            )
                            .abs()
                        };
                        corner(i).partial_cmp(&corner(j)).unwrap()
                    })
                    .unwrap();
                remaining.remove(flattest);
            }
        }
        if remaining.len() == 3 {
            let valid = cross(
                source.point(remaining[0]),
                source.point(remaining[1]),
                source.point(remaining[2]),
            ) != 0.0;
            if valid {
                if flip {
                    remaining.reverse();
                }
                self.indices.extend_from_slice(&remaining);
            }
        }
        Ok(&self.indices)
    }
}

fn segments_intersect(
    a0: Vector2<f32>,
    a1: Vector2<f32>,
    b0: Vector2<f32>,
    b1: Vector2<f32>,
) -> Option<Vector2<f32>> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let diff = b0 - a0;
    let t = (diff.x * s.y - diff.y * s.x) / denom;
    let u = (diff.x * r.y - diff.y * r.x) / denom;
    const EPSILON: f32 = 1e-6;
    if t > EPSILON && t < 1.0 - EPSILON && u > EPSILON && u < 1.0 - EPSILON {
        Some(a0 + r * t)
    } else {
        None
    }
}

/// Splits self-intersecting loops into simple loops.
///
/// When an edge pair crosses, the span between the two edges is pinched
/// off at the intersection point as its own loop, and the scan restarts on
/// the remainder until no crossings survive.
#[derive(Debug, Default)]
pub struct PolygonSimplifier {
    work: Vec<Vector2<f32>>,
    loops: Vec<Vec<Vector2<f32>>>,
}

impl PolygonSimplifier {
    pub fn new() -> Self {
        PolygonSimplifier::default()
    }

    /// Split one loop into simple loops. Loops degenerating to fewer than
    /// three points are dropped.
    pub fn simplify(&mut self, points: &[Vector2<f32>]) -> &[Vec<Vector2<f32>>] {
        self.loops.clear();
        self.work.clear();
        self.work.extend_from_slice(points);

        'scan: loop {
            let n = self.work.len();
            if n < 4 {
                break;
            }
            for i in 0..n {
                // Adjacent edges share an endpoint, never a crossing.
                for j in (i + 2)..n {
                    if i == 0 && j == n - 1 {
                        continue;
                    }
                    let a0 = self.work[i];
                    let a1 = self.work[(i + 1) % n];
                    let b0 = self.work[j];
                    let b1 = self.work[(j + 1) % n];
                    if let Some(hit) = segments_intersect(a0, a1, b0, b1) {
                        // Pinch off work[i+1 ..= j] + the hit point.
                        let mut pinched: Vec<Vector2<f32>> =
                            self.work[i + 1..=j].to_vec();
                        pinched.push(hit);
                        self.work.drain(i + 1..=j);
                        self.work.insert(i + 1, hit);
                        if pinched.len() >= 3 {
                            self.loops.push(pinched);
                        }
                        continue 'scan;
                    }
                }
            }
            break;
        }

        if self.work.len() >= 3 {
            let remainder = std::mem::take(&mut self.work);
            self.loops.push(remainder);
        }
        &self.loops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f32, f32)]) -> Vec<Vector2<f32>> {
        coords.iter().map(|&(x, y)| Vector2::new(x, y)).collect()
    }

    fn triangle_area(indices: &[u32], source: &[Vector2<f32>]) -> f32 {
        indices
            .chunks(3)
            .map(|tri| {
                cross(
                    source[tri[0] as usize],
                    source[tri[1] as usize],
                    source[tri[2] as usize],
                )
                .abs()
                    / 2.0
            })
            .sum()
    }

    #[test]
    fn triangulates_a_triangle() {
        let polygon = points(&[(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)]);
        let mut triangulator = SimplePolygon::new();
        let indices = triangulator
            .triangulate(&polygon[..], TriangulateWinding::Clockwise)
            .unwrap();
        assert_eq!(indices.len(), 3);
        let set: Vec<u32> = indices.to_vec();
        assert!(set.contains(&0) && set.contains(&1) && set.contains(&2));
    }

    #[test]
    fn triangulates_a_concave_polygon() {
        // An arrowhead: concave at index 4.
        let polygon = points(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
            (2.0, 2.0),
        ]);
        let mut triangulator = SimplePolygon::new();
        let indices = triangulator
            .triangulate(&polygon[..], TriangulateWinding::Clockwise)
            .unwrap()
            .to_vec();
        assert_eq!(indices.len(), (polygon.len() - 2) * 3);
        // Area is preserved: square minus the notch.
        let area = triangle_area(&indices, &polygon);
        assert!((area - 12.0).abs() < 1e-3, "area {}", area);
    }

    #[test]
    fn winding_request_is_honored() {
        let polygon = points(&[(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)]);
        let mut triangulator = SimplePolygon::new();
        let cw = triangulator
            .triangulate(&polygon[..], TriangulateWinding::Clockwise)
            .unwrap()
            .to_vec();
        let cw_sign = cross(
            polygon[cw[0] as usize],
            polygon[cw[1] as usize],
            polygon[cw[2] as usize],
        );
        let ccw = triangulator
            .triangulate(&polygon[..], TriangulateWinding::CounterClockwise)
            .unwrap()
            .to_vec();
        let ccw_sign = cross(
            polygon[ccw[0] as usize],
            polygon[ccw[1] as usize],
            polygon[ccw[2] as usize],
        );
        assert!(cw_sign > 0.0);
        assert!(ccw_sign < 0.0);
    }

    #[test]
    fn rejects_degenerate_input() {
        let mut triangulator = SimplePolygon::new();
        let two = points(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(triangulator
            .triangulate(&two[..], TriangulateWinding::Clockwise)
            .is_err());
        let collinear = points(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(triangulator
            .triangulate(&collinear[..], TriangulateWinding::Clockwise)
            .is_err());
    }

    #[test]
    fn simplifier_splits_a_bowtie() {
        // Figure-eight crossing at (1, 1).
        let bowtie = points(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        let mut simplifier = PolygonSimplifier::new();
        let loops = simplifier.simplify(&bowtie);
        assert_eq!(loops.len(), 2);
        for simple in loops {
            assert!(simple.len() >= 3);
            // Each split loop contains the intersection point.
            assert!(simple
                .iter()
                .any(|p| (p.x - 1.0).abs() < 1e-4 && (p.y - 1.0).abs() < 1e-4));
        }
    }

    #[test]
    fn simplifier_passes_simple_loops_through() {
        let square = points(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        let mut simplifier = PolygonSimplifier::new();
        let loops = simplifier.simplify(&square);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 4);
    }
}

//! Small geometry helpers shared by the tessellators.

use cgmath::{InnerSpace, Matrix3, Vector2};

/// An axis-aligned 2D bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2 {
    pub min: Vector2<f32>,
    pub max: Vector2<f32>,
}

impl Box2 {
    /// An empty box that any point insertion will snap to.
    pub fn empty() -> Self {
        Box2 {
            min: Vector2::new(f32::MAX, f32::MAX),
            max: Vector2::new(f32::MIN, f32::MIN),
        }
    }

    /// A box spanning two corners.
    pub fn new(min: Vector2<f32>, max: Vector2<f32>) -> Self {
        Box2 { min, max }
    }

    /// Whether the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Grow to contain `point`.
    pub fn add_point(&mut self, point: Vector2<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Whether `point` lies inside the box.
    pub fn contains(&self, point: Vector2<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Width and height.
    pub fn extents(&self) -> Vector2<f32> {
        self.max - self.min
    }

    /// Center point.
    pub fn center(&self) -> Vector2<f32> {
        (self.min + self.max) / 2.0
    }
}

/// Clockwise perpendicular in image space (origin upper-left).
pub(crate) fn perpendicular(v: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(v.y, -v.x)
}

/// The on-screen pixel size for tessellating under a path transform:
/// curvature refines when the transform scales up.
pub(crate) fn adjust_pixel_size(transform: &Matrix3<f32>, pixel_size: f32) -> f32 {
    let x_scale = Vector2::new(transform.x.x, transform.x.y).magnitude();
    let y_scale = Vector2::new(transform.y.x, transform.y.y).magnitude();
    pixel_size * x_scale.max(y_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn box_grows_to_fit() {
        let mut bounds = Box2::empty();
        assert!(!bounds.is_valid());
        bounds.add_point(Vector2::new(2.0, -1.0));
        bounds.add_point(Vector2::new(-3.0, 4.0));
        assert!(bounds.is_valid());
        assert_eq!(bounds.min, Vector2::new(-3.0, -1.0));
        assert_eq!(bounds.max, Vector2::new(2.0, 4.0));
        assert!(bounds.contains(Vector2::new(0.0, 0.0)));
        assert!(!bounds.contains(Vector2::new(3.0, 0.0)));
    }

    #[test]
    fn pixel_size_follows_the_larger_column() {
        let mut transform = Matrix3::identity();
        transform.x.x = 3.0;
        transform.y.y = 0.5;
        assert_eq!(adjust_pixel_size(&transform, 1.0), 3.0);
        assert_eq!(adjust_pixel_size(&Matrix3::identity(), 0.25), 0.25);
    }
}

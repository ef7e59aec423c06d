//! Axis-aligned pixel rectangles used as object regions of interest.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in image pixel space.
///
/// `(x, y)` is the top-left corner; `width` and `height` extend right and down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    /// Area in square pixels. Degenerate rectangles have zero area.
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Center-preserving shrink: each side moves inward by `fraction / 2`
    /// of the corresponding dimension.
    ///
    /// # Arguments
    /// * `fraction` - Total fraction removed per dimension, in `[0, 1)`
    pub fn shrink(&self, fraction: f64) -> Self {
        Self {
            x: self.x + fraction * self.width / 2.0,
            y: self.y + fraction * self.height / 2.0,
            width: self.width * (1.0 - fraction),
            height: self.height * (1.0 - fraction),
        }
    }

    /// True if `pt` lies strictly inside the rectangle (edges excluded).
    ///
    /// Non-finite coordinates are never contained.
    pub fn contains(&self, pt: &Point2<f64>) -> bool {
        pt.x > self.x && pt.x < self.right() && pt.y > self.y && pt.y < self.bottom()
    }

    /// Overlap rectangle, or `None` if the two do not overlap.
    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 > x0 && y1 > y0 {
            Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    /// Intersection-over-Union, in `[0, 1]`.
    ///
    /// Returns 0 when the union has no area.
    pub fn iou(&self, other: &PixelRect) -> f64 {
        let inter = self.intersection(other).map_or(0.0, |r| r.area());
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        (inter / union).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shrink_zero_is_identity() {
        let r = PixelRect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.shrink(0.0), r);
    }

    #[test]
    fn test_shrink_is_centered_and_contained() {
        let r = PixelRect::new(10.0, 20.0, 100.0, 50.0);
        for s in [0.05, 0.1, 0.5, 0.9] {
            let small = r.shrink(s);
            assert_relative_eq!(small.center(), r.center(), epsilon = 1e-12);
            assert!(small.x >= r.x && small.y >= r.y);
            assert!(small.right() <= r.right() && small.bottom() <= r.bottom());
            assert_relative_eq!(small.width, 100.0 * (1.0 - s), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_contains_excludes_edges() {
        let r = PixelRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(&Point2::new(5.0, 5.0)));
        assert!(!r.contains(&Point2::new(0.0, 5.0)));
        assert!(!r.contains(&Point2::new(10.0, 5.0)));
        assert!(!r.contains(&Point2::new(5.0, f64::NAN)));
        assert!(!r.contains(&Point2::new(f64::INFINITY, 5.0)));
    }

    #[test]
    fn test_iou_self_is_one() {
        let r = PixelRect::new(3.0, 4.0, 20.0, 30.0);
        assert_relative_eq!(r.iou(&r), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = PixelRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PixelRect::new(5.0, 0.0, 10.0, 10.0);
        // 50 / (100 + 100 - 50)
        assert_relative_eq!(a.iou(&b), 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(b.iou(&a), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_iou_disjoint_and_degenerate() {
        let a = PixelRect::new(0.0, 0.0, 10.0, 10.0);
        let b = PixelRect::new(20.0, 20.0, 5.0, 5.0);
        let empty = PixelRect::new(1.0, 1.0, 0.0, 0.0);
        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(empty.iou(&empty), 0.0);
        assert_eq!(a.iou(&empty), 0.0);
    }

    #[test]
    fn test_iou_bounded_and_symmetric() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        for _ in 0..500 {
            let a = PixelRect::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..50.0),
                rng.gen_range(0.0..50.0),
            );
            let b = PixelRect::new(
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..50.0),
                rng.gen_range(0.0..50.0),
            );
            let iou = a.iou(&b);
            assert!((0.0..=1.0).contains(&iou));
            assert_relative_eq!(iou, b.iou(&a), epsilon = 1e-12);
        }
    }
}

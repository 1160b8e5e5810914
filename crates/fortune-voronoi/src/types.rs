//! Input point abstraction and the clipping rectangle.

use glam::{DVec2, Vec2};

/// Anything that can be read as a 2D point.
///
/// Lets callers pass their own point storage without converting first.
pub trait Point2Like {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    #[inline]
    fn to_dvec2(&self) -> DVec2 {
        DVec2::new(self.x(), self.y())
    }
}

impl Point2Like for DVec2 {
    #[inline]
    fn x(&self) -> f64 {
        self.x
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y
    }
}

impl Point2Like for Vec2 {
    #[inline]
    fn x(&self) -> f64 {
        self.x as f64
    }
    #[inline]
    fn y(&self) -> f64 {
        self.y as f64
    }
}

impl Point2Like for [f64; 2] {
    #[inline]
    fn x(&self) -> f64 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f64 {
        self[1]
    }
}

impl Point2Like for (f64, f64) {
    #[inline]
    fn x(&self) -> f64 {
        self.0
    }
    #[inline]
    fn y(&self) -> f64 {
        self.1
    }
}

/// Axis-aligned rectangle that unbounded cells are clipped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Convenience constructor from `[x0, x1] × [y0, y1]`.
    pub fn from_extents(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self::new(DVec2::new(x0, y0), DVec2::new(x1, y1))
    }

    /// Smallest box containing all points, or `None` for an empty slice.
    pub fn enclosing(points: &[DVec2]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    /// Grow the box by `margin` on every side.
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min: self.min - DVec2::splat(margin),
            max: self.max + DVec2::splat(margin),
        }
    }

    /// True when both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.x < self.max.x && self.min.y < self.max.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Length of the full perimeter.
    #[inline]
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    /// Inclusive containment test with tolerance `eps`.
    pub fn contains(&self, p: DVec2, eps: f64) -> bool {
        p.x >= self.min.x - eps && p.x <= self.max.x + eps && p.y >= self.min.y - eps && p.y <= self.max.y + eps
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    /// Counter-clockwise perimeter coordinate of a point on the boundary.
    ///
    /// Starts at `min` (0.0) and runs along the bottom, right, top and left
    /// sides. Points off the boundary are attributed to the nearest side.
    pub fn perimeter_param(&self, p: DVec2) -> f64 {
        let (w, h) = (self.width(), self.height());
        let d_bottom = (p.y - self.min.y).abs();
        let d_right = (p.x - self.max.x).abs();
        let d_top = (p.y - self.max.y).abs();
        let d_left = (p.x - self.min.x).abs();

        let nearest = d_bottom.min(d_right).min(d_top).min(d_left);
        let x = p.x.clamp(self.min.x, self.max.x);
        let y = p.y.clamp(self.min.y, self.max.y);
        if nearest == d_bottom {
            x - self.min.x
        } else if nearest == d_right {
            w + (y - self.min.y)
        } else if nearest == d_top {
            w + h + (self.max.x - x)
        } else {
            2.0 * w + h + (self.max.y - y)
        }
    }

    /// Perimeter coordinates of the corners, matching [`Self::corners`].
    pub fn corner_params(&self) -> [f64; 4] {
        let (w, h) = (self.width(), self.height());
        [0.0, w, w + h, 2.0 * w + h]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_and_padding() {
        let pts = [DVec2::new(1.0, 2.0), DVec2::new(-3.0, 5.0), DVec2::new(0.0, -1.0)];
        let bb = BoundingBox::enclosing(&pts).unwrap();
        assert_eq!(bb.min, DVec2::new(-3.0, -1.0));
        assert_eq!(bb.max, DVec2::new(1.0, 5.0));

        let padded = bb.padded(1.0);
        assert_eq!(padded.min, DVec2::new(-4.0, -2.0));
        assert!(padded.is_valid());
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn test_degenerate_box_invalid() {
        let bb = BoundingBox::enclosing(&[DVec2::new(1.0, 1.0)]).unwrap();
        assert!(!bb.is_valid());
        assert!(bb.padded(0.5).is_valid());
    }

    #[test]
    fn test_perimeter_param_runs_ccw() {
        let bb = BoundingBox::from_extents(0.0, 10.0, 0.0, 5.0);
        assert_eq!(bb.perimeter_param(DVec2::new(4.0, 0.0)), 4.0);
        assert_eq!(bb.perimeter_param(DVec2::new(10.0, 2.0)), 12.0);
        assert_eq!(bb.perimeter_param(DVec2::new(7.0, 5.0)), 18.0);
        assert_eq!(bb.perimeter_param(DVec2::new(0.0, 1.0)), 29.0);
        assert_eq!(bb.corner_params(), [0.0, 10.0, 15.0, 25.0]);
        assert_eq!(bb.perimeter(), 30.0);
    }

    #[test]
    fn test_point_like_impls() {
        assert_eq!([1.0, 2.0].to_dvec2(), DVec2::new(1.0, 2.0));
        assert_eq!((3.0, 4.0).to_dvec2(), DVec2::new(3.0, 4.0));
        assert_eq!(Vec2::new(0.5, 1.5).to_dvec2(), DVec2::new(0.5, 1.5));
    }
}

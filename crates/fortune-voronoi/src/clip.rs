//! Clipping of edge lines against the bounding box, and walks along its
//! perimeter.

use glam::DVec2;

use crate::types::BoundingBox;

/// A piece of the line `origin + t * dir` for `t` in `[t0, t1]`.
///
/// Either bound may be infinite: rays have one, full bisectors both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLine {
    pub origin: DVec2,
    pub dir: DVec2,
    pub t0: f64,
    pub t1: f64,
}

impl EdgeLine {
    pub fn segment(a: DVec2, b: DVec2) -> Self {
        let len = a.distance(b);
        Self {
            origin: a,
            dir: (b - a) / len,
            t0: 0.0,
            t1: len,
        }
    }

    #[inline]
    pub fn at(&self, t: f64) -> DVec2 {
        self.origin + self.dir * t
    }
}

/// Liang–Barsky: the parameter range of `line` inside `bounds`, or `None`
/// when they do not meet.
pub fn clip_line(line: &EdgeLine, bounds: &BoundingBox) -> Option<(f64, f64)> {
    let o = line.origin;
    let d = line.dir;
    let mut lo = line.t0;
    let mut hi = line.t1;

    let checks = [
        (-d.x, o.x - bounds.min.x),
        (d.x, bounds.max.x - o.x),
        (-d.y, o.y - bounds.min.y),
        (d.y, bounds.max.y - o.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            lo = lo.max(r);
        } else {
            hi = hi.min(r);
        }
        if lo > hi {
            return None;
        }
    }

    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// Counter-clockwise distance along the perimeter from `from` to `to`.
///
/// Distances within `eps` of a full turn collapse to zero.
pub fn ccw_gap(from: f64, to: f64, perimeter: f64, eps: f64) -> f64 {
    let gap = (to - from).rem_euclid(perimeter);
    if gap >= perimeter - eps {
        0.0
    } else {
        gap
    }
}

/// Box corners strictly between two perimeter positions, walking CCW.
///
/// Corners within `eps` of either end are skipped so an endpoint that sits on
/// a corner is not doubled.
pub fn corners_between(bounds: &BoundingBox, from: f64, to: f64, eps: f64) -> Vec<usize> {
    let perimeter = bounds.perimeter();
    let span = ccw_gap(from, to, perimeter, eps);
    let params = bounds.corner_params();

    let mut hits: Vec<(f64, usize)> = params
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| {
            let along = ccw_gap(from, c, perimeter, eps);
            (along > eps && along < span - eps).then_some((along, i))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    hits.into_iter().map(|(_, i)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::from_extents(0.0, 1.0, 0.0, 1.0)
    }

    #[test]
    fn test_segment_fully_inside_is_unchanged() {
        let line = EdgeLine::segment(DVec2::new(0.2, 0.2), DVec2::new(0.8, 0.5));
        let (lo, hi) = clip_line(&line, &unit_box()).unwrap();
        assert_eq!(lo, 0.0);
        assert_eq!(hi, line.t1);
    }

    #[test]
    fn test_ray_is_cut_at_the_boundary() {
        let line = EdgeLine {
            origin: DVec2::new(0.5, 0.5),
            dir: DVec2::new(1.0, 0.0),
            t0: 0.0,
            t1: f64::INFINITY,
        };
        let (lo, hi) = clip_line(&line, &unit_box()).unwrap();
        assert_eq!(lo, 0.0);
        assert!((line.at(hi) - DVec2::new(1.0, 0.5)).length() < 1e-12);
    }

    #[test]
    fn test_full_line_crosses_box() {
        let line = EdgeLine {
            origin: DVec2::new(0.5, 5.0),
            dir: DVec2::new(0.0, -1.0),
            t0: f64::NEG_INFINITY,
            t1: f64::INFINITY,
        };
        let (lo, hi) = clip_line(&line, &unit_box()).unwrap();
        assert!((line.at(lo) - DVec2::new(0.5, 1.0)).length() < 1e-12);
        assert!((line.at(hi) - DVec2::new(0.5, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_line_missing_box() {
        let line = EdgeLine {
            origin: DVec2::new(2.0, 0.0),
            dir: DVec2::new(0.0, 1.0),
            t0: f64::NEG_INFINITY,
            t1: f64::INFINITY,
        };
        assert!(clip_line(&line, &unit_box()).is_none());

        let outside = EdgeLine::segment(DVec2::new(1.5, 1.5), DVec2::new(3.0, 2.0));
        assert!(clip_line(&outside, &unit_box()).is_none());
    }

    #[test]
    fn test_corners_between_walks_ccw() {
        let bb = unit_box();
        // From the middle of the bottom side to the middle of the left side.
        assert_eq!(corners_between(&bb, 0.5, 3.5, 1e-9), vec![1, 2, 3]);
        // Wrapping past the min corner.
        assert_eq!(corners_between(&bb, 3.5, 0.5, 1e-9), vec![0]);
        // An endpoint on a corner does not repeat it.
        assert_eq!(corners_between(&bb, 1.0, 2.5, 1e-9), vec![2]);
        assert!(corners_between(&bb, 0.2, 0.7, 1e-9).is_empty());
    }
}

//! Numeric kernel for the sweep: predicates, circumcenters and breakpoints.
//!
//! The sweep line is horizontal and moves towards decreasing y. A site above
//! the sweep line defines a parabola opening upward (towards the site); the
//! beachline is the lower envelope of these parabolas.

use glam::DVec2;

use crate::constants::{tolerance, EPSILON_ABS};
use crate::error::DegenerateGeometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    Neg,
    Zero,
    Pos,
}

/// Equality within the shared absolute + relative tolerance.
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= tolerance(a, b)
}

/// Orientation of the triangle `(a, b, c)`.
///
/// `Pos` is counter-clockwise, `Neg` clockwise. Results whose magnitude is
/// within the rounding error bound of the determinant are reported as `Zero`.
#[inline]
pub fn orientation(a: DVec2, b: DVec2, c: DVec2) -> Sign {
    let ab = b - a;
    let ac = c - a;
    let det = ab.perp_dot(ac);
    if !det.is_finite() || det == 0.0 {
        return Sign::Zero;
    }

    // |det| <= |ab.x * ac.y| + |ab.y * ac.x|; scale by a small multiple of
    // machine epsilon for the subtraction and the two products.
    let bound = 64.0 * f64::EPSILON * ((ab.x * ac.y).abs() + (ab.y * ac.x).abs());
    if det > bound {
        Sign::Pos
    } else if det < -bound {
        Sign::Neg
    } else {
        Sign::Zero
    }
}

/// Center of the circle through three points.
pub fn circumcenter(a: DVec2, b: DVec2, c: DVec2) -> Result<DVec2, DegenerateGeometry> {
    if orientation(a, b, c) == Sign::Zero {
        return Err(DegenerateGeometry);
    }

    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * ab.perp_dot(ac);
    let ab2 = ab.length_squared();
    let ac2 = ac.length_squared();
    let ux = (ac.y * ab2 - ab.y * ac2) / d;
    let uy = (ab.x * ac2 - ac.x * ab2) / d;
    let center = a + DVec2::new(ux, uy);
    if !center.is_finite() {
        return Err(DegenerateGeometry);
    }
    Ok(center)
}

/// Height of the parabola with `focus` and a horizontal directrix at `x`.
///
/// Undefined when the focus lies on the directrix.
#[inline]
pub fn parabola_y(focus: DVec2, directrix: f64, x: f64) -> f64 {
    let dx = x - focus.x;
    dx * dx / (2.0 * (focus.y - directrix)) + 0.5 * (focus.y + directrix)
}

/// X coordinate of the breakpoint with `left`'s arc on the left and
/// `right`'s arc on the right, for a sweep line at `sweep_y`.
pub fn breakpoint_x(left: DVec2, right: DVec2, sweep_y: f64) -> f64 {
    let dl = left.y - sweep_y;
    let dr = right.y - sweep_y;
    let left_on_line = dl.abs() <= tolerance(left.y, sweep_y);
    let right_on_line = dr.abs() <= tolerance(right.y, sweep_y);

    // A focus on the sweep line degenerates to a vertical ray at its x.
    match (left_on_line, right_on_line) {
        (true, true) => return 0.5 * (left.x + right.x),
        (true, false) => return left.x,
        (false, true) => return right.x,
        (false, false) => {}
    }

    if approx_eq(left.y, right.y) {
        return 0.5 * (left.x + right.x);
    }

    // Solve in coordinates relative to the left focus: u = x - left.x.
    //   a u^2 + b u + c = 0
    let delta = right.x - left.x;
    let a = 1.0 / dl - 1.0 / dr;
    let b = 2.0 * delta / dr;
    let c = (left.y - right.y) - delta * delta / dr;

    let disc = (b * b - 4.0 * a * c).max(0.0);
    let sq = disc.sqrt();

    // Root (-b + sqrt(disc)) / 2a, evaluated without cancellation.
    let u = if b >= 0.0 {
        let q = -0.5 * (b + sq);
        if q.abs() <= EPSILON_ABS * EPSILON_ABS {
            0.0
        } else {
            c / q
        }
    } else {
        let q = -0.5 * (b - sq);
        q / a
    };
    left.x + u
}

/// Lowest point of the circle through `a`, `b`, `c` if the triple forms a
/// converging (clockwise) arc sequence on the beachline.
///
/// Returns `Ok(None)` for a diverging triple and `Err` for collinear sites.
pub fn circle_event_point(a: DVec2, b: DVec2, c: DVec2) -> Result<Option<(DVec2, f64)>, DegenerateGeometry> {
    match orientation(a, b, c) {
        Sign::Zero => Err(DegenerateGeometry),
        Sign::Pos => Ok(None),
        Sign::Neg => {
            let center = circumcenter(a, b, c)?;
            let radius = center.distance(b);
            Ok(Some((center, center.y - radius)))
        }
    }
}

/// Signed shoelace area of a polygon, positive when counter-clockwise.
///
/// Coordinates are taken relative to the first vertex so polygons far from
/// the origin keep their precision.
pub fn polygon_area(vertices: &[DVec2]) -> f64 {
    let Some(&anchor) = vertices.first() else {
        return 0.0;
    };
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| (*a - anchor).perp_dot(*b - anchor))
        .sum();
    0.5 * twice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_orientation_signs() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(1.0, 0.0);
        assert_eq!(orientation(a, b, DVec2::new(0.0, 1.0)), Sign::Pos);
        assert_eq!(orientation(a, b, DVec2::new(0.0, -1.0)), Sign::Neg);
        assert_eq!(orientation(a, b, DVec2::new(5.0, 0.0)), Sign::Zero);
        assert_eq!(orientation(a, b, a), Sign::Zero);
    }

    #[test]
    fn test_circumcenter_right_triangle() {
        let c = circumcenter(DVec2::new(0.0, 0.0), DVec2::new(4.0, 0.0), DVec2::new(0.0, 4.0)).unwrap();
        assert!(close(c.x, 2.0) && close(c.y, 2.0));
    }

    #[test]
    fn test_circumcenter_equidistant() {
        let (a, b, c) = (DVec2::new(-3.0, 1.5), DVec2::new(2.0, 7.0), DVec2::new(5.5, -2.0));
        let o = circumcenter(a, b, c).unwrap();
        assert!(close(o.distance(a), o.distance(b)));
        assert!(close(o.distance(a), o.distance(c)));
    }

    #[test]
    fn test_circumcenter_collinear_fails() {
        let r = circumcenter(DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0), DVec2::new(3.0, 3.0));
        assert_eq!(r, Err(DegenerateGeometry));
    }

    #[test]
    fn test_breakpoint_lies_on_both_parabolas() {
        let l = DVec2::new(0.0, 1.0);
        let r = DVec2::new(2.0, 2.0);
        let x = breakpoint_x(l, r, 0.0);
        assert!(close(x, 10f64.sqrt() - 2.0));
        assert!(close(parabola_y(l, 0.0, x), parabola_y(r, 0.0, x)));

        // Swapping sides selects the other intersection.
        let x2 = breakpoint_x(r, l, 0.0);
        assert!(x2 < x);
        assert!(close(parabola_y(l, 0.0, x2), parabola_y(r, 0.0, x2)));
    }

    #[test]
    fn test_breakpoint_left_arc_is_lower_left_of_breakpoint() {
        let l = DVec2::new(-1.0, 3.0);
        let r = DVec2::new(1.5, 1.0);
        let sweep = -0.5;
        let x = breakpoint_x(l, r, sweep);
        assert!(parabola_y(l, sweep, x - 0.01) < parabola_y(r, sweep, x - 0.01));
        assert!(parabola_y(r, sweep, x + 0.01) < parabola_y(l, sweep, x + 0.01));
    }

    #[test]
    fn test_breakpoint_equal_heights_is_midpoint() {
        let x = breakpoint_x(DVec2::new(1.0, 5.0), DVec2::new(3.0, 5.0), 2.0);
        assert!(close(x, 2.0));
    }

    #[test]
    fn test_breakpoint_site_on_sweep_line() {
        let upper = DVec2::new(0.0, 4.0);
        let fresh = DVec2::new(1.5, 0.0);
        assert!(close(breakpoint_x(upper, fresh, 0.0), 1.5));
        assert!(close(breakpoint_x(fresh, upper, 0.0), 1.5));
        assert!(close(breakpoint_x(DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0), 0.0), 1.0));
    }

    #[test]
    fn test_circle_event_orientation() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(0.0, 4.0);
        let c = DVec2::new(4.0, 0.0);
        let (center, y) = circle_event_point(a, b, c).unwrap().unwrap();
        assert!(close(center.x, 2.0) && close(center.y, 2.0));
        assert!(close(y, 2.0 - 8f64.sqrt()));
        assert_eq!(circle_event_point(c, b, a), Ok(None));
        assert!(circle_event_point(a, DVec2::new(1.0, 0.0), DVec2::new(2.0, 0.0)).is_err());
    }

    #[test]
    fn test_polygon_area_far_from_origin() {
        let o = DVec2::new(1.0e6, -2.0e6);
        let square = [
            o,
            o + DVec2::new(1e-3, 0.0),
            o + DVec2::new(1e-3, 1e-3),
            o + DVec2::new(0.0, 1e-3),
        ];
        assert!((polygon_area(&square) - 1e-6).abs() < 1e-12);

        let mut cw = square;
        cw.reverse();
        assert!((polygon_area(&cw) + 1e-6).abs() < 1e-12);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }
}

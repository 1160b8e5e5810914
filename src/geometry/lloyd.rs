use fortune_voronoi::{compute_with, BoundingBox, VoronoiConfig, VoronoiError};
use glam::DVec2;

/// Perform Lloyd relaxation on points inside a fixed box.
///
/// Lloyd relaxation moves each site to the centroid of its Voronoi cell,
/// creating a more uniform distribution of cells. Cells clipped by `bounds`
/// pull their sites inward, so points never leave the box.
pub fn lloyd_relax(points: &mut [DVec2], bounds: BoundingBox, iterations: usize) -> Result<(), VoronoiError> {
    for _ in 0..iterations {
        lloyd_step(points, bounds)?;
    }
    Ok(())
}

/// Perform a single Lloyd relaxation step.
fn lloyd_step(points: &mut [DVec2], bounds: BoundingBox) -> Result<(), VoronoiError> {
    let output = compute_with(&*points, VoronoiConfig::with_bounds(bounds))?;
    let diagram = &output.diagram;

    for cell in diagram.iter_cells() {
        if cell.len() < 3 || cell.coincident_with().is_some() {
            continue;
        }
        let polygon = diagram.cell_polygon(cell.site_index());
        if let Some(c) = polygon_centroid(&polygon) {
            points[cell.site_index()] = c;
        }
    }
    Ok(())
}

/// Area centroid of a simple polygon; `None` when the area vanishes.
pub fn polygon_centroid(vertices: &[DVec2]) -> Option<DVec2> {
    if vertices.len() < 3 {
        return None;
    }

    // Relative to the first vertex to avoid cancellation far from the origin.
    let anchor = vertices[0];
    let mut twice_area = 0.0;
    let mut weighted = DVec2::ZERO;
    for (a, b) in vertices.iter().zip(vertices.iter().cycle().skip(1)) {
        let (a, b) = (*a - anchor, *b - anchor);
        let cross = a.perp_dot(b);
        twice_area += cross;
        weighted += (a + b) * cross;
    }

    if twice_area.abs() <= 1e-300 {
        return None;
    }
    Some(anchor + weighted / (3.0 * twice_area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{generate_points, PointDistribution};

    /// Coefficient of variation of cell areas.
    fn area_spread(points: &[DVec2], bounds: BoundingBox) -> f64 {
        let out = compute_with(points, VoronoiConfig::with_bounds(bounds)).unwrap();
        let areas: Vec<f64> = (0..points.len()).map(|i| out.diagram.cell_area(i)).collect();
        let mean = areas.iter().sum::<f64>() / areas.len() as f64;
        let var = areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / areas.len() as f64;
        var.sqrt() / mean
    }

    #[test]
    fn test_polygon_centroid() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        assert_eq!(polygon_centroid(&square), Some(DVec2::new(1.0, 1.0)));
        assert_eq!(polygon_centroid(&square[..2]), None);
    }

    #[test]
    fn test_polygon_centroid_far_from_origin() {
        let o = DVec2::new(5.0e6, 5.0e6);
        let triangle = [o, o + DVec2::new(3e-3, 0.0), o + DVec2::new(0.0, 3e-3)];
        let c = polygon_centroid(&triangle).unwrap();
        assert!(c.distance(o + DVec2::splat(1e-3)) < 1e-9, "centroid {:?}", c);
    }

    #[test]
    fn test_lloyd_evens_out_cell_areas() {
        let bounds = BoundingBox::from_extents(0.0, 10.0, 0.0, 10.0);
        let mut points = generate_points(60, PointDistribution::Uniform, &bounds, 2718);
        let before = area_spread(&points, bounds);

        lloyd_relax(&mut points, bounds, 10).unwrap();

        for p in &points {
            assert!(bounds.contains(*p, 1e-9), "point left the box: {:?}", p);
        }
        let after = area_spread(&points, bounds);
        assert!(
            after < before,
            "Lloyd relaxation did not even out areas: {} -> {}",
            before,
            after
        );
    }
}

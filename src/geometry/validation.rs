//! Validation utilities for bounded planar Voronoi diagrams.
//!
//! These check the half-edge structure (twins, closed loops, winding), the
//! geometry (area coverage, vertex equidistance) and the defining property of
//! the diagram: every point of a cell is nearest to that cell's site.

use std::collections::HashSet;

use fortune_voronoi::{VertexKind, VoronoiDiagram};
use glam::DVec2;
use rand::Rng;

/// Results of validating a Voronoi diagram.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Total number of cells
    pub num_cells: usize,
    /// Non-empty cells with fewer than 3 half-edges
    pub degenerate_cells: Vec<usize>,
    /// Cells whose half-edge loop does not close
    pub open_cells: Vec<usize>,
    /// Half-edges whose twin does not point back or does not reverse them
    pub asymmetric_twins: Vec<usize>,
    /// Cells with clockwise or zero area
    pub wrong_winding_cells: Vec<usize>,
    /// Cells whose site lies inside the box but outside the cell polygon
    pub generator_outside_cells: Vec<usize>,
    /// Cells with no boundary (informational: site outside the box or duplicate)
    pub empty_cells: Vec<usize>,
    /// Largest spread of distances from an interior vertex to its three sites
    pub max_vertex_error: f64,
    /// Sum of cell areas; equals the box area for a complete tiling
    pub total_area: f64,
    pub box_area: f64,
    /// Euler characteristic components (V - E + F should equal 1)
    pub euler_v: usize,
    pub euler_e: usize,
    pub euler_f: usize,
}

impl ValidationResult {
    /// Check if the diagram is valid (no hard errors)
    pub fn is_valid(&self) -> bool {
        self.degenerate_cells.is_empty()
            && self.open_cells.is_empty()
            && self.asymmetric_twins.is_empty()
            && self.wrong_winding_cells.is_empty()
            && self.generator_outside_cells.is_empty()
            && self.area_check()
            && self.euler_check()
    }

    /// Check Euler characteristic: V - E + F = 1 for a subdivided rectangle
    pub fn euler_check(&self) -> bool {
        (self.euler_v as i64) - (self.euler_e as i64) + (self.euler_f as i64) == 1
    }

    /// Check that the cells tile the box (relative error below 1e-6)
    pub fn area_check(&self) -> bool {
        self.box_area > 0.0 && (self.total_area - self.box_area).abs() / self.box_area < 1e-6
    }

    /// Total number of hard issues found
    pub fn issue_count(&self) -> usize {
        self.degenerate_cells.len()
            + self.open_cells.len()
            + self.asymmetric_twins.len()
            + self.wrong_winding_cells.len()
            + self.generator_outside_cells.len()
            + usize::from(!self.area_check())
            + usize::from(!self.euler_check())
    }

    /// Print a summary of validation results
    pub fn print_summary(&self) {
        println!("Voronoi Validation Results:");
        println!("  Total cells: {}", self.num_cells);
        println!(
            "  Euler: V={} E={} F={} (V-E+F={})",
            self.euler_v,
            self.euler_e,
            self.euler_f,
            (self.euler_v as i64) - (self.euler_e as i64) + (self.euler_f as i64)
        );
        println!(
            "  Total area: {:.6} (box {:.6}, error {:.2e})",
            self.total_area,
            self.box_area,
            (self.total_area - self.box_area).abs() / self.box_area.max(f64::MIN_POSITIVE)
        );
        println!("  Max vertex equidistance error: {:.2e}", self.max_vertex_error);
        if !self.empty_cells.is_empty() {
            println!("  (info) Empty cells: {}", self.empty_cells.len());
        }

        if self.is_valid() {
            println!("  Status: VALID");
            return;
        }

        println!("  Status: INVALID");
        if !self.euler_check() {
            println!("  Euler characteristic FAILED (expected V-E+F=1)");
        }
        if !self.area_check() {
            println!("  Area coverage FAILED");
        }
        if !self.degenerate_cells.is_empty() {
            println!("  Degenerate cells (<3 edges): {}", self.degenerate_cells.len());
        }
        if !self.open_cells.is_empty() {
            println!("  Open cell loops: {}", self.open_cells.len());
        }
        if !self.asymmetric_twins.is_empty() {
            println!("  Asymmetric twins: {}", self.asymmetric_twins.len());
        }
        if !self.wrong_winding_cells.is_empty() {
            println!("  Wrong winding cells: {}", self.wrong_winding_cells.len());
        }
        if !self.generator_outside_cells.is_empty() {
            println!("  Generator outside cell: {}", self.generator_outside_cells.len());
        }
    }
}

/// True if `p` is inside (or on) the convex polygon wound counter-clockwise.
fn convex_contains(polygon: &[DVec2], p: DVec2, eps: f64) -> bool {
    polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .all(|(a, b)| (*b - *a).perp_dot(p - *a) >= -eps)
}

/// Validate a diagram's topology and geometry.
pub fn validate(diagram: &VoronoiDiagram) -> ValidationResult {
    let bounds = diagram.bounds;
    let eps = 1e-9 * bounds.width().max(bounds.height()).max(1.0);
    let mut result = ValidationResult {
        num_cells: diagram.num_cells(),
        box_area: bounds.area(),
        ..Default::default()
    };

    for (id, he) in diagram.half_edges.iter().enumerate() {
        if let Some(twin) = he.twin {
            let t = &diagram.half_edges[twin];
            if t.twin != Some(id) || t.origin != he.destination || t.destination != he.origin {
                result.asymmetric_twins.push(id);
            }
        }
    }

    let mut used_vertices: HashSet<usize> = HashSet::new();
    let mut boundary_edges = 0usize;
    let mut twin_half_edges = 0usize;

    for cell in diagram.iter_cells() {
        let index = cell.site_index();
        if cell.is_empty() {
            result.empty_cells.push(index);
            continue;
        }
        result.euler_f += 1;

        let ids = cell.half_edges();
        if ids.len() < 3 {
            result.degenerate_cells.push(index);
            continue;
        }

        let closed = ids.iter().enumerate().all(|(k, &he)| {
            let next = ids[(k + 1) % ids.len()];
            let h = &diagram.half_edges[he];
            h.next == next && diagram.half_edges[next].origin == h.destination && h.cell == index
        });
        if !closed {
            result.open_cells.push(index);
        }

        for &he in ids {
            let h = &diagram.half_edges[he];
            used_vertices.insert(h.origin);
            if h.twin.is_some() {
                twin_half_edges += 1;
            } else {
                boundary_edges += 1;
            }
        }

        let area = diagram.cell_area(index);
        result.total_area += area;
        if area <= 0.0 {
            result.wrong_winding_cells.push(index);
        }

        let polygon = diagram.cell_polygon(index);
        if bounds.contains(cell.site(), 0.0) && !convex_contains(&polygon, cell.site(), eps) {
            result.generator_outside_cells.push(index);
        }
    }

    for v in &diagram.vertices {
        if let VertexKind::Interior { sites: [a, b, c] } = v.kind {
            let ra = v.position.distance(diagram.sites[a]);
            let rb = v.position.distance(diagram.sites[b]);
            let rc = v.position.distance(diagram.sites[c]);
            let spread = ra.max(rb).max(rc) - ra.min(rb).min(rc);
            result.max_vertex_error = result.max_vertex_error.max(spread);
        }
    }

    result.euler_v = used_vertices.len();
    result.euler_e = twin_half_edges / 2 + boundary_edges;
    result
}

/// Validate and return simple pass/fail with optional details
pub fn validate_quick(diagram: &VoronoiDiagram) -> (bool, String) {
    let result = validate(diagram);
    if result.is_valid() {
        return (true, "Valid".to_string());
    }
    let mut issues = Vec::new();
    if !result.degenerate_cells.is_empty() {
        issues.push(format!("{} degenerate", result.degenerate_cells.len()));
    }
    if !result.open_cells.is_empty() {
        issues.push(format!("{} open", result.open_cells.len()));
    }
    if !result.asymmetric_twins.is_empty() {
        issues.push(format!("{} asymmetric-twin", result.asymmetric_twins.len()));
    }
    if !result.wrong_winding_cells.is_empty() {
        issues.push(format!("{} wrong-winding", result.wrong_winding_cells.len()));
    }
    if !result.generator_outside_cells.is_empty() {
        issues.push(format!("{} generator-outside", result.generator_outside_cells.len()));
    }
    if !result.area_check() {
        issues.push("area".to_string());
    }
    if !result.euler_check() {
        issues.push("euler".to_string());
    }
    (false, issues.join(", "))
}

/// Result of random point sampling validation
#[derive(Debug, Clone, Default)]
pub struct PointSampleResult {
    /// Number of samples tested
    pub num_samples: usize,
    /// Number of samples where the nearest site matched the cell
    pub correct: usize,
    /// Number of samples where the nearest site didn't match (beyond tolerance)
    pub incorrect: usize,
    /// Maximum distance error (how much closer a wrong site was)
    pub max_error: f64,
    /// Samples where the point wasn't inside any cell (gaps in the tiling)
    pub outside_all_cells: usize,
}

impl PointSampleResult {
    pub fn is_valid(&self) -> bool {
        self.incorrect == 0 && self.outside_all_cells == 0
    }

    pub fn accuracy(&self) -> f64 {
        if self.num_samples == 0 {
            1.0
        } else {
            self.correct as f64 / self.num_samples as f64
        }
    }
}

/// Sample random points in the box and check each lies in the cell of its
/// nearest site. Brute force: O(samples * (cells + sites)).
pub fn validate_point_samples<R: Rng>(
    diagram: &VoronoiDiagram,
    num_samples: usize,
    tolerance: f64,
    rng: &mut R,
) -> PointSampleResult {
    let bounds = diagram.bounds;
    let eps = 1e-9 * bounds.width().max(bounds.height()).max(1.0);
    let polygons: Vec<Vec<DVec2>> = (0..diagram.num_cells())
        .map(|i| {
            if diagram.cells[i].coincident_with.is_some() {
                Vec::new()
            } else {
                diagram.cell_polygon(i)
            }
        })
        .collect();

    let mut result = PointSampleResult {
        num_samples,
        ..Default::default()
    };

    for _ in 0..num_samples {
        let point = DVec2::new(
            rng.gen_range(bounds.min.x..bounds.max.x),
            rng.gen_range(bounds.min.y..bounds.max.y),
        );
        let Some(nearest) = diagram.nearest_site(point) else {
            result.outside_all_cells += 1;
            continue;
        };
        let nearest_dist = point.distance(diagram.sites[nearest]);

        let containing = polygons
            .iter()
            .position(|poly| poly.len() >= 3 && convex_contains(poly, point, eps));

        match containing {
            Some(cell) => {
                let error = point.distance(diagram.sites[cell]) - nearest_dist;
                if error > tolerance {
                    result.incorrect += 1;
                    result.max_error = result.max_error.max(error);
                } else {
                    result.correct += 1;
                }
            }
            None => result.outside_all_cells += 1,
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortune_voronoi::{compute, compute_with, BoundingBox, VoronoiConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::geometry::{generate_points, PointDistribution};

    #[test]
    fn test_random_diagram_is_valid() {
        let bounds = BoundingBox::from_extents(0.0, 1.0, 0.0, 1.0);
        let points = generate_points(400, PointDistribution::Uniform, &bounds, 12345);
        let output = compute(&points).unwrap();
        let result = validate(&output.diagram);
        assert!(result.is_valid(), "{:?}", result);
        assert!(result.max_vertex_error < 1e-9);
        assert!(result.empty_cells.is_empty());
    }

    #[test]
    fn test_clustered_and_grid_diagrams_are_valid() {
        let bounds = BoundingBox::from_extents(-50.0, 50.0, -20.0, 20.0);
        for dist in [PointDistribution::Clustered, PointDistribution::JitteredGrid] {
            let points = generate_points(300, dist, &bounds, 99);
            let output = compute(&points).unwrap();
            let (ok, details) = validate_quick(&output.diagram);
            assert!(ok, "{} diagram invalid: {}", dist, details);
        }
    }

    #[test]
    fn test_point_samples_match_nearest_site() {
        let bounds = BoundingBox::from_extents(0.0, 10.0, 0.0, 10.0);
        let points = generate_points(150, PointDistribution::Uniform, &bounds, 5);
        let output = compute_with(&points, VoronoiConfig::with_bounds(bounds)).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let samples = validate_point_samples(&output.diagram, 2000, 1e-9, &mut rng);
        assert!(samples.is_valid(), "{:?}", samples);
        assert_eq!(samples.accuracy(), 1.0);
    }

    #[test]
    fn test_single_cell_euler() {
        let bounds = BoundingBox::from_extents(0.0, 10.0, 0.0, 10.0);
        let output = compute_with(&[[5.0, 5.0]], VoronoiConfig::with_bounds(bounds)).unwrap();
        let result = validate(&output.diagram);
        assert_eq!((result.euler_v, result.euler_e, result.euler_f), (4, 4, 1));
        assert!(result.is_valid());
    }
}

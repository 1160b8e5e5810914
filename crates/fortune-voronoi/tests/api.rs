//! Public API integration tests for fortune-voronoi.

use fortune_voronoi::{
    compute, compute_with, BoundingBox, BoundsPolicy, VertexKind, VoronoiConfig, VoronoiDiagram, VoronoiError,
};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_points(n: usize, extent: f64, seed: u64) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| DVec2::new(rng.gen_range(0.0..extent), rng.gen_range(0.0..extent)))
        .collect()
}

/// Twins are mutual, loops are closed and counter-clockwise, and the cells
/// tile the bounding box.
fn assert_well_formed(d: &VoronoiDiagram) {
    for (id, he) in d.half_edges.iter().enumerate() {
        if let Some(twin) = he.twin {
            let t = &d.half_edges[twin];
            assert_eq!(t.twin, Some(id), "twin of {} is not mutual", id);
            assert_eq!(t.origin, he.destination);
            assert_eq!(t.destination, he.origin);
            assert_ne!(t.cell, he.cell);
        }
        assert_eq!(d.half_edges[he.next].prev, id);
        assert_eq!(d.half_edges[he.next].origin, he.destination, "gap after half-edge {}", id);
    }

    let mut total = 0.0;
    for cell in d.iter_cells() {
        if cell.is_empty() {
            continue;
        }
        let ids = cell.half_edges();
        for (k, &he) in ids.iter().enumerate() {
            assert_eq!(d.half_edges[he].cell, cell.site_index());
            assert_eq!(d.half_edges[he].next, ids[(k + 1) % ids.len()]);
        }
        let area = d.cell_area(cell.site_index());
        assert!(area > 0.0, "cell {} is not counter-clockwise", cell.site_index());
        total += area;
    }
    let box_area = d.bounds.area();
    assert!(
        (total - box_area).abs() <= 1e-6 * box_area,
        "cells cover {} of {}",
        total,
        box_area
    );
}

fn centroid(poly: &[DVec2]) -> DVec2 {
    poly.iter().copied().sum::<DVec2>() / poly.len() as f64
}

#[test]
fn test_three_sites_one_vertex() {
    let sites = vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
    let output = compute(&sites).expect("compute should succeed");
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 3);
    assert_eq!(d.num_edges(), 3);

    let interior: Vec<_> = d.interior_vertices().collect();
    assert_eq!(interior.len(), 1);
    let (vid, vertex, mut defining) = interior[0];
    assert!(vertex.position.distance(DVec2::new(2.0, 2.0)) < 1e-9);
    defining.sort_unstable();
    assert_eq!(defining, [0, 1, 2]);

    // All three edges meet at the vertex.
    let touching = d
        .half_edges
        .iter()
        .filter(|he| he.twin.is_some() && he.origin == vid)
        .count();
    assert_eq!(touching, 3);
    assert_well_formed(d);
}

#[test]
fn test_single_site_fills_box() {
    let bounds = BoundingBox::from_extents(0.0, 10.0, 0.0, 10.0);
    let output = compute_with(&[[5.0, 5.0]], VoronoiConfig::with_bounds(bounds)).unwrap();

    assert!(output.diagnostics.insufficient_sites);
    assert_eq!(output.diagram.num_cells(), 1);
    let poly = output.diagram.cell_polygon(0);
    assert_eq!(poly, bounds.corners().to_vec());
    assert!((output.diagram.cell_area(0) - 100.0).abs() < 1e-12);
    assert!(output.diagram.half_edges.iter().all(|he| he.is_boundary()));
}

#[test]
fn test_unit_square_meets_at_center() {
    let sites = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    let output = compute(&sites).unwrap();
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 4);
    assert_eq!(d.num_edges(), 4);
    let interior: Vec<_> = d.interior_vertices().collect();
    assert_eq!(interior.len(), 1);
    assert!(interior[0].1.position.distance(DVec2::new(0.5, 0.5)) < 1e-9);

    // Default box is [-1, 2]^2; each quadrant gets a quarter of it.
    for i in 0..4 {
        assert!((d.cell_area(i) - 2.25).abs() < 1e-9, "cell {} area {}", i, d.cell_area(i));
        assert!(d.cell(i).vertex_ids().any(|v| v == interior[0].0));
    }
    assert_well_formed(d);
}

#[test]
fn test_horizontal_collinear_sites() {
    let output = compute(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]).unwrap();
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 3);
    assert_eq!(d.interior_vertices().count(), 0);
    let mut xs: Vec<f64> = d
        .segments()
        .iter()
        .map(|(a, b)| {
            assert!((a.x - b.x).abs() < 1e-12, "edge is not vertical");
            a.x
        })
        .collect();
    xs.sort_by(f64::total_cmp);
    assert_eq!(xs.len(), 2);
    assert!((xs[0] - 0.5).abs() < 1e-12 && (xs[1] - 1.5).abs() < 1e-12);
    assert_well_formed(d);
}

#[test]
fn test_diagonal_collinear_sites() {
    let output = compute(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 3);
    assert_eq!(d.num_edges(), 2);
    assert_eq!(d.interior_vertices().count(), 0);
    assert!(output.diagnostics.degenerate_triples > 0);
    for (a, b) in d.segments() {
        // Both bisectors run along x + y = const.
        assert!(((a.x + a.y) - (b.x + b.y)).abs() < 1e-9);
    }
    assert_well_formed(d);
}

#[test]
fn test_coincident_points_do_not_fail() {
    let output = compute(&[[1.0, 1.0], [1.0, 1.0]]).unwrap();
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 2);
    assert!(output.diagnostics.insufficient_sites);
    assert_eq!(output.diagnostics.merged_sites, 1);
    assert_eq!(d.cells[1].coincident_with, Some(0));
    assert_eq!(d.cell_polygon(1), d.cell_polygon(0));
    assert_eq!(d.cell_polygon(0).len(), 4);
}

#[test]
fn test_duplicates_among_distinct_sites() {
    let mut sites = random_points(30, 10.0, 7);
    sites.push(sites[3]);
    sites.push(sites[17]);
    let output = compute(&sites).unwrap();

    assert_eq!(output.diagram.num_cells(), 32);
    assert_eq!(output.diagnostics.merged_sites, 2);
    assert_eq!(output.diagram.cells[30].coincident_with, Some(3));
    assert_eq!(output.diagram.cells[31].coincident_with, Some(17));
    assert_well_formed(&output.diagram);
}

#[test]
fn test_compute_insufficient_sites() {
    let empty: Vec<[f64; 2]> = Vec::new();
    assert!(matches!(compute(&empty), Err(VoronoiError::InsufficientSites(0))));
}

#[test]
fn test_random_cells_contain_their_nearest_points() {
    let sites = random_points(300, 100.0, 12345);
    let output = compute(&sites).expect("compute should succeed");
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 300);
    assert_eq!(output.diagnostics.empty_cells, 0);
    assert_well_formed(d);

    for i in 0..d.num_cells() {
        let poly = d.cell_polygon(i);
        assert!(poly.len() >= 3);
        let c = centroid(&poly);
        assert_eq!(d.nearest_site(c), Some(i), "centroid of cell {} is closer to another site", i);
    }

    for (_, v, [a, b, c]) in d.interior_vertices() {
        let ra = v.position.distance(sites[a]);
        assert!((ra - v.position.distance(sites[b])).abs() < 1e-6);
        assert!((ra - v.position.distance(sites[c])).abs() < 1e-6);
    }
}

#[test]
fn test_grid_with_cocircular_sites() {
    let sites: Vec<DVec2> = (0..6)
        .flat_map(|i| (0..6).map(move |j| DVec2::new(i as f64, j as f64)))
        .collect();
    let output = compute(&sites).unwrap();
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 36);
    assert_well_formed(d);
    // Inner cells are unit squares.
    let inner = 2 * 6 + 2;
    assert!((d.cell_area(inner) - 1.0).abs() < 1e-9);
    assert!(output.diagnostics.merged_vertices > 0);
}

#[test]
fn test_deterministic() {
    let sites = random_points(200, 50.0, 99);
    let a = compute(&sites).unwrap();
    let b = compute(&sites).unwrap();

    assert_eq!(a.diagram.vertices, b.diagram.vertices);
    assert_eq!(a.diagram.half_edges, b.diagram.half_edges);
    assert_eq!(a.diagram.cells, b.diagram.cells);
    assert_eq!(a.diagnostics, b.diagnostics);
}

#[test]
fn test_site_outside_fixed_bounds_gets_empty_cell() {
    let bounds = BoundingBox::from_extents(-1.0, 2.0, -1.0, 1.0);
    let sites = [[0.0, 0.0], [1.0, 0.0], [100.0, 100.0]];
    let output = compute_with(&sites, VoronoiConfig::with_bounds(bounds)).unwrap();
    let d = &output.diagram;

    assert_eq!(d.num_cells(), 3);
    assert!(d.cell(2).is_empty());
    assert_eq!(output.diagnostics.empty_cells, 1);
    assert!(!output.diagnostics.is_clean());
    assert!((d.cell_area(0) + d.cell_area(1) - bounds.area()).abs() < 1e-9);
}

#[test]
fn test_vertices_outside_fixed_bounds_are_clipped() {
    // The circumcenter (2, 2) lies outside the box.
    let bounds = BoundingBox::from_extents(-0.5, 1.5, -0.5, 1.5);
    let sites = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
    let config = VoronoiConfig {
        bounds: BoundsPolicy::Fixed(bounds),
        ..VoronoiConfig::default()
    };
    let output = compute_with(&sites, config).unwrap();

    assert_eq!(output.diagnostics.vertices_outside_bounds, 1);
    assert_eq!(output.diagnostics.clipped_edges, 3);
    assert_eq!(output.diagram.interior_vertices().count(), 0);
    assert!(output.diagram.largest_empty_circles().is_empty());
    assert!(output
        .diagram
        .vertices
        .iter()
        .all(|v| bounds.contains(v.position, 1e-9)));
}

#[test]
fn test_largest_empty_circle() {
    let output = compute(&[[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]]).unwrap();
    let circles = output.diagram.largest_empty_circles();
    assert_eq!(circles.len(), 1);
    assert!(circles[0].center.distance(DVec2::new(2.0, 2.0)) < 1e-9);
    assert!((circles[0].radius - 8f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_empty_circles_contain_no_site() {
    let sites = random_points(150, 20.0, 4242);
    let output = compute(&sites).unwrap();
    let circles = output.diagram.largest_empty_circles();
    assert!(!circles.is_empty());

    let best = circles[0].radius;
    for (_, v, [a, ..]) in output.diagram.interior_vertices() {
        assert!(v.position.distance(sites[a]) <= best + 1e-9);
    }
    for c in &circles {
        for s in &sites {
            assert!(s.distance(c.center) >= c.radius - 1e-6);
        }
    }
}

#[test]
fn test_boundary_vertices_lie_on_box() {
    let sites = random_points(80, 10.0, 31337);
    let output = compute(&sites).unwrap();
    let d = &output.diagram;
    let bb = d.bounds;

    for v in &d.vertices {
        match v.kind {
            VertexKind::Corner => assert!(bb.corners().contains(&v.position)),
            VertexKind::Boundary => {
                let p = v.position;
                let on_side = (p.x - bb.min.x).abs() < 1e-9
                    || (p.x - bb.max.x).abs() < 1e-9
                    || (p.y - bb.min.y).abs() < 1e-9
                    || (p.y - bb.max.y).abs() < 1e-9;
                assert!(on_side, "boundary vertex {:?} off the box", p);
            }
            VertexKind::Interior { .. } => assert!(bb.contains(v.position, 1e-9)),
        }
    }
}

#[test]
fn test_areas_hold_far_from_origin() {
    let offset = DVec2::splat(1.0e6);
    let sites: Vec<DVec2> = random_points(100, 1.0, 404).into_iter().map(|p| p + offset).collect();
    let output = compute(&sites).unwrap();
    let d = &output.diagram;

    let total: f64 = (0..d.num_cells()).map(|i| d.cell_area(i)).sum();
    assert!(
        (total - d.bounds.area()).abs() <= 1e-9 * d.bounds.area(),
        "cells cover {} of {}",
        total,
        d.bounds.area()
    );
    assert_well_formed(d);
}

#[test]
fn test_box_side_on_bisector_leaves_no_sliver_cells() {
    // x = 0.5 bisects (0, 2)|(1, 2) and y = 2.5 bisects (1, 2)|(1, 3).
    let sites = [[3.0, 1.0], [1.0, 2.0], [0.0, 1.0], [1.0, 3.0], [2.0, 3.0], [0.0, 2.0]];
    let bounds = BoundingBox::from_extents(0.5, 2.5, 0.5, 2.5);
    let output = compute_with(&sites, VoronoiConfig::with_bounds(bounds)).unwrap();
    let d = &output.diagram;

    for cell in d.iter_cells() {
        assert!(
            cell.is_empty() || cell.len() >= 3,
            "cell {} has {} half-edges",
            cell.site_index(),
            cell.len()
        );
        if !cell.is_empty() {
            assert!(d.cell_area(cell.site_index()) > 1e-9);
        }
    }
    assert!(d.cell(3).is_empty());
    assert!(d.cell(5).is_empty());
    assert_eq!(output.diagnostics.empty_cells, 2);
    assert_well_formed(d);
}

//! Planar Voronoi diagrams via Fortune's sweep-line algorithm.
//!
//! A horizontal sweep line moves from the top of the site set to the bottom.
//! Sites above it form a beachline of parabolic arcs; breakpoints between
//! arcs trace the Voronoi edges, and arcs that shrink to nothing create the
//! Voronoi vertices. The result is clipped to a bounding box so every cell
//! is a closed, counter-clockwise polygon.
//!
//! # Example
//!
//! ```
//! use fortune_voronoi::{compute, VertexKind};
//!
//! let sites = vec![[0.0, 0.0], [4.0, 0.0], [0.0, 4.0]];
//! let output = compute(&sites).expect("three sites");
//!
//! assert_eq!(output.diagram.num_cells(), 3);
//! let interior: Vec<_> = output.diagram.interior_vertices().collect();
//! assert_eq!(interior.len(), 1);
//! assert!(matches!(interior[0].1.kind, VertexKind::Interior { .. }));
//! ```

mod beachline;
mod builder;
mod clip;
pub mod constants;
mod diagram;
mod error;
mod event_queue;
pub mod geometry;
mod preprocess;
mod sweep;
mod types;

pub use diagram::{
    Cell, CellView, EmptyCircle, HalfEdge, HalfEdgeId, Vertex, VertexId, VertexKind, VoronoiDiagram,
};
pub use error::{DegenerateGeometry, VoronoiError};
pub use sweep::{SweepState, SweepStats};
pub use types::{BoundingBox, Point2Like};

use glam::DVec2;

use crate::constants::{DEFAULT_MARGIN_FRACTION, DEFAULT_MERGE_DISTANCE, DEFAULT_MIN_MARGIN};
use crate::preprocess::{merge_coincident_sites, MergeResult};
use crate::sweep::Sweep;

/// Output from Voronoi computation, including diagram and diagnostics.
#[derive(Debug, Clone)]
pub struct VoronoiOutput {
    pub diagram: VoronoiDiagram,
    pub diagnostics: VoronoiDiagnostics,
}

/// Conditions met and absorbed during computation.
///
/// None of these make the diagram unusable; they describe where the input
/// was degenerate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoronoiDiagnostics {
    /// Circle events discarded because their arc or neighbours changed.
    pub stale_events: usize,
    /// Neighbour triples skipped as collinear.
    pub degenerate_triples: usize,
    /// Sites folded into an earlier coincident site.
    pub merged_sites: usize,
    /// Fewer than two distinct sites: the diagram is a single box cell.
    pub insufficient_sites: bool,
    /// Distinct Voronoi vertices lying outside the bounding box.
    pub vertices_outside_bounds: usize,
    /// Circle-event vertices merged into an identical neighbour.
    pub merged_vertices: usize,
    /// Cells with no part inside the bounding box.
    pub empty_cells: usize,
    /// Edges lying entirely outside the bounding box.
    pub clipped_edges: usize,
    pub site_events: usize,
    pub circle_events: usize,
}

impl VoronoiDiagnostics {
    /// True when the input needed no degenerate-case handling.
    ///
    /// Stale events and merged vertices are routine and do not count.
    pub fn is_clean(&self) -> bool {
        self.degenerate_triples == 0
            && self.merged_sites == 0
            && !self.insufficient_sites
            && self.empty_cells == 0
    }
}

/// How the clipping rectangle is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsPolicy {
    /// Site bounding box padded by `max(margin_fraction * extent, min_margin)`
    /// on every side, where `extent` is the larger side of the site box.
    FromSites { margin_fraction: f64, min_margin: f64 },
    /// A caller-supplied box. Sites outside it get empty cells.
    Fixed(BoundingBox),
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        BoundsPolicy::FromSites {
            margin_fraction: DEFAULT_MARGIN_FRACTION,
            min_margin: DEFAULT_MIN_MARGIN,
        }
    }
}

impl BoundsPolicy {
    fn resolve(&self, sites: &[DVec2]) -> Result<BoundingBox, VoronoiError> {
        let bounds = match *self {
            BoundsPolicy::Fixed(bounds) => bounds,
            BoundsPolicy::FromSites {
                margin_fraction,
                min_margin,
            } => {
                let Some(tight) = BoundingBox::enclosing(sites) else {
                    return Err(VoronoiError::InsufficientSites(0));
                };
                let extent = tight.width().max(tight.height());
                tight.padded((margin_fraction * extent).max(min_margin))
            }
        };
        if !bounds.is_valid() {
            return Err(VoronoiError::InvalidBounds(bounds));
        }
        Ok(bounds)
    }
}

/// Configuration for Voronoi computation.
#[derive(Debug, Clone)]
pub struct VoronoiConfig {
    pub bounds: BoundsPolicy,
    /// Merge sites closer than `merge_distance` before sweeping. Exact
    /// duplicates are merged either way.
    pub preprocess: bool,
    pub merge_distance: f64,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsPolicy::default(),
            preprocess: true,
            merge_distance: DEFAULT_MERGE_DISTANCE,
        }
    }
}

impl VoronoiConfig {
    /// Default configuration clipped to a fixed box.
    pub fn with_bounds(bounds: BoundingBox) -> Self {
        Self {
            bounds: BoundsPolicy::Fixed(bounds),
            ..Self::default()
        }
    }
}

/// Compute a Voronoi diagram with default settings.
///
/// Returns a diagram plus diagnostics. Errors are reserved for invalid
/// inputs: no sites, non-finite coordinates or an unusable fixed box.
pub fn compute<P: Point2Like>(points: &[P]) -> Result<VoronoiOutput, VoronoiError> {
    compute_with(points, VoronoiConfig::default())
}

/// Compute a Voronoi diagram with explicit configuration.
pub fn compute_with<P: Point2Like>(
    points: &[P],
    config: VoronoiConfig,
) -> Result<VoronoiOutput, VoronoiError> {
    if points.is_empty() {
        return Err(VoronoiError::InsufficientSites(0));
    }

    let sites: Vec<DVec2> = points.iter().map(Point2Like::to_dvec2).collect();
    if let Some((index, p)) = sites.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(VoronoiError::NonFiniteCoordinate {
            index,
            x: p.x,
            y: p.y,
        });
    }

    let bounds = config.bounds.resolve(&sites)?;

    let merge = if config.preprocess {
        merge_coincident_sites(&sites, config.merge_distance)
    } else {
        merge_coincident_sites(&sites, 0.0)
    };

    let (diagram, diagnostics) = run_sweep(&sites, &merge, bounds);
    Ok(VoronoiOutput {
        diagram,
        diagnostics,
    })
}

fn run_sweep(sites: &[DVec2], merge: &MergeResult, bounds: BoundingBox) -> (VoronoiDiagram, VoronoiDiagnostics) {
    let insufficient = merge.num_distinct() < 2;
    if insufficient {
        log::warn!(
            "{} site(s) but only {} distinct: emitting a single box cell",
            sites.len(),
            merge.num_distinct()
        );
    }

    let (diagram, sweep_stats, finalize_stats) = Sweep::new(sites, merge).finish(bounds);

    let diagnostics = VoronoiDiagnostics {
        stale_events: sweep_stats.stale_events,
        degenerate_triples: sweep_stats.degenerate_triples,
        merged_sites: merge.num_merged,
        insufficient_sites: insufficient,
        vertices_outside_bounds: finalize_stats.vertices_outside_bounds,
        merged_vertices: finalize_stats.merged_vertices,
        empty_cells: finalize_stats.empty_cells,
        clipped_edges: finalize_stats.clipped_away_edges,
        site_events: sweep_stats.site_events,
        circle_events: sweep_stats.circle_events,
    };
    (diagram, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds_pad_site_box() {
        let sites = [DVec2::new(0.0, 0.0), DVec2::new(20.0, 10.0)];
        let bounds = BoundsPolicy::default().resolve(&sites).unwrap();
        assert_eq!(bounds.min, DVec2::new(-2.0, -2.0));
        assert_eq!(bounds.max, DVec2::new(22.0, 12.0));
    }

    #[test]
    fn test_min_margin_for_collapsed_extent() {
        let bounds = BoundsPolicy::default().resolve(&[DVec2::new(3.0, 3.0)]).unwrap();
        assert_eq!(bounds, BoundingBox::from_extents(2.0, 4.0, 2.0, 4.0));
    }

    #[test]
    fn test_invalid_fixed_bounds_rejected() {
        let bad = BoundingBox::from_extents(1.0, 0.0, 0.0, 1.0);
        let err = compute_with(&[[0.5, 0.5], [0.2, 0.2]], VoronoiConfig::with_bounds(bad)).unwrap_err();
        assert_eq!(err, VoronoiError::InvalidBounds(bad));
    }

    #[test]
    fn test_empty_and_non_finite_inputs() {
        let empty: [[f64; 2]; 0] = [];
        assert_eq!(compute(&empty).unwrap_err(), VoronoiError::InsufficientSites(0));

        let err = compute(&[[0.0, 0.0], [f64::NAN, 1.0]]).unwrap_err();
        assert!(matches!(err, VoronoiError::NonFiniteCoordinate { index: 1, .. }));
    }

    #[test]
    fn test_diagnostics_clean_for_general_position() {
        let out = compute(&[[0.0, 0.0], [4.0, 0.5], [1.0, 4.0], [5.0, 5.0]]).unwrap();
        assert!(out.diagnostics.is_clean(), "{:?}", out.diagnostics);
        assert_eq!(out.diagnostics.site_events, 4);
    }
}

//! The bounded Voronoi diagram: vertices, half-edges and cells.
//!
//! Every cell's boundary is a counter-clockwise loop of half-edges with the
//! cell on their left. Half-edges along the bounding box have no twin.

use glam::DVec2;

use crate::constants::tolerance;
use crate::geometry::polygon_area;
use crate::types::BoundingBox;

pub type VertexId = usize;
pub type HalfEdgeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexKind {
    /// Circumcenter of three sites, produced by a circle event.
    Interior { sites: [usize; 3] },
    /// Where an edge meets the bounding box.
    Boundary,
    /// A bounding box corner.
    Corner,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: DVec2,
    pub kind: VertexKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    pub origin: VertexId,
    pub destination: VertexId,
    /// Site index of the cell on this half-edge's left.
    pub cell: usize,
    /// Opposite half-edge in the neighbouring cell; `None` along the box.
    pub twin: Option<HalfEdgeId>,
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
}

impl HalfEdge {
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.twin.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub site_index: usize,
    pub site: DVec2,
    /// Boundary loop in counter-clockwise order. Empty for a cell that lies
    /// outside the bounds or duplicates another site.
    pub half_edges: Vec<HalfEdgeId>,
    /// Set when this site coincides with an earlier one; the geometry lives
    /// on that representative's cell.
    pub coincident_with: Option<usize>,
}

/// Largest circle centred on a Voronoi vertex that contains no site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmptyCircle {
    pub center: DVec2,
    pub radius: f64,
    pub sites: [usize; 3],
}

#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    /// Input sites in caller order.
    pub sites: Vec<DVec2>,
    pub vertices: Vec<Vertex>,
    pub half_edges: Vec<HalfEdge>,
    /// One cell per input site, indexed like `sites`.
    pub cells: Vec<Cell>,
    pub bounds: BoundingBox,
}

impl VoronoiDiagram {
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    #[inline]
    pub fn cell(&self, index: usize) -> CellView<'_> {
        CellView {
            diagram: self,
            cell: &self.cells[index],
        }
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = CellView<'_>> + '_ {
        self.cells.iter().map(move |cell| CellView { diagram: self, cell })
    }

    /// Origins of the cell's half-edges, counter-clockwise.
    ///
    /// A coincident site reports its representative's polygon.
    pub fn cell_polygon(&self, index: usize) -> Vec<DVec2> {
        let owner = self.cells[index].coincident_with.unwrap_or(index);
        self.cells[owner]
            .half_edges
            .iter()
            .map(|&he| self.vertices[self.half_edges[he].origin].position)
            .collect()
    }

    /// Shoelace area of the cell polygon.
    pub fn cell_area(&self, index: usize) -> f64 {
        polygon_area(&self.cell_polygon(index))
    }

    /// Every edge once, as a segment between its clipped endpoints.
    ///
    /// Box-boundary half-edges are not included.
    pub fn segments(&self) -> Vec<(DVec2, DVec2)> {
        self.half_edges
            .iter()
            .enumerate()
            .filter_map(|(id, he)| {
                let twin = he.twin?;
                (id < twin).then(|| {
                    (
                        self.vertices[he.origin].position,
                        self.vertices[he.destination].position,
                    )
                })
            })
            .collect()
    }

    /// Number of site-separating edges (twin pairs).
    pub fn num_edges(&self) -> usize {
        self.half_edges.iter().filter(|he| he.twin.is_some()).count() / 2
    }

    /// Vertices produced by circle events, with their defining sites.
    pub fn interior_vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex, [usize; 3])> + '_ {
        self.vertices.iter().enumerate().filter_map(|(i, v)| match v.kind {
            VertexKind::Interior { sites } => Some((i, v, sites)),
            _ => None,
        })
    }

    /// Largest empty circles among the interior vertices inside the bounds.
    ///
    /// All vertices whose radius ties the maximum are returned. Empty when the
    /// diagram has no interior vertex.
    pub fn largest_empty_circles(&self) -> Vec<EmptyCircle> {
        let circles: Vec<EmptyCircle> = self
            .interior_vertices()
            .map(|(_, v, sites)| EmptyCircle {
                center: v.position,
                radius: v.position.distance(self.sites[sites[0]]),
                sites,
            })
            .collect();

        let Some(best) = circles.iter().map(|c| c.radius).max_by(f64::total_cmp) else {
            return Vec::new();
        };
        circles
            .into_iter()
            .filter(|c| best - c.radius <= tolerance(best, c.radius))
            .collect()
    }

    /// Index of the site closest to `p` (ties go to the lower index).
    ///
    /// Brute force; intended for checking and small queries.
    pub fn nearest_site(&self, p: DVec2) -> Option<usize> {
        self.sites
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.distance_squared(p).total_cmp(&b.1.distance_squared(p)))
            .map(|(i, _)| i)
    }
}

/// Borrowed view of one cell.
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    diagram: &'a VoronoiDiagram,
    cell: &'a Cell,
}

impl<'a> CellView<'a> {
    #[inline]
    pub fn site_index(&self) -> usize {
        self.cell.site_index
    }

    #[inline]
    pub fn site(&self) -> DVec2 {
        self.cell.site
    }

    #[inline]
    pub fn half_edges(&self) -> &'a [HalfEdgeId] {
        &self.cell.half_edges
    }

    #[inline]
    pub fn coincident_with(&self) -> Option<usize> {
        self.cell.coincident_with
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cell.half_edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cell.half_edges.is_empty()
    }

    /// Vertex ids around the cell, counter-clockwise.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + 'a {
        let diagram = self.diagram;
        self.cell.half_edges.iter().map(move |&he| diagram.half_edges[he].origin)
    }

    /// Ids of neighbouring cells across non-boundary edges.
    pub fn neighbors(&self) -> impl Iterator<Item = usize> + 'a {
        let diagram = self.diagram;
        self.cell
            .half_edges
            .iter()
            .filter_map(move |&he| diagram.half_edges[he].twin)
            .map(move |twin| diagram.half_edges[twin].cell)
    }
}

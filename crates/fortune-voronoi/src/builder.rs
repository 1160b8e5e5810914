//! Unbounded half-edge structure built during the sweep, and its conversion
//! into the bounded [`VoronoiDiagram`].
//!
//! During the sweep an edge may lack either endpoint (it runs to infinity),
//! and a cell's boundary is a set of linked chains rather than a loop.
//! [`DiagramBuilder::finalize`] merges near-identical vertices, clips every
//! edge to the bounding box and closes each cell along the box perimeter.

use glam::DVec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::clip::{ccw_gap, clip_line, corners_between, EdgeLine};
use crate::constants::{EPSILON_ABS, VERTEX_MERGE_DISTANCE};
use crate::diagram::{Cell, HalfEdge, HalfEdgeId, Vertex, VertexId, VertexKind, VoronoiDiagram};
use crate::geometry::polygon_area;
use crate::preprocess::SimpleDsu;
use crate::types::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawVertex {
    pub position: DVec2,
    pub sites: [usize; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHalfEdge {
    pub cell: usize,
    pub twin: usize,
    pub origin: Option<usize>,
    pub destination: Option<usize>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

#[derive(Debug, Default)]
pub struct DiagramBuilder {
    vertices: Vec<RawVertex>,
    half_edges: Vec<RawHalfEdge>,
    cell_edges: Vec<Vec<usize>>,
}

/// Counters gathered while bounding the diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeStats {
    /// Circle-event vertices folded into an identical neighbour.
    pub merged_vertices: usize,
    /// Distinct circle-event vertices lying outside the bounds.
    pub vertices_outside_bounds: usize,
    /// Edges with no part inside the bounds.
    pub clipped_away_edges: usize,
    /// Non-duplicate cells that ended with an empty boundary.
    pub empty_cells: usize,
}

impl DiagramBuilder {
    pub fn new(num_sites: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(num_sites * 2),
            half_edges: Vec::with_capacity(num_sites * 6),
            cell_edges: vec![Vec::new(); num_sites],
        }
    }

    #[cfg(test)]
    pub fn half_edge(&self, id: usize) -> &RawHalfEdge {
        &self.half_edges[id]
    }

    pub fn add_vertex(&mut self, position: DVec2, sites: [usize; 3]) -> usize {
        self.vertices.push(RawVertex { position, sites });
        self.vertices.len() - 1
    }

    /// Create the twin pair separating `left_site` and `right_site`.
    ///
    /// Returns `(half-edge in left's cell, half-edge in right's cell)`.
    pub fn add_edge(&mut self, left_site: usize, right_site: usize) -> (usize, usize) {
        let a = self.half_edges.len();
        let b = a + 1;
        self.half_edges.push(RawHalfEdge {
            cell: left_site,
            twin: b,
            origin: None,
            destination: None,
            prev: None,
            next: None,
        });
        self.half_edges.push(RawHalfEdge {
            cell: right_site,
            twin: a,
            origin: None,
            destination: None,
            prev: None,
            next: None,
        });
        self.cell_edges[left_site].push(a);
        self.cell_edges[right_site].push(b);
        (a, b)
    }

    #[inline]
    pub fn set_origin(&mut self, he: usize, vertex: usize) {
        self.half_edges[he].origin = Some(vertex);
    }

    #[inline]
    pub fn set_destination(&mut self, he: usize, vertex: usize) {
        self.half_edges[he].destination = Some(vertex);
    }

    /// Make `next` follow `prev` along their cell's boundary.
    #[inline]
    pub fn link(&mut self, prev: usize, next: usize) {
        if prev == next {
            return;
        }
        self.half_edges[prev].next = Some(next);
        self.half_edges[next].prev = Some(prev);
    }

    /// The unclipped line carried by half-edge `id`, or `None` when it has
    /// collapsed to a point.
    fn edge_line(&self, id: usize, sites: &[DVec2], dsu: &mut SimpleDsu) -> Option<EdgeLine> {
        let he = &self.half_edges[id];
        let a = sites[he.cell];
        let b = sites[self.half_edges[he.twin].cell];
        // Direction keeping `a` on the left.
        let dir = (b - a).perp().normalize_or_zero();
        if dir == DVec2::ZERO {
            return None;
        }

        let origin = he.origin.map(|v| dsu.find(v));
        let destination = he.destination.map(|v| dsu.find(v));
        let line = match (origin, destination) {
            (Some(o), Some(d)) => {
                if o == d {
                    return None;
                }
                EdgeLine::segment(self.vertices[o].position, self.vertices[d].position)
            }
            (Some(o), None) => EdgeLine {
                origin: self.vertices[o].position,
                dir,
                t0: 0.0,
                t1: f64::INFINITY,
            },
            (None, Some(d)) => EdgeLine {
                origin: self.vertices[d].position,
                dir,
                t0: f64::NEG_INFINITY,
                t1: 0.0,
            },
            (None, None) => EdgeLine {
                origin: 0.5 * (a + b),
                dir,
                t0: f64::NEG_INFINITY,
                t1: f64::INFINITY,
            },
        };
        Some(line)
    }

    /// Boundary chains of one cell, each in next-order.
    ///
    /// The flag is true for chains that close on themselves.
    fn cell_chains(&self, site: usize) -> Vec<(Vec<usize>, bool)> {
        let edges = &self.cell_edges[site];
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut chains = Vec::new();

        for &start in edges {
            if seen.contains(&start) {
                continue;
            }
            // Rewind to the head of an open chain, or stop after a full loop.
            let mut head = start;
            let mut closed = false;
            while let Some(p) = self.half_edges[head].prev {
                if p == start {
                    closed = true;
                    break;
                }
                head = p;
            }
            if closed {
                head = start;
            }

            let mut chain = Vec::new();
            let mut cursor = Some(head);
            while let Some(he) = cursor {
                if !seen.insert(he) {
                    break;
                }
                chain.push(he);
                cursor = self.half_edges[he].next;
            }
            chains.push((chain, closed));
        }
        chains
    }

    /// Clip to `bounds` and assemble the final diagram.
    ///
    /// `coincident_with[i]` names the representative of a duplicated site;
    /// such cells carry no geometry of their own.
    pub fn finalize(
        self,
        sites: &[DVec2],
        coincident_with: &[Option<usize>],
        bounds: BoundingBox,
    ) -> (VoronoiDiagram, FinalizeStats) {
        let mut stats = FinalizeStats::default();
        let scale = bounds.width().max(bounds.height()).max(1.0);
        let merge_eps = VERTEX_MERGE_DISTANCE * scale;
        let eps = EPSILON_ABS * scale;

        // Fold zero-length edges: several circle events at one point.
        let mut dsu = SimpleDsu::new(self.vertices.len());
        for he in &self.half_edges {
            if let (Some(o), Some(d)) = (he.origin, he.destination) {
                if self.vertices[o].position.distance(self.vertices[d].position) <= merge_eps {
                    dsu.union(o, d);
                }
            }
        }
        for v in 0..self.vertices.len() {
            if dsu.find(v) != v {
                stats.merged_vertices += 1;
            } else if !bounds.contains(self.vertices[v].position, 0.0) {
                stats.vertices_outside_bounds += 1;
            }
        }

        let mut out = OutputVertices::new(bounds, eps);

        // Clip each twin pair once; the twin takes the reversed result.
        let mut clipped: Vec<Option<(VertexId, VertexId)>> = vec![None; self.half_edges.len()];
        for id in 0..self.half_edges.len() {
            let he = self.half_edges[id];
            if id > he.twin {
                continue;
            }
            let Some(line) = self.edge_line(id, sites, &mut dsu) else {
                continue;
            };
            let Some((lo, hi)) = clip_line(&line, &bounds) else {
                stats.clipped_away_edges += 1;
                continue;
            };
            if hi - lo <= eps {
                stats.clipped_away_edges += 1;
                continue;
            }

            let start = match he.origin {
                Some(v) if lo == line.t0 => {
                    let root = dsu.find(v);
                    out.interior(root, &self.vertices[root])
                }
                _ => out.boundary(line.at(lo)),
            };
            let end = match he.destination {
                Some(v) if hi == line.t1 => {
                    let root = dsu.find(v);
                    out.interior(root, &self.vertices[root])
                }
                _ => out.boundary(line.at(hi)),
            };
            if start == end {
                stats.clipped_away_edges += 1;
                continue;
            }
            clipped[id] = Some((start, end));
            clipped[he.twin] = Some((end, start));
        }

        // The cell holding the box center owns the whole box if no edge
        // crosses it.
        let center = bounds.center();
        let box_owner = (0..sites.len())
            .filter(|&i| coincident_with.get(i).copied().flatten().is_none())
            .min_by(|&a, &b| {
                sites[a]
                    .distance_squared(center)
                    .total_cmp(&sites[b].distance_squared(center))
            });

        let mut half_edges: Vec<HalfEdge> = Vec::with_capacity(self.half_edges.len());
        let mut raw_of: Vec<Option<usize>> = Vec::with_capacity(self.half_edges.len());
        let mut out_of_raw: Vec<Option<HalfEdgeId>> = vec![None; self.half_edges.len()];
        let mut cells = Vec::with_capacity(sites.len());

        for (site, &position) in sites.iter().enumerate() {
            let coincident = coincident_with.get(site).copied().flatten();
            let mut cell = Cell {
                site_index: site,
                site: position,
                half_edges: Vec::new(),
                coincident_with: coincident,
            };
            if coincident.is_some() {
                cells.push(cell);
                continue;
            }

            let pieces = self.cell_pieces(site, &clipped, &out);
            let mut boundary = if pieces.is_empty() {
                if box_owner == Some(site) {
                    out.box_loop()
                } else {
                    Vec::new()
                }
            } else {
                out.close_pieces(pieces)
            };
            // A box side lying on a bisector leaves a sliver with no area;
            // its neighbour keeps the shared edge as a box edge.
            if !boundary.is_empty() && out.is_sliver(&boundary) {
                log::debug!("cell {} collapsed to a {}-edge sliver, leaving it empty", site, boundary.len());
                boundary.clear();
            }
            if boundary.is_empty() {
                stats.empty_cells += 1;
            }

            let base = half_edges.len();
            let n = boundary.len();
            for (k, &(origin, destination, raw)) in boundary.iter().enumerate() {
                let id = base + k;
                half_edges.push(HalfEdge {
                    origin,
                    destination,
                    cell: site,
                    twin: None,
                    next: base + (k + 1) % n,
                    prev: base + (k + n - 1) % n,
                });
                raw_of.push(raw);
                if let Some(r) = raw {
                    out_of_raw[r] = Some(id);
                }
                cell.half_edges.push(id);
            }
            cells.push(cell);
        }

        for (id, raw) in raw_of.iter().enumerate() {
            if let Some(r) = *raw {
                half_edges[id].twin = out_of_raw[self.half_edges[r].twin];
            }
        }

        log::debug!(
            "finalized: {} vertices, {} half-edges, {} merged, {} outside bounds, {} empty cells",
            out.vertices.len(),
            half_edges.len(),
            stats.merged_vertices,
            stats.vertices_outside_bounds,
            stats.empty_cells
        );

        let diagram = VoronoiDiagram {
            sites: sites.to_vec(),
            vertices: out.vertices,
            half_edges,
            cells,
            bounds,
        };
        (diagram, stats)
    }

    /// Split a cell's clipped chains into runs of consecutive surviving
    /// half-edges. A run either closes on itself or starts and ends on the
    /// box boundary.
    fn cell_pieces(&self, site: usize, clipped: &[Option<(VertexId, VertexId)>], out: &OutputVertices) -> Vec<Piece> {
        let mut pieces = Vec::new();
        for (mut chain, closed) in self.cell_chains(site) {
            if closed {
                // Start a loop where it leaves the box, if it ever does.
                let exit = chain.iter().position(|&he| match clipped[he] {
                    None => true,
                    Some((s, _)) => out.is_on_boundary(s),
                });
                match exit {
                    Some(k) => chain.rotate_left(k),
                    None => {
                        let edges: Vec<_> = chain
                            .iter()
                            .filter_map(|&he| clipped[he].map(|(s, e)| (s, e, Some(he))))
                            .collect();
                        if !edges.is_empty() {
                            pieces.push(Piece { edges, closed: true });
                        }
                        continue;
                    }
                }
            }

            let mut current: Vec<(VertexId, VertexId, Option<usize>)> = Vec::new();
            for he in chain {
                match clipped[he] {
                    None => {
                        if !current.is_empty() {
                            pieces.push(Piece::open(std::mem::take(&mut current)));
                        }
                    }
                    Some((s, e)) => {
                        if !current.is_empty() && out.is_on_boundary(s) {
                            pieces.push(Piece::open(std::mem::take(&mut current)));
                        }
                        current.push((s, e, Some(he)));
                        if out.is_on_boundary(e) {
                            pieces.push(Piece::open(std::mem::take(&mut current)));
                        }
                    }
                }
            }
            if !current.is_empty() {
                pieces.push(Piece::open(current));
            }
        }
        pieces
    }
}

/// A run of clipped half-edges `(origin, destination, raw id)`.
#[derive(Debug)]
struct Piece {
    edges: Vec<(VertexId, VertexId, Option<usize>)>,
    closed: bool,
}

impl Piece {
    fn open(edges: Vec<(VertexId, VertexId, Option<usize>)>) -> Self {
        Self { edges, closed: false }
    }

    fn entry(&self) -> VertexId {
        self.edges[0].0
    }

    fn exit(&self) -> VertexId {
        self.edges[self.edges.len() - 1].1
    }
}

/// Output vertex table shared by all cells.
struct OutputVertices {
    vertices: Vec<Vertex>,
    bounds: BoundingBox,
    eps: f64,
    interior_ids: FxHashMap<usize, VertexId>,
    corner_ids: [Option<VertexId>; 4],
    /// Boundary vertices with their perimeter coordinate.
    boundary_ids: Vec<(f64, VertexId)>,
}

impl OutputVertices {
    fn new(bounds: BoundingBox, eps: f64) -> Self {
        Self {
            vertices: Vec::new(),
            bounds,
            eps,
            interior_ids: FxHashMap::default(),
            corner_ids: [None; 4],
            boundary_ids: Vec::new(),
        }
    }

    fn interior(&mut self, raw: usize, v: &RawVertex) -> VertexId {
        if let Some(&id) = self.interior_ids.get(&raw) {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            position: v.position,
            kind: VertexKind::Interior { sites: v.sites },
        });
        self.interior_ids.insert(raw, id);
        id
    }

    fn corner(&mut self, i: usize) -> VertexId {
        if let Some(id) = self.corner_ids[i] {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            position: self.bounds.corners()[i],
            kind: VertexKind::Corner,
        });
        self.corner_ids[i] = Some(id);
        id
    }

    /// Vertex where an edge crosses the box; reuses any vertex already at
    /// that point of the perimeter.
    fn boundary(&mut self, p: DVec2) -> VertexId {
        if let Some(i) = self.bounds.corners().iter().position(|c| c.distance(p) <= self.eps) {
            return self.corner(i);
        }
        let param = self.bounds.perimeter_param(p);
        if let Some(&(_, id)) = self.boundary_ids.iter().find(|(t, _)| (t - param).abs() <= self.eps) {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            position: p,
            kind: VertexKind::Boundary,
        });
        self.boundary_ids.push((param, id));
        id
    }

    fn is_on_boundary(&self, v: VertexId) -> bool {
        matches!(self.vertices[v].kind, VertexKind::Boundary | VertexKind::Corner)
    }

    fn param(&self, v: VertexId) -> f64 {
        self.bounds.perimeter_param(self.vertices[v].position)
    }

    /// True for a loop with fewer than three edges or a mean width below
    /// the tolerance (area small against its perimeter).
    fn is_sliver(&self, boundary: &[(VertexId, VertexId, Option<usize>)]) -> bool {
        if boundary.len() < 3 {
            return true;
        }
        let polygon: Vec<DVec2> = boundary.iter().map(|&(o, _, _)| self.vertices[o].position).collect();
        let perimeter: f64 = boundary
            .iter()
            .map(|&(o, d, _)| self.vertices[o].position.distance(self.vertices[d].position))
            .sum();
        polygon_area(&polygon) <= self.eps * perimeter
    }

    fn box_loop(&mut self) -> Vec<(VertexId, VertexId, Option<usize>)> {
        let ids: Vec<VertexId> = (0..4).map(|i| self.corner(i)).collect();
        (0..4).map(|i| (ids[i], ids[(i + 1) % 4], None)).collect()
    }

    /// Box edges from `from` to `to`, counter-clockwise through any corners.
    fn walk(&mut self, from: VertexId, to: VertexId) -> Vec<(VertexId, VertexId, Option<usize>)> {
        if from == to {
            return Vec::new();
        }
        let corners = corners_between(&self.bounds, self.param(from), self.param(to), self.eps);
        let mut stops = vec![from];
        stops.extend(corners.into_iter().map(|i| self.corner(i)));
        stops.push(to);
        stops.windows(2).map(|w| (w[0], w[1], None)).collect()
    }

    /// Join a cell's pieces into one loop by walking the box perimeter from
    /// each exit to the nearest following entry.
    fn close_pieces(&mut self, mut pieces: Vec<Piece>) -> Vec<(VertexId, VertexId, Option<usize>)> {
        if let Some(k) = pieces.iter().position(|p| p.closed) {
            if pieces.len() > 1 {
                log::warn!("closed cell loop alongside {} open pieces", pieces.len() - 1);
            }
            return std::mem::take(&mut pieces[k].edges);
        }

        let perimeter = self.bounds.perimeter();
        let first_entry = pieces[0].entry();
        let mut used = vec![false; pieces.len()];
        used[0] = true;
        let mut boundary = std::mem::take(&mut pieces[0].edges);
        let mut exit = boundary[boundary.len() - 1].1;

        loop {
            let exit_param = self.param(exit);
            let next = (0..pieces.len())
                .filter(|&i| !used[i])
                .min_by(|&a, &b| {
                    let ga = ccw_gap(exit_param, self.param(pieces[a].entry()), perimeter, self.eps);
                    let gb = ccw_gap(exit_param, self.param(pieces[b].entry()), perimeter, self.eps);
                    ga.total_cmp(&gb)
                });
            match next {
                Some(i) => {
                    used[i] = true;
                    let entry = pieces[i].entry();
                    boundary.extend(self.walk(exit, entry));
                    exit = pieces[i].exit();
                    boundary.append(&mut pieces[i].edges);
                }
                None => {
                    boundary.extend(self.walk(exit, first_entry));
                    break;
                }
            }
        }
        boundary
    }
}

//! The beachline: arcs ordered left to right, kept in a balanced tree.
//!
//! Arcs are stored in an arena and addressed by [`ArcId`]. The tree is an AVL
//! tree with parent pointers; the in-order sequence is mirrored in `prev` /
//! `next` links so neighbours are O(1). Node positions are never stored: the
//! search compares against breakpoints evaluated for the current sweep line,
//! so removal and rebalancing move nodes structurally and handles stay stable.

use glam::DVec2;

use crate::builder::DiagramBuilder;
use crate::constants::tolerance;
use crate::event_queue::{CircleEvent, CircleEventId, EventQueue};
use crate::geometry::{approx_eq, breakpoint_x, circle_event_point};
use crate::sweep::SweepStats;

/// Handle of an arc in the beachline arena.
pub type ArcId = usize;

#[derive(Debug, Clone)]
struct ArcNode {
    site: usize,
    parent: Option<ArcId>,
    left: Option<ArcId>,
    right: Option<ArcId>,
    height: i32,
    prev: Option<ArcId>,
    next: Option<ArcId>,
    /// Pending circle event in which this arc disappears.
    circle: Option<CircleEventId>,
    /// Half-edges of this arc's cell traced by the left / right breakpoint.
    left_half_edge: Option<usize>,
    right_half_edge: Option<usize>,
    alive: bool,
}

impl ArcNode {
    fn new(site: usize) -> Self {
        Self {
            site,
            parent: None,
            left: None,
            right: None,
            height: 1,
            prev: None,
            next: None,
            circle: None,
            left_half_edge: None,
            right_half_edge: None,
            alive: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct Beachline {
    nodes: Vec<ArcNode>,
    root: Option<ArcId>,
    len: usize,
}

impl Beachline {
    pub fn with_capacity(num_sites: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(num_sites * 2),
            root: None,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn site(&self, arc: ArcId) -> usize {
        self.nodes[arc].site
    }

    #[cfg(test)]
    pub fn prev(&self, arc: ArcId) -> Option<ArcId> {
        self.nodes[arc].prev
    }

    #[cfg(test)]
    pub fn next(&self, arc: ArcId) -> Option<ArcId> {
        self.nodes[arc].next
    }

    #[inline]
    pub fn is_alive(&self, arc: ArcId) -> bool {
        self.nodes.get(arc).is_some_and(|n| n.alive)
    }

    #[cfg(test)]
    pub fn circle_event(&self, arc: ArcId) -> Option<CircleEventId> {
        self.nodes[arc].circle
    }

    /// Leftmost arc.
    #[cfg(test)]
    pub fn first(&self) -> Option<ArcId> {
        self.root.map(|r| self.leftmost(r))
    }

    /// Arcs from left to right.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = ArcId> + '_ {
        std::iter::successors(self.first(), move |&a| self.nodes[a].next)
    }

    /// Sites of the arcs from left to right.
    #[cfg(test)]
    pub fn sites(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(move |a| self.nodes[a].site)
    }

    // ---------------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------------

    /// Find the arc directly above `x` for a sweep line at `sweep_y`.
    ///
    /// Each visited arc is bounded by the breakpoints with its neighbours,
    /// evaluated on demand. Returns `None` only for an empty beachline.
    pub fn locate_arc_above(&self, sites: &[DVec2], x: f64, sweep_y: f64) -> Option<ArcId> {
        let mut cursor = self.root?;
        loop {
            let node = &self.nodes[cursor];
            let here = sites[node.site];

            if let Some(prev) = node.prev {
                let bp = breakpoint_x(sites[self.nodes[prev].site], here, sweep_y);
                if x < bp {
                    match node.left {
                        Some(l) => {
                            cursor = l;
                            continue;
                        }
                        None => return Some(prev),
                    }
                }
            }
            if let Some(next) = node.next {
                let bp = breakpoint_x(here, sites[self.nodes[next].site], sweep_y);
                if x > bp {
                    match node.right {
                        Some(r) => {
                            cursor = r;
                            continue;
                        }
                        None => return Some(next),
                    }
                }
            }
            return Some(cursor);
        }
    }

    // ---------------------------------------------------------------------
    // Structural edits
    // ---------------------------------------------------------------------

    fn alloc(&mut self, site: usize) -> ArcId {
        let id = self.nodes.len();
        self.nodes.push(ArcNode::new(site));
        id
    }

    /// Start the beachline with a single arc. Must be empty.
    pub fn init(&mut self, site: usize) -> ArcId {
        debug_assert!(self.root.is_none());
        let id = self.alloc(site);
        self.root = Some(id);
        self.len = 1;
        id
    }

    /// Insert a new arc immediately to the right of `arc`.
    pub fn insert_after(&mut self, arc: ArcId, site: usize) -> ArcId {
        let id = self.alloc(site);
        match self.nodes[arc].right {
            None => {
                self.nodes[arc].right = Some(id);
                self.nodes[id].parent = Some(arc);
            }
            Some(r) => {
                let successor = self.leftmost(r);
                self.nodes[successor].left = Some(id);
                self.nodes[id].parent = Some(successor);
            }
        }

        let next = self.nodes[arc].next;
        self.nodes[id].prev = Some(arc);
        self.nodes[id].next = next;
        self.nodes[arc].next = Some(id);
        if let Some(n) = next {
            self.nodes[n].prev = Some(id);
        }

        self.len += 1;
        self.rebalance_from(self.nodes[id].parent);
        id
    }

    /// Unlink `arc` from the tree and the neighbour list.
    pub fn remove(&mut self, z: ArcId) {
        debug_assert!(self.nodes[z].alive);
        let ArcNode {
            parent,
            left,
            right,
            prev,
            next,
            ..
        } = self.nodes[z].clone();

        let rebalance_start = match (left, right) {
            (None, _) => {
                self.replace_child(parent, z, right);
                parent
            }
            (_, None) => {
                self.replace_child(parent, z, left);
                parent
            }
            (Some(l), Some(r)) => {
                let y = self.leftmost(r);
                let start = if y != r {
                    let y_parent = self.nodes[y].parent;
                    let y_right = self.nodes[y].right;
                    self.replace_child(y_parent, y, y_right);
                    self.nodes[y].right = Some(r);
                    self.nodes[r].parent = Some(y);
                    y_parent
                } else {
                    Some(y)
                };
                self.replace_child(parent, z, Some(y));
                self.nodes[y].left = Some(l);
                self.nodes[l].parent = Some(y);
                self.nodes[y].height = self.nodes[z].height;
                start
            }
        };

        if let Some(p) = prev {
            self.nodes[p].next = next;
        }
        if let Some(n) = next {
            self.nodes[n].prev = prev;
        }

        let node = &mut self.nodes[z];
        node.alive = false;
        node.parent = None;
        node.left = None;
        node.right = None;
        node.prev = None;
        node.next = None;
        self.len -= 1;

        self.rebalance_from(rebalance_start);
    }

    fn leftmost(&self, mut n: ArcId) -> ArcId {
        while let Some(l) = self.nodes[n].left {
            n = l;
        }
        n
    }

    #[inline]
    fn height(&self, n: Option<ArcId>) -> i32 {
        n.map_or(0, |i| self.nodes[i].height)
    }

    #[inline]
    fn update_height(&mut self, n: ArcId) {
        let h = 1 + self.height(self.nodes[n].left).max(self.height(self.nodes[n].right));
        self.nodes[n].height = h;
    }

    #[inline]
    fn balance(&self, n: ArcId) -> i32 {
        self.height(self.nodes[n].left) - self.height(self.nodes[n].right)
    }

    /// Point `parent`'s link that referenced `old` at `new` (or the root).
    fn replace_child(&mut self, parent: Option<ArcId>, old: ArcId, new: Option<ArcId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    fn rotate_left(&mut self, x: ArcId) -> ArcId {
        let Some(y) = self.nodes[x].right else {
            return x;
        };
        let parent = self.nodes[x].parent;
        let inner = self.nodes[y].left;

        self.nodes[x].right = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        self.replace_child(parent, x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: ArcId) -> ArcId {
        let Some(y) = self.nodes[x].left else {
            return x;
        };
        let parent = self.nodes[x].parent;
        let inner = self.nodes[y].right;

        self.nodes[x].left = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        self.replace_child(parent, x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restore heights and AVL balance on the path from `start` to the root.
    fn rebalance_from(&mut self, start: Option<ArcId>) {
        let mut cursor = start;
        while let Some(n) = cursor {
            self.update_height(n);
            let bal = self.balance(n);
            let top = if bal > 1 {
                if let Some(l) = self.nodes[n].left {
                    if self.balance(l) < 0 {
                        self.rotate_left(l);
                    }
                }
                self.rotate_right(n)
            } else if bal < -1 {
                if let Some(r) = self.nodes[n].right {
                    if self.balance(r) > 0 {
                        self.rotate_right(r);
                    }
                }
                self.rotate_left(n)
            } else {
                n
            };
            cursor = self.nodes[top].parent;
        }
    }

    // ---------------------------------------------------------------------
    // Sweep operations
    // ---------------------------------------------------------------------

    fn invalidate_circle(&mut self, arc: ArcId, queue: &mut EventQueue) {
        if let Some(id) = self.nodes[arc].circle.take() {
            queue.invalidate(id);
        }
    }

    /// Queue the circle event in which `arc` vanishes, if its neighbour
    /// triple converges at or below the sweep line.
    fn check_circle_event(
        &mut self,
        arc: ArcId,
        sites: &[DVec2],
        sweep_y: f64,
        queue: &mut EventQueue,
        stats: &mut SweepStats,
    ) {
        let node = &self.nodes[arc];
        let (Some(prev), Some(next)) = (node.prev, node.next) else {
            return;
        };
        let (left_site, right_site) = (self.nodes[prev].site, self.nodes[next].site);
        if left_site == right_site {
            return;
        }

        let (a, b, c) = (sites[left_site], sites[node.site], sites[right_site]);
        match circle_event_point(a, b, c) {
            Err(_) => {
                stats.degenerate_triples += 1;
                log::trace!(
                    "collinear triple ({}, {}, {}): no circle event",
                    left_site,
                    node.site,
                    right_site
                );
            }
            Ok(None) => {}
            Ok(Some((center, y))) => {
                if y <= sweep_y + tolerance(y, sweep_y) {
                    let id = queue.push_circle(CircleEvent {
                        arc,
                        left_site,
                        right_site,
                        center,
                        y,
                        valid: true,
                    });
                    self.nodes[arc].circle = Some(id);
                }
            }
        }
    }

    /// Handle a site event: split the arc above `site` and start its edge.
    pub fn insert_arc(
        &mut self,
        site: usize,
        sites: &[DVec2],
        queue: &mut EventQueue,
        builder: &mut DiagramBuilder,
        stats: &mut SweepStats,
    ) -> ArcId {
        let p = sites[site];
        let sweep_y = p.y;
        let Some(above) = self.locate_arc_above(sites, p.x, sweep_y) else {
            return self.init(site);
        };
        let above_site = self.nodes[above].site;

        // Sites sharing the first row: the arc above is a vertical ray, so
        // there is nothing to split. Append beside it; the bisector between
        // the two comes down from infinity. Row sites arrive left to right,
        // so the new arc is always the rightmost.
        if approx_eq(sites[above_site].y, sweep_y) {
            let arc = self.insert_after(above, site);
            let (h_left, h_right) = builder.add_edge(above_site, site);
            self.nodes[above].right_half_edge = Some(h_left);
            self.nodes[arc].left_half_edge = Some(h_right);
            return arc;
        }

        self.invalidate_circle(above, queue);

        let middle = self.insert_after(above, site);
        let right = self.insert_after(middle, above_site);
        self.nodes[right].right_half_edge = self.nodes[above].right_half_edge;

        // Both new breakpoints trace the same bisector in opposite directions.
        let (h_left, h_middle) = builder.add_edge(above_site, site);
        self.nodes[above].right_half_edge = Some(h_left);
        self.nodes[middle].left_half_edge = Some(h_middle);
        self.nodes[middle].right_half_edge = Some(h_middle);
        self.nodes[right].left_half_edge = Some(h_left);

        self.check_circle_event(above, sites, sweep_y, queue, stats);
        self.check_circle_event(right, sites, sweep_y, queue, stats);
        middle
    }

    /// Handle a circle event: collapse the vanishing arc into a vertex.
    ///
    /// Returns the new vertex, or `None` if the event no longer matches the
    /// beachline (counted as stale).
    pub fn remove_arc(
        &mut self,
        event_id: CircleEventId,
        sites: &[DVec2],
        queue: &mut EventQueue,
        builder: &mut DiagramBuilder,
        stats: &mut SweepStats,
    ) -> Option<usize> {
        let event = queue.circle(event_id).clone();
        let arc = event.arc;
        if !self.is_alive(arc) || self.nodes[arc].circle != Some(event_id) {
            stats.stale_events += 1;
            return None;
        }
        let node = &self.nodes[arc];
        let (Some(left), Some(right)) = (node.prev, node.next) else {
            stats.stale_events += 1;
            return None;
        };
        if self.nodes[left].site != event.left_site || self.nodes[right].site != event.right_site {
            stats.stale_events += 1;
            return None;
        }
        let (
            Some(left_outer),
            Some(arc_left),
            Some(arc_right),
            Some(right_outer),
        ) = (
            self.nodes[left].right_half_edge,
            node.left_half_edge,
            node.right_half_edge,
            self.nodes[right].left_half_edge,
        )
        else {
            log::warn!("circle event {} on arc {} without traced edges", event_id, arc);
            stats.stale_events += 1;
            return None;
        };

        let vanishing_site = node.site;
        let (left_site, right_site) = (event.left_site, event.right_site);
        let vertex = builder.add_vertex(event.center, [left_site, vanishing_site, right_site]);

        self.nodes[arc].circle = None;
        self.invalidate_circle(left, queue);
        self.invalidate_circle(right, queue);

        // Close the two edges that met at the vertex.
        builder.set_origin(left_outer, vertex);
        builder.set_destination(arc_left, vertex);
        builder.set_origin(arc_right, vertex);
        builder.set_destination(right_outer, vertex);
        builder.link(arc_left, arc_right);

        self.remove(arc);

        // The merged breakpoint starts a new edge at the vertex.
        let (h_left, h_right) = builder.add_edge(left_site, right_site);
        builder.set_destination(h_left, vertex);
        builder.set_origin(h_right, vertex);
        builder.link(h_left, left_outer);
        builder.link(right_outer, h_right);
        self.nodes[left].right_half_edge = Some(h_left);
        self.nodes[right].left_half_edge = Some(h_right);

        self.check_circle_event(left, sites, event.y, queue, stats);
        self.check_circle_event(right, sites, event.y, queue, stats);
        Some(vertex)
    }

    /// Verify tree/list agreement, parent links and AVL balance.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        fn walk(bl: &Beachline, n: Option<ArcId>, parent: Option<ArcId>, out: &mut Vec<ArcId>) -> i32 {
            let Some(i) = n else { return 0 };
            let node = &bl.nodes[i];
            assert!(node.alive, "dead arc {} in tree", i);
            assert_eq!(node.parent, parent, "bad parent link at {}", i);
            let hl = walk(bl, node.left, Some(i), out);
            out.push(i);
            let hr = walk(bl, node.right, Some(i), out);
            assert!((hl - hr).abs() <= 1, "unbalanced at {}", i);
            assert_eq!(node.height, 1 + hl.max(hr), "stale height at {}", i);
            node.height
        }
        let mut in_order = Vec::new();
        walk(self, self.root, None, &mut in_order);
        let listed: Vec<ArcId> = self.iter().collect();
        assert_eq!(in_order, listed);
        assert_eq!(listed.len(), self.len);
    }
}

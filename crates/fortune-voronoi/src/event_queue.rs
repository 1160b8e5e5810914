//! Priority queue of site and circle events with lazy cancellation.
//!
//! Circle events live in a slab; the heap only stores their index. Cancelling
//! an event flips its validity flag, and the stale heap entry is dropped when
//! it reaches the front.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use glam::DVec2;
use ordered_float::OrderedFloat;

use crate::beachline::ArcId;

/// Index of a circle event in the queue's slab.
pub type CircleEventId = usize;

/// Circle events sort before site events at an identical coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Circle,
    Site,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Site(usize),
    Circle(CircleEventId),
}

/// A pending "arc disappears" event.
#[derive(Clone, Debug)]
pub struct CircleEvent {
    /// The arc that vanishes.
    pub arc: ArcId,
    /// Sites of the arcs left and right of `arc` when the event was computed.
    pub left_site: usize,
    pub right_site: usize,
    /// Circumcenter: the Voronoi vertex created when the event fires.
    pub center: DVec2,
    /// Sweep coordinate of the event (lowest point of the circle).
    pub y: f64,
    pub valid: bool,
}

/// Min-heap over `(-y, x, kind, index)`, so larger y comes out first.
type QueueKey = Reverse<(OrderedFloat<f64>, OrderedFloat<f64>, EventKind, usize)>;

#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<QueueKey>,
    circles: Vec<CircleEvent>,
    /// Number of live circle events still in the heap.
    live_circles: usize,
    /// Invalid circle events dropped at pop time.
    stale_discarded: usize,
}

impl EventQueue {
    pub fn with_capacity(num_sites: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(num_sites * 2),
            circles: Vec::with_capacity(num_sites),
            live_circles: 0,
            stale_discarded: 0,
        }
    }

    /// Queue a site event. Sites at equal y are ordered by x, then by index.
    pub fn push_site(&mut self, site: usize, position: DVec2) {
        self.heap.push(Reverse((
            OrderedFloat(-position.y),
            OrderedFloat(position.x),
            EventKind::Site,
            site,
        )));
    }

    /// Queue a circle event and return its handle for later invalidation.
    pub fn push_circle(&mut self, event: CircleEvent) -> CircleEventId {
        let id = self.circles.len();
        self.heap.push(Reverse((
            OrderedFloat(-event.y),
            OrderedFloat(event.center.x),
            EventKind::Circle,
            id,
        )));
        self.live_circles += 1;
        self.circles.push(event);
        id
    }

    /// Mark a circle event as cancelled. Idempotent.
    #[inline]
    pub fn invalidate(&mut self, id: CircleEventId) {
        let event = &mut self.circles[id];
        if event.valid {
            event.valid = false;
            self.live_circles -= 1;
        }
    }

    /// Remove and return the earliest valid event.
    pub fn pop(&mut self) -> Option<Event> {
        while let Some(Reverse((_, _, kind, index))) = self.heap.pop() {
            match kind {
                EventKind::Site => return Some(Event::Site(index)),
                EventKind::Circle => {
                    if self.circles[index].valid {
                        // Fired events are no longer pending.
                        self.circles[index].valid = false;
                        self.live_circles -= 1;
                        return Some(Event::Circle(index));
                    }
                    self.stale_discarded += 1;
                    log::trace!("discarding stale circle event {}", index);
                }
            }
        }
        None
    }

    #[inline]
    pub fn circle(&self, id: CircleEventId) -> &CircleEvent {
        &self.circles[id]
    }

    #[cfg(test)]
    pub fn is_valid(&self, id: CircleEventId) -> bool {
        self.circles[id].valid
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn live_circle_events(&self) -> usize {
        self.live_circles
    }

    #[inline]
    pub fn stale_discarded(&self) -> usize {
        self.stale_discarded
    }

    /// Total circle events ever queued.
    #[inline]
    pub fn circles_created(&self) -> usize {
        self.circles.len()
    }
}

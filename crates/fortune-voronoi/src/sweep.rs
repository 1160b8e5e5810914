//! The sweep controller: seeds the event queue and dispatches events until
//! it drains.

use glam::DVec2;

use crate::beachline::Beachline;
use crate::builder::{DiagramBuilder, FinalizeStats};
use crate::diagram::VoronoiDiagram;
use crate::event_queue::{Event, EventQueue};
use crate::preprocess::MergeResult;
use crate::types::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Running,
    Done,
}

/// Counters collected while sweeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub site_events: usize,
    pub circle_events: usize,
    /// Circle events dropped because the beachline moved on.
    pub stale_events: usize,
    /// Neighbour triples rejected as collinear.
    pub degenerate_triples: usize,
    pub max_beachline_len: usize,
    /// Circle events ever queued, fired or not.
    pub circles_scheduled: usize,
    /// Most circle events pending at once.
    pub max_pending_circles: usize,
}

pub struct Sweep<'a> {
    sites: &'a [DVec2],
    merge: &'a MergeResult,
    queue: EventQueue,
    beachline: Beachline,
    builder: DiagramBuilder,
    state: SweepState,
    sweep_y: f64,
    stats: SweepStats,
}

impl<'a> Sweep<'a> {
    pub fn new(sites: &'a [DVec2], merge: &'a MergeResult) -> Self {
        Self {
            sites,
            merge,
            queue: EventQueue::with_capacity(sites.len()),
            beachline: Beachline::with_capacity(sites.len()),
            builder: DiagramBuilder::new(sites.len()),
            state: SweepState::Idle,
            sweep_y: f64::INFINITY,
            stats: SweepStats::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Current sweep line position (`+inf` before the first event).
    #[cfg(test)]
    pub fn sweep_y(&self) -> f64 {
        self.sweep_y
    }

    #[cfg(test)]
    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }

    fn start(&mut self) {
        for site in self.merge.representatives() {
            self.queue.push_site(site, self.sites[site]);
        }
        self.state = SweepState::Running;
    }

    /// Process one event. Returns false once the queue is exhausted.
    pub fn step(&mut self) -> bool {
        match self.state {
            SweepState::Idle => self.start(),
            SweepState::Running => {}
            SweepState::Done => return false,
        }

        let Some(event) = self.queue.pop() else {
            self.state = SweepState::Done;
            self.stats.stale_events += self.queue.stale_discarded();
            self.stats.circles_scheduled = self.queue.circles_created();
            return false;
        };

        match event {
            Event::Site(site) => {
                self.sweep_y = self.sites[site].y;
                self.stats.site_events += 1;
                log::trace!("site event {} at y = {}", site, self.sweep_y);
                self.beachline.insert_arc(
                    site,
                    self.sites,
                    &mut self.queue,
                    &mut self.builder,
                    &mut self.stats,
                );
            }
            Event::Circle(id) => {
                self.sweep_y = self.queue.circle(id).y;
                log::trace!("circle event {} at y = {}", id, self.sweep_y);
                if self
                    .beachline
                    .remove_arc(id, self.sites, &mut self.queue, &mut self.builder, &mut self.stats)
                    .is_some()
                {
                    self.stats.circle_events += 1;
                }
            }
        }
        self.stats.max_beachline_len = self.stats.max_beachline_len.max(self.beachline.len());
        self.stats.max_pending_circles = self.stats.max_pending_circles.max(self.queue.live_circle_events());
        true
    }

    /// Drive the sweep until every event has been handled.
    pub fn run(&mut self) {
        while self.step() {}
        log::debug!(
            "sweep done: {} site events, {} circle events, {} stale, {} degenerate, beachline peak {}",
            self.stats.site_events,
            self.stats.circle_events,
            self.stats.stale_events,
            self.stats.degenerate_triples,
            self.stats.max_beachline_len
        );
    }

    /// Run to completion if needed, then bound the diagram.
    pub fn finish(mut self, bounds: BoundingBox) -> (VoronoiDiagram, SweepStats, FinalizeStats) {
        if self.state != SweepState::Done {
            self.run();
        }
        let coincident = self.merge.coincident_with();
        let (diagram, finalize_stats) = self.builder.finalize(self.sites, &coincident, bounds);
        (diagram, self.stats, finalize_stats)
    }
}

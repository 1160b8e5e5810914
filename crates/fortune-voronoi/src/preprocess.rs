//! Input preprocessing: coincident-site merging, plus the union-find used to
//! merge coincident vertices after the sweep.

use glam::DVec2;
use rustc_hash::FxHashMap;

/// Minimal union-find with path halving. The lower index always becomes the
/// root, so results do not depend on union order.
#[derive(Debug, Clone)]
pub struct SimpleDsu {
    parent: Vec<usize>,
}

impl SimpleDsu {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Join the sets of `a` and `b`; returns false if already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi] = lo;
        true
    }
}

/// Mapping from input sites to the distinct sites fed to the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// `representative[i] == i` for kept sites, otherwise the earlier site
    /// (in sweep order) that `i` coincides with.
    pub representative: Vec<usize>,
    pub num_merged: usize,
}

impl MergeResult {
    /// Identity mapping: every site is kept.
    pub fn identity(n: usize) -> Self {
        Self {
            representative: (0..n).collect(),
            num_merged: 0,
        }
    }

    /// Kept site indices in input order.
    pub fn representatives(&self) -> impl Iterator<Item = usize> + '_ {
        self.representative
            .iter()
            .enumerate()
            .filter(|(i, r)| i == *r)
            .map(|(i, _)| i)
    }

    pub fn num_distinct(&self) -> usize {
        self.representative.len() - self.num_merged
    }

    /// `Some(representative)` for merged sites, `None` for kept ones.
    pub fn coincident_with(&self) -> Vec<Option<usize>> {
        self.representative
            .iter()
            .enumerate()
            .map(|(i, &r)| (r != i).then_some(r))
            .collect()
    }
}

/// Indices ordered as the sweep meets them: descending y, then ascending x,
/// then index.
pub fn sweep_order(sites: &[DVec2]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sites.len()).collect();
    order.sort_by(|&a, &b| {
        sites[b]
            .y
            .total_cmp(&sites[a].y)
            .then(sites[a].x.total_cmp(&sites[b].x))
            .then(a.cmp(&b))
    });
    order
}

/// Map every site within `merge_distance` of an earlier site onto it.
///
/// Exact duplicates are always merged, whatever the distance.
pub fn merge_coincident_sites(sites: &[DVec2], merge_distance: f64) -> MergeResult {
    let mut result = MergeResult::identity(sites.len());
    let order = sweep_order(sites);

    if merge_distance <= 0.0 {
        // -0.0 and 0.0 must hash together.
        let key = |p: DVec2| ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits());
        let mut seen: FxHashMap<(u64, u64), usize> = FxHashMap::default();
        for i in order {
            match seen.get(&key(sites[i])) {
                Some(&r) => {
                    result.representative[i] = r;
                    result.num_merged += 1;
                }
                None => {
                    seen.insert(key(sites[i]), i);
                }
            }
        }
        return result;
    }

    // Uniform grid with cell size `merge_distance`; neighbours are in the 3x3
    // block around a site's cell.
    let cell_of = |p: DVec2| {
        (
            (p.x / merge_distance).floor() as i64,
            (p.y / merge_distance).floor() as i64,
        )
    };
    let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    for i in order {
        let p = sites[i];
        let (cx, cy) = cell_of(p);
        let mut hit = None;
        'search: for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                let Some(bucket) = grid.get(&(cx.saturating_add(dx), cy.saturating_add(dy))) else {
                    continue;
                };
                if let Some(&r) = bucket.iter().find(|&&r| sites[r].distance(p) <= merge_distance) {
                    hit = Some(r);
                    break 'search;
                }
            }
        }
        match hit {
            Some(r) => {
                result.representative[i] = r;
                result.num_merged += 1;
            }
            None => grid.entry((cx, cy)).or_default().push(i),
        }
    }

    if result.num_merged > 0 {
        log::debug!(
            "merged {} coincident site(s) into {} distinct",
            result.num_merged,
            result.num_distinct()
        );
    }
    result
}

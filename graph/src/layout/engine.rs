use crate::core::{
    Commit, CommitId, GraphPoint, LayoutSnapshot, LayoutStats, LinkCurve, NodeKind, NodeMarker,
    PathSegment,
};
use crate::layout::lanes::{LaneArena, LaneIdx, SegmentBuilder};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

/// Number of lane colors when nothing else is configured
pub const DEFAULT_PALETTE_SIZE: usize = 10;

/// Knobs for one layout pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Colors available to lanes
    pub palette_size: usize,
    /// Only follow first parents; merge parents get no link and no lane
    pub first_parent_only: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            palette_size: DEFAULT_PALETTE_SIZE,
            first_parent_only: false,
        }
    }
}

/// Lay out commits with default options
pub fn layout(commits: &[Commit]) -> LayoutSnapshot {
    layout_with(commits, &LayoutOptions::default())
}

/// Lay out commits supplied descendant-first.
///
/// Single forward pass, O(n * k) for n commits and k concurrently open lanes.
/// Malformed input (missing parents, duplicates, out of order parents) never
/// fails, it degrades to terminated lanes and skipped rows.
pub fn layout_with(commits: &[Commit], options: &LayoutOptions) -> LayoutSnapshot {
    let mut pass = LayoutPass::new(options);
    for commit in commits {
        pass.step(commit);
    }
    pass.finish()
}

/// Where an already processed commit ended up
#[derive(Debug, Clone, Copy)]
struct Placed {
    point: GraphPoint,
    color: usize,
    on_current_branch: bool,
}

/// Link waiting for its parent row
#[derive(Debug, Clone, Copy)]
struct PendingLink {
    start: GraphPoint,
    from_current_branch: bool,
}

/// Mutable state of one layout pass; never escapes `layout_with`
struct LayoutPass<'o> {
    options: &'o LayoutOptions,
    lanes: LaneArena,
    placed: HashMap<CommitId, Placed>,
    /// Commits known to be on the first-parent chain of the current head
    current_chain: HashSet<CommitId>,
    pending: HashMap<CommitId, SmallVec<[PendingLink; 1]>>,
    markers: Vec<NodeMarker>,
    paths: Vec<PathSegment>,
    links: Vec<LinkCurve>,
    commit_ids: Vec<CommitId>,
    stats: LayoutStats,
}

impl<'o> LayoutPass<'o> {
    fn new(options: &'o LayoutOptions) -> Self {
        Self {
            options,
            lanes: LaneArena::new(options.palette_size),
            placed: HashMap::new(),
            current_chain: HashSet::new(),
            pending: HashMap::new(),
            markers: Vec::new(),
            paths: Vec::new(),
            links: Vec::new(),
            commit_ids: Vec::new(),
            stats: LayoutStats::default(),
        }
    }

    fn step(&mut self, commit: &Commit) {
        if self.placed.contains_key(&commit.id) {
            trace!(id = %commit.id, "skipping duplicate commit");
            self.stats.duplicates_skipped += 1;
            return;
        }

        let row = self.markers.len();
        let on_current = commit.is_current_head
            || commit.is_head_reachable
            || self.current_chain.remove(&commit.id);
        let parents = distinct_parents(commit);

        // The lowest lane waiting for this commit claims it, the others merge in
        let expecting = self.lanes.expecting(&commit.id);
        let column = match expecting.first() {
            Some(&column) => column,
            None => self.lanes.open_lane(commit.id.clone()),
        };
        let point = GraphPoint::new(column, row);
        for &other in expecting.iter().skip(1) {
            self.close_into(other, &commit.id, point, on_current);
        }

        let color = self.lanes.get(column).map_or(0, |lane| lane.color);
        if let Some(lane) = self.lanes.get_mut(column) {
            let piece_on = lane.last_on_current && on_current;
            match lane.segment.as_mut() {
                Some(segment) => {
                    if let Some(done) = segment.extend(point, piece_on) {
                        self.paths.push(done);
                    }
                }
                None => lane.segment = Some(SegmentBuilder::start(point, color, on_current)),
            }
            lane.last_on_current = on_current;
        }

        let kind = if commit.is_current_head {
            NodeKind::Head
        } else if parents.len() > 1 {
            NodeKind::Merge
        } else {
            NodeKind::Normal
        };
        self.markers.push(NodeMarker {
            lane: column,
            row,
            color,
            kind,
            on_current_branch: on_current,
        });
        self.commit_ids.push(commit.id.clone());
        self.placed.insert(
            commit.id.clone(),
            Placed {
                point,
                color,
                on_current_branch: on_current,
            },
        );

        if let Some(waiting) = self.pending.remove(&commit.id) {
            for link in waiting {
                self.links.push(LinkCurve {
                    start: link.start,
                    end: point,
                    control: GraphPoint::new(point.lane, link.start.row),
                    color,
                    on_current_branch: link.from_current_branch && on_current,
                });
            }
        }

        if parents.len() > 1 {
            self.stats.merges += 1;
        }

        match parents.first() {
            Some(&first) if !self.placed.contains_key(first) => {
                if on_current {
                    self.current_chain.insert(first.to_string());
                }
                if let Some(lane) = self.lanes.get_mut(column) {
                    lane.expected = first.to_string();
                }
            }
            Some(&first) => {
                // Parent listed before its child; link back and stop the lane
                self.link_to_placed(point, first, on_current);
                self.close_lane(column);
            }
            None => {
                self.stats.roots += 1;
                self.close_lane(column);
            }
        }

        if self.options.first_parent_only {
            return;
        }

        for &parent in parents.iter().skip(1) {
            if self.placed.contains_key(parent) {
                self.link_to_placed(point, parent, on_current);
                continue;
            }
            if !self.lanes.is_expected(parent) {
                let reserved = self.lanes.open_lane(parent.to_string());
                trace!(parent, column = reserved, "reserved lane for merge parent");
            }
            self.pending
                .entry(parent.to_string())
                .or_default()
                .push(PendingLink {
                    start: point,
                    from_current_branch: on_current,
                });
        }
    }

    /// Close a lane that lost the claim on `target`, bending into it
    fn close_into(&mut self, column: LaneIdx, id: &str, target: GraphPoint, target_on: bool) {
        let Some(lane) = self.lanes.close(column) else {
            return;
        };
        let (mut segment, piece_on) = match lane.segment {
            Some(segment) => (segment, lane.last_on_current && target_on),
            None => match self.reroute_pending(column, lane.color, id, target, target_on) {
                Some(rerouted) => rerouted,
                None => return,
            },
        };

        if let Some(last) = segment.last_point() {
            if last.row + 1 < target.row {
                let bend = GraphPoint::new(column, target.row - 1);
                if let Some(done) = segment.extend(bend, piece_on) {
                    self.paths.push(done);
                }
            }
        }

        let start = segment.last_point().unwrap_or(GraphPoint::new(column, target.row));
        if let Some(done) = segment.finish() {
            self.paths.push(done);
        }
        self.links.push(LinkCurve {
            start,
            end: target,
            control: GraphPoint::new(start.lane, target.row),
            color: lane.color,
            on_current_branch: piece_on,
        });
    }

    /// A reserved lane lost the claim on `id`. Merge links waiting on it enter
    /// the reserved column one row below their merge and run down it, so they
    /// never retrace the claiming lane. Links from the row just above `target`
    /// stay pending and resolve directly.
    fn reroute_pending(
        &mut self,
        column: LaneIdx,
        color: usize,
        id: &str,
        target: GraphPoint,
        target_on: bool,
    ) -> Option<(SegmentBuilder, bool)> {
        let waiting = self.pending.remove(id)?;
        let (through, direct): (SmallVec<[PendingLink; 1]>, SmallVec<[PendingLink; 1]>) = waiting
            .into_iter()
            .partition(|link| link.start.row + 1 < target.row);
        if !direct.is_empty() {
            self.pending.insert(id.to_string(), direct);
        }

        let entry_row = through.iter().map(|link| link.start.row + 1).min()?;
        let on = target_on && through.iter().any(|link| link.from_current_branch);
        for link in &through {
            self.links.push(LinkCurve {
                start: link.start,
                end: GraphPoint::new(column, link.start.row + 1),
                control: GraphPoint::new(column, link.start.row),
                color,
                on_current_branch: link.from_current_branch && target_on,
            });
        }
        trace!(id, column, links = through.len(), "rerouted merge links through reserved lane");

        Some((SegmentBuilder::start(GraphPoint::new(column, entry_row), color, on), on))
    }

    fn close_lane(&mut self, column: LaneIdx) {
        if let Some(done) = self
            .lanes
            .close(column)
            .and_then(|lane| lane.segment)
            .and_then(SegmentBuilder::finish)
        {
            self.paths.push(done);
        }
    }

    fn link_to_placed(&mut self, start: GraphPoint, parent: &str, on_current: bool) {
        if let Some(placed) = self.placed.get(parent).copied() {
            self.links.push(LinkCurve {
                start,
                end: placed.point,
                control: GraphPoint::new(placed.point.lane, start.row),
                color: placed.color,
                on_current_branch: on_current && placed.on_current_branch,
            });
        }
    }

    fn finish(mut self) -> LayoutSnapshot {
        let last_row = self.markers.len().saturating_sub(1);
        let open = self.lanes.drain();

        let unresolved: BTreeSet<&str> = open
            .iter()
            .map(|(_, lane)| lane.expected.as_str())
            .collect();
        self.stats.unresolved_parents = unresolved.len();

        // Links to parents outside the input run down to the last row
        let mut waiting: Vec<_> = self.pending.drain().collect();
        waiting.sort_by(|a, b| a.0.cmp(&b.0));
        for (parent, links) in waiting {
            let Some((column, lane)) = open.iter().find(|(_, lane)| lane.expected == parent) else {
                continue;
            };
            for link in links {
                self.links.push(LinkCurve {
                    start: link.start,
                    end: GraphPoint::new(*column, last_row),
                    control: GraphPoint::new(*column, link.start.row),
                    color: lane.color,
                    on_current_branch: false,
                });
            }
        }

        for (_, lane) in open {
            if let Some(done) = lane.segment.and_then(SegmentBuilder::finish) {
                self.paths.push(done);
            }
        }

        self.paths.sort_by_key(|path| {
            let (first, last) = path.row_span();
            (first, path.lane(), last)
        });
        self.links.sort_by_key(|link| {
            let (top, bottom) = link.row_span();
            (top, link.start.lane, link.end.lane, bottom)
        });

        self.stats.commits = self.markers.len();
        self.stats.max_lanes = self.lanes.width();
        self.stats.paths = self.paths.len();
        self.stats.links = self.links.len();
        debug!(
            commits = self.stats.commits,
            lanes = self.stats.max_lanes,
            paths = self.stats.paths,
            links = self.stats.links,
            duplicates = self.stats.duplicates_skipped,
            unresolved = self.stats.unresolved_parents,
            "layout pass finished"
        );

        LayoutSnapshot::new(
            self.markers,
            self.paths,
            self.links,
            self.commit_ids,
            self.stats.max_lanes,
            self.options.palette_size.max(1),
            self.stats,
        )
    }
}

/// Parents in order, without repeats or self references
fn distinct_parents(commit: &Commit) -> SmallVec<[&str; 2]> {
    let mut parents: SmallVec<[&str; 2]> = SmallVec::new();
    for parent in &commit.parents {
        if parent != &commit.id && !parents.contains(&parent.as_str()) {
            parents.push(parent);
        }
    }
    parents
}

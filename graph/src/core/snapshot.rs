use super::commit::CommitId;
use super::geometry::{LinkCurve, NodeMarker, PathSegment};
use super::index::RowIndex;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Statistics gathered during one layout pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    pub commits: usize,
    pub merges: usize,
    pub roots: usize,
    pub duplicates_skipped: usize,
    /// Parent references that never showed up in the input
    pub unresolved_parents: usize,
    pub max_lanes: usize,
    pub paths: usize,
    pub links: usize,
}

/// Immutable result of one layout pass.
///
/// Built once by the layout engine and never mutated afterwards; a new commit
/// list produces a new snapshot.
#[derive(Debug, Serialize)]
pub struct LayoutSnapshot {
    markers: Vec<NodeMarker>,
    paths: Vec<PathSegment>,
    links: Vec<LinkCurve>,
    commit_ids: Vec<CommitId>,
    lane_count: usize,
    palette_size: usize,
    stats: LayoutStats,
    #[serde(skip)]
    path_index: RowIndex,
    #[serde(skip)]
    link_index: RowIndex,
}

impl LayoutSnapshot {
    pub(crate) fn new(
        markers: Vec<NodeMarker>,
        paths: Vec<PathSegment>,
        links: Vec<LinkCurve>,
        commit_ids: Vec<CommitId>,
        lane_count: usize,
        palette_size: usize,
        stats: LayoutStats,
    ) -> Self {
        let path_index = RowIndex::build(paths.iter().map(PathSegment::row_span));
        let link_index = RowIndex::build(links.iter().map(LinkCurve::row_span));

        Self {
            markers,
            paths,
            links,
            commit_ids,
            lane_count,
            palette_size,
            stats,
            path_index,
            link_index,
        }
    }

    /// One marker per distinct commit, marker `i` sits on row `i`
    pub fn markers(&self) -> &[NodeMarker] {
        &self.markers
    }

    pub fn paths(&self) -> &[PathSegment] {
        &self.paths
    }

    pub fn links(&self) -> &[LinkCurve] {
        &self.links
    }

    /// Commit ID shown on each row
    pub fn commit_ids(&self) -> &[CommitId] {
        &self.commit_ids
    }

    pub fn row_count(&self) -> usize {
        self.markers.len()
    }

    /// Number of columns the graph needs
    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Size of the palette colors were drawn from
    pub fn palette_size(&self) -> usize {
        self.palette_size
    }

    pub fn stats(&self) -> &LayoutStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn marker_at(&self, row: usize) -> Option<&NodeMarker> {
        self.markers.get(row)
    }

    /// Indices of paths intersecting the given rows
    pub fn paths_in_rows(&self, rows: RangeInclusive<usize>, f: impl FnMut(usize)) {
        self.path_index.visit(rows, |i| self.paths[i].row_span(), f);
    }

    /// Indices of links intersecting the given rows
    pub fn links_in_rows(&self, rows: RangeInclusive<usize>, f: impl FnMut(usize)) {
        self.link_index.visit(rows, |i| self.links[i].row_span(), f);
    }
}

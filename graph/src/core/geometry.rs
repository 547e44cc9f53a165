use serde::Serialize;

/// A lane/row coordinate in the layout grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GraphPoint {
    pub lane: usize,
    pub row: usize,
}

impl GraphPoint {
    pub fn new(lane: usize, row: usize) -> Self {
        Self { lane, row }
    }
}

/// Kind of node marker drawn for a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Normal,
    Merge,
    Head,
}

/// The visual point representing one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeMarker {
    pub lane: usize,
    pub row: usize,
    pub color: usize,
    pub kind: NodeKind,
    pub on_current_branch: bool,
}

impl NodeMarker {
    pub fn point(&self) -> GraphPoint {
        GraphPoint::new(self.lane, self.row)
    }
}

/// Polyline of one continuously occupied lane.
///
/// Points are ordered by row; consecutive points share a lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub points: Vec<GraphPoint>,
    pub color: usize,
    pub on_current_branch: bool,
}

impl PathSegment {
    /// Row span covered by the segment (first row, last row)
    pub fn row_span(&self) -> (usize, usize) {
        let first = self.points.first().map_or(0, |p| p.row);
        let last = self.points.last().map_or(first, |p| p.row);
        (first, last)
    }

    pub fn lane(&self) -> usize {
        self.points.first().map_or(0, |p| p.lane)
    }
}

/// Quadratic curve between two commits in different lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkCurve {
    pub start: GraphPoint,
    pub end: GraphPoint,
    pub control: GraphPoint,
    pub color: usize,
    pub on_current_branch: bool,
}

impl LinkCurve {
    /// Row span covered by the curve, whichever direction it runs
    pub fn row_span(&self) -> (usize, usize) {
        let top = self.start.row.min(self.end.row).min(self.control.row);
        let bottom = self.start.row.max(self.end.row).max(self.control.row);
        (top, bottom)
    }
}

use crate::core::{CommitId, GraphPoint, PathSegment};
use smallvec::SmallVec;

/// A lane represents a vertical column in the graph
pub type LaneIdx = usize;

/// Path segment under construction for an open lane
#[derive(Debug, Clone)]
pub(crate) struct SegmentBuilder {
    points: Vec<GraphPoint>,
    color: usize,
    on_current_branch: bool,
}

impl SegmentBuilder {
    pub fn start(point: GraphPoint, color: usize, on_current_branch: bool) -> Self {
        Self {
            points: vec![point],
            color,
            on_current_branch,
        }
    }

    pub fn last_point(&self) -> Option<GraphPoint> {
        self.points.last().copied()
    }

    /// Extend to `point`. The piece between the previous point and `point` is
    /// flagged `piece_on`; when that flips the segment flag, the finished
    /// segment is returned and a new one continues from the previous point.
    pub fn extend(&mut self, point: GraphPoint, piece_on: bool) -> Option<PathSegment> {
        if self.points.len() == 1 {
            self.on_current_branch = piece_on;
        }

        if piece_on == self.on_current_branch {
            self.points.push(point);
            return None;
        }

        let previous = self.last_point().unwrap_or(point);
        let continued = SegmentBuilder {
            points: vec![previous, point],
            color: self.color,
            on_current_branch: piece_on,
        };
        std::mem::replace(self, continued).finish()
    }

    /// Finished segment, or nothing for a lone point
    pub fn finish(self) -> Option<PathSegment> {
        if self.points.len() < 2 {
            return None;
        }
        Some(PathSegment {
            points: self.points,
            color: self.color,
            on_current_branch: self.on_current_branch,
        })
    }
}

/// One open line of ancestry
#[derive(Debug, Clone)]
pub(crate) struct Lane {
    /// Commit this lane is waiting for
    pub expected: CommitId,
    pub color: usize,
    /// `None` while the lane is only reserved for a merge parent
    pub segment: Option<SegmentBuilder>,
    /// On-current-branch flag of the last commit the lane claimed
    pub last_on_current: bool,
}

/// Fixed column slots, each either free or holding an open lane
#[derive(Debug)]
pub(crate) struct LaneArena {
    slots: Vec<Option<Lane>>,
    palette_size: usize,
    next_color: usize,
    high_water: usize,
}

impl LaneArena {
    pub fn new(palette_size: usize) -> Self {
        Self {
            slots: Vec::new(),
            palette_size: palette_size.max(1),
            next_color: 0,
            high_water: 0,
        }
    }

    /// Widest the arena has been during the pass
    pub fn width(&self) -> usize {
        self.high_water
    }

    /// Lowest column without an open lane
    pub fn lowest_free_column(&self) -> LaneIdx {
        self.slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.slots.len())
    }

    /// Next palette color, skipping colors held by open lanes. Once every
    /// color is taken the cycle position is used as is.
    pub fn pick_color(&mut self) -> usize {
        let in_use: SmallVec<[usize; 16]> = self.open().map(|(_, lane)| lane.color).collect();

        let color = (0..self.palette_size)
            .map(|step| (self.next_color + step) % self.palette_size)
            .find(|color| !in_use.contains(color))
            .unwrap_or(self.next_color);

        self.next_color = (color + 1) % self.palette_size;
        color
    }

    /// Open a lane in the lowest free column with a fresh color
    pub fn open_lane(&mut self, expected: CommitId) -> LaneIdx {
        let color = self.pick_color();
        let column = self.lowest_free_column();
        if column == self.slots.len() {
            self.slots.push(None);
        }
        self.slots[column] = Some(Lane {
            expected,
            color,
            segment: None,
            last_on_current: false,
        });
        self.high_water = self.high_water.max(column + 1);
        column
    }

    /// Columns of open lanes expecting `id`, lowest first
    pub fn expecting(&self, id: &str) -> SmallVec<[LaneIdx; 4]> {
        self.open()
            .filter(|(_, lane)| lane.expected == id)
            .map(|(column, _)| column)
            .collect()
    }

    pub fn is_expected(&self, id: &str) -> bool {
        self.open().any(|(_, lane)| lane.expected == id)
    }

    pub fn get(&self, column: LaneIdx) -> Option<&Lane> {
        self.slots.get(column).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, column: LaneIdx) -> Option<&mut Lane> {
        self.slots.get_mut(column).and_then(Option::as_mut)
    }

    /// Free a column, handing back the lane that held it
    pub fn close(&mut self, column: LaneIdx) -> Option<Lane> {
        let lane = self.slots.get_mut(column).and_then(Option::take);
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        lane
    }

    /// Open lanes with their columns, left to right
    pub fn open(&self) -> impl Iterator<Item = (LaneIdx, &Lane)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(column, slot)| slot.as_ref().map(|lane| (column, lane)))
    }

    /// Free every remaining column, left to right
    pub fn drain(&mut self) -> Vec<(LaneIdx, Lane)> {
        let lanes = self
            .slots
            .iter_mut()
            .enumerate()
            .filter_map(|(column, slot)| slot.take().map(|lane| (column, lane)))
            .collect();
        self.slots.clear();
        lanes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lowest_free_column_reused() {
        let mut arena = LaneArena::new(10);
        assert_eq!(arena.open_lane("a".into()), 0);
        assert_eq!(arena.open_lane("b".into()), 1);
        assert_eq!(arena.open_lane("c".into()), 2);

        arena.close(1);
        assert_eq!(arena.lowest_free_column(), 1);
        assert_eq!(arena.open_lane("d".into()), 1);
        assert_eq!(arena.width(), 3);
    }

    #[test]
    fn test_color_skips_open_lanes() {
        let mut arena = LaneArena::new(3);
        let a = arena.open_lane("a".into());
        let b = arena.open_lane("b".into());
        assert_eq!(arena.get(a).map(|l| l.color), Some(0));
        assert_eq!(arena.get(b).map(|l| l.color), Some(1));

        // Cycle wraps to 0 once 2 is handed out, but 0 stays taken by `a`
        arena.close(b);
        let c = arena.open_lane("c".into());
        assert_eq!(arena.get(c).map(|l| l.color), Some(2));
        let d = arena.open_lane("d".into());
        assert_eq!(arena.get(d).map(|l| l.color), Some(1));
    }

    #[test]
    fn test_color_collision_when_palette_exhausted() {
        let mut arena = LaneArena::new(2);
        arena.open_lane("a".into());
        arena.open_lane("b".into());
        let c = arena.open_lane("c".into());
        assert_eq!(arena.get(c).map(|l| l.color), Some(0));
    }

    #[test]
    fn test_expecting_in_column_order() {
        let mut arena = LaneArena::new(10);
        arena.open_lane("x".into());
        arena.open_lane("y".into());
        arena.open_lane("x".into());

        assert_eq!(arena.expecting("x").as_slice(), &[0, 2]);
        assert!(arena.is_expected("y"));
        assert!(!arena.is_expected("z"));
    }

    #[test]
    fn test_segment_splits_on_flag_change() {
        let mut segment = SegmentBuilder::start(GraphPoint::new(0, 0), 3, false);
        assert_eq!(segment.extend(GraphPoint::new(0, 1), false), None);

        let finished = segment.extend(GraphPoint::new(0, 2), true).unwrap();
        assert_eq!(finished.points, vec![GraphPoint::new(0, 0), GraphPoint::new(0, 1)]);
        assert!(!finished.on_current_branch);

        let rest = segment.finish().unwrap();
        assert_eq!(rest.points, vec![GraphPoint::new(0, 1), GraphPoint::new(0, 2)]);
        assert!(rest.on_current_branch);
        assert_eq!(rest.color, 3);
    }

    #[test]
    fn test_lone_point_is_not_a_segment() {
        let segment = SegmentBuilder::start(GraphPoint::new(1, 4), 0, false);
        assert_eq!(segment.finish(), None);
    }
}

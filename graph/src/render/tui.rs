use crate::core::NodeKind;
use crate::render::pen::{Palette, Pen};
use crate::render::projector::{DrawCall, GraphGeometry, PixelPoint, Projection};

/// Box drawing characters for graph rendering
pub mod chars {
    pub const VERTICAL: char = '│';
    pub const HORIZONTAL: char = '─';
    pub const CROSS: char = '┼';
    pub const COMMIT: char = '●';
    pub const MERGE: char = '⊕';
    pub const HEAD: char = '◉';

    pub const DOWN_RIGHT: char = '╭';
    pub const DOWN_LEFT: char = '╮';
    pub const UP_RIGHT: char = '╰';
    pub const UP_LEFT: char = '╯';

    pub const SPACE: char = ' ';
}

/// Terminal columns per lane: the lane itself plus a spacer
pub const CELLS_PER_LANE: usize = 2;

/// Geometry that makes a projection line up with terminal cells when the
/// viewport uses a row height of 1
pub fn cell_geometry() -> GraphGeometry {
    GraphGeometry {
        lane_width: CELLS_PER_LANE as f64,
        left_padding: 0.0,
    }
}

/// A cell in the rendered grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub pen: Option<Pen>,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            ch: chars::SPACE,
            pen: None,
        }
    }
}

/// Rasterizes projections into terminal cells
pub struct TerminalRenderer {
    palette: Palette,
    color: bool,
}

impl TerminalRenderer {
    pub fn new(palette: Palette, color: bool) -> Self {
        Self { palette, color }
    }

    /// Grid of `rows` lines, `lanes * CELLS_PER_LANE` cells wide.
    ///
    /// The projection must come from a projector using [`cell_geometry`]
    /// and a viewport with a row height of 1.
    pub fn rasterize(&self, projection: &Projection, lanes: usize, rows: usize) -> Vec<Vec<Cell>> {
        let geometry = cell_geometry();
        let mut grid = Grid {
            cells: vec![vec![Cell::empty(); geometry.width(lanes) as usize]; rows],
        };
        let to_cell = |p: PixelPoint| {
            let lane = ((p.x - geometry.left_padding) / geometry.lane_width)
                .floor()
                .max(0.0) as usize;
            (lane, p.y.floor() as i64)
        };

        for call in &projection.calls {
            match *call {
                DrawCall::Line { from, to, pen, .. } => {
                    let (from, to) = (to_cell(from), to_cell(to));
                    if from.0 == to.0 {
                        grid.vertical(from.0, from.1, to.1, pen);
                    } else {
                        grid.elbow(from, (from.0, to.1), to, pen);
                    }
                }
                DrawCall::Curve {
                    start,
                    control,
                    end,
                    pen,
                    ..
                } => grid.elbow(to_cell(start), to_cell(control), to_cell(end), pen),
                DrawCall::Marker {
                    center, kind, pen, ..
                } => {
                    let ch = match kind {
                        NodeKind::Normal => chars::COMMIT,
                        NodeKind::Merge => chars::MERGE,
                        NodeKind::Head => chars::HEAD,
                    };
                    let (lane, row) = to_cell(center);
                    grid.set(lane * CELLS_PER_LANE, row, ch, pen);
                }
            }
        }

        grid.cells
    }

    /// Rasterize and encode each line, colored when enabled
    pub fn render_lines(&self, projection: &Projection, lanes: usize, rows: usize) -> Vec<String> {
        self.rasterize(projection, lanes, rows)
            .iter()
            .map(|line| self.encode(line))
            .collect()
    }

    fn encode(&self, line: &[Cell]) -> String {
        let mut buffer = String::new();
        let mut current: Option<Pen> = None;
        for cell in line {
            if self.color && cell.pen.is_some() && cell.pen != current {
                if let Some(pen) = cell.pen {
                    buffer.push_str(&self.palette.color(pen).to_ansi());
                }
                current = cell.pen;
            }
            buffer.push(cell.ch);
        }
        if current.is_some() {
            buffer.push_str("\x1b[0m");
        }
        buffer
    }
}

struct Grid {
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    fn set(&mut self, column: usize, row: i64, ch: char, pen: Pen) {
        if row < 0 {
            return;
        }
        if let Some(cell) = self
            .cells
            .get_mut(row as usize)
            .and_then(|line| line.get_mut(column))
        {
            *cell = Cell { ch, pen: Some(pen) };
        }
    }

    /// Draw a stroke, turning perpendicular overlaps into crossings
    fn stroke(&mut self, column: usize, row: i64, ch: char, pen: Pen) {
        if row < 0 {
            return;
        }
        let Some(cell) = self
            .cells
            .get_mut(row as usize)
            .and_then(|line| line.get_mut(column))
        else {
            return;
        };
        let crossing = matches!(
            (cell.ch, ch),
            (chars::VERTICAL, chars::HORIZONTAL) | (chars::HORIZONTAL, chars::VERTICAL)
        );
        *cell = Cell {
            ch: if crossing { chars::CROSS } else { ch },
            pen: Some(pen),
        };
    }

    fn vertical(&mut self, lane: usize, from: i64, to: i64, pen: Pen) {
        let last = self.cells.len() as i64 - 1;
        for row in from.min(to).max(0)..=from.max(to).min(last) {
            self.stroke(lane * CELLS_PER_LANE, row, chars::VERTICAL, pen);
        }
    }

    fn horizontal(&mut self, row: i64, from: usize, to: usize, pen: Pen) {
        for column in from.min(to) * CELLS_PER_LANE..=from.max(to) * CELLS_PER_LANE {
            self.stroke(column, row, chars::HORIZONTAL, pen);
        }
    }

    /// Two axis-aligned strokes meeting at `corner`
    fn elbow(&mut self, start: (usize, i64), corner: (usize, i64), end: (usize, i64), pen: Pen) {
        for (a, b) in [(start, corner), (corner, end)] {
            if a.0 == b.0 {
                self.vertical(a.0, a.1, b.1, pen);
            } else if a.1 == b.1 {
                self.horizontal(a.1, a.0, b.0, pen);
            }
        }
        if corner == start || corner == end {
            return;
        }

        let (across, along) = if start.1 == corner.1 { (start, end) } else { (end, start) };
        let glyph = match (across.0 > corner.0, along.1 > corner.1) {
            (true, true) => chars::DOWN_RIGHT,
            (false, true) => chars::DOWN_LEFT,
            (true, false) => chars::UP_RIGHT,
            (false, false) => chars::UP_LEFT,
        };
        self.set(corner.0 * CELLS_PER_LANE, corner.1, glyph, pen);
    }
}

use crate::core::{GraphPoint, LayoutSnapshot, NodeKind};
use crate::error::{GraphError, Result};
use crate::render::pen::{Pen, RenderMode};
use crate::render::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, warn};

/// Horizontal placement of lanes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphGeometry {
    /// Distance between two lane centers in pixels
    pub lane_width: f64,
    /// Blank space left of lane 0 in pixels
    pub left_padding: f64,
}

impl Default for GraphGeometry {
    fn default() -> Self {
        Self {
            lane_width: 12.0,
            left_padding: 4.0,
        }
    }
}

impl GraphGeometry {
    /// Pixel X of a lane's center
    pub fn lane_x(&self, lane: usize) -> f64 {
        self.left_padding + (lane as f64 + 0.5) * self.lane_width
    }

    /// Width needed to show `lanes` lanes
    pub fn width(&self, lanes: usize) -> f64 {
        self.left_padding + lanes as f64 * self.lane_width
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Identity of the snapshot element a draw call came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    /// Piece between `points[piece]` and `points[piece + 1]` of a path
    Path { path: usize, piece: usize },
    Link(usize),
    Marker(usize),
}

/// One primitive for the drawing surface, in viewport pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Line {
        key: ElementKey,
        from: PixelPoint,
        to: PixelPoint,
        pen: Pen,
    },
    /// Quadratic Bezier
    Curve {
        key: ElementKey,
        start: PixelPoint,
        control: PixelPoint,
        end: PixelPoint,
        pen: Pen,
    },
    Marker {
        key: ElementKey,
        center: PixelPoint,
        kind: NodeKind,
        pen: Pen,
    },
}

impl DrawCall {
    pub fn key(&self) -> ElementKey {
        match self {
            DrawCall::Line { key, .. }
            | DrawCall::Curve { key, .. }
            | DrawCall::Marker { key, .. } => *key,
        }
    }

    pub fn pen(&self) -> Pen {
        match self {
            DrawCall::Line { pen, .. }
            | DrawCall::Curve { pen, .. }
            | DrawCall::Marker { pen, .. } => *pen,
        }
    }

    /// Same call shifted vertically by `dy`
    pub fn translated(&self, dy: f64) -> DrawCall {
        let shift = |p: PixelPoint| PixelPoint { x: p.x, y: p.y + dy };
        match *self {
            DrawCall::Line { key, from, to, pen } => DrawCall::Line {
                key,
                from: shift(from),
                to: shift(to),
                pen,
            },
            DrawCall::Curve {
                key,
                start,
                control,
                end,
                pen,
            } => DrawCall::Curve {
                key,
                start: shift(start),
                control: shift(control),
                end: shift(end),
                pen,
            },
            DrawCall::Marker {
                key,
                center,
                kind,
                pen,
            } => DrawCall::Marker {
                key,
                center: shift(center),
                kind,
                pen,
            },
        }
    }
}

/// Draw calls for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    /// Content-space Y the viewport origin corresponds to
    pub origin_y: f64,
    pub calls: Vec<DrawCall>,
}

impl Projection {
    pub fn empty(origin_y: f64) -> Self {
        Self {
            origin_y,
            calls: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Calls moved back into content space (unscrolled pixels)
    pub fn to_content_space(&self) -> Vec<DrawCall> {
        self.calls.iter().map(|call| call.translated(self.origin_y)).collect()
    }
}

/// Reprojects a row-indexed snapshot into the pixels of one viewport.
///
/// Work is proportional to the visible rows plus overscan; nothing is cached
/// in pixel units so row height may change between calls.
#[derive(Debug, Clone)]
pub struct Projector {
    geometry: GraphGeometry,
    palette_len: usize,
}

impl Projector {
    pub fn new(geometry: GraphGeometry, palette_len: usize) -> Self {
        Self {
            geometry,
            palette_len,
        }
    }

    /// Project the snapshot, failing on an unusable viewport or palette
    pub fn project(
        &self,
        snapshot: &LayoutSnapshot,
        viewport: &Viewport,
        mode: RenderMode,
    ) -> Result<Projection> {
        viewport.validate()?;
        if snapshot.palette_size() > self.palette_len {
            return Err(GraphError::PaletteTooSmall {
                needed: snapshot.palette_size(),
                available: self.palette_len,
            });
        }

        let origin_y = viewport.top();
        let (band_lo, band_hi) = viewport.cull_band();
        let in_band = |a: f64, b: f64| a.min(b) <= band_hi && a.max(b) >= band_lo;
        let to_pixel = |p: GraphPoint| PixelPoint {
            x: self.geometry.lane_x(p.lane),
            y: viewport.row_center(p.row) - origin_y,
        };
        let rows = viewport.candidate_rows();

        let mut lines = Vec::new();
        snapshot.paths_in_rows(rows.clone(), |idx| {
            let path = &snapshot.paths()[idx];
            let pen = mode.pen(path.color, path.on_current_branch);
            let points = &path.points;

            // Start from the last point above the band so curves entering
            // from the top stay continuous
            let first_inside = points.partition_point(|p| viewport.row_center(p.row) < band_lo);
            for piece in first_inside.saturating_sub(1)..points.len().saturating_sub(1) {
                let (a, b) = (points[piece], points[piece + 1]);
                let (ya, yb) = (viewport.row_center(a.row), viewport.row_center(b.row));
                if ya.min(yb) > band_hi {
                    break;
                }
                if !in_band(ya, yb) {
                    continue;
                }
                lines.push(DrawCall::Line {
                    key: ElementKey::Path { path: idx, piece },
                    from: to_pixel(a),
                    to: to_pixel(b),
                    pen,
                });
            }
        });

        let mut dimmed_curves = Vec::new();
        let mut curves = Vec::new();
        snapshot.links_in_rows(rows.clone(), |idx| {
            let link = &snapshot.links()[idx];
            let (top, bottom) = link.row_span();
            if !in_band(viewport.row_center(top), viewport.row_center(bottom)) {
                return;
            }
            let pen = mode.pen(link.color, link.on_current_branch);
            let call = DrawCall::Curve {
                key: ElementKey::Link(idx),
                start: to_pixel(link.start),
                control: to_pixel(link.control),
                end: to_pixel(link.end),
                pen,
            };
            if pen == Pen::Dimmed {
                dimmed_curves.push(call);
            } else {
                curves.push(call);
            }
        });

        let mut markers = Vec::new();
        let last_row = (*rows.end()).min(snapshot.row_count().saturating_sub(1));
        for row in *rows.start()..=last_row {
            let Some(marker) = snapshot.marker_at(row) else {
                break;
            };
            let y = viewport.row_center(row);
            if !in_band(y, y) {
                continue;
            }
            markers.push(DrawCall::Marker {
                key: ElementKey::Marker(row),
                center: to_pixel(marker.point()),
                kind: marker.kind,
                pen: mode.pen(marker.color, marker.on_current_branch),
            });
        }

        // Dimmed curves sit underneath everything else, markers on top
        let mut calls = dimmed_curves;
        calls.extend(lines);
        calls.extend(curves);
        calls.extend(markers);

        Ok(Projection { origin_y, calls })
    }

    /// Project for display: any failure draws no graph at all
    pub fn draw(
        &self,
        snapshot: Option<&LayoutSnapshot>,
        viewport: &Viewport,
        mode: RenderMode,
    ) -> Projection {
        let Some(snapshot) = snapshot else {
            return Projection::empty(0.0);
        };
        match panic::catch_unwind(AssertUnwindSafe(|| self.project(snapshot, viewport, mode))) {
            Ok(Ok(projection)) => projection,
            Ok(Err(err)) => {
                warn!(%err, "dropping commit graph overlay");
                Projection::empty(0.0)
            }
            Err(_) => {
                error!("projection panicked, dropping commit graph overlay");
                Projection::empty(0.0)
            }
        }
    }
}

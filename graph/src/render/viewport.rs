use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::cmp;
use std::ops::RangeInclusive;

/// Viewport represents the visible pixel window over the graph rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// First row shown at the top edge (0-based)
    pub first_visible_row: usize,
    /// Height of one row in pixels
    pub row_height: f64,
    /// Height of the visible area in pixels
    pub viewport_height: f64,
}

impl Viewport {
    pub fn new(first_visible_row: usize, row_height: f64, viewport_height: f64) -> Self {
        Self {
            first_visible_row,
            row_height,
            viewport_height,
        }
    }

    /// Viewport showing `rows` whole rows
    pub fn with_rows(first_visible_row: usize, row_height: f64, rows: usize) -> Self {
        Self::new(first_visible_row, row_height, rows as f64 * row_height)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.row_height.is_finite() || self.row_height <= 0.0 {
            return Err(GraphError::InvalidRowHeight(self.row_height));
        }
        if !self.viewport_height.is_finite() || self.viewport_height < 0.0 {
            return Err(GraphError::InvalidViewportHeight(self.viewport_height));
        }
        Ok(())
    }

    /// Content-space Y of the top edge
    pub fn top(&self) -> f64 {
        self.first_visible_row as f64 * self.row_height
    }

    /// Content-space Y of the bottom edge
    pub fn bottom(&self) -> f64 {
        self.top() + self.viewport_height
    }

    /// Content-space band that gets drawn: the window plus one row of overscan
    pub fn cull_band(&self) -> (f64, f64) {
        (self.top() - self.row_height, self.bottom() + self.row_height)
    }

    /// Content-space Y of a row's center
    pub fn row_center(&self, row: usize) -> f64 {
        (row as f64 + 0.5) * self.row_height
    }

    /// Rows whose center may fall inside the cull band (conservative)
    pub fn candidate_rows(&self) -> RangeInclusive<usize> {
        let (lo, hi) = self.cull_band();
        let first = (lo / self.row_height - 0.5).floor().max(0.0) as usize;
        let last = (hi / self.row_height).ceil().max(0.0) as usize;
        first..=last
    }

    /// Number of rows fully or partially visible
    pub fn visible_rows(&self) -> usize {
        (self.viewport_height / self.row_height).ceil() as usize
    }

    /// Scroll up by n rows
    pub fn scroll_up(&mut self, n: usize) {
        self.first_visible_row = self.first_visible_row.saturating_sub(n);
    }

    /// Scroll down by n rows, keeping the last row reachable
    pub fn scroll_down(&mut self, n: usize, total_rows: usize) {
        let max_top = total_rows.saturating_sub(self.visible_rows());
        self.first_visible_row = cmp::min(self.first_visible_row.saturating_add(n), max_top);
    }

    /// Page up (scroll by viewport height)
    pub fn page_up(&mut self) {
        self.scroll_up(self.visible_rows());
    }

    /// Page down (scroll by viewport height)
    pub fn page_down(&mut self, total_rows: usize) {
        self.scroll_down(self.visible_rows(), total_rows);
    }

    /// Put `row` in the middle of the window where possible
    pub fn center_on(&mut self, row: usize, total_rows: usize) {
        let visible = self.visible_rows();
        let max_top = total_rows.saturating_sub(visible);
        self.first_visible_row = cmp::min(row.saturating_sub(visible / 2), max_top);
    }

    /// Change the row height (font size change) keeping the same first row
    pub fn set_row_height(&mut self, row_height: f64) {
        self.row_height = row_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_viewport_scrolling() {
        let mut viewport = Viewport::with_rows(0, 20.0, 10);
        assert_eq!(viewport.visible_rows(), 10);

        viewport.scroll_down(5, 100);
        assert_eq!(viewport.first_visible_row, 5);

        viewport.page_down(100);
        assert_eq!(viewport.first_visible_row, 15);

        viewport.page_up();
        assert_eq!(viewport.first_visible_row, 5);
        viewport.page_up();
        assert_eq!(viewport.first_visible_row, 0);

        viewport.scroll_down(1000, 100);
        assert_eq!(viewport.first_visible_row, 90);

        viewport.scroll_up(200);
        assert_eq!(viewport.first_visible_row, 0);
    }

    #[test]
    fn test_scroll_by_huge_amount_clamps() {
        let mut viewport = Viewport::with_rows(0, 20.0, 10);
        viewport.scroll_down(3, 50);
        viewport.scroll_down(usize::MAX, 50);
        assert_eq!(viewport.first_visible_row, 40);

        viewport.scroll_up(usize::MAX);
        assert_eq!(viewport.first_visible_row, 0);
    }

    #[test]
    fn test_center_on_row() {
        let mut viewport = Viewport::with_rows(0, 10.0, 10);
        viewport.center_on(50, 100);
        assert_eq!(viewport.first_visible_row, 45);

        viewport.center_on(98, 100);
        assert_eq!(viewport.first_visible_row, 90);

        viewport.center_on(2, 100);
        assert_eq!(viewport.first_visible_row, 0);
    }

    #[test]
    fn test_cull_band_has_one_row_overscan() {
        let viewport = Viewport::new(10, 28.0, 280.0);
        assert_eq!(viewport.top(), 280.0);
        assert_eq!(viewport.cull_band(), (252.0, 588.0));
        assert_eq!(viewport.candidate_rows(), 8..=21);
    }

    #[test]
    fn test_invalid_viewports() {
        assert!(Viewport::new(0, 0.0, 100.0).validate().is_err());
        assert!(Viewport::new(0, f64::NAN, 100.0).validate().is_err());
        assert!(Viewport::new(0, 20.0, -1.0).validate().is_err());
        assert!(Viewport::new(0, 20.0, 0.0).validate().is_ok());
    }
}

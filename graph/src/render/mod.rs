pub mod cache;
pub mod pen;
pub mod projector;
pub mod text;
pub mod tui;
pub mod viewport;

pub use cache::SnapshotStore;
pub use pen::{Palette, Pen, RenderMode, Rgb};
pub use projector::{DrawCall, ElementKey, GraphGeometry, PixelPoint, Projection, Projector};
pub use tui::{cell_geometry, Cell, TerminalRenderer};
pub use viewport::Viewport;

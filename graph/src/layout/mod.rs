pub mod engine;
pub mod lanes;

pub use engine::{layout, layout_with, LayoutOptions, DEFAULT_PALETTE_SIZE};
pub use lanes::LaneIdx;

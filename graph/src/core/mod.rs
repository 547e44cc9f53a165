pub mod commit;
pub mod geometry;
pub mod index;
pub mod snapshot;

pub use commit::{Commit, CommitId, Parents};
pub use geometry::{GraphPoint, LinkCurve, NodeKind, NodeMarker, PathSegment};
pub use index::RowIndex;
pub use snapshot::{LayoutSnapshot, LayoutStats};

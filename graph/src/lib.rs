pub mod config;
pub mod core;
pub mod error;
pub mod git_backend;
pub mod layout;
pub mod render;
pub mod worker;

pub use crate::core::{
    Commit, CommitId, GraphPoint, LayoutSnapshot, LayoutStats, LinkCurve, NodeKind, NodeMarker,
    PathSegment,
};
pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use git_backend::{GitWalker, LoggedCommit};
pub use layout::{layout, layout_with, LayoutOptions};
pub use render::{Projection, Projector, RenderMode, SnapshotStore, Viewport};
pub use worker::LayoutWorker;

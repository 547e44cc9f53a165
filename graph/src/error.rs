use thiserror::Error;

/// Errors surfaced between the layout engine and whoever draws it
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("row height must be a positive finite number, got {0}")]
    InvalidRowHeight(f64),

    #[error("viewport height must be a non-negative finite number, got {0}")]
    InvalidViewportHeight(f64),

    #[error("layout uses {needed} lane colors but the palette only has {available}")]
    PaletteTooSmall { needed: usize, available: usize },

    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("layout worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

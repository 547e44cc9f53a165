use crate::error::GraphError;
use crate::layout::LayoutOptions;
use crate::render::{GraphGeometry, Palette, RenderMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings read from a `graph.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout: LayoutOptions,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Lane colors as `#rrggbb`; empty means the built-in palette
    pub palette: Vec<String>,
    pub mode: RenderMode,
    pub geometry: GraphGeometry,
    pub row_height: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            palette: Vec::new(),
            mode: RenderMode::default(),
            geometry: GraphGeometry::default(),
            row_height: 28.0,
        }
    }
}

impl GraphConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: GraphConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.palette()?;
        Ok(config)
    }

    /// Defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Palette that covers every color the layout may hand out
    pub fn palette(&self) -> crate::error::Result<Palette> {
        let palette = Palette::from_hex(&self.render.palette)?;
        if palette.len() < self.layout.palette_size {
            return Err(GraphError::PaletteTooSmall {
                needed: self.layout.palette_size,
                available: palette.len(),
            });
        }
        Ok(palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = GraphConfig::load_or_default(None).unwrap();
        assert_eq!(config.layout.palette_size, 10);
        assert_eq!(config.render.mode, RenderMode::FullColor);
        assert_eq!(config.palette().unwrap().len(), 10);
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r##"
[layout]
palette_size = 3
first_parent_only = true

[render]
palette = ["#ff0000", "#00ff00", "#0000ff"]
mode = "current-branch-only"

[render.geometry]
lane_width = 16.0
"##,
        );

        let config = GraphConfig::load(file.path()).unwrap();
        assert!(config.layout.first_parent_only);
        assert_eq!(config.render.mode, RenderMode::CurrentBranchOnly);
        assert_eq!(config.render.geometry.lane_width, 16.0);
        assert_eq!(config.render.geometry.left_padding, 4.0);
        assert_eq!(config.render.row_height, 28.0);
        assert_eq!(config.palette().unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_short_palette() {
        let file = write_config(
            r##"
[render]
palette = ["#ff0000"]
"##,
        );
        let err = GraphConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("palette only has 1"));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let file = write_config("[layout\n");
        let err = GraphConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}

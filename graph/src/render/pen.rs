use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which elements keep their lane color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Every element in its assigned color
    #[default]
    FullColor,
    /// Only the current branch in color, everything else dimmed
    CurrentBranchOnly,
}

impl RenderMode {
    pub fn pen(self, color: usize, on_current_branch: bool) -> Pen {
        match self {
            RenderMode::CurrentBranchOnly if !on_current_branch => Pen::Dimmed,
            _ => Pen::Lane(color),
        }
    }
}

/// Pen a draw call is stroked with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pen {
    Lane(usize),
    Dimmed,
}

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Truecolor foreground escape
    pub fn to_ansi(self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| GraphError::InvalidColor(s.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| GraphError::InvalidColor(s.to_string()))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Lane colors plus the pen used for dimmed elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
    dimmed: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Rgb(255, 165, 0),   // orange
                Rgb(34, 139, 34),   // forest green
                Rgb(255, 215, 0),   // gold
                Rgb(255, 0, 255),   // magenta
                Rgb(255, 0, 0),     // red
                Rgb(128, 128, 128), // gray
                Rgb(64, 224, 208),  // turquoise
                Rgb(128, 128, 0),   // olive
                Rgb(240, 230, 140), // khaki
                Rgb(0, 255, 0),     // lime
            ],
            dimmed: Rgb(96, 96, 96),
        }
    }
}

impl Palette {
    /// Palette from `#rrggbb` strings; an empty list keeps the defaults
    pub fn from_hex<S: AsRef<str>>(colors: &[S]) -> Result<Self> {
        let mut palette = Self::default();
        if !colors.is_empty() {
            palette.colors = colors
                .iter()
                .map(|c| c.as_ref().parse())
                .collect::<Result<_>>()?;
        }
        Ok(palette)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, pen: Pen) -> Rgb {
        match pen {
            Pen::Lane(idx) if !self.colors.is_empty() => self.colors[idx % self.colors.len()],
            _ => self.dimmed,
        }
    }
}

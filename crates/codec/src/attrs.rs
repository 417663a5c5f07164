//! Per-file display attributes.
//!
//! Stored as UTF-8 integer text in the file's extended attributes so that they
//! follow the file through renames on the same volume. The backend is
//! responsible for any platform namespace prefix; the keys here are bare.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Attribute key for [`Scaling`].
pub const SCALING_KEY: &str = "scaling";
/// Attribute key for [`Alignment`].
pub const ALIGNMENT_KEY: &str = "alignment";

/// How an image should be scaled for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scaling {
    /// Natural size (stored as `0`).
    #[default]
    Natural,
    /// Largest scale that fits the display area (stored as `-1`).
    Fit,
    /// Explicit percentage, e.g. `150` for 1.5x.
    Percent(i32),
}
impl Scaling {
    /// Scale factor to apply, or `None` when it depends on the display area.
    pub fn factor(&self) -> Option<f64> {
        match self {
            Self::Natural => Some(1.0),
            Self::Fit => None,
            Self::Percent(v) => Some(f64::from(*v) / 100.0),
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            Self::Natural => 0,
            Self::Fit => -1,
            Self::Percent(v) => v,
        }
    }
}
impl From<i32> for Scaling {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Natural,
            -1 => Self::Fit,
            v => Self::Percent(v),
        }
    }
}
impl FromStr for Scaling {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<i32>() {
            Ok(v) => Ok(v.into()),
            Err(_) => exn::bail!(ErrorKind::InvalidAttribute { key: SCALING_KEY, value: s.to_string() }),
        }
    }
}
impl Display for Scaling {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_raw())
    }
}

/// Where an image sits inside the display area when it doesn't fill it.
///
/// The stored integers match the platform image-alignment enumeration the
/// attribute values were originally written with, so existing libraries keep
/// their settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Center,
    Top,
    Left,
    Bottom,
    Right,
}
impl Alignment {
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Center => 0,
            Self::Top => 1,
            Self::Left => 4,
            Self::Bottom => 5,
            Self::Right => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Left => "left",
            Self::Bottom => "bottom",
            Self::Right => "right",
        }
    }
}
impl From<i32> for Alignment {
    /// Unknown values (including the corner alignments nobody can set from
    /// here) fall back to [`Alignment::Center`].
    fn from(value: i32) -> Self {
        match value {
            1 => Self::Top,
            4 => Self::Left,
            5 => Self::Bottom,
            8 => Self::Right,
            _ => Self::Center,
        }
    }
}
impl FromStr for Alignment {
    type Err = Error;
    /// Accepts either the stored integer or the name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i32>() {
            return Ok(v.into());
        }
        Ok(match s.to_lowercase().as_str() {
            "center" | "centre" => Self::Center,
            "top" => Self::Top,
            "left" => Self::Left,
            "bottom" => Self::Bottom,
            "right" => Self::Right,
            _ => exn::bail!(ErrorKind::InvalidAttribute { key: ALIGNMENT_KEY, value: s.to_string() }),
        })
    }
}
impl Display for Alignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

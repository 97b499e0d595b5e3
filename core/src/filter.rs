//! Filter

use crate::error::*;
use crate::math::Float;
use std::fmt;
use std::str::FromStr;

/// Continuous 2D reconstruction filter.
pub trait Filter: Send + Sync {
    /// Returns the value of the filter at an offset from its centre. The
    /// filter is zero outside `|x| > x_width / 2` or `|y| > y_width / 2`.
    ///
    /// * `x`       - Offset in x.
    /// * `y`       - Offset in y.
    /// * `x_width` - Total filter width in x.
    /// * `y_width` - Total filter width in y.
    fn evaluate(&self, x: Float, y: Float, x_width: Float, y_width: Float) -> Float;
}

/// Filter functions available to samplers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterType {
    /// Box filter.
    Box,
    /// Triangle (tent) filter.
    Triangle,
    /// Gaussian filter.
    Gaussian,
    /// Catmull-Rom cubic.
    CatmullRom,
    /// Windowed sinc.
    Sinc,
    /// Radially symmetric box.
    Disk,
}

impl FromStr for FilterType {
    type Err = TexError;

    /// Parse a filter name.
    ///
    /// * `s` - Filter name, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "box" => Ok(Self::Box),
            "triangle" => Ok(Self::Triangle),
            "gaussian" => Ok(Self::Gaussian),
            "catmull-rom" | "catmullrom" => Ok(Self::CatmullRom),
            "sinc" => Ok(Self::Sinc),
            "disk" => Ok(Self::Disk),
            _ => Err(TexError::NotFound(format!("filter {s}"))),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Box => "box",
            Self::Triangle => "triangle",
            Self::Gaussian => "gaussian",
            Self::CatmullRom => "catmull-rom",
            Self::Sinc => "sinc",
            Self::Disk => "disk",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_filter_names() {
        assert_eq!("Gaussian".parse::<FilterType>().unwrap(), FilterType::Gaussian);
        assert_eq!("catmull-rom".parse::<FilterType>().unwrap(), FilterType::CatmullRom);
        assert!("bessel".parse::<FilterType>().is_err());
        assert_eq!(FilterType::Disk.to_string(), "disk");
    }
}

use std::str::FromStr;

use crate::error::DocumentError;

/// Length unit of a shape's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Micrometre,
    Millimetre,
    Centimetre,
    Metre,
    Kilometre,
    Inch,
    Foot,
}

impl LengthUnit {
    /// Short name written to the `unit` attribute.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Micrometre => "um",
            Self::Millimetre => "mm",
            Self::Centimetre => "cm",
            Self::Metre => "m",
            Self::Kilometre => "km",
            Self::Inch => "in",
            Self::Foot => "ft",
        }
    }

    /// Size of one unit in metres.
    #[must_use]
    pub fn metres(self) -> f64 {
        match self {
            Self::Micrometre => 1e-6,
            Self::Millimetre => 1e-3,
            Self::Centimetre => 1e-2,
            Self::Metre => 1.0,
            Self::Kilometre => 1e3,
            Self::Inch => 0.0254,
            Self::Foot => 0.3048,
        }
    }

    /// Value of the `unit` attribute: name, a space, and the metre factor.
    #[must_use]
    pub fn attribute(self) -> String {
        format!("{} {:.6}", self.name(), self.metres())
    }
}

impl FromStr for LengthUnit {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "um" | "micrometre" | "micrometer" => Ok(Self::Micrometre),
            "mm" | "millimetre" | "millimeter" => Ok(Self::Millimetre),
            "cm" | "centimetre" | "centimeter" => Ok(Self::Centimetre),
            "m" | "metre" | "meter" => Ok(Self::Metre),
            "km" | "kilometre" | "kilometer" => Ok(Self::Kilometre),
            "in" | "inch" => Ok(Self::Inch),
            "ft" | "foot" => Ok(Self::Foot),
            _ => Err(DocumentError::UnknownUnit(s.to_owned())),
        }
    }
}

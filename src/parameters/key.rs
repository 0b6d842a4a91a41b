//! Structured parameter names
//!
//! Every fit parameter is addressed by a [`ParamKey`]: the doublet component it
//! belongs to, which of the two lines of the doublet it describes, and what kind
//! of quantity it is. Keys order by component, then line, then kind, so a
//! [`Parameters`](super::Parameters) collection iterates deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::parameter::ParameterError;

/// Maximum number of doublet components in a composite model.
pub const MAX_COMPONENTS: usize = 5;

/// Single-letter identifier of a doublet component (`a` through `e`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct ComponentLabel(u8);

impl ComponentLabel {
    /// The reference component (`a`), against which the axis is calibrated
    /// and distances are measured.
    pub const REFERENCE: ComponentLabel = ComponentLabel(0);

    /// Label for the component at position `index` (0 -> `a`).
    ///
    /// # Examples
    ///
    /// ```
    /// use xps_fit::parameters::ComponentLabel;
    ///
    /// let label = ComponentLabel::from_index(2).unwrap();
    /// assert_eq!(label.as_char(), 'c');
    /// assert!(ComponentLabel::from_index(5).is_err());
    /// ```
    pub fn from_index(index: usize) -> Result<Self, ParameterError> {
        if index < MAX_COMPONENTS {
            Ok(Self(index as u8))
        } else {
            Err(ParameterError::InvalidLabel {
                label: index.to_string(),
            })
        }
    }

    /// Labels for the first `count` components, in order.
    pub fn sequence(count: usize) -> Result<Vec<Self>, ParameterError> {
        (0..count).map(Self::from_index).collect()
    }

    /// Position of this component in its composite model.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// The label letter.
    pub fn as_char(&self) -> char {
        (b'a' + self.0) as char
    }

    /// Whether this is the reference component.
    pub fn is_reference(&self) -> bool {
        *self == Self::REFERENCE
    }
}

impl TryFrom<char> for ComponentLabel {
    type Error = ParameterError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        let lower = c.to_ascii_lowercase();
        if ('a'..='e').contains(&lower) {
            Ok(Self(lower as u8 - b'a'))
        } else {
            Err(ParameterError::InvalidLabel {
                label: c.to_string(),
            })
        }
    }
}

impl From<ComponentLabel> for char {
    fn from(label: ComponentLabel) -> Self {
        label.as_char()
    }
}

impl fmt::Display for ComponentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The two lines of a spin-orbit doublet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Line {
    /// The line whose center is fitted.
    Main,
    /// The line positioned and scaled relative to the main line.
    Satellite,
}

impl Line {
    /// Both lines, main first.
    pub const BOTH: [Line; 2] = [Line::Main, Line::Satellite];

    fn number(&self) -> u8 {
        match self {
            Line::Main => 1,
            Line::Satellite => 2,
        }
    }
}

/// The quantity a parameter describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Amplitude,
    Center,
    /// Gaussian width (standard deviation).
    Sigma,
    /// Lorentzian half width at half maximum.
    Gamma,
    /// Signed energy offset of the satellite below the main line.
    Splitting,
    /// Main:satellite intensity ratio.
    Ratio,
}

impl ParamKind {
    /// Kinds that describe a single Voigt line.
    pub const LINESHAPE: [ParamKind; 4] = [
        ParamKind::Amplitude,
        ParamKind::Center,
        ParamKind::Sigma,
        ParamKind::Gamma,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Amplitude => "amplitude",
            ParamKind::Center => "center",
            ParamKind::Sigma => "sigma",
            ParamKind::Gamma => "gamma",
            ParamKind::Splitting => "splitting",
            ParamKind::Ratio => "ratio",
        }
    }
}

/// Structured name of one fit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParamKey {
    pub label: ComponentLabel,
    pub line: Line,
    pub kind: ParamKind,
}

impl ParamKey {
    pub fn new(label: ComponentLabel, line: Line, kind: ParamKind) -> Self {
        Self { label, line, kind }
    }

    /// Key of a main-line parameter.
    pub fn main(label: ComponentLabel, kind: ParamKind) -> Self {
        Self::new(label, Line::Main, kind)
    }

    /// Key of a satellite-line parameter.
    pub fn satellite(label: ComponentLabel, kind: ParamKind) -> Self {
        Self::new(label, Line::Satellite, kind)
    }
}

/// Renders lmfit-style names such as `a1_center` or `b2_sigma`.
impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}",
            self.label,
            self.line.number(),
            self.kind.as_str()
        )
    }
}

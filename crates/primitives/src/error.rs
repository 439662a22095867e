//! Error vocabulary shared across the refsim crates.

use crate::StreamId;
use core::fmt;
use std::string::String;

/// The kind of name a lookup failed to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NameKind {
    /// A scoped variable.
    Variable,
    /// A stream name.
    Stream,
    /// An application.
    Application,
    /// A substance.
    Substance,
    /// A policy stanza.
    Policy,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Variable => "variable",
            Self::Stream => "stream",
            Self::Application => "application",
            Self::Substance => "substance",
            Self::Policy => "policy",
        })
    }
}

/// A reference to a variable, stream, application, substance, or policy that
/// is not known to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnknownName {
    /// What kind of name failed to resolve.
    pub kind: NameKind,
    /// The unresolved name.
    pub name: String,
}

impl UnknownName {
    /// Creates an unknown-name error.
    pub fn new(kind: NameKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl core::error::Error for UnknownName {}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.name)
    }
}

/// Numeric failure while computing or storing a quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArithmeticError {
    /// A NaN or infinite magnitude was about to be stored.
    NotFinite {
        /// The stream the magnitude was destined for.
        stream: StreamId,
    },
    /// A unit-denominated write needed an initial charge that is zero.
    ZeroInitialCharge {
        /// The substream whose initial charge is zero.
        stream: StreamId,
    },
}

impl core::error::Error for ArithmeticError {}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite { stream } => {
                write!(f, "non-finite magnitude written to stream `{stream}`")
            }
            Self::ZeroInitialCharge { stream } => {
                write!(
                    f,
                    "cannot resolve units for stream `{stream}`: initial charge is zero"
                )
            }
        }
    }
}

/// A stream magnitude went negative while the non-negativity guard is on.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeViolation {
    /// The stream that would have gone negative.
    pub stream: StreamId,
    /// The offending magnitude.
    pub magnitude: f64,
}

impl core::error::Error for RangeViolation {}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stream `{}` would become negative ({})",
            self.stream, self.magnitude
        )
    }
}

/// The engine was driven outside its lifecycle contract.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecycleError {
    /// `increment_year` was called after the final simulated year.
    YearPastEnd {
        /// The year the engine is currently at.
        current: i32,
        /// The final year of the simulation.
        end: i32,
    },
    /// An application was addressed with no stanza in scope.
    ApplicationWithoutStanza,
    /// A substance was addressed with no application in scope.
    SubstanceWithoutApplication,
    /// A stream operation ran with no substance in scope.
    NoSubstanceScope,
}

impl core::error::Error for LifecycleError {}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YearPastEnd { current, end } => {
                write!(f, "cannot advance past year {end} (currently at {current})")
            }
            Self::ApplicationWithoutStanza => {
                write!(f, "application set without an enclosing stanza")
            }
            Self::SubstanceWithoutApplication => {
                write!(f, "substance set without an enclosing application")
            }
            Self::NoSubstanceScope => {
                write!(f, "stream operation outside a substance scope")
            }
        }
    }
}

use core::fmt;
use primitives::{ArithmeticError, RangeViolation, UnknownName};
use units::UnitConversionError;

/// Errors from stream reads and writes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    /// The incoming value could not be converted to the stream's base unit.
    Conversion(UnitConversionError),
    /// A NaN magnitude or a zero initial charge.
    Arithmetic(ArithmeticError),
    /// A negative magnitude with the non-negativity guard on.
    Range(RangeViolation),
    /// The addressed substance or stream is unknown.
    Unknown(UnknownName),
}

impl From<UnitConversionError> for StateError {
    fn from(error: UnitConversionError) -> Self {
        Self::Conversion(error)
    }
}

impl From<ArithmeticError> for StateError {
    fn from(error: ArithmeticError) -> Self {
        Self::Arithmetic(error)
    }
}

impl From<RangeViolation> for StateError {
    fn from(error: RangeViolation) -> Self {
        Self::Range(error)
    }
}

impl From<UnknownName> for StateError {
    fn from(error: UnknownName) -> Self {
        Self::Unknown(error)
    }
}

impl core::error::Error for StateError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Conversion(e) => Some(e),
            Self::Arithmetic(e) => Some(e),
            Self::Range(e) => Some(e),
            Self::Unknown(e) => Some(e),
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion(e) => fmt::Display::fmt(e, f),
            Self::Arithmetic(e) => fmt::Display::fmt(e, f),
            Self::Range(e) => fmt::Display::fmt(e, f),
            Self::Unknown(e) => fmt::Display::fmt(e, f),
        }
    }
}

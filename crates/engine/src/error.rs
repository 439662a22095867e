use context::VariableError;
use core::fmt;
use lang::IncompatibleProgram;
use primitives::{ArithmeticError, LifecycleError, RangeViolation, UnknownName};
use state::StateError;
use units::UnitConversionError;

/// Any error surfaced while executing a program.
///
/// Execution errors abort the current scenario; nothing is silently
/// defaulted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineError {
    /// The program parsed but cannot be executed.
    Incompatible(IncompatibleProgram),
    /// An unknown variable, stream, application, substance, or policy.
    Unknown(UnknownName),
    /// A variable definition or lookup failure.
    Variable(VariableError),
    /// No conversion rule for the requested units.
    Conversion(UnitConversionError),
    /// NaN written, or a zero initial charge on a unit conversion.
    Arithmetic(ArithmeticError),
    /// A stream would have gone negative.
    Range(RangeViolation),
    /// The engine was driven outside its lifecycle contract.
    Lifecycle(LifecycleError),
}

impl From<IncompatibleProgram> for EngineError {
    fn from(error: IncompatibleProgram) -> Self {
        Self::Incompatible(error)
    }
}

impl From<UnknownName> for EngineError {
    fn from(error: UnknownName) -> Self {
        Self::Unknown(error)
    }
}

impl From<VariableError> for EngineError {
    fn from(error: VariableError) -> Self {
        Self::Variable(error)
    }
}

impl From<UnitConversionError> for EngineError {
    fn from(error: UnitConversionError) -> Self {
        Self::Conversion(error)
    }
}

impl From<ArithmeticError> for EngineError {
    fn from(error: ArithmeticError) -> Self {
        Self::Arithmetic(error)
    }
}

impl From<RangeViolation> for EngineError {
    fn from(error: RangeViolation) -> Self {
        Self::Range(error)
    }
}

impl From<LifecycleError> for EngineError {
    fn from(error: LifecycleError) -> Self {
        Self::Lifecycle(error)
    }
}

impl From<StateError> for EngineError {
    fn from(error: StateError) -> Self {
        match error {
            StateError::Conversion(e) => Self::Conversion(e),
            StateError::Arithmetic(e) => Self::Arithmetic(e),
            StateError::Range(e) => Self::Range(e),
            StateError::Unknown(e) => Self::Unknown(e),
        }
    }
}

impl core::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Incompatible(e) => Some(e),
            Self::Unknown(e) => Some(e),
            Self::Variable(e) => Some(e),
            Self::Conversion(e) => Some(e),
            Self::Arithmetic(e) => Some(e),
            Self::Range(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Incompatible(e) => fmt::Display::fmt(e, f),
            Self::Unknown(e) => fmt::Display::fmt(e, f),
            Self::Variable(e) => fmt::Display::fmt(e, f),
            Self::Conversion(e) => fmt::Display::fmt(e, f),
            Self::Arithmetic(e) => fmt::Display::fmt(e, f),
            Self::Range(e) => fmt::Display::fmt(e, f),
            Self::Lifecycle(e) => fmt::Display::fmt(e, f),
        }
    }
}

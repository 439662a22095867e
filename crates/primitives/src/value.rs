//! The magnitude + unit pair carried through the whole engine.

use crate::{Unit, UnitSpec};
use core::fmt;

/// An immutable magnitude with a unit annotation.
///
/// Equality is structural: `10 kg` and `0.01 mt` are different values, and
/// `5 unit` differs from `5 units`. Arithmetic on values happens in the unit
/// converter or the engine, with explicit unit handling.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Value {
    magnitude: f64,
    unit: UnitSpec,
}

impl Value {
    /// Creates a value from a magnitude and a unit annotation.
    #[inline]
    pub const fn new(magnitude: f64, unit: UnitSpec) -> Self {
        Self { magnitude, unit }
    }

    /// Creates a bare number.
    #[inline]
    pub const fn scalar(magnitude: f64) -> Self {
        Self::new(magnitude, UnitSpec::Scalar)
    }

    /// Creates a value in a single primitive unit, e.g. `10 kg`.
    #[inline]
    pub const fn of(magnitude: f64, unit: Unit) -> Self {
        Self::new(magnitude, UnitSpec::Base(unit))
    }

    /// Creates a ratio value, e.g. `0.5 kg / unit`.
    #[inline]
    pub const fn per(magnitude: f64, numerator: Unit, denominator: Unit) -> Self {
        Self::new(magnitude, UnitSpec::Ratio(numerator, denominator))
    }

    /// The numeric magnitude.
    #[inline]
    pub const fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// The unit annotation.
    #[inline]
    pub const fn unit(&self) -> UnitSpec {
        self.unit
    }

    /// Returns the same unit with a different magnitude.
    #[inline]
    pub const fn with_magnitude(self, magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: self.unit,
        }
    }

    /// Whether the magnitude is neither NaN nor infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.magnitude.is_finite()
    }

    /// Whether the magnitude is exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.magnitude == 0.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_scalar() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        assert_eq!(Value::of(10.0, Unit::Kg), Value::of(10.0, Unit::Kg));
        assert_ne!(Value::of(10.0, Unit::Kg), Value::of(10.0, Unit::Mt));
        assert_ne!(
            Value::of(5.0, Unit::EquipmentUnit),
            Value::of(5.0, Unit::EquipmentUnits)
        );
        assert_ne!(Value::of(10.0, Unit::Kg), Value::scalar(10.0));
    }

    #[test]
    fn display_includes_unit() {
        assert_eq!(Value::of(10.0, Unit::Kg).to_string(), "10 kg");
        assert_eq!(
            Value::per(0.5, Unit::Kg, Unit::EquipmentUnit).to_string(),
            "0.5 kg / unit"
        );
        assert_eq!(Value::scalar(3.0).to_string(), "3");
    }

    #[test]
    fn with_magnitude_keeps_unit() {
        let v = Value::per(2.0, Unit::Tco2e, Unit::Kg).with_magnitude(4.0);
        assert_eq!(v, Value::per(4.0, Unit::Tco2e, Unit::Kg));
    }
}

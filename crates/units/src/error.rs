use core::fmt;
use primitives::UnitSpec;

/// No conversion rule maps the source unit to the requested destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitConversionError {
    /// The unit of the source value.
    pub from: UnitSpec,
    /// The requested destination unit.
    pub to: UnitSpec,
}

impl UnitConversionError {
    /// Creates a conversion error.
    pub const fn new(from: UnitSpec, to: UnitSpec) -> Self {
        Self { from, to }
    }
}

impl core::error::Error for UnitConversionError {}

impl fmt::Display for UnitConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no rule to convert `{}` into `{}`",
            spelled(self.from),
            spelled(self.to)
        )
    }
}

fn spelled(spec: UnitSpec) -> SpecOrScalar {
    SpecOrScalar(spec)
}

struct SpecOrScalar(UnitSpec);

impl fmt::Display for SpecOrScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_scalar() {
            f.write_str("scalar")
        } else {
            fmt::Display::fmt(&self.0, f)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::Unit;

    #[test]
    fn display_names_both_units() {
        let err = UnitConversionError::new(
            UnitSpec::Base(Unit::Kwh),
            UnitSpec::Base(Unit::Percent),
        );
        assert_eq!(err.to_string(), "no rule to convert `kwh` into `%`");
        let err = UnitConversionError::new(UnitSpec::Scalar, UnitSpec::Base(Unit::Kg));
        assert_eq!(err.to_string(), "no rule to convert `scalar` into `kg`");
    }
}

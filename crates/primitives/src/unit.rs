//! Units of measure understood by the conversion algebra.

use core::fmt;
use core::str::FromStr;

/// A primitive unit of measure.
///
/// `unit`/`units` and `year`/`years` are distinct spellings with identical
/// semantics; conversions preserve whichever spelling the caller supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    /// Kilograms of substance.
    Kg,
    /// Metric tons of substance (1000 kg).
    Mt,
    /// Tons of CO2-equivalent.
    Tco2e,
    /// A single piece of equipment.
    EquipmentUnit,
    /// Pieces of equipment, plural spelling.
    EquipmentUnits,
    /// Kilowatt hours.
    Kwh,
    /// One simulated year.
    Year,
    /// Simulated years, plural spelling.
    Years,
    /// Percentage of a contextual total.
    Percent,
}

/// The dimension a [`Unit`] measures.
///
/// Spelling aliases share a family, so family comparison is the right way to
/// ask whether two units are interchangeable without conversion state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitFamily {
    /// Substance mass (`kg`, `mt`).
    Mass,
    /// Equipment population (`unit`, `units`).
    Population,
    /// Greenhouse-gas emissions (`tCO2e`).
    Emissions,
    /// Electrical energy (`kwh`).
    Energy,
    /// Simulated time (`year`, `years`).
    Time,
    /// Share of a contextual total (`%`).
    Fraction,
}

impl Unit {
    /// All primitive units, in display order.
    pub const ALL: [Self; 9] = [
        Self::Kg,
        Self::Mt,
        Self::Tco2e,
        Self::EquipmentUnit,
        Self::EquipmentUnits,
        Self::Kwh,
        Self::Year,
        Self::Years,
        Self::Percent,
    ];

    /// Returns the source spelling of the unit.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::Mt => "mt",
            Self::Tco2e => "tCO2e",
            Self::EquipmentUnit => "unit",
            Self::EquipmentUnits => "units",
            Self::Kwh => "kwh",
            Self::Year => "year",
            Self::Years => "years",
            Self::Percent => "%",
        }
    }

    /// Parses a unit from its source spelling.
    ///
    /// This is the inverse of [`as_str`](Self::as_str).
    #[inline]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "kg" => Self::Kg,
            "mt" => Self::Mt,
            "tCO2e" => Self::Tco2e,
            "unit" => Self::EquipmentUnit,
            "units" => Self::EquipmentUnits,
            "kwh" => Self::Kwh,
            "year" => Self::Year,
            "years" => Self::Years,
            "%" => Self::Percent,
            _ => return None,
        })
    }

    /// Returns the dimension this unit measures.
    #[inline]
    pub const fn family(self) -> UnitFamily {
        match self {
            Self::Kg | Self::Mt => UnitFamily::Mass,
            Self::Tco2e => UnitFamily::Emissions,
            Self::EquipmentUnit | Self::EquipmentUnits => UnitFamily::Population,
            Self::Kwh => UnitFamily::Energy,
            Self::Year | Self::Years => UnitFamily::Time,
            Self::Percent => UnitFamily::Fraction,
        }
    }

    /// Whether the unit measures substance mass.
    #[inline]
    pub const fn is_mass(self) -> bool {
        matches!(self, Self::Kg | Self::Mt)
    }

    /// Whether the unit counts equipment.
    #[inline]
    pub const fn is_population(self) -> bool {
        matches!(self, Self::EquipmentUnit | Self::EquipmentUnits)
    }

    /// Whether the unit measures simulated time.
    #[inline]
    pub const fn is_time(self) -> bool {
        matches!(self, Self::Year | Self::Years)
    }

    /// Kilograms per one of this unit. Only meaningful for mass units.
    #[inline]
    pub const fn kg_per(self) -> f64 {
        match self {
            Self::Mt => 1000.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error indicating that a unit spelling is unknown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitParseError(pub std::string::String);

impl fmt::Display for UnitParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit `{}`", self.0)
    }
}

impl core::error::Error for UnitParseError {}

impl FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnitParseError(s.into()))
    }
}

/// The full unit annotation of a [`Value`](crate::Value): nothing, a
/// primitive, or a ratio of two primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnitSpec {
    /// A bare number.
    Scalar,
    /// A single primitive unit.
    Base(Unit),
    /// `numerator / denominator`.
    Ratio(Unit, Unit),
}

impl UnitSpec {
    /// The numerator unit, if any.
    #[inline]
    pub const fn numerator(self) -> Option<Unit> {
        match self {
            Self::Scalar => None,
            Self::Base(u) | Self::Ratio(u, _) => Some(u),
        }
    }

    /// The denominator unit of a ratio.
    #[inline]
    pub const fn denominator(self) -> Option<Unit> {
        match self {
            Self::Ratio(_, d) => Some(d),
            _ => None,
        }
    }

    /// Whether this is a bare number.
    #[inline]
    pub const fn is_scalar(self) -> bool {
        matches!(self, Self::Scalar)
    }

    /// Whether this is a ratio of two primitives.
    #[inline]
    pub const fn is_ratio(self) -> bool {
        matches!(self, Self::Ratio(..))
    }

    /// Parses a unit annotation from source text, e.g. `kg` or `kg / unit`.
    ///
    /// The empty string parses as [`UnitSpec::Scalar`].
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Some(Self::Scalar);
        }
        match s.split_once('/') {
            None => Unit::parse(s).map(Self::Base),
            Some((num, denom)) => {
                let num = Unit::parse(num.trim())?;
                let denom = Unit::parse(denom.trim())?;
                Some(Self::Ratio(num, denom))
            }
        }
    }
}

impl From<Unit> for UnitSpec {
    fn from(unit: Unit) -> Self {
        Self::Base(unit)
    }
}

impl fmt::Display for UnitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => Ok(()),
            Self::Base(u) => fmt::Display::fmt(u, f),
            Self::Ratio(n, d) => write!(f, "{n} / {d}"),
        }
    }
}

impl FromStr for UnitSpec {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnitParseError(s.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_inverse_of_as_str() {
        for unit in Unit::ALL {
            assert_eq!(Unit::parse(unit.as_str()), Some(unit));
        }
    }

    #[test]
    fn parse_rejects_unknown_spellings() {
        assert_eq!(Unit::parse("KG"), None);
        assert_eq!(Unit::parse("tco2e"), None);
        assert_eq!(Unit::parse(""), None);
        assert_eq!(Unit::parse("kg "), None);
    }

    #[test]
    fn spelling_aliases_share_a_family() {
        assert_eq!(
            Unit::EquipmentUnit.family(),
            Unit::EquipmentUnits.family()
        );
        assert_eq!(Unit::Year.family(), Unit::Years.family());
        assert_ne!(Unit::Kg.family(), Unit::Tco2e.family());
    }

    #[test]
    fn spec_parse_round_trips() {
        for s in ["kg", "kg / unit", "tCO2e / kg", "%", "% / year", ""] {
            let spec = UnitSpec::parse(s).unwrap();
            assert_eq!(UnitSpec::parse(&spec.to_string()), Some(spec));
        }
    }

    #[test]
    fn spec_parse_rejects_malformed_ratios() {
        assert_eq!(UnitSpec::parse("kg /"), None);
        assert_eq!(UnitSpec::parse("/ unit"), None);
        assert_eq!(UnitSpec::parse("kg / bogus"), None);
    }

    #[test]
    fn mass_scale() {
        assert_eq!(Unit::Mt.kg_per(), 1000.0);
        assert_eq!(Unit::Kg.kg_per(), 1.0);
    }
}

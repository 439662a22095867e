//! The conversion algebra.

use crate::UnitConversionError;
use context::StateProvider;
use primitives::{Unit, UnitFamily, UnitSpec, Value};

/// Converts values between units using a state provider for context.
///
/// Conversions that divide by a contextual total (population, volume,
/// consumption, elapsed years) follow IEEE float semantics when that total
/// is zero; the resulting non-finite magnitudes are rejected by the
/// store-time guards rather than here.
#[derive(Clone, Copy, Debug)]
pub struct UnitConverter<P> {
    state: P,
}

impl<P: StateProvider> UnitConverter<P> {
    /// Creates a converter over the given state provider.
    pub const fn new(state: P) -> Self {
        Self { state }
    }

    /// The provider this converter consults.
    pub const fn state(&self) -> &P {
        &self.state
    }

    /// Consumes the converter, returning its provider.
    pub fn into_inner(self) -> P {
        self.state
    }

    /// Converts `source` into the destination unit.
    pub fn convert(&self, source: &Value, dest: UnitSpec) -> Result<Value, UnitConversionError> {
        if source.unit() == dest {
            return Ok(*source);
        }
        let fail = || UnitConversionError::new(source.unit(), dest);
        match dest {
            UnitSpec::Scalar => Err(fail()),
            UnitSpec::Ratio(num, den) => {
                let numerator = self.convert(source, UnitSpec::Base(num))?;
                let total = self.contextual_total(den).ok_or_else(fail)?;
                Ok(Value::new(numerator.magnitude() / total, dest))
            }
            UnitSpec::Base(unit) => {
                let flat = self.normalize(source).ok_or_else(fail)?;
                let src = match flat.unit() {
                    UnitSpec::Base(u) => u,
                    _ => return Err(fail()),
                };
                let magnitude = self.dispatch(flat.magnitude(), src, unit).ok_or_else(fail)?;
                Ok(Value::new(magnitude, dest))
            }
        }
    }

    /// Converts `source` into a single primitive unit.
    pub fn convert_to(&self, source: &Value, dest: Unit) -> Result<Value, UnitConversionError> {
        self.convert(source, UnitSpec::Base(dest))
    }

    /// Cancels a ratio denominator against the matching contextual total,
    /// leaving a value in the numerator unit.
    fn normalize(&self, source: &Value) -> Option<Value> {
        match source.unit() {
            UnitSpec::Ratio(num, den) => {
                let total = self.contextual_total(den)?;
                Some(Value::of(source.magnitude() * total, num))
            }
            _ => Some(*source),
        }
    }

    /// The engine total corresponding to a denominator unit, expressed in
    /// that unit.
    fn contextual_total(&self, unit: Unit) -> Option<f64> {
        match unit.family() {
            UnitFamily::Population => Some(self.state.population().magnitude()),
            UnitFamily::Time => Some(self.state.years_elapsed().magnitude()),
            UnitFamily::Emissions => Some(self.state.consumption().magnitude()),
            UnitFamily::Mass => Some(mass_in(&self.state.volume(), unit)),
            UnitFamily::Energy | UnitFamily::Fraction => None,
        }
    }

    /// Primitive-to-primitive conversion.
    fn dispatch(&self, mag: f64, src: Unit, dest: Unit) -> Option<f64> {
        use UnitFamily::*;
        Some(match dest.family() {
            Mass => {
                let kg = match src.family() {
                    Mass => mag * src.kg_per(),
                    Population => mag * self.amortized_kg_per_unit(),
                    Emissions => mag / self.ghg_per_kg(),
                    Fraction => mag / 100.0 * self.volume_kg(),
                    Time => mag * self.volume_kg() / self.years(),
                    Energy => return None,
                };
                kg / dest.kg_per()
            }
            Population => match src.family() {
                Population => mag,
                Mass => mag * src.kg_per() / self.amortized_kg_per_unit(),
                Emissions => mag / self.tco2e_per_unit(),
                Fraction => mag / 100.0 * self.state.population().magnitude(),
                Time => mag * self.state.population_change().magnitude(),
                Energy => return None,
            },
            Emissions => match src.family() {
                Emissions => mag,
                Mass => mag * src.kg_per() * self.ghg_per_kg(),
                Population => mag * self.tco2e_per_unit(),
                Fraction => mag / 100.0 * self.state.consumption().magnitude(),
                Time => mag * self.state.consumption().magnitude() / self.years(),
                Energy => return None,
            },
            Time => match src.family() {
                Time => mag,
                Emissions => mag * self.years() / self.state.consumption().magnitude(),
                Mass => mag * src.kg_per() * self.years() / self.volume_kg(),
                Population => mag / self.state.population_change().magnitude(),
                Fraction => mag / 100.0 * self.years(),
                Energy => return None,
            },
            Fraction => match src.family() {
                Fraction => mag,
                Emissions => mag / self.state.consumption().magnitude() * 100.0,
                Mass => mag * src.kg_per() / self.volume_kg() * 100.0,
                Population => mag / self.state.population().magnitude() * 100.0,
                Time => mag / self.years() * 100.0,
                Energy => return None,
            },
            Energy => match src.family() {
                Energy => mag,
                _ => return None,
            },
        })
    }

    fn volume_kg(&self) -> f64 {
        mass_in(&self.state.volume(), Unit::Kg)
    }

    fn years(&self) -> f64 {
        self.state.years_elapsed().magnitude()
    }

    /// GHG intensity as tCO2e per kg, whatever mass unit the provider used.
    fn ghg_per_kg(&self) -> f64 {
        let v = self.state.substance_consumption();
        match v.unit().denominator() {
            Some(d) if d.is_mass() => v.magnitude() / d.kg_per(),
            _ => v.magnitude(),
        }
    }

    /// Pooled initial charge as kg per unit.
    fn amortized_kg_per_unit(&self) -> f64 {
        let v = self.state.amortized_unit_volume();
        match v.unit().numerator() {
            Some(n) if n.is_mass() => v.magnitude() * n.kg_per(),
            _ => v.magnitude(),
        }
    }

    fn tco2e_per_unit(&self) -> f64 {
        self.state.amortized_unit_consumption().magnitude()
    }
}

/// Reads a mass value in the requested mass unit.
fn mass_in(value: &Value, unit: Unit) -> f64 {
    let from = value.unit().numerator().unwrap_or(Unit::Kg);
    value.magnitude() * from.kg_per() / unit.kg_per()
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::{NullProvider, OverridingStateProvider};
    use rstest::rstest;

    type Provider = OverridingStateProvider<NullProvider>;

    fn provider() -> Provider {
        OverridingStateProvider::new(NullProvider)
            .with_population(Value::of(20.0, Unit::EquipmentUnits))
            .with_volume(Value::of(50.0, Unit::Kg))
            .with_consumption(Value::of(100.0, Unit::Tco2e))
            .with_substance_consumption(Value::per(2.0, Unit::Tco2e, Unit::Kg))
            .with_amortized_unit_volume(Value::per(0.5, Unit::Kg, Unit::EquipmentUnit))
            .with_amortized_unit_consumption(Value::per(1.0, Unit::Tco2e, Unit::EquipmentUnit))
            .with_years_elapsed(Value::of(2.0, Unit::Years))
            .with_population_change(Value::of(10.0, Unit::EquipmentUnits))
    }

    fn converter() -> UnitConverter<Provider> {
        UnitConverter::new(provider())
    }

    #[test]
    fn exact_match_short_circuits() {
        let v = Value::of(10.0, Unit::Kg);
        assert_eq!(converter().convert_to(&v, Unit::Kg).unwrap(), v);
    }

    #[rstest]
    #[case(Value::of(1500.0, Unit::Kg), Unit::Mt, 1.5)]
    #[case(Value::of(1.5, Unit::Mt), Unit::Kg, 1500.0)]
    #[case(Value::of(4.0, Unit::EquipmentUnits), Unit::Kg, 2.0)]
    #[case(Value::of(3.0, Unit::Kg), Unit::EquipmentUnit, 6.0)]
    #[case(Value::of(3.0, Unit::Kg), Unit::Tco2e, 6.0)]
    #[case(Value::of(4.0, Unit::EquipmentUnits), Unit::Tco2e, 4.0)]
    #[case(Value::of(6.0, Unit::Tco2e), Unit::Kg, 3.0)]
    #[case(Value::of(10.0, Unit::Percent), Unit::Kg, 5.0)]
    #[case(Value::of(50.0, Unit::Percent), Unit::EquipmentUnits, 10.0)]
    #[case(Value::of(10.0, Unit::Percent), Unit::Tco2e, 10.0)]
    #[case(Value::of(50.0, Unit::Percent), Unit::Years, 1.0)]
    #[case(Value::of(5.0, Unit::Kg), Unit::Percent, 10.0)]
    #[case(Value::of(10.0, Unit::EquipmentUnits), Unit::Percent, 50.0)]
    #[case(Value::of(50.0, Unit::Tco2e), Unit::Years, 1.0)]
    #[case(Value::of(5.0, Unit::EquipmentUnits), Unit::Years, 0.5)]
    #[case(Value::of(1.0, Unit::Years), Unit::EquipmentUnits, 10.0)]
    #[case(Value::of(1.0, Unit::Year), Unit::Kg, 25.0)]
    fn primitive_conversions(#[case] source: Value, #[case] dest: Unit, #[case] expected: f64) {
        let out = converter().convert_to(&source, dest).unwrap();
        assert!(
            (out.magnitude() - expected).abs() < 1e-9,
            "{source} -> {dest}: got {out}, want {expected}"
        );
        assert_eq!(out.unit(), UnitSpec::Base(dest));
    }

    #[rstest]
    #[case(Value::per(10.0, Unit::Percent, Unit::Year), Unit::Kg, 10.0)]
    #[case(Value::per(0.5, Unit::Kg, Unit::EquipmentUnit), Unit::Kg, 10.0)]
    #[case(Value::per(1.0, Unit::Kg, Unit::Year), Unit::Kg, 2.0)]
    #[case(Value::per(2.0, Unit::Percent, Unit::Tco2e), Unit::Kg, 100.0)]
    fn ratio_sources_normalize_against_totals(
        #[case] source: Value,
        #[case] dest: Unit,
        #[case] expected: f64,
    ) {
        // `% / year` cancels years elapsed (2), `kg / unit` cancels the
        // population (20), `/ tCO2e` cancels total consumption (100).
        let out = converter().convert_to(&source, dest).unwrap();
        assert!(
            (out.magnitude() - expected).abs() < 1e-9,
            "{source} -> {dest}: got {out}, want {expected}"
        );
    }

    #[test]
    fn ratio_destination_divides_by_provider_total() {
        let out = converter()
            .convert(
                &Value::of(100.0, Unit::Tco2e),
                UnitSpec::Ratio(Unit::Tco2e, Unit::Kg),
            )
            .unwrap();
        assert_eq!(out, Value::per(2.0, Unit::Tco2e, Unit::Kg));
    }

    #[test]
    fn ratio_destination_scales_mass_denominators() {
        // The 50 kg volume reads as 0.05 mt for a `/ mt` denominator.
        let out = converter()
            .convert(
                &Value::of(100.0, Unit::Tco2e),
                UnitSpec::Ratio(Unit::Tco2e, Unit::Mt),
            )
            .unwrap();
        assert_eq!(out, Value::per(2000.0, Unit::Tco2e, Unit::Mt));
    }

    #[test]
    fn mass_sources_scale_before_percent() {
        // 0.01 mt = 10 kg, which is 20 % of the 50 kg volume.
        let out = converter()
            .convert_to(&Value::of(0.01, Unit::Mt), Unit::Percent)
            .unwrap();
        assert_eq!(out, Value::of(20.0, Unit::Percent));
    }

    #[test]
    fn population_spellings_relabel() {
        let out = converter()
            .convert_to(&Value::of(5.0, Unit::EquipmentUnit), Unit::EquipmentUnits)
            .unwrap();
        assert_eq!(out, Value::of(5.0, Unit::EquipmentUnits));
        let out = converter()
            .convert_to(&Value::of(3.0, Unit::Years), Unit::Year)
            .unwrap();
        assert_eq!(out, Value::of(3.0, Unit::Year));
    }

    #[rstest]
    #[case(Unit::Kg, Unit::EquipmentUnit)]
    #[case(Unit::Kg, Unit::Percent)]
    #[case(Unit::Kg, Unit::Tco2e)]
    #[case(Unit::Kg, Unit::Mt)]
    #[case(Unit::Tco2e, Unit::Percent)]
    #[case(Unit::EquipmentUnits, Unit::Tco2e)]
    #[case(Unit::Tco2e, Unit::Years)]
    fn round_trips_preserve_magnitude(#[case] there: Unit, #[case] back: Unit) {
        let conv = converter();
        let source = Value::of(7.0, there);
        let out = conv.convert_to(&source, back).unwrap();
        let home = conv.convert_to(&out, there).unwrap();
        assert!(
            (home.magnitude() - source.magnitude()).abs() < 1e-9,
            "{there} -> {back} -> {there}: got {home}"
        );
    }

    #[test]
    fn unsupported_mappings_fail() {
        let conv = converter();
        let err = conv
            .convert_to(&Value::of(1.0, Unit::Kwh), Unit::Kg)
            .unwrap_err();
        assert_eq!(
            err,
            UnitConversionError::new(UnitSpec::Base(Unit::Kwh), UnitSpec::Base(Unit::Kg))
        );
        assert!(conv.convert_to(&Value::scalar(1.0), Unit::Kg).is_err());
        assert!(conv
            .convert(&Value::of(1.0, Unit::Kg), UnitSpec::Scalar)
            .is_err());
    }

    #[test]
    fn zero_totals_produce_non_finite_rather_than_defaults() {
        let conv = UnitConverter::new(NullProvider);
        // Dividing by a zero initial charge must not silently become 1.
        let out = conv
            .convert_to(&Value::of(3.0, Unit::Kg), Unit::EquipmentUnit)
            .unwrap();
        assert!(!out.is_finite());
    }
}

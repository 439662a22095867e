//! State provider interface for context-sensitive unit conversion.

use auto_impl::auto_impl;
use primitives::{Unit, Value};

/// Engine quantities the unit converter consults.
///
/// The engine implements this over its live stream state; recalculation
/// routines wrap it in an
/// [`OverridingStateProvider`](crate::OverridingStateProvider) to reason
/// about hypothetical states.
#[auto_impl(&, &mut, Box)]
pub trait StateProvider {
    /// Current equipment population, in units.
    fn population(&self) -> Value;

    /// Current total sales volume, in kg.
    fn volume(&self) -> Value;

    /// Current consumption, in tCO2e.
    fn consumption(&self) -> Value;

    /// GHG intensity of the substance, in tCO2e / kg.
    fn substance_consumption(&self) -> Value;

    /// Initial charge pooled over the sales substreams, in kg / unit.
    fn amortized_unit_volume(&self) -> Value;

    /// Consumption embedded in one new unit, in tCO2e / unit.
    fn amortized_unit_consumption(&self) -> Value;

    /// Years elapsed since the simulation start, in years.
    fn years_elapsed(&self) -> Value;

    /// Change in equipment population over the current year, in units.
    fn population_change(&self) -> Value;
}

/// Provider that reports every quantity as zero.
///
/// Useful for conversions that do not depend on engine state, and as the
/// innermost layer under test overrides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullProvider;

impl StateProvider for NullProvider {
    fn population(&self) -> Value {
        Value::of(0.0, Unit::EquipmentUnits)
    }

    fn volume(&self) -> Value {
        Value::of(0.0, Unit::Kg)
    }

    fn consumption(&self) -> Value {
        Value::of(0.0, Unit::Tco2e)
    }

    fn substance_consumption(&self) -> Value {
        Value::per(0.0, Unit::Tco2e, Unit::Kg)
    }

    fn amortized_unit_volume(&self) -> Value {
        Value::per(0.0, Unit::Kg, Unit::EquipmentUnit)
    }

    fn amortized_unit_consumption(&self) -> Value {
        Value::per(0.0, Unit::Tco2e, Unit::EquipmentUnit)
    }

    fn years_elapsed(&self) -> Value {
        Value::of(0.0, Unit::Years)
    }

    fn population_change(&self) -> Value {
        Value::of(0.0, Unit::EquipmentUnits)
    }
}

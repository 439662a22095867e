//! The engine-backed state provider.

use context::StateProvider;
use primitives::Value;

/// A snapshot of the engine quantities for one (application, substance)
/// pair, taken just before a conversion or recalculation.
///
/// Snapshots are cheap copies; recalculations wrap one in an
/// [`OverridingStateProvider`](context::OverridingStateProvider) to reason
/// about hypothetical values without touching the keeper.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineState {
    /// Current equipment population, units.
    pub population: Value,
    /// Current total sales, kg.
    pub volume: Value,
    /// Current consumption, tCO2e.
    pub consumption: Value,
    /// GHG intensity, tCO2e / kg.
    pub substance_consumption: Value,
    /// Pooled initial charge, kg / unit.
    pub amortized_unit_volume: Value,
    /// Consumption embedded in one new unit, tCO2e / unit.
    pub amortized_unit_consumption: Value,
    /// Years since the simulation start, years.
    pub years_elapsed: Value,
    /// Equipment change over the current year, units.
    pub population_change: Value,
}

impl StateProvider for EngineState {
    fn population(&self) -> Value {
        self.population
    }

    fn volume(&self) -> Value {
        self.volume
    }

    fn consumption(&self) -> Value {
        self.consumption
    }

    fn substance_consumption(&self) -> Value {
        self.substance_consumption
    }

    fn amortized_unit_volume(&self) -> Value {
        self.amortized_unit_volume
    }

    fn amortized_unit_consumption(&self) -> Value {
        self.amortized_unit_consumption
    }

    fn years_elapsed(&self) -> Value {
        self.years_elapsed
    }

    fn population_change(&self) -> Value {
        self.population_change
    }
}

//! Transient per-field overrides over a [`StateProvider`].

use crate::StateProvider;
use primitives::Value;

/// Decorates a provider with per-field overrides.
///
/// Unset fields fall through to the inner provider, so a recalculation can
/// say "assume volume is X" without copying or mutating the engine state.
#[derive(Clone, Copy, Debug)]
pub struct OverridingStateProvider<P> {
    inner: P,
    population: Option<Value>,
    volume: Option<Value>,
    consumption: Option<Value>,
    substance_consumption: Option<Value>,
    amortized_unit_volume: Option<Value>,
    amortized_unit_consumption: Option<Value>,
    years_elapsed: Option<Value>,
    population_change: Option<Value>,
}

impl<P> OverridingStateProvider<P> {
    /// Wraps a provider with no overrides set.
    pub const fn new(inner: P) -> Self {
        Self {
            inner,
            population: None,
            volume: None,
            consumption: None,
            substance_consumption: None,
            amortized_unit_volume: None,
            amortized_unit_consumption: None,
            years_elapsed: None,
            population_change: None,
        }
    }

    /// Overrides the equipment population.
    pub const fn with_population(mut self, value: Value) -> Self {
        self.population = Some(value);
        self
    }

    /// Overrides the total sales volume.
    pub const fn with_volume(mut self, value: Value) -> Self {
        self.volume = Some(value);
        self
    }

    /// Overrides the consumption total.
    pub const fn with_consumption(mut self, value: Value) -> Self {
        self.consumption = Some(value);
        self
    }

    /// Overrides the substance GHG intensity.
    pub const fn with_substance_consumption(mut self, value: Value) -> Self {
        self.substance_consumption = Some(value);
        self
    }

    /// Overrides the pooled initial charge.
    pub const fn with_amortized_unit_volume(mut self, value: Value) -> Self {
        self.amortized_unit_volume = Some(value);
        self
    }

    /// Overrides the per-unit consumption.
    pub const fn with_amortized_unit_consumption(mut self, value: Value) -> Self {
        self.amortized_unit_consumption = Some(value);
        self
    }

    /// Overrides the elapsed years.
    pub const fn with_years_elapsed(mut self, value: Value) -> Self {
        self.years_elapsed = Some(value);
        self
    }

    /// Overrides the population change.
    pub const fn with_population_change(mut self, value: Value) -> Self {
        self.population_change = Some(value);
        self
    }

    /// Returns the wrapped provider.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: StateProvider> StateProvider for OverridingStateProvider<P> {
    fn population(&self) -> Value {
        self.population.unwrap_or_else(|| self.inner.population())
    }

    fn volume(&self) -> Value {
        self.volume.unwrap_or_else(|| self.inner.volume())
    }

    fn consumption(&self) -> Value {
        self.consumption.unwrap_or_else(|| self.inner.consumption())
    }

    fn substance_consumption(&self) -> Value {
        self.substance_consumption
            .unwrap_or_else(|| self.inner.substance_consumption())
    }

    fn amortized_unit_volume(&self) -> Value {
        self.amortized_unit_volume
            .unwrap_or_else(|| self.inner.amortized_unit_volume())
    }

    fn amortized_unit_consumption(&self) -> Value {
        self.amortized_unit_consumption
            .unwrap_or_else(|| self.inner.amortized_unit_consumption())
    }

    fn years_elapsed(&self) -> Value {
        self.years_elapsed
            .unwrap_or_else(|| self.inner.years_elapsed())
    }

    fn population_change(&self) -> Value {
        self.population_change
            .unwrap_or_else(|| self.inner.population_change())
    }
}

//! The engine proper: scope and year management plus the command surface.

use crate::{EngineError, EngineState};
use context::{Cfg, OverridingStateProvider, Scope};
use lang::DisplaceTarget;
use primitives::{
    LifecycleError, NameKind, StreamId, Unit, UnitFamily, UnitSpec, UnknownName, Value, YearRange,
};
use state::StreamKeeper;
use std::string::{String, ToString};
use units::UnitConverter;

/// A percentage value as a fraction.
pub(crate) fn pct(value: &Value) -> f64 {
    value.magnitude() / 100.0
}

/// An initial-charge-like value as kg per unit, whatever mass unit it used.
pub(crate) fn kg_per_unit(value: &Value) -> f64 {
    match value.unit().numerator() {
        Some(unit) if unit.is_mass() => value.magnitude() * unit.kg_per(),
        _ => value.magnitude(),
    }
}

/// A per-mass rate (tCO2e/kg, kwh/kg) normalised to per-kg, whatever mass
/// unit the denominator used.
pub(crate) fn rate_per_kg(value: &Value) -> f64 {
    match value.unit().denominator() {
        Some(unit) if unit.is_mass() => value.magnitude() / unit.kg_per(),
        _ => value.magnitude(),
    }
}

/// Interprets program commands over a [`StreamKeeper`].
///
/// One engine executes one scenario. The year cursor starts at the
/// configured start year; [`increment_year`](Engine::increment_year)
/// advances it after each simulated year.
#[derive(Clone, Debug)]
pub struct Engine {
    cfg: Cfg,
    current_year: i32,
    scope: Scope,
    keeper: StreamKeeper,
}

impl Engine {
    /// Creates an engine for the inclusive year span.
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self::with_cfg(Cfg::new(start_year, end_year))
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_cfg(cfg: Cfg) -> Self {
        Self {
            cfg,
            current_year: cfg.start_year,
            scope: Scope::new(),
            keeper: StreamKeeper::new(),
        }
    }

    /// The run configuration.
    pub const fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    /// The year currently being executed.
    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Years since the simulation start.
    pub const fn years_elapsed(&self) -> i32 {
        self.current_year - self.cfg.start_year
    }

    /// The execution scope.
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The stream state.
    pub const fn keeper(&self) -> &StreamKeeper {
        &self.keeper
    }

    /// Whether the current year is inside an optional gate.
    pub fn year_in(&self, during: Option<&YearRange>) -> bool {
        during.is_none_or(|range| range.contains(self.current_year))
    }

    /* Scope management */

    /// Enters a stanza scope.
    pub fn set_stanza(&mut self, name: &str) {
        self.scope = self.scope.with_stanza(name);
    }

    /// Enters an application scope under the current stanza.
    pub fn set_application(&mut self, name: &str) -> Result<(), EngineError> {
        self.scope = self.scope.with_application(name)?;
        Ok(())
    }

    /// Enters a substance scope under the current application.
    ///
    /// The substance is created on first reference unless `check_valid` is
    /// set, in which case an unknown substance is an error.
    pub fn set_substance(&mut self, name: &str, check_valid: bool) -> Result<(), EngineError> {
        let application = self
            .scope
            .application()
            .ok_or(LifecycleError::SubstanceWithoutApplication)?
            .to_string();
        if check_valid {
            if !self.keeper.has_substance(&application, name) {
                return Err(UnknownName::new(NameKind::Substance, name).into());
            }
        } else {
            self.keeper.ensure_substance(&application, name);
        }
        self.scope = self.scope.with_substance(name)?;
        Ok(())
    }

    pub(crate) fn current_key(&self) -> Result<(String, String), EngineError> {
        match (self.scope.application(), self.scope.substance()) {
            (Some(application), Some(substance)) => {
                Ok((application.to_string(), substance.to_string()))
            }
            _ => Err(LifecycleError::NoSubstanceScope.into()),
        }
    }

    /* Variables */

    /// Binds and assigns a variable at the current scope level.
    pub fn define_variable(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        self.scope.define(name)?;
        self.scope.set(name, value)?;
        Ok(())
    }

    /// Assigns to the innermost level defining the variable.
    pub fn set_variable(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        self.scope.set(name, value)?;
        Ok(())
    }

    /// Reads a variable, serving the reserved year names from the engine.
    pub fn get_variable(&self, name: &str) -> Result<Value, EngineError> {
        if name == context::YEARS_ELAPSED {
            return Ok(Value::scalar(self.years_elapsed() as f64));
        }
        if name == context::YEAR_ABSOLUTE {
            return Ok(Value::scalar(self.current_year as f64));
        }
        Ok(self.scope.get(name)?)
    }

    /* State snapshots */

    /// Snapshots the provider quantities for one substance.
    pub(crate) fn snapshot(&self, application: &str, substance: &str) -> Result<EngineState, EngineError> {
        let keeper = &self.keeper;
        let equipment = keeper.get_stream(application, substance, StreamId::Equipment)?;
        let prior = keeper.get_stream(application, substance, StreamId::PriorEquipment)?;
        let sales = keeper.get_stream(application, substance, StreamId::Sales)?;
        let consumption = keeper.get_stream(application, substance, StreamId::Consumption)?;
        let ghg = rate_per_kg(&keeper.parameterization(application, substance)?.ghg_intensity);
        let charge = self.pooled_initial_charge(application, substance)?;
        Ok(EngineState {
            population: equipment,
            volume: sales,
            consumption,
            substance_consumption: Value::per(ghg, Unit::Tco2e, Unit::Kg),
            amortized_unit_volume: charge,
            amortized_unit_consumption: Value::per(
                kg_per_unit(&charge) * ghg,
                Unit::Tco2e,
                Unit::EquipmentUnit,
            ),
            years_elapsed: Value::of(self.years_elapsed() as f64, Unit::Years),
            population_change: Value::of(
                equipment.magnitude() - prior.magnitude(),
                Unit::EquipmentUnits,
            ),
        })
    }

    /// Initial charge pooled over the sales substreams, weighted by their
    /// current mass shares; 1-kg placeholder weights when both are zero.
    pub(crate) fn pooled_initial_charge(
        &self,
        application: &str,
        substance: &str,
    ) -> Result<Value, EngineError> {
        let params = self.keeper.parameterization(application, substance)?;
        let domestic = self
            .keeper
            .get_stream(application, substance, StreamId::Domestic)?
            .magnitude();
        let import = self
            .keeper
            .get_stream(application, substance, StreamId::Import)?
            .magnitude();
        let (domestic_weight, import_weight) = if domestic == 0.0 && import == 0.0 {
            (1.0, 1.0)
        } else {
            (domestic, import)
        };
        let pooled = (kg_per_unit(&params.initial_charge_domestic) * domestic_weight
            + kg_per_unit(&params.initial_charge_import) * import_weight)
            / (domestic_weight + import_weight);
        Ok(Value::per(pooled, Unit::Kg, Unit::EquipmentUnit))
    }

    /* Streams */

    /// Writes a stream of the current substance, then propagates the
    /// recalculation chain the stream belongs to.
    ///
    /// No-op when the current year is outside `during`.
    pub fn set_stream(
        &mut self,
        stream: StreamId,
        value: &Value,
        during: Option<&YearRange>,
        propagate: bool,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        self.set_stream_at(&application, &substance, stream, value, propagate)
    }

    /// Writes a stream of an explicit substance.
    pub(crate) fn set_stream_at(
        &mut self,
        application: &str,
        substance: &str,
        stream: StreamId,
        value: &Value,
        propagate: bool,
    ) -> Result<(), EngineError> {
        let state = self.snapshot(application, substance)?;
        self.keeper
            .set_stream(application, substance, stream, value, &state, &self.cfg)?;
        if propagate {
            match stream {
                StreamId::Sales | StreamId::Domestic | StreamId::Import => {
                    self.recalc_population(application, substance)?;
                    self.recalc_consumption(application, substance)?;
                }
                StreamId::Consumption => {
                    self.recalc_sales(application, substance)?;
                    self.recalc_population(application, substance)?;
                }
                StreamId::Equipment => {
                    self.recalc_sales(application, substance)?;
                    self.recalc_consumption(application, substance)?;
                }
                StreamId::PriorEquipment => {
                    self.recalc_retire(application, substance)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reads a stream of the current substance.
    pub fn get_stream(&self, stream: StreamId) -> Result<Value, EngineError> {
        let (application, substance) = self.current_key()?;
        Ok(self.keeper.get_stream(&application, &substance, stream)?)
    }

    /// Reads a stream of an explicit substance.
    pub fn get_stream_in(
        &self,
        application: &str,
        substance: &str,
        stream: StreamId,
    ) -> Result<Value, EngineError> {
        Ok(self.keeper.get_stream(application, substance, stream)?)
    }

    /// Reads a stream converted into the requested unit.
    pub fn get_stream_as(&self, stream: StreamId, dest: UnitSpec) -> Result<Value, EngineError> {
        let (application, substance) = self.current_key()?;
        let value = self.keeper.get_stream(&application, &substance, stream)?;
        let state = self.snapshot(&application, &substance)?;
        Ok(UnitConverter::new(state).convert(&value, dest)?)
    }

    /* Parameterisation commands */

    /// The initial charge of a substream, or the pooled charge for `sales`.
    pub fn get_initial_charge(&self, stream: StreamId) -> Result<Value, EngineError> {
        let (application, substance) = self.current_key()?;
        if stream == StreamId::Sales {
            return self.pooled_initial_charge(&application, &substance);
        }
        let params = self.keeper.parameterization(&application, &substance)?;
        Ok(params.initial_charge(stream)?)
    }

    /// Sets the initial charge of a substream; `sales` writes both
    /// `domestic` and `import`.
    pub fn set_initial_charge(
        &mut self,
        value: &Value,
        stream: StreamId,
        during: Option<&YearRange>,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        let params = self.keeper.parameterization_mut(&application, &substance)?;
        if stream == StreamId::Sales {
            params.set_initial_charge(StreamId::Domestic, *value)?;
            params.set_initial_charge(StreamId::Import, *value)?;
        } else {
            params.set_initial_charge(stream, *value)?;
        }
        Ok(())
    }

    /// Sets the GHG or energy intensity, selected by the value's unit.
    pub fn equals(&mut self, intensity: &Value, during: Option<&YearRange>) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        let family = intensity.unit().numerator().map(Unit::family);
        {
            let params = self.keeper.parameterization_mut(&application, &substance)?;
            match family {
                Some(UnitFamily::Emissions) => params.ghg_intensity = *intensity,
                Some(UnitFamily::Energy) => params.energy_intensity = *intensity,
                _ => {
                    return Err(units::UnitConversionError::new(
                        intensity.unit(),
                        UnitSpec::Ratio(Unit::Tco2e, Unit::Kg),
                    )
                    .into())
                }
            }
        }
        self.recalc_consumption(&application, &substance)
    }

    /// Sets the recharge parameterisation, then recalculates population,
    /// sales, and consumption.
    pub fn recharge(
        &mut self,
        population: &Value,
        intensity: &Value,
        during: Option<&YearRange>,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        {
            let params = self.keeper.parameterization_mut(&application, &substance)?;
            params.recharge_population = *population;
            params.recharge_intensity = *intensity;
        }
        self.recalc_population(&application, &substance)?;
        self.recalc_sales(&application, &substance)?;
        self.recalc_consumption(&application, &substance)
    }

    /// Sets the retirement rate and applies this year's retirement.
    pub fn retire(&mut self, rate: &Value, during: Option<&YearRange>) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        self.keeper
            .parameterization_mut(&application, &substance)?
            .retirement_rate = *rate;
        self.recalc_retire(&application, &substance)
    }

    /// Sets the recovery parameterisation, then recalculates population,
    /// sales, and consumption.
    pub fn recycle(
        &mut self,
        recovery: &Value,
        yield_rate: &Value,
        displacement: Option<&Value>,
        during: Option<&YearRange>,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        {
            let params = self.keeper.parameterization_mut(&application, &substance)?;
            params.recovery_rate = *recovery;
            params.yield_rate = *yield_rate;
            if let Some(displacement) = displacement {
                params.displacement_rate = *displacement;
            }
        }
        self.recalc_population(&application, &substance)?;
        self.recalc_sales(&application, &substance)?;
        self.recalc_consumption(&application, &substance)
    }

    /// Marks a sales substream as actively traded.
    pub fn enable(&mut self, stream: StreamId) -> Result<(), EngineError> {
        let (application, substance) = self.current_key()?;
        self.keeper.enable(&application, &substance, stream)?;
        Ok(())
    }

    /* Stream mutation commands */

    /// Shifts a stream by a delta resolved against its current value, so
    /// `%` and `/ year` deltas work.
    pub fn change_stream(
        &mut self,
        stream: StreamId,
        delta: &Value,
        during: Option<&YearRange>,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        let current = self.keeper.get_stream(&application, &substance, stream)?;
        let state = self.snapshot(&application, &substance)?;
        let overridden = override_total(OverridingStateProvider::new(state), stream, current);
        let converted = UnitConverter::new(overridden).convert_to(delta, stream.base_unit())?;
        let next = Value::of(
            current.magnitude() + converted.magnitude(),
            stream.base_unit(),
        );
        self.set_stream_at(&application, &substance, stream, &next, true)
    }

    /// Clamps a stream to at most `bound`, optionally displacing the
    /// clipped amount.
    pub fn cap(
        &mut self,
        stream: StreamId,
        bound: &Value,
        during: Option<&YearRange>,
        displacing: Option<&DisplaceTarget>,
    ) -> Result<(), EngineError> {
        self.clamp_stream(stream, None, Some(bound), during, displacing)
    }

    /// Clamps a stream to at least `bound`, optionally displacing the
    /// shortfall.
    pub fn floor(
        &mut self,
        stream: StreamId,
        bound: &Value,
        during: Option<&YearRange>,
        displacing: Option<&DisplaceTarget>,
    ) -> Result<(), EngineError> {
        self.clamp_stream(stream, Some(bound), None, during, displacing)
    }

    /// Clamps a stream two-sided, with no displacement.
    pub fn limit(
        &mut self,
        stream: StreamId,
        lower: Option<&Value>,
        upper: Option<&Value>,
        during: Option<&YearRange>,
    ) -> Result<(), EngineError> {
        self.clamp_stream(stream, lower, upper, during, None)
    }

    fn clamp_stream(
        &mut self,
        stream: StreamId,
        lower: Option<&Value>,
        upper: Option<&Value>,
        during: Option<&YearRange>,
        displacing: Option<&DisplaceTarget>,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        let current = self.keeper.get_stream(&application, &substance, stream)?;
        let state = self.snapshot(&application, &substance)?;
        let overridden = override_total(OverridingStateProvider::new(state), stream, current);
        let converter = UnitConverter::new(overridden);
        let mut clamped = current.magnitude();
        if let Some(upper) = upper {
            clamped = clamped.min(converter.convert_to(upper, stream.base_unit())?.magnitude());
        }
        if let Some(lower) = lower {
            clamped = clamped.max(converter.convert_to(lower, stream.base_unit())?.magnitude());
        }
        let delta = clamped - current.magnitude();
        if delta == 0.0 {
            return Ok(());
        }
        let next = Value::of(clamped, stream.base_unit());
        self.set_stream_at(&application, &substance, stream, &next, true)?;
        let Some(target) = displacing else {
            return Ok(());
        };
        let displaced = -delta;
        match target {
            DisplaceTarget::Stream(other) => {
                let amount = Value::of(displaced, stream.base_unit());
                let snapshot = self.snapshot(&application, &substance)?;
                let converted =
                    UnitConverter::new(snapshot).convert_to(&amount, other.base_unit())?;
                let cur = self.keeper.get_stream(&application, &substance, *other)?;
                let next = Value::of(
                    cur.magnitude() + converted.magnitude(),
                    other.base_unit(),
                );
                self.set_stream_at(&application, &substance, *other, &next, true)
            }
            DisplaceTarget::Substance(sibling) => {
                let cur = self.keeper.get_stream(&application, sibling, stream)?;
                let next = Value::of(cur.magnitude() + displaced, stream.base_unit());
                self.set_stream_at(&application, sibling, stream, &next, true)
            }
        }
    }

    /// Moves an amount of a stream from the current substance to a sibling
    /// substance under the same application.
    pub fn replace(
        &mut self,
        amount: &Value,
        stream: StreamId,
        destination: &str,
        during: Option<&YearRange>,
    ) -> Result<(), EngineError> {
        if !self.year_in(during) {
            return Ok(());
        }
        let (application, substance) = self.current_key()?;
        let current = self.keeper.get_stream(&application, &substance, stream)?;
        let state = self.snapshot(&application, &substance)?;
        let overridden = override_total(OverridingStateProvider::new(state), stream, current);
        let moved = UnitConverter::new(overridden)
            .convert_to(amount, stream.base_unit())?
            .magnitude();
        let reduced = Value::of(current.magnitude() - moved, stream.base_unit());
        self.set_stream_at(&application, &substance, stream, &reduced, true)?;
        let dest_current = self.keeper.get_stream(&application, destination, stream)?;
        let raised = Value::of(dest_current.magnitude() + moved, stream.base_unit());
        self.set_stream_at(&application, destination, stream, &raised, true)
    }

    /* Year cursor */

    /// Advances to the next year: `priorEquipment ← equipment` and
    /// parameterisations reset for every substance.
    pub fn increment_year(&mut self) -> Result<(), EngineError> {
        if self.current_year > self.cfg.end_year {
            return Err(LifecycleError::YearPastEnd {
                current: self.current_year,
                end: self.cfg.end_year,
            }
            .into());
        }
        self.current_year += 1;
        self.keeper.increment_year();
        Ok(())
    }
}

/// Overrides the contextual total matching the stream's base unit, so `%`
/// and per-year deltas resolve against the stream's own current value.
fn override_total(
    provider: OverridingStateProvider<EngineState>,
    stream: StreamId,
    current: Value,
) -> OverridingStateProvider<EngineState> {
    match stream.base_unit().family() {
        UnitFamily::Mass => provider.with_volume(current),
        UnitFamily::Population => provider.with_population(current),
        UnitFamily::Emissions => provider.with_consumption(current),
        _ => provider,
    }
}

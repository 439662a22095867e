//! Cross-stream recalculation kernels.
//!
//! Each kernel recomputes one derived quantity from the current streams and
//! parameterisation, writing with `propagate = false` so chains stay bounded
//! (no fixpoint iteration). The entry points in `engine.rs` choreograph the
//! order: sales-side writes recalculate population then consumption,
//! consumption writes recalculate sales then population, and so on.

use crate::engine::{rate_per_kg, kg_per_unit, pct, Engine};
use crate::EngineError;
use primitives::{StreamId, Unit, Value};

/// Servicing-demand quantities shared by the population and sales kernels.
struct RechargeFlows {
    recharge_kg: f64,
    recycled_kg: f64,
}

impl Engine {
    fn recharge_flows(&self, application: &str, substance: &str) -> Result<RechargeFlows, EngineError> {
        let params = self.keeper().parameterization(application, substance)?;
        let prior = self
            .get_stream_in(application, substance, StreamId::PriorEquipment)?
            .magnitude();
        let recharge_population = prior * pct(&params.recharge_population);
        let recharge_kg = recharge_population * kg_per_unit(&params.recharge_intensity);
        let recovered_kg = recharge_kg * pct(&params.recovery_rate);
        let recycled_kg = recovered_kg * pct(&params.yield_rate);
        Ok(RechargeFlows {
            recharge_kg,
            recycled_kg,
        })
    }

    /// Recomputes the equipment population from sales and servicing demand.
    ///
    /// Substance available for new equipment is sales plus the recycled
    /// volume that does not displace virgin supply, minus what servicing the
    /// installed base consumed. A zero pooled initial charge means the
    /// substance has no unitisation; the population is left unchanged.
    pub(crate) fn recalc_population(
        &mut self,
        application: &str,
        substance: &str,
    ) -> Result<(), EngineError> {
        let params = *self.keeper().parameterization(application, substance)?;
        let flows = self.recharge_flows(application, substance)?;
        let prior = self
            .get_stream_in(application, substance, StreamId::PriorEquipment)?
            .magnitude();
        let sales_kg = self
            .get_stream_in(application, substance, StreamId::Sales)?
            .magnitude();
        let non_displaced_kg = flows.recycled_kg * (1.0 - pct(&params.displacement_rate));
        let available_kg = sales_kg + non_displaced_kg - flows.recharge_kg;
        let charge = kg_per_unit(&self.pooled_initial_charge(application, substance)?);
        let delta_units = if charge == 0.0 {
            0.0
        } else {
            available_kg / charge
        };
        let equipment = (prior + delta_units).max(0.0);
        self.set_stream_at(
            application,
            substance,
            StreamId::Equipment,
            &Value::of(equipment, Unit::EquipmentUnits),
            false,
        )?;
        self.set_stream_at(
            application,
            substance,
            StreamId::NewEquipment,
            &Value::of(delta_units.max(0.0), Unit::EquipmentUnits),
            false,
        )?;
        self.set_stream_at(
            application,
            substance,
            StreamId::Recycle,
            &Value::of(flows.recycled_kg, Unit::Kg),
            false,
        )?;
        self.set_stream_at(
            application,
            substance,
            StreamId::RechargeEmissions,
            &Value::of(
                flows.recharge_kg * rate_per_kg(&params.ghg_intensity),
                Unit::Tco2e,
            ),
            false,
        )
    }

    /// Recomputes consumption as domestic manufacture times GHG intensity,
    /// clamped at zero.
    pub(crate) fn recalc_consumption(
        &mut self,
        application: &str,
        substance: &str,
    ) -> Result<(), EngineError> {
        let params = *self.keeper().parameterization(application, substance)?;
        let domestic_kg = self
            .get_stream_in(application, substance, StreamId::Domestic)?
            .magnitude();
        let consumption = (domestic_kg * rate_per_kg(&params.ghg_intensity)).max(0.0);
        self.set_stream_at(
            application,
            substance,
            StreamId::Consumption,
            &Value::of(consumption, Unit::Tco2e),
            false,
        )
    }

    /// Solves for total sales given the targeted population growth: the
    /// mirror of [`recalc_population`](Engine::recalc_population).
    pub(crate) fn recalc_sales(
        &mut self,
        application: &str,
        substance: &str,
    ) -> Result<(), EngineError> {
        let params = *self.keeper().parameterization(application, substance)?;
        let flows = self.recharge_flows(application, substance)?;
        let equipment = self
            .get_stream_in(application, substance, StreamId::Equipment)?
            .magnitude();
        let prior = self
            .get_stream_in(application, substance, StreamId::PriorEquipment)?
            .magnitude();
        let population_change = equipment - prior;
        let charge = kg_per_unit(&self.pooled_initial_charge(application, substance)?);
        let kg_for_new = population_change * charge;
        let kg_no_recycling = flows.recharge_kg + kg_for_new;
        let displaced_kg = flows.recycled_kg * pct(&params.displacement_rate);
        let total_kg = (kg_no_recycling - displaced_kg).max(0.0);
        self.set_stream_at(
            application,
            substance,
            StreamId::Sales,
            &Value::of(total_kg, Unit::Kg),
            false,
        )
    }

    /// Applies this year's retirement: shrinks both population streams,
    /// records the end-of-life release, then re-runs the population, sales,
    /// and consumption kernels against the reduced base.
    pub(crate) fn recalc_retire(
        &mut self,
        application: &str,
        substance: &str,
    ) -> Result<(), EngineError> {
        let params = *self.keeper().parameterization(application, substance)?;
        let prior = self
            .get_stream_in(application, substance, StreamId::PriorEquipment)?
            .magnitude();
        let equipment = self
            .get_stream_in(application, substance, StreamId::Equipment)?
            .magnitude();
        let retired = prior * pct(&params.retirement_rate);
        let charge = kg_per_unit(&self.pooled_initial_charge(application, substance)?);
        self.set_stream_at(
            application,
            substance,
            StreamId::PriorEquipment,
            &Value::of((prior - retired).max(0.0), Unit::EquipmentUnits),
            false,
        )?;
        self.set_stream_at(
            application,
            substance,
            StreamId::Equipment,
            &Value::of((equipment - retired).max(0.0), Unit::EquipmentUnits),
            false,
        )?;
        self.set_stream_at(
            application,
            substance,
            StreamId::EolEmissions,
            &Value::of(
                retired * charge * rate_per_kg(&params.ghg_intensity),
                Unit::Tco2e,
            ),
            false,
        )?;
        self.recalc_population(application, substance)?;
        self.recalc_sales(application, substance)?;
        self.recalc_consumption(application, substance)
    }
}

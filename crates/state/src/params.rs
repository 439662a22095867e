//! Per-substance coefficients driving the recalculation kernels.

use primitives::{NameKind, StreamId, Unit, UnknownName, Value};

/// Coefficients attached to one (application, substance) pair.
///
/// All rates are percentages of a contextual total. Parameterisations reset
/// to these defaults at every year boundary; the `default` stanza and any
/// active policies re-establish them as the year executes.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamParameterization {
    /// GHG intensity of the substance, tCO2e / kg.
    pub ghg_intensity: Value,
    /// Energy intensity of the substance, kwh / kg.
    pub energy_intensity: Value,
    /// Initial charge of domestically manufactured equipment, kg / unit.
    pub initial_charge_domestic: Value,
    /// Initial charge of imported equipment, kg / unit.
    pub initial_charge_import: Value,
    /// Initial charge of exported equipment, kg / unit.
    pub initial_charge_export: Value,
    /// Share of the installed base serviced each year, %.
    pub recharge_population: Value,
    /// Substance used per serviced unit, kg / unit.
    pub recharge_intensity: Value,
    /// Share of recharge volume recovered, %.
    pub recovery_rate: Value,
    /// Share of recovered volume that survives reprocessing, %.
    pub yield_rate: Value,
    /// Share of the prior population retired each year, %.
    pub retirement_rate: Value,
    /// Share of recycled volume that displaces virgin sales, %.
    pub displacement_rate: Value,
}

impl StreamParameterization {
    /// Creates the default parameterisation: all coefficients zero except
    /// displacement, which is 100 %.
    pub fn new() -> Self {
        Self {
            ghg_intensity: Value::per(0.0, Unit::Tco2e, Unit::Kg),
            energy_intensity: Value::per(0.0, Unit::Kwh, Unit::Kg),
            initial_charge_domestic: Value::per(0.0, Unit::Kg, Unit::EquipmentUnit),
            initial_charge_import: Value::per(0.0, Unit::Kg, Unit::EquipmentUnit),
            initial_charge_export: Value::per(0.0, Unit::Kg, Unit::EquipmentUnit),
            recharge_population: Value::of(0.0, Unit::Percent),
            recharge_intensity: Value::per(0.0, Unit::Kg, Unit::EquipmentUnit),
            recovery_rate: Value::of(0.0, Unit::Percent),
            yield_rate: Value::of(0.0, Unit::Percent),
            retirement_rate: Value::of(0.0, Unit::Percent),
            displacement_rate: Value::of(100.0, Unit::Percent),
        }
    }

    /// The initial charge of a sales substream.
    pub fn initial_charge(&self, stream: StreamId) -> Result<Value, UnknownName> {
        match stream {
            StreamId::Domestic => Ok(self.initial_charge_domestic),
            StreamId::Import => Ok(self.initial_charge_import),
            StreamId::Export => Ok(self.initial_charge_export),
            other => Err(UnknownName::new(NameKind::Stream, other.as_str())),
        }
    }

    /// Sets the initial charge of a sales substream.
    pub fn set_initial_charge(
        &mut self,
        stream: StreamId,
        charge: Value,
    ) -> Result<(), UnknownName> {
        match stream {
            StreamId::Domestic => self.initial_charge_domestic = charge,
            StreamId::Import => self.initial_charge_import = charge,
            StreamId::Export => self.initial_charge_export = charge,
            other => return Err(UnknownName::new(NameKind::Stream, other.as_str())),
        }
        Ok(())
    }
}

impl Default for StreamParameterization {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zero_except_displacement() {
        let params = StreamParameterization::new();
        assert!(params.ghg_intensity.is_zero());
        assert!(params.recharge_population.is_zero());
        assert!(params.retirement_rate.is_zero());
        assert_eq!(params.displacement_rate, Value::of(100.0, Unit::Percent));
    }

    #[test]
    fn initial_charge_addresses_substreams_only() {
        let mut params = StreamParameterization::new();
        let charge = Value::per(0.5, Unit::Kg, Unit::EquipmentUnit);
        params.set_initial_charge(StreamId::Import, charge).unwrap();
        assert_eq!(params.initial_charge(StreamId::Import).unwrap(), charge);
        assert!(params.initial_charge(StreamId::Equipment).is_err());
        assert!(params
            .set_initial_charge(StreamId::Consumption, charge)
            .is_err());
    }
}

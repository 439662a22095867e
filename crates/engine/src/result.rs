//! The per-(application, substance, year) result record and its CSV form.

use core::fmt::Write as _;
use primitives::Value;
use std::string::String;

/// One emitted result row.
///
/// Rows arrive in (scenario, trial, year, application, substance) order.
/// The three trailing fields are the import supplement used by downstream
/// attribution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultRow {
    /// The application.
    pub application: String,
    /// The substance.
    pub substance: String,
    /// The simulated year.
    pub year: i32,
    /// The scenario name.
    pub scenario: String,
    /// The 1-based trial index.
    pub trial: u32,
    /// Domestic manufacture, kg.
    pub domestic: Value,
    /// Imports, kg.
    pub import: Value,
    /// Recycled volume, kg.
    pub recycle: Value,
    /// Consumption attributed to domestic manufacture, tCO2e.
    pub domestic_consumption: Value,
    /// Consumption attributed to imports, tCO2e.
    pub import_consumption: Value,
    /// Consumption attributed to recycling, tCO2e.
    pub recycle_consumption: Value,
    /// Equipment population, units.
    pub population: Value,
    /// Equipment added this year, units.
    pub population_new: Value,
    /// Servicing emissions, tCO2e.
    pub recharge_emissions: Value,
    /// End-of-life emissions, tCO2e.
    pub eol_emissions: Value,
    /// Energy consumption, kwh.
    pub energy_consumption: Value,
    /// Initial charge embedded in imported equipment, kg.
    pub initial_charge_value: Value,
    /// Consumption embedded in imported equipment, tCO2e.
    pub initial_charge_consumption: Value,
    /// New equipment attributable to imports, units.
    pub import_new_population: Value,
}

/// CSV header, matching the row serialisation order.
pub const CSV_HEADER: &str = "application,substance,year,scenario,trial,domestic,import,\
recycle,domesticConsumption,importConsumption,recycleConsumption,population,populationNew,\
rechargeEmissions,eolEmissions,energyConsumption,initialChargeValue,initialChargeConsumption,\
importNewPopulation";

/// Serialises rows as CSV: a header line, then one line per row with every
/// value cell quoted as `"magnitude unit"`.
pub fn to_csv_string(rows: &[ResultRow]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    for row in rows {
        let _ = write!(
            out,
            "\"{}\",\"{}\",{},\"{}\",{}",
            row.application, row.substance, row.year, row.scenario, row.trial
        );
        for value in [
            &row.domestic,
            &row.import,
            &row.recycle,
            &row.domestic_consumption,
            &row.import_consumption,
            &row.recycle_consumption,
            &row.population,
            &row.population_new,
            &row.recharge_emissions,
            &row.eol_emissions,
            &row.energy_consumption,
            &row.initial_charge_value,
            &row.initial_charge_consumption,
            &row.import_new_population,
        ] {
            let _ = write!(out, ",\"{value}\"");
        }
        out.push('\n');
    }
    out
}

/// Writes rows as CSV to an [`io::Write`](std::io::Write) sink.
#[cfg(feature = "std")]
pub fn write_csv<W: std::io::Write>(rows: &[ResultRow], mut writer: W) -> std::io::Result<()> {
    writer.write_all(to_csv_string(rows).as_bytes())
}

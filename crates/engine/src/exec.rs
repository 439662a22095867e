//! Program execution: stanza walking and the scenario runner.

use crate::engine::{kg_per_unit, rate_per_kg, Engine};
use crate::{EngineError, ResultRow};
use lang::{Application, Command, IncompatibleProgram, Program, Scenario, Target};
use primitives::{NameKind, StreamId, Unit, UnknownName, Value};
use state::SubstanceKey;
use std::{string::ToString, vec::Vec};

/// Configures and runs scenario executions.
///
/// The defaults match [`run_program`]; the setters relax the value guards
/// for callers that want raw float semantics.
#[derive(Clone, Copy, Debug, Default)]
pub struct Runner {
    disable_nan_check: bool,
    disable_negative_check: bool,
}

impl Runner {
    /// Creates a runner with both value guards enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows NaN and infinite magnitudes to be stored.
    pub const fn allow_nan(mut self) -> Self {
        self.disable_nan_check = true;
        self
    }

    /// Allows negative stream magnitudes to be stored.
    pub const fn allow_negative(mut self) -> Self {
        self.disable_negative_check = true;
        self
    }

    /// Runs every scenario of a program.
    pub fn run(&self, program: &Program) -> Result<Vec<ResultRow>, EngineError> {
        let mut rows = Vec::new();
        for scenario in &program.simulations {
            rows.extend(self.run_scenario(program, scenario)?);
        }
        Ok(rows)
    }

    /// Runs one scenario against a fresh engine.
    pub fn run_scenario(
        &self,
        program: &Program,
        scenario: &Scenario,
    ) -> Result<Vec<ResultRow>, EngineError> {
        let mut cfg = context::Cfg::new(scenario.start, scenario.end);
        cfg.check_nan = !self.disable_nan_check;
        cfg.check_non_negative = !self.disable_negative_check;
        run_scenario_with(Engine::with_cfg(cfg), program, scenario)
    }
}

/// Runs every scenario of a program, returning rows in (scenario, trial,
/// year, application, substance) order.
///
/// Incompatible programs are refused up front with
/// [`EngineError::Incompatible`].
pub fn run_program(program: &Program) -> Result<Vec<ResultRow>, EngineError> {
    Runner::new().run(program)
}

/// Runs one scenario against a fresh engine.
///
/// Each year executes the `default` stanza, then every policy the scenario
/// lists in order, then emits one row per known substance. Execution errors
/// abort the scenario.
pub fn run_scenario(
    program: &Program,
    scenario: &Scenario,
) -> Result<Vec<ResultRow>, EngineError> {
    Runner::new().run_scenario(program, scenario)
}

fn run_scenario_with(
    mut engine: Engine,
    program: &Program,
    scenario: &Scenario,
) -> Result<Vec<ResultRow>, EngineError> {
    let reasons = program.incompatibilities();
    if !reasons.is_empty() {
        return Err(IncompatibleProgram::new(reasons.join("; ")).into());
    }
    let mut rows = Vec::new();
    for year in scenario.start..=scenario.end {
        if let Some(default) = &program.default {
            exec_applications(&mut engine, "default", &default.applications, false)?;
        }
        for name in &scenario.policies {
            let policy = program
                .policy(name)
                .ok_or_else(|| UnknownName::new(NameKind::Policy, name.clone()))?;
            exec_applications(&mut engine, &policy.name, &policy.applications, true)?;
        }
        let keys: Vec<SubstanceKey> = engine.keeper().substances().cloned().collect();
        for key in &keys {
            rows.push(emit_row(&engine, scenario, year, key)?);
        }
        engine.increment_year()?;
    }
    Ok(rows)
}

fn exec_applications(
    engine: &mut Engine,
    stanza: &str,
    applications: &[Application],
    check_valid: bool,
) -> Result<(), EngineError> {
    engine.set_stanza(stanza);
    for application in applications {
        engine.set_application(&application.name)?;
        for substance in &application.substances {
            engine.set_substance(&substance.name, check_valid)?;
            for command in &substance.commands {
                exec_command(engine, command)?;
            }
        }
    }
    Ok(())
}

fn exec_command(engine: &mut Engine, command: &Command) -> Result<(), EngineError> {
    if !engine.year_in(command.during().as_ref()) {
        return Ok(());
    }
    match command {
        Command::InitialCharge {
            value,
            target,
            during,
        } => {
            let value = engine.operand_value(value)?;
            engine.set_initial_charge(&value, *target, during.as_ref())
        }
        Command::Equals { value, during } => {
            let value = engine.operand_value(value)?;
            engine.equals(&value, during.as_ref())
        }
        Command::Recharge {
            population,
            volume,
            during,
        } => {
            let population = engine.operand_value(population)?;
            let volume = engine.operand_value(volume)?;
            engine.recharge(&population, &volume, during.as_ref())
        }
        Command::Recycle {
            recovery,
            yield_rate,
            displacement,
            during,
        } => {
            let recovery = engine.operand_value(recovery)?;
            let yield_rate = engine.operand_value(yield_rate)?;
            let displacement = displacement
                .as_ref()
                .map(|d| engine.operand_value(d))
                .transpose()?;
            engine.recycle(&recovery, &yield_rate, displacement.as_ref(), during.as_ref())
        }
        Command::Replace {
            amount,
            stream,
            destination,
            during,
        } => {
            let amount = engine.operand_value(amount)?;
            engine.replace(&amount, *stream, destination, during.as_ref())
        }
        Command::Set {
            target,
            value,
            during,
        } => {
            let value = engine.operand_value(value)?;
            match target {
                Target::Stream(stream) => {
                    engine.set_stream(*stream, &value, during.as_ref(), true)
                }
                Target::Variable(name) => engine.set_variable(name, value),
            }
        }
        Command::Change {
            target,
            delta,
            during,
        } => match target {
            Target::Stream(stream) => {
                let delta = engine.operand_value(delta)?;
                engine.change_stream(*stream, &delta, during.as_ref())
            }
            Target::Variable(name) => {
                let delta = engine.operand_value(delta)?;
                let current = engine.get_variable(name)?;
                let next = Value::new(
                    current.magnitude() + delta.magnitude(),
                    current.unit(),
                );
                engine.set_variable(name, next)
            }
        },
        Command::Retire { amount, during } => {
            let amount = engine.operand_value(amount)?;
            engine.retire(&amount, during.as_ref())
        }
        Command::Cap {
            stream,
            value,
            displacing,
            during,
        } => {
            let value = engine.operand_value(value)?;
            engine.cap(*stream, &value, during.as_ref(), displacing.as_ref())
        }
        Command::Floor {
            stream,
            value,
            displacing,
            during,
        } => {
            let value = engine.operand_value(value)?;
            engine.floor(*stream, &value, during.as_ref(), displacing.as_ref())
        }
        Command::Limit {
            stream,
            lower,
            upper,
            during,
        } => {
            let lower = lower
                .as_ref()
                .map(|b| engine.operand_value(b))
                .transpose()?;
            let upper = upper
                .as_ref()
                .map(|b| engine.operand_value(b))
                .transpose()?;
            engine.limit(*stream, lower.as_ref(), upper.as_ref(), during.as_ref())
        }
        Command::Define { name, value } => {
            let value = engine.operand_value(value)?;
            engine.define_variable(name, value)
        }
        Command::Enable { stream } => engine.enable(*stream),
    }
}

/// Builds the result row for one substance at the current year.
fn emit_row(
    engine: &Engine,
    scenario: &Scenario,
    year: i32,
    key: &SubstanceKey,
) -> Result<ResultRow, EngineError> {
    let application = key.application.as_str();
    let substance = key.substance.as_str();
    let params = *engine.keeper().parameterization(application, substance)?;
    let get = |stream| engine.get_stream_in(application, substance, stream);

    let domestic = get(StreamId::Domestic)?;
    let import = get(StreamId::Import)?;
    let recycle = get(StreamId::Recycle)?;
    let ghg = rate_per_kg(&params.ghg_intensity);
    let energy = rate_per_kg(&params.energy_intensity);
    let sales_kg = domestic.magnitude() + import.magnitude();

    let new_units = get(StreamId::NewEquipment)?.magnitude();
    let import_share = if sales_kg > 0.0 {
        import.magnitude() / sales_kg
    } else {
        0.0
    };
    let import_new_population = new_units * import_share;
    let initial_charge_value =
        import_new_population * kg_per_unit(&params.initial_charge_import);

    Ok(ResultRow {
        application: application.to_string(),
        substance: substance.to_string(),
        year,
        scenario: scenario.name.clone(),
        trial: 1,
        domestic,
        import,
        recycle,
        // Consumption attributions clamp at zero, like the consumption
        // kernel itself.
        domestic_consumption: Value::of((domestic.magnitude() * ghg).max(0.0), Unit::Tco2e),
        import_consumption: Value::of((import.magnitude() * ghg).max(0.0), Unit::Tco2e),
        recycle_consumption: Value::of((recycle.magnitude() * ghg).max(0.0), Unit::Tco2e),
        population: get(StreamId::Equipment)?,
        population_new: get(StreamId::NewEquipment)?,
        recharge_emissions: get(StreamId::RechargeEmissions)?,
        eol_emissions: get(StreamId::EolEmissions)?,
        energy_consumption: Value::of(sales_kg * energy, Unit::Kwh),
        initial_charge_value: Value::of(initial_charge_value, Unit::Kg),
        initial_charge_consumption: Value::of(
            (initial_charge_value * ghg).max(0.0),
            Unit::Tco2e,
        ),
        import_new_population: Value::of(import_new_population, Unit::EquipmentUnits),
    })
}

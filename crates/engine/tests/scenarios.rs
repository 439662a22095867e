//! End-to-end scenario runs through parse + execute.

use refsim_engine::{run_program, run_scenario, Engine, ResultRow};
use lang::Program;
use primitives::{StreamId, Unit, Value};

fn rows(source: &str) -> Vec<ResultRow> {
    let program = Program::from_source(source).expect("program should parse");
    run_program(&program).expect("program should execute")
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[test]
fn basic_sales_and_consumption() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      equals 2 tCO2e / kg
      set domestic to 10 kg
    end substance
  end application
end default

start simulations
  simulate "S1" from years 1 to 1
end simulations
"#,
    );
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.domestic, Value::of(10.0, Unit::Kg));
    assert_eq!(row.import, Value::of(0.0, Unit::Kg));
    assert!(close(
        row.domestic.magnitude() + row.import.magnitude(),
        10.0
    ));
    assert_eq!(row.domestic_consumption, Value::of(20.0, Unit::Tco2e));
}

#[test]
fn recharge_propagates_into_population_growth() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      equals 2 tCO2e / kg
      recharge 10 % with 0.5 kg / unit
      set priorEquipment to 100 units
      set domestic to 10 kg
    end substance
  end application
end default

start simulations
  simulate "S2" from years 1 to 1
end simulations
"#,
    );
    // rechargeKg = 100 x 10% x 0.5 = 5; equipment += (10 - 5) / 1 = 5.
    assert!(close(rows[0].population.magnitude(), 105.0));
    // Servicing emissions: 5 kg x 2 tCO2e/kg.
    assert!(close(rows[0].recharge_emissions.magnitude(), 10.0));
}

#[test]
fn recovery_displaces_virgin_sales() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      equals 2 tCO2e / kg
      recharge 10 % with 0.5 kg / unit
      set priorEquipment to 100 units
      set domestic to 10 kg
    end substance
  end application
end default

start policy "Recovery"
  modify application "A"
    modify substance "X"
      recover 100 % with 50 % reuse displacing 100 %
    end substance
  end application
end policy

start simulations
  simulate "S3" using "Recovery" from years 1 to 1
end simulations
"#,
    );
    let row = &rows[0];
    // recycledKg = 5 x 100% x 50% = 2.5; sales = max(0, 10 - 2.5) = 7.5.
    assert!(close(row.recycle.magnitude(), 2.5));
    assert!(close(
        row.domestic.magnitude() + row.import.magnitude(),
        7.5
    ));
}

#[test]
fn cap_displaces_into_sibling_substance() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      set domestic to 100 kg
    end substance
    define substance "Y"
      set domestic to 0 kg
    end substance
  end application
end default

start policy "Cap X"
  modify application "A"
    modify substance "X"
      cap domestic to 60 kg displacing "Y"
    end substance
  end application
end policy

start simulations
  simulate "S4" using "Cap X" from years 1 to 1
end simulations
"#,
    );
    let x = rows.iter().find(|r| r.substance == "X").unwrap();
    let y = rows.iter().find(|r| r.substance == "Y").unwrap();
    assert_eq!(x.domestic, Value::of(60.0, Unit::Kg));
    assert_eq!(y.domestic, Value::of(40.0, Unit::Kg));
}

#[test]
fn year_ranges_gate_commands() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      set domestic to 2 kg
      set domestic to 5 kg during years 3 to 5
    end substance
  end application
end default

start simulations
  simulate "S5" from years 1 to 6
end simulations
"#,
    );
    let by_year: Vec<f64> = rows.iter().map(|r| r.domestic.magnitude()).collect();
    assert_eq!(by_year, [2.0, 2.0, 5.0, 5.0, 5.0, 2.0]);
}

#[test]
fn change_by_percent_per_year_uses_elapsed_years() {
    // Direct engine drive, matching the unit-conversion scenario: with
    // equipment at 100 units and sales at 50 kg, a `10 % / year` change one
    // year after start adds 5 kg.
    let mut engine = Engine::new(1, 10);
    engine.set_stanza("default");
    engine.set_application("A").unwrap();
    engine.set_substance("X", false).unwrap();
    engine.increment_year().unwrap();
    engine
        .set_stream(
            StreamId::Equipment,
            &Value::of(100.0, Unit::EquipmentUnits),
            None,
            false,
        )
        .unwrap();
    engine
        .set_stream(StreamId::Domestic, &Value::of(50.0, Unit::Kg), None, false)
        .unwrap();
    engine
        .change_stream(StreamId::Sales, &Value::per(10.0, Unit::Percent, Unit::Year), None)
        .unwrap();
    assert!(close(
        engine.get_stream(StreamId::Sales).unwrap().magnitude(),
        55.0
    ));
}

#[test]
fn prior_equipment_carries_equipment_across_the_year_boundary() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      set domestic to 10 kg
    end substance
  end application
end default

start simulations
  simulate "carry" from years 1 to 2
end simulations
"#,
    );
    // Year 1 builds 10 units on a zero prior population.
    assert!(close(rows[0].population.magnitude(), 10.0));
    // Year 2 starts from priorEquipment == equipment(year 1), so the same
    // sales grow the population to 20.
    assert!(close(rows[1].population.magnitude(), 20.0));

    // The boundary copy, observed directly.
    let mut engine = Engine::new(1, 2);
    engine.set_stanza("default");
    engine.set_application("A").unwrap();
    engine.set_substance("X", false).unwrap();
    engine
        .set_stream(
            StreamId::Equipment,
            &Value::of(42.0, Unit::EquipmentUnits),
            None,
            false,
        )
        .unwrap();
    engine.increment_year().unwrap();
    assert_eq!(
        engine.get_stream(StreamId::PriorEquipment).unwrap(),
        Value::of(42.0, Unit::EquipmentUnits)
    );
}

#[test]
fn sales_split_preserved_and_even_from_zero() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      set domestic to 30 kg
      set import to 10 kg
      set sales to 100 kg
    end substance
    define substance "Z"
      set sales to 10 kg
    end substance
  end application
end default

start simulations
  simulate "split" from years 1 to 1
end simulations
"#,
    );
    let x = rows.iter().find(|r| r.substance == "X").unwrap();
    assert_eq!(x.domestic, Value::of(75.0, Unit::Kg));
    assert_eq!(x.import, Value::of(25.0, Unit::Kg));
    let z = rows.iter().find(|r| r.substance == "Z").unwrap();
    assert_eq!(z.domestic, Value::of(5.0, Unit::Kg));
    assert_eq!(z.import, Value::of(5.0, Unit::Kg));
}

#[test]
fn replace_moves_volume_between_substances() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      set domestic to 100 kg
    end substance
    define substance "Y"
      set domestic to 10 kg
    end substance
  end application
end default

start policy "Switch"
  modify application "A"
    modify substance "X"
      replace 20 kg of domestic with "Y"
    end substance
  end application
end policy

start simulations
  simulate "swap" using "Switch" from years 1 to 1
end simulations
"#,
    );
    let x = rows.iter().find(|r| r.substance == "X").unwrap();
    let y = rows.iter().find(|r| r.substance == "Y").unwrap();
    assert_eq!(x.domestic, Value::of(80.0, Unit::Kg));
    assert_eq!(y.domestic, Value::of(30.0, Unit::Kg));
}

#[test]
fn scenarios_run_independently() {
    let program = Program::from_source(
        r#"
start default
  define application "A"
    define substance "X"
      set domestic to 10 kg
    end substance
  end application
end default

start policy "Half"
  modify application "A"
    modify substance "X"
      cap domestic to 5 kg
    end substance
  end application
end policy

start simulations
  simulate "BAU" from years 1 to 2
  simulate "Capped" using "Half" from years 1 to 2
end simulations
"#,
    )
    .unwrap();
    let all = run_program(&program).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all[..2].iter().all(|r| r.scenario == "BAU"));
    assert!(all[2..].iter().all(|r| r.scenario == "Capped"));
    assert_eq!(all[0].domestic, Value::of(10.0, Unit::Kg));
    assert_eq!(all[2].domestic, Value::of(5.0, Unit::Kg));

    // Running one scenario in isolation matches its slice of the full run.
    let capped = run_scenario(&program, &program.simulations[1]).unwrap();
    assert_eq!(capped.as_slice(), &all[2..]);
}

#[test]
fn emitted_source_runs_identically() {
    let source = r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      equals 2 tCO2e / kg
      recharge 10 % with 0.5 kg / unit
      set priorEquipment to 100 units
      set domestic to 10 kg
    end substance
  end application
end default

start simulations
  simulate "round trip" from years 1 to 3
end simulations
"#;
    let program = Program::from_source(source).unwrap();
    let reparsed = Program::from_source(&program.to_source()).unwrap();
    assert_eq!(program, reparsed);
    assert_eq!(
        run_program(&program).unwrap(),
        run_program(&reparsed).unwrap()
    );
}

#[test]
fn emitted_consumption_clamps_at_zero() {
    // A negative intensity is storable, but every consumption attribution
    // in the emitted row clamps at zero, matching the consumption kernel.
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      equals -2 tCO2e / kg
      set domestic to 10 kg
      set import to 5 kg
    end substance
  end application
end default

start simulations
  simulate "clamp" from years 1 to 1
end simulations
"#,
    );
    let row = &rows[0];
    assert_eq!(row.domestic, Value::of(10.0, Unit::Kg));
    assert_eq!(row.domestic_consumption, Value::of(0.0, Unit::Tco2e));
    assert_eq!(row.import_consumption, Value::of(0.0, Unit::Tco2e));
    assert_eq!(row.recycle_consumption, Value::of(0.0, Unit::Tco2e));
    assert_eq!(
        row.initial_charge_consumption,
        Value::of(0.0, Unit::Tco2e)
    );
    assert!(row.domestic_consumption.magnitude().is_sign_positive());
}

#[test]
fn stream_magnitudes_stay_finite_and_non_negative() {
    let rows = rows(
        r#"
start default
  define application "A"
    define substance "X"
      initial charge with 1 kg / unit for sales
      equals 2 tCO2e / kg
      recharge 20 % with 1 kg / unit
      set priorEquipment to 50 units
      set domestic to 5 kg
      retire 10 %
    end substance
  end application
end default

start simulations
  simulate "guard" from years 1 to 5
end simulations
"#,
    );
    for row in &rows {
        for value in [
            &row.domestic,
            &row.import,
            &row.recycle,
            &row.population,
            &row.population_new,
            &row.recharge_emissions,
            &row.eol_emissions,
        ] {
            assert!(value.is_finite(), "non-finite value in year {}", row.year);
            assert!(
                value.magnitude() >= 0.0,
                "negative value in year {}",
                row.year
            );
        }
    }
}

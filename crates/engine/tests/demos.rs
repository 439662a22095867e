//! Runs every demo program under `demos/` end to end.

use refsim_engine::run_program;
use lang::Program;
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

#[test]
fn demo_programs_parse_round_trip_and_run() {
    let mut seen = 0;
    for entry in WalkDir::new(demos_dir()) {
        let entry = entry.expect("demos directory should be readable");
        if entry.path().extension().and_then(|e| e.to_str()) != Some("rsm") {
            continue;
        }
        seen += 1;
        let name = entry.path().display();
        let source = fs::read_to_string(entry.path()).expect("demo should be readable");
        let program = Program::from_source(&source)
            .unwrap_or_else(|error| panic!("{name}: {error}"));
        assert!(
            program.is_compatible(),
            "{name}: {:?}",
            program.incompatibilities()
        );

        let reparsed = Program::from_source(&program.to_source())
            .unwrap_or_else(|error| panic!("{name} re-parse: {error}"));
        assert_eq!(program, reparsed, "{name}: round trip changed the program");

        let rows = run_program(&program).unwrap_or_else(|error| panic!("{name}: {error}"));
        assert!(!rows.is_empty(), "{name}: no rows emitted");
        for row in &rows {
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
            ] {
                assert!(
                    value.is_finite() && value.magnitude() >= 0.0,
                    "{name}: bad value {value} in {} year {}",
                    row.scenario,
                    row.year
                );
            }
        }
    }
    assert_eq!(seen, 3, "expected every demo program to be exercised");
}

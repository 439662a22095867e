//! refsim - a simulator for refrigerant-style substance flows, equipment
//! populations, and greenhouse-gas consumption under policy scenarios.
//!
//! Programs in the modelling language are parsed by [`lang`], executed by
//! [`engine`], and produce one [`ResultRow`](engine::ResultRow) per
//! (scenario, trial, application, substance, year).
//!
//! ```
//! use refsim::{lang::Program, engine};
//!
//! let program = Program::from_source(r#"
//! start default
//!   define application "domestic refrigeration"
//!     define substance "HFC-134a"
//!       initial charge with 1 kg / unit for sales
//!       equals 2 tCO2e / kg
//!       set domestic to 10 kg
//!     end substance
//!   end application
//! end default
//!
//! start simulations
//!   simulate "BAU" from years 1 to 1
//! end simulations
//! "#).unwrap();
//!
//! let rows = engine::run_program(&program).unwrap();
//! assert_eq!(rows[0].domestic.to_string(), "10 kg");
//! assert_eq!(rows[0].domestic_consumption.to_string(), "20 tCO2e");
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

// reexport dependencies
pub use context;
pub use engine;
pub use lang;
pub use primitives;
pub use state;
pub use units;

pub use engine::{run_program, run_scenario, Engine, EngineError, ResultRow};
pub use lang::{parse, Program, TranslationResult};
pub use primitives::{StreamId, Unit, UnitSpec, Value, YearRange};
